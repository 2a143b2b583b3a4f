//! Service registry and capture agent state.

use async_trait::async_trait;

use crate::domain::{CaptureAgent, Job};
use crate::error::Result;

#[async_trait]
pub trait ServiceRegistry: Send + Sync {
    async fn active_jobs(&self) -> Result<Vec<Job>>;
}

#[async_trait]
pub trait CaptureAgentService: Send + Sync {
    async fn agents(&self) -> Result<Vec<CaptureAgent>>;

    async fn agent(&self, name: &str) -> Result<Option<CaptureAgent>>;

    async fn remove_agent(&self, name: &str) -> Result<()>;
}
