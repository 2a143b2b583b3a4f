use async_trait::async_trait;

use super::MemoryStore;
use crate::domain::{CaptureAgent, Job, JobStatus};
use crate::error::{AdminError, Result};
use crate::service::{CaptureAgentService, ServiceRegistry};

#[async_trait]
impl ServiceRegistry for MemoryStore {
    async fn active_jobs(&self) -> Result<Vec<Job>> {
        Ok(self
            .jobs
            .read()
            .iter()
            .filter(|j| {
                !matches!(
                    j.status,
                    JobStatus::Finished | JobStatus::Failed | JobStatus::Canceled
                )
            })
            .cloned()
            .collect())
    }
}

#[async_trait]
impl CaptureAgentService for MemoryStore {
    async fn agents(&self) -> Result<Vec<CaptureAgent>> {
        Ok(self.agents.read().values().cloned().collect())
    }

    async fn agent(&self, name: &str) -> Result<Option<CaptureAgent>> {
        Ok(self.agents.read().get(name).cloned())
    }

    async fn remove_agent(&self, name: &str) -> Result<()> {
        self.agents
            .write()
            .remove(name)
            .map(|_| ())
            .ok_or_else(|| AdminError::not_found("CaptureAgent", name))
    }
}
