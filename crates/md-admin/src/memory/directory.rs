use async_trait::async_trait;

use super::MemoryStore;
use crate::domain::{Group, User};
use crate::error::{AdminError, Result};
use crate::service::{GroupProvider, UserDirectory};

fn key(organization: &str, id: &str) -> (String, String) {
    (organization.to_string(), id.to_string())
}

#[async_trait]
impl UserDirectory for MemoryStore {
    async fn users(&self, organization: &str) -> Result<Vec<User>> {
        Ok(self
            .users
            .read()
            .iter()
            .filter(|((org, _), _)| org == organization)
            .map(|(_, user)| user.clone())
            .collect())
    }

    async fn user(&self, organization: &str, username: &str) -> Result<Option<User>> {
        Ok(self.users.read().get(&key(organization, username)).cloned())
    }

    async fn create_user(&self, organization: &str, user: User) -> Result<User> {
        let mut users = self.users.write();
        let k = key(organization, &user.username);
        if users.contains_key(&k) {
            return Err(AdminError::duplicate("User", "username", &user.username));
        }
        users.insert(k, user.clone());
        Ok(user)
    }

    async fn update_user(&self, organization: &str, user: User) -> Result<User> {
        let mut users = self.users.write();
        let existing = users
            .get_mut(&key(organization, &user.username))
            .ok_or_else(|| AdminError::not_found("User", &user.username))?;
        if !existing.manageable {
            return Err(AdminError::forbidden(format!(
                "User {} is provided by {} and cannot be edited",
                user.username, existing.provider
            )));
        }
        *existing = user.clone();
        Ok(user)
    }

    async fn delete_user(&self, organization: &str, username: &str) -> Result<()> {
        let mut users = self.users.write();
        let k = key(organization, username);
        match users.get(&k) {
            None => Err(AdminError::not_found("User", username)),
            Some(u) if !u.manageable => Err(AdminError::forbidden(format!(
                "User {} is provided by {} and cannot be deleted",
                username, u.provider
            ))),
            Some(_) => {
                users.remove(&k);
                Ok(())
            }
        }
    }
}

#[async_trait]
impl GroupProvider for MemoryStore {
    async fn groups(&self, organization: &str) -> Result<Vec<Group>> {
        Ok(self
            .groups
            .read()
            .values()
            .filter(|g| g.organization == organization)
            .cloned()
            .collect())
    }

    async fn group(&self, organization: &str, id: &str) -> Result<Option<Group>> {
        Ok(self.groups.read().get(&key(organization, id)).cloned())
    }

    async fn create_group(&self, group: Group) -> Result<Group> {
        let mut groups = self.groups.write();
        let k = key(&group.organization, &group.id);
        if groups.contains_key(&k) {
            return Err(AdminError::duplicate("Group", "id", &group.id));
        }
        groups.insert(k, group.clone());
        Ok(group)
    }

    async fn update_group(&self, group: Group) -> Result<Group> {
        let mut groups = self.groups.write();
        let existing = groups
            .get_mut(&key(&group.organization, &group.id))
            .ok_or_else(|| AdminError::not_found("Group", &group.id))?;
        *existing = group.clone();
        Ok(group)
    }

    async fn delete_group(&self, organization: &str, id: &str) -> Result<()> {
        self.groups
            .write()
            .remove(&key(organization, id))
            .map(|_| ())
            .ok_or_else(|| AdminError::not_found("Group", id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_duplicate_username() {
        let store = MemoryStore::new();
        store.create_user("org", User::new("ada", "mediadesk")).await.unwrap();
        let err = store.create_user("org", User::new("ada", "mediadesk")).await.unwrap_err();
        assert!(matches!(err, AdminError::Duplicate { .. }));
        assert!(store.create_user("other", User::new("ada", "mediadesk")).await.is_ok());
        assert_eq!(store.users("org").await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_external_users_are_read_only() {
        let store = MemoryStore::new();
        let mut ldap = User::new("grace", "ldap");
        ldap.manageable = false;
        store.insert_user("org", ldap.clone());

        assert!(store.update_user("org", ldap).await.is_err());
        assert!(store.delete_user("org", "grace").await.is_err());
        assert!(store.user("org", "grace").await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_group_lifecycle() {
        let store = MemoryStore::new();
        let group = store.create_group(Group::new("Lecture Staff", "org")).await.unwrap();
        assert!(store.create_group(Group::new("Lecture Staff", "org")).await.is_err());

        let mut changed = group.clone();
        changed.members.insert("ada".to_string());
        store.update_group(changed).await.unwrap();
        let stored = store.group("org", &group.id).await.unwrap().unwrap();
        assert!(stored.members.contains("ada"));

        store.delete_group("org", &group.id).await.unwrap();
        assert!(store.delete_group("org", &group.id).await.unwrap_err().is_not_found());
    }
}
