use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{AuthError, IdentityResolver};
use crate::database::AdminUser;

/// Opaque random tokens mapped to user ids with an expiry
#[derive(Default)]
pub struct MemorySessionResolver {
    sessions: RwLock<HashMap<String, (i64, DateTime<Utc>)>>,
}

impl MemorySessionResolver {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.sessions.read().await.len()
    }
}

#[async_trait]
impl IdentityResolver for MemorySessionResolver {
    async fn issue(&self, user: &AdminUser, ttl: Duration) -> Result<String, AuthError> {
        let token = Uuid::new_v4().simple().to_string();
        let now = Utc::now();
        let expires_at = chrono::Duration::from_std(ttl)
            .ok()
            .and_then(|ttl| now.checked_add_signed(ttl))
            .unwrap_or(DateTime::<Utc>::MAX_UTC);

        let mut sessions = self.sessions.write().await;
        sessions.retain(|_, (_, expires)| *expires > now);
        sessions.insert(token.clone(), (user.id, expires_at));
        Ok(token)
    }

    async fn resolve(&self, token: &str) -> Result<Option<i64>, AuthError> {
        let found = self.sessions.read().await.get(token).copied();
        match found {
            Some((user_id, expires_at)) if expires_at > Utc::now() => Ok(Some(user_id)),
            Some(_) => {
                self.sessions.write().await.remove(token);
                Ok(None)
            }
            None => Ok(None),
        }
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        self.sessions.write().await.remove(token);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user() -> AdminUser {
        AdminUser {
            id: 3,
            username: "admin".into(),
            password: String::new(),
        }
    }

    #[tokio::test]
    async fn issue_resolve_revoke() {
        let sessions = MemorySessionResolver::new();
        let token = sessions.issue(&user(), Duration::from_secs(3600)).await.unwrap();
        assert_eq!(token.len(), 32);
        assert_eq!(sessions.resolve(&token).await.unwrap(), Some(3));

        sessions.revoke(&token).await.unwrap();
        assert_eq!(sessions.resolve(&token).await.unwrap(), None);
    }

    #[tokio::test]
    async fn expired_sessions_are_forgotten() {
        let sessions = MemorySessionResolver::new();
        let token = sessions.issue(&user(), Duration::from_secs(0)).await.unwrap();
        let _live = sessions.issue(&user(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(sessions.resolve(&token).await.unwrap(), None);
        assert_eq!(sessions.len().await, 1);
    }

    #[tokio::test]
    async fn issuing_evicts_expired_sessions() {
        let sessions = MemorySessionResolver::new();
        for _ in 0..1000 {
            sessions.issue(&user(), Duration::from_secs(0)).await.unwrap();
        }
        let live = sessions.issue(&user(), Duration::from_secs(60)).await.unwrap();
        assert_eq!(sessions.len().await, 1);
        assert_eq!(sessions.resolve(&live).await.unwrap(), Some(3));
    }
}
