use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use jsonwebtoken::{decode, encode, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::{debug, info};

use super::{AuthError, IdentityResolver};
use crate::database::AdminUser;

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub iat: i64,
    pub exp: i64,
    /// Token generation of the user at issue time
    #[serde(default, rename = "gen")]
    pub generation: u64,
}

impl Claims {
    pub fn new(user: &AdminUser, ttl: Duration) -> Self {
        let now = Utc::now();
        let ttl = i64::try_from(ttl.as_secs()).unwrap_or(i64::MAX);

        Self {
            sub: user.id.to_string(),
            username: user.username.clone(),
            iat: now.timestamp(),
            exp: now.timestamp().saturating_add(ttl),
            generation: 0,
        }
    }
}

/// Signed-token sessions: the cookie carries the claims
///
/// Revoking a token bumps its user's generation, which invalidates every
/// token issued to that user before. Generations live in process memory.
pub struct JwtResolver {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    generations: RwLock<HashMap<i64, u64>>,
}

impl JwtResolver {
    pub fn new(secret: &str) -> Result<Self, AuthError> {
        if secret.is_empty() {
            return Err(AuthError::InvalidSecret);
        }
        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(secret.as_bytes()),
            generations: RwLock::new(HashMap::new()),
        })
    }

    async fn generation(&self, user_id: i64) -> u64 {
        self.generations.read().await.get(&user_id).copied().unwrap_or(0)
    }

    fn claims(&self, token: &str) -> Option<Claims> {
        match decode::<Claims>(token, &self.decoding_key, &Self::validation()) {
            Ok(data) => Some(data.claims),
            Err(e) => {
                debug!("Rejected session token: {}", e);
                None
            }
        }
    }

    fn validation() -> Validation {
        let mut validation = Validation::default();
        validation.leeway = 0;
        validation
    }
}

#[async_trait]
impl IdentityResolver for JwtResolver {
    async fn issue(&self, user: &AdminUser, ttl: Duration) -> Result<String, AuthError> {
        let mut claims = Claims::new(user, ttl);
        claims.generation = self.generation(user.id).await;
        encode(&Header::default(), &claims, &self.encoding_key)
            .map_err(|e| AuthError::TokenGeneration(e.to_string()))
    }

    async fn resolve(&self, token: &str) -> Result<Option<i64>, AuthError> {
        let Some(claims) = self.claims(token) else {
            return Ok(None);
        };
        let Ok(user_id) = claims.sub.parse::<i64>() else {
            return Ok(None);
        };
        if claims.generation != self.generation(user_id).await {
            debug!("Rejected revoked session token for user {}", user_id);
            return Ok(None);
        }
        Ok(Some(user_id))
    }

    async fn revoke(&self, token: &str) -> Result<(), AuthError> {
        let Some(user_id) = self.claims(token).and_then(|c| c.sub.parse::<i64>().ok()) else {
            return Ok(());
        };
        let mut generations = self.generations.write().await;
        let current = generations.entry(user_id).or_insert(0);
        *current += 1;
        info!("Revoked session tokens of user {} (generation {})", user_id, current);
        Ok(())
    }
}
