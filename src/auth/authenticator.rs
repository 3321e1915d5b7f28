use async_trait::async_trait;
use tracing::debug;

use super::token::TokenConfig;
use super::types::Identity;

/// Resolves a bearer token into an identity.
///
/// Authentication failure degrades to `Identity::Anonymous` rather than
/// erroring, so the handshake pipeline never aborts on a bad token; the
/// session gate makes the accept/reject decision on the resolved
/// identity.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn authenticate(&self, token: Option<&str>) -> Identity;
}

/// JWT-backed authenticator using HS256 signed tokens.
pub struct JwtAuthenticator {
    config: TokenConfig,
}

impl JwtAuthenticator {
    pub fn new(config: TokenConfig) -> Self {
        Self { config }
    }
}

#[async_trait]
impl Authenticator for JwtAuthenticator {
    async fn authenticate(&self, token: Option<&str>) -> Identity {
        let Some(token) = token else {
            return Identity::Anonymous;
        };

        match self.config.validate_token(token) {
            Ok(claims) if claims.is_staff => Identity::Staff {
                username: claims.username,
            },
            Ok(claims) => {
                debug!(username = %claims.username, "Token valid but user is not staff");
                Identity::Anonymous
            }
            Err(e) => {
                debug!(error = %e, "Token validation failed, treating as anonymous");
                Identity::Anonymous
            }
        }
    }
}
