use async_trait::async_trait;
use trivia_error::Error;
use trivia_types::{AnonId, PlayerId, Stake};

/// Decoded token claims. The token format itself lives outside the
/// core; this is only the shape `verify_token` hands back.
#[derive(Debug, Clone)]
pub struct AuthClaims {
    pub player_id: PlayerId,
    pub stake: Option<Stake>,
    pub anon_id: Option<AnonId>,
}

/// Token verification, explicitly "outside the core" — engines accept
/// already-verified `AuthClaims`, never a raw token.
#[async_trait]
pub trait Authenticator: Send + Sync {
    async fn verify_token(&self, raw: &str) -> Result<AuthClaims, Error>;
}
