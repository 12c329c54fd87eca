//! Interactive login seam.

use async_trait::async_trait;

use crate::credential::TokenGrant;
use crate::error::LoginError;

/// Obtains the first token set, usually through a browser based
/// authorization code flow run by the host application.
#[async_trait]
pub trait InteractiveLogin: Send + Sync {
    /// Runs the login flow once.
    async fn login(&self) -> Result<TokenGrant, LoginError>;
}

/// Login that hands out a token set obtained elsewhere.
///
/// Useful when the host application has already completed the flow, and in
/// tests.
#[derive(Debug, Clone)]
pub struct StaticLogin {
    grant: TokenGrant,
}

impl StaticLogin {
    /// Creates a login returning `grant`.
    pub fn new(grant: TokenGrant) -> Self {
        Self { grant }
    }
}

#[async_trait]
impl InteractiveLogin for StaticLogin {
    async fn login(&self) -> Result<TokenGrant, LoginError> {
        Ok(self.grant.clone())
    }
}
