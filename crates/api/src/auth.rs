//! Token provider seam for catalog authorization.
//!
//! The client does not know how tokens are minted. Hosts inject whatever
//! credential chain they run with behind [`TokenProvider`]; the client asks
//! for a bearer token per request and attaches it to the Authorization
//! header.

use anyhow::Result;

/// Scopes requested when authorizing catalog management calls.
pub const MANAGEMENT_SCOPES: &[&str] = &["https://management.azure.com/.default"];

/// Capability to produce a bearer token for a set of scopes.
#[async_trait::async_trait]
pub trait TokenProvider: Send + Sync {
    async fn get_token(&self, scopes: &[&str]) -> Result<String>;
}

/// Fixed-token provider for tests and environments where a token is issued
/// out of band.
#[derive(Clone, Debug)]
pub struct StaticTokenProvider {
    token: String,
}

impl StaticTokenProvider {
    pub fn new(token: impl Into<String>) -> Self {
        Self { token: token.into() }
    }
}

#[async_trait::async_trait]
impl TokenProvider for StaticTokenProvider {
    async fn get_token(&self, _scopes: &[&str]) -> Result<String> {
        Ok(self.token.clone())
    }
}
