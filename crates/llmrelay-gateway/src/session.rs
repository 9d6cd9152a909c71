//! Session verification: who, if anyone, is making this request.
//!
//! Authentication proper lives outside llmrelay. The gateway only asks a
//! [`SessionVerifier`] whether the inbound request carries a session and
//! refuses the guarded routes when it doesn't.

use std::collections::HashMap;

use async_trait::async_trait;
use axum::http::header::AUTHORIZATION;
use axum::http::HeaderMap;

/// An authenticated caller.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Session {
    pub user_id: String,
}

/// Resolves the session attached to an inbound request.
#[async_trait]
pub trait SessionVerifier: Send + Sync {
    /// The request's session, or `None` when it has none (or an invalid one).
    async fn verify(&self, headers: &HeaderMap) -> Option<Session>;
}

/// Static bearer tokens mapped to user ids, read from `gateway.sessionTokens`.
///
/// With no tokens configured, no request has a session.
#[derive(Clone, Default)]
pub struct TokenSessions {
    tokens: HashMap<String, String>,
}

impl TokenSessions {
    pub fn new(tokens: HashMap<String, String>) -> Self {
        Self { tokens }
    }
}

impl std::fmt::Debug for TokenSessions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenSessions")
            .field("tokens", &self.tokens.len())
            .finish()
    }
}

#[async_trait]
impl SessionVerifier for TokenSessions {
    async fn verify(&self, headers: &HeaderMap) -> Option<Session> {
        let value = headers.get(AUTHORIZATION)?.to_str().ok()?;
        let token = value.strip_prefix("Bearer ")?.trim();
        let user_id = self.tokens.get(token)?;
        if user_id.is_empty() {
            return None;
        }
        Some(Session {
            user_id: user_id.clone(),
        })
    }
}
