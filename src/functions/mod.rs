//! Edge request handlers
//!
//! Small, stateless request/response functions deployed at the edge. They are
//! written as pure functions over bytes/queries so the same logic runs under
//! any HTTP shim and stays unit-testable.

pub mod credential;
pub mod stats;

pub use credential::verify_password;
pub use stats::{StatsQuery, UpstreamFetch, game_stats};

use serde_json::Value;

/// A JSON response with an HTTP status code
#[derive(Debug, Clone, PartialEq)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn json(status: u16, body: Value) -> Self {
        Self { status, body }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}
