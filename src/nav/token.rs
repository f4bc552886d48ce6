//! Operation tokens serializing region commits.

use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one navigation or submission
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct OperationToken(u64);

impl OperationToken {
    pub fn value(&self) -> u64 {
        self.0
    }
}

impl std::fmt::Display for OperationToken {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Issues monotonically increasing tokens; only the latest may commit.
#[derive(Debug, Default)]
pub struct OperationTokens {
    latest: AtomicU64,
}

impl OperationTokens {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a new operation, invalidating every earlier one
    pub fn issue(&self) -> OperationToken {
        OperationToken(self.latest.fetch_add(1, Ordering::SeqCst) + 1)
    }

    pub fn is_current(&self, token: OperationToken) -> bool {
        self.latest.load(Ordering::SeqCst) == token.0
    }
}
