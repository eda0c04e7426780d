//! Supersession tokens for request/response calls.
//!
//! Starting a call to an endpoint supersedes any earlier call to the same
//! endpoint; the earlier call's response must then be discarded.

use std::sync::atomic::{AtomicU64, Ordering};

/// Endpoints whose responses can be superseded.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RequestKind {
    ListSessions,
    LoadSession,
    CreateSession,
}

impl RequestKind {
    fn index(self) -> usize {
        match self {
            RequestKind::ListSessions => 0,
            RequestKind::LoadSession => 1,
            RequestKind::CreateSession => 2,
        }
    }
}

/// Identity of one call, compared against the latest before applying.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RequestToken {
    kind: RequestKind,
    seq: u64,
}

#[derive(Debug, Default)]
pub struct RequestTracker {
    latest: [AtomicU64; 3],
}

impl RequestTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a call, superseding earlier calls of the same kind.
    pub fn begin(&self, kind: RequestKind) -> RequestToken {
        let seq = self.latest[kind.index()].fetch_add(1, Ordering::SeqCst) + 1;
        RequestToken { kind, seq }
    }

    /// Whether no newer call of the same kind has started since `token`.
    pub fn is_current(&self, token: RequestToken) -> bool {
        self.latest[token.kind.index()].load(Ordering::SeqCst) == token.seq
    }
}
