//! Single-flight tracking for the process-wide translation slot.

use tokio_util::sync::CancellationToken;

/// Handle for one started request. Carries the request's cancel token and
/// its position in the supersession order.
#[derive(Debug, Clone)]
pub struct RequestHandle {
    seq: u64,
    token: CancellationToken,
}

impl RequestHandle {
    pub fn token(&self) -> &CancellationToken {
        &self.token
    }
}

struct ActiveRequest {
    seq: u64,
    token: CancellationToken,
    source_chars: usize,
}

/// The one slot a translation request may occupy.
///
/// `start` aborts whatever was in the slot before taking it, so at most one
/// live cancel token exists at any time. `clear` is compare-and-clear: a
/// settled request releases the slot only if it still owns it, which keeps
/// a superseding request's token from being clobbered by a late finisher.
pub struct RequestLifecycle {
    current: Option<ActiveRequest>,
    next_seq: u64,
}

impl RequestLifecycle {
    pub fn new() -> Self {
        Self { current: None, next_seq: 0 }
    }

    /// Claim the slot for a new request, aborting any predecessor.
    pub fn start(&mut self, source: &str) -> RequestHandle {
        if let Some(prev) = self.current.take() {
            prev.token.cancel();
        }
        self.next_seq += 1;
        let token = CancellationToken::new();
        self.current = Some(ActiveRequest {
            seq: self.next_seq,
            token: token.clone(),
            source_chars: source.chars().count(),
        });
        RequestHandle { seq: self.next_seq, token }
    }

    /// Release the slot if `handle` still owns it. Returns whether it did;
    /// `false` means a later request superseded this one.
    pub fn clear(&mut self, handle: &RequestHandle) -> bool {
        match &self.current {
            Some(active) if active.seq == handle.seq => {
                self.current = None;
                true
            }
            _ => false,
        }
    }

    /// Abort the active request without releasing the slot; the owning flow
    /// settles and clears it itself. Returns whether anything was in flight.
    pub fn cancel_current(&mut self) -> bool {
        match &self.current {
            Some(active) => {
                active.token.cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.current.is_some()
    }

    /// Size of the in-flight source text, for logging.
    pub fn active_chars(&self) -> Option<usize> {
        self.current.as_ref().map(|a| a.source_chars)
    }
}

impl Default for RequestLifecycle {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "lifecycle_tests.rs"]
mod tests;
