#![forbid(unsafe_code)]

//! Cancellable "run on the next frame" scheduling.
//!
//! Hosts provide the real primitive (`requestAnimationFrame` in a browser).
//! Components hold at most one outstanding [`FrameToken`] and ignore callbacks
//! whose token they no longer hold, so a cancelled or superseded request can
//! never write state.

use serde::{Deserialize, Serialize};

/// Handle for one requested frame callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct FrameToken(u64);

impl FrameToken {
    #[inline]
    pub const fn new(id: u64) -> Self {
        Self(id)
    }

    #[inline]
    pub const fn id(self) -> u64 {
        self.0
    }
}

/// Register and cancel next-frame callbacks.
pub trait FrameScheduler {
    /// Ask the host to call back on its next frame.
    fn request_frame(&mut self) -> FrameToken;

    /// Withdraw a pending request. Unknown tokens are ignored.
    fn cancel_frame(&mut self, token: FrameToken);
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for &mut T {
    fn request_frame(&mut self) -> FrameToken {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        (**self).cancel_frame(token);
    }
}

impl<T: FrameScheduler + ?Sized> FrameScheduler for Box<T> {
    fn request_frame(&mut self) -> FrameToken {
        (**self).request_frame()
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        (**self).cancel_frame(token);
    }
}

/// Deterministic scheduler for host-driven loops and tests.
///
/// Requests queue up until the host drains them with
/// [`take_pending`](Self::take_pending) and delivers each token back to its
/// owner.
#[derive(Debug, Clone, Default)]
pub struct ManualFrameScheduler {
    next_id: u64,
    pending: Vec<FrameToken>,
    requested: u64,
    cancelled: u64,
}

impl ManualFrameScheduler {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Tokens requested and not yet cancelled or taken.
    #[inline]
    pub fn pending(&self) -> &[FrameToken] {
        &self.pending
    }

    #[inline]
    pub fn has_pending(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Drain all pending tokens, oldest first.
    pub fn take_pending(&mut self) -> Vec<FrameToken> {
        std::mem::take(&mut self.pending)
    }

    /// Total requests made.
    #[inline]
    pub fn requested_count(&self) -> u64 {
        self.requested
    }

    /// Total cancellations of pending tokens.
    #[inline]
    pub fn cancelled_count(&self) -> u64 {
        self.cancelled
    }
}

impl FrameScheduler for ManualFrameScheduler {
    fn request_frame(&mut self) -> FrameToken {
        self.next_id += 1;
        self.requested += 1;
        let token = FrameToken(self.next_id);
        self.pending.push(token);
        token
    }

    fn cancel_frame(&mut self, token: FrameToken) {
        let before = self.pending.len();
        self.pending.retain(|pending| *pending != token);
        if self.pending.len() != before {
            self.cancelled += 1;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tokens_are_unique_and_ordered() {
        let mut scheduler = ManualFrameScheduler::new();
        let a = scheduler.request_frame();
        let b = scheduler.request_frame();
        assert!(a < b);
        assert_eq!(scheduler.take_pending(), vec![a, b]);
        assert!(!scheduler.has_pending());
    }

    #[test]
    fn cancel_removes_only_pending_tokens() {
        let mut scheduler = ManualFrameScheduler::new();
        let a = scheduler.request_frame();
        scheduler.cancel_frame(a);
        scheduler.cancel_frame(a);
        scheduler.cancel_frame(FrameToken::new(99));
        assert_eq!(scheduler.cancelled_count(), 1);
        assert_eq!(scheduler.requested_count(), 1);
        assert!(scheduler.pending().is_empty());
    }

    #[test]
    fn works_through_mut_ref() {
        fn drive(mut s: impl FrameScheduler) -> FrameToken {
            s.request_frame()
        }
        let mut scheduler = ManualFrameScheduler::new();
        let token = drive(&mut scheduler);
        assert_eq!(scheduler.pending(), &[token]);
    }
}
