//! Single-slot registry for the global key-press handler.
//!
//! The entry screen installs itself as the sole consumer of key presses for
//! its lifetime. Rather than a bare mutable slot that any caller can clobber,
//! the slot hands out an explicit [`KeySubscription`] on claim and takes it
//! back on release, so ownership of the handler position is visible in the
//! type system.

use anyhow::{bail, Result};

/// Proof that the holder currently owns the key-press slot.
///
/// The token is deliberately not `Clone`: there is exactly one live
/// subscription per claim, and releasing it consumes the token.
#[derive(Debug, PartialEq)]
pub struct KeySubscription {
    id: u64,
}

/// The process-wide key-press handler slot.
///
/// Single-writer discipline: at most one subscription is live at a time, and
/// a second `claim` while the slot is occupied is rejected instead of
/// silently replacing the previous handler.
#[derive(Debug, Default)]
pub struct KeyRouter {
    active: Option<u64>,
    next_id: u64,
}

impl KeyRouter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Claim the key-press slot.
    ///
    /// Fails if another subscription is still live; the previous holder must
    /// release first.
    pub fn claim(&mut self) -> Result<KeySubscription> {
        if self.active.is_some() {
            bail!("key-press handler slot is already claimed");
        }
        let id = self.next_id;
        self.next_id += 1;
        self.active = Some(id);
        Ok(KeySubscription { id })
    }

    /// Release a subscription, emptying the slot.
    ///
    /// A stale token (from a claim that was already superseded) is ignored so
    /// release stays infallible.
    pub fn release(&mut self, sub: KeySubscription) {
        if self.active == Some(sub.id) {
            self.active = None;
        }
    }

    /// Whether the slot currently has a live subscription.
    pub fn is_claimed(&self) -> bool {
        self.active.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claim_marks_slot_occupied() {
        let mut router = KeyRouter::new();
        assert!(!router.is_claimed());
        let sub = router.claim().expect("first claim succeeds");
        assert!(router.is_claimed());
        router.release(sub);
        assert!(!router.is_claimed());
    }

    #[test]
    fn second_claim_is_rejected() {
        let mut router = KeyRouter::new();
        let _sub = router.claim().unwrap();
        assert!(router.claim().is_err());
    }

    #[test]
    fn slot_is_reusable_after_release() {
        let mut router = KeyRouter::new();
        let sub = router.claim().unwrap();
        router.release(sub);
        assert!(router.claim().is_ok());
    }

    #[test]
    fn stale_release_does_not_clear_new_claim() {
        let mut router = KeyRouter::new();
        let old = router.claim().unwrap();
        router.release(old);
        let current = router.claim().unwrap();
        // Forge a token with the retired id; releasing it must not free the
        // slot out from under the current holder.
        let stale = KeySubscription { id: 0 };
        router.release(stale);
        assert!(router.is_claimed());
        router.release(current);
        assert!(!router.is_claimed());
    }
}
