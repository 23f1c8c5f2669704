//! First paint vs background refresh.

use crate::context::ContextKey;

/// `true` from a context change until the first response for that context settles.
#[derive(Debug, Clone)]
pub struct InitialLoad {
    context: ContextKey,
    epoch: u64,
    initial: bool,
}

impl InitialLoad {
    pub fn new(context: ContextKey, epoch: u64) -> Self {
        Self {
            context,
            epoch,
            initial: true,
        }
    }

    pub fn is_initial(&self) -> bool {
        self.initial
    }

    /// Record that a response (any page, success or failure) arrived.
    /// Returns true if this cleared the flag. Responses from other contexts are ignored.
    pub fn observe_response(&mut self, context: &ContextKey, epoch: u64) -> bool {
        if epoch != self.epoch || *context != self.context {
            return false;
        }
        let was = self.initial;
        self.initial = false;
        was
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn clears_once_and_never_comes_back() {
        let k = ContextKey::statement("a", "2026-03".parse().unwrap());
        let mut t = InitialLoad::new(k.clone(), 1);
        assert!(t.is_initial());
        assert!(t.observe_response(&k, 1));
        assert!(!t.is_initial());
        assert!(!t.observe_response(&k, 1));
        assert!(!t.is_initial());
    }

    #[test]
    fn other_context_does_not_clear() {
        let k = ContextKey::statement("a", "2026-03".parse().unwrap());
        let other = ContextKey::statement("b", "2026-03".parse().unwrap());
        let mut t = InitialLoad::new(k.clone(), 2);
        assert!(!t.observe_response(&other, 2));
        assert!(!t.observe_response(&k, 1));
        assert!(t.is_initial());
    }
}
