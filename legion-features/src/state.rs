//! Cached last-known feature state.

use parking_lot::Mutex;

/// The last state a feature is known to hold.
///
/// Trusted only right after a successful query decode or a fully
/// completed transition sequence. Cleared when a sequence aborts
/// partway, since the hardware may have applied part of it; the next
/// read falls back to the feature's safe baseline until a query
/// succeeds again.
pub(crate) struct StateCell<S: Copy> {
    inner: Mutex<Option<S>>,
    default: S,
}

impl<S: Copy> StateCell<S> {
    pub fn seed(default: S, initial: Option<S>) -> Self {
        Self {
            inner: Mutex::new(initial),
            default,
        }
    }

    pub fn set(&self, state: S) {
        *self.inner.lock() = Some(state);
    }

    pub fn clear(&self) {
        *self.inner.lock() = None;
    }

    pub fn get(&self) -> Option<S> {
        *self.inner.lock()
    }

    /// Last known state, or the feature's safe baseline.
    pub fn or_default(&self) -> S {
        self.inner.lock().unwrap_or(self.default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn falls_back_to_default_until_known() {
        let cell = StateCell::seed(7u32, None);
        assert_eq!(cell.get(), None);
        assert_eq!(cell.or_default(), 7);

        cell.set(3);
        assert_eq!(cell.get(), Some(3));
        assert_eq!(cell.or_default(), 3);

        cell.clear();
        assert_eq!(cell.or_default(), 7);
    }
}
