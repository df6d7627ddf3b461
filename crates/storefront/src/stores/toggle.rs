//! Optimistic on/off state, such as the wishlist heart.

use std::collections::HashMap;
use std::future::Future;
use std::hash::Hash;
use std::sync::{Arc, Mutex, PoisonError};

/// Displayed on/off flags keyed by `K`.
///
/// [`toggle`](Self::toggle) flips the flag before the mutation runs and puts
/// back only that key's prior value if the mutation fails. Overlapping toggles
/// of the same key are not serialized; the last one to finish wins.
#[derive(Debug)]
pub struct OptimisticToggles<K> {
    shown: Arc<Mutex<HashMap<K, bool>>>,
}

impl<K> Clone for OptimisticToggles<K> {
    fn clone(&self) -> Self {
        Self {
            shown: Arc::clone(&self.shown),
        }
    }
}

impl<K> Default for OptimisticToggles<K> {
    fn default() -> Self {
        Self {
            shown: Arc::new(Mutex::new(HashMap::new())),
        }
    }
}

impl<K: Eq + Hash + Clone> OptimisticToggles<K> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The displayed value; unknown keys are off.
    #[must_use]
    pub fn get(&self, key: &K) -> bool {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .copied()
            .unwrap_or(false)
    }

    /// Set the displayed value without a mutation.
    pub fn set(&self, key: K, value: bool) {
        self.shown
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key, value);
    }

    /// Flip `key`, then run `mutate` with the new value.
    ///
    /// # Errors
    ///
    /// Returns the mutation's error after restoring the previous value of `key`.
    pub async fn toggle<F, Fut, E>(&self, key: K, mutate: F) -> Result<bool, E>
    where
        F: FnOnce(bool) -> Fut,
        Fut: Future<Output = Result<(), E>>,
    {
        let previous = self.get(&key);
        let next = !previous;
        self.set(key.clone(), next);

        match mutate(next).await {
            Ok(()) => Ok(next),
            Err(e) => {
                self.set(key, previous);
                Err(e)
            }
        }
    }
}
