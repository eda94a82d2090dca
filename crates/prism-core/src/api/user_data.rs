// Copyright 2025 eraflo
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Auxiliary state attached to API objects.
//!
//! Every object of the abstraction owns a [`UserDataSlots`] map. External code
//! stores its own values there under a 128-bit [`UserDataKey`] instead of
//! wrapping or subclassing the object. Values are owned by the map: they are
//! dropped when replaced, removed, cleared, or when the owning object drops.
//!
//! # Example
//!
//! ```rust
//! use prism_core::api::user_data::{UserDataKey, UserDataSlots};
//!
//! const FRAME_STATS: UserDataKey = UserDataKey::from_u128(0x6c1e_54b2_0d8f_4a3c_9e21_7f90_b3a4_c5d6);
//!
//! let slots = UserDataSlots::default();
//! slots.set(FRAME_STATS, 0u64);
//! slots.with_mut(FRAME_STATS, |frames: &mut u64| *frames += 1);
//! assert_eq!(slots.get_cloned::<u64>(FRAME_STATS), Some(1));
//! ```

use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};
use uuid::Uuid;

/// The 128-bit identifier a user-data value is stored under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct UserDataKey(pub Uuid);

impl UserDataKey {
    /// Builds a key from a 128-bit constant.
    pub const fn from_u128(value: u128) -> Self {
        Self(Uuid::from_u128(value))
    }

    /// Generates a fresh random key.
    pub fn new_v4() -> Self {
        Self(Uuid::new_v4())
    }

    /// Derives a stable key from a namespace and a name.
    pub fn from_name(namespace: &Uuid, name: &str) -> Self {
        Self(Uuid::new_v5(namespace, name.as_bytes()))
    }
}

impl fmt::Display for UserDataKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

impl From<Uuid> for UserDataKey {
    fn from(uuid: Uuid) -> Self {
        Self(uuid)
    }
}

/// Type-erased storage for user data, keyed by [`UserDataKey`].
///
/// The typed accessors downcast to the requested type; asking for a value
/// under the wrong type behaves as if the slot were empty. Closures passed to
/// [`with`](Self::with) and [`with_mut`](Self::with_mut) must not call back
/// into the same map.
#[derive(Default)]
pub struct UserDataSlots {
    slots: Mutex<HashMap<UserDataKey, Box<dyn Any + Send + Sync>>>,
}

impl UserDataSlots {
    /// Creates an empty map.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, HashMap<UserDataKey, Box<dyn Any + Send + Sync>>> {
        self.slots.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Stores `value` under `key`, taking ownership of it.
    ///
    /// ## Returns
    /// The value previously stored under `key` when it had the same type. A
    /// previous value of another type is dropped.
    pub fn set<T: Any + Send + Sync>(&self, key: UserDataKey, value: T) -> Option<T> {
        self.lock()
            .insert(key, Box::new(value))
            .and_then(|old| old.downcast::<T>().ok())
            .map(|old| *old)
    }

    /// Runs `f` on the value stored under `key`.
    pub fn with<T: Any, R>(&self, key: UserDataKey, f: impl FnOnce(&T) -> R) -> Option<R> {
        let slots = self.lock();
        slots.get(&key).and_then(|v| v.downcast_ref::<T>()).map(f)
    }

    /// Runs `f` on a mutable borrow of the value stored under `key`.
    pub fn with_mut<T: Any, R>(&self, key: UserDataKey, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut slots = self.lock();
        slots.get_mut(&key).and_then(|v| v.downcast_mut::<T>()).map(f)
    }

    /// Returns a clone of the value stored under `key`.
    #[must_use]
    pub fn get_cloned<T: Any + Clone>(&self, key: UserDataKey) -> Option<T> {
        self.with(key, T::clone)
    }

    /// Removes the value stored under `key` and hands ownership back.
    ///
    /// A value of another type stays in place.
    pub fn take<T: Any + Send + Sync>(&self, key: UserDataKey) -> Option<T> {
        let mut slots = self.lock();
        if !slots.get(&key).is_some_and(|v| v.is::<T>()) {
            return None;
        }
        slots
            .remove(&key)
            .and_then(|v| v.downcast::<T>().ok())
            .map(|v| *v)
    }

    /// Drops the value stored under `key`, whatever its type.
    pub fn remove(&self, key: UserDataKey) -> bool {
        self.lock().remove(&key).is_some()
    }

    /// `true` when a value of any type is stored under `key`.
    #[must_use]
    pub fn contains(&self, key: UserDataKey) -> bool {
        self.lock().contains_key(&key)
    }

    /// Drops every stored value.
    pub fn clear(&self) {
        self.lock().clear();
    }

    /// Number of occupied slots.
    #[must_use]
    pub fn len(&self) -> usize {
        self.lock().len()
    }

    /// `true` when no slot is occupied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for UserDataSlots {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut keys: Vec<_> = self.lock().keys().copied().collect();
        keys.sort();
        f.debug_struct("UserDataSlots").field("keys", &keys).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    const KEY_A: UserDataKey = UserDataKey::from_u128(1);
    const KEY_B: UserDataKey = UserDataKey::from_u128(2);

    struct DropCounter(Arc<AtomicUsize>);

    impl Drop for DropCounter {
        fn drop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[test]
    fn set_returns_previous_value_of_same_type() {
        let slots = UserDataSlots::new();
        assert_eq!(slots.set(KEY_A, 1u32), None);
        assert_eq!(slots.set(KEY_A, 2u32), Some(1));
        assert_eq!(slots.set(KEY_A, "text"), None);
        assert_eq!(slots.get_cloned::<&str>(KEY_A), Some("text"));
    }

    #[test]
    fn wrong_type_reads_as_empty_and_take_leaves_it() {
        let slots = UserDataSlots::new();
        slots.set(KEY_A, 5i32);
        assert_eq!(slots.get_cloned::<u32>(KEY_A), None);
        assert_eq!(slots.take::<u32>(KEY_A), None);
        assert!(slots.contains(KEY_A));
        assert_eq!(slots.take::<i32>(KEY_A), Some(5));
        assert!(!slots.contains(KEY_A));
    }

    #[test]
    fn values_drop_on_remove_clear_and_owner_drop() {
        let drops = Arc::new(AtomicUsize::new(0));
        let slots = UserDataSlots::new();
        slots.set(KEY_A, DropCounter(drops.clone()));
        slots.set(KEY_B, DropCounter(drops.clone()));

        assert!(slots.remove(KEY_A));
        assert_eq!(drops.load(Ordering::SeqCst), 1);

        slots.set(KEY_A, DropCounter(drops.clone()));
        slots.clear();
        assert_eq!(drops.load(Ordering::SeqCst), 3);

        slots.set(KEY_A, DropCounter(drops.clone()));
        drop(slots);
        assert_eq!(drops.load(Ordering::SeqCst), 4);
    }

    #[test]
    fn named_keys_are_stable() {
        let ns = Uuid::from_u128(0x1234);
        assert_eq!(
            UserDataKey::from_name(&ns, "overlay"),
            UserDataKey::from_name(&ns, "overlay")
        );
        assert_ne!(UserDataKey::new_v4(), UserDataKey::new_v4());
    }
}
