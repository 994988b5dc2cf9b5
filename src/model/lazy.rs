//! Insertion-ordered map with deferred, memoized entries.

use std::cell::{
    Cell,
    OnceCell,
};
use std::collections::HashMap;
use std::fmt;

/// Deferred constructor for a map value.
pub type Resolver<V> = Box<dyn FnOnce() -> V>;

/// A map entry: either resolved, or a resolver waiting for first access.
struct Slot<V> {
    /// The value once resolved.
    value: OnceCell<V>,
    /// Pending resolver, taken on first access.
    pending: Cell<Option<Resolver<V>>>,
}

impl<V> Slot<V> {
    /// A slot holding `value`.
    fn resolved(value: V) -> Self {
        Self { value: OnceCell::from(value), pending: Cell::new(None) }
    }

    /// A slot resolved by `resolver` on first access.
    fn stub(resolver: Resolver<V>) -> Self {
        Self { value: OnceCell::new(), pending: Cell::new(Some(resolver)) }
    }

    /// Returns the value, running the resolver on the first call.
    fn get(&self) -> Option<&V> {
        if let Some(value) = self.value.get() {
            return Some(value);
        }
        let resolver = self.pending.take()?;
        tracing::trace!("Resolving stub");
        Some(self.value.get_or_init(resolver))
    }

    /// Mutable variant of [`Slot::get`].
    fn get_mut(&mut self) -> Option<&mut V> {
        if self.value.get().is_none()
            && let Some(resolver) = self.pending.get_mut().take()
        {
            tracing::trace!("Resolving stub");
            let _ = self.value.set(resolver());
        }
        self.value.get_mut()
    }

    /// Whether the slot still waits for its resolver.
    fn is_pending(&self) -> bool {
        self.value.get().is_none()
    }
}

/// Map whose entries can be registered as stubs and resolved on first access.
///
/// Iteration follows insertion order; replacing an existing key keeps its position.
/// Stubs resolve at most once. The map is single-threaded: resolvers are neither
/// `Send` nor `Sync`, and so is the map.
pub struct LazyMap<V> {
    /// Entries by key.
    entries: HashMap<String, Slot<V>>,
    /// Keys in insertion order.
    order: Vec<String>,
}

impl<V> Default for LazyMap<V> {
    fn default() -> Self {
        Self { entries: HashMap::new(), order: Vec::new() }
    }
}

impl<V: fmt::Debug> fmt::Debug for LazyMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut map = f.debug_map();
        for key in &self.order {
            if let Some(slot) = self.entries.get(key) {
                match slot.value.get() {
                    Some(value) => map.entry(key, value),
                    None => map.entry(key, &format_args!("<stub>")),
                };
            }
        }
        map.finish()
    }
}

impl<V> LazyMap<V> {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a resolved value.
    pub fn insert(&mut self, key: impl Into<String>, value: V) {
        self.insert_slot(key.into(), Slot::resolved(value));
    }

    /// Registers `resolver` to produce the value for `key` on first access.
    pub fn set_stub<F>(&mut self, key: impl Into<String>, resolver: F)
    where
        F: FnOnce() -> V + 'static,
    {
        self.insert_slot(key.into(), Slot::stub(Box::new(resolver)));
    }

    /// Stores a slot, keeping the position of an existing key.
    fn insert_slot(&mut self, key: String, slot: Slot<V>) {
        if self.entries.insert(key.clone(), slot).is_none() {
            self.order.push(key);
        }
    }

    /// Membership test; never resolves stubs.
    #[must_use]
    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    /// Whether `key` is a stub that has not been resolved yet.
    #[must_use]
    pub fn is_pending(&self, key: &str) -> bool {
        self.entries.get(key).is_some_and(Slot::is_pending)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Option<&V> {
        self.entries.get(key).and_then(Slot::get)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut V> {
        self.entries.get_mut(key).and_then(Slot::get_mut)
    }

    /// Removes `key` without resolving it. Returns whether it was present.
    pub fn remove(&mut self, key: &str) -> bool {
        if self.entries.remove(key).is_none() {
            return false;
        }
        self.order.retain(|k| k != key);
        true
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.order.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Keys in insertion order; never resolves stubs.
    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Entries in insertion order, resolving stubs as they are reached.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &V)> {
        self.order
            .iter()
            .filter_map(|key| self.entries.get(key).and_then(Slot::get).map(|v| (key.as_str(), v)))
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.iter().map(|(_, v)| v)
    }
}
