//! Immutable ordered containers with structural sharing
//!
//! Every update returns a new container; the receiver is left untouched.
//! Roots are reference counted, so cloning a container is O(1). Because the
//! receiver keeps its root, an update copies the tree once; bulk updates
//! ([`PersistentMap::join_with`], [`PersistentSet::union`]) copy it at most
//! once for the whole batch and not at all when nothing changes.
//! Ordered storage keeps iteration (and therefore encoding) deterministic.

use std::{
    collections::{BTreeMap, BTreeSet},
    fmt,
    sync::Arc,
};

/// Persistent key/value map
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PersistentMap<K, V> {
    root: Arc<BTreeMap<K, V>>,
}

impl<K, V> PersistentMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    pub fn new() -> Self {
        Self {
            root: Arc::new(BTreeMap::new()),
        }
    }

    pub fn get(&self, key: &K) -> Option<&V> {
        self.root.get(key)
    }

    pub fn contains_key(&self, key: &K) -> bool {
        self.root.contains_key(key)
    }

    /// Return a new map with `key` bound to `value`
    #[must_use]
    pub fn set(&self, key: K, value: V) -> Self {
        let mut next = self.clone();
        Arc::make_mut(&mut next.root).insert(key, value);
        next
    }

    /// Return a new map with `key` bound to `f(current)`
    #[must_use]
    pub fn update<F>(&self, key: K, f: F) -> Self
    where
        F: FnOnce(Option<&V>) -> V,
    {
        let value = f(self.root.get(&key));
        self.set(key, value)
    }

    /// Fold `entries` into a new map in one pass.
    ///
    /// `join` receives the current binding (if any) and the incoming value
    /// and returns `Some(value)` to rebind the key or `None` to keep the
    /// current binding. The root is copied at most once, on the first
    /// rebinding; if nothing is rebound the result shares the receiver's
    /// root.
    #[must_use]
    pub fn join_with<'a, I, F>(&self, entries: I, mut join: F) -> Self
    where
        I: IntoIterator<Item = (&'a K, &'a V)>,
        K: 'a,
        V: 'a,
        F: FnMut(Option<&V>, &V) -> Option<V>,
    {
        let mut next = self.clone();
        for (key, theirs) in entries {
            if let Some(value) = join(next.root.get(key), theirs) {
                // Unique after the first call, so later calls do not copy.
                Arc::make_mut(&mut next.root).insert(key.clone(), value);
            }
        }
        next
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&K, &V)> {
        self.root.iter()
    }

    pub fn keys(&self) -> impl Iterator<Item = &K> {
        self.root.keys()
    }

    pub fn values(&self) -> impl Iterator<Item = &V> {
        self.root.values()
    }

    /// True when both maps share the same root
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}

impl<K, V> Default for PersistentMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<K, V> FromIterator<(K, V)> for PersistentMap<K, V>
where
    K: Ord + Clone,
    V: Clone,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            root: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<K: fmt::Debug, V: fmt::Debug> fmt::Debug for PersistentMap<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.root.iter()).finish()
    }
}

/// Persistent ordered set
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct PersistentSet<T> {
    root: Arc<BTreeSet<T>>,
}

impl<T> PersistentSet<T>
where
    T: Ord + Clone,
{
    pub fn new() -> Self {
        Self {
            root: Arc::new(BTreeSet::new()),
        }
    }

    pub fn contains(&self, item: &T) -> bool {
        self.root.contains(item)
    }

    /// Return a new set that also contains `item`
    #[must_use]
    pub fn insert(&self, item: T) -> Self {
        if self.root.contains(&item) {
            return self.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.root).insert(item);
        next
    }

    /// Return the union of both sets.
    ///
    /// Shares a root with one of the operands whenever that operand
    /// already contains the other.
    #[must_use]
    pub fn union(&self, other: &Self) -> Self {
        if Arc::ptr_eq(&self.root, &other.root) || other.root.is_subset(&self.root) {
            return self.clone();
        }
        if self.root.is_subset(&other.root) {
            return other.clone();
        }
        let mut next = self.clone();
        Arc::make_mut(&mut next.root).extend(other.root.iter().cloned());
        next
    }

    pub fn len(&self) -> usize {
        self.root.len()
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> {
        self.root.iter()
    }

    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.root, &other.root)
    }
}

impl<T> Default for PersistentSet<T>
where
    T: Ord + Clone,
{
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromIterator<T> for PersistentSet<T>
where
    T: Ord + Clone,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        Self {
            root: Arc::new(iter.into_iter().collect()),
        }
    }
}

impl<T: fmt::Debug> fmt::Debug for PersistentSet<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.root.iter()).finish()
    }
}
