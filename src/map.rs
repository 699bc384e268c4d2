//! A dense hash map keeping every entry in one contiguous cell array.

use core::borrow::Borrow;
use core::fmt::{self, Debug};
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;
use core::marker::PhantomData;
use core::ptr::NonNull;

use crate::error::Error;
use crate::table::Table;
use crate::util;
use crate::{DefaultHashBuilder, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD};

/// A hash map backed by a single contiguous array of cells.
///
/// The array is split into a primary region addressed directly by hashing
/// and a collision region that absorbs overflow; colliding entries are
/// chained through indices embedded in the cells themselves, so the map
/// never allocates per entry. Lookups, inserts and removals stay O(1)
/// amortized up to sizes in the millions.
///
/// Unlike `std::collections::HashMap`, [`insert`](Self::insert) never
/// overwrites: inserting a present key is a no-op that returns `false`.
/// Use the [`Entry`] API or [`get_mut`](Self::get_mut) to update values
/// in place.
///
/// Any mutating operation may invalidate all outstanding iterators;
/// iteration order is cell order and unrelated to insertion order.
pub struct HashMap<K, V, S = DefaultHashBuilder> {
    table: Table<K, V>,
    hash_builder: S,
}

impl<K, V> HashMap<K, V, DefaultHashBuilder> {
    /// Creates a map with room for `capacity` cells.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `capacity` is zero,
    /// [`Error::CapacityOverflow`] if it exceeds
    /// [`max_capacity`](Self::max_capacity), or
    /// [`Error::AllocationFailure`] if the allocator refuses the request.
    pub fn with_capacity(capacity: usize) -> Result<Self, Error> {
        Self::with_capacity_and_hasher(capacity, DefaultHashBuilder::default())
    }
}

impl<K, V, S> HashMap<K, V, S> {
    /// Creates a map with room for `capacity` cells, hashing keys with
    /// `hash_builder`.
    ///
    /// # Errors
    /// As [`with_capacity`](HashMap::with_capacity).
    pub fn with_capacity_and_hasher(capacity: usize, hash_builder: S) -> Result<Self, Error> {
        Ok(Self {
            table: Table::with_capacity(capacity, DEFAULT_MAX_LOAD)?,
            hash_builder,
        })
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.table.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }

    /// Total cell count, including the collision region.
    #[must_use]
    pub fn capacity(&self) -> usize {
        self.table.capacity()
    }

    /// Upper bound on [`capacity`](Self::capacity) for this cell size.
    #[must_use]
    pub fn max_capacity() -> usize {
        Table::<K, V>::max_capacity()
    }

    #[must_use]
    pub fn max_load_factor(&self) -> f64 {
        self.table.max_load()
    }

    /// Sets the load factor beyond which inserts grow the map.
    ///
    /// # Errors
    /// [`Error::InvalidArgument`] if `max_load` is outside `(0, 1]`.
    pub fn set_max_load_factor(&mut self, max_load: f64) -> Result<(), Error> {
        self.table.set_max_load(max_load)
    }

    #[must_use]
    pub fn hasher(&self) -> &S {
        &self.hash_builder
    }

    /// Marks every cell empty. Keeps the current capacity.
    pub fn clear(&mut self) {
        self.table.clear();
    }

    /// Exchanges the entire contents of two maps.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_, K, V> {
        Iter {
            index: self.table.next_occupied(0),
            remaining: self.table.len(),
            table: &self.table,
        }
    }

    #[must_use]
    pub fn iter_mut(&mut self) -> IterMut<'_, K, V> {
        IterMut {
            index: self.table.next_occupied(0),
            remaining: self.table.len(),
            table: NonNull::from(&mut self.table),
            _marker: PhantomData,
        }
    }

    #[must_use]
    pub fn keys(&self) -> Keys<'_, K, V> {
        Keys { inner: self.iter() }
    }

    #[must_use]
    pub fn values(&self) -> Values<'_, K, V> {
        Values { inner: self.iter() }
    }

    #[must_use]
    pub fn values_mut(&mut self) -> ValuesMut<'_, K, V> {
        ValuesMut {
            inner: self.iter_mut(),
        }
    }
}

impl<K, V, S> HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts `key`/`value` unless the key is already present. Returns
    /// whether a new entry was created; an existing entry is left
    /// untouched either way.
    ///
    /// # Panics
    /// If growing the map fails, either because the doubled capacity
    /// exceeds [`max_capacity`](Self::max_capacity) or because the
    /// allocator refuses the replacement array.
    pub fn insert(&mut self, key: K, value: V) -> bool {
        let Self {
            table,
            hash_builder,
        } = self;
        let hasher = |key: &K| util::hash_of(&*hash_builder, key);
        match table.insert(key, value, &hasher) {
            Ok((_, inserted)) => inserted,
            Err(err) => panic!("hash map growth failed: {err}"),
        }
    }

    #[must_use]
    pub fn get<Q>(&self, key: &Q) -> Option<&V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = util::hash_of(&self.hash_builder, key);
        let index = self.table.lookup(hash, |existing| existing.borrow() == key)?;
        Some(self.table.value_at(index))
    }

    #[must_use]
    pub fn get_mut<Q>(&mut self, key: &Q) -> Option<&mut V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = util::hash_of(&self.hash_builder, key);
        let index = self.table.lookup(hash, |existing| existing.borrow() == key)?;
        Some(self.table.value_at_mut(index))
    }

    /// Like [`get`](Self::get), but an absent key is an error.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the key is not present.
    pub fn at<Q>(&self, key: &Q) -> Result<&V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).ok_or(Error::NotFound)
    }

    /// Like [`get_mut`](Self::get_mut), but an absent key is an error.
    ///
    /// # Errors
    /// [`Error::NotFound`] if the key is not present.
    pub fn at_mut<Q>(&mut self, key: &Q) -> Result<&mut V, Error>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get_mut(key).ok_or(Error::NotFound)
    }

    #[must_use]
    pub fn contains_key<Q>(&self, key: &Q) -> bool
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(key).is_some()
    }

    /// Removes the entry for `key` and returns its value.
    pub fn remove<Q>(&mut self, key: &Q) -> Option<V>
    where
        K: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = util::hash_of(&self.hash_builder, key);
        self.table
            .remove(hash, |existing| existing.borrow() == key)
            .map(|(_, value)| value)
    }

    /// A view into the cell for `key`, occupied or vacant.
    pub fn entry(&mut self, key: K) -> Entry<'_, K, V, S> {
        let hash = util::hash_of(&self.hash_builder, &key);
        match self.table.lookup(hash, |existing| *existing == key) {
            Some(index) => Entry::Occupied(OccupiedEntry { map: self, index }),
            None => Entry::Vacant(VacantEntry { map: self, key }),
        }
    }

    /// Keeps only the entries for which `pred` returns `true`.
    pub fn retain(&mut self, mut pred: impl FnMut(&K, &mut V) -> bool) {
        let Self {
            table,
            hash_builder,
        } = self;
        let mut index = table.next_occupied(0);
        while index < table.capacity() {
            let erase = {
                let (key, value) = table.entry_at_mut(index);
                if pred(key, value) {
                    None
                } else {
                    Some(util::hash_of(&*hash_builder, key))
                }
            };
            match erase {
                None => index = table.next_occupied(index + 1),
                Some(hash) => {
                    let probe = table.probe_at(index, hash);
                    table.remove_probed(probe);
                    // Erasing a chain head swaps a successor into this
                    // cell, so retest the same index.
                    index = table.next_occupied(index);
                }
            }
        }
    }

    /// Inserts every entry of `other` whose key is absent here. `other`
    /// is left unchanged.
    pub fn merge(&mut self, other: &Self)
    where
        K: Clone,
        V: Clone,
    {
        for (key, value) in other {
            if !self.contains_key(key) {
                self.insert(key.clone(), value.clone());
            }
        }
    }

    /// Rebuilds the map with at least `capacity` cells, invalidating all
    /// iterators.
    ///
    /// # Errors
    /// [`Error::CapacityOverflow`] or [`Error::AllocationFailure`] if the
    /// replacement array cannot be built; the map is unchanged in that
    /// case.
    pub fn rehash(&mut self, capacity: usize) -> Result<(), Error> {
        let Self {
            table,
            hash_builder,
        } = self;
        let hasher = |key: &K| util::hash_of(&*hash_builder, key);
        table.rehash(capacity, &hasher)
    }

    /// Grows the map if `entries` would not fit under the load ceiling;
    /// otherwise does nothing.
    ///
    /// # Errors
    /// As [`rehash`](Self::rehash).
    pub fn reserve(&mut self, entries: usize) -> Result<(), Error> {
        let Self {
            table,
            hash_builder,
        } = self;
        let hasher = |key: &K| util::hash_of(&*hash_builder, key);
        table.reserve(entries, &hasher)
    }
}

impl<K, V, S: Default> Default for HashMap<K, V, S> {
    fn default() -> Self {
        match Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default()) {
            Ok(map) => map,
            Err(err) => panic!("failed to allocate the default table: {err}"),
        }
    }
}

impl<K: Debug, V: Debug, S> Debug for HashMap<K, V, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K, V, S> Extend<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = (K, V)>>(&mut self, iter: I) {
        for (key, value) in iter {
            self.insert(key, value);
        }
    }
}

impl<K, V, S> FromIterator<(K, V)> for HashMap<K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut map = Self::default();
        map.extend(iter);
        map
    }
}

impl<'a, K, V, S> IntoIterator for &'a HashMap<K, V, S> {
    type Item = (&'a K, &'a V);
    type IntoIter = Iter<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a, K, V, S> IntoIterator for &'a mut HashMap<K, V, S> {
    type Item = (&'a K, &'a mut V);
    type IntoIter = IterMut<'a, K, V>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter_mut()
    }
}

/// A view into a single map cell, returned by
/// [`HashMap::entry`](HashMap::entry).
pub enum Entry<'a, K, V, S = DefaultHashBuilder> {
    Occupied(OccupiedEntry<'a, K, V, S>),
    Vacant(VacantEntry<'a, K, V, S>),
}

impl<'a, K, V, S> Entry<'a, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts `default` if the cell is vacant, then returns a reference
    /// to the value.
    pub fn or_insert(self, default: V) -> &'a mut V {
        self.or_insert_with(|| default)
    }

    /// Inserts the result of `default` if the cell is vacant, then
    /// returns a reference to the value.
    pub fn or_insert_with(self, default: impl FnOnce() -> V) -> &'a mut V {
        match self {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(default()),
        }
    }

    /// Inserts `V::default()` if the cell is vacant, then returns a
    /// reference to the value. This is the map's indexed-access form.
    pub fn or_default(self) -> &'a mut V
    where
        V: Default,
    {
        self.or_insert_with(V::default)
    }

    /// Applies `f` to the value if the cell is occupied.
    #[must_use]
    pub fn and_modify(mut self, f: impl FnOnce(&mut V)) -> Self {
        if let Entry::Occupied(entry) = &mut self {
            f(entry.get_mut());
        }
        self
    }

    #[must_use]
    pub fn key(&self) -> &K {
        match self {
            Entry::Occupied(entry) => entry.key(),
            Entry::Vacant(entry) => entry.key(),
        }
    }
}

/// A view into an occupied map cell.
pub struct OccupiedEntry<'a, K, V, S = DefaultHashBuilder> {
    map: &'a mut HashMap<K, V, S>,
    index: usize,
}

impl<'a, K, V, S> OccupiedEntry<'a, K, V, S> {
    #[must_use]
    pub fn key(&self) -> &K {
        self.map.table.key_at(self.index)
    }

    #[must_use]
    pub fn get(&self) -> &V {
        self.map.table.value_at(self.index)
    }

    #[must_use]
    pub fn get_mut(&mut self) -> &mut V {
        self.map.table.value_at_mut(self.index)
    }

    #[must_use]
    pub fn into_mut(self) -> &'a mut V {
        self.map.table.value_at_mut(self.index)
    }

    /// Replaces the stored value, returning the previous one.
    pub fn insert(&mut self, value: V) -> V {
        core::mem::replace(self.get_mut(), value)
    }
}

impl<K, V, S> OccupiedEntry<'_, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    /// Removes the entry and returns its value.
    pub fn remove(self) -> V {
        let hash = util::hash_of(&self.map.hash_builder, self.map.table.key_at(self.index));
        let probe = self.map.table.probe_at(self.index, hash);
        self.map.table.remove_probed(probe).1
    }
}

/// A view into a vacant map cell.
pub struct VacantEntry<'a, K, V, S = DefaultHashBuilder> {
    map: &'a mut HashMap<K, V, S>,
    key: K,
}

impl<'a, K, V, S> VacantEntry<'a, K, V, S>
where
    K: Eq + Hash,
    S: BuildHasher,
{
    #[must_use]
    pub fn key(&self) -> &K {
        &self.key
    }

    /// Inserts `value` under this entry's key.
    ///
    /// # Panics
    /// As [`HashMap::insert`].
    pub fn insert(self, value: V) -> &'a mut V {
        let HashMap {
            table,
            hash_builder,
        } = self.map;
        let hasher = |key: &K| util::hash_of(&*hash_builder, key);
        match table.insert(self.key, value, &hasher) {
            Ok((index, _)) => table.value_at_mut(index),
            Err(err) => panic!("hash map growth failed: {err}"),
        }
    }
}

/// Iterates a map's entries in cell order.
pub struct Iter<'a, K, V> {
    table: &'a Table<K, V>,
    index: usize,
    remaining: usize,
}

impl<K, V> Clone for Iter<'_, K, V> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

impl<'a, K, V> Iterator for Iter<'a, K, V> {
    type Item = (&'a K, &'a V);

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.table.capacity() {
            return None;
        }
        let item = self.table.entry_at(self.index);
        self.index = self.table.next_occupied(self.index + 1);
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for Iter<'_, K, V> {}
impl<K, V> FusedIterator for Iter<'_, K, V> {}

/// Iterates a map's entries in cell order with mutable values.
pub struct IterMut<'a, K, V> {
    table: NonNull<Table<K, V>>,
    index: usize,
    remaining: usize,
    _marker: PhantomData<&'a mut Table<K, V>>,
}

impl<'a, K, V> Iterator for IterMut<'a, K, V> {
    type Item = (&'a K, &'a mut V);

    fn next(&mut self) -> Option<Self::Item> {
        // Each occupied index is visited exactly once, so handing out a
        // mutable value borrow per cell cannot alias.
        let table = unsafe { &mut *self.table.as_ptr() };
        if self.index >= table.capacity() {
            return None;
        }
        let item = table.entry_at_mut(self.index);
        let next_index = self.index + 1;
        self.index = unsafe { &*self.table.as_ptr() }.next_occupied(next_index);
        self.remaining -= 1;
        Some(item)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<K, V> ExactSizeIterator for IterMut<'_, K, V> {}
impl<K, V> FusedIterator for IterMut<'_, K, V> {}

// Equivalent to the `&mut Table` it stands in for.
unsafe impl<K: Send, V: Send> Send for IterMut<'_, K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for IterMut<'_, K, V> {}

/// Iterates a map's keys in cell order.
pub struct Keys<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Keys<'a, K, V> {
    type Item = &'a K;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(key, _)| key)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Keys<'_, K, V> {}
impl<K, V> FusedIterator for Keys<'_, K, V> {}

/// Iterates a map's values in cell order.
pub struct Values<'a, K, V> {
    inner: Iter<'a, K, V>,
}

impl<'a, K, V> Iterator for Values<'a, K, V> {
    type Item = &'a V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for Values<'_, K, V> {}
impl<K, V> FusedIterator for Values<'_, K, V> {}

/// Iterates a map's values mutably in cell order.
pub struct ValuesMut<'a, K, V> {
    inner: IterMut<'a, K, V>,
}

impl<'a, K, V> Iterator for ValuesMut<'a, K, V> {
    type Item = &'a mut V;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next().map(|(_, value)| value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<K, V> ExactSizeIterator for ValuesMut<'_, K, V> {}
impl<K, V> FusedIterator for ValuesMut<'_, K, V> {}
