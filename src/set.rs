//! A dense hash set sharing the map's storage engine.

use core::borrow::Borrow;
use core::fmt::{self, Debug};
use core::hash::{BuildHasher, Hash};
use core::iter::FusedIterator;

use crate::error::Error;
use crate::table::Table;
use crate::util;
use crate::{DefaultHashBuilder, DEFAULT_CAPACITY, DEFAULT_MAX_LOAD};

/// A hash set backed by the same contiguous cell array as
/// [`HashMap`](crate::HashMap); each cell carries a key and a zero-sized
/// marker in place of a value.
///
/// Any mutating operation may invalidate all outstanding iterators;
/// iteration order is cell order and unrelated to insertion order.
pub struct HashSet<T, S = DefaultHashBuilder> {
    table: Table<T, ()>,
    hash_builder: S,
}

impl<T> HashSet<T, DefaultHashBuilder> {
    /// Creates a set with room for `capacity` cells.
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

impl<T, S> HashSet<T, S> {
    /// Creates a set with room for `capacity` cells, hashing values with
    /// `hash_builder`.
    ///
    /// # Errors
    /// As [`with_capacity`](HashSet::with_capacity).
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
        Table::<T, ()>::max_capacity()
    }

    #[must_use]
    pub fn max_load_factor(&self) -> f64 {
        self.table.max_load()
    }

    /// Sets the load factor beyond which inserts grow the set.
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

    /// Exchanges the entire contents of two sets.
    pub fn swap(&mut self, other: &mut Self) {
        core::mem::swap(self, other);
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            index: self.table.next_occupied(0),
            remaining: self.table.len(),
            table: &self.table,
        }
    }
}

impl<T, S> HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    /// Inserts `value` unless it is already present. Returns whether a
    /// new entry was created.
    ///
    /// # Panics
    /// If growing the set fails, either because the doubled capacity
    /// exceeds [`max_capacity`](Self::max_capacity) or because the
    /// allocator refuses the replacement array.
    pub fn insert(&mut self, value: T) -> bool {
        let Self {
            table,
            hash_builder,
        } = self;
        let hasher = |value: &T| util::hash_of(&*hash_builder, value);
        match table.insert(value, (), &hasher) {
            Ok((_, inserted)) => inserted,
            Err(err) => panic!("hash set growth failed: {err}"),
        }
    }

    #[must_use]
    pub fn contains<Q>(&self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.get(value).is_some()
    }

    /// Returns a reference to the stored value equal to `value`.
    #[must_use]
    pub fn get<Q>(&self, value: &Q) -> Option<&T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = util::hash_of(&self.hash_builder, value);
        let index = self
            .table
            .lookup(hash, |existing| existing.borrow() == value)?;
        Some(self.table.key_at(index))
    }

    /// Removes `value`. Returns whether it was present.
    pub fn remove<Q>(&mut self, value: &Q) -> bool
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        self.take(value).is_some()
    }

    /// Removes and returns the stored value equal to `value`.
    pub fn take<Q>(&mut self, value: &Q) -> Option<T>
    where
        T: Borrow<Q>,
        Q: Hash + Eq + ?Sized,
    {
        let hash = util::hash_of(&self.hash_builder, value);
        self.table
            .remove(hash, |existing| existing.borrow() == value)
            .map(|(stored, ())| stored)
    }

    /// Keeps only the values for which `pred` returns `true`.
    pub fn retain(&mut self, mut pred: impl FnMut(&T) -> bool) {
        let Self {
            table,
            hash_builder,
        } = self;
        let mut index = table.next_occupied(0);
        while index < table.capacity() {
            let value = table.key_at(index);
            if pred(value) {
                index = table.next_occupied(index + 1);
            } else {
                let hash = util::hash_of(&*hash_builder, value);
                let probe = table.probe_at(index, hash);
                table.remove_probed(probe);
                // Erasing a chain head swaps a successor into this cell,
                // so retest the same index.
                index = table.next_occupied(index);
            }
        }
    }

    /// Inserts every value of `other` that is absent here. `other` is
    /// left unchanged.
    pub fn merge(&mut self, other: &Self)
    where
        T: Clone,
    {
        for value in other {
            if !self.contains(value) {
                self.insert(value.clone());
            }
        }
    }

    /// Rebuilds the set with at least `capacity` cells, invalidating all
    /// iterators.
    ///
    /// # Errors
    /// [`Error::CapacityOverflow`] or [`Error::AllocationFailure`] if the
    /// replacement array cannot be built; the set is unchanged in that
    /// case.
    pub fn rehash(&mut self, capacity: usize) -> Result<(), Error> {
        let Self {
            table,
            hash_builder,
        } = self;
        let hasher = |value: &T| util::hash_of(&*hash_builder, value);
        table.rehash(capacity, &hasher)
    }

    /// Grows the set if `entries` would not fit under the load ceiling;
    /// otherwise does nothing.
    ///
    /// # Errors
    /// As [`rehash`](Self::rehash).
    pub fn reserve(&mut self, entries: usize) -> Result<(), Error> {
        let Self {
            table,
            hash_builder,
        } = self;
        let hasher = |value: &T| util::hash_of(&*hash_builder, value);
        table.reserve(entries, &hasher)
    }
}

impl<T, S: Default> Default for HashSet<T, S> {
    fn default() -> Self {
        match Self::with_capacity_and_hasher(DEFAULT_CAPACITY, S::default()) {
            Ok(set) => set,
            Err(err) => panic!("failed to allocate the default table: {err}"),
        }
    }
}

impl<T: Debug, S> Debug for HashSet<T, S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl<T, S> Extend<T> for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher,
{
    fn extend<I: IntoIterator<Item = T>>(&mut self, iter: I) {
        for value in iter {
            self.insert(value);
        }
    }
}

impl<T, S> FromIterator<T> for HashSet<T, S>
where
    T: Eq + Hash,
    S: BuildHasher + Default,
{
    fn from_iter<I: IntoIterator<Item = T>>(iter: I) -> Self {
        let mut set = Self::default();
        set.extend(iter);
        set
    }
}

impl<'a, T, S> IntoIterator for &'a HashSet<T, S> {
    type Item = &'a T;
    type IntoIter = Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Iterates a set's values in cell order.
pub struct Iter<'a, T> {
    table: &'a Table<T, ()>,
    index: usize,
    remaining: usize,
}

impl<T> Clone for Iter<'_, T> {
    fn clone(&self) -> Self {
        Self {
            table: self.table,
            index: self.index,
            remaining: self.remaining,
        }
    }
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = &'a T;

    fn next(&mut self) -> Option<Self::Item> {
        if self.index >= self.table.capacity() {
            return None;
        }
        let value = self.table.key_at(self.index);
        self.index = self.table.next_occupied(self.index + 1);
        self.remaining -= 1;
        Some(value)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        (self.remaining, Some(self.remaining))
    }
}

impl<T> ExactSizeIterator for Iter<'_, T> {}
impl<T> FusedIterator for Iter<'_, T> {}
