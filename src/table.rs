//! The storage engine shared by [`HashMap`](crate::HashMap) and
//! [`HashSet`](crate::HashSet).
//!
//! All entries live in a single contiguous array of [`Node`] cells. The
//! array is split at `hashable` into a primary region addressed directly by
//! hashing and a collision region that absorbs overflow through a
//! singly-linked chain embedded in each cell's `next` field. Erased
//! collision cells are recycled through a FIFO free list threaded through
//! the same `next` fields.
//!
//! The engine never hashes anything itself; callers pass 64-bit hashes and
//! hash closures in, so the hash function stays injected.

use core::mem::{needs_drop, size_of, MaybeUninit};
use core::ptr::{self, NonNull};

use crate::error::Error;
use crate::util;
use crate::{GROWTH_FACTOR, HASHABLE_RATIO};

/// Occupied flag in the low bit of a cell's metadata word. The remaining
/// 63 bits hold the key's hash fingerprint (`hash >> 1`).
const OCCUPIED: u64 = 1;

/// Chain terminator. Index 0 is always a primary cell and never a chain
/// successor, so the value is unambiguous.
const NIL: usize = 0;

/// One storage cell. `key` and `value` are initialized exactly when the
/// occupied bit of `meta` is set; an all-zero cell is a valid empty cell,
/// which lets a fresh table be allocated zeroed.
struct Node<K, V> {
    meta: u64,
    next: usize,
    key: MaybeUninit<K>,
    value: MaybeUninit<V>,
}

impl<K, V> Node<K, V> {
    fn is_occupied(&self) -> bool {
        self.meta & OCCUPIED != 0
    }

    fn fingerprint(&self) -> u64 {
        self.meta >> 1
    }
}

/// Outcome of a chain walk. `index == capacity` means the key is absent.
/// `prev` is the cell whose `next` refers to `index`, or `capacity` when
/// `index` is the head of its chain.
#[derive(Clone, Copy)]
pub(crate) struct Probe {
    pub index: usize,
    pub prev: usize,
}

pub(crate) struct Table<K, V> {
    nodes: NonNull<Node<K, V>>,
    /// Total cell count, not counting the sentinel at index `capacity`.
    capacity: usize,
    /// Primary region length; collision region is `[hashable, capacity)`.
    hashable: usize,
    len: usize,
    /// Low watermark of the collision region. `head == tail` means no
    /// reclaimed cells; the next acquisition bumps `head` itself.
    head: usize,
    /// End of the reclaimed-cell FIFO.
    tail: usize,
    max_load: f64,
}

impl<K, V> Table<K, V> {
    pub fn with_capacity(capacity: usize, max_load: f64) -> Result<Self, Error> {
        if capacity == 0 {
            return Err(Error::InvalidArgument("capacity must be at least 1"));
        }
        if capacity >= Self::max_capacity() {
            return Err(Error::CapacityOverflow(capacity));
        }
        if !(max_load > 0.0 && max_load <= 1.0) {
            return Err(Error::InvalidArgument("max load factor must be in (0, 1]"));
        }
        // One sentinel cell past the end keeps free-list appends in bounds
        // when `tail == capacity`.
        let nodes = util::allocate_zeroed::<Node<K, V>>(capacity + 1)?;
        #[allow(clippy::cast_sign_loss)]
        #[allow(clippy::cast_possible_truncation)]
        #[allow(clippy::cast_precision_loss)]
        let hashable = ((HASHABLE_RATIO * capacity as f64) as usize).max(1);
        Ok(Self {
            nodes,
            capacity,
            hashable,
            len: 0,
            head: hashable,
            tail: hashable,
            max_load,
        })
    }

    pub fn max_capacity() -> usize {
        (isize::MAX as usize) / size_of::<Node<K, V>>() - 1
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn hashable_capacity(&self) -> usize {
        self.hashable
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn max_load(&self) -> f64 {
        self.max_load
    }

    pub fn set_max_load(&mut self, max_load: f64) -> Result<(), Error> {
        if !(max_load > 0.0 && max_load <= 1.0) {
            return Err(Error::InvalidArgument("max load factor must be in (0, 1]"));
        }
        self.max_load = max_load;
        Ok(())
    }

    fn node(&self, index: usize) -> &Node<K, V> {
        debug_assert!(index <= self.capacity);
        unsafe { &*self.nodes.as_ptr().add(index) }
    }

    fn node_mut(&mut self, index: usize) -> &mut Node<K, V> {
        debug_assert!(index <= self.capacity);
        unsafe { &mut *self.nodes.as_ptr().add(index) }
    }

    /// Maps a 64-bit hash to a primary slot without a modulo: mask by the
    /// power of two covering `hashable`, then fold any overshoot back down.
    /// Slightly favors the low slots when `hashable` is not a power of two.
    fn primary_slot(&self, hash: u64) -> usize {
        #[allow(clippy::cast_possible_truncation)]
        let masked = (hash as usize) & (self.hashable.next_power_of_two() - 1);
        if masked >= self.hashable {
            masked - self.hashable
        } else {
            masked
        }
    }

    /// Walks the chain rooted at `hash`'s primary slot. The 63-bit
    /// fingerprint rejects nearly all mismatches before `eq` runs.
    pub fn find(&self, hash: u64, mut eq: impl FnMut(&K) -> bool) -> Probe {
        let fingerprint = hash >> 1;
        let mut prev = self.capacity;
        let mut cur = self.primary_slot(hash);
        loop {
            let node = self.node(cur);
            if node.is_occupied()
                && node.fingerprint() == fingerprint
                && eq(unsafe { node.key.assume_init_ref() })
            {
                return Probe { index: cur, prev };
            }
            prev = cur;
            cur = node.next;
            if cur == NIL {
                return Probe { index: self.capacity, prev };
            }
        }
    }

    /// [`find`](Self::find) reduced to a hit-or-miss answer.
    pub fn lookup(&self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<usize> {
        let probe = self.find(hash, eq);
        (probe.index != self.capacity).then_some(probe.index)
    }

    /// Inserts `key`/`value` unless an equal key is present. Returns the
    /// occupied cell index and whether a new entry was created. Grows and
    /// retries when the load ceiling or the collision region is hit.
    pub fn insert(
        &mut self,
        key: K,
        value: V,
        hasher: &impl Fn(&K) -> u64,
    ) -> Result<(usize, bool), Error>
    where
        K: Eq,
    {
        loop {
            let hash = hasher(&key);
            let found = self.find(hash, |existing| *existing == key);
            if found.index != self.capacity {
                return Ok((found.index, false));
            }
            #[allow(clippy::cast_precision_loss)]
            if (self.len + 1) as f64 > self.max_load * self.capacity as f64 {
                self.grow(hasher)?;
                continue;
            }
            let slot = self.primary_slot(hash);
            // The failed find left `found.prev` at the chain tail, where
            // a collision cell would be spliced in.
            let index = match self.secure_cell(slot, found.prev) {
                Some(index) => index,
                None => {
                    self.grow(hasher)?;
                    continue;
                }
            };
            let node = self.node_mut(index);
            node.key.write(key);
            node.value.write(value);
            node.meta = hash | OCCUPIED;
            node.next = NIL;
            self.len += 1;
            return Ok((index, true));
        }
    }

    /// Removes the entry for `hash`/`eq` and returns it, or `None` if no
    /// such key is present.
    pub fn remove(&mut self, hash: u64, eq: impl FnMut(&K) -> bool) -> Option<(K, V)> {
        let probe = self.find(hash, eq);
        if probe.index == self.capacity {
            return None;
        }
        Some(self.remove_probed(probe))
    }

    /// Removes the entry at `probe.index`. A primary cell with successors
    /// swaps the first successor up into the primary slot and frees the
    /// vacated collision cell instead, so the primary slot stays the head
    /// of its chain.
    pub fn remove_probed(&mut self, probe: Probe) -> (K, V) {
        debug_assert!(probe.index < self.capacity);
        debug_assert!(self.node(probe.index).is_occupied());
        let succ = self.node(probe.index).next;
        let erased = if probe.index < self.hashable {
            if succ == NIL {
                probe.index
            } else {
                unsafe {
                    ptr::swap(
                        self.nodes.as_ptr().add(probe.index),
                        self.nodes.as_ptr().add(succ),
                    );
                }
                succ
            }
        } else {
            self.node_mut(probe.prev).next = succ;
            probe.index
        };
        let node = self.node_mut(erased);
        node.meta &= !OCCUPIED;
        node.next = NIL;
        let entry = unsafe { (node.key.assume_init_read(), node.value.assume_init_read()) };
        if erased >= self.hashable {
            self.release_collision_cell(erased);
        }
        self.len -= 1;
        entry
    }

    /// Recovers the chain predecessor of the occupied cell at `index` by
    /// re-walking its chain. `hash` must be the stored key's hash.
    pub fn probe_at(&self, index: usize, hash: u64) -> Probe {
        debug_assert!(self.node(index).is_occupied());
        let mut prev = self.capacity;
        let mut cur = self.primary_slot(hash);
        while cur != index {
            prev = cur;
            cur = self.node(cur).next;
            debug_assert_ne!(cur, NIL, "cell is not a member of its chain");
        }
        Probe { index, prev }
    }

    /// Takes a collision-region cell, preferring reclaimed cells over
    /// advancing the bump pointer. `None` means the region is exhausted
    /// and the caller has to grow.
    fn acquire_collision_cell(&mut self) -> Option<usize> {
        if self.head == self.tail {
            if self.head == self.capacity {
                return None;
            }
            let index = self.head;
            self.head += 1;
            self.tail = self.head;
            Some(index)
        } else {
            let index = self.node(self.head).next;
            if index == self.tail {
                // Drained the last reclaimed cell.
                self.tail = self.head;
            } else {
                let successor = self.node(index).next;
                self.node_mut(self.head).next = successor;
            }
            Some(index)
        }
    }

    /// Appends an unoccupied collision cell to the reclaim FIFO. When no
    /// cell has been freed yet the write through `tail` lands on the cell
    /// at the bump pointer, or on the sentinel once the region is full;
    /// both are unoccupied, so their `next` fields are free to borrow.
    fn release_collision_cell(&mut self, index: usize) {
        debug_assert!((self.hashable..self.capacity).contains(&index));
        debug_assert!(!self.node(index).is_occupied());
        let tail = self.tail;
        self.node_mut(tail).next = index;
        self.tail = index;
    }

    /// Secures a destination cell for a key whose primary slot is `slot`
    /// and whose chain tail is `prev`: the slot itself when it is empty,
    /// otherwise a collision cell spliced in after `prev`. `None` means
    /// the collision region is exhausted.
    fn secure_cell(&mut self, slot: usize, prev: usize) -> Option<usize> {
        if self.node(slot).is_occupied() {
            let index = self.acquire_collision_cell()?;
            self.node_mut(prev).next = index;
            Some(index)
        } else {
            Some(slot)
        }
    }

    fn grow(&mut self, hasher: &impl Fn(&K) -> u64) -> Result<(), Error>
    where
        K: Eq,
    {
        self.rehash(self.capacity.saturating_mul(GROWTH_FACTOR), hasher)
    }

    /// Rebuilds the table with at least `requested` cells, re-inserting
    /// every entry, then swaps the rebuilt table in. All previous indices
    /// are invalidated on success; any failure, including one inside a
    /// nested growth of the replacement, leaves this table untouched.
    pub fn rehash(&mut self, requested: usize, hasher: &impl Fn(&K) -> u64) -> Result<(), Error>
    where
        K: Eq,
    {
        let target = requested.max(self.min_capacity_for(self.len)).max(1);
        let mut fresh = Self::with_capacity(target, self.max_load)?;
        // Entries are copied bit-for-bit, so until the whole pass has
        // succeeded this table still owns them and exactly one of the two
        // tables must forget its copies.
        for index in 0..self.capacity {
            if !self.node(index).is_occupied() {
                continue;
            }
            if let Err(err) = fresh.adopt(self.node(index), hasher) {
                fresh.forget_entries();
                return Err(err);
            }
        }
        self.forget_entries();
        core::mem::swap(self, &mut fresh);
        Ok(())
    }

    /// Copies the entry of `source` (an occupied cell of another table)
    /// into this table during a rebuild. The key is known to be absent
    /// here, and ownership of the copied bits is only assumed once a
    /// destination cell is secured, so a failed growth leaves the source
    /// cell's entry intact.
    fn adopt(&mut self, source: &Node<K, V>, hasher: &impl Fn(&K) -> u64) -> Result<(), Error>
    where
        K: Eq,
    {
        loop {
            let hash = hasher(unsafe { source.key.assume_init_ref() });
            #[allow(clippy::cast_precision_loss)]
            if (self.len + 1) as f64 > self.max_load * self.capacity as f64 {
                self.grow(hasher)?;
                continue;
            }
            // Walked only for the chain tail; no cell can match.
            let found = self.find(hash, |_| false);
            let slot = self.primary_slot(hash);
            let index = match self.secure_cell(slot, found.prev) {
                Some(index) => index,
                None => {
                    self.grow(hasher)?;
                    continue;
                }
            };
            let node = self.node_mut(index);
            unsafe {
                node.key.write(source.key.assume_init_read());
                node.value.write(source.value.assume_init_read());
            }
            node.meta = hash | OCCUPIED;
            node.next = NIL;
            self.len += 1;
            return Ok(());
        }
    }

    /// Marks every cell vacant without dropping its entry, for when the
    /// entries' bits are owned by another table.
    fn forget_entries(&mut self) {
        for index in 0..self.capacity {
            let node = self.node_mut(index);
            node.meta &= !OCCUPIED;
            node.next = NIL;
        }
        self.len = 0;
        self.head = self.hashable;
        self.tail = self.hashable;
    }

    /// Rebuilds only if `entries` would not fit under the load ceiling.
    pub fn reserve(&mut self, entries: usize, hasher: &impl Fn(&K) -> u64) -> Result<(), Error>
    where
        K: Eq,
    {
        #[allow(clippy::cast_precision_loss)]
        let overloaded = entries as f64 > self.max_load * self.capacity as f64;
        if overloaded {
            self.rehash(self.min_capacity_for(entries), hasher)
        } else {
            Ok(())
        }
    }

    /// Smallest capacity whose load ceiling admits `len` entries.
    fn min_capacity_for(&self, len: usize) -> usize {
        #[allow(clippy::cast_precision_loss)]
        #[allow(clippy::cast_possible_truncation)]
        #[allow(clippy::cast_sign_loss)]
        let mut capacity = (len as f64 / self.max_load) as usize;
        #[allow(clippy::cast_precision_loss)]
        while (capacity as f64) * self.max_load < len as f64 {
            capacity += 1;
        }
        capacity
    }

    /// Marks every cell empty and resets the free list. The cell array is
    /// kept at its current capacity.
    pub fn clear(&mut self) {
        for index in 0..=self.capacity {
            let node = self.node_mut(index);
            if node.is_occupied() {
                node.meta &= !OCCUPIED;
                unsafe {
                    node.key.assume_init_drop();
                    node.value.assume_init_drop();
                }
            }
            node.next = NIL;
        }
        self.len = 0;
        self.head = self.hashable;
        self.tail = self.hashable;
    }

    /// First occupied index at or after `from`; `capacity` when none.
    pub fn next_occupied(&self, from: usize) -> usize {
        let mut index = from;
        while index < self.capacity && !self.node(index).is_occupied() {
            index += 1;
        }
        index
    }

    pub fn key_at(&self, index: usize) -> &K {
        let node = self.node(index);
        debug_assert!(node.is_occupied());
        unsafe { node.key.assume_init_ref() }
    }

    pub fn value_at(&self, index: usize) -> &V {
        let node = self.node(index);
        debug_assert!(node.is_occupied());
        unsafe { node.value.assume_init_ref() }
    }

    pub fn value_at_mut(&mut self, index: usize) -> &mut V {
        debug_assert!(self.node(index).is_occupied());
        let node = self.node_mut(index);
        unsafe { node.value.assume_init_mut() }
    }

    pub fn entry_at(&self, index: usize) -> (&K, &V) {
        let node = self.node(index);
        debug_assert!(node.is_occupied());
        unsafe { (node.key.assume_init_ref(), node.value.assume_init_ref()) }
    }

    pub fn entry_at_mut(&mut self, index: usize) -> (&K, &mut V) {
        debug_assert!(self.node(index).is_occupied());
        let node = self.node_mut(index);
        unsafe { (node.key.assume_init_ref(), node.value.assume_init_mut()) }
    }
}

impl<K, V> Drop for Table<K, V> {
    fn drop(&mut self) {
        if needs_drop::<K>() || needs_drop::<V>() {
            for index in 0..self.capacity {
                let node = self.node_mut(index);
                if node.is_occupied() {
                    unsafe {
                        node.key.assume_init_drop();
                        node.value.assume_init_drop();
                    }
                }
            }
        }
        unsafe { util::deallocate(self.nodes, self.capacity + 1) };
    }
}

// The raw cell pointer is exclusively owned, so the table is as mobile as
// its entries.
unsafe impl<K: Send, V: Send> Send for Table<K, V> {}
unsafe impl<K: Sync, V: Sync> Sync for Table<K, V> {}

#[cfg(test)]
impl<K, V> Table<K, V> {
    /// Asserts the structural invariants: `len` accounting, chain
    /// integrity (every occupied primary cell heads a chain whose members
    /// all map to it), and free-list sanity (the FIFO holds exactly the
    /// erased-but-unreused collision cells).
    pub fn check_invariants(&self, hasher: &impl Fn(&K) -> u64) {
        use alloc::collections::BTreeSet;

        let occupied = (0..self.capacity)
            .filter(|&index| self.node(index).is_occupied())
            .count();
        assert_eq!(occupied, self.len, "len does not match occupied cells");
        assert!((self.hashable..=self.capacity).contains(&self.head));
        assert!((self.hashable..=self.capacity).contains(&self.tail));

        let mut chained: BTreeSet<usize> = BTreeSet::new();
        for slot in 0..self.hashable {
            let node = self.node(slot);
            if !node.is_occupied() {
                assert_eq!(node.next, NIL, "empty primary cell heads a chain");
                continue;
            }
            let mut cur = slot;
            loop {
                let node = self.node(cur);
                assert!(node.is_occupied(), "chain member is unoccupied");
                let hash = hasher(unsafe { node.key.assume_init_ref() });
                assert_eq!(self.primary_slot(hash), slot, "chain member maps elsewhere");
                assert_eq!(node.fingerprint(), hash >> 1, "stale fingerprint");
                if cur != slot {
                    assert!(cur >= self.hashable, "chain successor in primary region");
                    assert!(chained.insert(cur), "cell linked into two chains");
                }
                if node.next == NIL {
                    break;
                }
                cur = node.next;
            }
        }

        let mut free: BTreeSet<usize> = BTreeSet::new();
        if self.head != self.tail {
            let mut cur = self.node(self.head).next;
            loop {
                assert!(
                    (self.hashable..self.capacity).contains(&cur),
                    "free-list member outside the collision region"
                );
                assert!(!self.node(cur).is_occupied(), "occupied cell on free list");
                assert!(free.insert(cur), "free-list cycle");
                if cur == self.tail {
                    break;
                }
                cur = self.node(cur).next;
            }
        }
        for index in self.hashable..self.capacity {
            if self.node(index).is_occupied() {
                assert!(chained.contains(&index), "occupied collision cell off-chain");
            } else if index < self.head {
                assert!(free.contains(&index), "erased cell missing from free list");
            } else {
                assert!(!free.contains(&index), "untouched cell on free list");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identity(key: &u64) -> u64 {
        *key
    }

    /// 20 cells split 14 primary / 6 collision, so keys 5, 21, 37, 53, 69
    /// (all `& 15 == 5`) pile onto primary slot 5.
    fn colliding_table() -> Table<u64, u32> {
        let mut table = Table::with_capacity(20, 1.0).unwrap();
        for (nth, key) in [5_u64, 21, 37, 53, 69].into_iter().enumerate() {
            let (index, inserted) = table.insert(key, 0, &identity).unwrap();
            assert!(inserted);
            // First key lands on the primary slot, the rest bump-allocate
            // consecutive collision cells.
            let expected = if nth == 0 { 5 } else { 13 + nth };
            assert_eq!(index, expected);
        }
        table.check_invariants(&identity);
        table
    }

    fn contains(table: &Table<u64, u32>, key: u64) -> bool {
        table
            .lookup(identity(&key), |existing| *existing == key)
            .is_some()
    }

    #[test]
    fn capacity_split() {
        let table = Table::<u64, u32>::with_capacity(20, 1.0).unwrap();
        assert_eq!(table.capacity(), 20);
        assert_eq!(table.hashable_capacity(), 14);
        assert!(table.is_empty());
    }

    #[test]
    fn zero_capacity_is_rejected() {
        assert!(matches!(
            Table::<u64, u32>::with_capacity(0, 1.0),
            Err(Error::InvalidArgument(_))
        ));
    }

    #[test]
    fn max_capacity_is_rejected() {
        let max = Table::<u64, u32>::max_capacity();
        assert!(matches!(
            Table::<u64, u32>::with_capacity(max, 1.0),
            Err(Error::CapacityOverflow(_))
        ));
    }

    #[test]
    fn load_factor_domain() {
        assert!(matches!(
            Table::<u64, u32>::with_capacity(8, 0.0),
            Err(Error::InvalidArgument(_))
        ));
        assert!(matches!(
            Table::<u64, u32>::with_capacity(8, 1.1),
            Err(Error::InvalidArgument(_))
        ));
        let mut table = Table::<u64, u32>::with_capacity(8, 1.0).unwrap();
        assert!(table.set_max_load(0.5).is_ok());
        assert!(table.set_max_load(0.0).is_err());
        assert!(table.set_max_load(1.1).is_err());
        assert!((table.max_load() - 0.5).abs() < f64::EPSILON);
    }

    #[test]
    fn colliding_keys_share_one_chain() {
        let table = colliding_table();
        assert_eq!(table.len(), 5);
        for key in [5_u64, 21, 37, 53, 69] {
            assert!(contains(&table, key));
        }
        assert!(!contains(&table, 13));
    }

    #[test]
    fn reinserting_is_a_noop() {
        let mut table = colliding_table();
        let (index, inserted) = table.insert(5, 99, &identity).unwrap();
        assert!(!inserted);
        assert_eq!(index, 5);
        assert_eq!(table.len(), 5);
        // The stored value is untouched.
        assert_eq!(*table.value_at(index), 0);
        table.check_invariants(&identity);
    }

    #[test]
    fn erase_unlinks_and_recycles_the_cell() {
        let mut table = colliding_table();
        assert_eq!(table.remove(21, |k| *k == 21), Some((21, 0)));
        assert_eq!(table.len(), 4);
        assert!(!contains(&table, 21));
        for key in [5_u64, 37, 53, 69] {
            assert!(contains(&table, key));
        }
        table.check_invariants(&identity);
        // The freed cell 14 is reused before the bump pointer advances.
        let (index, inserted) = table.insert(85, 0, &identity).unwrap();
        assert!(inserted);
        assert_eq!(index, 14);
        table.check_invariants(&identity);
    }

    #[test]
    fn erase_of_absent_key_is_a_noop() {
        let mut table = colliding_table();
        assert_eq!(table.remove(13, |k| *k == 13), None);
        assert_eq!(table.len(), 5);
        table.check_invariants(&identity);
    }

    #[test]
    fn freed_cells_are_reused_in_fifo_order() {
        let mut table = colliding_table();
        // Frees cells 14, 15, 16 in that order.
        for key in [21_u64, 37, 53] {
            assert!(table.remove(key, |k| *k == key).is_some());
            table.check_invariants(&identity);
        }
        for (key, expected) in [(53_u64, 14), (21_u64, 15), (37_u64, 16)] {
            let (index, inserted) = table.insert(key, 0, &identity).unwrap();
            assert!(inserted);
            assert_eq!(index, expected);
            table.check_invariants(&identity);
        }
        assert_eq!(table.len(), 5);
        for key in [5_u64, 21, 37, 53, 69] {
            assert!(contains(&table, key));
        }
    }

    #[test]
    fn erasing_a_chain_head_promotes_its_successor() {
        let mut table = colliding_table();
        assert_eq!(table.remove(5, |k| *k == 5), Some((5, 0)));
        // Key 21 (the first successor) now occupies primary slot 5.
        let probe = table.find(21, |k| *k == 21);
        assert_eq!(probe.index, 5);
        for key in [21_u64, 37, 53, 69] {
            assert!(contains(&table, key));
        }
        table.check_invariants(&identity);
    }

    #[test]
    fn erasing_a_lone_primary_empties_the_slot() {
        let mut table = Table::<u64, u32>::with_capacity(20, 1.0).unwrap();
        table.insert(5, 7, &identity).unwrap();
        assert_eq!(table.remove(5, |k| *k == 5), Some((5, 7)));
        assert!(table.is_empty());
        table.check_invariants(&identity);
    }

    #[test]
    fn exhausted_collision_region_forces_growth() {
        let mut table = Table::<u64, u32>::with_capacity(20, 1.0).unwrap();
        // Slot 5 plus all six collision cells.
        for key in [5_u64, 21, 37, 53, 69, 85, 101] {
            table.insert(key, 0, &identity).unwrap();
        }
        assert_eq!(table.capacity(), 20);
        // No room left in the collision region; the next chained insert
        // doubles the table.
        table.insert(117, 0, &identity).unwrap();
        assert_eq!(table.capacity(), 40);
        assert_eq!(table.hashable_capacity(), 28);
        assert_eq!(table.len(), 8);
        for key in [5_u64, 21, 37, 53, 69, 85, 101, 117] {
            assert!(contains(&table, key));
        }
        table.check_invariants(&identity);
    }

    #[test]
    fn load_ceiling_forces_growth() {
        let mut table = Table::<u64, u32>::with_capacity(4, 1.0).unwrap();
        for key in 0..4_u64 {
            table.insert(key, 0, &identity).unwrap();
        }
        assert_eq!(table.capacity(), 4);
        table.insert(4, 0, &identity).unwrap();
        assert_eq!(table.capacity(), 8);
        assert_eq!(table.len(), 5);
        table.check_invariants(&identity);
    }

    #[test]
    fn growth_respects_a_partial_load_ceiling() {
        let mut table = Table::<u64, u32>::with_capacity(8, 0.5).unwrap();
        for key in 0..4_u64 {
            table.insert(key, 0, &identity).unwrap();
        }
        assert_eq!(table.capacity(), 8);
        table.insert(4, 0, &identity).unwrap();
        assert_eq!(table.capacity(), 16);
        #[allow(clippy::cast_precision_loss)]
        {
            assert!(table.len() as f64 <= table.max_load() * table.capacity() as f64);
        }
        table.check_invariants(&identity);
    }

    #[test]
    fn degenerate_capacity_one() {
        // capacity 1 means hashable == capacity and no collision region.
        let mut table = Table::<u64, u32>::with_capacity(1, 1.0).unwrap();
        assert_eq!(table.hashable_capacity(), 1);
        table.insert(0, 0, &identity).unwrap();
        table.insert(1, 1, &identity).unwrap();
        assert!(table.capacity() > 1);
        assert_eq!(table.len(), 2);
        assert!(contains(&table, 0));
        assert!(contains(&table, 1));
        table.check_invariants(&identity);
    }

    #[test]
    fn rehash_preserves_entries() {
        let mut table = colliding_table();
        table.rehash(64, &identity).unwrap();
        assert_eq!(table.capacity(), 64);
        assert_eq!(table.len(), 5);
        for key in [5_u64, 21, 37, 53, 69] {
            assert!(contains(&table, key));
        }
        table.check_invariants(&identity);
    }

    #[test]
    fn rehash_never_shrinks_below_the_load_ceiling() {
        let mut table = colliding_table();
        table.rehash(1, &identity).unwrap();
        assert!(table.capacity() >= 5);
        assert_eq!(table.len(), 5);
        table.check_invariants(&identity);
    }

    #[test]
    fn failed_rehash_leaves_the_table_intact() {
        let mut table = colliding_table();
        assert!(matches!(
            table.rehash(usize::MAX, &identity),
            Err(Error::CapacityOverflow(_))
        ));
        assert_eq!(table.len(), 5);
        for key in [5_u64, 21, 37, 53, 69] {
            assert!(contains(&table, key));
        }
        table.check_invariants(&identity);
    }

    #[test]
    fn reserve_is_a_hint() {
        let mut table = colliding_table();
        table.reserve(10, &identity).unwrap();
        assert_eq!(table.capacity(), 20);
        table.reserve(200, &identity).unwrap();
        assert!(table.capacity() >= 200);
        assert_eq!(table.len(), 5);
        table.check_invariants(&identity);
    }

    #[test]
    fn clear_resets_the_free_list() {
        let mut table = colliding_table();
        table.remove(21, |k| *k == 21);
        table.clear();
        assert!(table.is_empty());
        table.check_invariants(&identity);
        // The collision region starts over from the bump pointer.
        let (index, _) = table.insert(5, 0, &identity).unwrap();
        assert_eq!(index, 5);
        let (index, _) = table.insert(21, 0, &identity).unwrap();
        assert_eq!(index, 14);
        table.check_invariants(&identity);
    }

    #[test]
    fn iteration_visits_every_occupied_cell_once() {
        let table = colliding_table();
        let mut seen = alloc::vec::Vec::new();
        let mut index = table.next_occupied(0);
        while index < table.capacity() {
            seen.push(*table.key_at(index));
            index = table.next_occupied(index + 1);
        }
        seen.sort_unstable();
        assert_eq!(seen, [5, 21, 37, 53, 69]);
    }

    #[test]
    fn dropped_entries_are_released() {
        use alloc::rc::Rc;

        let counter = Rc::new(());
        let mut table = Table::<u64, Rc<()>>::with_capacity(8, 1.0).unwrap();
        let hasher = |key: &u64| *key;
        for key in 0..4_u64 {
            table.insert(key, Rc::clone(&counter), &hasher).unwrap();
        }
        assert_eq!(Rc::strong_count(&counter), 5);
        table.remove(0, |k| *k == 0);
        assert_eq!(Rc::strong_count(&counter), 4);
        table.clear();
        assert_eq!(Rc::strong_count(&counter), 1);
        for key in 0..4_u64 {
            table.insert(key, Rc::clone(&counter), &hasher).unwrap();
        }
        drop(table);
        assert_eq!(Rc::strong_count(&counter), 1);
    }
}
