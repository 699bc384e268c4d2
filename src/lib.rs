//! Dense map and set containers that keep every entry in one contiguous
//! array of cells.
//!
//! The cell array is split into a primary region addressed directly by
//! hashing and a collision region that absorbs overflow. Colliding entries
//! are chained through cell indices embedded in the cells themselves, and
//! erased collision cells are recycled through a free list threaded
//! through the same links, so the containers never allocate per entry and
//! only touch the allocator on construction and growth.

#![no_std]

extern crate alloc;

#[cfg(test)]
extern crate std;

mod error;
pub mod map;
pub mod set;
mod table;
mod util;

pub use error::Error;
pub use map::HashMap;
pub use set::HashSet;

use core::hash::BuildHasherDefault;
// The same Hasher used by std::collections::HashMap (in Rust 1.76.0)
use siphasher::sip::SipHasher13;

/// The hash builder used when none is supplied.
pub type DefaultHashBuilder = BuildHasherDefault<SipHasher13>;

/// Fraction of the cell array addressed directly by hashing; the rest is
/// overflow storage for collision chains.
pub(crate) const HASHABLE_RATIO: f64 = 0.7;
/// Capacity multiplier applied whenever an insert outgrows the table.
pub(crate) const GROWTH_FACTOR: usize = 2;
/// Inserts grow the table once `len` would exceed this fraction of
/// capacity. The collision region makes a full table workable.
pub(crate) const DEFAULT_MAX_LOAD: f64 = 1.0;
pub(crate) const DEFAULT_CAPACITY: usize = 64;
