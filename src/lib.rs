//! Static membership sets over small integer keys, built with the classic
//! two-level (FKS) perfect hashing scheme.
//!
//! A [`FixedSet`] is constructed once from a list of distinct keys and then
//! answers `contains` queries in constant worst-case time. The outer level
//! scatters the keys over `n` buckets with a random affine hash; every bucket
//! of `k` keys gets its own table of `k*k` slots and an inner hash with no
//! collisions at all.
//!
//! ```
//! use fixed_set::FixedSet;
//!
//! let set = FixedSet::new(&[3i32, 1, 4, 9, 5]).unwrap();
//! assert!(set.contains(4));
//! assert!(!set.contains(7));
//! ```

use serde::{Serialize,Deserialize};
use std::io::{Read,Write};

mod error;
mod hash;
mod select;
mod fixed;

pub use error::{BuildError,FixedSetIoError,Level};
pub use hash::{HashFamily,LinearHash,PRIME};
pub use select::{Acceptance,Selector,bucket_sizes,count_collisions,square_sum};
pub use fixed::{
    Config,OuterPolicy,
    DEFAULT_COEFFICIENT,DEFAULT_MAX_ATTEMPTS,
    bucket::{BucketTable,BucketIter},
    set::{FixedSet,Iter},
};

/// Integer types a [`FixedSet`] can hold.
///
/// Every implementor fits in 32 bits, so `widen` never exceeds the prime of
/// the hash family.
pub trait Key: Copy + Eq + Default + std::fmt::Debug {
    fn widen(self) -> i64;
}

macro_rules! impl_key {
    ($($t:ty),*) => {
        $(
            impl Key for $t {
                #[inline]
                fn widen(self) -> i64 {
                    self as i64
                }
            }
        )*
    };
}
impl_key!(i8,i16,i32,u8,u16,u32);

/// Binary persistence with a versioned header.
pub trait Binary: Sized {
    type IoError;
    /// Approximate heap + inline footprint in bytes.
    fn memory(&self) -> usize;
    fn into_writer<W: Write>(&self, wrt: W) -> Result<(),Self::IoError>;
    fn from_reader<R: Read>(rdr: R) -> Result<Self,Self::IoError>;
}

/// Occupancy bits, one per table slot.
#[derive(Debug,Clone,PartialEq,Eq,Serialize,Deserialize)]
struct Flags(Vec<u64>);
impl Flags {
    fn words(sz: usize) -> usize {
        sz/64 + 1
    }
    fn nulls(sz: usize) -> Flags {
        Flags(vec![0; Flags::words(sz)])
    }
    #[inline]
    fn get(&self, idx: usize) -> bool {
        let i = idx/64;
        let j = idx%64;
        (self.0[i] & (0x1u64 << j)) > 0
    }
    #[inline]
    fn set(&mut self, idx: usize) {
        let i = idx/64;
        let j = idx%64;
        self.0[i] |= 0x1u64 << j;
    }
    fn count(&self) -> usize {
        self.0.iter().fold(0,|acc,x| acc + x.count_ones() as usize)
    }
    // Exactly the words needed for `sz` slots and no bit set at or past `sz`.
    fn fits(&self, sz: usize) -> bool {
        if self.0.len() != Flags::words(sz) { return false; }
        let last = self.0.len() - 1;
        let tail = sz%64;
        let mask = match tail {
            0 => 0xFFFFFFFFFFFFFFFFu64,
            t => 0xFFFFFFFFFFFFFFFFu64 << t,
        };
        (self.0[last] & mask) == 0
    }
    fn heap_mem(&self) -> usize {
        self.0.capacity() * std::mem::size_of::<u64>()
    }
}
