use rand::Rng;
use log::{debug,warn,error};

use crate::{
    error::{BuildError,Level},
    hash::{HashFamily,LinearHash},
};

// Past this many attempts the acceptance bound is probably too tight.
const WARN_ATTEMPTS: usize = 8;

/// Number of keys landing in every slot of `hash`'s table.
pub fn bucket_sizes(keys: &[i64], hash: &LinearHash) -> Vec<u64> {
    let mut sizes = vec![0u64; hash.table_size()];
    for k in keys {
        sizes[hash.index(*k)] += 1;
    }
    sizes
}

/// Unordered colliding pairs: sum of `c*(c-1)/2` over slots.
///
/// Tables of size 0 cannot be described by a [`LinearHash`]; callers reach
/// that case only through [`Selector::select`], which answers it without
/// counting.
pub fn count_collisions(keys: &[i64], hash: &LinearHash) -> u64 {
    if keys.is_empty() { return 0; }
    bucket_sizes(keys,hash).iter().fold(0,|acc,c| acc + c*c.saturating_sub(1)/2)
}

pub fn square_sum(sizes: &[u64]) -> u64 {
    sizes.iter().fold(0,|acc,c| acc + c*c)
}

/// Bound a candidate hash function has to meet.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub enum Acceptance {
    /// At most this many colliding pairs.
    Collisions(u64),
    /// Sum of squared slot loads at most this.
    SquareSum(u64),
}
impl Acceptance {
    pub fn accepts(&self, keys: &[i64], hash: &LinearHash) -> bool {
        match self {
            Acceptance::Collisions(limit) => count_collisions(keys,hash) <= *limit,
            Acceptance::SquareSum(limit) => square_sum(&bucket_sizes(keys,hash)) <= *limit,
        }
    }
}

/// Samples from a [`HashFamily`] until a candidate meets its [`Acceptance`],
/// giving up after `max_attempts` candidates.
#[derive(Debug,Clone,Copy)]
pub struct Selector {
    family: HashFamily,
    max_attempts: usize,
}
impl Selector {
    pub fn new(family: HashFamily, max_attempts: usize) -> Selector {
        Selector {
            family: family,
            max_attempts: max_attempts,
        }
    }
    pub fn max_attempts(&self) -> usize {
        self.max_attempts
    }
    /// `Ok(None)` for an empty table: no function is needed.
    pub fn select<R: Rng + ?Sized>(&self, rng: &mut R, keys: &[i64], table_size: usize, acceptance: Acceptance, level: Level) -> Result<Option<LinearHash>,BuildError> {
        if table_size == 0 { return Ok(None); }
        for attempt in 1 ..= self.max_attempts {
            let hash = match self.family.sample(rng,table_size) {
                Some(h) => h,
                None => return Ok(None),
            };
            if acceptance.accepts(keys,&hash) {
                if attempt > WARN_ATTEMPTS {
                    warn!("{} hash for {} keys accepted only after {} attempts ({:?})",level,keys.len(),attempt,acceptance);
                } else {
                    debug!("{} hash for {} keys accepted after {} attempts",level,keys.len(),attempt);
                }
                return Ok(Some(hash));
            }
        }
        error!("no {} hash for {} keys over {} slots within {} attempts ({:?})",level,keys.len(),table_size,self.max_attempts,acceptance);
        Err(BuildError::AttemptsExhausted {
            level: level,
            attempts: self.max_attempts,
        })
    }
}
