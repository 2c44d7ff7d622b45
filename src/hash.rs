use rand::Rng;
use serde::{Serialize,Deserialize};

/// Modulus of the affine hash family. Larger than any 32-bit key.
pub const PRIME: u64 = 87_178_291_199;

/// `h(x) = ((a*x + b) mod p) mod m`
///
/// Plain data: the coefficients, the prime and the table size `m` it reduces to.
#[derive(Debug,Clone,Copy,PartialEq,Eq,Serialize,Deserialize)]
pub struct LinearHash {
    slope: u64,
    intercept: u64,
    prime: u64,
    table_size: u64,
}
impl LinearHash {
    /// Coefficients are reduced modulo `prime`. Returns `None` for a zero
    /// prime or a zero table size.
    pub fn new(slope: u64, intercept: u64, prime: u64, table_size: usize) -> Option<LinearHash> {
        if (prime == 0)||(table_size == 0) { return None; }
        Some(LinearHash {
            slope: slope % prime,
            intercept: intercept % prime,
            prime: prime,
            table_size: table_size as u64,
        })
    }
    pub fn slope(&self) -> u64 {
        self.slope
    }
    pub fn intercept(&self) -> u64 {
        self.intercept
    }
    pub fn prime(&self) -> u64 {
        self.prime
    }
    pub fn table_size(&self) -> usize {
        self.table_size as usize
    }
    #[inline]
    pub fn index(&self, key: i64) -> usize {
        let v = (self.slope as i128) * (key as i128) + (self.intercept as i128);
        let v = v.rem_euclid(self.prime as i128) as u64;
        (v % self.table_size) as usize
    }
    // Deserialized values bypass `new`.
    pub(crate) fn is_valid(&self) -> bool {
        (self.prime > 0)&&(self.table_size > 0)&&(self.slope < self.prime)&&(self.intercept < self.prime)
    }
}

/// Affine functions modulo a fixed prime, sampled uniformly.
#[derive(Debug,Clone,Copy,PartialEq,Eq)]
pub struct HashFamily {
    prime: u64,
}
impl Default for HashFamily {
    fn default() -> HashFamily {
        HashFamily::new()
    }
}
impl HashFamily {
    pub fn new() -> HashFamily {
        HashFamily { prime: PRIME }
    }
    pub fn prime(&self) -> u64 {
        self.prime
    }
    /// `None` if `table_size` is 0: there is nothing to hash into.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R, table_size: usize) -> Option<LinearHash> {
        if table_size == 0 { return None; }
        let a = rng.gen_range(0 .. self.prime);
        let b = rng.gen_range(0 .. self.prime);
        LinearHash::new(a,b,self.prime,table_size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::{SeedableRng,rngs::StdRng};

    #[test]
    fn index_matches_reference_arithmetic() {
        let h = LinearHash::new(5,3,11,4).unwrap();
        // (5*2 + 3) mod 11 = 2, mod 4 = 2
        assert_eq!(h.index(2),2);
        // (5*(-3) + 3) mod 11 = -12 mod 11 = 10, mod 4 = 2
        assert_eq!(h.index(-3),2);
        // (5*0 + 3) mod 11 = 3
        assert_eq!(h.index(0),3);
    }

    #[test]
    fn coefficients_are_reduced() {
        let h = LinearHash::new(25,14,11,7).unwrap();
        assert_eq!(h.slope(),3);
        assert_eq!(h.intercept(),3);
        assert!(LinearHash::new(1,1,0,7).is_none());
        assert!(LinearHash::new(1,1,11,0).is_none());
    }

    #[test]
    fn no_overflow_on_extreme_keys() {
        let h = LinearHash::new(PRIME - 1,PRIME - 1,PRIME,1_000_003).unwrap();
        for k in [i32::MIN as i64, i32::MAX as i64, u32::MAX as i64, -1, 0].iter() {
            let expected = ((PRIME as i128 - 1) * (*k as i128) + (PRIME as i128 - 1)).rem_euclid(PRIME as i128) as u64 % 1_000_003;
            assert_eq!(h.index(*k),expected as usize);
            assert!(h.index(*k) < 1_000_003);
        }
    }

    #[test]
    fn sample_stays_in_range() {
        let family = HashFamily::new();
        let mut rng = StdRng::seed_from_u64(667);
        assert!(family.sample(&mut rng,0).is_none());
        for sz in 1 .. 50 {
            let h = family.sample(&mut rng,sz).unwrap();
            assert!(h.is_valid());
            assert_eq!(h.table_size(),sz);
            assert_eq!(h.prime(),PRIME);
            for k in -100 .. 100 {
                assert!(h.index(k) < sz);
            }
        }
    }

    #[test]
    fn same_seed_same_function() {
        let family = HashFamily::new();
        let mut r1 = StdRng::seed_from_u64(42);
        let mut r2 = StdRng::seed_from_u64(42);
        assert_eq!(family.sample(&mut r1,100),family.sample(&mut r2,100));
    }
}
