use rand::Rng;
use serde::{Serialize,Deserialize,ser::{Serializer,SerializeStruct}};
use log::trace;

use crate::{
    Flags,Key,
    error::{BuildError,Level},
    hash::LinearHash,
    select::{Acceptance,Selector},
    fixed::check_distinct,
};

#[derive(Deserialize)]
struct SerdeBucketTable<K> {
    key_size: usize,
    hash: Option<LinearHash>,
    flags: Vec<u64>,
    data: Vec<K>,
}
impl<K: Key> std::convert::TryFrom<SerdeBucketTable<K>> for BucketTable<K> {
    type Error = String;
    fn try_from(table: SerdeBucketTable<K>) -> Result<BucketTable<K>,String> {
        if table.key_size != std::mem::size_of::<K>() { return Err(format!("Unvalid key size {}, must be {}",table.key_size,std::mem::size_of::<K>())); }
        let table = BucketTable {
            hash: table.hash,
            flags: Flags(table.flags),
            data: table.data,
        };
        table.validate()?;
        Ok(table)
    }
}

impl<K> Serialize for BucketTable<K>
where
    K: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SerdeBucketTable", 4)?;
        state.serialize_field("key_size", &std::mem::size_of::<K>())?;
        state.serialize_field("hash", &self.hash)?;
        state.serialize_field("flags", &self.flags)?;
        state.serialize_field("data", &self.data)?;
        state.end()
    }
}

/// Second level of a [`FixedSet`](crate::FixedSet): the keys of one outer
/// bucket in a table of `k*k` slots, placed by an inner hash without collisions.
///
/// Slot occupancy lives in `flags`; an unoccupied slot holds `K::default()`,
/// which is never reported as a member.
#[derive(Clone,Deserialize)]
#[serde(try_from = "SerdeBucketTable<K>", bound(deserialize = "K: Key + Deserialize<'de>"))]
pub struct BucketTable<K> {
    hash: Option<LinearHash>,
    flags: Flags,
    data: Vec<K>,
}
impl<K: std::fmt::Debug> std::fmt::Debug for BucketTable<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BucketTable")
            .field("hash", &self.hash)
            .field("len", &self.flags.count())
            .field("table_size", &self.data.len())
            .finish()
    }
}
impl<K> BucketTable<K> {
    pub fn empty() -> BucketTable<K> {
        BucketTable {
            hash: None,
            flags: Flags::nulls(0),
            data: Vec::new(),
        }
    }
    pub fn hash(&self) -> Option<&LinearHash> {
        self.hash.as_ref()
    }
    pub fn len(&self) -> usize {
        self.flags.count()
    }
    pub fn is_empty(&self) -> bool {
        self.hash.is_none()
    }
    /// Number of slots, the square of `len`.
    pub fn table_size(&self) -> usize {
        self.data.len()
    }
    pub fn iter(&self) -> BucketIter<K> {
        BucketIter {
            iter: self.data.iter().enumerate(),
            flags: &self.flags,
        }
    }
    pub(crate) fn heap_mem(&self) -> usize {
        self.flags.heap_mem() + self.data.capacity() * std::mem::size_of::<K>()
    }
}
impl<K: Key> BucketTable<K> {
    pub fn build<R: Rng + ?Sized>(keys: &[K], selector: &Selector, rng: &mut R) -> Result<BucketTable<K>,BuildError> {
        if keys.is_empty() { return Ok(BucketTable::empty()); }
        let wide: Vec<i64> = keys.iter().map(|k| k.widen()).collect();
        check_distinct(&wide)?;

        let size = keys.len() * keys.len();
        let hash = match selector.select(rng,&wide,size,Acceptance::Collisions(0),Level::Inner)? {
            Some(h) => h,
            None => return Ok(BucketTable::empty()),
        };
        let mut flags = Flags::nulls(size);
        let mut data = vec![K::default(); size];
        for (k,w) in keys.iter().zip(wide.iter()) {
            let idx = hash.index(*w);
            data[idx] = *k;
            flags.set(idx);
        }
        trace!("bucket of {} keys placed into {} slots",keys.len(),size);
        Ok(BucketTable {
            hash: Some(hash),
            flags: flags,
            data: data,
        })
    }
    pub fn contains(&self, k: K) -> bool {
        let hash = match &self.hash {
            Some(h) => h,
            None => return false,
        };
        let idx = hash.index(k.widen());
        self.flags.get(idx) && (self.data[idx] == k)
    }

    fn validate(&self) -> Result<(),String> {
        let hash = match &self.hash {
            Some(h) => h,
            None => {
                if !self.data.is_empty() { return Err(format!("Table without hash holds {} slots",self.data.len())); }
                if !self.flags.fits(0) { return Err("Table without hash has occupied flags".to_string()); }
                return Ok(());
            },
        };
        if !hash.is_valid() { return Err(format!("Invalid inner hash {:?}",hash)); }
        let size = self.data.len();
        if hash.table_size() != size { return Err(format!("Inner hash covers {} slots, table has {}",hash.table_size(),size)); }
        if !self.flags.fits(size) { return Err(format!("Flags do not match {} slots",size)); }
        let len = self.flags.count();
        if (len == 0)||(len * len != size) { return Err(format!("{} keys in a table of {} slots",len,size)); }
        for (idx,k) in self.iter_slots() {
            if hash.index(k.widen()) != idx { return Err(format!("Key {:?} stored at slot {} instead of {}",k,idx,hash.index(k.widen()))); }
        }
        Ok(())
    }
    fn iter_slots(&self) -> impl Iterator<Item = (usize,K)> + '_ {
        self.data.iter().enumerate().filter(move |(i,_)| self.flags.get(*i)).map(|(i,k)| (i,*k))
    }
    /// Every stored key sits at its own inner hash slot, so no two collide.
    #[cfg(any(test, feature = "debug"))]
    pub(crate) fn check_invariants(&self) -> Result<(),String> {
        self.validate()
    }
}

pub struct BucketIter<'t,K> {
    iter: std::iter::Enumerate<std::slice::Iter<'t,K>>,
    flags: &'t Flags,
}
impl<'t,K> Iterator for BucketIter<'t,K> {
    type Item = &'t K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            match self.iter.next() {
                Some((n,k)) if self.flags.get(n) => break Some(k),
                Some(_) => continue,
                None => break None,
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hash::HashFamily;
    use rand::{SeedableRng,rngs::StdRng};

    fn selector() -> Selector {
        Selector::new(HashFamily::new(),100)
    }

    #[test]
    fn empty_bucket() {
        let mut rng = StdRng::seed_from_u64(1);
        let table: BucketTable<i32> = BucketTable::build(&[],&selector(),&mut rng).unwrap();
        assert!(table.is_empty());
        assert!(table.hash().is_none());
        assert_eq!(table.table_size(),0);
        assert!(!table.contains(0));
        assert!(!table.contains(-1));
        assert_eq!(table.check_invariants(),Ok(()));
    }

    #[test]
    fn default_value_is_not_a_member() {
        let mut rng = StdRng::seed_from_u64(2);
        let table = BucketTable::build(&[5i32,9,-13],&selector(),&mut rng).unwrap();
        assert_eq!(table.table_size(),9);
        assert_eq!(table.len(),3);
        assert!(!table.contains(0));
        for k in [5,9,-13].iter() {
            assert!(table.contains(*k));
        }
    }

    #[test]
    fn zero_key_is_a_member() {
        let mut rng = StdRng::seed_from_u64(3);
        let table = BucketTable::build(&[0u32,7],&selector(),&mut rng).unwrap();
        assert!(table.contains(0));
        assert!(table.contains(7));
        assert!(!table.contains(1));
    }

    #[test]
    fn inner_hash_is_perfect() {
        let mut rng = StdRng::seed_from_u64(4);
        for n in 1 .. 40 {
            let keys: Vec<i32> = (0 .. n).map(|i| i * 7919 - 50_000).collect();
            let table = BucketTable::build(&keys,&selector(),&mut rng).unwrap();
            let h = table.hash().unwrap();
            let mut slots: Vec<usize> = keys.iter().map(|k| h.index(k.widen())).collect();
            slots.sort();
            slots.dedup();
            assert_eq!(slots.len(),keys.len());
            assert_eq!(table.check_invariants(),Ok(()));
            let mut stored: Vec<i32> = table.iter().copied().collect();
            stored.sort();
            assert_eq!(stored,keys);
        }
    }

    #[test]
    fn duplicates_rejected() {
        let mut rng = StdRng::seed_from_u64(5);
        let r = BucketTable::build(&[4i16,8,4],&selector(),&mut rng);
        assert_eq!(r.unwrap_err(),BuildError::DuplicateKey(4));
    }

    #[test]
    fn corrupt_tables_rejected() {
        let mut rng = StdRng::seed_from_u64(6);
        let table = BucketTable::build(&[10i32,20,30],&selector(),&mut rng).unwrap();

        let bytes = bincode::serialize(&table).unwrap();
        let back: BucketTable<i32> = bincode::deserialize(&bytes).unwrap();
        for k in [10,20,30].iter() {
            assert!(back.contains(*k));
        }

        let mut moved = table.clone();
        let idx = moved.hash.unwrap().index(10);
        let other = (idx + 1) % moved.data.len();
        moved.data.swap(idx,other);
        moved.flags = Flags::nulls(9);
        for (i,k) in moved.data.clone().iter().enumerate() {
            if [10,20,30].contains(k) { moved.flags.set(i); }
        }
        let bytes = bincode::serialize(&moved).unwrap();
        assert!(bincode::deserialize::<BucketTable<i32>>(&bytes).is_err());

        let bytes = bincode::serialize(&table).unwrap();
        assert!(bincode::deserialize::<BucketTable<i16>>(&bytes).is_err());
    }
}
