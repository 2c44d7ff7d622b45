use rand::{Rng,SeedableRng,rngs::StdRng};
use serde::{Serialize,Deserialize,ser::{Serializer,SerializeStruct}};
use byteorder::{LittleEndian,ReadBytesExt,WriteBytesExt};
use std::io::{Read,Write};
use log::{debug,trace};

use crate::{
    Key,Binary,
    error::{BuildError,FixedSetIoError,Level},
    hash::LinearHash,
    fixed::{
        Config,check_distinct,
        bucket::{BucketTable,BucketIter},
    },
};

const CURRENT_FIXED_SET_VERSION: (u32,u32) = (0,1);

#[derive(Deserialize)]
#[serde(bound(deserialize = "K: Key + Deserialize<'de>"))]
struct SerdeFixedSet<K> {
    version: u64,
    key_size: usize,
    hash: Option<LinearHash>,
    buckets: Vec<BucketTable<K>>,
}
impl<K: Key> std::convert::TryFrom<SerdeFixedSet<K>> for FixedSet<K> {
    type Error = String;
    fn try_from(set: SerdeFixedSet<K>) -> Result<FixedSet<K>,String> {
        if set.version != 0 { return Err(format!("Unknown FixedSet version {}",set.version)); }
        if set.key_size != std::mem::size_of::<K>() { return Err(format!("Unvalid key size {}, must be {}",set.key_size,std::mem::size_of::<K>())); }
        let set = FixedSet {
            hash: set.hash,
            buckets: set.buckets,
        };
        set.validate()?;
        Ok(set)
    }
}

impl<K> Serialize for FixedSet<K>
where
    K: Serialize,
{
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("SerdeFixedSet", 4)?;
        let cur_ver: u64 = 0;
        state.serialize_field("version", &cur_ver)?;
        state.serialize_field("key_size", &std::mem::size_of::<K>())?;
        state.serialize_field("hash", &self.hash)?;
        state.serialize_field("buckets", &self.buckets)?;
        state.end()
    }
}

/// Static membership set with worst-case constant time `contains`.
///
/// The outer hash spreads the `n` keys over `n` buckets, each bucket is a
/// [`BucketTable`] with a collision free inner hash. Built once, never
/// modified; an empty key set gives a set without any hash function.
#[derive(Clone,Deserialize)]
#[serde(try_from = "SerdeFixedSet<K>", bound(deserialize = "K: Key + Deserialize<'de>"))]
pub struct FixedSet<K> {
    hash: Option<LinearHash>,
    buckets: Vec<BucketTable<K>>,
}
impl<K: std::fmt::Debug> std::fmt::Debug for FixedSet<K> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FixedSet")
            .field("len", &self.buckets.len())
            .field("hash", &self.hash)
            .field("buckets", &self.buckets)
            .finish()
    }
}
impl<K> FixedSet<K> {
    pub fn empty() -> FixedSet<K> {
        FixedSet {
            hash: None,
            buckets: Vec::new(),
        }
    }
    /// One bucket per key, so this is also the key count.
    pub fn len(&self) -> usize {
        self.buckets.len()
    }
    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }
    pub fn outer_hash(&self) -> Option<&LinearHash> {
        self.hash.as_ref()
    }
    pub fn buckets(&self) -> &[BucketTable<K>] {
        &self.buckets
    }
    /// Keys per outer bucket.
    pub fn bucket_sizes(&self) -> Vec<usize> {
        self.buckets.iter().map(|b| b.len()).collect()
    }
    /// Total slots over all inner tables, the sum of squared bucket sizes.
    pub fn inner_table_size(&self) -> usize {
        self.buckets.iter().fold(0,|acc,b| acc + b.table_size())
    }
    pub fn iter(&self) -> Iter<K> {
        Iter {
            buckets: self.buckets.iter(),
            current: None,
        }
    }
    pub fn statistics(&self) -> Vec<String> {
        let mut v = Vec::new();
        let n = self.len();
        v.push(format!("keys:        {:12}",n));
        if let Some(h) = &self.hash {
            v.push(format!("outer hash:  a={} b={} p={}",h.slope(),h.intercept(),h.prime()));
        }
        let used = self.buckets.iter().filter(|b| !b.is_empty()).count();
        let max = self.buckets.iter().fold(0,|acc,b| std::cmp::max(acc,b.len()));
        v.push(format!("buckets:     {:12} {:12} {:12}",n,used,max));
        let slots = self.inner_table_size();
        let ratio = match n {
            0 => 0.0,
            _ => slots as f64 / n as f64,
        };
        v.push(format!("inner slots: {:12} {:12.3}",slots,ratio));
        v
    }
}
impl<K: Key> FixedSet<K> {
    /// Builds with [`Config::default`] and a freshly seeded generator.
    pub fn new(keys: &[K]) -> Result<FixedSet<K>,BuildError> {
        FixedSet::with_config(keys,&Config::default())
    }
    pub fn with_config(keys: &[K], config: &Config) -> Result<FixedSet<K>,BuildError> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        FixedSet::with_rng(keys,config,&mut rng)
    }
    /// Builds using caller-owned randomness. `config.seed` is ignored.
    pub fn with_rng<R: Rng + ?Sized>(keys: &[K], config: &Config, rng: &mut R) -> Result<FixedSet<K>,BuildError> {
        config.validate()?;
        if keys.is_empty() { return Ok(FixedSet::empty()); }

        let n = keys.len();
        let wide: Vec<i64> = keys.iter().map(|k| k.widen()).collect();
        check_distinct(&wide)?;

        let selector = config.selector();
        let hash = match selector.select(rng,&wide,n,config.outer_acceptance(n),Level::Outer)? {
            Some(h) => h,
            None => return Ok(FixedSet::empty()),
        };

        let mut parts: Vec<Vec<K>> = vec![Vec::new(); n];
        for (k,w) in keys.iter().zip(wide.iter()) {
            parts[hash.index(*w)].push(*k);
        }
        let mut buckets = Vec::with_capacity(n);
        for (i,part) in parts.iter().enumerate() {
            if !part.is_empty() {
                trace!("outer bucket {} holds {} keys",i,part.len());
            }
            buckets.push(BucketTable::build(part,&selector,rng)?);
        }

        let set = FixedSet {
            hash: Some(hash),
            buckets: buckets,
        };
        debug!("fixed set of {} keys built with {} inner slots",n,set.inner_table_size());
        #[cfg(feature = "debug")]
        set.assert_invariants();
        Ok(set)
    }
    pub fn contains(&self, k: K) -> bool {
        let hash = match &self.hash {
            Some(h) => h,
            None => return false,
        };
        self.buckets[hash.index(k.widen())].contains(k)
    }

    fn validate(&self) -> Result<(),String> {
        let hash = match &self.hash {
            Some(h) => h,
            None => {
                if !self.buckets.is_empty() { return Err(format!("Set without hash holds {} buckets",self.buckets.len())); }
                return Ok(());
            },
        };
        if !hash.is_valid() { return Err(format!("Invalid outer hash {:?}",hash)); }
        let n = self.buckets.len();
        if hash.table_size() != n { return Err(format!("Outer hash covers {} buckets, set has {}",hash.table_size(),n)); }
        let mut cnt = 0;
        for (i,b) in self.buckets.iter().enumerate() {
            for k in b.iter() {
                if hash.index(k.widen()) != i { return Err(format!("Key {:?} stored in bucket {} instead of {}",k,i,hash.index(k.widen()))); }
                cnt += 1;
            }
        }
        if cnt != n { return Err(format!("{} keys in a set of {} buckets",cnt,n)); }
        Ok(())
    }
    #[cfg(any(test, feature = "debug"))]
    pub(crate) fn check_invariants(&self) -> Result<(),String> {
        for b in &self.buckets {
            b.check_invariants()?;
        }
        self.validate()
    }
    #[cfg(feature = "debug")]
    fn assert_invariants(&self) {
        if let Err(s) = self.check_invariants() {
            panic!("Unreachable check_invariants: {}",s);
        }
    }
}

impl<K: Key + Serialize + for<'de> Deserialize<'de>> Binary for FixedSet<K> {
    type IoError = FixedSetIoError;
    fn memory(&self) -> usize {
        let mut data_mem = self.buckets.capacity() * std::mem::size_of::<BucketTable<K>>();
        for b in &self.buckets {
            data_mem += b.heap_mem();
        }
        std::mem::size_of::<FixedSet<K>>() + data_mem
    }
    fn into_writer<W: Write>(&self, mut wrt: W) -> Result<(),Self::IoError> {
        let version = CURRENT_FIXED_SET_VERSION;
        write!(wrt,"FXST").map_err(|_|FixedSetIoError::WriteHeader)?;
        wrt.write_u32::<LittleEndian>(version.0).map_err(|_|FixedSetIoError::WriteHeader)?;
        wrt.write_u32::<LittleEndian>(version.1).map_err(|_|FixedSetIoError::WriteHeader)?;
        bincode::serialize_into(&mut wrt,self).map_err(FixedSetIoError::WriteData)
    }
    fn from_reader<R: Read>(mut rdr: R) -> Result<FixedSet<K>,Self::IoError> {
        let mut buf = [0; 4];
        rdr.read_exact(&mut buf).map_err(|_|FixedSetIoError::ReadHeader)?;
        if buf != "FXST".as_bytes()[0..4] { return Err(FixedSetIoError::InvalidHeader); }
        let maj = rdr.read_u32::<LittleEndian>().map_err(|_|FixedSetIoError::ReadHeader)?;
        let min = rdr.read_u32::<LittleEndian>().map_err(|_|FixedSetIoError::ReadHeader)?;
        if (maj,min) != CURRENT_FIXED_SET_VERSION { return Err(FixedSetIoError::InvalidVersion(maj,min)); }
        bincode::deserialize_from(&mut rdr).map_err(FixedSetIoError::ReadData)
    }
}

pub struct Iter<'t,K> {
    buckets: std::slice::Iter<'t,BucketTable<K>>,
    current: Option<BucketIter<'t,K>>,
}
impl<'t,K> Iterator for Iter<'t,K> {
    type Item = &'t K;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(it) = &mut self.current {
                if let Some(k) = it.next() {
                    return Some(k);
                }
            }
            match self.buckets.next() {
                Some(b) => self.current = Some(b.iter()),
                None => return None,
            }
        }
    }
}
impl<'t,K> IntoIterator for &'t FixedSet<K> {
    type Item = &'t K;
    type IntoIter = Iter<'t,K>;
    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}
