//! Resource identity interning for fast bucket lookups.
//!
//! A resource is identified by (name, kind, rate). The interner maps each
//! distinct identity to a dense integer bucket so reductions can accumulate
//! into a `Vec` instead of hashing strings on every line.

use rustc_hash::FxHashMap;

use crate::models::ResourceKind;

/// Interned resource bucket (u32 for compact storage and fast hashing).
pub type ResourceBucket = u32;

/// Hashable resource identity. The rate is keyed by its bit pattern with
/// negative zero folded into zero.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ResourceKey {
    pub name: String,
    pub kind: ResourceKind,
    rate_bits: u64,
}

impl ResourceKey {
    pub fn new(name: &str, kind: ResourceKind, rate: f64) -> Self {
        let rate = if rate == 0.0 { 0.0 } else { rate };
        Self {
            name: name.to_string(),
            kind,
            rate_bits: rate.to_bits(),
        }
    }

    pub fn rate(&self) -> f64 {
        f64::from_bits(self.rate_bits)
    }
}

/// Maps resource identities to dense bucket indices.
#[derive(Debug, Clone, Default)]
pub struct ResourceInterner {
    to_bucket: FxHashMap<ResourceKey, ResourceBucket>,
    from_bucket: Vec<ResourceKey>,
}

impl ResourceInterner {
    /// Create a new interner with pre-allocated capacity.
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            to_bucket: FxHashMap::with_capacity_and_hasher(capacity, Default::default()),
            from_bucket: Vec::with_capacity(capacity),
        }
    }

    /// Intern a key, returning its bucket. Existing keys keep their bucket.
    pub fn intern(&mut self, key: ResourceKey) -> ResourceBucket {
        if let Some(&bucket) = self.to_bucket.get(&key) {
            return bucket;
        }
        let bucket = self.from_bucket.len() as ResourceBucket;
        self.from_bucket.push(key.clone());
        self.to_bucket.insert(key, bucket);
        bucket
    }

    #[inline]
    pub fn get(&self, key: &ResourceKey) -> Option<ResourceBucket> {
        self.to_bucket.get(key).copied()
    }

    #[inline]
    pub fn resolve(&self, bucket: ResourceBucket) -> Option<&ResourceKey> {
        self.from_bucket.get(bucket as usize)
    }

    pub fn len(&self) -> usize {
        self.from_bucket.len()
    }

    pub fn is_empty(&self) -> bool {
        self.from_bucket.is_empty()
    }
}
