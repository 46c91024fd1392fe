//! The capability a versioned entity must offer, and a generic entity that
//! offers it.
//!
//! Every version of an entity carries two identities:
//! * the business key, assigned once and shared by all versions, which is
//!   what threads a history together, and
//! * a version-local surrogate, distinguishing physical copies that share a
//!   business key.
//!
//! [`TemporalEntity::snapshot`] is the only way the managers duplicate an
//! entity. It must keep the business key and the interval, and hand out a
//! fresh surrogate.

use std::fmt;
use std::hash::Hash;
use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::{BitemporalError, Result};
use crate::interval::{BitemporalInterval, Instant};

pub trait TemporalEntity: Sized {
    type Key: Clone + Eq + Hash + fmt::Debug;

    /// Identity shared by every version. Never changes.
    fn business_key(&self) -> &Self::Key;
    fn interval(&self) -> &BitemporalInterval;
    /// Only the managers should call this, and only on a live version.
    fn set_interval(&mut self, interval: BitemporalInterval);
    /// An independent copy with a new surrogate identity.
    fn snapshot(&self) -> Self;
}

// ------------- Version -------------
pub type VersionId = u64;

pub const GENESIS: VersionId = 0;

/// The largest id a restored version may carry. Everything above it is left
/// for the generator, so it cannot run out of ids.
pub const MAX_RETAINED: VersionId = VersionId::MAX >> 1;

/// Hands out surrogate identities. Ids are only ever generated, but restoring
/// versions read back from a store must retain theirs so that later ids do
/// not collide.
#[derive(Debug)]
pub struct VersionGenerator {
    lower_bound: AtomicU64,
}

impl VersionGenerator {
    pub const fn new() -> Self {
        Self {
            lower_bound: AtomicU64::new(GENESIS),
        }
    }
    pub fn retain(&self, version: VersionId) -> Result<()> {
        if version > MAX_RETAINED {
            return Err(BitemporalError::InvalidArgument(format!(
                "version {version} is above the retainable maximum {MAX_RETAINED}"
            )));
        }
        self.lower_bound.fetch_max(version, Ordering::SeqCst);
        Ok(())
    }
    /// Panics only once every id above [`MAX_RETAINED`] has been handed out.
    pub fn generate(&self) -> VersionId {
        match self
            .lower_bound
            .fetch_update(Ordering::SeqCst, Ordering::SeqCst, |v| v.checked_add(1))
        {
            Ok(previous) => previous + 1,
            Err(_) => panic!("surrogate version ids exhausted"),
        }
    }
    pub fn lower_bound(&self) -> VersionId {
        self.lower_bound.load(Ordering::SeqCst)
    }
}

impl Default for VersionGenerator {
    fn default() -> Self {
        Self::new()
    }
}

static VERSIONS: VersionGenerator = VersionGenerator::new();

/// The generator used by [`Record`].
pub fn versions() -> &'static VersionGenerator {
    &VERSIONS
}

// ------------- Record -------------
/// One version of an entity whose business fields are `T`.
///
/// `clone` copies the row as it is, surrogate included, the way a read from a
/// store would. [`TemporalEntity::snapshot`] makes a new row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record<K, T> {
    version: VersionId,
    business_key: K,
    data: T,
    interval: BitemporalInterval,
}

impl<K, T> Record<K, T> {
    /// The first live version of a new entity, applicable and recorded from `at`.
    pub fn initial(business_key: K, data: T, at: Instant) -> Self {
        Self {
            version: VERSIONS.generate(),
            business_key,
            data,
            interval: BitemporalInterval::latest(at, at),
        }
    }
    /// Rebuilds a version that already exists elsewhere, keeping its surrogate.
    /// Fails for a surrogate above [`MAX_RETAINED`].
    pub fn restore(
        version: VersionId,
        business_key: K,
        data: T,
        interval: BitemporalInterval,
    ) -> Result<Self> {
        VERSIONS.retain(version)?;
        Ok(Self {
            version,
            business_key,
            data,
            interval,
        })
    }
    pub fn version(&self) -> VersionId {
        self.version
    }
    pub fn data(&self) -> &T {
        &self.data
    }
    // the business key has no setter
    pub fn data_mut(&mut self) -> &mut T {
        &mut self.data
    }
    pub fn into_data(self) -> T {
        self.data
    }
}

impl<K, T> TemporalEntity for Record<K, T>
where
    K: Clone + Eq + Hash + fmt::Debug,
    T: Clone,
{
    type Key = K;

    fn business_key(&self) -> &K {
        &self.business_key
    }
    fn interval(&self) -> &BitemporalInterval {
        &self.interval
    }
    fn set_interval(&mut self, interval: BitemporalInterval) {
        self.interval = interval;
    }
    fn snapshot(&self) -> Self {
        Self {
            version: VERSIONS.generate(),
            business_key: self.business_key.clone(),
            data: self.data.clone(),
            interval: self.interval,
        }
    }
}

impl<K: fmt::Debug, T> fmt::Display for Record<K, T> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}#{} {}", self.business_key, self.version, self.interval)
    }
}
