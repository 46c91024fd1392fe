//! Where version histories come from, and an in-process place to keep them.
//!
//! [`HistoryStore`] is the read side the history-aware manager depends on.
//! [`MemoryHistory`] also takes the records a transition produced and swaps
//! them in for the live version they were derived from, all under one lock,
//! refusing the swap if that version is no longer there.

use core::hash::BuildHasherDefault;
use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard};

use seahash::SeaHasher;
use tracing::{debug, warn};

use crate::entity::TemporalEntity;
use crate::error::{BitemporalError, Result};
use crate::interval::BitemporalInterval;
use crate::manager::{DeleteTransition, UpdateTransition};

pub type KeyHasher = BuildHasherDefault<SeaHasher>;

pub trait HistoryStore<E: TemporalEntity> {
    /// Every version ever stored for `business_key`, live or not, in no
    /// particular order. An unknown key has an empty history.
    fn history(&self, business_key: &E::Key) -> Result<Vec<E>>;
}

impl<E: TemporalEntity, S: HistoryStore<E> + ?Sized> HistoryStore<E> for &S {
    fn history(&self, business_key: &E::Key) -> Result<Vec<E>> {
        (**self).history(business_key)
    }
}

impl<E: TemporalEntity, S: HistoryStore<E> + ?Sized> HistoryStore<E> for std::sync::Arc<S> {
    fn history(&self, business_key: &E::Key) -> Result<Vec<E>> {
        (**self).history(business_key)
    }
}

/// Keeps histories in memory, one vector of versions per business key.
#[derive(Debug)]
pub struct MemoryHistory<E: TemporalEntity> {
    kept: Mutex<HashMap<E::Key, Vec<E>, KeyHasher>>,
}

impl<E: TemporalEntity> Default for MemoryHistory<E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<E: TemporalEntity> MemoryHistory<E> {
    pub fn new() -> Self {
        Self {
            kept: Mutex::new(HashMap::default()),
        }
    }
    fn lock(&self) -> Result<MutexGuard<'_, HashMap<E::Key, Vec<E>, KeyHasher>>> {
        self.kept
            .lock()
            .map_err(|e| BitemporalError::Store(format!("history lock poisoned: {e}")))
    }
    /// Starts the history of a new entity with its first live version.
    pub fn insert_initial(&self, entity: E) -> Result<()> {
        if !entity.interval().is_live_version() {
            return Err(BitemporalError::InvalidArgument(format!(
                "initial version of {:?} must be live",
                entity.business_key()
            )));
        }
        let mut kept = self.lock()?;
        let versions = kept.entry(entity.business_key().clone()).or_default();
        if versions.iter().any(|v| v.interval().is_live_version()) {
            return Err(BitemporalError::InvalidState(format!(
                "{:?} already has a live version",
                entity.business_key()
            )));
        }
        debug!(key = ?entity.business_key(), interval = %entity.interval(), "kept initial version");
        versions.push(entity);
        Ok(())
    }
    /// Replaces the live version `transition` was derived from with its
    /// closed, expired and updated records.
    pub fn commit_update(&self, transition: UpdateTransition<E>) -> Result<()> {
        let UpdateTransition {
            closed,
            expired,
            updated,
        } = transition;
        same_key(&closed, &[&expired, &updated])?;
        if !updated.interval().is_live_version() {
            return Err(BitemporalError::InvalidArgument(format!(
                "updated version of {:?} is not live",
                updated.business_key()
            )));
        }
        let mut kept = self.lock()?;
        let versions = kept.get_mut(closed.business_key()).ok_or_else(|| {
            BitemporalError::NotFound(format!("no history for {:?}", closed.business_key()))
        })?;
        let basis = find_basis(versions, closed.interval(), true)?;
        versions.remove(basis);
        debug!(key = ?closed.business_key(), "committed update");
        versions.extend([closed, expired, updated]);
        Ok(())
    }
    /// Replaces the version `transition` was derived from with its closed and
    /// deleted records.
    pub fn commit_delete(&self, transition: DeleteTransition<E>) -> Result<()> {
        let DeleteTransition { closed, deleted } = transition;
        same_key(&closed, &[&deleted])?;
        let mut kept = self.lock()?;
        let versions = kept.get_mut(closed.business_key()).ok_or_else(|| {
            BitemporalError::NotFound(format!("no history for {:?}", closed.business_key()))
        })?;
        let basis = find_basis(versions, closed.interval(), false)?;
        versions.remove(basis);
        debug!(key = ?closed.business_key(), "committed delete");
        versions.extend([closed, deleted]);
        Ok(())
    }
    /// Number of versions of `business_key` that are live. Anything above one
    /// means the history is corrupt.
    pub fn live_count(&self, business_key: &E::Key) -> Result<usize> {
        Ok(self.lock()?.get(business_key).map_or(0, |versions| {
            versions
                .iter()
                .filter(|v| v.interval().is_live_version())
                .count()
        }))
    }
    pub fn keys(&self) -> Result<Vec<E::Key>> {
        Ok(self.lock()?.keys().cloned().collect())
    }
    /// Total number of versions across all keys.
    pub fn len(&self) -> Result<usize> {
        Ok(self.lock()?.values().map(Vec::len).sum())
    }
    pub fn is_empty(&self) -> Result<bool> {
        Ok(self.len()? == 0)
    }
}

impl<E: TemporalEntity + Clone> HistoryStore<E> for MemoryHistory<E> {
    fn history(&self, business_key: &E::Key) -> Result<Vec<E>> {
        Ok(self.lock()?.get(business_key).cloned().unwrap_or_default())
    }
}

fn same_key<E: TemporalEntity>(first: &E, rest: &[&E]) -> Result<()> {
    if let Some(other) = rest.iter().find(|e| e.business_key() != first.business_key()) {
        return Err(BitemporalError::InvalidArgument(format!(
            "transition mixes business keys {:?} and {:?}",
            first.business_key(),
            other.business_key()
        )));
    }
    Ok(())
}

/// Position of the stored, still open version that `closed` was derived from.
fn find_basis<E: TemporalEntity>(
    versions: &[E],
    closed: &BitemporalInterval,
    must_be_live: bool,
) -> Result<usize> {
    let Some(at) = closed.recorded_to() else {
        return Err(BitemporalError::InvalidArgument(format!(
            "closed record {closed} has no recorded end"
        )));
    };
    versions
        .iter()
        .position(|v| {
            let candidate = v.interval();
            !candidate.is_closed()
                && (!must_be_live || candidate.is_live_version())
                && candidate
                    .closing_recorded_at(at)
                    .is_ok_and(|c| c == *closed)
        })
        .ok_or_else(|| {
            warn!(%closed, "basis of transition is no longer open");
            BitemporalError::Conflict(format!(
                "the version closed as {closed} is no longer current"
            ))
        })
}
