//! The transition engine.
//!
//! A transition takes the single live version of an entity and derives the
//! records that replace it:
//!
//! * `closed`: the old version as the system believed it until now. Its
//!   recorded time ends at the clock reading, its applicable time is as it was.
//! * `expired`: the old version with its applicable time ending where the new
//!   one begins (updates only).
//! * `updated`: the new live version (updates), or `deleted`: the old version
//!   with applicable time ended and no successor (deletes).
//!
//! The clock is read once per transition, so `closed` and the new version agree
//! on the instant at which the system changed its mind.
//!
//! Managers hold no locks and keep no state between calls. Two writers racing
//! on the same business key must be serialized by whatever persists the
//! records, e.g. a unique "one live version per key" constraint or the basis
//! check in [`crate::history::MemoryHistory`].

use std::fmt;

use tracing::{debug, warn};

use crate::clock::Clock;
use crate::entity::TemporalEntity;
use crate::error::{BitemporalError, Result};
use crate::history::HistoryStore;
use crate::interval::{BitemporalInterval, Instant};
use crate::settings::{Settings, TransitionPolicy};

/// Records produced by an update, in the order they should be written.
#[derive(Debug, PartialEq, Eq)]
pub struct UpdateTransition<E> {
    pub closed: E,
    pub expired: E,
    pub updated: E,
}

impl<E> UpdateTransition<E> {
    pub fn into_records(self) -> [E; 3] {
        [self.closed, self.expired, self.updated]
    }
}

/// Records produced by a delete.
#[derive(Debug, PartialEq, Eq)]
pub struct DeleteTransition<E> {
    pub closed: E,
    pub deleted: E,
}

impl<E> DeleteTransition<E> {
    pub fn into_records(self) -> [E; 2] {
        [self.closed, self.deleted]
    }
}

/// A refused transition. The entity is handed back exactly as it came in.
#[derive(Debug)]
pub struct Rejected<E> {
    pub error: BitemporalError,
    pub entity: E,
}

impl<E> Rejected<E> {
    pub fn into_parts(self) -> (BitemporalError, E) {
        (self.error, self.entity)
    }
}

impl<E> fmt::Display for Rejected<E> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl<E: fmt::Debug> std::error::Error for Rejected<E> {}

impl<E> From<Rejected<E>> for BitemporalError {
    fn from(rejected: Rejected<E>) -> Self {
        rejected.error
    }
}

pub type TransitionResult<T, E> = std::result::Result<T, Rejected<E>>;

fn require_live<E: TemporalEntity>(entity: &E) -> Result<()> {
    if !entity.interval().is_live_version() {
        warn!(key = ?entity.business_key(), interval = %entity.interval(), "not the live version");
        return Err(BitemporalError::InvalidState(format!(
            "not the live version of {:?}",
            entity.business_key()
        )));
    }
    Ok(())
}

fn require_open<E: TemporalEntity>(entity: &E) -> Result<()> {
    if entity.interval().is_closed() {
        warn!(key = ?entity.business_key(), interval = %entity.interval(), "closed version");
        return Err(BitemporalError::InvalidState(format!(
            "closed versions are immutable ({:?})",
            entity.business_key()
        )));
    }
    Ok(())
}

fn require_later(current: &BitemporalInterval, applicable_from: Instant) -> Result<()> {
    if applicable_from <= current.applicable_from() {
        warn!(%applicable_from, current = %current.applicable_from(), "applicable time not after current");
        return Err(BitemporalError::InvalidArgument(format!(
            "new applicable time {} must be strictly after current {}",
            applicable_from,
            current.applicable_from()
        )));
    }
    Ok(())
}

/// A delete may only shorten an applicable time that already ends, otherwise
/// the version would overlap its successor.
fn require_not_extended(current: &BitemporalInterval, applicable_to: Instant) -> Result<()> {
    match current.applicable_to() {
        Some(end) if applicable_to > end => {
            warn!(%applicable_to, current = %end, "delete would extend applicable time");
            Err(BitemporalError::InvalidArgument(format!(
                "applicable time ends at {end}, a delete cannot move it to {applicable_to}"
            )))
        }
        _ => Ok(()),
    }
}

/// A copy of `basis` carrying `interval`.
fn derive<E: TemporalEntity>(basis: &E, interval: BitemporalInterval) -> E {
    let mut record = basis.snapshot();
    record.set_interval(interval);
    record
}

/// Everything an update needs that can fail, worked out before any record
/// is touched.
#[derive(Debug, Clone, Copy)]
struct UpdatePlan {
    now: Instant,
    applicable_from: Instant,
    closed: BitemporalInterval,
    expired: BitemporalInterval,
}

impl UpdatePlan {
    /// Derives the records from `basis`; `successor` supplies the content of
    /// the new live version.
    fn apply<E, F>(self, basis: E, successor: F) -> UpdateTransition<E>
    where
        E: TemporalEntity,
        F: FnOnce(E) -> E,
    {
        let closed = derive(&basis, self.closed);
        let expired = derive(&basis, self.expired);
        let mut updated = successor(basis);
        updated.set_interval(BitemporalInterval::latest(self.applicable_from, self.now));
        debug!(
            key = ?updated.business_key(),
            now = %self.now,
            applicable_from = %self.applicable_from,
            closed = %closed.interval(),
            expired = %expired.interval(),
            "superseded live version"
        );
        UpdateTransition {
            closed,
            expired,
            updated,
        }
    }
}

/// Works on a live version the caller already holds.
#[derive(Debug)]
pub struct BitemporalManager<C> {
    clock: C,
    policy: TransitionPolicy,
}

impl<C: Clock> BitemporalManager<C> {
    pub fn new(clock: C) -> Self {
        Self::with_policy(clock, TransitionPolicy::default())
    }
    pub fn with_policy(clock: C, policy: TransitionPolicy) -> Self {
        Self { clock, policy }
    }
    pub fn from_settings(clock: C, settings: &Settings) -> Self {
        Self::with_policy(clock, settings.transitions)
    }
    pub fn clock(&self) -> &C {
        &self.clock
    }
    pub fn policy(&self) -> TransitionPolicy {
        self.policy
    }

    /// Supersedes the live `entity` with a new live version applicable from
    /// `applicable_from`. `mutate` changes business fields only; whatever it
    /// does to the interval is overwritten.
    pub fn update<E, F>(
        &self,
        entity: E,
        applicable_from: Instant,
        mutate: F,
    ) -> TransitionResult<UpdateTransition<E>, E>
    where
        E: TemporalEntity,
        F: FnOnce(&mut E),
    {
        let plan = require_live(&entity)
            .and_then(|()| self.plan_update(entity.interval(), applicable_from));
        let plan = match plan {
            Ok(plan) => plan,
            Err(error) => return Err(Rejected { error, entity }),
        };
        Ok(plan.apply(entity, |mut live| {
            mutate(&mut live);
            live
        }))
    }

    /// Ends the applicable time of `entity` without a successor.
    pub fn delete<E: TemporalEntity>(
        &self,
        entity: E,
        applicable_to: Instant,
    ) -> TransitionResult<DeleteTransition<E>, E> {
        let (closed_interval, deleted_interval) = match self.plan_delete(&entity, applicable_to) {
            Ok(intervals) => intervals,
            Err(error) => return Err(Rejected { error, entity }),
        };
        let closed = derive(&entity, closed_interval);
        let mut deleted = entity;
        deleted.set_interval(deleted_interval);
        debug!(
            key = ?deleted.business_key(),
            closed = %closed.interval(),
            deleted = %deleted.interval(),
            "deleted live version"
        );
        Ok(DeleteTransition { closed, deleted })
    }

    /// Validates an update of a version with interval `current` and reads the
    /// clock.
    fn plan_update(&self, current: &BitemporalInterval, applicable_from: Instant) -> Result<UpdatePlan> {
        require_later(current, applicable_from)?;
        let expired = current.ending_applicable_at(applicable_from)?;
        let now = self.clock.now();
        let closed = current.closing_recorded_at(now)?;
        Ok(UpdatePlan {
            now,
            applicable_from,
            closed,
            expired,
        })
    }

    fn plan_delete<E: TemporalEntity>(
        &self,
        entity: &E,
        applicable_to: Instant,
    ) -> Result<(BitemporalInterval, BitemporalInterval)> {
        if self.policy.require_live_for_delete {
            require_live(entity)?;
        } else {
            require_open(entity)?;
        }
        let current = entity.interval();
        require_not_extended(current, applicable_to)?;
        let deleted = current.ending_applicable_at(applicable_to)?;
        let closed = current.closing_recorded_at(self.clock.now())?;
        Ok((closed, deleted))
    }
}

/// Fetches the live version from a [`HistoryStore`] instead of trusting the
/// caller to hold it.
pub struct HistoryManager<C, S> {
    manager: BitemporalManager<C>,
    store: S,
}

impl<C: fmt::Debug, S> fmt::Debug for HistoryManager<C, S> {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.debug_struct("HistoryManager")
            .field("manager", &self.manager)
            .finish_non_exhaustive()
    }
}

impl<C: Clock, S> HistoryManager<C, S> {
    pub fn new(clock: C, store: S) -> Self {
        Self::with_manager(BitemporalManager::new(clock), store)
    }
    pub fn with_manager(manager: BitemporalManager<C>, store: S) -> Self {
        Self { manager, store }
    }
    pub fn manager(&self) -> &BitemporalManager<C> {
        &self.manager
    }
    pub fn store(&self) -> &S {
        &self.store
    }

    /// The one live version among all versions of `business_key`.
    pub fn live_version<E>(&self, business_key: &E::Key) -> Result<E>
    where
        E: TemporalEntity,
        S: HistoryStore<E>,
    {
        let mut live = self
            .store
            .history(business_key)?
            .into_iter()
            .filter(|version| version.interval().is_live_version());
        let first = live.next().ok_or_else(|| {
            BitemporalError::NotFound(format!("no live version of {:?}", business_key))
        })?;
        let others = live.count();
        if others > 0 {
            warn!(key = ?business_key, live = others + 1, "history holds several live versions");
            return Err(BitemporalError::InvariantViolation(format!(
                "{} live versions of {:?}",
                others + 1,
                business_key
            )));
        }
        Ok(first)
    }

    /// Supersedes the stored live version with `updated`'s business fields,
    /// applicable from `applicable_from`.
    pub fn update<E>(
        &self,
        updated: E,
        applicable_from: Instant,
    ) -> TransitionResult<UpdateTransition<E>, E>
    where
        E: TemporalEntity,
        S: HistoryStore<E>,
    {
        let planned = self.live_version(updated.business_key()).and_then(|live| {
            let plan = self.manager.plan_update(live.interval(), applicable_from)?;
            Ok((live, plan))
        });
        match planned {
            Ok((live, plan)) => Ok(plan.apply(live, |_| updated)),
            Err(error) => Err(Rejected { error, entity: updated }),
        }
    }

    /// Deletes the stored live version of `business_key`.
    pub fn delete<E>(&self, business_key: &E::Key, applicable_to: Instant) -> Result<DeleteTransition<E>>
    where
        E: TemporalEntity,
        S: HistoryStore<E>,
    {
        let live = self.live_version(business_key)?;
        Ok(self.manager.delete(live, applicable_to)?)
    }
}
