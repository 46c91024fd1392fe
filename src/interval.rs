//! The dual time interval carried by every version of an entity.
//!
//! Applicable time is when a fact holds in the modeled world, recorded time
//! is when the system asserted it. Both ranges are half-open and may be
//! unbounded on the right. An interval is a plain value: the transforms below
//! return new intervals and never touch the receiver.

use std::fmt;

use chrono::{DateTime, Utc};

use crate::error::{BitemporalError, Result};

/// A point on either time axis.
pub type Instant = DateTime<Utc>;

#[derive(Eq, PartialEq, Hash, Clone, Copy, Debug)]
pub struct BitemporalInterval {
    applicable_from: Instant,
    applicable_to: Option<Instant>,
    recorded_from: Instant,
    recorded_to: Option<Instant>,
}

impl BitemporalInterval {
    /// Builds an interval from all four ends, rejecting any end that
    /// precedes its start.
    pub fn new(
        applicable_from: Instant,
        applicable_to: Option<Instant>,
        recorded_from: Instant,
        recorded_to: Option<Instant>,
    ) -> Result<Self> {
        if let Some(to) = applicable_to {
            check_order("applicable", applicable_from, to)?;
        }
        if let Some(to) = recorded_to {
            check_order("recorded", recorded_from, to)?;
        }
        Ok(Self {
            applicable_from,
            applicable_to,
            recorded_from,
            recorded_to,
        })
    }
    /// An interval open on both axes, i.e. the shape of a live version.
    pub fn latest(applicable_from: Instant, recorded_from: Instant) -> Self {
        Self {
            applicable_from,
            applicable_to: None,
            recorded_from,
            recorded_to: None,
        }
    }
    pub fn applicable_from(&self) -> Instant {
        self.applicable_from
    }
    pub fn applicable_to(&self) -> Option<Instant> {
        self.applicable_to
    }
    pub fn recorded_from(&self) -> Instant {
        self.recorded_from
    }
    pub fn recorded_to(&self) -> Option<Instant> {
        self.recorded_to
    }
    /// The system no longer asserts this version.
    pub fn is_closed(&self) -> bool {
        self.recorded_to.is_some()
    }
    pub fn is_live_version(&self) -> bool {
        self.applicable_to.is_none() && self.recorded_to.is_none()
    }
    /// Copy of this interval whose recorded time ends at `instant`.
    pub fn closing_recorded_at(&self, instant: Instant) -> Result<Self> {
        check_order("recorded", self.recorded_from, instant)?;
        Ok(Self {
            recorded_to: Some(instant),
            ..*self
        })
    }
    /// Copy of this interval whose applicable time ends at `instant`.
    pub fn ending_applicable_at(&self, instant: Instant) -> Result<Self> {
        check_order("applicable", self.applicable_from, instant)?;
        Ok(Self {
            applicable_to: Some(instant),
            ..*self
        })
    }
}

fn check_order(axis: &str, from: Instant, to: Instant) -> Result<()> {
    if to < from {
        return Err(BitemporalError::InvalidArgument(format!(
            "{axis} time would end at {to} before it starts at {from}"
        )));
    }
    Ok(())
}

struct End(Option<Instant>);

impl fmt::Display for End {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self.0 {
            Some(t) => write!(f, "{}", t),
            None => write!(f, "∞"),
        }
    }
}

impl fmt::Display for BitemporalInterval {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "applicable [{}, {}) recorded [{}, {})",
            self.applicable_from,
            End(self.applicable_to),
            self.recorded_from,
            End(self.recorded_to)
        )
    }
}
