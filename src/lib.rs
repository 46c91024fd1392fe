//! Bitemporal – immutable version histories over two time axes.
//!
//! Every version of an entity carries a [`interval::BitemporalInterval`]:
//! * *applicable time*, when the fact holds in the modeled world, and
//! * *recorded time*, when the system asserted it.
//!
//! Among all versions sharing a business key at most one is *live*, i.e. open
//! on both axes. Changing an entity never edits history. Instead a transition
//! derives new records from the live version:
//! * an update yields `closed`, `expired` and a new live `updated` version,
//! * a delete yields `closed` and a `deleted` version with no successor.
//!
//! ## Modules
//! * [`interval`] – The dual interval value type and its pure transforms.
//! * [`entity`] – The [`entity::TemporalEntity`] capability plus the generic
//!   [`entity::Record`] that implements it.
//! * [`clock`] – Where "now" comes from; injectable for deterministic runs.
//! * [`manager`] – The transition engine, both for a live version the caller
//!   holds and for one looked up in a [`history::HistoryStore`].
//! * [`history`] – History lookup and an in-memory store that commits
//!   transitions atomically.
//! * [`settings`] – Layered configuration of the transition policy.
//!
//! ## Quick Start
//! ```
//! use chrono::{TimeZone, Utc};
//! use bitemporal::{clock::ManualClock, entity::{Record, TemporalEntity}, manager::BitemporalManager};
//! let day = |d| Utc.with_ymd_and_hms(2024, 1, d, 0, 0, 0).unwrap();
//! let user = Record::initial("user-1", String::from("Nick"), day(1));
//! let manager = BitemporalManager::new(ManualClock::new(day(5)));
//! let t = manager.update(user, day(11), |u| *u.data_mut() = String::from("James")).unwrap();
//! assert_eq!(t.closed.interval().recorded_to(), Some(day(5)));
//! assert_eq!(t.expired.interval().applicable_to(), Some(day(11)));
//! assert!(t.updated.interval().is_live_version());
//! ```
//!
//! ## Concurrency
//! Managers take `&self`, keep no state and never lock. Making a transition
//! stick is the job of whatever persists its records: it must write them
//! atomically and refuse the write if the live version changed in between.
//! [`history::MemoryHistory`] shows one way to do that.

pub mod clock;
pub mod entity;
pub mod error;
pub mod history;
pub mod interval;
pub mod manager;
pub mod settings;

pub use error::{BitemporalError, Result};
