mod common;

use bitemporal::BitemporalError;
use bitemporal::clock::ManualClock;
use bitemporal::entity::{Record, TemporalEntity};
use bitemporal::interval::BitemporalInterval;
use bitemporal::manager::BitemporalManager;
use common::{day, day_hour, init_logging};

type User = Record<&'static str, String>;

fn nick() -> User {
    Record::initial("K", "Nick".to_string(), day(1))
}

#[test]
fn update_derives_closed_expired_and_updated() {
    init_logging();
    let manager = BitemporalManager::new(ManualClock::new(day(5)));
    let t = manager
        .update(nick(), day(11), |u| *u.data_mut() = "James".to_string())
        .expect("update ok");

    assert_eq!(
        *t.closed.interval(),
        BitemporalInterval::new(day(1), None, day(1), Some(day(5))).unwrap()
    );
    assert_eq!(
        *t.expired.interval(),
        BitemporalInterval::new(day(1), Some(day(11)), day(1), None).unwrap()
    );
    assert_eq!(*t.updated.interval(), BitemporalInterval::latest(day(11), day(5)));

    assert_eq!(t.closed.data(), "Nick");
    assert_eq!(t.expired.data(), "Nick");
    assert_eq!(t.updated.data(), "James");
}

#[test]
fn update_preserves_business_key() {
    let manager = BitemporalManager::new(ManualClock::new(day(5)));
    let t = manager.update(nick(), day(11), |_| {}).expect("update ok");
    assert_eq!(*t.closed.business_key(), "K");
    assert_eq!(*t.expired.business_key(), "K");
    assert_eq!(*t.updated.business_key(), "K");
}

#[test]
fn derived_records_get_their_own_versions() {
    let manager = BitemporalManager::new(ManualClock::new(day(5)));
    let original = nick();
    let version = original.version();
    let t = manager.update(original, day(11), |_| {}).expect("update ok");
    // the caller's entity becomes the new live version, snapshots are new rows
    assert_eq!(t.updated.version(), version);
    assert_ne!(t.closed.version(), version);
    assert_ne!(t.expired.version(), version);
    assert_ne!(t.closed.version(), t.expired.version());
}

#[test]
fn update_reads_the_clock_once() {
    let manager = BitemporalManager::new(ManualClock::new(day_hour(5, 7)));
    let t = manager.update(nick(), day(11), |_| {}).expect("update ok");
    assert_eq!(t.closed.interval().recorded_to(), Some(t.updated.interval().recorded_from()));
    assert_eq!(t.updated.interval().recorded_from(), day_hour(5, 7));
}

#[test]
fn mutate_cannot_move_the_interval() {
    let manager = BitemporalManager::new(ManualClock::new(day(5)));
    let t = manager
        .update(nick(), day(11), |u| {
            u.set_interval(BitemporalInterval::latest(day(30), day(30)))
        })
        .expect("update ok");
    assert_eq!(*t.updated.interval(), BitemporalInterval::latest(day(11), day(5)));
}

#[test]
fn backdated_update_is_rejected_and_entity_returned_unchanged() {
    let manager = BitemporalManager::new(ManualClock::new(day(5)));
    let original = nick();
    let version = original.version();
    let rejected = manager
        .update(original, day_hour(1, -24 * 31), |u| *u.data_mut() = "James".to_string())
        .expect_err("must reject");
    assert!(matches!(rejected.error, BitemporalError::InvalidArgument(_)));
    let entity = rejected.entity;
    assert_eq!(entity.version(), version);
    assert_eq!(entity.data(), "Nick");
    assert_eq!(*entity.interval(), BitemporalInterval::latest(day(1), day(1)));
}

#[test]
fn same_applicable_time_is_rejected() {
    let manager = BitemporalManager::new(ManualClock::new(day(5)));
    let rejected = manager.update(nick(), day(1), |_| {}).expect_err("must reject");
    assert!(matches!(rejected.error, BitemporalError::InvalidArgument(_)));
}

#[test]
fn non_live_versions_cannot_be_updated() {
    let manager = BitemporalManager::new(ManualClock::new(day(5)));
    let t = manager.update(nick(), day(11), |_| {}).expect("update ok");
    for stale in [t.closed, t.expired] {
        let before = *stale.interval();
        let rejected = manager.update(stale, day(20), |_| {}).expect_err("must reject");
        assert!(matches!(rejected.error, BitemporalError::InvalidState(_)));
        assert_eq!(*rejected.entity.interval(), before);
    }
}

#[test]
fn clock_before_recorded_start_is_rejected() {
    // a clock that reads earlier than the live version was recorded
    let manager = BitemporalManager::new(ManualClock::new(day_hour(1, -1)));
    let rejected = manager.update(nick(), day(11), |_| {}).expect_err("must reject");
    assert!(matches!(rejected.error, BitemporalError::InvalidArgument(_)));
    assert!(rejected.entity.interval().is_live_version());
}

#[test]
fn rejection_converts_into_the_plain_error() {
    fn attempt(manager: &BitemporalManager<ManualClock>) -> bitemporal::Result<()> {
        manager.update(nick(), day(1), |_| {})?;
        Ok(())
    }
    let manager = BitemporalManager::new(ManualClock::new(day(5)));
    assert!(matches!(attempt(&manager), Err(BitemporalError::InvalidArgument(_))));
}

#[test]
fn chained_updates_keep_advancing() {
    let clock = ManualClock::new(day(5));
    let manager = BitemporalManager::new(&clock);
    let first = manager.update(nick(), day(11), |u| *u.data_mut() = "James".to_string()).expect("first");
    clock.set(day(12));
    let second = manager
        .update(first.updated, day(20), |u| *u.data_mut() = "Jim".to_string())
        .expect("second");
    assert_eq!(
        *second.closed.interval(),
        BitemporalInterval::new(day(11), None, day(5), Some(day(12))).unwrap()
    );
    assert_eq!(
        *second.expired.interval(),
        BitemporalInterval::new(day(11), Some(day(20)), day(5), None).unwrap()
    );
    assert_eq!(*second.updated.interval(), BitemporalInterval::latest(day(20), day(12)));
    assert_eq!(second.expired.data(), "James");
    assert_eq!(second.updated.data(), "Jim");
}
