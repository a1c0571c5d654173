mod common;

use std::cell::RefCell;
use std::rc::Rc;

use futures::channel::oneshot;
use futures::executor::{LocalPool, block_on};
use futures::task::LocalSpawnExt;

use common::{Event, MemoryFetcher, Recorder};
use map_core::engine::{SessionPhase, initialize};
use map_core::{
    EntityCatalog, EntityCounts, EntityKind, IngestError, InitOutcome, MapConfig, MapEngine,
    MapError, load_catalog,
};

// Ids handed out by the first `begin` on a fresh recorder.
const MAP: u32 = 1;
const ENTERPRISES: u32 = 2;
const PUBLICS: u32 = 3;
const ASSOCIATIONS: u32 = 4;

fn engine() -> MapEngine<Recorder> {
    MapEngine::new(Recorder::default(), MapConfig::default())
}

fn catalog() -> EntityCatalog {
    block_on(load_catalog(&MemoryFetcher::with_defaults(), &MapConfig::default())).unwrap()
}

fn ready_engine() -> MapEngine<Recorder> {
    let mut engine = engine();
    let ticket = engine.begin("map").unwrap();
    engine.complete(ticket, &catalog()).unwrap();
    engine
}

const COUNTS: EntityCounts = EntityCounts {
    enterprises: 2,
    publics: 2,
    associations: 2,
};

#[test]
fn first_initialization_shows_every_category() {
    let mut engine = engine();
    let ticket = engine.begin("map").unwrap();
    assert_eq!(engine.phase(), Some(SessionPhase::Loading));
    assert!(!engine.is_attached(EntityKind::Enterprise));

    let outcome = engine.complete(ticket, &catalog()).unwrap();
    assert_eq!(outcome, InitOutcome::Ready(COUNTS));
    assert!(engine.is_ready());
    assert_eq!(
        engine.backend().events,
        vec![
            Event::CreateMap(MAP),
            Event::CreateGroup(ENTERPRISES, EntityKind::Enterprise),
            Event::CreateGroup(PUBLICS, EntityKind::PublicEstablishment),
            Event::CreateGroup(ASSOCIATIONS, EntityKind::Association),
            Event::AddMarkers(ENTERPRISES, 2),
            Event::AddMarkers(PUBLICS, 2),
            Event::AddMarkers(ASSOCIATIONS, 2),
            Event::Attach(ENTERPRISES),
            Event::Attach(PUBLICS),
            Event::Attach(ASSOCIATIONS),
        ]
    );
    for kind in EntityKind::ALL {
        assert!(engine.is_attached(kind));
    }
}

#[test]
fn visibility_without_a_map_is_ignored() {
    let mut engine = engine();
    engine.set_visibility(EntityKind::Association, false);
    assert!(engine.backend().events.is_empty());
    assert!(engine.session().is_none());
    assert!(engine.visibility().association);
}

#[test]
fn visibility_changes_are_idempotent() {
    let mut engine = ready_engine();

    engine.set_visibility(EntityKind::Enterprise, true);
    engine.set_visibility(EntityKind::Enterprise, true);
    assert_eq!(engine.backend().attach_calls(ENTERPRISES), 1);

    engine.set_visibility(EntityKind::Enterprise, false);
    engine.set_visibility(EntityKind::Enterprise, false);
    assert_eq!(engine.backend().detach_calls(ENTERPRISES), 1);
    assert!(!engine.is_attached(EntityKind::Enterprise));
    assert!(engine.is_attached(EntityKind::PublicEstablishment));

    engine.set_visibility(EntityKind::Enterprise, true);
    assert_eq!(engine.backend().attach_calls(ENTERPRISES), 2);
    assert!(engine.is_attached(EntityKind::Enterprise));
}

#[test]
fn visible_total_follows_the_filters() {
    let mut engine = ready_engine();
    assert_eq!(COUNTS.visible_total(&engine.visibility()), 6);
    engine.set_visibility(EntityKind::Association, false);
    assert_eq!(COUNTS.visible_total(&engine.visibility()), 4);
}

#[test]
fn reinitialization_releases_the_previous_map_first() {
    let mut engine = ready_engine();
    engine.set_visibility(EntityKind::PublicEstablishment, false);

    let ticket = engine.begin("map").unwrap();
    let events = &engine.backend().events;
    let released = events
        .iter()
        .position(|e| *e == Event::Release(MAP, 3))
        .unwrap();
    let created = events
        .iter()
        .position(|e| matches!(e, Event::CreateMap(id) if *id != MAP))
        .unwrap();
    assert!(released < created);
    assert_eq!(engine.backend().live_maps.len(), 1);

    // A fresh session starts with everything visible again.
    engine.complete(ticket, &catalog()).unwrap();
    for kind in EntityKind::ALL {
        assert!(engine.is_attached(kind));
    }
}

#[test]
fn stale_completion_is_dropped() {
    let mut engine = engine();
    let first = engine.begin("map").unwrap();
    let second = engine.begin("map").unwrap();
    assert!(second.generation() > first.generation());

    let outcome = engine.complete(first, &catalog()).unwrap();
    assert_eq!(outcome, InitOutcome::Superseded);
    assert_eq!(engine.backend().count(|e| matches!(e, Event::AddMarkers(..))), 0);
    assert_eq!(engine.phase(), Some(SessionPhase::Loading));

    assert_eq!(
        engine.complete(second, &catalog()).unwrap(),
        InitOutcome::Ready(COUNTS)
    );
}

#[test]
fn failed_load_tears_the_session_down() {
    let mut engine = engine();
    let ticket = engine.begin("map").unwrap();
    let error = MapError::Ingest(IngestError::Fetch {
        path: "data/association.csv".into(),
        reason: "HTTP 404".into(),
    });

    let result = engine.fail(ticket, error.clone());
    assert_eq!(result, Err(error));
    assert!(engine.session().is_none());
    assert!(engine.backend().live_maps.is_empty());
    assert!(engine.backend().events.contains(&Event::Release(MAP, 3)));
}

#[test]
fn stale_failure_is_ignored() {
    let mut engine = engine();
    let first = engine.begin("map").unwrap();
    let _second = engine.begin("map").unwrap();

    let result = engine.fail(first, MapError::Backend("late".into()));
    assert_eq!(result, Ok(InitOutcome::Superseded));
    assert_eq!(engine.phase(), Some(SessionPhase::Loading));
    assert_eq!(engine.backend().live_maps.len(), 1);
}

#[test]
fn visibility_requested_while_loading_applies_on_ready() {
    let mut engine = engine();
    let ticket = engine.begin("map").unwrap();
    engine.set_visibility(EntityKind::Association, false);
    assert!(!engine.visibility().association);
    assert_eq!(engine.backend().count(|e| matches!(e, Event::Attach(_) | Event::Detach(_))), 0);

    engine.complete(ticket, &catalog()).unwrap();
    assert_eq!(engine.backend().attach_calls(ASSOCIATIONS), 0);
    assert_eq!(engine.backend().detach_calls(ASSOCIATIONS), 0);
    assert!(!engine.is_attached(EntityKind::Association));
    assert!(engine.is_attached(EntityKind::Enterprise));
}

#[test]
fn group_creation_failure_releases_the_partial_map() {
    let mut backend = Recorder::default();
    backend.fail_group = Some(EntityKind::Association);
    let mut engine = MapEngine::new(backend, MapConfig::default());

    let err = engine.begin("map").unwrap_err();
    assert!(matches!(err, MapError::Backend(_)));
    assert!(engine.session().is_none());
    assert!(engine.backend().live_maps.is_empty());
    assert!(engine.backend().events.contains(&Event::Release(MAP, 2)));
}

#[test]
fn marker_failure_tears_down() {
    let mut backend = Recorder::default();
    backend.fail_markers = true;
    let mut engine = MapEngine::new(backend, MapConfig::default());

    let ticket = engine.begin("map").unwrap();
    assert!(engine.complete(ticket, &catalog()).is_err());
    assert!(engine.session().is_none());
    assert!(engine.backend().live_maps.is_empty());
}

#[test]
fn teardown_invalidates_in_flight_loads() {
    let mut engine = engine();
    let ticket = engine.begin("map").unwrap();
    engine.teardown();
    assert!(engine.session().is_none());
    assert_eq!(
        engine.complete(ticket, &catalog()).unwrap(),
        InitOutcome::Superseded
    );
}

#[test]
fn initialize_runs_the_whole_sequence() {
    let engine = RefCell::new(engine());
    let fetcher = MemoryFetcher::with_defaults();
    let config = MapConfig::default();
    let load = async { load_catalog(&fetcher, &config).await.map(Rc::new) };

    let outcome = block_on(initialize(&engine, "map", load)).unwrap();
    assert_eq!(outcome, InitOutcome::Ready(COUNTS));
    assert!(engine.borrow().is_ready());
}

#[test]
fn initialize_reports_a_missing_source() {
    let engine = RefCell::new(engine());
    let config = MapConfig::default();
    let fetcher = MemoryFetcher::with_defaults().without(&config.sources.enterprise);
    let load = async { load_catalog(&fetcher, &config).await.map(Rc::new) };

    let err = block_on(initialize(&engine, "map", load)).unwrap_err();
    assert!(matches!(err, MapError::Ingest(IngestError::Fetch { .. })));
    assert!(engine.borrow().session().is_none());
}

type Delivery = Result<Rc<EntityCatalog>, IngestError>;

#[test]
fn overlapping_initializations_keep_the_newest() {
    let engine = Rc::new(RefCell::new(engine()));
    let outcomes: Rc<RefCell<Vec<(u8, Result<InitOutcome, MapError>)>>> = Rc::default();
    let mut pool = LocalPool::new();
    let spawner = pool.spawner();

    let mut senders = Vec::new();
    for call in [1u8, 2] {
        let (tx, rx) = oneshot::channel::<Delivery>();
        senders.push(tx);
        let engine = engine.clone();
        let outcomes = outcomes.clone();
        spawner
            .spawn_local(async move {
                let load = async move {
                    rx.await.unwrap_or_else(|_| {
                        Err(IngestError::Fetch {
                            path: "cancelled".into(),
                            reason: "sender dropped".into(),
                        })
                    })
                };
                let result = initialize(&engine, "map", load).await;
                outcomes.borrow_mut().push((call, result));
            })
            .unwrap();
    }
    pool.run_until_stalled();
    assert_eq!(engine.borrow().backend().live_maps.len(), 1);

    let shared = Rc::new(catalog());
    let mut senders = senders.into_iter();
    let first = senders.next().unwrap();
    let second = senders.next().unwrap();

    // The newer call resolves first, then the older one arrives late.
    second.send(Ok(shared.clone())).unwrap();
    pool.run_until_stalled();
    first.send(Ok(shared)).unwrap();
    pool.run_until_stalled();

    let outcomes = outcomes.borrow();
    assert_eq!(
        *outcomes,
        vec![
            (2, Ok(InitOutcome::Ready(COUNTS))),
            (1, Ok(InitOutcome::Superseded)),
        ]
    );
    let engine = engine.borrow();
    assert!(engine.is_ready());
    assert_eq!(engine.backend().count(|e| matches!(e, Event::AddMarkers(..))), 3);
}
