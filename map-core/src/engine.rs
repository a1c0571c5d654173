//! Map session lifecycle and layer visibility.
//!
//! A [`MapEngine`] owns at most one live [`MapSession`]. Initialization is
//! split in two so the browser can await the CSV loads in between without
//! holding a borrow of the engine:
//!
//! 1. [`MapEngine::begin`] releases any previous session, builds the base map
//!    and one empty cluster group per category, and hands out an
//!    [`InitTicket`].
//! 2. [`MapEngine::complete`] (or [`MapEngine::fail`]) applies the load result,
//!    but only if the ticket is still the newest one. A later `begin` or an
//!    explicit [`MapEngine::teardown`] makes older tickets stale: the last
//!    request wins.

use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use log::{debug, info, warn};

use crate::config::MapConfig;
use crate::entity::{CategoryMap, EntityKind};
use crate::error::{IngestError, MapError};
use crate::registry::{EntityCatalog, EntityCounts};
use crate::render::MarkerSpec;

/// The drawing side of the map. Implemented over Leaflet in the browser and
/// by a recording fake in tests.
pub trait MapBackend {
    /// Whatever the map is mounted into (a DOM element in the browser).
    type Surface: ?Sized;
    type Map;
    type Group;

    /// Base map with its tile layer, centered on the configured view.
    fn create_map(&mut self, surface: &Self::Surface, config: &MapConfig)
    -> Result<Self::Map, MapError>;

    /// Empty, detached cluster group for `kind`.
    fn create_group(
        &mut self,
        map: &Self::Map,
        kind: EntityKind,
        config: &MapConfig,
    ) -> Result<Self::Group, MapError>;

    fn add_markers(&mut self, group: &Self::Group, markers: Vec<MarkerSpec>)
    -> Result<(), MapError>;

    fn attach(&mut self, map: &Self::Map, group: &Self::Group);

    fn detach(&mut self, map: &Self::Map, group: &Self::Group);

    /// Free the map and its groups, including every listener registered on them.
    fn release(&mut self, map: Self::Map, groups: Vec<Self::Group>);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionPhase {
    /// Map and groups exist, entities are still loading.
    Loading,
    /// Markers added, groups attached according to visibility.
    Ready,
}

/// Identifies one initialization attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct InitTicket(u64);

impl InitTicket {
    pub fn generation(self) -> u64 {
        self.0
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum InitOutcome {
    Ready(EntityCounts),
    /// A newer initialization (or a teardown) replaced this one; nothing was
    /// applied.
    Superseded,
}

struct Layer<G> {
    group: G,
    attached: bool,
    /// Requested visibility; applied once the session is ready.
    wanted: bool,
}

/// One live map with its three cluster groups.
pub struct MapSession<B: MapBackend> {
    generation: u64,
    map: B::Map,
    layers: CategoryMap<Layer<B::Group>>,
    phase: SessionPhase,
}

impl<B: MapBackend> MapSession<B> {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn phase(&self) -> SessionPhase {
        self.phase
    }

    pub fn map(&self) -> &B::Map {
        &self.map
    }

    pub fn group(&self, kind: EntityKind) -> &B::Group {
        &self.layers.get(kind).group
    }

    pub fn is_attached(&self, kind: EntityKind) -> bool {
        self.layers.get(kind).attached
    }
}

pub struct MapEngine<B: MapBackend> {
    backend: B,
    config: MapConfig,
    session: Option<MapSession<B>>,
    generation: u64,
}

impl<B: MapBackend> MapEngine<B> {
    pub fn new(backend: B, config: MapConfig) -> Self {
        MapEngine {
            backend,
            config,
            session: None,
            generation: 0,
        }
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    pub fn session(&self) -> Option<&MapSession<B>> {
        self.session.as_ref()
    }

    pub fn phase(&self) -> Option<SessionPhase> {
        self.session.as_ref().map(|s| s.phase)
    }

    pub fn is_ready(&self) -> bool {
        self.phase() == Some(SessionPhase::Ready)
    }

    pub fn is_attached(&self, kind: EntityKind) -> bool {
        self.session.as_ref().is_some_and(|s| s.is_attached(kind))
    }

    /// Requested visibility per category; everything is visible by default.
    pub fn visibility(&self) -> CategoryMap<bool> {
        match &self.session {
            Some(s) => CategoryMap::from_fn(|kind| s.layers.get(kind).wanted),
            None => CategoryMap::from_fn(|_| true),
        }
    }

    /// Release the current session (if any) and build a new, empty one.
    pub fn begin(&mut self, surface: &B::Surface) -> Result<InitTicket, MapError> {
        self.generation += 1;
        self.release_session();

        let map = self.backend.create_map(surface, &self.config)?;
        let backend = &mut self.backend;
        let config = &self.config;
        let created = CategoryMap::from_fn(|kind| backend.create_group(&map, kind, config));
        let groups = match created {
            CategoryMap {
                enterprise: Ok(enterprise),
                public_establishment: Ok(public_establishment),
                association: Ok(association),
            } => CategoryMap {
                enterprise,
                public_establishment,
                association,
            },
            partial => {
                let mut built = Vec::new();
                let mut first_err = None;
                for result in partial.into_values() {
                    match result {
                        Ok(group) => built.push(group),
                        Err(e) => {
                            first_err.get_or_insert(e);
                        }
                    }
                }
                self.backend.release(map, built);
                return Err(first_err
                    .unwrap_or_else(|| MapError::Backend("cluster group creation failed".into())));
            }
        };

        debug!("map session {} created", self.generation);
        self.session = Some(MapSession {
            generation: self.generation,
            map,
            layers: groups.map(|_, group| Layer {
                group,
                attached: false,
                wanted: true,
            }),
            phase: SessionPhase::Loading,
        });
        Ok(InitTicket(self.generation))
    }

    fn is_current(&self, ticket: InitTicket) -> bool {
        ticket.0 == self.generation
            && self
                .session
                .as_ref()
                .is_some_and(|s| s.generation == ticket.0 && s.phase == SessionPhase::Loading)
    }

    /// Fill the groups with markers and attach the visible ones.
    pub fn complete(
        &mut self,
        ticket: InitTicket,
        catalog: &EntityCatalog,
    ) -> Result<InitOutcome, MapError> {
        if !self.is_current(ticket) {
            debug!("map session {} superseded, dropping its entities", ticket.0);
            return Ok(InitOutcome::Superseded);
        }
        if let Err(e) = self.add_entities(catalog) {
            warn!("could not add markers: {e}");
            self.teardown();
            return Err(e);
        }
        let Some(session) = self.session.as_mut() else {
            return Ok(InitOutcome::Superseded);
        };

        for kind in EntityKind::ALL {
            let layer = session.layers.get_mut(kind);
            if layer.wanted {
                self.backend.attach(&session.map, &layer.group);
                layer.attached = true;
            }
        }
        session.phase = SessionPhase::Ready;

        let counts = catalog.counts();
        info!(
            "map session {} ready: {} enterprises, {} public establishments, {} associations",
            session.generation, counts.enterprises, counts.publics, counts.associations
        );
        Ok(InitOutcome::Ready(counts))
    }

    fn add_entities(&mut self, catalog: &EntityCatalog) -> Result<(), MapError> {
        let Some(session) = self.session.as_ref() else {
            return Ok(());
        };
        for kind in EntityKind::ALL {
            let markers = catalog
                .entities(kind)
                .iter()
                .map(MarkerSpec::for_entity)
                .collect();
            self.backend
                .add_markers(&session.layers.get(kind).group, markers)?;
        }
        Ok(())
    }

    /// Fail-fast: a failed load tears down the session it started. A stale
    /// ticket's failure is ignored.
    pub fn fail(&mut self, ticket: InitTicket, error: MapError) -> Result<InitOutcome, MapError> {
        if !self.is_current(ticket) {
            debug!("superseded map session {} failed: {error}", ticket.0);
            return Ok(InitOutcome::Superseded);
        }
        warn!("map initialization failed: {error}");
        self.teardown();
        Err(error)
    }

    /// Attach or detach a category's cluster group. Does nothing before a
    /// session exists; repeated calls with the same value have no effect.
    pub fn set_visibility(&mut self, kind: EntityKind, visible: bool) {
        let Some(session) = self.session.as_mut() else {
            return;
        };
        let layer = session.layers.get_mut(kind);
        layer.wanted = visible;
        if session.phase != SessionPhase::Ready {
            return;
        }
        match (visible, layer.attached) {
            (true, false) => {
                self.backend.attach(&session.map, &layer.group);
                layer.attached = true;
            }
            (false, true) => {
                self.backend.detach(&session.map, &layer.group);
                layer.attached = false;
            }
            _ => {}
        }
    }

    /// Release the live session and invalidate in-flight initializations.
    pub fn teardown(&mut self) {
        self.generation += 1;
        self.release_session();
    }

    fn release_session(&mut self) {
        if let Some(session) = self.session.take() {
            debug!("releasing map session {}", session.generation);
            let MapSession { map, layers, .. } = session;
            let groups = layers.into_values().into_iter().map(|l| l.group).collect();
            self.backend.release(map, groups);
        }
    }
}

/// Run a whole initialization: begin, await `load`, then complete or fail.
/// The engine is never borrowed across the await, so visibility changes and
/// newer initializations can interleave; the newest one wins.
pub async fn initialize<B, Fut>(
    engine: &RefCell<MapEngine<B>>,
    surface: &B::Surface,
    load: Fut,
) -> Result<InitOutcome, MapError>
where
    B: MapBackend,
    Fut: Future<Output = Result<Rc<EntityCatalog>, IngestError>>,
{
    let ticket = engine.borrow_mut().begin(surface)?;
    let loaded = load.await;
    let mut engine = engine.borrow_mut();
    match loaded {
        Ok(catalog) => engine.complete(ticket, &catalog),
        Err(e) => engine.fail(ticket, e.into()),
    }
}
