use std::cell::RefCell;
use std::future::Future;
use std::rc::Rc;

use futures::future::{FutureExt, LocalBoxFuture, Shared, TryFutureExt};
use serde::{Deserialize, Serialize};

use crate::entity::{CategoryMap, EntityKind, EntityRecord};
use crate::error::IngestError;

/// Ingested entities of one page session, per category.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EntityCatalog {
    entities: CategoryMap<Vec<EntityRecord>>,
}

impl EntityCatalog {
    pub fn new(entities: CategoryMap<Vec<EntityRecord>>) -> Self {
        EntityCatalog { entities }
    }

    pub fn entities(&self, kind: EntityKind) -> &[EntityRecord] {
        self.entities.get(kind)
    }

    pub fn counts(&self) -> EntityCounts {
        count_entities(&self.entities)
    }

    pub fn total(&self) -> usize {
        self.entities.iter().map(|(_, v)| v.len()).sum()
    }
}

/// Entity count per category, in the shape the filter panel reads.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityCounts {
    pub enterprises: usize,
    pub publics: usize,
    pub associations: usize,
}

impl EntityCounts {
    pub fn get(&self, kind: EntityKind) -> usize {
        match kind {
            EntityKind::Enterprise => self.enterprises,
            EntityKind::PublicEstablishment => self.publics,
            EntityKind::Association => self.associations,
        }
    }

    pub fn total(&self) -> usize {
        self.enterprises + self.publics + self.associations
    }

    /// Sum over the categories whose filter is switched on.
    pub fn visible_total(&self, visibility: &CategoryMap<bool>) -> usize {
        visibility
            .iter()
            .filter(|(_, on)| **on)
            .map(|(kind, _)| self.get(kind))
            .sum()
    }
}

pub fn count_entities(lists: &CategoryMap<Vec<EntityRecord>>) -> EntityCounts {
    EntityCounts {
        enterprises: lists.enterprise.len(),
        publics: lists.public_establishment.len(),
        associations: lists.association.len(),
    }
}

type PendingCatalog = Shared<LocalBoxFuture<'static, Result<Rc<EntityCatalog>, IngestError>>>;

/// One catalog load per page session, shared by the counter and the map.
/// Callers that arrive while the load is running await the same load. Failed
/// loads are not remembered.
#[derive(Default)]
pub struct CatalogCache {
    slot: RefCell<Option<PendingCatalog>>,
}

impl CatalogCache {
    pub fn new() -> Self {
        CatalogCache::default()
    }

    /// The catalog, once a load has finished successfully.
    pub fn get(&self) -> Option<Rc<EntityCatalog>> {
        self.slot
            .borrow()
            .as_ref()
            .and_then(|pending| pending.peek())
            .and_then(|result| result.as_ref().ok().cloned())
    }

    pub fn clear(&self) {
        self.slot.replace(None);
    }

    /// Cached or in-flight catalog; otherwise start `load` and share it.
    pub async fn get_or_load<Fut>(
        &self,
        load: impl FnOnce() -> Fut,
    ) -> Result<Rc<EntityCatalog>, IngestError>
    where
        Fut: Future<Output = Result<EntityCatalog, IngestError>> + 'static,
    {
        let pending = {
            let mut slot = self.slot.borrow_mut();
            match slot.as_ref() {
                Some(pending) => pending.clone(),
                None => {
                    let pending = load().map_ok(Rc::new).boxed_local().shared();
                    *slot = Some(pending.clone());
                    pending
                }
            }
        };
        let result = pending.clone().await;
        if result.is_err() {
            let mut slot = self.slot.borrow_mut();
            if slot.as_ref().is_some_and(|current| current.ptr_eq(&pending)) {
                *slot = None;
            }
        }
        result
    }
}

#[cfg(test)]
mod tests {
    use std::cell::Cell;
    use std::pin::Pin;
    use std::task::{Context, Poll};

    use futures::executor::block_on;
    use futures::join;
    use geo_types::Point;

    use super::*;
    use crate::entity::EntityAttributes;

    fn record(kind: EntityKind, id: &str) -> EntityRecord {
        EntityRecord {
            id: id.to_string(),
            name: id.to_string(),
            address: "Le Gosier".to_string(),
            kind,
            position: Point::new(-61.48, 16.2),
            attributes: EntityAttributes::default(),
        }
    }

    fn catalog() -> EntityCatalog {
        EntityCatalog::new(CategoryMap::from_fn(|kind| match kind {
            EntityKind::Enterprise => vec![record(kind, "a"), record(kind, "b")],
            EntityKind::PublicEstablishment => vec![record(kind, "c")],
            EntityKind::Association => Vec::new(),
        }))
    }

    #[test]
    fn counts_per_category() {
        let counts = catalog().counts();
        assert_eq!(
            counts,
            EntityCounts {
                enterprises: 2,
                publics: 1,
                associations: 0
            }
        );
        assert_eq!(counts.total(), 3);
        assert_eq!(catalog().total(), 3);
    }

    #[test]
    fn visible_total_follows_filters() {
        let counts = catalog().counts();
        let mut filters = CategoryMap::from_fn(|_| true);
        assert_eq!(counts.visible_total(&filters), 3);
        filters.enterprise = false;
        assert_eq!(counts.visible_total(&filters), 1);
    }

    #[test]
    fn counts_serialize_for_the_filter_panel() {
        let json = serde_json::to_string(&catalog().counts()).unwrap();
        assert_eq!(json, r#"{"enterprises":2,"publics":1,"associations":0}"#);
    }

    #[test]
    fn cache_loads_once() {
        let cache = CatalogCache::new();
        let calls = Cell::new(0);
        let load = || {
            calls.set(calls.get() + 1);
            async { Ok(catalog()) }
        };
        let first = block_on(cache.get_or_load(load)).unwrap();
        let second = block_on(cache.get_or_load(load)).unwrap();
        assert_eq!(calls.get(), 1);
        assert!(Rc::ptr_eq(&first, &second));
        assert_eq!(first.counts(), second.counts());
    }

    /// Completes on the second poll, letting other tasks run in between.
    struct YieldOnce(bool);

    impl Future for YieldOnce {
        type Output = ();

        fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<()> {
            if self.0 {
                return Poll::Ready(());
            }
            self.0 = true;
            cx.waker().wake_by_ref();
            Poll::Pending
        }
    }

    #[test]
    fn overlapping_callers_share_one_load() {
        let cache = CatalogCache::new();
        let calls = Cell::new(0);
        let load = || {
            calls.set(calls.get() + 1);
            async {
                YieldOnce(false).await;
                Ok(catalog())
            }
        };
        let (a, b) = block_on(async { join!(cache.get_or_load(load), cache.get_or_load(load)) });
        assert_eq!(calls.get(), 1);
        assert!(Rc::ptr_eq(&a.unwrap(), &b.unwrap()));
        assert!(cache.get().is_some());
    }

    #[test]
    fn overlapping_failure_is_shared_then_forgotten() {
        let cache = CatalogCache::new();
        let calls = Cell::new(0);
        let load = || {
            calls.set(calls.get() + 1);
            async {
                YieldOnce(false).await;
                Err(IngestError::Fetch {
                    path: "data/association.csv".into(),
                    reason: "HTTP 500".into(),
                })
            }
        };
        let (a, b) = block_on(async { join!(cache.get_or_load(load), cache.get_or_load(load)) });
        assert_eq!(calls.get(), 1);
        assert_eq!(a, b);
        assert!(a.is_err());
        assert!(cache.get().is_none());

        let retried = block_on(cache.get_or_load(|| async { Ok(catalog()) }));
        assert!(retried.is_ok());
        assert!(cache.get().is_some());
    }

    #[test]
    fn cache_does_not_keep_failures() {
        let cache = CatalogCache::new();
        let failed = block_on(cache.get_or_load(|| async {
            Err(IngestError::Fetch {
                path: "data/association.csv".into(),
                reason: "404".into(),
            })
        }));
        assert!(failed.is_err());
        assert!(cache.get().is_none());
        let ok = block_on(cache.get_or_load(|| async { Ok(catalog()) }));
        assert!(ok.is_ok());
        assert!(cache.get().is_some());
    }
}
