//! GraphRebinder - 永続化されたグラフ全体の rebind
//!
//! # 2 パス構成
//! 1. **instantiate**: バッチ内の全 Memento について空のライブオブジェクトを作り、
//!    アリーナに登録する
//! 2. **restore**: 設定 → 関係（＋初期化フック）→ feed の順に復元し、
//!    成功したオブジェクトを managed にする
//!
//! pass 2 はバッチ内の全オブジェクトが揃ってから始まるので、親子の
//! 前方参照・循環参照はそのまま解決できます。
//!
//! # 失敗時の扱い（`FailureMode`）
//! - FailFast: 最初の致命的エラーで残りを中断。復元済みのオブジェクトは残る
//! - FailAtEnd: 全部試してから `BatchFailed` を返す
//! - Continue: 失敗をレポートに記録して成功扱い

use std::sync::Arc;

use tracing::{Span, debug, error, info, instrument, trace};

use crate::config::StoreServices;
use crate::domain::{Memento, ObjectKind, RebindError};
use crate::ports::{Clock, IdGenerator, TypeCatalog};
use crate::settings::FailureMode;

use super::arena::ObjectArena;
use super::context::BatchContext;
use super::live::LiveObject;
use super::registry::SupportRegistry;
use super::report::{ConfigRestoreStats, MissingReference, ObjectFailure, RebindReport};
use super::support::RebindSupport;

pub struct GraphRebinder {
    catalog: Arc<dyn TypeCatalog>,
    supports: SupportRegistry,
    services: StoreServices,
    ids: Arc<dyn IdGenerator>,
    clock: Arc<dyn Clock>,
    failure_mode: FailureMode,
}

/// What pass 2 produced for one object.
struct Restored {
    config: ConfigRestoreStats,
    missing: Vec<MissingReference>,
    feeds: usize,
}

impl GraphRebinder {
    pub fn new(
        catalog: Arc<dyn TypeCatalog>,
        supports: SupportRegistry,
        services: StoreServices,
        ids: Arc<dyn IdGenerator>,
        clock: Arc<dyn Clock>,
        failure_mode: FailureMode,
    ) -> Self {
        Self {
            catalog,
            supports,
            services,
            ids,
            clock,
            failure_mode,
        }
    }

    pub fn failure_mode(&self) -> FailureMode {
        self.failure_mode
    }

    pub fn supports(&self) -> &SupportRegistry {
        &self.supports
    }

    pub fn services(&self) -> &StoreServices {
        &self.services
    }

    /// Rebinds one batch of mementos into `arena`.
    ///
    /// Objects from earlier batches already in the arena resolve as parents
    /// and children; ids with no live object are reported as missing.
    #[instrument(
        skip_all,
        fields(rebind = tracing::field::Empty, mementos = batch.len(), mode = ?self.failure_mode)
    )]
    pub fn rebind(
        &self,
        arena: &mut ObjectArena,
        batch: Vec<Memento>,
    ) -> Result<RebindReport, RebindError> {
        let rebind_id = self.ids.generate_rebind_id();
        Span::current().record("rebind", tracing::field::display(rebind_id));
        let mut report = RebindReport::new(rebind_id, self.failure_mode, self.clock.now());

        // pass 1: instantiate
        let mut staged: Vec<(Memento, Arc<LiveObject>)> = Vec::with_capacity(batch.len());
        for memento in batch {
            trace!(memento = %memento.to_verbose_string(), "Instantiating");
            let result = self
                .instantiate(&memento)
                .and_then(|object| arena.insert(object.clone()).map(|()| object));
            match result {
                Ok(object) => {
                    report.instantiated.push(memento.id().clone());
                    staged.push((memento, object));
                }
                Err(e) => self.record_failure(&mut report, &memento, e)?,
            }
        }

        // pass 2: config, relationships, feeds
        let context = BatchContext::new(rebind_id, arena);
        for (memento, object) in &staged {
            match self.restore(memento, object, &context) {
                Ok(restored) => {
                    report.config.absorb(restored.config);
                    report.missing_references.extend(restored.missing);
                    report.feeds_restored += restored.feeds;
                    object.mark_managed();
                    report.managed.push(object.id().clone());
                }
                Err(e) => self.record_failure(&mut report, memento, e)?,
            }
        }

        report.finished_at = self.clock.now();
        let counts = report.counts();
        info!(
            instantiated = counts.instantiated,
            managed = counts.managed,
            missing = counts.missing_references,
            failed = counts.failed,
            "Rebind finished"
        );

        if self.failure_mode == FailureMode::FailAtEnd {
            if let Some(first) = report.failures.first() {
                return Err(RebindError::BatchFailed {
                    count: report.failures.len(),
                    first: format!("{}({}): {}", first.id, first.type_name, first.error),
                });
            }
        }
        Ok(report)
    }

    /// Mementos for every object in `arena`, in arena order.
    pub fn checkpoint(&self, arena: &ObjectArena) -> Result<Vec<Memento>, RebindError> {
        arena
            .iter()
            .map(|object| {
                self.support_for(object.kind())?
                    .memento(object)
                    .map_err(|e| RebindError::object_failed(object.id(), object.type_name(), e))
            })
            .collect()
    }

    fn instantiate(&self, memento: &Memento) -> Result<Arc<LiveObject>, RebindError> {
        let object_type =
            self.catalog
                .resolve(memento.type_name())
                .ok_or_else(|| RebindError::UnknownType {
                    id: memento.id().clone(),
                    type_name: memento.type_name().to_string(),
                })?;
        if object_type.kind() != memento.kind() {
            return Err(RebindError::KindMismatch {
                id: memento.id().clone(),
                type_name: memento.type_name().to_string(),
                declared: object_type.kind(),
                persisted: memento.kind(),
            });
        }
        self.support_for(object_type.kind())?;

        let object = LiveObject::new(memento.id().clone(), object_type, self.services.clone());
        object.set_display_name(memento.display_name().map(str::to_string));
        object.set_catalog_item_id(memento.catalog_item_id().map(str::to_string));
        object.set_tags(memento.tags().to_vec());
        Ok(object)
    }

    fn restore(
        &self,
        memento: &Memento,
        object: &Arc<LiveObject>,
        context: &BatchContext<'_>,
    ) -> Result<Restored, RebindError> {
        let support = self.support_for(object.kind())?;
        let config = support.restore_config(memento, object.object_type().config_keys(), object)?;
        let missing = support.restore_relationships(memento, context, object);
        let feeds = if support.supports_feeds() {
            support.restore_feeds(memento, object)?
        } else {
            0
        };
        debug!(id = %object.id(), type_name = object.type_name(), "Restored");
        Ok(Restored {
            config,
            missing,
            feeds,
        })
    }

    fn support_for(&self, kind: ObjectKind) -> Result<Arc<dyn RebindSupport>, RebindError> {
        self.supports.get(kind).ok_or(RebindError::NoSupport(kind))
    }

    /// Records a per-object failure. Under fail-fast the batch stops here.
    fn record_failure(
        &self,
        report: &mut RebindReport,
        memento: &Memento,
        cause: RebindError,
    ) -> Result<(), RebindError> {
        error!(
            id = %memento.id(),
            type_name = memento.type_name(),
            error = %cause,
            "Rebind of object failed"
        );
        if self.failure_mode == FailureMode::FailFast {
            return Err(RebindError::object_failed(memento.id(), memento.type_name(), cause));
        }
        report.failures.push(ObjectFailure {
            id: memento.id().clone(),
            type_name: memento.type_name().to_string(),
            error: cause.to_string(),
        });
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::ObjectId;
    use crate::impls::builtin;
    use crate::rebind::Relation;
    use crate::testing::{init_tracing, rebinder};
    use serde_json::json;

    fn ssh(id: &str) -> crate::domain::MementoBuilder {
        Memento::builder(id, builtin::SSH_LOCATION, ObjectKind::Location)
    }

    fn scenario() -> Vec<Memento> {
        vec![
            ssh("loc-1")
                .config("user", json!("alice"))
                .config("customFlag", json!("v1"))
                .parent("loc-0")
                .child("loc-2")
                .child("loc-3")
                .build()
                .unwrap(),
            ssh("loc-0").child("loc-1").build().unwrap(),
            ssh("loc-2").parent("loc-1").build().unwrap(),
        ]
    }

    fn id(s: &str) -> ObjectId {
        ObjectId::new(s)
    }

    #[tokio::test]
    async fn rebinds_the_ssh_location_scenario() {
        init_tracing();
        let mut arena = ObjectArena::new();
        let report = rebinder(FailureMode::FailAtEnd)
            .rebind(&mut arena, scenario())
            .unwrap();

        let loc1 = arena.get(&id("loc-1")).unwrap();
        assert_eq!(
            loc1.config().get(&builtin::USER).await.unwrap(),
            Some("alice".to_string())
        );
        assert_eq!(
            loc1.config().get_by_name::<String>("customFlag").await.unwrap(),
            Some("v1".to_string())
        );
        assert!(Arc::ptr_eq(&loc1.parent().unwrap(), arena.get(&id("loc-0")).unwrap()));
        let children = loc1.children();
        assert_eq!(children.len(), 1);
        assert!(Arc::ptr_eq(&children[0], arena.get(&id("loc-2")).unwrap()));

        assert_eq!(report.managed.len(), 3);
        assert!(report.failures.is_empty());
        assert_eq!(
            report.missing_references,
            vec![MissingReference {
                from: id("loc-1"),
                relation: Relation::Child,
                target: id("loc-3"),
            }]
        );
        assert!(arena.iter().all(|o| o.is_managed() && o.is_initialized()));
    }

    #[tokio::test]
    async fn parent_loops_are_cut_and_inherited_reads_finish() {
        init_tracing();
        let mut arena = ObjectArena::new();
        let batch = vec![
            ssh("loc-a").parent("loc-b").build().unwrap(),
            ssh("loc-b")
                .config("user", json!("root"))
                .parent("loc-a")
                .build()
                .unwrap(),
        ];
        let report = rebinder(FailureMode::FailAtEnd)
            .rebind(&mut arena, batch)
            .unwrap();

        assert_eq!(report.managed.len(), 2);
        assert_eq!(
            report.missing_references,
            vec![MissingReference {
                from: id("loc-b"),
                relation: Relation::Parent,
                target: id("loc-a"),
            }]
        );
        let a = arena.get(&id("loc-a")).unwrap();
        let b = arena.get(&id("loc-b")).unwrap();
        assert!(Arc::ptr_eq(&a.parent().unwrap(), b));
        assert!(b.parent().is_none());

        assert_eq!(
            a.config().get(&builtin::USER).await.unwrap(),
            Some("root".to_string())
        );
        assert_eq!(b.config().get(&builtin::PRIVATE_KEY_FILE).await.unwrap(), None);
        assert_eq!(a.config().get_non_blocking(&builtin::PRIVATE_KEY_FILE).await, None);
    }

    #[test]
    fn dangling_parents_leave_roots() {
        let mut arena = ObjectArena::new();
        let batch = vec![ssh("loc-1").parent("loc-0").build().unwrap()];
        let report = rebinder(FailureMode::FailAtEnd)
            .rebind(&mut arena, batch)
            .unwrap();

        let loc1 = arena.get(&id("loc-1")).unwrap();
        assert!(loc1.parent().is_none());
        assert!(loc1.is_managed());
        assert_eq!(arena.roots().len(), 1);
        assert_eq!(report.missing_from(&id("loc-1"))[0].relation, Relation::Parent);
    }

    #[test]
    fn children_keep_memento_order() {
        let mut arena = ObjectArena::new();
        let batch = vec![
            ssh("loc-0").child("loc-b").child("loc-x").child("loc-a").build().unwrap(),
            ssh("loc-a").build().unwrap(),
            ssh("loc-b").build().unwrap(),
        ];
        rebinder(FailureMode::FailAtEnd)
            .rebind(&mut arena, batch)
            .unwrap();

        assert_eq!(
            arena.get(&id("loc-0")).unwrap().child_ids(),
            vec![id("loc-b"), id("loc-a")]
        );
    }

    #[test]
    fn later_batches_resolve_against_earlier_ones() {
        let rebinder = rebinder(FailureMode::FailAtEnd);
        let mut arena = ObjectArena::new();
        rebinder
            .rebind(&mut arena, vec![ssh("loc-0").build().unwrap()])
            .unwrap();
        let report = rebinder
            .rebind(&mut arena, vec![ssh("loc-1").parent("loc-0").build().unwrap()])
            .unwrap();

        assert!(report.is_clean());
        assert_eq!(
            arena.get(&id("loc-1")).unwrap().parent().map(|p| p.id().clone()),
            Some(id("loc-0"))
        );
    }

    fn with_failures() -> Vec<Memento> {
        vec![
            ssh("loc-1").config("port", json!("not-a-port")).build().unwrap(),
            Memento::builder("x-1", "NoSuchType", ObjectKind::Location)
                .build()
                .unwrap(),
            ssh("loc-2").build().unwrap(),
        ]
    }

    #[test]
    fn fail_at_end_restores_everything_it_can() {
        let mut arena = ObjectArena::new();
        let err = rebinder(FailureMode::FailAtEnd)
            .rebind(&mut arena, with_failures())
            .unwrap_err();

        assert!(matches!(err, RebindError::BatchFailed { count: 2, .. }));
        assert!(arena.get(&id("loc-2")).unwrap().is_managed());
        assert!(!arena.get(&id("loc-1")).unwrap().is_managed());
        assert!(!arena.contains(&id("x-1")));
    }

    #[test]
    fn continue_records_failures_in_the_report() {
        let mut arena = ObjectArena::new();
        let report = rebinder(FailureMode::Continue)
            .rebind(&mut arena, with_failures())
            .unwrap();

        let failed: Vec<_> = report.failures.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(failed, vec!["x-1", "loc-1"]);
        assert_eq!(report.managed, vec![id("loc-2")]);
    }

    #[test]
    fn fail_fast_stops_at_the_first_failure() {
        let mut arena = ObjectArena::new();
        let err = rebinder(FailureMode::FailFast)
            .rebind(&mut arena, with_failures())
            .unwrap_err();

        assert!(matches!(
            err,
            RebindError::ObjectFailed { ref id, .. } if id.as_str() == "x-1"
        ));
        assert!(arena.contains(&id("loc-1")));
        assert!(!arena.contains(&id("loc-2")));
        assert!(arena.managed().is_empty());
    }

    #[test]
    fn kind_and_duplicate_errors_are_per_object() {
        let mut arena = ObjectArena::new();
        let batch = vec![
            Memento::builder("loc-1", builtin::SSH_LOCATION, ObjectKind::Entity)
                .build()
                .unwrap(),
            ssh("loc-2").build().unwrap(),
            ssh("loc-2").build().unwrap(),
        ];
        let report = rebinder(FailureMode::Continue)
            .rebind(&mut arena, batch)
            .unwrap();

        assert_eq!(report.failures.len(), 2);
        assert!(report.failures[0].error.contains("persisted as a entity"));
        assert!(report.failures[1].error.contains("duplicate"));
        assert_eq!(report.managed, vec![id("loc-2")]);
    }

    #[test]
    fn entity_feeds_are_restored() {
        let mut arena = ObjectArena::new();
        let batch = vec![
            Memento::builder("app-1", builtin::BASIC_APPLICATION, ObjectKind::Application)
                .child("ent-1")
                .build()
                .unwrap(),
            Memento::builder("ent-1", builtin::BASIC_ENTITY, ObjectKind::Entity)
                .parent("app-1")
                .feed(json!({ "type": "http" }))
                .build()
                .unwrap(),
        ];
        let report = rebinder(FailureMode::FailAtEnd)
            .rebind(&mut arena, batch)
            .unwrap();

        assert_eq!(report.feeds_restored, 1);
        let ent = arena.get(&id("ent-1")).unwrap();
        assert_eq!(ent.parent().map(|p| p.id().clone()), Some(id("app-1")));
        assert_eq!(arena.get(&id("app-1")).unwrap().child_ids(), vec![id("ent-1")]);
    }

    #[tokio::test]
    async fn checkpoint_then_rebind_reproduces_the_graph() {
        let rebinder = rebinder(FailureMode::FailAtEnd);
        let mut first = ObjectArena::new();
        rebinder.rebind(&mut first, scenario()).unwrap();

        let mementos = rebinder.checkpoint(&first).unwrap();
        assert_eq!(mementos.len(), 3);
        let loc1 = mementos.iter().find(|m| m.id().as_str() == "loc-1").unwrap();
        assert_eq!(loc1.child_ids(), &[id("loc-2")]);
        assert_eq!(loc1.parent_id(), Some(&id("loc-0")));

        let mut second = ObjectArena::new();
        let report = rebinder.rebind(&mut second, mementos).unwrap();
        assert!(report.is_clean());
        let restored = second.get(&id("loc-1")).unwrap();
        assert_eq!(
            restored.config().get(&builtin::USER).await.unwrap(),
            Some("alice".to_string())
        );
        assert_eq!(restored.child_ids(), vec![id("loc-2")]);
    }
}
