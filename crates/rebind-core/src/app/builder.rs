//! RebinderBuilder - GraphRebinder の構築とワイヤリング
//!
//! # 学習ポイント
//! - Builder パターンの実装
//! - 起動時検証（Fail-fast 設計）
//! - 開発体験の改善（明確なエラーメッセージ）

use std::sync::Arc;

use crate::config::StoreServices;
use crate::domain::ObjectKind;
use crate::impls::{ConverterRegistry, TokioExecutionContext};
use crate::ports::{
    Clock, ExecutionContext, IdGenerator, SystemClock, TypeCatalog, TypeCoercer, UlidGenerator,
};
use crate::rebind::{GraphRebinder, RebindSupport, RegistryError, SupportRegistry};
use crate::settings::RebindConfig;

/// RebinderBuilder は GraphRebinder を構築
///
/// # 使用例
/// ```ignore
/// let rebinder = RebinderBuilder::new()
///     .catalog(Arc::new(builtin::catalog()))
///     .supports(SupportRegistry::standard())
///     .expect_kinds(&[ObjectKind::Location])
///     .build()?;
/// ```
///
/// # Fail-fast 設計
/// - expect_kinds() で rebind する予定の種類を登録
/// - build() 時に「期待集合 ⊆ 登録済み集合」をチェック
/// - 不足があれば BuildError を返す
///
/// 省略した協調者はデフォルト（tokio 実行、標準変換器、システム時計、ULID）になります。
pub struct RebinderBuilder {
    catalog: Option<Arc<dyn TypeCatalog>>,
    supports: SupportRegistry,
    execution: Option<Arc<dyn ExecutionContext>>,
    coercer: Option<Arc<dyn TypeCoercer>>,
    clock: Option<Arc<dyn Clock>>,
    ids: Option<Arc<dyn IdGenerator>>,
    config: RebindConfig,
    expected_kinds: Option<Vec<ObjectKind>>,
}

/// BuildError は GraphRebinder 構築時のエラー
#[derive(Debug, thiserror::Error)]
pub enum BuildError {
    #[error("Missing rebind support for kinds: {0:?}. These kinds were expected but not registered.")]
    MissingSupport(Vec<ObjectKind>),

    #[error("No type catalog configured")]
    MissingCatalog,
}

impl RebinderBuilder {
    pub fn new() -> Self {
        Self {
            catalog: None,
            supports: SupportRegistry::new(),
            execution: None,
            coercer: None,
            clock: None,
            ids: None,
            config: RebindConfig::default(),
            expected_kinds: None,
        }
    }

    pub fn catalog(mut self, catalog: Arc<dyn TypeCatalog>) -> Self {
        self.catalog = Some(catalog);
        self
    }

    /// Replaces every registered strategy.
    pub fn supports(mut self, supports: SupportRegistry) -> Self {
        self.supports = supports;
        self
    }

    pub fn register<S: RebindSupport + 'static>(
        mut self,
        support: S,
    ) -> Result<Self, RegistryError> {
        self.supports.register(support)?;
        Ok(self)
    }

    pub fn execution(mut self, execution: Arc<dyn ExecutionContext>) -> Self {
        self.execution = Some(execution);
        self
    }

    pub fn coercer(mut self, coercer: Arc<dyn TypeCoercer>) -> Self {
        self.coercer = Some(coercer);
        self
    }

    pub fn clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = Some(clock);
        self
    }

    pub fn id_generator(mut self, ids: Arc<dyn IdGenerator>) -> Self {
        self.ids = Some(ids);
        self
    }

    pub fn config(mut self, config: RebindConfig) -> Self {
        self.config = config;
        self
    }

    pub fn expect_kinds(mut self, kinds: &[ObjectKind]) -> Self {
        self.expected_kinds = Some(kinds.to_vec());
        self
    }

    /// # 検証
    /// - カタログが設定されているか
    /// - expect_kinds() の種類が全て登録されているか
    pub fn build(self) -> Result<GraphRebinder, BuildError> {
        let catalog = self.catalog.ok_or(BuildError::MissingCatalog)?;
        if let Some(expected) = &self.expected_kinds {
            let registered = self.supports.registered_kinds();
            let missing: Vec<ObjectKind> = expected
                .iter()
                .filter(|kind| !registered.contains(kind))
                .copied()
                .collect();
            if !missing.is_empty() {
                return Err(BuildError::MissingSupport(missing));
            }
        }

        let clock = self.clock.unwrap_or_else(|| Arc::new(SystemClock));
        let ids = self
            .ids
            .unwrap_or_else(|| Arc::new(UlidGenerator::new(clock.clone())));
        let execution = self
            .execution
            .unwrap_or_else(|| Arc::new(TokioExecutionContext::with_id_generator(ids.clone())));
        let coercer = self
            .coercer
            .unwrap_or_else(|| Arc::new(ConverterRegistry::standard()));
        let services = StoreServices::new(execution, coercer, self.config.timeouts);

        Ok(GraphRebinder::new(
            catalog,
            self.supports,
            services,
            ids,
            clock,
            self.config.failure_mode,
        ))
    }
}

impl Default for RebinderBuilder {
    fn default() -> Self {
        Self::new()
    }
}
