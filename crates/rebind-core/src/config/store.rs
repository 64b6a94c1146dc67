//! ConfigStore - オブジェクトごとの設定ストア
//!
//! # 読み出しの種類
//! - `get_raw` / `get_local_raw`: 保存された生の値。解決もデフォルト補完もしない
//! - `get` / `get_value`: 解決済みの値。Deferred の完了を上限なしで待つ
//! - `get_non_blocking`: 上限付きで待つ。間に合わなければ `None`
//!
//! 解決結果はキャッシュしません。毎回ストアの現在値から計算します。
//!
//! # ロック
//! エントリは `parking_lot::RwLock` で守られます。await をまたいで
//! ガードを保持しないよう、読み出しは必ずスナップショットを取ってから待ちます。

use std::sync::{Arc, Weak};

use indexmap::IndexMap;
use parking_lot::RwLock;
use serde_json::Value;
use tracing::debug;

use crate::domain::{ConfigError, ObjectId, WorkError};
use crate::ports::{ExecutionContext, TypeCoercer};
use crate::settings::ResolveTimeouts;
use crate::typed::{ConfigKey, ConfigType};

use super::deferred::Deferred;
use super::key::{KeyDescriptor, KeyShape, NameMatch};
use super::merge::{self, Fragment};
use super::value::ConfigValue;

/// Collaborators shared by every store of a rebind.
#[derive(Clone)]
pub struct StoreServices {
    pub execution: Arc<dyn ExecutionContext>,
    pub coercer: Arc<dyn TypeCoercer>,
    pub timeouts: ResolveTimeouts,
}

impl StoreServices {
    pub fn new(
        execution: Arc<dyn ExecutionContext>,
        coercer: Arc<dyn TypeCoercer>,
        timeouts: ResolveTimeouts,
    ) -> Self {
        Self {
            execution,
            coercer,
            timeouts,
        }
    }
}

/// Configuration of one live object.
///
/// Cloning yields another handle to the same store.
#[derive(Clone)]
pub struct ConfigStore {
    inner: Arc<StoreInner>,
}

struct StoreInner {
    owner: ObjectId,
    declared: IndexMap<String, KeyDescriptor>,
    entries: RwLock<IndexMap<String, ConfigValue>>,
    parent: RwLock<Weak<StoreInner>>,
    services: StoreServices,
}

impl ConfigStore {
    pub fn new(
        owner: ObjectId,
        declared: impl IntoIterator<Item = KeyDescriptor>,
        services: StoreServices,
    ) -> Self {
        let declared = declared
            .into_iter()
            .map(|key| (key.name().to_string(), key))
            .collect();
        Self {
            inner: Arc::new(StoreInner {
                owner,
                declared,
                entries: RwLock::new(IndexMap::new()),
                parent: RwLock::new(Weak::new()),
                services,
            }),
        }
    }

    pub fn owner(&self) -> &ObjectId {
        &self.inner.owner
    }

    pub fn coercer(&self) -> &dyn TypeCoercer {
        self.inner.services.coercer.as_ref()
    }

    pub fn timeouts(&self) -> ResolveTimeouts {
        self.inner.services.timeouts
    }

    pub fn declared_keys(&self) -> impl Iterator<Item = &KeyDescriptor> {
        self.inner.declared.values()
    }

    pub fn declared_key(&self, name: &str) -> Option<&KeyDescriptor> {
        self.inner.declared.get(name)
    }

    /// Inherited keys fall back to `parent`. The link is weak.
    pub fn set_parent(&self, parent: Option<&ConfigStore>) {
        *self.inner.parent.write() = parent
            .map(|p| Arc::downgrade(&p.inner))
            .unwrap_or_default();
    }

    pub fn parent(&self) -> Option<ConfigStore> {
        self.inner
            .parent
            .read()
            .upgrade()
            .map(|inner| ConfigStore { inner })
    }

    /// This store, then each parent in turn. A looped chain stops at the
    /// first store seen twice.
    fn lineage(&self) -> Vec<ConfigStore> {
        let mut chain = vec![self.clone()];
        while let Some(parent) = chain.last().and_then(ConfigStore::parent) {
            if chain.iter().any(|seen| Arc::ptr_eq(&seen.inner, &parent.inner)) {
                debug!(owner = %self.inner.owner, "Config parent chain loops; stopping");
                break;
            }
            chain.push(parent);
        }
        chain
    }

    // ========================================================================
    // Writes
    // ========================================================================

    /// Stores a typed literal. Returns the value it replaced.
    pub fn set<T: ConfigType>(
        &self,
        key: &ConfigKey<T>,
        value: T,
    ) -> Result<Option<ConfigValue>, ConfigError> {
        let encoded = serde_json::to_value(value).map_err(|e| ConfigError::Encode {
            owner: self.inner.owner.clone(),
            key: key.name().to_string(),
            reason: e.to_string(),
        })?;
        Ok(self.put(key.name(), ConfigValue::Literal(encoded)))
    }

    pub fn set_deferred<T: ConfigType>(
        &self,
        key: &ConfigKey<T>,
        deferred: Deferred,
    ) -> Option<ConfigValue> {
        self.put(key.name(), ConfigValue::Deferred(deferred))
    }

    /// Stores under the key's own name without checking the value.
    pub fn set_raw(
        &self,
        key: &KeyDescriptor,
        value: impl Into<ConfigValue>,
    ) -> Option<ConfigValue> {
        self.put(key.name(), value.into())
    }

    /// Stores the `name.<sub>` fragment of a structured key. The key's other
    /// fragments are left alone.
    pub fn set_sub_element(
        &self,
        key: &KeyDescriptor,
        sub: &str,
        value: impl Into<ConfigValue>,
    ) -> Option<ConfigValue> {
        self.put(&format!("{}.{}", key.name(), sub), value.into())
    }

    /// Stores a value under a name no declared key owns.
    pub fn put_anonymous(&self, name: &str, value: Value) -> Option<ConfigValue> {
        self.put(name, ConfigValue::Literal(value))
    }

    pub fn remove(&self, name: &str) -> Option<ConfigValue> {
        self.inner.entries.write().shift_remove(name)
    }

    fn put(&self, name: &str, value: ConfigValue) -> Option<ConfigValue> {
        self.inner.entries.write().insert(name.to_string(), value)
    }

    // ========================================================================
    // Raw reads
    // ========================================================================

    /// The value stored in this store under the key's name.
    pub fn get_local_raw(&self, key: &KeyDescriptor) -> Option<ConfigValue> {
        self.inner.entries.read().get(key.name()).cloned()
    }

    /// Like [`get_local_raw`](Self::get_local_raw), then the parent chain
    /// for inherited keys. Defaults are never substituted.
    pub fn get_raw(&self, key: &KeyDescriptor) -> Option<ConfigValue> {
        if let Some(local) = self.get_local_raw(key) {
            return Some(local);
        }
        if !key.is_inherited() {
            return None;
        }
        self.lineage()
            .iter()
            .skip(1)
            .find_map(|store| store.get_local_raw(key))
    }

    /// Snapshot of this store's entries in insertion order.
    pub fn local_entries(&self) -> Vec<(String, ConfigValue)> {
        self.inner
            .entries
            .read()
            .iter()
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect()
    }

    fn raw_or_default(&self, key: &KeyDescriptor) -> Option<ConfigValue> {
        self.get_raw(key)
            .or_else(|| key.default_value().cloned().map(ConfigValue::Literal))
    }

    /// Fragments of a structured key in insertion order. A store with no
    /// fragment defers to its parent for inherited keys.
    fn fragments_of(&self, key: &KeyDescriptor) -> Vec<(NameMatch, ConfigValue)> {
        let local = self.local_fragments(key);
        if !local.is_empty() || !key.is_inherited() {
            return local;
        }
        self.lineage()
            .iter()
            .skip(1)
            .map(|store| store.local_fragments(key))
            .find(|fragments| !fragments.is_empty())
            .unwrap_or_default()
    }

    fn local_fragments(&self, key: &KeyDescriptor) -> Vec<(NameMatch, ConfigValue)> {
        self.inner
            .entries
            .read()
            .iter()
            .filter_map(|(name, value)| match key.match_name(name) {
                m @ (NameMatch::Exact | NameMatch::Element(_)) => Some((m, value.clone())),
                NameMatch::Deprecated | NameMatch::None => None,
            })
            .collect()
    }

    // ========================================================================
    // Resolved reads
    // ========================================================================

    /// Resolved value of `key`, decoded as `T`.
    ///
    /// Waits without a bound for deferred values.
    pub async fn get<T: ConfigType>(&self, key: &ConfigKey<T>) -> Result<Option<T>, ConfigError> {
        match self.get_value(key.descriptor()).await? {
            Some(value) => self.decode(key.descriptor(), value).map(Some),
            None => Ok(None),
        }
    }

    /// Reads by name. A declared key must be compatible with `T`; any other
    /// name is read as an anonymous key.
    pub async fn get_by_name<T: ConfigType>(&self, name: &str) -> Result<Option<T>, ConfigError> {
        let key = match self.declared_key(name) {
            Some(declared) => {
                if !T::VALUE_TYPE.accepts(declared.value_type()) {
                    return Err(ConfigError::IncompatibleType {
                        owner: self.inner.owner.clone(),
                        key: name.to_string(),
                        declared: declared.value_type(),
                        requested: T::VALUE_TYPE,
                    });
                }
                ConfigKey::<T>::from_descriptor(declared.clone())
            }
            None => ConfigKey::<T>::from_descriptor(KeyDescriptor::new(name, T::VALUE_TYPE)),
        };
        self.get(&key).await
    }

    /// Resolved and coerced value of `key`. A null result reads as `None`.
    pub async fn get_value(&self, key: &KeyDescriptor) -> Result<Option<Value>, ConfigError> {
        let resolved = match key.shape() {
            KeyShape::Simple => match self.raw_or_default(key) {
                Some(raw) => self.await_raw(key, raw).await?,
                None => return Ok(None),
            },
            KeyShape::Map | KeyShape::List => match self.resolve_structured(key).await? {
                Some(merged) => merged,
                None => return Ok(None),
            },
            KeyShape::SubElement { parent, sub } => {
                let entry = self
                    .resolve_structured(parent)
                    .await?
                    .and_then(|merged| merged.get(sub.as_str()).cloned());
                match entry.or_else(|| key.default_value().cloned()) {
                    Some(value) => value,
                    None => return Ok(None),
                }
            }
        };
        if resolved.is_null() {
            return Ok(None);
        }
        self.coerce(key, &resolved).map(Some)
    }

    /// Bounded read. `None` when the value is absent, not ready in time,
    /// failed, or does not coerce.
    ///
    /// Structured keys are resolved as fresh work on the execution context
    /// and waited on for `quick_wait`; the work is cancelled on timeout.
    /// Simple keys wait `settle_wait` for a pending value.
    pub async fn get_non_blocking<T: ConfigType>(&self, key: &ConfigKey<T>) -> Option<T> {
        let value = self.get_value_non_blocking(key.descriptor()).await?;
        serde_json::from_value(value).ok()
    }

    pub async fn get_value_non_blocking(&self, key: &KeyDescriptor) -> Option<Value> {
        if key.is_structured() {
            self.structured_non_blocking(key).await
        } else {
            self.simple_non_blocking(key).await
        }
    }

    async fn structured_non_blocking(&self, key: &KeyDescriptor) -> Option<Value> {
        let store = self.clone();
        let owned = key.clone();
        let mut handle = self.inner.services.execution.submit(
            &format!("Resolving config {}", key.name()),
            Box::pin(async move {
                match store.get_value(&owned).await {
                    Ok(value) => Ok(value.unwrap_or(Value::Null)),
                    Err(e) => Err(e.to_string()),
                }
            }),
        );
        match handle.join(self.inner.services.timeouts.quick_wait()).await {
            Ok(Value::Null) => None,
            Ok(value) => Some(value),
            Err(WorkError::Timeout(waited)) => {
                handle.cancel();
                debug!(
                    owner = %self.inner.owner,
                    key = key.name(),
                    ?waited,
                    "Config not resolved in time, returning <absent>"
                );
                None
            }
            Err(error) => {
                debug!(
                    owner = %self.inner.owner,
                    key = key.name(),
                    %error,
                    "Problem resolving config, returning <absent>"
                );
                None
            }
        }
    }

    async fn simple_non_blocking(&self, key: &KeyDescriptor) -> Option<Value> {
        let value = match self.raw_or_default(key)? {
            ConfigValue::Literal(value) => value,
            ConfigValue::Deferred(deferred) => {
                let settle = self.inner.services.timeouts.settle_wait();
                match tokio::time::timeout(settle, deferred.resolve()).await {
                    Ok(Ok(value)) => value,
                    Ok(Err(error)) => {
                        debug!(
                            owner = %self.inner.owner,
                            key = key.name(),
                            %error,
                            "Problem resolving config, returning <absent>"
                        );
                        return None;
                    }
                    Err(_) => return None,
                }
            }
        };
        if value.is_null() {
            return None;
        }
        self.inner.services.coercer.try_coerce(&value, key.value_type())
    }

    async fn resolve_structured(&self, key: &KeyDescriptor) -> Result<Option<Value>, ConfigError> {
        let stored = self.fragments_of(key);
        if stored.is_empty() {
            return Ok(key.default_value().cloned());
        }
        let mut fragments = Vec::with_capacity(stored.len());
        for (name_match, raw) in stored {
            let value = self.await_raw(key, raw).await?;
            fragments.push(match name_match {
                NameMatch::Element(sub) => Fragment::Element(sub, value),
                _ => Fragment::Whole(value),
            });
        }
        Ok(Some(merge::merge(key.shape(), fragments)))
    }

    async fn await_raw(&self, key: &KeyDescriptor, raw: ConfigValue) -> Result<Value, ConfigError> {
        match raw {
            ConfigValue::Literal(value) => Ok(value),
            ConfigValue::Deferred(deferred) => {
                deferred
                    .resolve()
                    .await
                    .map_err(|source| ConfigError::Resolution {
                        owner: self.inner.owner.clone(),
                        key: key.name().to_string(),
                        source,
                    })
            }
        }
    }

    fn coerce(&self, key: &KeyDescriptor, value: &Value) -> Result<Value, ConfigError> {
        self.inner
            .services
            .coercer
            .coerce(value, key.value_type())
            .map_err(|source| ConfigError::Coercion {
                owner: self.inner.owner.clone(),
                key: key.name().to_string(),
                source,
            })
    }

    fn decode<T: ConfigType>(&self, key: &KeyDescriptor, value: Value) -> Result<T, ConfigError> {
        serde_json::from_value(value).map_err(|e| ConfigError::Decode {
            owner: self.inner.owner.clone(),
            key: key.name().to_string(),
            reason: e.to_string(),
        })
    }
}

impl std::fmt::Debug for ConfigStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConfigStore")
            .field("owner", &self.inner.owner)
            .field("entries", &self.inner.entries.read().len())
            .finish()
    }
}
