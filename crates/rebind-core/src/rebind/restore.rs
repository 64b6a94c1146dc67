//! Restore - Memento ⇔ ライブオブジェクトの変換アルゴリズム
//!
//! `RebindSupport` の既定実装はすべてここに委譲します。
//!
//! # 設定エントリの解決順
//! 1. 宣言済みキー（正式名 → 非推奨の別名 → 構造化キーの `name.<sub>`）
//! 2. 型のフラグテーブル
//!    - フィールドなし → 匿名の設定として保存（未知のデータは捨てない）
//!    - 設定キー型のフィールド → そのキーに保存
//!    - 通常のフィールド → 型変換してフィールドに直接代入（null はスキップ）
//!
//! 致命的なのは「正式名で一致したキーへの型変換失敗」だけです。

use std::sync::Arc;

use serde_json::Value;
use tracing::{debug, trace, warn};

use crate::config::{ConfigValue, KeyDescriptor, KeyShape, NameMatch};
use crate::domain::{Memento, RebindError};
use crate::ports::RebindContext;

use super::live::LiveObject;
use super::object_type::FieldDescriptor;
use super::report::{ConfigRestoreStats, MissingReference, Relation};

/// Places every persisted config entry of `memento` on `object`.
pub fn restore_config(
    memento: &Memento,
    declared: &[KeyDescriptor],
    object: &LiveObject,
) -> Result<ConfigRestoreStats, RebindError> {
    let mut stats = ConfigRestoreStats::default();
    for (name, value) in memento.config() {
        if restore_declared(name, value, declared, object)? {
            stats.declared += 1;
            continue;
        }
        restore_legacy(name, value, object, &mut stats);
    }
    debug!(
        id = %object.id(),
        type_name = object.type_name(),
        entries = stats.total(),
        anonymous = stats.anonymous,
        skipped = stats.skipped,
        "Restored config"
    );
    Ok(stats)
}

/// Returns `true` when a declared key took the entry.
fn restore_declared(
    name: &str,
    value: &Value,
    declared: &[KeyDescriptor],
    object: &LiveObject,
) -> Result<bool, RebindError> {
    let store = object.config();

    if let Some(key) = declared.iter().find(|k| k.match_name(name) == NameMatch::Exact) {
        let coerced = store
            .coercer()
            .coerce(value, key.value_type())
            .map_err(|source| RebindError::Coercion {
                id: object.id().clone(),
                type_name: object.type_name().to_string(),
                key: key.name().to_string(),
                source,
            })?;
        store.set_raw(key, coerced);
        return Ok(true);
    }

    if let Some(key) = declared
        .iter()
        .find(|k| k.match_name(name) == NameMatch::Deprecated)
    {
        match store.coercer().coerce(value, key.value_type()) {
            Ok(coerced) => {
                debug!(
                    id = %object.id(),
                    alias = name,
                    key = key.name(),
                    "Restored config under deprecated name"
                );
                store.set_raw(key, coerced);
                return Ok(true);
            }
            Err(error) => {
                warn!(
                    id = %object.id(),
                    alias = name,
                    key = key.name(),
                    %error,
                    "Deprecated config value does not coerce; trying legacy flags"
                );
                return Ok(false);
            }
        }
    }

    for key in declared.iter().filter(|k| matches!(k.shape(), KeyShape::Map | KeyShape::List)) {
        if let NameMatch::Element(sub) = key.match_name(name) {
            store.set_sub_element(key, &sub, value.clone());
            return Ok(true);
        }
    }

    Ok(false)
}

fn restore_legacy(name: &str, value: &Value, object: &LiveObject, stats: &mut ConfigRestoreStats) {
    let store = object.config();
    match object.object_type().find_field_for_flag(name) {
        None => {
            trace!(
                id = %object.id(),
                flag = name,
                "No field for flag; keeping as anonymous config"
            );
            store.put_anonymous(name, value.clone());
            stats.anonymous += 1;
        }
        Some(FieldDescriptor::ConfigKey(key)) => {
            match store.coercer().coerce(value, key.value_type()) {
                Ok(coerced) => {
                    store.set_raw(key, coerced);
                    stats.legacy_keys += 1;
                }
                Err(error) => {
                    warn!(
                        id = %object.id(),
                        flag = name,
                        key = key.name(),
                        %error,
                        "Flag value does not coerce; keeping as anonymous config"
                    );
                    store.put_anonymous(name, value.clone());
                    stats.anonymous += 1;
                }
            }
        }
        Some(FieldDescriptor::Plain { field, value_type }) => {
            match store.coercer().coerce(value, *value_type) {
                Ok(Value::Null) => {
                    debug!(id = %object.id(), flag = name, field, "Skipping null flag value");
                    stats.skipped += 1;
                }
                Ok(coerced) => {
                    object.set_field(*field, coerced);
                    stats.fields += 1;
                }
                Err(error) => {
                    warn!(
                        id = %object.id(),
                        flag = name,
                        field,
                        %error,
                        "Skipping flag value that does not coerce"
                    );
                    stats.skipped += 1;
                }
            }
        }
    }
}

/// Attaches the parent and children `memento` names, then runs the
/// object's init hook. Ids that do not resolve are logged and returned.
pub fn restore_relationships(
    memento: &Memento,
    context: &dyn RebindContext,
    object: &Arc<LiveObject>,
) -> Vec<MissingReference> {
    let kind = memento.kind();
    let mut missing = Vec::new();

    if let Some(parent_id) = memento.parent_id() {
        match context.lookup(kind, parent_id) {
            Some(parent) if parent.id() == object.id() || parent.descends_from(object.id()) => {
                warn!(
                    id = %object.id(),
                    type_name = object.type_name(),
                    parent = %parent_id,
                    "Parent would close a loop; leaving as root"
                );
                missing.push(MissingReference {
                    from: object.id().clone(),
                    relation: Relation::Parent,
                    target: parent_id.clone(),
                });
            }
            Some(parent) => object.set_parent(Some(&parent)),
            None => {
                warn!(
                    id = %object.id(),
                    type_name = object.type_name(),
                    parent = %parent_id,
                    "Parent not found on rebind; leaving as root"
                );
                missing.push(MissingReference {
                    from: object.id().clone(),
                    relation: Relation::Parent,
                    target: parent_id.clone(),
                });
            }
        }
    }

    for child_id in memento.child_ids() {
        match context.lookup(kind, child_id) {
            Some(child) => {
                object.add_child(child);
            }
            None => {
                warn!(
                    id = %object.id(),
                    type_name = object.type_name(),
                    child = %child_id,
                    "Child not found on rebind; ignoring"
                );
                missing.push(MissingReference {
                    from: object.id().clone(),
                    relation: Relation::Child,
                    target: child_id.clone(),
                });
            }
        }
    }

    object.initialize_once();
    missing
}

/// Attaches the persisted feed descriptors. Returns how many were attached.
pub fn restore_feeds(memento: &Memento, object: &LiveObject) -> usize {
    object.set_feeds(memento.feeds().to_vec());
    memento.feeds().len()
}

/// Snapshot of a live object.
///
/// Deferred config values are not persisted. Plain fields are written under
/// their flag names.
pub fn memento_of(object: &LiveObject) -> Result<Memento, RebindError> {
    let mut builder = Memento::builder(object.id().clone(), object.type_name(), object.kind());
    if let Some(name) = object.display_name() {
        builder = builder.display_name(name);
    }
    if let Some(item) = object.catalog_item_id() {
        builder = builder.catalog_item_id(item);
    }

    for (name, value) in object.config().local_entries() {
        match value {
            ConfigValue::Literal(value) => builder = builder.config(name, value),
            ConfigValue::Deferred(_) => {
                trace!(id = %object.id(), key = %name, "Not persisting deferred config value");
            }
        }
    }
    let flags = object.object_type().flags();
    for (field, value) in object.fields() {
        let flag = flags.flag_for_field(field).unwrap_or(field);
        builder = builder.config(flag, value);
    }

    if let Some(parent) = object.parent() {
        builder = builder.parent(parent.id().clone());
    }
    for child in object.child_ids() {
        builder = builder.child(child);
    }
    for tag in object.tags() {
        builder = builder.tag(tag);
    }
    for feed in object.feeds() {
        builder = builder.feed(feed);
    }

    let memento = builder.build()?;
    trace!(memento = %memento.to_verbose_string(), "Created memento");
    Ok(memento)
}
