//! 組み込みの型宣言（SSH / localhost の Location、基本 Entity / Application）
//!
//! キーは `LazyLock` の static として宣言し、型宣言とアプリケーションコードの
//! 両方から同じものを参照します。

use std::collections::BTreeMap;
use std::sync::{Arc, LazyLock};

use serde_json::Value;

use crate::config::KeyDescriptor;
use crate::domain::ValueType;
use crate::rebind::ObjectType;
use crate::typed::ConfigKey;

use super::basic_type::BasicType;
use super::catalog::StaticCatalog;

pub const SSH_LOCATION: &str = "SshLocation";
pub const LOCALHOST_LOCATION: &str = "LocalhostLocation";
pub const BASIC_ENTITY: &str = "BasicEntity";
pub const BASIC_APPLICATION: &str = "BasicApplication";

// ---------------------------------------------------------------------------
// Location keys
// ---------------------------------------------------------------------------

pub static USER: LazyLock<ConfigKey<String>> =
    LazyLock::new(|| ConfigKey::new("user").with_description("User to log in as"));

pub static PORT: LazyLock<ConfigKey<u16>> = LazyLock::new(|| {
    ConfigKey::new("port")
        .with_default(22)
        .with_description("SSH port")
});

pub static PRIVATE_KEY_FILE: LazyLock<ConfigKey<String>> = LazyLock::new(|| {
    ConfigKey::new("privateKeyFile").with_deprecated_name("sshPrivateKeyFile")
});

pub static SSH_TRIES: LazyLock<ConfigKey<u32>> = LazyLock::new(|| {
    ConfigKey::new("ssh.tries")
        .with_default(1)
        .with_description("Connection attempts before giving up")
});

pub static ENV: LazyLock<ConfigKey<BTreeMap<String, String>>> = LazyLock::new(|| {
    ConfigKey::structured("env").with_description("Environment for remote commands")
});

// ---------------------------------------------------------------------------
// Entity keys
// ---------------------------------------------------------------------------

pub static START_TIMEOUT: LazyLock<ConfigKey<u64>> = LazyLock::new(|| {
    ConfigKey::new("start.timeout")
        .with_default(120)
        .with_description("Seconds to wait for the entity to start")
});

pub const STARTABLE_MODES: &[&str] = &["NONE", "FOREGROUND", "BACKGROUND", "BACKGROUND_LATE"];

pub static CHILDREN_STARTABLE_MODE: LazyLock<ConfigKey<String>> = LazyLock::new(|| {
    ConfigKey::from_descriptor(
        KeyDescriptor::new("children.startable.mode", ValueType::Enum(STARTABLE_MODES))
            .with_default(Value::String("NONE".into()))
            .not_inherited(),
    )
});

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

pub fn ssh_location_type() -> Arc<dyn ObjectType> {
    BasicType::location(SSH_LOCATION)
        .key(USER.clone())
        .key(PORT.clone())
        .key(PRIVATE_KEY_FILE.clone())
        .key(SSH_TRIES.clone())
        .key(ENV.clone())
        .flag_field("address", "address", ValueType::String)
        .flag_key("sshTries", SSH_TRIES.clone())
        .flag_field("detectMachineDetails", "detectMachineDetails", ValueType::Bool)
        .build()
}

/// Like an SSH location; its address defaults to `localhost` once rebound.
pub fn localhost_location_type() -> Arc<dyn ObjectType> {
    BasicType::location(LOCALHOST_LOCATION)
        .key(USER.clone())
        .key(ENV.clone())
        .flag_field("address", "address", ValueType::String)
        .on_init(|object| {
            if object.field("address").is_none() {
                object.set_field("address", Value::String("localhost".into()));
            }
        })
        .build()
}

pub fn basic_entity_type() -> Arc<dyn ObjectType> {
    BasicType::entity(BASIC_ENTITY)
        .key(START_TIMEOUT.clone())
        .key(CHILDREN_STARTABLE_MODE.clone())
        .flag_key("startTimeout", START_TIMEOUT.clone())
        .flag_field("iconUrl", "iconUrl", ValueType::String)
        .build()
}

pub fn basic_application_type() -> Arc<dyn ObjectType> {
    BasicType::application(BASIC_APPLICATION)
        .key(START_TIMEOUT.clone())
        .key(CHILDREN_STARTABLE_MODE.clone())
        .flag_field("iconUrl", "iconUrl", ValueType::String)
        .build()
}

pub fn catalog() -> StaticCatalog {
    StaticCatalog::new()
        .with_type(ssh_location_type())
        .with_type(localhost_location_type())
        .with_type(basic_entity_type())
        .with_type(basic_application_type())
}
