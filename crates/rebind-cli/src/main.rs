use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use tracing::info;
use tracing_subscriber::EnvFilter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;

use rebind_core::domain::{Memento, ObjectKind};
use rebind_core::impls::builtin;
use rebind_core::rebind::SupportRegistry;
use rebind_core::{Deferred, ObjectArena, ObjectId, RebindConfig, RebinderBuilder};

fn init_tracing() {
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer())
        .init();
}

fn ssh(id: &str) -> rebind_core::domain::MementoBuilder {
    Memento::builder(id, builtin::SSH_LOCATION, ObjectKind::Location)
}

/// `loc-1` under `loc-0`, with children `loc-2` (present) and `loc-3` (never persisted).
fn snapshot() -> Result<Vec<Memento>, rebind_core::domain::MementoError> {
    Ok(vec![
        ssh("loc-0")
            .display_name("datacenter")
            .config("user", json!("root"))
            .child("loc-1")
            .build()?,
        ssh("loc-1")
            .display_name("bastion")
            .config("user", json!("alice"))
            .config("port", json!("2222"))
            .config("sshPrivateKeyFile", json!("/keys/id_ed25519"))
            .config("address", json!("10.0.0.5"))
            .config("env.PATH", json!("/usr/local/bin:/usr/bin"))
            .config("customFlag", json!("v1"))
            .parent("loc-0")
            .child("loc-2")
            .child("loc-3")
            .build()?,
        ssh("loc-2").parent("loc-1").build()?,
    ])
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_tracing();

    let config = match std::env::args().nth(1) {
        Some(path) => RebindConfig::load(path)?,
        None => RebindConfig::default(),
    };

    let rebinder = RebinderBuilder::new()
        .catalog(Arc::new(builtin::catalog()))
        .supports(SupportRegistry::standard())
        .expect_kinds(&[ObjectKind::Location])
        .config(config)
        .build()?;

    let mut arena = ObjectArena::new();
    let report = rebinder.rebind(&mut arena, snapshot()?)?;
    println!("{}", serde_json::to_string_pretty(&report)?);

    let loc1 = arena
        .get(&ObjectId::new("loc-1"))
        .ok_or("loc-1 was not rebound")?;
    let store = loc1.config();
    let user = store.get(&builtin::USER).await?;
    let port = store.get(&builtin::PORT).await?;
    let key = store.get(&builtin::PRIVATE_KEY_FILE).await?;
    let env = store.get(&builtin::ENV).await?;
    info!(
        ?user,
        ?port,
        ?key,
        ?env,
        parent = ?loc1.parent().map(|p| p.id().clone()),
        children = ?loc1.child_ids(),
        "loc-1 after rebind"
    );

    // loc-2 sets no user of its own; it reads loc-1's
    let loc2 = arena
        .get(&ObjectId::new("loc-2"))
        .ok_or("loc-2 was not rebound")?;
    let inherited = loc2.config().get(&builtin::USER).await?;
    info!(user = ?inherited, "loc-2 inherits user");

    // a value still being computed: bounded reads give up, blocking reads wait
    let (deferred, completer) = Deferred::pending();
    loc2.config().set_deferred(&builtin::SSH_TRIES, deferred);
    let pending = loc2.config().get_non_blocking(&builtin::SSH_TRIES).await;
    info!(tries = ?pending, "Bounded read while pending");

    tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(50)).await;
        completer.complete(json!(5));
    });
    let completed = loc2.config().get(&builtin::SSH_TRIES).await?;
    info!(tries = ?completed, "Blocking read after completion");

    let checkpoint = rebinder.checkpoint(&arena)?;
    println!("{}", serde_json::to_string_pretty(&checkpoint)?);
    Ok(())
}
