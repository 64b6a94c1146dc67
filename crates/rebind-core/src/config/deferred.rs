//! Deferred - まだ確定していない設定値
//!
//! `tokio::sync::watch` のセルで表現します。
//! - 何度でも読める（読み手ごとに Receiver を clone）
//! - 書き手（Completer）は値を何度でも差し替えられる（再計算される値）
//! - 書き手が Pending のまま drop されたら Abandoned

use std::fmt;

use serde_json::Value;
use tokio::sync::watch;

use crate::domain::ResolveError;
use crate::ports::{ExecutionContext, UnitOfWork, WorkHandle};

/// Current state of a deferred value.
#[derive(Debug, Clone, PartialEq)]
pub enum DeferredState {
    Pending,
    Ready(Value),
    Failed(String),
}

/// A configuration value that is not resolved yet.
#[derive(Clone)]
pub struct Deferred {
    rx: watch::Receiver<DeferredState>,
}

/// The write side of a [`Deferred`].
pub struct Completer {
    tx: watch::Sender<DeferredState>,
}

impl Deferred {
    pub fn pending() -> (Deferred, Completer) {
        let (tx, rx) = watch::channel(DeferredState::Pending);
        (Deferred { rx }, Completer { tx })
    }

    /// An already resolved value.
    pub fn ready(value: Value) -> Deferred {
        let (_tx, rx) = watch::channel(DeferredState::Ready(value));
        Deferred { rx }
    }

    /// Run `work` on `execution`; the deferred completes with its result.
    ///
    /// Cancelling the returned handle before it finishes abandons the value.
    pub fn submit(
        execution: &dyn ExecutionContext,
        name: &str,
        work: UnitOfWork,
    ) -> (Deferred, Box<dyn WorkHandle>) {
        let (deferred, completer) = Deferred::pending();
        let handle = execution.submit(
            name,
            Box::pin(async move {
                let result = work.await;
                match &result {
                    Ok(value) => completer.complete(value.clone()),
                    Err(message) => completer.fail(message.clone()),
                }
                result
            }),
        );
        (deferred, handle)
    }

    pub fn peek(&self) -> DeferredState {
        self.rx.borrow().clone()
    }

    pub fn is_pending(&self) -> bool {
        matches!(*self.rx.borrow(), DeferredState::Pending)
    }

    /// Wait, without a bound, for the value to leave `Pending`.
    pub async fn resolve(&self) -> Result<Value, ResolveError> {
        let mut rx = self.rx.clone();
        let state = {
            let current = rx
                .wait_for(|state| !matches!(state, DeferredState::Pending))
                .await
                .map_err(|_| ResolveError::Abandoned)?;
            (*current).clone()
        };
        match state {
            DeferredState::Ready(value) => Ok(value),
            DeferredState::Failed(message) => Err(ResolveError::Failed(message)),
            DeferredState::Pending => Err(ResolveError::Abandoned),
        }
    }

    pub fn same_value_cell(&self, other: &Deferred) -> bool {
        self.rx.same_channel(&other.rx)
    }
}

impl fmt::Debug for Deferred {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Deferred").field(&*self.rx.borrow()).finish()
    }
}

impl Completer {
    pub fn complete(&self, value: Value) {
        self.tx.send_replace(DeferredState::Ready(value));
    }

    pub fn fail(&self, message: impl Into<String>) {
        self.tx.send_replace(DeferredState::Failed(message.into()));
    }

    /// Back to `Pending`, e.g. while a new value is computed.
    pub fn reset(&self) {
        self.tx.send_replace(DeferredState::Pending);
    }
}
