//! ExecutionContext port - 遅延計算を実行するランタイムへの入口
//!
//! Core が必要とするのは submit / join(timeout) / cancel の 3 つだけです。
//! タスクエンジン本体は外部の協調者であり、ここでは契約のみを定義します。

use std::future::Future;
use std::pin::Pin;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;

use crate::domain::{WorkError, WorkId};

/// A unit of work: a boxed future producing a value or a failure message.
pub type UnitOfWork = Pin<Box<dyn Future<Output = Result<Value, String>> + Send + 'static>>;

/// Runs units of work on behalf of the management runtime.
pub trait ExecutionContext: Send + Sync {
    /// Start `work` and return a handle to await or cancel it.
    ///
    /// `name` is a display name used in logs.
    fn submit(&self, name: &str, work: UnitOfWork) -> Box<dyn WorkHandle>;
}

/// A handle to one submitted unit of work.
#[async_trait]
pub trait WorkHandle: Send {
    fn id(&self) -> WorkId;

    /// Wait at most `timeout` for the result. A timeout leaves the work running.
    async fn join(&mut self, timeout: Duration) -> Result<Value, WorkError>;

    /// Best-effort cancellation; the work may not stop immediately.
    fn cancel(&self);

    fn is_finished(&self) -> bool;
}
