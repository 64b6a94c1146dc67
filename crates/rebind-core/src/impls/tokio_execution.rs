//! TokioExecutionContext - tokio 上で unit of work を実行する
//!
//! # 学習ポイント
//! - `tokio::spawn` + `JoinHandle` による submit / join / abort
//! - `tokio::time::timeout` による上限付き待機
//! - ランタイム外から呼ばれた場合は panic せず「失敗済みハンドル」を返す

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{trace, warn};

use crate::domain::{WorkError, WorkId};
use crate::ports::{
    ExecutionContext, IdGenerator, SystemClock, UlidGenerator, UnitOfWork, WorkHandle,
};

pub struct TokioExecutionContext {
    ids: Arc<dyn IdGenerator>,
}

impl TokioExecutionContext {
    pub fn new() -> Self {
        Self::with_id_generator(Arc::new(UlidGenerator::new(SystemClock)))
    }

    pub fn with_id_generator(ids: Arc<dyn IdGenerator>) -> Self {
        Self { ids }
    }
}

impl Default for TokioExecutionContext {
    fn default() -> Self {
        Self::new()
    }
}

impl ExecutionContext for TokioExecutionContext {
    fn submit(&self, name: &str, work: UnitOfWork) -> Box<dyn WorkHandle> {
        let id = self.ids.generate_work_id();
        let task = match Handle::try_current() {
            Ok(runtime) => {
                trace!(%id, name, "Submitting unit of work");
                Some(runtime.spawn(work))
            }
            Err(error) => {
                warn!(%id, name, %error, "No tokio runtime; unit of work not started");
                None
            }
        };
        Box::new(TokioWorkHandle {
            id,
            name: name.to_string(),
            task,
            outcome: None,
        })
    }
}

pub struct TokioWorkHandle {
    id: WorkId,
    name: String,
    task: Option<JoinHandle<Result<Value, String>>>,
    /// A `JoinHandle` must not be polled after it completed.
    outcome: Option<Result<Value, WorkError>>,
}

#[async_trait]
impl WorkHandle for TokioWorkHandle {
    fn id(&self) -> WorkId {
        self.id
    }

    async fn join(&mut self, timeout: Duration) -> Result<Value, WorkError> {
        if let Some(outcome) = &self.outcome {
            return outcome.clone();
        }
        let Some(task) = self.task.as_mut() else {
            return Err(WorkError::Failed(format!("{} was never started", self.name)));
        };
        let outcome = match tokio::time::timeout(timeout, task).await {
            Err(_) => return Err(WorkError::Timeout(timeout)),
            Ok(Ok(Ok(value))) => Ok(value),
            Ok(Ok(Err(message))) => Err(WorkError::Failed(message)),
            Ok(Err(e)) if e.is_cancelled() => Err(WorkError::Cancelled),
            Ok(Err(e)) => Err(WorkError::Failed(e.to_string())),
        };
        self.outcome = Some(outcome.clone());
        outcome
    }

    fn cancel(&self) {
        if let Some(task) = &self.task {
            trace!(id = %self.id, name = %self.name, "Cancelling unit of work");
            task.abort();
        }
    }

    fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{Deferred, DeferredState};
    use crate::domain::ResolveError;
    use serde_json::json;

    #[tokio::test]
    async fn join_returns_the_result() {
        let context = TokioExecutionContext::new();
        let mut handle = context.submit("answer", Box::pin(async { Ok(json!(42)) }));

        assert_eq!(handle.join(Duration::from_secs(1)).await, Ok(json!(42)));
        assert!(handle.is_finished());
        assert_eq!(handle.join(Duration::from_secs(1)).await, Ok(json!(42)));
    }

    #[tokio::test]
    async fn failures_are_reported() {
        let context = TokioExecutionContext::new();
        let mut handle = context.submit("boom", Box::pin(async { Err("boom".to_string()) }));
        assert_eq!(
            handle.join(Duration::from_secs(1)).await,
            Err(WorkError::Failed("boom".into()))
        );
    }

    #[tokio::test]
    async fn timeouts_leave_the_work_running_until_cancelled() {
        let context = TokioExecutionContext::new();
        let mut handle = context.submit(
            "forever",
            Box::pin(async {
                std::future::pending::<()>().await;
                Ok(Value::Null)
            }),
        );

        let waited = Duration::from_millis(20);
        assert_eq!(handle.join(waited).await, Err(WorkError::Timeout(waited)));
        assert!(!handle.is_finished());

        handle.cancel();
        assert_eq!(
            handle.join(Duration::from_secs(1)).await,
            Err(WorkError::Cancelled)
        );
    }

    #[tokio::test]
    async fn cancelled_submissions_abandon_their_deferred_value() {
        let context = TokioExecutionContext::new();
        let (deferred, mut handle) = Deferred::submit(
            &context,
            "slow",
            Box::pin(async {
                tokio::time::sleep(Duration::from_secs(60)).await;
                Ok(json!("late"))
            }),
        );
        assert_eq!(deferred.peek(), DeferredState::Pending);

        handle.cancel();
        let _ = handle.join(Duration::from_secs(1)).await;
        assert_eq!(deferred.resolve().await, Err(ResolveError::Abandoned));
    }

    #[tokio::test]
    async fn submitted_work_completes_its_deferred_value() {
        let context = TokioExecutionContext::new();
        let (deferred, _handle) =
            Deferred::submit(&context, "quick", Box::pin(async { Ok(json!("done")) }));
        assert_eq!(deferred.resolve().await, Ok(json!("done")));
    }

    #[test]
    fn submitting_outside_a_runtime_yields_a_failed_handle() {
        let context = TokioExecutionContext::new();
        let mut handle = context.submit("orphan", Box::pin(async { Ok(Value::Null) }));
        assert!(handle.is_finished());

        let runtime = tokio::runtime::Runtime::new().unwrap();
        let result = runtime.block_on(handle.join(Duration::from_millis(10)));
        assert!(matches!(result, Err(WorkError::Failed(_))));
    }
}
