//! forge::context
//!
//! Caller-supplied cancellation signal threaded through every operation.
//!
//! A capability call may issue several transport calls in sequence (the
//! permission cascade, or a repository fetch followed by a default-branch
//! fetch). Once the context is cancelled, any sub-call that has not been
//! issued yet fails with [`ScmError::Canceled`], and any in-flight call is
//! dropped and reports the same error.
//!
//! # Example
//!
//! ```
//! use scmbridge::forge::{Context, ScmError};
//!
//! let (ctx, handle) = Context::with_cancel();
//! assert!(ctx.check().is_ok());
//!
//! handle.cancel();
//! assert_eq!(ctx.check(), Err(ScmError::Canceled));
//! ```

use std::future::Future;

use tokio::sync::watch;

use super::traits::ScmError;

/// Cancellation context. Cheap to clone; clones observe the same signal.
#[derive(Debug, Clone, Default)]
pub struct Context {
    cancel: Option<watch::Receiver<bool>>,
}

/// Handle that cancels the paired [`Context`].
#[derive(Debug)]
pub struct CancelHandle {
    tx: watch::Sender<bool>,
}

impl CancelHandle {
    pub fn cancel(&self) {
        self.tx.send_replace(true);
    }
}

impl Context {
    /// A context that is never cancelled.
    pub fn background() -> Self {
        Self { cancel: None }
    }

    /// A cancellable context and the handle that cancels it.
    pub fn with_cancel() -> (Self, CancelHandle) {
        let (tx, rx) = watch::channel(false);
        (Self { cancel: Some(rx) }, CancelHandle { tx })
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancel.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Fail fast if the context has been cancelled.
    pub fn check(&self) -> Result<(), ScmError> {
        if self.is_cancelled() {
            Err(ScmError::Canceled)
        } else {
            Ok(())
        }
    }

    /// Resolves once the context is cancelled; never resolves otherwise.
    pub async fn cancelled(&self) {
        match &self.cancel {
            Some(rx) => {
                let mut rx = rx.clone();
                // A dropped handle can no longer cancel us.
                if rx.wait_for(|cancelled| *cancelled).await.is_err() {
                    std::future::pending::<()>().await;
                }
            }
            None => std::future::pending::<()>().await,
        }
    }

    /// Run `fut` unless the context is cancelled first.
    pub async fn run<T, F>(&self, fut: F) -> Result<T, ScmError>
    where
        F: Future<Output = Result<T, ScmError>>,
    {
        self.check()?;
        tokio::select! {
            biased;
            _ = self.cancelled() => Err(ScmError::Canceled),
            result = fut => result,
        }
    }
}
