//! Service invocations: the only place the engine yields to I/O.
//!
//! A service is a factory that builds a fresh Stillwater effect from the
//! context and event of the current turn. The interpreter runs the effect
//! against the embedding environment and routes the result through the
//! invoking state's `onDone`/`onError` candidates.

use crate::core::{DataValue, Event};
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;
use stillwater::effect::{BoxedEffect, Effect};
use stillwater::prelude::*;
use thiserror::Error;

/// The error a service may reject with.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ServiceError {
    #[error("Account is blocked")]
    AccountBlocked,

    /// Feature-specific failure carrying a stable kind code.
    #[error("{code}: {message}")]
    Machine { code: String, message: String },

    #[error("Unexpected service failure: {0}")]
    Unexpected(String),

    #[error("Service timed out after {0:?}")]
    TimedOut(Duration),
}

impl ServiceError {
    pub fn machine(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Machine {
            code: code.into(),
            message: message.into(),
        }
    }
}

/// Type alias for bound service factories.
pub type Service<C, Env> =
    Arc<dyn Fn(&C, &Event) -> BoxedEffect<DataValue, ServiceError, Env> + Send + Sync>;

/// Adapt an async function over owned `(env, context, event)` into a service.
///
/// # Example
///
/// ```rust
/// use ussd_flow::core::DataValue;
/// use ussd_flow::effects::{service_fn, ServiceError};
///
/// #[derive(Clone)]
/// struct Env;
///
/// let load = service_fn(|_env: Env, _context: (), event: ussd_flow::core::Event| async move {
///     if event.input() == "1234" {
///         Ok(DataValue::success())
///     } else {
///         Err(ServiceError::machine("INVALID_PIN", "PIN mismatch"))
///     }
/// });
/// # let _ = load;
/// ```
pub fn service_fn<C, Env, F, Fut>(
    f: F,
) -> impl Fn(&C, &Event) -> BoxedEffect<DataValue, ServiceError, Env> + Send + Sync + 'static
where
    C: Clone + Send + Sync + 'static,
    Env: Clone + Send + Sync + 'static,
    F: Fn(Env, C, Event) -> Fut + Clone + Send + Sync + 'static,
    Fut: Future<Output = Result<DataValue, ServiceError>> + Send + 'static,
{
    move |context: &C, event: &Event| {
        let context = context.clone();
        let event = event.clone();
        let f = f.clone();
        from_async(move |env: &Env| {
            let env = env.clone();
            let context = context.clone();
            let event = event.clone();
            let f = f.clone();
            async move { f(env, context, event).await }
        })
        .boxed()
    }
}

/// Wrap a service so that it rejects with `ServiceError::TimedOut` when it
/// does not resolve within `limit`. The interpreter itself has no timeout.
pub fn with_timeout<C, Env>(service: Service<C, Env>, limit: Duration) -> Service<C, Env>
where
    C: Clone + Send + Sync + 'static,
    Env: Clone + Send + Sync + 'static,
{
    Arc::new(move |context: &C, event: &Event| {
        let inner = Arc::clone(&service);
        let context = context.clone();
        let event = event.clone();
        from_async(move |env: &Env| {
            let env = env.clone();
            let effect = inner(&context, &event);
            async move {
                match tokio::time::timeout(limit, effect.run(&env)).await {
                    Ok(result) => result,
                    Err(_) => Err(ServiceError::TimedOut(limit)),
                }
            }
        })
        .boxed()
    })
}
