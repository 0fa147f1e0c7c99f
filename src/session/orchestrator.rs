//! Load, step, persist: the unit of work for one incoming keystroke.

use crate::core::{Event, MachineContext, StepTrace};
use crate::effects::{Disposition, Interpreter};
use crate::render::{Renderer, Reply};
use crate::session::config::SessionConfig;
use crate::session::error::SessionError;
use crate::session::store::SessionStore;
use crate::session::Session;
use std::collections::HashMap;
use std::sync::Arc;
use tracing::{debug, info};

/// Result of advancing a session by one event, before it is committed.
#[derive(Clone, Debug, PartialEq)]
pub struct Turn<C: MachineContext> {
    pub session: Session<C>,
    pub disposition: Disposition,
    pub trace: StepTrace,
}

impl<C: MachineContext> Turn<C> {
    pub fn is_terminal(&self) -> bool {
        self.disposition.is_terminal()
    }
}

/// Drives sessions through registered interpreters.
///
/// There is no locking around a session key. Two requests for the same key
/// that overlap both load the same record, and whichever commits last wins.
pub struct Orchestrator<C: MachineContext, Env> {
    interpreters: HashMap<String, Interpreter<C, Env>>,
    store: Arc<dyn SessionStore<C>>,
    config: SessionConfig,
}

impl<C, Env> Orchestrator<C, Env>
where
    C: MachineContext + Default,
    Env: Clone + Send + Sync + 'static,
{
    pub fn new(store: Arc<dyn SessionStore<C>>, config: SessionConfig) -> Self {
        Self {
            interpreters: HashMap::new(),
            store,
            config,
        }
    }

    /// Register an interpreter under its machine id.
    pub fn machine(mut self, interpreter: Interpreter<C, Env>) -> Self {
        self.interpreters
            .insert(interpreter.id().to_string(), interpreter);
        self
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    pub fn store(&self) -> &Arc<dyn SessionStore<C>> {
        &self.store
    }

    pub fn interpreter(&self, machine_id: &str) -> Result<&Interpreter<C, Env>, SessionError> {
        self.interpreters
            .get(machine_id)
            .ok_or_else(|| SessionError::UnknownMachine(machine_id.to_string()))
    }

    /// Load the session, or a fresh one at the entry machine's initial state.
    pub async fn load(&self, session_id: &str) -> Result<Session<C>, SessionError> {
        self.load_or_else(session_id, C::default).await
    }

    /// Like [`load`](Self::load), seeding a fresh session with `init()`.
    pub async fn load_or_else<F>(&self, session_id: &str, init: F) -> Result<Session<C>, SessionError>
    where
        F: FnOnce() -> C,
    {
        let key = self.config.key_for(session_id);
        if let Some(session) = self.store.get(&key).await? {
            debug!(key = %key, machine = %session.machine_id, state = %session.state_id, "session loaded");
            return Ok(session);
        }

        let entry = self.interpreter(&self.config.entry_machine)?;
        info!(key = %key, machine = entry.id(), "session created");
        Ok(Session::new(
            key,
            entry.id(),
            entry.machine().initial(),
            init(),
            self.config.ttl(),
        ))
    }

    /// Persist a new session for `session_id` at `machine_id`'s initial state,
    /// replacing whatever was stored.
    pub async fn start(
        &self,
        session_id: &str,
        machine_id: &str,
        context: C,
    ) -> Result<Session<C>, SessionError> {
        let interpreter = self.interpreter(machine_id)?;
        let session = Session::new(
            self.config.key_for(session_id),
            machine_id,
            interpreter.machine().initial(),
            context,
            self.config.ttl(),
        );
        self.store.set(&session, self.config.ttl()).await?;
        info!(key = %session.key, machine = machine_id, "session started");
        Ok(session)
    }

    /// Run one interpreter step. Nothing is written.
    pub async fn advance(&self, session: &Session<C>, event: Event, env: &Env) -> Result<Turn<C>, SessionError> {
        let interpreter = self.interpreter(&session.machine_id)?;
        let outcome = interpreter
            .step(&session.state_id, session.context.clone(), event, env)
            .await;

        Ok(Turn {
            session: session.advanced(outcome.state_id, outcome.context, self.config.ttl()),
            disposition: outcome.disposition,
            trace: outcome.trace,
        })
    }

    /// Delete a terminal session, otherwise store it with a refreshed TTL.
    pub async fn commit(&self, turn: &Turn<C>) -> Result<(), SessionError> {
        let session = &turn.session;
        if turn.is_terminal() {
            self.store.delete(&session.key).await?;
            info!(
                key = %session.key,
                machine = %session.machine_id,
                state = %session.state_id,
                disposition = ?turn.disposition,
                "session closed"
            );
            return Ok(());
        }

        self.store.set(session, self.config.ttl()).await
    }

    pub async fn handle(&self, session_id: &str, event: Event, env: &Env) -> Result<Turn<C>, SessionError> {
        let session = self.load(session_id).await?;
        let turn = self.advance(&session, event, env).await?;
        self.commit(&turn).await?;
        Ok(turn)
    }

    /// Render the resting state and frame it for the transport.
    pub fn reply<R>(&self, turn: &Turn<C>, renderer: &R) -> Reply
    where
        R: Renderer<C> + ?Sized,
    {
        let session = &turn.session;
        let text = renderer.render(&session.machine_id, &session.state_id, &session.context);
        if turn.is_terminal() {
            Reply::end(text)
        } else {
            Reply::con(text)
        }
    }
}
