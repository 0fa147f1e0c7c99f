//! Interpreter that advances a session by one originating event.

use crate::core::{Event, Hop, MachineContext, Outcome, StepTrace, Trigger};
use crate::effects::classify::{CodeClassifier, ErrorClassifier};
use crate::effects::graph::{CompiledState, Machine};
use crate::effects::transition::{select, Transition};
use chrono::Utc;
use std::collections::HashSet;
use std::sync::Arc;
use stillwater::effect::Effect;
use tracing::{debug, error, warn};

/// What the caller should do with the session after a step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Disposition {
    /// More input is expected; persist the session.
    Continue,
    /// A final state was reached; dispose of the session.
    Terminate,
    /// The machine could not place the session anywhere sensible: an
    /// invocation outcome or entry raise matched no route, a raise or
    /// invocation came round twice in one turn, or the persisted state no
    /// longer exists. Treated as terminal.
    Unresolved,
}

impl Disposition {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Continue)
    }
}

/// Result of a single step.
#[derive(Clone, Debug, PartialEq)]
pub struct StepOutcome<C> {
    pub state_id: String,
    pub context: C,
    pub disposition: Disposition,
    pub trace: StepTrace,
}

impl<C> StepOutcome<C> {
    /// Whether any transition was taken.
    pub fn changed(&self) -> bool {
        !self.trace.is_empty()
    }
}

/// Executes a resolved machine.
///
/// The interpreter holds no session state. Every call to [`step`] receives
/// the persisted `(state_id, context)` and returns the next one, so a single
/// interpreter serves every session of its machine.
///
/// [`step`]: Interpreter::step
pub struct Interpreter<C, Env> {
    machine: Arc<Machine<C, Env>>,
    classifier: Arc<dyn ErrorClassifier>,
}

impl<C, Env> Clone for Interpreter<C, Env> {
    fn clone(&self) -> Self {
        Self {
            machine: Arc::clone(&self.machine),
            classifier: Arc::clone(&self.classifier),
        }
    }
}

impl<C: MachineContext, Env: Clone + Send + Sync + 'static> Interpreter<C, Env> {
    pub fn new(machine: Machine<C, Env>) -> Self {
        Self::from_shared(Arc::new(machine))
    }

    pub fn from_shared(machine: Arc<Machine<C, Env>>) -> Self {
        Self {
            machine,
            classifier: Arc::new(CodeClassifier),
        }
    }

    pub fn with_classifier(mut self, classifier: impl ErrorClassifier + 'static) -> Self {
        self.classifier = Arc::new(classifier);
        self
    }

    pub fn machine(&self) -> &Machine<C, Env> {
        &self.machine
    }

    pub fn id(&self) -> &str {
        self.machine.id()
    }

    /// Advance from `state_id` with `event`.
    ///
    /// An event with no matching candidate is ignored: the state and context
    /// come back untouched. Otherwise the selected transition is taken and
    /// any entry raises and invocations run, in order, until the session
    /// comes to rest. Service failures never escape; they are classified and
    /// routed through `onError`.
    pub async fn step(&self, state_id: &str, context: C, event: Event, env: &Env) -> StepOutcome<C> {
        let Some(current) = self.machine.state(state_id) else {
            error!(machine = self.id(), state = state_id, "persisted state is not part of the machine");
            return StepOutcome {
                state_id: state_id.to_string(),
                context,
                disposition: Disposition::Unresolved,
                trace: StepTrace::new(),
            };
        };

        let Some(selected) = select(current.candidates(event.kind()), &context, &event) else {
            debug!(machine = self.id(), state = state_id, event = %event.kind(), "no candidate matched, event ignored");
            return StepOutcome {
                state_id: state_id.to_string(),
                context,
                disposition: settle(current),
                trace: StepTrace::new(),
            };
        };

        let mut context = context;
        context.set_feedback(None);
        let (state_id, context, trace) =
            self.take(state_id, selected, context, &event, StepTrace::new(), Trigger::Event(event.kind()));

        self.run_to_rest(state_id, context, &event, trace, env).await
    }

    async fn run_to_rest(
        &self,
        mut state_id: String,
        mut context: C,
        event: &Event,
        mut trace: StepTrace,
        env: &Env,
    ) -> StepOutcome<C> {
        let mut raised = HashSet::new();
        let mut invoked = HashSet::new();

        loop {
            let Some(state) = self.machine.state(&state_id) else {
                error!(machine = self.id(), state = %state_id, "transition led outside the machine");
                return unresolved(state_id, context, trace);
            };

            if state.is_final() {
                break;
            }

            if let Some(raise) = &state.raise {
                if !raised.insert(state_id.clone()) {
                    error!(machine = self.id(), state = %state_id, "entry raise re-entered within one turn");
                    return unresolved(state_id, context, trace);
                }

                let synthetic = Event::raised(raise.kind, event.input(), raise.feedback.clone());
                context.set_feedback(raise.feedback.clone());
                let Some(next) = select(state.candidates(raise.kind), &context, &synthetic) else {
                    error!(machine = self.id(), state = %state_id, event = %raise.kind, "entry raise matched no candidate");
                    return unresolved(state_id, context, trace);
                };

                (state_id, context, trace) =
                    self.take(&state_id, next, context, &synthetic, trace, Trigger::Raise(raise.kind));
                continue;
            }

            if let Some(invocation) = &state.invoke {
                if !invoked.insert(state_id.clone()) {
                    error!(machine = self.id(), state = %state_id, "invocation re-entered within one turn");
                    return unresolved(state_id, context, trace);
                }

                let result = (invocation.service)(&context, event).run(env).await;
                let (resolved, candidates, trigger) = match result {
                    Ok(value) => (
                        event.with_outcome(Outcome::Success(value)),
                        &invocation.on_done,
                        Trigger::Done,
                    ),
                    Err(err) => {
                        let failure = self.classifier.classify(&err);
                        warn!(
                            machine = self.id(),
                            state = %state_id,
                            service = %invocation.service_name,
                            code = %failure.code,
                            "service rejected: {err}"
                        );
                        (
                            event.with_outcome(Outcome::Failure(failure)),
                            &invocation.on_error,
                            Trigger::Error,
                        )
                    }
                };

                let Some(next) = select(candidates, &context, &resolved) else {
                    error!(
                        machine = self.id(),
                        state = %state_id,
                        service = %invocation.service_name,
                        "invocation outcome matched no route"
                    );
                    return unresolved(state_id, context, trace);
                };

                (state_id, context, trace) = self.take(&state_id, next, context, &resolved, trace, trigger);
                continue;
            }

            break;
        }

        let disposition = self
            .machine
            .state(&state_id)
            .map_or(Disposition::Unresolved, settle);

        StepOutcome {
            state_id,
            context,
            disposition,
            trace,
        }
    }

    fn take(
        &self,
        from: &str,
        transition: &Transition<C>,
        context: C,
        event: &Event,
        trace: StepTrace,
        trigger: Trigger,
    ) -> (String, C, StepTrace) {
        debug!(machine = self.id(), state = from, target = %transition.target, ?trigger, "hop");

        let context = transition.apply(context, event);
        let trace = trace.record(Hop {
            from: from.to_string(),
            to: transition.target.clone(),
            trigger,
            timestamp: Utc::now(),
        });

        (transition.target.clone(), context, trace)
    }
}

/// Stops the turn at a state the session cannot leave by further input.
fn unresolved<C>(state_id: String, context: C, trace: StepTrace) -> StepOutcome<C> {
    StepOutcome {
        state_id,
        context,
        disposition: Disposition::Unresolved,
        trace,
    }
}

fn settle<C, Env>(state: &CompiledState<C, Env>) -> Disposition {
    if state.is_final() {
        Disposition::Terminate
    } else {
        Disposition::Continue
    }
}
