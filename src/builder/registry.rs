//! Binds the symbolic names of a definition to concrete functions.

use crate::builder::error::BuildError;
use crate::core::{Action, DataValue, Event, Guard, MachineContext, MachineDefinition, TransitionSpec};
use crate::effects::{CompiledState, Interpreter, Invocation, Machine, Service, ServiceError, Transition};
use crate::validation::{self, Bindings};
use std::collections::HashMap;
use std::sync::Arc;
use stillwater::effect::BoxedEffect;

/// Name-to-function bindings supplied by a feature module.
///
/// Resolution happens once, when a machine is loaded. Any name the
/// definition uses but the registry lacks fails fast with a `BuildError`.
///
/// # Example
///
/// ```
/// use ussd_flow::builder::{target, MachineBuilder, Registry, StateBuilder};
/// use ussd_flow::core::{Event, MachineContext};
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// # struct Ctx { feedback: Option<String> }
/// # impl MachineContext for Ctx {
/// #     fn feedback(&self) -> Option<&str> { self.feedback.as_deref() }
/// #     fn set_feedback(&mut self, feedback: Option<String>) { self.feedback = feedback; }
/// # }
///
/// let definition = MachineBuilder::new("demo")
///     .initial("menu")
///     .state(StateBuilder::new("menu").transit(target("exit").when("isOption9")))
///     .state(StateBuilder::final_state("exit"))
///     .build()
///     .unwrap();
///
/// let registry: Registry<Ctx, ()> =
///     Registry::new().guard("isOption9", |_: &Ctx, e: &Event| e.input() == "9");
/// let machine = registry.resolve(&definition).unwrap();
///
/// assert_eq!(machine.initial(), "menu");
/// assert!(machine.is_terminal("exit"));
/// ```
pub struct Registry<C, Env> {
    guards: HashMap<String, Guard<C>>,
    actions: HashMap<String, Action<C>>,
    services: HashMap<String, Service<C, Env>>,
}

impl<C: MachineContext, Env: Clone + Send + Sync + 'static> Registry<C, Env> {
    pub fn new() -> Self {
        Self {
            guards: HashMap::new(),
            actions: HashMap::new(),
            services: HashMap::new(),
        }
    }

    pub fn guard<F>(mut self, name: &str, predicate: F) -> Self
    where
        F: Fn(&C, &Event) -> bool + Send + Sync + 'static,
    {
        self.guards
            .insert(name.to_string(), Guard::new(name, predicate));
        self
    }

    pub fn action<F>(mut self, name: &str, update: F) -> Self
    where
        F: Fn(C, &Event) -> C + Send + Sync + 'static,
    {
        self.actions
            .insert(name.to_string(), Action::new(name, update));
        self
    }

    pub fn service<F>(mut self, name: &str, factory: F) -> Self
    where
        F: Fn(&C, &Event) -> BoxedEffect<DataValue, ServiceError, Env> + Send + Sync + 'static,
    {
        self.services.insert(name.to_string(), Arc::new(factory));
        self
    }

    /// Bind an already shared service, e.g. one wrapped by `with_timeout`.
    pub fn shared_service(mut self, name: &str, service: Service<C, Env>) -> Self {
        self.services.insert(name.to_string(), service);
        self
    }

    /// Validate `definition` against these bindings and compile it.
    pub fn resolve(&self, definition: &MachineDefinition) -> Result<Machine<C, Env>, BuildError> {
        validation::check(validation::validate(definition, self)).map_err(|violations| {
            BuildError::InvalidDefinition {
                machine: definition.id.clone(),
                violations,
            }
        })?;

        self.compile_machine(definition)
    }

    /// Compile without validating the graph. Name lookups still fail fast.
    pub(crate) fn compile_machine(&self, definition: &MachineDefinition) -> Result<Machine<C, Env>, BuildError> {
        let mut states = HashMap::with_capacity(definition.states.len());
        for (id, spec) in &definition.states {
            let mut on = HashMap::new();
            for (kind, candidates) in &spec.on {
                on.insert(*kind, self.compile_all(definition, candidates)?);
            }

            let invoke = match &spec.invoke {
                Some(invoke) => Some(Invocation {
                    service_name: invoke.service.clone(),
                    service: self.lookup_service(definition, &invoke.service)?,
                    on_done: self.compile_all(definition, &invoke.on_done)?,
                    on_error: self.compile_all(definition, &invoke.on_error)?,
                }),
                None => None,
            };

            states.insert(
                id.clone(),
                CompiledState {
                    id: id.clone(),
                    kind: spec.kind,
                    tags: spec.tags.clone(),
                    raise: spec.raise.clone(),
                    invoke,
                    on,
                },
            );
        }

        Ok(Machine {
            id: definition.id.clone(),
            initial: definition.initial.clone(),
            states,
        })
    }

    /// Resolve and wrap in an interpreter with the default classifier.
    pub fn interpreter(&self, definition: &MachineDefinition) -> Result<Interpreter<C, Env>, BuildError> {
        Ok(Interpreter::new(self.resolve(definition)?))
    }

    fn compile_all(
        &self,
        definition: &MachineDefinition,
        candidates: &[TransitionSpec],
    ) -> Result<Vec<Transition<C>>, BuildError> {
        candidates
            .iter()
            .map(|spec| self.compile(definition, spec))
            .collect()
    }

    fn compile(
        &self,
        definition: &MachineDefinition,
        spec: &TransitionSpec,
    ) -> Result<Transition<C>, BuildError> {
        let guard = match &spec.guard {
            Some(name) => Some(
                self.guards
                    .get(name)
                    .cloned()
                    .ok_or_else(|| unresolved(definition, "guard", name))?,
            ),
            None => None,
        };

        let actions = spec
            .actions
            .iter()
            .map(|name| {
                self.actions
                    .get(name)
                    .cloned()
                    .ok_or_else(|| unresolved(definition, "action", name))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Transition {
            target: spec.target.clone(),
            guard,
            actions,
        })
    }

    fn lookup_service(
        &self,
        definition: &MachineDefinition,
        name: &str,
    ) -> Result<Service<C, Env>, BuildError> {
        self.services
            .get(name)
            .cloned()
            .ok_or_else(|| unresolved(definition, "service", name))
    }
}

impl<C: MachineContext, Env: Clone + Send + Sync + 'static> Default for Registry<C, Env> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, Env> Bindings for Registry<C, Env> {
    fn has_guard(&self, name: &str) -> bool {
        self.guards.contains_key(name)
    }

    fn has_action(&self, name: &str) -> bool {
        self.actions.contains_key(name)
    }

    fn has_service(&self, name: &str) -> bool {
        self.services.contains_key(name)
    }
}

// Validation runs first, so these only fire if the two ever disagree.
fn unresolved(definition: &MachineDefinition, what: &str, name: &str) -> BuildError {
    BuildError::InvalidDefinition {
        machine: definition.id.clone(),
        violations: vec![validation::DefinitionViolation::UnresolvedName {
            state: String::from("*"),
            what: what.to_string(),
            name: name.to_string(),
        }],
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{target, InvokeBuilder, MachineBuilder, StateBuilder};
    use crate::validation::DefinitionViolation;
    use serde::{Deserialize, Serialize};
    use stillwater::prelude::*;

    #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
    struct Ctx {
        feedback: Option<String>,
    }

    impl MachineContext for Ctx {
        fn feedback(&self) -> Option<&str> {
            self.feedback.as_deref()
        }

        fn set_feedback(&mut self, feedback: Option<String>) {
            self.feedback = feedback;
        }
    }

    fn definition() -> MachineDefinition {
        MachineBuilder::new("demo")
            .initial("menu")
            .state(
                StateBuilder::new("menu")
                    .transit(target("loading").when("isOption1").act("remember")),
            )
            .state(
                StateBuilder::new("loading").invoke(
                    InvokeBuilder::new("load")
                        .on_done(target("done"))
                        .on_error(target("failed")),
                ),
            )
            .state(StateBuilder::final_state("done"))
            .state(StateBuilder::final_state("failed"))
            .build()
            .unwrap()
    }

    #[test]
    fn missing_bindings_are_all_reported() {
        let registry: Registry<Ctx, ()> = Registry::new();
        let err = registry.resolve(&definition()).err().unwrap();

        let names: Vec<_> = err
            .violations()
            .iter()
            .filter_map(|v| match v {
                DefinitionViolation::UnresolvedName { name, .. } => Some(name.as_str()),
                _ => None,
            })
            .collect();

        assert_eq!(names.len(), 3);
        assert!(names.contains(&"isOption1"));
        assert!(names.contains(&"remember"));
        assert!(names.contains(&"load"));
    }

    #[test]
    fn complete_registry_resolves() {
        let registry: Registry<Ctx, ()> = Registry::new()
            .guard("isOption1", |_: &Ctx, e: &Event| e.input() == "1")
            .action("remember", |c: Ctx, _: &Event| c)
            .service("load", |_: &Ctx, _: &Event| pure(DataValue::success()).boxed());

        let machine = registry.resolve(&definition()).unwrap();

        assert_eq!(machine.id(), "demo");
        assert!(machine.contains("loading"));
        let loading = machine.state("loading").unwrap();
        assert_eq!(loading.invoke.as_ref().unwrap().service_name, "load");
        assert!(!machine.is_terminal("menu"));
        assert!(machine.is_terminal("failed"));
    }
}
