//! Definition checks, accumulated with `Validation`.

use crate::core::{MachineDefinition, StateSpec, TransitionSpec};
use crate::validation::violations::DefinitionViolation;
use std::collections::{BTreeMap, HashMap};
use stillwater::validation::Validation;
use stillwater::NonEmptyVec;

/// Result of a definition check: success, or every violation found.
pub type Checked = Validation<(), NonEmptyVec<DefinitionViolation>>;

/// Lookup of the names a registry can bind.
pub trait Bindings {
    fn has_guard(&self, name: &str) -> bool;
    fn has_action(&self, name: &str) -> bool;
    fn has_service(&self, name: &str) -> bool;
}

/// Check the graph's shape, independent of any bindings.
pub fn validate_structure(definition: &MachineDefinition) -> Checked {
    let mut violations = Vec::new();

    if !definition.states.contains_key(&definition.initial) {
        violations.push(DefinitionViolation::MissingInitial {
            initial: definition.initial.clone(),
        });
    }

    for (id, spec) in &definition.states {
        check_targets(definition, id, spec, &mut violations);
        check_final(id, spec, &mut violations);
        check_raise(id, spec, &mut violations);
        check_invoke(id, spec, &mut violations);
    }

    if let Some(cycle) = find_unbounded_chain(definition) {
        violations.push(DefinitionViolation::UnboundedChain { cycle });
    }

    accumulate(violations)
}

/// Check structure and that every referenced name is bound.
pub fn validate<B: Bindings + ?Sized>(definition: &MachineDefinition, bindings: &B) -> Checked {
    let mut violations = Vec::new();

    for (id, spec) in &definition.states {
        for transition in spec.all_transitions() {
            if let Some(guard) = &transition.guard {
                if !bindings.has_guard(guard) {
                    violations.push(unresolved(id, "guard", guard));
                }
            }
            for action in &transition.actions {
                if !bindings.has_action(action) {
                    violations.push(unresolved(id, "action", action));
                }
            }
        }
        if let Some(invoke) = &spec.invoke {
            if !bindings.has_service(&invoke.service) {
                violations.push(unresolved(id, "service", &invoke.service));
            }
        }
    }

    Validation::all_vec(vec![validate_structure(definition), accumulate(violations)]).map(|_| ())
}

/// Collapse a check into a plain result listing every violation.
pub fn check(validation: Checked) -> Result<(), Vec<DefinitionViolation>> {
    match validation {
        Validation::Success(_) => Ok(()),
        Validation::Failure(errors) => Err(errors.iter().cloned().collect()),
    }
}

fn accumulate(violations: Vec<DefinitionViolation>) -> Checked {
    if violations.is_empty() {
        return Validation::success(());
    }

    let checks: Vec<Checked> = violations.into_iter().map(Validation::fail).collect();
    Validation::all_vec(checks).map(|_| ())
}

fn unresolved(state: &str, what: &str, name: &str) -> DefinitionViolation {
    DefinitionViolation::UnresolvedName {
        state: state.to_string(),
        what: what.to_string(),
        name: name.to_string(),
    }
}

fn check_targets(
    definition: &MachineDefinition,
    id: &str,
    spec: &StateSpec,
    violations: &mut Vec<DefinitionViolation>,
) {
    for transition in spec.all_transitions() {
        if !definition.states.contains_key(&transition.target) {
            violations.push(DefinitionViolation::UnknownTarget {
                state: id.to_string(),
                target: transition.target.clone(),
            });
        }
    }
}

fn check_final(id: &str, spec: &StateSpec, violations: &mut Vec<DefinitionViolation>) {
    if !spec.is_final() {
        return;
    }
    if spec.on.values().any(|candidates| !candidates.is_empty()) {
        violations.push(DefinitionViolation::FinalWithTransitions {
            state: id.to_string(),
        });
    }
    if spec.raise.is_some() || spec.invoke.is_some() {
        violations.push(DefinitionViolation::FinalWithEffects {
            state: id.to_string(),
        });
    }
}

fn check_raise(id: &str, spec: &StateSpec, violations: &mut Vec<DefinitionViolation>) {
    let Some(raise) = &spec.raise else {
        return;
    };
    let candidates = spec.candidates(raise.kind);
    if candidates.is_empty() {
        violations.push(DefinitionViolation::UnhandledRaise {
            state: id.to_string(),
            kind: raise.kind,
        });
    } else if candidates.iter().all(|t| t.guard.is_some()) {
        violations.push(DefinitionViolation::RaiseWithoutFallback {
            state: id.to_string(),
            kind: raise.kind,
        });
    }
    if spec.invoke.is_some() {
        violations.push(DefinitionViolation::RaiseAndInvoke {
            state: id.to_string(),
        });
    }
}

fn check_invoke(id: &str, spec: &StateSpec, violations: &mut Vec<DefinitionViolation>) {
    let Some(invoke) = &spec.invoke else {
        return;
    };
    if invoke.on_done.is_empty() {
        violations.push(DefinitionViolation::MissingDoneRoute {
            state: id.to_string(),
            service: invoke.service.clone(),
        });
    }
    if invoke.on_error.is_empty() {
        violations.push(DefinitionViolation::MissingErrorRoute {
            state: id.to_string(),
            service: invoke.service.clone(),
        });
    }
}

#[derive(Clone, Copy, PartialEq)]
enum Mark {
    Active,
    Done,
}

/// Find a cycle of states that step on their own (entry raises and
/// invocations), which would never wait for input.
fn find_unbounded_chain(definition: &MachineDefinition) -> Option<Vec<String>> {
    let stepping = |id: &str| {
        definition
            .state(id)
            .is_some_and(|s| (s.raise.is_some() || s.invoke.is_some()) && !s.is_final())
    };

    let mut edges: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for (id, spec) in &definition.states {
        let routes: Vec<&TransitionSpec> = match (&spec.raise, &spec.invoke) {
            (Some(raise), _) => spec.candidates(raise.kind).iter().collect(),
            (None, Some(invoke)) => invoke.on_done.iter().chain(&invoke.on_error).collect(),
            (None, None) => continue,
        };
        let next = routes
            .into_iter()
            .map(|t| t.target.as_str())
            .filter(|target| stepping(target))
            .collect();
        edges.insert(id.as_str(), next);
    }

    let mut marks = HashMap::new();
    let mut stack = Vec::new();
    for start in edges.keys() {
        if let Some(cycle) = visit(start, &edges, &mut marks, &mut stack) {
            return Some(cycle);
        }
    }
    None
}

fn visit<'a>(
    node: &'a str,
    edges: &BTreeMap<&'a str, Vec<&'a str>>,
    marks: &mut HashMap<&'a str, Mark>,
    stack: &mut Vec<&'a str>,
) -> Option<Vec<String>> {
    match marks.get(node) {
        Some(Mark::Done) => return None,
        Some(Mark::Active) => {
            let start = stack.iter().position(|n| *n == node)?;
            let mut cycle: Vec<String> = stack[start..].iter().map(|n| n.to_string()).collect();
            cycle.push(node.to_string());
            return Some(cycle);
        }
        None => {}
    }

    marks.insert(node, Mark::Active);
    stack.push(node);
    for next in edges.get(node).into_iter().flatten() {
        if let Some(cycle) = visit(next, edges, marks, stack) {
            return Some(cycle);
        }
    }
    stack.pop();
    marks.insert(node, Mark::Done);
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::{target, InvokeBuilder, MachineBuilder, StateBuilder};
    use crate::core::{EventKind, Raise, StateKind};
    use std::collections::BTreeMap;

    struct Names(&'static [&'static str]);

    impl Bindings for Names {
        fn has_guard(&self, name: &str) -> bool {
            self.0.contains(&name)
        }

        fn has_action(&self, name: &str) -> bool {
            self.0.contains(&name)
        }

        fn has_service(&self, name: &str) -> bool {
            self.0.contains(&name)
        }
    }

    fn raw(initial: &str, states: Vec<(&str, StateSpec)>) -> MachineDefinition {
        MachineDefinition {
            id: "raw".to_string(),
            initial: initial.to_string(),
            states: states
                .into_iter()
                .map(|(id, spec)| (id.to_string(), spec))
                .collect::<BTreeMap<_, _>>(),
        }
    }

    fn retry_to(target_id: &str) -> StateSpec {
        let (_, spec) = StateBuilder::new("tmp")
            .raise_retry("again")
            .on(EventKind::Retry, target(target_id))
            .build()
            .unwrap();
        spec
    }

    fn violations(checked: Checked) -> Vec<DefinitionViolation> {
        check(checked).err().unwrap_or_default()
    }

    #[test]
    fn well_formed_definition_passes() {
        let definition = MachineBuilder::new("ok")
            .initial("menu")
            .state(StateBuilder::new("menu").transit(target("invalid")))
            .state(
                StateBuilder::new("invalid")
                    .raise_retry("invalidOption")
                    .on(EventKind::Retry, target("menu")),
            )
            .build()
            .unwrap();

        assert!(validate_structure(&definition).is_success());
    }

    #[test]
    fn final_states_must_not_continue() {
        let mut spec = retry_to("menu");
        spec.kind = StateKind::Final;
        let definition = raw("menu", vec![("menu", StateSpec::default()), ("done", spec)]);

        let found = violations(validate_structure(&definition));

        assert!(found.contains(&DefinitionViolation::FinalWithTransitions {
            state: "done".to_string()
        }));
        assert!(found.contains(&DefinitionViolation::FinalWithEffects {
            state: "done".to_string()
        }));
    }

    #[test]
    fn raise_without_handler_is_reported() {
        let spec = StateSpec {
            raise: Some(Raise {
                kind: EventKind::Retry,
                feedback: None,
            }),
            ..StateSpec::default()
        };
        let definition = raw("lost", vec![("lost", spec)]);

        let found = violations(validate_structure(&definition));

        assert_eq!(
            found,
            vec![DefinitionViolation::UnhandledRaise {
                state: "lost".to_string(),
                kind: EventKind::Retry
            }]
        );
    }

    #[test]
    fn raise_only_cycles_are_unbounded() {
        let definition = raw(
            "a",
            vec![("a", retry_to("b")), ("b", retry_to("c")), ("c", retry_to("a"))],
        );

        let found = violations(validate_structure(&definition));

        assert!(found.iter().any(|v| matches!(
            v,
            DefinitionViolation::UnboundedChain { cycle } if cycle.len() == 4
        )));
    }

    #[test]
    fn invocation_looping_onto_itself_is_unbounded() {
        let (_, loading) = StateBuilder::new("loading")
            .invoke(
                InvokeBuilder::new("load")
                    .on_done(target("loading"))
                    .on_error(target("menu")),
            )
            .build()
            .unwrap();
        let (_, menu) = StateBuilder::new("menu").transit(target("loading")).build().unwrap();
        let definition = raw("menu", vec![("menu", menu), ("loading", loading)]);

        let found = violations(validate_structure(&definition));

        assert_eq!(
            found,
            vec![DefinitionViolation::UnboundedChain {
                cycle: vec!["loading".to_string(), "loading".to_string()]
            }]
        );
    }

    #[test]
    fn invocation_retrying_through_raise_is_unbounded() {
        let (_, loading) = StateBuilder::new("loading")
            .invoke(
                InvokeBuilder::new("load")
                    .on_done(target("menu"))
                    .on_error(target("failed")),
            )
            .build()
            .unwrap();
        let (_, menu) = StateBuilder::new("menu").transit(target("loading")).build().unwrap();
        let definition = raw(
            "menu",
            vec![("menu", menu), ("loading", loading), ("failed", retry_to("loading"))],
        );

        let found = violations(validate_structure(&definition));

        assert!(found
            .iter()
            .any(|v| matches!(v, DefinitionViolation::UnboundedChain { cycle } if cycle.len() == 3)));
    }

    #[test]
    fn guarded_raise_needs_a_fallback() {
        let (_, invalid) = StateBuilder::new("invalid")
            .raise_retry("again")
            .on(EventKind::Retry, target("menu").when("isRetryable"))
            .build()
            .unwrap();
        let definition = raw("menu", vec![("menu", StateSpec::default()), ("invalid", invalid)]);

        let found = violations(validate_structure(&definition));

        assert_eq!(
            found,
            vec![DefinitionViolation::RaiseWithoutFallback {
                state: "invalid".to_string(),
                kind: EventKind::Retry
            }]
        );
    }

    #[test]
    fn raise_chain_ending_at_input_state_is_bounded() {
        let definition = raw(
            "input",
            vec![
                ("input", StateSpec::default()),
                ("first", retry_to("second")),
                ("second", retry_to("input")),
            ],
        );

        assert!(validate_structure(&definition).is_success());
    }

    #[test]
    fn invocations_need_both_routes() {
        let definition = MachineBuilder::new("demo")
            .initial("loading")
            .state(StateBuilder::new("loading").invoke(InvokeBuilder::new("load")));

        let err = definition.build().unwrap_err();
        assert_eq!(err.violations().len(), 2);
    }

    #[test]
    fn bindings_are_checked_per_state() {
        let definition = MachineBuilder::new("demo")
            .initial("menu")
            .state(
                StateBuilder::new("menu")
                    .transit(target("exit").when("isOption9").act("clear")),
            )
            .state(StateBuilder::final_state("exit"))
            .build()
            .unwrap();

        let found = violations(validate(&definition, &Names(&["isOption9"])));

        assert_eq!(
            found,
            vec![DefinitionViolation::UnresolvedName {
                state: "menu".to_string(),
                what: "action".to_string(),
                name: "clear".to_string(),
            }]
        );
        assert!(validate(&definition, &Names(&["isOption9", "clear"])).is_success());
    }
}
