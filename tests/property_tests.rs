//! Property-based tests for the interpreter and session persistence.
//!
//! These tests use proptest to verify properties hold across
//! many randomly generated inputs.

use proptest::prelude::*;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use ussd_flow::builder::{target, MachineBuilder, Registry, StateBuilder};
use ussd_flow::core::{DataValue, Event, EventKind, MachineContext};
use ussd_flow::effects::{Disposition, Interpreter};
use ussd_flow::session::{Codec, MemoryStore, Orchestrator, SessionConfig, SessionStore};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
struct Ctx {
    feedback: Option<String>,
    data: BTreeMap<String, DataValue>,
}

impl MachineContext for Ctx {
    fn feedback(&self) -> Option<&str> {
        self.feedback.as_deref()
    }

    fn set_feedback(&mut self, feedback: Option<String>) {
        self.feedback = feedback;
    }
}

fn interpreter() -> Interpreter<Ctx, ()> {
    let definition = MachineBuilder::new("form")
        .initial("collecting")
        .state(
            StateBuilder::new("collecting")
                .transit(target("confirming").when("isDigits").act("remember"))
                .transit(target("confirming").when("isNonEmpty"))
                .transit(target("invalidEntry")),
        )
        .state(
            StateBuilder::new("invalidEntry")
                .raise_retry("invalidEntry")
                .on(EventKind::Retry, target("collecting")),
        )
        .state(StateBuilder::new("confirming").back(target("collecting")))
        .build()
        .unwrap();

    Registry::new()
        .guard("isDigits", |_: &Ctx, e: &Event| {
            !e.input().is_empty() && e.input().chars().all(|c| c.is_ascii_digit())
        })
        .guard("isNonEmpty", |_: &Ctx, e: &Event| !e.input().is_empty())
        .action("remember", |mut c: Ctx, e: &Event| {
            c.data
                .insert("last".to_string(), DataValue::from(e.input()));
            c
        })
        .interpreter(&definition)
        .unwrap()
}

fn runtime() -> tokio::runtime::Runtime {
    tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .unwrap()
}

fn arbitrary_value() -> impl Strategy<Value = DataValue> {
    let leaf = prop_oneof![
        Just(DataValue::Null),
        any::<bool>().prop_map(DataValue::Bool),
        any::<i64>().prop_map(DataValue::Int),
        "[a-zA-Z ]{0,8}".prop_map(DataValue::Text),
    ];
    leaf.prop_recursive(3, 32, 4, |inner| {
        prop_oneof![
            prop::collection::vec(inner.clone(), 0..4).prop_map(DataValue::List),
            prop::collection::btree_map("[a-z_]{1,8}", inner, 0..4).prop_map(DataValue::Map),
        ]
    })
}

prop_compose! {
    fn arbitrary_context()(
        data in prop::collection::btree_map("[a-z_]{1,8}", arbitrary_value(), 0..4),
        feedback in prop::option::of("[a-zA-Z]{1,12}"),
    ) -> Ctx {
        Ctx { feedback, data }
    }
}

proptest! {
    #[test]
    fn unhandled_event_kind_leaves_session_untouched(
        context in arbitrary_context(),
        input in "[0-9a-z]{0,6}",
    ) {
        let interpreter = interpreter();
        let outcome = runtime().block_on(
            interpreter.step("collecting", context.clone(), Event::back(input), &()),
        );

        prop_assert_eq!(outcome.state_id, "collecting");
        prop_assert_eq!(outcome.context, context);
        prop_assert!(outcome.trace.is_empty());
    }

    #[test]
    fn earlier_candidate_always_wins(digits in "[0-9]{1,6}") {
        // Digit-only input satisfies both isDigits and isNonEmpty.
        let interpreter = interpreter();
        let outcome = runtime().block_on(
            interpreter.step("collecting", Ctx::default(), Event::transit(digits.clone()), &()),
        );

        prop_assert_eq!(outcome.state_id, "confirming");
        prop_assert_eq!(outcome.context.data.get("last"), Some(&DataValue::from(digits.as_str())));
    }

    #[test]
    fn steps_always_come_to_rest(context in arbitrary_context(), input in "[0-9a-z]{0,6}") {
        let interpreter = interpreter();
        let outcome = runtime().block_on(
            interpreter.step("collecting", context, Event::transit(input), &()),
        );

        prop_assert_eq!(outcome.disposition, Disposition::Continue);
        prop_assert!(outcome.trace.raises() <= 1);
        prop_assert_eq!(outcome.trace.path().len(), outcome.trace.hops().len() + 1);
    }

    #[test]
    fn persisted_context_matches_stepped_context(
        context in arbitrary_context(),
        input in "[0-9]{1,4}",
        bincode in any::<bool>(),
    ) {
        let codec = if bincode { Codec::Bincode } else { Codec::Json };
        let store: Arc<dyn SessionStore<Ctx>> = Arc::new(MemoryStore::<Ctx>::new(codec));
        let orchestrator = Orchestrator::new(store, SessionConfig::new("form").with_codec(codec))
            .machine(interpreter());

        let (turn, reloaded) = runtime().block_on(async {
            orchestrator.start("s1", "form", context).await.unwrap();
            let turn = orchestrator.handle("s1", Event::transit(input), &()).await.unwrap();
            let reloaded = orchestrator.load("s1").await.unwrap();
            (turn, reloaded)
        });

        prop_assert_eq!(reloaded.context, turn.session.context);
        prop_assert_eq!(reloaded.state_id, turn.session.state_id);
    }
}
