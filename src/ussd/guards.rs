//! Guards and actions shared by every USSD menu.

use crate::builder::Registry;
use crate::core::{DataValue, Event};
use crate::ussd::context::UssdContext;
use crate::ussd::resources::Resources;

/// Menu options bound as `isOption{key}` in every registry.
pub const MENU_OPTIONS: &[&str] = &["1", "2", "3", "4", "5", "6", "9", "00", "11", "22"];

/// Guard matching one literal menu option.
pub fn option(choice: &'static str) -> impl Fn(&UssdContext, &Event) -> bool + Send + Sync + 'static {
    move |_: &UssdContext, event: &Event| event.input() == choice
}

/// Guard matching a classified failure code.
pub fn has_code(code: &'static str) -> impl Fn(&UssdContext, &Event) -> bool + Send + Sync + 'static {
    move |_: &UssdContext, event: &Event| event.failure().is_some_and(|f| f.code == code)
}

pub fn is_success(_: &UssdContext, event: &Event) -> bool {
    event.output().is_some_and(DataValue::is_success)
}

/// Account blocked either on record or by the failure being routed.
pub fn is_blocked(context: &UssdContext, event: &Event) -> bool {
    context.is_blocked() || event.failure().is_some_and(|f| f.blocked)
}

pub fn update_error_messages(mut context: UssdContext, event: &Event) -> UssdContext {
    if let Some(failure) = event.failure() {
        context.errors.push(failure.detail.clone());
    }
    context
}

/// Bind the shared guards and actions.
pub fn common(registry: Registry<UssdContext, Resources>) -> Registry<UssdContext, Resources> {
    let registry = MENU_OPTIONS.iter().fold(registry, |registry, &choice| {
        registry.guard(&format!("isOption{choice}"), option(choice))
    });

    registry
        .guard("isSuccess", is_success)
        .guard("isBlocked", is_blocked)
        .action("updateErrorMessages", update_error_messages)
}
