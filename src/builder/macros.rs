//! Macros for ergonomic registry construction.

/// Build a `Registry` from name => function tables.
///
/// Every section is optional; sections appear in the order
/// `guards`, `actions`, `services`.
///
/// # Example
///
/// ```
/// use ussd_flow::core::{Event, MachineContext};
/// use ussd_flow::builder::Registry;
/// use ussd_flow::registry;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// # struct Ctx { feedback: Option<String>, picks: Vec<String> }
/// # impl MachineContext for Ctx {
/// #     fn feedback(&self) -> Option<&str> { self.feedback.as_deref() }
/// #     fn set_feedback(&mut self, feedback: Option<String>) { self.feedback = feedback; }
/// # }
///
/// fn is_option_1(_: &Ctx, event: &Event) -> bool {
///     event.input() == "1"
/// }
///
/// fn save_pick(mut context: Ctx, event: &Event) -> Ctx {
///     context.picks.push(event.input().to_string());
///     context
/// }
///
/// let registry: Registry<Ctx, ()> = registry! {
///     guards: {
///         "isOption1" => is_option_1,
///     },
///     actions: {
///         "savePick" => save_pick,
///     },
/// };
/// # let _ = registry;
/// ```
#[macro_export]
macro_rules! registry {
    (
        $(guards: { $($guard_name:literal => $guard:expr),* $(,)? } $(,)?)?
        $(actions: { $($action_name:literal => $action:expr),* $(,)? } $(,)?)?
        $(services: { $($service_name:literal => $service:expr),* $(,)? } $(,)?)?
    ) => {{
        let registry = $crate::builder::Registry::new();
        $($(let registry = registry.guard($guard_name, $guard);)*)?
        $($(let registry = registry.action($action_name, $action);)*)?
        $($(let registry = registry.service($service_name, $service);)*)?
        registry
    }};
}
