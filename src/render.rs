//! Display boundary: resulting state to localized text, and transport framing.

use crate::core::MachineContext;
use std::collections::HashMap;
use std::fmt;
use tracing::warn;

/// Maps a resting state to display text. The engine never formats text.
pub trait Renderer<C>: Send + Sync {
    fn render(&self, machine_id: &str, state_id: &str, context: &C) -> String;
}

/// Renderer backed by `"{machine}.{state}"` keyed templates.
///
/// A template may contain `{feedback}`, replaced with the message registered
/// for the context's current feedback tag (or nothing when no tag is set).
/// Any other `{name}` is filled from [`MachineContext::placeholder`]; names
/// the context does not know are left as written.
///
/// # Example
///
/// ```rust
/// use ussd_flow::render::{Renderer, TemplateRenderer};
/// # use ussd_flow::core::MachineContext;
/// # use serde::{Deserialize, Serialize};
/// # #[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
/// # struct Ctx { feedback: Option<String> }
/// # impl MachineContext for Ctx {
/// #     fn feedback(&self) -> Option<&str> { self.feedback.as_deref() }
/// #     fn set_feedback(&mut self, feedback: Option<String>) { self.feedback = feedback; }
/// # }
///
/// let renderer = TemplateRenderer::new()
///     .template("languages", "firstLanguageSet", "{feedback}Select language:\n1. English")
///     .feedback("invalidLanguage", "Invalid option. ");
///
/// let ctx = Ctx { feedback: Some("invalidLanguage".to_string()) };
/// assert_eq!(
///     renderer.render("languages", "firstLanguageSet", &ctx),
///     "Invalid option. Select language:\n1. English"
/// );
/// ```
#[derive(Clone, Debug, Default)]
pub struct TemplateRenderer {
    templates: HashMap<String, String>,
    feedback: HashMap<String, String>,
    fallback: String,
}

impl TemplateRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn template(mut self, machine_id: &str, state_id: &str, text: impl Into<String>) -> Self {
        self.templates
            .insert(format!("{machine_id}.{state_id}"), text.into());
        self
    }

    pub fn feedback(mut self, tag: &str, text: impl Into<String>) -> Self {
        self.feedback.insert(tag.to_string(), text.into());
        self
    }

    /// Text used when no template exists for a state.
    pub fn fallback(mut self, text: impl Into<String>) -> Self {
        self.fallback = text.into();
        self
    }
}

impl<C: MachineContext> Renderer<C> for TemplateRenderer {
    fn render(&self, machine_id: &str, state_id: &str, context: &C) -> String {
        let key = format!("{machine_id}.{state_id}");
        let Some(template) = self.templates.get(&key) else {
            warn!(machine = machine_id, state = state_id, "no template for state");
            return self.fallback.clone();
        };

        let feedback = context
            .feedback()
            .and_then(|tag| self.feedback.get(tag))
            .map(String::as_str)
            .unwrap_or_default();

        interpolate(template, |name| match name {
            "feedback" => Some(feedback.to_string()),
            _ => context.placeholder(name),
        })
    }
}

/// Replace each `{name}` with its value. Unknown names are left in place.
fn interpolate(template: &str, value: impl Fn(&str) -> Option<String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let Some(close) = after.find('}') else {
            out.push_str(&rest[open..]);
            return out;
        };

        let name = &after[..close];
        match value(name) {
            Some(text) => out.push_str(&text),
            None => {
                out.push('{');
                out.push_str(name);
                out.push('}');
            }
        }
        rest = &after[close + 1..];
    }

    out.push_str(rest);
    out
}

/// One transport response.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    /// Whether the session ends with this response.
    pub terminate: bool,
}

impl Reply {
    pub fn con(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            terminate: false,
        }
    }

    pub fn end(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            terminate: true,
        }
    }
}

impl fmt::Display for Reply {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let prefix = if self.terminate { "END" } else { "CON" };
        write!(f, "{prefix} {}", self.text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::{Deserialize, Serialize};

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

        fn placeholder(&self, name: &str) -> Option<String> {
            match name {
                "recipient" => Some("+254700000002".to_string()),
                "symbol" => Some("SRF".to_string()),
                _ => None,
            }
        }
    }

    #[test]
    fn feedback_placeholder_is_empty_without_tag() {
        let renderer = TemplateRenderer::new().template("m", "s", "{feedback}Enter PIN");
        assert_eq!(renderer.render("m", "s", &Ctx::default()), "Enter PIN");
    }

    #[test]
    fn context_values_fill_placeholders() {
        let renderer = TemplateRenderer::new()
            .template("transfer", "confirm", "{feedback}{recipient} will receive {amount} {symbol}")
            .feedback("invalidPin", "Wrong PIN. ");
        let ctx = Ctx {
            feedback: Some("invalidPin".to_string()),
        };

        assert_eq!(
            renderer.render("transfer", "confirm", &ctx),
            "Wrong PIN. +254700000002 will receive {amount} SRF"
        );
    }

    #[test]
    fn unclosed_brace_is_kept() {
        let renderer = TemplateRenderer::new().template("m", "s", "Send {symbol to {recipient");
        assert_eq!(renderer.render("m", "s", &Ctx::default()), "Send {symbol to {recipient");
    }

    #[test]
    fn unknown_state_uses_fallback() {
        let renderer = TemplateRenderer::new().fallback("Service unavailable");
        assert_eq!(
            Renderer::<Ctx>::render(&renderer, "m", "missing", &Ctx::default()),
            "Service unavailable"
        );
    }

    #[test]
    fn replies_are_framed() {
        assert_eq!(Reply::con("Menu").to_string(), "CON Menu");
        assert_eq!(Reply::end("Bye").to_string(), "END Bye");
    }
}
