//! Builders for states and their invocations.

use crate::builder::error::BuildError;
use crate::builder::transition::TransitionBuilder;
use crate::core::{EventKind, InvokeSpec, Raise, StateKind, StateSpec, Tag, TransitionSpec};

/// Builder for a service invocation and its outcome routing.
#[derive(Clone, Debug)]
pub struct InvokeBuilder {
    service: String,
    on_done: Vec<TransitionBuilder>,
    on_error: Vec<TransitionBuilder>,
}

impl InvokeBuilder {
    pub fn new(service: impl Into<String>) -> Self {
        Self {
            service: service.into(),
            on_done: Vec::new(),
            on_error: Vec::new(),
        }
    }

    /// Append a success candidate. Evaluated in insertion order.
    pub fn on_done(mut self, transition: TransitionBuilder) -> Self {
        self.on_done.push(transition);
        self
    }

    /// Append a failure candidate. Evaluated in insertion order.
    pub fn on_error(mut self, transition: TransitionBuilder) -> Self {
        self.on_error.push(transition);
        self
    }

    pub fn build(self) -> Result<InvokeSpec, BuildError> {
        Ok(InvokeSpec {
            service: self.service,
            on_done: build_all(self.on_done)?,
            on_error: build_all(self.on_error)?,
        })
    }
}

/// Builder for one state.
///
/// # Example
///
/// ```
/// use ussd_flow::builder::{target, StateBuilder};
/// use ussd_flow::core::EventKind;
///
/// let (id, spec) = StateBuilder::new("invalidLanguageOption")
///     .raise_retry("invalidLanguage")
///     .on(EventKind::Retry, target("firstLanguageSet"))
///     .build()
///     .unwrap();
///
/// assert_eq!(id, "invalidLanguageOption");
/// assert_eq!(spec.candidates(EventKind::Retry)[0].target, "firstLanguageSet");
/// ```
#[derive(Clone, Debug)]
pub struct StateBuilder {
    id: String,
    kind: StateKind,
    description: Option<String>,
    tags: Vec<Tag>,
    raise: Option<Raise>,
    invoke: Option<InvokeBuilder>,
    on: Vec<(EventKind, TransitionBuilder)>,
}

impl StateBuilder {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: StateKind::Normal,
            description: None,
            tags: Vec::new(),
            raise: None,
            invoke: None,
            on: Vec::new(),
        }
    }

    /// A state that ends stepping for the turn.
    pub fn final_state(id: impl Into<String>) -> Self {
        let mut builder = Self::new(id);
        builder.kind = StateKind::Final;
        builder
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }

    pub fn tag(mut self, tag: Tag) -> Self {
        if !self.tags.contains(&tag) {
            self.tags.push(tag);
        }
        self
    }

    /// Append a candidate for `kind`. Candidates keep insertion order.
    pub fn on(mut self, kind: EventKind, transition: TransitionBuilder) -> Self {
        self.on.push((kind, transition));
        self
    }

    pub fn transit(self, transition: TransitionBuilder) -> Self {
        self.on(EventKind::Transit, transition)
    }

    pub fn back(self, transition: TransitionBuilder) -> Self {
        self.on(EventKind::Back, transition)
    }

    /// Raise `kind` unconditionally on entry.
    pub fn raise(mut self, kind: EventKind, feedback: Option<String>) -> Self {
        self.raise = Some(Raise { kind, feedback });
        self
    }

    /// Raise `RETRY` on entry with a feedback tag for the renderer.
    pub fn raise_retry(self, feedback: impl Into<String>) -> Self {
        self.raise(EventKind::Retry, Some(feedback.into()))
    }

    pub fn invoke(mut self, invoke: InvokeBuilder) -> Self {
        self.invoke = Some(invoke);
        self
    }

    pub fn build(self) -> Result<(String, StateSpec), BuildError> {
        let mut spec = StateSpec {
            kind: self.kind,
            description: self.description,
            tags: self.tags,
            raise: self.raise,
            invoke: self.invoke.map(InvokeBuilder::build).transpose()?,
            ..StateSpec::default()
        };

        for (kind, transition) in self.on {
            spec.on.entry(kind).or_default().push(transition.build()?);
        }

        Ok((self.id, spec))
    }
}

fn build_all(builders: Vec<TransitionBuilder>) -> Result<Vec<TransitionSpec>, BuildError> {
    builders.into_iter().map(TransitionBuilder::build).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::builder::transition::target;

    #[test]
    fn candidates_group_by_kind_in_order() {
        let (_, spec) = StateBuilder::new("firstLanguageSet")
            .transit(target("enteringPin").when("isValidLanguageOption"))
            .back(target("settingsMenu"))
            .transit(target("secondLanguageSet").when("isOption11"))
            .transit(target("invalidLanguageOption"))
            .build()
            .unwrap();

        let transit: Vec<_> = spec
            .candidates(EventKind::Transit)
            .iter()
            .map(|t| t.target.as_str())
            .collect();
        assert_eq!(
            transit,
            vec!["enteringPin", "secondLanguageSet", "invalidLanguageOption"]
        );
        assert_eq!(spec.candidates(EventKind::Back).len(), 1);
    }

    #[test]
    fn final_state_with_tags() {
        let (_, spec) = StateBuilder::final_state("changeError")
            .tag(Tag::Error)
            .tag(Tag::Error)
            .describe("Language change failed.")
            .build()
            .unwrap();

        assert!(spec.is_final());
        assert_eq!(spec.tags, vec![Tag::Error]);
        assert_eq!(spec.description.as_deref(), Some("Language change failed."));
    }

    #[test]
    fn invoke_routes_are_built() {
        let (_, spec) = StateBuilder::new("authorizingLanguageChange")
            .tag(Tag::Invoked)
            .invoke(
                InvokeBuilder::new("initiateLanguageChange")
                    .on_done(target("changeSuccess").when("isSuccess"))
                    .on_error(target("accountBlocked").when("isBlocked"))
                    .on_error(target("changeError").when("isChangeError")),
            )
            .build()
            .unwrap();

        let invoke = spec.invoke.unwrap();
        assert_eq!(invoke.service, "initiateLanguageChange");
        assert_eq!(invoke.on_done.len(), 1);
        assert_eq!(invoke.on_error[0].target, "accountBlocked");
        assert_eq!(invoke.on_error[1].target, "changeError");
    }

    #[test]
    fn invalid_candidate_fails_the_state() {
        let result = StateBuilder::new("menu")
            .transit(TransitionBuilder::new().when("isOption1"))
            .build();

        assert!(matches!(result, Err(BuildError::MissingTarget)));
    }
}
