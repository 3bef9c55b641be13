//! Error types for the engine core.
//!
//! Setup-time problems (missing component fields, unknown animation keys,
//! duplicate scene or system names) surface as [`EngineError`] and are meant to
//! be fatal: they point at a content or configuration bug. Per-frame failures
//! inside event handlers are also expressed as [`EngineError`] but the
//! [`EventBus`](crate::events::bus::EventBus) catches and logs them instead of
//! propagating.
//!
//! ## Display vs. Debug
//! * [`fmt::Display`] is short and names the offending entity, kind or field.
//! * [`fmt::Debug`] (derived) keeps the full structure for diagnostics.

use std::fmt;

use crate::components::ComponentKind;
use crate::components::animation::AnimationAction;
use crate::world::EntityId;

/// Convenience alias used across the crate.
pub type EngineResult<T> = Result<T, EngineError>;

/// What was wrong with a template field.
#[derive(Debug, Clone, PartialEq)]
pub enum TemplateProblem {
    /// A required field was absent from the attribute dictionary.
    Missing,
    /// The field was present but could not be parsed; carries the raw value.
    Invalid(String),
    /// The component name itself is not one the engine knows how to build.
    UnknownComponent,
}

/// Raised when an entity template cannot be turned into components.
///
/// ### Fields
/// * `entity` - the template's entity name, as written in the scene data.
/// * `component` - the component section being built.
/// * `field` - the attribute that failed (empty for [`TemplateProblem::UnknownComponent`]).
#[derive(Debug, Clone, PartialEq)]
pub struct TemplateError {
    pub entity: String,
    pub component: String,
    pub field: String,
    pub problem: TemplateProblem,
}

impl TemplateError {
    pub fn missing(entity: &str, component: &str, field: &str) -> Self {
        Self {
            entity: entity.to_string(),
            component: component.to_string(),
            field: field.to_string(),
            problem: TemplateProblem::Missing,
        }
    }

    pub fn invalid(entity: &str, component: &str, field: &str, value: &str) -> Self {
        Self {
            entity: entity.to_string(),
            component: component.to_string(),
            field: field.to_string(),
            problem: TemplateProblem::Invalid(value.to_string()),
        }
    }

    pub fn unknown_component(entity: &str, component: &str) -> Self {
        Self {
            entity: entity.to_string(),
            component: component.to_string(),
            field: String::new(),
            problem: TemplateProblem::UnknownComponent,
        }
    }
}

impl fmt::Display for TemplateError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.problem {
            TemplateProblem::Missing => write!(
                f,
                "entity '{}': component '{}' is missing required field '{}'",
                self.entity, self.component, self.field
            ),
            TemplateProblem::Invalid(value) => write!(
                f,
                "entity '{}': component '{}' has invalid value '{}' for field '{}'",
                self.entity, self.component, value, self.field
            ),
            TemplateProblem::UnknownComponent => write!(
                f,
                "entity '{}': unknown component '{}'",
                self.entity, self.component
            ),
        }
    }
}

impl std::error::Error for TemplateError {}

/// Crate-wide error.
#[derive(Debug, Clone, PartialEq)]
pub enum EngineError {
    /// `get_component` was called on an entity lacking that kind. Always a
    /// caller bug: guard with `has_component` first.
    ComponentNotFound { entity: EntityId, kind: ComponentKind },
    /// `set_animation` was given an action the entity has no clip for.
    AnimationStateNotFound {
        entity: EntityId,
        action: AnimationAction,
    },
    /// Two scenes or systems registered under the same name.
    DuplicateRegistration { what: &'static str, name: String },
    /// An event handler failed. Only ever logged by the bus.
    HandlerFailure { event: &'static str, message: String },
    /// The id names no live entity. Callers treat this as a no-op.
    InvalidEntityReference(EntityId),
    /// A scene name that was never registered.
    UnknownScene(String),
    /// Entity template data was malformed.
    Template(TemplateError),
    /// Configuration file could not be read, parsed or written.
    Config(String),
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            EngineError::ComponentNotFound { entity, kind } => {
                write!(f, "entity {entity} has no {kind:?} component")
            }
            EngineError::AnimationStateNotFound { entity, action } => {
                write!(f, "entity {entity} has no animation clip for {action:?}")
            }
            EngineError::DuplicateRegistration { what, name } => {
                write!(f, "{what} '{name}' is already registered")
            }
            EngineError::HandlerFailure { event, message } => {
                write!(f, "handler for {event} failed: {message}")
            }
            EngineError::InvalidEntityReference(entity) => {
                write!(f, "entity {entity} does not exist")
            }
            EngineError::UnknownScene(name) => write!(f, "scene '{name}' is not registered"),
            EngineError::Template(err) => write!(f, "{err}"),
            EngineError::Config(msg) => write!(f, "configuration error: {msg}"),
        }
    }
}

impl std::error::Error for EngineError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            EngineError::Template(err) => Some(err),
            _ => None,
        }
    }
}

impl From<TemplateError> for EngineError {
    fn from(err: TemplateError) -> Self {
        EngineError::Template(err)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn template_error_names_entity_component_and_field() {
        let err = TemplateError::missing("player", "collider", "width");
        let msg = err.to_string();
        assert!(msg.contains("player"));
        assert!(msg.contains("collider"));
        assert!(msg.contains("width"));
    }

    #[test]
    fn template_error_reports_bad_value() {
        let err = TemplateError::invalid("wall", "rigidbody", "mass", "heavy");
        assert!(err.to_string().contains("'heavy'"));
    }

    #[test]
    fn engine_error_wraps_template_error_as_source() {
        let err: EngineError = TemplateError::unknown_component("door", "hinge").into();
        assert!(std::error::Error::source(&err).is_some());
        assert!(err.to_string().contains("hinge"));
    }

    #[test]
    fn duplicate_registration_message() {
        let err = EngineError::DuplicateRegistration {
            what: "scene",
            name: "menu".into(),
        };
        assert_eq!(err.to_string(), "scene 'menu' is already registered");
    }
}
