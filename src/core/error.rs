//! Error types for pipeline loading and plan resolution

use thiserror::Error;

/// Malformed or inconsistent pipeline document.
///
/// Raised while loading; no plan is produced. Every structural variant
/// carries a `location` naming the stage, job or template at fault.
#[derive(Debug, Error)]
pub enum SpecError {
    #[error("Failed to parse pipeline document: {0}")]
    Yaml(#[from] serde_yaml::Error),

    #[error("Duplicate stage position {position}: '{first}' and '{second}'")]
    DuplicateStagePosition {
        position: u32,
        first: String,
        second: String,
    },

    #[error("Duplicate stage name '{0}'")]
    DuplicateStageName(String),

    #[error("{location}: duplicate job name '{job}'")]
    DuplicateJobName { location: String, job: String },

    #[error("{location}: invalid matrix: {message}")]
    InvalidMatrix { location: String, message: String },

    #[error("{location}: matrix axis '{axis}' has no values")]
    EmptyAxis { location: String, axis: String },

    #[error("max_parallel must be at least 1")]
    InvalidMaxParallel,

    #[error("{location}: matrix axis '{axis}' is declared more than once")]
    DuplicateAxis { location: String, axis: String },

    #[error("{location}: value '{value}' appears more than once on matrix axis '{axis}'")]
    DuplicateAxisValue {
        location: String,
        axis: String,
        value: String,
    },

    #[error("{location}: unknown matrix axis '{axis}'")]
    UnknownAxis { location: String, axis: String },

    #[error("{location}: value '{value}' is not declared on matrix axis '{axis}'")]
    UnknownAxisValue {
        location: String,
        axis: String,
        value: String,
    },

    #[error("{location}: empty axis match would select every matrix cell")]
    EmptyAxisMatch { location: String },

    #[error("{location}: unknown context field '{field}'")]
    UnknownField { location: String, field: String },

    #[error("{location}: field '{field}' expects {expected}, got '{value}'")]
    InvalidLiteral {
        location: String,
        field: String,
        expected: &'static str,
        value: String,
    },

    #[error("{location}: invalid pattern '{pattern}': {source}")]
    InvalidPattern {
        location: String,
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error("{location}: deploy template '{name}' is not defined")]
    UnknownDeployTemplate { location: String, name: String },

    #[error("{location}: composition base '{base}' is not defined")]
    DanglingComposition { location: String, base: String },
}

/// A deploy clause whose composition chain cannot be resolved.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CompositionError {
    #[error("{location}: composition cycle {}", chain.join(" -> "))]
    Cycle { location: String, chain: Vec<String> },

    #[error("{location}: composition base '{base}' is not defined")]
    MissingBase { location: String, base: String },

    #[error("{location}: composed clause has no provider")]
    MissingProvider { location: String },
}

/// Anything that prevents a complete plan from being produced.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error(transparent)]
    Spec(#[from] SpecError),

    #[error(transparent)]
    Composition(#[from] CompositionError),
}

/// Trigger facts that could not be read.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ContextError {
    #[error("Unknown event type '{0}' (expected push, pull_request, schedule or api)")]
    UnknownEventType(String),

    #[error("Missing trigger variable {0}")]
    MissingVariable(&'static str),
}
