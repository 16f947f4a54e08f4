//! Condition model - a closed predicate language over the execution context

use crate::core::{
    config::ConditionConfig,
    context::{EventType, ExecutionContext},
    env::Scalar,
    error::SpecError,
};
use regex::Regex;
use std::fmt;
use std::str::FromStr;

/// Fields of the execution context a condition may reference
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContextField {
    Branch,
    TagPresent,
    TagName,
    EventType,
    IsPullRequest,
    Repository,
}

/// Type of a context field, used to validate literals at load time
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FieldKind {
    Text,
    Flag,
    Event,
}

impl ContextField {
    pub const ALL: [ContextField; 6] = [
        ContextField::Branch,
        ContextField::TagPresent,
        ContextField::TagName,
        ContextField::EventType,
        ContextField::IsPullRequest,
        ContextField::Repository,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ContextField::Branch => "branch",
            ContextField::TagPresent => "tag_present",
            ContextField::TagName => "tag_name",
            ContextField::EventType => "event_type",
            ContextField::IsPullRequest => "is_pull_request",
            ContextField::Repository => "repository",
        }
    }

    fn kind(&self) -> FieldKind {
        match self {
            ContextField::Branch | ContextField::TagName | ContextField::Repository => {
                FieldKind::Text
            }
            ContextField::TagPresent | ContextField::IsPullRequest => FieldKind::Flag,
            ContextField::EventType => FieldKind::Event,
        }
    }

    /// Read the field from a context. `None` only for `tag_name` without a tag.
    fn read<'a>(&self, ctx: &'a ExecutionContext) -> Option<Literal<'a>> {
        match self {
            ContextField::Branch => Some(Literal::Text(&ctx.branch)),
            ContextField::TagPresent => Some(Literal::Flag(ctx.tag_present())),
            ContextField::TagName => ctx.tag.as_deref().map(Literal::Text),
            ContextField::EventType => Some(Literal::Event(ctx.event_type)),
            ContextField::IsPullRequest => Some(Literal::Flag(ctx.is_pull_request())),
            ContextField::Repository => Some(Literal::Text(&ctx.repository)),
        }
    }
}

impl FromStr for ContextField {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ContextField::ALL
            .into_iter()
            .find(|field| field.as_str() == s)
            .ok_or(())
    }
}

impl fmt::Display for ContextField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A typed comparison value, checked against the field's type when loaded
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Value {
    Text(String),
    Flag(bool),
    Event(EventType),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Literal<'a> {
    Text(&'a str),
    Flag(bool),
    Event(EventType),
}

impl Value {
    fn as_literal(&self) -> Literal<'_> {
        match self {
            Value::Text(s) => Literal::Text(s),
            Value::Flag(b) => Literal::Flag(*b),
            Value::Event(e) => Literal::Event(*e),
        }
    }
}

/// Compiled regular expression compared by its source text
#[derive(Debug, Clone)]
pub struct Pattern(Regex);

impl Pattern {
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.as_str() == other.as_str()
    }
}

impl Eq for Pattern {}

/// Predicate over the execution context
///
/// Evaluation is total: every well-formed condition yields a bool.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Condition {
    Eq { field: ContextField, value: Value },
    In { field: ContextField, values: Vec<Value> },
    Matches { field: ContextField, pattern: Pattern },
    PullRequest,
    All(Vec<Condition>),
    Any(Vec<Condition>),
    Not(Box<Condition>),
}

impl Condition {
    pub fn eq(field: ContextField, value: Value) -> Self {
        Condition::Eq { field, value }
    }

    pub fn not(condition: Condition) -> Self {
        Condition::Not(Box::new(condition))
    }

    /// Evaluate against a context
    pub fn evaluate(&self, ctx: &ExecutionContext) -> bool {
        match self {
            Condition::Eq { field, value } => field
                .read(ctx)
                .is_some_and(|actual| actual == value.as_literal()),
            Condition::In { field, values } => field
                .read(ctx)
                .is_some_and(|actual| values.iter().any(|v| actual == v.as_literal())),
            Condition::Matches { field, pattern } => match field.read(ctx) {
                Some(Literal::Text(text)) => pattern.0.is_match(text),
                _ => false,
            },
            Condition::PullRequest => ctx.is_pull_request(),
            Condition::All(conditions) => conditions.iter().all(|c| c.evaluate(ctx)),
            Condition::Any(conditions) => conditions.iter().any(|c| c.evaluate(ctx)),
            Condition::Not(condition) => !condition.evaluate(ctx),
        }
    }

    /// Validate a parsed predicate against the context schema
    pub fn compile(config: &ConditionConfig, location: &str) -> Result<Self, SpecError> {
        let condition = match config {
            ConditionConfig::Eq { field, value } => {
                let field = parse_field(field, location)?;
                Condition::Eq {
                    field,
                    value: parse_value(field, value, location)?,
                }
            }
            ConditionConfig::In { field, values } => {
                let field = parse_field(field, location)?;
                let values = values
                    .iter()
                    .map(|v| parse_value(field, v, location))
                    .collect::<Result<Vec<_>, _>>()?;
                Condition::In { field, values }
            }
            ConditionConfig::Matches { field, pattern } => {
                let field = parse_field(field, location)?;
                if field.kind() != FieldKind::Text {
                    return Err(SpecError::InvalidLiteral {
                        location: location.to_string(),
                        field: field.to_string(),
                        expected: "a text field for pattern matching",
                        value: pattern.clone(),
                    });
                }
                let regex = Regex::new(pattern).map_err(|source| SpecError::InvalidPattern {
                    location: location.to_string(),
                    pattern: pattern.clone(),
                    source,
                })?;
                Condition::Matches {
                    field,
                    pattern: Pattern(regex),
                }
            }
            ConditionConfig::PullRequest => Condition::PullRequest,
            ConditionConfig::All(items) => Condition::All(compile_all(items, location)?),
            ConditionConfig::Any(items) => Condition::Any(compile_all(items, location)?),
            ConditionConfig::Not(inner) => Condition::not(Condition::compile(inner, location)?),
        };
        Ok(condition)
    }
}

/// An absent condition always holds
pub fn is_active(condition: Option<&Condition>, ctx: &ExecutionContext) -> bool {
    condition.map_or(true, |c| c.evaluate(ctx))
}

fn compile_all(items: &[ConditionConfig], location: &str) -> Result<Vec<Condition>, SpecError> {
    items
        .iter()
        .map(|item| Condition::compile(item, location))
        .collect()
}

fn parse_field(name: &str, location: &str) -> Result<ContextField, SpecError> {
    name.parse().map_err(|_| SpecError::UnknownField {
        location: location.to_string(),
        field: name.to_string(),
    })
}

fn parse_value(field: ContextField, value: &Scalar, location: &str) -> Result<Value, SpecError> {
    let invalid = |expected: &'static str| SpecError::InvalidLiteral {
        location: location.to_string(),
        field: field.to_string(),
        expected,
        value: value.to_string(),
    };

    match field.kind() {
        FieldKind::Text => Ok(Value::Text(value.to_string())),
        FieldKind::Flag => match value.as_str() {
            "true" => Ok(Value::Flag(true)),
            "false" => Ok(Value::Flag(false)),
            _ => Err(invalid("a boolean")),
        },
        FieldKind::Event => value
            .as_str()
            .parse()
            .map(Value::Event)
            .map_err(|_| invalid("an event type")),
    }
}
