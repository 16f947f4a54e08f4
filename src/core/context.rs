//! Execution context - the trigger facts a plan is evaluated against

use crate::core::error::ContextError;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;
use std::str::FromStr;

/// What kind of event triggered the run
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EventType {
    Push,
    PullRequest,
    #[serde(alias = "cron")]
    Schedule,
    Api,
}

impl EventType {
    pub fn as_str(&self) -> &'static str {
        match self {
            EventType::Push => "push",
            EventType::PullRequest => "pull_request",
            EventType::Schedule => "schedule",
            EventType::Api => "api",
        }
    }
}

impl FromStr for EventType {
    type Err = ContextError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "push" => Ok(EventType::Push),
            "pull_request" | "pull-request" => Ok(EventType::PullRequest),
            "schedule" | "cron" => Ok(EventType::Schedule),
            "api" => Ok(EventType::Api),
            other => Err(ContextError::UnknownEventType(other.to_string())),
        }
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Trigger facts for one evaluation run
///
/// Supplied once by the caller and never mutated while a plan is built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionContext {
    /// Branch the run was triggered for
    pub branch: String,

    /// Tag name, when a tag triggered the run
    #[serde(default)]
    pub tag: Option<String>,

    /// Triggering event
    pub event_type: EventType,

    /// Repository identity (e.g. `owner/name`)
    #[serde(default)]
    pub repository: String,
}

impl ExecutionContext {
    /// Create a push context for a branch with no tag
    pub fn new(branch: impl Into<String>, event_type: EventType) -> Self {
        Self {
            branch: branch.into(),
            tag: None,
            event_type,
            repository: String::new(),
        }
    }

    pub fn with_tag(mut self, tag: impl Into<String>) -> Self {
        self.tag = Some(tag.into());
        self
    }

    pub fn with_repository(mut self, repository: impl Into<String>) -> Self {
        self.repository = repository.into();
        self
    }

    pub fn tag_present(&self) -> bool {
        self.tag.is_some()
    }

    pub fn is_pull_request(&self) -> bool {
        self.event_type == EventType::PullRequest
    }

    /// Load a context from a YAML (or JSON) file
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read context file: {}", path.display()))?;
        let context: ExecutionContext = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse context file: {}", path.display()))?;
        Ok(context)
    }

    /// Read the trigger facts from the CI environment variables
    pub fn from_env() -> Result<Self, ContextError> {
        Self::from_vars(|name| std::env::var(name).ok())
    }

    /// Build a context from a variable lookup using the Travis variable names
    pub fn from_vars<F>(lookup: F) -> Result<Self, ContextError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let branch = lookup("TRAVIS_BRANCH").ok_or(ContextError::MissingVariable("TRAVIS_BRANCH"))?;
        let tag = lookup("TRAVIS_TAG").filter(|t| !t.is_empty());

        let event_type = match lookup("TRAVIS_EVENT_TYPE") {
            Some(event) if !event.is_empty() => event.parse()?,
            // Older builds only expose the PR number ("false" when not a PR)
            _ => match lookup("TRAVIS_PULL_REQUEST") {
                Some(pr) if pr != "false" && !pr.is_empty() => EventType::PullRequest,
                _ => EventType::Push,
            },
        };

        Ok(Self {
            branch,
            tag,
            event_type,
            repository: lookup("TRAVIS_REPO_SLUG").unwrap_or_default(),
        })
    }
}

impl fmt::Display for ExecutionContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} on {}", self.event_type, self.branch)?;
        if let Some(tag) = &self.tag {
            write!(f, " (tag {})", tag)?;
        }
        if !self.repository.is_empty() {
            write!(f, " [{}]", self.repository)?;
        }
        Ok(())
    }
}
