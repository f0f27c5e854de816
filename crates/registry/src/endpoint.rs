//! Endpoint types for the capability registry.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::{Error, Result};

/// How an endpoint is executed.
///
/// Assigned once when the endpoint is discovered; the dispatcher matches on
/// this tag instead of inspecting the id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum EndpointKind {
    /// A built-in sample operation, addressed by its exact id.
    Sample,
    /// A command found on the search path.
    Tool { command: String },
    /// The working directory is a version-controlled repository.
    Repository,
    /// Host operating system descriptor.
    SystemInfo,
    /// No recognized namespace.
    Other,
}

impl EndpointKind {
    /// Derive the kind from an id namespace.
    ///
    /// Tool kinds take the command from the part after the prefix
    /// (`tool_git` -> `git`).
    pub fn from_id(id: &str) -> Self {
        match id {
            "git_repo" => return Self::Repository,
            "system_info" => return Self::SystemInfo,
            _ => {}
        }

        if id.starts_with("sample_") {
            return Self::Sample;
        }

        for prefix in TOOL_PREFIXES {
            if let Some(command) = id.strip_prefix(prefix).filter(|c| !c.is_empty()) {
                return Self::Tool {
                    command: command.to_string(),
                };
            }
        }

        Self::Other
    }
}

/// Id prefixes used by the tool probes.
pub const TOOL_PREFIXES: [&str; 3] = ["tool_", "python_", "node_"];

/// A discoverable, invocable capability.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Endpoint {
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: String,
    #[serde(default)]
    pub parameters: Map<String, Value>,
    pub discovered_at: DateTime<Utc>,
    pub kind: EndpointKind,
}

impl Endpoint {
    /// Create an endpoint stamped with the current time.
    ///
    /// The kind is derived from the id namespace; use [`Endpoint::with_kind`]
    /// to set it explicitly.
    pub fn new(
        id: impl Into<String>,
        name: impl Into<String>,
        description: impl Into<String>,
        category: impl Into<String>,
    ) -> Result<Self> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err(Error::InvalidEndpoint("endpoint id cannot be empty".into()));
        }
        if id.chars().any(char::is_whitespace) {
            return Err(Error::InvalidEndpoint(format!(
                "endpoint id '{id}' contains whitespace"
            )));
        }

        Ok(Self {
            kind: EndpointKind::from_id(&id),
            id,
            name: name.into(),
            description: description.into(),
            category: category.into(),
            parameters: Map::new(),
            discovered_at: Utc::now(),
        })
    }

    pub fn with_kind(mut self, kind: EndpointKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn with_parameter(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.parameters.insert(key.into(), value.into());
        self
    }

    pub fn with_parameters(mut self, parameters: Map<String, Value>) -> Self {
        self.parameters = parameters;
        self
    }

    /// Override the discovery timestamp (all endpoints of one probe share it).
    pub fn discovered_at(mut self, at: DateTime<Utc>) -> Self {
        self.discovered_at = at;
        self
    }
}
