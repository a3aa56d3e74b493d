//! Paging definitions
//!
//! A declarative description of how an API pages, loaded from YAML (or JSON,
//! which YAML accepts). Definitions convert into [`PagingOptions`].
//!
//! ```yaml
//! strategy:
//!   type: request_header
//!   header_name: x-ms-continuation
//! items_path: value
//! continuation_token:
//!   type: header
//!   name: x-ms-continuation
//! headers:
//!   x-ms-version: "2024-01-01"
//! ```

use crate::error::{Error, Result};
use crate::paging::{
    ContinuationStrategy, PagingOptions, TokenLocation, DEFAULT_CONTINUATION_TOKEN_LOCATION,
    DEFAULT_ITEMS_LOCATION,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fs;
use std::path::Path;
use url::Url;

// ============================================================================
// Top-Level Definition
// ============================================================================

/// Complete paging definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PagingDefinition {
    /// How the token is carried into the next request
    #[serde(default)]
    pub strategy: StrategyDefinition,

    /// Dot path to the item array
    #[serde(default = "default_items_path")]
    pub items_path: String,

    /// Where the continuation token is read from
    #[serde(default)]
    pub continuation_token: TokenLocationDefinition,

    /// Base URL that relative next links resolve against
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Headers added to the initial request
    #[serde(default)]
    pub headers: HashMap<String, String>,
}

impl Default for PagingDefinition {
    fn default() -> Self {
        Self {
            strategy: StrategyDefinition::default(),
            items_path: default_items_path(),
            continuation_token: TokenLocationDefinition::default(),
            endpoint: None,
            headers: HashMap::new(),
        }
    }
}

fn default_items_path() -> String {
    DEFAULT_ITEMS_LOCATION.to_string()
}

fn default_token_path() -> String {
    DEFAULT_CONTINUATION_TOKEN_LOCATION.to_string()
}

fn default_link_rel() -> String {
    "next".to_string()
}

// ============================================================================
// Strategy Definition
// ============================================================================

/// Continuation strategy configuration
///
/// Callbacks cannot be declared; they are only available from code.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StrategyDefinition {
    /// Follow next-link URLs
    #[default]
    NextLink,
    /// Send the token in a request header
    RequestHeader {
        /// Header name
        header_name: String,
    },
}

impl StrategyDefinition {
    /// Build the runtime strategy
    pub fn build(&self) -> Result<ContinuationStrategy> {
        match self {
            Self::NextLink => Ok(ContinuationStrategy::next_link()),
            Self::RequestHeader { header_name } => {
                if header_name.trim().is_empty() {
                    return Err(Error::invalid_value(
                        "strategy.header_name",
                        "must not be empty",
                    ));
                }
                ContinuationStrategy::request_header(header_name)
            }
        }
    }
}

// ============================================================================
// Token Location Definition
// ============================================================================

/// Continuation token location configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TokenLocationDefinition {
    /// Field in the response body
    Body {
        /// Dot path to the token
        #[serde(default = "default_token_path")]
        path: String,
    },
    /// Response header
    Header {
        /// Header name
        name: String,
    },
    /// RFC 5988 Link header
    LinkHeader {
        /// Relation to follow (usually "next")
        #[serde(default = "default_link_rel")]
        rel: String,
    },
}

impl Default for TokenLocationDefinition {
    fn default() -> Self {
        Self::Body {
            path: default_token_path(),
        }
    }
}

impl From<&TokenLocationDefinition> for TokenLocation {
    fn from(def: &TokenLocationDefinition) -> Self {
        match def {
            TokenLocationDefinition::Body { path } => TokenLocation::body(path),
            TokenLocationDefinition::Header { name } => TokenLocation::header(name),
            TokenLocationDefinition::LinkHeader { rel } => TokenLocation::link_header(rel),
        }
    }
}

// ============================================================================
// Conversion
// ============================================================================

impl PagingDefinition {
    /// Validate and convert into runtime options
    pub fn build(&self) -> Result<PagingOptions> {
        let mut options = PagingOptions::new()
            .with_strategy(self.strategy.build()?)
            .with_items_location(self.items_path.clone())
            .with_token_location(TokenLocation::from(&self.continuation_token));

        if let Some(endpoint) = &self.endpoint {
            let url = Url::parse(endpoint)
                .map_err(|e| Error::invalid_value("endpoint", e.to_string()))?;
            options = options.with_endpoint(url);
        }

        Ok(options)
    }
}

// ============================================================================
// Loading
// ============================================================================

/// Load a paging definition from a YAML or JSON file
pub fn load_definition(path: impl AsRef<Path>) -> Result<PagingDefinition> {
    let path = path.as_ref();
    let content = fs::read_to_string(path).map_err(|e| {
        Error::config(format!(
            "Failed to read paging definition '{}': {}",
            path.display(),
            e
        ))
    })?;
    load_definition_from_str(&content)
}

/// Parse a paging definition from a YAML string
pub fn load_definition_from_str(yaml: &str) -> Result<PagingDefinition> {
    let definition: PagingDefinition = serde_yaml::from_str(yaml)?;
    // Surface invalid header names and endpoints at load time
    definition.build()?;
    Ok(definition)
}
