#![forbid(unsafe_code)]

use std::env;
use std::net::{Ipv4Addr, SocketAddr};

use paymock_contracts::backend::DEFAULT_INTERACTION_REDIRECT;
use paymock_contracts::item::ItemSchema;

use crate::error::ServiceError;

pub const ENV_HTTP_BIND: &str = "PAYMOCK_HTTP_BIND";
pub const ENV_ITEM_SCHEMA: &str = "PAYMOCK_ITEM_SCHEMA";
pub const ENV_REDIRECT_TARGET: &str = "PAYMOCK_REDIRECT_TARGET";
pub const ENV_SCENARIO: &str = "PAYMOCK_SCENARIO";

/// Startup settings for one mock service instance.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConfig {
    pub bind: SocketAddr,
    pub schema: ItemSchema,
    /// Redirect installed when interaction is required without an explicit target.
    pub interaction_redirect: String,
    /// Path segment appended to the base URL handed to the system under test.
    pub scenario: Option<String>,
}

impl Default for MockConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from((Ipv4Addr::LOCALHOST, 0)),
            schema: ItemSchema::default(),
            interaction_redirect: DEFAULT_INTERACTION_REDIRECT.to_string(),
            scenario: None,
        }
    }
}

impl MockConfig {
    pub fn from_env() -> Result<Self, ServiceError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    pub fn from_lookup<F>(lookup: F) -> Result<Self, ServiceError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        Ok(Self {
            bind: parse_bind_from_env(lookup(ENV_HTTP_BIND))?.unwrap_or(defaults.bind),
            schema: parse_schema_from_env(lookup(ENV_ITEM_SCHEMA))?.unwrap_or(defaults.schema),
            interaction_redirect: parse_redirect_from_env(lookup(ENV_REDIRECT_TARGET))
                .unwrap_or(defaults.interaction_redirect),
            scenario: parse_scenario_from_env(lookup(ENV_SCENARIO)),
        })
    }

    pub fn with_schema(mut self, schema: ItemSchema) -> Self {
        self.schema = schema;
        self
    }

    pub fn with_scenario(mut self, scenario: impl Into<String>) -> Self {
        self.scenario = Some(scenario.into());
        self
    }
}

fn parse_bind_from_env(raw: Option<String>) -> Result<Option<SocketAddr>, ServiceError> {
    let Some(raw) = raw.filter(|v| !v.trim().is_empty()) else {
        return Ok(None);
    };
    raw.trim()
        .parse::<SocketAddr>()
        .map(Some)
        .map_err(|e| ServiceError::Config {
            key: ENV_HTTP_BIND,
            reason: e.to_string(),
        })
}

fn parse_schema_from_env(raw: Option<String>) -> Result<Option<ItemSchema>, ServiceError> {
    match raw.filter(|v| !v.trim().is_empty()) {
        None => Ok(None),
        Some(v) => ItemSchema::parse(&v).map(Some).map_err(|e| ServiceError::Config {
            key: ENV_ITEM_SCHEMA,
            reason: e.to_string(),
        }),
    }
}

fn parse_redirect_from_env(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().to_string())
        .filter(|v| v.starts_with('/') || v.starts_with("http"))
}

fn parse_scenario_from_env(raw: Option<String>) -> Option<String> {
    raw.map(|v| v.trim().trim_matches('/').to_string())
        .filter(|v| !v.is_empty())
}
