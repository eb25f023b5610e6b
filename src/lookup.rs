//! Values the stack needs from the outside world at synthesis time: the
//! certificate ARN held in an SSM parameter, and the Route53 hosted zone of
//! the apex domain.
//!
//! Synthesis never talks to AWS. Lookups are answered from a cache
//! (`cdk.context.json`). A key that is not cached is reported back as a
//! [`MissingContext`] so that something else (an operator, or the
//! `aws-lookup` resolver) can fill it in before synthesizing again.

use std::collections::BTreeMap;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::error::{Result, SynthError};
use crate::resources::HostedZone;
use crate::stack::Environment;

#[cfg(feature = "aws-lookup")]
pub mod aws;

pub const DEFAULT_CONTEXT_CACHE_FILE: &str = "cdk.context.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContextProviderKind {
    #[serde(rename = "ssm")]
    SsmParameter,
    #[serde(rename = "hosted-zone")]
    HostedZone,
}

/// a lookup that could not be answered from the cache.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MissingContext {
    pub key: String,
    pub provider: ContextProviderKind,
    pub props: BTreeMap<String, String>,
}

fn context_key(prefix: &str, env: &Environment, name_field: &str, name: &str) -> String {
    let mut key = format!("{prefix}:");
    if let Some(account) = &env.account {
        key.push_str(&format!("account={account}:"));
    }
    key.push_str(&format!("{name_field}={name}:region={}", env.region));
    key
}

fn lookup_props(env: &Environment, name_field: &str, name: &str) -> BTreeMap<String, String> {
    let mut props = BTreeMap::new();
    props.insert(name_field.to_string(), name.to_string());
    props.insert("region".to_string(), env.region.clone());
    if let Some(account) = &env.account {
        props.insert("account".to_string(), account.clone());
    }
    props
}

pub fn ssm_parameter_key(env: &Environment, parameter_name: &str) -> String {
    context_key("ssm", env, "parameterName", parameter_name)
}

pub fn hosted_zone_key(env: &Environment, domain_name: &str) -> String {
    context_key("hosted-zone", env, "domainName", domain_name)
}

impl MissingContext {
    pub fn ssm_parameter(env: &Environment, parameter_name: &str) -> Self {
        Self {
            key: ssm_parameter_key(env, parameter_name),
            provider: ContextProviderKind::SsmParameter,
            props: lookup_props(env, "parameterName", parameter_name),
        }
    }

    pub fn hosted_zone(env: &Environment, domain_name: &str) -> Self {
        Self {
            key: hosted_zone_key(env, domain_name),
            provider: ContextProviderKind::HostedZone,
            props: lookup_props(env, "domainName", domain_name),
        }
    }
}

/// Source of SSM parameter values. `Ok(None)` means "not known yet".
pub trait ParameterStore {
    fn parameter_value(&self, env: &Environment, parameter_name: &str) -> Result<Option<String>>;
}

/// Source of Route53 hosted zones, found by their domain name.
pub trait HostedZoneProvider {
    fn find_zone(&self, env: &Environment, domain_name: &str) -> Result<Option<HostedZone>>;
}

/// Everything a stack needs to resolve its lookups.
pub trait ContextLookups: ParameterStore + HostedZoneProvider {}

impl<T: ParameterStore + HostedZoneProvider + ?Sized> ContextLookups for T {}

/// The `cdk.context.json` lookup cache.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ContextCache {
    entries: BTreeMap<String, Value>,
}

impl ContextCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// a cache file that does not exist yet is treated as an empty cache.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no context cache yet");
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(SynthError::Read { path: path.to_path_buf(), source });
            }
        };
        serde_json::from_str(&contents).map_err(|source| SynthError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = serde_json::to_string_pretty(self)?;
        std::fs::write(path, contents + "\n").map_err(|source| SynthError::Write {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        self.entries.insert(key.into(), value);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// stores a parameter value under the key the stack will look for.
    pub fn set_parameter(&mut self, env: &Environment, parameter_name: &str, value: &str) {
        self.insert(ssm_parameter_key(env, parameter_name), Value::String(value.to_string()));
    }

    pub fn set_hosted_zone(&mut self, env: &Environment, domain_name: &str, zone: &HostedZone) {
        self.insert(hosted_zone_key(env, domain_name), zone.to_context_value());
    }
}

impl ParameterStore for ContextCache {
    fn parameter_value(&self, env: &Environment, parameter_name: &str) -> Result<Option<String>> {
        let key = ssm_parameter_key(env, parameter_name);
        match self.get(&key) {
            None => Ok(None),
            Some(Value::String(s)) => Ok(Some(s.clone())),
            Some(other) => Err(SynthError::MalformedContextValue {
                key,
                reason: format!("expected a string, found {other}"),
            }),
        }
    }
}

impl HostedZoneProvider for ContextCache {
    fn find_zone(&self, env: &Environment, domain_name: &str) -> Result<Option<HostedZone>> {
        let key = hosted_zone_key(env, domain_name);
        match self.get(&key) {
            None => Ok(None),
            Some(value) => HostedZone::from_context_value(value)
                .map(Some)
                .map_err(|reason| SynthError::MalformedContextValue { key, reason }),
        }
    }
}
