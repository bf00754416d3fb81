//! Single-step value coercion

use crate::error::{Result, TypecastError};
use crate::types::ValueType;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Failure behavior of a caster, fixed per use-site
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CasterPolicy {
    /// Surface failed conversions as errors instead of passing values through
    #[serde(default)]
    pub strict: bool,
}

impl CasterPolicy {
    /// Failed casts raise [`TypecastError::CastError`]
    pub fn strict() -> Self {
        Self { strict: true }
    }

    /// Failed casts return the original value
    pub fn lenient() -> Self {
        Self { strict: false }
    }

    /// Load a policy from a YAML or JSON file
    pub fn load_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;
        let is_json = path
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
        if is_json {
            Self::from_json(&content)
        } else {
            Self::from_yaml(&content)
        }
    }

    /// Parse a policy from YAML content
    pub fn from_yaml(content: &str) -> Result<Self> {
        let policy: CasterPolicy = serde_yaml::from_str(content)?;
        tracing::debug!("Loaded caster policy (strict: {})", policy.strict);
        Ok(policy)
    }

    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }
}

/// Coerces values to declared types
#[derive(Debug, Clone, Copy, Default)]
pub struct Caster {
    policy: CasterPolicy,
}

impl Caster {
    /// Create a caster with the given policy
    pub fn new(policy: CasterPolicy) -> Self {
        Self { policy }
    }

    pub fn policy(&self) -> CasterPolicy {
        self.policy
    }

    /// Cast `value` to `target`.
    ///
    /// Undeclared targets and values that already satisfy the target are
    /// returned untouched. Otherwise the target's conversion factory runs
    /// once; on failure the original value comes back unless the policy is
    /// strict.
    pub fn cast(&self, value: Value, target: Option<&dyn ValueType>) -> Result<Value> {
        let Some(target) = target else {
            return Ok(value);
        };
        if target.is_instance(&value) {
            return Ok(value);
        }

        match target.convert(&value) {
            Ok(converted) => {
                tracing::debug!("Cast {} to {}", value.repr(), target.name());
                Ok(converted)
            }
            Err(reason) => {
                if self.policy.strict {
                    return Err(TypecastError::CastError {
                        value,
                        target: target.name().to_string(),
                        reason,
                    });
                }
                tracing::warn!(
                    "Could not cast {} to {}, passing through: {}",
                    value.repr(),
                    target.name(),
                    reason
                );
                Ok(value)
            }
        }
    }
}

/// Cast a single value with an explicit policy
pub fn cast(value: Value, target: &dyn ValueType, policy: CasterPolicy) -> Result<Value> {
    Caster::new(policy).cast(value, Some(target))
}
