//! Function signature descriptors
//!
//! A [`FunctionSignature`] is the explicit stand-in for runtime call-signature
//! reflection: it records parameter names, kinds, defaults and declared types
//! once, when a function is declared, and is shared read-only afterwards.

use crate::error::{Result, TypecastError};
use crate::types::TypeRef;
use crate::value::Value;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;

/// How a parameter receives its argument
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ParameterKind {
    #[default]
    PositionalOrKeyword,
    VarPositional,
    KeywordOnly,
    VarKeyword,
}

impl ParameterKind {
    /// Declaration order rank; kinds must appear in non-decreasing rank
    fn rank(self) -> u8 {
        match self {
            ParameterKind::PositionalOrKeyword => 0,
            ParameterKind::VarPositional => 1,
            ParameterKind::KeywordOnly => 2,
            ParameterKind::VarKeyword => 3,
        }
    }

    /// Whether this kind collects excess actuals
    pub fn is_variadic(self) -> bool {
        matches!(self, ParameterKind::VarPositional | ParameterKind::VarKeyword)
    }
}

/// A single formal parameter
#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: String,
    pub kind: ParameterKind,
    /// Target type for coercion; element/value type for variadic kinds
    pub declared_type: Option<TypeRef>,
    pub default: Option<Value>,
}

impl Parameter {
    /// Positional-or-keyword parameter
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: ParameterKind::PositionalOrKeyword,
            declared_type: None,
            default: None,
        }
    }

    pub fn kind(mut self, kind: ParameterKind) -> Self {
        self.kind = kind;
        self
    }

    pub fn typed(mut self, ty: TypeRef) -> Self {
        self.declared_type = Some(ty);
        self
    }

    pub fn default(mut self, value: Value) -> Self {
        self.default = Some(value);
        self
    }

    pub fn has_default(&self) -> bool {
        self.default.is_some()
    }
}

/// Immutable description of a function's call interface and metadata
#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub name: String,
    pub qualname: String,
    pub module: Option<String>,
    pub doc: Option<String>,
    params: Vec<Parameter>,
    return_type: Option<TypeRef>,
}

impl FunctionSignature {
    /// Start building a signature for a function called `name`
    pub fn builder(name: impl Into<String>) -> SignatureBuilder {
        let name = name.into();
        SignatureBuilder {
            qualname: name.clone(),
            name,
            module: None,
            doc: None,
            params: Vec::new(),
            return_type: None,
        }
    }

    /// Parameters in declaration order
    pub fn params(&self) -> &[Parameter] {
        &self.params
    }

    /// Look up a parameter by name
    pub fn param(&self, name: &str) -> Option<&Parameter> {
        self.params.iter().find(|p| p.name == name)
    }

    /// Declared return type, if any
    pub fn return_type(&self) -> Option<&TypeRef> {
        self.return_type.as_ref()
    }

    /// Parameters that may be filled positionally
    pub fn positional_params(&self) -> impl Iterator<Item = &Parameter> {
        self.params
            .iter()
            .filter(|p| p.kind == ParameterKind::PositionalOrKeyword)
    }

    /// The var-positional parameter, if declared
    pub fn var_positional(&self) -> Option<&Parameter> {
        self.params
            .iter()
            .find(|p| p.kind == ParameterKind::VarPositional)
    }

    /// The var-keyword parameter, if declared
    pub fn var_keyword(&self) -> Option<&Parameter> {
        self.params
            .iter()
            .find(|p| p.kind == ParameterKind::VarKeyword)
    }
}

/// Builder for [`FunctionSignature`]
#[derive(Debug)]
pub struct SignatureBuilder {
    name: String,
    qualname: String,
    module: Option<String>,
    doc: Option<String>,
    params: Vec<Parameter>,
    return_type: Option<TypeRef>,
}

impl SignatureBuilder {
    pub fn qualname(mut self, qualname: impl Into<String>) -> Self {
        self.qualname = qualname.into();
        self
    }

    pub fn module(mut self, module: impl Into<String>) -> Self {
        self.module = Some(module.into());
        self
    }

    pub fn doc(mut self, doc: impl Into<String>) -> Self {
        self.doc = Some(doc.into());
        self
    }

    /// Append a fully described parameter
    pub fn param(mut self, param: Parameter) -> Self {
        self.params.push(param);
        self
    }

    /// Append a positional-or-keyword parameter with an optional type
    pub fn arg(self, name: &str, ty: Option<TypeRef>) -> Self {
        let mut param = Parameter::new(name);
        param.declared_type = ty;
        self.param(param)
    }

    pub fn returns(mut self, ty: TypeRef) -> Self {
        self.return_type = Some(ty);
        self
    }

    /// Validate the declaration and freeze it
    pub fn build(self) -> Result<Arc<FunctionSignature>> {
        let mut seen = HashSet::new();
        let mut last_rank = 0;
        let mut seen_default = false;

        for param in &self.params {
            if param.name.is_empty() {
                return Err(TypecastError::InvalidSignature(format!(
                    "{}: parameter name must not be empty",
                    self.name
                )));
            }
            if !seen.insert(param.name.as_str()) {
                return Err(TypecastError::InvalidSignature(format!(
                    "{}: duplicate argument '{}' in function definition",
                    self.name, param.name
                )));
            }

            let rank = param.kind.rank();
            if rank < last_rank || (rank == last_rank && param.kind.is_variadic()) {
                return Err(TypecastError::InvalidSignature(format!(
                    "{}: parameter '{}' ({:?}) is out of order",
                    self.name, param.name, param.kind
                )));
            }
            last_rank = rank;

            if param.kind.is_variadic() && param.has_default() {
                return Err(TypecastError::InvalidSignature(format!(
                    "{}: variadic parameter '{}' cannot have a default",
                    self.name, param.name
                )));
            }
            if param.kind == ParameterKind::PositionalOrKeyword {
                if param.has_default() {
                    seen_default = true;
                } else if seen_default {
                    return Err(TypecastError::InvalidSignature(format!(
                        "{}: non-default argument '{}' follows default argument",
                        self.name, param.name
                    )));
                }
            }
        }

        Ok(Arc::new(FunctionSignature {
            name: self.name,
            qualname: self.qualname,
            module: self.module,
            doc: self.doc,
            params: self.params,
            return_type: self.return_type,
        }))
    }
}
