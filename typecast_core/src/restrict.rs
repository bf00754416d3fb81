//! Validated construction
//!
//! A [`RestrictedType`] sits on top of a base type and gates construction on
//! a validator. Membership is live: a value belongs to the restricted type
//! only while it belongs to the base and the validator accepts it.

use crate::binder::CallArgs;
use crate::error::{Result, TypecastError};
use crate::types::{TypeRef, ValueType};
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Validator capability of a restricted type
pub trait Validated: Send + Sync {
    /// Whether `candidate` is currently valid
    fn validate(&self, candidate: &Value) -> bool;

    /// Diagnostic for a rejected candidate
    fn invalid(&self, _candidate: &Value) -> String {
        String::new()
    }
}

/// Validator built from a predicate and a message formatter
pub struct FnValidator<P, M> {
    predicate: P,
    message: M,
}

impl<P, M> FnValidator<P, M>
where
    P: Fn(&Value) -> bool + Send + Sync,
    M: Fn(&Value) -> String + Send + Sync,
{
    pub fn new(predicate: P, message: M) -> Self {
        Self { predicate, message }
    }
}

impl<P, M> Validated for FnValidator<P, M>
where
    P: Fn(&Value) -> bool + Send + Sync,
    M: Fn(&Value) -> String + Send + Sync,
{
    fn validate(&self, candidate: &Value) -> bool {
        (self.predicate)(candidate)
    }

    fn invalid(&self, candidate: &Value) -> String {
        (self.message)(candidate)
    }
}

/// A type whose construction and membership are validator-gated
#[derive(Clone)]
pub struct RestrictedType {
    name: String,
    base: TypeRef,
    validator: Arc<dyn Validated>,
}

impl RestrictedType {
    /// Declare a restricted type over `base`
    pub fn new(
        name: impl Into<String>,
        base: TypeRef,
        validator: impl Validated + 'static,
    ) -> Self {
        Self {
            name: name.into(),
            base,
            validator: Arc::new(validator),
        }
    }

    /// Shared handle usable as a declared type
    pub fn shared(self) -> TypeRef {
        Arc::new(self)
    }

    /// Immediate base type
    pub fn base(&self) -> &TypeRef {
        &self.base
    }

    /// Nearest ancestor that is not itself restricted
    pub fn allocator(&self) -> &TypeRef {
        let mut ty = &self.base;
        while let Some(restricted) = ty.as_restricted() {
            ty = &restricted.base;
        }
        ty
    }

    /// Run this type's own validator on `candidate`
    pub fn validate(&self, candidate: &Value) -> bool {
        self.validator.validate(candidate)
    }

    /// Allocate through the unrestricted ancestor, then validate.
    ///
    /// Only this type's validator runs; validators of restricted bases are
    /// not composed.
    pub fn construct(&self, args: &CallArgs) -> Result<Value> {
        let candidate = self.allocator().construct(args)?;
        if self.validator.validate(&candidate) {
            return Ok(candidate);
        }
        tracing::debug!("{} rejected {}", self.name, candidate.repr());
        Err(TypecastError::ValidationError(
            self.validator.invalid(&candidate),
        ))
    }
}

impl ValueType for RestrictedType {
    fn name(&self) -> &str {
        &self.name
    }

    fn is_instance(&self, value: &Value) -> bool {
        self.base.is_instance(value) && self.validator.validate(value)
    }

    fn convert(&self, value: &Value) -> std::result::Result<Value, String> {
        self.construct(&CallArgs::positional(vec![value.clone()]))
            .map_err(|e| match e {
                TypecastError::CastError { reason, .. } => reason,
                other => other.to_string(),
            })
    }

    fn construct(&self, args: &CallArgs) -> Result<Value> {
        RestrictedType::construct(self, args)
    }

    fn as_restricted(&self) -> Option<&RestrictedType> {
        Some(self)
    }
}

impl fmt::Debug for RestrictedType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RestrictedType")
            .field("name", &self.name)
            .field("base", &self.base.name())
            .finish()
    }
}

/// Construct an instance of `ty` from call arguments
pub fn construct(ty: &dyn ValueType, args: CallArgs) -> Result<Value> {
    ty.construct(&args)
}
