//! Typecast Core
//!
//! Runtime enforcement of declared types for dynamic values: automatic
//! coercion of call arguments and return values, and validated construction
//! of restricted types whose membership tracks current validity.

pub mod autocast;
pub mod binder;
pub mod caster;
pub mod error;
pub mod function;
pub mod restrict;
pub mod signature;
pub mod types;
pub mod value;

pub use autocast::{Autocast, Autocasted};
pub use binder::{bind, CallArgs, CallBinding};
pub use caster::{cast, Caster, CasterPolicy};
pub use error::{Result, TypecastError};
pub use function::{Callable, NativeFunction};
pub use restrict::{construct, FnValidator, RestrictedType, Validated};
pub use signature::{FunctionSignature, Parameter, ParameterKind};
pub use types::{is_instance, Builtin, TypeRef, TypeRegistry, ValueType};
pub use value::Value;
