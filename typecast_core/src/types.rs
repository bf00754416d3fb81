//! Runtime type descriptors
//!
//! A [`ValueType`] is what a parameter or return annotation names: something
//! that can answer "is this value already one of mine?" and can try to make
//! one out of an arbitrary value in a single step.

use crate::binder::CallArgs;
use crate::error::{Result, TypecastError};
use crate::restrict::RestrictedType;
use crate::value::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

/// Shared handle to a type descriptor
pub type TypeRef = Arc<dyn ValueType>;

/// Capability interface for declared types
pub trait ValueType: fmt::Debug + Send + Sync {
    /// Type name as written in declarations
    fn name(&self) -> &str;

    /// Membership query
    fn is_instance(&self, value: &Value) -> bool;

    /// One-argument conversion factory. The error carries the reason.
    fn convert(&self, value: &Value) -> std::result::Result<Value, String>;

    /// Build a value from call arguments, as calling the type would.
    fn construct(&self, args: &CallArgs) -> Result<Value> {
        let given = args.positional.len() + args.keywords.len();
        let value = match args.positional.as_slice() {
            [value] if given == 1 => value,
            _ => {
                return Err(TypecastError::binding(
                    self.name(),
                    format!("takes exactly one argument ({} given)", given),
                ))
            }
        };
        self.convert(value).map_err(|reason| TypecastError::CastError {
            value: value.clone(),
            target: self.name().to_string(),
            reason,
        })
    }

    /// Downcast hook for restricted types
    fn as_restricted(&self) -> Option<&RestrictedType> {
        None
    }
}

/// Check whether `value` is currently a member of `ty`
pub fn is_instance(value: &Value, ty: &dyn ValueType) -> bool {
    ty.is_instance(value)
}

/// Built-in types of the host environment
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Builtin {
    Int,
    Float,
    Str,
    Bool,
    List,
    Dict,
    NoneType,
    Object,
}

impl Builtin {
    pub const ALL: [Builtin; 8] = [
        Builtin::Int,
        Builtin::Float,
        Builtin::Str,
        Builtin::Bool,
        Builtin::List,
        Builtin::Dict,
        Builtin::NoneType,
        Builtin::Object,
    ];

    /// Shared handle for this builtin
    pub fn shared(self) -> TypeRef {
        Arc::new(self)
    }

    /// Value produced by calling the type with no arguments
    fn empty(self) -> Option<Value> {
        match self {
            Builtin::Int => Some(Value::Int(0)),
            Builtin::Float => Some(Value::Float(0.0)),
            Builtin::Str => Some(Value::String(String::new())),
            Builtin::Bool => Some(Value::Bool(false)),
            Builtin::List => Some(Value::Array(Vec::new())),
            Builtin::Dict => Some(Value::Object(HashMap::new())),
            Builtin::NoneType => None,
            Builtin::Object => Some(Value::Null),
        }
    }

    fn int_with_base(value: &Value, base: &Value) -> std::result::Result<Value, String> {
        let text = value
            .as_str()
            .ok_or_else(|| "int() can't convert non-string with explicit base".to_string())?;
        let base = match base {
            Value::Int(b) if *b == 0 || (2..=36).contains(b) => *b as u32,
            other => {
                return Err(format!(
                    "int() base must be >= 2 and <= 36, or 0, not {}",
                    other
                ))
            }
        };
        let invalid = || format!("invalid literal for int() with base {}: {}", base, value.repr());

        let (negative, unsigned) = split_sign(text.trim());
        let lower = unsigned.to_ascii_lowercase();
        let prefixed = match lower.get(..2) {
            Some("0x") => Some(16),
            Some("0o") => Some(8),
            Some("0b") => Some(2),
            _ => None,
        };
        let (radix, digits) = match (base, prefixed) {
            (0, Some(radix)) => (radix, &unsigned[2..]),
            (0, None) => {
                // base 0 forbids leading zeros on non-zero literals
                if unsigned.starts_with('0') && unsigned.chars().any(|c| c != '0' && c != '_') {
                    return Err(invalid());
                }
                (10, unsigned)
            }
            (b, Some(radix)) if b == radix => (radix, &unsigned[2..]),
            (b, _) => (b, unsigned),
        };

        parse_integer(negative, digits, radix)
            .map(Value::Int)
            .ok_or_else(invalid)
    }
}

/// Split an optional leading sign off `text`
fn split_sign(text: &str) -> (bool, &str) {
    match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    }
}

/// Parse unsigned digits in `radix`; `_` is allowed only between digits
fn parse_integer(negative: bool, digits: &str, radix: u32) -> Option<i64> {
    let valid_separators = !digits.is_empty()
        && !digits.starts_with('_')
        && !digits.ends_with('_')
        && !digits.contains("__");
    if !valid_separators || !digits.chars().all(|c| c == '_' || c.is_digit(radix)) {
        return None;
    }
    let cleaned: String = digits.chars().filter(|c| *c != '_').collect();
    let magnitude = i128::from_str_radix(&cleaned, radix).ok()?;
    i64::try_from(if negative { -magnitude } else { magnitude }).ok()
}

/// Truncate a float toward zero, failing outside the i64 range
fn float_to_int(f: f64) -> std::result::Result<i64, String> {
    // 2^63, exactly representable
    const BOUND: f64 = 9_223_372_036_854_775_808.0;
    let truncated = f.trunc();
    if f.is_finite() && (-BOUND..BOUND).contains(&truncated) {
        Ok(truncated as i64)
    } else {
        Err(format!("cannot convert float {} to integer", Value::Float(f)))
    }
}

impl ValueType for Builtin {
    fn name(&self) -> &str {
        match self {
            Builtin::Int => "int",
            Builtin::Float => "float",
            Builtin::Str => "str",
            Builtin::Bool => "bool",
            Builtin::List => "list",
            Builtin::Dict => "dict",
            Builtin::NoneType => "NoneType",
            Builtin::Object => "object",
        }
    }

    fn is_instance(&self, value: &Value) -> bool {
        match self {
            // bool is a subtype of int
            Builtin::Int => matches!(value, Value::Int(_) | Value::Bool(_)),
            Builtin::Float => matches!(value, Value::Float(_)),
            Builtin::Str => matches!(value, Value::String(_)),
            Builtin::Bool => matches!(value, Value::Bool(_)),
            Builtin::List => matches!(value, Value::Array(_)),
            Builtin::Dict => matches!(value, Value::Object(_)),
            Builtin::NoneType => matches!(value, Value::Null),
            Builtin::Object => true,
        }
    }

    fn convert(&self, value: &Value) -> std::result::Result<Value, String> {
        match self {
            Builtin::Int => match value {
                Value::Int(i) => Ok(Value::Int(*i)),
                Value::Bool(b) => Ok(Value::Int(i64::from(*b))),
                Value::Float(f) => float_to_int(*f).map(Value::Int),
                Value::String(s) => {
                    let (negative, digits) = split_sign(s.trim());
                    parse_integer(negative, digits, 10)
                        .map(Value::Int)
                        .ok_or_else(|| {
                            format!("invalid literal for int() with base 10: {}", value.repr())
                        })
                }
                other => Err(format!(
                    "int() argument must be a string or a number, not '{}'",
                    other.type_name()
                )),
            },
            Builtin::Float => match value {
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .map(Value::Float)
                    .map_err(|_| format!("could not convert string to float: {}", value.repr())),
                other => other.as_float().map(Value::Float).ok_or_else(|| {
                    format!(
                        "float() argument must be a string or a number, not '{}'",
                        other.type_name()
                    )
                }),
            },
            Builtin::Str => Ok(Value::String(value.to_string())),
            Builtin::Bool => Ok(Value::Bool(value.is_truthy())),
            Builtin::List => match value {
                Value::Array(items) => Ok(Value::Array(items.clone())),
                Value::String(s) => Ok(Value::Array(
                    s.chars().map(|c| Value::String(c.to_string())).collect(),
                )),
                Value::Object(map) => {
                    let mut keys: Vec<&String> = map.keys().collect();
                    keys.sort();
                    Ok(Value::Array(
                        keys.into_iter().map(|k| Value::String(k.clone())).collect(),
                    ))
                }
                other => Err(format!("'{}' object is not iterable", other.type_name())),
            },
            Builtin::Dict => match value {
                Value::Object(map) => Ok(Value::Object(map.clone())),
                Value::Array(items) => {
                    let mut map = HashMap::with_capacity(items.len());
                    for (idx, item) in items.iter().enumerate() {
                        match item.as_array() {
                            Some([Value::String(k), v]) => {
                                map.insert(k.clone(), v.clone());
                            }
                            _ => {
                                return Err(format!(
                                    "dictionary update sequence element #{} is not a (str, value) pair",
                                    idx
                                ))
                            }
                        }
                    }
                    Ok(Value::Object(map))
                }
                other => Err(format!(
                    "'{}' object is not iterable",
                    other.type_name()
                )),
            },
            Builtin::NoneType => Err("NoneType takes no arguments".to_string()),
            Builtin::Object => Err("object() takes no arguments".to_string()),
        }
    }

    fn construct(&self, args: &CallArgs) -> Result<Value> {
        let arity = args.positional.len() + args.keywords.len();
        if arity == 0 {
            return self.empty().ok_or_else(|| {
                TypecastError::binding(self.name(), "cannot be instantiated")
            });
        }

        if *self == Builtin::Int {
            let base = match (args.positional.as_slice(), args.keywords.get("base")) {
                ([_, base], None) => Some(base),
                ([_], Some(base)) => Some(base),
                _ => None,
            };
            if let Some(base) = base {
                let value = &args.positional[0];
                return Builtin::int_with_base(value, base).map_err(|reason| {
                    TypecastError::CastError {
                        value: value.clone(),
                        target: "int".to_string(),
                        reason,
                    }
                });
            }
        }

        if arity > 1 || !args.keywords.is_empty() {
            return Err(TypecastError::binding(
                self.name(),
                format!("takes at most 1 argument ({} given)", arity),
            ));
        }

        let value = &args.positional[0];
        self.convert(value).map_err(|reason| TypecastError::CastError {
            value: value.clone(),
            target: self.name().to_string(),
            reason,
        })
    }
}

/// Name-to-type lookup used when resolving declarations
#[derive(Debug, Clone)]
pub struct TypeRegistry {
    types: HashMap<String, TypeRef>,
}

impl TypeRegistry {
    /// Create a registry holding the built-in types
    pub fn new() -> Self {
        let mut types = HashMap::new();
        for builtin in Builtin::ALL {
            types.insert(builtin.name().to_string(), builtin.shared());
        }
        types.insert("None".to_string(), Builtin::NoneType.shared());
        Self { types }
    }

    /// Register a type under its own name, replacing any previous entry
    pub fn register(&mut self, ty: TypeRef) {
        tracing::debug!("Registering type {}", ty.name());
        self.types.insert(ty.name().to_string(), ty);
    }

    /// Look up a type by name
    pub fn get(&self, name: &str) -> Option<TypeRef> {
        self.types.get(name).cloned()
    }

    /// Look up a type by name, failing if it is unknown
    pub fn resolve(&self, name: &str) -> Result<TypeRef> {
        self.get(name)
            .ok_or_else(|| TypecastError::UnknownType(name.to_string()))
    }

    /// Check if a type is registered
    pub fn contains(&self, name: &str) -> bool {
        self.types.contains_key(name)
    }
}

impl Default for TypeRegistry {
    fn default() -> Self {
        Self::new()
    }
}
