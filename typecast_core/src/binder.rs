//! Argument binding
//!
//! Maps the actual arguments of a call onto a [`FunctionSignature`]'s formal
//! parameters the way a conventional call would: positionals fill
//! positional-or-keyword slots in order, keywords match by name, leftovers go
//! to the variadic buckets, and missing slots fall back to their defaults.

use crate::error::{Result, TypecastError};
use crate::signature::{FunctionSignature, ParameterKind};
use crate::value::Value;
use std::collections::HashMap;

/// Actual arguments of a call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallArgs {
    pub positional: Vec<Value>,
    pub keywords: HashMap<String, Value>,
}

impl CallArgs {
    /// Create call arguments from positionals and keywords
    pub fn new(positional: Vec<Value>, keywords: HashMap<String, Value>) -> Self {
        Self {
            positional,
            keywords,
        }
    }

    /// Positional-only call
    pub fn positional(positional: Vec<Value>) -> Self {
        Self {
            positional,
            keywords: HashMap::new(),
        }
    }

    /// Add a keyword argument
    pub fn with_keyword(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.keywords.insert(name.into(), value.into());
        self
    }
}

/// A value bound to one formal parameter
#[derive(Debug, Clone, PartialEq)]
pub enum Bound {
    Single(Value),
    VarPositional(Vec<Value>),
    VarKeyword(HashMap<String, Value>),
}

/// Mapping from parameter name to bound value for a single call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CallBinding {
    values: HashMap<String, Bound>,
}

impl CallBinding {
    /// Get the bound value of a single-valued parameter
    pub fn get(&self, name: &str) -> Option<&Value> {
        match self.values.get(name)? {
            Bound::Single(value) => Some(value),
            _ => None,
        }
    }

    /// Get the raw binding of any parameter
    pub fn bound(&self, name: &str) -> Option<&Bound> {
        self.values.get(name)
    }

    /// Get a var-positional bucket
    pub fn var_positional(&self, name: &str) -> Option<&[Value]> {
        match self.values.get(name)? {
            Bound::VarPositional(items) => Some(items),
            _ => None,
        }
    }

    /// Get a var-keyword bucket
    pub fn var_keyword(&self, name: &str) -> Option<&HashMap<String, Value>> {
        match self.values.get(name)? {
            Bound::VarKeyword(map) => Some(map),
            _ => None,
        }
    }

    /// Number of bound parameters
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub(crate) fn take(&mut self, name: &str) -> Option<Bound> {
        self.values.remove(name)
    }

    pub(crate) fn insert(&mut self, name: String, bound: Bound) {
        self.values.insert(name, bound);
    }

    /// Flatten back into call arguments in declaration order.
    ///
    /// Positional-or-keyword parameters and the var-positional bucket become
    /// positionals; keyword-only parameters and var-keyword entries become
    /// keywords.
    pub fn into_call_args(mut self, signature: &FunctionSignature) -> CallArgs {
        let mut args = CallArgs::default();
        for param in signature.params() {
            match self.take(&param.name) {
                Some(Bound::Single(value)) => match param.kind {
                    ParameterKind::KeywordOnly => {
                        args.keywords.insert(param.name.clone(), value);
                    }
                    _ => args.positional.push(value),
                },
                Some(Bound::VarPositional(items)) => args.positional.extend(items),
                Some(Bound::VarKeyword(map)) => args.keywords.extend(map),
                None => {}
            }
        }
        args
    }
}

/// Bind call actuals onto a signature's formal parameters
pub fn bind(signature: &FunctionSignature, args: CallArgs) -> Result<CallBinding> {
    let function = signature.name.as_str();
    let CallArgs {
        positional,
        mut keywords,
    } = args;
    let mut binding = CallBinding::default();

    let slots: Vec<&str> = signature
        .positional_params()
        .map(|p| p.name.as_str())
        .collect();
    let given = positional.len();
    let mut positional = positional.into_iter();

    for name in slots.iter().take(given) {
        if keywords.contains_key(*name) {
            return Err(TypecastError::binding(
                function,
                format!("got multiple values for argument '{}'", name),
            ));
        }
        if let Some(value) = positional.next() {
            binding.insert(name.to_string(), Bound::Single(value));
        }
    }

    let excess: Vec<Value> = positional.collect();
    match signature.var_positional() {
        Some(param) => binding.insert(param.name.clone(), Bound::VarPositional(excess)),
        None if !excess.is_empty() => {
            return Err(TypecastError::binding(
                function,
                format!(
                    "takes {} positional argument{} but {} {} given",
                    slots.len(),
                    if slots.len() == 1 { "" } else { "s" },
                    given,
                    if given == 1 { "was" } else { "were" }
                ),
            ))
        }
        None => {}
    }

    for param in signature.params() {
        if matches!(
            param.kind,
            ParameterKind::PositionalOrKeyword | ParameterKind::KeywordOnly
        ) {
            if let Some(value) = keywords.remove(&param.name) {
                binding.insert(param.name.clone(), Bound::Single(value));
            }
        }
    }

    match signature.var_keyword() {
        Some(param) => binding.insert(param.name.clone(), Bound::VarKeyword(keywords)),
        None => {
            let mut unexpected: Vec<&String> = keywords.keys().collect();
            unexpected.sort();
            if let Some(name) = unexpected.first() {
                return Err(TypecastError::binding(
                    function,
                    format!("got an unexpected keyword argument '{}'", name),
                ));
            }
        }
    }

    let mut missing = Vec::new();
    let mut missing_kwonly = Vec::new();
    for param in signature.params() {
        if param.kind.is_variadic() || binding.bound(&param.name).is_some() {
            continue;
        }
        match &param.default {
            Some(default) => binding.insert(param.name.clone(), Bound::Single(default.clone())),
            None if param.kind == ParameterKind::KeywordOnly => {
                missing_kwonly.push(param.name.as_str())
            }
            None => missing.push(param.name.as_str()),
        }
    }

    if !missing.is_empty() {
        return Err(missing_error(function, "positional", &missing));
    }
    if !missing_kwonly.is_empty() {
        return Err(missing_error(function, "keyword-only", &missing_kwonly));
    }

    tracing::debug!("Bound {} parameters for {}()", binding.len(), function);
    Ok(binding)
}

fn missing_error(function: &str, kind: &str, names: &[&str]) -> TypecastError {
    let quoted: Vec<String> = names.iter().map(|n| format!("'{}'", n)).collect();
    let listed = match quoted.as_slice() {
        [one] => one.clone(),
        [init @ .., last] => format!("{} and {}", init.join(", "), last),
        [] => String::new(),
    };
    TypecastError::binding(
        function,
        format!(
            "missing {} required {} argument{}: {}",
            names.len(),
            kind,
            if names.len() == 1 { "" } else { "s" },
            listed
        ),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signature::Parameter;
    use std::sync::Arc;

    fn full_signature() -> Arc<FunctionSignature> {
        FunctionSignature::builder("f")
            .arg("a", None)
            .param(Parameter::new("b").default(Value::Int(2)))
            .param(Parameter::new("args").kind(ParameterKind::VarPositional))
            .param(Parameter::new("flag").kind(ParameterKind::KeywordOnly))
            .param(Parameter::new("kwargs").kind(ParameterKind::VarKeyword))
            .build()
            .unwrap()
    }

    #[test]
    fn test_positional_and_defaults() {
        let sig = full_signature();
        let args = CallArgs::positional(vec![Value::Int(1)]).with_keyword("flag", true);
        let binding = bind(&sig, args).unwrap();

        assert_eq!(binding.get("a"), Some(&Value::Int(1)));
        assert_eq!(binding.get("b"), Some(&Value::Int(2)));
        assert_eq!(binding.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(binding.var_positional("args"), Some(&[][..]));
        assert!(binding.var_keyword("kwargs").unwrap().is_empty());
    }

    #[test]
    fn test_variadic_buckets() {
        let sig = full_signature();
        let args = CallArgs::positional(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            .with_keyword("flag", false)
            .with_keyword("extra", "x");
        let binding = bind(&sig, args).unwrap();

        assert_eq!(binding.var_positional("args"), Some(&[Value::Int(3)][..]));
        assert_eq!(
            binding.var_keyword("kwargs").and_then(|m| m.get("extra")),
            Some(&Value::from("x"))
        );
    }

    #[test]
    fn test_multiple_values() {
        let sig = full_signature();
        let args = CallArgs::positional(vec![Value::Int(1)])
            .with_keyword("a", Value::Int(5))
            .with_keyword("flag", true);
        let err = bind(&sig, args).unwrap_err();
        assert_eq!(err.to_string(), "f() got multiple values for argument 'a'");
    }

    #[test]
    fn test_too_many_positionals() {
        let sig = FunctionSignature::builder("g")
            .arg("x", None)
            .arg("y", None)
            .build()
            .unwrap();
        let args = CallArgs::positional(vec![Value::Int(1), Value::Int(2), Value::Int(3)]);
        let err = bind(&sig, args).unwrap_err();
        assert_eq!(
            err.to_string(),
            "g() takes 2 positional arguments but 3 were given"
        );
    }

    #[test]
    fn test_unexpected_keyword() {
        let sig = FunctionSignature::builder("g").arg("x", None).build().unwrap();
        let args = CallArgs::positional(vec![Value::Int(1)]).with_keyword("z", Value::Int(0));
        let err = bind(&sig, args).unwrap_err();
        assert_eq!(err.to_string(), "g() got an unexpected keyword argument 'z'");
    }

    #[test]
    fn test_missing_required() {
        let sig = full_signature();
        let err = bind(&sig, CallArgs::default()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "f() missing 1 required positional argument: 'a'"
        );

        let err = bind(&sig, CallArgs::positional(vec![Value::Int(1)])).unwrap_err();
        assert_eq!(
            err.to_string(),
            "f() missing 1 required keyword-only argument: 'flag'"
        );
    }

    #[test]
    fn test_keyword_binds_positional_slot() {
        let sig = full_signature();
        let args = CallArgs::default()
            .with_keyword("b", Value::Int(7))
            .with_keyword("a", Value::Int(6))
            .with_keyword("flag", true);
        let binding = bind(&sig, args).unwrap();
        assert_eq!(binding.get("a"), Some(&Value::Int(6)));
        assert_eq!(binding.get("b"), Some(&Value::Int(7)));
    }

    #[test]
    fn test_into_call_args_preserves_order() {
        let sig = full_signature();
        let args = CallArgs::positional(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
            .with_keyword("flag", true)
            .with_keyword("extra", Value::Int(9));
        let rebuilt = bind(&sig, args).unwrap().into_call_args(&sig);

        assert_eq!(
            rebuilt.positional,
            vec![Value::Int(1), Value::Int(2), Value::Int(3)]
        );
        assert_eq!(rebuilt.keywords.get("flag"), Some(&Value::Bool(true)));
        assert_eq!(rebuilt.keywords.get("extra"), Some(&Value::Int(9)));
        assert_eq!(rebuilt.keywords.len(), 2);
    }
}
