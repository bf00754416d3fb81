//! Automatic argument and return coercion
//!
//! [`Autocast::wrap`] turns any [`Callable`] into one that binds each call
//! against the wrapped function's signature, casts every declared parameter
//! (element-wise for variadic buckets), calls through, and casts the result
//! against the declared return type.
//!
//! ```
//! use typecast_core::{Autocast, Builtin, CallArgs, Callable, CasterPolicy};
//! use typecast_core::{FunctionSignature, NativeFunction, Value};
//!
//! let sig = FunctionSignature::builder("add")
//!     .arg("x", Some(Builtin::Int.shared()))
//!     .arg("y", Some(Builtin::Int.shared()))
//!     .returns(Builtin::Int.shared())
//!     .build()
//!     .unwrap();
//! let add = NativeFunction::new(sig, |b| {
//!     let x = b.get("x").and_then(Value::as_int).unwrap_or(0);
//!     let y = b.get("y").and_then(Value::as_int).unwrap_or(0);
//!     Ok(Value::Int(x + y))
//! });
//!
//! let add = Autocast::new(CasterPolicy::lenient()).wrap(add);
//! let args = CallArgs::positional(vec![Value::from("2"), Value::from("3")]);
//! assert_eq!(add.call(args).unwrap(), Value::Int(5));
//! ```

use crate::binder::{bind, Bound, CallArgs, CallBinding};
use crate::caster::{Caster, CasterPolicy};
use crate::error::Result;
use crate::function::Callable;
use crate::signature::FunctionSignature;
use crate::value::Value;
use std::sync::Arc;

/// Decorator factory holding the caster policy
#[derive(Debug, Clone, Copy, Default)]
pub struct Autocast {
    caster: Caster,
}

impl Autocast {
    pub fn new(policy: CasterPolicy) -> Self {
        Self {
            caster: Caster::new(policy),
        }
    }

    /// Wrap `function`; the wrapper shares its signature and metadata
    pub fn wrap<F: Callable>(&self, function: F) -> Autocasted<F> {
        tracing::debug!(
            "Autocasting {} (strict: {})",
            function.qualname(),
            self.caster.policy().strict
        );
        Autocasted {
            caster: self.caster,
            inner: function,
        }
    }
}

/// A function whose arguments and return value are coerced on every call
#[derive(Debug, Clone)]
pub struct Autocasted<F> {
    caster: Caster,
    inner: F,
}

impl<F: Callable> Autocasted<F> {
    /// The wrapped function
    pub fn inner(&self) -> &F {
        &self.inner
    }

    pub fn policy(&self) -> CasterPolicy {
        self.caster.policy()
    }

    fn cast_binding(
        &self,
        signature: &FunctionSignature,
        mut binding: CallBinding,
    ) -> Result<CallBinding> {
        for param in signature.params() {
            let Some(ty) = param.declared_type.as_deref() else {
                continue;
            };
            let Some(bound) = binding.take(&param.name) else {
                continue;
            };
            let recast = match bound {
                Bound::Single(value) => Bound::Single(self.caster.cast(value, Some(ty))?),
                Bound::VarPositional(items) => Bound::VarPositional(
                    items
                        .into_iter()
                        .map(|v| self.caster.cast(v, Some(ty)))
                        .collect::<Result<Vec<_>>>()?,
                ),
                Bound::VarKeyword(map) => Bound::VarKeyword(
                    map.into_iter()
                        .map(|(k, v)| Ok((k, self.caster.cast(v, Some(ty))?)))
                        .collect::<Result<_>>()?,
                ),
            };
            binding.insert(param.name.clone(), recast);
        }
        Ok(binding)
    }
}

impl<F: Callable> Callable for Autocasted<F> {
    fn signature(&self) -> &Arc<FunctionSignature> {
        self.inner.signature()
    }

    fn call(&self, args: CallArgs) -> Result<Value> {
        let signature = self.inner.signature();
        let binding = bind(signature, args)?;
        let binding = self.cast_binding(signature, binding)?;
        let result = self.inner.call(binding.into_call_args(signature))?;
        self.caster.cast(result, signature.return_type().map(|t| &**t))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::TypecastError;
    use crate::function::NativeFunction;
    use crate::signature::{Parameter, ParameterKind};
    use crate::types::Builtin;

    fn sum_floats(binding: &CallBinding) -> Result<Value> {
        let bar = binding.get("bar").and_then(Value::as_float);
        let baz = binding.get("baz").and_then(Value::as_float);
        match (bar, baz) {
            (Some(a), Some(b)) => Ok(Value::Float(a + b)),
            _ => Err(TypecastError::ExecutionError(
                "unsupported operand types".to_string(),
            )),
        }
    }

    fn scenario_a() -> NativeFunction {
        let sig = FunctionSignature::builder("f")
            .qualname("tests.f")
            .doc("Doc is preserved when wrapped")
            .arg("bar", Some(Builtin::Int.shared()))
            .arg("baz", Some(Builtin::Float.shared()))
            .returns(Builtin::Int.shared())
            .build()
            .unwrap();
        NativeFunction::new(sig, |b| {
            assert!(matches!(b.get("bar"), Some(Value::Int(_))));
            assert!(matches!(b.get("baz"), Some(Value::Float(_))));
            sum_floats(b)
        })
    }

    #[test]
    fn test_strict_argument_and_return_cast() {
        let f = Autocast::new(CasterPolicy::strict()).wrap(scenario_a());
        let args = CallArgs::positional(vec![Value::Int(5), Value::from("4.2")]);
        assert_eq!(f.call(args).unwrap(), Value::Int(9));
    }

    #[test]
    fn test_metadata_preserved() {
        let original = scenario_a();
        let wrapped = Autocast::default().wrap(original.clone());

        assert_eq!(wrapped.name(), original.name());
        assert_eq!(wrapped.qualname(), "tests.f");
        assert_eq!(wrapped.doc(), Some("Doc is preserved when wrapped"));
        assert!(Arc::ptr_eq(wrapped.signature(), original.signature()));
    }

    #[test]
    fn test_lenient_add() {
        let sig = FunctionSignature::builder("add")
            .arg("x", Some(Builtin::Int.shared()))
            .arg("y", Some(Builtin::Int.shared()))
            .returns(Builtin::Int.shared())
            .build()
            .unwrap();
        let add = NativeFunction::new(sig, |b| {
            let x = b.get("x").and_then(Value::as_int).unwrap_or_default();
            let y = b.get("y").and_then(Value::as_int).unwrap_or_default();
            Ok(Value::Int(x + y))
        });
        let add = Autocast::new(CasterPolicy::lenient()).wrap(add);

        let args = CallArgs::positional(vec![Value::from("2"), Value::from("3")]);
        assert_eq!(add.call(args).unwrap(), Value::Int(5));
    }

    #[test]
    fn test_var_positional_elements_cast() {
        let sig = FunctionSignature::builder("f")
            .param(
                Parameter::new("args")
                    .kind(ParameterKind::VarPositional)
                    .typed(Builtin::Int.shared()),
            )
            .build()
            .unwrap();
        let f = NativeFunction::new(sig, |b| {
            Ok(Value::Array(b.var_positional("args").unwrap_or_default().to_vec()))
        });
        let f = Autocast::new(CasterPolicy::strict()).wrap(f);

        let args = CallArgs::positional(vec![Value::from("1"), Value::from("2")]);
        assert_eq!(
            f.call(args).unwrap(),
            Value::Array(vec![Value::Int(1), Value::Int(2)])
        );
    }

    #[test]
    fn test_keyword_only_and_var_keyword_cast() {
        let sig = FunctionSignature::builder("configure")
            .param(
                Parameter::new("retries")
                    .kind(ParameterKind::KeywordOnly)
                    .typed(Builtin::Int.shared()),
            )
            .param(
                Parameter::new("options")
                    .kind(ParameterKind::VarKeyword)
                    .typed(Builtin::Float.shared()),
            )
            .build()
            .unwrap();
        let f = NativeFunction::new(sig, |b| {
            assert_eq!(b.get("retries"), Some(&Value::Int(3)));
            let options = b.var_keyword("options").cloned().unwrap_or_default();
            Ok(Value::Object(options))
        });
        let f = Autocast::new(CasterPolicy::strict()).wrap(f);

        let args = CallArgs::default()
            .with_keyword("retries", "3")
            .with_keyword("timeout", "2.5");
        match f.call(args).unwrap() {
            Value::Object(map) => assert_eq!(map.get("timeout"), Some(&Value::Float(2.5))),
            other => panic!("unexpected result: {other}"),
        }
    }

    #[test]
    fn test_undeclared_parameters_untouched() {
        let sig = FunctionSignature::builder("ident")
            .arg("x", None)
            .build()
            .unwrap();
        let f = NativeFunction::new(sig, |b| Ok(b.get("x").cloned().unwrap_or(Value::Null)));
        let f = Autocast::new(CasterPolicy::strict()).wrap(f);

        for value in [Value::from("7"), Value::Float(1.5), Value::Null] {
            let args = CallArgs::positional(vec![value.clone()]);
            assert_eq!(f.call(args).unwrap(), value);
        }
    }

    #[test]
    fn test_strict_cast_failure_propagates() {
        let f = Autocast::new(CasterPolicy::strict()).wrap(scenario_a());
        let args = CallArgs::positional(vec![Value::from("five"), Value::Float(1.0)]);
        assert!(matches!(
            f.call(args),
            Err(TypecastError::CastError { .. })
        ));
    }

    #[test]
    fn test_binding_error_never_swallowed() {
        let f = Autocast::new(CasterPolicy::lenient()).wrap(scenario_a());
        let args = CallArgs::positional(vec![Value::Int(1)]);
        assert!(matches!(
            f.call(args),
            Err(TypecastError::BindingError { .. })
        ));
    }

    #[test]
    fn test_lenient_failure_reaches_body_unchanged() {
        let sig = FunctionSignature::builder("f")
            .arg("x", Some(Builtin::Int.shared()))
            .build()
            .unwrap();
        let f = NativeFunction::new(sig, |b| Ok(b.get("x").cloned().unwrap_or(Value::Null)));
        let f = Autocast::new(CasterPolicy::lenient()).wrap(f);

        let args = CallArgs::positional(vec![Value::from("nope")]);
        assert_eq!(f.call(args).unwrap(), Value::from("nope"));
    }

    #[test]
    fn test_shared_across_threads() {
        let f = Arc::new(Autocast::new(CasterPolicy::strict()).wrap(scenario_a()));
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let f = Arc::clone(&f);
                std::thread::spawn(move || {
                    let args = CallArgs::positional(vec![Value::Int(i), Value::from("0.5")]);
                    f.call(args)
                })
            })
            .collect();
        for (i, handle) in handles.into_iter().enumerate() {
            assert_eq!(handle.join().unwrap().unwrap(), Value::Int(i as i64));
        }
    }
}
