//! Callable functions and their introspectable metadata

use crate::binder::{bind, CallArgs, CallBinding};
use crate::error::Result;
use crate::signature::FunctionSignature;
use crate::value::Value;
use std::fmt;
use std::sync::Arc;

/// Host call interface
///
/// Everything a caller can learn about a function without calling it comes
/// from [`Callable::signature`].
pub trait Callable: Send + Sync {
    /// Shared signature and metadata
    fn signature(&self) -> &Arc<FunctionSignature>;

    /// Invoke with actual arguments
    fn call(&self, args: CallArgs) -> Result<Value>;

    fn name(&self) -> &str {
        &self.signature().name
    }

    fn qualname(&self) -> &str {
        &self.signature().qualname
    }

    fn doc(&self) -> Option<&str> {
        self.signature().doc.as_deref()
    }
}

type Body = dyn Fn(&CallBinding) -> Result<Value> + Send + Sync;

/// A Rust closure exposed through a declared signature.
///
/// The body receives the call already bound to parameter names.
#[derive(Clone)]
pub struct NativeFunction {
    signature: Arc<FunctionSignature>,
    body: Arc<Body>,
}

impl NativeFunction {
    pub fn new<F>(signature: Arc<FunctionSignature>, body: F) -> Self
    where
        F: Fn(&CallBinding) -> Result<Value> + Send + Sync + 'static,
    {
        Self {
            signature,
            body: Arc::new(body),
        }
    }
}

impl Callable for NativeFunction {
    fn signature(&self) -> &Arc<FunctionSignature> {
        &self.signature
    }

    fn call(&self, args: CallArgs) -> Result<Value> {
        let binding = bind(&self.signature, args)?;
        (self.body)(&binding)
    }
}

impl fmt::Debug for NativeFunction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NativeFunction")
            .field("qualname", &self.signature.qualname)
            .finish()
    }
}
