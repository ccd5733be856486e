//! Method registry.
//!
//! Maps each [`Method`] to the handler that implements it. The registry is
//! filled once before the bridge starts and is only read afterwards, so it
//! is shared as `Arc<MethodRegistry>` without locking.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use thiserror::Error;

use crate::handler::{
    ApproveExport, ApproveImport, ApproveListing, ApproveNewAccount, ApproveSignData, ApproveTx,
    Handler, ShowError, ShowInfo,
};
use crate::method::Method;

/// Error type for registry operations.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RegistryError {
    /// A handler is already bound to this method.
    #[error("method {0} is already registered")]
    AlreadyRegistered(Method),

    /// No handler is bound to this name.
    #[error("method not found: {0}")]
    NotFound(String),
}

/// Registry of method handlers.
#[derive(Default)]
pub struct MethodRegistry {
    handlers: HashMap<Method, Arc<dyn Handler>>,
}

impl MethodRegistry {
    /// Create an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with a handler for every [`Method`].
    pub fn with_defaults() -> Self {
        let defaults: [(Method, Arc<dyn Handler>); 8] = [
            (Method::ApproveTx, Arc::new(ApproveTx)),
            (Method::ApproveSignData, Arc::new(ApproveSignData)),
            (Method::ApproveExport, Arc::new(ApproveExport)),
            (Method::ApproveImport, Arc::new(ApproveImport)),
            (Method::ApproveListing, Arc::new(ApproveListing)),
            (Method::ApproveNewAccount, Arc::new(ApproveNewAccount)),
            (Method::ShowError, Arc::new(ShowError)),
            (Method::ShowInfo, Arc::new(ShowInfo)),
        ];

        Self {
            handlers: defaults.into_iter().collect(),
        }
    }

    /// Bind `handler` to `method`.
    ///
    /// # Errors
    ///
    /// Returns [`RegistryError::AlreadyRegistered`] if the method already has
    /// a handler; the existing binding is kept.
    pub fn register(
        &mut self,
        method: Method,
        handler: impl Handler + 'static,
    ) -> Result<(), RegistryError> {
        if self.handlers.contains_key(&method) {
            return Err(RegistryError::AlreadyRegistered(method));
        }
        self.handlers.insert(method, Arc::new(handler));
        Ok(())
    }

    /// Find the handler for a wire method name.
    pub fn lookup(&self, name: &str) -> Result<Arc<dyn Handler>, RegistryError> {
        name.parse::<Method>()
            .ok()
            .and_then(|method| self.handlers.get(&method))
            .cloned()
            .ok_or_else(|| RegistryError::NotFound(name.to_string()))
    }

    /// Registered methods, in declaration order.
    pub fn methods(&self) -> Vec<Method> {
        let mut methods: Vec<Method> = self.handlers.keys().copied().collect();
        methods.sort();
        methods
    }

    /// Number of registered handlers.
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    /// Whether no handler is registered.
    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}

impl fmt::Debug for MethodRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodRegistry")
            .field("methods", &self.methods())
            .finish()
    }
}
