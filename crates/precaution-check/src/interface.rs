//! Interfaces: named sets of required methods.
//!
//! An [`Interface`] maps method names to [`Signature`]s. It is built once
//! with [`InterfaceBuilder`] and then shared freely; [`Interface::check`] is
//! the only place contracts get attached to values.
//!
//! Identity matters: re-applying the *same* interface instance to its own
//! checked object is a no-op, while any other interface (even one with the
//! same name) wraps again and narrows the visible surface.

use std::fmt;
use std::sync::Arc;

use indexmap::IndexMap;

use precaution_core::{ContractError, InterfaceId, Value};

use crate::checked::CheckedObject;
use crate::config::ContractConfig;
use crate::signature::Signature;

struct InterfaceInner {
    id: InterfaceId,
    name: String,
    methods: IndexMap<String, Signature>,
}

/// An immutable, shareable interface.
#[derive(Clone)]
pub struct Interface {
    inner: Arc<InterfaceInner>,
}

impl Interface {
    /// Starts an unnamed interface.
    pub fn builder() -> InterfaceBuilder {
        InterfaceBuilder::new(None)
    }

    /// Starts an interface with a display name.
    pub fn named(name: impl Into<String>) -> InterfaceBuilder {
        InterfaceBuilder::new(Some(name.into()))
    }

    pub fn id(&self) -> InterfaceId {
        self.inner.id
    }

    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Required method names in declaration order.
    pub fn method_names(&self) -> impl Iterator<Item = &str> {
        self.inner.methods.keys().map(String::as_str)
    }

    pub fn signature(&self, method: &str) -> Option<&Signature> {
        self.inner.methods.get(method)
    }

    pub fn requires(&self, method: &str) -> bool {
        self.inner.methods.contains_key(method)
    }

    pub fn len(&self) -> usize {
        self.inner.methods.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.methods.is_empty()
    }

    /// Identity comparison. Names are ignored.
    pub fn is(&self, other: &Interface) -> bool {
        self.inner.id == other.inner.id
    }

    pub(crate) fn methods(&self) -> impl Iterator<Item = (&String, &Signature)> {
        self.inner.methods.iter()
    }

    /// Attaches this interface to `value`, returning a checked object that
    /// exposes exactly the required methods.
    ///
    /// - A checked object produced by this very interface is returned as is.
    /// - Objects that auto-fulfill (spies) get stubs for missing methods.
    /// - Otherwise every required method must exist and be a function.
    pub fn check(&self, value: &Value) -> Result<Value, ContractError> {
        if let Some(checked) = value.downcast::<CheckedObject>() {
            if checked.interface().is(self) {
                tracing::debug!("interface {} already applied, reusing wrapper", self.name());
                return Ok(value.clone());
            }
        }

        if let Value::Object(object) = value {
            for name in self.inner.methods.keys() {
                object.fulfill(name);
            }
        }

        tracing::debug!(
            "applying interface {} ({} method(s)) to {}",
            self.name(),
            self.len(),
            value.describe()
        );
        let checked = CheckedObject::new(self.clone(), value.clone())?;
        Ok(Value::object(checked))
    }
}

impl fmt::Debug for Interface {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Interface")
            .field("id", &self.inner.id)
            .field("name", &self.inner.name)
            .field("methods", &self.inner.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}

/// Builder for [`Interface`].
///
/// Declaring a reserved or already-present method name fails immediately.
/// [`and`](Self::and) merges another interface's methods; on a name
/// collision the merged-in signature replaces the existing one.
pub struct InterfaceBuilder {
    name: Option<String>,
    config: ContractConfig,
    methods: IndexMap<String, Signature>,
}

impl InterfaceBuilder {
    fn new(name: Option<String>) -> Self {
        InterfaceBuilder {
            name,
            config: ContractConfig::default(),
            methods: IndexMap::new(),
        }
    }

    pub fn with_config(mut self, config: ContractConfig) -> Self {
        self.config = config;
        self
    }

    /// Requires `name` with no constraints on its calls.
    pub fn method(self, name: &str) -> Result<Self, ContractError> {
        self.method_with(name, Signature::unconstrained())
    }

    /// Requires `name`, enforcing `signature` on every call.
    pub fn method_with(mut self, name: &str, signature: Signature) -> Result<Self, ContractError> {
        if self.config.is_reserved(name) {
            return Err(ContractError::ReservedMethodName {
                name: name.to_string(),
                prefix: self.config.reserved_prefix.clone(),
            });
        }
        if self.methods.contains_key(name) {
            return Err(ContractError::DuplicateMethod {
                interface: self.display_name().to_string(),
                name: name.to_string(),
            });
        }
        self.methods.insert(name.to_string(), signature);
        Ok(self)
    }

    /// Merges `other`'s methods into this interface. Later merges win.
    pub fn and(mut self, other: &Interface) -> Self {
        for (name, signature) in other.methods() {
            self.methods.insert(name.clone(), signature.clone());
        }
        self
    }

    pub fn build(self) -> Interface {
        let name = self.name.unwrap_or(self.config.default_name);
        Interface {
            inner: Arc::new(InterfaceInner {
                id: InterfaceId::fresh(),
                name,
                methods: self.methods,
            }),
        }
    }

    fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or(self.config.default_name.as_str())
    }
}
