//! Checked objects: the enforcing, narrowing wrapper produced by
//! [`Interface::check`](crate::Interface::check).
//!
//! A [`CheckedObject`] holds one delegate and the interface that produced it.
//! Its only members are the interface's methods, each forwarding to the
//! delegate's same-named member through the method's signature. Wrapping a
//! checked object with another interface therefore hides every method the
//! new interface does not name.

use std::any::Any;
use std::fmt;

use indexmap::IndexMap;

use precaution_core::{ContractError, Function, Object, SelfIdentity, Value};

use crate::interface::Interface;

pub struct CheckedObject {
    delegate: Value,
    interface: Interface,
    methods: IndexMap<String, Function>,
}

impl CheckedObject {
    /// Validates `delegate` against `interface` and binds every required
    /// method.
    ///
    /// Forwarders call the delegate's member with the delegate as receiver;
    /// the wrapped signature sees the checked object as receiver.
    pub fn new(interface: Interface, delegate: Value) -> Result<Self, ContractError> {
        let mut methods = IndexMap::with_capacity(interface.len());
        for (name, signature) in interface.methods() {
            let member = delegate
                .member(name)
                .filter(|member| !member.is_absent())
                .ok_or_else(|| ContractError::MissingMethod { name: name.clone() })?;
            let target = match member {
                Value::Function(function) => function,
                other => {
                    return Err(ContractError::NotInvocable {
                        name: name.clone(),
                        found: other.type_tag(),
                    })
                }
            };

            let receiver = delegate.clone();
            let forward = Function::new(move |_, args| target.call_with(&receiver, args));
            methods.insert(name.clone(), signature.check(&forward));
        }

        Ok(CheckedObject {
            delegate,
            interface,
            methods,
        })
    }

    /// The wrapped value.
    pub fn delegate(&self) -> &Value {
        &self.delegate
    }

    /// The interface this object was produced by.
    pub fn interface(&self) -> &Interface {
        &self.interface
    }
}

impl Object for CheckedObject {
    fn member(&self, name: &str) -> Option<Value> {
        self.methods.get(name).cloned().map(Value::Function)
    }

    fn member_names(&self) -> Vec<String> {
        self.methods.keys().cloned().collect()
    }

    fn self_identity(&self) -> SelfIdentity {
        // Delegates that accept anything as "self" (spies) stay lenient
        // through any number of wrapping layers.
        match &self.delegate {
            Value::Object(object) if matches!(object.self_identity(), SelfIdentity::Any) => {
                SelfIdentity::Any
            }
            delegate => SelfIdentity::Delegate(delegate.clone()),
        }
    }

    fn type_name(&self) -> &str {
        "CheckedObject"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for CheckedObject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CheckedObject")
            .field("interface", &self.interface.name())
            .field("delegate", &self.delegate)
            .field("methods", &self.methods.keys().collect::<Vec<_>>())
            .finish()
    }
}
