//! The spy object.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Mutex};

use indexmap::IndexMap;

use precaution_core::{ContractError, Function, Object, SelfIdentity, Value};

use crate::method::{lock, SpyMethod};

struct Installed {
    stub: Function,
    method: Arc<SpyMethod>,
}

/// A test double that grows whatever methods it is asked for.
///
/// Methods are installed explicitly with [`method`](Self::method) and
/// [`method_with`](Self::method_with), or implicitly when an interface is
/// checked against the spy. The first installation of a name wins.
///
/// As the receiver of a `returns_self` contract a spy accepts any result and
/// hands itself back.
#[derive(Default)]
pub struct Spy {
    installed: Mutex<IndexMap<String, Installed>>,
    children: Mutex<Vec<Arc<Spy>>>,
}

/// Creates an empty spy.
pub fn spy() -> Arc<Spy> {
    Spy::new()
}

impl Spy {
    pub fn new() -> Arc<Spy> {
        Arc::new(Spy::default())
    }

    /// Creates a spy that is verified along with this one.
    pub fn child(&self) -> Arc<Spy> {
        let child = Spy::new();
        lock(&self.children).push(child.clone());
        child
    }

    /// Installs a stub that records calls and returns undefined.
    pub fn method(&self, name: &str) -> &Self {
        self.install(name, SpyMethod::new());
        self
    }

    /// Installs a stub backed by `method`. Ignored if `name` is installed.
    pub fn method_with(&self, name: &str, method: SpyMethod) -> &Self {
        self.install(name, method);
        self
    }

    fn install(&self, name: &str, method: SpyMethod) -> bool {
        let mut installed = lock(&self.installed);
        if installed.contains_key(name) {
            return false;
        }
        let method = Arc::new(method);
        let backing = method.clone();
        let stub = Function::new(move |this, args| backing.invoke(this, args));
        installed.insert(name.to_string(), Installed { stub, method });
        true
    }

    pub fn has_method(&self, name: &str) -> bool {
        lock(&self.installed).contains_key(name)
    }

    /// The method backing the stub called `name`.
    pub fn spy_method(&self, name: &str) -> Option<Arc<SpyMethod>> {
        lock(&self.installed)
            .get(name)
            .map(|installed| installed.method.clone())
    }

    pub fn children(&self) -> Vec<Arc<Spy>> {
        lock(&self.children).clone()
    }

    /// Checks every expectation on this spy, then on its children.
    ///
    /// Fails with the first unresolved method in installation order.
    pub fn verify(&self) -> Result<(), ContractError> {
        let methods: Vec<(String, Arc<SpyMethod>)> = lock(&self.installed)
            .iter()
            .map(|(name, installed)| (name.clone(), installed.method.clone()))
            .collect();
        for (name, method) in methods {
            if !method.verify() {
                tracing::debug!("spy expectation on {} unresolved", name);
                return Err(ContractError::UnresolvedExpectation { method: name });
            }
        }
        for child in self.children() {
            child.verify()?;
        }
        Ok(())
    }
}

impl Object for Spy {
    fn member(&self, name: &str) -> Option<Value> {
        lock(&self.installed)
            .get(name)
            .map(|installed| Value::Function(installed.stub.clone()))
    }

    fn member_names(&self) -> Vec<String> {
        lock(&self.installed).keys().cloned().collect()
    }

    fn self_identity(&self) -> SelfIdentity {
        SelfIdentity::Any
    }

    fn fulfill(&self, method: &str) {
        if self.install(method, SpyMethod::new()) {
            tracing::debug!("spy stubbed missing method {}", method);
        }
    }

    fn type_name(&self) -> &str {
        "Spy"
    }

    fn as_any(&self) -> &dyn Any {
        self
    }
}

impl fmt::Debug for Spy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Spy")
            .field("methods", &self.member_names())
            .field("children", &lock(&self.children).len())
            .finish()
    }
}
