//! Interface construction settings.

use serde::{Deserialize, Serialize};

/// Name given to interfaces built without one.
pub const UNNAMED: &str = "unnamed";

/// Settings applied while building an interface.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContractConfig {
    /// Method names starting with this prefix are reserved for internal
    /// members and rejected. Default: `"_"`.
    pub reserved_prefix: String,
    /// Display name of interfaces built without one. Default: `"unnamed"`.
    pub default_name: String,
}

impl Default for ContractConfig {
    fn default() -> Self {
        ContractConfig {
            reserved_prefix: "_".to_string(),
            default_name: UNNAMED.to_string(),
        }
    }
}

impl ContractConfig {
    /// True if `name` may not be declared as an interface method.
    pub fn is_reserved(&self, name: &str) -> bool {
        !self.reserved_prefix.is_empty() && name.starts_with(&self.reserved_prefix)
    }
}
