pub mod error;
pub mod id;
pub mod object;
pub mod value;

// Re-export commonly used types
pub use error::ContractError;
pub use id::{InterfaceId, SignatureId};
pub use object::{Object, Record, RecordBuilder, SelfIdentity};
pub use value::{Function, NativeFn, TypeTag, Value};
