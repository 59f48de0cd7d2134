pub mod entity;
pub mod error;
pub mod value;

pub use entity::{Entity, EntityId, Patch};
pub use error::{FlowError, Result};
pub use value::Value;
