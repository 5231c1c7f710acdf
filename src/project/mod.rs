// Model system persistence
//
// A session snapshots its tree into a ModelSystemDocument and hands it to a
// ModelSystemStore. The copy buffer reuses the same serializable types.

pub mod serialization;
pub mod store;
pub mod types;

pub use store::{ModelSystemStore, PersistenceError, RonFileStore};
pub use types::{
    DocumentMetadata, DocumentVersion, LinkedParameterSerializable, ModelSystemDocument,
    ModuleSerializable, ParameterPath, ParameterSerializable,
};
