// Model System Editor - Library exports for tests and benchmarks

pub mod catalog;
pub mod command;
pub mod config;
pub mod editing;
pub mod messaging;
pub mod model;
pub mod project;

// Re-export commonly used types for convenience
pub use catalog::parser::{DefaultValueParser, ValueParser, ValueType};
pub use catalog::{
    ModuleCatalog, ModuleDescriptor, ModuleType, ParameterDescriptor, SlotDescriptor,
    StaticCatalog, TypeConstraint,
};
pub use command::{EditCommand, EditError, EditResult, ErrorKind, HistoryStack, UndoableCommand};
pub use config::{ConfigError, SessionConfig};
pub use editing::{
    ActiveRun, CopyBuffer, EditingSession, LinkedParameterModel, LinkedParametersModel,
    ParameterModel, StructureModel,
};
pub use messaging::{ChangeConsumer, ChangeEvent, NodeProperty, Notification};
pub use model::{GroupId, ModelSystem, NodeId, ParameterId};
pub use project::{ModelSystemDocument, ModelSystemStore, PersistenceError, RonFileStore};
