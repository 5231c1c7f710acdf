// Command Pattern for Undo/Redo functionality
//
// Every edit to a model system is an UndoableCommand. The editing session runs
// commands and keeps them in two bounded history stacks.
//
// Architecture:
// - UndoableCommand trait: execute(), undo(), redo(), description()
// - EditCommand: tagged union of the concrete commands
// - HistoryStack: fixed capacity ring buffer for undo and redo entries
// - CommandGroup: several commands committed as one history entry

pub mod commands;
pub mod group;
pub mod history;
pub mod linked;
pub mod parameter;
pub mod paste;
pub mod structure;
pub mod trait_def;

pub use commands::EditCommand;
pub use group::CommandGroup;
pub use history::{HistoryError, HistoryStack};
pub use linked::{
    AddParameterToLinkedParameterCommand, NewLinkedParameterCommand,
    RemoveLinkedParameterCommand, RemoveParameterFromLinkedParameterCommand,
    SetLinkedParameterNameCommand, SetLinkedParameterValueCommand,
};
pub use parameter::{SetParameterFlagCommand, SetParameterNameCommand, SetParameterValueCommand};
pub use paste::{PasteModuleCommand, PasteOutcome};
pub use structure::{
    AddCollectionMemberCommand, MoveCollectionMemberCommand, RemoveAllCollectionMembersCommand,
    RemoveCollectionMemberCommand, SetMetaModuleCommand, SetModuleDescriptionCommand,
    SetModuleDisabledCommand, SetModuleNameCommand, SetModuleTypeCommand,
};
pub use trait_def::{EditError, EditResult, ErrorKind, UndoableCommand};
