// UndoableCommand trait definition

use crate::model::ModelSystem;

/// Result type for editing operations
pub type EditResult<T> = Result<T, EditError>;

/// Errors returned by editing operations
///
/// Every failing entry point leaves the model system unchanged.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    #[error("You can not edit a model system while it is running.")]
    ModelSystemRunning,

    #[error("Invalid index {index}: {reason}")]
    InvalidIndex { index: usize, reason: String },

    #[error("You can only do this on a collection!")]
    NotACollection,

    #[error("There were no modules to delete in the collection!")]
    EmptyCollection,

    #[error("The module is required and can not be {0}!")]
    RequiredModule(String),

    #[error("The module no longer exists in the model system.")]
    MissingNode,

    #[error("The parameter no longer exists in the model system.")]
    MissingParameter,

    #[error("The linked parameter was not found!")]
    MissingLinkedParameter,

    #[error("The parameter was already contained in the linked parameter!")]
    AlreadyLinked,

    #[error("The parameter does not exist inside of the linked parameter!")]
    NotLinked,

    #[error("Undo and redo are not available while a grouped edit is in progress.")]
    GroupInProgress,

    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Parse(String),

    #[error("There was nothing to undo.")]
    NothingToUndo,

    #[error("There was nothing to redo.")]
    NothingToRedo,

    #[error("The model system has changed and has not been saved.")]
    UnsavedChanges,

    #[error("Unable to save the model system: {0}")]
    Persistence(String),

    #[error("Unable to decode the copy buffer: {0}")]
    ClipboardDecode(String),
}

/// Broad classification of [`EditError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The edit was not allowed in the current situation
    Precondition,
    /// A value or module did not pass type checking
    Validation,
    /// History or session state did not allow the request
    State,
    /// Saving or decoding failed
    Persistence,
}

impl EditError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EditError::ModelSystemRunning
            | EditError::InvalidIndex { .. }
            | EditError::NotACollection
            | EditError::EmptyCollection
            | EditError::RequiredModule(_)
            | EditError::MissingNode
            | EditError::MissingParameter
            | EditError::MissingLinkedParameter
            | EditError::AlreadyLinked
            | EditError::NotLinked
            | EditError::GroupInProgress => ErrorKind::Precondition,
            EditError::Validation(_) | EditError::Parse(_) => ErrorKind::Validation,
            EditError::NothingToUndo | EditError::NothingToRedo | EditError::UnsavedChanges => {
                ErrorKind::State
            }
            EditError::Persistence(_) | EditError::ClipboardDecode(_) => ErrorKind::Persistence,
        }
    }

    pub(crate) fn invalid_index(index: usize, reason: impl Into<String>) -> Self {
        EditError::InvalidIndex {
            index,
            reason: reason.into(),
        }
    }
}

/// Trait for commands that support undo/redo
///
/// All edits to a model system go through this trait so the editing session can
/// keep its history. A command captures whatever it needs to reverse itself
/// (old value, old index, detached children) the first time it executes.
///
/// # Example
/// ```no_run
/// use model_system_editor::command::trait_def::{EditResult, UndoableCommand};
/// use model_system_editor::model::ModelSystem;
///
/// struct CountEdits {
///     applied: bool,
/// }
///
/// impl UndoableCommand for CountEdits {
///     fn execute(&mut self, _model: &mut ModelSystem) -> EditResult<()> {
///         self.applied = true;
///         Ok(())
///     }
///
///     fn undo(&mut self, _model: &mut ModelSystem) -> EditResult<()> {
///         self.applied = false;
///         Ok(())
///     }
///
///     fn description(&self) -> String {
///         "Count Edits".to_string()
///     }
/// }
/// ```
pub trait UndoableCommand: Send {
    /// Apply the command for the first time
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()>;

    /// Restore the state captured by `execute`
    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()>;

    /// Re-apply after an undo
    ///
    /// Defaults to running `execute` again; commands that allocate nodes or
    /// groups override this to reattach what they created the first time.
    fn redo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        self.execute(model)
    }

    /// Human-readable label, used for "Undo: ..." menus
    fn description(&self) -> String;

    /// Commands without a meaningful inverse return false and are never kept in history
    fn can_undo(&self) -> bool {
        true
    }
}
