// Editing layer - the session and the handles callers edit through
//
// Handles borrow an EditingSession and turn each mutation into an
// EditCommand; the session owns the model, the history and the run gate.

pub mod clipboard;
pub mod linked;
pub mod parameter;
pub mod run;
pub mod session;
pub mod structure;

pub use clipboard::{CopiedModule, CopyBuffer, copy_module, copy_modules};
pub use linked::{LinkedParameterModel, LinkedParametersModel};
pub use parameter::ParameterModel;
pub use run::{ActiveRun, RunTracker};
pub use session::EditingSession;
pub use structure::StructureModel;
