// CommandGroup - several buffered commands committed as one history entry

use crate::command::commands::EditCommand;
use crate::command::trait_def::{EditResult, UndoableCommand};
use crate::model::ModelSystem;

/// Commands run inside a grouping context
///
/// The constituents have already executed by the time the group is built, so
/// `execute` does nothing; only `undo` and `redo` replay them.
pub struct CommandGroup {
    label: String,
    commands: Vec<EditCommand>,
}

impl CommandGroup {
    pub fn new(label: impl Into<String>, commands: Vec<EditCommand>) -> Self {
        Self {
            label: label.into(),
            commands,
        }
    }

    pub fn len(&self) -> usize {
        self.commands.len()
    }

    pub fn is_empty(&self) -> bool {
        self.commands.is_empty()
    }

    /// Descriptions of the constituent commands in execution order
    pub fn descriptions(&self) -> Vec<String> {
        self.commands.iter().map(|c| c.description()).collect()
    }
}

/// Undo `commands` in reverse order
///
/// If one fails, the ones already undone are redone so the model is left as
/// it was before the call.
pub(crate) fn undo_all(commands: &mut [EditCommand], model: &mut ModelSystem) -> EditResult<()> {
    for index in (0..commands.len()).rev() {
        if !commands[index].can_undo() {
            continue;
        }
        if let Err(e) = commands[index].undo(model) {
            tracing::error!(
                "undo of '{}' failed inside a group: {}",
                commands[index].description(),
                e
            );
            for command in commands[index + 1..].iter_mut().filter(|c| c.can_undo()) {
                if let Err(e) = command.redo(model) {
                    tracing::error!("unable to reapply '{}': {}", command.description(), e);
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

/// Redo `commands` in original order, reverting the prefix on failure
pub(crate) fn redo_all(commands: &mut [EditCommand], model: &mut ModelSystem) -> EditResult<()> {
    for index in 0..commands.len() {
        if !commands[index].can_undo() {
            continue;
        }
        if let Err(e) = commands[index].redo(model) {
            tracing::error!(
                "redo of '{}' failed inside a group: {}",
                commands[index].description(),
                e
            );
            for command in commands[..index].iter_mut().rev().filter(|c| c.can_undo()) {
                if let Err(e) = command.undo(model) {
                    tracing::error!("unable to revert '{}': {}", command.description(), e);
                }
            }
            return Err(e);
        }
    }
    Ok(())
}

impl UndoableCommand for CommandGroup {
    fn execute(&mut self, _model: &mut ModelSystem) -> EditResult<()> {
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        undo_all(&mut self.commands, model)
    }

    fn redo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        redo_all(&mut self.commands, model)
    }

    fn description(&self) -> String {
        self.label.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::structure::SetModuleNameCommand;
    use crate::command::trait_def::EditError;
    use crate::model::tests::configured_model;

    /// Executes fine, then fails on undo or redo as asked
    struct Flaky {
        fail_undo: bool,
        fail_redo: bool,
    }

    impl UndoableCommand for Flaky {
        fn execute(&mut self, _model: &mut ModelSystem) -> EditResult<()> {
            Ok(())
        }

        fn undo(&mut self, _model: &mut ModelSystem) -> EditResult<()> {
            if self.fail_undo {
                return Err(EditError::Validation("undo failed".into()));
            }
            Ok(())
        }

        fn redo(&mut self, _model: &mut ModelSystem) -> EditResult<()> {
            if self.fail_redo {
                return Err(EditError::Validation("redo failed".into()));
            }
            Ok(())
        }

        fn description(&self) -> String {
            "Flaky".to_string()
        }
    }

    #[test]
    fn test_execute_is_a_no_op() {
        let mut model = configured_model();
        let root = model.root();
        let mut group = CommandGroup::new(
            "Rename",
            vec![SetModuleNameCommand::new(root, "Other").into()],
        );

        group.execute(&mut model).unwrap();
        assert_eq!(model.node(root).unwrap().name(), "Test");
        assert_eq!(group.description(), "Rename");
    }

    #[test]
    fn test_undo_reverse_redo_forward() {
        let mut model = configured_model();
        let root = model.root();
        let mut first: EditCommand = SetModuleNameCommand::new(root, "A").into();
        let mut second: EditCommand = SetModuleNameCommand::new(root, "B").into();
        first.execute(&mut model).unwrap();
        second.execute(&mut model).unwrap();

        let mut group = CommandGroup::new("Renames", vec![first, second]);
        assert_eq!(group.len(), 2);

        group.undo(&mut model).unwrap();
        assert_eq!(model.node(root).unwrap().name(), "Test");

        group.redo(&mut model).unwrap();
        assert_eq!(model.node(root).unwrap().name(), "B");
    }

    #[test]
    fn test_failed_undo_reapplies_later_commands() {
        let mut model = configured_model();
        let root = model.root();
        let mut flaky = EditCommand::custom(Flaky {
            fail_undo: true,
            fail_redo: false,
        });
        let mut rename: EditCommand = SetModuleNameCommand::new(root, "B").into();
        flaky.execute(&mut model).unwrap();
        rename.execute(&mut model).unwrap();

        let mut group = CommandGroup::new("Mixed", vec![flaky, rename]);
        assert_eq!(
            group.undo(&mut model),
            Err(EditError::Validation("undo failed".into()))
        );
        // the rename was undone first, then reapplied
        assert_eq!(model.node(root).unwrap().name(), "B");
    }

    #[test]
    fn test_failed_redo_reverts_earlier_commands() {
        let mut model = configured_model();
        let root = model.root();
        let mut rename: EditCommand = SetModuleNameCommand::new(root, "A").into();
        let mut flaky = EditCommand::custom(Flaky {
            fail_undo: false,
            fail_redo: true,
        });
        rename.execute(&mut model).unwrap();
        flaky.execute(&mut model).unwrap();

        let mut group = CommandGroup::new("Mixed", vec![rename, flaky]);
        group.undo(&mut model).unwrap();
        assert_eq!(model.node(root).unwrap().name(), "Test");

        assert!(group.redo(&mut model).is_err());
        assert_eq!(model.node(root).unwrap().name(), "Test");
    }
}
