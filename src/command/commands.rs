// EditCommand - tagged union of every command the editing session records

use crate::command::group::CommandGroup;
use crate::command::linked::{
    AddParameterToLinkedParameterCommand, NewLinkedParameterCommand,
    RemoveLinkedParameterCommand, RemoveParameterFromLinkedParameterCommand,
    SetLinkedParameterNameCommand, SetLinkedParameterValueCommand,
};
use crate::command::parameter::{
    SetParameterFlagCommand, SetParameterNameCommand, SetParameterValueCommand,
};
use crate::command::paste::PasteModuleCommand;
use crate::command::structure::{
    AddCollectionMemberCommand, MoveCollectionMemberCommand, RemoveAllCollectionMembersCommand,
    RemoveCollectionMemberCommand, SetMetaModuleCommand, SetModuleDescriptionCommand,
    SetModuleDisabledCommand, SetModuleNameCommand, SetModuleTypeCommand,
};
use crate::command::trait_def::{EditResult, UndoableCommand};
use crate::model::ModelSystem;

/// One recorded edit
///
/// Each variant is a plain data record; the discriminant says which operation
/// it reverses. `Custom` carries commands defined outside this crate.
pub enum EditCommand {
    SetModuleType(SetModuleTypeCommand),
    AddCollectionMember(AddCollectionMemberCommand),
    RemoveCollectionMember(RemoveCollectionMemberCommand),
    RemoveAllCollectionMembers(RemoveAllCollectionMembersCommand),
    MoveCollectionMember(MoveCollectionMemberCommand),
    SetModuleName(SetModuleNameCommand),
    SetModuleDescription(SetModuleDescriptionCommand),
    SetModuleDisabled(SetModuleDisabledCommand),
    SetMetaModule(SetMetaModuleCommand),
    PasteModule(PasteModuleCommand),
    SetParameterValue(SetParameterValueCommand),
    SetParameterName(SetParameterNameCommand),
    SetParameterFlag(SetParameterFlagCommand),
    NewLinkedParameter(NewLinkedParameterCommand),
    RemoveLinkedParameter(RemoveLinkedParameterCommand),
    SetLinkedParameterName(SetLinkedParameterNameCommand),
    SetLinkedParameterValue(SetLinkedParameterValueCommand),
    AddParameterToLinkedParameter(AddParameterToLinkedParameterCommand),
    RemoveParameterFromLinkedParameter(RemoveParameterFromLinkedParameterCommand),
    Group(CommandGroup),
    Custom(Box<dyn UndoableCommand>),
}

macro_rules! dispatch {
    ($self:expr, $command:ident => $body:expr) => {
        match $self {
            EditCommand::SetModuleType($command) => $body,
            EditCommand::AddCollectionMember($command) => $body,
            EditCommand::RemoveCollectionMember($command) => $body,
            EditCommand::RemoveAllCollectionMembers($command) => $body,
            EditCommand::MoveCollectionMember($command) => $body,
            EditCommand::SetModuleName($command) => $body,
            EditCommand::SetModuleDescription($command) => $body,
            EditCommand::SetModuleDisabled($command) => $body,
            EditCommand::SetMetaModule($command) => $body,
            EditCommand::PasteModule($command) => $body,
            EditCommand::SetParameterValue($command) => $body,
            EditCommand::SetParameterName($command) => $body,
            EditCommand::SetParameterFlag($command) => $body,
            EditCommand::NewLinkedParameter($command) => $body,
            EditCommand::RemoveLinkedParameter($command) => $body,
            EditCommand::SetLinkedParameterName($command) => $body,
            EditCommand::SetLinkedParameterValue($command) => $body,
            EditCommand::AddParameterToLinkedParameter($command) => $body,
            EditCommand::RemoveParameterFromLinkedParameter($command) => $body,
            EditCommand::Group($command) => $body,
            EditCommand::Custom($command) => $body,
        }
    };
}

macro_rules! impl_from {
    ($($variant:ident($command:ty)),* $(,)?) => {
        $(
            impl From<$command> for EditCommand {
                fn from(command: $command) -> Self {
                    EditCommand::$variant(command)
                }
            }
        )*
    };
}

impl_from!(
    SetModuleType(SetModuleTypeCommand),
    AddCollectionMember(AddCollectionMemberCommand),
    RemoveCollectionMember(RemoveCollectionMemberCommand),
    RemoveAllCollectionMembers(RemoveAllCollectionMembersCommand),
    MoveCollectionMember(MoveCollectionMemberCommand),
    SetModuleName(SetModuleNameCommand),
    SetModuleDescription(SetModuleDescriptionCommand),
    SetModuleDisabled(SetModuleDisabledCommand),
    SetMetaModule(SetMetaModuleCommand),
    PasteModule(PasteModuleCommand),
    SetParameterValue(SetParameterValueCommand),
    SetParameterName(SetParameterNameCommand),
    SetParameterFlag(SetParameterFlagCommand),
    NewLinkedParameter(NewLinkedParameterCommand),
    RemoveLinkedParameter(RemoveLinkedParameterCommand),
    SetLinkedParameterName(SetLinkedParameterNameCommand),
    SetLinkedParameterValue(SetLinkedParameterValueCommand),
    AddParameterToLinkedParameter(AddParameterToLinkedParameterCommand),
    RemoveParameterFromLinkedParameter(RemoveParameterFromLinkedParameterCommand),
    Group(CommandGroup),
    Custom(Box<dyn UndoableCommand>),
);

impl EditCommand {
    /// Wrap a command type defined outside this crate
    pub fn custom(command: impl UndoableCommand + 'static) -> Self {
        EditCommand::Custom(Box::new(command))
    }

    /// Short name of the variant, used in log output
    pub fn kind(&self) -> &'static str {
        match self {
            EditCommand::SetModuleType(_) => "set_module_type",
            EditCommand::AddCollectionMember(_) => "add_collection_member",
            EditCommand::RemoveCollectionMember(_) => "remove_collection_member",
            EditCommand::RemoveAllCollectionMembers(_) => "remove_all_collection_members",
            EditCommand::MoveCollectionMember(_) => "move_collection_member",
            EditCommand::SetModuleName(_) => "set_module_name",
            EditCommand::SetModuleDescription(_) => "set_module_description",
            EditCommand::SetModuleDisabled(_) => "set_module_disabled",
            EditCommand::SetMetaModule(_) => "set_meta_module",
            EditCommand::PasteModule(_) => "paste_module",
            EditCommand::SetParameterValue(_) => "set_parameter_value",
            EditCommand::SetParameterName(_) => "set_parameter_name",
            EditCommand::SetParameterFlag(_) => "set_parameter_flag",
            EditCommand::NewLinkedParameter(_) => "new_linked_parameter",
            EditCommand::RemoveLinkedParameter(_) => "remove_linked_parameter",
            EditCommand::SetLinkedParameterName(_) => "set_linked_parameter_name",
            EditCommand::SetLinkedParameterValue(_) => "set_linked_parameter_value",
            EditCommand::AddParameterToLinkedParameter(_) => "add_parameter_to_linked_parameter",
            EditCommand::RemoveParameterFromLinkedParameter(_) => {
                "remove_parameter_from_linked_parameter"
            }
            EditCommand::Group(_) => "group",
            EditCommand::Custom(_) => "custom",
        }
    }
}

impl UndoableCommand for EditCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        dispatch!(self, command => command.execute(model))
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        dispatch!(self, command => command.undo(model))
    }

    fn redo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        dispatch!(self, command => command.redo(model))
    }

    fn description(&self) -> String {
        dispatch!(self, command => command.description())
    }

    fn can_undo(&self) -> bool {
        dispatch!(self, command => command.can_undo())
    }
}

impl std::fmt::Debug for EditCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditCommand")
            .field("kind", &self.kind())
            .field("description", &self.description())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::command::trait_def::EditError;
    use crate::model::tests::configured_model;

    struct Refuses;

    impl UndoableCommand for Refuses {
        fn execute(&mut self, _model: &mut ModelSystem) -> EditResult<()> {
            Err(EditError::Validation("no".into()))
        }

        fn undo(&mut self, _model: &mut ModelSystem) -> EditResult<()> {
            Ok(())
        }

        fn description(&self) -> String {
            "Refuses".to_string()
        }

        fn can_undo(&self) -> bool {
            false
        }
    }

    #[test]
    fn test_dispatch_reaches_inner_command() {
        let mut model = configured_model();
        let root = model.root();
        let mut command: EditCommand = SetModuleNameCommand::new(root, "Demand").into();

        assert_eq!(command.kind(), "set_module_name");
        assert_eq!(command.description(), "Rename to Demand");
        command.execute(&mut model).unwrap();
        assert_eq!(model.node(root).unwrap().name(), "Demand");
        command.undo(&mut model).unwrap();
        assert_eq!(model.node(root).unwrap().name(), "Test");
    }

    #[test]
    fn test_custom_command() {
        let mut model = configured_model();
        let mut command = EditCommand::custom(Refuses);
        assert_eq!(command.kind(), "custom");
        assert!(!command.can_undo());
        assert!(command.execute(&mut model).is_err());
        assert!(format!("{:?}", command).contains("Refuses"));
    }
}
