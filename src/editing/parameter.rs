// ParameterModel - editing handle over one module parameter

use crate::catalog::ValueType;
use crate::command::{
    EditError, EditResult, SetParameterFlagCommand, SetParameterNameCommand,
    SetParameterValueCommand,
};
use crate::editing::linked::LinkedParameterModel;
use crate::editing::session::EditingSession;
use crate::editing::structure::StructureModel;
use crate::model::{Parameter, ParameterFlag, ParameterId};

#[derive(Clone, Copy)]
pub struct ParameterModel<'s> {
    session: &'s EditingSession,
    parameter: ParameterId,
}

impl<'s> ParameterModel<'s> {
    pub(crate) fn new(session: &'s EditingSession, parameter: ParameterId) -> Self {
        Self { session, parameter }
    }

    pub fn id(&self) -> ParameterId {
        self.parameter
    }

    fn read<R: Default>(&self, f: impl FnOnce(&Parameter) -> R) -> R {
        self.session
            .with_model(|model| model.parameter(self.parameter).map(f).unwrap_or_default())
    }

    /// Display name
    pub fn name(&self) -> String {
        self.read(|p| p.name().to_string())
    }

    pub fn declared_name(&self) -> String {
        self.read(|p| p.declared_name().to_string())
    }

    pub fn description(&self) -> String {
        self.read(|p| p.description().to_string())
    }

    pub fn value(&self) -> String {
        self.read(|p| p.value().to_string())
    }

    pub fn default_value(&self) -> String {
        self.read(|p| p.default_value().to_string())
    }

    pub fn value_type(&self) -> Option<ValueType> {
        self.session
            .with_model(|model| model.parameter(self.parameter).map(|p| p.value_type().clone()))
    }

    pub fn is_system(&self) -> bool {
        self.read(|p| p.is_system())
    }

    pub fn is_quick(&self) -> bool {
        self.read(|p| p.is_quick())
    }

    pub fn is_hidden(&self) -> bool {
        self.read(|p| p.is_hidden())
    }

    /// Module the parameter belongs to
    pub fn owner(&self) -> Option<StructureModel<'s>> {
        self.session
            .with_model(|model| model.parameter(self.parameter).map(|p| p.owner()))
            .map(|node| StructureModel::new(self.session, node))
    }

    pub fn is_linked(&self) -> bool {
        self.session.linked_registry().is_linked(self.parameter)
    }

    /// The linked parameter this parameter belongs to, if any
    pub fn linked_parameter(&self) -> Option<LinkedParameterModel<'s>> {
        self.session
            .linked_registry()
            .group_of(self.parameter)
            .map(|group| LinkedParameterModel::new(self.session, group.id()))
    }

    // ---- edits ----

    /// Set the value; a linked parameter sets its whole group
    ///
    /// # Errors
    /// Returns [`EditError::Parse`] when the value does not parse for this
    /// parameter (or any member of its group).
    pub fn set_value(&self, value: &str) -> EditResult<()> {
        self.session
            .run_command(SetParameterValueCommand::new(self.parameter, value))
    }

    pub fn set_to_default(&self) -> EditResult<()> {
        let default = self
            .session
            .with_model(|model| model.parameter(self.parameter).map(|p| p.default_value().to_string()))
            .ok_or(EditError::MissingParameter)?;
        self.set_value(&default)
    }

    pub fn set_name(&self, name: &str) -> EditResult<()> {
        self.session
            .run_command(SetParameterNameCommand::new(self.parameter, name))
    }

    pub fn set_quick(&self, quick: bool) -> EditResult<()> {
        self.session.run_command(SetParameterFlagCommand::new(
            self.parameter,
            ParameterFlag::Quick,
            quick,
        ))
    }

    pub fn set_hidden(&self, hidden: bool) -> EditResult<()> {
        self.session.run_command(SetParameterFlagCommand::new(
            self.parameter,
            ParameterFlag::Hidden,
            hidden,
        ))
    }
}

impl std::fmt::Debug for ParameterModel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ParameterModel")
            .field("parameter", &self.parameter)
            .field("name", &self.name())
            .field("value", &self.value())
            .finish()
    }
}
