// Linked parameter handles - the group list and a single group

use crate::command::{
    AddParameterToLinkedParameterCommand, EditError, EditResult, NewLinkedParameterCommand,
    RemoveLinkedParameterCommand, RemoveParameterFromLinkedParameterCommand,
    SetLinkedParameterNameCommand, SetLinkedParameterValueCommand,
};
use crate::editing::parameter::ParameterModel;
use crate::editing::session::EditingSession;
use crate::model::{GroupId, LinkedParameterGroup, ParameterId};
use std::sync::Arc;

/// Handle over the session's linked parameter list
#[derive(Clone, Copy)]
pub struct LinkedParametersModel<'s> {
    session: &'s EditingSession,
}

impl<'s> LinkedParametersModel<'s> {
    pub(crate) fn new(session: &'s EditingSession) -> Self {
        Self { session }
    }

    pub fn len(&self) -> usize {
        self.session.linked_registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.session.linked_registry().is_empty()
    }

    pub fn list(&self) -> Vec<LinkedParameterModel<'s>> {
        self.session
            .linked_registry()
            .groups()
            .iter()
            .map(|group| LinkedParameterModel::new(self.session, group.id()))
            .collect()
    }

    pub fn find(&self, name: &str) -> Option<LinkedParameterModel<'s>> {
        self.session
            .linked_registry()
            .find_by_name(name)
            .map(|group| LinkedParameterModel::new(self.session, group.id()))
    }

    /// Group containing `parameter`
    pub fn group_of(&self, parameter: ParameterId) -> Option<LinkedParameterModel<'s>> {
        self.session
            .linked_registry()
            .group_of(parameter)
            .map(|group| LinkedParameterModel::new(self.session, group.id()))
    }

    /// Create an empty linked parameter
    ///
    /// # Errors
    /// Returns [`EditError::Validation`] for a blank or duplicate name.
    pub fn create(&self, name: &str, value: &str) -> EditResult<LinkedParameterModel<'s>> {
        self.session.locked(|| {
            self.session
                .run_command(NewLinkedParameterCommand::new(name, value))?;
            self.find(name).ok_or(EditError::MissingLinkedParameter)
        })
    }

    /// Delete a group; its members keep their values
    pub fn remove(&self, group: GroupId) -> EditResult<()> {
        self.session
            .run_command(RemoveLinkedParameterCommand::new(group))
    }
}

/// Handle over one linked parameter group
#[derive(Clone, Copy)]
pub struct LinkedParameterModel<'s> {
    session: &'s EditingSession,
    group: GroupId,
}

impl<'s> LinkedParameterModel<'s> {
    pub(crate) fn new(session: &'s EditingSession, group: GroupId) -> Self {
        Self { session, group }
    }

    pub fn id(&self) -> GroupId {
        self.group
    }

    fn group(&self) -> Option<Arc<LinkedParameterGroup>> {
        self.session.linked_registry().get(self.group)
    }

    /// Whether the group is still registered
    pub fn exists(&self) -> bool {
        self.group().is_some()
    }

    pub fn name(&self) -> String {
        self.group().map(|g| g.name()).unwrap_or_default()
    }

    pub fn value(&self) -> String {
        self.group().map(|g| g.value()).unwrap_or_default()
    }

    pub fn members(&self) -> Vec<ParameterModel<'s>> {
        self.group()
            .map(|g| g.members())
            .unwrap_or_default()
            .into_iter()
            .map(|parameter| ParameterModel::new(self.session, parameter))
            .collect()
    }

    pub fn contains(&self, parameter: ParameterId) -> bool {
        self.group().is_some_and(|g| g.contains(parameter))
    }

    // ---- edits ----

    pub fn set_name(&self, name: &str) -> EditResult<()> {
        self.session
            .run_command(SetLinkedParameterNameCommand::new(self.group, name))
    }

    /// Set the shared value of the group and every member
    pub fn set_value(&self, value: &str) -> EditResult<()> {
        self.session
            .run_command(SetLinkedParameterValueCommand::new(self.group, value))
    }

    /// Bind `parameter` to this group, moving it out of any other group
    pub fn add_parameter(&self, parameter: ParameterId) -> EditResult<()> {
        self.session
            .run_command(AddParameterToLinkedParameterCommand::new(self.group, parameter))
    }

    pub fn remove_parameter(&self, parameter: ParameterId) -> EditResult<()> {
        self.session.run_command(RemoveParameterFromLinkedParameterCommand::new(
            self.group, parameter,
        ))
    }

    pub fn remove(&self) -> EditResult<()> {
        self.session
            .run_command(RemoveLinkedParameterCommand::new(self.group))
    }
}

impl std::fmt::Debug for LinkedParameterModel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LinkedParameterModel")
            .field("group", &self.group)
            .field("name", &self.name())
            .field("value", &self.value())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleType;
    use crate::model::tests::configured_model;

    fn session_with_autos(count: usize) -> (EditingSession, Vec<ParameterId>) {
        let session = EditingSession::new(configured_model());
        let modes = session.root_structure().child(0).unwrap();
        let speeds = (0..count)
            .map(|_| {
                let auto = modes.add(ModuleType::new("Travel.Auto"), None).unwrap();
                auto.parameter("Speed").unwrap().id()
            })
            .collect();
        (session, speeds)
    }

    #[test]
    fn test_create_and_link() {
        let (session, speeds) = session_with_autos(2);
        let linked = session.linked_parameters();
        let group = linked.create("speed", "40").unwrap();
        assert_eq!(linked.len(), 1);
        assert!(linked.create("speed", "1").is_err());

        group.add_parameter(speeds[0]).unwrap();
        group.add_parameter(speeds[1]).unwrap();
        assert_eq!(session.parameter(speeds[1]).value(), "40");
        assert_eq!(linked.group_of(speeds[0]).unwrap().id(), group.id());

        group.set_value("70").unwrap();
        for member in group.members() {
            assert_eq!(member.value(), "70");
        }
    }

    #[test]
    fn test_remove_group_keeps_values() {
        let (session, speeds) = session_with_autos(1);
        let group = session.linked_parameters().create("speed", "30").unwrap();
        group.add_parameter(speeds[0]).unwrap();

        group.remove().unwrap();
        assert!(!group.exists());
        assert!(!session.parameter(speeds[0]).is_linked());
        assert_eq!(session.parameter(speeds[0]).value(), "30");

        session.undo().unwrap();
        assert!(group.exists());
        assert!(group.contains(speeds[0]));
    }

    #[test]
    fn test_remove_parameter_not_in_group() {
        let (session, speeds) = session_with_autos(1);
        let group = session.linked_parameters().create("speed", "30").unwrap();
        assert_eq!(group.remove_parameter(speeds[0]), Err(EditError::NotLinked));
    }
}
