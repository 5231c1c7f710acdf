// Linked parameter commands - group lifecycle, value and membership edits

use crate::command::trait_def::{EditError, EditResult, UndoableCommand};
use crate::messaging::ChangeEvent;
use crate::model::{GroupId, LinkedParameterGroup, ModelSystem, ParameterId};
use std::sync::Arc;

fn group(model: &ModelSystem, id: GroupId) -> EditResult<Arc<LinkedParameterGroup>> {
    model
        .linked_parameters()
        .get(id)
        .ok_or(EditError::MissingLinkedParameter)
}

fn linked_changed(model: &mut ModelSystem) {
    model.notify(ChangeEvent::LinkedParametersChanged);
}

/// Create a new, empty linked parameter
pub struct NewLinkedParameterCommand {
    name: String,
    value: String,
    created: Option<(usize, Arc<LinkedParameterGroup>)>,
}

impl NewLinkedParameterCommand {
    pub fn new(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            value: value.into(),
            created: None,
        }
    }

    /// Id of the group created by the last successful execute
    pub fn created(&self) -> Option<GroupId> {
        self.created.as_ref().map(|(_, g)| g.id())
    }
}

impl UndoableCommand for NewLinkedParameterCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let registry = model.linked_parameters();
        let created = registry.create(&self.name, &self.value)?;
        self.created = Some((registry.len() - 1, created));
        linked_changed(model);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let (_, created) = self
            .created
            .as_ref()
            .ok_or(EditError::MissingLinkedParameter)?;
        model
            .linked_parameters()
            .remove(created.id())
            .ok_or(EditError::MissingLinkedParameter)?;
        linked_changed(model);
        Ok(())
    }

    fn redo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let Some((index, created)) = self.created.as_ref() else {
            return self.execute(model);
        };
        model.linked_parameters().insert(*index, Arc::clone(created));
        linked_changed(model);
        Ok(())
    }

    fn description(&self) -> String {
        format!("New Linked Parameter {}", self.name)
    }
}

/// Delete a linked parameter; its members keep their current values
pub struct RemoveLinkedParameterCommand {
    group: GroupId,
    removed: Option<(usize, Arc<LinkedParameterGroup>)>,
}

impl RemoveLinkedParameterCommand {
    pub fn new(group: GroupId) -> Self {
        Self {
            group,
            removed: None,
        }
    }
}

impl UndoableCommand for RemoveLinkedParameterCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        // The group keeps its member list so undo can bring the links back
        let removed = model
            .linked_parameters()
            .remove(self.group)
            .ok_or(EditError::MissingLinkedParameter)?;
        self.removed = Some(removed);
        linked_changed(model);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let (index, removed) = self
            .removed
            .take()
            .ok_or(EditError::MissingLinkedParameter)?;
        model.linked_parameters().insert(index, removed);
        linked_changed(model);
        Ok(())
    }

    fn description(&self) -> String {
        "Remove Linked Parameter".to_string()
    }
}

/// Rename a linked parameter
pub struct SetLinkedParameterNameCommand {
    group: GroupId,
    name: String,
    old_name: Option<String>,
}

impl SetLinkedParameterNameCommand {
    pub fn new(group: GroupId, name: impl Into<String>) -> Self {
        Self {
            group,
            name: name.into(),
            old_name: None,
        }
    }
}

impl UndoableCommand for SetLinkedParameterNameCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let target = group(model, self.group)?;
        if self.name.trim().is_empty() {
            return Err(EditError::Validation(
                "A linked parameter needs a name!".to_string(),
            ));
        }
        if let Some(existing) = model.linked_parameters().find_by_name(&self.name)
            && existing.id() != self.group
        {
            return Err(EditError::Validation(format!(
                "A linked parameter named '{}' already exists!",
                self.name
            )));
        }
        self.old_name = Some(target.set_name(&self.name));
        linked_changed(model);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let old = self
            .old_name
            .as_deref()
            .ok_or_else(|| EditError::Validation("No previous name stored".into()))?;
        group(model, self.group)?.set_name(old);
        linked_changed(model);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Rename Linked Parameter to {}", self.name)
    }
}

/// Set the shared value of a linked parameter and all of its members
pub struct SetLinkedParameterValueCommand {
    group: GroupId,
    value: String,
    old_value: Option<String>,
}

impl SetLinkedParameterValueCommand {
    pub fn new(group: GroupId, value: impl Into<String>) -> Self {
        Self {
            group,
            value: value.into(),
            old_value: None,
        }
    }

    fn set(model: &mut ModelSystem, id: GroupId, value: &str) -> EditResult<String> {
        let target = group(model, id)?;
        let old = model.set_linked_value(&target, value)?;
        for member in target.members() {
            model.notify(ChangeEvent::ParameterChanged { parameter: member });
        }
        linked_changed(model);
        Ok(old)
    }
}

impl UndoableCommand for SetLinkedParameterValueCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        self.old_value = Some(Self::set(model, self.group, &self.value)?);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let old = self
            .old_value
            .clone()
            .ok_or_else(|| EditError::Validation("No previous value stored".into()))?;
        Self::set(model, self.group, &old).map(|_| ())
    }

    fn description(&self) -> String {
        format!("Set Linked Parameter to {}", self.value)
    }
}

struct Membership {
    /// Group the parameter was moved out of, with its index there
    previous: Option<(Arc<LinkedParameterGroup>, usize)>,
    original_value: String,
}

/// Add a parameter to a linked parameter
///
/// The parameter takes the group's value. A parameter that already belongs to
/// another group is moved, and undo moves it back as one step.
pub struct AddParameterToLinkedParameterCommand {
    group: GroupId,
    parameter: ParameterId,
    membership: Option<Membership>,
}

impl AddParameterToLinkedParameterCommand {
    pub fn new(group: GroupId, parameter: ParameterId) -> Self {
        Self {
            group,
            parameter,
            membership: None,
        }
    }
}

impl UndoableCommand for AddParameterToLinkedParameterCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let target = group(model, self.group)?;
        let owner = model.parameter_ref(self.parameter)?.owner();
        model.attached(owner)?;
        if target.contains(self.parameter) {
            return Err(EditError::AlreadyLinked);
        }
        let value = target.value();
        model.check_value(self.parameter, &value)?;

        let previous = model
            .linked_parameters()
            .group_of(self.parameter)
            .and_then(|g| g.remove_member(self.parameter).map(|index| (g, index)));
        let original_value =
            std::mem::replace(&mut model.parameter_mut(self.parameter)?.value, value);
        target.insert_member(usize::MAX, self.parameter);

        self.membership = Some(Membership {
            previous,
            original_value,
        });
        model.notify(ChangeEvent::ParameterChanged {
            parameter: self.parameter,
        });
        linked_changed(model);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let membership = self
            .membership
            .take()
            .ok_or_else(|| EditError::Validation("No previous membership stored".into()))?;
        group(model, self.group)?
            .remove_member(self.parameter)
            .ok_or(EditError::NotLinked)?;
        model.parameter_mut(self.parameter)?.value = membership.original_value;
        if let Some((previous, index)) = membership.previous {
            previous.insert_member(index, self.parameter);
        }
        model.notify(ChangeEvent::ParameterChanged {
            parameter: self.parameter,
        });
        linked_changed(model);
        Ok(())
    }

    fn description(&self) -> String {
        "Add Parameter to Linked Parameter".to_string()
    }
}

/// Remove a parameter from a linked parameter; it keeps its current value
pub struct RemoveParameterFromLinkedParameterCommand {
    group: GroupId,
    parameter: ParameterId,
    index: Option<usize>,
}

impl RemoveParameterFromLinkedParameterCommand {
    pub fn new(group: GroupId, parameter: ParameterId) -> Self {
        Self {
            group,
            parameter,
            index: None,
        }
    }
}

impl UndoableCommand for RemoveParameterFromLinkedParameterCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let index = group(model, self.group)?
            .remove_member(self.parameter)
            .ok_or(EditError::NotLinked)?;
        self.index = Some(index);
        linked_changed(model);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let index = self.index.ok_or(EditError::NotLinked)?;
        group(model, self.group)?.insert_member(index, self.parameter);
        linked_changed(model);
        Ok(())
    }

    fn description(&self) -> String {
        "Remove Parameter from Linked Parameter".to_string()
    }
}
