// Parameter commands - value, display name and flag edits

use crate::command::trait_def::{EditError, EditResult, UndoableCommand};
use crate::messaging::ChangeEvent;
use crate::model::{LinkedParameterGroup, ModelSystem, ParameterFlag, ParameterId};
use std::sync::Arc;

/// Parameter of an attached module
fn editable(model: &ModelSystem, id: ParameterId) -> EditResult<()> {
    let owner = model.parameter_ref(id)?.owner();
    model.attached(owner)?;
    Ok(())
}

fn value_changed(model: &mut ModelSystem, parameter: ParameterId) {
    model.notify(ChangeEvent::ParameterChanged { parameter });
}

enum ValueChange {
    Direct { old_value: String },
    Linked {
        group: Arc<LinkedParameterGroup>,
        old_value: String,
    },
}

/// Set a parameter's value
///
/// When the parameter belongs to a linked group the whole group is set
/// instead, so every member keeps sharing one value.
pub struct SetParameterValueCommand {
    parameter: ParameterId,
    value: String,
    change: Option<ValueChange>,
}

impl SetParameterValueCommand {
    pub fn new(parameter: ParameterId, value: impl Into<String>) -> Self {
        Self {
            parameter,
            value: value.into(),
            change: None,
        }
    }

    fn set_direct(model: &mut ModelSystem, id: ParameterId, value: &str) -> EditResult<String> {
        model.check_value(id, value)?;
        let old = std::mem::replace(&mut model.parameter_mut(id)?.value, value.to_string());
        value_changed(model, id);
        Ok(old)
    }

    fn set_linked(
        model: &mut ModelSystem,
        group: &LinkedParameterGroup,
        value: &str,
    ) -> EditResult<String> {
        let old = model.set_linked_value(group, value)?;
        for member in group.members() {
            value_changed(model, member);
        }
        model.notify(ChangeEvent::LinkedParametersChanged);
        Ok(old)
    }
}

impl UndoableCommand for SetParameterValueCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        editable(model, self.parameter)?;
        let linked = model.linked_parameters().group_of(self.parameter);
        let change = match linked {
            Some(group) => {
                let old_value = Self::set_linked(model, &group, &self.value)?;
                ValueChange::Linked { group, old_value }
            }
            None => ValueChange::Direct {
                old_value: Self::set_direct(model, self.parameter, &self.value)?,
            },
        };
        self.change = Some(change);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        match &self.change {
            Some(ValueChange::Direct { old_value }) => {
                Self::set_direct(model, self.parameter, old_value).map(|_| ())
            }
            Some(ValueChange::Linked { group, old_value }) => {
                Self::set_linked(model, group, old_value).map(|_| ())
            }
            None => Err(EditError::Validation("No previous value stored".into())),
        }
    }

    fn description(&self) -> String {
        format!("Set Parameter to {}", self.value)
    }
}

/// Change a parameter's display name
pub struct SetParameterNameCommand {
    parameter: ParameterId,
    name: String,
    old_name: Option<String>,
}

impl SetParameterNameCommand {
    pub fn new(parameter: ParameterId, name: impl Into<String>) -> Self {
        Self {
            parameter,
            name: name.into(),
            old_name: None,
        }
    }

    fn set(model: &mut ModelSystem, id: ParameterId, name: String) -> EditResult<String> {
        let old = std::mem::replace(&mut model.parameter_mut(id)?.display_name, name);
        value_changed(model, id);
        Ok(old)
    }
}

impl UndoableCommand for SetParameterNameCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        editable(model, self.parameter)?;
        if self.name.trim().is_empty() {
            return Err(EditError::Validation(
                "A parameter's name can not be empty!".to_string(),
            ));
        }
        self.old_name = Some(Self::set(model, self.parameter, self.name.clone())?);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let old = self
            .old_name
            .clone()
            .ok_or_else(|| EditError::Validation("No previous name stored".into()))?;
        Self::set(model, self.parameter, old).map(|_| ())
    }

    fn description(&self) -> String {
        format!("Rename Parameter to {}", self.name)
    }
}

/// Set the quick or hidden flag of a parameter
pub struct SetParameterFlagCommand {
    parameter: ParameterId,
    flag: ParameterFlag,
    value: bool,
    old_value: Option<bool>,
}

impl SetParameterFlagCommand {
    pub fn new(parameter: ParameterId, flag: ParameterFlag, value: bool) -> Self {
        Self {
            parameter,
            flag,
            value,
            old_value: None,
        }
    }

    fn set(
        model: &mut ModelSystem,
        id: ParameterId,
        flag: ParameterFlag,
        value: bool,
    ) -> EditResult<bool> {
        let parameter = model.parameter_mut(id)?;
        let old = parameter.flag(flag);
        parameter.set_flag(flag, value);
        value_changed(model, id);
        Ok(old)
    }
}

impl UndoableCommand for SetParameterFlagCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        editable(model, self.parameter)?;
        self.old_value = Some(Self::set(model, self.parameter, self.flag, self.value)?);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let old = self
            .old_value
            .ok_or_else(|| EditError::Validation("No previous flag stored".into()))?;
        Self::set(model, self.parameter, self.flag, old).map(|_| ())
    }

    fn description(&self) -> String {
        let flag = match self.flag {
            ParameterFlag::Quick => "Quick",
            ParameterFlag::Hidden => "Hidden",
        };
        if self.value {
            format!("Set {}", flag)
        } else {
            format!("Clear {}", flag)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleType;
    use crate::command::structure::AddCollectionMemberCommand;
    use crate::model::tests::configured_model;

    fn speeds(count: usize) -> (ModelSystem, Vec<ParameterId>) {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        let ids = (0..count)
            .map(|_| {
                let mut add =
                    AddCollectionMemberCommand::new(modes, ModuleType::new("Travel.Auto"), None);
                add.execute(&mut model).unwrap();
                model
                    .parameter_by_name(add.added().unwrap(), "Speed")
                    .unwrap()
            })
            .collect();
        (model, ids)
    }

    #[test]
    fn test_set_value_direct_and_undo() {
        let (mut model, ids) = speeds(1);
        let mut command = SetParameterValueCommand::new(ids[0], "12.5");
        command.execute(&mut model).unwrap();
        assert_eq!(model.parameter(ids[0]).unwrap().value(), "12.5");

        command.undo(&mut model).unwrap();
        assert_eq!(model.parameter(ids[0]).unwrap().value(), "0");
    }

    #[test]
    fn test_set_value_parse_failure_changes_nothing() {
        let (mut model, ids) = speeds(1);
        let mut command = SetParameterValueCommand::new(ids[0], "fast");
        assert!(matches!(
            command.execute(&mut model),
            Err(EditError::Parse(_))
        ));
        assert_eq!(model.parameter(ids[0]).unwrap().value(), "0");
    }

    #[test]
    fn test_set_value_on_linked_member_sets_group() {
        let (mut model, ids) = speeds(3);
        let group = model.linked_parameters().create("speed", "0").unwrap();
        for &id in &ids {
            group.insert_member(usize::MAX, id);
        }

        let mut command = SetParameterValueCommand::new(ids[1], "80");
        command.execute(&mut model).unwrap();
        assert_eq!(group.value(), "80");
        for &id in &ids {
            assert_eq!(model.parameter(id).unwrap().value(), "80");
        }

        command.undo(&mut model).unwrap();
        assert_eq!(group.value(), "0");
        assert_eq!(model.parameter(ids[2]).unwrap().value(), "0");
    }

    #[test]
    fn test_rename_and_flags() {
        let (mut model, ids) = speeds(1);
        let mut rename = SetParameterNameCommand::new(ids[0], "Free Flow Speed");
        rename.execute(&mut model).unwrap();
        assert_eq!(model.parameter(ids[0]).unwrap().name(), "Free Flow Speed");
        assert_eq!(model.parameter(ids[0]).unwrap().declared_name(), "Speed");

        let mut blank = SetParameterNameCommand::new(ids[0], " ");
        assert!(blank.execute(&mut model).is_err());

        let mut quick = SetParameterFlagCommand::new(ids[0], ParameterFlag::Quick, true);
        quick.execute(&mut model).unwrap();
        assert!(model.parameter(ids[0]).unwrap().is_quick());
        quick.undo(&mut model).unwrap();
        assert!(!model.parameter(ids[0]).unwrap().is_quick());
        assert_eq!(quick.description(), "Set Quick");
    }
}
