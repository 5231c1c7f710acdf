// Parameters - session-wide table of module parameter values

use crate::catalog::{ParameterDescriptor, ValueType};
use crate::model::tree::NodeId;
use std::fmt;

/// Handle to a parameter in a model system's parameter table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ParameterId(pub(crate) usize);

impl ParameterId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ParameterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "p{}", self.0)
    }
}

/// Which boolean flag of a parameter an edit targets
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ParameterFlag {
    Quick,
    Hidden,
}

/// One editable parameter of a module
#[derive(Debug, Clone, PartialEq)]
pub struct Parameter {
    pub(crate) declared_name: String,
    pub(crate) display_name: String,
    pub(crate) description: String,
    pub(crate) value: String,
    pub(crate) default_value: String,
    pub(crate) value_type: ValueType,
    pub(crate) system: bool,
    pub(crate) quick: bool,
    pub(crate) hidden: bool,
    pub(crate) owner: NodeId,
}

impl Parameter {
    /// A parameter holding the descriptor's default value
    pub(crate) fn from_descriptor(descriptor: &ParameterDescriptor, owner: NodeId) -> Self {
        Self {
            declared_name: descriptor.name.clone(),
            display_name: descriptor.name.clone(),
            description: descriptor.description.clone(),
            value: descriptor.default_value.clone(),
            default_value: descriptor.default_value.clone(),
            value_type: descriptor.value_type.clone(),
            system: descriptor.system,
            quick: descriptor.quick,
            hidden: descriptor.hidden,
            owner,
        }
    }

    pub fn declared_name(&self) -> &str {
        &self.declared_name
    }

    pub fn name(&self) -> &str {
        &self.display_name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn value(&self) -> &str {
        &self.value
    }

    pub fn default_value(&self) -> &str {
        &self.default_value
    }

    pub fn value_type(&self) -> &ValueType {
        &self.value_type
    }

    pub fn is_system(&self) -> bool {
        self.system
    }

    pub fn is_quick(&self) -> bool {
        self.quick
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn owner(&self) -> NodeId {
        self.owner
    }

    pub(crate) fn flag(&self, flag: ParameterFlag) -> bool {
        match flag {
            ParameterFlag::Quick => self.quick,
            ParameterFlag::Hidden => self.hidden,
        }
    }

    pub(crate) fn set_flag(&mut self, flag: ParameterFlag, value: bool) {
        match flag {
            ParameterFlag::Quick => self.quick = value,
            ParameterFlag::Hidden => self.hidden = value,
        }
    }
}

/// Append-only parameter storage
///
/// Parameters are never removed so handles held by history entries stay valid.
#[derive(Debug, Clone, Default)]
pub struct ParameterTable {
    entries: Vec<Parameter>,
}

impl ParameterTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn insert(&mut self, parameter: Parameter) -> ParameterId {
        self.entries.push(parameter);
        ParameterId(self.entries.len() - 1)
    }

    pub fn get(&self, id: ParameterId) -> Option<&Parameter> {
        self.entries.get(id.0)
    }

    pub(crate) fn get_mut(&mut self, id: ParameterId) -> Option<&mut Parameter> {
        self.entries.get_mut(id.0)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
