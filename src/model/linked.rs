// Linked parameters - named groups forcing many parameters to share one value
//
// Lock order: the registry's group list is always taken before a group's state.
// Read-only queries only take these two locks, never the editing session lock.

use crate::catalog::ValueParser;
use crate::command::trait_def::{EditError, EditResult};
use crate::model::parameter::{ParameterId, ParameterTable};
use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Stable identifier of a linked parameter group
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub(crate) u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "L{}", self.0)
    }
}

#[derive(Debug)]
struct GroupState {
    name: String,
    value: String,
    members: Vec<ParameterId>,
}

/// A named value shared by an ordered set of parameters
///
/// Every member's stored value equals the group value whenever the session
/// lock is released.
#[derive(Debug)]
pub struct LinkedParameterGroup {
    id: GroupId,
    state: Mutex<GroupState>,
}

impl LinkedParameterGroup {
    fn lock(&self) -> MutexGuard<'_, GroupState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    pub fn name(&self) -> String {
        self.lock().name.clone()
    }

    pub fn value(&self) -> String {
        self.lock().value.clone()
    }

    pub fn members(&self) -> Vec<ParameterId> {
        self.lock().members.clone()
    }

    pub fn len(&self) -> usize {
        self.lock().members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().members.is_empty()
    }

    pub fn contains(&self, parameter: ParameterId) -> bool {
        self.lock().members.contains(&parameter)
    }

    pub fn index_of(&self, parameter: ParameterId) -> Option<usize> {
        self.lock().members.iter().position(|&p| p == parameter)
    }

    /// Rename the group, returning the previous name
    pub(crate) fn set_name(&self, name: &str) -> String {
        std::mem::replace(&mut self.lock().name, name.to_string())
    }

    /// Assign the group value without touching members
    pub(crate) fn set_value_unchecked(&self, value: &str) -> String {
        std::mem::replace(&mut self.lock().value, value.to_string())
    }

    /// Set the group and every member to `value`
    ///
    /// The value is checked against every member's declared type first. On the
    /// first rejection nothing is assigned. Returns the previous group value.
    pub(crate) fn set_all(
        &self,
        value: &str,
        parameters: &mut ParameterTable,
        parser: &dyn ValueParser,
    ) -> EditResult<String> {
        let mut state = self.lock();
        for &member in &state.members {
            let parameter = parameters.get(member).ok_or(EditError::MissingParameter)?;
            parser
                .check(parameter.value_type(), value)
                .map_err(EditError::Parse)?;
        }
        for &member in &state.members {
            if let Some(parameter) = parameters.get_mut(member) {
                parameter.value = value.to_string();
            }
        }
        Ok(std::mem::replace(&mut state.value, value.to_string()))
    }

    /// Insert a member at `index`, clamped to the member count
    pub(crate) fn insert_member(&self, index: usize, parameter: ParameterId) {
        let mut state = self.lock();
        let index = index.min(state.members.len());
        state.members.insert(index, parameter);
    }

    /// Remove a member, returning the index it held
    pub(crate) fn remove_member(&self, parameter: ParameterId) -> Option<usize> {
        let mut state = self.lock();
        let index = state.members.iter().position(|&p| p == parameter)?;
        state.members.remove(index);
        Some(index)
    }
}

/// All linked parameter groups of one model system
#[derive(Debug)]
pub struct LinkedParameterRegistry {
    groups: Mutex<Vec<Arc<LinkedParameterGroup>>>,
    next_id: AtomicU64,
}

impl Default for LinkedParameterRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl LinkedParameterRegistry {
    pub fn new() -> Self {
        Self {
            groups: Mutex::new(Vec::new()),
            next_id: AtomicU64::new(1),
        }
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Arc<LinkedParameterGroup>>> {
        self.groups.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Create and register an empty group
    ///
    /// # Errors
    /// Fails with [`EditError::Validation`] when the name is blank or taken.
    pub(crate) fn create(&self, name: &str, value: &str) -> EditResult<Arc<LinkedParameterGroup>> {
        if name.trim().is_empty() {
            return Err(EditError::Validation(
                "A linked parameter needs a name!".to_string(),
            ));
        }
        let mut groups = self.lock();
        if groups.iter().any(|g| g.lock().name == name) {
            return Err(EditError::Validation(format!(
                "A linked parameter named '{}' already exists!",
                name
            )));
        }
        let group = Arc::new(LinkedParameterGroup {
            id: GroupId(self.next_id.fetch_add(1, Ordering::Relaxed)),
            state: Mutex::new(GroupState {
                name: name.to_string(),
                value: value.to_string(),
                members: Vec::new(),
            }),
        });
        groups.push(Arc::clone(&group));
        Ok(group)
    }

    /// Put a previously removed group back at `index`
    pub(crate) fn insert(&self, index: usize, group: Arc<LinkedParameterGroup>) {
        let mut groups = self.lock();
        let index = index.min(groups.len());
        groups.insert(index, group);
    }

    /// Unregister a group, returning it with the index it held
    pub(crate) fn remove(&self, id: GroupId) -> Option<(usize, Arc<LinkedParameterGroup>)> {
        let mut groups = self.lock();
        let index = groups.iter().position(|g| g.id == id)?;
        Some((index, groups.remove(index)))
    }

    pub fn get(&self, id: GroupId) -> Option<Arc<LinkedParameterGroup>> {
        self.lock().iter().find(|g| g.id == id).cloned()
    }

    pub fn find_by_name(&self, name: &str) -> Option<Arc<LinkedParameterGroup>> {
        self.lock().iter().find(|g| g.lock().name == name).cloned()
    }

    /// The group containing `parameter`, if any
    pub fn group_of(&self, parameter: ParameterId) -> Option<Arc<LinkedParameterGroup>> {
        self.lock()
            .iter()
            .find(|g| g.lock().members.contains(&parameter))
            .cloned()
    }

    pub fn is_linked(&self, parameter: ParameterId) -> bool {
        self.group_of(parameter).is_some()
    }

    /// Every group in display order
    pub fn groups(&self) -> Vec<Arc<LinkedParameterGroup>> {
        self.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{DefaultValueParser, ParameterDescriptor, ValueType};
    use crate::model::parameter::Parameter;
    use crate::model::tree::NodeId;

    fn float_table(count: usize) -> (ParameterTable, Vec<ParameterId>) {
        let mut table = ParameterTable::new();
        let descriptor = ParameterDescriptor::new("Speed", ValueType::Float, "0");
        let ids = (0..count)
            .map(|i| table.insert(Parameter::from_descriptor(&descriptor, NodeId(i))))
            .collect();
        (table, ids)
    }

    #[test]
    fn test_set_all_updates_every_member() {
        let (mut table, ids) = float_table(3);
        let registry = LinkedParameterRegistry::new();
        let group = registry.create("speed", "0").unwrap();
        for &id in &ids {
            group.insert_member(usize::MAX, id);
        }

        let old = group.set_all("55.0", &mut table, &DefaultValueParser).unwrap();
        assert_eq!(old, "0");
        assert_eq!(group.value(), "55.0");
        for &id in &ids {
            assert_eq!(table.get(id).unwrap().value(), "55.0");
        }
    }

    #[test]
    fn test_set_all_rejection_changes_nothing() {
        let (mut table, ids) = float_table(2);
        let text = table.insert(Parameter::from_descriptor(
            &ParameterDescriptor::new("Label", ValueType::Text, "x"),
            NodeId(9),
        ));
        let registry = LinkedParameterRegistry::new();
        let group = registry.create("speed", "0").unwrap();
        group.insert_member(0, ids[0]);
        group.insert_member(1, text);
        group.insert_member(2, ids[1]);

        assert!(matches!(
            group.set_all("fast", &mut table, &DefaultValueParser),
            Err(EditError::Parse(_))
        ));
        assert_eq!(group.value(), "0");
        assert_eq!(table.get(ids[0]).unwrap().value(), "0");
        assert_eq!(table.get(text).unwrap().value(), "x");
    }

    #[test]
    fn test_membership_queries() {
        let (_, ids) = float_table(2);
        let registry = LinkedParameterRegistry::new();
        let a = registry.create("a", "0").unwrap();
        let b = registry.create("b", "0").unwrap();
        a.insert_member(0, ids[0]);
        b.insert_member(0, ids[1]);

        assert_eq!(registry.group_of(ids[1]).unwrap().id(), b.id());
        assert!(registry.is_linked(ids[0]));
        assert_eq!(a.remove_member(ids[0]), Some(0));
        assert!(!registry.is_linked(ids[0]));
        assert_eq!(a.remove_member(ids[0]), None);
    }

    #[test]
    fn test_duplicate_and_blank_names_rejected() {
        let registry = LinkedParameterRegistry::new();
        registry.create("speed", "0").unwrap();
        assert!(registry.create("speed", "1").is_err());
        assert!(registry.create("  ", "1").is_err());
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_remove_and_reinsert_keeps_position() {
        let registry = LinkedParameterRegistry::new();
        registry.create("a", "").unwrap();
        let b = registry.create("b", "").unwrap();
        registry.create("c", "").unwrap();

        let (index, removed) = registry.remove(b.id()).unwrap();
        assert_eq!(index, 1);
        assert!(registry.get(b.id()).is_none());

        registry.insert(index, removed);
        let names: Vec<_> = registry.groups().iter().map(|g| g.name()).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert!(registry.find_by_name("b").is_some());
    }
}
