// Structural commands - module type, collection membership and node properties

use crate::catalog::ModuleType;
use crate::command::trait_def::{EditError, EditResult, UndoableCommand};
use crate::messaging::{ChangeEvent, NodeProperty};
use crate::model::tree::move_within;
use crate::model::{LinkRecord, ModelSystem, ModuleNode, NodeId, ParameterId, SlotShape};

fn changed(model: &mut ModelSystem, node: NodeId, property: NodeProperty) {
    model.notify(ChangeEvent::PropertyChanged { node, property });
}

/// Attached collection node, or the matching precondition error
fn collection(model: &ModelSystem, id: NodeId) -> EditResult<&ModuleNode> {
    let node = model.attached(id)?;
    if !node.is_collection() {
        return Err(EditError::NotACollection);
    }
    Ok(node)
}

fn children_mut(model: &mut ModelSystem, id: NodeId) -> EditResult<&mut Vec<NodeId>> {
    model
        .node_mut(id)?
        .children
        .as_mut()
        .ok_or(EditError::NotACollection)
}

struct TypeChange {
    old_type: Option<ModuleType>,
    old_children: Option<Vec<NodeId>>,
    old_parameters: Vec<ParameterId>,
    new_children: Option<Vec<NodeId>>,
    new_parameters: Vec<ParameterId>,
    /// Parameters that stop being part of the tree
    released: Vec<ParameterId>,
    links: Vec<LinkRecord>,
}

/// Assign (or clear) a module's type
///
/// Children whose slot still exists with the same name and shape are kept,
/// everything else is detached together with its linked memberships.
pub struct SetModuleTypeCommand {
    node: NodeId,
    new_type: Option<ModuleType>,
    change: Option<TypeChange>,
}

impl SetModuleTypeCommand {
    pub fn new(node: NodeId, new_type: Option<ModuleType>) -> Self {
        Self {
            node,
            new_type,
            change: None,
        }
    }

    fn apply(
        model: &mut ModelSystem,
        id: NodeId,
        module_type: Option<ModuleType>,
        children: Option<Vec<NodeId>>,
        parameters: Vec<ParameterId>,
    ) -> EditResult<()> {
        let node = model.node_mut(id)?;
        node.module_type = module_type;
        node.children = children;
        node.parameters = parameters;
        changed(model, id, NodeProperty::Type);
        changed(model, id, NodeProperty::Children);
        Ok(())
    }
}

impl UndoableCommand for SetModuleTypeCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let node = model.attached(self.node)?;
        if node.is_collection() {
            return Err(EditError::Validation(
                "The type of a collection can not be changed!".to_string(),
            ));
        }
        match &self.new_type {
            None if node.required => {
                return Err(EditError::RequiredModule("cleared".to_string()));
            }
            Some(ty) => model.check_placement(ty, &node.slot.constraint, node.parent)?,
            None => {}
        }

        // Store old shape for undo
        let old_type = node.module_type.clone();
        let old_children = node.children.clone();
        let old_parameters = node.parameters.clone();

        let (new_children, new_parameters) =
            model.configure_type(self.node, self.new_type.as_ref());

        let kept = new_children.as_deref().unwrap_or(&[]);
        let mut released = old_parameters.clone();
        for &child in old_children.iter().flatten() {
            if !kept.contains(&child) {
                released.extend(model.subtree_parameters(child));
            }
        }
        let links = model.detach_links(&released);

        Self::apply(
            model,
            self.node,
            self.new_type.clone(),
            new_children.clone(),
            new_parameters.clone(),
        )?;
        self.change = Some(TypeChange {
            old_type,
            old_children,
            old_parameters,
            new_children,
            new_parameters,
            released,
            links,
        });
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let change = self
            .change
            .as_ref()
            .ok_or_else(|| EditError::Validation("No previous type stored".into()))?;
        Self::apply(
            model,
            self.node,
            change.old_type.clone(),
            change.old_children.clone(),
            change.old_parameters.clone(),
        )?;
        model.restore_links(&change.links);
        Ok(())
    }

    fn redo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let Some(change) = self.change.as_mut() else {
            return self.execute(model);
        };
        change.links = model.detach_links(&change.released);
        Self::apply(
            model,
            self.node,
            self.new_type.clone(),
            change.new_children.clone(),
            change.new_parameters.clone(),
        )
    }

    fn description(&self) -> String {
        match &self.new_type {
            Some(ty) => format!("Set Type to {}", ty.display_name()),
            None => "Clear Type".to_string(),
        }
    }
}

/// Append a new module of the given type to a collection
pub struct AddCollectionMemberCommand {
    collection: NodeId,
    module_type: ModuleType,
    name: Option<String>,
    added: Option<(NodeId, usize)>,
}

impl AddCollectionMemberCommand {
    /// # Arguments
    /// * `name` - module name; generated from the type when `None`
    pub fn new(collection: NodeId, module_type: ModuleType, name: Option<String>) -> Self {
        Self {
            collection,
            module_type,
            name,
            added: None,
        }
    }

    /// The node created by the last successful execute
    pub fn added(&self) -> Option<NodeId> {
        self.added.map(|(id, _)| id)
    }
}

impl UndoableCommand for AddCollectionMemberCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let node = collection(model, self.collection)?;
        model.check_placement(&self.module_type, &node.slot.constraint, Some(self.collection))?;
        let slot = SlotShape::member_of(&node.slot);

        let name = self
            .name
            .clone()
            .unwrap_or_else(|| self.module_type.display_name());
        let id = model.create_module(&self.module_type, name, slot, self.collection);
        let children = children_mut(model, self.collection)?;
        children.push(id);
        self.added = Some((id, children.len() - 1));
        changed(model, self.collection, NodeProperty::Children);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let (id, _) = self
            .added
            .ok_or_else(|| EditError::Validation("No added module stored".into()))?;
        let children = children_mut(model, self.collection)?;
        let index = children
            .iter()
            .position(|&c| c == id)
            .ok_or(EditError::MissingNode)?;
        children.remove(index);
        changed(model, self.collection, NodeProperty::Children);
        Ok(())
    }

    fn redo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let Some((id, index)) = self.added else {
            return self.execute(model);
        };
        let children = children_mut(model, self.collection)?;
        let index = index.min(children.len());
        children.insert(index, id);
        changed(model, self.collection, NodeProperty::Children);
        Ok(())
    }

    fn description(&self) -> String {
        format!("Add {}", self.module_type.display_name())
    }
}

/// Remove the member at `index` from a collection
pub struct RemoveCollectionMemberCommand {
    collection: NodeId,
    index: usize,
    removed: Option<(NodeId, Vec<LinkRecord>)>,
}

impl RemoveCollectionMemberCommand {
    pub fn new(collection: NodeId, index: usize) -> Self {
        Self {
            collection,
            index,
            removed: None,
        }
    }
}

impl UndoableCommand for RemoveCollectionMemberCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let len = collection(model, self.collection)?.children().len();
        if self.index >= len {
            return Err(EditError::invalid_index(
                self.index,
                format!("the collection only has {} members", len),
            ));
        }
        let id = children_mut(model, self.collection)?.remove(self.index);
        let parameters = model.subtree_parameters(id);
        let links = model.detach_links(&parameters);
        self.removed = Some((id, links));
        changed(model, self.collection, NodeProperty::Children);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let (id, links) = self
            .removed
            .as_ref()
            .ok_or_else(|| EditError::Validation("No removed module stored".into()))?;
        let children = children_mut(model, self.collection)?;
        let index = self.index.min(children.len());
        children.insert(index, *id);
        model.restore_links(links);
        changed(model, self.collection, NodeProperty::Children);
        Ok(())
    }

    fn description(&self) -> String {
        "Remove Module".to_string()
    }
}

/// Remove every member of a collection
pub struct RemoveAllCollectionMembersCommand {
    collection: NodeId,
    removed: Vec<NodeId>,
    links: Vec<LinkRecord>,
}

impl RemoveAllCollectionMembersCommand {
    pub fn new(collection: NodeId) -> Self {
        Self {
            collection,
            removed: Vec::new(),
            links: Vec::new(),
        }
    }
}

impl UndoableCommand for RemoveAllCollectionMembersCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        if collection(model, self.collection)?.children().is_empty() {
            return Err(EditError::EmptyCollection);
        }
        let removed = std::mem::take(children_mut(model, self.collection)?);
        let parameters: Vec<_> = removed
            .iter()
            .flat_map(|&child| model.subtree_parameters(child))
            .collect();
        self.links = model.detach_links(&parameters);
        self.removed = removed;
        changed(model, self.collection, NodeProperty::Children);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        *children_mut(model, self.collection)? = self.removed.clone();
        model.restore_links(&self.links);
        changed(model, self.collection, NodeProperty::Children);
        Ok(())
    }

    fn description(&self) -> String {
        "Remove All Modules".to_string()
    }
}

/// Reposition a collection member from one index to another
pub struct MoveCollectionMemberCommand {
    collection: NodeId,
    from: usize,
    to: usize,
}

impl MoveCollectionMemberCommand {
    pub fn new(collection: NodeId, from: usize, to: usize) -> Self {
        Self {
            collection,
            from,
            to,
        }
    }

    fn shift(model: &mut ModelSystem, id: NodeId, from: usize, to: usize) -> EditResult<()> {
        let children = children_mut(model, id)?;
        let len = children.len();
        for index in [from, to] {
            if index >= len {
                return Err(EditError::invalid_index(
                    index,
                    format!("the collection only has {} members", len),
                ));
            }
        }
        move_within(children, from, to);
        changed(model, id, NodeProperty::Children);
        Ok(())
    }
}

impl UndoableCommand for MoveCollectionMemberCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        collection(model, self.collection)?;
        Self::shift(model, self.collection, self.from, self.to)
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        Self::shift(model, self.collection, self.to, self.from)
    }

    fn description(&self) -> String {
        format!("Move Module {} to {}", self.from, self.to)
    }
}

/// Which plain field of a module a [`SetModuleTextCommand`] edits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum TextField {
    Name,
    Description,
}

/// Shared implementation for name and description edits
struct SetModuleTextCommand {
    node: NodeId,
    field: TextField,
    value: String,
    old_value: Option<String>,
}

impl SetModuleTextCommand {
    fn swap(&self, model: &mut ModelSystem, value: String) -> EditResult<String> {
        let node = model.node_mut(self.node)?;
        let (slot, property) = match self.field {
            TextField::Name => (&mut node.name, NodeProperty::Name),
            TextField::Description => (&mut node.description, NodeProperty::Description),
        };
        let old = std::mem::replace(slot, value);
        changed(model, self.node, property);
        Ok(old)
    }

    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        model.attached(self.node)?;
        // Store old value for undo
        self.old_value = Some(self.swap(model, self.value.clone())?);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let old = self
            .old_value
            .clone()
            .ok_or_else(|| EditError::Validation("No previous value stored".into()))?;
        self.swap(model, old).map(|_| ())
    }
}

/// Rename a module
pub struct SetModuleNameCommand(SetModuleTextCommand);

impl SetModuleNameCommand {
    pub fn new(node: NodeId, name: impl Into<String>) -> Self {
        Self(SetModuleTextCommand {
            node,
            field: TextField::Name,
            value: name.into(),
            old_value: None,
        })
    }
}

impl UndoableCommand for SetModuleNameCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        self.0.execute(model)
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        self.0.undo(model)
    }

    fn description(&self) -> String {
        format!("Rename to {}", self.0.value)
    }
}

/// Change a module's description
pub struct SetModuleDescriptionCommand(SetModuleTextCommand);

impl SetModuleDescriptionCommand {
    pub fn new(node: NodeId, description: impl Into<String>) -> Self {
        Self(SetModuleTextCommand {
            node,
            field: TextField::Description,
            value: description.into(),
            old_value: None,
        })
    }
}

impl UndoableCommand for SetModuleDescriptionCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        self.0.execute(model)
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        self.0.undo(model)
    }

    fn description(&self) -> String {
        "Set Description".to_string()
    }
}

/// Enable or disable a module
pub struct SetModuleDisabledCommand {
    node: NodeId,
    disabled: bool,
    old_disabled: Option<bool>,
}

impl SetModuleDisabledCommand {
    pub fn new(node: NodeId, disabled: bool) -> Self {
        Self {
            node,
            disabled,
            old_disabled: None,
        }
    }

    fn set(model: &mut ModelSystem, id: NodeId, disabled: bool) -> EditResult<bool> {
        let node = model.node_mut(id)?;
        let old = std::mem::replace(&mut node.disabled, disabled);
        changed(model, id, NodeProperty::Disabled);
        Ok(old)
    }
}

impl UndoableCommand for SetModuleDisabledCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let node = model.attached(self.node)?;
        if self.disabled && node.required {
            return Err(EditError::RequiredModule("disabled".to_string()));
        }
        self.old_disabled = Some(Self::set(model, self.node, self.disabled)?);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let old = self
            .old_disabled
            .ok_or_else(|| EditError::Validation("No previous state stored".into()))?;
        Self::set(model, self.node, old).map(|_| ())
    }

    fn description(&self) -> String {
        if self.disabled {
            "Disable Module".to_string()
        } else {
            "Enable Module".to_string()
        }
    }
}

/// Mark or unmark a module as a meta-module
pub struct SetMetaModuleCommand {
    node: NodeId,
    meta_module: bool,
    old_meta_module: Option<bool>,
}

impl SetMetaModuleCommand {
    pub fn new(node: NodeId, meta_module: bool) -> Self {
        Self {
            node,
            meta_module,
            old_meta_module: None,
        }
    }

    fn set(model: &mut ModelSystem, id: NodeId, meta_module: bool) -> EditResult<bool> {
        let node = model.node_mut(id)?;
        let old = std::mem::replace(&mut node.meta_module, meta_module);
        changed(model, id, NodeProperty::MetaModule);
        Ok(old)
    }
}

impl UndoableCommand for SetMetaModuleCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        if model.attached(self.node)?.is_collection() {
            return Err(EditError::Validation(
                "A collection can not be a meta-module!".to_string(),
            ));
        }
        self.old_meta_module = Some(Self::set(model, self.node, self.meta_module)?);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let old = self
            .old_meta_module
            .ok_or_else(|| EditError::Validation("No previous state stored".into()))?;
        Self::set(model, self.node, old).map(|_| ())
    }

    fn description(&self) -> String {
        if self.meta_module {
            "Compose Meta-Module".to_string()
        } else {
            "Decompose Meta-Module".to_string()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::tests::{configured_model, test_model};

    fn names(model: &ModelSystem, id: NodeId) -> Vec<String> {
        model
            .children(id)
            .iter()
            .map(|&c| model.node(c).unwrap().name().to_string())
            .collect()
    }

    fn add(model: &mut ModelSystem, collection: NodeId, ty: &str, name: &str) -> NodeId {
        let mut command = AddCollectionMemberCommand::new(
            collection,
            ModuleType::new(ty),
            Some(name.to_string()),
        );
        command.execute(model).unwrap();
        command.added().unwrap()
    }

    #[test]
    fn test_set_type_builds_slots_and_undo_clears() {
        let mut model = test_model();
        let root = model.root();
        let mut command = SetModuleTypeCommand::new(root, Some(ModuleType::new("Travel.Demand")));

        command.execute(&mut model).unwrap();
        assert_eq!(model.children(root).len(), 2);
        assert_eq!(model.node(root).unwrap().parameters().len(), 1);

        command.undo(&mut model).unwrap();
        assert!(model.node(root).unwrap().module_type().is_none());
        assert!(model.children(root).is_empty());

        command.redo(&mut model).unwrap();
        assert_eq!(model.children(root).len(), 2);
    }

    #[test]
    fn test_clearing_required_type_rejected() {
        let mut model = configured_model();
        let root = model.root();
        let mut command = SetModuleTypeCommand::new(root, None);
        assert_eq!(
            command.execute(&mut model),
            Err(EditError::RequiredModule("cleared".to_string()))
        );
        assert!(model.node(root).unwrap().module_type().is_some());
    }

    #[test]
    fn test_set_type_rejects_wrong_constraint() {
        let mut model = configured_model();
        let network = model.find("Network").unwrap();
        let mut command =
            SetModuleTypeCommand::new(network, Some(ModuleType::new("Travel.Auto")));
        assert!(matches!(
            command.execute(&mut model),
            Err(EditError::Validation(_))
        ));
        assert!(model.node(network).unwrap().module_type().is_none());
    }

    #[test]
    fn test_move_child_and_undo() {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        add(&mut model, modes, "Travel.Auto", "a");
        add(&mut model, modes, "Travel.Auto", "b");
        add(&mut model, modes, "Travel.Auto", "c");

        let mut command = MoveCollectionMemberCommand::new(modes, 0, 2);
        command.execute(&mut model).unwrap();
        assert_eq!(names(&model, modes), vec!["b", "c", "a"]);

        command.undo(&mut model).unwrap();
        assert_eq!(names(&model, modes), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_move_out_of_range() {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        add(&mut model, modes, "Travel.Auto", "a");

        let mut command = MoveCollectionMemberCommand::new(modes, 0, 1);
        assert!(matches!(
            command.execute(&mut model),
            Err(EditError::InvalidIndex { index: 1, .. })
        ));
    }

    #[test]
    fn test_add_generates_name_and_checks_constraint() {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        let mut command =
            AddCollectionMemberCommand::new(modes, ModuleType::new("Travel.Auto"), None);
        command.execute(&mut model).unwrap();
        assert_eq!(names(&model, modes), vec!["Auto"]);

        let mut wrong =
            AddCollectionMemberCommand::new(modes, ModuleType::new("Travel.RoadNetwork"), None);
        assert!(wrong.execute(&mut model).is_err());

        let network = model.find("Network").unwrap();
        let mut not_collection =
            AddCollectionMemberCommand::new(network, ModuleType::new("Travel.Auto"), None);
        assert_eq!(
            not_collection.execute(&mut model),
            Err(EditError::NotACollection)
        );
    }

    #[test]
    fn test_remove_member_unlinks_and_restores() {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        let auto = add(&mut model, modes, "Travel.Auto", "a");
        let speed = model.parameter_by_name(auto, "Speed").unwrap();
        let group = model.linked_parameters().create("speed", "0").unwrap();
        group.insert_member(0, speed);

        let mut command = RemoveCollectionMemberCommand::new(modes, 0);
        command.execute(&mut model).unwrap();
        assert!(model.children(modes).is_empty());
        assert!(!model.linked_parameters().is_linked(speed));
        assert!(!model.is_attached(auto));

        command.undo(&mut model).unwrap();
        assert_eq!(model.children(modes), &[auto]);
        assert!(group.contains(speed));
    }

    #[test]
    fn test_remove_all_on_empty_collection() {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        let mut command = RemoveAllCollectionMembersCommand::new(modes);
        assert_eq!(command.execute(&mut model), Err(EditError::EmptyCollection));

        add(&mut model, modes, "Travel.Auto", "a");
        add(&mut model, modes, "Travel.Auto", "b");
        command.execute(&mut model).unwrap();
        assert!(model.children(modes).is_empty());
        command.undo(&mut model).unwrap();
        assert_eq!(names(&model, modes), vec!["a", "b"]);
    }

    #[test]
    fn test_required_module_can_not_be_disabled() {
        let mut model = configured_model();
        let network = model.find("Network").unwrap();
        let mut command = SetModuleDisabledCommand::new(network, true);
        assert_eq!(
            command.execute(&mut model),
            Err(EditError::RequiredModule("disabled".to_string()))
        );

        let modes = model.find("Modes").unwrap();
        let auto = add(&mut model, modes, "Travel.Auto", "a");
        let mut command = SetModuleDisabledCommand::new(auto, true);
        command.execute(&mut model).unwrap();
        assert!(model.node(auto).unwrap().is_disabled());
        command.undo(&mut model).unwrap();
        assert!(!model.node(auto).unwrap().is_disabled());
    }

    #[test]
    fn test_meta_module_not_allowed_on_collection() {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        let mut command = SetMetaModuleCommand::new(modes, true);
        assert!(command.execute(&mut model).is_err());
        assert!(!model.node(modes).unwrap().is_meta_module());
    }

    #[test]
    fn test_rename_undo() {
        let mut model = configured_model();
        let root = model.root();
        let mut command = SetModuleNameCommand::new(root, "Renamed");
        command.execute(&mut model).unwrap();
        assert_eq!(model.node(root).unwrap().name(), "Renamed");
        command.undo(&mut model).unwrap();
        assert_eq!(model.node(root).unwrap().name(), "Test");
    }

    #[test]
    fn test_detached_node_can_not_be_edited() {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        let auto = add(&mut model, modes, "Travel.Auto", "a");
        RemoveCollectionMemberCommand::new(modes, 0)
            .execute(&mut model)
            .unwrap();

        let mut command = SetModuleNameCommand::new(auto, "ghost");
        assert_eq!(command.execute(&mut model), Err(EditError::MissingNode));
    }
}
