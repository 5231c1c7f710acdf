// Model system - the module tree, its parameters and linked parameter groups
//
// ModelSystem is the state every UndoableCommand operates on. Nodes and
// parameters live in append-only arenas addressed by NodeId / ParameterId so
// commands can hold plain handles instead of references into the tree.

pub mod linked;
pub mod parameter;
pub mod tree;

pub use linked::{GroupId, LinkedParameterGroup, LinkedParameterRegistry};
pub use parameter::{Parameter, ParameterFlag, ParameterId, ParameterTable};
pub use tree::{ModuleNode, NodeId, SlotShape};

use crate::catalog::{ModuleCatalog, ModuleType, TypeConstraint, ValueParser};
use crate::command::trait_def::{EditError, EditResult};
use crate::messaging::notification::ChangeEvent;
use crate::project::types::{
    DocumentMetadata, LinkedParameterSerializable, ModelSystemDocument, ModuleSerializable,
    ParameterPath, ParameterSerializable,
};
use std::sync::Arc;

/// A linked parameter membership removed by an edit
///
/// Kept by the command so undo can put the parameter back at the same index.
#[derive(Debug, Clone)]
pub(crate) struct LinkRecord {
    pub group: Arc<LinkedParameterGroup>,
    pub parameter: ParameterId,
    pub index: usize,
}

/// The tree being edited plus everything needed to validate edits to it
pub struct ModelSystem {
    name: String,
    description: String,
    nodes: Vec<ModuleNode>,
    root: NodeId,
    parameters: ParameterTable,
    linked: Arc<LinkedParameterRegistry>,
    catalog: Arc<dyn ModuleCatalog>,
    parser: Arc<dyn ValueParser>,
    pending: Vec<ChangeEvent>,
}

impl std::fmt::Debug for ModelSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ModelSystem")
            .field("name", &self.name)
            .field("nodes", &self.nodes.len())
            .field("parameters", &self.parameters.len())
            .field("linked_parameters", &self.linked.len())
            .finish()
    }
}

impl ModelSystem {
    fn shell(
        name: String,
        catalog: Arc<dyn ModuleCatalog>,
        parser: Arc<dyn ValueParser>,
    ) -> Self {
        Self {
            name,
            description: String::new(),
            nodes: Vec::new(),
            root: NodeId(0),
            parameters: ParameterTable::new(),
            linked: Arc::new(LinkedParameterRegistry::new()),
            catalog,
            parser,
            pending: Vec::new(),
        }
    }

    /// Create a model system with an empty, required root
    ///
    /// # Arguments
    /// * `root_constraint` - interface the root module's type must satisfy
    pub fn new(
        name: impl Into<String>,
        root_constraint: TypeConstraint,
        catalog: Arc<dyn ModuleCatalog>,
        parser: Arc<dyn ValueParser>,
    ) -> Self {
        let name = name.into();
        let mut model = Self::shell(name.clone(), catalog, parser);
        let root_slot = SlotShape::single("Root", root_constraint);
        model.root = model.alloc(ModuleNode::empty(name, root_slot, true, None));
        model
    }

    /// Rebuild an editable model system from a saved document
    ///
    /// # Errors
    /// Returns [`EditError::Validation`] when the document references unknown
    /// types, holds values that do not parse, or has unresolvable links.
    pub fn from_document(
        document: &ModelSystemDocument,
        catalog: Arc<dyn ModuleCatalog>,
        parser: Arc<dyn ValueParser>,
    ) -> EditResult<Self> {
        let mut model = Self::shell(document.name.clone(), catalog, parser);
        model.description = document.description.clone();

        let root_slot = document.root.slot.clone();
        if let Some(module_type) = &document.root.module_type {
            model.check_placement(module_type, &root_slot.constraint, None)?;
        }
        model.validate_module(&document.root, &root_slot)?;
        model.root = model.build_module(&document.root, root_slot, true, None);

        let root = model.root;
        for linked in &document.linked_parameters {
            let group = model.linked.create(&linked.name, &linked.value)?;
            for path in &linked.members {
                let parameter = model.resolve_parameter(root, path, 0).ok_or_else(|| {
                    EditError::Validation(format!(
                        "The linked parameter '{}' references a missing parameter '{}'!",
                        linked.name, path.parameter
                    ))
                })?;
                if model.linked.is_linked(parameter) {
                    return Err(EditError::Validation(format!(
                        "The parameter '{}' belongs to more than one linked parameter!",
                        path.parameter
                    )));
                }
                let value_type = model.parameter_ref(parameter)?.value_type().clone();
                model
                    .parser
                    .check(&value_type, &linked.value)
                    .map_err(EditError::Validation)?;
                model.parameter_mut(parameter)?.value = linked.value.clone();
                group.insert_member(usize::MAX, parameter);
            }
        }
        Ok(model)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn root(&self) -> NodeId {
        self.root
    }

    pub fn node(&self, id: NodeId) -> Option<&ModuleNode> {
        self.nodes.get(id.0)
    }

    pub fn parameter(&self, id: ParameterId) -> Option<&Parameter> {
        self.parameters.get(id)
    }

    pub fn parameters(&self) -> &ParameterTable {
        &self.parameters
    }

    pub fn linked_parameters(&self) -> &Arc<LinkedParameterRegistry> {
        &self.linked
    }

    pub fn catalog(&self) -> &dyn ModuleCatalog {
        self.catalog.as_ref()
    }

    pub fn parser(&self) -> &dyn ValueParser {
        self.parser.as_ref()
    }

    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).and_then(|n| n.parent)
    }

    pub fn children(&self, id: NodeId) -> &[NodeId] {
        self.node(id).map(|n| n.children()).unwrap_or(&[])
    }

    /// Parent and position of an attached node; `None` for the root
    pub fn index_in_parent(&self, id: NodeId) -> Option<(NodeId, usize)> {
        let parent = self.parent_of(id)?;
        let index = self.children(parent).iter().position(|&c| c == id)?;
        Some((parent, index))
    }

    /// Whether the node is reachable from the root
    pub fn is_attached(&self, id: NodeId) -> bool {
        let mut current = id;
        loop {
            if current == self.root {
                return true;
            }
            match self.index_in_parent(current) {
                Some((parent, _)) => current = parent,
                None => return false,
            }
        }
    }

    /// First attached node with the given name, in pre-order
    pub fn find(&self, name: &str) -> Option<NodeId> {
        self.subtree(self.root)
            .into_iter()
            .find(|&id| self.nodes[id.0].name == name)
    }

    /// The node and its attached descendants, in pre-order
    pub fn subtree(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            let Some(node) = self.node(current) else {
                continue;
            };
            out.push(current);
            stack.extend(node.children().iter().rev());
        }
        out
    }

    /// Every parameter owned by the subtree rooted at `id`
    pub fn subtree_parameters(&self, id: NodeId) -> Vec<ParameterId> {
        self.subtree(id)
            .into_iter()
            .flat_map(|n| self.nodes[n.0].parameters.iter().copied())
            .collect()
    }

    /// Quick parameters of the attached tree, in pre-order
    pub fn quick_parameters(&self) -> Vec<ParameterId> {
        self.subtree_parameters(self.root)
            .into_iter()
            .filter(|&p| self.parameters.get(p).is_some_and(|p| p.is_quick()))
            .collect()
    }

    /// A node's parameter by its declared name
    pub fn parameter_by_name(&self, node: NodeId, declared_name: &str) -> Option<ParameterId> {
        self.node(node)?
            .parameters
            .iter()
            .copied()
            .find(|&p| self.parameters.get(p).is_some_and(|p| p.declared_name == declared_name))
    }

    /// Snapshot of the attached tree and linked parameters
    pub fn document(&self) -> ModelSystemDocument {
        let root = self.root;
        ModelSystemDocument {
            metadata: DocumentMetadata::default(),
            name: self.name.clone(),
            description: self.description.clone(),
            root: self.serialize(root),
            linked_parameters: self
                .linked
                .groups()
                .iter()
                .map(|group| LinkedParameterSerializable {
                    name: group.name(),
                    value: group.value(),
                    members: group
                        .members()
                        .into_iter()
                        .filter_map(|p| self.path_of(root, p))
                        .collect(),
                })
                .collect(),
        }
    }

    /// Serializable snapshot of one attached subtree
    pub fn serialize(&self, id: NodeId) -> ModuleSerializable {
        let node = &self.nodes[id.0];
        ModuleSerializable {
            name: node.name.clone(),
            description: node.description.clone(),
            module_type: node.module_type.clone(),
            slot: node.slot.clone(),
            required: node.required,
            disabled: node.disabled,
            meta_module: node.meta_module,
            parameters: node
                .parameters
                .iter()
                .filter_map(|&p| self.parameters.get(p))
                .map(|p| ParameterSerializable {
                    name: p.declared_name.clone(),
                    display_name: (p.display_name != p.declared_name)
                        .then(|| p.display_name.clone()),
                    value: p.value.clone(),
                    quick: p.quick,
                    hidden: p.hidden,
                })
                .collect(),
            children: node.children().iter().map(|&c| self.serialize(c)).collect(),
        }
    }

    /// Linked groups touching a subtree, with members relative to its root
    pub fn linked_for_subtree(&self, id: NodeId) -> Vec<LinkedParameterSerializable> {
        self.linked
            .groups()
            .iter()
            .filter_map(|group| {
                let members: Vec<_> = group
                    .members()
                    .into_iter()
                    .filter_map(|p| self.path_of(id, p))
                    .collect();
                (!members.is_empty()).then(|| LinkedParameterSerializable {
                    name: group.name(),
                    value: group.value(),
                    members,
                })
            })
            .collect()
    }

    /// Path from `ancestor` to an attached parameter below it
    pub fn path_of(&self, ancestor: NodeId, parameter: ParameterId) -> Option<ParameterPath> {
        let parameter = self.parameters.get(parameter)?;
        let mut nodes = Vec::new();
        let mut current = parameter.owner;
        while current != ancestor {
            let (parent, index) = self.index_in_parent(current)?;
            nodes.push(index);
            current = parent;
        }
        nodes.reverse();
        Some(ParameterPath {
            nodes,
            parameter: parameter.declared_name.clone(),
        })
    }

    /// Follow a path from `root`; `offset` is added to the first child index
    pub fn resolve_parameter(
        &self,
        root: NodeId,
        path: &ParameterPath,
        offset: usize,
    ) -> Option<ParameterId> {
        let mut current = root;
        for (depth, &index) in path.nodes.iter().enumerate() {
            let index = if depth == 0 { index + offset } else { index };
            current = *self.children(current).get(index)?;
        }
        self.parameter_by_name(current, &path.parameter)
    }

    /// Module types that could be assigned to `id` where it currently sits
    pub fn valid_module_types(&self, id: NodeId) -> Vec<ModuleType> {
        let Some(node) = self.node(id) else {
            return Vec::new();
        };
        let (constraint, parent) = if node.is_collection() {
            (&node.slot.constraint, Some(id))
        } else {
            (&node.slot.constraint, node.parent)
        };
        self.catalog
            .module_types()
            .into_iter()
            .filter(|ty| self.check_placement(ty, constraint, parent).is_ok())
            .collect()
    }

    // ---- crate internal editing primitives ----

    pub(crate) fn alloc(&mut self, node: ModuleNode) -> NodeId {
        self.nodes.push(node);
        NodeId(self.nodes.len() - 1)
    }

    pub(crate) fn set_root(&mut self, id: NodeId) {
        self.root = id;
    }

    /// An attached node, or [`EditError::MissingNode`]
    pub(crate) fn attached(&self, id: NodeId) -> EditResult<&ModuleNode> {
        if !self.is_attached(id) {
            return Err(EditError::MissingNode);
        }
        self.node(id).ok_or(EditError::MissingNode)
    }

    pub(crate) fn node_mut(&mut self, id: NodeId) -> EditResult<&mut ModuleNode> {
        self.nodes.get_mut(id.0).ok_or(EditError::MissingNode)
    }

    pub(crate) fn parameter_ref(&self, id: ParameterId) -> EditResult<&Parameter> {
        self.parameters.get(id).ok_or(EditError::MissingParameter)
    }

    pub(crate) fn parameter_mut(&mut self, id: ParameterId) -> EditResult<&mut Parameter> {
        self.parameters.get_mut(id).ok_or(EditError::MissingParameter)
    }

    /// Check a value against a parameter's declared type
    pub(crate) fn check_value(&self, id: ParameterId, value: &str) -> EditResult<()> {
        let parameter = self.parameter_ref(id)?;
        self.parser
            .check(parameter.value_type(), value)
            .map_err(EditError::Parse)
    }

    /// Set every member of a linked group to `value`
    pub(crate) fn set_linked_value(
        &mut self,
        group: &LinkedParameterGroup,
        value: &str,
    ) -> EditResult<String> {
        group.set_all(value, &mut self.parameters, self.parser.as_ref())
    }

    /// The first ancestor that is not a collection, starting at `parent`
    fn nearest_typed_ancestor(&self, mut parent: Option<NodeId>) -> Option<&ModuleType> {
        while let Some(id) = parent {
            let node = self.node(id)?;
            if !node.is_collection() {
                return node.module_type.as_ref();
            }
            parent = node.parent;
        }
        None
    }

    /// Validate that `module_type` may live in a slot with `constraint` below `parent`
    ///
    /// `parent` is `None` for the root position.
    pub(crate) fn check_placement(
        &self,
        module_type: &ModuleType,
        constraint: &TypeConstraint,
        parent: Option<NodeId>,
    ) -> EditResult<()> {
        let descriptor = self.catalog.descriptor(module_type).ok_or_else(|| {
            EditError::Validation(format!("The module type '{}' is not known!", module_type))
        })?;
        if !descriptor.satisfies(constraint) {
            return Err(EditError::Validation(format!(
                "The type {} is not assignable to {}!",
                module_type.short_name(),
                constraint
            )));
        }

        if let Some(required) = &descriptor.required_parent {
            let parent_ok = self
                .nearest_typed_ancestor(parent)
                .is_some_and(|ty| self.catalog.satisfies(ty, required));
            if !parent_ok {
                return Err(EditError::Validation(format!(
                    "The type {} requires a parent of type {}!",
                    module_type.short_name(),
                    required
                )));
            }
        }

        if let Some(required) = &descriptor.required_root {
            let mut root_ok = parent.is_none() && descriptor.satisfies(required);
            let mut current = parent;
            while let Some(id) = current {
                if root_ok {
                    break;
                }
                let Some(node) = self.node(id) else {
                    break;
                };
                root_ok = node
                    .module_type
                    .as_ref()
                    .is_some_and(|ty| self.catalog.satisfies(ty, required));
                current = node.parent;
            }
            if !root_ok {
                return Err(EditError::Validation(format!(
                    "The type {} requires a root of type {}!",
                    module_type.short_name(),
                    required
                )));
            }
        }
        Ok(())
    }

    /// Check a serialized subtree before anything is allocated for it
    pub(crate) fn validate_module(
        &self,
        module: &ModuleSerializable,
        slot: &SlotShape,
    ) -> EditResult<()> {
        if module.is_collection() != slot.is_collection() {
            return Err(EditError::Validation(format!(
                "The module '{}' does not fit into the slot '{}'!",
                module.name, slot.field_name
            )));
        }
        if slot.is_collection() {
            let member = SlotShape::member_of(slot);
            for child in &module.children {
                self.validate_module(child, &member)?;
            }
            return Ok(());
        }
        let Some(module_type) = &module.module_type else {
            return Ok(());
        };
        let descriptor = self.catalog.descriptor(module_type).ok_or_else(|| {
            EditError::Validation(format!("The module type '{}' is not known!", module_type))
        })?;
        if !descriptor.satisfies(&slot.constraint) {
            return Err(EditError::Validation(format!(
                "The type {} is not assignable to {}!",
                module_type.short_name(),
                slot.constraint
            )));
        }
        for saved in &module.parameters {
            if let Some(declared) = descriptor.parameters.iter().find(|p| p.name == saved.name) {
                self.parser
                    .check(&declared.value_type, &saved.value)
                    .map_err(|e| {
                        EditError::Validation(format!(
                            "{} in '{}': {}",
                            saved.name, module.name, e
                        ))
                    })?;
            }
        }
        for declared in &descriptor.slots {
            let shape = SlotShape::from_descriptor(declared);
            if let Some(child) = module.children.iter().find(|c| c.slot == shape) {
                self.validate_module(child, &shape)?;
            }
        }
        Ok(())
    }

    /// Allocate nodes and parameters for a validated serialized subtree
    pub(crate) fn build_module(
        &mut self,
        module: &ModuleSerializable,
        slot: SlotShape,
        required: bool,
        parent: Option<NodeId>,
    ) -> NodeId {
        let mut node = ModuleNode::empty(module.name.clone(), slot.clone(), required, parent);
        node.description = module.description.clone();
        node.disabled = module.disabled;
        node.meta_module = module.meta_module;
        let id = self.alloc(node);

        if slot.is_collection() {
            let member = SlotShape::member_of(&slot);
            let children = module
                .children
                .iter()
                .map(|child| self.build_module(child, member.clone(), false, Some(id)))
                .collect();
            self.nodes[id.0].children = Some(children);
            return id;
        }

        let Some(module_type) = module.module_type.clone() else {
            return id;
        };
        let catalog = Arc::clone(&self.catalog);
        let Some(descriptor) = catalog.descriptor(&module_type) else {
            return id;
        };

        let mut parameters = Vec::with_capacity(descriptor.parameters.len());
        for declared in &descriptor.parameters {
            let mut parameter = Parameter::from_descriptor(declared, id);
            if let Some(saved) = module.parameters.iter().find(|p| p.name == declared.name) {
                parameter.value = saved.value.clone();
                if let Some(display_name) = &saved.display_name {
                    parameter.display_name = display_name.clone();
                }
                parameter.quick = saved.quick;
                parameter.hidden = saved.hidden;
            }
            parameters.push(self.parameters.insert(parameter));
        }

        let children = if descriptor.slots.is_empty() {
            None
        } else {
            let mut children = Vec::with_capacity(descriptor.slots.len());
            for declared in &descriptor.slots {
                let shape = SlotShape::from_descriptor(declared);
                let child = match module.children.iter().find(|c| c.slot == shape) {
                    Some(saved) => self.build_module(saved, shape, declared.required, Some(id)),
                    None => self.alloc(ModuleNode::empty(
                        declared.name.clone(),
                        shape,
                        declared.required,
                        Some(id),
                    )),
                };
                children.push(child);
            }
            Some(children)
        };

        let node = &mut self.nodes[id.0];
        node.module_type = Some(module_type);
        node.parameters = parameters;
        node.children = children;
        id
    }

    /// Allocate a freshly configured module of `module_type`
    pub(crate) fn create_module(
        &mut self,
        module_type: &ModuleType,
        name: String,
        slot: SlotShape,
        parent: NodeId,
    ) -> NodeId {
        let stub = ModuleSerializable {
            name,
            description: String::new(),
            module_type: Some(module_type.clone()),
            slot: slot.clone(),
            required: false,
            disabled: false,
            meta_module: false,
            parameters: Vec::new(),
            children: Vec::new(),
        };
        self.build_module(&stub, slot, false, Some(parent))
    }

    /// Child list and default parameters for assigning `module_type` to `id`
    ///
    /// Existing children whose slot has the same name and shape are reused;
    /// nothing is attached here.
    pub(crate) fn configure_type(
        &mut self,
        id: NodeId,
        module_type: Option<&ModuleType>,
    ) -> (Option<Vec<NodeId>>, Vec<ParameterId>) {
        let Some(module_type) = module_type else {
            return (None, Vec::new());
        };
        let catalog = Arc::clone(&self.catalog);
        let Some(descriptor) = catalog.descriptor(module_type) else {
            return (None, Vec::new());
        };
        let old_children = self.children(id).to_vec();

        let parameters = descriptor
            .parameters
            .iter()
            .map(|declared| {
                self.parameters
                    .insert(Parameter::from_descriptor(declared, id))
            })
            .collect();

        if descriptor.slots.is_empty() {
            return (None, parameters);
        }
        let mut children = Vec::with_capacity(descriptor.slots.len());
        for declared in &descriptor.slots {
            let shape = SlotShape::from_descriptor(declared);
            let reused = old_children
                .iter()
                .copied()
                .find(|&c| self.nodes[c.0].slot == shape);
            let child = match reused {
                Some(child) => child,
                None => self.alloc(ModuleNode::empty(
                    declared.name.clone(),
                    shape,
                    declared.required,
                    Some(id),
                )),
            };
            children.push(child);
        }
        (Some(children), parameters)
    }

    /// Unlink every listed parameter that belongs to a group
    pub(crate) fn detach_links(&mut self, parameters: &[ParameterId]) -> Vec<LinkRecord> {
        let records: Vec<LinkRecord> = parameters
            .iter()
            .filter_map(|&parameter| {
                let group = self.linked.group_of(parameter)?;
                let index = group.remove_member(parameter)?;
                Some(LinkRecord {
                    group,
                    parameter,
                    index,
                })
            })
            .collect();
        if !records.is_empty() {
            self.notify(ChangeEvent::LinkedParametersChanged);
        }
        records
    }

    /// Reverse [`detach_links`](Self::detach_links)
    pub(crate) fn restore_links(&mut self, records: &[LinkRecord]) {
        for record in records.iter().rev() {
            record.group.insert_member(record.index, record.parameter);
        }
        if !records.is_empty() {
            self.notify(ChangeEvent::LinkedParametersChanged);
        }
    }

    pub(crate) fn notify(&mut self, event: ChangeEvent) {
        self.pending.push(event);
    }

    pub(crate) fn take_pending(&mut self) -> Vec<ChangeEvent> {
        std::mem::take(&mut self.pending)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::catalog::{
        DefaultValueParser, ModuleDescriptor, ParameterDescriptor, SlotDescriptor,
        StaticCatalog, ValueType,
    };

    /// Small catalog shared by the crate's unit tests
    ///
    /// `Travel.Demand` is the root type with a `Modes` collection of `IMode`
    /// and a single `Network` slot.
    pub(crate) fn test_catalog() -> StaticCatalog {
        StaticCatalog::new()
            .with(
                ModuleDescriptor::new("Travel.Demand")
                    .implements("IModelSystemTemplate")
                    .parameter(ParameterDescriptor::new("Iterations", ValueType::Integer, "1"))
                    .slot(SlotDescriptor::collection("Modes", TypeConstraint::new("IMode")))
                    .slot(SlotDescriptor::single("Network", TypeConstraint::new("INetwork"))),
            )
            .with(
                ModuleDescriptor::new("Travel.Auto")
                    .implements("IMode")
                    .parameter(ParameterDescriptor::new("Speed", ValueType::Float, "0"))
                    .parameter(ParameterDescriptor::new("Label", ValueType::Text, "car")),
            )
            .with(
                ModuleDescriptor::new("Travel.Transit")
                    .implements("IMode")
                    .parameter(ParameterDescriptor::new("Speed", ValueType::Float, "0"))
                    .requires_root("IModelSystemTemplate"),
            )
            .with(
                ModuleDescriptor::new("Travel.RoadNetwork")
                    .implements("INetwork")
                    .parameter(ParameterDescriptor::new("Lanes", ValueType::Integer, "2")),
            )
            .with(
                ModuleDescriptor::new("Travel.Walk")
                    .implements("IMode")
                    .requires_parent("INetwork"),
            )
    }

    pub(crate) fn test_model() -> ModelSystem {
        ModelSystem::new(
            "Test",
            TypeConstraint::new("IModelSystemTemplate"),
            Arc::new(test_catalog()),
            Arc::new(DefaultValueParser),
        )
    }

    /// Root typed as `Travel.Demand`, assigned without going through a command
    pub(crate) fn configured_model() -> ModelSystem {
        let mut model = test_model();
        let root = model.root();
        let ty = ModuleType::new("Travel.Demand");
        let (children, parameters) = model.configure_type(root, Some(&ty));
        let node = model.node_mut(root).unwrap();
        node.module_type = Some(ty);
        node.children = children;
        node.parameters = parameters;
        model
    }

    #[test]
    fn test_new_model_has_required_empty_root() {
        let model = test_model();
        let root = model.node(model.root()).unwrap();
        assert!(root.is_required());
        assert!(root.module_type().is_none());
        assert!(model.is_attached(model.root()));
    }

    #[test]
    fn test_configure_type_builds_declared_slots() {
        let model = configured_model();
        let root = model.root();
        assert_eq!(model.children(root).len(), 2);

        let modes = model.find("Modes").unwrap();
        assert!(model.node(modes).unwrap().is_collection());
        let network = model.find("Network").unwrap();
        assert!(model.node(network).unwrap().is_required());
        assert_eq!(model.index_in_parent(network), Some((root, 1)));
        assert!(model.parameter_by_name(root, "Iterations").is_some());
    }

    #[test]
    fn test_check_placement_rules() {
        let model = configured_model();
        let modes = model.find("Modes").unwrap();
        let imode = TypeConstraint::new("IMode");

        assert!(model
            .check_placement(&ModuleType::new("Travel.Auto"), &imode, Some(modes))
            .is_ok());
        // root requirement satisfied by Travel.Demand above the collection
        assert!(model
            .check_placement(&ModuleType::new("Travel.Transit"), &imode, Some(modes))
            .is_ok());
        // nearest typed ancestor is Travel.Demand, not an INetwork
        assert!(model
            .check_placement(&ModuleType::new("Travel.Walk"), &imode, Some(modes))
            .is_err());
        assert!(model
            .check_placement(&ModuleType::new("Travel.RoadNetwork"), &imode, Some(modes))
            .is_err());
        assert!(model
            .check_placement(&ModuleType::new("Nope"), &imode, Some(modes))
            .is_err());
    }

    #[test]
    fn test_document_round_trip() {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        let slot = SlotShape::member_of(model.node(modes).unwrap().slot());
        let auto = model.create_module(&ModuleType::new("Travel.Auto"), "Auto".into(), slot, modes);
        model.node_mut(modes).unwrap().children.as_mut().unwrap().push(auto);

        let speed = model.parameter_by_name(auto, "Speed").unwrap();
        let group = model.linked.create("speed", "0").unwrap();
        group.insert_member(0, speed);

        let document = model.document();
        let rebuilt = ModelSystem::from_document(
            &document,
            Arc::new(test_catalog()),
            Arc::new(DefaultValueParser),
        )
        .unwrap();
        assert_eq!(rebuilt.document(), document);
        assert_eq!(document.module_count(), 4);
        assert_eq!(document.linked_parameters[0].members[0].nodes, vec![0, 0]);
    }

    #[test]
    fn test_from_document_rejects_bad_value() {
        let mut document = configured_model().document();
        document.root.parameters[0].value = "many".into();
        let result = ModelSystem::from_document(
            &document,
            Arc::new(test_catalog()),
            Arc::new(DefaultValueParser),
        );
        assert!(matches!(result, Err(EditError::Validation(_))));
    }

    #[test]
    fn test_detach_and_restore_links() {
        let mut model = configured_model();
        let root = model.root();
        let iterations = model.parameter_by_name(root, "Iterations").unwrap();
        let group = model.linked.create("loops", "1").unwrap();
        group.insert_member(0, iterations);

        let records = model.detach_links(&[iterations]);
        assert_eq!(records.len(), 1);
        assert!(!model.linked.is_linked(iterations));

        model.restore_links(&records);
        assert_eq!(group.index_of(iterations), Some(0));
        assert_eq!(
            model.take_pending(),
            vec![
                ChangeEvent::LinkedParametersChanged,
                ChangeEvent::LinkedParametersChanged
            ]
        );
    }

    #[test]
    fn test_quick_parameters_skip_detached_nodes() {
        let mut model = configured_model();
        let root = model.root();
        let iterations = model.parameter_by_name(root, "Iterations").unwrap();
        assert!(model.quick_parameters().is_empty());

        model
            .parameter_mut(iterations)
            .unwrap()
            .set_flag(ParameterFlag::Quick, true);
        assert_eq!(model.quick_parameters(), vec![iterations]);

        let network = model.children(root)[1];
        let ty = ModuleType::new("Travel.RoadNetwork");
        let (_, parameters) = model.configure_type(network, Some(&ty));
        let lanes = parameters[0];
        {
            let node = model.node_mut(network).unwrap();
            node.module_type = Some(ty);
            node.parameters = parameters;
        }
        model
            .parameter_mut(lanes)
            .unwrap()
            .set_flag(ParameterFlag::Quick, true);
        assert_eq!(model.quick_parameters(), vec![iterations, lanes]);

        model
            .node_mut(root)
            .unwrap()
            .children
            .as_mut()
            .unwrap()
            .retain(|&c| c != network);
        assert_eq!(model.quick_parameters(), vec![iterations]);
    }
}
