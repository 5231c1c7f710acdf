// Module tree - arena of configured modules
//
// Nodes are addressed by NodeId. A node removed from the tree is only detached
// from its parent's child list; it stays in the arena so undo can put it back.

use crate::catalog::{ModuleType, SlotDescriptor, SlotKind, TypeConstraint};
use crate::model::parameter::ParameterId;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Handle to a node in a model system's arena
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub(crate) usize);

impl NodeId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// The slot a node occupies in its parent
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SlotShape {
    pub field_name: String,
    /// For collections this is the element constraint
    pub constraint: TypeConstraint,
    pub kind: SlotKind,
}

impl SlotShape {
    pub fn single(field_name: impl Into<String>, constraint: TypeConstraint) -> Self {
        Self {
            field_name: field_name.into(),
            constraint,
            kind: SlotKind::Single,
        }
    }

    /// Shape of a member living inside a collection with this shape
    pub fn member_of(collection: &SlotShape) -> Self {
        Self {
            field_name: collection.field_name.clone(),
            constraint: collection.constraint.clone(),
            kind: SlotKind::Single,
        }
    }

    pub(crate) fn from_descriptor(slot: &SlotDescriptor) -> Self {
        Self {
            field_name: slot.name.clone(),
            constraint: slot.constraint.clone(),
            kind: slot.kind,
        }
    }

    pub fn is_collection(&self) -> bool {
        self.kind == SlotKind::Collection
    }
}

/// One configured unit in a model system
#[derive(Debug, Clone)]
pub struct ModuleNode {
    pub(crate) name: String,
    pub(crate) description: String,
    pub(crate) module_type: Option<ModuleType>,
    pub(crate) slot: SlotShape,
    pub(crate) required: bool,
    pub(crate) disabled: bool,
    pub(crate) meta_module: bool,
    pub(crate) children: Option<Vec<NodeId>>,
    pub(crate) parameters: Vec<ParameterId>,
    pub(crate) parent: Option<NodeId>,
}

impl ModuleNode {
    /// An unconfigured node for the given slot
    pub(crate) fn empty(
        name: impl Into<String>,
        slot: SlotShape,
        required: bool,
        parent: Option<NodeId>,
    ) -> Self {
        let children = if slot.is_collection() {
            Some(Vec::new())
        } else {
            None
        };
        Self {
            name: name.into(),
            description: String::new(),
            module_type: None,
            slot,
            required,
            disabled: false,
            meta_module: false,
            children,
            parameters: Vec::new(),
            parent,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    pub fn module_type(&self) -> Option<&ModuleType> {
        self.module_type.as_ref()
    }

    pub fn slot(&self) -> &SlotShape {
        &self.slot
    }

    pub fn is_collection(&self) -> bool {
        self.slot.is_collection()
    }

    pub fn is_required(&self) -> bool {
        self.required
    }

    pub fn is_disabled(&self) -> bool {
        self.disabled
    }

    pub fn is_meta_module(&self) -> bool {
        self.meta_module
    }

    /// Child handles; empty when the node has no child list
    pub fn children(&self) -> &[NodeId] {
        self.children.as_deref().unwrap_or(&[])
    }

    pub fn has_children_list(&self) -> bool {
        self.children.is_some()
    }

    pub fn parameters(&self) -> &[ParameterId] {
        &self.parameters
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }
}

/// Move the element at `from` so it ends up at `to`
pub(crate) fn move_within<T>(items: &mut Vec<T>, from: usize, to: usize) {
    let item = items.remove(from);
    items.insert(to, item);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_within() {
        let mut items = vec!['a', 'b', 'c'];
        move_within(&mut items, 0, 2);
        assert_eq!(items, vec!['b', 'c', 'a']);
        move_within(&mut items, 2, 0);
        assert_eq!(items, vec!['a', 'b', 'c']);
    }

    #[test]
    fn test_empty_collection_node_has_child_list() {
        let shape = SlotShape {
            field_name: "Modes".into(),
            constraint: TypeConstraint::new("IMode"),
            kind: SlotKind::Collection,
        };
        let node = ModuleNode::empty("Modes", shape.clone(), false, None);
        assert!(node.is_collection());
        assert!(node.has_children_list());

        let member = SlotShape::member_of(&shape);
        assert_eq!(member.kind, SlotKind::Single);
        assert_eq!(member.constraint, TypeConstraint::new("IMode"));
    }
}
