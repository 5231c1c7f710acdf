// PasteModuleCommand - structural half of a paste
//
// Linked parameter membership carried by a copy buffer is applied afterwards by
// the editing layer, as separate commands inside the same group.

use crate::command::trait_def::{EditError, EditResult, UndoableCommand};
use crate::messaging::{ChangeEvent, NodeProperty};
use crate::model::{LinkRecord, ModelSystem, NodeId, SlotShape};
use crate::project::types::ModuleSerializable;

/// Where a paste put its modules
#[derive(Debug, Clone)]
pub enum PasteOutcome {
    /// Modules were appended to the target collection starting at `start`
    Appended { start: usize, nodes: Vec<NodeId> },
    /// The target was swapped for a new module
    Replaced {
        old: NodeId,
        new: NodeId,
        links: Vec<LinkRecord>,
    },
}

/// Paste a copied module (or collection) into or onto `target`
///
/// * copied collection: every member is appended to the target collection
/// * copied module into a collection: appended
/// * copied module onto a single slot: replaces the target, keeping the
///   target's name, description, required flag and slot
pub struct PasteModuleCommand {
    target: NodeId,
    module: ModuleSerializable,
    outcome: Option<PasteOutcome>,
}

impl PasteModuleCommand {
    pub fn new(target: NodeId, module: ModuleSerializable) -> Self {
        Self {
            target,
            module,
            outcome: None,
        }
    }

    pub fn outcome(&self) -> Option<&PasteOutcome> {
        self.outcome.as_ref()
    }

    fn append(&self, model: &mut ModelSystem) -> EditResult<PasteOutcome> {
        let target = model.attached(self.target)?;
        let member = SlotShape::member_of(&target.slot);
        let constraint = target.slot.constraint.clone();
        let incoming: Vec<&ModuleSerializable> = if self.module.is_collection() {
            self.module.children.iter().collect()
        } else {
            vec![&self.module]
        };

        // Validate everything before allocating anything
        for module in &incoming {
            let module_type = module.module_type.as_ref().ok_or_else(|| {
                EditError::Validation(format!(
                    "The module '{}' has no type and can not be added to a collection!",
                    module.name
                ))
            })?;
            model.check_placement(module_type, &constraint, Some(self.target))?;
            model.validate_module(module, &member)?;
        }

        let nodes: Vec<NodeId> = incoming
            .into_iter()
            .map(|module| model.build_module(module, member.clone(), false, Some(self.target)))
            .collect();
        let children = model
            .node_mut(self.target)?
            .children
            .get_or_insert_with(Vec::new);
        let start = children.len();
        children.extend(nodes.iter().copied());
        model.notify(ChangeEvent::PropertyChanged {
            node: self.target,
            property: NodeProperty::Children,
        });
        Ok(PasteOutcome::Appended { start, nodes })
    }

    fn replace(&self, model: &mut ModelSystem) -> EditResult<PasteOutcome> {
        let target = model.attached(self.target)?;
        match &self.module.module_type {
            Some(module_type) => {
                model.check_placement(module_type, &target.slot.constraint, target.parent)?
            }
            None if target.required => {
                return Err(EditError::RequiredModule("cleared".to_string()));
            }
            None => {}
        }

        let mut inherited = self.module.clone();
        inherited.name = target.name.clone();
        inherited.description = target.description.clone();
        inherited.required = target.required;
        inherited.slot = target.slot.clone();
        let slot = target.slot.clone();
        let required = target.required;
        let parent = target.parent;
        model.validate_module(&inherited, &slot)?;

        let new = model.build_module(&inherited, slot, required, parent);
        let parameters = model.subtree_parameters(self.target);
        let links = model.detach_links(&parameters);
        Self::swap(model, self.target, new)?;
        Ok(PasteOutcome::Replaced {
            old: self.target,
            new,
            links,
        })
    }

    /// Put `incoming` where `current` sits in the tree
    fn swap(model: &mut ModelSystem, current: NodeId, incoming: NodeId) -> EditResult<()> {
        match model.index_in_parent(current) {
            Some((parent, index)) => {
                let children = model
                    .node_mut(parent)?
                    .children
                    .as_mut()
                    .ok_or(EditError::MissingNode)?;
                children[index] = incoming;
                model.notify(ChangeEvent::PropertyChanged {
                    node: parent,
                    property: NodeProperty::Children,
                });
            }
            None if current == model.root() => {
                model.set_root(incoming);
                model.notify(ChangeEvent::PropertyChanged {
                    node: incoming,
                    property: NodeProperty::Type,
                });
            }
            None => return Err(EditError::MissingNode),
        }
        Ok(())
    }
}

impl UndoableCommand for PasteModuleCommand {
    fn execute(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        let target = model.attached(self.target)?;
        let outcome = if target.is_collection() {
            self.append(model)?
        } else if self.module.is_collection() {
            return Err(EditError::Validation(
                "A collection can only be pasted into a collection!".to_string(),
            ));
        } else {
            self.replace(model)?
        };
        self.outcome = Some(outcome);
        Ok(())
    }

    fn undo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        match self.outcome.as_ref() {
            Some(PasteOutcome::Appended { nodes, .. }) => {
                let children = model
                    .node_mut(self.target)?
                    .children
                    .as_mut()
                    .ok_or(EditError::NotACollection)?;
                children.retain(|c| !nodes.contains(c));
                model.notify(ChangeEvent::PropertyChanged {
                    node: self.target,
                    property: NodeProperty::Children,
                });
                Ok(())
            }
            Some(PasteOutcome::Replaced { old, new, links }) => {
                Self::swap(model, *new, *old)?;
                model.restore_links(links);
                Ok(())
            }
            None => Err(EditError::Validation("Nothing was pasted".into())),
        }
    }

    fn redo(&mut self, model: &mut ModelSystem) -> EditResult<()> {
        match self.outcome.as_mut() {
            Some(PasteOutcome::Appended { start, nodes }) => {
                let children = model
                    .node_mut(self.target)?
                    .children
                    .as_mut()
                    .ok_or(EditError::NotACollection)?;
                let start = (*start).min(children.len());
                for (offset, &node) in nodes.iter().enumerate() {
                    children.insert(start + offset, node);
                }
                model.notify(ChangeEvent::PropertyChanged {
                    node: self.target,
                    property: NodeProperty::Children,
                });
                Ok(())
            }
            Some(PasteOutcome::Replaced { old, new, links }) => {
                let parameters = model.subtree_parameters(*old);
                *links = model.detach_links(&parameters);
                Self::swap(model, *old, *new)
            }
            None => self.execute(model),
        }
    }

    fn description(&self) -> String {
        format!("Paste {}", self.module.name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleType;
    use crate::command::structure::AddCollectionMemberCommand;
    use crate::model::tests::configured_model;

    fn with_modes() -> (ModelSystem, NodeId, NodeId) {
        let mut model = configured_model();
        let modes = model.find("Modes").unwrap();
        let mut add =
            AddCollectionMemberCommand::new(modes, ModuleType::new("Travel.Auto"), None);
        add.execute(&mut model).unwrap();
        let auto = add.added().unwrap();
        (model, modes, auto)
    }

    #[test]
    fn test_paste_single_into_collection_appends() {
        let (mut model, modes, auto) = with_modes();
        let copied = model.serialize(auto);

        let mut paste = PasteModuleCommand::new(modes, copied);
        paste.execute(&mut model).unwrap();
        assert_eq!(model.children(modes).len(), 2);

        paste.undo(&mut model).unwrap();
        assert_eq!(model.children(modes), &[auto]);

        paste.redo(&mut model).unwrap();
        assert_eq!(model.children(modes).len(), 2);
    }

    #[test]
    fn test_paste_collection_into_collection() {
        let (mut model, modes, _) = with_modes();
        let copied = model.serialize(modes);

        let mut paste = PasteModuleCommand::new(modes, copied);
        paste.execute(&mut model).unwrap();
        assert_eq!(model.children(modes).len(), 2);
        assert!(matches!(
            paste.outcome(),
            Some(PasteOutcome::Appended { start: 1, .. })
        ));
    }

    #[test]
    fn test_paste_incompatible_module_rejected() {
        let (mut model, _, auto) = with_modes();
        let network = model.find("Network").unwrap();
        let before = model.document();

        let mut paste = PasteModuleCommand::new(network, model.serialize(auto));
        assert!(matches!(
            paste.execute(&mut model),
            Err(EditError::Validation(_))
        ));
        assert_eq!(model.document(), before);
    }

    #[test]
    fn test_paste_collection_onto_single_rejected() {
        let (mut model, modes, _) = with_modes();
        let network = model.find("Network").unwrap();
        let mut paste = PasteModuleCommand::new(network, model.serialize(modes));
        assert!(paste.execute(&mut model).is_err());
    }

    #[test]
    fn test_paste_replaces_single_slot_and_inherits_name() {
        let mut model = configured_model();
        let network = model.find("Network").unwrap();
        let mut source = model.serialize(network);
        source.name = "Copied Roads".into();
        source.module_type = Some(ModuleType::new("Travel.RoadNetwork"));

        let mut paste = PasteModuleCommand::new(network, source);
        paste.execute(&mut model).unwrap();

        let replaced = model.children(model.root())[1];
        assert_ne!(replaced, network);
        let node = model.node(replaced).unwrap();
        assert_eq!(node.name(), "Network");
        assert!(node.is_required());
        assert_eq!(
            node.module_type().map(|t| t.as_str()),
            Some("Travel.RoadNetwork")
        );

        paste.undo(&mut model).unwrap();
        assert_eq!(model.children(model.root())[1], network);
    }

    #[test]
    fn test_paste_onto_root_replaces_root() {
        let mut model = configured_model();
        let old_root = model.root();
        let copied = model.serialize(old_root);

        let mut paste = PasteModuleCommand::new(old_root, copied);
        paste.execute(&mut model).unwrap();
        assert_ne!(model.root(), old_root);

        paste.undo(&mut model).unwrap();
        assert_eq!(model.root(), old_root);
    }
}
