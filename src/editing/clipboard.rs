// Copy buffer - serialized subtrees with their linked parameter membership

use crate::command::{
    AddParameterToLinkedParameterCommand, EditError, EditResult, NewLinkedParameterCommand,
    PasteModuleCommand,
};
use crate::editing::session::EditingSession;
use crate::model::{ModelSystem, NodeId};
use crate::project::serialization::{from_json, to_json};
use crate::project::types::{LinkedParameterSerializable, ModuleSerializable};
use serde::{Deserialize, Serialize};

/// One copied subtree
///
/// Linked parameter member paths are relative to `module`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CopiedModule {
    pub module: ModuleSerializable,
    #[serde(default)]
    pub linked_parameters: Vec<LinkedParameterSerializable>,
}

/// Everything a copy produced, exchanged as JSON text
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct CopyBuffer {
    pub modules: Vec<CopiedModule>,
}

impl CopyBuffer {
    /// Snapshot `nodes` and the linked groups touching their parameters
    ///
    /// # Errors
    /// Returns [`EditError::MissingNode`] when a node is not in the tree.
    pub fn capture(model: &ModelSystem, nodes: &[NodeId]) -> EditResult<Self> {
        let modules = nodes
            .iter()
            .map(|&node| {
                model.attached(node)?;
                Ok(CopiedModule {
                    module: model.serialize(node),
                    linked_parameters: model.linked_for_subtree(node),
                })
            })
            .collect::<EditResult<Vec<_>>>()?;
        Ok(Self { modules })
    }

    pub fn len(&self) -> usize {
        self.modules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.modules.is_empty()
    }

    pub fn to_json(&self) -> EditResult<String> {
        Ok(to_json(self)?)
    }

    /// # Errors
    /// Returns [`EditError::ClipboardDecode`] when `text` is not a copy buffer.
    pub fn from_json(text: &str) -> EditResult<Self> {
        from_json(text).map_err(|e| EditError::ClipboardDecode(e.to_string()))
    }
}

pub fn copy_module(session: &EditingSession, node: NodeId) -> EditResult<CopyBuffer> {
    copy_modules(session, &[node])
}

/// Copy several modules into one buffer
pub fn copy_modules(session: &EditingSession, nodes: &[NodeId]) -> EditResult<CopyBuffer> {
    session.with_model(|model| CopyBuffer::capture(model, nodes))
}

/// Where the pasted subtree will be found once the structural paste ran
enum Anchor {
    /// Appended to the target collection after `start` existing members
    Appended { start: usize },
    /// Replaced the target, which sat at this position
    Replaced { position: Option<(NodeId, usize)> },
}

/// Paste every module of `buffer` into or onto `target` as one undo entry
pub(crate) fn paste(session: &EditingSession, target: NodeId, buffer: &CopyBuffer) -> EditResult<()> {
    if buffer.is_empty() {
        return Err(EditError::Validation("There is nothing to paste!".to_string()));
    }
    let label = if buffer.len() == 1 {
        "Paste Module"
    } else {
        "Pasting Modules"
    };

    session.run_grouped(label, |session| {
        let target_is_collection = session.with_model(|model| {
            model.attached(target).map(|node| node.is_collection())
        })?;
        if buffer.len() > 1 && !target_is_collection {
            return Err(EditError::Validation(
                "Multiple modules can only be pasted into a collection!".to_string(),
            ));
        }
        for copied in &buffer.modules {
            paste_one(session, target, copied)?;
        }
        Ok(())
    })
}

fn paste_one(session: &EditingSession, target: NodeId, copied: &CopiedModule) -> EditResult<()> {
    let anchor = session.with_model(|model| -> EditResult<Anchor> {
        let node = model.attached(target)?;
        Ok(if node.is_collection() {
            Anchor::Appended {
                start: node.children().len(),
            }
        } else {
            Anchor::Replaced {
                position: model.index_in_parent(target),
            }
        })
    })?;

    session.run_command(PasteModuleCommand::new(target, copied.module.clone()))?;
    if copied.linked_parameters.is_empty() {
        return Ok(());
    }

    let (root, offset) = session
        .with_model(|model| match anchor {
            Anchor::Appended { start } if copied.module.is_collection() => Some((target, start)),
            Anchor::Appended { start } => model.children(target).get(start).map(|&n| (n, 0)),
            Anchor::Replaced {
                position: Some((parent, index)),
            } => model.children(parent).get(index).map(|&n| (n, 0)),
            Anchor::Replaced { position: None } => Some((model.root(), 0)),
        })
        .ok_or(EditError::MissingNode)?;

    for linked in &copied.linked_parameters {
        let group = match session.linked_registry().find_by_name(&linked.name) {
            Some(group) => group.id(),
            None => {
                session.run_command(NewLinkedParameterCommand::new(&linked.name, &linked.value))?;
                session
                    .linked_registry()
                    .find_by_name(&linked.name)
                    .map(|group| group.id())
                    .ok_or(EditError::MissingLinkedParameter)?
            }
        };
        for path in &linked.members {
            let parameter = session
                .with_model(|model| model.resolve_parameter(root, path, offset))
                .ok_or_else(|| {
                    EditError::Validation(format!(
                        "Unable to find the pasted parameter '{}' for linked parameter '{}'!",
                        path.parameter, linked.name
                    ))
                })?;
            session.run_command(AddParameterToLinkedParameterCommand::new(group, parameter))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ModuleType;
    use crate::model::tests::configured_model;

    fn session_with_linked_auto() -> (EditingSession, NodeId) {
        let session = EditingSession::new(configured_model());
        let modes = session.root_structure().child(0).unwrap();
        let auto = modes.add(ModuleType::new("Travel.Auto"), None).unwrap();
        let group = session.linked_parameters().create("speed", "50").unwrap();
        group
            .add_parameter(auto.parameter("Speed").unwrap().id())
            .unwrap();
        let auto_id = auto.id();
        (session, auto_id)
    }

    #[test]
    fn test_copy_buffer_json_round_trip() {
        let (session, auto) = session_with_linked_auto();
        let buffer = session.structure(auto).copy().unwrap();
        assert_eq!(buffer.modules[0].linked_parameters.len(), 1);

        let text = buffer.to_json().unwrap();
        assert_eq!(CopyBuffer::from_json(&text).unwrap(), buffer);
        assert!(matches!(
            CopyBuffer::from_json("{\"modules\": 3}"),
            Err(EditError::ClipboardDecode(_))
        ));
    }

    #[test]
    fn test_paste_joins_existing_group() {
        let (session, auto) = session_with_linked_auto();
        let modes = session.root_structure().child(0).unwrap();
        let buffer = session.structure(auto).copy().unwrap();

        modes.paste(&buffer).unwrap();
        assert_eq!(modes.children().len(), 2);
        let group = session.linked_parameters().find("speed").unwrap();
        assert_eq!(group.members().len(), 2);
        assert_eq!(session.undo_descriptions()[0], "Paste Module");

        session.undo().unwrap();
        assert_eq!(modes.children().len(), 1);
        assert_eq!(group.members().len(), 1);
    }

    #[test]
    fn test_paste_recreates_missing_group() {
        let (session, auto) = session_with_linked_auto();
        let buffer = session.structure(auto).copy().unwrap();
        let group = session.linked_parameters().find("speed").unwrap();
        group.remove().unwrap();

        let modes = session.root_structure().child(0).unwrap();
        modes.paste(&buffer).unwrap();
        let recreated = session.linked_parameters().find("speed").unwrap();
        assert_ne!(recreated.id(), group.id());
        assert_eq!(recreated.value(), "50");
        assert_eq!(recreated.members().len(), 1);
    }

    #[test]
    fn test_failed_paste_changes_nothing() {
        let (session, auto) = session_with_linked_auto();
        let network = session.root_structure().child(1).unwrap();
        let before = session.document();
        let buffer = session.structure(auto).copy().unwrap();

        assert!(matches!(
            network.paste(&buffer),
            Err(EditError::Validation(_))
        ));
        assert_eq!(session.document(), before);
        assert_eq!(session.undo_descriptions()[0], "Add Parameter to Linked Parameter");
    }

    #[test]
    fn test_multiple_modules_need_a_collection() {
        let (session, auto) = session_with_linked_auto();
        let buffer = copy_modules(&session, &[auto, auto]).unwrap();
        assert_eq!(buffer.len(), 2);

        let network = session.root_structure().child(1).unwrap();
        assert!(network.paste(&buffer).is_err());

        let modes = session.root_structure().child(0).unwrap();
        modes.paste(&buffer).unwrap();
        assert_eq!(modes.children().len(), 3);
        assert_eq!(session.undo_descriptions()[0], "Pasting Modules");
    }
}
