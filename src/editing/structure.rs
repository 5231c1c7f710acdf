// StructureModel - editing handle over one module of the tree

use crate::catalog::ModuleType;
use crate::command::{
    AddCollectionMemberCommand, EditError, EditResult, MoveCollectionMemberCommand,
    RemoveAllCollectionMembersCommand, RemoveCollectionMemberCommand, SetMetaModuleCommand,
    SetModuleDescriptionCommand, SetModuleDisabledCommand, SetModuleNameCommand,
    SetModuleTypeCommand,
};
use crate::editing::clipboard::{self, CopyBuffer};
use crate::editing::parameter::ParameterModel;
use crate::editing::session::EditingSession;
use crate::model::{ModuleNode, NodeId};

/// Handle over one node
///
/// Reads go to the model under the session lock; every mutation becomes an
/// undoable command. A handle stays valid after its node is detached, but
/// reads then return defaults and edits fail with [`EditError::MissingNode`].
#[derive(Clone, Copy)]
pub struct StructureModel<'s> {
    session: &'s EditingSession,
    node: NodeId,
}

impl<'s> StructureModel<'s> {
    pub(crate) fn new(session: &'s EditingSession, node: NodeId) -> Self {
        Self { session, node }
    }

    pub fn id(&self) -> NodeId {
        self.node
    }

    fn read<R: Default>(&self, f: impl FnOnce(&ModuleNode) -> R) -> R {
        self.session
            .with_model(|model| model.node(self.node).map(f).unwrap_or_default())
    }

    pub fn name(&self) -> String {
        self.read(|node| node.name().to_string())
    }

    pub fn description(&self) -> String {
        self.read(|node| node.description().to_string())
    }

    pub fn module_type(&self) -> Option<ModuleType> {
        self.session
            .with_model(|model| model.node(self.node)?.module_type().cloned())
    }

    pub fn is_collection(&self) -> bool {
        self.read(|node| node.is_collection())
    }

    pub fn is_required(&self) -> bool {
        self.read(|node| node.is_required())
    }

    pub fn is_disabled(&self) -> bool {
        self.read(|node| node.is_disabled())
    }

    pub fn is_meta_module(&self) -> bool {
        self.read(|node| node.is_meta_module())
    }

    pub fn is_attached(&self) -> bool {
        self.session.with_model(|model| model.is_attached(self.node))
    }

    pub fn parent(&self) -> Option<StructureModel<'s>> {
        self.session
            .with_model(|model| model.parent_of(self.node))
            .map(|parent| StructureModel::new(self.session, parent))
    }

    pub fn children(&self) -> Vec<StructureModel<'s>> {
        self.session
            .with_model(|model| model.children(self.node).to_vec())
            .into_iter()
            .map(|child| StructureModel::new(self.session, child))
            .collect()
    }

    pub fn child(&self, index: usize) -> Option<StructureModel<'s>> {
        self.session
            .with_model(|model| model.children(self.node).get(index).copied())
            .map(|child| StructureModel::new(self.session, child))
    }

    pub fn parameters(&self) -> Vec<ParameterModel<'s>> {
        self.read(|node| node.parameters().to_vec())
            .into_iter()
            .map(|parameter| ParameterModel::new(self.session, parameter))
            .collect()
    }

    /// Parameter by the name its module type declares
    pub fn parameter(&self, declared_name: &str) -> Option<ParameterModel<'s>> {
        self.session
            .with_model(|model| model.parameter_by_name(self.node, declared_name))
            .map(|parameter| ParameterModel::new(self.session, parameter))
    }

    /// Types that could be assigned here, or added here for a collection
    pub fn valid_module_types(&self) -> Vec<ModuleType> {
        self.session
            .with_model(|model| model.valid_module_types(self.node))
    }

    // ---- structural edits ----

    /// Assign or clear the module's type; assigning the current type is a no-op
    pub fn set_type(&self, module_type: Option<ModuleType>) -> EditResult<()> {
        self.session.ensure_not_running()?;
        if self.module_type() == module_type {
            return Ok(());
        }
        self.session
            .run_command(SetModuleTypeCommand::new(self.node, module_type))
    }

    /// Append a new member of `module_type` to this collection
    ///
    /// Without a name the member is named after its type.
    pub fn add(&self, module_type: ModuleType, name: Option<&str>) -> EditResult<StructureModel<'s>> {
        let command =
            AddCollectionMemberCommand::new(self.node, module_type, name.map(str::to_string));
        self.session.locked(|| {
            self.session.run_command(command)?;
            self.session
                .with_model(|model| model.children(self.node).last().copied())
                .map(|child| StructureModel::new(self.session, child))
                .ok_or(EditError::MissingNode)
        })
    }

    pub fn remove_child(&self, index: usize) -> EditResult<()> {
        self.session
            .run_command(RemoveCollectionMemberCommand::new(self.node, index))
    }

    pub fn remove_all_children(&self) -> EditResult<()> {
        self.session
            .run_command(RemoveAllCollectionMembersCommand::new(self.node))
    }

    /// Delete this module the way its position allows
    ///
    /// A collection loses all of its members, a collection member is removed
    /// from its parent, and any other module has its type cleared.
    pub fn remove(&self) -> EditResult<()> {
        self.session.locked(|| {
            self.session.ensure_not_running()?;
            let (is_collection, member_of) = self.session.with_model(|model| {
                let node = model.attached(self.node)?;
                let member_of = model
                    .index_in_parent(self.node)
                    .filter(|&(parent, _)| model.node(parent).is_some_and(|p| p.is_collection()));
                Ok::<_, EditError>((node.is_collection(), member_of))
            })?;

            if is_collection {
                return self.remove_all_children();
            }
            match member_of {
                Some((parent, index)) => self
                    .session
                    .run_command(RemoveCollectionMemberCommand::new(parent, index)),
                None => self
                    .session
                    .run_command(SetModuleTypeCommand::new(self.node, None)),
            }
        })
    }

    pub fn move_child(&self, from: usize, to: usize) -> EditResult<()> {
        self.session
            .run_command(MoveCollectionMemberCommand::new(self.node, from, to))
    }

    /// Shift this module `delta` places within its parent collection
    pub fn move_in_parent(&self, delta: isize) -> EditResult<()> {
        self.session.locked(|| {
            let (parent, index, len) = self.session.with_model(|model| {
                let (parent, index) = model.index_in_parent(self.node)?;
                let is_collection = model.node(parent)?.is_collection();
                Some((parent, index, is_collection.then(|| model.children(parent).len())))
            })
            .ok_or(EditError::MissingNode)?;
            let len = len.ok_or(EditError::NotACollection)?;

            let target = index
                .checked_add_signed(delta)
                .filter(|&target| target < len)
                .ok_or_else(|| EditError::InvalidIndex {
                    index,
                    reason: format!("can not move by {} in a collection of {}", delta, len),
                })?;
            self.session
                .run_command(MoveCollectionMemberCommand::new(parent, index, target))
        })
    }

    pub fn set_name(&self, name: &str) -> EditResult<()> {
        self.session
            .run_command(SetModuleNameCommand::new(self.node, name))
    }

    pub fn set_description(&self, description: &str) -> EditResult<()> {
        self.session
            .run_command(SetModuleDescriptionCommand::new(self.node, description))
    }

    /// Enable or disable the module; setting the current state is a no-op
    pub fn set_disabled(&self, disabled: bool) -> EditResult<()> {
        self.session.ensure_not_running()?;
        if self.is_attached() && self.is_disabled() == disabled {
            return Ok(());
        }
        self.session
            .run_command(SetModuleDisabledCommand::new(self.node, disabled))
    }

    pub fn set_meta_module(&self, meta_module: bool) -> EditResult<()> {
        self.session
            .run_command(SetMetaModuleCommand::new(self.node, meta_module))
    }

    // ---- copy and paste ----

    /// Capture this module for pasting elsewhere
    pub fn copy(&self) -> EditResult<CopyBuffer> {
        clipboard::copy_module(self.session, self.node)
    }

    /// Paste a copy buffer into or onto this module as one undo entry
    pub fn paste(&self, buffer: &CopyBuffer) -> EditResult<()> {
        clipboard::paste(self.session, self.node, buffer)
    }

    /// Paste from copy buffer JSON text
    pub fn paste_text(&self, text: &str) -> EditResult<()> {
        let buffer = CopyBuffer::from_json(text)?;
        self.paste(&buffer)
    }
}

impl std::fmt::Debug for StructureModel<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StructureModel")
            .field("node", &self.node)
            .field("name", &self.name())
            .finish()
    }
}
