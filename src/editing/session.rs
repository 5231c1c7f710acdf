// EditingSession - runs commands against one model system and keeps history
//
// Every mutation goes through run_command, undo, redo or run_grouped. Those
// take one re-entrant lock, so a grouped edit can call back into the session
// from the same thread while other threads wait.

use crate::command::group::CommandGroup;
use crate::command::{EditCommand, EditError, EditResult, HistoryStack, UndoableCommand};
use crate::config::SessionConfig;
use crate::editing::linked::{LinkedParameterModel, LinkedParametersModel};
use crate::editing::parameter::ParameterModel;
use crate::editing::run::{ActiveRun, RunTracker};
use crate::editing::structure::StructureModel;
use crate::messaging::{
    ChangeConsumer, ChangeEvent, ChangeProducer, Notification, create_change_channel,
};
use crate::model::{GroupId, LinkedParameterRegistry, ModelSystem, NodeId, ParameterId};
use crate::project::store::{ModelSystemStore, RonFileStore};
use crate::project::types::ModelSystemDocument;
use parking_lot::ReentrantMutex;
use ringbuf::traits::Producer;
use std::cell::RefCell;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use tracing::{debug, error, info, warn};

/// Commands buffered by `run_grouped`
struct GroupBuffer {
    /// Nesting level of run_grouped calls sharing this buffer
    depth: usize,
    commands: Vec<EditCommand>,
    events: Vec<ChangeEvent>,
    was_changed: bool,
}

struct SessionState {
    model: ModelSystem,
    grouping: Option<GroupBuffer>,
    has_changed: bool,
    store: Option<Box<dyn ModelSystemStore>>,
}

/// Closes the grouping context if `work` unwinds out of `run_grouped`
struct GroupingGuard<'a> {
    state: &'a RefCell<SessionState>,
    label: &'a str,
    armed: bool,
}

impl Drop for GroupingGuard<'_> {
    fn drop(&mut self) {
        if !self.armed {
            return;
        }
        let Ok(mut state) = self.state.try_borrow_mut() else {
            return;
        };
        let outermost = match state.grouping.as_mut() {
            Some(buffer) if buffer.depth > 1 => {
                buffer.depth -= 1;
                false
            }
            Some(_) => true,
            None => false,
        };
        if outermost && let Some(buffer) = state.grouping.take() {
            roll_back(&mut state, buffer, self.label);
            warn!("Grouped edit '{}' panicked and was rolled back", self.label);
        }
    }
}

/// Undo buffered commands newest first and restore the dirty flag
fn roll_back(state: &mut SessionState, buffer: GroupBuffer, label: &str) {
    let mut commands = buffer.commands;
    for command in commands.iter_mut().rev().filter(|c| c.can_undo()) {
        if let Err(undo_error) = command.undo(&mut state.model) {
            error!(
                "Unable to roll back '{}' in group '{}': {}",
                command.description(),
                label,
                undo_error
            );
        }
    }
    state.model.take_pending();
    state.has_changed = buffer.was_changed;
}

/// Editing session for one model system
///
/// Owns the model, the undo and redo stacks, the run gate and the change
/// notification channel. Handles returned by [`structure`](Self::structure),
/// [`parameter`](Self::parameter) and [`linked_parameters`](Self::linked_parameters)
/// borrow the session and submit their edits here.
pub struct EditingSession {
    state: ReentrantMutex<RefCell<SessionState>>,
    undo_stack: HistoryStack<EditCommand>,
    redo_stack: HistoryStack<EditCommand>,
    linked: Arc<LinkedParameterRegistry>,
    runs: Arc<RunTracker>,
    changes: Mutex<ChangeProducer>,
    change_consumer: Mutex<Option<ChangeConsumer>>,
    subscribed: AtomicBool,
    next_sequence: AtomicU64,
    config: SessionConfig,
}

impl EditingSession {
    /// Create a session with the default configuration
    pub fn new(model: ModelSystem) -> Self {
        Self::build(
            model,
            SessionConfig::default(),
            HistoryStack::default(),
            HistoryStack::default(),
        )
    }

    /// Create a session from a configuration
    ///
    /// # Errors
    /// Returns [`EditError::Validation`] when a capacity is zero.
    pub fn with_config(model: ModelSystem, config: SessionConfig) -> EditResult<Self> {
        config
            .validate()
            .map_err(|e| EditError::Validation(e.to_string()))?;
        let undo_stack = HistoryStack::new(config.history_capacity)
            .map_err(|e| EditError::Validation(e.to_string()))?;
        let redo_stack = HistoryStack::new(config.history_capacity)
            .map_err(|e| EditError::Validation(e.to_string()))?;
        Ok(Self::build(model, config, undo_stack, redo_stack))
    }

    fn build(
        model: ModelSystem,
        config: SessionConfig,
        undo_stack: HistoryStack<EditCommand>,
        redo_stack: HistoryStack<EditCommand>,
    ) -> Self {
        let (producer, consumer) = create_change_channel(config.notification_capacity);
        let store = config
            .store_path
            .as_ref()
            .map(|path| Box::new(RonFileStore::new(path.clone())) as Box<dyn ModelSystemStore>);
        let linked = Arc::clone(model.linked_parameters());
        info!("Opened editing session for '{}'", model.name());

        Self {
            state: ReentrantMutex::new(RefCell::new(SessionState {
                model,
                grouping: None,
                has_changed: false,
                store,
            })),
            undo_stack,
            redo_stack,
            linked,
            runs: Arc::new(RunTracker::new()),
            changes: Mutex::new(producer),
            change_consumer: Mutex::new(Some(consumer)),
            subscribed: AtomicBool::new(false),
            next_sequence: AtomicU64::new(0),
            config,
        }
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Replace the store `save` writes to
    pub fn set_store(&self, store: impl ModelSystemStore + 'static) {
        let guard = self.state.lock();
        guard.borrow_mut().store = Some(Box::new(store));
    }

    // ---- commands ----

    /// Execute `command` and record it in the undo history
    ///
    /// Inside [`run_grouped`](Self::run_grouped) the command is buffered
    /// instead and committed with the rest of the group.
    ///
    /// # Errors
    /// Returns [`EditError::ModelSystemRunning`] while a run is active, or
    /// whatever the command reports; a failed command changes nothing.
    pub fn run_command(&self, command: impl Into<EditCommand>) -> EditResult<()> {
        let mut command = command.into();
        let guard = self.state.lock();
        self.ensure_not_running()?;

        let mut state = guard.borrow_mut();
        if let Err(e) = command.execute(&mut state.model) {
            state.model.take_pending();
            warn!("Refused edit '{}': {}", command.description(), e);
            return Err(e);
        }
        debug!("Executed {} '{}'", command.kind(), command.description());

        let events = state.model.take_pending();
        state.has_changed = true;
        if let Some(buffer) = state.grouping.as_mut() {
            buffer.commands.push(command);
            buffer.events.extend(events);
            return Ok(());
        }
        drop(state);

        let description = command.description();
        if command.can_undo() {
            self.undo_stack.push(command);
        }
        self.redo_stack.clear();
        self.emit_all(events);
        self.emit(ChangeEvent::CommandExecuted { description });
        Ok(())
    }

    /// Undo the most recent command, returning its description
    ///
    /// # Errors
    /// * [`EditError::NothingToUndo`] when the history is empty
    /// * [`EditError::GroupInProgress`] inside `run_grouped`
    /// * the command's own error; the command is then discarded
    pub fn undo(&self) -> EditResult<String> {
        let guard = self.state.lock();
        self.ensure_not_running()?;

        let mut state = guard.borrow_mut();
        if state.grouping.is_some() {
            return Err(EditError::GroupInProgress);
        }
        let mut command = self.undo_stack.try_pop().ok_or(EditError::NothingToUndo)?;
        let description = command.description();
        if let Err(e) = command.undo(&mut state.model) {
            state.model.take_pending();
            error!("Undo of '{}' failed, discarding it: {}", description, e);
            return Err(e);
        }
        debug!("Undid {} '{}'", command.kind(), description);

        let events = state.model.take_pending();
        state.has_changed = true;
        drop(state);

        self.redo_stack.push(command);
        self.emit_all(events);
        self.emit(ChangeEvent::Undone {
            description: description.clone(),
        });
        Ok(description)
    }

    /// Redo the most recently undone command, returning its description
    pub fn redo(&self) -> EditResult<String> {
        let guard = self.state.lock();
        self.ensure_not_running()?;

        let mut state = guard.borrow_mut();
        if state.grouping.is_some() {
            return Err(EditError::GroupInProgress);
        }
        let mut command = self.redo_stack.try_pop().ok_or(EditError::NothingToRedo)?;
        let description = command.description();
        if let Err(e) = command.redo(&mut state.model) {
            state.model.take_pending();
            error!("Redo of '{}' failed, discarding it: {}", description, e);
            return Err(e);
        }
        debug!("Redid {} '{}'", command.kind(), description);

        let events = state.model.take_pending();
        state.has_changed = true;
        drop(state);

        self.undo_stack.push(command);
        self.emit_all(events);
        self.emit(ChangeEvent::Redone {
            description: description.clone(),
        });
        Ok(description)
    }

    /// Run several commands as one undo entry named `label`
    ///
    /// `work` calls back into the session; every command it runs is buffered.
    /// When `work` fails, the buffered commands are undone in reverse order,
    /// nothing is recorded and the error is returned. A `run_grouped` inside
    /// `work` joins the outer group.
    pub fn run_grouped<R>(
        &self,
        label: &str,
        work: impl FnOnce(&Self) -> EditResult<R>,
    ) -> EditResult<R> {
        let guard = self.state.lock();
        self.ensure_not_running()?;
        {
            let mut state = guard.borrow_mut();
            let was_changed = state.has_changed;
            match state.grouping.as_mut() {
                Some(buffer) => buffer.depth += 1,
                None => {
                    state.grouping = Some(GroupBuffer {
                        depth: 1,
                        commands: Vec::new(),
                        events: Vec::new(),
                        was_changed,
                    })
                }
            }
        }

        let mut pending = GroupingGuard {
            state: &*guard,
            label,
            armed: true,
        };
        let result = work(self);
        pending.armed = false;

        let mut state = guard.borrow_mut();
        let Some(buffer) = state.grouping.as_mut() else {
            return result;
        };
        if buffer.depth > 1 {
            buffer.depth -= 1;
            return result;
        }
        let Some(buffer) = state.grouping.take() else {
            return result;
        };

        match result {
            Ok(value) => {
                if buffer.commands.is_empty() {
                    return Ok(value);
                }
                drop(state);
                let group = CommandGroup::new(label, buffer.commands);
                debug!("Committed group '{}' of {} commands", label, group.len());
                self.undo_stack.push(group.into());
                self.redo_stack.clear();
                self.emit_all(buffer.events);
                self.emit(ChangeEvent::CommandExecuted {
                    description: label.to_string(),
                });
                Ok(value)
            }
            Err(e) => {
                roll_back(&mut state, buffer, label);
                warn!("Grouped edit '{}' failed and was rolled back: {}", label, e);
                Err(e)
            }
        }
    }

    // ---- history ----

    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo entry descriptions, most recent first
    pub fn undo_descriptions(&self) -> Vec<String> {
        self.undo_stack.map_newest_first(|c| c.description())
    }

    /// Redo entry descriptions, most recent first
    pub fn redo_descriptions(&self) -> Vec<String> {
        self.redo_stack.map_newest_first(|c| c.description())
    }

    /// Drop both history stacks
    pub fn reset_history(&self) {
        let _guard = self.state.lock();
        self.undo_stack.clear();
        self.redo_stack.clear();
    }

    // ---- lifecycle ----

    /// Whether the model has changed since it was opened or last saved
    pub fn has_changed(&self) -> bool {
        let guard = self.state.lock();
        let changed = guard.borrow().has_changed;
        changed
    }

    /// Snapshot the model and write it to the configured store
    ///
    /// # Errors
    /// * [`EditError::GroupInProgress`] inside `run_grouped`
    /// * [`EditError::Persistence`] when no store is set or the write fails
    pub fn save(&self) -> EditResult<()> {
        let guard = self.state.lock();
        let mut state = guard.borrow_mut();
        if state.grouping.is_some() {
            return Err(EditError::GroupInProgress);
        }
        let document = state.model.document();
        let store = state
            .store
            .as_mut()
            .ok_or_else(|| EditError::Persistence("No store has been set".to_string()))?;
        store.save(&document)?;
        state.has_changed = false;
        drop(state);

        info!("Saved model system '{}'", document.name);
        self.emit(ChangeEvent::Saved);
        Ok(())
    }

    /// Release the history if the model has no unsaved changes
    ///
    /// # Errors
    /// Returns [`EditError::UnsavedChanges`] when the model is dirty.
    pub fn close(&self) -> EditResult<()> {
        let guard = self.state.lock();
        if guard.borrow().has_changed {
            return Err(EditError::UnsavedChanges);
        }
        self.force_close();
        Ok(())
    }

    /// Release the history, discarding unsaved changes
    pub fn force_close(&self) {
        let guard = self.state.lock();
        self.undo_stack.clear();
        self.redo_stack.clear();
        guard.borrow_mut().has_changed = false;
        info!("Closed editing session");
    }

    /// Give up the session and keep the model
    pub fn into_model(self) -> ModelSystem {
        self.state.into_inner().into_inner().model
    }

    // ---- runs ----

    /// Lock editing until the returned guard is dropped
    pub fn start_run(&self, name: &str) -> ActiveRun {
        let _guard = self.state.lock();
        self.runs.start(name)
    }

    pub fn is_running(&self) -> bool {
        self.runs.is_running()
    }

    pub fn run_tracker(&self) -> &Arc<RunTracker> {
        &self.runs
    }

    // ---- reading ----

    /// Read the model under the session lock
    ///
    /// `f` must not call back into the session's editing methods.
    pub fn with_model<R>(&self, f: impl FnOnce(&ModelSystem) -> R) -> R {
        let guard = self.state.lock();
        let state = guard.borrow();
        f(&state.model)
    }

    pub fn document(&self) -> ModelSystemDocument {
        self.with_model(|model| model.document())
    }

    pub fn root(&self) -> NodeId {
        self.with_model(|model| model.root())
    }

    /// Registry shared with the model; reads never take the session lock
    pub fn linked_registry(&self) -> &Arc<LinkedParameterRegistry> {
        &self.linked
    }

    /// Run `f` while holding the session lock
    pub(crate) fn locked<R>(&self, f: impl FnOnce() -> R) -> R {
        let _guard = self.state.lock();
        f()
    }

    // ---- handles ----

    pub fn structure(&self, node: NodeId) -> StructureModel<'_> {
        StructureModel::new(self, node)
    }

    pub fn root_structure(&self) -> StructureModel<'_> {
        StructureModel::new(self, self.root())
    }

    pub fn parameter(&self, parameter: ParameterId) -> ParameterModel<'_> {
        ParameterModel::new(self, parameter)
    }

    /// Parameters flagged quick across the attached tree, in pre-order
    pub fn quick_parameters(&self) -> Vec<ParameterModel<'_>> {
        self.with_model(|model| model.quick_parameters())
            .into_iter()
            .map(|parameter| ParameterModel::new(self, parameter))
            .collect()
    }

    pub fn linked_parameters(&self) -> LinkedParametersModel<'_> {
        LinkedParametersModel::new(self)
    }

    pub fn linked_parameter(&self, group: GroupId) -> LinkedParameterModel<'_> {
        LinkedParameterModel::new(self, group)
    }

    // ---- notifications ----

    /// Take the receiving end of the change channel; only the first call
    /// gets it
    pub fn take_change_consumer(&self) -> Option<ChangeConsumer> {
        let consumer = self
            .change_consumer
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if consumer.is_some() {
            self.subscribed.store(true, Ordering::Release);
        }
        consumer
    }

    pub(crate) fn ensure_not_running(&self) -> EditResult<()> {
        if self.runs.is_running() {
            warn!("Refused edit while the model system is running");
            return Err(EditError::ModelSystemRunning);
        }
        Ok(())
    }

    fn emit_all(&self, events: Vec<ChangeEvent>) {
        for event in events {
            self.emit(event);
        }
    }

    fn emit(&self, event: ChangeEvent) {
        if !self.subscribed.load(Ordering::Acquire) {
            return;
        }
        let sequence = self.next_sequence.fetch_add(1, Ordering::Relaxed);
        let mut producer = self.changes.lock().unwrap_or_else(PoisonError::into_inner);
        if producer.try_push(Notification::new(sequence, event)).is_err() {
            warn!("Change notification channel is full, dropping event {}", sequence);
        }
    }
}

impl std::fmt::Debug for EditingSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EditingSession")
            .field("undo", &self.undo_stack.len())
            .field("redo", &self.redo_stack.len())
            .field("running", &self.is_running())
            .finish()
    }
}
