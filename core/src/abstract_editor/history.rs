//! Undo/redo action history.
//!
//! [`EditActionHistory`] keeps a linear stack of *steps*. Each step holds one
//! or more [`EditAction`]s that are undone and redone together. Pushing a new
//! step after undoing discards the redo branch.

use std::collections::VecDeque;
use std::fmt;

use super::action::{EditAction, EditActionError, EditActionResult, Editable};

/// Default maximum number of undo steps.
pub const DEFAULT_MAX_UNDO: usize = 100;

/// One user-visible undo step.
struct Step<T: Editable> {
    actions: Vec<Box<dyn EditAction<T>>>,
    modifies_content: bool,
}

impl<T: Editable> Step<T> {
    fn new(action: Box<dyn EditAction<T>>) -> Self {
        Self {
            modifies_content: action.modifies_content(),
            actions: vec![action],
        }
    }

    fn description(&self) -> &str {
        self.actions.first().map_or("", |a| a.description())
    }

    /// Undoes every action in reverse order.
    ///
    /// If one fails, the actions already undone are applied again so the
    /// target is back where the step left it.
    fn undo(&mut self, target: &mut T) -> EditActionResult {
        for i in (0..self.actions.len()).rev() {
            if let Err(err) = self.actions[i].undo(target) {
                for action in &mut self.actions[i + 1..] {
                    if let Err(rollback) = action.apply(target) {
                        log::warn!("failed to reapply '{}' after undo error: {rollback}", action.description());
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }

    fn redo(&mut self, target: &mut T) -> EditActionResult {
        for i in 0..self.actions.len() {
            if let Err(err) = self.actions[i].apply(target) {
                for action in self.actions[..i].iter_mut().rev() {
                    if let Err(rollback) = action.undo(target) {
                        log::warn!("failed to revert '{}' after redo error: {rollback}", action.description());
                    }
                }
                return Err(err);
            }
        }
        Ok(())
    }
}

/// Manages an undo/redo stack of editor actions.
///
/// The undo stack is bounded by `max_undo` steps; the oldest step is dropped
/// when it overflows. Actions that [link](EditAction::links_to_previous) to
/// their predecessor join the top step instead of opening a new one.
///
/// # Example
///
/// ```ignore
/// let mut history = EditActionHistory::new(DEFAULT_MAX_UNDO);
///
/// history.execute(Box::new(SetVariable::new(light, "Intensity", Value::Float(2.0))), &mut world)?;
/// history.execute(Box::new(SetVariable::new(light, "Range", Value::Float(8.0)).linked()), &mut world)?;
///
/// // Both edits revert together.
/// history.undo(&mut world)?;
/// ```
pub struct EditActionHistory<T: Editable> {
    undo_stack: VecDeque<Step<T>>,
    redo_stack: Vec<Step<T>>,
    max_undo: usize,
    merge_broken: bool,
    /// Distance, in content steps, from the last saved state.
    ///
    /// - `Some(0)`: the current state matches the last save.
    /// - `Some(n)` where `n > 0`: `n` undos needed to reach the saved state.
    /// - `Some(n)` where `n < 0`: `|n|` redos needed to reach the saved state.
    /// - `None`: the save point is unreachable (dropped by capacity,
    ///   discarded with the redo branch, or overwritten by a merge).
    save_distance: Option<i64>,
}

impl<T: Editable> EditActionHistory<T> {
    /// Creates an empty history holding at most `max_undo` steps.
    pub fn new(max_undo: usize) -> Self {
        Self {
            undo_stack: VecDeque::new(),
            redo_stack: Vec::new(),
            max_undo,
            merge_broken: false,
            save_distance: Some(0),
        }
    }

    /// Applies an action and records it (the "Do" operation).
    ///
    /// Recorded actions clear the redo stack, then either join the top step
    /// (linked actions), merge into its last action, or open a new step.
    /// Non-recorded actions are applied and forgotten.
    ///
    /// A failing action is not recorded.
    pub fn execute(
        &mut self,
        mut action: Box<dyn EditAction<T>>,
        target: &mut T,
    ) -> EditActionResult {
        action.apply(target)?;

        if !action.is_recorded() {
            if action.breaks_merge() {
                self.merge_broken = true;
            }
            return Ok(());
        }

        let is_content = action.modifies_content();

        self.redo_stack.clear();
        if is_content
            && let Some(d) = self.save_distance
            && d < 0
        {
            self.save_distance = None;
        }

        if action.links_to_previous()
            && let Some(step) = self.undo_stack.back_mut()
        {
            log::trace!("linking '{}' to '{}'", action.description(), step.description());
            if is_content {
                if step.modifies_content {
                    if self.save_distance == Some(0) {
                        self.save_distance = None;
                    }
                } else if let Some(d) = &mut self.save_distance {
                    *d += 1;
                }
                step.modifies_content = true;
            }
            step.actions.push(action);
            self.merge_broken = false;
            return Ok(());
        }

        if !self.merge_broken
            && let Some(last) = self
                .undo_stack
                .back_mut()
                .and_then(|step| step.actions.last_mut())
        {
            match last.merge(action) {
                None => {
                    if is_content && self.save_distance == Some(0) {
                        self.save_distance = None;
                    }
                    return Ok(());
                }
                Some(returned) => action = returned,
            }
        }
        self.merge_broken = false;

        if is_content && let Some(d) = &mut self.save_distance {
            *d += 1;
        }

        self.undo_stack.push_back(Step::new(action));
        self.enforce_capacity();
        Ok(())
    }

    /// Undoes the most recent step.
    ///
    /// Actions inside the step are undone in reverse order. Returns
    /// [`EditActionError::NothingToUndo`] on an empty stack.
    pub fn undo(&mut self, target: &mut T) -> EditActionResult {
        let mut step = self
            .undo_stack
            .pop_back()
            .ok_or(EditActionError::NothingToUndo)?;
        if let Err(err) = step.undo(target) {
            self.undo_stack.push_back(step);
            return Err(err);
        }
        let is_content = step.modifies_content;
        self.redo_stack.push(step);
        if is_content && let Some(d) = &mut self.save_distance {
            *d -= 1;
        }
        Ok(())
    }

    /// Redoes the most recently undone step.
    ///
    /// Returns [`EditActionError::NothingToRedo`] on an empty stack.
    pub fn redo(&mut self, target: &mut T) -> EditActionResult {
        let mut step = self
            .redo_stack
            .pop()
            .ok_or(EditActionError::NothingToRedo)?;
        if let Err(err) = step.redo(target) {
            self.redo_stack.push(step);
            return Err(err);
        }
        let is_content = step.modifies_content;
        self.undo_stack.push_back(step);
        if is_content && let Some(d) = &mut self.save_distance {
            *d += 1;
        }
        self.enforce_capacity();
        Ok(())
    }

    /// Undoes up to `count` steps, returning how many were undone.
    ///
    /// Stops early when the stack runs out. An action failure aborts the
    /// sequence and is returned.
    pub fn undo_many(&mut self, count: usize, target: &mut T) -> EditActionResult<usize> {
        let mut undone = 0;
        while undone < count && self.can_undo() {
            self.undo(target)?;
            undone += 1;
        }
        Ok(undone)
    }

    /// Redoes up to `count` steps, returning how many were redone.
    pub fn redo_many(&mut self, count: usize, target: &mut T) -> EditActionResult<usize> {
        let mut redone = 0;
        while redone < count && self.can_redo() {
            self.redo(target)?;
            redone += 1;
        }
        Ok(redone)
    }

    fn enforce_capacity(&mut self) {
        if self.undo_stack.len() > self.max_undo {
            self.undo_stack.pop_front();
            if let Some(d) = self.save_distance
                && d > self.undo_stack.len() as i64
            {
                self.save_distance = None;
            }
        }
    }

    /// Returns `true` if there are steps that can be undone.
    pub fn can_undo(&self) -> bool {
        !self.undo_stack.is_empty()
    }

    /// Returns `true` if there are steps that can be redone.
    pub fn can_redo(&self) -> bool {
        !self.redo_stack.is_empty()
    }

    /// Undo step descriptions, most recent first.
    ///
    /// A step is described by its first action.
    pub fn undo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.undo_stack.iter().rev().map(|s| s.description())
    }

    /// Redo step descriptions, most recent first.
    pub fn redo_descriptions(&self) -> impl Iterator<Item = &str> {
        self.redo_stack.iter().rev().map(|s| s.description())
    }

    /// Number of steps in the undo stack.
    pub fn undo_count(&self) -> usize {
        self.undo_stack.len()
    }

    /// Number of steps in the redo stack.
    pub fn redo_count(&self) -> usize {
        self.redo_stack.len()
    }

    /// Returns the maximum undo depth.
    pub fn max_undo(&self) -> usize {
        self.max_undo
    }

    /// Records the current state as the saved state.
    pub fn mark_saved(&mut self) {
        self.save_distance = Some(0);
    }

    /// Returns `true` if the current state differs from the last saved state
    /// or the saved state can no longer be reached.
    pub fn has_unsaved_changes(&self) -> bool {
        self.save_distance != Some(0)
    }

    /// Clears both stacks.
    ///
    /// Being at the save point survives a clear; any other save point is lost.
    pub fn clear(&mut self) {
        self.undo_stack.clear();
        self.redo_stack.clear();
        self.merge_broken = false;
        if self.save_distance != Some(0) {
            self.save_distance = None;
        }
    }
}

impl<T: Editable> Default for EditActionHistory<T> {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_UNDO)
    }
}

impl<T: Editable> fmt::Debug for EditActionHistory<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EditActionHistory")
            .field("undo_count", &self.undo_stack.len())
            .field("redo_count", &self.redo_stack.len())
            .field("max_undo", &self.max_undo)
            .field("merge_broken", &self.merge_broken)
            .field("save_distance", &self.save_distance)
            .finish()
    }
}
