//! Abstract editor framework for reversible editing operations.
//!
//! Nothing in here depends on a particular editing target. Higher-level
//! crates implement [`EditAction`] for their own document type (the scene
//! crate does it for its `World`) and drive it through an
//! [`EditActionHistory`].
//!
//! - [`Editable`]: marker trait for types that can be edited
//! - [`EditAction`]: an edit operation (Command pattern)
//! - [`EditActionHistory`]: undo/redo stack with merging, linked groups
//!   and save-point tracking
//! - [`ActionQueue`]: thread-safe queue for actions produced off the main thread
//!
//! # Steps, merging and linking
//!
//! The history is a stack of *steps*. A step normally holds one action, but
//! two mechanisms can put several edits into a single step:
//!
//! - **Merging**: the top action absorbs the incoming one via
//!   [`EditAction::merge`]. Used for drags, where only the baseline and the
//!   final value are worth keeping.
//! - **Linking**: an action returning `true` from
//!   [`EditAction::links_to_previous`] is appended to the top step as a
//!   separate action. Undo/redo then treats the whole step atomically.
//!
//! # Recorded vs non-recorded actions
//!
//! Actions returning `false` from [`EditAction::is_recorded`] are applied
//! but never enter the history. They can still break the merge chain via
//! [`EditAction::breaks_merge`]. Recorded actions returning `false` from
//! [`EditAction::modifies_content`] are undoable but do not count towards
//! [`EditActionHistory::has_unsaved_changes`].

mod action;
mod action_queue;
mod history;

pub use action::{AsAny, EditAction, EditActionError, EditActionResult, Editable};
pub use action_queue::ActionQueue;
pub use history::{DEFAULT_MAX_UNDO, EditActionHistory};
