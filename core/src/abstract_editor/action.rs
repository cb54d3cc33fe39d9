//! Editable targets and reversible editor actions.
//!
//! - [`Editable`]: marker trait for editing targets
//! - [`EditAction`]: a reversible edit (Command pattern)
//! - [`EditActionError`] / [`EditActionResult`]: error handling for actions
//!
//! An action owns everything it needs to redo and undo itself: the target
//! identifiers, the previous value captured on first apply, the new value.

use std::any::Any;
use std::fmt;

/// Downcasting support for boxed actions.
///
/// Implemented for every `'static` type. [`EditAction::merge`] uses it to
/// recover the concrete type of the incoming action.
pub trait AsAny: 'static {
    /// Returns `self` as `&dyn Any`.
    fn as_any(&self) -> &dyn Any;
}

impl<T: 'static> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }
}

/// Marker trait for types that actions operate on.
pub trait Editable: 'static {}

/// Error type for action execution failures.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EditActionError {
    /// The object the action refers to no longer exists.
    TargetNotFound(String),
    /// The target rejected the edit in its current state.
    InvalidState(String),
    /// The history had nothing to undo.
    NothingToUndo,
    /// The history had nothing to redo.
    NothingToRedo,
    /// A custom error with a description.
    Custom(String),
}

impl fmt::Display for EditActionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::TargetNotFound(msg) => write!(f, "target not found: {msg}"),
            Self::InvalidState(msg) => write!(f, "invalid state: {msg}"),
            Self::NothingToUndo => write!(f, "nothing to undo"),
            Self::NothingToRedo => write!(f, "nothing to redo"),
            Self::Custom(msg) => write!(f, "{msg}"),
        }
    }
}

impl std::error::Error for EditActionError {}

/// Result type for action operations.
pub type EditActionResult<T = ()> = Result<T, EditActionError>;

/// A reversible editor action (Command pattern).
///
/// Stored as `Box<dyn EditAction<T>>` in an
/// [`EditActionHistory`](super::EditActionHistory), so the trait stays
/// dyn-compatible.
///
/// `undo` must bring the target back through the same code path forward
/// edits use. For a scene that means setting the old value through the
/// regular setter, so that derived state (inherited copies, override flags)
/// is recomputed instead of restored from a snapshot.
///
/// # Example
///
/// ```ignore
/// #[derive(Debug)]
/// struct Rename {
///     object: GameObjectId,
///     old: Option<String>,
///     new: String,
/// }
///
/// impl EditAction<World> for Rename {
///     fn apply(&mut self, world: &mut World) -> EditActionResult {
///         let previous = world.rename(self.object, &self.new)?;
///         self.old.get_or_insert(previous);
///         Ok(())
///     }
///
///     fn undo(&mut self, world: &mut World) -> EditActionResult {
///         if let Some(old) = &self.old {
///             world.rename(self.object, old)?;
///         }
///         Ok(())
///     }
///
///     fn description(&self) -> &str {
///         "Rename object"
///     }
/// }
/// ```
pub trait EditAction<T: Editable>: fmt::Debug + AsAny + Send {
    /// Applies the action (forward and redo direction).
    fn apply(&mut self, target: &mut T) -> EditActionResult;

    /// Reverses a previous [`apply`](Self::apply).
    fn undo(&mut self, target: &mut T) -> EditActionResult;

    /// A short, human-readable description for the edit menu.
    fn description(&self) -> &str;

    /// Tries to absorb `other` into `self`.
    ///
    /// Returns `None` when `other` was consumed, `Some(other)` to hand it
    /// back. Use [`AsAny::as_any`] to downcast:
    ///
    /// ```ignore
    /// fn merge(
    ///     &mut self,
    ///     other: Box<dyn EditAction<World>>,
    /// ) -> Option<Box<dyn EditAction<World>>> {
    ///     if let Some(other) = (*other).as_any().downcast_ref::<Self>() {
    ///         self.new = other.new.clone();
    ///         return None;
    ///     }
    ///     Some(other)
    /// }
    /// ```
    ///
    /// Default: no merging.
    fn merge(&mut self, other: Box<dyn EditAction<T>>) -> Option<Box<dyn EditAction<T>>> {
        Some(other)
    }

    /// Whether this action joins the step currently on top of the undo stack.
    ///
    /// A linked action is kept as its own action (it is not merged), but
    /// undo and redo treat it and everything it is linked to as one step.
    ///
    /// Default: `false`.
    fn links_to_previous(&self) -> bool {
        false
    }

    /// Whether this action is recorded in the undo/redo history.
    ///
    /// Default: `true`.
    fn is_recorded(&self) -> bool {
        true
    }

    /// Whether executing this (non-recorded) action stops the next recorded
    /// action from merging into the previous step.
    ///
    /// Default: `false`.
    fn breaks_merge(&self) -> bool {
        false
    }

    /// Whether this action changes document content.
    ///
    /// Recorded actions that only touch editor state (selection, expanded
    /// tree nodes) return `false` so they do not mark the document dirty.
    ///
    /// Default: `true`.
    fn modifies_content(&self) -> bool {
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Gauge {
        value: i32,
    }

    impl Editable for Gauge {}

    #[derive(Debug)]
    struct Bump {
        amount: i32,
    }

    impl EditAction<Gauge> for Bump {
        fn apply(&mut self, target: &mut Gauge) -> EditActionResult {
            target.value += self.amount;
            Ok(())
        }

        fn undo(&mut self, target: &mut Gauge) -> EditActionResult {
            target.value -= self.amount;
            Ok(())
        }

        fn description(&self) -> &str {
            "Bump"
        }
    }

    #[test]
    fn apply_then_undo_restores_target() {
        let mut gauge = Gauge { value: 0 };
        let mut action = Bump { amount: 5 };
        action.apply(&mut gauge).unwrap();
        assert_eq!(gauge.value, 5);
        action.undo(&mut gauge).unwrap();
        assert_eq!(gauge.value, 0);
    }

    #[test]
    fn defaults() {
        let action = Bump { amount: 1 };
        assert_eq!(action.description(), "Bump");
        assert!(action.is_recorded());
        assert!(!action.breaks_merge());
        assert!(action.modifies_content());
        assert!(!action.links_to_previous());
    }

    #[test]
    fn default_merge_hands_action_back() {
        let mut first = Bump { amount: 1 };
        let returned = first.merge(Box::new(Bump { amount: 2 }));
        assert!(returned.is_some());
        assert_eq!(first.amount, 1);
    }

    #[test]
    fn action_is_dyn_compatible() {
        let mut gauge = Gauge { value: 0 };
        let mut boxed: Box<dyn EditAction<Gauge>> = Box::new(Bump { amount: 3 });
        boxed.apply(&mut gauge).unwrap();
        assert_eq!(gauge.value, 3);
        assert!((*boxed).as_any().downcast_ref::<Bump>().is_some());
    }

    #[test]
    fn action_error_display() {
        assert_eq!(
            EditActionError::TargetNotFound("component 1:4".into()).to_string(),
            "target not found: component 1:4"
        );
        assert_eq!(
            EditActionError::InvalidState("type mismatch".into()).to_string(),
            "invalid state: type mismatch"
        );
        assert_eq!(EditActionError::NothingToUndo.to_string(), "nothing to undo");
        assert_eq!(EditActionError::NothingToRedo.to_string(), "nothing to redo");
        assert_eq!(EditActionError::Custom("boom".into()).to_string(), "boom");
    }
}
