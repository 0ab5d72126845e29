//! Reducer logic for the todo list.
//!
//! The transition itself is the pure function [`reduce`]. [`TodoReducer`]
//! adapts it to the runtime's [`Reducer`] trait. Remote I/O happens in the
//! domain operations before anything is dispatched.

use crate::environment::TodoEnvironment;
use crate::types::{TodoAction, TodoItem, TodoState};
use synced_todo_core::reducer::Reducer;

/// Compute the state that follows `action`.
///
/// Never mutates `state`. Actions targeting an unknown id leave the list
/// unchanged; adding an id that is already present replaces that item in
/// place.
#[must_use]
pub fn reduce(state: &TodoState, action: &TodoAction) -> TodoState {
    let mut next = state.clone();

    match action {
        TodoAction::AddTodo { id, text } => {
            let item = TodoItem::new(id.clone(), text.clone());
            match next.position(id) {
                Some(index) => next.items_mut()[index] = item,
                None => next.items_mut().push(item),
            }
        },
        TodoAction::UpdateTodo { id, text } => {
            if let Some(index) = next.position(id) {
                next.items_mut()[index].text.clone_from(text);
            }
        },
        TodoAction::DeleteTodo { id } => {
            next.items_mut().retain(|item| &item.id != id);
        },
    }

    next
}

/// Reducer for the todo list
#[derive(Clone, Copy, Debug, Default)]
pub struct TodoReducer;

impl TodoReducer {
    /// Creates a new `TodoReducer`
    #[must_use]
    pub const fn new() -> Self {
        Self
    }
}

impl Reducer for TodoReducer {
    type State = TodoState;
    type Action = TodoAction;
    type Environment = TodoEnvironment;

    fn reduce(
        &self,
        state: &Self::State,
        action: &Self::Action,
        _env: &Self::Environment,
    ) -> Self::State {
        tracing::trace!(kind = action.kind(), id = action.id(), "Reducing action");
        reduce(state, action)
    }
}
