//! Domain types for the synced todo list.
//!
//! A todo list is an ordered collection of items keyed by the remote store's
//! generated id. Items are added, edited and removed; nothing else.

use serde::{Deserialize, Serialize};

/// A single todo item
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TodoItem {
    /// Key generated by the remote store
    pub id: String,
    /// Freeform content
    pub text: String,
}

impl TodoItem {
    /// Creates a new todo item
    #[must_use]
    pub fn new(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
        }
    }
}

/// State of the todo list
///
/// Items keep the order in which they were first added. Ids are unique.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TodoState {
    todos: Vec<TodoItem>,
}

impl TodoState {
    /// Creates a new empty todo state
    #[must_use]
    pub const fn new() -> Self {
        Self { todos: Vec::new() }
    }

    /// All items, in insertion order
    #[must_use]
    pub fn items(&self) -> &[TodoItem] {
        &self.todos
    }

    /// Returns the number of todos
    #[must_use]
    pub fn len(&self) -> usize {
        self.todos.len()
    }

    /// Whether the list is empty
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.todos.is_empty()
    }

    /// Returns a todo by id
    #[must_use]
    pub fn get(&self, id: &str) -> Option<&TodoItem> {
        self.todos.iter().find(|t| t.id == id)
    }

    /// Checks if a todo exists
    #[must_use]
    pub fn contains(&self, id: &str) -> bool {
        self.get(id).is_some()
    }

    pub(crate) fn position(&self, id: &str) -> Option<usize> {
        self.todos.iter().position(|t| t.id == id)
    }

    pub(crate) fn items_mut(&mut self) -> &mut Vec<TodoItem> {
        &mut self.todos
    }
}

impl FromIterator<TodoItem> for TodoState {
    /// Later items with a repeated id replace earlier ones in place.
    fn from_iter<I: IntoIterator<Item = TodoItem>>(iter: I) -> Self {
        let mut state = Self::new();
        for item in iter {
            match state.position(&item.id) {
                Some(index) => state.todos[index] = item,
                None => state.todos.push(item),
            }
        }
        state
    }
}

/// Every change the reducer understands.
///
/// Serialized with an internal `type` tag: `{"type":"add-todo","id":..,"text":..}`.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum TodoAction {
    /// Insert an item (or replace the one with the same id)
    AddTodo {
        /// Remote key of the item
        id: String,
        /// Item text
        text: String,
    },

    /// Replace the text of an existing item
    UpdateTodo {
        /// Remote key of the item
        id: String,
        /// New text
        text: String,
    },

    /// Remove an item
    DeleteTodo {
        /// Remote key of the item
        id: String,
    },
}

impl TodoAction {
    /// Wire names of all action kinds.
    pub const KINDS: [&'static str; 3] = ["add-todo", "update-todo", "delete-todo"];

    /// Build an `AddTodo`
    #[must_use]
    pub fn add(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::AddTodo {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Build an `UpdateTodo`
    #[must_use]
    pub fn update(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self::UpdateTodo {
            id: id.into(),
            text: text.into(),
        }
    }

    /// Build a `DeleteTodo`
    #[must_use]
    pub fn delete(id: impl Into<String>) -> Self {
        Self::DeleteTodo { id: id.into() }
    }

    /// Id of the item this action targets
    #[must_use]
    pub fn id(&self) -> &str {
        match self {
            Self::AddTodo { id, .. } | Self::UpdateTodo { id, .. } | Self::DeleteTodo { id } => id,
        }
    }

    /// Wire name of this action kind
    #[must_use]
    pub const fn kind(&self) -> &'static str {
        match self {
            Self::AddTodo { .. } => Self::KINDS[0],
            Self::UpdateTodo { .. } => Self::KINDS[1],
            Self::DeleteTodo { .. } => Self::KINDS[2],
        }
    }
}
