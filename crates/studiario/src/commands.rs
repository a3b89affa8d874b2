//! Command table mapping user actions onto the task store
//!
//! Every user-facing mutation goes through [`apply`]: one command enum
//! keyed by action type, one outcome naming what happened. Mutations are
//! persisted by the store before `apply` returns.

use crate::store::{StoreError, TaskFields, TaskStore};
use crate::types::Task;

/// A user action against the task collection
#[derive(Debug, Clone)]
pub enum Command {
    Create(TaskFields),
    Edit { id: i64, fields: TaskFields },
    Toggle { id: i64 },
    Delete { id: i64 },
}

/// What applying a command did
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Created(Task),
    Replaced(Task),
    Toggled { id: i64, completed: bool },
    Deleted { id: i64 },
    /// The target id is absent; the collection was left untouched
    NotFound { id: i64 },
}

/// Apply a command to the store. `now_ms` seeds the id of any task the
/// command creates.
pub fn apply(store: &mut TaskStore, command: Command, now_ms: i64) -> Result<Outcome, StoreError> {
    match command {
        Command::Create(fields) => {
            let task = store.create(fields, now_ms)?;
            Ok(Outcome::Created(task))
        }
        Command::Edit { id, fields } => match store.replace(id, fields, now_ms)? {
            Some(task) => Ok(Outcome::Replaced(task)),
            None => Ok(Outcome::NotFound { id }),
        },
        Command::Toggle { id } => match store.toggle(id)? {
            Some(completed) => Ok(Outcome::Toggled { id, completed }),
            None => Ok(Outcome::NotFound { id }),
        },
        Command::Delete { id } => {
            if store.delete(id)? {
                Ok(Outcome::Deleted { id })
            } else {
                Ok(Outcome::NotFound { id })
            }
        }
    }
}
