mod audit_events;
pub mod cursor;
mod documents;
mod employees;
mod legal_holds;
mod policies;
mod schedules;
mod tombstones;

pub use audit_events::*;
pub use cursor::*;
pub use documents::*;
pub use employees::*;
pub use legal_holds::*;
pub use policies::*;
pub use schedules::*;
pub use tombstones::*;

/// Result of a paginated list query with cursor metadata.
#[derive(Debug, Clone)]
pub struct ListResult<T> {
    pub items: Vec<T>,
    pub has_more: bool,
    pub cursors: PageCursors,
}

impl<T> ListResult<T> {
    pub fn new(items: Vec<T>, has_more: bool, cursors: PageCursors) -> Self {
        Self {
            items,
            has_more,
            cursors,
        }
    }
}
