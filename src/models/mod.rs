mod audit_event;
mod document;
mod employee;
mod legal_hold;
mod policy;
mod schedule;
mod tombstone;

pub use audit_event::*;
pub use document::*;
pub use employee::*;
pub use legal_hold::*;
pub use policy::*;
pub use schedule::*;
pub use tombstone::*;
