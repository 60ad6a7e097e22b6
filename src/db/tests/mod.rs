//! Shared database repository test infrastructure.
//!
//! Each repository has a test module containing shared test functions that
//! take `&dyn XxxRepo` (via a small context struct), plus a SQLite-specific
//! harness wiring them up against an in-memory database with the real
//! migrations applied.

mod audit_events;
mod documents;
mod employees;
mod legal_holds;
