//! End-to-end scenario tests exercising the full service stack against an
//! in-memory SQLite database.

mod helpers;
