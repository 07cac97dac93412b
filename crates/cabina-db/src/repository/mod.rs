//! # Repository Layer
//!
//! One repository per aggregate, each owning its SQL.
//!
//! ## Conventions
//! - Repositories hold a pool clone and are cheap to create per call
//! - Guarded state transitions are conditional UPDATEs whose
//!   `rows_affected` is checked - never read-then-write
//! - Every effect that touches more than one row runs inside a single
//!   transaction owned by the repository method
//! - IDs are UUID v4 strings generated here, timestamps are UTC now

pub mod client;
pub mod consumption;
pub mod debt;
pub mod movement;
pub mod product;
pub mod report;
pub mod seat;
pub mod session;

use uuid::Uuid;

/// Generates a new row id.
pub(crate) fn new_id() -> String {
    Uuid::new_v4().to_string()
}
