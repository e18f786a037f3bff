//! Core types and traits for the RBAC authorization state store.
//!
//! Records serialize with the same field names the admin UI uses (`roleId`,
//! lowercase permissions and statuses) so snapshots can be handed to it as JSON.

mod config;
mod model;
mod mutation;
mod traits;

pub use config::*;
pub use model::*;
pub use mutation::*;
pub use traits::*;
