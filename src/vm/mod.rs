//! View models and request DTOs, decoupled from the entity structs.
//! Projection is explicit `From<Entity>` impls; request validation uses
//! `validator` derive rules surfaced as field/message pairs.

pub mod contents;
pub mod systems;

pub use contents::*;
pub use systems::*;
