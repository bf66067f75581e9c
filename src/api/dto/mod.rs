//! Data Transfer Objects for REST request/response serialization.
//!
//! DTOs carry plain UUIDs and stringly-typed enum names on the wire;
//! handlers translate to and from the typed domain vocabulary.

pub mod contact_dto;
pub mod leaderboard_dto;
pub mod task_dto;
pub mod user_dto;

pub use contact_dto::*;
pub use leaderboard_dto::*;
pub use task_dto::*;
pub use user_dto::*;
