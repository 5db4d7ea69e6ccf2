//! Database services: all query logic lives here, behind plain async
//! functions, so the HTTP handlers never touch SQL or query builders
//! directly. Every function is scoped to a user id; nothing in this
//! module can read or mutate another user's rows.

pub mod ingredient_service;
pub mod recipe_service;
pub mod tag_service;

pub use ingredient_service::*;
pub use recipe_service::*;
pub use tag_service::*;
