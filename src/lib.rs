//! squema - typed schema value objects
//!
//! Declare a class once with an ordered field table, then build instances
//! whose values are coerced to the declared types, compared by their
//! rendered form and serialized back to JSON.

pub mod cli;
pub mod observability;
pub mod schema;
