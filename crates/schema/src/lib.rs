//! Declarative request-body schemas for endpoints.
//!
//! Implements the [`pipeline::Schema`] trait with an [`ObjectSchema`]: an
//! ordered list of named [`Field`]s, each with a kind and optional
//! constraints. Validation never stops at the first problem; every violation
//! is reported with its dot-joined path and a message that names the
//! offending value by label:
//!
//! ```text
//! { "name": 3, "tags": ["a", 7] }
//!   name    →  "name" must be a string
//!   tags.1  →  "tags[1]" must be a string
//!   email   →  "email" is required
//! ```
//!
//! ## Architectural Layer
//!
//! **Adapter.** The pipeline only sees [`pipeline::Schema`]; any other
//! validator can be plugged in the same way.

mod field;
mod object;

pub use field::{Field, Kind};
pub use object::ObjectSchema;
