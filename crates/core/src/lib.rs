//! Core domain types, errors, and constants for `fleetkey`.
//!
//! This crate establishes the foundational data structures and error handling
//! mechanisms used throughout the workspace.
//!
//! ## Key Components
//!
//! - **`errors`**: Defines the primary `Error` enum and `Result` type alias,
//!   centralizing all possible failure modes for predictable error handling.
//! - **`types`**: Domain-specific newtype wrappers like `HostAddress` and
//!   `PublicKeyLine` that enforce invariants at the type level.
//! - **`constants`**: Shared static constants such as environment variable
//!   names and default ports/timeouts.

pub mod constants;
pub mod errors;
pub mod types;

pub use self::{
    constants::*,
    errors::{Error, Result},
    types::{HostAddress, HostRunOutcome, Interact, PublicKeyLine, Secret},
};
