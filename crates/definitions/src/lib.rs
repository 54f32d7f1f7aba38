//! Declarative schema of every configurable block: which fields exist, where they live on
//! the device, which values they accept and when they are shown.

mod block;
pub mod blocks;
mod error;
mod field;
mod registry;
mod visibility;

pub use block::{BlockDefinition, Navigation};
pub use error::{DefinitionError, ValueError};
pub use field::{FieldDefinition, SelectOption};
pub use registry::BlockRegistry;
pub use visibility::{MissingField, ShowIf};

#[cfg(test)]
#[path = "tests/registry_tests.rs"]
mod registry_tests;

#[cfg(test)]
#[path = "tests/field_tests.rs"]
mod field_tests;
