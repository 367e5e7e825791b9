//! Deterministic, pure logic shared by the resolver.
//!
//! Core modules must be free of I/O side effects. They operate on in-memory
//! data structures and return deterministic outputs suitable for tests.
//! Document lookup is reached only through the [`traverse::DocumentSource`]
//! trait.

pub mod aggregate;
pub mod alias;
pub mod extract;
pub mod invariants;
pub mod report;
pub mod traverse;
pub mod types;
