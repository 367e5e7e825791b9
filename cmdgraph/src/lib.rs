//! Command dependency resolver.
//!
//! Given phase documents that reference namespaced commands (`/namespace:name`),
//! this crate locates each command's document across ordered search roots,
//! follows the references those documents make, and reports every command a
//! phase transitively needs together with its shortest depth and the agents
//! it delegates to. The architecture keeps a strict separation:
//!
//! - **[`core`]**: Pure, deterministic logic (extraction, traversal,
//!   aggregation, invariants). No I/O; documents arrive through the
//!   [`core::traverse::DocumentSource`] trait.
//! - **[`io`]**: Side-effecting operations (configuration, filesystem lookup,
//!   report output).
//!
//! Orchestration modules ([`resolve`], [`refs`], [`check`]) coordinate core
//! logic with I/O to implement CLI commands.

pub mod check;
pub mod core;
pub mod exit_codes;
pub mod io;
pub mod logging;
pub mod refs;
pub mod resolve;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;
