//! Stable exit codes for cmdgraph CLI commands.

/// Command succeeded. Unresolved references do not change this.
pub const OK: i32 = 0;
/// Invalid configuration, missing phase file, malformed alias table, or a
/// report that fails `cmdgraph check`.
pub const INVALID: i32 = 1;
