//! Lua code generation for the LuaScript transpiler.
//!
//! Three concerns live here, one module each:
//!
//! - [`emit`]: render a validated [`IrModule`](luascript_ir::IrModule) as
//!   indented Lua source;
//! - [`balance`] and [`lint`]: the output validators (structural delimiter
//!   balance under a comment/string-aware scanner, and keyword/artifact
//!   checks);
//! - [`runtime`]: the fixed prelude that binds `console`, `JSON` and
//!   `Math` from the runtime module.

pub mod balance;
pub mod emit;
pub mod lint;
pub mod runtime;

pub use balance::{scan_balance, BalanceError};
pub use emit::{emit, EmitConfig, EmitError};
pub use lint::{validate_output, OutputConfig, OutputIssue, OutputReport};
pub use runtime::{inject_runtime, RUNTIME_MARKER, RUNTIME_PRELUDE};
