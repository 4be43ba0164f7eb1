//! Transpiler options.

use luascript_parser::arena::Limits;

/// Per-call configuration of the transpilation pipeline.
#[derive(Debug, Clone)]
pub struct TranspileOptions {
    /// Prepend the runtime prelude. Default: true.
    pub include_runtime: bool,
    /// Use the canonical IR pipeline; false selects the legacy regex
    /// rewriter. Default: true.
    pub use_canonical_ir: bool,
    /// Run the structural balance scan over the output. Default: true.
    pub validate_lua_balance: bool,
    /// Emitter indent unit. Default: two spaces.
    pub indent: String,
    /// Carried into stats and IR metadata.
    pub filename: Option<String>,
    /// Consult and fill the process-wide output cache. Default: true.
    pub use_cache: bool,
    /// Accept inputs up to 10 MiB instead of 1 MiB. Default: false.
    pub extended_size: bool,
    /// Arena budgets (node count, recursion depth) for this call.
    pub limits: Limits,
}

impl Default for TranspileOptions {
    fn default() -> Self {
        Self {
            include_runtime: true,
            use_canonical_ir: true,
            validate_lua_balance: true,
            indent: "  ".to_string(),
            filename: None,
            use_cache: true,
            extended_size: false,
            limits: Limits::default(),
        }
    }
}

impl TranspileOptions {
    /// Maximum accepted input size in bytes.
    pub fn max_input_size(&self) -> usize {
        if self.extended_size {
            10 * 1024 * 1024
        } else {
            1024 * 1024
        }
    }
}
