//! Runtime library prelude injection.

/// The fixed prelude prepended to transpiled output. Binds the host APIs
/// the emitted code expects (`console`, `JSON`, `Math`) from the runtime
/// module.
pub const RUNTIME_PRELUDE: &str = "\
-- LUASCRIPT Runtime Library Integration
local runtime = require('runtime.runtime')
local console = runtime.console
local JSON = runtime.JSON
local Math = runtime.Math
";

/// Substring the output validator asserts when injection is enabled.
pub const RUNTIME_MARKER: &str = "require('runtime.runtime')";

/// Prepend the runtime prelude to emitted code.
pub fn inject_runtime(code: &str) -> String {
    let mut out = String::with_capacity(RUNTIME_PRELUDE.len() + 1 + code.len());
    out.push_str(RUNTIME_PRELUDE);
    out.push('\n');
    out.push_str(code);
    out
}
