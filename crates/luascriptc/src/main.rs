//! The LuaScript transpiler CLI.
//!
//! Usage: `luascriptc <input> [output] [flags]`
//!
//! Transpiles a LuaScript source file to Lua. When `[output]` is omitted
//! the result lands next to the input with a `.lua` extension.
//!
//! Flags:
//! - `--no-runtime` - skip the runtime prelude
//! - `--legacy` - use the legacy regex rewriter instead of the IR pipeline
//! - `--indent <str>` - emitter indent unit (default two spaces)
//! - `--emit-ir <path>` - additionally write the serialized IR document
//! - `--report` - print a stats report after success
//! - `--no-caching` - bypass the process-wide output cache
//! - `--no-optimizations`, `--optimization-level`, `--no-parallel`,
//!   `--no-profiling` - advisory flags for outer tooling; they do not
//!   change what the core emits
//!
//! Exit codes: 0 on success, 1 on any failure. Errors print one
//! `LUASCRIPT_<KIND>: message` line to stderr; lex and parse errors also
//! render a source span report.

use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, ValueEnum};
use luascript::{transpile, TranspileError, TranspileOptions, TranspileOutput};

#[derive(Parser)]
#[command(
    name = "luascriptc",
    version,
    about = "Transpile LuaScript source to Lua"
)]
struct Cli {
    /// Input source file
    input: PathBuf,

    /// Output file (defaults to the input with a .lua extension)
    output: Option<PathBuf>,

    /// Do not prepend the runtime prelude
    #[arg(long = "no-runtime")]
    no_runtime: bool,

    /// Use the legacy regex rewriter instead of the canonical IR pipeline
    #[arg(long)]
    legacy: bool,

    /// Emitter indent unit
    #[arg(long, default_value = "  ")]
    indent: String,

    /// Write the serialized IR document to this path
    #[arg(long = "emit-ir")]
    emit_ir: Option<PathBuf>,

    /// Print a stats report after success
    #[arg(long)]
    report: bool,

    /// Bypass the process-wide output cache
    #[arg(long = "no-caching")]
    no_caching: bool,

    /// Advisory: disable optimization passes in outer tooling
    #[arg(long = "no-optimizations")]
    no_optimizations: bool,

    /// Advisory: optimization level for outer tooling
    #[arg(long = "optimization-level", value_enum)]
    optimization_level: Option<OptimizationLevel>,

    /// Advisory: disable parallel batch transpilation in outer tooling
    #[arg(long = "no-parallel")]
    no_parallel: bool,

    /// Advisory: disable profiling in outer tooling
    #[arg(long = "no-profiling")]
    no_profiling: bool,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum OptimizationLevel {
    Basic,
    Standard,
    Aggressive,
}

fn main() {
    // Usage failures exit 1 like every other failure; --help and
    // --version still exit 0.
    let cli = Cli::try_parse().unwrap_or_else(|e| {
        let _ = e.print();
        process::exit(if e.use_stderr() { 1 } else { 0 });
    });
    if let Err(code) = run(&cli) {
        process::exit(code);
    }
}

fn run(cli: &Cli) -> Result<(), i32> {
    let source = std::fs::read_to_string(&cli.input).map_err(|e| {
        eprintln!(
            "LUASCRIPT_IO_ERROR: cannot read '{}': {e}",
            cli.input.display()
        );
        1
    })?;

    let options = TranspileOptions {
        include_runtime: !cli.no_runtime,
        use_canonical_ir: !cli.legacy,
        indent: cli.indent.clone(),
        filename: Some(cli.input.display().to_string()),
        use_cache: !cli.no_caching,
        ..TranspileOptions::default()
    };

    let output = transpile(&source, &options).map_err(|err| {
        report_error(&err, &source, &cli.input);
        1
    })?;

    let out_path = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("lua"));
    std::fs::write(&out_path, &output.code).map_err(|e| {
        eprintln!(
            "LUASCRIPT_IO_ERROR: cannot write '{}': {e}",
            out_path.display()
        );
        1
    })?;

    if let Some(ir_path) = &cli.emit_ir {
        write_ir(&output, ir_path)?;
    }

    eprintln!("  Transpiled: {}", out_path.display());
    if cli.report {
        print_report(cli, &output);
    }
    Ok(())
}

/// Write the serialized IR document. The legacy pipeline produces none;
/// asking for it there is an error.
fn write_ir(output: &TranspileOutput, path: &Path) -> Result<(), i32> {
    let Some(module) = &output.ir else {
        eprintln!("LUASCRIPT_IO_ERROR: --emit-ir requires the canonical IR pipeline");
        return Err(1);
    };
    let doc = luascript::module_to_json(module);
    let text = serde_json::to_string_pretty(&doc).unwrap_or_else(|_| doc.to_string());
    std::fs::write(path, text).map_err(|e| {
        eprintln!("LUASCRIPT_IO_ERROR: cannot write '{}': {e}", path.display());
        1
    })
}

/// Print the single-line error, then a span report when the failure has
/// a source location.
fn report_error(err: &TranspileError, source: &str, input: &Path) {
    eprintln!("{err}");

    if let Some(span) = err.span {
        use ariadne::{Label, Report, ReportKind, Source};
        let start = span.start as usize;
        let end = (span.end as usize).max(start + 1);
        let _ = Report::<std::ops::Range<usize>>::build(ReportKind::Error, start..end)
            .with_message(format!("in {}", input.display()))
            .with_label(Label::new(start..end).with_message(&err.message))
            .finish()
            .eprint(Source::from(source));
    }
}

fn print_report(cli: &Cli, output: &TranspileOutput) {
    let counters = luascript::counters();
    let report = serde_json::json!({
        "stats": output.stats,
        "counters": counters,
        "advisory": {
            "optimizations": !cli.no_optimizations,
            "optimizationLevel": cli.optimization_level.map(|l| format!("{l:?}").to_lowercase()),
            "parallel": !cli.no_parallel,
            "profiling": !cli.no_profiling,
        },
    });
    println!(
        "{}",
        serde_json::to_string_pretty(&report).unwrap_or_else(|_| report.to_string())
    );
}
