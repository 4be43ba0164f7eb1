//! LuaScript-to-Lua transpiler driver.
//!
//! [`transpile`] is the library entry point: it validates the input,
//! selects a pipeline (canonical IR by default, the legacy regex rewriter
//! on request), times the phases, consults the process-wide output cache,
//! and assembles the `{ code, ir, stats }` result. A call either returns
//! a complete output or exactly one typed [`TranspileError`]; there is no
//! partial output and no in-core retry.
//!
//! A single call is synchronous and single-threaded. Callers may run many
//! calls concurrently; each owns its arena and IR store, and the only
//! shared state is the cache (read-concurrent, write-serialized) and the
//! atomic counters.

pub mod cache;
pub mod error;
pub mod input;
pub mod options;
pub mod stats;

use std::time::Instant;

use luascript_codegen::{
    emit, inject_runtime, scan_balance, validate_output, EmitConfig, OutputConfig,
};
use luascript_common::span::line_col;
use luascript_ir::{lower, IrModule, IrNode};
use luascript_lexer::Lexer;
use luascript_parser::ParseFailure;

pub use error::{ErrorKind, TranspileError};
pub use luascript_ir::{module_to_json, validate};
pub use options::TranspileOptions;
pub use stats::{counters, reset_counters, CountersSnapshot, Pipeline, PhaseTimings, TranspileStats};

/// A successful transpilation: the Lua output, the IR (canonical pipeline
/// only), and the per-call stats record.
#[derive(Debug)]
pub struct TranspileOutput {
    pub code: String,
    pub ir: Option<IrModule>,
    pub stats: TranspileStats,
}

/// Transpile a source string to Lua under the given options.
pub fn transpile(
    source: &str,
    options: &TranspileOptions,
) -> Result<TranspileOutput, TranspileError> {
    transpile_inner(source, options)
        .map_err(|err| err.with_filename(options.filename.as_deref()))
}

fn transpile_inner(
    source: &str,
    options: &TranspileOptions,
) -> Result<TranspileOutput, TranspileError> {
    let started = Instant::now();
    input::validate_input(source, options)?;

    let key = cache::fingerprint(source, options);
    if options.use_cache {
        if let Some(code) = cache::lookup(key) {
            let total = started.elapsed();
            stats::record_call(total, 0, true);
            return Ok(TranspileOutput {
                code,
                ir: None,
                stats: TranspileStats {
                    filename: options.filename.clone(),
                    pipeline: pipeline_tag(options),
                    timings: stats::PhaseTimings::default(),
                    node_count: 0,
                    optimizations_applied: 0,
                    cache_hit: true,
                    total_us: stats::as_micros(total),
                },
            });
        }
    }

    let mut timings = stats::PhaseTimings::default();
    let (code, ir) = if options.use_canonical_ir {
        let (code, module) = canonical_pipeline(source, options, &mut timings)?;
        (code, Some(module))
    } else {
        let at = Instant::now();
        let code = luascript_rewriter::rewrite(source);
        timings.rewrite_us = stats::as_micros(at.elapsed());
        (code, None)
    };

    let code = if options.include_runtime {
        inject_runtime(&code)
    } else {
        code
    };

    // Output validation runs on the final text so the runtime marker
    // check can see the prelude.
    let at = Instant::now();
    if options.validate_lua_balance {
        scan_balance(&code).map_err(|e| {
            TranspileError::new(ErrorKind::Balance, "balance", e.message.clone())
                .with_index(e.index)
        })?;
    }
    let output_config = OutputConfig {
        require_runtime_marker: options.include_runtime,
        strict_artifacts: true,
    };
    let report = validate_output(&code, &output_config);
    if !report.is_clean() {
        let summary = report
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TranspileError::new(
            ErrorKind::OutputValidation,
            "output-validation",
            summary,
        ));
    }
    timings.output_check_us = stats::as_micros(at.elapsed());

    let node_count = ir.as_ref().map_or(0, IrModule::len);
    let optimizations = ir.as_ref().map_or(0, count_local_rewrites);
    let total = started.elapsed();
    stats::record_call(total, optimizations, false);
    if options.use_cache {
        cache::store(key, &code);
    }

    Ok(TranspileOutput {
        code,
        ir,
        stats: TranspileStats {
            filename: options.filename.clone(),
            pipeline: pipeline_tag(options),
            timings,
            node_count,
            optimizations_applied: optimizations,
            cache_hit: false,
            total_us: stats::as_micros(total),
        },
    })
}

/// Lex, parse, lower, validate and emit.
fn canonical_pipeline(
    source: &str,
    options: &TranspileOptions,
    timings: &mut stats::PhaseTimings,
) -> Result<(String, IrModule), TranspileError> {
    let at = Instant::now();
    let tokens = Lexer::tokenize(source).map_err(|e| {
        let (line, column) = line_col(source, e.span.start);
        TranspileError::new(ErrorKind::Lex, "lex", e.to_string())
            .with_location(line, column)
            .with_span(e.span)
    })?;
    timings.lex_us = stats::as_micros(at.elapsed());

    let at = Instant::now();
    let ast = luascript_parser::parse(tokens, source, options.limits).map_err(|e| match e {
        ParseFailure::Syntax(e) => {
            let (line, column) = line_col(source, e.span.start);
            TranspileError::new(ErrorKind::Parse, "parse", e.message.clone())
                .with_location(line, column)
                .with_span(e.span)
        }
        ParseFailure::Memory(e) => {
            TranspileError::new(ErrorKind::Memory, "parse", e.to_string())
        }
    })?;
    timings.parse_us = stats::as_micros(at.elapsed());

    let at = Instant::now();
    let module = lower(
        &ast,
        source,
        options.filename.as_deref(),
        options.limits.max_nodes,
    )
    .map_err(|e| TranspileError::new(ErrorKind::Memory, "lower", e.to_string()))?;
    timings.lower_us = stats::as_micros(at.elapsed());

    let at = Instant::now();
    let report = luascript_ir::validate(&module);
    if !report.valid {
        let summary = report
            .errors
            .iter()
            .map(ToString::to_string)
            .collect::<Vec<_>>()
            .join("; ");
        return Err(TranspileError::new(ErrorKind::Ir, "validate", summary));
    }
    timings.validate_us = stats::as_micros(at.elapsed());

    let at = Instant::now();
    let config = EmitConfig {
        indent: options.indent.clone(),
    };
    let code = emit(&module, &config)
        .map_err(|e| TranspileError::new(ErrorKind::Emit, "emit", e.to_string()))?;
    timings.emit_us = stats::as_micros(at.elapsed());

    Ok((code, module))
}

fn pipeline_tag(options: &TranspileOptions) -> Pipeline {
    if options.use_canonical_ir {
        Pipeline::CanonicalIr
    } else {
        Pipeline::LegacyRewriter
    }
}

/// Count the local rewrites the lowerer applied: numeric range loops
/// recognized and switches desugared.
fn count_local_rewrites(module: &IrModule) -> u64 {
    let mut count = 0;
    for (_, node) in module.iter() {
        match node {
            IrNode::NumericFor { .. } => count += 1,
            IrNode::Declarator { name, .. } if name.starts_with("__switch") => count += 1,
            _ => {}
        }
    }
    count
}
