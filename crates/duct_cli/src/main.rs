// crates/duct_cli/src/main.rs
//
// Exit codes, typed error mapping, logging setup, the validate-only
// short-circuit, and the full run path (load → pipeline → artifacts → render).

mod args;

mod exitcodes {
    pub const OK: i32 = 0;
    pub const VALIDATION: i32 = 2;
    pub const SELF_VERIFY: i32 = 3;
    pub const IO: i32 = 4;
}

use std::fs;
use std::path::Path;
use std::process::ExitCode;

use serde_json::Value;
use tracing::{debug, error, info, warn};
use tracing_subscriber::EnvFilter;

use args::{parse_and_validate as parse_cli, Args};
use duct_io::canonical_json;
use duct_io::loader::{self, InputSource};
use duct_pipeline::{engine_identifiers, run_with_ctx, ParamsOverride, PipelineCtx, PipelineError, PipelineOutputs};
use duct_report::{build_model, ReportError};

/// Central error type for CLI → exit-code mapping.
#[derive(Debug)]
enum MainError {
    /// Schema / JSON shape / manifest / params-domain failures
    Validation(String),
    /// Conservation or digest mismatches the engine must never produce
    SelfVerify(String),
    /// Read / write / path / limit errors
    Io(String),
    /// Report building or rendering
    Render(String),
}

impl std::fmt::Display for MainError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MainError::Validation(m) => write!(f, "validation: {m}"),
            MainError::SelfVerify(m) => write!(f, "self-verify: {m}"),
            MainError::Io(m) => write!(f, "io: {m}"),
            MainError::Render(m) => write!(f, "render: {m}"),
        }
    }
}

fn main() -> ExitCode {
    let args = match parse_cli() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("duct: error: {e}");
            return ExitCode::from(exitcodes::VALIDATION as u8);
        }
    };
    init_log(&args);

    let res = if args.validate_only { validate_only(&args) } else { run_once(&args) };
    let rc = match res {
        Ok(()) => exitcodes::OK,
        Err(e) => {
            error!("{e}");
            map_error(&e)
        }
    };
    ExitCode::from(rc as u8)
}

/// stderr `fmt` subscriber; `RUST_LOG` wins over the flag-derived default.
fn init_log(args: &Args) {
    let default = if args.quiet {
        "warn"
    } else if args.verbose {
        "debug"
    } else {
        "info"
    };
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    if let Err(e) = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init()
    {
        eprintln!("duct: failed to init logger: {e}");
    }
}

/// Map typed errors to the exit-code table.
fn map_error(e: &MainError) -> i32 {
    use exitcodes::*;
    match e {
        MainError::Validation(_) => VALIDATION,
        MainError::SelfVerify(_) => SELF_VERIFY,
        MainError::Io(_) => IO,
        MainError::Render(_) => IO,
    }
}

fn map_pipeline_err(e: PipelineError) -> MainError {
    use PipelineError::*;
    match e {
        Schema(m) | Validate(m) => MainError::Validation(m),
        Io(m) => MainError::Io(m),
        Invariant(m) | Build(m) => MainError::SelfVerify(m),
    }
}

fn map_report_err(e: ReportError) -> MainError {
    MainError::Render(e.to_string())
}

fn input_source(args: &Args) -> Result<InputSource<'_>, MainError> {
    match (&args.evidence, &args.manifest) {
        (Some(p), None) => Ok(InputSource::Bundle(p)),
        (None, Some(p)) => Ok(InputSource::Manifest(p)),
        _ => Err(MainError::Validation("exactly one of --evidence | --manifest is required".into())),
    }
}

fn load_ctx(args: &Args) -> Result<PipelineCtx, MainError> {
    let inputs = loader::load_inputs(input_source(args)?, args.params.as_deref())
        .map_err(|e| map_pipeline_err(e.into()))?;
    debug!(edges = inputs.evidence.edges.len(), evidence_sha256 = %inputs.evidence_sha256, "inputs loaded");
    Ok(PipelineCtx {
        inputs,
        overrides: ParamsOverride { iteration_guard: args.iteration_guard },
        engine_meta: engine_identifiers(),
    })
}

/// Validate-only path: schema + normalization + validation report, no artifacts.
fn validate_only(args: &Args) -> Result<(), MainError> {
    let ctx = load_ctx(args)?;
    let (_, _, report) = duct_pipeline::prepare(&ctx);
    for issue in report.warnings() {
        warn!(code = issue.code, "{}", issue.message);
    }
    if let Some(err) = report.errors().next() {
        return Err(MainError::Validation(format!("{}: {}", err.code, err.message)));
    }
    info!("validate-only: inputs OK");
    Ok(())
}

fn run_once(args: &Args) -> Result<(), MainError> {
    let ctx = load_ctx(args)?;
    let outs = run_with_ctx(ctx).map_err(map_pipeline_err)?;

    write_artifacts(&args.out, &outs)?;
    maybe_render_reports(args, &outs)?;

    info!(out = %args.out.display(), run_id = %outs.run_record.id, "artifacts written");
    Ok(())
}

fn to_json<T: serde::Serialize>(v: &T, what: &str) -> Result<Value, MainError> {
    serde_json::to_value(v).map_err(|e| MainError::SelfVerify(format!("{what} to JSON: {e}")))
}

fn write_json(out_dir: &Path, name: &str, v: &Value) -> Result<(), MainError> {
    canonical_json::write_canonical_file(&out_dir.join(name), v)
        .map_err(|e| MainError::Io(format!("write {name}: {e}")))
}

fn write_artifacts(out_dir: &Path, outs: &PipelineOutputs) -> Result<(), MainError> {
    fs::create_dir_all(out_dir).map_err(|e| MainError::Io(format!("mkdir {}: {e}", out_dir.display())))?;

    for doc in &outs.scenarios {
        let name = format!("scenario_v{}.json", doc.variant_no.as_u8());
        write_json(out_dir, &name, &to_json(doc, &name)?)?;
    }
    write_json(out_dir, "run_record.json", &to_json(&outs.run_record, "run_record")?)
}

fn maybe_render_reports(args: &Args, outs: &PipelineOutputs) -> Result<(), MainError> {
    if args.render.is_empty() {
        return Ok(());
    }

    let run_val = to_json(&outs.run_record, "run_record")?;
    let scenario_vals = outs
        .scenarios
        .iter()
        .map(|s| to_json(s, "scenario"))
        .collect::<Result<Vec<_>, _>>()?;
    let model = build_model(&run_val, &scenario_vals).map_err(map_report_err)?;

    for fmt in &args.render {
        match fmt.as_str() {
            "json" => render_json_report(&model, &args.out)?,
            "text" => print!("{}", duct_report::render_text(&model)),
            other => return Err(MainError::Render(format!("unknown renderer: {other}"))),
        }
    }
    Ok(())
}

fn render_json_report(model: &duct_report::ReportModel, out_dir: &Path) -> Result<(), MainError> {
    #[cfg(feature = "report-json")]
    {
        let v = duct_report::render_json(model).map_err(map_report_err)?;
        write_json(out_dir, "report.json", &v)
    }
    #[cfg(not(feature = "report-json"))]
    {
        let _ = (model, out_dir);
        Err(MainError::Render("json renderer not enabled (build with feature `report-json`)".into()))
    }
}
