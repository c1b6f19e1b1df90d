// crates/duct_cli/src/args.rs
//
// Offline CLI argument surface.
// - Exactly one of: --evidence (single bundle) XOR --manifest
// - Optional: --params, --iteration-guard override
// - Output: --out dir, --render [json|text]*
// - No networked paths (any scheme:// is rejected)

use std::{
    env, fs,
    path::{Path, PathBuf},
};

use clap::{ArgGroup, Parser};

/// Parsed CLI arguments.
#[derive(Debug, Parser, Clone)]
#[command(
    name = "duct",
    disable_help_subcommand = true,
    about = "Offline, deterministic assumed-cable inference over duct evidence"
)]
#[command(group(ArgGroup::new("input").required(true).args(["evidence", "manifest"])))]
pub struct Args {
    /// Evidence bundle JSON (edges + count maps in one document).
    #[arg(long)]
    pub evidence: Option<PathBuf>,

    /// Manifest JSON pointing at separate evidence files.
    #[arg(long)]
    pub manifest: Option<PathBuf>,

    /// Engine params JSON; wins over the manifest's `params_path`.
    #[arg(long)]
    pub params: Option<PathBuf>,

    /// Override the greedy iteration guard.
    #[arg(long, value_parser = clap::value_parser!(u32))]
    pub iteration_guard: Option<u32>,

    /// Output directory for scenario and run-record artifacts.
    #[arg(long, default_value = "out")]
    pub out: PathBuf,

    /// Renderer(s) to emit (json → report.json, text → stdout).
    #[arg(long, value_parser = ["json", "text"], num_args = 1)]
    pub render: Vec<String>,

    /// Load + schema + validation only; no scenarios are built or written.
    #[arg(long)]
    pub validate_only: bool,

    /// Only warnings and errors on stderr.
    #[arg(long, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Debug-level logging.
    #[arg(long)]
    pub verbose: bool,
}

/// Errors surfaced by argument validation. Messages are short and stable.
#[derive(Debug)]
pub enum CliError {
    NonLocalPath(String),
    NotFound(String),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::NonLocalPath(p) => write!(f, "path must be local file (no scheme): {p}"),
            CliError::NotFound(p) => write!(f, "file not found: {p}"),
        }
    }
}

impl std::error::Error for CliError {}

/// Parse argv, reject non-local paths, check input files exist, normalize.
pub fn parse_and_validate() -> Result<Args, CliError> {
    check(Args::parse())
}

fn check(mut args: Args) -> Result<Args, CliError> {
    for p in iter_all_paths(&args) {
        ensure_local_path(p)?;
    }
    if let Some(p) = &args.evidence {
        ensure_local_exists(p, "--evidence")?;
    }
    if let Some(p) = &args.manifest {
        ensure_local_exists(p, "--manifest")?;
    }
    if let Some(p) = &args.params {
        ensure_local_exists(p, "--params")?;
    }

    args.evidence = args.evidence.take().map(|p| normalize_path(&p));
    args.manifest = args.manifest.take().map(|p| normalize_path(&p));
    args.params = args.params.take().map(|p| normalize_path(&p));
    args.out = normalize_path(&args.out);
    Ok(args)
}

fn iter_all_paths(args: &Args) -> impl Iterator<Item = &Path> {
    [
        args.evidence.as_deref(),
        args.manifest.as_deref(),
        args.params.as_deref(),
        Some(args.out.as_path()),
    ]
    .into_iter()
    .flatten()
}

#[inline]
fn ensure_local_path(p: &Path) -> Result<(), CliError> {
    if let Some(s) = p.to_str() {
        if duct_io::looks_like_url_strict(s) {
            return Err(CliError::NonLocalPath(s.to_string()));
        }
    }
    Ok(())
}

fn ensure_local_exists(p: &Path, label: &'static str) -> Result<(), CliError> {
    let meta = fs::metadata(p).map_err(|_| CliError::NotFound(format!("{label} {}", p.display())))?;
    if !meta.is_file() {
        return Err(CliError::NotFound(format!("{label} {}", p.display())));
    }
    Ok(())
}

/// Absolute form of `p`; falls back to CWD-joining when the path does not exist yet.
fn normalize_path(p: &Path) -> PathBuf {
    fs::canonicalize(p).unwrap_or_else(|_| {
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            env::current_dir().unwrap_or_else(|_| PathBuf::from(".")).join(p)
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(argv: &[&str]) -> Result<Args, clap::Error> {
        Args::try_parse_from(std::iter::once("duct").chain(argv.iter().copied()))
    }

    #[test]
    fn exactly_one_input_is_required() {
        assert!(parse(&[]).is_err());
        assert!(parse(&["--evidence", "a.json", "--manifest", "m.json"]).is_err());
        assert!(parse(&["--evidence", "a.json"]).is_ok());
    }

    #[test]
    fn render_accepts_json_and_text_only() {
        let a = parse(&["--evidence", "a.json", "--render", "json", "--render", "text"]).unwrap();
        assert_eq!(a.render, vec!["json", "text"]);
        assert!(parse(&["--evidence", "a.json", "--render", "html"]).is_err());
    }

    #[test]
    fn quiet_and_verbose_conflict() {
        assert!(parse(&["--evidence", "a.json", "--quiet", "--verbose"]).is_err());
    }

    #[test]
    fn urls_are_rejected() {
        let a = parse(&["--evidence", "https://x/e.json"]).unwrap();
        assert!(matches!(check(a), Err(CliError::NonLocalPath(_))));
    }

    #[test]
    fn missing_file_is_not_found() {
        let a = parse(&["--evidence", "does/not/exist.json"]).unwrap();
        assert!(matches!(check(a), Err(CliError::NotFound(_))));
    }

    #[test]
    fn normalize_path_returns_absolute() {
        assert!(normalize_path(Path::new("does/not/exist.txt")).is_absolute());
    }
}
