//! Subcommand modules for the `mgbin` binary.

use anyhow::{bail, Context};
use clap::{value_parser, Arg, ArgAction, ArgMatches};
use mgbin::libs::binning::contig::{read_contigs, read_roles};
use mgbin::libs::binning::{Contig, Evaluator, PairStore, RepresentativePolicy};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

pub mod bin;
pub mod pairs;
pub mod search;
pub mod stats;

pub const CONTIGS_FILE: &str = "contigs.tsv";
pub const ROLES_FILE: &str = "roles.tbl";
pub const BINS_FILE: &str = "bins.tsv";

pub fn arg_dir() -> Arg {
    Arg::new("dir")
        .required(true)
        .index(1)
        .help("Working directory containing contigs.tsv")
}

pub fn arg_force() -> Arg {
    Arg::new("force")
        .long("force")
        .action(ArgAction::SetTrue)
        .help("Recompute scores.tbl even if it exists")
}

pub fn arg_log() -> Arg {
    Arg::new("log")
        .long("log")
        .num_args(1)
        .help("Log file for progress and the statistics report. [stderr] if omitted")
}

pub fn quality_args() -> Vec<Arg> {
    vec![
        Arg::new("min_unis")
            .long("min-unis")
            .num_args(1)
            .default_value("30")
            .value_parser(value_parser!(usize))
            .help("Distinct universal roles a good bin must contain"),
        Arg::new("max_dups")
            .long("max-dups")
            .num_args(1)
            .default_value("4")
            .value_parser(value_parser!(usize))
            .help("Duplicated universal roles a good bin may contain"),
        Arg::new("total_roles")
            .long("total-roles")
            .num_args(1)
            .value_parser(value_parser!(usize))
            .help("Override the universal role count used by the score"),
        Arg::new("policy")
            .long("policy")
            .num_args(1)
            .default_value("seed")
            .value_parser(["seed", "mean"])
            .help("Representative vectors of merged bins: seed contig or length-weighted mean"),
    ]
}

/// Install the tracing subscriber; filter from `RUST_LOG`, default `info`.
pub fn init_logging(args: &ArgMatches) -> anyhow::Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    match args.get_one::<String>("log") {
        Some(path) => {
            let file = std::fs::File::create(path)
                .with_context(|| format!("could not create log file {}", path))?;
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_ansi(false)
                .with_writer(std::sync::Mutex::new(file))
                .try_init();
        }
        None => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .try_init();
        }
    }
    Ok(())
}

/// Inputs shared by the `bin` and `search` runs.
pub struct Workspace {
    pub dir: PathBuf,
    pub contigs: Vec<Contig>,
    pub store: PairStore,
    pub evaluator: Evaluator,
    pub total_roles: usize,
    pub policy: RepresentativePolicy,
}

pub fn check_dir(dir: &str) -> anyhow::Result<PathBuf> {
    let path = Path::new(dir);
    if !path.is_dir() {
        bail!("{} is not a directory", dir);
    }
    let contigs = path.join(CONTIGS_FILE);
    if !contigs.is_file() {
        bail!("missing input file {}", contigs.display());
    }
    Ok(path.to_path_buf())
}

pub fn load_contigs(dir: &Path) -> anyhow::Result<Vec<Contig>> {
    let file = dir.join(CONTIGS_FILE).to_string_lossy().to_string();
    let contigs = read_contigs(&file).with_context(|| format!("reading {}", file))?;
    if contigs.is_empty() {
        bail!("no contigs in {}", file);
    }
    tracing::info!("Read {} contigs from {}", contigs.len(), file);
    Ok(contigs)
}

/// `roles.tbl` in `dir`, or every role observed in `observed`.
pub fn role_universe<'a>(
    dir: Option<&Path>,
    roles_file: Option<&String>,
    observed: impl Iterator<Item = &'a String>,
) -> anyhow::Result<Vec<String>> {
    let file = match (roles_file, dir) {
        (Some(f), _) => Some(f.clone()),
        (None, Some(d)) if d.join(ROLES_FILE).is_file() => {
            Some(d.join(ROLES_FILE).to_string_lossy().to_string())
        }
        _ => None,
    };
    let universe = match file {
        Some(f) => read_roles(&f).with_context(|| format!("reading {}", f))?,
        None => observed.cloned().collect::<BTreeSet<_>>().into_iter().collect(),
    };
    if universe.is_empty() {
        bail!("no universal roles found; provide {} or role counts", ROLES_FILE);
    }
    Ok(universe)
}

pub fn load_workspace(args: &ArgMatches) -> anyhow::Result<Workspace> {
    let dir = check_dir(args.get_one::<String>("dir").unwrap())?;
    let contigs = load_contigs(&dir)?;
    let store = PairStore::open(&dir, &contigs, args.get_flag("force"))?;

    let universe = role_universe(
        Some(dir.as_path()),
        None,
        contigs.iter().flat_map(|c| c.uni_roles.keys()),
    )?;
    let evaluator = Evaluator::new(
        universe,
        *args.get_one::<usize>("min_unis").unwrap(),
        *args.get_one::<usize>("max_dups").unwrap(),
    )?;
    let total_roles = args
        .get_one::<usize>("total_roles")
        .copied()
        .unwrap_or_else(|| evaluator.total_roles());
    let policy = args
        .get_one::<String>("policy")
        .unwrap()
        .parse::<RepresentativePolicy>()
        .map_err(anyhow::Error::msg)?;

    Ok(Workspace {
        dir,
        contigs,
        store,
        evaluator,
        total_roles,
        policy,
    })
}

/// Quality as a process exit status, rounded and clamped to 0..=255.
pub fn exit_status(quality: f64) -> i32 {
    if quality.is_nan() {
        return 0;
    }
    quality.round().clamp(0.0, 255.0) as i32
}
