use anyhow::Context;
use clap::*;
use mgbin::libs::binning::weights::WEIGHT_NAMES;
use mgbin::libs::binning::{Clusterer, Scorer, SearchConfig, WeightBounds, WeightSearch};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("search")
        .about("Tune score weights with a genetic search")
        .after_help(
            r###"
Each individual is a weight vector (covg tetra ref uni_penalty uni min_score).
Its fitness is the quality of the bins produced with it. Pair features are
computed once and shared by every evaluation.

Bounds file, one parameter per line (unlisted parameters keep defaults):
    covg        0   10
    min_score   2   8

Output: a header and the best weight vector followed by its fitness.
The process exits with the rounded best fitness (0-255).

Examples:
1. Default search:
   mgbin search sample/ --log sample/search.log

2. Larger run with custom bounds:
   mgbin search sample/ --pop 40 --gen 25 --bounds bounds.txt --seed 7
"###,
        )
        .arg(super::arg_dir())
        .arg(
            Arg::new("pop")
                .long("pop")
                .num_args(1)
                .default_value("20")
                .value_parser(value_parser!(usize))
                .help("Population size"),
        )
        .arg(
            Arg::new("gen")
                .long("gen")
                .num_args(1)
                .default_value("10")
                .value_parser(value_parser!(usize))
                .help("Number of generations"),
        )
        .arg(
            Arg::new("seed")
                .long("seed")
                .num_args(1)
                .default_value("42")
                .value_parser(value_parser!(u64))
                .help("Random seed"),
        )
        .arg(
            Arg::new("bounds")
                .long("bounds")
                .num_args(1)
                .help("Per-parameter search bounds: name lo hi"),
        )
        .arg(
            Arg::new("parallel")
                .long("parallel")
                .short('p')
                .num_args(1)
                .default_value("1")
                .value_parser(value_parser!(usize))
                .help("Number of threads evaluating individuals"),
        )
        .args(super::quality_args())
        .arg(super::arg_force())
        .arg(super::arg_log())
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<i32> {
    super::check_dir(args.get_one::<String>("dir").unwrap())?;
    super::init_logging(args)?;

    let parallel = *args.get_one::<usize>("parallel").unwrap();
    rayon::ThreadPoolBuilder::new()
        .num_threads(parallel)
        .build_global()
        .context("setting up the thread pool")?;

    let bounds = match args.get_one::<String>("bounds") {
        Some(f) => WeightBounds::from_file(f).with_context(|| format!("reading {}", f))?,
        None => WeightBounds::default(),
    };
    let config = SearchConfig {
        population: *args.get_one::<usize>("pop").unwrap(),
        generations: *args.get_one::<usize>("gen").unwrap(),
        seed: *args.get_one::<u64>("seed").unwrap(),
        ..Default::default()
    };

    let ws = super::load_workspace(args)?;
    tracing::info!(
        "Searching {} generations of {} individuals over {} contigs",
        config.generations,
        config.population,
        ws.contigs.len()
    );

    let result = WeightSearch::new(&ws.contigs, &ws.store, &ws.evaluator)
        .with_total_roles(ws.total_roles)
        .with_bounds(bounds)
        .with_config(config)
        .with_policy(ws.policy)
        .run()?;
    tracing::info!("Best fitness {:.4}, weights [{}]", result.fitness, result.best);

    let clustering = Clusterer::new(Scorer::new(result.best, ws.total_roles)?)
        .with_policy(ws.policy)
        .cluster(&ws.contigs, &ws.store)
        .context("clustering contigs with the best weights")?;
    tracing::info!("Clustering statistics\n{}", clustering.stats);
    tracing::info!("Quality report\n{}", ws.evaluator.analyze(&clustering.bins));
    tracing::info!("Quality:\t{:.4}", ws.evaluator.quality(&clustering.bins));

    let mut writer = mgbin::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("#{}\tfitness\n", WEIGHT_NAMES.join("\t")))?;
    writer.write_fmt(format_args!("{}\t{:.4}\n", result.best, result.fitness))?;
    writer.flush()?;

    Ok(super::exit_status(result.fitness))
}
