use anyhow::Context;
use clap::*;
use mgbin::libs::binning::bin::write_bins;
use mgbin::libs::binning::{Clusterer, ScoreWeights, Scorer};
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    let cmd = Command::new("bin")
        .about("Cluster contigs into bins")
        .after_help(
            r###"
Greedily merges the best-scoring pair of bins until no pair scores above
<min_score>. The pairwise feature table scores.tbl is built on first use.

The score of a pair is
    covg * covgFrac + tetra * tetraDot + ref * refScore
        + uni * max(0, (uniOnlyOne - uni_penalty * uniBoth) / totalRoles)
and is 0 when below <min_score>.

The process exits with the rounded quality score (0-255).

Examples:
1. Bin with explicit weights:
   mgbin bin sample/ 5 3 1 1 2 6 --log sample/bin.log

2. Use averaged representative vectors:
   mgbin bin sample/ 5 3 1 1 2 6 --policy mean -o bins.mean.tsv
"###,
        )
        .arg(super::arg_dir());

    let cmd = ["covg", "tetra", "ref", "uni_penalty", "uni", "min_score"]
        .iter()
        .enumerate()
        .fold(cmd, |cmd, (i, name)| {
            cmd.arg(
                Arg::new(*name)
                    .required(true)
                    .index(i + 2)
                    .value_parser(value_parser!(f64))
                    .allow_negative_numbers(true)
                    .help(format!("Weight: {}", name)),
            )
        });

    cmd.args(super::quality_args())
        .arg(super::arg_force())
        .arg(super::arg_log())
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .help("Output bin file. Default: <dir>/bins.tsv"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<i32> {
    super::check_dir(args.get_one::<String>("dir").unwrap())?;
    super::init_logging(args)?;

    let weights = ScoreWeights::new(
        *args.get_one::<f64>("covg").unwrap(),
        *args.get_one::<f64>("tetra").unwrap(),
        *args.get_one::<f64>("ref").unwrap(),
        *args.get_one::<f64>("uni_penalty").unwrap(),
        *args.get_one::<f64>("uni").unwrap(),
        *args.get_one::<f64>("min_score").unwrap(),
    )?;

    let ws = super::load_workspace(args)?;
    let scorer = Scorer::new(weights, ws.total_roles)?;
    tracing::info!("Weights [{}], {} universal roles", weights, ws.total_roles);

    let clustering = Clusterer::new(scorer)
        .with_policy(ws.policy)
        .cluster(&ws.contigs, &ws.store)
        .context("clustering contigs")?;

    let outfile = match args.get_one::<String>("outfile") {
        Some(f) => f.clone(),
        None => ws.dir.join(super::BINS_FILE).to_string_lossy().to_string(),
    };
    let mut writer = mgbin::writer(&outfile)?;
    write_bins(&clustering.bins, &mut writer)?;
    writer.flush()?;

    let report = ws.evaluator.analyze(&clustering.bins);
    let quality = ws.evaluator.quality(&clustering.bins);
    tracing::info!("Clustering statistics\n{}", clustering.stats);
    tracing::info!("Quality report\n{}", report);
    tracing::info!("Quality:\t{:.4}", quality);

    Ok(super::exit_status(quality))
}
