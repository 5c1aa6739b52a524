use clap::*;
use mgbin::libs::binning::store::SCORES_FILE;
use mgbin::libs::binning::PairStore;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("pairs")
        .about("Precompute pairwise contig features")
        .after_help(
            r###"
Compares every pair of contigs in <dir>/contigs.tsv and writes the raw,
weight-independent features to <dir>/scores.tbl.

Columns of scores.tbl:
    id1 id2 covgFrac tetraDot refCategory uniOnlyOne uniBoth

refCategory is one of: same, none, one, diff.

Examples:
1. Build the table once:
   mgbin pairs sample/

2. Rebuild after contigs.tsv changed:
   mgbin pairs sample/ --force
"###,
        )
        .arg(super::arg_dir())
        .arg(super::arg_force())
        .arg(super::arg_log())
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let dir = super::check_dir(args.get_one::<String>("dir").unwrap())?;
    super::init_logging(args)?;

    let contigs = super::load_contigs(&dir)?;
    let store = PairStore::open(&dir, &contigs, args.get_flag("force"))?;

    let expected = contigs.len() * (contigs.len() - 1) / 2;
    if store.len() < expected {
        tracing::warn!(
            "{} covers {} of {} contig pairs",
            SCORES_FILE,
            store.len(),
            expected
        );
    }

    Ok(())
}
