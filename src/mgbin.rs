extern crate clap;
use clap::*;

mod cmd_mgbin;

fn main() -> anyhow::Result<()> {
    let app = Command::new("mgbin")
        .version(crate_version!())
        .author(crate_authors!())
        .about("`mgbin` - Metagenomic contig binning")
        .propagate_version(true)
        .arg_required_else_help(true)
        .color(ColorChoice::Auto)
        .subcommand(cmd_mgbin::pairs::make_subcommand())
        .subcommand(cmd_mgbin::bin::make_subcommand())
        .subcommand(cmd_mgbin::search::make_subcommand())
        .subcommand(cmd_mgbin::stats::make_subcommand())
        .after_help(
            r###"Subcommands:

* pairs  - Precompute pairwise contig features (scores.tbl)
* bin    - Cluster contigs into bins with given score weights
* search - Tune score weights with a genetic search
* stats  - Report marker-role quality of a bin file

A working directory holds `contigs.tsv`, an optional `roles.tbl`,
and the generated `scores.tbl` and `bins.tsv`.

"###,
        );

    // `bin` and `search` exit with the rounded quality score
    let status = match app.get_matches().subcommand() {
        Some(("pairs", sub_matches)) => cmd_mgbin::pairs::execute(sub_matches).map(|_| 0),
        Some(("bin", sub_matches)) => cmd_mgbin::bin::execute(sub_matches),
        Some(("search", sub_matches)) => cmd_mgbin::search::execute(sub_matches),
        Some(("stats", sub_matches)) => cmd_mgbin::stats::execute(sub_matches).map(|_| 0),
        _ => unreachable!(),
    }?;

    std::process::exit(status)
}
