use clap::*;
use mgbin::libs::binning::bin::read_bins;
use mgbin::libs::binning::Evaluator;
use std::io::Write;

// Create clap subcommand arguments
pub fn make_subcommand() -> Command {
    Command::new("stats")
        .about("Report marker-role quality of a bin file")
        .after_help(
            r###"
Classifies every bin by its universal roles: found, missing and duplicated.
A bin is good when it has at least --min-unis roles and at most --max-dups
duplicated ones.

Without --roles, the role universe is every role seen in the bins.

Examples:
   mgbin stats sample/bins.tsv --roles sample/roles.tbl
"###,
        )
        .arg(
            Arg::new("infile")
                .required(true)
                .index(1)
                .help("Bin file written by `mgbin bin`"),
        )
        .arg(
            Arg::new("roles")
                .long("roles")
                .num_args(1)
                .help("Universal role list"),
        )
        .arg(
            Arg::new("min_unis")
                .long("min-unis")
                .num_args(1)
                .default_value("30")
                .value_parser(value_parser!(usize))
                .help("Distinct universal roles a good bin must contain"),
        )
        .arg(
            Arg::new("max_dups")
                .long("max-dups")
                .num_args(1)
                .default_value("4")
                .value_parser(value_parser!(usize))
                .help("Duplicated universal roles a good bin may contain"),
        )
        .arg(
            Arg::new("outfile")
                .short('o')
                .long("outfile")
                .num_args(1)
                .default_value("stdout")
                .help("Output filename. [stdout] for screen"),
        )
}

pub fn execute(args: &ArgMatches) -> anyhow::Result<()> {
    let infile = args.get_one::<String>("infile").unwrap();
    let bins = read_bins(infile)?;

    let universe = super::role_universe(
        None,
        args.get_one::<String>("roles"),
        bins.iter().flat_map(|b| b.uni_roles.keys()),
    )?;
    let evaluator = Evaluator::new(
        universe,
        *args.get_one::<usize>("min_unis").unwrap(),
        *args.get_one::<usize>("max_dups").unwrap(),
    )?;

    let report = evaluator.analyze(&bins);
    let quality = evaluator.quality(&bins);

    let mut writer = mgbin::writer(args.get_one::<String>("outfile").unwrap())?;
    writer.write_fmt(format_args!("{}", report))?;
    writer.write_fmt(format_args!("\nQuality:\t{:.4}\n", quality))?;
    writer.flush()?;

    Ok(())
}
