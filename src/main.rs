use clap::Parser;
use log::LevelFilter;
use snafu::ErrorCompat;

mod args;
mod tally;

fn main() {
    let args = args::Args::parse();

    let mut builder = env_logger::Builder::from_default_env();
    if args.verbose {
        builder.filter_level(LevelFilter::Debug);
    }
    builder.init();

    let res = tally::run_election(&args.config, args.input, args.out, args.reference);

    if let Err(e) = res {
        eprintln!("An error occured: {}", e);
        for cause in ErrorCompat::iter_chain(&e).skip(1) {
            eprintln!("  caused by: {}", cause);
        }
        std::process::exit(1);
    }
}
