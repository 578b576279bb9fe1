use clap::Parser;

/// Tallies a plurality or instant-runoff election described by a JSON file.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path) The JSON file describing the election: candidates, voting method,
    /// validity rules and ballot sources.
    #[clap(short, long, value_parser)]
    pub config: String,

    /// (file path or empty) A CSV file with one ballot per line. If specified, it replaces the
    /// ballot sources listed in the configuration.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (file path, 'stdout' or empty) Where the JSON summary of the election is written.
    /// Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference summary in JSON format. If provided, the program checks that the
    /// tabulated summary matches the reference and prints the differences otherwise.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
