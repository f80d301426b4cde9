use clap::Parser;

/// Tabulates a municipal council election from the open data of the Brazilian
/// electoral court.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file describing the election. The other options override what it contains.
    /// See the manual of the council_tally library for its format.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (code) The municipality code of the election, as in the SG_UE column of the candidate file.
    #[clap(short, long, value_parser)]
    pub municipality: Option<String>,

    /// (file path) The candidate file (consulta_cand CSV).
    #[clap(long, value_parser)]
    pub candidates: Option<String>,

    /// (file path) The vote file (votacao_secao CSV).
    #[clap(long, value_parser)]
    pub votes: Option<String>,

    /// (dd/mm/yyyy) The date of the election. Ages are computed at this date.
    #[clap(short, long, value_parser)]
    pub date: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location. Setting this option overrides the output directory that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path) A reference file containing the summary of an election in JSON format. If provided, the tabulated
    /// summary must match it.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// If passed as an argument, the text report is not printed.
    #[clap(long, takes_value = false)]
    pub quiet: bool,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
