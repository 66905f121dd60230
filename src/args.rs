use clap::Parser;

/// This is a tabulation program for multi-seat ranked elections (single transferable vote).
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The file containing the election description in JSON.
    /// For more information about the file format, read the documentation of the manual.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, optional) A settings file in the legacy format: four `name = value` lines
    /// giving the number of seats, the candidates file, the ballots file and the winners file.
    #[clap(short, long, value_parser)]
    pub settings: Option<String>,

    /// (file path) A reference file containing the outcome of an election in JSON format. If provided, stvtab will
    /// check that the tabulated output matches the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) If specified, the summary of the election will be written in JSON format to the given
    /// location.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (file path or empty) The file containing the ballots. Setting this option overrides the
    /// sources that may be specified with the --config option.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (default text) The type of the input: text, csv or xlsx.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// (list of comma-separated values) The names of the candidates, in order. Required with --input
    /// unless a configuration file lists them.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub candidates: Option<Vec<String>>,

    /// (default 1) The number of seats to fill. Overrides the value of the configuration file.
    #[clap(long, value_parser)]
    pub seats: Option<u32>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
