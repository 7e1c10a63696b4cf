use clap::Parser;

/// This is a TURF (Total Unduplicated Reach and Frequency) analysis program.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) The analysis file, in JSON format. It describes the data source and the
    /// parameters of the analysis. The other flags override its content.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path) A reference file containing the results of an analysis in JSON format. If provided,
    /// turfcalc will check that the computed results match the reference.
    #[clap(short, long, value_parser)]
    pub reference: Option<String>,

    /// (file path, 'stdout' or empty) Where to write the results. Defaults to the standard output.
    #[clap(short, long, value_parser)]
    pub out: Option<String>,

    /// (json or csv, default json) The format of the results.
    #[clap(long, value_parser)]
    pub out_format: Option<String>,

    /// (file path or empty) The file containing the survey responses. Setting this option overrides
    /// the data source of the analysis file.
    #[clap(short, long, value_parser)]
    pub input: Option<String>,

    /// (csv or xlsx) The type of the input. By default, it is guessed from the file extension.
    #[clap(long, value_parser)]
    pub input_type: Option<String>,

    /// When using an Excel file, indicates the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (list of comma-separated values) The candidate columns, one per item.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub columns: Option<Vec<String>>,

    /// The number of items in each combination.
    #[clap(long, value_parser)]
    pub size: Option<usize>,

    /// (column name) The column holding the weight of each respondent. By default, every
    /// respondent has a weight of 1.
    #[clap(long, value_parser)]
    pub weights: Option<String>,

    /// Items with a weighted number of positive answers below this value are not considered.
    #[clap(long, value_parser)]
    pub min_response: Option<f64>,

    /// (list of comma-separated values) Items included in every combination.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub forced: Option<Vec<String>>,

    /// (list of comma-separated values) Items that cannot appear together in a combination.
    #[clap(long, value_parser, value_delimiter = ',')]
    pub exclusive: Option<Vec<String>>,

    /// Only keep this number of combinations, the best ones.
    #[clap(long, value_parser)]
    pub top: Option<usize>,

    /// (default 1) The value that marks a positive answer.
    #[clap(long, value_parser)]
    pub positive: Option<String>,

    // Other arguments
    /// If passed as an argument, the combinations are scored on all the available cores.
    #[clap(long, takes_value = false)]
    pub parallel: bool,

    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
