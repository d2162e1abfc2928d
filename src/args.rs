use clap::Parser;

/// Collects dog breed group votes and serves the accumulated responses.
#[derive(Parser, Debug, Clone)]
#[clap(author, version, about, long_about = None)]
pub struct Args {
    /// (file path, optional) A JSON file with the settings of the poll. The paths it contains are
    /// relative to its own directory. Any option passed on the command line overrides it.
    #[clap(short, long, value_parser)]
    pub config: Option<String>,

    /// (file path, default data/dog_breeds_groups.csv) The breed catalog. It must have a `breed`
    /// and a `group` column.
    #[clap(long, value_parser)]
    pub catalog: Option<String>,

    /// (csv or xlsx) The format of the catalog. By default it is guessed from the file extension.
    #[clap(long, value_parser)]
    pub catalog_type: Option<String>,

    /// (default: first sheet) When the catalog is an Excel file, the name of the worksheet to use.
    #[clap(long, value_parser)]
    pub excel_worksheet_name: Option<String>,

    /// (file path, default data/responses.csv) The response log. It is created on the first
    /// submission.
    #[clap(short, long, value_parser)]
    pub responses: Option<String>,

    /// (default 127.0.0.1:5000) The address to listen on.
    #[clap(short, long, value_parser)]
    pub bind: Option<String>,

    /// (reject or map_by_name, default reject) What to do when the response log was written with
    /// a different set of groups than the current catalog.
    #[clap(long, value_parser)]
    pub schema_policy: Option<String>,

    /// (first_seen or alphabetical, default first_seen) The order of the groups in the form and
    /// in the response log.
    #[clap(long, value_parser)]
    pub group_order: Option<String>,

    // Other arguments
    /// If passed as an argument, will turn on verbose logging to the standard output.
    #[clap(long, takes_value = false)]
    pub verbose: bool,
}
