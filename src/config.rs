use std::path::PathBuf;

/// The dataset bundled with the crate, used when nothing is uploaded
pub const DEFAULT_DATA_PATH: &str = concat!(env!("CARGO_MANIFEST_DIR"), "/data/online_retail.csv");

/// The encoding text sources are decoded with, unless told otherwise
///
/// `encoding_rs` follows the WHATWG label table, which maps this label to
/// windows-1252. Bytes 0x80 to 0x9F therefore decode to printable characters
/// such as `€` instead of C1 control codes. All other bytes match Latin-1.
pub const DEFAULT_ENCODING: &str = "ISO-8859-1";

/// Settings shared by the pipeline stages of one run
#[derive(Clone, Debug, PartialEq)]
pub struct PipelineConfig {
    /// The dataset used when nothing is uploaded, see [`DataSource::bundled`](crate::DataSource::bundled)
    pub default_data_path: PathBuf,
    /// An encoding label as understood by `encoding_rs`
    pub encoding: String,
    /// The year left out of the customer growth series
    pub growth_excluded_year: i32,
    /// New vs existing revenue is reported in multiples of this
    pub revenue_unit: f64,
    /// The number of records shown in data previews
    pub preview_rows: usize,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            default_data_path: PathBuf::from(DEFAULT_DATA_PATH),
            encoding: DEFAULT_ENCODING.to_string(),
            growth_excluded_year: 2010,
            revenue_unit: 1_000_000.0,
            preview_rows: 5,
        }
    }
}
