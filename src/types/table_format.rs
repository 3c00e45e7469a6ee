use serde::Deserialize;
use std::fmt;

/// File format used for snapshots and the exported master table.
///
/// The master log itself is always parquet; this only selects the format of
/// the files meant to be opened by people.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TableFormat {
    /// Comma separated values with a header row. Opens in any spreadsheet.
    #[default]
    Csv,
    /// Apache Parquet with Snappy compression.
    Parquet,
}

impl TableFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            TableFormat::Csv => "csv",
            TableFormat::Parquet => "parquet",
        }
    }
}

/// Formats a `TableFormat` as its file extension.
///
/// # Examples
///
/// ```
/// use weather_collector::TableFormat;
///
/// assert_eq!(TableFormat::Csv.to_string(), "csv");
/// assert_eq!(format!("{}", TableFormat::Parquet), "parquet");
/// ```
impl fmt::Display for TableFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}
