use chrono::{Local, NaiveDateTime, SubsecRound};
use std::path::PathBuf;

const OUTPUT_DIR_NAME: &str = "weather_collector";

/// Default location for collected data, e.g. `~/.local/share/weather_collector` on Linux.
///
/// Falls back to a directory relative to the working directory when the
/// platform has no data directory.
pub fn default_output_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join(OUTPUT_DIR_NAME))
        .unwrap_or_else(|| PathBuf::from(OUTPUT_DIR_NAME))
}

/// Local wall-clock time truncated to whole seconds, the resolution every
/// persisted timestamp uses.
pub fn capture_snapshot_timestamp() -> NaiveDateTime {
    Local::now().naive_local().trunc_subsecs(0)
}
