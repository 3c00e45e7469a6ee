use thiserror::Error;

#[derive(Debug, Error)]
pub enum NormalizeError {
    // Covers missing or mistyped keys outside the current-conditions block
    #[error("Unexpected forecast response shape for '{location}': {source}")]
    Shape {
        location: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Missing key '{key}' in forecast response for '{location}'")]
    MissingKey { location: String, key: &'static str },

    #[error("Invalid forecast date '{value}' for '{location}'")]
    InvalidDate {
        location: String,
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}
