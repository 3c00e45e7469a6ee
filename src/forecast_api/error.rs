use thiserror::Error;

// reqwest errors carry the request URL, which includes the API key as a query
// parameter. Every error stored here has its URL stripped before construction.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Failed to build HTTP client")]
    ClientBuild(#[source] reqwest::Error),

    #[error("Network request failed for {0}")]
    NetworkRequest(String, #[source] reqwest::Error),

    #[error("HTTP request failed for {location} with status {status}")]
    HttpStatus {
        location: String,
        status: reqwest::StatusCode,
        #[source]
        source: reqwest::Error,
    },

    #[error("Failed to decode forecast response for {0}")]
    Decode(String, #[source] reqwest::Error),
}
