pub mod error;
pub mod normalizer;
