pub mod error;
pub mod master_log;
pub mod snapshot;
pub mod store;
pub mod table_io;
