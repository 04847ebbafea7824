//! Command handlers for the docqa CLI.

pub mod chat;
pub mod ingest;
pub mod reset;
pub mod serve;

pub use chat::ChatCommand;
pub use ingest::IngestCommand;
pub use reset::ResetCommand;
pub use serve::ServeCommand;
