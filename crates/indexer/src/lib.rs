pub mod batcher;
pub mod checkpoint;
pub mod config;
pub mod driver;
pub mod importer;
pub mod metrics;
pub mod progress;
pub mod queue;
pub mod record;
pub mod server;
pub mod writer;
