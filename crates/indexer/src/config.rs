use crate::driver::DriverOptions;
use crate::writer::RetryPolicy;
use anyhow::{ensure, Context};
use serde::Deserialize;
use sqd_block_store::Network;
use sqd_storage::TransportConfig;
use std::path::{Path, PathBuf};
use std::time::Duration;


#[derive(Debug, Copy, Clone, Default, Eq, PartialEq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkName {
    #[default]
    Main,
    Test,
    Regtest
}


impl From<NetworkName> for Network {
    fn from(value: NetworkName) -> Self {
        match value {
            NetworkName::Main => Network::Main,
            NetworkName::Test => Network::Test,
            NetworkName::Regtest => Network::Regtest
        }
    }
}


#[derive(Debug, Clone, Deserialize)]
pub struct ImporterConfig {
    /// Directory with `blkNNNNN.dat` files
    pub block_dir: PathBuf,
    #[serde(default)]
    pub network: NetworkName,
    /// Rocksdb directory backing the transaction table
    pub table_db: Option<PathBuf>,
    #[serde(default = "default_table")]
    pub table: String,
    /// Local directory or `s3://bucket[/prefix]`
    pub blob_dest: Option<String>,
    #[serde(default = "default_container")]
    pub container: String,
    #[serde(default = "default_progress_file")]
    pub progress_file: PathBuf,
    #[serde(default = "default_workers")]
    pub workers: usize,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,
    #[serde(default = "default_checkpoint_interval_secs")]
    pub checkpoint_interval_secs: u64,
    #[serde(default = "default_retry_backoff_secs")]
    pub retry_backoff_secs: u64,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64
}


fn default_table() -> String {
    "transactions".to_string()
}


fn default_container() -> String {
    "nbitcoinindexer".to_string()
}


fn default_progress_file() -> PathBuf {
    PathBuf::from("progress.dat")
}


fn default_workers() -> usize {
    8
}


fn default_queue_capacity() -> usize {
    20
}


fn default_checkpoint_interval_secs() -> u64 {
    300
}


fn default_retry_backoff_secs() -> u64 {
    5
}


fn default_request_timeout_secs() -> u64 {
    60
}


impl ImporterConfig {
    pub fn read(file: impl AsRef<Path>) -> anyhow::Result<Self> {
        let file = file.as_ref();
        let config: Self = serde_json::from_reader(
            std::io::BufReader::new(
                std::fs::File::open(file).with_context(|| {
                    format!("failed to open {}", file.display())
                })?
            )
        ).with_context(|| format!("failed to parse {}", file.display()))?;
        config.validate().context("invalid config")?;
        Ok(config)
    }

    pub fn validate(&self) -> anyhow::Result<()> {
        ensure!(self.workers > 0, "workers must be positive");
        ensure!(self.queue_capacity > 0, "queue_capacity must be positive");
        ensure!(self.checkpoint_interval_secs > 0, "checkpoint_interval_secs must be positive");
        ensure!(self.request_timeout_secs > 0, "request_timeout_secs must be positive");
        ensure!(!self.table.is_empty(), "table name can't be empty");
        ensure!(!self.container.is_empty(), "container name can't be empty");
        ensure!(
            !self.progress_file.as_os_str().is_empty(),
            "progress_file can't be empty"
        );
        Ok(())
    }

    pub fn driver_options(&self) -> DriverOptions {
        DriverOptions {
            workers: self.workers,
            queue_capacity: self.queue_capacity,
            checkpoint_interval: Duration::from_secs(self.checkpoint_interval_secs)
        }
    }

    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            backoff: Duration::from_secs(self.retry_backoff_secs)
        }
    }

    pub fn transport(&self) -> TransportConfig {
        let timeout = Duration::from_secs(self.request_timeout_secs);
        TransportConfig {
            operation_timeout: timeout,
            attempt_timeout: timeout,
            ..TransportConfig::default()
        }
    }
}


#[cfg(test)]
mod test {
    use super::*;


    fn parse(json: &str) -> anyhow::Result<ImporterConfig> {
        let config: ImporterConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    #[test]
    fn defaults() {
        let config = parse(r#"{"block_dir": "/data/blocks"}"#).unwrap();
        assert_eq!(config.network, NetworkName::Main);
        assert_eq!(config.table, "transactions");
        assert_eq!(config.container, "nbitcoinindexer");
        assert_eq!(config.progress_file, PathBuf::from("progress.dat"));
        assert!(config.table_db.is_none());
        assert!(config.blob_dest.is_none());

        let options = config.driver_options();
        assert_eq!(options.workers, 8);
        assert_eq!(options.queue_capacity, 20);
        assert_eq!(options.checkpoint_interval, Duration::from_secs(300));
        assert_eq!(config.retry_policy(), RetryPolicy::default());
        assert_eq!(config.transport().max_attempts, 1);
    }

    #[test]
    fn networks() {
        let config = parse(r#"{"block_dir": "b", "network": "regtest"}"#).unwrap();
        assert_eq!(Network::from(config.network), Network::Regtest);
        assert!(parse(r#"{"block_dir": "b", "network": "litecoin"}"#).is_err());
    }

    #[test]
    fn invalid_values() {
        assert!(parse(r#"{}"#).is_err());
        assert!(parse(r#"{"block_dir": "b", "workers": 0}"#).is_err());
        assert!(parse(r#"{"block_dir": "b", "queue_capacity": 0}"#).is_err());
        assert!(parse(r#"{"block_dir": "b", "table": ""}"#).is_err());
    }
}
