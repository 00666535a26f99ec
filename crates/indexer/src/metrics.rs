use prometheus_client::metrics::counter::Counter;
use prometheus_client::metrics::gauge::Gauge;
use prometheus_client::registry::Registry;
use std::sync::atomic::AtomicU64;


lazy_static::lazy_static! {
    pub static ref BLOCKS_READ: Counter = Default::default();
    pub static ref TX_RECORDS_QUEUED: Counter = Default::default();

    pub static ref TX_BATCHES_WRITTEN: Counter = Default::default();
    pub static ref TX_RECORDS_WRITTEN: Counter = Default::default();
    pub static ref TX_WRITE_ERRORS: Counter = Default::default();

    pub static ref BLOCKS_UPLOADED: Counter = Default::default();
    pub static ref BLOCKS_ALREADY_UPLOADED: Counter = Default::default();
    pub static ref BLOCK_BYTES_UPLOADED: Counter = Default::default();
    pub static ref BLOCK_UPLOAD_ERRORS: Counter = Default::default();

    pub static ref UNITS_PENDING: Gauge = Default::default();
    pub static ref PROGRESS: Gauge<f64, AtomicU64> = Default::default();
    pub static ref LAST_SAVED_FILE: Gauge = Default::default();
    pub static ref LAST_SAVED_OFFSET: Gauge = Default::default();
}


pub fn register_metrics(registry: &mut Registry) {
    registry.register(
        "sqd_blocks_read",
        "Number of blocks read from the block store",
        BLOCKS_READ.clone()
    );
    registry.register(
        "sqd_tx_records_queued",
        "Number of transaction index records produced",
        TX_RECORDS_QUEUED.clone()
    );
    registry.register(
        "sqd_tx_batches_written",
        "Number of transaction batches written to the table store",
        TX_BATCHES_WRITTEN.clone()
    );
    registry.register(
        "sqd_tx_records_written",
        "Number of transaction index records written to the table store",
        TX_RECORDS_WRITTEN.clone()
    );
    registry.register(
        "sqd_tx_write_errors",
        "Number of failed transaction batch write attempts",
        TX_WRITE_ERRORS.clone()
    );
    registry.register(
        "sqd_blocks_uploaded",
        "Number of blocks uploaded to the blob store",
        BLOCKS_UPLOADED.clone()
    );
    registry.register(
        "sqd_blocks_already_uploaded",
        "Number of blocks found already present in the blob store",
        BLOCKS_ALREADY_UPLOADED.clone()
    );
    registry.register(
        "sqd_block_bytes_uploaded",
        "Number of padded block bytes uploaded",
        BLOCK_BYTES_UPLOADED.clone()
    );
    registry.register(
        "sqd_block_upload_errors",
        "Number of failed block upload attempts",
        BLOCK_UPLOAD_ERRORS.clone()
    );
    registry.register(
        "sqd_units_pending",
        "Number of work units queued or being written",
        UNITS_PENDING.clone()
    );
    registry.register(
        "sqd_progress_blocks_per_second",
        "Overall block processing speed",
        PROGRESS.clone()
    );
    registry.register(
        "sqd_last_saved_file",
        "Block file index of the last saved checkpoint",
        LAST_SAVED_FILE.clone()
    );
    registry.register(
        "sqd_last_saved_offset",
        "Byte offset of the last saved checkpoint",
        LAST_SAVED_OFFSET.clone()
    );
}
