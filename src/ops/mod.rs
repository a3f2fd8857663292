//! Operations spanning one or two panels

pub mod transfer;

pub use transfer::{FileOperation, JobProgress, TransferItem, TransferJob, create_directory, run_job};
