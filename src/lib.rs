//! adb-commander - dual-pane file manager core for a local disk and an
//! Android device reached through adb

pub mod config;
pub mod errors;
pub mod fs;
pub mod ops;
pub mod providers;
pub mod state;
pub mod utils;
