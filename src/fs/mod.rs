//! Filesystem module

pub mod entry;
pub mod ls_parser;
pub mod ops;
pub mod unix_path;
pub mod utils;

pub use entry::FileEntry;
pub use ls_parser::ListingParser;
pub use ops::read_directory;
