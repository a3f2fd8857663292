pub mod background;
pub mod panel;

pub use background::{BackgroundTask, TaskResult};
pub use panel::{Panel, StatusSink, sort_entries};
