pub mod csv;
pub mod json;

pub use json::{RunSummary, SummaryRecorder};
