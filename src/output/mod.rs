pub mod console;
pub mod events;
pub mod report;
pub mod writer_json;

pub use events::{EventSink, HostSource, ScanEvent};
pub use report::{Finding, FindingCategory, FindingKind, HostOutcome, Report, SharedReport, WordPressSite};
pub use writer_json::{read_report, report_file_name, write_report};
