pub mod file_sweeper;
pub mod wordpress;

pub use file_sweeper::FileSweeper;
pub use wordpress::{Classification, WordPressDetector};
