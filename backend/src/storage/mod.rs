pub mod text;
pub mod traits;

pub use text::{TextConnection, TextStudentRepository};
pub use traits::{LoadReport, SkippedLine, StudentStorage};
