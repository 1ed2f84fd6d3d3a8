pub mod report;
pub mod result;
pub mod severity;
pub mod status;

pub use report::*;
pub use result::{ResultSink, RuleResult};
pub use severity::Severity;
pub use status::ResultStatus;
