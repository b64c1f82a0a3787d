use cqa_core::domain::SalaryEstimate;
use cqa_core::error::AppError;

pub mod salary;

pub use salary::{Backoff, DuckDuckGoLite, SalaryOptions, SalaryTool, WebSearch};

/// An external numeric lookup the router can delegate to.
pub trait NumericTool {
    fn name(&self) -> &str;
    fn estimate(&self, query: &str) -> Result<SalaryEstimate, AppError>;
}
