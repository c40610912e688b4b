mod extraction;
mod types;

pub use extraction::{ExtractionError, ExtractionResultExt, ModelLoadError};
pub use types::{AppError, AppResult};
