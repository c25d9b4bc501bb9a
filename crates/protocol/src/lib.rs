pub mod constants;
pub mod envelope;
pub mod messages;
pub mod types;

// Re-export primary types for convenience.
pub use constants::CheckCode;
pub use envelope::{ApiError, ApiResponse};
pub use messages::{FileUploadInfo, UploadUrls};
pub use types::FileRecord;
