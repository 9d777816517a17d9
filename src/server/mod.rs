mod error;
mod handlers;
mod router;
mod state;

pub use error::{ApiError, ApiResult};
pub use handlers::{AnalyzeResponse, HealthCheckResponse, VerdictResponse};
pub use router::create_router;
pub use state::AppState;
