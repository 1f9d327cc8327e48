pub mod auth;
pub mod extract;
pub mod response;
pub mod role;

pub use auth::{jwt_auth_middleware, AuthUser};
pub use extract::{ApiJson, ApiQuery};
pub use response::{ApiResponse, ApiResult};
pub use role::{ensure_role, require_admin, require_instructor, ValidatedUser};
