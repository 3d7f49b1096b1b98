pub mod middleware;
pub mod password;
pub mod token;
pub mod validation;

pub use middleware::RequireUser;
pub use password::{hash_password, verify_password};
pub use token::{Claims, TokenKeys};
pub use validation::{normalize_email, require_content, validate_login, validate_registration};
