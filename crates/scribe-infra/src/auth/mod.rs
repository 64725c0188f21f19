//! Bearer token validation for blog users.

mod jwt;

pub use jwt::{JwtConfig, JwtTokenService};
