mod identity;
mod jwks;
mod validator;

pub mod guards;
pub mod model;

pub use identity::{bearer_token, IdentityResolver};
pub use jwks::JwksClient;
pub use validator::JwtValidator;
