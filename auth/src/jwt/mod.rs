pub mod claims;
pub mod errors;
pub mod handler;
pub mod manager;

pub use claims::Claims;
pub use claims::TokenKind;
pub use errors::JwtError;
pub use handler::extract_bearer_token;
pub use handler::has_token_format;
pub use handler::inspect_header;
pub use handler::parse_algorithm;
pub use handler::JwtHandler;
pub use manager::JwtConfig;
pub use manager::TokenInfo;
pub use manager::TokenManager;
pub use manager::TokenPair;
