pub mod password;
pub mod random;

pub use password::{generate_password, verify_password};
pub use random::{random_bytes, refresh_token_value};
