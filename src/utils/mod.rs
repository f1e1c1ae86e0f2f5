pub mod client;
pub mod jwt;
pub mod otp;
pub mod password;
pub mod time_window;

pub use client::ClientInfo;
pub use jwt::encode_token;
pub use password::{hash_password, verify_password};
