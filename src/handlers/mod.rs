pub mod answer;
pub mod auth;
pub mod language;
pub mod login_history;
pub mod password_reset;
pub mod post;
pub mod question;
pub mod reward;
pub mod subscription;
pub mod user;

pub use auth::*;
