pub mod commands;
pub mod extractor;
pub mod jwt;
pub mod model;
pub mod password;

pub use extractor::{AdminUser, AuthUser};
