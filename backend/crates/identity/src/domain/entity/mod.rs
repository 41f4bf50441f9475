//! Entity Module

pub mod auth_session;
pub mod external_login;
pub mod user;
pub mod user_token;
