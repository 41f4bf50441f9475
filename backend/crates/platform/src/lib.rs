//! Platform Crate - Technical Infrastructure
//!
//! Shared technical foundations used by the web app and its feature crates:
//! - Cryptographic utilities (SHA-256, HMAC, random tokens)
//! - Password policy and hashing (Argon2id)
//! - Cookie building and parsing
//! - HTML escaping for rendered pages and email bodies
//! - Request trace context (trace identifier, W3C `traceparent`)

pub mod cookie;
pub mod crypto;
pub mod html;
pub mod password;
pub mod trace;
