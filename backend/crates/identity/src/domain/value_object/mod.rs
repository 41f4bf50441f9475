//! Value Object Module

pub mod email;
pub mod token_purpose;
