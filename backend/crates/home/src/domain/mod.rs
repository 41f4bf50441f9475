//! Domain Layer

pub mod error_view_model;
