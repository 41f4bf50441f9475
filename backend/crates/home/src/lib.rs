//! Home Module
//!
//! The public pages of the site and the error page.
//!
//! - `domain/` - [`ErrorViewModel`]
//! - `presentation/` - handlers, page rendering, conventional routing
//!
//! Routes follow the `{controller=Home}/{action=Index}/{id?}` convention:
//! `/`, `/Home`, `/Home/Privacy`, `/Home/Error`, optionally with a trailing id.

pub mod domain;
pub mod presentation;

pub use domain::error_view_model::ErrorViewModel;
pub use presentation::handlers::render_error_page;
pub use presentation::router::home_router;

#[cfg(test)]
mod tests;
