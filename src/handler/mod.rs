//! Request handler module
//!
//! Routes requests to the HTML pages, the JSON product API and static files.

pub mod pages;
pub mod products;
pub mod router;
pub mod static_files;

// Re-export main entry point
pub use router::handle_request;
pub use static_files::ensure_public_dirs;

#[cfg(test)]
mod tests;
