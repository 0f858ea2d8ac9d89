//! Routing module
//!
//! Maps a request method and path onto a handler action through an ordered,
//! declarative route table:
//! - Exact paths for pages and the collection endpoint
//! - A single path parameter for `/api/products/<id>`
//! - Extension patterns for images and static assets

mod matcher;
mod table;

pub use matcher::{match_route, Matched};
pub use table::{RouteAction, ROUTES};
