//! HTTP protocol layer module
//!
//! Content types and response builders shared by every handler.

pub mod mime;
pub mod response;

pub use response::{
    build_empty_response, build_file_response, build_html_response, build_json_response,
    build_redirect_response, strip_body, with_server_header, HttpResponse,
};
