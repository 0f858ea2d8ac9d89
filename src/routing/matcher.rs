//! Route matching module
//!
//! Implements method and path matching over the ordered route table.

use hyper::Method;

use super::table::{MethodMatch, PathMatch, Route, RouteAction};
use crate::http::mime;

/// A matched route and the part of the path its matcher captured
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Matched<'a> {
    pub action: RouteAction,
    /// Path parameter, remainder after a prefix, or the file path of a static route
    pub capture: &'a str,
}

/// Find the first route matching `method` and `path`
pub fn match_route<'a>(method: &Method, path: &'a str, routes: &[Route]) -> Option<Matched<'a>> {
    routes.iter().find_map(|route| {
        if !match_method(route.method, method) {
            return None;
        }
        match_path(&route.path, path).map(|capture| Matched {
            action: route.action,
            capture,
        })
    })
}

/// HEAD is answered by the GET routes
pub fn match_method(rule: MethodMatch, method: &Method) -> bool {
    match rule {
        MethodMatch::Get => method == Method::GET || method == Method::HEAD,
        MethodMatch::Post => method == Method::POST,
        MethodMatch::Put => method == Method::PUT,
        MethodMatch::Delete => method == Method::DELETE,
    }
}

/// Check a path against a rule, returning what the rule captures
pub fn match_path<'a>(rule: &PathMatch, path: &'a str) -> Option<&'a str> {
    match rule {
        PathMatch::Exact(exact) => (path == *exact).then_some(""),
        PathMatch::Param(prefix) => path
            .strip_prefix(*prefix)
            .filter(|segment| !segment.is_empty() && !segment.contains('/')),
        PathMatch::Prefix(prefix) => path.strip_prefix(*prefix),
        PathMatch::DirectImage => {
            let file = path.strip_prefix('/')?;
            let (stem, ext) = file.split_once('.')?;
            let is_direct = !stem.is_empty()
                && stem.bytes().all(|b| b.is_ascii_alphanumeric())
                && mime::is_image_extension(ext);
            is_direct.then_some(file)
        }
        PathMatch::StaticExtension => {
            let ext = mime::extension_of(path)?;
            mime::is_static_extension(ext).then(|| path.trim_start_matches('/'))
        }
    }
}
