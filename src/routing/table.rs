//! Declarative route table
//!
//! Routes are consulted in order; the first match wins.

use crate::error::ErrorFormat;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MethodMatch {
    /// GET, and HEAD with the body stripped
    Get,
    Post,
    Put,
    Delete,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathMatch {
    Exact(&'static str),
    /// A single non-empty segment following the prefix
    Param(&'static str),
    Prefix(&'static str),
    /// `/<alphanumeric>.<image extension>`
    DirectImage,
    /// Any path ending in a recognized static extension
    StaticExtension,
}

/// What a matched request is dispatched to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RouteAction {
    Favicon,
    Overview,
    ProductPage,
    AdminPage,
    CreateProduct,
    ListProducts,
    GetProduct,
    UpdateProduct,
    DeleteProduct,
    PublicFile,
    DirectImage,
    StaticAsset,
}

impl RouteAction {
    /// API routes answer errors with JSON, everything else with HTML
    pub const fn error_format(self) -> ErrorFormat {
        match self {
            Self::CreateProduct
            | Self::ListProducts
            | Self::GetProduct
            | Self::UpdateProduct
            | Self::DeleteProduct => ErrorFormat::Json,
            _ => ErrorFormat::Html,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub method: MethodMatch,
    pub path: PathMatch,
    pub action: RouteAction,
}

const fn route(method: MethodMatch, path: PathMatch, action: RouteAction) -> Route {
    Route {
        method,
        path,
        action,
    }
}

pub const ROUTES: &[Route] = &[
    route(MethodMatch::Get, PathMatch::Exact("/favicon.ico"), RouteAction::Favicon),
    route(MethodMatch::Get, PathMatch::Exact("/"), RouteAction::Overview),
    route(MethodMatch::Get, PathMatch::Exact("/overview"), RouteAction::Overview),
    route(MethodMatch::Get, PathMatch::Exact("/product"), RouteAction::ProductPage),
    route(MethodMatch::Get, PathMatch::Exact("/admin"), RouteAction::AdminPage),
    route(MethodMatch::Post, PathMatch::Exact("/api/products"), RouteAction::CreateProduct),
    route(MethodMatch::Get, PathMatch::Exact("/api/products"), RouteAction::ListProducts),
    route(MethodMatch::Get, PathMatch::Param("/api/products/"), RouteAction::GetProduct),
    route(MethodMatch::Put, PathMatch::Param("/api/products/"), RouteAction::UpdateProduct),
    route(MethodMatch::Delete, PathMatch::Param("/api/products/"), RouteAction::DeleteProduct),
    route(MethodMatch::Get, PathMatch::Prefix("/public/"), RouteAction::PublicFile),
    route(MethodMatch::Get, PathMatch::DirectImage, RouteAction::DirectImage),
    route(MethodMatch::Get, PathMatch::StaticExtension, RouteAction::StaticAsset),
];
