//! Template rendering module
//!
//! Templates are plain HTML files containing `{%NAME%}` placeholders. They are
//! loaded once at startup and rendered by pure substitution; no template engine
//! is involved.

mod placeholder;

use std::path::Path;
use tokio::fs;

use crate::logger;
use crate::store::Product;

pub use placeholder::Placeholder;

/// Placeholder in the overview template receiving the rendered cards
pub const PRODUCT_CARDS: &str = "{%PRODUCT_CARDS%}";

/// Replace every product placeholder in `template` with the product's attributes.
///
/// Substitution happens in a single pass, so text inserted from a product is
/// never itself scanned for placeholders. Unknown `{%...%}` tokens are kept
/// verbatim.
pub fn render(template: &str, product: &Product) -> String {
    let mut output = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{%") {
        output.push_str(&rest[..start]);
        let candidate = &rest[start..];
        match Placeholder::ALL
            .iter()
            .find(|placeholder| candidate.starts_with(placeholder.token()))
        {
            Some(placeholder) => {
                output.push_str(&placeholder.value(product));
                rest = &candidate[placeholder.token().len()..];
            }
            None => {
                output.push_str("{%");
                rest = &candidate[2..];
            }
        }
    }
    output.push_str(rest);
    output
}

/// Render one card per product, in store order, with no separator
pub fn render_cards(card_template: &str, products: &[Product]) -> String {
    products
        .iter()
        .map(|product| render(card_template, product))
        .collect()
}

/// Templates loaded at startup, read-only afterwards
#[derive(Debug, Clone)]
pub struct Templates {
    pub overview: String,
    pub card: String,
    pub product: String,
    pub admin: String,
}

impl Templates {
    /// Load `overview.html`, `card.html`, `product.html` and `admin.html`
    /// from `dir`. A missing file is replaced by an inline error page.
    pub async fn load(dir: &Path) -> Self {
        Self {
            overview: load_template(dir, "overview.html").await,
            card: load_template(dir, "card.html").await,
            product: load_template(dir, "product.html").await,
            admin: load_template(dir, "admin.html").await,
        }
    }

    /// Listing page with every product rendered as a card
    pub fn render_overview(&self, products: &[Product]) -> String {
        let cards = render_cards(&self.card, products);
        self.overview.replacen(PRODUCT_CARDS, &cards, 1)
    }

    /// Detail page for a single product
    pub fn render_product(&self, product: &Product) -> String {
        render(&self.product, product)
    }
}

async fn load_template(dir: &Path, name: &str) -> String {
    let path = dir.join(name);
    match fs::read_to_string(&path).await {
        Ok(content) => content,
        Err(e) => {
            logger::log_error(&format!(
                "Failed to load template '{}': {e}",
                path.display()
            ));
            format!("<h1>Template Error: {name} not found</h1>")
        }
    }
}
