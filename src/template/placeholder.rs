//! Placeholder table shared by every product template

use std::borrow::Cow;

use crate::store::Product;

/// A product placeholder and the attribute it is replaced with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placeholder {
    ProductName,
    Image,
    Price,
    From,
    EnergySavings,
    Quantity,
    Description,
    Specifications,
    Id,
    NotEco,
}

impl Placeholder {
    pub const ALL: [Self; 10] = [
        Self::ProductName,
        Self::Image,
        Self::Price,
        Self::From,
        Self::EnergySavings,
        Self::Quantity,
        Self::Description,
        Self::Specifications,
        Self::Id,
        Self::NotEco,
    ];

    pub const fn token(self) -> &'static str {
        match self {
            Self::ProductName => "{%PRODUCTNAME%}",
            Self::Image => "{%IMAGE%}",
            Self::Price => "{%PRICE%}",
            Self::From => "{%FROM%}",
            Self::EnergySavings => "{%ENERGY_SAVINGS%}",
            Self::Quantity => "{%QUANTITY%}",
            Self::Description => "{%DESCRIPTION%}",
            Self::Specifications => "{%SPECIFICATIONS%}",
            Self::Id => "{%ID%}",
            Self::NotEco => "{%NOT_ECO%}",
        }
    }

    /// Substituted text; absent attributes render as an empty string
    pub fn value(self, product: &Product) -> Cow<'_, str> {
        match self {
            Self::ProductName => Cow::Borrowed(&product.product_name),
            Self::Image => Cow::Borrowed(product.image_url.as_deref().unwrap_or_default()),
            Self::Price => Cow::Owned(product.price.to_string()),
            Self::From => Cow::Borrowed(&product.origin),
            Self::EnergySavings => Cow::Borrowed(&product.energy_savings),
            Self::Quantity => Cow::Borrowed(&product.quantity),
            Self::Description => Cow::Borrowed(&product.description),
            Self::Specifications => {
                Cow::Borrowed(product.specifications.as_deref().unwrap_or_default())
            }
            Self::Id => Cow::Owned(product.id.to_string()),
            Self::NotEco => Cow::Borrowed(if product.eco { "" } else { "not-eco" }),
        }
    }
}
