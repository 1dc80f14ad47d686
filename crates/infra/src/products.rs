//! Product cost/price sink fed by accepted goods costings.

use std::collections::BTreeMap;

use parking_lot::RwLock;
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use bazaar_core::ProductId;
use bazaar_workflow::PriceRevision;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PriceSinkError {
    #[error("unknown product {0}")]
    UnknownProduct(ProductId),

    #[error("price sink unavailable: {0}")]
    Unavailable(String),
}

/// Collaborator that owns product prices.
///
/// `apply` returns the prices it replaced so the caller can `restore` them if
/// the surrounding transition fails to commit.
pub trait PriceSink: Send + Sync {
    fn apply(&self, revision: &PriceRevision) -> Result<PriceRevision, PriceSinkError>;

    fn restore(&self, previous: &PriceRevision) -> Result<(), PriceSinkError>;
}

impl<T> PriceSink for std::sync::Arc<T>
where
    T: PriceSink + ?Sized,
{
    fn apply(&self, revision: &PriceRevision) -> Result<PriceRevision, PriceSinkError> {
        (**self).apply(revision)
    }

    fn restore(&self, previous: &PriceRevision) -> Result<(), PriceSinkError> {
        (**self).restore(previous)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    pub cost_price: Decimal,
    pub price: Decimal,
    /// Number of accepted costings applied to this product.
    #[serde(default)]
    pub revisions: u32,
}

impl Product {
    pub fn new(name: impl Into<String>, cost_price: Decimal, price: Decimal) -> Self {
        Self {
            id: ProductId::new(),
            name: name.into(),
            cost_price,
            price,
            revisions: 0,
        }
    }
}

#[derive(Debug, Default)]
pub struct InMemoryProductCatalog {
    products: RwLock<BTreeMap<ProductId, Product>>,
}

impl InMemoryProductCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&self, product: Product) -> ProductId {
        let id = product.id;
        self.products.write().insert(id, product);
        id
    }

    pub fn get(&self, id: ProductId) -> Option<Product> {
        self.products.read().get(&id).cloned()
    }
}

impl PriceSink for InMemoryProductCatalog {
    fn apply(&self, revision: &PriceRevision) -> Result<PriceRevision, PriceSinkError> {
        let mut products = self.products.write();
        let product = products
            .get_mut(&revision.product_id)
            .ok_or(PriceSinkError::UnknownProduct(revision.product_id))?;

        let previous = PriceRevision {
            product_id: product.id,
            cost_price: product.cost_price,
            price: product.price,
        };
        product.cost_price = revision.cost_price;
        product.price = revision.price;
        product.revisions += 1;

        info!(
            product_id = %product.id,
            cost_price = %product.cost_price,
            price = %product.price,
            "product prices revised"
        );
        Ok(previous)
    }

    fn restore(&self, previous: &PriceRevision) -> Result<(), PriceSinkError> {
        let mut products = self.products.write();
        let product = products
            .get_mut(&previous.product_id)
            .ok_or(PriceSinkError::UnknownProduct(previous.product_id))?;

        product.cost_price = previous.cost_price;
        product.price = previous.price;
        product.revisions = product.revisions.saturating_sub(1);
        Ok(())
    }
}
