use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, ProductId};

use super::{DocumentKind, DocumentPayload, checked, ensure_non_negative};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceivingLine {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub ordered_quantity: Decimal,
    pub received_quantity: Decimal,
}

impl ReceivingLine {
    /// Received minus ordered: negative for a short delivery, positive for an
    /// over-delivery.
    pub fn variance(&self) -> Decimal {
        self.received_quantity - self.ordered_quantity
    }

    /// Quantity still missing; zero when the order was met or exceeded.
    pub fn shortfall(&self) -> Decimal {
        (self.ordered_quantity - self.received_quantity).max(Decimal::ZERO)
    }
}

/// Goods physically received from a supplier delivery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsReceiving {
    pub supplier: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference: Option<String>,
    pub lines: Vec<ReceivingLine>,
}

impl GoodsReceiving {
    /// Lines where the delivery did not match the order.
    pub fn discrepancies(&self) -> Vec<&ReceivingLine> {
        self.lines.iter().filter(|l| !l.variance().is_zero()).collect()
    }

    pub fn total_received(&self) -> DomainResult<Decimal> {
        self.lines.iter().try_fold(Decimal::ZERO, |acc, line| {
            checked("total received", acc.checked_add(line.received_quantity))
        })
    }
}

impl DocumentPayload for GoodsReceiving {
    fn kind(&self) -> DocumentKind {
        DocumentKind::GoodsReceiving
    }

    fn validate(&self) -> DomainResult<()> {
        if self.supplier.trim().is_empty() {
            return Err(DomainError::validation("supplier cannot be empty"));
        }
        if self.lines.is_empty() {
            return Err(DomainError::validation("a receiving needs at least one line"));
        }
        for line in &self.lines {
            if line.product_name.trim().is_empty() {
                return Err(DomainError::validation("line product name cannot be empty"));
            }
            ensure_non_negative("ordered quantity", line.ordered_quantity)?;
            ensure_non_negative("received quantity", line.received_quantity)?;
        }
        self.total_received().map(|_| ())
    }
}
