use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult, ProductId};

use super::{DocumentKind, DocumentPayload, PriceRevision, checked, ensure_non_negative};

/// Costs on top of the buying price, spread over the received quantity.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AdditionalCosts {
    pub taxes: Decimal,
    pub shipping: Decimal,
    pub transport: Decimal,
    pub labor: Decimal,
    pub transfer_fees: Decimal,
    pub other: Decimal,
}

impl AdditionalCosts {
    pub fn total(&self) -> DomainResult<Decimal> {
        self.fields().into_iter().try_fold(Decimal::ZERO, |acc, (_, value)| {
            checked("additional costs", acc.checked_add(value))
        })
    }

    fn fields(&self) -> [(&'static str, Decimal); 6] {
        [
            ("taxes", self.taxes),
            ("shipping", self.shipping),
            ("transport", self.transport),
            ("labor", self.labor),
            ("transfer_fees", self.transfer_fees),
            ("other", self.other),
        ]
    }
}

/// Landed-cost calculation for one batch of goods.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GoodsCosting {
    /// Product whose cost/price is revised on acceptance.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product_id: Option<ProductId>,
    pub product_name: String,
    pub quantity: Decimal,
    pub buying_unit_price: Decimal,
    #[serde(default)]
    pub additional_costs: AdditionalCosts,
    pub margin_percentage: Decimal,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CostingBreakdown {
    pub total_buying: Decimal,
    pub total_additional_costs: Decimal,
    pub total_landed_cost: Decimal,
    pub unit_cost: Decimal,
    pub suggested_selling_price: Decimal,
}

impl GoodsCosting {
    /// Landed cost, unit cost and suggested price. Fails instead of overflowing.
    pub fn breakdown(&self) -> DomainResult<CostingBreakdown> {
        let total_buying = checked(
            "total buying",
            self.quantity.checked_mul(self.buying_unit_price),
        )?;
        let total_additional_costs = self.additional_costs.total()?;
        let total_landed_cost = checked(
            "total landed cost",
            total_buying.checked_add(total_additional_costs),
        )?;
        let unit_cost = if self.quantity.is_zero() {
            Decimal::ZERO
        } else {
            checked("unit cost", total_landed_cost.checked_div(self.quantity))?
        };
        let markup = checked(
            "margin percentage",
            (self.margin_percentage / Decimal::ONE_HUNDRED).checked_add(Decimal::ONE),
        )?;
        let suggested_selling_price =
            checked("suggested selling price", unit_cost.checked_mul(markup))?;

        Ok(CostingBreakdown {
            total_buying,
            total_additional_costs,
            total_landed_cost,
            unit_cost,
            suggested_selling_price,
        })
    }
}

impl DocumentPayload for GoodsCosting {
    fn kind(&self) -> DocumentKind {
        DocumentKind::GoodsCosting
    }

    fn validate(&self) -> DomainResult<()> {
        if self.product_name.trim().is_empty() {
            return Err(DomainError::validation("product name cannot be empty"));
        }
        ensure_non_negative("quantity", self.quantity)?;
        ensure_non_negative("buying unit price", self.buying_unit_price)?;
        ensure_non_negative("margin percentage", self.margin_percentage)?;
        for (field, value) in self.additional_costs.fields() {
            ensure_non_negative(field, value)?;
        }
        // A zero quantity would revise the product to a zero cost.
        if self.product_id.is_some() && self.quantity.is_zero() {
            return Err(DomainError::validation(
                "a costing linked to a product needs a positive quantity",
            ));
        }
        self.breakdown().map(|_| ())
    }

    fn acceptance_effect(&self) -> DomainResult<Option<PriceRevision>> {
        let Some(product_id) = self.product_id else {
            return Ok(None);
        };
        let breakdown = self.breakdown()?;
        Ok(Some(PriceRevision {
            product_id,
            cost_price: breakdown.unit_cost,
            price: breakdown.suggested_selling_price,
        }))
    }
}
