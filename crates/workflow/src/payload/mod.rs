//! Type-specific document contents.
//!
//! The state machine is shared; what differs per document type is the payload,
//! its validation, which workflow roles drive it, and the linked mutation (if
//! any) that must land together with acceptance.

mod cash_count;
mod costing;
mod receiving;

pub use cash_count::{CashCount, DenominationCount};
pub use costing::{AdditionalCosts, CostingBreakdown, GoodsCosting};
pub use receiving::{GoodsReceiving, ReceivingLine};

use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_auth::{FinanceAction, InventoryAction, Permission};
use bazaar_core::{DomainError, DomainResult, ProductId};

use crate::document::Transition;
use crate::registry::WorkflowRoleKey;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentKind {
    CashCount,
    GoodsCosting,
    GoodsReceiving,
}

impl DocumentKind {
    pub const ALL: &'static [DocumentKind] = &[
        DocumentKind::CashCount,
        DocumentKind::GoodsCosting,
        DocumentKind::GoodsReceiving,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            DocumentKind::CashCount => "cash_count",
            DocumentKind::GoodsCosting => "goods_costing",
            DocumentKind::GoodsReceiving => "goods_receiving",
        }
    }

    /// Duty that creates and submits the document.
    pub fn author_role(self) -> WorkflowRoleKey {
        match self {
            DocumentKind::CashCount => WorkflowRoleKey::CashCounter,
            DocumentKind::GoodsCosting => WorkflowRoleKey::CostingManager,
            DocumentKind::GoodsReceiving => WorkflowRoleKey::ReceivingClerk,
        }
    }

    pub fn verifier_role(self) -> WorkflowRoleKey {
        match self {
            DocumentKind::CashCount => WorkflowRoleKey::CashVerifier,
            DocumentKind::GoodsCosting => WorkflowRoleKey::CostingVerifier,
            DocumentKind::GoodsReceiving => WorkflowRoleKey::ReceivingVerifier,
        }
    }

    pub fn approver_role(self) -> WorkflowRoleKey {
        match self {
            DocumentKind::CashCount => WorkflowRoleKey::CashApprover,
            DocumentKind::GoodsCosting => WorkflowRoleKey::CostingApprover,
            DocumentKind::GoodsReceiving => WorkflowRoleKey::ReceivingApprover,
        }
    }

    /// Workflow role required for `transition`.
    pub fn required_role(self, transition: Transition) -> WorkflowRoleKey {
        match transition {
            Transition::Submit => self.author_role(),
            Transition::CounterSign => self.verifier_role(),
            Transition::Approve | Transition::Reject => self.approver_role(),
        }
    }

    /// Whether Owner/Admin may stand in for the required role.
    pub fn admin_may_stand_in(transition: Transition) -> bool {
        !matches!(transition, Transition::CounterSign)
    }

    /// Catalog permission guarding `transition` when access gating is on.
    pub fn permission_for(self, transition: Transition) -> Permission {
        match (self, transition) {
            (DocumentKind::CashCount, Transition::Submit) => FinanceAction::CreateCashCount.into(),
            (DocumentKind::CashCount, Transition::CounterSign) => FinanceAction::VerifyCashCount.into(),
            (DocumentKind::CashCount, _) => FinanceAction::ApproveCashCount.into(),
            (DocumentKind::GoodsCosting, Transition::Submit) => InventoryAction::CreateCosting.into(),
            (DocumentKind::GoodsCosting, Transition::CounterSign) => {
                InventoryAction::VerifyCosting.into()
            }
            (DocumentKind::GoodsCosting, _) => InventoryAction::ApproveCosting.into(),
            (DocumentKind::GoodsReceiving, Transition::Submit) => {
                InventoryAction::CreateReceiving.into()
            }
            (DocumentKind::GoodsReceiving, Transition::CounterSign) => {
                InventoryAction::VerifyReceiving.into()
            }
            (DocumentKind::GoodsReceiving, _) => InventoryAction::ApproveReceiving.into(),
        }
    }
}

impl core::fmt::Display for DocumentKind {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Request to update a product's cost and selling price.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PriceRevision {
    pub product_id: ProductId,
    pub cost_price: Decimal,
    pub price: Decimal,
}

/// Contract every document payload fulfils.
pub trait DocumentPayload: Clone + core::fmt::Debug + PartialEq + Send + Sync + 'static {
    fn kind(&self) -> DocumentKind;

    fn validate(&self) -> DomainResult<()>;

    /// Mutation that must be applied atomically with acceptance, if any.
    fn acceptance_effect(&self) -> DomainResult<Option<PriceRevision>> {
        Ok(None)
    }
}

/// Any of the supported payloads; the type stored by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Payload {
    CashCount(CashCount),
    GoodsCosting(GoodsCosting),
    GoodsReceiving(GoodsReceiving),
}

impl DocumentPayload for Payload {
    fn kind(&self) -> DocumentKind {
        match self {
            Payload::CashCount(p) => p.kind(),
            Payload::GoodsCosting(p) => p.kind(),
            Payload::GoodsReceiving(p) => p.kind(),
        }
    }

    fn validate(&self) -> DomainResult<()> {
        match self {
            Payload::CashCount(p) => p.validate(),
            Payload::GoodsCosting(p) => p.validate(),
            Payload::GoodsReceiving(p) => p.validate(),
        }
    }

    fn acceptance_effect(&self) -> DomainResult<Option<PriceRevision>> {
        match self {
            Payload::CashCount(p) => p.acceptance_effect(),
            Payload::GoodsCosting(p) => p.acceptance_effect(),
            Payload::GoodsReceiving(p) => p.acceptance_effect(),
        }
    }
}

impl From<CashCount> for Payload {
    fn from(value: CashCount) -> Self {
        Payload::CashCount(value)
    }
}

impl From<GoodsCosting> for Payload {
    fn from(value: GoodsCosting) -> Self {
        Payload::GoodsCosting(value)
    }
}

impl From<GoodsReceiving> for Payload {
    fn from(value: GoodsReceiving) -> Self {
        Payload::GoodsReceiving(value)
    }
}

/// Result of a `checked_*` decimal operation; overflow is a validation failure.
pub(crate) fn checked(what: &str, value: Option<Decimal>) -> DomainResult<Decimal> {
    value.ok_or_else(|| DomainError::validation(format!("{what} is out of range")))
}

pub(crate) fn ensure_non_negative(field: &str, value: Decimal) -> DomainResult<()> {
    if value < Decimal::ZERO {
        return Err(DomainError::validation(format!("{field} cannot be negative")));
    }
    Ok(())
}
