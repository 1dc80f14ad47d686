//! Built-in role templates.
//!
//! Used only when the [`AccessPolicy`](crate::AccessPolicy) carries no role map
//! at all. Templates only ever *grant*; anything they omit resolves to deny.

use crate::catalog::{
    DashboardAction, FinanceAction, InventoryAction, Permission, PurchasesAction, ReportsAction,
    SalesAction, SettingsAction, TreasuryAction,
};
use crate::permissions::PermissionSet;
use crate::roles::Role;

/// The built-in grants for `role`.
pub fn default_role_template(role: Role) -> PermissionSet {
    let granted: Vec<Permission> = match role {
        Role::Owner | Role::SuperAdmin | Role::Admin => Permission::all(),
        Role::Manager => manager(),
        Role::Staff => vec![
            DashboardAction::ViewDashboard.into(),
            SalesAction::ViewSales.into(),
            SalesAction::CreateSale.into(),
            InventoryAction::ViewInventory.into(),
            InventoryAction::ViewReceiving.into(),
            InventoryAction::CreateReceiving.into(),
        ],
        Role::Cashier => vec![
            DashboardAction::ViewDashboard.into(),
            SalesAction::ViewSales.into(),
            SalesAction::CreateSale.into(),
            SalesAction::ApplyDiscount.into(),
            FinanceAction::ViewCashCounts.into(),
            FinanceAction::CreateCashCount.into(),
        ],
        Role::Investor => vec![
            DashboardAction::ViewDashboard.into(),
            DashboardAction::ViewAnalytics.into(),
            FinanceAction::ViewFinance.into(),
            ReportsAction::ViewReports.into(),
        ],
        Role::Custom => Vec::new(),
    };

    granted.into_iter().map(|p| (p, true)).collect()
}

fn manager() -> Vec<Permission> {
    let mut granted: Vec<Permission> = Permission::all().into_iter().filter(|p| p.is_view()).collect();
    granted.extend([
        Permission::from(SalesAction::CreateSale),
        SalesAction::ApplyDiscount.into(),
        SalesAction::RefundSale.into(),
        InventoryAction::EditProduct.into(),
        InventoryAction::AdjustStock.into(),
        InventoryAction::CreateCosting.into(),
        InventoryAction::VerifyCosting.into(),
        InventoryAction::CreateReceiving.into(),
        InventoryAction::VerifyReceiving.into(),
        PurchasesAction::CreatePurchaseOrder.into(),
        FinanceAction::CreateExpense.into(),
        FinanceAction::CreateCashCount.into(),
        FinanceAction::VerifyCashCount.into(),
        TreasuryAction::TransferFunds.into(),
        ReportsAction::ExportReports.into(),
    ]);
    // Settings stay read-only for managers.
    granted.retain(|p| *p != Permission::Settings(SettingsAction::EditSettings));
    granted
}
