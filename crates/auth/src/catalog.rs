//! Permission catalog: the fixed vocabulary of modules and actions.
//!
//! Every permission check is expressed as a [`Permission`], a sum type pairing a
//! [`Module`] with one of *its own* actions, so a mismatched pair cannot be
//! constructed. String keys only appear at the boundary ([`Permission::parse`])
//! and in stored permission maps, where they are normalised with
//! [`normalize_key`].

use serde::{Deserialize, Serialize};

/// Normalise an incoming module/action key (trim + lowercase).
pub fn normalize_key(raw: &str) -> String {
    raw.trim().to_lowercase()
}

macro_rules! permission_catalog {
    (
        $(
            $(#[$mdoc:meta])*
            $module:ident ($mkey:literal) => $actions:ident {
                $( $action:ident => $akey:literal ),+ $(,)?
            }
        ),+ $(,)?
    ) => {
        /// Functional area owning an ordered set of actions.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
        #[serde(rename_all = "snake_case")]
        pub enum Module {
            $( $(#[$mdoc])* $module ),+
        }

        impl Module {
            /// Every module, in catalog order.
            pub const ALL: &'static [Module] = &[ $( Module::$module ),+ ];

            pub fn key(self) -> &'static str {
                match self {
                    $( Module::$module => $mkey ),+
                }
            }

            /// Boundary lookup (case-insensitive).
            pub fn parse(raw: &str) -> Option<Self> {
                let key = normalize_key(raw);
                Self::ALL.iter().copied().find(|m| m.key() == key)
            }

            /// The module's actions, in catalog order.
            pub fn permissions(self) -> Vec<Permission> {
                match self {
                    $( Module::$module => $actions::ALL.iter().copied().map(Permission::$module).collect() ),+
                }
            }
        }

        $(
            #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
            pub enum $actions {
                $( $action ),+
            }

            impl $actions {
                pub const ALL: &'static [$actions] = &[ $( $actions::$action ),+ ];

                pub fn key(self) -> &'static str {
                    match self {
                        $( $actions::$action => $akey ),+
                    }
                }
            }

            impl From<$actions> for Permission {
                fn from(action: $actions) -> Self {
                    Permission::$module(action)
                }
            }
        )+

        /// A (module, action) pair from the catalog.
        #[derive(Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub enum Permission {
            $( $module($actions) ),+
        }

        impl Permission {
            pub fn module(self) -> Module {
                match self {
                    $( Permission::$module(_) => Module::$module ),+
                }
            }

            pub fn action_key(self) -> &'static str {
                match self {
                    $( Permission::$module(a) => a.key() ),+
                }
            }

            /// Boundary lookup from raw UI event names (case-insensitive).
            ///
            /// Returns `None` for keys outside the catalog.
            pub fn parse(module: &str, action: &str) -> Option<Self> {
                let action = normalize_key(action);
                match Module::parse(module)? {
                    $(
                        Module::$module => $actions::ALL
                            .iter()
                            .copied()
                            .find(|a| a.key() == action)
                            .map(Permission::$module),
                    )+
                }
            }
        }
    };
}

permission_catalog! {
    Dashboard("dashboard") => DashboardAction {
        ViewDashboard => "view_dashboard",
        ViewAnalytics => "view_analytics",
    },
    Sales("sales") => SalesAction {
        ViewSales => "view_sales",
        CreateSale => "create_sale",
        ApplyDiscount => "apply_discount",
        RefundSale => "refund_sale",
        DeleteSale => "delete_sale",
    },
    /// Products, stock, goods costing and goods receiving.
    Inventory("inventory") => InventoryAction {
        ViewInventory => "view_inventory",
        EditProduct => "edit_product",
        AdjustStock => "adjust_stock",
        ViewCosting => "view_costing",
        CreateCosting => "create_costing",
        VerifyCosting => "verify_costing",
        ApproveCosting => "approve_costing",
        ViewReceiving => "view_receiving",
        CreateReceiving => "create_receiving",
        VerifyReceiving => "verify_receiving",
        ApproveReceiving => "approve_receiving",
    },
    Purchases("purchases") => PurchasesAction {
        ViewPurchases => "view_purchases",
        CreatePurchaseOrder => "create_purchase_order",
        ApprovePurchaseOrder => "approve_purchase_order",
    },
    /// Expenses and cash counts.
    Finance("finance") => FinanceAction {
        ViewFinance => "view_finance",
        CreateExpense => "create_expense",
        ApproveExpenseRequest => "approve_expense_request",
        ViewCashCounts => "view_cash_counts",
        CreateCashCount => "create_cash_count",
        VerifyCashCount => "verify_cash_count",
        ApproveCashCount => "approve_cash_count",
    },
    Treasury("treasury") => TreasuryAction {
        ViewTreasury => "view_treasury",
        TransferFunds => "transfer_funds",
        AdjustBalance => "adjust_balance",
    },
    Reports("reports") => ReportsAction {
        ViewReports => "view_reports",
        ExportReports => "export_reports",
    },
    Users("users") => UsersAction {
        ViewUsers => "view_users",
        ManageUsers => "manage_users",
        ManagePermissions => "manage_permissions",
    },
    Settings("settings") => SettingsAction {
        ViewSettings => "view_settings",
        EditSettings => "edit_settings",
        ManageWorkflowRoles => "manage_workflow_roles",
    },
}

impl Permission {
    /// Every catalog permission, module by module.
    pub fn all() -> Vec<Permission> {
        Module::ALL.iter().flat_map(|m| m.permissions()).collect()
    }

    /// `"module.action"`.
    pub fn key(self) -> String {
        format!("{}.{}", self.module().key(), self.action_key())
    }

    /// Read-only actions (the ones safe mode keeps available).
    pub fn is_view(self) -> bool {
        self.action_key().contains("view")
    }
}

impl core::fmt::Display for Module {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.write_str(self.key())
    }
}

impl core::fmt::Display for Permission {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}.{}", self.module().key(), self.action_key())
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    #[test]
    fn module_keys_are_globally_unique() {
        let keys: HashSet<&str> = Module::ALL.iter().map(|m| m.key()).collect();
        assert_eq!(keys.len(), Module::ALL.len());
    }

    #[test]
    fn action_keys_are_unique_within_each_module() {
        for module in Module::ALL {
            let perms = module.permissions();
            let keys: HashSet<&str> = perms.iter().map(|p| p.action_key()).collect();
            assert_eq!(keys.len(), perms.len(), "duplicate action key in {module}");
        }
    }

    #[test]
    fn every_permission_belongs_to_its_module() {
        for module in Module::ALL {
            for perm in module.permissions() {
                assert_eq!(perm.module(), *module);
            }
        }
    }

    #[test]
    fn parse_is_case_insensitive_and_trims() {
        assert_eq!(
            Permission::parse(" Finance ", "APPROVE_Expense_Request"),
            Some(Permission::Finance(FinanceAction::ApproveExpenseRequest))
        );
        assert_eq!(Module::parse("INVENTORY"), Some(Module::Inventory));
    }

    #[test]
    fn parse_rejects_unknown_and_cross_module_keys() {
        assert_eq!(Permission::parse("sales", "no_such_action"), None);
        assert_eq!(Permission::parse("nowhere", "view_sales"), None);
        // `create_sale` exists, but not under finance.
        assert_eq!(Permission::parse("finance", "create_sale"), None);
    }

    #[test]
    fn parse_round_trips_every_catalog_entry() {
        for perm in Permission::all() {
            assert_eq!(Permission::parse(perm.module().key(), perm.action_key()), Some(perm));
        }
    }

    #[test]
    fn view_detection_matches_action_name() {
        assert!(Permission::Sales(SalesAction::ViewSales).is_view());
        assert!(Permission::Finance(FinanceAction::ViewCashCounts).is_view());
        assert!(!Permission::Sales(SalesAction::CreateSale).is_view());
    }

    #[test]
    fn display_uses_dotted_key() {
        let perm = Permission::from(SettingsAction::ManageWorkflowRoles);
        assert_eq!(perm.to_string(), "settings.manage_workflow_roles");
        assert_eq!(perm.key(), perm.to_string());
    }
}
