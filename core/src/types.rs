//! Shared primitive types used across the entire engine.

use rusqlite::types::{FromSql, FromSqlError, FromSqlResult, ToSql, ToSqlOutput, ValueRef};
use serde::{Deserialize, Serialize};

/// A stable, unique identifier for a sale.
pub type SaleId = String;

/// A development ("project") identifier.
pub type DevelopmentId = String;

/// A product (unit) identifier within a development.
pub type ProductId = String;

/// Round a monetary value to two decimals, half up.
///
/// This is the single rounding rule of the engine. Every persisted amount
/// and every surcharge computation goes through it.
pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// The temporal phase a distribution row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Sale,
    PostSale,
    Utility,
}

impl Phase {
    pub fn as_str(self) -> &'static str {
        match self {
            Phase::Sale => "sale",
            Phase::PostSale => "post_sale",
            Phase::Utility => "utility",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sale" => Some(Phase::Sale),
            "post_sale" => Some(Phase::PostSale),
            "utility" => Some(Phase::Utility),
            _ => None,
        }
    }
}

/// Every payee role a distribution row can carry.
///
/// A closed union, including the two utility-phase row kinds, so that
/// row handling stays exhaustive at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RoleKind {
    SalesManager,
    DealOwner,
    ExternalAdvisor,
    OperationsCoordinator,
    Marketing,
    LegalManager,
    PostSaleCoordinator,
    CustomerService,
    Deliveries,
    Bonds,
    RuleBonus,
    RemainingUtility,
}

impl RoleKind {
    pub fn as_str(self) -> &'static str {
        match self {
            RoleKind::SalesManager => "sales_manager",
            RoleKind::DealOwner => "deal_owner",
            RoleKind::ExternalAdvisor => "external_advisor",
            RoleKind::OperationsCoordinator => "operations_coordinator",
            RoleKind::Marketing => "marketing",
            RoleKind::LegalManager => "legal_manager",
            RoleKind::PostSaleCoordinator => "post_sale_coordinator",
            RoleKind::CustomerService => "customer_service",
            RoleKind::Deliveries => "deliveries",
            RoleKind::Bonds => "bonds",
            RoleKind::RuleBonus => "rule_bonus",
            RoleKind::RemainingUtility => "remaining_utility",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "sales_manager" => Some(RoleKind::SalesManager),
            "deal_owner" => Some(RoleKind::DealOwner),
            "external_advisor" => Some(RoleKind::ExternalAdvisor),
            "operations_coordinator" => Some(RoleKind::OperationsCoordinator),
            "marketing" => Some(RoleKind::Marketing),
            "legal_manager" => Some(RoleKind::LegalManager),
            "post_sale_coordinator" => Some(RoleKind::PostSaleCoordinator),
            "customer_service" => Some(RoleKind::CustomerService),
            "deliveries" => Some(RoleKind::Deliveries),
            "bonds" => Some(RoleKind::Bonds),
            "rule_bonus" => Some(RoleKind::RuleBonus),
            "remaining_utility" => Some(RoleKind::RemainingUtility),
            _ => None,
        }
    }

    /// Human-readable payee label, used when no person is attached.
    pub fn label(self) -> &'static str {
        match self {
            RoleKind::SalesManager => "Sales Manager",
            RoleKind::DealOwner => "Deal Owner",
            RoleKind::ExternalAdvisor => "External Advisor",
            RoleKind::OperationsCoordinator => "Operations Coordinator",
            RoleKind::Marketing => "Marketing",
            RoleKind::LegalManager => "Legal Manager",
            RoleKind::PostSaleCoordinator => "Post-Sale Coordinator",
            RoleKind::CustomerService => "Customer Service",
            RoleKind::Deliveries => "Deliveries",
            RoleKind::Bonds => "Bonds",
            RoleKind::RuleBonus => "Volume Bonus",
            RoleKind::RemainingUtility => "Remaining Utility",
        }
    }
}

/// Payment state of one internal distribution row.
///
/// A plain toggle, not a guarded state machine. Transitions go both ways;
/// every transition is recorded in the audit log by the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Paid,
}

impl PaymentStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Paid => "paid",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending" => Some(PaymentStatus::Pending),
            "paid" => Some(PaymentStatus::Paid),
            _ => None,
        }
    }
}

/// Partner-facing invoicing lifecycle, tracked independently per phase.
/// Forward-only: pending_invoice → invoiced → collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CollectionStatus {
    PendingInvoice,
    Invoiced,
    Collected,
}

impl CollectionStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            CollectionStatus::PendingInvoice => "pending_invoice",
            CollectionStatus::Invoiced => "invoiced",
            CollectionStatus::Collected => "collected",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "pending_invoice" => Some(CollectionStatus::PendingInvoice),
            "invoiced" => Some(CollectionStatus::Invoiced),
            "collected" => Some(CollectionStatus::Collected),
            _ => None,
        }
    }

    /// Position in the forward-only lifecycle.
    pub fn rank(self) -> u8 {
        match self {
            CollectionStatus::PendingInvoice => 0,
            CollectionStatus::Invoiced => 1,
            CollectionStatus::Collected => 2,
        }
    }
}

/// Period bucket a bonus rule is evaluated against.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PeriodType {
    Monthly,
    Quarterly,
    Yearly,
}

impl PeriodType {
    pub fn as_str(self) -> &'static str {
        match self {
            PeriodType::Monthly => "monthly",
            PeriodType::Quarterly => "quarterly",
            PeriodType::Yearly => "yearly",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "monthly" => Some(PeriodType::Monthly),
            "quarterly" => Some(PeriodType::Quarterly),
            "yearly" => Some(PeriodType::Yearly),
            _ => None,
        }
    }
}

/// Comparison a rule applies to the period's unit count.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RuleOperator {
    Equals,
    AtLeast,
    AtMost,
}

impl RuleOperator {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleOperator::Equals => "=",
            RuleOperator::AtLeast => ">=",
            RuleOperator::AtMost => "<=",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "=" => Some(RuleOperator::Equals),
            ">=" => Some(RuleOperator::AtLeast),
            "<=" => Some(RuleOperator::AtMost),
            _ => None,
        }
    }
}

// SQLite stores all of these as TEXT. The conversions live here so the
// store layer can read typed columns directly inside query_map closures.

macro_rules! sql_text_enum {
    ($ty:ty) => {
        impl ToSql for $ty {
            fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
                Ok(ToSqlOutput::from(self.as_str()))
            }
        }

        impl FromSql for $ty {
            fn column_result(value: ValueRef<'_>) -> FromSqlResult<Self> {
                let s = value.as_str()?;
                <$ty>::parse(s).ok_or(FromSqlError::InvalidType)
            }
        }
    };
}

sql_text_enum!(Phase);
sql_text_enum!(RoleKind);
sql_text_enum!(PaymentStatus);
sql_text_enum!(CollectionStatus);
sql_text_enum!(PeriodType);
sql_text_enum!(RuleOperator);
