use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

use bazaar_core::{DomainError, DomainResult};

use super::{DocumentKind, DocumentPayload, checked, ensure_non_negative};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DenominationCount {
    pub value: Decimal,
    pub count: u32,
}

impl DenominationCount {
    pub fn subtotal(&self) -> DomainResult<Decimal> {
        checked("denomination subtotal", self.value.checked_mul(Decimal::from(self.count)))
    }
}

/// Physical count of a cash drawer against its book balance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CashCount {
    pub register: String,
    pub expected_balance: Decimal,
    #[serde(default)]
    pub denominations: Vec<DenominationCount>,
}

impl CashCount {
    pub fn counted_total(&self) -> DomainResult<Decimal> {
        self.denominations.iter().try_fold(Decimal::ZERO, |acc, line| {
            checked("counted total", acc.checked_add(line.subtotal()?))
        })
    }

    /// Counted minus expected: positive is an overage, negative a shortage.
    pub fn variance(&self) -> DomainResult<Decimal> {
        checked("variance", self.counted_total()?.checked_sub(self.expected_balance))
    }
}

impl DocumentPayload for CashCount {
    fn kind(&self) -> DocumentKind {
        DocumentKind::CashCount
    }

    fn validate(&self) -> DomainResult<()> {
        if self.register.trim().is_empty() {
            return Err(DomainError::validation("register cannot be empty"));
        }
        ensure_non_negative("expected balance", self.expected_balance)?;
        for line in &self.denominations {
            if line.value <= Decimal::ZERO {
                return Err(DomainError::validation("denomination value must be positive"));
            }
        }
        self.variance().map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn drawer() -> CashCount {
        CashCount {
            register: "front".into(),
            expected_balance: Decimal::new(15000, 2),
            denominations: vec![
                DenominationCount { value: Decimal::from(50), count: 2 },
                DenominationCount { value: Decimal::from(20), count: 2 },
                DenominationCount { value: Decimal::new(50, 2), count: 3 },
            ],
        }
    }

    #[test]
    fn counted_total_and_variance() {
        let count = drawer();
        assert_eq!(count.counted_total(), Ok(Decimal::new(14150, 2)));
        assert_eq!(count.variance(), Ok(Decimal::new(-850, 2)));
    }

    #[test]
    fn rejects_zero_denominations() {
        let mut count = drawer();
        count.denominations.push(DenominationCount { value: Decimal::ZERO, count: 1 });
        assert!(count.validate().is_err());
        assert!(drawer().validate().is_ok());
    }

    #[test]
    fn cash_counts_have_no_linked_mutation() {
        assert_eq!(drawer().acceptance_effect(), Ok(None));
    }

    #[test]
    fn overflowing_count_is_refused() {
        let mut count = drawer();
        count.denominations.push(DenominationCount { value: Decimal::MAX, count: 2 });
        assert!(matches!(count.counted_total(), Err(DomainError::Validation(_))));
        assert!(count.validate().is_err());
    }
}
