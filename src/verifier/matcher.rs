//! Deposit matching policy
//!
//! A row matches when coin, amount band, chain (if requested) and completion
//! all agree. Rows are scanned in upstream order and the first match wins.

use crate::bybit::DepositRecord;

use super::coerce::{normalize, normalized_text, value_to_number, value_to_text};
use super::request::NormalizedRequest;

/// Bybit status 3 is "success"; the words cover other exchanges and older payloads
pub const COMPLETED_STATUSES: [&str; 3] = ["3", "success", "completed"];

/// Bidirectional substring test on normalized chain names
///
/// `TRX` and `TRC20-TRX` overlap in both directions. Short codes can collide
/// with unrelated longer names, and an empty name overlaps everything.
pub fn chains_overlap(row_chain: &str, wanted: &str) -> bool {
    row_chain.contains(wanted) || wanted.contains(row_chain)
}

/// Completion timestamp present, or a status from the completed vocabulary
pub fn is_completed(row: &DepositRecord) -> bool {
    let has_success_time = row
        .success_at()
        .and_then(value_to_text)
        .map_or(false, |s| !s.is_empty());

    let status = row
        .status()
        .and_then(value_to_text)
        .unwrap_or_default()
        .to_lowercase();

    has_success_time || COMPLETED_STATUSES.contains(&status.as_str())
}

/// Criteria derived from one normalized request
#[derive(Debug, Clone, PartialEq)]
pub struct MatchCriteria {
    pub coin: String,
    /// Normalized chain filter
    pub chain: Option<String>,
    pub min_amount: f64,
    pub max_amount: f64,
}

impl MatchCriteria {
    pub fn from_request(request: &NormalizedRequest) -> Self {
        Self {
            coin: request.coin.clone(),
            chain: request.chain.as_deref().map(normalize),
            min_amount: request.expected_amount - request.tolerance,
            max_amount: request.expected_amount + request.tolerance,
        }
    }

    pub fn matches(&self, row: &DepositRecord) -> bool {
        if normalized_text(row.coin()) != self.coin {
            return false;
        }

        let amount = match row.amount().and_then(value_to_number) {
            Some(a) => a,
            None => return false,
        };
        if amount < self.min_amount || amount > self.max_amount {
            return false;
        }

        if let Some(wanted) = &self.chain {
            if !chains_overlap(&normalized_text(row.chain()), wanted) {
                return false;
            }
        }

        is_completed(row)
    }

    /// First matching row, in the order given
    pub fn find_first<'a>(&self, rows: &'a [DepositRecord]) -> Option<&'a DepositRecord> {
        rows.iter().find(|row| self.matches(row))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::{json, Value};

    fn row(value: Value) -> DepositRecord {
        DepositRecord::from_value(value).unwrap()
    }

    fn criteria(coin: &str, expected: f64, tolerance: f64, chain: Option<&str>) -> MatchCriteria {
        MatchCriteria::from_request(&NormalizedRequest {
            coin: coin.to_string(),
            chain: chain.map(str::to_string),
            expected_amount: expected,
            tolerance,
            pressed_at_ms: 1_700_000_000_000,
            window_before_min: 5.0,
            window_after_min: 15.0,
        })
    }

    #[test]
    fn test_amount_band_is_inclusive() {
        let c = criteria("USDT", 100.0, 10.0, None);
        assert!(c.matches(&row(json!({"coin": "USDT", "amount": "110", "status": 3}))));
        assert!(c.matches(&row(json!({"coin": "USDT", "amount": 90, "status": 3}))));
        assert!(!c.matches(&row(json!({"coin": "USDT", "amount": "110.01", "status": 3}))));
        assert!(!c.matches(&row(json!({"coin": "USDT", "amount": "89.99", "status": 3}))));
    }

    #[test]
    fn test_coin_case_insensitive() {
        let c = criteria("USDT", 100.0, 0.0, None);
        assert!(c.matches(&row(json!({"coin": "usdt", "amount": "100", "status": "3"}))));
        assert!(c.matches(&row(json!({"coin": " Usdt ", "amount": "100", "status": "3"}))));
        assert!(!c.matches(&row(json!({"coin": "USDC", "amount": "100", "status": "3"}))));
        assert!(!c.matches(&row(json!({"amount": "100", "status": "3"}))));
    }

    #[test]
    fn test_unparseable_amount_never_matches() {
        let c = criteria("USDT", 100.0, 1000.0, None);
        assert!(!c.matches(&row(json!({"coin": "USDT", "amount": "n/a", "status": 3}))));
        assert!(!c.matches(&row(json!({"coin": "USDT", "amount": null, "status": 3}))));
        assert!(!c.matches(&row(json!({"coin": "USDT", "status": 3}))));
    }

    #[test]
    fn test_chain_overlap_both_directions() {
        let short = criteria("USDT", 100.0, 5.0, Some("trx"));
        assert!(short.matches(&row(json!({"coin": "USDT", "amount": "100", "status": 3, "chain": "TRC20-TRX"}))));

        let long = criteria("USDT", 100.0, 5.0, Some("TRC20-TRX"));
        assert!(long.matches(&row(json!({"coin": "USDT", "amount": "100", "status": 3, "chain": "TRX"}))));

        let other = criteria("USDT", 100.0, 5.0, Some("XRP"));
        assert!(!other.matches(&row(json!({"coin": "USDT", "amount": "100", "status": 3, "chain": "TRC20-TRX"}))));
    }

    #[test]
    fn test_chain_type_used_when_chain_missing() {
        let c = criteria("USDT", 100.0, 5.0, Some("ERC20"));
        assert!(c.matches(&row(json!({"coin": "USDT", "amount": "100", "status": 3, "chainType": "ERC20"}))));
        assert!(!c.matches(&row(json!({"coin": "USDT", "amount": "100", "status": 3, "chainType": "BEP20"}))));
    }

    #[test]
    fn test_rows_without_chain_pass_chain_filter() {
        let c = criteria("USDT", 100.0, 5.0, Some("TRX"));
        assert!(c.matches(&row(json!({"coin": "USDT", "amount": "100", "status": 3}))));
    }

    #[test]
    fn test_completion_vocabulary() {
        assert!(is_completed(&row(json!({"status": "3"}))));
        assert!(is_completed(&row(json!({"status": 3}))));
        assert!(is_completed(&row(json!({"status": "SUCCESS"}))));
        assert!(is_completed(&row(json!({"status": "Completed"}))));
        assert!(is_completed(&row(json!({"status": "pending", "successAt": "1700000000000"}))));
        assert!(is_completed(&row(json!({"successAt": 0}))));

        assert!(!is_completed(&row(json!({"status": "pending"}))));
        assert!(!is_completed(&row(json!({"status": 1, "successAt": ""}))));
        assert!(!is_completed(&row(json!({"status": "pending", "successAt": null}))));
        assert!(!is_completed(&row(json!({}))));
    }

    #[test]
    fn test_pending_never_matches() {
        let c = criteria("USDT", 100.0, 10.0, None);
        assert!(!c.matches(&row(json!({"coin": "USDT", "amount": "100", "status": "pending"}))));
    }

    #[test]
    fn test_first_match_wins() {
        let c = criteria("USDT", 100.0, 5.0, None);
        let rows = vec![
            row(json!({"coin": "USDT", "amount": "50", "status": "3", "id": 1})),
            row(json!({"coin": "USDT", "amount": "103", "status": "3", "id": 2})),
            row(json!({"coin": "USDT", "amount": "100", "status": "3", "id": 3})),
        ];

        let found = c.find_first(&rows).unwrap();
        assert_eq!(found.field("id"), Some(&json!(2)));
        assert!(c.find_first(&[]).is_none());
    }
}
