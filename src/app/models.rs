//! Data models for the EA fetcher
//!
//! Core billing domain types shared by both pipelines, along with the wire
//! shapes they are parsed from. Wire types mirror the ARM response envelopes;
//! domain types only exist once validated (a period without both boundary
//! dates never escapes this module).

use chrono::NaiveDate;
use serde::Deserialize;

use crate::errors::{BillingError, BillingResult};

/// An Enterprise Agreement billing account, identified by its number
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingAccount {
    /// Account identifier, e.g. "61537428"
    pub name: String,
}

/// A closed calendar interval over which EA usage is billed
///
/// Ordering by recency is the service's, not ours; the listing endpoint
/// returns periods most-recent first and this crate preserves that order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BillingPeriod {
    /// Period name, e.g. "202301"
    pub name: String,
    /// First day of the period
    pub start_date: NaiveDate,
    /// Last day of the period
    pub end_date: NaiveDate,
}

impl BillingPeriod {
    /// Deterministic label for artifacts derived from this period:
    /// `YYYYMMDD-YYYYMMDD` over the period boundaries
    pub fn export_label(&self) -> String {
        format!(
            "{}-{}",
            self.start_date.format("%Y%m%d"),
            self.end_date.format("%Y%m%d")
        )
    }

    /// Whether the period has safely closed as of `today`
    ///
    /// A period only counts as closed once `grace_days` have passed beyond
    /// its end date, giving the provider time to finalize late usage.
    pub fn is_closed(&self, today: NaiveDate, grace_days: i64) -> bool {
        today >= self.end_date + chrono::Duration::days(grace_days)
    }

    /// Export time range over the period: start of the first day to the last
    /// second of the last day, both UTC
    pub fn time_range(&self) -> (String, String) {
        (
            format!("{}T00:00:00Z", self.start_date.format("%Y-%m-%d")),
            format!("{}T23:59:59Z", self.end_date.format("%Y-%m-%d")),
        )
    }
}

impl std::fmt::Display for BillingPeriod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} ({} - {})", self.name, self.start_date, self.end_date)
    }
}

/// Result of a completed usage-generation operation
#[derive(Debug, Clone)]
pub struct UsageDownload {
    /// Ephemeral signed URL to the generated usage data
    pub download_url: String,
    /// Expiry of the signed URL, when reported
    pub valid_till: Option<String>,
}

/// Wire shape of one billing period in the ARM listing envelope
#[derive(Debug, Deserialize)]
pub struct RawBillingPeriod {
    pub name: String,
    #[serde(default)]
    pub properties: RawBillingPeriodProperties,
}

/// Wire shape of billing period properties
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBillingPeriodProperties {
    pub billing_period_start_date: Option<NaiveDate>,
    pub billing_period_end_date: Option<NaiveDate>,
}

impl TryFrom<RawBillingPeriod> for BillingPeriod {
    type Error = BillingError;

    fn try_from(raw: RawBillingPeriod) -> BillingResult<Self> {
        match (
            raw.properties.billing_period_start_date,
            raw.properties.billing_period_end_date,
        ) {
            (Some(start_date), Some(end_date)) => Ok(Self {
                name: raw.name,
                start_date,
                end_date,
            }),
            _ => Err(BillingError::IncompletePeriod { name: raw.name }),
        }
    }
}

/// Wire shape of one billing account in the enumeration envelope
#[derive(Debug, Deserialize)]
pub struct RawBillingAccount {
    pub name: String,
    #[serde(default)]
    pub properties: RawBillingAccountProperties,
}

/// Wire shape of billing account properties
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawBillingAccountProperties {
    pub agreement_type: Option<String>,
}

/// Generic ARM list envelope: `{"value": [...]}`
#[derive(Debug, Deserialize)]
pub struct ArmList<T> {
    #[serde(default = "Vec::new")]
    pub value: Vec<T>,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn period(name: &str, start: (i32, u32, u32), end: (i32, u32, u32)) -> BillingPeriod {
        BillingPeriod {
            name: name.to_string(),
            start_date: NaiveDate::from_ymd_opt(start.0, start.1, start.2).unwrap(),
            end_date: NaiveDate::from_ymd_opt(end.0, end.1, end.2).unwrap(),
        }
    }

    #[test]
    fn test_export_label_derivation() {
        let p = period("202301", (2023, 1, 1), (2023, 1, 31));
        assert_eq!(p.export_label(), "20230101-20230131");
    }

    #[test]
    fn test_is_closed_grace_window() {
        let p = period("202301", (2023, 1, 1), (2023, 1, 31));
        let grace = 5;

        // End + 4 days: not yet closed
        let today = NaiveDate::from_ymd_opt(2023, 2, 4).unwrap();
        assert!(!p.is_closed(today, grace));

        // End + 5 days exactly: closed
        let today = NaiveDate::from_ymd_opt(2023, 2, 5).unwrap();
        assert!(p.is_closed(today, grace));
    }

    #[test]
    fn test_time_range_boundaries() {
        let p = period("202301", (2023, 1, 1), (2023, 1, 31));
        let (from, to) = p.time_range();
        assert_eq!(from, "2023-01-01T00:00:00Z");
        assert_eq!(to, "2023-01-31T23:59:59Z");
    }

    #[test]
    fn test_raw_period_with_both_dates_converts() {
        let raw: RawBillingPeriod = serde_json::from_str(
            r#"{
                "name": "202301",
                "properties": {
                    "billingPeriodStartDate": "2023-01-01",
                    "billingPeriodEndDate": "2023-01-31"
                }
            }"#,
        )
        .unwrap();

        let p = BillingPeriod::try_from(raw).unwrap();
        assert_eq!(p.name, "202301");
        assert_eq!(p.export_label(), "20230101-20230131");
    }

    #[test]
    fn test_raw_period_missing_end_date_rejected() {
        let raw: RawBillingPeriod = serde_json::from_str(
            r#"{
                "name": "202301",
                "properties": {"billingPeriodStartDate": "2023-01-01"}
            }"#,
        )
        .unwrap();

        assert!(matches!(
            BillingPeriod::try_from(raw),
            Err(BillingError::IncompletePeriod { name }) if name == "202301"
        ));
    }

    #[test]
    fn test_arm_list_envelope() {
        let list: ArmList<RawBillingAccount> = serde_json::from_str(
            r#"{"value": [
                {"name": "1234", "properties": {"agreementType": "EnterpriseAgreement"}},
                {"name": "5678", "properties": {"agreementType": "MicrosoftCustomerAgreement"}}
            ]}"#,
        )
        .unwrap();

        assert_eq!(list.value.len(), 2);
        assert_eq!(
            list.value[0].properties.agreement_type.as_deref(),
            Some("EnterpriseAgreement")
        );
    }
}
