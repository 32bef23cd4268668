//! Billing account resolution and billing period selection
//!
//! Account discovery goes through the raw ARM client because no typed
//! surface exists for billing-account enumeration at the preview API version.
//! Period listing is scoped to the profile's subscription, matching how the
//! management plane exposes `Microsoft.Billing/billingPeriods`.
//!
//! The selection rules themselves are pure functions over already-fetched
//! data, so the interesting edge cases are unit-testable without a network.

use chrono::{NaiveDate, Utc};
use reqwest::{Method, StatusCode};
use tracing::{debug, info};

use crate::app::client::{format_path, ArmClient};
use crate::app::models::{ArmList, BillingPeriod, RawBillingAccount, RawBillingPeriod};
use crate::constants::{api_versions, billing};
use crate::errors::{ApiError, BillingError, BillingResult};

const ACCOUNTS_PATH: &str = "/providers/Microsoft.Billing/billingAccounts";
const PERIODS_PATH: &str = "/subscriptions/{subscription}/providers/Microsoft.Billing/billingPeriods";

/// List the names of Enterprise Agreement billing accounts visible to the
/// credential
pub async fn list_eligible_accounts(arm: &ArmClient) -> BillingResult<Vec<String>> {
    let envelope: ArmList<RawBillingAccount> = arm
        .get_json(
            ACCOUNTS_PATH,
            api_versions::BILLING_ACCOUNTS,
            "billing account enumeration",
        )
        .await?;

    let eligible = filter_eligible_accounts(envelope.value);
    debug!("{} Enterprise Agreement account(s) visible", eligible.len());
    Ok(eligible)
}

/// Keep only accounts whose agreement type is EnterpriseAgreement
pub fn filter_eligible_accounts(accounts: Vec<RawBillingAccount>) -> Vec<String> {
    accounts
        .into_iter()
        .filter(|a| {
            a.properties.agreement_type.as_deref() == Some(billing::ELIGIBLE_AGREEMENT_TYPE)
        })
        .map(|a| a.name)
        .collect()
}

/// Resolve the billing account to operate on
///
/// An explicit override short-circuits discovery entirely. Otherwise the
/// eligible set must contain exactly one account; zero or several is a
/// user-actionable failure.
pub fn resolve_account(
    account_override: Option<&str>,
    eligible: Vec<String>,
) -> BillingResult<String> {
    if let Some(name) = account_override {
        return Ok(name.to_string());
    }
    match eligible.len() {
        0 => Err(BillingError::NoEligibleAccount),
        1 => Ok(eligible.into_iter().next().expect("len checked")),
        count => Err(BillingError::MultipleEligibleAccounts { count }),
    }
}

/// Fetch the most recent `top` billing periods, most recent first
pub async fn list_periods(
    arm: &ArmClient,
    subscription_id: &str,
    top: usize,
) -> BillingResult<Vec<BillingPeriod>> {
    let path = format_path(PERIODS_PATH, &[("subscription", subscription_id)]);
    let mut url = arm.build_url(&path, api_versions::BILLING_PERIODS)?;
    url.query_pairs_mut().append_pair("$top", &top.to_string());

    let response = arm
        .send(
            Method::GET,
            url,
            None::<&()>,
            "billing period listing",
            &[StatusCode::OK],
        )
        .await?;
    let raw = response.bytes().await.map_err(ApiError::Http)?;
    let envelope: ArmList<RawBillingPeriod> =
        serde_json::from_slice(&raw).map_err(|source| ApiError::MalformedBody {
            operation: "billing period listing",
            source,
        })?;

    envelope
        .value
        .into_iter()
        .take(top)
        .map(BillingPeriod::try_from)
        .collect()
}

/// Auto-select the active billing period (no names requested)
///
/// Fetches the most recent periods and returns the newest one that has
/// safely closed.
pub async fn select_billing_period(
    arm: &ArmClient,
    subscription_id: &str,
) -> BillingResult<BillingPeriod> {
    let periods = list_periods(arm, subscription_id, billing::AUTO_SELECT_WINDOW).await?;
    let today = Utc::now().date_naive();
    let period = select_active_period(&periods, today)?;

    info!("Selected billing period: {}", period);
    Ok(period.clone())
}

/// The newest period in `periods` whose end date plus the grace window has
/// already passed
///
/// `periods` is expected in descending recency order, as the service returns
/// it. Periods still inside the grace window are skipped; if every candidate
/// is still open the window is exhausted and selection fails.
pub fn select_active_period(
    periods: &[BillingPeriod],
    today: NaiveDate,
) -> BillingResult<&BillingPeriod> {
    periods
        .iter()
        .find(|p| p.is_closed(today, billing::PERIOD_GRACE_DAYS))
        .ok_or(BillingError::NoClosedPeriod {
            window: billing::AUTO_SELECT_WINDOW,
            grace_days: billing::PERIOD_GRACE_DAYS,
        })
}

/// Look up explicitly requested period names
///
/// Fetches the most recent 36 periods and maps each requested name to its
/// period object, preserving request order. Names outside that window fail;
/// there is no deeper pagination.
pub async fn get_billing_periods(
    arm: &ArmClient,
    subscription_id: &str,
    names: &[String],
) -> BillingResult<Vec<BillingPeriod>> {
    let periods = list_periods(arm, subscription_id, billing::NAME_LOOKUP_WINDOW).await?;
    lookup_periods(&periods, names)
}

/// Select `names` out of `periods`, in request order
pub fn lookup_periods(
    periods: &[BillingPeriod],
    names: &[String],
) -> BillingResult<Vec<BillingPeriod>> {
    names
        .iter()
        .map(|name| {
            periods
                .iter()
                .find(|p| &p.name == name)
                .cloned()
                .ok_or_else(|| BillingError::PeriodNotFound {
                    name: name.clone(),
                    window: billing::NAME_LOOKUP_WINDOW,
                })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::models::RawBillingAccountProperties;

    fn raw_account(name: &str, agreement: Option<&str>) -> RawBillingAccount {
        RawBillingAccount {
            name: name.to_string(),
            properties: RawBillingAccountProperties {
                agreement_type: agreement.map(str::to_string),
            },
        }
    }

    fn month(name: &str, year: i32, month: u32) -> BillingPeriod {
        let start = NaiveDate::from_ymd_opt(year, month, 1).unwrap();
        let end = if month == 12 {
            NaiveDate::from_ymd_opt(year + 1, 1, 1)
        } else {
            NaiveDate::from_ymd_opt(year, month + 1, 1)
        }
        .unwrap()
            - chrono::Duration::days(1);
        BillingPeriod {
            name: name.to_string(),
            start_date: start,
            end_date: end,
        }
    }

    /// Most recent first, like the service
    fn recent_periods() -> Vec<BillingPeriod> {
        vec![
            month("202305", 2023, 5),
            month("202304", 2023, 4),
            month("202303", 2023, 3),
            month("202302", 2023, 2),
            month("202301", 2023, 1),
        ]
    }

    #[test]
    fn test_filter_keeps_only_enterprise_agreement() {
        let accounts = vec![
            raw_account("1111", Some("EnterpriseAgreement")),
            raw_account("2222", Some("MicrosoftCustomerAgreement")),
            raw_account("3333", None),
            raw_account("4444", Some("EnterpriseAgreement")),
        ];

        assert_eq!(filter_eligible_accounts(accounts), vec!["1111", "4444"]);
    }

    #[test]
    fn test_resolve_account_zero_eligible_fails() {
        let result = resolve_account(None, vec![]);
        assert!(matches!(result, Err(BillingError::NoEligibleAccount)));
    }

    #[test]
    fn test_resolve_account_single_eligible_proceeds() {
        let result = resolve_account(None, vec!["1234".to_string()]);
        assert_eq!(result.unwrap(), "1234");
    }

    #[test]
    fn test_resolve_account_multiple_eligible_fails() {
        let result = resolve_account(None, vec!["1".to_string(), "2".to_string()]);
        assert!(matches!(
            result,
            Err(BillingError::MultipleEligibleAccounts { count: 2 })
        ));
    }

    #[test]
    fn test_resolve_account_override_skips_discovery() {
        // Discovery results are ignored entirely when an override is given
        let result = resolve_account(Some("1234"), vec!["9".to_string(), "8".to_string()]);
        assert_eq!(result.unwrap(), "1234");
    }

    #[test]
    fn test_auto_select_skips_open_periods() {
        let periods = recent_periods();
        // May (ends 05-31) and April (ends 04-30) are inside the grace
        // window on May 2nd; March closed on April 5th.
        let today = NaiveDate::from_ymd_opt(2023, 5, 2).unwrap();

        let selected = select_active_period(&periods, today).unwrap();
        assert_eq!(selected.name, "202303");
    }

    #[test]
    fn test_auto_select_boundary_day() {
        let periods = recent_periods();
        // Exactly end + 5 days qualifies
        let today = NaiveDate::from_ymd_opt(2023, 6, 5).unwrap();

        let selected = select_active_period(&periods, today).unwrap();
        assert_eq!(selected.name, "202305");
    }

    #[test]
    fn test_auto_select_returns_most_recent_closed() {
        let periods = recent_periods();
        let today = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();

        // All five are closed; the most recent wins
        let selected = select_active_period(&periods, today).unwrap();
        assert_eq!(selected.name, "202305");
    }

    #[test]
    fn test_auto_select_exhausted_window_fails() {
        let periods = recent_periods();
        // Before any of the five has closed
        let today = NaiveDate::from_ymd_opt(2023, 1, 3).unwrap();

        assert!(matches!(
            select_active_period(&periods, today),
            Err(BillingError::NoClosedPeriod { .. })
        ));
    }

    #[test]
    fn test_lookup_preserves_request_order() {
        let periods = recent_periods();
        let names = vec!["202301".to_string(), "202304".to_string()];

        let selected = lookup_periods(&periods, &names).unwrap();
        let selected_names: Vec<_> = selected.iter().map(|p| p.name.as_str()).collect();
        assert_eq!(selected_names, vec!["202301", "202304"]);
    }

    #[test]
    fn test_lookup_unknown_name_fails() {
        let periods = recent_periods();
        let names = vec!["201901".to_string()];

        assert!(matches!(
            lookup_periods(&periods, &names),
            Err(BillingError::PeriodNotFound { name, window: 36 }) if name == "201901"
        ));
    }

    #[test]
    fn test_lookup_empty_request_is_empty() {
        let periods = recent_periods();
        assert!(lookup_periods(&periods, &[]).unwrap().is_empty());
    }
}
