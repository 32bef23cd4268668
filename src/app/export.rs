//! One-time cost-management exports (Pipeline B)
//!
//! Builds an export definition with an inactive schedule, creates it at the
//! billing-account + billing-period scope through the raw ARM client (no
//! typed surface exists for exports at this API version), then triggers it
//! exactly once. The export itself runs asynchronously on the service side;
//! nothing is polled after the trigger.

use reqwest::{Method, StatusCode};
use serde::Serialize;
use tracing::info;
use uuid::Uuid;

use crate::app::client::{format_path, ArmClient};
use crate::app::models::BillingPeriod;
use crate::constants::{api_versions, export};
use crate::errors::ApiResult;

const EXPORT_PATH: &str = "/providers/Microsoft.Billing/billingAccounts/{account}\
/providers/Microsoft.Billing/billingPeriods/{period}\
/providers/Microsoft.CostManagement/exports/{name}";

const EXPORT_RUN_PATH: &str = "/providers/Microsoft.Billing/billingAccounts/{account}\
/providers/Microsoft.Billing/billingPeriods/{period}\
/providers/Microsoft.CostManagement/exports/{name}/run";

/// Generate a unique export name: `onetime` + UUID with hyphens stripped
pub fn new_export_name() -> String {
    format!("{}{}", export::NAME_PREFIX, Uuid::new_v4().simple())
}

/// Export definition resource body
#[derive(Debug, Serialize)]
pub struct ExportDefinition {
    properties: ExportProperties,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ExportProperties {
    schedule: ExportSchedule,
    format: &'static str,
    delivery_info: DeliveryInfo,
    definition: QueryDefinition,
}

#[derive(Debug, Serialize)]
struct ExportSchedule {
    status: &'static str,
}

#[derive(Debug, Serialize)]
struct DeliveryInfo {
    destination: Destination,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Destination {
    resource_id: String,
    container: &'static str,
    root_folder_path: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct QueryDefinition {
    #[serde(rename = "type")]
    kind: &'static str,
    timeframe: &'static str,
    time_period: TimePeriod,
    data_set: DataSet,
}

#[derive(Debug, Serialize)]
struct TimePeriod {
    from: String,
    to: String,
}

#[derive(Debug, Serialize)]
struct DataSet {
    granularity: &'static str,
}

impl ExportDefinition {
    /// Definition of a one-time amortized-cost CSV export of `period`,
    /// delivered into the destination storage resource
    pub fn for_period(storage_resource_id: &str, period: &BillingPeriod) -> Self {
        let (from, to) = period.time_range();
        Self {
            properties: ExportProperties {
                schedule: ExportSchedule { status: "Inactive" },
                format: "Csv",
                delivery_info: DeliveryInfo {
                    destination: Destination {
                        resource_id: storage_resource_id.to_string(),
                        container: export::CONTAINER,
                        root_folder_path: export::ROOT_FOLDER,
                    },
                },
                definition: QueryDefinition {
                    kind: "AmortizedCost",
                    timeframe: "Custom",
                    time_period: TimePeriod { from, to },
                    data_set: DataSet {
                        granularity: "Daily",
                    },
                },
            },
        }
    }
}

/// Create a one-time export for `period`; only HTTP 201 counts as success
///
/// Returns the generated export name so the caller can trigger it.
pub async fn generate_onetime_export(
    arm: &ArmClient,
    account: &str,
    period: &BillingPeriod,
    storage_resource_id: &str,
) -> ApiResult<String> {
    let name = new_export_name();
    let definition = ExportDefinition::for_period(storage_resource_id, period);
    let path = format_path(
        EXPORT_PATH,
        &[("account", account), ("period", &period.name), ("name", &name)],
    );
    let url = arm.build_url(&path, api_versions::EXPORTS)?;

    arm.send(
        Method::PUT,
        url,
        Some(&definition),
        "export create",
        &[StatusCode::CREATED],
    )
    .await?;

    info!("Created one-time export {}", name);
    Ok(name)
}

/// Trigger a run of a just-created export; only HTTP 200 counts as success
pub async fn start_onetime_export(
    arm: &ArmClient,
    account: &str,
    period: &BillingPeriod,
    name: &str,
) -> ApiResult<()> {
    let path = format_path(
        EXPORT_RUN_PATH,
        &[("account", account), ("period", &period.name), ("name", name)],
    );
    let url = arm.build_url(&path, api_versions::EXPORTS)?;

    arm.send(
        Method::POST,
        url,
        None::<&()>,
        "export trigger",
        &[StatusCode::OK],
    )
    .await?;

    info!("Triggered one-time export {}", name);
    Ok(())
}
