//! Command handlers for the EA fetcher CLI
//!
//! One handler per pipeline. Both share account resolution and period
//! selection, then process the selected periods strictly one at a time;
//! the first failure aborts the whole run.

use std::sync::Arc;

use tracing::{debug, info};

use crate::app::{billing, export, usage, ArmClient, BlobClient, ClientConfig};
use crate::auth::AzureCliCredential;
use crate::cli::{ExportArgs, PullArgs};
use crate::cli::progress::PollSpinner;
use crate::config::FetcherConfig;
use crate::errors::Result;

/// Resolved inputs shared by both pipelines
struct PipelineContext {
    arm: ArmClient,
    account: String,
    periods: Vec<crate::app::BillingPeriod>,
}

/// Resolve the billing account and the billing periods to process
async fn resolve_context(
    account_override: Option<&str>,
    period_names: &[String],
) -> Result<PipelineContext> {
    let http = ClientConfig::default().build_http_client()?;
    let credential = Arc::new(AzureCliCredential::new());
    let arm = ArmClient::new(http, credential);

    let account = match account_override {
        // Explicit override skips discovery entirely
        Some(name) => name.to_string(),
        None => {
            let eligible = billing::list_eligible_accounts(&arm).await?;
            billing::resolve_account(None, eligible)?
        }
    };
    println!("Account Selected: {account}");

    let subscription_id = arm.credential().subscription_id().await?;
    debug!("Billing periods scoped to subscription {}", subscription_id);

    let periods = if period_names.is_empty() {
        vec![billing::select_billing_period(&arm, &subscription_id).await?]
    } else {
        billing::get_billing_periods(&arm, &subscription_id, period_names).await?
    };

    Ok(PipelineContext {
        arm,
        account,
        periods,
    })
}

/// Handle the pull command (Pipeline A)
///
/// For each selected period: generate usage data on demand, then copy the
/// resulting signed URL server-side into the destination storage account and
/// wait for the copy to finish.
pub async fn handle_pull(args: PullArgs, config: FetcherConfig, quiet: bool) -> Result<()> {
    let context = resolve_context(
        args.billing_account_name.as_deref(),
        &args.billing_periods,
    )
    .await?;

    // Storage may live in a different subscription than the billing calls
    let storage_credential = Arc::new(match &args.storage_account_subscription {
        Some(subscription) => AzureCliCredential::for_subscription(subscription),
        None => AzureCliCredential::new(),
    });
    let storage_http = ClientConfig::default().build_http_client()?;
    let blob_client = BlobClient::new(storage_http, storage_credential);

    for period in &context.periods {
        let label = period.export_label();
        info!("Processing period {} (label {})", period, label);

        println!("Generating usage data (this can take 5 to 10 minutes)...");
        let spinner = PollSpinner::start("Generate data status: InProgress", quiet);
        let download = usage::generate_usage_download(
            &context.arm,
            &context.account,
            &period.name,
            config.polling.usage_poll(),
            |status| spinner.update(format!("Generate data status: {status}")),
        )
        .await?;
        spinner.finish(format!("Usage data generated for {}", period.name));

        let blob_url = blob_client.blob_url(
            &args.storage_account_name,
            &config.delivery.container,
            &config.delivery.blob_path(&label),
        )?;
        let copy_spinner = PollSpinner::start("Blob is transferring...", quiet);
        let final_state = blob_client
            .copy_and_wait(
                blob_url,
                &download.download_url,
                &config.polling,
                |state| {
                    copy_spinner.update(format!(
                        "Blob is transferring... {} {} {}",
                        state.status.as_deref().unwrap_or(""),
                        state.progress.as_deref().unwrap_or(""),
                        state.description.as_deref().unwrap_or(""),
                    ));
                },
            )
            .await?;
        copy_spinner.finish(format!(
            "Transfer ended: {} {}",
            final_state.status.as_deref().unwrap_or(""),
            final_state.progress.as_deref().unwrap_or(""),
        ));
    }

    println!("Data load complete.");
    Ok(())
}

/// Handle the export command (Pipeline B)
///
/// For each selected period: create a one-time export definition and trigger
/// it once. The export runs on the service side; nothing further is polled.
pub async fn handle_export(args: ExportArgs, _config: FetcherConfig, _quiet: bool) -> Result<()> {
    let context = resolve_context(
        args.billing_account_name.as_deref(),
        &args.billing_periods,
    )
    .await?;

    for period in &context.periods {
        info!("Processing period {}", period);

        let name = export::generate_onetime_export(
            &context.arm,
            &context.account,
            period,
            &args.storage_resource_id,
        )
        .await?;
        // The trigger only runs once creation came back 201
        export::start_onetime_export(&context.arm, &context.account, period, &name).await?;

        println!("Export {name} triggered for period {period}");
    }

    Ok(())
}
