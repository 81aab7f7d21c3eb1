//! Sync subcommand: run one fetch cycle against the portal.

use clap::Args;
use glucosync_core::storage::data_dir;
use glucosync_core::{
    CheckpointStore, Config, CycleOptions, PortalClient, StoredSessionAuthenticator,
    SyncOrchestrator,
};

#[derive(Args)]
pub struct SyncArgs {
    /// Look-back horizon for a full fetch, in hours (overrides config)
    #[arg(long)]
    pub lookback_hours: Option<i64>,
    /// Ignore the checkpoint and fetch the full window
    #[arg(long)]
    pub force_full: bool,
    /// Emit the normalized records as JSON on stdout
    #[arg(long)]
    pub json: bool,
}

pub fn run(args: SyncArgs) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::load_or_default();
    let settings = config.sync_settings();

    // The portal client blocks on an ambient tokio runtime.
    let rt = tokio::runtime::Runtime::new()?;
    let _guard = rt.enter();

    let client = PortalClient::new(&config.portal.base_url, config.portal.timeout_secs)?;
    let store = CheckpointStore::new(&data_dir()?);
    let mut orchestrator = SyncOrchestrator::new(
        StoredSessionAuthenticator::new(),
        client,
        store,
        settings,
    );

    let result = orchestrator.run_cycle(&CycleOptions {
        lookback_hours: args.lookback_hours,
        force_full: args.force_full,
    });

    if args.json {
        println!("{}", serde_json::to_string_pretty(&result.records)?);
    } else {
        for record in &result.records {
            println!(
                "{}  {:>4} mg/dL  ({:>5.1} mmol/L)  {}",
                record.local_time, record.sgv, record.sgv_native,
                record.direction.as_str()
            );
        }
        println!(
            "{} record(s) in {} ms",
            result.records.len(),
            result.duration_millis
        );
    }

    match result.error {
        Some(error) => Err(error.into()),
        None => Ok(()),
    }
}
