//! Watch command implementation

use super::RunOptions;
use crate::config::Config;
use crate::watch::{SingleOutcome, Watcher};
use chrono::NaiveDate;
use clap::Args;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct WatchArgs {
    /// Departure date (YYYY-MM-DD)
    #[arg(short, long)]
    pub date: Option<NaiveDate>,

    #[command(flatten)]
    pub options: RunOptions,
}

impl WatchArgs {
    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        if let Some(date) = self.date {
            config.route.date = Some(date);
        }
        self.options.apply(&mut config);
        config.validate()?;
        let date = config.target_date()?;

        let span = tracing::info_span!("run", run_id = %Uuid::new_v4(), mode = "watch");
        async move {
            tracing::info!(
                origin = %config.route.origin,
                destination = %config.route.destination,
                %date,
                "Starting single-date watch"
            );
            let watcher = Watcher::from_config(&config, self.options.flags());
            match watcher.run_single(date).await? {
                SingleOutcome::Unreadable => tracing::warn!("Finished without a price"),
                SingleOutcome::Initialized { price } => {
                    tracing::info!(price, "Finished, first price recorded")
                }
                SingleOutcome::Compared { old, new, reported } => {
                    tracing::info!(old, new, reported, "Finished")
                }
            }
            Ok(())
        }
        .instrument(span)
        .await
    }
}
