//! Month command implementation

use super::RunOptions;
use crate::config::Config;
use crate::watch::Watcher;
use clap::Args;
use tracing::Instrument;
use uuid::Uuid;

#[derive(Args, Debug)]
pub struct MonthArgs {
    /// Target year
    #[arg(short, long)]
    pub year: Option<i32>,

    /// Target month (1-12)
    #[arg(short, long)]
    pub month: Option<u32>,

    /// Send the digest even when nothing changed
    #[arg(long)]
    pub always_send: bool,

    #[command(flatten)]
    pub options: RunOptions,
}

impl MonthArgs {
    pub async fn execute(&self, mut config: Config) -> anyhow::Result<()> {
        if let Some(year) = self.year {
            config.route.year = Some(year);
        }
        if let Some(month) = self.month {
            config.route.month = Some(month);
        }
        if self.always_send {
            config.notify.always_send = true;
        }
        self.options.apply(&mut config);
        config.validate()?;
        let (year, month) = config.target_month()?;

        let span = tracing::info_span!("run", run_id = %Uuid::new_v4(), mode = "month");
        async move {
            tracing::info!(
                origin = %config.route.origin,
                destination = %config.route.destination,
                year,
                month,
                "Starting month watch"
            );
            let watcher = Watcher::from_config(&config, self.options.flags());
            let outcome = watcher.run_month(year, month).await?;
            tracing::info!(
                priced = outcome.snapshot.len(),
                changes = outcome.changes.len(),
                digest_sent = outcome.digest_sent,
                truncated = outcome.truncated,
                commit = ?outcome.commit,
                "Finished"
            );
            Ok(())
        }
        .instrument(span)
        .await
    }
}
