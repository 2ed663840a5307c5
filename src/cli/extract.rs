//! Extract command implementation

use crate::extract::{PriceExtractor, RegexExtractor, PRICE_FLOOR};
use crate::report::format_price;
use clap::Args;
use std::path::PathBuf;
use tokio::io::AsyncReadExt;

#[derive(Args, Debug)]
pub struct ExtractArgs {
    /// Saved page to read (stdin when absent)
    #[arg(short, long)]
    pub file: Option<PathBuf>,

    /// Smallest amount accepted as a price
    #[arg(long, default_value_t = PRICE_FLOOR)]
    pub floor: u64,

    /// Currency suffix for printed amounts
    #[arg(long, default_value = "VND")]
    pub currency: String,
}

impl ExtractArgs {
    pub async fn execute(&self) -> anyhow::Result<()> {
        let page = match &self.file {
            Some(path) => tokio::fs::read_to_string(path).await?,
            None => {
                let mut buf = String::new();
                tokio::io::stdin().read_to_string(&mut buf).await?;
                buf
            }
        };

        let extractor = RegexExtractor::with_floor(self.floor);
        let candidates = extractor.candidates(&page);
        tracing::debug!(bytes = page.len(), candidates = candidates.len(), "Scanned page");

        for price in &candidates {
            println!("{}", format_price(*price, &self.currency));
        }
        match extractor.extract(&page) {
            Some(min) => println!("min: {}", format_price(min, &self.currency)),
            None => println!("min: none"),
        }
        Ok(())
    }
}
