// file: src/notifier/console.rs
// description: prints batches to stdout instead of posting them, for dry runs

use crate::error::Result;
use crate::models::MessageBatch;
use crate::notifier::ChatNotifier;
use crate::notifier::teams::{card_subtitle, card_title};
use async_trait::async_trait;

#[derive(Debug, Default)]
pub struct ConsoleNotifier;

#[async_trait]
impl ChatNotifier for ConsoleNotifier {
    async fn post(&self, batch: &MessageBatch) -> Result<()> {
        println!("{}", "=".repeat(80));
        println!("{}", card_title(batch));
        println!("{}", card_subtitle(batch));
        println!("{}", "-".repeat(80));
        println!("{}", batch.body());
        Ok(())
    }
}
