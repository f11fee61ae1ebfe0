//! CSV export and the AI summary collaborator.
//!
//! The summary service is external: it takes a CSV blob and returns prose. It is
//! reached through the [`Summarizer`] trait and its failures are handed straight
//! back to the caller without retries.

use crate::{
    core::{context::LedgerContext, partner::find_partner, transaction::list_transactions_for_partner},
    entities::transaction,
    errors::{Error, Result},
};
use async_trait::async_trait;
use rust_decimal::Decimal;
use serde::Serialize;
use tracing::{info, instrument, warn};

/// Boxed error returned by a [`Summarizer`].
pub type SummarizerError = Box<dyn std::error::Error + Send + Sync>;

/// Turns a CSV export into a natural-language summary.
#[async_trait]
pub trait Summarizer: Send + Sync {
    /// Summarizes `csv`, which starts with a header row.
    async fn summarize(&self, csv: &str) -> std::result::Result<String, SummarizerError>;
}

#[derive(Serialize)]
struct CsvRow<'a> {
    id: i64,
    created_at: String,
    client: &'a str,
    partner: &'a str,
    amount: Decimal,
    receipt_no: &'a str,
    status: &'a str,
    recorded_by: &'a str,
}

/// Writes transactions as CSV with a header row, in the order given.
pub fn export_transactions_csv(transactions: &[transaction::Model]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());

    for t in transactions {
        writer.serialize(CsvRow {
            id: t.id,
            created_at: t.created_at.to_rfc3339(),
            client: &t.client_name,
            partner: &t.partner_name,
            amount: t.amount.0.round_dp(2),
            receipt_no: &t.receipt_no,
            status: t.status.as_str(),
            recorded_by: &t.recorded_by,
        })?;
    }

    let bytes = writer.into_inner().map_err(|e| Error::Io(e.into_error()))?;
    String::from_utf8(bytes)
        .map_err(|e| Error::Io(std::io::Error::new(std::io::ErrorKind::InvalidData, e)))
}

/// Summarizes the transactions of a partner through `summarizer`. Admin only.
///
/// # Arguments
/// * `summarizer` - Service that turns the CSV export into prose
/// * `partner_id` - The partner whose transactions are exported
///
/// # Errors
/// - [`Error::Validation`] when the partner has no transactions to summarize
/// - [`Error::Summary`] when the collaborator fails
#[instrument(skip(ctx, summarizer), fields(hotel_id = ctx.hotel_id))]
pub async fn summarize_partner_activity(
    ctx: &LedgerContext,
    summarizer: &dyn Summarizer,
    partner_id: i64,
) -> Result<String> {
    ctx.actor.require_admin("summarize partner activity")?;

    let partner = find_partner(&ctx.db, ctx.hotel_id, partner_id).await?;
    let transactions = list_transactions_for_partner(ctx, partner_id).await?;
    if transactions.is_empty() {
        return Err(Error::validation(format!(
            "Partner '{}' has no transactions to summarize",
            partner.name
        )));
    }

    let csv = export_transactions_csv(&transactions)?;
    let summary = summarizer.summarize(&csv).await.map_err(|e| {
        warn!(partner_id, error = %e, "Summary service failed");
        Error::Summary {
            message: e.to_string(),
        }
    })?;

    info!(partner_id, rows = transactions.len(), "Partner activity summarized");
    Ok(summary)
}

#[cfg(test)]
mod tests {
    #![allow(clippy::unwrap_used)]
    use super::*;
    use crate::test_utils::*;
    use rust_decimal_macros::dec;
    use std::sync::Mutex;

    /// Records what it was asked and answers with a canned summary.
    struct CannedSummarizer {
        seen: Mutex<Vec<String>>,
        fail: bool,
    }

    impl CannedSummarizer {
        fn new(fail: bool) -> Self {
            Self {
                seen: Mutex::new(Vec::new()),
                fail,
            }
        }
    }

    #[async_trait]
    impl Summarizer for CannedSummarizer {
        async fn summarize(&self, csv: &str) -> std::result::Result<String, SummarizerError> {
            self.seen.lock().unwrap().push(csv.to_string());
            if self.fail {
                return Err("model unavailable".into());
            }
            Ok(format!("{} rows", csv.lines().count() - 1))
        }
    }

    #[test]
    fn test_export_empty_has_no_rows() {
        assert_eq!(export_transactions_csv(&[]).unwrap(), "");
    }

    #[tokio::test]
    async fn test_export_transactions_csv() -> Result<()> {
        let ctx = setup_admin_context().await?;
        let (partner, client) = setup_started_partner_with_client(&ctx, 2, dec!(2000)).await?;
        record_test_transaction(&ctx, client.id, dec!(1200)).await?;

        let transactions = list_transactions_for_partner(&ctx, partner.id).await?;
        let csv = export_transactions_csv(&transactions)?;
        let mut lines = csv.lines();
        assert_eq!(
            lines.next(),
            Some("id,created_at,client,partner,amount,receipt_no,status,recorded_by")
        );
        let row = lines.next().unwrap();
        assert!(row.contains(",Alice,Acme,1200,"));
        assert!(row.ends_with(",flagged,ops"));
        assert!(lines.next().is_none());
        Ok(())
    }

    #[tokio::test]
    async fn test_summarize_partner_activity() -> Result<()> {
        let ctx = setup_admin_context().await?;
        let (partner, client) = setup_started_partner_with_client(&ctx, 2, dec!(2000)).await?;

        let summarizer = CannedSummarizer::new(false);
        let empty = summarize_partner_activity(&ctx, &summarizer, partner.id).await;
        assert!(matches!(empty, Err(Error::Validation { .. })));

        record_test_transaction(&ctx, client.id, dec!(20)).await?;
        record_test_transaction(&ctx, client.id, dec!(30)).await?;

        let summary = summarize_partner_activity(&ctx, &summarizer, partner.id).await?;
        assert_eq!(summary, "2 rows");
        assert_eq!(summarizer.seen.lock().unwrap().len(), 1);
        Ok(())
    }

    #[tokio::test]
    async fn test_summarizer_failure_is_surfaced() -> Result<()> {
        let ctx = setup_admin_context().await?;
        let (partner, client) = setup_started_partner_with_client(&ctx, 2, dec!(2000)).await?;
        record_test_transaction(&ctx, client.id, dec!(20)).await?;

        let summarizer = CannedSummarizer::new(true);
        let result = summarize_partner_activity(&ctx, &summarizer, partner.id).await;
        assert!(matches!(result, Err(Error::Summary { ref message }) if message == "model unavailable"));
        Ok(())
    }
}
