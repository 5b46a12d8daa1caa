use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::io::Write;

use crate::application::BillService;
use crate::domain::SavedBill;

/// History snapshot for full JSON export
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryExport {
    pub version: String,
    pub exported_at: DateTime<Utc>,
    pub bills: Vec<SavedBill>,
}

/// Exporter for converting bill data to various formats
pub struct Exporter<'a> {
    service: &'a BillService,
}

impl<'a> Exporter<'a> {
    pub fn new(service: &'a BillService) -> Self {
        Self { service }
    }

    /// Export the current bill's per-person summary to CSV format.
    /// One row per person, plus a final bill-level row.
    pub async fn export_summary_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let summary = self.service.summary().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record([
            "person",
            "items_subtotal_cents",
            "tax_share_cents",
            "tip_share_cents",
            "total_cents",
        ])?;

        let mut count = 0;
        for breakdown in &summary.person_breakdowns {
            csv_writer.write_record([
                breakdown.person_name.clone(),
                breakdown.items_subtotal.to_string(),
                breakdown.tax_share.to_string(),
                breakdown.tip_share.to_string(),
                breakdown.total.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.write_record([
            "(bill)".to_string(),
            summary.bill_subtotal.to_string(),
            summary.total_tax.to_string(),
            summary.total_tip.to_string(),
            summary.grand_total.to_string(),
        ])?;

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the current bill's full summary as JSON.
    pub async fn export_summary_json<W: Write>(&self, mut writer: W) -> Result<()> {
        let summary = self.service.summary().await?;
        let json = serde_json::to_string_pretty(&summary)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;
        Ok(())
    }

    /// Export history metadata to CSV format.
    pub async fn export_history_csv<W: Write>(&self, writer: W) -> Result<usize> {
        let entries = self.service.history().await?;
        let mut csv_writer = csv::Writer::from_writer(writer);

        // Write header
        csv_writer.write_record(["id", "label", "saved_at", "total_cents"])?;

        let mut count = 0;
        for entry in &entries {
            csv_writer.write_record([
                entry.id.to_string(),
                entry.label.clone().unwrap_or_default(),
                entry.saved_at.to_rfc3339(),
                entry.total_cents.to_string(),
            ])?;
            count += 1;
        }

        csv_writer.flush()?;
        Ok(count)
    }

    /// Export the full history (snapshots included) as JSON.
    pub async fn export_history_json<W: Write>(&self, mut writer: W) -> Result<HistoryExport> {
        let entries = self.service.history().await?;

        let mut bills = Vec::with_capacity(entries.len());
        for entry in &entries {
            bills.push(self.service.saved_bill(entry.id).await?);
        }

        let export = HistoryExport {
            version: env!("CARGO_PKG_VERSION").to_string(),
            exported_at: Utc::now(),
            bills,
        };

        let json = serde_json::to_string_pretty(&export)?;
        writer.write_all(json.as_bytes())?;
        writer.flush()?;

        Ok(export)
    }
}
