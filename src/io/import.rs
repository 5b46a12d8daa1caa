use anyhow::{Context, Result};
use std::io::Read;

use crate::application::BillService;
use crate::domain::Bill;

/// Result of a snapshot import
#[derive(Debug, Clone)]
pub struct ImportResult {
    pub people: usize,
    pub items: usize,
    pub assignments: usize,
    /// False when the import was a dry run
    pub applied: bool,
}

/// Importer for loading a bill snapshot into the current bill.
///
/// The snapshot is parsed and shape-validated before anything is written;
/// an invalid snapshot is rejected with an error and the current bill is
/// left untouched.
pub struct Importer<'a> {
    service: &'a BillService,
}

impl<'a> Importer<'a> {
    pub fn new(service: &'a BillService) -> Self {
        Self { service }
    }

    /// Import a bill snapshot from JSON, replacing the current bill.
    /// With `dry_run`, the snapshot is validated and reported but nothing
    /// is written.
    pub async fn import_bill_json<R: Read>(&self, reader: R, dry_run: bool) -> Result<ImportResult> {
        let bill: Bill =
            serde_json::from_reader(reader).context("Failed to parse bill snapshot")?;
        bill.validate().context("Invalid bill snapshot")?;

        let result = ImportResult {
            people: bill.people.len(),
            items: bill.items.len(),
            assignments: bill.assignments.len(),
            applied: !dry_run,
        };

        if !dry_run {
            self.service.replace_bill(bill).await?;
        }

        Ok(result)
    }
}
