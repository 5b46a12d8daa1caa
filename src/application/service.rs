use crate::domain::{
    compute_person_totals, Bill, BillId, BillSummary, Cents, CustomSplitEntry, Item, Person,
    SavedBill, TaxInput,
};
use crate::storage::{HistoryEntry, Repository};

use super::AppError;

/// Application service providing high-level operations on the current bill
/// and the saved-bill history. This is the primary interface for any client
/// (CLI, TUI, API, etc.).
///
/// The service is the "producer" the calculation core trusts: it validates
/// names, amounts, rates, and custom-split invariants before anything is
/// persisted, so the core's allocation guards never trip in normal use.
pub struct BillService {
    repo: Repository,
}

impl BillService {
    /// Create a new bill service with the given repository.
    pub fn new(repo: Repository) -> Self {
        Self { repo }
    }

    /// Initialize a new database at the given path.
    pub async fn init(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}?mode=rwc", database_path);
        let repo = Repository::init(&db_url).await?;
        Ok(Self::new(repo))
    }

    /// Connect to an existing database.
    pub async fn connect(database_path: &str) -> Result<Self, AppError> {
        let db_url = format!("sqlite:{}", database_path);
        let repo = Repository::connect(&db_url).await?;
        Ok(Self::new(repo))
    }

    // ========================
    // Current bill
    // ========================

    /// Load the current bill.
    ///
    /// Stored state that fails shape validation is replaced with an empty
    /// default bill (with a warning on stderr) instead of being handed to
    /// the calculation core.
    pub async fn bill(&self) -> Result<Bill, AppError> {
        let bill = self.repo.load_bill().await?;
        match bill.validate() {
            Ok(()) => Ok(bill),
            Err(err) => {
                eprintln!("Warning: stored bill state is invalid ({}), starting fresh", err);
                Ok(Bill::new())
            }
        }
    }

    /// Compute the full per-person breakdown for the current bill.
    pub async fn summary(&self) -> Result<BillSummary, AppError> {
        let bill = self.bill().await?;
        Self::summarize(&bill)
    }

    fn summarize(bill: &Bill) -> Result<BillSummary, AppError> {
        Ok(compute_person_totals(
            &bill.people,
            &bill.items,
            &bill.assignments,
            bill.tax_input.as_ref(),
            bill.tip_rate,
        )?)
    }

    /// Empty the current bill back to its defaults.
    pub async fn reset(&self) -> Result<(), AppError> {
        Ok(self.repo.store_bill(&Bill::new()).await?)
    }

    /// Replace the current bill with an already validated snapshot.
    /// Used by snapshot import.
    pub async fn replace_bill(&self, bill: Bill) -> Result<(), AppError> {
        bill.validate()
            .map_err(|e| AppError::InvalidSnapshot(e.to_string()))?;
        Ok(self.repo.store_bill(&bill).await?)
    }

    // ========================
    // People
    // ========================

    /// Add a person to the current bill.
    pub async fn add_person(&self, name: &str) -> Result<Person, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::EmptyName);
        }

        let bill = self.bill().await?;
        if bill.person_by_name(name).is_some() {
            return Err(AppError::PersonAlreadyExists(name.to_string()));
        }

        let person = Person::new(name);
        self.repo.save_person(&person).await?;
        Ok(person)
    }

    /// Remove a person. Their assignments are scrubbed: items they shared
    /// stay with the remaining people, and custom splits naming them revert
    /// the item to an equal split.
    pub async fn remove_person(&self, name: &str) -> Result<Person, AppError> {
        let bill = self.bill().await?;
        let person = bill
            .person_by_name(name.trim())
            .cloned()
            .ok_or_else(|| AppError::PersonNotFound(name.to_string()))?;

        self.repo.delete_person(person.id).await?;
        Ok(person)
    }

    /// List the people on the current bill.
    pub async fn list_people(&self) -> Result<Vec<Person>, AppError> {
        Ok(self.repo.list_people().await?)
    }

    // ========================
    // Items
    // ========================

    /// Add an item to the current bill.
    pub async fn add_item(&self, name: &str, price_cents: Cents) -> Result<Item, AppError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::EmptyName);
        }
        if price_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Price must be non-negative".to_string(),
            ));
        }

        let bill = self.bill().await?;
        if bill.item_by_name(name).is_some() {
            return Err(AppError::ItemAlreadyExists(name.to_string()));
        }

        let item = Item::new(name, price_cents);
        self.repo.save_item(&item).await?;
        Ok(item)
    }

    /// Remove an item along with its assignment.
    pub async fn remove_item(&self, name: &str) -> Result<Item, AppError> {
        let bill = self.bill().await?;
        let item = bill
            .item_by_name(name.trim())
            .cloned()
            .ok_or_else(|| AppError::ItemNotFound(name.to_string()))?;

        self.repo.delete_item(item.id).await?;
        Ok(item)
    }

    /// List the items on the current bill.
    pub async fn list_items(&self) -> Result<Vec<Item>, AppError> {
        Ok(self.repo.list_items().await?)
    }

    // ========================
    // Assignments
    // ========================

    /// Assign an item to the given people, in the given order. The order is
    /// preserved: it decides who receives the rounding pennies of an equal
    /// split. Replaces any previous assignment and clears any custom split.
    pub async fn assign_item(
        &self,
        item_name: &str,
        person_names: &[String],
    ) -> Result<Vec<Person>, AppError> {
        let bill = self.bill().await?;
        let item = bill
            .item_by_name(item_name.trim())
            .ok_or_else(|| AppError::ItemNotFound(item_name.to_string()))?;

        let mut people = Vec::with_capacity(person_names.len());
        for name in person_names {
            let person = bill
                .person_by_name(name.trim())
                .ok_or_else(|| AppError::PersonNotFound(name.to_string()))?;
            if people.iter().any(|p: &Person| p.id == person.id) {
                return Err(AppError::DuplicateAssignee {
                    item: item.name.clone(),
                    person: person.name.clone(),
                });
            }
            people.push(person.clone());
        }

        let person_ids: Vec<_> = people.iter().map(|p| p.id).collect();
        self.repo.replace_assignment(item.id, &person_ids).await?;
        Ok(people)
    }

    /// Remove an item's assignment, leaving the item unassigned.
    /// Unassigned items still count toward the bill subtotal.
    pub async fn unassign_item(&self, item_name: &str) -> Result<Item, AppError> {
        let bill = self.bill().await?;
        let item = bill
            .item_by_name(item_name.trim())
            .cloned()
            .ok_or_else(|| AppError::ItemNotFound(item_name.to_string()))?;

        self.repo.replace_assignment(item.id, &[]).await?;
        Ok(item)
    }

    // ========================
    // Custom splits
    // ========================

    /// Override an item's equal split with explicit per-person amounts.
    ///
    /// This is where the custom-split invariant is enforced: every named
    /// person must already be assigned to the item, amounts must be
    /// non-negative, and they must sum to the item's exact price.
    pub async fn set_custom_split(
        &self,
        item_name: &str,
        entries: &[(String, Cents)],
    ) -> Result<(), AppError> {
        let bill = self.bill().await?;
        let item = bill
            .item_by_name(item_name.trim())
            .ok_or_else(|| AppError::ItemNotFound(item_name.to_string()))?;
        let assignment = bill
            .assignments
            .get(&item.id)
            .ok_or_else(|| AppError::ItemNotAssigned {
                item: item.name.clone(),
            })?;

        let mut resolved: Vec<CustomSplitEntry> = Vec::with_capacity(entries.len());
        let mut sum: Cents = 0;
        for (person_name, amount_cents) in entries {
            let person = bill
                .person_by_name(person_name.trim())
                .ok_or_else(|| AppError::PersonNotFound(person_name.to_string()))?;
            if !assignment.person_ids.contains(&person.id) {
                return Err(AppError::SplitPersonNotAssigned {
                    item: item.name.clone(),
                    person: person.name.clone(),
                });
            }
            if resolved.iter().any(|e| e.person_id == person.id) {
                return Err(AppError::DuplicateAssignee {
                    item: item.name.clone(),
                    person: person.name.clone(),
                });
            }
            if *amount_cents < 0 {
                return Err(AppError::InvalidAmount(
                    "Split amounts must be non-negative".to_string(),
                ));
            }

            sum += amount_cents;
            resolved.push(CustomSplitEntry {
                person_id: person.id,
                amount_cents: *amount_cents,
            });
        }

        if sum != item.price_cents {
            return Err(AppError::SplitSumMismatch {
                item: item.name.clone(),
                expected: item.price_cents,
                actual: sum,
            });
        }

        self.repo.set_custom_split(item.id, &resolved).await?;
        Ok(())
    }

    /// Revert an item to an equal split.
    pub async fn clear_custom_split(&self, item_name: &str) -> Result<(), AppError> {
        let bill = self.bill().await?;
        let item = bill
            .item_by_name(item_name.trim())
            .ok_or_else(|| AppError::ItemNotFound(item_name.to_string()))?;

        self.repo.clear_custom_split(item.id).await?;
        Ok(())
    }

    // ========================
    // Tax and tip
    // ========================

    /// Configure tax as a percentage of the bill subtotal.
    pub async fn set_tax_rate(&self, rate: f64) -> Result<(), AppError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(AppError::InvalidRate(rate));
        }
        Ok(self.repo.set_tax(Some(&TaxInput::Rate { rate })).await?)
    }

    /// Configure tax as an exact amount read off the receipt.
    pub async fn set_tax_exact(&self, amount_cents: Cents) -> Result<(), AppError> {
        if amount_cents < 0 {
            return Err(AppError::InvalidAmount(
                "Tax amount must be non-negative".to_string(),
            ));
        }
        Ok(self
            .repo
            .set_tax(Some(&TaxInput::Exact {
                amount: amount_cents,
            }))
            .await?)
    }

    /// Remove the tax configuration.
    pub async fn clear_tax(&self) -> Result<(), AppError> {
        Ok(self.repo.set_tax(None).await?)
    }

    /// Set the tip rate, as a decimal in [0, 1].
    pub async fn set_tip_rate(&self, rate: f64) -> Result<(), AppError> {
        if !(0.0..=1.0).contains(&rate) {
            return Err(AppError::InvalidRate(rate));
        }
        Ok(self.repo.set_tip_rate(rate).await?)
    }

    // ========================
    // History
    // ========================

    /// Snapshot the current bill into the history, caching its grand total
    /// for the listing.
    pub async fn save_bill(&self, label: Option<String>) -> Result<SavedBill, AppError> {
        let bill = self.bill().await?;
        let summary = Self::summarize(&bill)?;

        let mut saved = SavedBill::new(bill, summary.grand_total);
        if let Some(label) = label {
            saved = saved.with_label(label);
        }

        self.repo.save_bill_snapshot(&saved).await?;
        Ok(saved)
    }

    /// List saved bills, newest first.
    pub async fn history(&self) -> Result<Vec<HistoryEntry>, AppError> {
        Ok(self.repo.list_saved_bills().await?)
    }

    /// Load one saved bill, parsing and validating its snapshot.
    pub async fn saved_bill(&self, id: BillId) -> Result<SavedBill, AppError> {
        let row = self
            .repo
            .get_saved_bill(id)
            .await?
            .ok_or_else(|| AppError::SavedBillNotFound(id.to_string()))?;

        let bill: Bill = serde_json::from_str(&row.snapshot)
            .map_err(|e| AppError::InvalidSnapshot(e.to_string()))?;
        bill.validate()
            .map_err(|e| AppError::InvalidSnapshot(e.to_string()))?;

        Ok(SavedBill {
            id: row.entry.id,
            label: row.entry.label,
            total_cents: row.entry.total_cents,
            saved_at: row.entry.saved_at,
            bill,
        })
    }

    /// Recompute a saved bill's breakdown from its snapshot. Because the
    /// core derives everything from the inputs, the replayed summary is
    /// identical to what was shown when the bill was saved.
    pub async fn replay(&self, id: BillId) -> Result<(SavedBill, BillSummary), AppError> {
        let saved = self.saved_bill(id).await?;
        let summary = Self::summarize(&saved.bill)?;
        Ok((saved, summary))
    }

    /// Delete one saved bill from the history.
    pub async fn delete_saved(&self, id: BillId) -> Result<(), AppError> {
        if !self.repo.delete_saved_bill(id).await? {
            return Err(AppError::SavedBillNotFound(id.to_string()));
        }
        Ok(())
    }

    /// Delete the entire history. Returns how many bills were removed.
    pub async fn clear_history(&self) -> Result<u64, AppError> {
        Ok(self.repo.clear_history().await?)
    }
}
