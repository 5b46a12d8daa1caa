use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{Row, SqlitePool};
use uuid::Uuid;

use crate::domain::{
    Assignment, Bill, BillId, Cents, CustomSplitEntry, Item, ItemId, Person, PersonId, SavedBill,
    TaxInput,
};

use super::{MIGRATION_001_INITIAL, MIGRATION_002_HISTORY};

/// Metadata for one saved bill, without the snapshot payload.
#[derive(Debug, Clone)]
pub struct HistoryEntry {
    pub id: BillId,
    pub label: Option<String>,
    pub total_cents: Cents,
    pub saved_at: DateTime<Utc>,
}

/// A saved-bill row as stored: metadata plus the raw snapshot JSON.
/// Parsing and validating the snapshot is the application layer's job.
#[derive(Debug, Clone)]
pub struct SavedBillRow {
    pub entry: HistoryEntry,
    pub snapshot: String,
}

/// Repository for persisting the current bill and the saved-bill history.
pub struct Repository {
    pool: SqlitePool,
}

impl Repository {
    /// Create a new repository with the given SQLite connection pool.
    pub fn new(pool: SqlitePool) -> Self {
        Self { pool }
    }

    /// Connect to a SQLite database at the given path.
    /// Creates the database file if it doesn't exist.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let pool = SqlitePool::connect(database_url)
            .await
            .context("Failed to connect to database")?;
        Ok(Self::new(pool))
    }

    /// Run database migrations.
    pub async fn migrate(&self) -> Result<()> {
        sqlx::query(MIGRATION_001_INITIAL)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 001")?;

        sqlx::query(MIGRATION_002_HISTORY)
            .execute(&self.pool)
            .await
            .context("Failed to run migration 002")?;

        Ok(())
    }

    /// Initialize a new database (connect + migrate).
    pub async fn init(database_url: &str) -> Result<Self> {
        let repo = Self::connect(database_url).await?;
        repo.migrate().await?;
        Ok(repo)
    }

    // ========================
    // People
    // ========================

    /// Save a new person to the current bill.
    pub async fn save_person(&self, person: &Person) -> Result<()> {
        sqlx::query("INSERT INTO people (id, name, created_at) VALUES (?, ?, ?)")
            .bind(person.id.to_string())
            .bind(&person.name)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save person")?;
        Ok(())
    }

    /// Remove a person and scrub them from every assignment: their
    /// membership rows go away, and any custom split naming them is dropped
    /// so the item reverts to an equal split.
    pub async fn delete_person(&self, id: PersonId) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let id_str = id.to_string();

        sqlx::query("DELETE FROM people WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete person")?;

        sqlx::query(
            r#"
            DELETE FROM custom_splits
            WHERE item_id IN (SELECT item_id FROM custom_splits WHERE person_id = ?)
            "#,
        )
        .bind(&id_str)
        .execute(&mut *tx)
        .await
        .context("Failed to drop custom splits naming person")?;

        sqlx::query("DELETE FROM assignment_people WHERE person_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to remove person from assignments")?;

        tx.commit().await.context("Failed to commit person removal")?;
        Ok(())
    }

    /// List the people on the current bill, in the order they were added.
    pub async fn list_people(&self) -> Result<Vec<Person>> {
        let rows = sqlx::query("SELECT id, name FROM people ORDER BY created_at, rowid")
            .fetch_all(&self.pool)
            .await
            .context("Failed to list people")?;

        rows.iter().map(Self::row_to_person).collect()
    }

    fn row_to_person(row: &sqlx::sqlite::SqliteRow) -> Result<Person> {
        let id_str: String = row.get("id");
        Ok(Person {
            id: Uuid::parse_str(&id_str).context("Invalid person ID")?,
            name: row.get("name"),
        })
    }

    // ========================
    // Items
    // ========================

    /// Save a new item to the current bill.
    pub async fn save_item(&self, item: &Item) -> Result<()> {
        sqlx::query("INSERT INTO items (id, name, price_cents, created_at) VALUES (?, ?, ?, ?)")
            .bind(item.id.to_string())
            .bind(&item.name)
            .bind(item.price_cents)
            .bind(Utc::now().to_rfc3339())
            .execute(&self.pool)
            .await
            .context("Failed to save item")?;
        Ok(())
    }

    /// Remove an item along with its assignment and custom split.
    pub async fn delete_item(&self, id: ItemId) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let id_str = id.to_string();

        sqlx::query("DELETE FROM items WHERE id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete item")?;

        sqlx::query("DELETE FROM assignment_people WHERE item_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete item assignment")?;

        sqlx::query("DELETE FROM custom_splits WHERE item_id = ?")
            .bind(&id_str)
            .execute(&mut *tx)
            .await
            .context("Failed to delete item custom split")?;

        tx.commit().await.context("Failed to commit item removal")?;
        Ok(())
    }

    /// List the items on the current bill, in the order they were added.
    pub async fn list_items(&self) -> Result<Vec<Item>> {
        let rows =
            sqlx::query("SELECT id, name, price_cents FROM items ORDER BY created_at, rowid")
                .fetch_all(&self.pool)
                .await
                .context("Failed to list items")?;

        rows.iter().map(Self::row_to_item).collect()
    }

    fn row_to_item(row: &sqlx::sqlite::SqliteRow) -> Result<Item> {
        let id_str: String = row.get("id");
        Ok(Item {
            id: Uuid::parse_str(&id_str).context("Invalid item ID")?,
            name: row.get("name"),
            price_cents: row.get("price_cents"),
        })
    }

    // ========================
    // Assignments
    // ========================

    /// Replace an item's assignment with the given people, preserving their
    /// order. Any existing custom split for the item is cleared. An empty
    /// list removes the assignment.
    pub async fn replace_assignment(&self, item_id: ItemId, person_ids: &[PersonId]) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let item_str = item_id.to_string();

        sqlx::query("DELETE FROM assignment_people WHERE item_id = ?")
            .bind(&item_str)
            .execute(&mut *tx)
            .await
            .context("Failed to clear assignment")?;

        sqlx::query("DELETE FROM custom_splits WHERE item_id = ?")
            .bind(&item_str)
            .execute(&mut *tx)
            .await
            .context("Failed to clear custom split")?;

        for (position, person_id) in person_ids.iter().enumerate() {
            sqlx::query(
                "INSERT INTO assignment_people (item_id, person_id, position) VALUES (?, ?, ?)",
            )
            .bind(&item_str)
            .bind(person_id.to_string())
            .bind(position as i64)
            .execute(&mut *tx)
            .await
            .context("Failed to save assignment member")?;
        }

        tx.commit().await.context("Failed to commit assignment")?;
        Ok(())
    }

    /// Replace an item's custom split with the given entries.
    pub async fn set_custom_split(
        &self,
        item_id: ItemId,
        entries: &[CustomSplitEntry],
    ) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;
        let item_str = item_id.to_string();

        sqlx::query("DELETE FROM custom_splits WHERE item_id = ?")
            .bind(&item_str)
            .execute(&mut *tx)
            .await
            .context("Failed to clear custom split")?;

        for entry in entries {
            sqlx::query(
                "INSERT INTO custom_splits (item_id, person_id, amount_cents) VALUES (?, ?, ?)",
            )
            .bind(&item_str)
            .bind(entry.person_id.to_string())
            .bind(entry.amount_cents)
            .execute(&mut *tx)
            .await
            .context("Failed to save custom split entry")?;
        }

        tx.commit().await.context("Failed to commit custom split")?;
        Ok(())
    }

    /// Drop an item's custom split, reverting it to an equal split.
    pub async fn clear_custom_split(&self, item_id: ItemId) -> Result<()> {
        sqlx::query("DELETE FROM custom_splits WHERE item_id = ?")
            .bind(item_id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to clear custom split")?;
        Ok(())
    }

    // ========================
    // Tax and tip configuration
    // ========================

    /// Store the tax configuration for the current bill.
    pub async fn set_tax(&self, input: Option<&TaxInput>) -> Result<()> {
        let (tax_type, tax_rate, tax_amount) = match input {
            Some(TaxInput::Rate { rate }) => (Some("rate"), Some(*rate), None),
            Some(TaxInput::Exact { amount }) => (Some("exact"), None, Some(*amount)),
            None => (None, None, None),
        };

        sqlx::query(
            "UPDATE bill_config SET tax_type = ?, tax_rate = ?, tax_amount_cents = ? WHERE id = 1",
        )
        .bind(tax_type)
        .bind(tax_rate)
        .bind(tax_amount)
        .execute(&self.pool)
        .await
        .context("Failed to save tax configuration")?;
        Ok(())
    }

    /// Store the tip rate for the current bill.
    pub async fn set_tip_rate(&self, rate: f64) -> Result<()> {
        sqlx::query("UPDATE bill_config SET tip_rate = ? WHERE id = 1")
            .bind(rate)
            .execute(&self.pool)
            .await
            .context("Failed to save tip rate")?;
        Ok(())
    }

    // ========================
    // Whole-bill operations
    // ========================

    /// Assemble the current bill from storage.
    pub async fn load_bill(&self) -> Result<Bill> {
        let people = self.list_people().await?;
        let items = self.list_items().await?;

        let mut bill = Bill::new();
        bill.people = people;
        bill.items = items;

        let member_rows = sqlx::query(
            "SELECT item_id, person_id FROM assignment_people ORDER BY item_id, position",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load assignments")?;

        for row in &member_rows {
            let item_id: String = row.get("item_id");
            let person_id: String = row.get("person_id");
            let item_id = Uuid::parse_str(&item_id).context("Invalid item ID in assignment")?;
            let person_id =
                Uuid::parse_str(&person_id).context("Invalid person ID in assignment")?;

            bill.assignments
                .entry(item_id)
                .or_insert_with(|| Assignment {
                    item_id,
                    person_ids: Vec::new(),
                    custom_split: None,
                })
                .person_ids
                .push(person_id);
        }

        let split_rows = sqlx::query(
            "SELECT item_id, person_id, amount_cents FROM custom_splits ORDER BY item_id, rowid",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to load custom splits")?;

        for row in &split_rows {
            let item_id: String = row.get("item_id");
            let person_id: String = row.get("person_id");
            let item_id = Uuid::parse_str(&item_id).context("Invalid item ID in custom split")?;
            let person_id =
                Uuid::parse_str(&person_id).context("Invalid person ID in custom split")?;
            let entry = CustomSplitEntry {
                person_id,
                amount_cents: row.get("amount_cents"),
            };

            let assignment = bill
                .assignments
                .get_mut(&item_id)
                .ok_or_else(|| anyhow::anyhow!("Custom split for unassigned item {}", item_id))?;
            assignment.custom_split.get_or_insert_with(Vec::new).push(entry);
        }

        let config = sqlx::query(
            "SELECT tax_type, tax_rate, tax_amount_cents, tip_rate FROM bill_config WHERE id = 1",
        )
        .fetch_one(&self.pool)
        .await
        .context("Failed to load bill configuration")?;

        let tax_type: Option<String> = config.get("tax_type");
        bill.tax_input = match tax_type.as_deref() {
            None => None,
            Some("rate") => {
                let rate: Option<f64> = config.get("tax_rate");
                Some(TaxInput::Rate {
                    rate: rate.context("Tax rate missing for rate-type tax")?,
                })
            }
            Some("exact") => {
                let amount: Option<Cents> = config.get("tax_amount_cents");
                Some(TaxInput::Exact {
                    amount: amount.context("Tax amount missing for exact-type tax")?,
                })
            }
            Some(other) => anyhow::bail!("Invalid tax type: {}", other),
        };
        bill.tip_rate = config.get("tip_rate");

        Ok(bill)
    }

    /// Replace the entire current bill in one transaction.
    /// Used by snapshot import and reset.
    pub async fn store_bill(&self, bill: &Bill) -> Result<()> {
        let mut tx = self.pool.begin().await.context("Failed to begin transaction")?;

        for table in ["people", "items", "assignment_people", "custom_splits"] {
            sqlx::query(&format!("DELETE FROM {}", table))
                .execute(&mut *tx)
                .await
                .with_context(|| format!("Failed to clear {}", table))?;
        }

        let now = Utc::now().to_rfc3339();
        for person in &bill.people {
            sqlx::query("INSERT INTO people (id, name, created_at) VALUES (?, ?, ?)")
                .bind(person.id.to_string())
                .bind(&person.name)
                .bind(&now)
                .execute(&mut *tx)
                .await
                .context("Failed to store person")?;
        }

        for item in &bill.items {
            sqlx::query(
                "INSERT INTO items (id, name, price_cents, created_at) VALUES (?, ?, ?, ?)",
            )
            .bind(item.id.to_string())
            .bind(&item.name)
            .bind(item.price_cents)
            .bind(&now)
            .execute(&mut *tx)
            .await
            .context("Failed to store item")?;
        }

        for assignment in bill.assignments.values() {
            for (position, person_id) in assignment.person_ids.iter().enumerate() {
                sqlx::query(
                    "INSERT INTO assignment_people (item_id, person_id, position) VALUES (?, ?, ?)",
                )
                .bind(assignment.item_id.to_string())
                .bind(person_id.to_string())
                .bind(position as i64)
                .execute(&mut *tx)
                .await
                .context("Failed to store assignment member")?;
            }

            if let Some(entries) = &assignment.custom_split {
                for entry in entries {
                    sqlx::query(
                        "INSERT INTO custom_splits (item_id, person_id, amount_cents) VALUES (?, ?, ?)",
                    )
                    .bind(assignment.item_id.to_string())
                    .bind(entry.person_id.to_string())
                    .bind(entry.amount_cents)
                    .execute(&mut *tx)
                    .await
                    .context("Failed to store custom split entry")?;
                }
            }
        }

        let (tax_type, tax_rate, tax_amount) = match bill.tax_input {
            Some(TaxInput::Rate { rate }) => (Some("rate"), Some(rate), None),
            Some(TaxInput::Exact { amount }) => (Some("exact"), None, Some(amount)),
            None => (None, None, None),
        };
        sqlx::query(
            "UPDATE bill_config SET tax_type = ?, tax_rate = ?, tax_amount_cents = ?, tip_rate = ? WHERE id = 1",
        )
        .bind(tax_type)
        .bind(tax_rate)
        .bind(tax_amount)
        .bind(bill.tip_rate)
        .execute(&mut *tx)
        .await
        .context("Failed to store bill configuration")?;

        tx.commit().await.context("Failed to commit bill")?;
        Ok(())
    }

    // ========================
    // History
    // ========================

    /// Save a bill snapshot to the history.
    pub async fn save_bill_snapshot(&self, saved: &SavedBill) -> Result<()> {
        let snapshot =
            serde_json::to_string(&saved.bill).context("Failed to serialize bill snapshot")?;

        sqlx::query(
            r#"
            INSERT INTO saved_bills (id, label, total_cents, saved_at, snapshot)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(saved.id.to_string())
        .bind(&saved.label)
        .bind(saved.total_cents)
        .bind(saved.saved_at.to_rfc3339())
        .bind(&snapshot)
        .execute(&self.pool)
        .await
        .context("Failed to save bill to history")?;
        Ok(())
    }

    /// List saved bills, newest first. Snapshot payloads are not loaded.
    pub async fn list_saved_bills(&self) -> Result<Vec<HistoryEntry>> {
        let rows = sqlx::query(
            "SELECT id, label, total_cents, saved_at FROM saved_bills ORDER BY saved_at DESC",
        )
        .fetch_all(&self.pool)
        .await
        .context("Failed to list saved bills")?;

        rows.iter().map(Self::row_to_history_entry).collect()
    }

    /// Fetch one saved bill with its raw snapshot JSON.
    pub async fn get_saved_bill(&self, id: BillId) -> Result<Option<SavedBillRow>> {
        let row = sqlx::query(
            "SELECT id, label, total_cents, saved_at, snapshot FROM saved_bills WHERE id = ?",
        )
        .bind(id.to_string())
        .fetch_optional(&self.pool)
        .await
        .context("Failed to fetch saved bill")?;

        match row {
            Some(row) => Ok(Some(SavedBillRow {
                entry: Self::row_to_history_entry(&row)?,
                snapshot: row.get("snapshot"),
            })),
            None => Ok(None),
        }
    }

    /// Delete one saved bill. Returns false if the id was unknown.
    pub async fn delete_saved_bill(&self, id: BillId) -> Result<bool> {
        let result = sqlx::query("DELETE FROM saved_bills WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .context("Failed to delete saved bill")?;
        Ok(result.rows_affected() > 0)
    }

    /// Delete every saved bill. Returns how many were removed.
    pub async fn clear_history(&self) -> Result<u64> {
        let result = sqlx::query("DELETE FROM saved_bills")
            .execute(&self.pool)
            .await
            .context("Failed to clear history")?;
        Ok(result.rows_affected())
    }

    fn row_to_history_entry(row: &sqlx::sqlite::SqliteRow) -> Result<HistoryEntry> {
        let id_str: String = row.get("id");
        let saved_at_str: String = row.get("saved_at");

        Ok(HistoryEntry {
            id: Uuid::parse_str(&id_str).context("Invalid saved bill ID")?,
            label: row.get("label"),
            total_cents: row.get("total_cents"),
            saved_at: DateTime::parse_from_rfc3339(&saved_at_str)
                .context("Invalid saved_at timestamp")?
                .with_timezone(&Utc),
        })
    }
}
