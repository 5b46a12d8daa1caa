use std::collections::HashMap;
use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::{Cents, TaxInput};

pub type PersonId = Uuid;
pub type ItemId = Uuid;
pub type BillId = Uuid;

/// Tip applied to a fresh bill: 18%.
pub const DEFAULT_TIP_RATE: f64 = 0.18;

/// A participant splitting the bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    pub id: PersonId,
    pub name: String,
}

impl Person {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
        }
    }
}

/// A line item from the receipt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub name: String,
    pub price_cents: Cents,
}

impl Item {
    pub fn new(name: impl Into<String>, price_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: name.into(),
            price_cents,
        }
    }
}

/// One person's explicit share of an unevenly split item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomSplitEntry {
    pub person_id: PersonId,
    pub amount_cents: Cents,
}

/// Which people share an item.
///
/// `person_ids` order matters: it decides who receives the rounding pennies
/// of an equal split, so the same group always produces the same per-person
/// shares. A custom split overrides the equal split entirely; its entries
/// must cover people from `person_ids` and sum to the item price, which the
/// application service enforces before it reaches the calculation core.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Assignment {
    pub item_id: ItemId,
    pub person_ids: Vec<PersonId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub custom_split: Option<Vec<CustomSplitEntry>>,
}

/// The full input state of a bill being split: who is at the table, what was
/// ordered, who shares what, and how tax and tip are configured.
///
/// This is plain data owned by the caller. The calculation core reads it and
/// derives a fresh breakdown on every call; nothing here is cached.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bill {
    pub people: Vec<Person>,
    pub items: Vec<Item>,
    pub assignments: HashMap<ItemId, Assignment>,
    pub tax_input: Option<TaxInput>,
    pub tip_rate: f64,
}

impl Bill {
    pub fn new() -> Self {
        Self {
            people: Vec::new(),
            items: Vec::new(),
            assignments: HashMap::new(),
            tax_input: None,
            tip_rate: DEFAULT_TIP_RATE,
        }
    }

    pub fn person(&self, id: PersonId) -> Option<&Person> {
        self.people.iter().find(|p| p.id == id)
    }

    pub fn person_by_name(&self, name: &str) -> Option<&Person> {
        self.people.iter().find(|p| p.name == name)
    }

    pub fn item(&self, id: ItemId) -> Option<&Item> {
        self.items.iter().find(|i| i.id == id)
    }

    pub fn item_by_name(&self, name: &str) -> Option<&Item> {
        self.items.iter().find(|i| i.name == name)
    }

    pub fn add_person(&mut self, person: Person) {
        self.people.push(person);
    }

    /// Remove a person and scrub them from every assignment. Assignments
    /// left with nobody are dropped, and any custom split naming the person
    /// reverts the item to an equal split.
    pub fn remove_person(&mut self, id: PersonId) {
        self.people.retain(|p| p.id != id);

        self.assignments.retain(|_, assignment| {
            assignment.person_ids.retain(|pid| *pid != id);

            let names_person = assignment
                .custom_split
                .as_ref()
                .is_some_and(|entries| entries.iter().any(|e| e.person_id == id));
            if names_person {
                assignment.custom_split = None;
            }

            !assignment.person_ids.is_empty()
        });
    }

    pub fn add_item(&mut self, item: Item) {
        self.items.push(item);
    }

    /// Remove an item and its assignment.
    pub fn remove_item(&mut self, id: ItemId) {
        self.items.retain(|i| i.id != id);
        self.assignments.remove(&id);
    }

    /// Assign an item to the given people, replacing any previous
    /// assignment. The order of `person_ids` is preserved. An empty list
    /// removes the assignment. Any existing custom split is cleared.
    pub fn assign_item(&mut self, item_id: ItemId, person_ids: Vec<PersonId>) {
        if person_ids.is_empty() {
            self.assignments.remove(&item_id);
        } else {
            self.assignments.insert(
                item_id,
                Assignment {
                    item_id,
                    person_ids,
                    custom_split: None,
                },
            );
        }
    }

    /// Override an assigned item's equal split with explicit amounts.
    /// No-op if the item has no assignment.
    pub fn set_custom_split(&mut self, item_id: ItemId, entries: Vec<CustomSplitEntry>) {
        if let Some(assignment) = self.assignments.get_mut(&item_id) {
            assignment.custom_split = Some(entries);
        }
    }

    /// Revert an item to an equal split.
    pub fn clear_custom_split(&mut self, item_id: ItemId) {
        if let Some(assignment) = self.assignments.get_mut(&item_id) {
            assignment.custom_split = None;
        }
    }

    pub fn set_tax_input(&mut self, input: Option<TaxInput>) {
        self.tax_input = input;
    }

    pub fn set_tip_rate(&mut self, rate: f64) {
        self.tip_rate = rate;
    }

    pub fn reset(&mut self) {
        *self = Bill::new();
    }

    /// Shape-check a bill before it is handed to the calculation core.
    ///
    /// Any bill loaded from storage or imported from a file must pass this
    /// gate; bills built through the application service always do.
    pub fn validate(&self) -> Result<(), BillValidationError> {
        for person in &self.people {
            if person.name.trim().is_empty() {
                return Err(BillValidationError::BlankPersonName(person.id));
            }
        }

        for item in &self.items {
            if item.name.trim().is_empty() {
                return Err(BillValidationError::BlankItemName(item.id));
            }
            if item.price_cents < 0 {
                return Err(BillValidationError::NegativePrice {
                    item: item.name.clone(),
                    price_cents: item.price_cents,
                });
            }
        }

        for assignment in self.assignments.values() {
            let item = self
                .item(assignment.item_id)
                .ok_or(BillValidationError::UnknownItem(assignment.item_id))?;

            if assignment.person_ids.is_empty() {
                return Err(BillValidationError::EmptyAssignment(item.name.clone()));
            }

            for (i, person_id) in assignment.person_ids.iter().enumerate() {
                if self.person(*person_id).is_none() {
                    return Err(BillValidationError::UnknownPerson(*person_id));
                }
                if assignment.person_ids[..i].contains(person_id) {
                    return Err(BillValidationError::DuplicateAssignee {
                        item: item.name.clone(),
                    });
                }
            }

            if let Some(entries) = &assignment.custom_split {
                let mut sum: Cents = 0;
                for entry in entries {
                    if !assignment.person_ids.contains(&entry.person_id) {
                        return Err(BillValidationError::SplitPersonNotAssigned {
                            item: item.name.clone(),
                        });
                    }
                    if entry.amount_cents < 0 {
                        return Err(BillValidationError::NegativeSplitAmount {
                            item: item.name.clone(),
                        });
                    }
                    sum += entry.amount_cents;
                }
                if sum != item.price_cents {
                    return Err(BillValidationError::SplitSumMismatch {
                        item: item.name.clone(),
                        expected: item.price_cents,
                        actual: sum,
                    });
                }
            }
        }

        if let Some(TaxInput::Rate { rate }) = self.tax_input {
            if !(0.0..=1.0).contains(&rate) {
                return Err(BillValidationError::TaxRateOutOfRange(rate));
            }
        }
        if let Some(TaxInput::Exact { amount }) = self.tax_input {
            if amount < 0 {
                return Err(BillValidationError::NegativeTaxAmount(amount));
            }
        }
        if !(0.0..=1.0).contains(&self.tip_rate) {
            return Err(BillValidationError::TipRateOutOfRange(self.tip_rate));
        }

        Ok(())
    }
}

impl Default for Bill {
    fn default() -> Self {
        Self::new()
    }
}

/// A bill saved to history: a complete snapshot of the inputs plus the grand
/// total cached for listing.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SavedBill {
    pub id: BillId,
    pub label: Option<String>,
    pub total_cents: Cents,
    pub saved_at: DateTime<Utc>,
    pub bill: Bill,
}

impl SavedBill {
    pub fn new(bill: Bill, total_cents: Cents) -> Self {
        Self {
            id: Uuid::new_v4(),
            label: None,
            total_cents,
            saved_at: Utc::now(),
            bill,
        }
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = Some(label.into());
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum BillValidationError {
    BlankPersonName(PersonId),
    BlankItemName(ItemId),
    NegativePrice { item: String, price_cents: Cents },
    UnknownItem(ItemId),
    UnknownPerson(PersonId),
    EmptyAssignment(String),
    DuplicateAssignee { item: String },
    SplitPersonNotAssigned { item: String },
    NegativeSplitAmount { item: String },
    SplitSumMismatch { item: String, expected: Cents, actual: Cents },
    TaxRateOutOfRange(f64),
    NegativeTaxAmount(Cents),
    TipRateOutOfRange(f64),
}

impl fmt::Display for BillValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BillValidationError::BlankPersonName(id) => {
                write!(f, "person {} has a blank name", id)
            }
            BillValidationError::BlankItemName(id) => {
                write!(f, "item {} has a blank name", id)
            }
            BillValidationError::NegativePrice { item, price_cents } => {
                write!(f, "item '{}' has a negative price ({} cents)", item, price_cents)
            }
            BillValidationError::UnknownItem(id) => {
                write!(f, "assignment references unknown item {}", id)
            }
            BillValidationError::UnknownPerson(id) => {
                write!(f, "assignment references unknown person {}", id)
            }
            BillValidationError::EmptyAssignment(item) => {
                write!(f, "assignment for item '{}' has no people", item)
            }
            BillValidationError::DuplicateAssignee { item } => {
                write!(f, "assignment for item '{}' lists a person twice", item)
            }
            BillValidationError::SplitPersonNotAssigned { item } => {
                write!(f, "custom split for item '{}' names an unassigned person", item)
            }
            BillValidationError::NegativeSplitAmount { item } => {
                write!(f, "custom split for item '{}' has a negative amount", item)
            }
            BillValidationError::SplitSumMismatch {
                item,
                expected,
                actual,
            } => {
                write!(
                    f,
                    "custom split for item '{}' sums to {} cents, expected {}",
                    item, actual, expected
                )
            }
            BillValidationError::TaxRateOutOfRange(rate) => {
                write!(f, "tax rate {} is outside [0, 1]", rate)
            }
            BillValidationError::NegativeTaxAmount(amount) => {
                write!(f, "exact tax amount {} cents is negative", amount)
            }
            BillValidationError::TipRateOutOfRange(rate) => {
                write!(f, "tip rate {} is outside [0, 1]", rate)
            }
        }
    }
}

impl std::error::Error for BillValidationError {}
