use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::{
    calculate_tax, calculate_tip, distribute_tax, distribute_tip, split_equally, AllocationError,
    Assignment, Cents, Item, ItemId, Person, PersonId, TaxInput,
};

/// One item's contribution to one person's bill.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonItemDetail {
    pub item_id: ItemId,
    pub item_name: String,
    /// Original item price
    pub full_price_cents: Cents,
    /// What this person pays for this item
    pub share_cents: Cents,
    /// How many people share this item
    pub split_count: usize,
    pub is_custom_split: bool,
}

/// Complete financial breakdown for one person.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PersonBreakdown {
    pub person_id: PersonId,
    pub person_name: String,
    pub items: Vec<PersonItemDetail>,
    pub items_subtotal: Cents,
    pub tax_share: Cents,
    pub tip_share: Cents,
    /// items_subtotal + tax_share + tip_share
    pub total: Cents,
}

/// Bill-level summary with per-person breakdowns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BillSummary {
    pub person_breakdowns: Vec<PersonBreakdown>,
    /// Sum of all item prices, assigned or not
    pub bill_subtotal: Cents,
    pub total_tax: Cents,
    pub total_tip: Cents,
    pub grand_total: Cents,
}

/// Derive the complete per-person breakdown and bill summary from the raw
/// bill inputs.
///
/// Everything is recomputed from scratch on every call, so the result is
/// always consistent with the inputs and a saved snapshot replays exactly.
///
/// A person's share of an equally split item is taken at their index within
/// the assignment's `person_ids`, which is what makes remainder placement
/// stable per person. With a custom split, the person's matching entry is
/// used, or zero if the entry is missing.
///
/// Unassigned items count toward the bill subtotal (and therefore the tax
/// and tip base) but are never allocated to anyone. Tax and tip are
/// distributed proportionally to item subtotals; if nobody has any assigned
/// items, all tax and tip shares are zero instead.
pub fn compute_person_totals(
    people: &[Person],
    items: &[Item],
    assignments: &HashMap<ItemId, Assignment>,
    tax_input: Option<&TaxInput>,
    tip_rate: f64,
) -> Result<BillSummary, AllocationError> {
    let mut breakdowns = Vec::with_capacity(people.len());

    for person in people {
        let mut details = Vec::new();
        let mut items_subtotal: Cents = 0;

        for item in items {
            let Some(assignment) = assignments.get(&item.id) else {
                continue;
            };
            let Some(index) = assignment.person_ids.iter().position(|id| *id == person.id)
            else {
                continue;
            };

            let share_cents = match &assignment.custom_split {
                Some(entries) => entries
                    .iter()
                    .find(|e| e.person_id == person.id)
                    .map(|e| e.amount_cents)
                    .unwrap_or(0),
                None => split_equally(item.price_cents, assignment.person_ids.len())?[index],
            };

            details.push(PersonItemDetail {
                item_id: item.id,
                item_name: item.name.clone(),
                full_price_cents: item.price_cents,
                share_cents,
                split_count: assignment.person_ids.len(),
                is_custom_split: assignment.custom_split.is_some(),
            });
            items_subtotal += share_cents;
        }

        breakdowns.push(PersonBreakdown {
            person_id: person.id,
            person_name: person.name.clone(),
            items: details,
            items_subtotal,
            tax_share: 0,
            tip_share: 0,
            total: items_subtotal,
        });
    }

    let bill_subtotal: Cents = items.iter().map(|i| i.price_cents).sum();
    let total_tax = tax_input
        .map(|input| calculate_tax(bill_subtotal, input))
        .unwrap_or(0);
    let total_tip = calculate_tip(bill_subtotal, tip_rate);

    let person_subtotals: Vec<Cents> = breakdowns.iter().map(|b| b.items_subtotal).collect();
    let has_any_subtotal = person_subtotals.iter().any(|s| *s > 0);

    let tax_shares = if has_any_subtotal && total_tax > 0 {
        distribute_tax(total_tax, &person_subtotals)?
    } else {
        vec![0; person_subtotals.len()]
    };
    let tip_shares = if has_any_subtotal && total_tip > 0 {
        distribute_tip(total_tip, &person_subtotals)?
    } else {
        vec![0; person_subtotals.len()]
    };

    for (i, breakdown) in breakdowns.iter_mut().enumerate() {
        breakdown.tax_share = tax_shares[i];
        breakdown.tip_share = tip_shares[i];
        breakdown.total = breakdown.items_subtotal + breakdown.tax_share + breakdown.tip_share;
    }

    let grand_total = breakdowns.iter().map(|b| b.total).sum();

    Ok(BillSummary {
        person_breakdowns: breakdowns,
        bill_subtotal,
        total_tax,
        total_tip,
        grand_total,
    })
}
