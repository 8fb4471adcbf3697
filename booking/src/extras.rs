//! Purchasable extras.
//!
//! A booking stores extras as a flat list of ids with one entry per purchased
//! unit; this is also what the booking creation call expects.

use crate::types::ExtraId;
use serde::{Deserialize, Serialize};

/// Quantity of one extra picked for a segment
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExtraSelection {
    /// Extra
    pub id: ExtraId,
    /// Units; zero adds nothing
    pub quantity: u32,
}

impl ExtraSelection {
    /// Creates a selection
    #[must_use]
    pub fn new(id: impl Into<String>, quantity: u32) -> Self {
        Self {
            id: ExtraId::new(id),
            quantity,
        }
    }
}

/// Append each selection `quantity` times to `extras`
pub fn append_extras(extras: &mut Vec<ExtraId>, selections: &[ExtraSelection]) {
    for selection in selections {
        for _ in 0..selection.quantity {
            extras.push(selection.id.clone());
        }
    }
}

/// Collapse a flat id list into quantities, in first-seen order
#[must_use]
pub fn tally(extras: &[ExtraId]) -> Vec<ExtraSelection> {
    let mut tallied: Vec<ExtraSelection> = Vec::new();
    for id in extras {
        match tallied.iter_mut().find(|s| &s.id == id) {
            Some(selection) => selection.quantity += 1,
            None => tallied.push(ExtraSelection {
                id: id.clone(),
                quantity: 1,
            }),
        }
    }
    tallied
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_duplicate_ids() {
        let mut extras = Vec::new();
        append_extras(
            &mut extras,
            &[ExtraSelection::new("E1", 3), ExtraSelection::new("E2", 0)],
        );
        assert_eq!(extras, vec![ExtraId::new("E1"); 3]);
    }

    #[test]
    fn segments_accumulate() {
        let mut extras = Vec::new();
        append_extras(&mut extras, &[ExtraSelection::new("BAG", 1)]);
        append_extras(
            &mut extras,
            &[ExtraSelection::new("MEAL", 2), ExtraSelection::new("BAG", 1)],
        );

        assert_eq!(extras.len(), 4);
        assert_eq!(
            tally(&extras),
            vec![ExtraSelection::new("BAG", 2), ExtraSelection::new("MEAL", 2)]
        );
    }
}
