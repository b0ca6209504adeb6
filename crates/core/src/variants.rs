//! Variant generation from selected property values.
//!
//! Given the values an admin ticked for each property ("Color: red, blue",
//! "Size: S, M, L"), produce every combination as a candidate variant.

use serde::{Deserialize, Serialize};

use crate::types::{PropertyId, PropertyValueId};

/// Upper bound on combinations generated in one request.
pub const MAX_COMBINATIONS: usize = 500;

/// The values selected for one property.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionSet {
    pub property_id: PropertyId,
    pub values: Vec<PropertyValueId>,
}

/// One generated combination: a value for each selected property, in input order.
pub type Combination = Vec<(PropertyId, PropertyValueId)>;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum VariantError {
    #[error("property {0} was selected more than once")]
    DuplicateProperty(PropertyId),
    #[error("selection would create {count} variants, the limit is {MAX_COMBINATIONS}")]
    TooManyCombinations { count: usize },
}

/// Number of combinations `sets` will produce, after checking the selection.
///
/// # Errors
///
/// Fails when a property appears twice or the product exceeds [`MAX_COMBINATIONS`].
pub fn combination_count(sets: &[OptionSet]) -> Result<usize, VariantError> {
    let mut seen = Vec::with_capacity(sets.len());
    for set in sets {
        if seen.contains(&set.property_id) {
            return Err(VariantError::DuplicateProperty(set.property_id));
        }
        seen.push(set.property_id);
    }

    if sets.is_empty() {
        return Ok(0);
    }

    let mut count: usize = 1;
    for set in sets {
        count = count.saturating_mul(dedup(&set.values).len());
    }

    if count > MAX_COMBINATIONS {
        return Err(VariantError::TooManyCombinations { count });
    }
    Ok(count)
}

/// Cartesian product of the option sets.
///
/// The first set varies slowest. An empty selection, or any set without
/// values, yields no combinations. Repeated values inside a set are used once.
///
/// ```
/// use pazar_core::{OptionSet, PropertyId, PropertyValueId, generate_combinations};
///
/// let sets = [
///     OptionSet { property_id: PropertyId::new(1), values: vec![PropertyValueId::new(10), PropertyValueId::new(11)] },
///     OptionSet { property_id: PropertyId::new(2), values: vec![PropertyValueId::new(20)] },
/// ];
/// assert_eq!(generate_combinations(&sets).len(), 2);
/// assert!(generate_combinations(&[]).is_empty());
/// ```
#[must_use]
pub fn generate_combinations(sets: &[OptionSet]) -> Vec<Combination> {
    if sets.is_empty() || sets.iter().any(|s| s.values.is_empty()) {
        return Vec::new();
    }

    let mut combos: Vec<Combination> = vec![Vec::with_capacity(sets.len())];
    for set in sets {
        let values = dedup(&set.values);
        let mut next = Vec::with_capacity(combos.len() * values.len());
        for combo in &combos {
            for value in &values {
                let mut extended = combo.clone();
                extended.push((set.property_id, *value));
                next.push(extended);
            }
        }
        combos = next;
    }
    combos
}

fn dedup(values: &[PropertyValueId]) -> Vec<PropertyValueId> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        if !out.contains(v) {
            out.push(*v);
        }
    }
    out
}

/// Build a SKU like `TEE-RED-M` from a base SKU and value labels.
///
/// Labels are upper-cased and anything other than ASCII letters and digits
/// becomes a single `-`.
#[must_use]
pub fn suggest_sku(base: &str, labels: &[&str]) -> String {
    std::iter::once(base)
        .chain(labels.iter().copied())
        .map(sku_segment)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join("-")
}

fn sku_segment(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.trim().chars() {
        if c.is_ascii_alphanumeric() {
            out.push(c.to_ascii_uppercase());
        } else if !out.ends_with('-') {
            out.push('-');
        }
    }
    out.trim_matches('-').to_string()
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    fn set(property: i32, values: &[i32]) -> OptionSet {
        OptionSet {
            property_id: PropertyId::new(property),
            values: values.iter().copied().map(PropertyValueId::new).collect(),
        }
    }

    fn ids(combo: &Combination) -> Vec<(i32, i32)> {
        combo
            .iter()
            .map(|(p, v)| (p.as_i32(), v.as_i32()))
            .collect()
    }

    #[test]
    fn test_count_is_product_of_sizes() {
        let sets = [set(1, &[1, 2]), set(2, &[3, 4, 5]), set(3, &[6, 7])];
        assert_eq!(generate_combinations(&sets).len(), 12);
        assert_eq!(combination_count(&sets).unwrap(), 12);
    }

    #[test]
    fn test_first_property_varies_slowest() {
        let combos = generate_combinations(&[set(1, &[1, 2]), set(2, &[3, 4])]);
        let flat: Vec<_> = combos.iter().map(ids).collect();
        assert_eq!(
            flat,
            vec![
                vec![(1, 1), (2, 3)],
                vec![(1, 1), (2, 4)],
                vec![(1, 2), (2, 3)],
                vec![(1, 2), (2, 4)],
            ]
        );
    }

    #[test]
    fn test_empty_selection_yields_nothing() {
        assert!(generate_combinations(&[]).is_empty());
        assert!(generate_combinations(&[set(1, &[1, 2]), set(2, &[])]).is_empty());
        assert_eq!(combination_count(&[]).unwrap(), 0);
    }

    #[test]
    fn test_single_set() {
        let combos = generate_combinations(&[set(4, &[9, 8])]);
        assert_eq!(combos.iter().map(ids).collect::<Vec<_>>(), vec![vec![(4, 9)], vec![(4, 8)]]);
    }

    #[test]
    fn test_duplicate_values_used_once() {
        let combos = generate_combinations(&[set(1, &[1, 1, 2])]);
        assert_eq!(combos.len(), 2);
    }

    #[test]
    fn test_duplicate_property_rejected() {
        assert_eq!(
            combination_count(&[set(1, &[1]), set(1, &[2])]),
            Err(VariantError::DuplicateProperty(PropertyId::new(1)))
        );
    }

    #[test]
    fn test_too_many_combinations() {
        let big: Vec<i32> = (0..30).collect();
        let err = combination_count(&[set(1, &big), set(2, &big)]).unwrap_err();
        assert_eq!(err, VariantError::TooManyCombinations { count: 900 });
    }

    #[test]
    fn test_suggest_sku() {
        assert_eq!(suggest_sku("tee", &["Red", "M"]), "TEE-RED-M");
        assert_eq!(suggest_sku("TEE-01", &["Light blue", "XL "]), "TEE-01-LIGHT-BLUE-XL");
        assert_eq!(suggest_sku("mug", &["", "350 ml"]), "MUG-350-ML");
    }
}
