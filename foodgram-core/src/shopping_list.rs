//! Shopping-list aggregation.
//!
//! Every ingredient row reachable from a user's cart is grouped by
//! (name, measurement unit) and the amounts are summed. The result renders as
//! the plain-text file served by `download_shopping_cart`.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub const HEADER: &str = "Список покупок Foodgram:";
pub const FILENAME: &str = "shopping_list.txt";

/// One ingredient line of one recipe in the cart.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CartLine {
    pub name: String,
    pub measurement_unit: String,
    pub amount: i64,
}

/// Summed amount for one (name, unit) pair.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShoppingItem {
    pub name: String,
    pub measurement_unit: String,
    pub total: i64,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ShoppingList {
    items: Vec<ShoppingItem>,
}

impl ShoppingList {
    /// Group lines by (name, unit); items come out sorted by name, then unit.
    pub fn aggregate<I>(lines: I) -> Self
    where
        I: IntoIterator<Item = CartLine>,
    {
        let mut totals: BTreeMap<(String, String), i64> = BTreeMap::new();
        for line in lines {
            let total = totals
                .entry((line.name, line.measurement_unit))
                .or_insert(0);
            *total = total.saturating_add(line.amount);
        }

        let items = totals
            .into_iter()
            .map(|((name, measurement_unit), total)| ShoppingItem {
                name,
                measurement_unit,
                total,
            })
            .collect();

        Self { items }
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[ShoppingItem] {
        &self.items
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity(HEADER.len() + 2 + self.items.len() * 32);
        out.push_str(HEADER);
        out.push_str("\n\n");
        for item in &self.items {
            out.push_str(&format!(
                "▢ {} ({}) — {}\n",
                capitalize(&item.name),
                item.measurement_unit,
                item.total
            ));
        }
        out
    }
}

/// Upper-case the first character and lower-case the rest.
pub fn capitalize(value: &str) -> String {
    let mut chars = value.chars();
    match chars.next() {
        None => String::new(),
        Some(first) => first
            .to_uppercase()
            .chain(chars.flat_map(char::to_lowercase))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn line(name: &str, unit: &str, amount: i64) -> CartLine {
        CartLine {
            name: name.to_string(),
            measurement_unit: unit.to_string(),
            amount,
        }
    }

    #[test]
    fn test_sums_same_ingredient_across_recipes() {
        let list = ShoppingList::aggregate(vec![
            line("сахар", "г", 100),
            line("мука", "г", 200),
            line("сахар", "г", 50),
        ]);

        assert_eq!(
            list.items(),
            &[
                ShoppingItem {
                    name: "мука".to_string(),
                    measurement_unit: "г".to_string(),
                    total: 200
                },
                ShoppingItem {
                    name: "сахар".to_string(),
                    measurement_unit: "г".to_string(),
                    total: 150
                },
            ]
        );
    }

    #[test]
    fn test_different_units_stay_separate() {
        let list = ShoppingList::aggregate(vec![
            line("молоко", "мл", 200),
            line("молоко", "стакан", 1),
        ]);
        assert_eq!(list.items().len(), 2);
    }

    #[test]
    fn test_render() {
        let list = ShoppingList::aggregate(vec![line("яйца", "шт", 2), line("яйца", "шт", 3)]);
        assert_eq!(list.render(), "Список покупок Foodgram:\n\n▢ Яйца (шт) — 5\n");
    }

    #[test]
    fn test_empty() {
        let list = ShoppingList::aggregate(Vec::new());
        assert!(list.is_empty());
        assert_eq!(list.render(), "Список покупок Foodgram:\n\n");
    }

    #[test]
    fn test_capitalize() {
        assert_eq!(capitalize("оЛИВКОВОЕ масло"), "Оливковое масло");
        assert_eq!(capitalize("ß"), "SS");
        assert_eq!(capitalize(""), "");
    }
}
