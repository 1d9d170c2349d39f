use std::collections::HashMap;

use serde::{Deserialize, Serialize};

/// Category label to index mapping, in first-encounter order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CategoryIndex {
    categories: Vec<String>,
    map: HashMap<String, usize>,
}

impl CategoryIndex {
    pub fn build<'a, I>(categories: I) -> Self
    where
        I: IntoIterator<Item = &'a str>,
    {
        let mut index = Self::default();
        for category in categories {
            if !index.map.contains_key(category) {
                index.map.insert(category.to_string(), index.categories.len());
                index.categories.push(category.to_string());
            }
        }
        index
    }

    /// Index of a category; categories unseen during training fall back to 0.
    pub fn index_or_default(&self, category: &str) -> usize {
        self.map.get(category).copied().unwrap_or(0)
    }

    /// Index scaled to `[0, 1]` by `max(size - 1, 1)`.
    pub fn normalized(&self, category: &str) -> f32 {
        let denom = self.len().saturating_sub(1).max(1) as f32;
        self.index_or_default(category) as f32 / denom
    }

    pub fn len(&self) -> usize {
        self.categories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.categories.is_empty()
    }

    pub fn categories(&self) -> &[String] {
        &self.categories
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keeps_first_encounter_order() {
        let index = CategoryIndex::build(["roads", "drainage", "roads", "traffic"]);
        assert_eq!(index.categories(), ["roads", "drainage", "traffic"]);
        assert_eq!(index.normalized("roads"), 0.0);
        assert_eq!(index.normalized("drainage"), 0.5);
        assert_eq!(index.normalized("traffic"), 1.0);
    }

    #[test]
    fn single_category_does_not_divide_by_zero() {
        let index = CategoryIndex::build(["roads"]);
        assert_eq!(index.normalized("roads"), 0.0);
        assert_eq!(CategoryIndex::default().normalized("roads"), 0.0);
    }
}
