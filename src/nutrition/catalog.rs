use std::{collections::BTreeMap, str::FromStr};

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::synonyms::normalize_food_name;

const FOODS_JSON: &str = include_str!("../../data/foods.json");

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum FoodCategory {
    Protein,
    Vegetable,
    Fruit,
    Grain,
    Dairy,
    Snack,
    Beverage,
    Dish,
}

impl FromStr for FoodCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "protein" => Ok(FoodCategory::Protein),
            "vegetable" => Ok(FoodCategory::Vegetable),
            "fruit" => Ok(FoodCategory::Fruit),
            "grain" => Ok(FoodCategory::Grain),
            "dairy" => Ok(FoodCategory::Dairy),
            "snack" => Ok(FoodCategory::Snack),
            "beverage" => Ok(FoodCategory::Beverage),
            "dish" => Ok(FoodCategory::Dish),
            other => Err(format!("unknown food category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum GiCategory {
    Low,
    Medium,
    High,
}

pub fn gi_category(gi: f64) -> GiCategory {
    if gi <= 55.0 {
        GiCategory::Low
    } else if gi <= 69.0 {
        GiCategory::Medium
    } else {
        GiCategory::High
    }
}

/// One catalog row. Macros are per `serving_size`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct FoodEntry {
    pub name: String,
    pub category: FoodCategory,
    pub description: String,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub glycemic_index: Option<f64>,
    pub serving_size: String,
    #[serde(default)]
    pub flags: Vec<String>,
    /// Condition (`diabetes`, `hypertension`, `weight_loss`) to warning text.
    #[serde(default)]
    pub warnings: BTreeMap<String, String>,
    #[serde(default)]
    pub benefits: Vec<String>,
    #[serde(default)]
    pub prep_tips: Vec<String>,
}

impl FoodEntry {
    pub fn gi_category(&self) -> Option<GiCategory> {
        self.glycemic_index.map(gi_category)
    }
}

/// Reference food database, loaded once at startup.
#[derive(Debug, Clone)]
pub struct Catalog {
    foods: Vec<FoodEntry>,
}

impl Catalog {
    /// The database compiled into the binary from `data/foods.json`.
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_json(FOODS_JSON)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let mut foods: Vec<FoodEntry> =
            serde_json::from_str(raw).context("parse food catalog json")?;
        for food in &mut foods {
            food.name = food.name.trim().to_lowercase();
        }
        info!(count = foods.len(), "food catalog loaded");
        Ok(Self { foods })
    }

    pub fn len(&self) -> usize {
        self.foods.len()
    }

    /// Exact match on the normalized name first, then containment either way.
    fn find_where<P>(&self, name: &str, pred: P) -> Option<&FoodEntry>
    where
        P: Fn(&FoodEntry) -> bool,
    {
        let normalized = normalize_food_name(name);
        if normalized.is_empty() {
            return None;
        }
        let candidates = || self.foods.iter().filter(|f| pred(f));

        if let Some(food) = candidates().find(|f| f.name == normalized) {
            return Some(food);
        }
        let partial = candidates().find(|f| {
            f.name.contains(normalized.as_str()) || normalized.contains(f.name.as_str())
        });
        if let Some(food) = partial {
            debug!(query = %normalized, matched = %food.name, "partial catalog match");
        }
        partial
    }

    pub fn lookup(&self, name: &str) -> Option<&FoodEntry> {
        self.find_where(name, |_| true)
    }

    /// GI from the first matching entry that records one.
    pub fn glycemic_index(&self, name: &str) -> Option<f64> {
        self.find_where(name, |f| f.glycemic_index.is_some())
            .and_then(|f| f.glycemic_index)
    }

    /// Case-insensitive substring search over names and descriptions.
    pub fn search(&self, query: Option<&str>, category: Option<FoodCategory>) -> Vec<&FoodEntry> {
        let needle = query
            .map(|q| q.trim().to_lowercase())
            .filter(|q| !q.is_empty());
        let mut hits: Vec<&FoodEntry> = self
            .foods
            .iter()
            .filter(|f| category.map_or(true, |c| f.category == c))
            .filter(|f| match &needle {
                Some(n) => f.name.contains(n.as_str()) || f.description.to_lowercase().contains(n.as_str()),
                None => true,
            })
            .collect();
        hits.sort_by(|a, b| a.name.cmp(&b.name));
        hits
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn catalog() -> Catalog {
        Catalog::embedded().expect("embedded catalog parses")
    }

    #[test]
    fn embedded_catalog_is_well_formed() {
        let c = catalog();
        assert!(c.len() >= 40);

        let mut seen = HashSet::new();
        for food in &c.foods {
            assert!(seen.insert(food.name.clone()), "duplicate {}", food.name);
            for v in [food.calories, food.carbs, food.protein, food.fat, food.fiber] {
                assert!(v >= 0.0, "negative macro in {}", food.name);
            }
            if let Some(gi) = food.glycemic_index {
                assert!((0.0..=100.0).contains(&gi), "bad GI in {}", food.name);
            }
        }
    }

    #[test]
    fn lookup_prefers_exact_then_partial() {
        let c = catalog();
        assert_eq!(c.lookup("Fried_Chicken").unwrap().name, "fried chicken");
        assert_eq!(c.lookup("grilled chicken breast").unwrap().name, "grilled chicken");
        assert_eq!(c.lookup("cow skin").unwrap().name, "ponmo");
        assert!(c.lookup("unobtainium").is_none());
        assert!(c.lookup("   ").is_none());
    }

    #[test]
    fn glycemic_index_skips_entries_without_one() {
        let c = catalog();
        assert_eq!(c.glycemic_index("white rice"), Some(73.0));
        assert_eq!(c.glycemic_index("salmon"), None);
    }

    #[test]
    fn search_filters_and_sorts() {
        let c = catalog();
        let rice: Vec<&str> = c
            .search(Some("RICE"), None)
            .iter()
            .map(|f| f.name.as_str())
            .collect();
        assert_eq!(rice, vec!["brown rice", "fried rice", "jollof rice", "white rice"]);

        let veg = c.search(None, Some(FoodCategory::Vegetable));
        assert!(!veg.is_empty());
        assert!(veg.iter().all(|f| f.category == FoodCategory::Vegetable));

        let leafy = c.search(Some("leafy"), Some(FoodCategory::Dish));
        assert!(leafy.iter().any(|f| f.name == "vegetable soup"));
    }

    #[test]
    fn gi_bands() {
        assert_eq!(gi_category(55.0), GiCategory::Low);
        assert_eq!(gi_category(56.0), GiCategory::Medium);
        assert_eq!(gi_category(69.0), GiCategory::Medium);
        assert_eq!(gi_category(70.0), GiCategory::High);
        assert_eq!("Dairy".parse::<FoodCategory>(), Ok(FoodCategory::Dairy));
    }
}
