use std::collections::{BTreeMap, HashMap};

use lazy_static::lazy_static;

lazy_static! {
    /// Detector label variants mapped to the names the catalog uses.
    /// Keys are in normalized form (lowercase, spaces instead of underscores).
    static ref SYNONYMS: HashMap<&'static str, &'static str> = HashMap::from([
        ("strawberry shortcake", "strawberry cake"),
        ("cup cakes", "cupcake"),
        ("cupcakes", "cupcake"),
        ("cheese cake", "cheesecake"),
        ("birthday cake", "cake"),
        ("milk shake", "milkshake"),
        ("smoothie", "fruit smoothie"),
        ("cow skin", "ponmo"),
        ("roasted chicken", "roast chicken"),
        ("scrambled egg", "scrambled eggs"),
        ("mashed potato", "mashed potatoes"),
        ("dodo", "fried plantain"),
        ("garri", "eba"),
        ("ewa", "beans"),
        ("efo riro", "vegetable soup"),
        ("agege bread", "white bread"),
        ("indomie", "instant noodles"),
        ("chips", "french fries"),
    ]);
}

const BEVERAGE_KEYWORDS: &[&str] = &[
    "shake", "milkshake", "smoothie", "juice", "drink", "soda", "tea", "coffee", "water", "milk",
];

const DESSERT_KEYWORDS: &[&str] = &[
    "cake",
    "cupcake",
    "cookie",
    "brownie",
    "pie",
    "pudding",
    "ice cream",
    "frozen yogurt",
    "cheesecake",
    "shortcake",
    "pastry",
    "donut",
    "doughnut",
];

/// Canonical form of a detector or user supplied food name.
pub fn normalize_food_name(name: &str) -> String {
    let normalized = name.trim().to_lowercase().replace('_', " ");
    match SYNONYMS.get(normalized.as_str()) {
        Some(canonical) => (*canonical).to_string(),
        None => normalized,
    }
}

pub fn is_beverage(name: &str) -> bool {
    let normalized = normalize_food_name(name);
    BEVERAGE_KEYWORDS.iter().any(|k| normalized.contains(k))
}

pub fn is_dessert(name: &str) -> bool {
    let normalized = normalize_food_name(name);
    DESSERT_KEYWORDS.iter().any(|k| normalized.contains(k))
}

/// Nutrition assumed for a drink the catalog does not know.
#[derive(Debug, Clone, PartialEq)]
pub struct BeverageEstimate {
    pub confidence: f64,
    pub calories: f64,
    pub carbs: f64,
    pub protein: f64,
    pub fat: f64,
    pub fiber: f64,
    pub glycemic_index: f64,
    pub flags: Vec<String>,
    pub warnings: BTreeMap<String, String>,
}

/// Conservative milkshake-sized estimate.
pub fn beverage_heuristic() -> BeverageEstimate {
    BeverageEstimate {
        confidence: 0.35,
        calories: 350.0,
        carbs: 55.0,
        protein: 8.0,
        fat: 9.0,
        fiber: 1.0,
        glycemic_index: 60.0,
        flags: vec!["beverage".into(), "high-sugar".into(), "dessert".into()],
        warnings: BTreeMap::from([
            (
                "diabetes".to_string(),
                "High sugar content - monitor blood glucose".to_string(),
            ),
            (
                "weight_loss".to_string(),
                "High calorie beverage - consider smaller portion".to_string(),
            ),
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn underscored_labels_hit_the_synonym_table() {
        assert_eq!(normalize_food_name("Cup_Cakes"), "cupcake");
        assert_eq!(normalize_food_name("  cow_skin "), "ponmo");
        assert_eq!(normalize_food_name("cow skin"), "ponmo");
        assert_eq!(normalize_food_name("Jollof_Rice"), "jollof rice");
        assert_eq!(normalize_food_name(""), "");
    }

    #[test]
    fn beverage_and_dessert_keywords() {
        assert!(is_beverage("Strawberry_Milkshake"));
        assert!(is_beverage("green tea"));
        assert!(!is_beverage("jollof rice"));
        assert!(is_dessert("red_velvet_cake"));
        assert!(is_dessert("meat pie"));
        assert!(!is_dessert("boiled egg"));
    }

    #[test]
    fn beverage_heuristic_is_sugary() {
        let est = beverage_heuristic();
        assert_eq!(est.calories, 350.0);
        assert_eq!(est.glycemic_index, 60.0);
        assert!(est.flags.iter().any(|f| f == "high-sugar"));
        assert!(est.warnings.contains_key("diabetes"));
    }
}
