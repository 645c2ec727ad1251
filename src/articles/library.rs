//! Static nutrition guide, compiled into the binary.

use std::str::FromStr;

use anyhow::Context;
use serde::{Deserialize, Serialize};
use tracing::info;

const ARTICLES_JSON: &str = include_str!("../../data/articles.json");

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum ArticleCategory {
    Diabetes,
    LowCarb,
    WeightLoss,
    WeightGain,
    GeneralHealth,
}

impl FromStr for ArticleCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "diabetes" => Ok(ArticleCategory::Diabetes),
            "low-carb" => Ok(ArticleCategory::LowCarb),
            "weight-loss" => Ok(ArticleCategory::WeightLoss),
            "weight-gain" => Ok(ArticleCategory::WeightGain),
            "general-health" => Ok(ArticleCategory::GeneralHealth),
            other => Err(format!("unknown article category: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Article {
    pub id: u32,
    pub title: String,
    pub intro: String,
    pub category: ArticleCategory,
    #[serde(default)]
    pub tags: Vec<String>,
    pub content: String,
}

#[derive(Debug, Clone)]
pub struct ArticleLibrary {
    articles: Vec<Article>,
}

impl ArticleLibrary {
    pub fn embedded() -> anyhow::Result<Self> {
        Self::from_json(ARTICLES_JSON)
    }

    pub fn from_json(raw: &str) -> anyhow::Result<Self> {
        let mut articles: Vec<Article> =
            serde_json::from_str(raw).context("parse article library json")?;
        articles.sort_by_key(|a| a.id);
        info!(count = articles.len(), "article library loaded");
        Ok(Self { articles })
    }

    pub fn len(&self) -> usize {
        self.articles.len()
    }

    pub fn get(&self, id: u32) -> Option<&Article> {
        self.articles
            .binary_search_by_key(&id, |a| a.id)
            .ok()
            .map(|i| &self.articles[i])
    }

    /// Articles in id order, optionally narrowed to one category.
    pub fn list(&self, category: Option<ArticleCategory>) -> Vec<&Article> {
        self.articles
            .iter()
            .filter(|a| category.map_or(true, |c| a.category == c))
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;

    use super::*;

    fn library() -> ArticleLibrary {
        ArticleLibrary::embedded().expect("embedded articles parse")
    }

    #[test]
    fn embedded_library_is_well_formed() {
        let lib = library();
        assert_eq!(lib.len(), 30);

        let mut ids = HashSet::new();
        for a in &lib.articles {
            assert!(ids.insert(a.id), "duplicate id {}", a.id);
            assert!(!a.title.trim().is_empty());
            assert!(!a.intro.trim().is_empty());
            assert!(a.content.len() > 200, "thin article {}", a.id);
        }
    }

    #[test]
    fn list_filters_by_category_in_id_order() {
        let lib = library();
        let low_carb = lib.list(Some(ArticleCategory::LowCarb));
        assert_eq!(low_carb.len(), 6);
        assert!(low_carb.iter().all(|a| a.category == ArticleCategory::LowCarb));
        assert!(low_carb.windows(2).all(|w| w[0].id < w[1].id));
        assert_eq!(lib.list(None).len(), lib.len());
    }

    #[test]
    fn get_by_id() {
        let lib = library();
        assert_eq!(
            lib.get(1).unwrap().title,
            "Understanding Glycemic Index for Better Blood Sugar Control"
        );
        assert!(lib.get(0).is_none());
        assert!(lib.get(999).is_none());
    }

    #[test]
    fn categories_parse_loosely() {
        assert_eq!("Weight_Loss".parse::<ArticleCategory>(), Ok(ArticleCategory::WeightLoss));
        assert_eq!(" general-health ".parse::<ArticleCategory>(), Ok(ArticleCategory::GeneralHealth));
        assert!("keto".parse::<ArticleCategory>().is_err());
    }

    #[test]
    fn unsorted_input_is_ordered_by_id() {
        let raw = r#"[
            {"id": 9, "title": "b", "intro": "b", "category": "diabetes", "content": "b"},
            {"id": 2, "title": "a", "intro": "a", "category": "low-carb", "tags": ["x"], "content": "a"}
        ]"#;
        let lib = ArticleLibrary::from_json(raw).unwrap();
        let ids: Vec<u32> = lib.list(None).iter().map(|a| a.id).collect();
        assert_eq!(ids, vec![2, 9]);
        assert_eq!(lib.get(9).unwrap().title, "b");
        assert!(ArticleLibrary::from_json("{}").is_err());
    }
}
