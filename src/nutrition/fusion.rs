use std::collections::HashSet;

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::synonyms::normalize_food_name;
use crate::config::ScanConfig;

/// Where a detected food came from.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum DetectionSource {
    /// The primary detector; its results anchor the fusion.
    Detector,
    /// The secondary vision model that confirms or extends detections.
    Validator,
    /// Values estimated without a catalog match.
    Heuristic,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Detection {
    pub name: String,
    pub confidence: f64,
    pub source: DetectionSource,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Detection {
    pub fn new(name: impl Into<String>, confidence: f64, source: DetectionSource) -> Self {
        Self {
            name: name.into(),
            confidence,
            source,
            notes: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct FusionStats {
    pub total_items: usize,
    pub detector_items: usize,
    pub validator_items: usize,
    pub average_confidence: f64,
    pub items: Vec<String>,
}

/// Merges anchor detections with validator output.
#[derive(Debug, Clone, Copy)]
pub struct DetectionFusion {
    validator_threshold: f64,
    similarity_threshold: f64,
}

impl Default for DetectionFusion {
    fn default() -> Self {
        Self::from_config(&ScanConfig::default())
    }
}

impl DetectionFusion {
    pub fn new(validator_threshold: f64, similarity_threshold: f64) -> Self {
        Self {
            validator_threshold,
            similarity_threshold,
        }
    }

    pub fn from_config(cfg: &ScanConfig) -> Self {
        Self::new(cfg.validator_threshold, cfg.similarity_threshold)
    }

    pub fn fuse(&self, anchors: Vec<Detection>, validated: Vec<Detection>) -> Vec<Detection> {
        let anchor_count = anchors.len();
        // (normalized key, item) in insertion order
        let mut fused: Vec<(String, Detection)> = Vec::new();

        for item in anchors {
            let key = normalize_food_name(&item.name);
            match fused.iter_mut().find(|(k, _)| *k == key) {
                Some(slot) => slot.1 = item,
                None => fused.push((key, item)),
            }
        }

        let mut added = 0usize;
        let mut updated = 0usize;
        for item in validated
            .into_iter()
            .filter(|d| d.confidence >= self.validator_threshold)
        {
            let key = normalize_food_name(&item.name);
            if let Some(slot) = fused.iter_mut().find(|(k, _)| *k == key) {
                if item.confidence > slot.1.confidence {
                    debug!(name = %item.name, from = slot.1.confidence, to = item.confidence, "validator raised confidence");
                    slot.1 = item;
                    updated += 1;
                }
                continue;
            }
            if self.is_near_duplicate(&key, fused.iter().map(|(k, _)| k.as_str())) {
                debug!(name = %item.name, "skipped near-duplicate validator item");
                continue;
            }
            fused.push((key, item));
            added += 1;
        }

        info!(
            anchors = anchor_count,
            total = fused.len(),
            updated,
            added,
            "detections fused"
        );

        let mut out: Vec<Detection> = fused.into_iter().map(|(_, d)| d).collect();
        // stable: equal confidences keep insertion order
        out.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
        out
    }

    fn is_near_duplicate<'a>(&self, name: &str, existing: impl Iterator<Item = &'a str>) -> bool {
        let tokens: HashSet<&str> = name.split_whitespace().collect();
        existing.into_iter().any(|other| {
            if other == name {
                return true;
            }
            let other_tokens: HashSet<&str> = other.split_whitespace().collect();
            let overlap = tokens.intersection(&other_tokens).count();
            if overlap == 0 {
                return false;
            }
            let union = tokens.union(&other_tokens).count();
            overlap as f64 / union as f64 >= self.similarity_threshold
        })
    }
}

pub fn statistics(items: &[Detection]) -> FusionStats {
    let count = |src| items.iter().filter(|d| d.source == src).count();
    let average = if items.is_empty() {
        0.0
    } else {
        items.iter().map(|d| d.confidence).sum::<f64>() / items.len() as f64
    };
    FusionStats {
        total_items: items.len(),
        detector_items: count(DetectionSource::Detector),
        validator_items: count(DetectionSource::Validator),
        average_confidence: (average * 1000.0).round() / 1000.0,
        items: items.iter().map(|d| d.name.clone()).collect(),
    }
}
