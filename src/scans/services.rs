use std::sync::Arc;

use serde::Serialize;
use tracing::{info, instrument, warn};

use super::{detector::FoodDetector, validator::FoodValidator};
use crate::{
    ai::InlineImage,
    nutrition::{
        catalog::Catalog,
        fusion::{self, Detection, DetectionFusion, FusionStats},
        heuristics::{self, EnrichedFood, MealRecommendations, MealSummary},
        spike::{self, SpikeInput, SpikePrediction},
    },
    profiles::repo_types::Profile,
    state::AppState,
};

#[derive(Debug, thiserror::Error)]
pub enum ScanError {
    #[error("No foods detected in image")]
    NoFoods { detail: String },
    #[error("food detector failed: {0}")]
    Detector(#[source] anyhow::Error),
}

#[derive(Debug, Clone, Serialize)]
pub struct ScanReport {
    pub detections: Vec<Detection>,
    pub items: Vec<EnrichedFood>,
    pub meal_summary: MealSummary,
    pub recommendations: MealRecommendations,
    pub fusion_stats: FusionStats,
    pub spike_prediction: SpikePrediction,
}

/// detect → validate → fuse → enrich → score.
pub struct ScanPipeline {
    detector: Arc<dyn FoodDetector>,
    validator: FoodValidator,
    fusion: DetectionFusion,
    catalog: Arc<Catalog>,
}

impl ScanPipeline {
    pub fn new(
        detector: Arc<dyn FoodDetector>,
        validator: FoodValidator,
        fusion: DetectionFusion,
        catalog: Arc<Catalog>,
    ) -> Self {
        Self {
            detector,
            validator,
            fusion,
            catalog,
        }
    }

    pub fn from_state(state: &AppState) -> Self {
        Self::new(
            state.detector.clone(),
            FoodValidator::new(state.ai.validator.clone(), state.config.scan.validator_threshold),
            DetectionFusion::from_config(&state.config.scan),
            state.catalog.clone(),
        )
    }

    #[instrument(skip_all)]
    pub async fn run(
        &self,
        image: &InlineImage,
        profile: Option<&Profile>,
    ) -> Result<ScanReport, ScanError> {
        let anchors = self.detector.detect(image).await.map_err(ScanError::Detector)?;
        let validated = self.validator.validate(image, &anchors).await;
        let (anchor_count, validated_count) = (anchors.len(), validated.len());

        let detections = self.fusion.fuse(anchors, validated);
        if detections.is_empty() {
            warn!("no foods from detector or validator");
            return Err(ScanError::NoFoods {
                detail: format!(
                    "detector returned {anchor_count} items, validator returned {validated_count} items"
                ),
            });
        }

        let items: Vec<EnrichedFood> = detections
            .iter()
            .map(|d| heuristics::enrich(&self.catalog, d))
            .collect();
        let meal_summary = heuristics::meal_summary(&items);
        let recommendations = heuristics::meal_recommendations(&items, &meal_summary);
        let fusion_stats = fusion::statistics(&detections);
        let spike_prediction = spike::predict(&SpikeInput {
            carbs_g: meal_summary.total_carbs,
            protein_g: meal_summary.total_protein,
            fat_g: meal_summary.total_fat,
            fiber_g: meal_summary.total_fiber,
            glycemic_load: meal_summary.glycemic_load,
            sugar_g: None,
            activity: profile.and_then(|p| p.activity()),
            diabetes: profile.and_then(|p| p.diabetes()),
        });

        info!(
            items = items.len(),
            score = meal_summary.score,
            spike = spike_prediction.predicted_spike_mg_dl,
            "scan complete"
        );
        Ok(ScanReport {
            detections,
            items,
            meal_summary,
            recommendations,
            fusion_stats,
            spike_prediction,
        })
    }
}

#[cfg(test)]
mod tests {
    use async_trait::async_trait;

    use super::*;
    use crate::{
        ai::scripted::ScriptedLlm,
        nutrition::{fusion::DetectionSource, heuristics::MealQuality, spike::RiskLevel},
        profiles::repo_types::sample_profile,
        scans::detector::VisionLlmDetector,
    };

    struct FailingDetector;

    #[async_trait]
    impl FoodDetector for FailingDetector {
        async fn detect(&self, _image: &InlineImage) -> anyhow::Result<Vec<Detection>> {
            anyhow::bail!("model offline")
        }
    }

    fn pipeline(detector_reply: &str, validator: ScriptedLlm) -> ScanPipeline {
        let detector = VisionLlmDetector::new(Arc::new(ScriptedLlm::replying(detector_reply)));
        ScanPipeline::new(
            Arc::new(detector),
            FoodValidator::new(Arc::new(validator), 0.3),
            DetectionFusion::default(),
            Arc::new(Catalog::embedded().unwrap()),
        )
    }

    fn image() -> InlineImage {
        InlineImage::from_bytes(b"jpeg", "image/jpeg")
    }

    #[tokio::test]
    async fn full_pipeline_merges_and_scores() {
        let p = pipeline(
            "jollof rice, fried plantain",
            ScriptedLlm::replying(
                r#"{"validated_foods":[
                    {"name":"jollof rice","confidence":0.9},
                    {"name":"grilled chicken","confidence":0.7},
                    {"name":"napkin","confidence":0.1}
                ]}"#,
            ),
        );
        let profile = sample_profile();
        let report = p.run(&image(), Some(&profile)).await.unwrap();

        let names: Vec<&str> = report.detections.iter().map(|d| d.name.as_str()).collect();
        assert_eq!(names, vec!["jollof rice", "grilled chicken", "fried plantain"]);
        assert_eq!(report.detections[0].source, DetectionSource::Validator);
        assert_eq!(report.items.len(), 3);
        assert_eq!(report.meal_summary.item_count, 3);
        assert_ne!(report.meal_summary.quality, MealQuality::Unknown);
        assert_eq!(report.fusion_stats.detector_items, 1);
        assert_eq!(report.fusion_stats.validator_items, 2);
        assert!(report
            .recommendations
            .healthy_alternatives
            .iter()
            .any(|a| a.contains("plantain")));
        assert!((0.0..=150.0).contains(&report.spike_prediction.predicted_spike_mg_dl));
    }

    #[tokio::test]
    async fn validator_failure_keeps_detector_results() {
        let p = pipeline("beans", ScriptedLlm::failing());
        let report = p.run(&image(), None).await.unwrap();
        assert_eq!(report.detections.len(), 1);
        assert_eq!(report.detections[0].source, DetectionSource::Detector);
        assert_eq!(report.spike_prediction.risk_level, RiskLevel::Low);
    }

    #[tokio::test]
    async fn validator_can_rescue_an_empty_detection() {
        let p = pipeline(
            "none",
            ScriptedLlm::replying(r#"{"validated_foods":[{"name":"moi moi","confidence":0.6}]}"#),
        );
        let report = p.run(&image(), None).await.unwrap();
        assert_eq!(report.fusion_stats.items, vec!["moi moi".to_string()]);
    }

    #[tokio::test]
    async fn nothing_found_is_an_error() {
        let p = pipeline("none", ScriptedLlm::failing());
        let err = p.run(&image(), None).await.unwrap_err();
        assert!(matches!(err, ScanError::NoFoods { .. }));
        assert_eq!(err.to_string(), "No foods detected in image");
    }

    #[tokio::test]
    async fn detector_errors_propagate() {
        let p = ScanPipeline::new(
            Arc::new(FailingDetector),
            FoodValidator::new(Arc::new(ScriptedLlm::failing()), 0.3),
            DetectionFusion::default(),
            Arc::new(Catalog::embedded().unwrap()),
        );
        let err = p.run(&image(), None).await.unwrap_err();
        assert!(matches!(err, ScanError::Detector(_)));
    }
}
