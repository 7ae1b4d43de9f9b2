//! Data models for the EcoPackAI client.
//!
//! This module contains the questionnaire sent to the recommendation
//! service, the material results it returns, and the normalized shapes
//! the rest of the application works with.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::fmt;

/// Product category being shipped.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "snake_case")]
#[value(rename_all = "snake_case")]
pub enum ProductCategory {
    Food,
    Electronics,
    Cosmetics,
    Pharmaceuticals,
    FragileGoods,
    Textiles,
    Furniture,
    IndustrialParts,
    Stationery,
    EcommerceGeneral,
}

impl ProductCategory {
    /// Wire representation of the category.
    pub fn as_str(&self) -> &'static str {
        match self {
            ProductCategory::Food => "food",
            ProductCategory::Electronics => "electronics",
            ProductCategory::Cosmetics => "cosmetics",
            ProductCategory::Pharmaceuticals => "pharmaceuticals",
            ProductCategory::FragileGoods => "fragile_goods",
            ProductCategory::Textiles => "textiles",
            ProductCategory::Furniture => "furniture",
            ProductCategory::IndustrialParts => "industrial_parts",
            ProductCategory::Stationery => "stationery",
            ProductCategory::EcommerceGeneral => "ecommerce_general",
        }
    }
}

impl fmt::Display for ProductCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Three-step scale used for fragility and sustainability priority.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum Level {
    Low,
    Medium,
    High,
}

impl Level {
    pub fn as_str(&self) -> &'static str {
        match self {
            Level::Low => "low",
            Level::Medium => "medium",
            Level::High => "high",
        }
    }
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Shipping distance.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum ShippingType {
    Domestic,
    International,
}

impl ShippingType {
    pub fn as_str(&self) -> &'static str {
        match self {
            ShippingType::Domestic => "domestic",
            ShippingType::International => "international",
        }
    }
}

impl fmt::Display for ShippingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The questionnaire submitted to `/recommend`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionnaireInput {
    pub product_category: ProductCategory,
    pub fragility: Level,
    pub shipping_type: ShippingType,
    pub sustainability_priority: Level,
}

impl QuestionnaireInput {
    /// Labelled field values, in the order reports print them.
    pub fn labelled_fields(&self) -> [(&'static str, &'static str); 4] {
        [
            ("Category", self.product_category.as_str()),
            ("Fragility", self.fragility.as_str()),
            ("Shipping", self.shipping_type.as_str()),
            ("Priority", self.sustainability_priority.as_str()),
        ]
    }
}

/// A possibly incomplete questionnaire.
///
/// Used both for values restored from the form store and for values given
/// on the command line; command-line values win field by field.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FormValues {
    #[serde(default)]
    pub product_category: Option<ProductCategory>,
    #[serde(default)]
    pub fragility: Option<Level>,
    #[serde(default)]
    pub shipping_type: Option<ShippingType>,
    #[serde(default)]
    pub sustainability_priority: Option<Level>,
}

impl FormValues {
    /// Fill the fields missing here from `fallback`.
    pub fn or(self, fallback: FormValues) -> FormValues {
        FormValues {
            product_category: self.product_category.or(fallback.product_category),
            fragility: self.fragility.or(fallback.fragility),
            shipping_type: self.shipping_type.or(fallback.shipping_type),
            sustainability_priority: self
                .sustainability_priority
                .or(fallback.sustainability_priority),
        }
    }

    /// Turn the values into a full questionnaire, or name the missing fields.
    pub fn complete(&self) -> Result<QuestionnaireInput, Vec<&'static str>> {
        let mut missing = Vec::new();
        if self.product_category.is_none() {
            missing.push("product_category");
        }
        if self.fragility.is_none() {
            missing.push("fragility");
        }
        if self.shipping_type.is_none() {
            missing.push("shipping_type");
        }
        if self.sustainability_priority.is_none() {
            missing.push("sustainability_priority");
        }

        match (
            self.product_category,
            self.fragility,
            self.shipping_type,
            self.sustainability_priority,
        ) {
            (Some(product_category), Some(fragility), Some(shipping_type), Some(priority)) => {
                Ok(QuestionnaireInput {
                    product_category,
                    fragility,
                    shipping_type,
                    sustainability_priority: priority,
                })
            }
            _ => Err(missing),
        }
    }
}

impl From<QuestionnaireInput> for FormValues {
    fn from(input: QuestionnaireInput) -> Self {
        Self {
            product_category: Some(input.product_category),
            fragility: Some(input.fragility),
            shipping_type: Some(input.shipping_type),
            sustainability_priority: Some(input.sustainability_priority),
        }
    }
}

/// One ranked material as scored by the recommendation service.
///
/// The canonical field names are `predicted_cost`, `predicted_co2` and
/// `suitability_score`. Older service builds used `cost`, `co2`, `score`
/// or `final_score`; those are accepted as aliases.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MaterialResult {
    #[serde(alias = "material_name")]
    pub material: String,
    #[serde(alias = "cost")]
    pub predicted_cost: f64,
    #[serde(alias = "co2")]
    pub predicted_co2: f64,
    #[serde(alias = "score", alias = "final_score")]
    pub suitability_score: f64,
}

/// Ranked materials produced by one submission.
pub type Run = Vec<MaterialResult>;

/// Return the first `limit` entries of a ranked list.
pub fn top_n(run: &[MaterialResult], limit: usize) -> Run {
    run.iter().take(limit).cloned().collect()
}

/// Raw `/recommend` body. Some service builds answer with a bare array.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum RecommendPayload {
    Bare(Vec<MaterialResult>),
    Wrapped(WrappedRecommendation),
}

#[derive(Debug, Default, Deserialize)]
pub struct WrappedRecommendation {
    #[serde(default)]
    pub recommended_materials: Option<Vec<MaterialResult>>,
    #[serde(default)]
    pub top10: Option<Vec<MaterialResult>>,
    /// Echo of the submitted questionnaire, kept loose so a malformed echo
    /// does not reject the whole body.
    #[serde(default)]
    pub inputs: Option<Value>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Normalized answer of the recommendation service.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Recommendation {
    /// Materials meant for display, best first.
    pub results: Vec<MaterialResult>,
    /// Longer ranking for export. Falls back to `results`.
    pub top10: Vec<MaterialResult>,
    /// Questionnaire as echoed back by the service.
    pub inputs: Option<QuestionnaireInput>,
    /// Server-side explanation, typically when nothing matched.
    pub message: Option<String>,
}

impl Recommendation {
    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }
}

impl From<RecommendPayload> for Recommendation {
    fn from(payload: RecommendPayload) -> Self {
        match payload {
            RecommendPayload::Bare(results) => Self {
                top10: results.clone(),
                results,
                inputs: None,
                message: None,
            },
            RecommendPayload::Wrapped(wrapped) => {
                let results = wrapped.recommended_materials.unwrap_or_default();
                let top10 = match wrapped.top10 {
                    Some(top10) if !top10.is_empty() => top10,
                    _ => results.clone(),
                };
                Self {
                    results,
                    top10,
                    inputs: wrapped
                        .inputs
                        .and_then(|value| serde_json::from_value(value).ok()),
                    message: wrapped.message,
                }
            }
        }
    }
}

/// Raw `/history` body.
#[derive(Debug, Default, Deserialize)]
pub struct HistoryPayload {
    #[serde(default)]
    pub history: Vec<Run>,
}

/// Raw `/` body.
#[derive(Debug, Deserialize)]
pub struct HealthPayload {
    pub status: String,
}

/// How often a material has been recommended, from `/usage`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct UsageEntry {
    pub material: String,
    pub count: u64,
}

/// Convert the `/usage` mapping into entries, most used first.
pub fn usage_entries(raw: BTreeMap<String, u64>) -> Vec<UsageEntry> {
    let mut entries: Vec<UsageEntry> = raw
        .into_iter()
        .map(|(material, count)| UsageEntry { material, count })
        .collect();
    // BTreeMap order already breaks ties by name; the sort is stable.
    entries.sort_by_key(|e| std::cmp::Reverse(e.count));
    entries
}

/// The most recent run, as kept for display and export.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestRun {
    /// Display slice (top-3 by default).
    pub display: Vec<MaterialResult>,
    /// Export slice (top-10 by default).
    pub ranking: Vec<MaterialResult>,
    /// Questionnaire that produced the run, when known.
    pub inputs: Option<QuestionnaireInput>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn sample_input() -> QuestionnaireInput {
        QuestionnaireInput {
            product_category: ProductCategory::FragileGoods,
            fragility: Level::High,
            shipping_type: ShippingType::International,
            sustainability_priority: Level::Medium,
        }
    }

    #[test]
    fn test_questionnaire_wire_format() {
        let value = serde_json::to_value(sample_input()).unwrap();
        assert_eq!(
            value,
            json!({
                "product_category": "fragile_goods",
                "fragility": "high",
                "shipping_type": "international",
                "sustainability_priority": "medium"
            })
        );
    }

    #[test]
    fn test_legacy_field_names() {
        let item: MaterialResult = serde_json::from_value(json!({
            "material": "Kraft Paper",
            "cost": 2.5,
            "co2": 1.25,
            "final_score": 0.81,
            "co2_reduction_percent": 12.0,
            "cost_saving": 0.4
        }))
        .unwrap();
        assert_eq!(item.predicted_cost, 2.5);
        assert_eq!(item.predicted_co2, 1.25);
        assert_eq!(item.suitability_score, 0.81);

        let item: MaterialResult = serde_json::from_value(json!({
            "material": "Corrugated Board",
            "predicted_cost": 3.0,
            "predicted_co2": 2.0,
            "score": 0.5
        }))
        .unwrap();
        assert_eq!(item.suitability_score, 0.5);
    }

    #[test]
    fn test_bare_array_payload() {
        let payload: RecommendPayload = serde_json::from_value(json!([
            {"material": "A", "predicted_cost": 1.0, "predicted_co2": 2.0, "suitability_score": 0.9}
        ]))
        .unwrap();
        let rec = Recommendation::from(payload);
        assert_eq!(rec.results.len(), 1);
        assert_eq!(rec.top10, rec.results);
        assert!(rec.inputs.is_none());
    }

    #[test]
    fn test_wrapped_payload_without_top10_falls_back() {
        let payload: RecommendPayload = serde_json::from_value(json!({
            "recommended_materials": [
                {"material": "A", "predicted_cost": 1.0, "predicted_co2": 2.0, "suitability_score": 0.9}
            ],
            "top10": [],
            "inputs": {
                "product_category": "food",
                "fragility": "low",
                "shipping_type": "domestic",
                "sustainability_priority": "high"
            }
        }))
        .unwrap();
        let rec = Recommendation::from(payload);
        assert_eq!(rec.top10.len(), 1);
        assert_eq!(
            rec.inputs.map(|i| i.product_category),
            Some(ProductCategory::Food)
        );
    }

    #[test]
    fn test_wrapped_payload_with_message_only() {
        let payload: RecommendPayload = serde_json::from_value(json!({
            "recommended_materials": [],
            "message": "No materials meet the strict safety constraints."
        }))
        .unwrap();
        let rec = Recommendation::from(payload);
        assert!(rec.is_empty());
        assert!(rec.message.unwrap().contains("safety"));
    }

    #[test]
    fn test_malformed_inputs_echo_is_dropped() {
        let payload: RecommendPayload = serde_json::from_value(json!({
            "recommended_materials": [],
            "inputs": {"product_category": "spaceships"}
        }))
        .unwrap();
        assert!(Recommendation::from(payload).inputs.is_none());
    }

    #[test]
    fn test_form_values_merge_and_complete() {
        let restored = FormValues::from(sample_input());
        let cli = FormValues {
            fragility: Some(Level::Low),
            ..FormValues::default()
        };

        let merged = cli.or(restored);
        let input = merged.complete().unwrap();
        assert_eq!(input.fragility, Level::Low);
        assert_eq!(input.product_category, ProductCategory::FragileGoods);

        let missing = cli.complete().unwrap_err();
        assert_eq!(
            missing,
            vec!["product_category", "shipping_type", "sustainability_priority"]
        );
    }

    #[test]
    fn test_usage_entries_sorted_by_count() {
        let raw: BTreeMap<String, u64> = [
            ("Bagasse".to_string(), 2),
            ("Kraft Paper".to_string(), 5),
            ("Aluminium".to_string(), 2),
        ]
        .into_iter()
        .collect();

        let entries = usage_entries(raw);
        assert_eq!(entries[0].material, "Kraft Paper");
        assert_eq!(entries[1].material, "Aluminium");
        assert_eq!(entries[2].material, "Bagasse");
    }
}
