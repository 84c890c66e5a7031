use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::domain::{CompetencyId, TeamId};

pub const DEFAULT_STRICTNESS: u8 = 50;
pub const DEFAULT_SATURATION_THRESHOLD: f64 = 0.75;

/// Goal configuration attached to a template, either typed or a legacy key/value map.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Blueprint {
    Typed(GoalBlueprint),
    LegacyMap(Map<String, Value>),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalBlueprint {
    JobFit(JobFitBlueprint),
    TeamFit(TeamFitBlueprint),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct JobFitBlueprint {
    #[serde(default, alias = "taxonomyCode")]
    pub taxonomy_code: Option<String>,
    #[serde(default, alias = "strictnessLevel")]
    pub strictness_level: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TeamFitBlueprint {
    #[serde(default, alias = "teamId")]
    pub team_id: Option<TeamId>,
    #[serde(default, alias = "saturationThreshold")]
    pub saturation_threshold: Option<f64>,
    #[serde(default, alias = "targetRole")]
    pub target_role: Option<String>,
    #[serde(default, alias = "roleWeights")]
    pub role_weights: BTreeMap<CompetencyId, f64>,
}

impl Blueprint {
    fn job_fit(&self) -> Option<&JobFitBlueprint> {
        match self {
            Blueprint::Typed(GoalBlueprint::JobFit(blueprint)) => Some(blueprint),
            _ => None,
        }
    }

    fn team_fit(&self) -> Option<&TeamFitBlueprint> {
        match self {
            Blueprint::Typed(GoalBlueprint::TeamFit(blueprint)) => Some(blueprint),
            _ => None,
        }
    }

    /// Look up the first present key; legacy maps were written in both camel and snake case.
    fn legacy(&self, keys: &[&str]) -> Option<&Value> {
        match self {
            Blueprint::LegacyMap(map) => keys.iter().find_map(|key| map.get(*key)),
            Blueprint::Typed(_) => None,
        }
    }
}

fn legacy_number(value: &Value) -> Option<f64> {
    let number = match value {
        Value::Number(number) => number.as_f64(),
        Value::String(raw) => raw.trim().parse::<f64>().ok(),
        _ => None,
    };
    number.filter(|number| number.is_finite())
}

fn legacy_text(value: &Value) -> Option<String> {
    match value {
        Value::String(raw) => non_blank(raw),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}

fn non_blank(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn clamp_strictness(value: f64) -> u8 {
    value.round().clamp(0.0, 100.0) as u8
}

fn valid_saturation(value: f64) -> Option<f64> {
    (value.is_finite() && value > 0.0 && value <= 1.0).then_some(value)
}

/// Job-fit settings after blueprint resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct JobFitSettings {
    pub strictness: u8,
    pub taxonomy_code: Option<String>,
}

impl JobFitSettings {
    pub fn resolve(blueprint: Option<&Blueprint>) -> Self {
        Self {
            strictness: strictness(blueprint),
            taxonomy_code: taxonomy_code(blueprint),
        }
    }
}

pub fn strictness(blueprint: Option<&Blueprint>) -> u8 {
    let Some(blueprint) = blueprint else {
        return DEFAULT_STRICTNESS;
    };
    blueprint
        .job_fit()
        .and_then(|typed| typed.strictness_level)
        .map(|level| clamp_strictness(f64::from(level)))
        .or_else(|| {
            blueprint
                .legacy(&["strictnessLevel", "strictness_level", "strictness"])
                .and_then(legacy_number)
                .map(clamp_strictness)
        })
        .unwrap_or(DEFAULT_STRICTNESS)
}

pub fn taxonomy_code(blueprint: Option<&Blueprint>) -> Option<String> {
    let blueprint = blueprint?;
    blueprint
        .job_fit()
        .and_then(|typed| typed.taxonomy_code.as_deref())
        .and_then(non_blank)
        .or_else(|| {
            blueprint
                .legacy(&["taxonomyCode", "taxonomy_code", "onetSocCode", "onetCode"])
                .and_then(legacy_text)
        })
}

/// Team-fit settings after blueprint resolution.
#[derive(Debug, Clone, PartialEq)]
pub struct TeamFitSettings {
    pub team_id: Option<TeamId>,
    pub saturation_threshold: f64,
    pub target_role: Option<String>,
    pub role_weights: BTreeMap<CompetencyId, f64>,
}

impl TeamFitSettings {
    pub fn resolve(blueprint: Option<&Blueprint>) -> Self {
        Self {
            team_id: team_id(blueprint),
            saturation_threshold: saturation_threshold(blueprint),
            target_role: target_role(blueprint),
            role_weights: role_weights(blueprint),
        }
    }

    /// Unlisted competencies and unusable weights count as 1.0.
    pub fn role_weight(&self, competency_id: &CompetencyId) -> f64 {
        self.role_weights
            .get(competency_id)
            .copied()
            .filter(|weight| weight.is_finite() && *weight > 0.0)
            .unwrap_or(1.0)
    }
}

pub fn team_id(blueprint: Option<&Blueprint>) -> Option<TeamId> {
    let blueprint = blueprint?;
    blueprint
        .team_fit()
        .and_then(|typed| typed.team_id.as_ref())
        .and_then(|id| non_blank(&id.0))
        .or_else(|| {
            blueprint
                .legacy(&["teamId", "team_id"])
                .and_then(legacy_text)
        })
        .map(TeamId)
}

pub fn saturation_threshold(blueprint: Option<&Blueprint>) -> f64 {
    let Some(blueprint) = blueprint else {
        return DEFAULT_SATURATION_THRESHOLD;
    };
    blueprint
        .team_fit()
        .and_then(|typed| typed.saturation_threshold)
        .and_then(valid_saturation)
        .or_else(|| {
            blueprint
                .legacy(&["saturationThreshold", "saturation_threshold"])
                .and_then(legacy_number)
                .and_then(valid_saturation)
        })
        .unwrap_or(DEFAULT_SATURATION_THRESHOLD)
}

pub fn target_role(blueprint: Option<&Blueprint>) -> Option<String> {
    let blueprint = blueprint?;
    blueprint
        .team_fit()
        .and_then(|typed| typed.target_role.as_deref())
        .and_then(non_blank)
        .or_else(|| {
            blueprint
                .legacy(&["targetRole", "target_role"])
                .and_then(legacy_text)
        })
}

pub fn role_weights(blueprint: Option<&Blueprint>) -> BTreeMap<CompetencyId, f64> {
    let Some(blueprint) = blueprint else {
        return BTreeMap::new();
    };
    if let Some(typed) = blueprint.team_fit() {
        if !typed.role_weights.is_empty() {
            return typed.role_weights.clone();
        }
    }
    match blueprint.legacy(&["roleWeights", "role_weights"]) {
        Some(Value::Object(entries)) => entries
            .iter()
            .filter_map(|(key, value)| {
                legacy_number(value).map(|weight| (CompetencyId(key.clone()), weight))
            })
            .collect(),
        _ => BTreeMap::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn legacy(value: Value) -> Blueprint {
        match value {
            Value::Object(map) => Blueprint::LegacyMap(map),
            other => panic!("legacy fixtures must be objects, got {other}"),
        }
    }

    #[test]
    fn strictness_prefers_typed_then_legacy_then_default() {
        let typed = Blueprint::Typed(GoalBlueprint::JobFit(JobFitBlueprint {
            taxonomy_code: Some("15-1252.00".to_string()),
            strictness_level: Some(80),
        }));
        assert_eq!(strictness(Some(&typed)), 80);

        let map = legacy(json!({ "strictnessLevel": "30" }));
        assert_eq!(strictness(Some(&map)), 30);

        let garbage = legacy(json!({ "strictnessLevel": "very strict" }));
        assert_eq!(strictness(Some(&garbage)), DEFAULT_STRICTNESS);
        assert_eq!(strictness(None), DEFAULT_STRICTNESS);
    }

    #[test]
    fn strictness_is_clamped_into_range() {
        let typed = Blueprint::Typed(GoalBlueprint::JobFit(JobFitBlueprint {
            taxonomy_code: None,
            strictness_level: Some(140),
        }));
        assert_eq!(strictness(Some(&typed)), 100);
        let map = legacy(json!({ "strictness_level": -12 }));
        assert_eq!(strictness(Some(&map)), 0);
    }

    #[test]
    fn team_blueprint_fields_fall_back_to_defaults() {
        let typed = Blueprint::Typed(GoalBlueprint::TeamFit(TeamFitBlueprint {
            team_id: Some(TeamId("platform".to_string())),
            saturation_threshold: Some(1.7),
            target_role: Some("  ".to_string()),
            role_weights: BTreeMap::new(),
        }));
        let settings = TeamFitSettings::resolve(Some(&typed));
        assert_eq!(settings.team_id, Some(TeamId("platform".to_string())));
        assert_eq!(settings.saturation_threshold, DEFAULT_SATURATION_THRESHOLD);
        assert_eq!(settings.target_role, None);
        assert_eq!(settings.role_weight(&CompetencyId("any".to_string())), 1.0);
    }

    #[test]
    fn legacy_map_supplies_team_settings() {
        let map = legacy(json!({
            "teamId": "data-eng",
            "saturationThreshold": 0.8,
            "targetRole": "Backend Engineer",
            "roleWeights": { "comm": 2.0, "sql": "1.5", "bad": -3.0 }
        }));
        let settings = TeamFitSettings::resolve(Some(&map));
        assert_eq!(settings.team_id, Some(TeamId("data-eng".to_string())));
        assert_eq!(settings.saturation_threshold, 0.8);
        assert_eq!(settings.target_role.as_deref(), Some("Backend Engineer"));
        assert_eq!(settings.role_weight(&CompetencyId("comm".to_string())), 2.0);
        assert_eq!(settings.role_weight(&CompetencyId("sql".to_string())), 1.5);
        assert_eq!(settings.role_weight(&CompetencyId("bad".to_string())), 1.0);
    }

    #[test]
    fn mismatched_typed_blueprint_uses_defaults() {
        let team = Blueprint::Typed(GoalBlueprint::TeamFit(TeamFitBlueprint::default()));
        let settings = JobFitSettings::resolve(Some(&team));
        assert_eq!(settings.strictness, DEFAULT_STRICTNESS);
        assert_eq!(settings.taxonomy_code, None);
    }

    #[test]
    fn deserializes_typed_and_legacy_forms() {
        let typed: Blueprint =
            serde_json::from_value(json!({ "kind": "job_fit", "strictness_level": 70 }))
                .expect("typed blueprint");
        assert!(matches!(typed, Blueprint::Typed(GoalBlueprint::JobFit(_))));

        let map: Blueprint = serde_json::from_value(json!({ "strictnessLevel": 70 }))
            .expect("legacy blueprint");
        assert!(matches!(map, Blueprint::LegacyMap(_)));
        assert_eq!(strictness(Some(&map)), 70);
    }

    #[test]
    fn typed_blueprints_accept_camel_case_keys() {
        let job: Blueprint = serde_json::from_value(json!({
            "kind": "job_fit",
            "taxonomyCode": "15-1252.00",
            "strictnessLevel": 90
        }))
        .expect("typed job blueprint");
        assert!(matches!(job, Blueprint::Typed(GoalBlueprint::JobFit(_))));
        let settings = JobFitSettings::resolve(Some(&job));
        assert_eq!(settings.strictness, 90);
        assert_eq!(settings.taxonomy_code.as_deref(), Some("15-1252.00"));

        let team: Blueprint = serde_json::from_value(json!({
            "kind": "team_fit",
            "teamId": "platform",
            "saturationThreshold": 0.6,
            "targetRole": "Analyst",
            "roleWeights": { "sql": 2.0 }
        }))
        .expect("typed team blueprint");
        assert!(matches!(team, Blueprint::Typed(GoalBlueprint::TeamFit(_))));
        let settings = TeamFitSettings::resolve(Some(&team));
        assert_eq!(settings.team_id, Some(TeamId("platform".to_string())));
        assert_eq!(settings.saturation_threshold, 0.6);
        assert_eq!(settings.target_role.as_deref(), Some("Analyst"));
        assert_eq!(settings.role_weight(&CompetencyId("sql".to_string())), 2.0);
    }
}
