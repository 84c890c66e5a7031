//! Team-fit scoring.
//!
//! Competencies are weighted by taxonomy and personality mappings, classified against the
//! team's saturation (or the candidate's own averages when no team context exists), and the
//! weighted mean is scaled by a balance multiplier that rewards diversity over saturation.

use std::collections::BTreeMap;
use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use super::aggregation::{aggregate, CompetencyGroup};
use super::blueprint::TeamFitSettings;
use super::domain::{
    Answer, AssessmentGoal, AssessmentSession, BigFiveTrait, GoalMetrics, ScoringResult,
    TeamFitMetrics, TeamProfile,
};
use super::repository::ReferenceLookup;
use super::resolution::ResolutionCache;
use super::{assemble_result, meets_threshold, ScoringStrategy};

pub const TAXONOMY_WEIGHT: f64 = 1.15;
pub const PERSONALITY_WEIGHT: f64 = 1.1;
/// Below this a competency is a gap; from here up to the saturation threshold it adds diversity.
pub const DIVERSITY_LOWER_BOUND: f64 = 0.5;
pub const MIN_DIVERSITY_RATIO: f64 = 0.3;

const SIGMOID_STEEPNESS: f64 = 4.0;
const MULTIPLIER_FLOOR: f64 = 0.9;
const MULTIPLIER_SPAN: f64 = 0.2;
const PERSONALITY_SPAN: f64 = 0.1;

const BASE_PASS_THRESHOLD: f64 = 0.6;
const SMALL_TEAM_SIZE: usize = 5;
const SMALL_TEAM_DISCOUNT: f64 = 0.1;
const PASS_THRESHOLD_FLOOR: f64 = 0.3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CoverageClass {
    Gap,
    Diversity,
    Saturation,
}

impl CoverageClass {
    pub fn classify(value: f64, saturation_threshold: f64) -> Self {
        if value >= saturation_threshold {
            CoverageClass::Saturation
        } else if value >= DIVERSITY_LOWER_BOUND {
            CoverageClass::Diversity
        } else {
            CoverageClass::Gap
        }
    }
}

pub fn competency_weight(group: &CompetencyGroup) -> f64 {
    let taxonomy = &group.competency.taxonomy;
    let occupational = if taxonomy.has_occupational_ref() {
        TAXONOMY_WEIGHT
    } else {
        1.0
    };
    let personality = if taxonomy.personality_trait().is_some() {
        PERSONALITY_WEIGHT
    } else {
        1.0
    };
    occupational * personality
}

fn sigmoid(value: f64) -> f64 {
    1.0 / (1.0 + (-value).exp())
}

/// Balance multiplier in (0.9, 1.1); a balance of zero maps to exactly 1.0.
pub fn balance_multiplier(diversity_ratio: f64, saturation_ratio: f64) -> f64 {
    let balance = diversity_ratio - saturation_ratio;
    MULTIPLIER_FLOOR + MULTIPLIER_SPAN * sigmoid(SIGMOID_STEEPNESS * balance)
}

/// Per-trait mean of the averages of personality-mapped competencies.
pub fn candidate_traits(groups: &[CompetencyGroup]) -> BTreeMap<BigFiveTrait, f64> {
    let mut sums: BTreeMap<BigFiveTrait, (f64, u32)> = BTreeMap::new();
    for group in groups {
        if let Some(big_five) = group.competency.taxonomy.personality_trait() {
            let entry = sums.entry(big_five).or_insert((0.0, 0));
            entry.0 += group.average();
            entry.1 += 1;
        }
    }
    sums.into_iter()
        .map(|(big_five, (sum, count))| (big_five, sum / f64::from(count)))
        .collect()
}

/// `1 - normalized Euclidean distance` over the traits both sides report.
pub fn personality_compatibility(
    candidate: &BTreeMap<BigFiveTrait, f64>,
    team: &BTreeMap<BigFiveTrait, f64>,
) -> Option<f64> {
    let differences: Vec<f64> = candidate
        .iter()
        .filter_map(|(big_five, value)| team.get(big_five).map(|other| value - other))
        .collect();
    if differences.is_empty() {
        return None;
    }
    let distance = differences.iter().map(|diff| diff * diff).sum::<f64>().sqrt();
    let normalized = distance / (differences.len() as f64).sqrt();
    Some((1.0 - normalized).clamp(0.0, 1.0))
}

/// Pass threshold, eased for small teams and floored.
pub fn pass_threshold(team: Option<&TeamProfile>) -> f64 {
    let threshold = match team {
        Some(profile) if profile.team_size() < SMALL_TEAM_SIZE => {
            BASE_PASS_THRESHOLD - SMALL_TEAM_DISCOUNT
        }
        _ => BASE_PASS_THRESHOLD,
    };
    threshold.max(PASS_THRESHOLD_FLOOR)
}

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct ClassCounts {
    gap: usize,
    diversity: usize,
    saturation: usize,
}

impl ClassCounts {
    fn record(&mut self, class: CoverageClass) {
        match class {
            CoverageClass::Gap => self.gap += 1,
            CoverageClass::Diversity => self.diversity += 1,
            CoverageClass::Saturation => self.saturation += 1,
        }
    }

    fn ratio(&self, count: usize) -> f64 {
        let total = self.gap + self.diversity + self.saturation;
        if total == 0 {
            0.0
        } else {
            count as f64 / total as f64
        }
    }
}

/// Score grouped answers against the team-fit rules, with or without team context.
pub fn score_team_fit(
    session: &AssessmentSession,
    groups: &[CompetencyGroup],
    settings: &TeamFitSettings,
    team: Option<&TeamProfile>,
) -> ScoringResult {
    let team_saturation = team.filter(|profile| !profile.saturation.is_empty());

    let mut counts = ClassCounts::default();
    let mut weighted_sum = 0.0;
    let mut weight_total = 0.0;

    for group in groups {
        let reference = match team_saturation {
            Some(profile) => profile.saturation_for(&group.competency.id),
            None => group.average(),
        };
        counts.record(CoverageClass::classify(
            reference,
            settings.saturation_threshold,
        ));

        let relevance = match team {
            Some(profile) => 1.0 + (1.0 - profile.saturation_for(&group.competency.id)),
            None => 1.0,
        };
        let weight =
            competency_weight(group) * relevance * settings.role_weight(&group.competency.id);
        weighted_sum += weight * group.average();
        weight_total += weight;
    }

    let diversity_ratio = counts.ratio(counts.diversity);
    let saturation_ratio = counts.ratio(counts.saturation);
    let mut multiplier = balance_multiplier(diversity_ratio, saturation_ratio);

    let traits = candidate_traits(groups);
    let compatibility = team
        .filter(|profile| !profile.personality_traits.is_empty())
        .and_then(|profile| personality_compatibility(&traits, &profile.personality_traits));
    if let Some(compatibility) = compatibility {
        multiplier += (compatibility - 0.5) * PERSONALITY_SPAN;
    }

    let percentage = if weight_total > 0.0 {
        (100.0 * weighted_sum / weight_total * multiplier).clamp(0.0, 100.0)
    } else {
        0.0
    };
    let threshold = pass_threshold(team);
    let passed = !groups.is_empty()
        && meets_threshold(percentage / 100.0, threshold)
        && meets_threshold(diversity_ratio, MIN_DIVERSITY_RATIO);

    debug!(
        team_context = team.is_some(),
        diversity = counts.diversity,
        saturation = counts.saturation,
        gaps = counts.gap,
        multiplier,
        threshold,
        "team fit factors"
    );

    let competency_scores = groups.iter().map(CompetencyGroup::to_score).collect();
    let metrics = GoalMetrics::TeamFit(TeamFitMetrics {
        saturation_threshold: settings.saturation_threshold,
        pass_threshold: threshold,
        multiplier,
        diversity_count: counts.diversity,
        saturation_count: counts.saturation,
        gap_count: counts.gap,
        diversity_ratio,
        saturation_ratio,
        team_size: team.map(TeamProfile::team_size).unwrap_or(0),
        personality_compatibility: compatibility,
        personality_traits: traits,
        target_role: settings.target_role.clone(),
    });

    assemble_result(
        session,
        AssessmentGoal::TeamFit,
        groups,
        competency_scores,
        percentage,
        passed,
        metrics,
    )
}

/// Team-fit strategy: balances the candidate's profile against the team's current coverage.
pub struct TeamFitScorer<L: ?Sized> {
    lookup: Arc<L>,
    cache: Arc<ResolutionCache>,
}

impl<L> TeamFitScorer<L>
where
    L: ReferenceLookup + ?Sized,
{
    pub fn new(lookup: Arc<L>, cache: Arc<ResolutionCache>) -> Self {
        Self { lookup, cache }
    }

    /// Fetched fresh on every call; lookup failures fall back to self-referential scoring.
    fn team_profile(&self, settings: &TeamFitSettings) -> Option<TeamProfile> {
        let team_id = settings.team_id.as_ref()?;
        match self.lookup.team_profile(team_id) {
            Ok(Some(profile)) => Some(profile),
            Ok(None) => {
                debug!(team = %team_id, "no team profile; scoring self-referentially");
                None
            }
            Err(err) => {
                warn!(
                    team = %team_id,
                    error = %err,
                    "team profile lookup failed; scoring self-referentially"
                );
                None
            }
        }
    }
}

impl<L> ScoringStrategy for TeamFitScorer<L>
where
    L: ReferenceLookup + ?Sized,
{
    fn supported_goal(&self) -> AssessmentGoal {
        AssessmentGoal::TeamFit
    }

    fn calculate(&self, session: &AssessmentSession, answers: &[Answer]) -> ScoringResult {
        let settings = TeamFitSettings::resolve(session.template.blueprint.as_ref());
        let resolution = self.cache.resolve(self.lookup.as_ref(), answers);
        let groups = aggregate(answers, &resolution);
        let team = self.team_profile(&settings);

        let result = score_team_fit(session, &groups, &settings, team.as_ref());
        info!(
            session = %session.id.0,
            goal = AssessmentGoal::TeamFit.label(),
            percentage = result.overall_percentage,
            passed = result.passed,
            "scored session"
        );
        result
    }
}
