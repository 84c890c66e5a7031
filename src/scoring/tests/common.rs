use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;

use chrono::{TimeZone, Utc};

use crate::scoring::aggregation::CompetencyGroup;
use crate::scoring::blueprint::Blueprint;
use crate::scoring::domain::{
    Answer, AssessmentGoal, AssessmentSession, AssessmentTemplate, BenchmarkProfile, BigFiveTrait,
    Competency, CompetencyId, Indicator, IndicatorId, MemberProfile, QuestionId, QuestionRef,
    SessionId, TaxonomyRefs, TeamId, TeamProfile, TemplateId, UserId,
};
use crate::scoring::repository::{ReferenceLookup, RepositoryError};

pub(super) fn competency(id: &str, onet: Option<&str>, big_five: Option<&str>) -> Competency {
    Competency {
        id: CompetencyId(id.to_string()),
        name: id.replace('-', " "),
        category: "core".to_string(),
        taxonomy: TaxonomyRefs {
            onet_code: onet.map(str::to_string),
            esco_uri: None,
            big_five: big_five.map(str::to_string),
        },
    }
}

pub(super) fn indicator_for(competency: &Competency) -> Indicator {
    Indicator {
        id: IndicatorId(format!("ind-{}", competency.id.0)),
        competency_id: Some(competency.id.clone()),
        name: format!("{} indicator", competency.name),
    }
}

pub(super) fn question(indicator: &str, index: usize) -> QuestionRef {
    QuestionRef {
        id: QuestionId(format!("q-{indicator}-{index}")),
        indicator_id: Some(IndicatorId(format!("ind-{indicator}"))),
    }
}

/// Likert answers for one competency, one per value.
pub(super) fn likert_answers(competency_id: &str, values: &[i32]) -> Vec<Answer> {
    values
        .iter()
        .enumerate()
        .map(|(index, value)| Answer::likert(question(competency_id, index), *value))
        .collect()
}

pub(super) fn raw_answers(competency_id: &str, scores: &[f64]) -> Vec<Answer> {
    scores
        .iter()
        .enumerate()
        .map(|(index, score)| Answer::raw(question(competency_id, index), *score))
        .collect()
}

pub(super) fn group(competency: Competency, scores: &[f64]) -> CompetencyGroup {
    CompetencyGroup {
        competency,
        score: scores.iter().sum(),
        answered: scores.len() as u32,
    }
}

pub(super) fn session(goal: AssessmentGoal, blueprint: Option<Blueprint>) -> AssessmentSession {
    AssessmentSession {
        id: SessionId("session-1".to_string()),
        candidate_id: UserId("candidate-1".to_string()),
        template: AssessmentTemplate {
            id: TemplateId("template-1".to_string()),
            name: "Assessment".to_string(),
            goal,
            blueprint,
        },
        completed_at: Some(Utc.with_ymd_and_hms(2026, 3, 2, 9, 30, 0).unwrap()),
    }
}

pub(super) fn team_profile(
    members: usize,
    saturation: &[(&str, f64)],
    traits: &[(BigFiveTrait, f64)],
) -> TeamProfile {
    TeamProfile {
        team_id: TeamId("team-1".to_string()),
        team_name: "Platform".to_string(),
        members: (0..members)
            .map(|index| MemberProfile {
                user_id: UserId(format!("member-{index}")),
                display_name: format!("Member {index}"),
                role: None,
                competency_levels: BTreeMap::new(),
                personality_traits: BTreeMap::new(),
            })
            .collect(),
        saturation: saturation
            .iter()
            .map(|(id, value)| (CompetencyId(id.to_string()), *value))
            .collect(),
        personality_traits: traits.iter().copied().collect(),
        skill_gaps: Vec::new(),
    }
}

pub(super) fn assert_close(actual: f64, expected: f64, tolerance: f64) {
    assert!(
        (actual - expected).abs() <= tolerance,
        "expected {expected} +/- {tolerance}, got {actual}"
    );
}

/// Lookup double that counts batch calls.
#[derive(Default)]
pub(super) struct MemoryLookup {
    pub(super) competencies: HashMap<CompetencyId, Competency>,
    pub(super) indicators: HashMap<IndicatorId, Indicator>,
    pub(super) team_profiles: HashMap<TeamId, TeamProfile>,
    pub(super) benchmarks: HashMap<String, BenchmarkProfile>,
    pub(super) indicator_calls: AtomicUsize,
    pub(super) competency_calls: AtomicUsize,
    pub(super) requested_indicators: Mutex<Vec<IndicatorId>>,
}

impl MemoryLookup {
    pub(super) fn with_competencies(competencies: &[Competency]) -> Self {
        let mut lookup = Self::default();
        for competency in competencies {
            let indicator = indicator_for(competency);
            lookup.indicators.insert(indicator.id.clone(), indicator);
            lookup
                .competencies
                .insert(competency.id.clone(), competency.clone());
        }
        lookup
    }

    pub(super) fn indicator_calls(&self) -> usize {
        self.indicator_calls.load(Ordering::SeqCst)
    }

    pub(super) fn competency_calls(&self) -> usize {
        self.competency_calls.load(Ordering::SeqCst)
    }
}

impl ReferenceLookup for MemoryLookup {
    fn resolve_competencies(
        &self,
        ids: &[CompetencyId],
    ) -> Result<HashMap<CompetencyId, Competency>, RepositoryError> {
        self.competency_calls.fetch_add(1, Ordering::SeqCst);
        Ok(ids
            .iter()
            .filter_map(|id| self.competencies.get(id).cloned())
            .map(|competency| (competency.id.clone(), competency))
            .collect())
    }

    fn resolve_indicators(
        &self,
        ids: &[IndicatorId],
    ) -> Result<HashMap<IndicatorId, Indicator>, RepositoryError> {
        self.indicator_calls.fetch_add(1, Ordering::SeqCst);
        self.requested_indicators
            .lock()
            .expect("request log poisoned")
            .extend(ids.iter().cloned());
        Ok(ids
            .iter()
            .filter_map(|id| self.indicators.get(id).cloned())
            .map(|indicator| (indicator.id.clone(), indicator))
            .collect())
    }

    fn team_profile(&self, team_id: &TeamId) -> Result<Option<TeamProfile>, RepositoryError> {
        Ok(self.team_profiles.get(team_id).cloned())
    }

    fn benchmark_profile(&self, code: &str) -> Result<Option<BenchmarkProfile>, RepositoryError> {
        Ok(self.benchmarks.get(code).cloned())
    }
}

pub(super) struct UnavailableLookup;

impl ReferenceLookup for UnavailableLookup {
    fn resolve_competencies(
        &self,
        _ids: &[CompetencyId],
    ) -> Result<HashMap<CompetencyId, Competency>, RepositoryError> {
        Err(RepositoryError::Unavailable("taxonomy service offline".to_string()))
    }

    fn resolve_indicators(
        &self,
        _ids: &[IndicatorId],
    ) -> Result<HashMap<IndicatorId, Indicator>, RepositoryError> {
        Err(RepositoryError::Unavailable("taxonomy service offline".to_string()))
    }

    fn team_profile(&self, _team_id: &TeamId) -> Result<Option<TeamProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("team service offline".to_string()))
    }

    fn benchmark_profile(&self, _code: &str) -> Result<Option<BenchmarkProfile>, RepositoryError> {
        Err(RepositoryError::Unavailable("benchmark service offline".to_string()))
    }
}
