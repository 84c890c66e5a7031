//! JSON-backed reference data and result store.
//!
//! One document holds competencies, indicators, templates, sessions with their answers,
//! persisted results, teams, optional precomputed team profiles and occupational benchmarks.
//! [`InMemoryDataset`] implements every lookup and repository trait the engine consumes.

use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;
use std::sync::{PoisonError, RwLock};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::scoring::{
    Answer, AssessmentSession, AssessmentTemplate, BenchmarkProfile, Competency, CompetencyId,
    Indicator, IndicatorId, ReferenceLookup, RepositoryError, ResultId, ScoringResult, SessionId,
    TeamId, TeamProfile, TemplateId, UserId,
};
use crate::team::profile::compute_team_profile;
use crate::team::{ResultRepository, Team, TeamRepository, TemplateRepository};

/// A stored session before its template is joined in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: SessionId,
    pub candidate_id: UserId,
    pub template_id: TemplateId,
    #[serde(default)]
    pub completed_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub answers: Vec<Answer>,
}

/// Serialized layout of a dataset file.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DatasetDocument {
    #[serde(default)]
    pub competencies: Vec<Competency>,
    #[serde(default)]
    pub indicators: Vec<Indicator>,
    #[serde(default)]
    pub templates: Vec<AssessmentTemplate>,
    #[serde(default)]
    pub sessions: Vec<SessionRecord>,
    #[serde(default)]
    pub results: Vec<ScoringResult>,
    #[serde(default)]
    pub teams: Vec<Team>,
    #[serde(default)]
    pub team_profiles: Vec<TeamProfile>,
    #[serde(default)]
    pub benchmarks: Vec<BenchmarkProfile>,
}

#[derive(Debug, Default)]
pub struct InMemoryDataset {
    competencies: HashMap<CompetencyId, Competency>,
    indicators: HashMap<IndicatorId, Indicator>,
    templates: HashMap<TemplateId, AssessmentTemplate>,
    sessions: HashMap<SessionId, SessionRecord>,
    teams: HashMap<TeamId, Team>,
    team_profiles: HashMap<TeamId, TeamProfile>,
    benchmarks: HashMap<String, BenchmarkProfile>,
    results: RwLock<HashMap<ResultId, ScoringResult>>,
}

impl InMemoryDataset {
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, AppError> {
        let file = File::open(path)?;
        Self::from_reader(BufReader::new(file))
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, AppError> {
        let document: DatasetDocument = serde_json::from_reader(reader)?;
        Ok(Self::from_document(document))
    }

    pub fn from_document(document: DatasetDocument) -> Self {
        Self {
            competencies: document
                .competencies
                .into_iter()
                .map(|competency| (competency.id.clone(), competency))
                .collect(),
            indicators: document
                .indicators
                .into_iter()
                .map(|indicator| (indicator.id.clone(), indicator))
                .collect(),
            templates: document
                .templates
                .into_iter()
                .map(|template| (template.id.clone(), template))
                .collect(),
            sessions: document
                .sessions
                .into_iter()
                .map(|session| (session.id.clone(), session))
                .collect(),
            teams: document
                .teams
                .into_iter()
                .map(|team| (team.id.clone(), team))
                .collect(),
            team_profiles: document
                .team_profiles
                .into_iter()
                .map(|profile| (profile.team_id.clone(), profile))
                .collect(),
            benchmarks: document
                .benchmarks
                .into_iter()
                .map(|benchmark| (benchmark.code.trim().to_ascii_lowercase(), benchmark))
                .collect(),
            results: RwLock::new(
                document
                    .results
                    .into_iter()
                    .map(|result| (result.id.clone(), result))
                    .collect(),
            ),
        }
    }

    /// Join a stored session with its template, ready for scoring.
    pub fn session(
        &self,
        id: &SessionId,
    ) -> Result<(AssessmentSession, Vec<Answer>), RepositoryError> {
        let record = self.sessions.get(id).ok_or(RepositoryError::NotFound)?;
        let template = self
            .templates
            .get(&record.template_id)
            .ok_or(RepositoryError::NotFound)?;
        let session = AssessmentSession {
            id: record.id.clone(),
            candidate_id: record.candidate_id.clone(),
            template: template.clone(),
            completed_at: record.completed_at,
        };
        Ok((session, record.answers.clone()))
    }

    pub fn record_result(&self, result: ScoringResult) {
        self.results
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(result.id.clone(), result);
    }
}

impl ReferenceLookup for InMemoryDataset {
    fn resolve_competencies(
        &self,
        ids: &[CompetencyId],
    ) -> Result<HashMap<CompetencyId, Competency>, RepositoryError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.competencies.get(id))
            .map(|competency| (competency.id.clone(), competency.clone()))
            .collect())
    }

    fn resolve_indicators(
        &self,
        ids: &[IndicatorId],
    ) -> Result<HashMap<IndicatorId, Indicator>, RepositoryError> {
        Ok(ids
            .iter()
            .filter_map(|id| self.indicators.get(id))
            .map(|indicator| (indicator.id.clone(), indicator.clone()))
            .collect())
    }

    /// Precomputed profiles win; otherwise the profile is aggregated from stored results.
    fn team_profile(&self, team_id: &TeamId) -> Result<Option<TeamProfile>, RepositoryError> {
        if let Some(profile) = self.team_profiles.get(team_id) {
            return Ok(Some(profile.clone()));
        }
        compute_team_profile(self, self, team_id)
    }

    fn benchmark_profile(&self, code: &str) -> Result<Option<BenchmarkProfile>, RepositoryError> {
        Ok(self
            .benchmarks
            .get(&code.trim().to_ascii_lowercase())
            .cloned())
    }
}

impl ResultRepository for InMemoryDataset {
    fn fetch_results(
        &self,
        ids: &[ResultId],
    ) -> Result<HashMap<ResultId, ScoringResult>, RepositoryError> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        Ok(ids
            .iter()
            .filter_map(|id| results.get(id))
            .map(|result| (result.id.clone(), result.clone()))
            .collect())
    }

    fn completed_results(&self, user_id: &UserId) -> Result<Vec<ScoringResult>, RepositoryError> {
        let results = self.results.read().unwrap_or_else(PoisonError::into_inner);
        Ok(results
            .values()
            .filter(|result| &result.candidate_id == user_id)
            .cloned()
            .collect())
    }
}

impl TemplateRepository for InMemoryDataset {
    fn fetch_template(
        &self,
        id: &TemplateId,
    ) -> Result<Option<AssessmentTemplate>, RepositoryError> {
        Ok(self.templates.get(id).cloned())
    }
}

impl TeamRepository for InMemoryDataset {
    fn find_team(&self, id: &TeamId) -> Result<Option<Team>, RepositoryError> {
        Ok(self.teams.get(id).cloned())
    }
}
