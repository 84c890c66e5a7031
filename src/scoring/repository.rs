use std::collections::HashMap;

use super::domain::{
    BenchmarkProfile, Competency, CompetencyId, Indicator, IndicatorId, TeamId, TeamProfile,
};

/// Read-only reference data the scorers consume. Implementations own any retry or caching of
/// their own; missing ids are simply absent from the returned maps.
pub trait ReferenceLookup: Send + Sync {
    fn resolve_competencies(
        &self,
        ids: &[CompetencyId],
    ) -> Result<HashMap<CompetencyId, Competency>, RepositoryError>;

    fn resolve_indicators(
        &self,
        ids: &[IndicatorId],
    ) -> Result<HashMap<IndicatorId, Indicator>, RepositoryError>;

    fn team_profile(&self, team_id: &TeamId) -> Result<Option<TeamProfile>, RepositoryError>;

    fn benchmark_profile(&self, code: &str) -> Result<Option<BenchmarkProfile>, RepositoryError>;
}

/// Error enumeration for lookup and repository failures.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    #[error("record not found")]
    NotFound,
    #[error("repository unavailable: {0}")]
    Unavailable(String),
}
