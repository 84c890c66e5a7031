//! Team context: profile aggregation from members' results and team-fit candidate comparison.

pub mod comparison;
pub mod profile;
pub mod repository;

#[cfg(test)]
mod tests;

pub use comparison::{
    CandidateComparator, CandidateComparison, CandidateSummary, ComparisonError,
    Complementarity, CompetencyGapFlag, GapCoverage,
};
pub use profile::TeamProfileAggregator;
pub use repository::{
    ResultRepository, Team, TeamMember, TeamRepository, TeamStatus, TemplateRepository,
};
