//! Competency scoring for job-fit and team-fit assessments.
//!
//! The [`scoring`] module turns a session's answers into a [`scoring::ScoringResult`], the
//! [`team`] module aggregates team context and ranks team-fit candidates, and [`dataset`]
//! provides a JSON-backed implementation of every lookup the engine consumes.

pub mod config;
pub mod dataset;
pub mod error;
pub mod scoring;
pub mod team;
pub mod telemetry;
