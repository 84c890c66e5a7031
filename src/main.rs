use clap::{Args, Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use talent_fit::config::AppConfig;
use talent_fit::dataset::InMemoryDataset;
use talent_fit::error::AppError;
use talent_fit::scoring::{ResolutionCache, ResultId, ScoringEngine, SessionId, TeamId, TemplateId};
use talent_fit::team::{CandidateComparator, TeamProfileAggregator};
use talent_fit::telemetry;
use tracing::info;

#[derive(Parser, Debug)]
#[command(
    name = "talent-fit",
    about = "Score job-fit and team-fit assessments and compare team-fit candidates",
    version
)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Score a stored session with the strategy matching its template goal
    Score(ScoreArgs),
    /// Rank 2-5 team-fit results against the template's team
    Compare(CompareArgs),
    /// Aggregate a team's competency saturation and personality profile
    TeamProfile(TeamProfileArgs),
}

#[derive(Args, Debug)]
struct DatasetArgs {
    /// Dataset JSON file (defaults to APP_DATASET)
    #[arg(long)]
    dataset: Option<PathBuf>,
}

#[derive(Args, Debug)]
struct ScoreArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Session identifier to score
    #[arg(long)]
    session: String,
}

#[derive(Args, Debug)]
struct CompareArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Template every compared result must belong to
    #[arg(long)]
    template: String,
    /// Result identifiers, repeat the flag for each candidate
    #[arg(long = "result", required = true)]
    results: Vec<String>,
}

#[derive(Args, Debug)]
struct TeamProfileArgs {
    #[command(flatten)]
    dataset: DatasetArgs,
    /// Team identifier
    #[arg(long)]
    team: String,
}

fn main() {
    if let Err(err) = run_cli() {
        eprintln!("application error: {err}");
        std::process::exit(1);
    }
}

fn run_cli() -> Result<(), AppError> {
    let cli = Cli::parse();
    let config = AppConfig::load()?;
    telemetry::init(&config.telemetry, config.environment)?;

    let load = |args: DatasetArgs| -> Result<Arc<InMemoryDataset>, AppError> {
        let path = config.dataset.resolve(args.dataset)?;
        info!(path = %path.display(), "loading dataset");
        Ok(Arc::new(InMemoryDataset::from_path(path)?))
    };

    match cli.command {
        Command::Score(args) => {
            let dataset = load(args.dataset)?;
            let (session, answers) = dataset.session(&SessionId(args.session))?;
            let cache = Arc::new(ResolutionCache::new());
            let result = ScoringEngine::score(dataset.clone(), cache, &session, &answers);
            dataset.record_result(result.clone());
            print_json(&result)
        }
        Command::Compare(args) => {
            let dataset = load(args.dataset)?;
            let comparator =
                CandidateComparator::new(dataset.clone(), dataset.clone(), dataset.clone());
            let ids: Vec<ResultId> = args.results.into_iter().map(ResultId).collect();
            let comparison = comparator.compare_results(&ids, &TemplateId(args.template))?;
            print_json(&comparison)
        }
        Command::TeamProfile(args) => {
            let dataset = load(args.dataset)?;
            let aggregator = TeamProfileAggregator::new(dataset.clone(), dataset.clone());
            let team_id = TeamId(args.team);
            match aggregator.compute_team_profile(&team_id)? {
                Some(profile) => print_json(&profile),
                None => {
                    println!(
                        "no profile: team {team_id} is missing, inactive, or has no active members"
                    );
                    Ok(())
                }
            }
        }
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<(), AppError> {
    let rendered = serde_json::to_string_pretty(value)?;
    println!("{rendered}");
    Ok(())
}
