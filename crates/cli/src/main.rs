//! Adaptive CLI - drive and inspect the adaptive strategy engine.

mod source;

use adaptive_core::{
    AdaptationNeed, AdaptationResult, AdaptationType, EnvironmentProfile, FeedbackItem,
    FeedbackSeverity, PerformanceMetrics, PerformanceSample, ResourceUtilization, SystemState,
    Time,
};
use adaptive_effectors::{Effectors, InMemoryCodeOptimizer, InMemoryResourceManager};
use adaptive_engine::{AdaptationLoop, AdaptationOrchestrator, DispatchMode, EngineSettings};
use adaptive_evaluation::{EffectivenessEvaluator, TrendSummary};
use adaptive_storage::{JsonStore, PerformanceHistory};
use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use source::FileStateSource;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "adaptive")]
#[command(about = "Adaptive strategy engine", long_about = None)]
struct Cli {
    /// Directory holding adaptation history and samples
    #[arg(long, global = true, default_value = ".adaptive")]
    data_dir: PathBuf,

    /// JSON settings file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List built-in strategies
    Strategies,
    /// Adapt to a described system state
    Adapt {
        #[command(flatten)]
        state: StateArgs,
        /// Handle this need type instead of detecting needs
        #[arg(long = "type")]
        kind: Option<AdaptationType>,
        /// Run every eligible strategy, not just the winner
        #[arg(long)]
        fan_out: bool,
        /// Rank candidates without executing anything
        #[arg(long)]
        dry_run: bool,
    },
    /// Record a performance sample
    Sample {
        /// Overall score (0.0 - 1.0)
        score: f64,
        /// CPU utilization (0.0 - 1.0)
        #[arg(long, default_value = "0.5")]
        cpu: f64,
        /// Memory utilization (0.0 - 1.0)
        #[arg(long, default_value = "0.5")]
        memory: f64,
        /// Mean response time (ms)
        #[arg(long, default_value = "200")]
        response_time: f64,
        /// Requests per second
        #[arg(long, default_value = "100")]
        throughput: f64,
    },
    /// Report how effective past adaptations were
    Report {
        /// Only adaptations from the last N hours
        #[arg(long)]
        since_hours: Option<i64>,
        /// List each scored adaptation
        #[arg(long)]
        detailed: bool,
    },
    /// Show bucketed performance trends
    Trends {
        /// Window length in hours, ending now
        #[arg(long, default_value = "24")]
        hours: i64,
    },
    /// Poll a state file and adapt on every change in conditions
    Watch {
        /// JSON file holding the current system state
        state_file: PathBuf,
        /// Stop after this many cycles
        #[arg(long)]
        cycles: Option<usize>,
        /// Milliseconds between cycles
        #[arg(long)]
        interval_ms: Option<u64>,
    },
}

/// A system state described on the command line.
#[derive(Args)]
struct StateArgs {
    /// CPU utilization (0.0 - 1.0)
    #[arg(long, default_value = "0.5")]
    cpu: f64,
    /// Memory utilization (0.0 - 1.0)
    #[arg(long, default_value = "0.5")]
    memory: f64,
    /// Disk utilization (0.0 - 1.0)
    #[arg(long, default_value = "0.1")]
    disk: f64,
    /// Network utilization (0.0 - 1.0)
    #[arg(long, default_value = "0.1")]
    network: f64,
    /// Overall performance score (0.0 - 1.0)
    #[arg(long, default_value = "0.75")]
    score: f64,
    /// Network latency (ms)
    #[arg(long, default_value = "50")]
    latency: f64,
    /// CPU cores on the host
    #[arg(long, default_value = "4")]
    cores: u32,
    /// Feedback as `severity:text` (severity optional, defaults to medium)
    #[arg(long)]
    feedback: Vec<String>,
}

impl StateArgs {
    fn to_state(&self, settings: &EngineSettings) -> Result<SystemState> {
        let performance = PerformanceMetrics {
            cpu_usage: self.cpu,
            memory_usage: self.memory,
            network_usage: self.network,
            network_latency_ms: self.latency,
            overall_score: self.score,
            ..Default::default()
        }
        .classified();
        let resources = ResourceUtilization::with_thresholds(
            self.cpu,
            self.memory,
            self.disk,
            self.network,
            &settings.thresholds,
        );
        let environment = EnvironmentProfile {
            cpu_cores: self.cores,
            ..Default::default()
        };
        let feedback = self
            .feedback
            .iter()
            .map(|f| parse_feedback(f))
            .collect::<Result<Vec<_>>>()?;

        Ok(SystemState::new(performance, resources, environment).with_feedback(feedback))
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let settings = match &cli.config {
        Some(path) => EngineSettings::load(path).await?,
        None => EngineSettings::default(),
    };
    let store = Arc::new(JsonStore::new(&cli.data_dir).await?);

    match cli.command {
        Commands::Strategies => {
            let registry = settings.build_registry(&Effectors::in_memory()).await;
            println!("Strategies");
            for kind in AdaptationType::ALL {
                for strategy in registry.strategies_for(kind).await {
                    println!("  {} | {} | {}", strategy.id(), kind, strategy.description());
                }
            }
        }
        Commands::Adapt { state, kind, fan_out, dry_run } => {
            let state = state.to_state(&settings)?;
            let needs = match kind {
                Some(kind) => vec![AdaptationNeed::new(kind, "requested from command line", state.clone())],
                None => settings.detector().detect(&state),
            };
            if needs.is_empty() {
                println!("No adaptation needed");
                return Ok(());
            }

            let resources = Arc::new(InMemoryResourceManager::new());
            let optimizer = Arc::new(InMemoryCodeOptimizer::new());
            let effectors = Effectors::new(resources.clone(), optimizer.clone());
            let registry = Arc::new(settings.build_registry(&effectors).await);

            let mut orchestrator_config = settings.orchestrator.clone();
            if fan_out {
                orchestrator_config.dispatch = DispatchMode::FanOut;
            }
            let orchestrator =
                AdaptationOrchestrator::new(registry, store.clone()).with_config(orchestrator_config);

            if dry_run {
                for need in &needs {
                    println!("{} need: {}", need.adaptation_type, need.trigger);
                    for candidate in orchestrator.rank(need).await {
                        println!(
                            "  {} | priority {} | estimate {:.2}",
                            candidate.strategy.id(),
                            candidate.priority,
                            candidate.estimated_improvement
                        );
                    }
                }
                return Ok(());
            }

            store.record_sample(&PerformanceSample::from(&state)).await?;
            for need in needs {
                println!("{} need: {}", need.adaptation_type, need.trigger);
                print_result(&orchestrator.handle(need).await);
            }

            println!("Effector settings");
            println!("  resources: {:?}", resources.settings().await);
            println!("  generation: {:?}", optimizer.settings().await);
        }
        Commands::Sample { score, cpu, memory, response_time, throughput } => {
            let sample = PerformanceSample {
                timestamp: chrono::Utc::now(),
                cpu_usage: cpu,
                memory_usage: memory,
                response_time_ms: response_time,
                throughput,
                overall_score: score,
            };
            store.record_sample(&sample).await?;
            println!("Recorded sample at {} (score {:.2})", sample.timestamp, sample.overall_score);
        }
        Commands::Report { since_hours, detailed } => {
            let since = since_hours.map(|h| hours_before(chrono::Utc::now(), h)).transpose()?;
            let evaluator = EffectivenessEvaluator::new(store.clone(), store.clone())
                .with_config(settings.evaluation.clone());
            let report = evaluator.report(since).await?;

            println!("Effectiveness Report");
            println!("  Evaluated: {} (excluded {})", report.evaluated, report.excluded);
            println!("  Overall effectiveness: {:+.2}", report.overall_effectiveness);
            println!("  Successful: {}", report.successful_adaptations);
            println!("By type");
            for (kind, b) in &report.by_type {
                println!("  {} | {} | mean {:+.2} | success {:.0}%", kind, b.count, b.mean_score, b.success_rate() * 100.0);
            }
            println!("By strategy");
            for (id, b) in &report.by_strategy {
                println!("  {} | {} | mean {:+.2} | success {:.0}%", id, b.count, b.mean_score, b.success_rate() * 100.0);
            }
            if detailed {
                println!("Records");
                for r in &report.records {
                    let calibration = r
                        .calibration_ratio()
                        .map(|c| format!("{:.2}", c))
                        .unwrap_or_else(|| "-".to_string());
                    println!(
                        "  {} | {} | {:.2} -> {:.2} | score {:+.2} | calibration {}",
                        r.adaptation_id,
                        r.adaptation_type,
                        r.before_score,
                        r.after_score,
                        r.display_score(),
                        calibration
                    );
                }
            }
        }
        Commands::Trends { hours } => {
            let end = chrono::Utc::now();
            let start = hours_before(end, hours)?;
            let evaluator = EffectivenessEvaluator::new(store.clone(), store.clone())
                .with_config(settings.evaluation.clone());
            let buckets = evaluator.trends(start, end).await?;

            println!("Trends ({} bucket(s))", buckets.len());
            for b in &buckets {
                println!(
                    "  {} | n={} | score {:.2} | cpu {:.2} | mem {:.2} | {:.0}ms | {:.1}/s",
                    b.start.format("%Y-%m-%d %H:%M"),
                    b.sample_count,
                    b.overall_score,
                    b.cpu_usage,
                    b.memory_usage,
                    b.response_time_ms,
                    b.throughput
                );
            }
            let summary = TrendSummary::from_buckets(&buckets);
            println!("Direction: {} ({:+.2})", summary.direction, summary.score_delta);
        }
        Commands::Watch { state_file, cycles, interval_ms } => {
            let effectors = Effectors::in_memory();
            let registry = Arc::new(settings.build_registry(&effectors).await);
            let orchestrator = AdaptationOrchestrator::new(registry, store.clone())
                .with_config(settings.orchestrator.clone());

            let mut loop_config = settings.adaptation_loop.clone();
            if cycles.is_some() {
                loop_config.max_cycles = cycles;
            }
            if let Some(ms) = interval_ms {
                loop_config.interval_ms = ms;
            }

            let source = FileStateSource::new(state_file).with_thresholds(settings.thresholds);
            let mut adaptation_loop = AdaptationLoop::new(Arc::new(source), orchestrator)
                .with_detector(settings.detector())
                .with_history(store.clone())
                .with_config(loop_config);
            adaptation_loop.run().await?;
            info!("Completed {} cycles", adaptation_loop.cycles());
        }
    }

    Ok(())
}

fn hours_before(end: Time, hours: i64) -> Result<Time> {
    chrono::Duration::try_hours(hours)
        .and_then(|window| end.checked_sub_signed(window))
        .ok_or_else(|| anyhow::anyhow!("{} hours is out of range", hours))
}

fn print_result(result: &AdaptationResult) {
    if !result.is_successful {
        println!("  nothing applied");
        return;
    }
    for a in &result.applied_adaptations {
        let params: Vec<_> = a.parameters.iter().map(|(k, v)| format!("{}={}", k, v)).collect();
        println!(
            "  {} | {} | x{:.2} | {} [{}]",
            a.id,
            a.adaptation_type,
            a.estimated_improvement_factor,
            a.description,
            params.join(", ")
        );
    }
    println!("  estimated improvement: {:.2}", result.estimated_improvement);
}

fn parse_feedback(raw: &str) -> Result<FeedbackItem> {
    match raw.split_once(':') {
        Some((severity, content)) => match parse_severity(severity) {
            Some(severity) => Ok(FeedbackItem::new(severity, content.trim())),
            None => Ok(FeedbackItem::new(FeedbackSeverity::Medium, raw)),
        },
        None if raw.trim().is_empty() => Err(anyhow::anyhow!("Empty feedback")),
        None => Ok(FeedbackItem::new(FeedbackSeverity::Medium, raw)),
    }
}

fn parse_severity(s: &str) -> Option<FeedbackSeverity> {
    match s.trim().to_lowercase().as_str() {
        "low" => Some(FeedbackSeverity::Low),
        "medium" => Some(FeedbackSeverity::Medium),
        "high" => Some(FeedbackSeverity::High),
        "critical" => Some(FeedbackSeverity::Critical),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_feedback() {
        let item = parse_feedback("high: too slow").unwrap();
        assert_eq!(item.severity, FeedbackSeverity::High);
        assert_eq!(item.content, "too slow");

        // Unknown prefixes are part of the text.
        let item = parse_feedback("note: unclear output").unwrap();
        assert_eq!(item.severity, FeedbackSeverity::Medium);
        assert_eq!(item.content, "note: unclear output");

        assert!(parse_feedback("  ").is_err());
    }

    #[test]
    fn test_state_args_apply_thresholds() {
        let args = StateArgs {
            cpu: 0.95,
            memory: 0.4,
            disk: 0.1,
            network: 0.1,
            score: 0.3,
            latency: 50.0,
            cores: 8,
            feedback: vec!["critical:timeout".to_string()],
        };
        let state = args.to_state(&EngineSettings::default()).unwrap();
        assert!(state.resources.is_constrained);
        assert_eq!(state.environment.cpu_cores, 8);
        assert_eq!(state.recent_feedback[0].severity, FeedbackSeverity::Critical);
        assert_eq!(state.performance.severity, adaptive_core::PerformanceSeverity::Critical);
    }

    #[test]
    fn test_hours_before_rejects_out_of_range() {
        let now = chrono::Utc::now();
        assert_eq!(hours_before(now, 2).unwrap(), now - chrono::Duration::hours(2));
        assert!(hours_before(now, i64::MAX).is_err());
        assert!(hours_before(now, i64::MIN).is_err());
        assert!(hours_before(now, 3_000_000_000).is_err());
    }

    #[test]
    fn test_state_args_use_shared_thresholds() {
        let args = StateArgs {
            cpu: 0.7,
            memory: 0.4,
            disk: 0.1,
            network: 0.1,
            score: 0.75,
            latency: 50.0,
            cores: 4,
            feedback: Vec::new(),
        };
        let settings: EngineSettings = serde_json::from_str(r#"{ "thresholds": { "cpu": 0.5 } }"#).unwrap();
        let state = args.to_state(&settings).unwrap();
        assert!(state.resources.is_constrained);
        assert_eq!(settings.detector().detect(&state).len(), 1);
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::parse_from(["adaptive", "adapt", "--cpu", "0.95", "--type", "resource", "--fan-out"]);
        match cli.command {
            Commands::Adapt { state, kind, fan_out, dry_run } => {
                assert_eq!(state.cpu, 0.95);
                assert_eq!(kind, Some(AdaptationType::ResourceOptimization));
                assert!(fan_out);
                assert!(!dry_run);
            }
            _ => panic!("expected adapt"),
        }
        assert_eq!(cli.data_dir, PathBuf::from(".adaptive"));
    }
}
