//! penlight - Main CLI Entry Point

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer};

use penlight::{
    cli::{Args, Commands, Config, Verbosity},
    exam::CompletionOutcome,
    sim::{Driver, RunReport, Scenario, SimWorld, TimelineEntry},
    telemetry::{TelemetryCollector, TelemetryDisplay},
    InteractOutcome,
};

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    if let Err(message) = args.validate() {
        eprintln!("{} {}", "error:".red().bold(), message);
        std::process::exit(2);
    }

    let config = Config::load(args.config.clone()).context("loading configuration")?;
    let verbosity = resolve_verbosity(&args, &config);
    init_tracing(verbosity);

    if !config.telemetry.color_output {
        colored::control::set_override(false);
    }

    match &args.command {
        Commands::Run {
            scenario,
            seed,
            realtime,
            json,
        } => {
            let mut config = config.clone();
            if let Some(seed) = seed {
                config.simulation.seed = *seed;
            }
            if *realtime {
                config.simulation.realtime = true;
            }
            run_scenario(&config, scenario, verbosity, *json).await?;
        }
        Commands::Check { scenario } => {
            let parsed = Scenario::load(scenario)?;
            println!(
                "{} {} ({} entities, {} instruments, {} steps, ends at {:?})",
                "ok".green().bold(),
                scenario.display(),
                parsed.entities.len(),
                parsed.instruments.len(),
                parsed.steps.len(),
                parsed.end()
            );
        }
        Commands::Config => {
            show_config(&args, &config)?;
        }
    }

    Ok(())
}

/// Command-line flags win over the configured default
fn resolve_verbosity(args: &Args, config: &Config) -> Verbosity {
    if args.quiet || args.verbose > 0 {
        return args.verbosity();
    }
    Verbosity::from_name(&config.telemetry.default_verbosity).unwrap_or(Verbosity::Normal)
}

fn init_tracing(verbosity: Verbosity) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));
    let layer = fmt::layer()
        .with_target(false)
        .with_writer(std::io::stderr);

    tracing_subscriber::registry()
        .with(layer.with_filter(filter))
        .init();
}

async fn run_scenario(
    config: &Config,
    path: &std::path::Path,
    verbosity: Verbosity,
    json: bool,
) -> Result<()> {
    let scenario = Scenario::load(path)?;
    let telemetry = TelemetryCollector::new();
    let driver = Driver::from_scenario(&scenario, config, telemetry.clone())?;

    let report = driver.run(&scenario).await?;

    if json {
        for delivery in driver.world().deliveries() {
            println!("{}", delivery.to_json()?);
        }
        return Ok(());
    }

    print_timeline(&report, driver.world(), verbosity);
    TelemetryDisplay::new(telemetry, verbosity).display_summary();
    Ok(())
}

fn print_timeline(report: &RunReport, world: &SimWorld, verbosity: Verbosity) {
    let name = if report.scenario.is_empty() {
        "unnamed scenario"
    } else {
        report.scenario.as_str()
    };
    println!(
        "{} {} {}",
        "Scenario:".bold(),
        name.cyan(),
        format!("(started {})", report.started_at.format("%Y-%m-%d %H:%M:%S UTC")).dimmed()
    );

    for entry in &report.timeline {
        match entry {
            TimelineEntry::Interaction {
                at,
                user,
                target,
                outcome,
            } => {
                let target = target
                    .map(|t| world.name_of(t))
                    .unwrap_or_else(|| "nothing".to_string());
                println!(
                    "[{:>6}ms] {} -> {}: {}",
                    at.as_millis(),
                    world.name_of(*user),
                    target,
                    describe_interaction(outcome)
                );
            }
            TimelineEntry::Completion {
                at,
                session,
                user,
                subject,
                outcome,
            } => {
                if verbosity == Verbosity::Quiet && !matches!(outcome, CompletionOutcome::Reported(_)) {
                    continue;
                }
                let label = if verbosity.show_events() {
                    format!("{} ({})", world.name_of(*subject), session)
                } else {
                    world.name_of(*subject)
                };
                println!(
                    "[{:>6}ms] {} examined {}: {}",
                    at.as_millis(),
                    world.name_of(*user),
                    label,
                    describe_completion(outcome)
                );
            }
        }
    }

    if verbosity.show_events() {
        for popup in world.popups() {
            println!(
                "  popup to {}: {}",
                world.name_of(popup.user),
                popup.key.default_text().italic()
            );
        }
    }
}

fn describe_interaction(outcome: &InteractOutcome) -> String {
    match outcome {
        InteractOutcome::Rejected(reason) => format!("{} {}", "rejected".yellow(), reason),
        InteractOutcome::GateFailed(skill) => format!("{} {}", "skill check".red(), skill),
        InteractOutcome::Started { skill, .. } => {
            format!("{} ({})", "exam started".green(), skill)
        }
        InteractOutcome::Blocked(_) => format!("{}", "already examining".yellow()),
        InteractOutcome::SchedulerFailed(_) => format!("{}", "could not start exam".red()),
    }
}

fn describe_completion(outcome: &CompletionOutcome) -> String {
    match outcome {
        CompletionOutcome::Cancelled => format!("{}", "interrupted".yellow()),
        CompletionOutcome::AlreadyHandled => "handled elsewhere".to_string(),
        CompletionOutcome::ChargeLost => format!("{}", "pen light out of charge".red()),
        CompletionOutcome::NoDiagnosis => "nothing to diagnose".to_string(),
        CompletionOutcome::NoInterface(snapshot) => {
            format!("{} (no interface)", snapshot.summary())
        }
        CompletionOutcome::Reported(snapshot) if snapshot.is_healthy() => {
            format!("{}", snapshot.summary().green().bold())
        }
        CompletionOutcome::Reported(snapshot) => {
            format!("{}", snapshot.summary().red().bold())
        }
    }
}

fn show_config(args: &Args, config: &Config) -> Result<()> {
    println!("{}", "penlight configuration".bold());
    match &args.config {
        Some(path) => println!("Source: {}", path.display()),
        None => match Config::default_path() {
            Some(path) if path.exists() => println!("Source: {}", path.display()),
            _ => println!("Source: built-in defaults"),
        },
    }
    println!();
    print!("{}", toml::to_string_pretty(config)?);
    Ok(())
}
