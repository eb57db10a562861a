//! Tick loop driving a scenario through the orchestrator
//!
//! Each tick: apply due steps, dispatch any interruptions they caused,
//! advance the scheduler clock, then dispatch completions. Ticks optionally
//! pace against the wall clock.

use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use crate::cli::config::Config;
use crate::errors::{ExamError, Result};
use crate::exam::orchestrator::{Collaborators, CompletionOutcome, ExamOrchestrator, InteractOutcome};
use crate::exam::ports::InteractEvent;
use crate::exam::scheduler::SessionScheduler;
use crate::exam::session::{SessionId, SessionOutcome};
use crate::sim::scenario::{parse_capability, Action, Scenario, Step};
use crate::sim::skill::DiceSkillChecker;
use crate::sim::world::SimWorld;
use crate::telemetry::TelemetryCollector;
use crate::types::EntityId;

/// One line of the run timeline
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimelineEntry {
    Interaction {
        at: Duration,
        user: EntityId,
        target: Option<EntityId>,
        outcome: InteractOutcome,
    },
    Completion {
        at: Duration,
        session: SessionId,
        user: EntityId,
        subject: EntityId,
        outcome: CompletionOutcome,
    },
}

/// Everything a finished run produced
#[derive(Debug, Clone, Default)]
pub struct RunReport {
    pub scenario: String,
    /// Wall-clock time the run began
    pub started_at: DateTime<Utc>,
    pub timeline: Vec<TimelineEntry>,
    pub ticks: u64,
}

impl RunReport {
    pub fn interactions(&self) -> impl Iterator<Item = &InteractOutcome> {
        self.timeline.iter().filter_map(|entry| match entry {
            TimelineEntry::Interaction { outcome, .. } => Some(outcome),
            _ => None,
        })
    }

    pub fn completions(&self) -> impl Iterator<Item = &CompletionOutcome> {
        self.timeline.iter().filter_map(|entry| match entry {
            TimelineEntry::Completion { outcome, .. } => Some(outcome),
            _ => None,
        })
    }
}

/// Simulation driver
pub struct Driver {
    world: SimWorld,
    scheduler: SessionScheduler,
    skills: Arc<DiceSkillChecker>,
    orchestrator: ExamOrchestrator,
    tick: Duration,
    realtime: bool,
}

impl Driver {
    /// Wire a world into a fresh scheduler and orchestrator
    pub fn new(world: SimWorld, config: &Config, telemetry: TelemetryCollector) -> Self {
        let scheduler = SessionScheduler::new();
        let skills = Arc::new(DiceSkillChecker::new(world.clone(), config.simulation.seed));
        let shared = Arc::new(world.clone());

        let collaborators = Collaborators {
            power: shared.clone(),
            skills: skills.clone(),
            scheduler: Arc::new(scheduler.clone()),
            ui: shared.clone(),
            probe: shared.clone(),
            feedback: shared,
        };
        let orchestrator =
            ExamOrchestrator::new(collaborators, config.exam_config()).with_telemetry(telemetry);

        Self {
            world,
            scheduler,
            skills,
            orchestrator,
            tick: config.tick(),
            realtime: config.simulation.realtime,
        }
    }

    /// Build world and driver straight from a scenario
    pub fn from_scenario(scenario: &Scenario, config: &Config, telemetry: TelemetryCollector) -> Result<Self> {
        config.validate()?;
        let world = scenario.build_world(config)?;
        Ok(Self::new(world, config, telemetry))
    }

    pub fn world(&self) -> &SimWorld {
        &self.world
    }

    pub fn scheduler(&self) -> &SessionScheduler {
        &self.scheduler
    }

    pub fn orchestrator(&self) -> &ExamOrchestrator {
        &self.orchestrator
    }

    /// Run every step, then keep ticking until no session is pending
    pub async fn run(&self, scenario: &Scenario) -> Result<RunReport> {
        let mut report = RunReport {
            scenario: scenario.name.clone(),
            started_at: Utc::now(),
            ..Default::default()
        };
        if self.tick.is_zero() {
            return Err(ExamError::ConfigError(
                "tick_ms must be greater than 0".to_string(),
            ));
        }
        let mut steps = scenario.steps.iter().peekable();
        let mut interval = self.realtime.then(|| tokio::time::interval(self.tick));
        let mut clock = Duration::ZERO;

        info!(scenario = %scenario.name, steps = scenario.steps.len(), "scenario started");

        loop {
            while let Some(step) = steps.next_if(|s| s.at() <= clock) {
                self.apply(step, clock, &mut report)?;
                self.dispatch(clock, &mut report);
            }

            if steps.peek().is_none() && self.scheduler.pending_count() == 0 {
                break;
            }

            match interval.as_mut() {
                Some(interval) => {
                    interval.tick().await;
                }
                None => tokio::task::yield_now().await,
            }

            clock += self.tick;
            report.ticks += 1;
            self.scheduler.advance(self.tick, &self.world);
            self.dispatch(clock, &mut report);
        }

        info!(scenario = %scenario.name, ticks = report.ticks, "scenario finished");
        Ok(report)
    }

    fn apply(&self, step: &Step, clock: Duration, report: &mut RunReport) -> Result<()> {
        debug!(at_ms = step.at_ms, action = ?step.action, "applying step");

        match &step.action {
            Action::Interact {
                user,
                instrument,
                target,
                can_reach,
                roll,
            } => {
                let instrument = self
                    .world
                    .instrument(EntityId(*instrument))
                    .ok_or(ExamError::UnknownEntity(EntityId(*instrument)))?;
                if let Some(roll) = roll {
                    self.skills.force(roll.to_roll());
                }
                let event = InteractEvent {
                    instrument: instrument.id,
                    user: EntityId(*user),
                    target: target.map(EntityId),
                    can_reach: *can_reach,
                    handled: false,
                };
                let outcome = self.orchestrator.on_interact(&instrument, &event);
                report.timeline.push(TimelineEntry::Interaction {
                    at: clock,
                    user: event.user,
                    target: event.target,
                    outcome,
                });
            }
            Action::Move { user } => {
                self.scheduler.notify_moved(EntityId(*user));
            }
            Action::SwapHands { user, holding } => {
                self.world.set_holding(EntityId(*user), holding.map(EntityId))?;
                self.scheduler.notify_hand_changed(EntityId(*user));
            }
            Action::Restrain { user, restrained } => {
                self.world.set_restrained(EntityId(*user), *restrained)?;
            }
            Action::ToggleLight { instrument, on } => {
                self.world.set_light(EntityId(*instrument), *on)?;
            }
            Action::SetBattery {
                instrument,
                battery,
            } => {
                self.world.set_battery(EntityId(*instrument), *battery)?;
            }
            Action::SetCondition {
                entity,
                capability,
                present,
            } => {
                let capability = parse_capability(capability)?;
                self.world
                    .set_condition(EntityId(*entity), capability, *present)?;
            }
            Action::SetEyeDamage { entity, magnitude } => {
                self.world.set_eye_damage(EntityId(*entity), *magnitude)?;
            }
        }

        Ok(())
    }

    fn dispatch(&self, clock: Duration, report: &mut RunReport) {
        for outcome in self.scheduler.drain() {
            self.complete(&outcome, clock, report);
        }
    }

    fn complete(&self, outcome: &SessionOutcome, clock: Duration, report: &mut RunReport) {
        let result = self.orchestrator.on_session_outcome(outcome);
        report.timeline.push(TimelineEntry::Completion {
            at: clock,
            session: outcome.session.id,
            user: outcome.session.user(),
            subject: outcome.session.subject(),
            outcome: result,
        });
    }
}
