//! Examination orchestrator - main coordinator
//!
//! Composes the request flow:
//! - Precondition validation
//! - Skill gate with tiered feedback
//! - Timed session through the scheduler
//! - Diagnosis and delivery once a session completes
//!
//! The two entry points are called by the surrounding simulation: one per
//! interaction, one per terminal session outcome.

use std::sync::Arc;
use std::time::Instant;

use tracing::{debug, info, warn};

use crate::errors::ExamError;
use crate::exam::channel::ResultChannel;
use crate::exam::diagnosis::{DiagnosticEvaluator, DiagnosticSnapshot, PERMANENT_BLINDNESS_THRESHOLD};
use crate::exam::ports::{
    ConditionProbe, ExamScheduler, FeedbackSink, InteractEvent, PowerSource, SkillChecker, UiHost,
};
use crate::exam::session::{SessionDescriptor, SessionHandle, SessionOutcome};
use crate::exam::skill::{SkillGate, SkillKind, SkillOutcome};
use crate::exam::validator::{PreconditionValidator, Rejection};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::Instrument;

/// Orchestrator configuration
#[derive(Debug, Clone)]
pub struct ExamConfig {
    /// Skill rolled by the gate
    pub skill: SkillKind,

    /// Eye damage magnitude treated as permanent blindness
    pub blindness_threshold: u32,
}

impl Default for ExamConfig {
    fn default() -> Self {
        Self {
            skill: SkillKind::FirstAid,
            blindness_threshold: PERMANENT_BLINDNESS_THRESHOLD,
        }
    }
}

/// Every collaborator the orchestrator talks to
#[derive(Clone)]
pub struct Collaborators {
    pub power: Arc<dyn PowerSource>,
    pub skills: Arc<dyn SkillChecker>,
    pub scheduler: Arc<dyn ExamScheduler>,
    pub ui: Arc<dyn UiHost>,
    pub probe: Arc<dyn ConditionProbe>,
    pub feedback: Arc<dyn FeedbackSink>,
}

/// Result of one interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum InteractOutcome {
    /// Precondition failed
    Rejected(Rejection),

    /// Skill check failed; interaction consumed, no session
    GateFailed(SkillOutcome),

    /// Session running
    Started {
        skill: SkillOutcome,
        handle: SessionHandle,
    },

    /// Skill check passed but the triple already has a pending session
    Blocked(SkillOutcome),

    /// Skill check passed but the scheduler failed for another reason
    SchedulerFailed(SkillOutcome),
}

impl InteractOutcome {
    /// Whether the interaction was consumed
    pub fn handled(&self) -> bool {
        match self {
            InteractOutcome::Rejected(reason) => reason.consumes_interaction(),
            _ => true,
        }
    }
}

/// Result of processing one terminal session outcome
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CompletionOutcome {
    /// Session was interrupted
    Cancelled,

    /// Another handler already consumed the completion
    AlreadyHandled,

    /// Instrument ran out of charge during the wait
    ChargeLost,

    /// Subject lacks eyes or a damageable body
    NoDiagnosis,

    /// Diagnosis computed but the instrument hosts no interface
    NoInterface(DiagnosticSnapshot),

    /// Snapshot delivered
    Reported(DiagnosticSnapshot),
}

/// Main examination orchestrator
pub struct ExamOrchestrator {
    collaborators: Collaborators,
    config: ExamConfig,
    telemetry: TelemetryCollector,
}

impl ExamOrchestrator {
    /// Create new orchestrator
    pub fn new(collaborators: Collaborators, config: ExamConfig) -> Self {
        Self {
            collaborators,
            config,
            telemetry: TelemetryCollector::new(),
        }
    }

    /// Share an existing telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = telemetry;
        self
    }

    pub fn telemetry(&self) -> &TelemetryCollector {
        &self.telemetry
    }

    pub fn config(&self) -> &ExamConfig {
        &self.config
    }

    /// Handle `user` aiming `instrument` at a target
    pub fn on_interact(&self, instrument: &Instrument, event: &InteractEvent) -> InteractOutcome {
        let c = &self.collaborators;

        let validator = PreconditionValidator::new(c.power.as_ref(), c.probe.as_ref());
        let subject = match validator.validate(instrument, event) {
            Ok(subject) => subject,
            Err(reason) => return self.reject(instrument, event, reason),
        };

        let gate = SkillGate::new(c.skills.as_ref(), c.feedback.as_ref(), self.config.skill);
        let skill = gate.attempt(instrument.id, event.user);
        self.telemetry.record(TelemetryEvent::SkillChecked {
            user: event.user,
            outcome: skill,
            timestamp: Instant::now(),
        });
        if !skill.proceeds() {
            debug!(user = %event.user, outcome = %skill, "skill check failed");
            return InteractOutcome::GateFailed(skill);
        }

        let descriptor = SessionDescriptor::exam(event.user, subject, instrument);
        match c.scheduler.try_start(descriptor) {
            Ok(handle) => {
                info!(
                    session = %handle.id,
                    user = %event.user,
                    subject = %subject,
                    duration_ms = instrument.exam_duration.as_millis() as u64,
                    "exam started"
                );
                self.telemetry.record(TelemetryEvent::SessionStarted {
                    session: handle.id,
                    timestamp: Instant::now(),
                });
                InteractOutcome::Started { skill, handle }
            }
            Err(ExamError::DuplicateSession { .. }) => {
                self.telemetry.record(TelemetryEvent::SessionBlocked {
                    user: event.user,
                    timestamp: Instant::now(),
                });
                InteractOutcome::Blocked(skill)
            }
            Err(e) => {
                warn!(error = %e, "scheduler refused exam session");
                InteractOutcome::SchedulerFailed(skill)
            }
        }
    }

    fn reject(&self, instrument: &Instrument, event: &InteractEvent, reason: Rejection) -> InteractOutcome {
        if let Some(key) = reason.feedback() {
            self.collaborators
                .feedback
                .show_message(instrument.id, event.user, key);
        }
        debug!(user = %event.user, %reason, "exam request rejected");
        self.telemetry.record(TelemetryEvent::InteractionRejected {
            user: event.user,
            reason,
            timestamp: Instant::now(),
        });
        InteractOutcome::Rejected(reason)
    }

    /// Handle a session leaving `Pending`
    pub fn on_session_outcome(&self, outcome: &SessionOutcome) -> CompletionOutcome {
        let c = &self.collaborators;
        let session = &outcome.session;

        if outcome.is_cancelled() {
            debug!(session = %session.id, interruption = ?outcome.interruption, "exam interrupted");
            self.telemetry.record(TelemetryEvent::SessionCancelled {
                session: session.id,
                interruption: outcome.interruption,
                timestamp: Instant::now(),
            });
            return CompletionOutcome::Cancelled;
        }
        if outcome.handled {
            return CompletionOutcome::AlreadyHandled;
        }

        // World may have changed while the session was pending.
        if !c.power.has_draw_charge(session.instrument(), session.user()) {
            debug!(session = %session.id, "charge lost before exam finished");
            self.telemetry.record(TelemetryEvent::ChargeLost {
                session: session.id,
                timestamp: Instant::now(),
            });
            return CompletionOutcome::ChargeLost;
        }

        let channel = ResultChannel::new(c.ui.as_ref());
        channel.open(session.instrument(), session.user());

        let evaluator = DiagnosticEvaluator::with_threshold(c.probe.as_ref(), self.config.blindness_threshold);
        let Some(snapshot) = evaluator.evaluate(session.subject()) else {
            self.telemetry.record(TelemetryEvent::NoDiagnosis {
                session: session.id,
                timestamp: Instant::now(),
            });
            return CompletionOutcome::NoDiagnosis;
        };

        if !channel.send(session.instrument(), session.user(), snapshot) {
            return CompletionOutcome::NoInterface(snapshot);
        }

        info!(
            session = %session.id,
            subject = %snapshot.subject,
            findings = %snapshot.summary(),
            "diagnosis reported"
        );
        self.telemetry.record(TelemetryEvent::ReportSent {
            session: session.id,
            healthy: snapshot.is_healthy(),
            timestamp: Instant::now(),
        });
        CompletionOutcome::Reported(snapshot)
    }
}
