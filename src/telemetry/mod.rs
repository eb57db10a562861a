//! Telemetry system for penlight
//!
//! Collects examination workflow events and aggregates them into counters
//! for the end-of-run summary.

use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Instant;

use crate::exam::session::{Interruption, SessionId};
use crate::exam::skill::SkillOutcome;
use crate::exam::validator::Rejection;
use crate::types::EntityId;

/// Telemetry event types
#[derive(Debug, Clone)]
pub enum TelemetryEvent {
    // Request events
    InteractionRejected {
        user: EntityId,
        reason: Rejection,
        timestamp: Instant,
    },
    SkillChecked {
        user: EntityId,
        outcome: SkillOutcome,
        timestamp: Instant,
    },
    SessionStarted {
        session: SessionId,
        timestamp: Instant,
    },
    SessionBlocked {
        user: EntityId,
        timestamp: Instant,
    },

    // Completion events
    SessionCancelled {
        session: SessionId,
        interruption: Option<Interruption>,
        timestamp: Instant,
    },
    ChargeLost {
        session: SessionId,
        timestamp: Instant,
    },
    NoDiagnosis {
        session: SessionId,
        timestamp: Instant,
    },
    ReportSent {
        session: SessionId,
        healthy: bool,
        timestamp: Instant,
    },
}

/// Telemetry statistics
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TelemetryStats {
    pub silent_rejections: usize,
    pub feedback_rejections: usize,
    pub skill_checks: usize,
    pub gate_failures: usize,
    pub critical_rolls: usize,
    pub sessions_started: usize,
    pub sessions_blocked: usize,
    pub sessions_cancelled: usize,
    pub charge_losses: usize,
    pub no_diagnosis: usize,
    pub reports_sent: usize,
}

/// Telemetry collector
#[derive(Clone)]
pub struct TelemetryCollector {
    events: Arc<Mutex<Vec<TelemetryEvent>>>,
    stats: Arc<Mutex<TelemetryStats>>,
    start_time: Instant,
}

fn guard<T>(lock: &Mutex<T>) -> MutexGuard<'_, T> {
    lock.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

impl TelemetryCollector {
    /// Create a new telemetry collector
    pub fn new() -> Self {
        Self {
            events: Arc::new(Mutex::new(Vec::new())),
            stats: Arc::new(Mutex::new(TelemetryStats::default())),
            start_time: Instant::now(),
        }
    }

    /// Record an event
    pub fn record(&self, event: TelemetryEvent) {
        {
            let mut stats = guard(&self.stats);
            match &event {
                TelemetryEvent::InteractionRejected { reason, .. } => {
                    if reason.consumes_interaction() {
                        stats.feedback_rejections += 1;
                    } else {
                        stats.silent_rejections += 1;
                    }
                }
                TelemetryEvent::SkillChecked { outcome, .. } => {
                    stats.skill_checks += 1;
                    if !outcome.proceeds() {
                        stats.gate_failures += 1;
                    }
                    if matches!(
                        outcome,
                        SkillOutcome::CriticalFailure | SkillOutcome::CriticalSuccess
                    ) {
                        stats.critical_rolls += 1;
                    }
                }
                TelemetryEvent::SessionStarted { .. } => {
                    stats.sessions_started += 1;
                }
                TelemetryEvent::SessionBlocked { .. } => {
                    stats.sessions_blocked += 1;
                }
                TelemetryEvent::SessionCancelled { .. } => {
                    stats.sessions_cancelled += 1;
                }
                TelemetryEvent::ChargeLost { .. } => {
                    stats.charge_losses += 1;
                }
                TelemetryEvent::NoDiagnosis { .. } => {
                    stats.no_diagnosis += 1;
                }
                TelemetryEvent::ReportSent { .. } => {
                    stats.reports_sent += 1;
                }
            }
        }

        guard(&self.events).push(event);
    }

    /// Get current statistics
    pub fn get_stats(&self) -> TelemetryStats {
        guard(&self.stats).clone()
    }

    /// Get elapsed time since start
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }

    /// Get event count
    pub fn event_count(&self) -> usize {
        guard(&self.events).len()
    }

    /// Get recent events (last n)
    pub fn recent_events(&self, n: usize) -> Vec<TelemetryEvent> {
        let events = guard(&self.events);
        let start = events.len().saturating_sub(n);
        events[start..].to_vec()
    }

    /// Fraction of started sessions that ended in a report
    pub fn report_rate(&self) -> f64 {
        let stats = guard(&self.stats);
        if stats.sessions_started == 0 {
            0.0
        } else {
            stats.reports_sent as f64 / stats.sessions_started as f64
        }
    }
}

impl Default for TelemetryCollector {
    fn default() -> Self {
        Self::new()
    }
}

/// Simple telemetry display
pub struct TelemetryDisplay {
    collector: TelemetryCollector,
    verbosity: crate::cli::Verbosity,
}

impl TelemetryDisplay {
    /// Create a new display
    pub fn new(collector: TelemetryCollector, verbosity: crate::cli::Verbosity) -> Self {
        Self {
            collector,
            verbosity,
        }
    }

    /// Display summary statistics
    pub fn display_summary(&self) {
        if self.verbosity == crate::cli::Verbosity::Quiet {
            return;
        }
        let stats = self.collector.get_stats();

        println!("\nExamination Summary");
        println!("─────────────────────────────────────");
        println!("Duration:            {:?}", self.collector.elapsed());
        println!("Skill checks:        {}", stats.skill_checks);
        println!("Gate failures:       {}", stats.gate_failures);
        println!("Sessions started:    {}", stats.sessions_started);
        println!("Sessions blocked:    {}", stats.sessions_blocked);
        println!("Sessions cancelled:  {}", stats.sessions_cancelled);
        println!("Reports sent:        {}", stats.reports_sent);
        println!("Report rate:         {:.1}%", self.collector.report_rate() * 100.0);
        if self.should_show_details() {
            println!("Silent rejections:   {}", stats.silent_rejections);
            println!("Feedback rejections: {}", stats.feedback_rejections);
            println!("Charge losses:       {}", stats.charge_losses);
            println!("No diagnosis:        {}", stats.no_diagnosis);
        }
        println!();
    }

    /// Check if should show detailed output
    pub fn should_show_details(&self) -> bool {
        self.verbosity.show_events()
    }
}
