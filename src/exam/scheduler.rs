//! In-process session scheduler
//!
//! Reference implementation of [`ExamScheduler`] for a tick-driven
//! simulation. The registry is the only shared mutable state in the
//! examination flow: it enforces duplicate-block per
//! (user, instrument, subject) triple and turns movement, hand changes and
//! elapsed time into exactly one terminal [`SessionOutcome`] per session.

use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use tracing::{debug, warn};

use crate::errors::{ExamError, Result};
use crate::exam::ports::{ExamScheduler, HandProbe};
use crate::exam::session::{
    ExamSession, Interruption, SessionDescriptor, SessionEvent, SessionHandle, SessionId,
    SessionOutcome,
};
use crate::types::EntityId;

type Triple = (EntityId, EntityId, EntityId);

#[derive(Debug, Default)]
struct SchedulerState {
    /// Simulation clock
    clock: Duration,
    pending: HashMap<SessionId, ExamSession>,
    /// Every pending session per triple, blocking or not
    by_triple: HashMap<Triple, Vec<SessionId>>,
    outcomes: VecDeque<SessionOutcome>,
}

impl SchedulerState {
    fn finish(&mut self, id: SessionId, event: SessionEvent) {
        let Some(mut session) = self.pending.remove(&id) else {
            return;
        };
        let triple = session.descriptor.triple();
        if let Some(ids) = self.by_triple.get_mut(&triple) {
            ids.retain(|pending| *pending != id);
            if ids.is_empty() {
                self.by_triple.remove(&triple);
            }
        }

        if let Err(e) = session.apply(event) {
            warn!(session = %id, error = %e, "dropping session with invalid transition");
            return;
        }

        let interruption = match event {
            SessionEvent::Interrupted(reason) => Some(reason),
            SessionEvent::Elapsed => None,
        };
        debug!(
            session = %id,
            status = session.status().display_name(),
            "session finished"
        );
        self.outcomes.push_back(SessionOutcome {
            session,
            handled: false,
            interruption,
        });
    }

    /// Pending ids ordered by due time, then start time
    fn ordered_pending(&self) -> Vec<SessionId> {
        let mut sessions: Vec<&ExamSession> = self.pending.values().collect();
        sessions.sort_by_key(|s| (s.due_at(), s.started_at, s.id));
        sessions.into_iter().map(|s| s.id).collect()
    }
}

/// Shared, cloneable session registry
#[derive(Debug, Clone, Default)]
pub struct SessionScheduler {
    inner: Arc<Mutex<SchedulerState>>,
}

impl SessionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    fn state(&self) -> MutexGuard<'_, SchedulerState> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Current simulation clock
    pub fn now(&self) -> Duration {
        self.state().clock
    }

    pub fn pending_count(&self) -> usize {
        self.state().pending.len()
    }

    pub fn is_pending(&self, user: EntityId, instrument: EntityId, subject: EntityId) -> bool {
        self.state()
            .by_triple
            .contains_key(&(user, instrument, subject))
    }

    pub fn session(&self, id: SessionId) -> Option<ExamSession> {
        self.state().pending.get(&id).cloned()
    }

    /// Advance the clock by `dt`, completing due sessions and cancelling
    /// those whose user lost their grip. Returns how many sessions finished.
    pub fn advance(&self, dt: Duration, hands: &dyn HandProbe) -> usize {
        let mut state = self.state();
        state.clock += dt;
        let clock = state.clock;
        let before = state.outcomes.len();

        for id in state.ordered_pending() {
            let Some(session) = state.pending.get(&id) else {
                continue;
            };
            let event = if session.descriptor.need_hand
                && !hands.can_manipulate(session.user(), session.instrument())
            {
                SessionEvent::Interrupted(Interruption::GripLost)
            } else if session.due_at() <= clock {
                SessionEvent::Elapsed
            } else {
                continue;
            };
            state.finish(id, event);
        }

        state.outcomes.len() - before
    }

    /// Cancel every pending session of `user` that breaks on `interruption`
    pub fn interrupt(&self, user: EntityId, interruption: Interruption) -> usize {
        let mut state = self.state();
        let before = state.outcomes.len();

        let hit: Vec<SessionId> = state
            .ordered_pending()
            .into_iter()
            .filter(|id| {
                state
                    .pending
                    .get(id)
                    .map(|s| s.user() == user && s.breaks_on(interruption))
                    .unwrap_or(false)
            })
            .collect();
        for id in hit {
            state.finish(id, SessionEvent::Interrupted(interruption));
        }

        state.outcomes.len() - before
    }

    /// User changed position
    pub fn notify_moved(&self, user: EntityId) -> usize {
        self.interrupt(user, Interruption::Moved)
    }

    /// User changed what they are holding
    pub fn notify_hand_changed(&self, user: EntityId) -> usize {
        self.interrupt(user, Interruption::HandChanged)
    }

    /// Explicitly cancel one pending session
    pub fn cancel(&self, id: SessionId) -> Result<()> {
        let mut state = self.state();
        if !state.pending.contains_key(&id) {
            return Err(ExamError::UnknownSession(id));
        }
        state.finish(id, SessionEvent::Interrupted(Interruption::Explicit));
        Ok(())
    }

    /// Take all terminal outcomes produced so far, oldest first
    pub fn drain(&self) -> Vec<SessionOutcome> {
        self.state().outcomes.drain(..).collect()
    }
}

impl ExamScheduler for SessionScheduler {
    fn try_start(&self, descriptor: SessionDescriptor) -> Result<SessionHandle> {
        let mut state = self.state();
        let triple = descriptor.triple();

        if descriptor.block_duplicate && state.by_triple.contains_key(&triple) {
            debug!(
                user = %descriptor.user,
                instrument = %descriptor.instrument,
                subject = %descriptor.subject,
                "duplicate session blocked"
            );
            return Err(ExamError::DuplicateSession {
                user: descriptor.user,
                instrument: descriptor.instrument,
                subject: descriptor.subject,
            });
        }

        let session = ExamSession::new(descriptor, state.clock);
        let id = session.id;
        state.by_triple.entry(triple).or_default().push(id);
        state.pending.insert(id, session);
        Ok(SessionHandle { id })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exam::session::SessionStatus;
    use crate::types::Instrument;
    use std::collections::HashSet;

    struct Hands(Mutex<HashSet<EntityId>>);

    impl Hands {
        fn all_free() -> Self {
            Hands(Mutex::new(HashSet::new()))
        }
    }

    impl HandProbe for Hands {
        fn can_manipulate(&self, user: EntityId, _instrument: EntityId) -> bool {
            !self.0.lock().unwrap().contains(&user)
        }
    }

    const PEN: EntityId = EntityId(1);
    const DOC: EntityId = EntityId(2);
    const PATIENT: EntityId = EntityId(3);

    fn exam(user: EntityId, subject: EntityId) -> SessionDescriptor {
        let pen = Instrument::new(PEN, Duration::from_secs(3));
        SessionDescriptor::exam(user, subject, &pen)
    }

    #[test]
    fn test_completes_after_duration() {
        let scheduler = SessionScheduler::new();
        let hands = Hands::all_free();
        scheduler.try_start(exam(DOC, PATIENT)).unwrap();

        assert_eq!(scheduler.advance(Duration::from_secs(2), &hands), 0);
        assert!(scheduler.drain().is_empty());

        assert_eq!(scheduler.advance(Duration::from_secs(1), &hands), 1);
        let outcomes = scheduler.drain();
        assert_eq!(outcomes.len(), 1);
        assert_eq!(outcomes[0].status(), SessionStatus::Completed);
        assert_eq!(outcomes[0].interruption, None);
        assert_eq!(scheduler.pending_count(), 0);
    }

    #[test]
    fn test_duplicate_blocked_original_unaffected() {
        let scheduler = SessionScheduler::new();
        let first = scheduler.try_start(exam(DOC, PATIENT)).unwrap();

        let second = scheduler.try_start(exam(DOC, PATIENT));
        assert!(matches!(second, Err(ExamError::DuplicateSession { .. })));

        assert_eq!(scheduler.pending_count(), 1);
        let original = scheduler.session(first.id).unwrap();
        assert_eq!(original.status(), SessionStatus::Pending);
    }

    #[test]
    fn test_duplicate_block_is_per_triple() {
        let scheduler = SessionScheduler::new();
        scheduler.try_start(exam(DOC, PATIENT)).unwrap();
        scheduler.try_start(exam(EntityId(4), PATIENT)).unwrap();
        scheduler.try_start(exam(DOC, EntityId(5))).unwrap();
        assert_eq!(scheduler.pending_count(), 3);
    }

    #[test]
    fn test_non_blocking_session_still_blocks_after_first_ends() {
        let scheduler = SessionScheduler::new();
        let first = scheduler.try_start(exam(DOC, PATIENT)).unwrap();
        let mut lenient = exam(DOC, PATIENT);
        lenient.block_duplicate = false;
        let second = scheduler.try_start(lenient).unwrap();
        assert_eq!(scheduler.pending_count(), 2);

        scheduler.cancel(first.id).unwrap();
        assert!(scheduler.is_pending(DOC, PEN, PATIENT));
        assert!(matches!(
            scheduler.try_start(exam(DOC, PATIENT)),
            Err(ExamError::DuplicateSession { .. })
        ));

        scheduler.cancel(second.id).unwrap();
        assert!(!scheduler.is_pending(DOC, PEN, PATIENT));
        assert!(scheduler.try_start(exam(DOC, PATIENT)).is_ok());
    }

    #[test]
    fn test_restart_allowed_after_terminal() {
        let scheduler = SessionScheduler::new();
        scheduler.try_start(exam(DOC, PATIENT)).unwrap();
        scheduler.notify_moved(DOC);
        assert!(!scheduler.is_pending(DOC, PEN, PATIENT));
        assert!(scheduler.try_start(exam(DOC, PATIENT)).is_ok());
    }

    #[test]
    fn test_movement_cancels_only_that_user() {
        let scheduler = SessionScheduler::new();
        scheduler.try_start(exam(DOC, PATIENT)).unwrap();
        scheduler.try_start(exam(EntityId(4), PATIENT)).unwrap();

        assert_eq!(scheduler.notify_moved(DOC), 1);
        let outcomes = scheduler.drain();
        assert_eq!(outcomes.len(), 1);
        assert!(outcomes[0].is_cancelled());
        assert_eq!(outcomes[0].interruption, Some(Interruption::Moved));
        assert_eq!(scheduler.pending_count(), 1);
    }

    #[test]
    fn test_hand_change_cancels() {
        let scheduler = SessionScheduler::new();
        scheduler.try_start(exam(DOC, PATIENT)).unwrap();
        assert_eq!(scheduler.notify_hand_changed(DOC), 1);
        assert_eq!(
            scheduler.drain()[0].interruption,
            Some(Interruption::HandChanged)
        );
    }

    #[test]
    fn test_grip_lost_cancels_on_advance() {
        let scheduler = SessionScheduler::new();
        let hands = Hands::all_free();
        scheduler.try_start(exam(DOC, PATIENT)).unwrap();
        hands.0.lock().unwrap().insert(DOC);

        assert_eq!(scheduler.advance(Duration::from_secs(5), &hands), 1);
        let outcome = &scheduler.drain()[0];
        assert!(outcome.is_cancelled());
        assert_eq!(outcome.interruption, Some(Interruption::GripLost));
    }

    #[test]
    fn test_exactly_one_outcome_per_session() {
        let scheduler = SessionScheduler::new();
        let hands = Hands::all_free();
        let handle = scheduler.try_start(exam(DOC, PATIENT)).unwrap();

        scheduler.notify_moved(DOC);
        scheduler.notify_hand_changed(DOC);
        scheduler.advance(Duration::from_secs(10), &hands);
        assert!(scheduler.cancel(handle.id).is_err());
        assert_eq!(scheduler.drain().len(), 1);
    }

    #[test]
    fn test_cancel_unknown_session() {
        let scheduler = SessionScheduler::new();
        let result = scheduler.cancel(uuid::Uuid::new_v4());
        assert!(matches!(result, Err(ExamError::UnknownSession(_))));
    }
}
