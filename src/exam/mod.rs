//! Eye examination module
//!
//! Validator, skill gate, session machinery, diagnosis and the orchestrator
//! that composes them.

pub mod channel;
pub mod diagnosis;
pub mod orchestrator;
pub mod ports;
pub mod scheduler;
pub mod session;
pub mod skill;
pub mod validator;

// Re-export commonly used types
pub use channel::ResultChannel;
pub use diagnosis::{DiagnosticEvaluator, DiagnosticSnapshot, PERMANENT_BLINDNESS_THRESHOLD};
pub use orchestrator::{Collaborators, CompletionOutcome, ExamConfig, ExamOrchestrator, InteractOutcome};
pub use ports::{
    ConditionProbe, ExamScheduler, FeedbackSink, HandProbe, InteractEvent, PowerSource,
    SkillChecker, UiHost, UiMessage,
};
pub use scheduler::SessionScheduler;
pub use session::{
    ExamSession, Interruption, SessionDescriptor, SessionEvent, SessionHandle, SessionId,
    SessionOutcome, SessionStatus,
};
pub use skill::{SkillGate, SkillKind, SkillOutcome, SkillRoll};
pub use validator::{PreconditionValidator, Rejection};
