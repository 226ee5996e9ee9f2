pub mod answer_bank;
pub mod attempt_log;
pub mod monitor;
pub mod notifier;
pub mod verifier;

pub use answer_bank::{AnswerBank, ScreeningAnswer, MANDATORY_MARKETS};
pub use attempt_log::{AttemptRecord, AttemptSink, JsonlAttemptLog};
pub use monitor::{ApplyMonitor, Clock, SystemClock};
pub use notifier::{AlertWriter, Notifier, WebhookNotifier};
pub use verifier::ApplyVerifier;
