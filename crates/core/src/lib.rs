//! Core engine for the Vesper voice assistant: session state, the command
//! resolution pipeline, the fixed action table, and the collaborator traits
//! the service layer implements (speech, OS automation, telemetry, intent
//! classification).

pub mod automation;
pub mod classifier;
pub mod clock;
pub mod dedup;
pub mod patterns;
pub mod registry;
pub mod resolver;
pub mod session;
pub mod spawn;
pub mod speech;
pub mod stats;

pub use automation::{Automation, MediaKey, PowerOp};
pub use classifier::{GeminiClassifier, Intent, IntentClassifier};
pub use clock::{Clock, SystemClock};
pub use registry::{ActionContext, ActionRegistry, Dispatch};
pub use resolver::{Collaborators, CommandResolver, CommandResult, ResolverConfig, StatusSnapshot};
pub use spawn::{Spawner, TokioSpawner};
pub use speech::{NullSpeech, Speech, SpeechGate};
pub use stats::{StatsReport, SystemStats};
