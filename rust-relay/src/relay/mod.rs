//! Relay module: decides what to do with a verified Slack envelope.
//!
//! ## Processing Flow
//!
//! ```text
//! EventEnvelope → Dispatcher::handle() → Action (Challenge | Acknowledge)
//! ```

pub mod classifier;
pub mod dispatcher;

pub use classifier::{AcceptAll, Classifier, ClassifierError, KeywordClassifier};
pub use dispatcher::{Action, Dispatcher, ForwardAction, Outcome, RelaySettings};
