pub mod classifier;
pub mod config;
pub mod history;
pub mod model;
pub mod server;
pub mod session;
pub mod transport;

pub use classifier::{resolve_category, resolve_from_predictions, resolve_from_text, should_offer_fallback};
pub use model::{Category, ClassificationResult, HistoryRecord, TagPrediction};
pub use session::{ClassificationSession, SessionStatus};
