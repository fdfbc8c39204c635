pub mod gate;
pub mod resolver;
pub mod table;

pub use gate::{should_offer_fallback, CONFIDENCE_THRESHOLD};
pub use resolver::{resolve_from_predictions, resolve_from_text};
pub use table::resolve_category;
