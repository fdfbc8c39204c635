pub mod category;
pub mod history;
pub mod prediction;

pub use category::Category;
pub use history::HistoryRecord;
pub use prediction::{ClassificationResult, ImageRef, ImageUpload, TagPrediction, TextPrediction};
