use tracing::{debug, warn};

use super::table::resolve_category;
use crate::model::{Category, ClassificationResult, TagPrediction};

/// Picks the highest-probability tag and maps it to a disposal category.
///
/// Ranking is a stable descending sort, so equal probabilities keep their
/// input order and the first one wins. Entries with a non-finite probability
/// are ignored. Returns `None` when nothing rankable is left.
pub fn resolve_from_predictions(predictions: &[TagPrediction]) -> Option<ClassificationResult> {
    let mut ranked: Vec<&TagPrediction> = predictions
        .iter()
        .filter(|p| {
            let finite = p.probability.is_finite();
            if !finite {
                warn!("dropping prediction '{}' with non-finite probability", p.tag_name);
            }
            finite
        })
        .collect();
    ranked.sort_by(|a, b| b.probability.total_cmp(&a.probability));

    let top = ranked.first()?;
    let category = resolve_category(&top.tag_name);
    debug!(
        "resolved '{}' ({:.2}) → {}",
        top.tag_name, top.probability, category
    );

    Some(ClassificationResult::new(
        category,
        top.tag_name.clone(),
        Some(top.probability),
    ))
}

/// Wraps a category chosen by the text service. Carries no confidence.
pub fn resolve_from_text(category: Category, item: impl Into<String>) -> ClassificationResult {
    ClassificationResult::new(category, item.into(), None)
}
