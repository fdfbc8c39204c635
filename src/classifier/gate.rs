/// Below this top probability the image result is not trusted on its own.
pub const CONFIDENCE_THRESHOLD: f64 = 0.85;

/// Whether an image result should come with the text-description fallback.
/// Text-derived results never reach this gate.
pub fn should_offer_fallback(confidence: f64) -> bool {
    confidence < CONFIDENCE_THRESHOLD
}
