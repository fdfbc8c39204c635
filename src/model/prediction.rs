use serde::{Deserialize, Serialize};

use super::category::Category;

/// One ranked tag as returned by the image classifier. Order is not guaranteed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TagPrediction {
    pub tag_name: String,
    pub probability: f64,
}

impl TagPrediction {
    pub fn new(tag_name: impl Into<String>, probability: f64) -> Self {
        Self {
            tag_name: tag_name.into(),
            probability,
        }
    }
}

/// Reply of the text prediction service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TextPrediction {
    pub category: Category,
    pub item: String,
}

/// A disposal decision. Replaced wholesale, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub color: &'static str,
    pub item: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,
}

impl ClassificationResult {
    pub(crate) fn new(category: Category, item: String, confidence: Option<f64>) -> Self {
        Self {
            category,
            color: category.color(),
            item,
            confidence,
        }
    }

    pub fn is_text_derived(&self) -> bool {
        self.confidence.is_none()
    }
}

/// Raw image payload handed to the prediction transport.
#[derive(Debug, Clone)]
pub struct ImageUpload {
    pub file_name: String,
    pub mime_type: String,
    pub bytes: Vec<u8>,
}

impl ImageUpload {
    pub fn new(file_name: impl Into<String>, bytes: Vec<u8>) -> Self {
        let file_name = file_name.into();
        let mime_type = mime_for(&file_name).to_string();
        Self {
            file_name,
            mime_type,
            bytes,
        }
    }

    pub fn handle(&self) -> ImageRef {
        ImageRef {
            file_name: self.file_name.clone(),
            byte_len: self.bytes.len(),
        }
    }
}

/// Lightweight handle to the image a session attempt was started with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ImageRef {
    pub file_name: String,
    pub byte_len: usize,
}

fn mime_for(file_name: &str) -> &'static str {
    let ext = file_name
        .rsplit_once('.')
        .map(|(_, ext)| ext.to_ascii_lowercase())
        .unwrap_or_default();
    match ext.as_str() {
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        "heic" => "image/heic",
        _ => "image/jpeg",
    }
}
