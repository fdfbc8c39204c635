use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use tracing::warn;

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Recyclable,
    Compostable,
    Landfill,
}

impl Default for Category {
    fn default() -> Self {
        Category::Landfill
    }
}

impl Category {
    pub const ALL: [Category; 3] = [
        Category::Recyclable,
        Category::Compostable,
        Category::Landfill,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Recyclable => "recyclable",
            Category::Compostable => "compostable",
            Category::Landfill => "landfill",
        }
    }

    /// Display token the presentation layer paints the category with.
    pub fn color(&self) -> &'static str {
        match self {
            Category::Recyclable => "#2196F3",
            Category::Compostable => "#4CAF50",
            Category::Landfill => "#757575",
        }
    }

    pub fn parse(label: &str) -> Option<Self> {
        let normalized = label.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
    }

    /// Closed-world parse: anything unrecognized goes to landfill.
    pub fn from_label(label: &str) -> Self {
        Self::parse(label).unwrap_or_else(|| {
            warn!("unknown category label '{}', defaulting to landfill", label);
            Category::Landfill
        })
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Category {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let raw = String::deserialize(deserializer)?;
        Ok(Category::from_label(&raw))
    }
}
