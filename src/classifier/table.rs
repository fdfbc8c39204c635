use once_cell::sync::Lazy;
use std::collections::HashMap;

use crate::model::Category;

/// Recognized classifier tags per disposal category.
const CATEGORY_TABLE: &[(Category, &[&str])] = &[
    (
        Category::Recyclable,
        &["cardboard", "plastic", "metal", "glass", "paper"],
    ),
    (Category::Compostable, &["leaf", "vegetation", "food organics"]),
    (Category::Landfill, &["miscellaneous trash"]),
];

static TAG_INDEX: Lazy<HashMap<String, Category>> = Lazy::new(|| {
    CATEGORY_TABLE
        .iter()
        .flat_map(|(category, tags)| tags.iter().map(move |tag| (tag.to_lowercase(), *category)))
        .collect()
});

pub fn tags_for(category: Category) -> &'static [&'static str] {
    CATEGORY_TABLE
        .iter()
        .find(|(c, _)| *c == category)
        .map(|(_, tags)| *tags)
        .unwrap_or(&[])
}

/// Case-insensitive exact lookup. Unmapped tags resolve to landfill.
pub fn resolve_category(tag_name: &str) -> Category {
    TAG_INDEX
        .get(&tag_name.to_lowercase())
        .copied()
        .unwrap_or(Category::Landfill)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_listed_tag_resolves_to_its_category() {
        for category in Category::ALL {
            for tag in tags_for(category) {
                assert_eq!(resolve_category(tag), category, "tag {tag}");
                assert_eq!(resolve_category(&tag.to_uppercase()), category, "tag {tag}");
            }
        }
    }

    #[test]
    fn mixed_case_lookup() {
        assert_eq!(resolve_category("Food Organics"), Category::Compostable);
        assert_eq!(resolve_category("CardBoard"), Category::Recyclable);
        assert_eq!(resolve_category("Miscellaneous Trash"), Category::Landfill);
    }

    #[test]
    fn unknown_tags_default_to_landfill() {
        for tag in ["", "textile trash", "styrofoam", "card board", " glass"] {
            assert_eq!(resolve_category(tag), Category::Landfill, "tag {tag:?}");
        }
    }

    #[test]
    fn table_covers_every_category() {
        for category in Category::ALL {
            assert!(!tags_for(category).is_empty());
        }
    }
}
