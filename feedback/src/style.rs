//! Per-category visual styles.

use std::path::Path;

use verity_types::{AnnotationStyle, Category, IconPair};

/// Coverage tint used when the configuration does not name one.
pub const DEFAULT_COVERAGE_BACKGROUND: &str = "rgba(129, 62, 200, 0.2)";

pub const DEFAULT_ICON_SIZE: &str = "75%";

/// Gutter icon file stem per point category. `<stem>@2x.png` is the light
/// theme icon, `<stem>@2x_dark.png` the dark one.
fn icon_stem(category: Category) -> Option<&'static str> {
    match category {
        Category::QueryInfo => Some("gutter-summoning"),
        Category::ProofState => Some("gutter-hint"),
        Category::VerificationInfo => Some("gutter-logika-verified"),
        Category::Coverage | Category::Report => None,
    }
}

/// The style each category is drawn with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleSheet {
    icon_dir: Option<std::path::PathBuf>,
    icon_size: String,
    coverage_background: String,
}

impl Default for StyleSheet {
    fn default() -> Self {
        Self {
            icon_dir: None,
            icon_size: DEFAULT_ICON_SIZE.to_string(),
            coverage_background: DEFAULT_COVERAGE_BACKGROUND.to_string(),
        }
    }
}

impl StyleSheet {
    /// Without an icon directory point markers are drawn without gutter icons.
    #[must_use]
    pub fn with_icon_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.icon_dir = Some(dir.as_ref().to_path_buf());
        self
    }

    #[must_use]
    pub fn with_icon_size(mut self, size: impl Into<String>) -> Self {
        self.icon_size = size.into();
        self
    }

    #[must_use]
    pub fn with_coverage_background(mut self, color: impl Into<String>) -> Self {
        self.coverage_background = color.into();
        self
    }

    fn icons(&self, category: Category) -> Option<IconPair> {
        let dir = self.icon_dir.as_ref()?;
        let stem = icon_stem(category)?;
        Some(IconPair {
            light: dir.join(format!("{stem}@2x.png")),
            dark: dir.join(format!("{stem}@2x_dark.png")),
        })
    }

    #[must_use]
    pub fn style(&self, category: Category) -> AnnotationStyle {
        if category == Category::Coverage {
            return AnnotationStyle {
                icons: None,
                icon_size: None,
                background: Some(self.coverage_background.clone()),
                whole_line: true,
                hover: false,
            };
        }
        let icons = self.icons(category);
        AnnotationStyle {
            icon_size: icons.as_ref().map(|_| self.icon_size.clone()),
            icons,
            background: None,
            whole_line: true,
            hover: category.is_point(),
        }
    }
}
