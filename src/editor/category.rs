use std::fmt;

use serde::{Deserialize, Serialize};

/// Element roles that can be selected in edit mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EditableCategory {
    HeroTitle,
    HeroSubtitle,
    HeroButton,
    SectionTitle,
    SectionSubtitle,
    CardTitle,
    CardDescription,
    CardButton,
    FilterButton,
    SectionBackground,
    CardContainer,
}

/// What the inspector offers for a category.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub text: bool,
    pub background_image: bool,
}

impl Capabilities {
    /// Style-only: no text editing.
    pub fn is_container(&self) -> bool {
        !self.text
    }
}

impl EditableCategory {
    /// Tagging order. Ordinals are assigned per selector in this order.
    pub const ALL: [EditableCategory; 11] = [
        EditableCategory::HeroTitle,
        EditableCategory::HeroSubtitle,
        EditableCategory::HeroButton,
        EditableCategory::SectionTitle,
        EditableCategory::SectionSubtitle,
        EditableCategory::CardTitle,
        EditableCategory::CardDescription,
        EditableCategory::CardButton,
        EditableCategory::FilterButton,
        EditableCategory::SectionBackground,
        EditableCategory::CardContainer,
    ];

    /// Classes whose elements belong to this category.
    pub fn classes(self) -> &'static [&'static str] {
        match self {
            EditableCategory::HeroTitle => &["hero__title"],
            EditableCategory::HeroSubtitle => &["hero__subtitle"],
            EditableCategory::HeroButton => &["hero__button"],
            EditableCategory::SectionTitle => &["trainers-title"],
            EditableCategory::SectionSubtitle => &["trainers-subtitle"],
            EditableCategory::CardTitle => &["card__title"],
            EditableCategory::CardDescription => &["card__description"],
            EditableCategory::CardButton => &["card__button"],
            EditableCategory::FilterButton => &["filter-btn"],
            EditableCategory::SectionBackground => &["hero", "trainers-section"],
            EditableCategory::CardContainer => &["card"],
        }
    }

    pub fn capabilities(self) -> Capabilities {
        match self {
            EditableCategory::SectionBackground | EditableCategory::CardContainer => Capabilities {
                text: false,
                background_image: true,
            },
            _ => Capabilities {
                text: true,
                background_image: false,
            },
        }
    }

    /// Value written to `data-edit-type`.
    pub fn edit_type(self) -> &'static str {
        match self {
            EditableCategory::HeroButton
            | EditableCategory::CardButton
            | EditableCategory::FilterButton => "button",
            EditableCategory::SectionBackground => "section",
            EditableCategory::CardContainer => "card",
            _ => "text",
        }
    }

    /// Elements that live inside a gallery card.
    pub fn is_card_scoped(self) -> bool {
        matches!(
            self,
            EditableCategory::CardTitle
                | EditableCategory::CardDescription
                | EditableCategory::CardButton
                | EditableCategory::CardContainer
        )
    }

    pub fn name(self) -> &'static str {
        match self {
            EditableCategory::HeroTitle => "hero-title",
            EditableCategory::HeroSubtitle => "hero-subtitle",
            EditableCategory::HeroButton => "hero-button",
            EditableCategory::SectionTitle => "section-title",
            EditableCategory::SectionSubtitle => "section-subtitle",
            EditableCategory::CardTitle => "card-title",
            EditableCategory::CardDescription => "card-description",
            EditableCategory::CardButton => "card-button",
            EditableCategory::FilterButton => "filter-button",
            EditableCategory::SectionBackground => "section-background",
            EditableCategory::CardContainer => "card-container",
        }
    }
}

impl fmt::Display for EditableCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Key prefix for a class: everything outside `a-z` is dropped
/// (`hero__title` → `herotitle`).
pub fn key_tag(class: &str) -> String {
    class.chars().filter(|c| c.is_ascii_lowercase()).collect()
}
