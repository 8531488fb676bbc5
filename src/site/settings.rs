use serde::{Deserialize, Serialize};

/// Static page copy and filter buttons. Loaded from the `site` section of the
/// config file; every field has a default.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SiteContent {
    pub page_title: String,
    pub hero_title: String,
    pub hero_subtitle: String,
    pub hero_button: String,
    pub section_title: String,
    pub section_subtitle: String,
    pub filters: Vec<FilterButton>,

    /// Number used by the call and messenger contact options
    pub contact_phone: String,

    /// Video shown in the detail modal for trainers without their own
    pub global_video: Option<String>,
    pub global_video_enabled: bool,
}

impl Default for SiteContent {
    fn default() -> Self {
        Self {
            page_title: "Atletica - Personal Trainers".to_string(),
            hero_title: "Find your personal trainer".to_string(),
            hero_subtitle: "Certified coaches for strength, fitness and CrossFit".to_string(),
            hero_button: "Choose a trainer".to_string(),
            section_title: "Our trainers".to_string(),
            section_subtitle: "Pick a specialist for your goals".to_string(),
            filters: vec![
                FilterButton::new("All", "all"),
                FilterButton::new("Fitness", "Fitness"),
                FilterButton::new("CrossFit", "CrossFit"),
                FilterButton::new("Boxing", "Boxing"),
            ],
            contact_phone: "+79882931193".to_string(),
            global_video: None,
            global_video_enabled: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterButton {
    pub text: String,

    /// Category substring to match, or `all`
    pub filter: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub text_color: Option<String>,
}

impl FilterButton {
    pub fn new(text: &str, filter: &str) -> Self {
        Self {
            text: text.to_string(),
            filter: filter.to_string(),
            color: None,
            text_color: None,
        }
    }
}
