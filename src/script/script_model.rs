use serde::{Deserialize, Serialize};

use crate::editor::inspector::ApplyAction;

/// A scripted editor session, deserialized from YAML.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EditScript {
    /// Human-readable name for this script
    pub name: String,

    /// Ordered list of steps to execute against a freshly loaded site
    pub steps: Vec<ScriptStep>,
}

/// An element on the page: an editor key (`herotitle-0`) or a selector plus
/// an index among its matches.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Target {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub key: Option<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,

    #[serde(default)]
    pub index: usize,
}

impl Target {
    pub fn key(key: &str) -> Self {
        Target {
            key: Some(key.to_string()),
            ..Default::default()
        }
    }

    pub fn selector(selector: &str, index: usize) -> Self {
        Target {
            selector: Some(selector.to_string()),
            index,
            ..Default::default()
        }
    }

    pub fn describe(&self) -> String {
        match (&self.key, &self.selector) {
            (Some(key), _) => key.clone(),
            (None, Some(selector)) => format!("{}[{}]", selector, self.index),
            (None, None) => "<no target>".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ApplyGroup {
    Colors,
    Typography,
    Spacing,
    BackgroundImage,
    Size,
}

impl From<ApplyGroup> for ApplyAction {
    fn from(group: ApplyGroup) -> Self {
        match group {
            ApplyGroup::Colors => ApplyAction::Colors,
            ApplyGroup::Typography => ApplyAction::Typography,
            ApplyGroup::Spacing => ApplyAction::Spacing,
            ApplyGroup::BackgroundImage => ApplyAction::BackgroundImage,
            ApplyGroup::Size => ApplyAction::Size,
        }
    }
}

/// A single step in an edit script.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum ScriptStep {
    EnterEditMode,
    ExitEditMode,
    ToggleEditMode,

    Click { target: Target },
    Hover { target: Target },
    Leave { target: Target },

    /// Start in-place editing of the selected element
    BeginTextEdit,

    /// Typed input into the element being edited
    TypeText { text: String },

    /// `enter`, `shift+enter` or `escape`
    Key { key: String },

    Blur,

    /// Inspector color fields, as typed hex values
    SetColor {
        #[serde(default)]
        text: Option<String>,
        #[serde(default)]
        background: Option<String>,
    },

    SetFont {
        #[serde(default)]
        size: Option<u32>,
        #[serde(default)]
        weight: Option<u16>,
    },

    SetSpacing {
        #[serde(default)]
        padding: Option<u32>,
        #[serde(default)]
        margin: Option<u32>,
        #[serde(default)]
        border_radius: Option<u32>,
    },

    SetSize {
        #[serde(default)]
        width: Option<String>,
        #[serde(default)]
        height: Option<String>,
    },

    SetBackgroundImage { url: String },

    /// Press one of the inspector's apply buttons
    Apply { group: ApplyGroup },

    Save,
    Reset,
    ClosePanel,

    /// Simulated page reload
    Reload,

    /// Click the filter button for a category
    Filter { filter: String },

    Assert { assertions: Vec<ScriptAssertion> },
}

/// A check against the site state.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ScriptAssertion {
    /// Computed style value of an element
    Style {
        target: Target,
        property: String,
        expected: String,
    },

    /// Element content equals
    Text { target: Target, expected: String },

    /// `editing` or `viewing`
    Mode { expected: String },

    /// The element is the current selection
    Selected { target: Target },

    /// Override recorded in the store; without `property`, a text override
    Stored {
        key: String,
        #[serde(default)]
        property: Option<String>,
        expected: Option<String>,
    },

    /// Some notification so far contains the text
    Notice { expected: String },

    CardCount { expected: usize },
}

impl ScriptAssertion {
    pub fn name(&self) -> &'static str {
        match self {
            ScriptAssertion::Style { .. } => "Style",
            ScriptAssertion::Text { .. } => "Text",
            ScriptAssertion::Mode { .. } => "Mode",
            ScriptAssertion::Selected { .. } => "Selected",
            ScriptAssertion::Stored { .. } => "Stored",
            ScriptAssertion::Notice { .. } => "Notice",
            ScriptAssertion::CardCount { .. } => "CardCount",
        }
    }
}

/// Result of evaluating a single assertion.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AssertionResult {
    /// Which step this assertion belongs to (0-indexed)
    pub step_index: usize,

    pub assertion: ScriptAssertion,
    pub passed: bool,

    /// Actual value found (for debugging failed assertions)
    pub actual: Option<String>,

    pub message: Option<String>,
}

/// Result of running one script.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScriptResult {
    pub script_name: String,
    pub passed: bool,
    pub steps_run: usize,
    pub assertion_results: Vec<AssertionResult>,

    /// Error message if a step could not be executed
    pub error: Option<String>,
}
