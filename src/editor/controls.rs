//! Inspector form controls. Each control keeps its own displayed value and
//! silently ignores input it cannot accept.

use std::fmt;

pub const FONT_WEIGHTS: [u16; 5] = [300, 400, 600, 700, 900];
const SIZE_UNITS: [&str; 6] = ["px", "%", "vh", "vw", "em", "rem"];

/// Style properties the inspector writes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StyleProperty {
    Color,
    BackgroundColor,
    FontSize,
    FontWeight,
    Padding,
    Margin,
    BorderRadius,
    Width,
    Height,
    BackgroundImage,
    BackgroundSize,
    BackgroundPosition,
}

impl StyleProperty {
    pub fn as_str(self) -> &'static str {
        match self {
            StyleProperty::Color => "color",
            StyleProperty::BackgroundColor => "backgroundColor",
            StyleProperty::FontSize => "fontSize",
            StyleProperty::FontWeight => "fontWeight",
            StyleProperty::Padding => "padding",
            StyleProperty::Margin => "margin",
            StyleProperty::BorderRadius => "borderRadius",
            StyleProperty::Width => "width",
            StyleProperty::Height => "height",
            StyleProperty::BackgroundImage => "backgroundImage",
            StyleProperty::BackgroundSize => "backgroundSize",
            StyleProperty::BackgroundPosition => "backgroundPosition",
        }
    }
}

impl fmt::Display for StyleProperty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Colors
// ============================================================================

/// `rgb(244, 208, 63)` / `rgba(...)` → `#F4D03F`. Anything unparseable maps
/// to black; a fully transparent color also reads as black.
pub fn rgb_to_hex(value: &str) -> String {
    let value = value.trim();
    if is_valid_hex(value) {
        return value.to_uppercase();
    }

    let inner = value
        .strip_prefix("rgba(")
        .or_else(|| value.strip_prefix("rgb("))
        .and_then(|v| v.strip_suffix(')'));

    let Some(inner) = inner else {
        return "#000000".to_string();
    };

    let channels: Vec<u8> = inner
        .split(',')
        .take(3)
        .filter_map(|c| c.trim().parse::<u8>().ok())
        .collect();

    match channels.as_slice() {
        [r, g, b] => format!("#{:02X}{:02X}{:02X}", r, g, b),
        _ => "#000000".to_string(),
    }
}

/// `#RRGGBB`, case-insensitive.
pub fn is_valid_hex(value: &str) -> bool {
    value.len() == 7
        && value.starts_with('#')
        && value[1..].chars().all(|c| c.is_ascii_hexdigit())
}

/// A color picker paired with a hex text field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColorControl {
    picker: String,
    hex: String,
}

impl ColorControl {
    pub fn from_computed(value: &str) -> Self {
        let hex = rgb_to_hex(value);
        ColorControl {
            picker: hex.clone(),
            hex,
        }
    }

    /// Picker change: the text field follows.
    pub fn pick(&mut self, hex: &str) {
        if is_valid_hex(hex) {
            self.picker = hex.to_uppercase();
            self.hex = self.picker.clone();
        }
    }

    /// Typing into the text field. The picker only follows a valid value.
    pub fn type_hex(&mut self, text: &str) {
        self.hex = text.to_string();
        if is_valid_hex(text) {
            self.picker = text.to_uppercase();
        }
    }

    /// The value written on apply.
    pub fn value(&self) -> &str {
        &self.picker
    }

    pub fn text(&self) -> &str {
        &self.hex
    }
}

// ============================================================================
// Numeric controls
// ============================================================================

/// Range slider with a numeric entry box, in whole pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SliderControl {
    min: u32,
    max: u32,
    value: u32,
}

impl SliderControl {
    /// Seed from a computed value like `"16px"`; the value is clamped into
    /// range and non-numeric values fall back to `min`.
    pub fn new(min: u32, max: u32, computed: &str) -> Self {
        let value = parse_px(computed).unwrap_or(min as f64).round();
        let value = (value.max(min as f64).min(max as f64)) as u32;
        SliderControl { min, max, value }
    }

    pub fn set(&mut self, value: u32) {
        if (self.min..=self.max).contains(&value) {
            self.value = value;
        }
    }

    pub fn type_value(&mut self, text: &str) {
        if let Ok(value) = text.trim().parse::<u32>() {
            self.set(value);
        }
    }

    pub fn value(&self) -> u32 {
        self.value
    }

    pub fn range(&self) -> (u32, u32) {
        (self.min, self.max)
    }

    pub fn css_value(&self) -> String {
        format!("{}px", self.value)
    }
}

fn parse_px(value: &str) -> Option<f64> {
    value.trim().trim_end_matches("px").trim().parse::<f64>().ok()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FontWeightControl {
    value: u16,
}

impl FontWeightControl {
    /// Computed weights outside the option list select the closest option.
    pub fn from_computed(computed: &str) -> Self {
        let weight = match computed.trim() {
            "normal" => 400,
            "bold" => 700,
            other => other.parse::<u16>().unwrap_or(400),
        };
        let value = FONT_WEIGHTS
            .iter()
            .copied()
            .min_by_key(|w| w.abs_diff(weight))
            .unwrap_or(400);
        FontWeightControl { value }
    }

    pub fn select(&mut self, weight: u16) {
        if FONT_WEIGHTS.contains(&weight) {
            self.value = weight;
        }
    }

    pub fn value(&self) -> u16 {
        self.value
    }

    pub fn css_value(&self) -> String {
        self.value.to_string()
    }
}

// ============================================================================
// Text controls
// ============================================================================

/// Width / height entry: `auto`, a number with a unit, or empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SizeControl {
    value: String,
}

impl SizeControl {
    /// Seeded empty when the element has no explicit size.
    pub fn from_computed(computed: &str) -> Self {
        let mut control = SizeControl::default();
        if computed != "auto" {
            control.type_value(computed);
        }
        control
    }

    pub fn type_value(&mut self, text: &str) {
        let text = text.trim();
        if is_valid_size(text) {
            self.value = text.to_string();
        }
    }

    /// `None` when the field is empty and nothing should be written.
    pub fn css_value(&self) -> Option<&str> {
        if self.value.is_empty() {
            None
        } else {
            Some(&self.value)
        }
    }
}

pub fn is_valid_size(text: &str) -> bool {
    if text.is_empty() || text == "auto" {
        return true;
    }
    SIZE_UNITS.iter().any(|unit| {
        text.strip_suffix(unit)
            .is_some_and(|n| !n.is_empty() && n.parse::<f64>().is_ok_and(|v| v.is_finite() && v >= 0.0))
    })
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ImageUrlControl {
    url: String,
}

impl ImageUrlControl {
    pub fn type_url(&mut self, text: &str) {
        self.url = text.trim().to_string();
    }

    pub fn url(&self) -> Option<&str> {
        if self.url.is_empty() {
            None
        } else {
            Some(&self.url)
        }
    }
}
