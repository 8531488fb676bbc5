use serde::Serialize;

use crate::page::page_model::{NodeId, Page};
use crate::page::selector::Selector;

/// Properties that inherit from the parent element when not set.
const INHERITED: [&str; 3] = ["color", "fontSize", "fontWeight"];

/// Resolved values for the properties the inspector works with.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ComputedStyle {
    pub color: String,
    pub background_color: String,
    pub font_size: String,
    pub font_weight: String,
    pub padding: String,
    pub margin: String,
    pub border_radius: String,
    pub width: String,
    pub height: String,
}

struct Rule {
    selector: Selector,
    declarations: Vec<(&'static str, &'static str)>,
}

/// Default declarations for the site's element classes.
///
/// Cascade: inline style wins, then the last matching rule, then (for
/// inherited properties) the parent's value, then the initial value.
pub struct Stylesheet {
    rules: Vec<Rule>,
}

impl Default for Stylesheet {
    fn default() -> Self {
        Self::site_default()
    }
}

impl Stylesheet {
    pub fn empty() -> Self {
        Stylesheet { rules: vec![] }
    }

    pub fn site_default() -> Self {
        let mut sheet = Stylesheet::empty();

        sheet.rule(
            Selector::tag("body"),
            &[
                ("color", "rgb(255, 255, 255)"),
                ("backgroundColor", "rgb(26, 26, 26)"),
                ("fontSize", "16px"),
                ("fontWeight", "400"),
            ],
        );
        sheet.rule(
            Selector::class("hero"),
            &[("padding", "120px"), ("backgroundColor", "rgb(17, 17, 17)")],
        );
        sheet.rule(
            Selector::class("hero__title"),
            &[("fontSize", "64px"), ("fontWeight", "900")],
        );
        sheet.rule(
            Selector::class("hero__subtitle"),
            &[("fontSize", "20px"), ("color", "rgb(204, 204, 204)")],
        );
        for button in ["hero__button", "card__button"] {
            sheet.rule(
                Selector::class(button),
                &[
                    ("color", "rgb(26, 26, 26)"),
                    ("backgroundColor", "rgb(244, 208, 63)"),
                    ("fontWeight", "600"),
                    ("padding", "14px"),
                    ("borderRadius", "8px"),
                ],
            );
        }
        sheet.rule(
            Selector::class("card__button--secondary"),
            &[
                ("color", "rgb(255, 255, 255)"),
                ("backgroundColor", "rgb(58, 58, 58)"),
            ],
        );
        sheet.rule(Selector::class("trainers-section"), &[("padding", "80px")]);
        sheet.rule(
            Selector::class("trainers-title"),
            &[("fontSize", "48px"), ("fontWeight", "700")],
        );
        sheet.rule(
            Selector::class("trainers-subtitle"),
            &[("fontSize", "18px"), ("color", "rgb(153, 153, 153)")],
        );
        sheet.rule(
            Selector::class("filter-btn"),
            &[
                ("backgroundColor", "rgb(58, 58, 58)"),
                ("padding", "10px"),
                ("borderRadius", "24px"),
            ],
        );
        sheet.rule(
            Selector::class("filter-btn--active"),
            &[
                ("color", "rgb(26, 26, 26)"),
                ("backgroundColor", "rgb(244, 208, 63)"),
            ],
        );
        sheet.rule(
            Selector::class("card"),
            &[
                ("backgroundColor", "rgb(42, 42, 42)"),
                ("borderRadius", "16px"),
            ],
        );
        sheet.rule(
            Selector::class("card__title"),
            &[("fontSize", "24px"), ("fontWeight", "700"), ("margin", "12px")],
        );
        sheet.rule(
            Selector::class("card__description"),
            &[("fontSize", "15px"), ("color", "rgb(170, 170, 170)")],
        );

        sheet
    }

    pub fn rule(&mut self, selector: Selector, declarations: &[(&'static str, &'static str)]) {
        self.rules.push(Rule {
            selector,
            declarations: declarations.to_vec(),
        });
    }

    /// Value set on the element itself, inline or by a matching rule.
    fn cascaded(&self, page: &Page, id: NodeId, property: &str) -> Option<String> {
        let node = page.get(id)?;

        if let Some(inline) = node.style(property) {
            return Some(inline.to_string());
        }

        self.rules
            .iter()
            .rev()
            .filter(|r| r.selector.matches(node))
            .find_map(|r| {
                r.declarations
                    .iter()
                    .find(|(p, _)| *p == property)
                    .map(|(_, v)| v.to_string())
            })
    }

    pub fn property(&self, page: &Page, id: NodeId, property: &str) -> String {
        if INHERITED.contains(&property) {
            for ancestor in page.ancestors_or_self(id) {
                if let Some(v) = self.cascaded(page, ancestor, property) {
                    return v;
                }
            }
            return initial_value(property).to_string();
        }

        self.cascaded(page, id, property)
            .unwrap_or_else(|| initial_value(property).to_string())
    }

    pub fn computed(&self, page: &Page, id: NodeId) -> ComputedStyle {
        ComputedStyle {
            color: self.property(page, id, "color"),
            background_color: self.property(page, id, "backgroundColor"),
            font_size: self.property(page, id, "fontSize"),
            font_weight: self.property(page, id, "fontWeight"),
            padding: self.property(page, id, "padding"),
            margin: self.property(page, id, "margin"),
            border_radius: self.property(page, id, "borderRadius"),
            width: self.property(page, id, "width"),
            height: self.property(page, id, "height"),
        }
    }
}

fn initial_value(property: &str) -> &'static str {
    match property {
        "color" => "rgb(0, 0, 0)",
        "backgroundColor" => "rgba(0, 0, 0, 0)",
        "fontSize" => "16px",
        "fontWeight" => "400",
        "padding" | "margin" | "borderRadius" => "0px",
        "width" | "height" => "auto",
        "pointerEvents" => "auto",
        _ => "",
    }
}

/// `backgroundColor` → `background-color`
pub fn css_property_name(property: &str) -> String {
    let mut out = String::with_capacity(property.len() + 4);
    for c in property.chars() {
        if c.is_ascii_uppercase() {
            out.push('-');
            out.push(c.to_ascii_lowercase());
        } else {
            out.push(c);
        }
    }
    out
}
