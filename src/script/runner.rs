use thiserror::Error;
use tracing::debug;

use crate::editor::addressor::ElementKey;
use crate::editor::controller::{EditMode, EditorCommand};
use crate::editor::inspector::TextKey;
use crate::page::page_model::NodeId;
use crate::page::selector::{Selector, SelectorError};
use crate::script::context::ScriptContext;
use crate::script::script_model::{
    AssertionResult, EditScript, ScriptAssertion, ScriptResult, ScriptStep, Target,
};
use crate::site::app::Site;
use crate::storage::kv::KeyValueStorage;

#[derive(Debug, Error)]
pub enum ScriptError {
    #[error("no element for target '{0}'")]
    UnknownTarget(String),

    #[error(transparent)]
    Selector(#[from] SelectorError),

    #[error("no element is selected")]
    NoSelection,

    #[error("unknown key '{0}' (expected enter, shift+enter or escape)")]
    UnknownKey(String),

    #[error("selected element has no editable text")]
    NotTextEditable,
}

/// Executes an [`EditScript`] step-by-step against a site.
pub struct ScriptRunner;

impl ScriptRunner {
    pub fn run<S: KeyValueStorage>(script: &EditScript, site: &mut Site<S>) -> ScriptResult {
        let mut ctx = ScriptContext::new();

        for (i, step) in script.steps.iter().enumerate() {
            ctx.current_step = i;

            if let Err(e) = Self::execute_step(step, i, site, &mut ctx) {
                return ScriptResult {
                    script_name: script.name.clone(),
                    passed: false,
                    steps_run: i + 1,
                    assertion_results: ctx.assertion_results,
                    error: Some(format!("Step {} failed: {}", i, e)),
                };
            }
        }

        let passed = ctx.all_passed();
        ScriptResult {
            script_name: script.name.clone(),
            passed,
            steps_run: script.steps.len(),
            assertion_results: ctx.assertion_results,
            error: None,
        }
    }

    fn execute_step<S: KeyValueStorage>(
        step: &ScriptStep,
        step_index: usize,
        site: &mut Site<S>,
        ctx: &mut ScriptContext,
    ) -> Result<(), ScriptError> {
        debug!("Step {}: {:?}", step_index, step);

        match step {
            ScriptStep::EnterEditMode => {
                if !site.editor().is_editing() {
                    site.toggle_edit_mode();
                }
            }
            ScriptStep::ExitEditMode => {
                if site.editor().is_editing() {
                    site.toggle_edit_mode();
                }
            }
            ScriptStep::ToggleEditMode => site.toggle_edit_mode(),

            ScriptStep::Click { target } => {
                let node = resolve(site, target)?;
                site.click(node);
            }
            ScriptStep::Hover { target } => {
                let node = resolve(site, target)?;
                site.hover(node);
            }
            ScriptStep::Leave { target } => {
                let node = resolve(site, target)?;
                site.leave(node);
            }

            ScriptStep::BeginTextEdit => {
                if site.editor().selected().is_none() {
                    return Err(ScriptError::NoSelection);
                }
                if !site.begin_text_edit() {
                    return Err(ScriptError::NotTextEditable);
                }
            }
            ScriptStep::TypeText { text } => {
                site.type_text(text);
            }
            ScriptStep::Key { key } => {
                site.key_down(parse_key(key)?);
            }
            ScriptStep::Blur => {
                site.blur();
            }

            ScriptStep::SetColor { text, background } => {
                let panel = site.panel_mut().ok_or(ScriptError::NoSelection)?;
                if let Some(hex) = text {
                    panel.text_color.type_hex(hex);
                }
                if let Some(hex) = background {
                    panel.background_color.type_hex(hex);
                }
            }
            ScriptStep::SetFont { size, weight } => {
                let panel = site.panel_mut().ok_or(ScriptError::NoSelection)?;
                if let Some(size) = size {
                    panel.font_size.set(*size);
                }
                if let Some(weight) = weight {
                    panel.font_weight.select(*weight);
                }
            }
            ScriptStep::SetSpacing {
                padding,
                margin,
                border_radius,
            } => {
                let panel = site.panel_mut().ok_or(ScriptError::NoSelection)?;
                if let Some(v) = padding {
                    panel.padding.set(*v);
                }
                if let Some(v) = margin {
                    panel.margin.set(*v);
                }
                if let Some(v) = border_radius {
                    panel.border_radius.set(*v);
                }
            }
            ScriptStep::SetSize { width, height } => {
                let panel = site.panel_mut().ok_or(ScriptError::NoSelection)?;
                if let Some(w) = width {
                    panel.width.type_value(w);
                }
                if let Some(h) = height {
                    panel.height.type_value(h);
                }
            }
            ScriptStep::SetBackgroundImage { url } => {
                let panel = site.panel_mut().ok_or(ScriptError::NoSelection)?;
                if let Some(field) = panel.background_image.as_mut() {
                    field.type_url(url);
                }
            }
            ScriptStep::Apply { group } => {
                if site.editor().selected().is_none() {
                    return Err(ScriptError::NoSelection);
                }
                site.apply((*group).into());
            }

            ScriptStep::Save => {
                site.command(EditorCommand::Save);
            }
            ScriptStep::Reset => site.reset_overrides(),
            ScriptStep::ClosePanel => {
                site.command(EditorCommand::ClosePanel);
            }
            ScriptStep::Reload => site.reload(),

            ScriptStep::Filter { filter } => {
                let selector = Selector::class("filter-btn").with_attr("data-filter", Some(filter.as_str()));
                let button = site
                    .page()
                    .select_first(&selector)
                    .ok_or_else(|| ScriptError::UnknownTarget(format!("filter '{}'", filter)))?;
                site.click(button);
            }

            ScriptStep::Assert { assertions } => {
                let results = assertions
                    .iter()
                    .map(|a| evaluate(a, step_index, site))
                    .collect::<Result<Vec<_>, _>>()?;
                ctx.record_assertions(results);
            }
        }
        Ok(())
    }
}

fn parse_key(key: &str) -> Result<TextKey, ScriptError> {
    match key.to_lowercase().as_str() {
        "enter" => Ok(TextKey::Enter { shift: false }),
        "shift+enter" => Ok(TextKey::Enter { shift: true }),
        "escape" | "esc" => Ok(TextKey::Escape),
        other => Err(ScriptError::UnknownKey(other.to_string())),
    }
}

/// Editor key first, then selector + index.
fn resolve<S: KeyValueStorage>(site: &Site<S>, target: &Target) -> Result<NodeId, ScriptError> {
    if let Some(key) = &target.key {
        return site
            .editor()
            .address_map()
            .resolve(&ElementKey::from(key.as_str()))
            .ok_or_else(|| ScriptError::UnknownTarget(target.describe()));
    }
    if let Some(selector) = &target.selector {
        let selector = Selector::parse(selector)?;
        return site
            .page()
            .select_all(&selector)
            .get(target.index)
            .copied()
            .ok_or_else(|| ScriptError::UnknownTarget(target.describe()));
    }
    Err(ScriptError::UnknownTarget(target.describe()))
}

fn evaluate<S: KeyValueStorage>(
    assertion: &ScriptAssertion,
    step_index: usize,
    site: &Site<S>,
) -> Result<AssertionResult, ScriptError> {
    let (passed, actual, message) = match assertion {
        ScriptAssertion::Style {
            target,
            property,
            expected,
        } => {
            let node = resolve(site, target)?;
            let actual = site
                .editor()
                .inspector()
                .stylesheet()
                .property(site.page(), node, property);
            let passed = &actual == expected;
            let message = format!(
                "{} of {}: expected \"{}\", actual \"{}\"",
                property,
                target.describe(),
                expected,
                actual
            );
            (passed, Some(actual), message)
        }

        ScriptAssertion::Text { target, expected } => {
            let node = resolve(site, target)?;
            let actual = site.page().content(node).unwrap_or_default().to_string();
            let passed = &actual == expected;
            let message = format!(
                "text of {}: expected \"{}\", actual \"{}\"",
                target.describe(),
                expected,
                actual
            );
            (passed, Some(actual), message)
        }

        ScriptAssertion::Mode { expected } => {
            let actual = match site.editor().mode() {
                EditMode::Viewing => "viewing",
                EditMode::Editing => "editing",
            };
            let passed = actual == expected.to_lowercase();
            (
                passed,
                Some(actual.to_string()),
                format!("mode: expected {}, actual {}", expected, actual),
            )
        }

        ScriptAssertion::Selected { target } => {
            let node = resolve(site, target)?;
            let selected = site.editor().selected();
            let actual = selected
                .and_then(|n| site.editor().address_map().key_of(n))
                .map(|k| k.to_string())
                .unwrap_or_else(|| "<none>".to_string());
            (
                selected == Some(node),
                Some(actual.clone()),
                format!("expected {} selected, actual {}", target.describe(), actual),
            )
        }

        ScriptAssertion::Stored {
            key,
            property,
            expected,
        } => {
            let store = site.editor().store();
            let element = ElementKey::from(key.as_str());
            let actual = match property {
                Some(prop) => store
                    .styles(&element)
                    .and_then(|m| m.get(prop))
                    .cloned(),
                None => store.text(&element).map(str::to_string),
            };
            let what = property.as_deref().unwrap_or("text");
            (
                &actual == expected,
                actual.clone(),
                format!(
                    "stored {} for {}: expected {:?}, actual {:?}",
                    what, key, expected, actual
                ),
            )
        }

        ScriptAssertion::Notice { expected } => {
            let notices = site.notices().pending();
            let passed = notices.iter().any(|n| n.message.contains(expected.as_str()));
            let actual = notices.last().map(|n| n.message.clone());
            (
                passed,
                actual,
                format!("no notification contains \"{}\"", expected),
            )
        }

        ScriptAssertion::CardCount { expected } => {
            let actual = site.card_count();
            (
                actual == *expected,
                Some(actual.to_string()),
                format!("card count: expected {}, actual {}", expected, actual),
            )
        }
    };

    Ok(AssertionResult {
        step_index,
        assertion: assertion.clone(),
        passed,
        actual,
        message: (!passed).then_some(message),
    })
}
