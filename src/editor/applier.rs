use tracing::debug;

use crate::editor::addressor::{AddressMap, Addressor, ElementKey, KeyScheme};
use crate::editor::override_store::Overrides;
use crate::page::page_model::Page;

/// What one `apply_all` pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ApplyReport {
    /// Keys whose style pairs were written
    pub styled: usize,

    /// Keys whose content was replaced
    pub texted: usize,

    /// Stored keys that no longer resolve to an element
    pub stale: Vec<ElementKey>,
}

/// Reapplies persisted overrides to a freshly rendered page.
#[derive(Debug, Clone, Copy, Default)]
pub struct OverrideApplier {
    addressor: Addressor,
}

impl OverrideApplier {
    pub fn new(scheme: KeyScheme) -> Self {
        OverrideApplier {
            addressor: Addressor::new(scheme),
        }
    }

    /// Address the page, then write every stored style pair and text
    /// replacement onto the element its key resolves to. Unresolvable keys
    /// are skipped. Running it twice leaves the page unchanged.
    pub fn apply_all(&self, page: &mut Page, overrides: &Overrides) -> (AddressMap, ApplyReport) {
        let map = self.addressor.tag(page);
        let mut report = ApplyReport::default();

        for (key, props) in &overrides.styles {
            let Some(node) = map.resolve(key) else {
                report.stale.push(key.clone());
                continue;
            };
            for (prop, value) in props {
                page.set_style(node, prop, value);
            }
            report.styled += 1;
        }

        for (key, markup) in &overrides.texts {
            let Some(node) = map.resolve(key) else {
                if !report.stale.contains(key) {
                    report.stale.push(key.clone());
                }
                continue;
            };
            page.set_content(node, markup);
            report.texted += 1;
        }

        if !report.stale.is_empty() {
            debug!("Skipped {} stale override keys", report.stale.len());
        }
        debug!(
            "Applied overrides: {} styled, {} texted",
            report.styled, report.texted
        );
        (map, report)
    }
}
