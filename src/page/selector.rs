use std::fmt;
use std::str::FromStr;

use thiserror::Error;

use crate::page::page_model::PageNode;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SelectorError {
    #[error("empty selector")]
    Empty,

    #[error("unexpected '{found}' at position {position} in selector '{selector}'")]
    Unexpected {
        selector: String,
        found: char,
        position: usize,
    },

    #[error("unsupported pseudo-class in selector '{0}' (only :not(#id) is supported)")]
    UnsupportedPseudo(String),
}

// ============================================================================
// Compound selector
// ============================================================================

/// A single compound selector: `tag#id.class[attr="value"]:not(#id)`.
///
/// Descendant and sibling combinators are not supported; every lookup the
/// site needs is a flat match against one element.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selector {
    tag: Option<String>,
    id: Option<String>,
    classes: Vec<String>,
    attrs: Vec<(String, Option<String>)>,
    not_ids: Vec<String>,
}

impl Selector {
    pub fn tag(tag: &str) -> Self {
        Selector {
            tag: Some(tag.to_lowercase()),
            ..Default::default()
        }
    }

    pub fn class(class: &str) -> Self {
        Selector {
            classes: vec![class.to_string()],
            ..Default::default()
        }
    }

    pub fn id(id: &str) -> Self {
        Selector {
            id: Some(id.to_string()),
            ..Default::default()
        }
    }

    pub fn with_attr(mut self, name: &str, value: Option<&str>) -> Self {
        self.attrs.push((name.to_string(), value.map(str::to_string)));
        self
    }

    pub fn not_id(mut self, id: &str) -> Self {
        self.not_ids.push(id.to_string());
        self
    }

    pub fn parse(input: &str) -> Result<Self, SelectorError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(SelectorError::Empty);
        }

        let chars: Vec<char> = trimmed.chars().collect();
        let mut pos = 0;
        let mut selector = Selector::default();

        let unexpected = |position: usize| SelectorError::Unexpected {
            selector: trimmed.to_string(),
            found: chars[position],
            position,
        };

        if is_ident_char(chars[0]) {
            let tag = read_ident(&chars, &mut pos);
            selector.tag = Some(tag.to_lowercase());
        } else if chars[0] == '*' {
            pos += 1;
        }

        while pos < chars.len() {
            match chars[pos] {
                '.' => {
                    pos += 1;
                    let class = read_ident(&chars, &mut pos);
                    if class.is_empty() {
                        return Err(unexpected(pos.min(chars.len() - 1)));
                    }
                    selector.classes.push(class);
                }
                '#' => {
                    pos += 1;
                    let id = read_ident(&chars, &mut pos);
                    if id.is_empty() {
                        return Err(unexpected(pos.min(chars.len() - 1)));
                    }
                    selector.id = Some(id);
                }
                '[' => {
                    pos += 1;
                    let name = read_ident(&chars, &mut pos);
                    if name.is_empty() {
                        return Err(unexpected(pos.min(chars.len() - 1)));
                    }
                    let mut value = None;
                    if pos < chars.len() && chars[pos] == '=' {
                        pos += 1;
                        value = Some(read_attr_value(&chars, &mut pos));
                    }
                    if pos >= chars.len() || chars[pos] != ']' {
                        return Err(unexpected(pos.min(chars.len() - 1)));
                    }
                    pos += 1;
                    selector.attrs.push((name, value));
                }
                ':' => {
                    let rest: String = chars[pos..].iter().collect();
                    if !rest.starts_with(":not(#") {
                        return Err(SelectorError::UnsupportedPseudo(trimmed.to_string()));
                    }
                    pos += ":not(#".len();
                    let id = read_ident(&chars, &mut pos);
                    if id.is_empty() || pos >= chars.len() || chars[pos] != ')' {
                        return Err(SelectorError::UnsupportedPseudo(trimmed.to_string()));
                    }
                    pos += 1;
                    selector.not_ids.push(id);
                }
                _ => return Err(unexpected(pos)),
            }
        }

        Ok(selector)
    }

    pub fn matches(&self, node: &PageNode) -> bool {
        if let Some(tag) = &self.tag {
            if !node.tag.eq_ignore_ascii_case(tag) {
                return false;
            }
        }

        if let Some(id) = &self.id {
            if node.id.as_deref() != Some(id.as_str()) {
                return false;
            }
        }

        if !self.classes.iter().all(|c| node.has_class(c)) {
            return false;
        }

        let attrs_match = self.attrs.iter().all(|(name, value)| match value {
            Some(v) => node.attr(name) == Some(v.as_str()),
            None => node.attr(name).is_some(),
        });
        if !attrs_match {
            return false;
        }

        match &node.id {
            Some(id) => !self.not_ids.iter().any(|n| n == id),
            None => true,
        }
    }
}

impl FromStr for Selector {
    type Err = SelectorError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Selector::parse(s)
    }
}

impl fmt::Display for Selector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(tag) = &self.tag {
            write!(f, "{}", tag)?;
        }
        if let Some(id) = &self.id {
            write!(f, "#{}", id)?;
        }
        for class in &self.classes {
            write!(f, ".{}", class)?;
        }
        for (name, value) in &self.attrs {
            match value {
                Some(v) => write!(f, "[{}=\"{}\"]", name, v)?,
                None => write!(f, "[{}]", name)?,
            }
        }
        for id in &self.not_ids {
            write!(f, ":not(#{})", id)?;
        }
        Ok(())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_alphanumeric() || c == '-' || c == '_'
}

fn read_ident(chars: &[char], pos: &mut usize) -> String {
    let start = *pos;
    while *pos < chars.len() && is_ident_char(chars[*pos]) {
        *pos += 1;
    }
    chars[start..*pos].iter().collect()
}

fn read_attr_value(chars: &[char], pos: &mut usize) -> String {
    let quote = match chars.get(*pos) {
        Some(&q) if q == '"' || q == '\'' => q,
        _ => return read_ident(chars, pos),
    };

    *pos += 1;
    let start = *pos;
    while *pos < chars.len() && chars[*pos] != quote {
        *pos += 1;
    }
    let value = chars[start..*pos].iter().collect();
    if *pos < chars.len() {
        *pos += 1; // closing quote
    }
    value
}
