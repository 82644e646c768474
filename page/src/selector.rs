//! CSS selector parsing for the in-memory document.
//!
//! Supports the subset the behaviour layer uses: selector groups (`a, b`),
//! descendant and child (`>`) combinators, type, universal, `#id` and
//! `.class` selectors, attribute conditions (`[a]`, `=`, `~=`, `^=`, `$=`,
//! `*=`) and the `:checked`, `:disabled`, `:enabled`, `:required`, `:valid`
//! and `:invalid` pseudo-classes. Anything else is rejected with
//! [`DomError::UnsupportedSelector`].

#[cfg(test)]
#[path = "selector_test.rs"]
mod selector_test;

use std::str::FromStr;

use crate::DomError;

/// A parsed selector group list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectorList {
    groups: Vec<Vec<Part>>,
}

/// One compound selector plus its relation to the part on its left.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub step: Step,
    /// `None` for the leftmost part of a chain.
    pub combinator: Option<Combinator>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Combinator {
    Descendant,
    Child,
}

/// A compound selector such as `input.form-control[required]:checked`.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Step {
    pub tag: Option<String>,
    pub universal: bool,
    pub id: Option<String>,
    pub classes: Vec<String>,
    pub attrs: Vec<AttrCondition>,
    pub pseudo: Vec<Pseudo>,
}

impl Step {
    fn is_empty(&self) -> bool {
        self.tag.is_none()
            && !self.universal
            && self.id.is_none()
            && self.classes.is_empty()
            && self.attrs.is_empty()
            && self.pseudo.is_empty()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AttrCondition {
    Exists { name: String },
    Equals { name: String, value: String },
    Includes { name: String, value: String },
    StartsWith { name: String, value: String },
    EndsWith { name: String, value: String },
    Contains { name: String, value: String },
}

impl AttrCondition {
    /// Attribute name the condition applies to (lower-case).
    #[must_use]
    pub fn name(&self) -> &str {
        match self {
            Self::Exists { name }
            | Self::Equals { name, .. }
            | Self::Includes { name, .. }
            | Self::StartsWith { name, .. }
            | Self::EndsWith { name, .. }
            | Self::Contains { name, .. } => name,
        }
    }

    /// Test the condition against an attribute value (`None` = absent).
    #[must_use]
    pub fn matches(&self, actual: Option<&str>) -> bool {
        let Some(actual) = actual else {
            return false;
        };
        match self {
            Self::Exists { .. } => true,
            Self::Equals { value, .. } => actual == value,
            Self::Includes { value, .. } => actual.split_ascii_whitespace().any(|token| token == value),
            Self::StartsWith { value, .. } => !value.is_empty() && actual.starts_with(value.as_str()),
            Self::EndsWith { value, .. } => !value.is_empty() && actual.ends_with(value.as_str()),
            Self::Contains { value, .. } => !value.is_empty() && actual.contains(value.as_str()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pseudo {
    Checked,
    Disabled,
    Enabled,
    Required,
    Valid,
    Invalid,
}

impl SelectorList {
    /// Parse a selector string.
    ///
    /// # Errors
    ///
    /// Returns [`DomError::UnsupportedSelector`] for empty input, unbalanced
    /// brackets or syntax outside the supported subset.
    pub fn parse(selector: &str) -> Result<Self, DomError> {
        let groups = split_top_level(selector, ',')
            .ok_or_else(|| unsupported(selector))?
            .iter()
            .map(|group| parse_chain(group))
            .collect::<Result<Vec<_>, _>>()?;
        if groups.is_empty() {
            return Err(unsupported(selector));
        }
        Ok(Self { groups })
    }

    /// Parsed chains, one per comma-separated group.
    #[must_use]
    pub fn groups(&self) -> &[Vec<Part>] {
        &self.groups
    }
}

impl FromStr for SelectorList {
    type Err = DomError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

fn unsupported(selector: &str) -> DomError {
    DomError::UnsupportedSelector(selector.to_string())
}

/// Split on `sep` outside brackets and quotes. `None` on unbalanced input.
fn split_top_level(src: &str, sep: char) -> Option<Vec<String>> {
    let mut out = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    for ch in src.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' if depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.checked_sub(1)?;
                current.push(ch);
            }
            c if c == sep && depth == 0 => {
                out.push(std::mem::take(&mut current).trim().to_string());
            }
            _ => current.push(ch),
        }
    }

    if depth != 0 || quote.is_some() {
        return None;
    }
    out.push(current.trim().to_string());
    if out.iter().any(String::is_empty) {
        return None;
    }
    Some(out)
}

/// Tokenize one group into compound selectors and `>` combinators.
fn tokenize(group: &str) -> Option<Vec<String>> {
    let mut tokens = Vec::new();
    let mut current = String::new();
    let mut depth = 0usize;
    let mut quote: Option<char> = None;

    let flush = |current: &mut String, tokens: &mut Vec<String>| {
        if !current.is_empty() {
            tokens.push(std::mem::take(current));
        }
    };

    for ch in group.chars() {
        if let Some(q) = quote {
            if ch == q {
                quote = None;
            }
            current.push(ch);
            continue;
        }
        match ch {
            '"' | '\'' if depth > 0 => {
                quote = Some(ch);
                current.push(ch);
            }
            '[' => {
                depth += 1;
                current.push(ch);
            }
            ']' => {
                depth = depth.checked_sub(1)?;
                current.push(ch);
            }
            '>' if depth == 0 => {
                flush(&mut current, &mut tokens);
                tokens.push(">".to_string());
            }
            '+' | '~' if depth == 0 => return None,
            c if c.is_whitespace() && depth == 0 => flush(&mut current, &mut tokens),
            _ => current.push(ch),
        }
    }
    if depth != 0 || quote.is_some() {
        return None;
    }
    flush(&mut current, &mut tokens);
    Some(tokens)
}

fn parse_chain(group: &str) -> Result<Vec<Part>, DomError> {
    let tokens = tokenize(group).ok_or_else(|| unsupported(group))?;
    let mut parts: Vec<Part> = Vec::new();
    let mut pending: Option<Combinator> = None;

    for token in tokens {
        if token == ">" {
            if parts.is_empty() || pending.is_some() {
                return Err(unsupported(group));
            }
            pending = Some(Combinator::Child);
            continue;
        }
        let step = parse_step(&token).ok_or_else(|| unsupported(group))?;
        let combinator = if parts.is_empty() {
            None
        } else {
            Some(pending.take().unwrap_or(Combinator::Descendant))
        };
        parts.push(Part { step, combinator });
    }

    if parts.is_empty() || pending.is_some() {
        return Err(unsupported(group));
    }
    Ok(parts)
}

fn parse_step(src: &str) -> Option<Step> {
    let bytes = src.as_bytes();
    let mut step = Step::default();
    let mut i = 0usize;

    while i < bytes.len() {
        match bytes[i] {
            b'*' => {
                if step.universal || step.tag.is_some() {
                    return None;
                }
                step.universal = true;
                i += 1;
            }
            b'#' => {
                let (id, next) = parse_ident(src, i + 1)?;
                if step.id.replace(id).is_some() {
                    return None;
                }
                i = next;
            }
            b'.' => {
                let (class, next) = parse_ident(src, i + 1)?;
                step.classes.push(class);
                i = next;
            }
            b'[' => {
                let (cond, next) = parse_attr(src, i)?;
                step.attrs.push(cond);
                i = next;
            }
            b':' => {
                let (name, next) = parse_ident(src, i + 1)?;
                step.pseudo.push(match name.to_ascii_lowercase().as_str() {
                    "checked" => Pseudo::Checked,
                    "disabled" => Pseudo::Disabled,
                    "enabled" => Pseudo::Enabled,
                    "required" => Pseudo::Required,
                    "valid" => Pseudo::Valid,
                    "invalid" => Pseudo::Invalid,
                    _ => return None,
                });
                i = next;
            }
            _ => {
                if !step.is_empty() {
                    return None;
                }
                let (tag, next) = parse_ident(src, i)?;
                step.tag = Some(tag.to_ascii_lowercase());
                i = next;
            }
        }
    }

    if step.is_empty() { None } else { Some(step) }
}

fn is_ident_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || b == b'-' || b == b'_'
}

fn parse_ident(src: &str, start: usize) -> Option<(String, usize)> {
    let bytes = src.as_bytes();
    let mut end = start;
    while end < bytes.len() && is_ident_byte(bytes[end]) {
        end += 1;
    }
    if end == start {
        return None;
    }
    Some((src.get(start..end)?.to_string(), end))
}

fn parse_attr(src: &str, open: usize) -> Option<(AttrCondition, usize)> {
    let bytes = src.as_bytes();
    let mut i = open + 1;
    skip_ws(bytes, &mut i);

    let name_start = i;
    while i < bytes.len() && (is_ident_byte(bytes[i]) || bytes[i] == b':') {
        i += 1;
    }
    if i == name_start {
        return None;
    }
    let name = src.get(name_start..i)?.to_ascii_lowercase();
    skip_ws(bytes, &mut i);

    if bytes.get(i) == Some(&b']') {
        return Some((AttrCondition::Exists { name }, i + 1));
    }

    let (op, after_op) = match (bytes.get(i), bytes.get(i + 1)) {
        (Some(b'='), _) => (b'=', i + 1),
        (Some(op @ (b'~' | b'^' | b'$' | b'*')), Some(b'=')) => (*op, i + 2),
        _ => return None,
    };
    i = after_op;
    skip_ws(bytes, &mut i);

    let value = match bytes.get(i) {
        Some(quote @ (b'"' | b'\'')) => {
            let start = i + 1;
            let end = start + src.get(start..)?.find(char::from(*quote))?;
            i = end + 1;
            src.get(start..end)?.to_string()
        }
        Some(_) => {
            let start = i;
            while i < bytes.len() && !bytes[i].is_ascii_whitespace() && bytes[i] != b']' {
                i += 1;
            }
            src.get(start..i)?.to_string()
        }
        None => return None,
    };

    skip_ws(bytes, &mut i);
    if bytes.get(i) != Some(&b']') {
        return None;
    }

    let cond = match op {
        b'=' => AttrCondition::Equals { name, value },
        b'~' => AttrCondition::Includes { name, value },
        b'^' => AttrCondition::StartsWith { name, value },
        b'$' => AttrCondition::EndsWith { name, value },
        _ => AttrCondition::Contains { name, value },
    };
    Some((cond, i + 1))
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}
