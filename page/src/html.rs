//! HTML fragment parser for the in-memory document.
//!
//! A forgiving tokenizer for well-formed markup: elements, quoted and
//! unquoted attributes, boolean attributes, void and self-closing tags,
//! comments, doctype declarations, raw-text `<script>`/`<style>` bodies and
//! the common character references. It does not synthesize implied elements
//! (`<tbody>`, closing `<p>`), so fixtures must spell their structure out.

#[cfg(test)]
#[path = "html_test.rs"]
mod html_test;

use crate::DomError;
use crate::doc::{Document, NodeId};

/// Parse `html` and append the resulting nodes under `parent`.
///
/// # Errors
///
/// Returns [`DomError::HtmlParse`] for unterminated comments, tags or
/// attribute values.
pub(crate) fn parse_into(doc: &mut Document, parent: NodeId, html: &str) -> Result<(), DomError> {
    let bytes = html.as_bytes();
    let mut stack = vec![parent];
    let mut i = 0usize;

    while i < bytes.len() {
        if bytes[i] != b'<' {
            let start = i;
            while i < bytes.len() && bytes[i] != b'<' {
                i += 1;
            }
            let text = &html[start..i];
            if !text.is_empty() {
                doc.append_text(current(&stack), &decode_entities(text));
            }
            continue;
        }

        if html[i..].starts_with("<!--") {
            let end = html[i + 4..]
                .find("-->")
                .ok_or_else(|| DomError::HtmlParse("unclosed comment".into()))?;
            i += 4 + end + 3;
            continue;
        }

        if html[i..].starts_with("<!") {
            let end = html[i..]
                .find('>')
                .ok_or_else(|| DomError::HtmlParse("unclosed declaration".into()))?;
            i += end + 1;
            continue;
        }

        if html[i..].starts_with("</") {
            let (tag, next) = parse_end_tag(html, i)?;
            i = next;
            if let Some(depth) = stack.iter().rposition(|node| doc.tag_is(*node, &tag)) {
                if depth > 0 {
                    stack.truncate(depth);
                }
            }
            continue;
        }

        let (tag, attrs, self_closing, next) = parse_start_tag(html, i)?;
        i = next;
        let node = doc.append_element(current(&stack), &tag, attrs);

        if is_raw_text(&tag) {
            let close = find_end_tag(html, i, &tag)
                .ok_or_else(|| DomError::HtmlParse(format!("unclosed <{tag}>")))?;
            if close > i {
                doc.append_text(node, &html[i..close]);
            }
            let (_, after) = parse_end_tag(html, close)?;
            i = after;
            continue;
        }

        if !self_closing && !is_void(&tag) {
            stack.push(node);
        }
    }

    Ok(())
}

fn current(stack: &[NodeId]) -> NodeId {
    // The stack always keeps the fragment parent at index 0.
    stack[stack.len() - 1]
}

type StartTag = (String, Vec<(String, String)>, bool, usize);

fn parse_start_tag(html: &str, at: usize) -> Result<StartTag, DomError> {
    let bytes = html.as_bytes();
    let mut i = at + 1;

    let tag_start = i;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    if i == tag_start {
        return Err(DomError::HtmlParse(format!("empty tag name at byte {at}")));
    }
    let tag = html[tag_start..i].to_ascii_lowercase();

    let mut attrs: Vec<(String, String)> = Vec::new();
    loop {
        skip_ws(bytes, &mut i);
        match bytes.get(i) {
            None => return Err(DomError::HtmlParse(format!("unclosed <{tag}>"))),
            Some(b'>') => return Ok((tag, attrs, false, i + 1)),
            Some(b'/') if bytes.get(i + 1) == Some(&b'>') => return Ok((tag, attrs, true, i + 2)),
            Some(_) => {}
        }

        let name_start = i;
        while i < bytes.len() && is_name_byte(bytes[i]) {
            i += 1;
        }
        if i == name_start {
            return Err(DomError::HtmlParse(format!("invalid attribute in <{tag}>")));
        }
        let name = html[name_start..i].to_ascii_lowercase();
        skip_ws(bytes, &mut i);

        let value = if bytes.get(i) == Some(&b'=') {
            i += 1;
            skip_ws(bytes, &mut i);
            parse_attr_value(html, &mut i)?
        } else {
            String::new()
        };

        if !attrs.iter().any(|(existing, _)| *existing == name) {
            attrs.push((name, value));
        }
    }
}

fn parse_attr_value(html: &str, i: &mut usize) -> Result<String, DomError> {
    let bytes = html.as_bytes();
    match bytes.get(*i) {
        Some(quote @ (b'"' | b'\'')) => {
            let start = *i + 1;
            let len = html[start..]
                .find(char::from(*quote))
                .ok_or_else(|| DomError::HtmlParse("unclosed attribute value".into()))?;
            *i = start + len + 1;
            Ok(decode_entities(&html[start..start + len]))
        }
        Some(_) => {
            let start = *i;
            while *i < bytes.len() && !bytes[*i].is_ascii_whitespace() && bytes[*i] != b'>' {
                if bytes[*i] == b'/' && bytes.get(*i + 1) == Some(&b'>') {
                    break;
                }
                *i += 1;
            }
            Ok(decode_entities(&html[start..*i]))
        }
        None => Err(DomError::HtmlParse("missing attribute value".into())),
    }
}

fn parse_end_tag(html: &str, at: usize) -> Result<(String, usize), DomError> {
    let bytes = html.as_bytes();
    let mut i = at + 2;
    let start = i;
    while i < bytes.len() && is_name_byte(bytes[i]) {
        i += 1;
    }
    let tag = html[start..i].to_ascii_lowercase();
    let close = html[i..]
        .find('>')
        .ok_or_else(|| DomError::HtmlParse(format!("unclosed </{tag}>")))?;
    Ok((tag, i + close + 1))
}

fn find_end_tag(html: &str, from: usize, tag: &str) -> Option<usize> {
    let needle = format!("</{tag}");
    html[from..].to_ascii_lowercase().find(&needle).map(|offset| from + offset)
}

fn skip_ws(bytes: &[u8], i: &mut usize) {
    while *i < bytes.len() && bytes[*i].is_ascii_whitespace() {
        *i += 1;
    }
}

fn is_name_byte(b: u8) -> bool {
    b.is_ascii_alphanumeric() || matches!(b, b'-' | b'_' | b':' | b'.')
}

fn is_raw_text(tag: &str) -> bool {
    matches!(tag, "script" | "style")
}

/// Elements that never have children or an end tag.
pub(crate) fn is_void(tag: &str) -> bool {
    matches!(
        tag,
        "area" | "base" | "br" | "col" | "embed" | "hr" | "img" | "input" | "link" | "meta" | "source" | "track" | "wbr"
    )
}

/// Decode the named and numeric character references fixtures use.
pub(crate) fn decode_entities(src: &str) -> String {
    if !src.contains('&') {
        return src.to_string();
    }
    let mut out = String::with_capacity(src.len());
    let mut rest = src;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let tail = &rest[amp..];
        let Some(semi) = tail.find(';').filter(|semi| *semi <= 10) else {
            out.push('&');
            rest = &tail[1..];
            continue;
        };
        let entity = &tail[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" | "#39" => Some('\''),
            "nbsp" => Some('\u{a0}'),
            _ => entity.strip_prefix('#').and_then(|num| {
                let code = match num.strip_prefix(['x', 'X']) {
                    Some(hex) => u32::from_str_radix(hex, 16).ok(),
                    None => num.parse::<u32>().ok(),
                };
                code.and_then(char::from_u32)
            }),
        };
        if let Some(ch) = decoded {
            out.push(ch);
            rest = &tail[semi + 1..];
        } else {
            out.push('&');
            rest = &tail[1..];
        }
    }
    out.push_str(rest);
    out
}

/// Escape text for serialization.
pub(crate) fn escape_text(src: &str) -> String {
    src.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Escape an attribute value for serialization inside double quotes.
pub(crate) fn escape_attr(src: &str) -> String {
    src.replace('&', "&amp;").replace('"', "&quot;")
}
