//! Docstring text to DocFX summary markup.
//!
//! Python cross-reference roles become `<xref:...>` links, double-backtick
//! literals become markdown code spans, and field lists (`:param x: ...`)
//! are dropped because the field parser captures them separately.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

lazy_static! {
    /// Matches field list openers like `:param x:`, `:rtype:`, `:raises ValueError:`
    pub(crate) static ref FIELD_REGEX: Regex = Regex::new(
        r"^:(param|parameter|arg|argument|key|keyword|type|returns?|rtype|raises?|except|exception|var|ivar|cvar|vartype|yields?|ytype)(?:\s+([^:]*?))?\s*:(.*)$"
    ).unwrap();

    /// Matches roles like :class:`pkg.Foo`, :py:meth:`~pkg.Foo.bar`, :func:`title <pkg.f>`
    static ref ROLE_REGEX: Regex = Regex::new(
        r":(?:py:)?([a-z]+):`([^`]+)`"
    ).unwrap();

    /// Matches `title <target>` inside a role body
    static ref TITLED_TARGET_REGEX: Regex = Regex::new(
        r"^(.+?)\s*<([^<>]+)>$"
    ).unwrap();

    static ref LITERAL_REGEX: Regex = Regex::new(r"``([^`]+)``").unwrap();
}

const XREF_ROLES: &[&str] = &[
    "class", "func", "meth", "mod", "attr", "exc", "data", "obj", "const",
];

/// Join docstring lines into a summary, or `None` when nothing is left.
pub fn transform_lines(lines: &[String]) -> Option<String> {
    let kept = strip_field_lists(lines);
    let text = kept.join("\n");
    transform_string(&text)
}

pub fn transform_string(text: &str) -> Option<String> {
    let converted =
        ROLE_REGEX.replace_all(text, |caps: &Captures| convert_role(&caps[1], &caps[2]));
    let converted = LITERAL_REGEX.replace_all(&converted, "`$1`");

    let trimmed = converted.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}

fn convert_role(role: &str, body: &str) -> String {
    if !XREF_ROLES.contains(&role) {
        // Keep the readable part of roles we don't link
        return match TITLED_TARGET_REGEX.captures(body) {
            Some(caps) => caps[1].to_string(),
            None => body.to_string(),
        };
    }

    if let Some(caps) = TITLED_TARGET_REGEX.captures(body) {
        let target = caps[2].trim_start_matches('~');
        return format!("[{}](xref:{})", &caps[1], target);
    }

    format!("<xref:{}>", body.trim_start_matches('~'))
}

/// Drop field list entries together with their indented continuation lines.
pub(crate) fn strip_field_lists(lines: &[String]) -> Vec<String> {
    let mut kept = Vec::new();
    let mut in_field = false;

    for line in lines {
        let stripped = line.trim_start();
        if FIELD_REGEX.is_match(stripped) {
            in_field = true;
            continue;
        }
        if in_field {
            let is_continuation = !stripped.is_empty() && line.len() > stripped.len();
            if is_continuation {
                continue;
            }
            if stripped.is_empty() {
                in_field = false;
                continue;
            }
            in_field = false;
        }
        kept.push(line.clone());
    }

    kept
}
