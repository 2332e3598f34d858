//! Structured docstring field capture.
//!
//! Reads reST field lists out of docstring lines:
//!
//! ```text
//! :param int count: how many
//! :type count: int
//! :returns: the result
//! :rtype: str
//! :raises ValueError: if count is negative
//! ```
//!
//! The result is merged with introspected parameters at the end of the
//! build, aligned by position.

use super::model::{DocFields, ExceptionDoc, Parameter, ReturnDoc};
use super::transform::{self, FIELD_REGEX};

#[derive(Debug)]
struct RawField {
    name: String,
    arg: String,
    body: String,
}

/// Parse the field list entries out of a docstring.
pub fn parse_docfields(lines: &[String]) -> DocFields {
    let mut fields = DocFields {
        summary: transform::transform_lines(lines),
        ..Default::default()
    };

    for raw in collect_fields(lines) {
        apply_field(&mut fields, raw);
    }

    fields
}

/// True when the docstring carries anything beyond plain prose.
pub fn has_structured_fields(fields: &DocFields) -> bool {
    !fields.parameters.is_empty() || fields.returns.is_some() || !fields.exceptions.is_empty()
}

fn collect_fields(lines: &[String]) -> Vec<RawField> {
    let mut fields: Vec<RawField> = Vec::new();
    let mut in_field = false;

    for line in lines {
        let stripped = line.trim_start();
        if let Some(caps) = FIELD_REGEX.captures(stripped) {
            fields.push(RawField {
                name: caps[1].to_string(),
                arg: caps.get(2).map(|m| m.as_str().trim()).unwrap_or("").to_string(),
                body: caps[3].trim().to_string(),
            });
            in_field = true;
            continue;
        }

        let is_continuation = !stripped.is_empty() && line.len() > stripped.len();
        if in_field && is_continuation {
            if let Some(last) = fields.last_mut() {
                if !last.body.is_empty() {
                    last.body.push(' ');
                }
                last.body.push_str(stripped.trim_end());
            }
        } else {
            in_field = false;
        }
    }

    fields
}

fn apply_field(fields: &mut DocFields, raw: RawField) {
    match raw.name.as_str() {
        "param" | "parameter" | "arg" | "argument" | "key" | "keyword" => {
            let mut tokens: Vec<&str> = raw.arg.split_whitespace().collect();
            let Some(name) = tokens.pop() else {
                return;
            };
            let param = param_entry(&mut fields.parameters, name);
            if !raw.body.is_empty() {
                param.description = transform::transform_string(&raw.body);
            }
            if !tokens.is_empty() {
                param.types = vec![tokens.join(" ")];
            }
        }
        "type" => {
            if raw.arg.is_empty() || raw.body.is_empty() {
                return;
            }
            let param = param_entry(&mut fields.parameters, &raw.arg);
            param.types = split_types(&raw.body);
        }
        "returns" | "return" => {
            let returns = fields.returns.get_or_insert_with(ReturnDoc::default);
            returns.description = transform::transform_string(&raw.body);
        }
        "rtype" => {
            let returns = fields.returns.get_or_insert_with(ReturnDoc::default);
            returns.types = split_types(&raw.body);
        }
        "raises" | "raise" | "except" | "exception" => {
            let (exception_type, description) = if raw.arg.is_empty() {
                (raw.body.clone(), None)
            } else {
                (raw.arg.clone(), transform::transform_string(&raw.body))
            };
            if exception_type.is_empty() {
                return;
            }
            fields.exceptions.push(ExceptionDoc {
                exception_type,
                description,
            });
        }
        // var/ivar/cvar/vartype/yields describe attributes and generators,
        // which have no slot in the syntax block
        _ => {}
    }
}

fn param_entry<'a>(params: &'a mut Vec<Parameter>, name: &str) -> &'a mut Parameter {
    let index = match params.iter().position(|p| p.id == name) {
        Some(index) => index,
        None => {
            params.push(Parameter::new(name));
            params.len() - 1
        }
    };
    &mut params[index]
}

fn split_types(body: &str) -> Vec<String> {
    body.split(" or ")
        .map(|t| t.trim().trim_matches('`').to_string())
        .filter(|t| !t.is_empty())
        .collect()
}
