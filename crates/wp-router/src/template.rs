//! Parameter template parser
//!
//! Turns the path and query templates of a route declaration into a
//! [`ParameterSchema`]. Runs once per route, at registration.
//!
//! - Path templates are `/`-separated. A `name:type` segment declares a
//!   required parameter; any other segment is static.
//! - Query templates are `&`-separated `name` or `name:type` segments (the
//!   type defaults to `string`). Segments inside one bracketed `[&...]` group
//!   are optional, all others are required.
//!
//! ```
//! use wp_router::template;
//!
//! let schema = template::parse("/users/id:number", "tab[&page:number&draft:boolean]").unwrap();
//! assert!(schema.get("id").unwrap().required);
//! assert!(!schema.get("draft").unwrap().required);
//! ```

use thiserror::Error;

use crate::params::{ParameterKind, ParameterSchema, ParameterSpec};

/// Errors produced while parsing a parameter template
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("unknown parameter type '{kind}' for '{name}'")]
    UnknownKind { name: String, kind: String },

    #[error("empty parameter name in segment '{0}'")]
    EmptyName(String),

    #[error("parameter '{0}' declared more than once")]
    DuplicateParameter(String),

    #[error("unbalanced optional group in '{0}'")]
    UnbalancedGroup(String),

    #[error("nested optional group in '{0}'")]
    NestedGroup(String),
}

/// Parse both templates into one schema
pub fn parse(path: &str, query: &str) -> Result<ParameterSchema, TemplateError> {
    let mut specs = parse_path(path)?;
    specs.extend(parse_query(query)?);
    ParameterSchema::from_specs(specs)
}

/// Parameters declared by a path template
pub fn parse_path(template: &str) -> Result<Vec<ParameterSpec>, TemplateError> {
    template
        .split('/')
        .map(str::trim)
        .filter(|segment| segment.contains(':'))
        .map(|segment| parse_segment(segment, true, None))
        .collect()
}

/// Parameters declared by a query template
pub fn parse_query(template: &str) -> Result<Vec<ParameterSpec>, TemplateError> {
    let body = template.trim().trim_start_matches('?');
    let mut specs = Vec::new();
    let mut current = String::new();
    let mut optional = false;

    for c in body.chars() {
        match c {
            '[' => {
                if optional {
                    return Err(TemplateError::NestedGroup(template.to_string()));
                }
                flush(&mut current, true, &mut specs)?;
                optional = true;
            }
            ']' => {
                if !optional {
                    return Err(TemplateError::UnbalancedGroup(template.to_string()));
                }
                flush(&mut current, false, &mut specs)?;
                optional = false;
            }
            '&' => flush(&mut current, !optional, &mut specs)?,
            _ => current.push(c),
        }
    }

    if optional {
        return Err(TemplateError::UnbalancedGroup(template.to_string()));
    }
    flush(&mut current, true, &mut specs)?;
    Ok(specs)
}

fn flush(
    current: &mut String,
    required: bool,
    specs: &mut Vec<ParameterSpec>,
) -> Result<(), TemplateError> {
    let segment = current.trim();
    if !segment.is_empty() {
        specs.push(parse_segment(segment, required, Some(ParameterKind::String))?);
    }
    current.clear();
    Ok(())
}

fn parse_segment(
    segment: &str,
    required: bool,
    default_kind: Option<ParameterKind>,
) -> Result<ParameterSpec, TemplateError> {
    let (name, kind) = match (segment.split_once(':'), default_kind) {
        (Some((name, kind)), _) => {
            let kind = kind.parse::<ParameterKind>().map_err(|kind| TemplateError::UnknownKind {
                name: name.trim().to_string(),
                kind,
            })?;
            (name.trim(), kind)
        }
        (None, Some(kind)) => (segment, kind),
        (None, None) => return Err(TemplateError::EmptyName(segment.to_string())),
    };

    if name.is_empty() {
        return Err(TemplateError::EmptyName(segment.to_string()));
    }
    Ok(ParameterSpec {
        name: name.to_string(),
        kind,
        required,
    })
}
