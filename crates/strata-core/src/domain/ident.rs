//! Identifier casing for generated Dart.

use convert_case::{Case, Casing};

const RESERVED: &[&str] = &[
    "abstract", "as", "assert", "async", "await", "break", "case", "catch", "class", "const",
    "continue", "covariant", "default", "deferred", "do", "dynamic", "else", "enum", "export",
    "extends", "extension", "external", "factory", "false", "final", "finally", "for",
    "Function", "get", "hide", "if", "implements", "import", "in", "interface", "is", "late",
    "library", "mixin", "new", "null", "on", "operator", "part", "required", "rethrow", "return",
    "set", "show", "static", "super", "switch", "sync", "this", "throw", "true", "try", "typedef",
    "var", "void", "while", "with", "yield",
];

/// `user_profile` -> `UserProfile`.
pub fn pascal(raw: &str) -> String {
    let cased = sanitize(raw).to_case(Case::Pascal);
    match cased.chars().next() {
        None => "Field".to_string(),
        Some(c) if c.is_ascii_digit() => format!("N{cased}"),
        Some(_) => cased,
    }
}

/// `user_profile` -> `userProfile`, never a reserved word.
pub fn camel(raw: &str) -> String {
    let cased = sanitize(raw).to_case(Case::Camel);
    let cased = match cased.chars().next() {
        None => "field".to_string(),
        Some(c) if c.is_ascii_digit() => format!("n{cased}"),
        Some(_) => cased,
    };
    if RESERVED.contains(&cased.as_str()) {
        format!("{cased}Value")
    } else {
        cased
    }
}

/// `UserProfile` -> `user_profile`.
pub fn snake(raw: &str) -> String {
    let cased = sanitize(raw).to_case(Case::Snake);
    if cased.is_empty() { "unnamed".into() } else { cased }
}

/// Single-quoted Dart string literal.
pub fn quote(raw: &str) -> String {
    let escaped = raw
        .replace('\\', "\\\\")
        .replace('\'', "\\'")
        .replace('$', "\\$");
    format!("'{escaped}'")
}

fn sanitize(raw: &str) -> String {
    raw.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '_' })
        .collect()
}
