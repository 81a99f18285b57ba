//! Java naming and text helpers for code generation

use heck::{ToLowerCamelCase, ToUpperCamelCase};
use once_cell::sync::Lazy;
use regex::Regex;

const JAVA_RESERVED_WORDS: &[&str] = &[
    "abstract", "assert", "boolean", "break", "byte", "case", "catch", "char", "class", "const",
    "continue", "default", "do", "double", "else", "enum", "extends", "false", "final", "finally",
    "float", "for", "goto", "if", "implements", "import", "instanceof", "int", "interface", "long",
    "native", "new", "null", "package", "private", "protected", "public", "return", "short",
    "static", "strictfp", "super", "switch", "synchronized", "this", "throw", "throws",
    "transient", "true", "try", "void", "volatile", "while",
];

static SMART_PUNCTUATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[‘’“”—]").expect("valid regex"));
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid regex"));

pub fn is_reserved_word(word: &str) -> bool {
    JAVA_RESERVED_WORDS.contains(&word)
}

/// UpperCamelCase class name; names starting with a digit get a `Model` prefix.
pub fn to_class_name(name: &str) -> String {
    let camel = name.to_upper_camel_case();
    match camel.chars().next() {
        None => "Model".to_string(),
        Some(first) if first.is_ascii_digit() => format!("Model{}", camel),
        Some(_) => camel,
    }
}

/// lowerCamelCase identifier for fields, parameters and methods.
/// Reserved words and names starting with a digit get a leading underscore.
pub fn to_var_name(name: &str) -> String {
    let camel = name.to_lower_camel_case();
    if camel.is_empty() {
        return "_value".to_string();
    }
    if is_reserved_word(&camel) || camel.starts_with(|c: char| c.is_ascii_digit()) {
        return format!("_{}", camel);
    }
    camel
}

/// SCREAMING_SNAKE_CASE constant name for an enum value.
pub fn to_enum_constant(value: &str) -> String {
    let constant: String = value
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_uppercase() } else { '_' })
        .collect();
    let constant = constant.trim_matches('_').to_string();
    match constant.chars().next() {
        None => "EMPTY".to_string(),
        Some(first) if first.is_ascii_digit() => format!("_{}", constant),
        Some(_) => constant,
    }
}

/// `com.example.api` -> `com/example/api`
pub fn package_path(package: &str) -> String {
    package.replace('.', "/")
}

/// Flatten free text into a single line that is safe inside a Javadoc block.
pub fn sanitize_javadoc(input: &str) -> String {
    input
        .lines()
        .map(|line| {
            let line = SMART_PUNCTUATION.replace_all(line, |caps: &regex::Captures| {
                match &caps[0] {
                    "\u{2018}" | "\u{2019}" => "'",
                    "\u{201C}" | "\u{201D}" => "\"",
                    "\u{2014}" => "-",
                    _ => "",
                }
            });
            WHITESPACE
                .replace_all(line.trim(), " ")
                .replace("*/", "*&#47;")
                .replace('@', "{@literal @}")
        })
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}
