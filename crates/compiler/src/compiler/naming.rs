//! Naming conventions shared by the compilers and the source generator.
//!
//! Function `getNewCheckout` ⇄ config key `new-checkout`; context and field
//! names are stored snake_case and written camelCase in source.

use heck::{ToKebabCase, ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};

const FUNCTION_PREFIX: &str = "get";

/// Config key for a function name, or `None` if the name does not match
/// `get[A-Z][A-Za-z]*`.
#[must_use]
pub fn config_key(function_name: &str) -> Option<String> {
    let suffix = function_name.strip_prefix(FUNCTION_PREFIX)?;
    let mut chars = suffix.chars();
    let first = chars.next()?;
    if !first.is_ascii_uppercase() || !chars.all(|c| c.is_ascii_alphabetic()) {
        return None;
    }
    Some(suffix.to_kebab_case())
}

/// Function name that derives `key`.
#[must_use]
pub fn function_name(key: &str) -> String {
    format!("{FUNCTION_PREFIX}{}", key.to_upper_camel_case())
}

/// Storage key for a context binding or message field.
#[must_use]
pub fn snake_case(name: &str) -> String {
    name.to_snake_case()
}

/// Source spelling of a stored context key or field name.
#[must_use]
pub fn camel_case(name: &str) -> String {
    name.to_lower_camel_case()
}

/// Name of a message hoisted from an anonymous object field.
#[must_use]
pub fn nested_message_name(parent: &str, field: &str) -> String {
    format!("{parent}{}", field.to_upper_camel_case())
}

/// Namespaces follow file names: `^[a-z][a-z0-9-]*$`.
#[must_use]
pub fn is_valid_namespace(name: &str) -> bool {
    let mut chars = name.chars();
    chars.next().is_some_and(|c| c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
}
