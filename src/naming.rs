//! Name normalization shared by the resolver, the walker and the emitter.
//!
//! Server-side names arrive fully qualified (`MyApp.Views.PageView`1`, `MyApp.Outer+Inner`).
//! Client-side names drop the namespace, the generic arity marker and a few
//! conventional suffixes.

/// Suffixes stripped from class names, longest first.
const CLASS_SUFFIXES: &[&str] = &["ViewModel", "View"];

const CONTROLLER_SUFFIX: &str = "Controller";

/// Returns the last segment of a qualified name, accounting for nested types (`+`).
pub fn simple_name(full_name: &str) -> &str {
    let after_dot = full_name.rsplit('.').next().unwrap_or(full_name);
    after_dot.rsplit('+').next().unwrap_or(after_dot)
}

/// Removes a generic arity marker (`List`1` -> `List`).
pub fn strip_arity(name: &str) -> &str {
    match name.find('`') {
        Some(pos) => &name[..pos],
        None => name,
    }
}

/// Returns the simple name of a type with its arity marker removed.
pub fn bare_name(full_name: &str) -> &str {
    strip_arity(simple_name(full_name))
}

/// Normalizes a class or enum name: namespace, arity marker and `View`/`ViewModel`
/// suffixes are removed. A name made only of a suffix is kept as is.
pub fn normalize_class_name(full_name: &str) -> String {
    let name = bare_name(full_name);
    for suffix in CLASS_SUFFIXES {
        if let Some(stripped) = name.strip_suffix(suffix) {
            if !stripped.is_empty() {
                return stripped.to_string();
            }
        }
    }
    name.to_string()
}

/// Normalizes a controller name: namespace, arity marker and the `Controller` suffix are removed.
pub fn normalize_controller_name(full_name: &str) -> String {
    let name = bare_name(full_name);
    match name.strip_suffix(CONTROLLER_SUFFIX) {
        Some(stripped) if !stripped.is_empty() => stripped.to_string(),
        _ => name.to_string(),
    }
}

/// Lower-cases the first character (`DicOfDic` -> `dicOfDic`).
pub fn to_camel_case(identifier: &str) -> String {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(first) => first.to_lowercase().chain(chars).collect(),
        None => String::new(),
    }
}

/// Upper-cases the first character.
pub fn to_pascal_case(identifier: &str) -> String {
    let mut chars = identifier.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}
