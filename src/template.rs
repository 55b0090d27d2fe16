//! `{{name}}` placeholder rendering.

use crate::error::{ChainError, Result};
use crate::value::Variables;
use once_cell::sync::Lazy;
use regex::Regex;

static PLACEHOLDER: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("placeholder pattern is valid")
});

/// Replace every `{{name}}` in `template` with the bound value's display form.
///
/// Whitespace inside the braces is ignored. Text that does not match the
/// placeholder grammar (for example `{{ 1x }}` or a single `{`) is copied
/// through unchanged.
///
/// # Errors
///
/// [`ChainError::UnknownVariable`] naming the first placeholder with no
/// binding in `vars`.
///
/// # Example
///
/// ```
/// use chainrunner::template::render;
/// use chainrunner::value::Variables;
///
/// let vars = Variables::new().with("name", "World");
/// assert_eq!(render("Hello {{ name }}", &vars).unwrap(), "Hello World");
/// ```
pub fn render(template: &str, vars: &Variables) -> Result<String> {
    let mut rendered = String::with_capacity(template.len());
    let mut last = 0;

    for caps in PLACEHOLDER.captures_iter(template) {
        let (Some(whole), Some(name)) = (caps.get(0), caps.get(1)) else {
            continue;
        };
        let name = name.as_str();
        let value = vars
            .get(name)
            .ok_or_else(|| ChainError::UnknownVariable(name.to_string()))?;
        rendered.push_str(&template[last..whole.start()]);
        rendered.push_str(&value.to_string());
        last = whole.end();
    }

    rendered.push_str(&template[last..]);
    Ok(rendered)
}

/// Names referenced by `template`, in order of appearance (duplicates kept).
pub fn placeholders(template: &str) -> Vec<&str> {
    PLACEHOLDER
        .captures_iter(template)
        .filter_map(|caps| caps.get(1).map(|m| m.as_str()))
        .collect()
}
