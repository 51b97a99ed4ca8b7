/// Convert an identifier to SCREAMING_SNAKE_CASE.
///
/// Used for macro and enum constant names in emitted source. Existing
/// underscores are kept, camel humps become separators.
///
/// # Examples
/// ```
/// use rill_core::utils::to_upper_snake_case;
/// assert_eq!(to_upper_snake_case("calc_"), "CALC_");
/// assert_eq!(to_upper_snake_case("myParser"), "MY_PARSER");
/// ```
pub fn to_upper_snake_case(s: &str) -> String {
    let mut result = String::with_capacity(s.len() + 4);
    let mut prev_lower = false;
    for c in s.chars() {
        if c.is_ascii_uppercase() && prev_lower {
            result.push('_');
        }
        prev_lower = c.is_ascii_lowercase() || c.is_ascii_digit();
        result.push(c.to_ascii_uppercase());
    }
    result
}

/// Whether `s` is usable verbatim as a C-family identifier.
pub fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first == '_' || first.is_ascii_alphabetic())
        && chars.all(|c| c == '_' || c.is_ascii_alphanumeric())
}

/// Digits needed to print indices below `count`.
pub fn width_for_count(count: usize) -> usize {
    let mut max = count.saturating_sub(1);
    let mut width = 1;
    while max >= 10 {
        max /= 10;
        width += 1;
    }
    width
}
