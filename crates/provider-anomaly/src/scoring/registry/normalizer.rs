/// Labels are compared case-sensitively; only the surrounding whitespace and
/// stray byte-order marks picked up from spreadsheet exports are dropped.
pub(crate) fn normalize_label(value: &str) -> String {
    value
        .trim_matches(|c: char| c.is_whitespace() || c == '\u{feff}')
        .to_string()
}
