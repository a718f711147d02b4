/// Turn a raw listing title into the key used to join titles across sources.
///
/// Trims surrounding whitespace and lower-cases. Punctuation, inner spacing
/// and diacritics are left alone, so "El Dashash" and "elDashash" stay distinct
/// keys and only meet again in the fuzzy pass.
pub fn normalize_title(title: &str) -> String {
    title.trim().to_lowercase()
}
