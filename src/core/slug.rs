/// 將場館名稱轉換成網址用的 slug
///
/// Lower-cases the name, spells `&` as `and`, drops everything except
/// `a-z`, `0-9`, spaces and hyphens, then joins the remaining words with
/// single hyphens. Falls back to the trimmed, lower-cased `fallback_id` when
/// nothing is left. The result is empty only when both inputs are blank.
pub fn derive_slug(display_name: &str, fallback_id: &str) -> String {
    let cleaned: String = display_name
        .to_lowercase()
        .replace('&', "and")
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || *c == '-' || c.is_whitespace())
        .collect();

    let slug = cleaned.split_whitespace().collect::<Vec<_>>().join("-");
    if slug.is_empty() {
        fallback_id.trim().to_lowercase()
    } else {
        slug
    }
}
