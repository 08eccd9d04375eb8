//! Helpers for user text bound into `LIKE`/`ILIKE` patterns.

/// Escapes `\`, `%` and `_` so the text only ever matches literally.
pub fn escape_like(raw: &str) -> String {
    let mut out = String::with_capacity(raw.len());
    for c in raw.chars() {
        if matches!(c, '\\' | '%' | '_') {
            out.push('\\');
        }
        out.push(c);
    }
    out
}

/// Substring pattern: `%<escaped>%`.
pub fn contains(raw: &str) -> String {
    format!("%{}%", escape_like(raw))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn wildcards_are_escaped() {
        assert_eq!(escape_like("100%_off\\"), "100\\%\\_off\\\\");
        assert_eq!(contains("%"), "%\\%%");
    }

    #[test]
    fn plain_text_is_untouched() {
        assert_eq!(contains("Nice"), "%Nice%");
    }
}
