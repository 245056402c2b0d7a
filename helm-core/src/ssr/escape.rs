//! HTML escaping.
//!
//! Attribute values and text content are escaped on the way out so an
//! unsanitized entry cannot inject markup. Script and style bodies cannot
//! be entity-escaped without changing their meaning; those only neutralize
//! a premature closing tag.

/// Escape a value for use inside a double-quoted attribute.
pub fn escape_attr(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Escape element text content.
pub fn escape_text(value: &str) -> String {
    let mut out = String::with_capacity(value.len());
    for ch in value.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Neutralize a closing tag inside a raw-text element body.
pub fn guard_raw_text(value: &str, tag_name: &str) -> String {
    let needle = format!("</{}", tag_name);
    let mut out = String::with_capacity(value.len());
    let mut rest = value;
    loop {
        match find_case_insensitive(rest, &needle) {
            Some(pos) => {
                out.push_str(&rest[..pos]);
                out.push_str("<\\/");
                rest = &rest[pos + 2..];
            }
            None => {
                out.push_str(rest);
                return out;
            }
        }
    }
}

/// Byte offset of the first case-insensitive occurrence of `needle`.
pub fn find_case_insensitive(haystack: &str, needle: &str) -> Option<usize> {
    if needle.is_empty() || haystack.len() < needle.len() {
        return None;
    }
    let haystack_lower = haystack.to_ascii_lowercase();
    haystack_lower.find(&needle.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_attribute_entities() {
        assert_eq!(
            escape_attr(r#"a"b'c<d>e&f"#),
            "a&quot;b&#39;c&lt;d&gt;e&amp;f"
        );
    }

    #[test]
    fn escapes_text_entities() {
        assert_eq!(escape_text("<script>&"), "&lt;script&gt;&amp;");
    }

    #[test]
    fn guards_premature_close() {
        assert_eq!(
            guard_raw_text("x</script><b>", "script"),
            "x<\\/script><b>"
        );
        assert_eq!(guard_raw_text("x</SCRIPT>", "script"), "x<\\/SCRIPT>");
        assert_eq!(guard_raw_text("no closer", "script"), "no closer");
    }

    #[test]
    fn finds_case_insensitive_needles() {
        assert_eq!(find_case_insensitive("<HEAD>", "<head>"), Some(0));
        assert_eq!(find_case_insensitive("x</Body>", "</body>"), Some(1));
        assert_eq!(find_case_insensitive("abc", "zz"), None);
    }
}
