//! DOT format and file naming helpers.

/// Escapes a string for use inside a double-quoted DOT string.
///
/// Quotes and backslashes are escaped; line breaks become `\l` so multi-line
/// labels (such as basic block listings) are left-justified by Graphviz.
///
/// # Examples
///
/// ```rust
/// use irview::utils::escape_dot;
///
/// assert_eq!(escape_dot("say \"hi\""), "say \\\"hi\\\"");
/// assert_eq!(escape_dot("a\nb"), "a\\lb");
/// ```
#[must_use]
pub fn escape_dot(s: &str) -> String {
    s.replace('\\', "\\\\")
        .replace('"', "\\\"")
        .replace('\r', "")
        .replace('\n', "\\l")
}

/// Wraps `s` in double quotes after escaping it.
#[must_use]
pub fn quote_dot(s: &str) -> String {
    format!("\"{}\"", escape_dot(s))
}

/// Turns a graph label into a string that is safe as a file name stem.
///
/// ASCII alphanumerics, `_`, `-` and `.` are kept; every other character is
/// replaced by `_`. Leading dots are replaced too, so a label can never name
/// a hidden file or a parent directory. An empty label becomes `graph`.
#[must_use]
pub fn sanitize_label(label: &str) -> String {
    let mut out: String = label
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();

    let leading_dots = out.chars().take_while(|&c| c == '.').count();
    if leading_dots > 0 {
        out.replace_range(..leading_dots, &"_".repeat(leading_dots));
    }

    if out.is_empty() {
        "graph".to_string()
    } else {
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_escape_dot_basic() {
        assert_eq!(escape_dot("hello"), "hello");
    }

    #[test]
    fn test_escape_dot_quotes_and_backslashes() {
        assert_eq!(escape_dot("path\\to \"x\""), "path\\\\to \\\"x\\\"");
    }

    #[test]
    fn test_escape_dot_newlines() {
        assert_eq!(escape_dot("line1\r\nline2\n"), "line1\\lline2\\l");
    }

    #[test]
    fn test_quote_dot() {
        assert_eq!(quote_dot("a\"b"), "\"a\\\"b\"");
    }

    #[test]
    fn test_sanitize_label_keeps_safe_chars() {
        assert_eq!(sanitize_label("main"), "main");
        assert_eq!(sanitize_label("my_fn-2.v1"), "my_fn-2.v1");
    }

    #[test]
    fn test_sanitize_label_replaces_separators() {
        assert_eq!(sanitize_label("ns/f g"), "ns_f_g");
        assert_eq!(sanitize_label("a\\b:c"), "a_b_c");
        assert_eq!(sanitize_label("λx"), "_x");
    }

    #[test]
    fn test_sanitize_label_hidden_and_empty() {
        assert_eq!(sanitize_label(".."), "__");
        assert_eq!(sanitize_label(".hidden"), "_hidden");
        assert_eq!(sanitize_label(""), "graph");
    }
}
