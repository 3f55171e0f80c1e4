//==================================================
// File: runtime/preprocess.rs
//==================================================
// Author: ZobieLabs
// License: Duality Public License (DPL v1.0)
// Goal: Source pre-pass ahead of tokenizing
//==================================================

use std::borrow::Cow;

use once_cell::sync::Lazy;
use regex::{Captures, Regex};

// String literals are matched first so comment markers inside them survive.
static COMMENTS: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#""[^"]*"|'[^']*'|//[^\n]*|/\*(?s:.*?)\*/"#)
        .expect("comment pattern must compile")
});

/// Remove `//` line comments and `/* */` block comments.
pub fn strip_comments(source: &str) -> Cow<'_, str> {
    COMMENTS.replace_all(source, |caps: &Captures<'_>| {
        let matched = &caps[0];
        if matched.starts_with('"') || matched.starts_with('\'') {
            matched.to_string()
        } else {
            String::new()
        }
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_line_and_block_comments() {
        let source = "var a = 1; // trailing\n/* block\nspanning */var b = 2;";
        assert_eq!(strip_comments(source), "var a = 1; \nvar b = 2;");
    }

    #[test]
    fn test_keeps_markers_inside_strings() {
        let source = r#"print("http://host", '/* not a comment */') // gone"#;
        assert_eq!(
            strip_comments(source),
            r#"print("http://host", '/* not a comment */') "#
        );
    }

    #[test]
    fn test_source_without_comments_is_borrowed() {
        assert!(matches!(strip_comments("var a = 1;"), Cow::Borrowed(_)));
    }
}

//==================================================
// End of file
//==================================================
