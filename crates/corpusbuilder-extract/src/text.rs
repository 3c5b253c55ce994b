//! Small string normalizers shared by the extractors.

/// Trim, then drop a single trailing comma.
pub fn strip_trailing_comma(s: &str) -> String {
    let trimmed = s.trim();
    trimmed.strip_suffix(',').unwrap_or(trimmed).to_string()
}

/// Remove the rightmost occurrence of `needle`.
pub fn remove_last(s: &str, needle: &str) -> String {
    match s.rfind(needle) {
        Some(pos) if !needle.is_empty() => {
            let mut out = String::with_capacity(s.len() - needle.len());
            out.push_str(&s[..pos]);
            out.push_str(&s[pos + needle.len()..]);
            out
        }
        _ => s.to_string(),
    }
}

/// Figure and table labels: `"Fig. 1."` becomes `"Fig 1"`.
pub fn clean_label(s: &str) -> String {
    s.replace('.', "").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strips_one_trailing_comma() {
        assert_eq!(strip_trailing_comma("  UC Berkeley, "), "UC Berkeley");
        assert_eq!(strip_trailing_comma("a,,"), "a,");
        assert_eq!(strip_trailing_comma("   "), "");
    }

    #[test]
    fn test_removes_rightmost_occurrence() {
        assert_eq!(remove_last("UK Road, Leeds UK", "UK"), "UK Road, Leeds ");
        assert_eq!(remove_last("Leeds", "UK"), "Leeds");
        assert_eq!(remove_last("Leeds", ""), "Leeds");
    }

    #[test]
    fn test_cleans_labels() {
        assert_eq!(clean_label(" Fig. 1. "), "Fig 1");
        assert_eq!(clean_label("Table 2"), "Table 2");
    }
}
