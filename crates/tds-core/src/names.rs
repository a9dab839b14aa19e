//! Field-name helpers.
//!
//! Columns are identified by their bracketed name (`[FIELD]`); remote fields
//! are bare (`FIELD`); mapping values qualify a remote field by its parent
//! relation (`[Custom SQL Query].[FIELD]`).

/// Normalize a column name to the bracketed form.
#[must_use]
pub fn bracketed(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.starts_with('[') && trimmed.ends_with(']') && trimmed.len() >= 2 {
        trimmed.to_string()
    } else {
        format!("[{trimmed}]")
    }
}

/// Strip one pair of surrounding brackets, if present.
#[must_use]
pub fn unbracketed(name: &str) -> &str {
    name.strip_prefix('[')
        .and_then(|inner| inner.strip_suffix(']'))
        .unwrap_or(name)
}

/// The mapping-table value for a remote field under `parent_name`.
#[must_use]
pub fn qualified_remote(parent_name: &str, remote_name: &str) -> String {
    format!("{parent_name}.[{remote_name}]")
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("AMOUNT", "[AMOUNT]")]
    #[case("[AMOUNT]", "[AMOUNT]")]
    #[case("  Order Date ", "[Order Date]")]
    #[case("[", "[[]")]
    fn bracketed_normalizes(#[case] input: &str, #[case] expected: &str) {
        assert_eq!(bracketed(input), expected);
    }

    #[test]
    fn unbracketed_strips_one_pair() {
        assert_eq!(unbracketed("[AMOUNT]"), "AMOUNT");
        assert_eq!(unbracketed("AMOUNT"), "AMOUNT");
        assert_eq!(unbracketed("[[X]]"), "[X]");
    }

    #[test]
    fn qualified_remote_joins_parent() {
        assert_eq!(
            qualified_remote("[Custom SQL Query]", "AMOUNT_USD"),
            "[Custom SQL Query].[AMOUNT_USD]"
        );
    }
}
