//! Language name resolution.
//!
//! Two static lookups over a normalized (lowercased) language name: an
//! editor syntax profile and the execution engine's numeric id. Both are
//! fail-soft — an unknown name yields `None`, which callers treat as
//! "default highlighting" and "execution rejected" respectively, never as
//! an error.

/// Editor highlighting profile for the shared code document.
///
/// Languages without a dedicated profile borrow the closest one (the
/// editor only needs token shapes, not full semantics).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxProfile {
    Javascript,
    Python,
    Java,
    Cpp,
    Go,
    Rust,
    Sql,
}

/// Resolve a language name to a highlighting profile.
pub fn syntax_profile(name: &str) -> Option<SyntaxProfile> {
    match name.to_lowercase().as_str() {
        "javascript" | "typescript" | "ruby" | "kotlin" => Some(SyntaxProfile::Javascript),
        "python" => Some(SyntaxProfile::Python),
        "java" | "swift" => Some(SyntaxProfile::Java),
        "c" | "c++" | "cpp" => Some(SyntaxProfile::Cpp),
        "go" => Some(SyntaxProfile::Go),
        "rust" => Some(SyntaxProfile::Rust),
        "sql" => Some(SyntaxProfile::Sql),
        _ => None,
    }
}

/// Resolve a language name to its execution engine id.
///
/// The table is part of the execution service contract; the ids must not
/// change.
pub fn execution_id(name: &str) -> Option<u32> {
    let id = match name.to_lowercase().as_str() {
        "ruby" => 72,
        "sql" => 82,
        "swift" => 83,
        "java" => 96,
        "typescript" => 101,
        "javascript" => 102,
        "c++" => 105,
        "go" => 107,
        "rust" => 108,
        "python" => 109,
        "c" => 110,
        "kotlin" => 111,
        _ => return None,
    };
    Some(id)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execution_id_table_is_verbatim() {
        let table = [
            ("ruby", 72),
            ("sql", 82),
            ("swift", 83),
            ("java", 96),
            ("typescript", 101),
            ("javascript", 102),
            ("c++", 105),
            ("go", 107),
            ("rust", 108),
            ("python", 109),
            ("c", 110),
            ("kotlin", 111),
        ];
        for (name, id) in table {
            assert_eq!(execution_id(name), Some(id), "id for {name}");
        }
    }

    #[test]
    fn lookups_normalize_case() {
        assert_eq!(execution_id("Python"), Some(109));
        assert_eq!(execution_id("RUST"), Some(108));
        assert_eq!(syntax_profile("TypeScript"), Some(SyntaxProfile::Javascript));
    }

    #[test]
    fn unknown_names_are_fail_soft() {
        assert_eq!(execution_id("cobol"), None);
        assert_eq!(execution_id(""), None);
        assert_eq!(syntax_profile("cobol"), None);
    }

    #[test]
    fn borrowed_profiles() {
        assert_eq!(syntax_profile("ruby"), Some(SyntaxProfile::Javascript));
        assert_eq!(syntax_profile("kotlin"), Some(SyntaxProfile::Javascript));
        assert_eq!(syntax_profile("swift"), Some(SyntaxProfile::Java));
        assert_eq!(syntax_profile("cpp"), Some(SyntaxProfile::Cpp));
        assert_eq!(syntax_profile("c"), Some(SyntaxProfile::Cpp));
    }
}
