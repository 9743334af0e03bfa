//! Test file selection
//!
//! Test files register themselves with a [`Session`](elasticdash_core::Session);
//! discovery filters the registered paths rather than walking the disk.

use anyhow::{Context, Result, bail};
use glob::Pattern;

fn normalize(path: &str) -> &str {
    path.strip_prefix("./").unwrap_or(path)
}

/// Registered files matching any of the glob patterns, in registration order
pub fn select_files(registered: &[String], patterns: &[String]) -> Result<Vec<String>> {
    let compiled = patterns
        .iter()
        .map(|p| {
            Pattern::new(normalize(p)).with_context(|| format!("Invalid test pattern '{}'", p))
        })
        .collect::<Result<Vec<_>>>()?;

    Ok(registered
        .iter()
        .filter(|file| {
            let path = normalize(file);
            compiled.iter().any(|pattern| pattern.matches(path))
        })
        .cloned()
        .collect())
}

/// Resolve the single file named on the command line
///
/// Exact matches win; otherwise the name must be a path suffix of exactly one
/// registered file.
pub fn resolve_file(registered: &[String], name: &str) -> Result<String> {
    let wanted = normalize(name);
    if let Some(exact) = registered.iter().find(|f| normalize(f) == wanted) {
        return Ok(exact.clone());
    }

    let suffix = format!("/{}", wanted);
    let candidates: Vec<&String> = registered
        .iter()
        .filter(|f| normalize(f).ends_with(&suffix))
        .collect();

    match candidates.as_slice() {
        [] => bail!("No registered test file matches '{}'", name),
        [only] => Ok((*only).clone()),
        many => bail!(
            "'{}' matches several test files: {}",
            name,
            many.iter().map(|f| f.as_str()).collect::<Vec<_>>().join(", ")
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registered() -> Vec<String> {
        vec![
            "tests/flows/login.ai_test.rs".to_string(),
            "./tests/flows/refund.ai_test.rs".to_string(),
            "tests/helpers.rs".to_string(),
            "tests/other/login.ai_test.rs".to_string(),
        ]
    }

    #[test]
    fn test_select_by_pattern() {
        let files = select_files(&registered(), &["tests/flows/*.ai_test.rs".to_string()]).unwrap();
        assert_eq!(
            files,
            vec!["tests/flows/login.ai_test.rs", "./tests/flows/refund.ai_test.rs"]
        );
    }

    #[test]
    fn test_select_keeps_registration_order_across_patterns() {
        let files = select_files(
            &registered(),
            &["tests/other/*".to_string(), "tests/helpers.rs".to_string()],
        )
        .unwrap();
        assert_eq!(files, vec!["tests/helpers.rs", "tests/other/login.ai_test.rs"]);
    }

    #[test]
    fn test_select_nothing() {
        let files = select_files(&registered(), &["src/*.rs".to_string()]).unwrap();
        assert!(files.is_empty());
    }

    #[test]
    fn test_invalid_pattern() {
        let err = select_files(&registered(), &["[".to_string()]).unwrap_err();
        assert!(err.to_string().contains("Invalid test pattern"));
    }

    #[test]
    fn test_resolve_exact_and_suffix() {
        assert_eq!(
            resolve_file(&registered(), "./tests/helpers.rs").unwrap(),
            "tests/helpers.rs"
        );
        assert_eq!(
            resolve_file(&registered(), "refund.ai_test.rs").unwrap(),
            "./tests/flows/refund.ai_test.rs"
        );
    }

    #[test]
    fn test_resolve_ambiguous_or_missing() {
        let err = resolve_file(&registered(), "login.ai_test.rs").unwrap_err();
        assert!(err.to_string().contains("several test files"));
        assert!(resolve_file(&registered(), "missing.ai_test.rs").is_err());
    }
}
