//! Turns fetched record texts into a result set.

use std::panic::{catch_unwind, AssertUnwindSafe};

use crate::models::ResultSet;
use crate::parser::EntryParser;
use crate::sources::SourceError;
use crate::utils::normalize_umlauts;

/// Normalize and parse every text, skipping the ones that yield nothing.
///
/// A text is skipped when the parser fails, panics, or returns no entries.
/// Returns [`SourceError::EmptyResult`] when no entry survives.
pub fn aggregate<I>(texts: I, parser: &dyn EntryParser) -> Result<ResultSet, SourceError>
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut results = ResultSet::new();

    for text in texts {
        let normalized = normalize_umlauts(text.as_ref());

        let parsed = catch_unwind(AssertUnwindSafe(|| parser.parse(&normalized)))
            .unwrap_or_else(|_| Err(SourceError::Parse("parser panicked".to_string())));

        match parsed {
            Ok(entries) if !entries.is_empty() => {
                for entry in entries {
                    results.insert(entry);
                }
            }
            Ok(_) => {
                tracing::warn!("No parsing result");
                tracing::debug!("Could not parse: {}", normalized);
            }
            Err(e) => {
                tracing::warn!("Could not parse record: {}", e);
                tracing::debug!("Could not parse: {}", normalized);
            }
        }
    }

    if results.is_empty() {
        return Err(SourceError::EmptyResult);
    }
    Ok(results)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Entry;
    use crate::parser::BiblatexParser;
    use std::sync::Mutex;

    /// Parser that records its input and answers from a fixed script
    #[derive(Debug, Default)]
    struct ScriptedParser {
        seen: Mutex<Vec<String>>,
    }

    impl EntryParser for ScriptedParser {
        fn parse(&self, text: &str) -> Result<Vec<Entry>, SourceError> {
            self.seen.lock().unwrap().push(text.to_string());
            match text {
                "fail" => Err(SourceError::Parse("bad input".to_string())),
                "panic" => panic!("parser bug"),
                "empty" => Ok(Vec::new()),
                other => Ok(vec![Entry::new(other, "misc")]),
            }
        }
    }

    #[test]
    fn test_successful_texts_are_collected() {
        let parser = ScriptedParser::default();
        let results = aggregate(["one", "two"], &parser).unwrap();
        assert_eq!(results.len(), 2);
    }

    #[test]
    fn test_failures_are_skipped() {
        let parser = ScriptedParser::default();
        let results = aggregate(["fail", "ok", "empty", "panic"], &parser).unwrap();

        assert_eq!(results.len(), 1);
        assert_eq!(results.iter().next().unwrap().key, "ok");
        assert_eq!(parser.seen.lock().unwrap().len(), 4);
    }

    #[test]
    fn test_all_failures_is_empty_result() {
        let parser = ScriptedParser::default();
        assert_eq!(
            aggregate(["fail", "empty"], &parser).unwrap_err(),
            SourceError::EmptyResult
        );

        let no_texts: [&str; 0] = [];
        assert_eq!(
            aggregate(no_texts, &parser).unwrap_err(),
            SourceError::EmptyResult
        );
    }

    #[test]
    fn test_parser_sees_normalized_text() {
        let parser = ScriptedParser::default();
        aggregate([r#"G\"odel \"Uber"#], &parser).unwrap();
        assert_eq!(parser.seen.lock().unwrap()[0], "Gödel Über");
    }

    #[test]
    fn test_duplicate_entries_collapse() {
        let text = "@article{Smith2001, title = {Knots}}";
        let results = aggregate([text, text], &BiblatexParser::new()).unwrap();
        assert_eq!(results.len(), 1);
    }
}
