//! Token noise filter.
//!
//! Rules, applied in order to one requirement's token list:
//! 1. trim whitespace and surrounding periods
//! 2. drop single punctuation characters
//! 3. drop @-mentions and hashtags
//! 4. drop plain numbers, unless the previous token names a product or a
//!    version context ("java", "eclipse", "jdk", ...); such numbers are merged
//!    into their predecessor ("java" "8" -> "java 8")
//! 5. drop tokens of one character unless whitelisted (e.g. "c")
//!
//! Token order is preserved.

use std::collections::HashSet;

/// Words after which a number is read as a version component
const VERSION_CONTEXT: &[&str] = &[
    "eclipse", "junit", "sdk", "jdk", "java", "cdt", "emf", "macos", "oaw", "wtp", "jst",
    "geronimo", "wls", "tomcat", "websphere", "ce", "version", "pocketpc", "port", "line", "ajp",
    "ie", "oc4j", "release", "vers",
];

const PUNCTUATION: &str = "!#$%&'()*+,-./:;<=>?@[\\]^_`{|}~";

/// Filter configured with tokens that survive regardless of length
#[derive(Debug, Clone, Default)]
pub struct TokenFilter
{
    keep: HashSet<String>,
}

impl TokenFilter
{
    pub fn new<I, S>(keep: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            keep: keep
                .into_iter()
                .map(Into::into)
                .collect(),
        }
    }

    pub fn apply(
        &self,
        tokens: &[String],
    ) -> Vec<String>
    {
        let trimmed: Vec<&str> = tokens
            .iter()
            .map(|t| {
                t.trim()
                    .trim_matches('.')
            })
            .filter(|t| !is_punctuation(t))
            .filter(|t| !t.starts_with('@') && !t.starts_with('#'))
            .collect();

        // Numbers survive only behind a version context word
        let numbers_checked: Vec<&str> = trimmed
            .iter()
            .enumerate()
            .filter(|(i, t)| {
                let previous = if *i > 0 { trimmed[i - 1] } else { "" };
                !is_number(t) || is_version_number(previous, t)
            })
            .map(|(_, t)| *t)
            .collect();

        let mut merged: Vec<String> = Vec::with_capacity(numbers_checked.len());
        let mut skip_next = false;
        for (i, t) in numbers_checked
            .iter()
            .enumerate()
        {
            if skip_next
            {
                skip_next = false;
                continue;
            }
            let next = numbers_checked
                .get(i + 1)
                .copied()
                .unwrap_or("");
            if is_version_number(t, next)
            {
                merged.push(format!("{t} {next}"));
                skip_next = true;
                continue;
            }
            merged.push(t.to_string());
        }

        merged
            .into_iter()
            .filter(|t| {
                t.chars()
                    .count()
                    > 1
                    || self
                        .keep
                        .contains(t)
            })
            .filter(|t| !t.is_empty())
            .collect()
    }
}

fn is_punctuation(token: &str) -> bool
{
    let mut chars = token.chars();
    match (chars.next(), chars.next())
    {
        (Some(c), None) => PUNCTUATION.contains(c),
        _ => false,
    }
}

fn is_int_or_float(s: &str) -> bool
{
    // "inf" and "nan" parse as f64 but are words here
    s.parse::<i64>()
        .is_ok()
        || (s
            .parse::<f64>()
            .is_ok()
            && s.chars()
                .any(|c| c.is_ascii_digit()))
}

/// Plain numbers and dotted/dashed/"rc" version strings ("3.2", "1-2", "4rc1")
pub fn is_number(token: &str) -> bool
{
    if is_int_or_float(token)
    {
        return true;
    }
    token
        .replace("rc", ".")
        .split(['.', ',', '-'])
        .all(is_int_or_float)
}

pub fn is_version_number(
    previous: &str,
    token: &str,
) -> bool
{
    is_number(token) && VERSION_CONTEXT.contains(&previous)
}

#[cfg(test)]
mod tests
{
    use super::*;
    use crate::core::tokenizer::{Language, Tokenizer};

    fn toks(words: &[&str]) -> Vec<String>
    {
        words
            .iter()
            .map(|w| w.to_string())
            .collect()
    }

    #[test]
    fn merges_version_numbers_with_context_word()
    {
        let f = TokenFilter::new(["c"]);
        assert_eq!(f.apply(&toks(&["java", "8", "crashes"])), toks(&["java 8", "crashes"]));
        assert_eq!(f.apply(&toks(&["eclipse", "4.7", "ui"])), toks(&["eclipse 4.7", "ui"]));
    }

    #[test]
    fn drops_plain_numbers()
    {
        let f = TokenFilter::default();
        assert_eq!(f.apply(&toks(&["fails", "42", "times", "3.5"])), toks(&["fails", "times"]));
    }

    #[test]
    fn drops_noise_and_short_tokens()
    {
        let f = TokenFilter::new(["c"]);
        let out = f.apply(&toks(&["(", "@bob", "#tag", "x", "c", " editor. ", "..."]));
        assert_eq!(out, toks(&["c", "editor"]));
    }

    #[test]
    fn number_detection()
    {
        assert!(is_number("8"));
        assert!(is_number("4.7.1"));
        assert!(is_number("1-2"));
        assert!(is_number("4rc1"));
        assert!(!is_number("inf"));
        assert!(!is_number("v8"));
        assert!(!is_number(""));
    }

    #[test]
    fn tokenizer_and_filter_produce_merged_version_token()
    {
        let t = Tokenizer::new(&[], Language::En).unwrap();
        let f = TokenFilter::new(["c"]);
        let out = f.apply(&t.tokenize("java8 crashes"));
        assert_eq!(out, toks(&["java 8", "crashes"]));
        assert!(!out.contains(&"java".to_string()));
        assert!(!out.contains(&"8".to_string()));
    }
}
