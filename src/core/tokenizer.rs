//! Custom tokenizer for issue summaries.
//!
//! Technical text breaks most general-purpose tokenizers ("c++", "asp.net",
//! "at&t", "java 8"), so tokenization runs in two layers:
//!
//! 1. Caller-supplied important keywords are cut out first with a
//!    leftmost-longest Aho-Corasick scan. A keyword only matches when it is
//!    preceded by whitespace (or the start) and followed by a non-word
//!    character (or the end); matched phrases are emitted untouched.
//! 2. Everything else goes through a regex cascade: hyphen/apostrophe/dot
//!    words, `a&t` tokens, @-mentions, hashtags, numbers, word runs, and
//!    finally any single remaining symbol.
//!
//! Trailing punctuation is then stripped until none remains and empty tokens
//! are dropped. Re-tokenizing the space-joined output yields the same tokens.

use aho_corasick::{AhoCorasick, AhoCorasickBuilder, MatchKind};
use itertools::Itertools;
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Layered token cascade, tried left to right at every position
const TOKEN_CASCADE: &str = concat!(
    r"(?:[a-z][a-z'\-.]+[a-z])",       // words containing "'", "-" or "."
    r"|(?:\w+&\w+)",                   // at&t
    r"|(?:@\w+)",                      // @-mentions
    r"|(?:#+\w+[\w'\-]*\w+)",          // hashtags
    r"|(?:(?:\d+,?)+(?:\.?\d+)?)",     // numbers
    r"|(?:\w+)",                       // other words
    r"|(?:\S)",                        // anything else
);

/// Links are dropped before tokenization
const LINK_PATTERN: &str = r"(?:https?|ftps?)://\S+";

/// Multi-character markup replaced before single characters
const STRUCTURAL_SEQUENCES: &[&str] = &["<<->>", "->>", "=>", "->", "==", "%20"];

/// Single markup characters replaced by a space
const STRUCTURAL_CHARS: &[char] = &[
    '(', ')', '[', ']', '{', '}', '"', '“', '”', '<', '>', '\\', '|', '=', ';', ',', '!', '?', '*',
    '_',
];

/// Characters stripped from the end of a token
const TAILING_PUNCTUATION: &[char] = &['.', ',', '\'', '-', '!', ':', ';', '"', '?', '/', '(', ')', '~'];

#[derive(Debug, Error)]
pub enum TokenizerError
{
    #[error("invalid token pattern: {0}")]
    Pattern(#[from] regex::Error),

    #[error("invalid important keyword set: {0}")]
    Keywords(#[from] aho_corasick::BuildError),
}

/// Language tag selecting abbreviation and transliteration rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Language
{
    #[default]
    En,
    De,
    /// No language rules and no built-in stopwords
    Other,
}

impl Language
{
    /// Abbreviation removal and transliteration on already lowercased text
    pub fn normalize(
        self,
        text: &str,
    ) -> String
    {
        match self
        {
            Language::En => remove_to_fixpoint(text, &["e.g.", "i.e.", "in order to"]),
            Language::De =>
            {
                let transliterated = text
                    .replace('ß', "ss")
                    .replace('ä', "ae")
                    .replace('ö', "oe")
                    .replace('ü', "ue");
                remove_to_fixpoint(&transliterated, &["z.b."])
            }
            Language::Other => text.to_string(),
        }
    }
}

/// Remove every pattern repeatedly until the text stops changing.
/// Whitespace is collapsed between rounds so removals cannot leave a
/// pattern behind that only differs by spacing.
fn remove_to_fixpoint(
    text: &str,
    patterns: &[&str],
) -> String
{
    let mut current = collapse_whitespace(text);
    loop
    {
        let mut next = current.clone();
        for p in patterns
        {
            next = next.replace(p, " ");
        }
        let next = collapse_whitespace(&next);
        if next == current
        {
            return current;
        }
        current = next;
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String
{
    text.split_whitespace()
        .join(" ")
}

/// Strip trailing punctuation repeatedly ("foo.)" -> "foo")
pub fn strip_tailing_punctuation(token: &str) -> &str
{
    token.trim_end_matches(TAILING_PUNCTUATION)
}

/// A piece of input text either protected as an important keyword or left
/// for the general cascade
#[derive(Debug, PartialEq, Eq)]
enum Segment<'a>
{
    Protected(&'a str),
    Plain(&'a str),
}

pub struct Tokenizer
{
    lang: Language,
    cascade: Regex,
    links: Regex,

    /// Lowercased important keywords, longest first
    important: Vec<String>,

    /// Matcher over `important`; absent when no keywords were supplied
    matcher: Option<AhoCorasick>,
}

impl Tokenizer
{
    pub fn new(
        important_keywords: &[String],
        lang: Language,
    ) -> Result<Self, TokenizerError>
    {
        let important: Vec<String> = important_keywords
            .iter()
            .map(|k| {
                k.trim()
                    .to_lowercase()
            })
            .filter(|k| !k.is_empty())
            .unique()
            .sorted_by(|a, b| {
                b.len()
                    .cmp(&a.len())
                    .then_with(|| a.cmp(b))
            })
            .collect();

        let matcher = if important.is_empty()
        {
            None
        }
        else
        {
            Some(
                AhoCorasickBuilder::new()
                    .match_kind(MatchKind::LeftmostLongest)
                    .build(&important)?,
            )
        };

        Ok(Self {
            lang,
            cascade: Regex::new(TOKEN_CASCADE)?,
            links: Regex::new(LINK_PATTERN)?,
            important,
            matcher,
        })
    }

    /// Important keywords in the order the matcher prefers them
    pub fn important_keywords(&self) -> &[String]
    {
        &self.important
    }

    /// Tokenize one raw text into normalized tokens
    pub fn tokenize(
        &self,
        text: &str,
    ) -> Vec<String>
    {
        let prepared = self.prepare(text);
        let mut tokens = Vec::new();

        for segment in self.segments(&prepared)
        {
            match segment
            {
                Segment::Protected(keyword) => tokens.push(keyword.to_string()),
                Segment::Plain(chunk) =>
                {
                    tokens.extend(
                        self.cascade
                            .find_iter(chunk)
                            .map(|m| strip_tailing_punctuation(m.as_str().trim()))
                            .filter(|t| !t.is_empty())
                            .map(str::to_string),
                    );
                }
            }
        }

        tokens
    }

    /// Lowercase, apply language rules, drop links and markup
    fn prepare(
        &self,
        text: &str,
    ) -> String
    {
        let mut s = text.to_lowercase();
        if self.lang == Language::En
        {
            s = s.replace("'s", "");
        }

        let mut s = self
            .links
            .replace_all(&s, " ")
            .into_owned();

        for seq in STRUCTURAL_SEQUENCES
        {
            s = s.replace(seq, " ");
        }
        let s: String = s
            .chars()
            .map(|c| if STRUCTURAL_CHARS.contains(&c) { ' ' } else { c })
            .collect();

        self.lang
            .normalize(&s)
    }

    /// Split prepared text into protected keyword hits and plain chunks
    fn segments<'a>(
        &self,
        text: &'a str,
    ) -> Vec<Segment<'a>>
    {
        let Some(matcher) = &self.matcher
        else
        {
            return vec![Segment::Plain(text)];
        };

        let mut out = Vec::new();
        let mut last = 0;

        for m in matcher.find_iter(text)
        {
            let (start, end) = (m.start(), m.end());
            if !boundary_before(text, start) || !boundary_after(text, end)
            {
                continue;
            }
            if start > last
            {
                out.push(Segment::Plain(&text[last..start]));
            }
            out.push(Segment::Protected(&text[start..end]));
            last = end;
        }

        if last < text.len()
        {
            out.push(Segment::Plain(&text[last..]));
        }
        out
    }
}

fn boundary_before(
    text: &str,
    start: usize,
) -> bool
{
    text[..start]
        .chars()
        .next_back()
        .is_none_or(char::is_whitespace)
}

fn boundary_after(
    text: &str,
    end: usize,
) -> bool
{
    text[end..]
        .chars()
        .next()
        .is_none_or(|c| !(c.is_alphanumeric() || c == '_'))
}
