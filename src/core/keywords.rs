//! Keyword extraction over a batch of requirements.
//!
//! Pipeline per requirement (order matters):
//! lowercase → language rules → link + markup stripping → tokenize →
//! [`TokenFilter`] → synonym canonicalization → stopword removal.
//!
//! The raw `summary` is never touched; the cleaned text lands in
//! `normalized_summary` and the surviving tokens in `tokens`.

use std::{collections::HashMap, path::PathBuf};

use anyhow::{Context, Result};
use indexmap::{IndexMap, IndexSet};
use regex::Regex;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument};

use crate::core::{
    filters::TokenFilter,
    requirement::Requirement,
    stopwords::StopwordSet,
    tokenizer::{Language, Tokenizer, collapse_whitespace},
};

/// Old word → canonical word
const SYNONYMS: &[(&str, &str)] = &[
    ("building", "builds"),
    ("build", "builds"),
    ("built", "builds"),
    ("crash", "crashes"),
    ("crashed", "crashes"),
    ("crashing", "crashes"),
    ("exceptions", "exception"),
    ("errors", "error"),
    ("failing", "fails"),
    ("failed", "fails"),
    ("fail", "fails"),
    ("tests", "test"),
    ("testing", "test"),
];

/// Markup sequences replaced before single characters
const STRUCTURAL_SEQUENCES: &[&str] = &["'s", "<<->>", "->>", "=>", "->", "==", "%20"];

const STRUCTURAL_CHARS: &[char] = &[
    '!', ',', '?', ':', ';', '&', '(', ')', '_', '[', ']', '{', '}', '\'', '"', '“', '/', '<', '>',
    '\\',
];

const LINK_PATTERN: &str = r"(?:https?|ftps?)://\S+";

/// How summaries are split into tokens
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenizeMode
{
    /// Plain whitespace split after markup stripping
    #[default]
    Whitespace,
    /// Full regex cascade with important keyword protection
    Regex,
}

/// Extractor settings (the `[keywords]` config section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct KeywordConfig
{
    pub language: Language,
    pub tokenizer: TokenizeMode,

    /// Tokens kept even when shorter than two characters
    pub keep_tokens: Vec<String>,

    /// Dataset-specific stopwords, one per line
    pub stopwords_file: Option<PathBuf>,

    /// Phrases the regex tokenizer must not split
    pub important_keywords: Vec<String>,
}

impl Default for KeywordConfig
{
    fn default() -> Self
    {
        Self {
            language: Language::En,
            tokenizer: TokenizeMode::Whitespace,
            keep_tokens: vec!["c".to_string()],
            stopwords_file: None,
            important_keywords: Vec::new(),
        }
    }
}

pub struct KeywordExtractor
{
    lang: Language,
    filter: TokenFilter,
    stopwords: StopwordSet,
    synonyms: HashMap<&'static str, &'static str>,
    links: Regex,

    /// Present in `TokenizeMode::Regex`
    tokenizer: Option<Tokenizer>,
}

impl KeywordExtractor
{
    pub fn new(config: &KeywordConfig) -> Result<Self>
    {
        let mut stopwords = StopwordSet::for_language(config.language);
        if let Some(path) = &config.stopwords_file
        {
            stopwords = stopwords.with_file(path)?;
        }

        let tokenizer = match config.tokenizer
        {
            TokenizeMode::Whitespace => None,
            TokenizeMode::Regex => Some(
                Tokenizer::new(&config.important_keywords, config.language)
                    .context("Failed to build tokenizer")?,
            ),
        };

        Ok(Self {
            lang: config.language,
            filter: TokenFilter::new(
                config
                    .keep_tokens
                    .iter()
                    .cloned(),
            ),
            stopwords,
            synonyms: SYNONYMS
                .iter()
                .copied()
                .collect(),
            links: Regex::new(LINK_PATTERN)?,
            tokenizer,
        })
    }

    /// Extract keywords from a batch, rewriting each requirement's tokens.
    /// Returns the unique tokens of the batch in first-seen order.
    #[instrument(level = "debug", skip_all, fields(requirements = requirements.len()))]
    pub fn extract(
        &self,
        requirements: &mut [Requirement],
    ) -> IndexSet<String>
    {
        if requirements.is_empty()
        {
            return IndexSet::new();
        }

        let mut n_tokens = 0usize;
        for r in requirements.iter_mut()
        {
            r.normalized_summary = self.normalize(&r.summary);
            let raw = match &self.tokenizer
            {
                Some(t) => t.tokenize(&r.summary),
                None => r
                    .normalized_summary
                    .split_whitespace()
                    .map(str::to_string)
                    .collect(),
            };
            n_tokens += raw.len();
            r.tokens = self.refine(&raw);
        }

        let unique: IndexSet<String> = requirements
            .iter()
            .flat_map(|r| {
                r.tokens
                    .iter()
                    .cloned()
            })
            .collect();
        info!(keywords = unique.len(), "Extracted unique keywords");

        let n_kept: usize = requirements
            .iter()
            .map(|r| {
                r.tokens
                    .len()
            })
            .sum();
        if n_tokens > 0
        {
            let removed = n_tokens.saturating_sub(n_kept);
            let pct = (removed as f64 / n_tokens as f64 * 100.0).round();
            debug!("Removed {removed} ({pct}%) of {n_tokens} tokens");
        }

        unique
    }

    /// Lowercase, apply language rules, strip links and markup
    fn normalize(
        &self,
        summary: &str,
    ) -> String
    {
        let lowered = summary.to_lowercase();
        let mut s = self
            .links
            .replace_all(&self.lang.normalize(&lowered), " ")
            .into_owned();
        for seq in STRUCTURAL_SEQUENCES
        {
            s = s.replace(seq, " ");
        }
        let s: String = s
            .chars()
            .map(|c| if STRUCTURAL_CHARS.contains(&c) { ' ' } else { c })
            .collect();
        collapse_whitespace(&s)
    }

    /// Filter, canonicalize synonyms, drop stopwords
    fn refine(
        &self,
        raw: &[String],
    ) -> Vec<String>
    {
        self.filter
            .apply(raw)
            .into_iter()
            .map(|t| match self.synonyms.get(t.as_str())
            {
                Some(canonical) => canonical.to_string(),
                None => t,
            })
            .filter(|t| !self.stopwords.contains(t))
            .collect()
    }
}

/// Token frequencies over a batch, in first-seen order
pub fn keyword_frequencies(requirements: &[Requirement]) -> IndexMap<String, usize>
{
    let mut freq: IndexMap<String, usize> = IndexMap::new();
    for token in requirements
        .iter()
        .flat_map(|r| r.tokens.iter())
    {
        *freq
            .entry(token.clone())
            .or_insert(0) += 1;
    }
    freq
}
