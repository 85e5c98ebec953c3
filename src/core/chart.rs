//! Chart links and chart data.

use indexmap::IndexMap;
use itertools::Itertools;
use rand::Rng;

use crate::core::{profile::UserProfile, request::Fingerprint, requirement::IssueId};

const KEY_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const KEY_LEN: usize = 16;

/// Keyword → frequency table behind a chart, most frequent first
pub type ChartData = IndexMap<String, usize>;

/// Random public chart key of 16 characters from `[A-Z0-9]`
pub fn generate_chart_key<R: Rng + ?Sized>(rng: &mut R) -> String
{
    (0..KEY_LEN)
        .map(|_| KEY_ALPHABET[rng.random_range(0..KEY_ALPHABET.len())] as char)
        .collect()
}

pub fn chart_url(
    base_url: &str,
    key: &str,
) -> String
{
    format!("{}/chart/c/{key}", base_url.trim_end_matches('/'))
}

/// Chart key at the end of a chart URL
pub fn chart_key_of(url: &str) -> &str
{
    url.rsplit('/')
        .next()
        .unwrap_or(url)
}

/// Link to one ranked issue, carrying the request fingerprint
pub fn view_url(
    base_url: &str,
    id: IssueId,
    fingerprint: &Fingerprint,
) -> String
{
    format!(
        "{}/view/i/{id}/k/{}",
        base_url.trim_end_matches('/'),
        urlencoding::encode(fingerprint.as_str())
    )
}

/// Profile keyword frequencies ordered by count, ties in first-seen order
pub fn chart_data(profile: &UserProfile) -> ChartData
{
    profile
        .keyword_frequencies
        .iter()
        .sorted_by(|a, b| b.1.cmp(a.1))
        .map(|(k, n)| (k.clone(), *n))
        .collect()
}
