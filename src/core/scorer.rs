//! Priority scoring strategies.
//!
//! Two strategies share one entry point, [`score_batch`]:
//!
//! - **Content-based**: weighted share of the profile's keywords found in a
//!   requirement's tokens.
//! - **MAUT**: weighted sum of normalized signals (assignment, CC, linked
//!   changes, blocks, comments, keyword match, component belongingness,
//!   reward, optional severity/priority class, age), clamped at 0.
//!
//! Scoring is pure: it reads the batch and returns one raw score per
//! requirement. [`normalize`] then maps raw scores onto the output range.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::core::{profile::UserProfile, requirement::Requirement};

const W_ASSIGNED: f64 = 25.0;
const W_CC: f64 = 17.0;
const W_GERRIT: f64 = 22.0;
const W_BLOCKS: f64 = 14.0;
const W_COMMENTS: f64 = 19.0;
const W_KEYWORDS: f64 = 28.0;
const W_COMPONENT: f64 = 11.5;
const W_REWARD: f64 = 20.5;
const W_SEVERITY: f64 = 1.8;
const W_PRIORITY_CLASS: f64 = 2.2;
const W_AGE: f64 = -42.0;

/// Lower bound for every median denominator
const MEDIAN_FLOOR: f64 = 0.01;

/// Scoring strategy; the discriminant is the persisted experiment version
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ScoringStrategy
{
    Maut,
    ContentBased,
}

impl ScoringStrategy
{
    pub fn from_version(version: u8) -> Option<Self>
    {
        match version
        {
            0 => Some(ScoringStrategy::Maut),
            1 => Some(ScoringStrategy::ContentBased),
            _ => None,
        }
    }

    pub fn version(self) -> u8
    {
        match self
        {
            ScoringStrategy::Maut => 0,
            ScoringStrategy::ContentBased => 1,
        }
    }
}

/// Scoring settings (the `[scoring]` config section)
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScoringConfig
{
    /// Weight of a profile keyword the caller marked as preferred
    pub preferred_keyword_weight: f64,

    /// Enable the severity and priority-class MAUT dimensions
    pub severity_priority: bool,
}

impl Default for ScoringConfig
{
    fn default() -> Self
    {
        Self { preferred_keyword_weight: 3.0, severity_priority: false }
    }
}

/// Output convention for normalized priorities
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PriorityMode
{
    /// Fractional priorities, floor 0.01
    #[default]
    Float,
    /// Whole-number priorities, floor 1
    Integer,
}

impl PriorityMode
{
    pub fn floor(self) -> f64
    {
        match self
        {
            PriorityMode::Float => 0.01,
            PriorityMode::Integer => 1.0,
        }
    }
}

/// Batch statistics used as MAUT denominators
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MedianResults
{
    pub cc: f64,
    pub blocks: f64,
    pub gerrit_changes: f64,
    pub comments: f64,
    pub max_age_years: f64,
}

impl MedianResults
{
    pub fn over(
        requirements: &[Requirement],
        max_age_years: u32,
    ) -> Self
    {
        let of = |f: &dyn Fn(&Requirement) -> f64| {
            median(
                requirements
                    .iter()
                    .map(f)
                    .collect(),
            )
            .max(MEDIAN_FLOOR)
        };
        Self {
            cc: of(&|r| r.cc.len() as f64),
            blocks: of(&|r| r.blocks.len() as f64),
            gerrit_changes: of(&|r| r.see_also.len() as f64),
            comments: of(&|r| r.number_of_comments.unwrap_or(0) as f64),
            max_age_years: f64::from(max_age_years.max(1)),
        }
    }
}

/// Median with the mean of the two middle values for even counts; 0 when empty
pub fn median(mut values: Vec<f64>) -> f64
{
    if values.is_empty()
    {
        return 0.0;
    }
    values.sort_by(f64::total_cmp);
    let mid = values.len() / 2;
    if values.len() % 2 == 0
    {
        (values[mid - 1] + values[mid]) / 2.0
    }
    else
    {
        values[mid]
    }
}

/// Everything a scoring pass reads besides the batch itself
#[derive(Debug, Clone, Copy)]
pub struct ScoreContext<'a>
{
    pub assignee: &'a str,
    pub profile: &'a UserProfile,
    pub preferred_keywords: &'a [String],
    pub now: DateTime<Utc>,
    pub max_age_years: u32,
    pub reward_multiplier: f64,
    pub config: &'a ScoringConfig,
}

/// Raw scores of one pass, index-aligned with the batch
#[derive(Debug, Clone, PartialEq)]
pub struct BatchScore
{
    pub scores: Vec<f64>,

    /// Strategy actually used
    pub strategy: ScoringStrategy,

    /// Keyword signal had no spread; MAUT was forced without it
    pub redirected: bool,
}

/// Score every requirement of the batch with `strategy`
pub fn score_batch(
    strategy: ScoringStrategy,
    requirements: &[Requirement],
    ctx: &ScoreContext<'_>,
) -> BatchScore
{
    let content: Vec<f64> = requirements
        .iter()
        .map(|r| content_score(ctx.profile, ctx.preferred_keywords, ctx.config, r))
        .collect();

    let (min, max) = content
        .iter()
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), s| (lo.min(*s), hi.max(*s)));
    let degenerate = !requirements.is_empty() && max <= min;

    let (strategy, redirected) = if degenerate { (ScoringStrategy::Maut, true) } else { (strategy, false) };

    let scores = match strategy
    {
        ScoringStrategy::ContentBased => requirements
            .iter()
            .zip(&content)
            .map(|(r, s)| if r.reward { s * ctx.reward_multiplier } else { *s })
            .collect(),
        ScoringStrategy::Maut =>
        {
            let medians = MedianResults::over(requirements, ctx.max_age_years);
            requirements
                .iter()
                .zip(&content)
                .map(|(r, s)| {
                    let keyword_match = if degenerate { 0.0 } else { (s - min) / (max - min) };
                    maut_score(r, keyword_match, &medians, ctx)
                })
                .collect()
        }
    };

    BatchScore { scores, strategy, redirected }
}

/// Share of profile keywords present in the requirement, weighted.
///
/// A keyword counts with `preferred_keyword_weight` only when it equals a
/// caller keyword verbatim; caller keywords are not normalized, so mixed-case
/// input never matches.
pub fn content_score(
    profile: &UserProfile,
    preferred_keywords: &[String],
    config: &ScoringConfig,
    requirement: &Requirement,
) -> f64
{
    let n = profile.keyword_count();
    if n == 0
    {
        return 0.0;
    }
    let hits: f64 = profile
        .keywords()
        .filter(|k| requirement.contains_token(k))
        .map(|k| {
            if preferred_keywords
                .iter()
                .any(|p| p == k)
            {
                config.preferred_keyword_weight
            }
            else
            {
                1.0
            }
        })
        .sum();
    hits / n as f64
}

/// MAUT utility of one requirement; never negative.
/// The reward dimension is added after the clamp so a liked requirement
/// always outranks its unliked twin.
fn maut_score(
    r: &Requirement,
    keyword_match: f64,
    medians: &MedianResults,
    ctx: &ScoreContext<'_>,
) -> f64
{
    let ratio = |count: f64, median: f64| (count / (2.0 * median)).min(1.0);

    let assigned = if r.assigned_to == ctx.assignee { 1.0 } else { 0.0 };
    let cc = ratio(r.cc.len() as f64, medians.cc);
    let gerrit = ratio(r.see_also.len() as f64, medians.gerrit_changes);
    let blocks = ratio(r.blocks.len() as f64, medians.blocks);
    let comments = r
        .number_of_comments
        .map_or(0.0, |n| ratio(n as f64, medians.comments));
    let component = ctx
        .profile
        .component_share(&r.component);
    let age = (r.age_years(ctx.now) / medians.max_age_years).min(1.0);

    let mut sum = assigned * W_ASSIGNED
        + cc * W_CC
        + gerrit * W_GERRIT
        + blocks * W_BLOCKS
        + comments * W_COMMENTS
        + keyword_match * W_KEYWORDS
        + component * W_COMPONENT
        + age * W_AGE;

    if ctx
        .config
        .severity_priority
    {
        sum += severity_rank(r.severity.as_deref()) * W_SEVERITY
            + priority_class_rank(r.priority_class.as_deref()) * W_PRIORITY_CLASS;
    }

    let reward = if r.reward { W_REWARD } else { 0.0 };
    sum.max(0.0) + reward
}

/// Ordinal severity in [0, 1]
fn severity_rank(severity: Option<&str>) -> f64
{
    match severity
        .map(str::to_ascii_lowercase)
        .as_deref()
    {
        Some("blocker") => 1.0,
        Some("critical") => 0.8,
        Some("major") => 0.6,
        Some("normal") => 0.4,
        Some("minor") => 0.2,
        Some("trivial") => 0.1,
        _ => 0.0,
    }
}

/// Ordinal tracker priority in [0, 1], P1 highest
fn priority_class_rank(priority: Option<&str>) -> f64
{
    match priority.map(str::to_ascii_uppercase).as_deref()
    {
        Some("P1") => 1.0,
        Some("P2") => 0.75,
        Some("P3") => 0.5,
        Some("P4") => 0.25,
        _ => 0.0,
    }
}

/// Map raw scores onto `[1, 100]` relative to the batch maximum, or all to
/// 1.0 when nothing scored. The maximum maps to exactly 100. Integer mode
/// rounds.
pub fn normalize(
    scores: &[f64],
    mode: PriorityMode,
) -> Vec<f64>
{
    let max = scores
        .iter()
        .copied()
        .fold(0.0_f64, f64::max);
    scores
        .iter()
        .map(|s| {
            let v = if max <= 0.0
            {
                1.0
            }
            else if *s >= max
            {
                100.0
            }
            else
            {
                (s * 100.0 / max).max(1.0)
            };
            match mode
            {
                PriorityMode::Float => v,
                PriorityMode::Integer => v.round(),
            }
        })
        .collect()
}

#[cfg(test)]
mod tests
{
    use chrono::{Duration, TimeZone};
    use indexmap::IndexMap;
    use proptest::prelude::*;

    use super::*;
    use crate::core::requirement::RawIssue;

    fn now() -> DateTime<Utc>
    {
        Utc.with_ymd_and_hms(2020, 1, 1, 0, 0, 0)
            .unwrap()
    }

    fn req(
        id: u64,
        tokens: &[&str],
    ) -> Requirement
    {
        let mut r = Requirement::from(RawIssue {
            id,
            assigned_to: "someone@x.org".into(),
            summary: tokens.join(" "),
            product: "Platform".into(),
            component: "UI".into(),
            status: "NEW".into(),
            severity: None,
            priority: None,
            cc: vec![],
            blocks: vec![],
            see_also: vec![],
            target_milestone: None,
            creation_time: now() - Duration::days(30),
        });
        r.tokens = tokens
            .iter()
            .map(|t| t.to_string())
            .collect();
        r
    }

    fn profile(keywords: &[&str]) -> UserProfile
    {
        UserProfile {
            assignee: "me@x.org".into(),
            component_frequencies: IndexMap::from([("UI".to_string(), 3), ("Debug".to_string(), 1)]),
            keyword_frequencies: keywords
                .iter()
                .map(|k| (k.to_string(), 1))
                .collect(),
        }
    }

    fn ctx<'a>(
        profile: &'a UserProfile,
        preferred: &'a [String],
        config: &'a ScoringConfig,
    ) -> ScoreContext<'a>
    {
        ScoreContext {
            assignee: "me@x.org",
            profile,
            preferred_keywords: preferred,
            now: now(),
            max_age_years: 7,
            reward_multiplier: 5.0,
            config,
        }
    }

    #[test]
    fn median_matches_even_and_odd_conventions()
    {
        assert_eq!(median(vec![3.0, 1.0, 2.0]), 2.0);
        assert_eq!(median(vec![4.0, 1.0, 2.0, 3.0]), 2.5);
        assert_eq!(median(vec![]), 0.0);

        let batch = vec![req(1, &[]), req(2, &[])];
        let m = MedianResults::over(&batch, 7);
        assert_eq!(m.cc, 0.01);
        assert_eq!(m.max_age_years, 7.0);
    }

    #[test]
    fn content_score_is_keyword_share()
    {
        let p = profile(&["editor", "crashes", "save", "ui"]);
        let config = ScoringConfig::default();
        let r = req(1, &["editor", "crashes"]);
        assert_eq!(content_score(&p, &[], &config, &r), 0.5);
        assert_eq!(content_score(&UserProfile::default(), &[], &config, &r), 0.0);
    }

    #[test]
    fn preferred_weight_only_applies_on_verbatim_match()
    {
        let p = profile(&["editor", "crashes"]);
        let config = ScoringConfig::default();
        let r = req(1, &["editor"]);

        let exact = content_score(&p, &["editor".to_string()], &config, &r);
        assert_eq!(exact, 1.5);

        // Caller keywords are not normalized
        let mixed = content_score(&p, &["Editor".to_string()], &config, &r);
        assert_eq!(mixed, 0.5);
    }

    #[test]
    fn maut_ranks_keyword_matches_and_assignment_higher()
    {
        let p = profile(&["editor", "crashes"]);
        let config = ScoringConfig::default();
        let mut mine = req(1, &["editor", "crashes"]);
        mine.assigned_to = "me@x.org".into();
        let other = req(2, &["toolbar"]);

        let out = score_batch(ScoringStrategy::Maut, &[mine, other], &ctx(&p, &[], &config));
        assert!(!out.redirected);
        assert_eq!(out.strategy, ScoringStrategy::Maut);
        assert!(out.scores[0] > out.scores[1]);
        assert!(out.scores.iter().all(|s| *s >= 0.0));
    }

    #[test]
    fn uniform_keyword_signal_redirects_to_maut()
    {
        let p = UserProfile::default();
        let config = ScoringConfig::default();
        let batch = vec![req(1, &["editor"]), req(2, &["toolbar"])];

        let out = score_batch(ScoringStrategy::ContentBased, &batch, &ctx(&p, &[], &config));
        assert!(out.redirected);
        assert_eq!(out.strategy, ScoringStrategy::Maut);
    }

    #[test]
    fn old_issues_clamp_at_zero()
    {
        let p = profile(&["editor", "crashes"]);
        let config = ScoringConfig::default();
        let mut old = req(1, &["nothing"]);
        old.creation_time = now() - Duration::days(365 * 10);
        old.component = "Core".into();
        let fresh = req(2, &["editor"]);

        let out = score_batch(ScoringStrategy::Maut, &[old, fresh], &ctx(&p, &[], &config));
        assert_eq!(out.scores[0], 0.0);
    }

    #[test]
    fn reward_boosts_both_strategies()
    {
        let p = profile(&["editor", "crashes"]);
        let config = ScoringConfig::default();
        let plain = req(1, &["editor"]);
        let mut liked = req(2, &["editor"]);
        liked.reward = true;
        let filler = req(3, &["crashes", "editor"]);

        let batch = [plain, liked, filler];
        let maut = score_batch(ScoringStrategy::Maut, &batch, &ctx(&p, &[], &config));
        assert!((maut.scores[1] - maut.scores[0] - W_REWARD).abs() < 1e-9);

        let content = score_batch(ScoringStrategy::ContentBased, &batch, &ctx(&p, &[], &config));
        assert_eq!(content.scores[1], content.scores[0] * 5.0);
    }

    #[test]
    fn severity_dimensions_are_opt_in()
    {
        let p = profile(&["editor", "crashes"]);
        let off = ScoringConfig::default();
        let on = ScoringConfig { severity_priority: true, ..ScoringConfig::default() };
        let mut blocker = req(1, &["editor"]);
        blocker.severity = Some("blocker".into());
        blocker.priority_class = Some("P1".into());
        let batch = [blocker, req(2, &["crashes", "editor"])];

        let without = score_batch(ScoringStrategy::Maut, &batch, &ctx(&p, &[], &off));
        let with = score_batch(ScoringStrategy::Maut, &batch, &ctx(&p, &[], &on));
        assert!((with.scores[0] - without.scores[0] - (W_SEVERITY + W_PRIORITY_CLASS)).abs() < 1e-9);
        assert_eq!(with.scores[1], without.scores[1]);
    }

    #[test]
    fn normalization_scales_to_hundred()
    {
        assert_eq!(normalize(&[50.0, 25.0, 0.0], PriorityMode::Float), vec![100.0, 50.0, 1.0]);
        assert_eq!(normalize(&[0.0, 0.0], PriorityMode::Float), vec![1.0, 1.0]);
        assert_eq!(normalize(&[3.0, 1.0], PriorityMode::Integer), vec![100.0, 33.0]);
        assert!(normalize(&[], PriorityMode::Float).is_empty());
    }

    #[test]
    fn batch_maximum_is_exactly_hundred()
    {
        let max = 0.1 + 0.2;
        let out = normalize(&[max, 0.1, max], PriorityMode::Float);
        assert_eq!(out[0], 100.0);
        assert_eq!(out[2], 100.0);
        assert!(out[1] < 100.0);
    }

    #[test]
    fn version_mapping()
    {
        assert_eq!(ScoringStrategy::from_version(0), Some(ScoringStrategy::Maut));
        assert_eq!(ScoringStrategy::from_version(1), Some(ScoringStrategy::ContentBased));
        assert_eq!(ScoringStrategy::from_version(2), None);
        assert_eq!(ScoringStrategy::ContentBased.version(), 1);
    }

    proptest! {
        #[test]
        fn normalized_scores_stay_in_range(scores in prop::collection::vec(0.0f64..500.0, 1..40))
        {
            let out = normalize(&scores, PriorityMode::Float);
            let max = scores.iter().copied().fold(0.0, f64::max);
            if max > 0.0
            {
                prop_assert!(out.contains(&100.0));
            }
            for v in out
            {
                if max > 0.0
                {
                    prop_assert!((1.0..=100.0 + 1e-9).contains(&v));
                }
                else
                {
                    prop_assert_eq!(v, 1.0);
                }
            }
        }
    }
}
