//! **reqrank** - Personalized prioritization of open issue-tracker requirements
//!
//! Learns a stakeholder profile from resolved issues, scores open candidates with a
//! content-based or a multi-attribute utility (MAUT) model, and re-ranks them with
//! explicit like/dislike/defer feedback. Results are cached per request fingerprint.

/// Command-line interface with clap integration
pub mod cli;

/// Shell completion generation
pub mod completion;

/// CLI command handlers (engine wiring, ranking, feedback)
pub mod cli_ext {
    /// Build the engine from config and global flags
    pub mod engine;

    /// `prioritize` and `chart`
    pub mod rank_cmd;

    /// `like`, `unlike`, `dislike`, `undislike`, `defer`, `delete-profile`
    pub mod feedback_cmd;
}

/// Core engine - text processing, profiles, scoring and orchestration
pub mod core {
    /// Issue records and the per-request working representation
    pub mod requirement;
    pub use requirement::{IssueId, RawIssue, Requirement};

    /// Regex-cascade tokenizer with important keyword protection
    pub mod tokenizer;
    pub use tokenizer::{Language, Tokenizer};

    /// Noise filter with version-number merging
    pub mod filters;
    pub use filters::TokenFilter;

    /// Built-in and dataset stopword lists
    pub mod stopwords;

    /// Batch keyword extraction and frequency tables
    pub mod keywords;
    pub use keywords::{KeywordConfig, KeywordExtractor};

    /// Stakeholder profiles from resolved-issue history
    pub mod profile;
    pub use profile::{UserProfile, UserProfileBuilder};

    /// Content-based and MAUT scoring, normalization
    pub mod scorer;
    pub use scorer::{ScoringConfig, ScoringStrategy};

    /// Requests and order-independent fingerprints
    pub mod request;
    pub use request::{Fingerprint, PrioritizationRequest};

    /// Like/dislike/defer records with self-expiring defers
    pub mod feedback;
    pub use feedback::FeedbackLedger;

    /// Persistent per-agent experiment variants
    pub mod version;
    pub use version::VersionBucketer;

    /// TTL + size bounded result and chart caches (moka)
    pub mod cache;
    pub use cache::ResultCache;

    /// Chart keys, URLs and keyword frequency data
    pub mod chart;

    /// Two-phase fetch, score and refetch pipeline
    pub mod prioritizer;
    pub use prioritizer::{Feedback, PrioritizationOutcome, Prioritizer, RankedRequirement};

    /// Error taxonomy surfaced to callers
    pub mod error;
    pub use error::PrioritizeError;
}

/// Infrastructure - tracker access, storage, time, configuration, logging
pub mod infra {
    /// Bug source interface, JSON dump adapter, parallel comment fetch
    pub mod source;
    pub use source::{BugQuery, BugSource, DumpBugSource, FetchError};

    /// Key-value feedback store (in-memory and atomic JSON file)
    pub mod store;
    pub use store::{JsonFileStore, MemoryStore, ProfileStore, StoreError};

    /// Clock seam for defer expiry and issue age
    pub mod clock;
    pub use clock::{Clock, FixedClock, SystemClock};

    /// Configuration management with TOML support
    pub mod config;
    pub use config::{Config, init as config_init, load_config};

    /// Tracing subscriber bootstrap
    pub mod logging;
}

// Strategic re-exports for clean CLI interface
pub use cli::{AppContext, Cli, Commands};
pub use core::{PrioritizationRequest, Prioritizer};
pub use infra::{Config, load_config};
