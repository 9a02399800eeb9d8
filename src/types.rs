//! Core types for quizpack-harvest
//!
//! Wire payloads ([`RecordPayload`], [`OptionPayload`]) are validated once at the API
//! boundary into the domain types the pipeline works with ([`Record`], [`OptionSet`]).

use serde::{Deserialize, Deserializer, Serialize};
use std::path::PathBuf;

/// Opaque identifier of one fetchable quizpack (a bundle of records)
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QuizpackKey(pub String);

impl QuizpackKey {
    /// Create a new key
    pub fn new(key: impl Into<String>) -> Self {
        Self(key.into())
    }

    /// Borrow the key text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for QuizpackKey {
    fn from(key: &str) -> Self {
        Self(key.to_string())
    }
}

impl From<String> for QuizpackKey {
    fn from(key: String) -> Self {
        Self(key)
    }
}

impl std::fmt::Display for QuizpackKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// One harvested question, with every field trimmed
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct Record {
    /// Question ID (never empty)
    pub id: String,
    /// Question text
    pub question: String,
    /// Canonical answer
    pub answer: String,
    /// Question type code
    pub type_code: String,
    /// Obsolete flag as sent by the server
    pub obsolete: String,
    /// Favourite flag as sent by the server
    pub fav: String,
    /// Publish date as a numeric timestamp, in its textual form
    pub publish_date: String,
    /// Human-readable publish date
    pub publish_date_str: String,
    /// Question author
    pub author_name: String,
    /// Free-form user tags
    pub user_tags: String,
    /// Image URL
    pub image_src: String,
}

/// A record as it arrives inside a quizpack's `data` array
///
/// Every field is optional and tolerant of non-string scalars; [`RecordPayload::into_record`]
/// turns it into a [`Record`].
#[derive(Clone, Debug, Default, Deserialize)]
pub struct RecordPayload {
    #[serde(default, deserialize_with = "lenient_text")]
    id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    question: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    answer: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    type_code: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    obsolete: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    fav: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    publish_date: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    publish_date_str: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    author_name: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    user_tags: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    image_src1: Option<String>,
}

impl RecordPayload {
    /// Trim every field; returns `None` when the ID is missing or blank
    pub fn into_record(self) -> Option<Record> {
        let id = trimmed(self.id);
        if id.is_empty() {
            return None;
        }
        Some(Record {
            id,
            question: trimmed(self.question),
            answer: trimmed(self.answer),
            type_code: trimmed(self.type_code),
            obsolete: trimmed(self.obsolete),
            fav: trimmed(self.fav),
            publish_date: trimmed(self.publish_date),
            publish_date_str: trimmed(self.publish_date_str),
            author_name: trimmed(self.author_name),
            user_tags: trimmed(self.user_tags),
            image_src: trimmed(self.image_src1),
        })
    }
}

/// Maximum number of answer options a question can carry
pub const MAX_OPTIONS: usize = 6;

/// Option lookup response: six positional option slots plus long and short answers
#[derive(Clone, Debug, Default, Deserialize)]
pub struct OptionPayload {
    /// Option slot 1
    #[serde(default, deserialize_with = "lenient_text")]
    pub option1: Option<String>,
    /// Option slot 2
    #[serde(default, deserialize_with = "lenient_text")]
    pub option2: Option<String>,
    /// Option slot 3
    #[serde(default, deserialize_with = "lenient_text")]
    pub option3: Option<String>,
    /// Option slot 4
    #[serde(default, deserialize_with = "lenient_text")]
    pub option4: Option<String>,
    /// Option slot 5
    #[serde(default, deserialize_with = "lenient_text")]
    pub option5: Option<String>,
    /// Option slot 6
    #[serde(default, deserialize_with = "lenient_text")]
    pub option6: Option<String>,
    /// Long-form answer
    #[serde(default, deserialize_with = "lenient_text")]
    pub long_answer: Option<String>,
    /// Short-form answer
    #[serde(default, deserialize_with = "lenient_text")]
    pub short_answer: Option<String>,
}

impl OptionPayload {
    /// Drop empty or whitespace-only slots, keeping the rest in positional order
    pub fn into_option_set(self) -> OptionSet {
        let options = [
            self.option1,
            self.option2,
            self.option3,
            self.option4,
            self.option5,
            self.option6,
        ]
        .into_iter()
        .map(trimmed)
        .filter(|o| !o.is_empty())
        .collect();

        OptionSet {
            options,
            long_answer: trimmed(self.long_answer),
            short_answer: trimmed(self.short_answer),
        }
    }
}

/// Records of one quizpack, with the count of items dropped for lacking an ID
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuizpackBatch {
    /// Records in response order
    pub records: Vec<Record>,
    /// Items the response carried without a usable ID
    pub skipped: usize,
}

impl From<Vec<Record>> for QuizpackBatch {
    fn from(records: Vec<Record>) -> Self {
        Self {
            records,
            skipped: 0,
        }
    }
}

/// Answer options and long/short answers for one question
///
/// The default value (no options, empty answers) stands in when the lookup fails.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize)]
pub struct OptionSet {
    /// Up to [`MAX_OPTIONS`] non-empty options, in source order
    pub options: Vec<String>,
    /// Long-form answer (may be empty)
    pub long_answer: String,
    /// Short-form answer (may be empty)
    pub short_answer: String,
}

/// A record merged with its options, ready to be written
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EnrichedRow {
    record: Record,
    options: OptionSet,
    additional_info: String,
}

impl EnrichedRow {
    /// Merge a record with its option set and derive `additional_info`
    ///
    /// `additional_info` is the long answer unless it repeats the short answer or the
    /// record's own answer, in which case it is empty.
    pub fn merge(record: Record, options: OptionSet) -> Self {
        let additional_info = if options.long_answer == options.short_answer
            || options.long_answer == record.answer
        {
            String::new()
        } else {
            options.long_answer.clone()
        };
        Self {
            record,
            options,
            additional_info,
        }
    }

    /// The underlying record
    pub fn record(&self) -> &Record {
        &self.record
    }

    /// The option set the record was enriched with
    pub fn options(&self) -> &OptionSet {
        &self.options
    }

    /// Derived additional info (long answer when it adds something, else empty)
    pub fn additional_info(&self) -> &str {
        &self.additional_info
    }
}

/// Pipeline stage, attached to events and log lines
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Stage {
    /// Key discovery across category filters
    Discover,
    /// Batch fetch of quizpack records
    Fetch,
    /// Per-record option lookup
    Enrich,
    /// CSV serialization
    Write,
}

impl Stage {
    /// Lowercase stage name
    pub fn as_str(&self) -> &'static str {
        match self {
            Stage::Discover => "discover",
            Stage::Fetch => "fetch",
            Stage::Enrich => "enrich",
            Stage::Write => "write",
        }
    }
}

impl std::fmt::Display for Stage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Event emitted during a harvest run
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Event {
    /// Key discovery for one category filter succeeded
    KeysDiscovered {
        /// Category filter
        filter: String,
        /// Number of keys it yielded
        count: usize,
    },

    /// Keys already seen under an earlier filter were dropped
    DuplicateKeysSkipped {
        /// Number of keys dropped
        count: usize,
    },

    /// Fetching one quizpack failed; it contributes no records
    FetchFailed {
        /// Quizpack key
        key: QuizpackKey,
        /// Machine-readable error code (see [`crate::Error::code`])
        code: &'static str,
        /// Error message
        error: String,
    },

    /// Batch fetch stage finished
    RecordsFetched {
        /// Keys dispatched
        keys: usize,
        /// Keys whose fetch failed
        failed_keys: usize,
        /// Records collected from successful keys
        records: usize,
        /// Items dropped from successful keys because they carried no ID
        skipped_items: usize,
    },

    /// Option lookup for one record failed; the record keeps an empty option set
    EnrichFailed {
        /// Record ID
        record_id: String,
        /// Machine-readable error code (see [`crate::Error::code`])
        code: &'static str,
        /// Error message
        error: String,
    },

    /// Enrichment progress
    Progress {
        /// Completed lookups
        completed: usize,
        /// Lookups dispatched
        total: usize,
        /// Completion percentage (0.0 to 100.0)
        percent: f32,
    },

    /// Rows written to the output file
    Completed {
        /// Row count
        rows: usize,
        /// Output path
        path: PathBuf,
    },
}

impl Event {
    /// The stage that emitted this event
    pub fn stage(&self) -> Stage {
        match self {
            Event::KeysDiscovered { .. } | Event::DuplicateKeysSkipped { .. } => Stage::Discover,
            Event::FetchFailed { .. } | Event::RecordsFetched { .. } => Stage::Fetch,
            Event::EnrichFailed { .. } | Event::Progress { .. } => Stage::Enrich,
            Event::Completed { .. } => Stage::Write,
        }
    }
}

fn trimmed(value: Option<String>) -> String {
    value.map(|s| s.trim().to_string()).unwrap_or_default()
}

/// Accept any JSON scalar as text; null and absent become `None`
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        None | Some(serde_json::Value::Null) => None,
        Some(serde_json::Value::String(s)) => Some(s),
        Some(other) => Some(other.to_string()),
    })
}
