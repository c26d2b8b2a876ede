//! Write destinations
//!
//! The closed set of logical tables the coalescer buffers for. Each
//! destination owns one queue and one `RecordCodec`.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::codec::{FieldCodec, FieldSpec, RecordCodec};

/// Logical target table for a record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Destination {
    /// Trace headers
    Traces,
    /// Spans, generations and events
    Observations,
    /// Evaluation scores
    Scores,
    /// Dataset run links
    DatasetRunItems,
    /// Blob export bookkeeping
    BlobStorageFileLog,
}

static TRACES_CODEC: FieldCodec = FieldCodec::new(&[
    FieldSpec::json("input"),
    FieldSpec::json("output"),
    FieldSpec::map("metadata"),
]);

static OBSERVATIONS_CODEC: FieldCodec = FieldCodec::new(&[
    FieldSpec::json("input"),
    FieldSpec::json("output"),
    FieldSpec::map("metadata"),
]);

static SCORES_CODEC: FieldCodec =
    FieldCodec::new(&[FieldSpec::text("comment"), FieldSpec::map("metadata")]);

static DATASET_RUN_ITEMS_CODEC: FieldCodec = FieldCodec::new(&[
    FieldSpec::json("dataset_item_input"),
    FieldSpec::json("dataset_item_expected_output"),
    FieldSpec::map("dataset_item_metadata"),
]);

static BLOB_STORAGE_FILE_LOG_CODEC: FieldCodec = FieldCodec::new(&[]);

impl Destination {
    /// Number of destinations
    pub const COUNT: usize = 5;

    /// Every destination, in index order
    pub const ALL: [Destination; Self::COUNT] = [
        Self::Traces,
        Self::Observations,
        Self::Scores,
        Self::DatasetRunItems,
        Self::BlobStorageFileLog,
    ];

    /// Position in `ALL`, used to index per-destination arrays
    #[inline]
    pub const fn index(self) -> usize {
        match self {
            Self::Traces => 0,
            Self::Observations => 1,
            Self::Scores => 2,
            Self::DatasetRunItems => 3,
            Self::BlobStorageFileLog => 4,
        }
    }

    /// Destination tag, also the default table name
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Traces => "traces",
            Self::Observations => "observations",
            Self::Scores => "scores",
            Self::DatasetRunItems => "dataset_run_items",
            Self::BlobStorageFileLog => "blob_storage_file_log",
        }
    }

    /// Codec describing this destination's size-sensitive fields
    pub fn codec(self) -> &'static dyn RecordCodec {
        match self {
            Self::Traces => &TRACES_CODEC,
            Self::Observations => &OBSERVATIONS_CODEC,
            Self::Scores => &SCORES_CODEC,
            Self::DatasetRunItems => &DATASET_RUN_ITEMS_CODEC,
            Self::BlobStorageFileLog => &BLOB_STORAGE_FILE_LOG_CODEC,
        }
    }
}

impl fmt::Display for Destination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Unrecognized destination tag
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown destination '{0}'")]
pub struct UnknownDestination(pub String);

impl FromStr for Destination {
    type Err = UnknownDestination;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|d| d.as_str() == s)
            .ok_or_else(|| UnknownDestination(s.to_string()))
    }
}
