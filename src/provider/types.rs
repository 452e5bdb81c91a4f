//! Wire types for the VEP annotation endpoint.
//!
//! The provider returns a JSON array of per-allele objects. Required fields
//! are plain struct fields so a missing one fails deserialization (and is
//! reported as a malformed response) instead of crashing on field access;
//! optional fields are `Option` or defaulted.

use serde::{Deserialize, Serialize};

/// One element of the top-level VEP response array.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VepAllele {
    /// Genome assembly the coordinates refer to (e.g. "GRCh38").
    pub assembly_name: String,
    /// Chromosome or contig name (e.g. "6").
    pub seq_region_name: String,
    /// 1-based start coordinate.
    pub start: u64,
    /// 1-based end coordinate.
    pub end: u64,
    /// +1 or -1.
    pub strand: i8,
    /// Worst-impact consequence term across all overlapping transcripts.
    pub most_severe_consequence: String,
    /// Per-transcript consequences; absent and empty are equivalent.
    #[serde(default)]
    pub transcript_consequences: Vec<TranscriptConsequence>,
}

/// A single transcript consequence. Only the gene symbol is of interest here;
/// everything else the provider sends is ignored.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TranscriptConsequence {
    #[serde(default)]
    pub gene_symbol: Option<String>,
}

/// Error body the provider returns alongside non-2xx statuses.
#[derive(Debug, Clone, Deserialize)]
pub struct VepErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
