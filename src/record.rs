//! The normalized annotation result.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::error::AnnoError;
use crate::key::VariantKey;
use crate::provider::types::VepAllele;

/// Normalized annotation for one variant.
///
/// Immutable once constructed; the cache shares it with any number of
/// concurrent readers behind an `Arc`. Serializes to the eight-field JSON
/// object the web front end returns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnnotationRecord {
    /// The canonical variant string this record answers for.
    pub input: String,
    /// Genome assembly name (e.g. "GRCh38").
    pub assembly_name: String,
    /// Chromosome or contig name.
    pub seq_region_name: String,
    /// 1-based start coordinate.
    pub start: u64,
    /// 1-based end coordinate (start <= end).
    pub end: u64,
    /// Worst-impact consequence term.
    pub most_severe_consequence: String,
    /// +1 or -1.
    pub strand: i8,
    /// Unique gene symbols across all transcript consequences, sorted.
    pub genes: Vec<String>,
}

impl AnnotationRecord {
    /// Map a provider response onto a record.
    ///
    /// Uses the first top-level allele; additional elements are ignored.
    /// Gene symbols are deduplicated and sorted, and entries with a
    /// missing or empty symbol are skipped. Shape violations (empty
    /// required strings, start > end, strand outside {1, -1}) are reported
    /// as `MalformedResponse`.
    pub fn from_alleles(key: &VariantKey, alleles: &[VepAllele]) -> Result<Self, AnnoError> {
        let allele = alleles.first().ok_or_else(|| AnnoError::NotFound {
            variant: key.canonical().to_string(),
        })?;

        if allele.assembly_name.is_empty() {
            return Err(AnnoError::malformed("empty assembly_name"));
        }
        if allele.seq_region_name.is_empty() {
            return Err(AnnoError::malformed("empty seq_region_name"));
        }
        if allele.most_severe_consequence.is_empty() {
            return Err(AnnoError::malformed("empty most_severe_consequence"));
        }
        if allele.start > allele.end {
            return Err(AnnoError::malformed(format!(
                "start {} greater than end {}",
                allele.start, allele.end
            )));
        }
        if allele.strand != 1 && allele.strand != -1 {
            return Err(AnnoError::malformed(format!(
                "strand must be 1 or -1, got {}",
                allele.strand
            )));
        }

        // BTreeSet gives dedup and deterministic order in one pass.
        let genes: BTreeSet<String> = allele
            .transcript_consequences
            .iter()
            .filter_map(|tc| tc.gene_symbol.as_deref())
            .filter(|symbol| !symbol.is_empty())
            .map(str::to_string)
            .collect();

        Ok(Self {
            input: key.canonical().to_string(),
            assembly_name: allele.assembly_name.clone(),
            seq_region_name: allele.seq_region_name.clone(),
            start: allele.start,
            end: allele.end,
            most_severe_consequence: allele.most_severe_consequence.clone(),
            strand: allele.strand,
            genes: genes.into_iter().collect(),
        })
    }

    /// Genes as the comma-joined list used in TSV output.
    pub fn genes_joined(&self) -> String {
        self.genes.join(",")
    }
}
