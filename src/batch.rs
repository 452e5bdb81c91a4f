//! Batch annotation over variant list files.
//!
//! Input is one variant per line; blank lines and `#` comments are skipped
//! and a UTF-8 BOM on the first line is tolerated (files exported from Excel
//! often carry one). Output is a fixed eight-column TSV, one row per input
//! variant in input order. A failed variant still produces a row, so the
//! output always lines up with the input.

use std::borrow::Cow;
use std::path::Path;
use std::time::{Duration, Instant};

use crate::annotate::AnnotationService;
use crate::error::AnnoError;
use crate::record::AnnotationRecord;

/// TSV header row.
pub const TSV_HEADER: &str =
    "variant\tassembly_name\tseq_region_name\tstart\tend\tmost_severe_consequence\tstrand\tgene_symbols";

const UTF8_BOM: &str = "\u{feff}";

/// Strip a UTF-8 BOM from the beginning of a string if present.
pub fn strip_bom(s: &str) -> &str {
    s.strip_prefix(UTF8_BOM).unwrap_or(s)
}

/// Strip a `#` comment and surrounding whitespace from a line.
pub fn strip_inline_comment(s: &str) -> &str {
    match s.find('#') {
        Some(pos) => s[..pos].trim(),
        None => s.trim(),
    }
}

/// Process one input line: trim, strip BOM on the first line, strip
/// comments. Returns `None` for lines with no variant on them.
pub fn process_input_line(line: &str, is_first_line: bool) -> Option<&str> {
    let line = line.trim();
    let line = if is_first_line { strip_bom(line) } else { line };
    let line = strip_inline_comment(line);

    if line.is_empty() {
        None
    } else {
        Some(line)
    }
}

/// Read a variant list file, applying line hygiene.
pub fn read_variants(path: impl AsRef<Path>) -> Result<Vec<String>, AnnoError> {
    let content = std::fs::read_to_string(path.as_ref())?;
    Ok(content
        .lines()
        .enumerate()
        .filter_map(|(i, line)| process_input_line(line, i == 0))
        .map(str::to_string)
        .collect())
}

/// Counts for one batch run.
#[derive(Debug, Clone)]
pub struct BatchSummary {
    /// Variants processed.
    pub total: usize,
    /// Rows with a successful annotation.
    pub annotated: usize,
    /// Rows carrying an error marker.
    pub failed: usize,
    /// Wall-clock time for the whole run.
    pub duration: Duration,
}

impl BatchSummary {
    /// Success rate as a percentage.
    pub fn success_rate(&self) -> f64 {
        if self.total == 0 {
            100.0
        } else {
            (self.annotated as f64 / self.total as f64) * 100.0
        }
    }

    /// Processing rate in variants per second, 0.0 when no time elapsed.
    pub fn variants_per_second(&self) -> f64 {
        let secs = self.duration.as_secs_f64();
        if secs < f64::EPSILON {
            0.0
        } else {
            self.total as f64 / secs
        }
    }
}

/// Echo the raw input into a TSV field. Interior tabs survive line hygiene
/// and would shift every later column, so they are flattened to spaces.
fn input_field(raw: &str) -> Cow<'_, str> {
    if raw.contains('\t') {
        Cow::Owned(raw.replace('\t', " "))
    } else {
        Cow::Borrowed(raw)
    }
}

/// Render one successful annotation as a TSV row.
pub fn record_row(raw: &str, record: &AnnotationRecord) -> String {
    format!(
        "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
        input_field(raw),
        record.assembly_name,
        record.seq_region_name,
        record.start,
        record.end,
        record.most_severe_consequence,
        record.strand,
        record.genes_joined()
    )
}

/// Render a failed lookup as a TSV row: the error kind goes in the second
/// column and the remaining columns stay empty, keeping the column count
/// constant across the file.
pub fn failure_row(raw: &str, error: &AnnoError) -> String {
    format!("{}\terror:{}\t\t\t\t\t\t", input_field(raw), error.kind())
}

/// Sequential batch annotation over an [`AnnotationService`].
///
/// Repeated variants in the input hit the service's cache, so a list with
/// duplicates costs one provider call per distinct variant.
pub struct BatchRunner {
    service: AnnotationService,
}

impl BatchRunner {
    /// Create a runner over `service`.
    pub fn new(service: AnnotationService) -> Self {
        Self { service }
    }

    /// Annotate `variants` in order and return the TSV rows (without the
    /// header) plus the run summary.
    pub async fn annotate(&self, variants: &[String]) -> (Vec<String>, BatchSummary) {
        let start = Instant::now();
        let mut rows = Vec::with_capacity(variants.len());
        let mut annotated = 0;
        let mut failed = 0;

        for raw in variants {
            match self.service.lookup(raw).await {
                Ok(record) => {
                    rows.push(record_row(raw, &record));
                    annotated += 1;
                }
                Err(error) => {
                    tracing::warn!(variant = %raw, kind = error.kind(), "annotation failed: {error}");
                    rows.push(failure_row(raw, &error));
                    failed += 1;
                }
            }
        }

        let summary = BatchSummary {
            total: variants.len(),
            annotated,
            failed,
            duration: start.elapsed(),
        };
        (rows, summary)
    }

    /// Annotate `variants` and render the complete TSV document, header
    /// included.
    pub async fn annotate_to_tsv(&self, variants: &[String]) -> (String, BatchSummary) {
        let (rows, summary) = self.annotate(variants).await;
        let mut out = String::with_capacity(rows.iter().map(|r| r.len() + 1).sum::<usize>() + 128);
        out.push_str(TSV_HEADER);
        out.push('\n');
        for row in rows {
            out.push_str(&row);
            out.push('\n');
        }
        (out, summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::CacheConfig;
    use crate::provider::types::{TranscriptConsequence, VepAllele};
    use crate::provider::MockProvider;
    use std::io::Write;
    use std::sync::Arc;

    fn allele() -> VepAllele {
        VepAllele {
            assembly_name: "GRCh38".to_string(),
            seq_region_name: "6".to_string(),
            start: 152387156,
            end: 152387156,
            strand: 1,
            most_severe_consequence: "synonymous_variant".to_string(),
            transcript_consequences: vec![TranscriptConsequence {
                gene_symbol: Some("SYNE1".to_string()),
            }],
        }
    }

    fn runner(provider: Arc<MockProvider>) -> BatchRunner {
        BatchRunner::new(AnnotationService::new(provider, CacheConfig::default()))
    }

    #[test]
    fn test_line_hygiene() {
        assert_eq!(process_input_line("variant", false), Some("variant"));
        assert_eq!(
            process_input_line("variant  # note", false),
            Some("variant")
        );
        assert_eq!(process_input_line("\u{feff}variant", true), Some("variant"));
        assert_eq!(process_input_line("", false), None);
        assert_eq!(process_input_line("   ", false), None);
        assert_eq!(process_input_line("# comment", false), None);
    }

    #[test]
    fn test_read_variants_skips_noise() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("variants.txt");
        let mut file = std::fs::File::create(&path).unwrap();
        write!(
            file,
            "\u{feff}NC_000006.12:g.152387156G>A\n\n# a comment\n  NC_000001.11:g.100A>G  # inline\n"
        )
        .unwrap();

        let variants = read_variants(&path).unwrap();
        assert_eq!(
            variants,
            vec![
                "NC_000006.12:g.152387156G>A".to_string(),
                "NC_000001.11:g.100A>G".to_string(),
            ]
        );
    }

    #[test]
    fn test_read_variants_missing_file() {
        let err = read_variants("/nonexistent/variants.txt").unwrap_err();
        assert!(matches!(err, AnnoError::Io { .. }));
    }

    #[test]
    fn test_header_has_eight_columns() {
        assert_eq!(TSV_HEADER.split('\t').count(), 8);
    }

    #[test]
    fn test_failure_row_keeps_column_count() {
        let row = failure_row("BAD INPUT", &AnnoError::invalid_input("nope"));
        assert_eq!(row.split('\t').count(), 8);
        assert!(row.starts_with("BAD INPUT\terror:invalid_input\t"));
    }

    #[tokio::test]
    async fn test_embedded_tab_in_input_keeps_column_count() {
        let raw = "NC_000001.11:g.100A>G\textra";

        let row = failure_row(raw, &AnnoError::invalid_input("nope"));
        assert_eq!(row.split('\t').count(), 8);
        assert!(row.starts_with("NC_000001.11:g.100A>G extra\terror:"));

        // Same guarantee end to end through the runner.
        let runner = runner(Arc::new(MockProvider::new()));
        let (rows, _) = runner.annotate(&[raw.to_string()]).await;
        assert_eq!(rows[0].split('\t').count(), 8);
    }

    #[tokio::test]
    async fn test_batch_rows_align_with_input() {
        let provider = Arc::new(MockProvider::new());
        provider.respond_with("NC_000006.12:g.152387156G>A", vec![allele()]);
        let runner = runner(Arc::clone(&provider));

        let variants = vec![
            "NC_000006.12:g.152387156G>A".to_string(),
            "NC_000099.1:g.5T>C".to_string(),
        ];
        let (rows, summary) = runner.annotate(&variants).await;

        assert_eq!(rows.len(), 2);
        assert_eq!(
            rows[0],
            "NC_000006.12:g.152387156G>A\tGRCh38\t6\t152387156\t152387156\tsynonymous_variant\t1\tSYNE1"
        );
        assert_eq!(rows[1], "NC_000099.1:g.5T>C\terror:not_found\t\t\t\t\t\t");
        assert_eq!(summary.total, 2);
        assert_eq!(summary.annotated, 1);
        assert_eq!(summary.failed, 1);
        assert!((summary.success_rate() - 50.0).abs() < 0.01);
    }

    #[tokio::test]
    async fn test_duplicates_share_one_fetch() {
        let provider = Arc::new(MockProvider::new());
        provider.respond_with("NC_000006.12:g.152387156G>A", vec![allele()]);
        let runner = runner(Arc::clone(&provider));

        let variants = vec![
            "NC_000006.12:g.152387156G>A".to_string(),
            "nc_000006.12:g.152387156g>a".to_string(),
            "NC_000006.12:g.152387156G>A".to_string(),
        ];
        let (rows, summary) = runner.annotate(&variants).await;

        assert_eq!(provider.fetch_count(), 1);
        assert_eq!(summary.annotated, 3);
        // Rows echo the raw input spelling, not the canonical form.
        assert!(rows[1].starts_with("nc_000006.12:g.152387156g>a\t"));
    }

    #[tokio::test]
    async fn test_tsv_document_shape() {
        let provider = Arc::new(MockProvider::new());
        provider.respond_with("NC_000006.12:g.152387156G>A", vec![allele()]);
        let runner = runner(provider);

        let variants = vec!["NC_000006.12:g.152387156G>A".to_string()];
        let (tsv, _) = runner.annotate_to_tsv(&variants).await;

        let lines: Vec<&str> = tsv.lines().collect();
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0], TSV_HEADER);
        assert!(tsv.ends_with('\n'));
    }

    #[tokio::test]
    async fn test_empty_batch() {
        let runner = runner(Arc::new(MockProvider::new()));
        let (rows, summary) = runner.annotate(&[]).await;
        assert!(rows.is_empty());
        assert_eq!(summary.total, 0);
        assert!((summary.success_rate() - 100.0).abs() < 0.01);
    }
}
