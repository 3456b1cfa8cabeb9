use csv::{QuoteStyle, WriterBuilder};
use thiserror::Error;

use crate::record::ScoredRecord;

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("CSV write error: {0}")]
    Csv(#[from] csv::Error),
    #[error("CSV output was not valid UTF-8: {0}")]
    Utf8(#[from] std::string::FromUtf8Error),
    #[error("CSV I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Fixed export column order. The caller-supplied filter has already run;
/// the exporter serializes exactly what it is given, in the order given.
pub const CSV_COLUMNS: [&str; 14] = [
    "title",
    "community",
    "author",
    "text_clean",
    "word_count",
    "clareza",
    "empatia",
    "coerencia",
    "formalidade",
    "eficacia",
    "linguistica",
    "quality_score",
    "comentario",
    "status",
];

/// Serializes scored records as quoted CSV: every field double-quoted,
/// embedded quotes doubled, rows newline-joined. Missing values render as
/// empty strings. Empty input yields empty output, not a header-only file.
pub struct CsvExporter;

impl CsvExporter {
    pub fn export<'a, I>(records: I) -> ExportResult<String>
    where
        I: IntoIterator<Item = &'a ScoredRecord>,
    {
        let records: Vec<&ScoredRecord> = records.into_iter().collect();
        if records.is_empty() {
            return Ok(String::new());
        }

        let mut writer = WriterBuilder::new()
            .quote_style(QuoteStyle::Always)
            .from_writer(Vec::new());

        writer.write_record(CSV_COLUMNS)?;
        for record in records {
            writer.write_record(row(record))?;
        }

        let mut output = String::from_utf8(writer.into_inner().map_err(|e| e.into_error())?)?;
        // Rows are newline-joined; drop the terminator after the last row.
        if output.ends_with('\n') {
            output.pop();
        }

        Ok(output)
    }
}

fn row(record: &ScoredRecord) -> [String; 14] {
    let base = &record.record;
    let dim = |f: fn(&crate::record::DimensionScores) -> f64| -> String {
        record.scores.as_ref().map(|s| f(s).to_string()).unwrap_or_default()
    };

    [
        base.title.clone(),
        base.community.clone(),
        base.author.clone(),
        base.text_clean.clone(),
        base.word_count.to_string(),
        dim(|s| s.clareza),
        dim(|s| s.empatia),
        dim(|s| s.coerencia),
        dim(|s| s.formalidade),
        dim(|s| s.eficacia),
        dim(|s| s.linguistica),
        record
            .quality_score
            .map(|q| q.to_string())
            .unwrap_or_default(),
        record.comentario.clone().unwrap_or_default(),
        record.status.as_str().to_string(),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{DimensionScores, NormalizedRecord, ScoredRecord};

    fn normalized(title: &str) -> NormalizedRecord {
        NormalizedRecord {
            id: "r1".into(),
            title: title.into(),
            community: "North".into(),
            author: "Ana".into(),
            text_clean: "Water off Tuesday".into(),
            word_count: 3,
        }
    }

    fn scores() -> DimensionScores {
        DimensionScores {
            clareza: 8.0,
            empatia: 7.0,
            coerencia: 9.0,
            formalidade: 6.0,
            eficacia: 7.0,
            linguistica: 8.0,
        }
    }

    #[test]
    fn test_empty_input_yields_empty_output() {
        assert_eq!(CsvExporter::export(Vec::<&ScoredRecord>::new()).unwrap(), "");
    }

    #[test]
    fn test_header_and_quoting() {
        let mut record = ScoredRecord::pending(normalized("Notice"));
        record.mark_scored(scores(), "fine".into());

        let output = CsvExporter::export([&record]).unwrap();
        let mut lines = output.lines();

        let header = lines.next().unwrap();
        assert!(header.starts_with("\"title\",\"community\""));
        assert!(header.ends_with("\"comentario\",\"status\""));

        let data = lines.next().unwrap();
        assert!(data.starts_with("\"Notice\",\"North\",\"Ana\""));
        assert!(data.contains("\"7.55\""));
        assert!(data.ends_with("\"scored\""));
        assert!(lines.next().is_none());
        assert!(!output.ends_with('\n'));
    }

    #[test]
    fn test_embedded_quotes_doubled_and_round_trip() {
        let mut record = ScoredRecord::pending(normalized("Notice"));
        record.mark_scored(scores(), r#"He said "ok""#.into());

        let output = CsvExporter::export([&record]).unwrap();

        assert!(output.contains(r#""He said ""ok""""#));

        let mut reader = csv::ReaderBuilder::new().from_reader(output.as_bytes());
        let row = reader.records().next().unwrap().unwrap();
        assert_eq!(&row[12], r#"He said "ok""#);
        assert_eq!(&row[0], "Notice");
    }

    #[test]
    fn test_pending_record_renders_empty_scores() {
        let record = ScoredRecord::pending(normalized("Notice"));

        let output = CsvExporter::export([&record]).unwrap();
        let data = output.lines().nth(1).unwrap();

        assert!(data.contains(r#""3","","","","","","","","","pending""#));
    }

    #[test]
    fn test_failed_record_renders_zero_quality() {
        let mut record = ScoredRecord::pending(normalized("Notice"));
        record.mark_failed();

        let output = CsvExporter::export([&record]).unwrap();
        let data = output.lines().nth(1).unwrap();

        // Dimensions stay empty; only the aggregate carries the zero.
        assert!(data.ends_with(r#""","","","","","","0","","failed""#));
    }

    #[test]
    fn test_rows_preserve_input_order() {
        let first = ScoredRecord::pending(NormalizedRecord {
            id: "a".into(),
            title: "First".into(),
            ..normalized("x")
        });
        let second = ScoredRecord::pending(NormalizedRecord {
            id: "b".into(),
            title: "Second".into(),
            ..normalized("x")
        });

        let output = CsvExporter::export([&first, &second]).unwrap();
        let lines: Vec<&str> = output.lines().collect();

        assert!(lines[1].starts_with("\"First\""));
        assert!(lines[2].starts_with("\"Second\""));
    }
}
