//! Reading court exports (XLSX, XLS or CSV) into the uniform record shape.

use crate::cache::SourceKey;
use crate::columns::{ColumnLayout, UNSPECIFIED_OUTCOME};
use crate::error::{Error, Result};
use crate::types::{Court, Record, RecordSet};
use calamine::{Data, DataType, Range, Reader, Xls, Xlsx};
use sha2::{Digest, Sha256};
use std::fmt;
use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Court assigned to every record read from an external table
pub const EXTERNAL_COURT: Court = Court::Stf;

const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];
const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

/// Where an external table comes from
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TableSource {
    Path(PathBuf),
    /// An uploaded table held in memory
    Bytes { name: String, bytes: Arc<Vec<u8>> },
}

impl TableSource {
    pub fn path(path: impl Into<PathBuf>) -> Self {
        TableSource::Path(path.into())
    }

    pub fn bytes(name: impl Into<String>, bytes: Vec<u8>) -> Self {
        TableSource::Bytes {
            name: name.into(),
            bytes: Arc::new(bytes),
        }
    }

    /// Cache identity: the path for files, a content digest for uploads
    pub fn key(&self) -> SourceKey {
        match self {
            TableSource::Path(path) => SourceKey::Path(path.clone()),
            TableSource::Bytes { bytes, .. } => SourceKey::Content(hash_bytes(bytes)),
        }
    }
}

impl fmt::Display for TableSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TableSource::Path(path) => write!(f, "{}", path.display()),
            TableSource::Bytes { name, bytes } => write!(f, "{} ({} bytes)", name, bytes.len()),
        }
    }
}

/// Hex-encoded SHA-256 digest
pub fn hash_bytes(bytes: &[u8]) -> String {
    hex::encode(Sha256::digest(bytes))
}

/// Container format, detected from the leading bytes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TableFormat {
    Xlsx,
    Xls,
    Csv,
}

impl TableFormat {
    pub fn detect(bytes: &[u8]) -> Self {
        if bytes.starts_with(ZIP_MAGIC) {
            TableFormat::Xlsx
        } else if bytes.starts_with(OLE_MAGIC) {
            TableFormat::Xls
        } else {
            TableFormat::Csv
        }
    }
}

/// Untyped header row plus string cells
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

fn read_path(path: &Path) -> Result<Vec<u8>> {
    std::fs::read(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            Error::SourceNotFound(path.display().to_string())
        } else {
            Error::Io(e)
        }
    })
}

/// Read and parse a table without resolving its columns
pub fn read_table(source: &TableSource) -> Result<RawTable> {
    match source {
        TableSource::Path(path) => {
            let bytes = read_path(path)?;
            parse_table(&bytes, &path.display().to_string())
        }
        TableSource::Bytes { name, bytes } => parse_table(bytes, name),
    }
}

/// Parse table bytes, choosing the format from the content signature
pub fn parse_table(bytes: &[u8], name: &str) -> Result<RawTable> {
    let table = match TableFormat::detect(bytes) {
        TableFormat::Xlsx => {
            let workbook = Xlsx::new(Cursor::new(bytes))
                .map_err(|e| Error::SourceUnreadable(format!("{}: not a valid workbook: {}", name, e)))?;
            first_sheet(workbook, name)?
        }
        TableFormat::Xls => {
            let workbook = Xls::new(Cursor::new(bytes))
                .map_err(|e| Error::SourceUnreadable(format!("{}: not a valid workbook: {}", name, e)))?;
            first_sheet(workbook, name)?
        }
        TableFormat::Csv => parse_csv(bytes, name)?,
    };

    if table.headers.is_empty() {
        return Err(Error::SourceUnreadable(format!("{}: no header row", name)));
    }
    Ok(table)
}

fn first_sheet<'a, R>(mut workbook: R, name: &str) -> Result<RawTable>
where
    R: Reader<Cursor<&'a [u8]>>,
    R::Error: fmt::Display,
{
    let range = workbook
        .worksheet_range_at(0)
        .ok_or_else(|| Error::SourceUnreadable(format!("{}: no worksheet found", name)))?
        .map_err(|e| Error::SourceUnreadable(format!("{}: failed to read worksheet: {}", name, e)))?;
    Ok(range_to_table(&range))
}

fn cell_text(cell: &Data) -> String {
    cell.as_string().unwrap_or_else(|| format!("{}", cell))
}

fn range_to_table(range: &Range<Data>) -> RawTable {
    let mut rows = range
        .rows()
        .map(|row| row.iter().map(cell_text).collect::<Vec<String>>());

    let headers = rows.next().unwrap_or_default();
    RawTable {
        headers,
        rows: rows.collect(),
    }
}

/// Semicolon-separated exports are common for Brazilian locales, so the
/// delimiter is whichever of `;` and `,` appears more on the header line.
/// `None` means the header has a single column.
fn sniff_delimiter(bytes: &[u8]) -> Option<u8> {
    let first_line = bytes.split(|b| *b == b'\n').next().unwrap_or_default();
    let semicolons = first_line.iter().filter(|b| **b == b';').count();
    let commas = first_line.iter().filter(|b| **b == b',').count();
    match (semicolons, commas) {
        (0, 0) => None,
        (s, c) if s > c => Some(b';'),
        _ => Some(b','),
    }
}

fn parse_csv(bytes: &[u8], name: &str) -> Result<RawTable> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let delimiter = sniff_delimiter(bytes);
    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter.unwrap_or(b','))
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    // non-UTF-8 exports are decoded lossily rather than rejected
    let mut rows = Vec::new();
    for (index, result) in reader.byte_records().enumerate() {
        let record = result.map_err(|e| {
            Error::SourceUnreadable(format!("{}: failed to parse CSV row {}: {}", name, index + 1, e))
        })?;
        let mut fields = record
            .iter()
            .map(|field| String::from_utf8_lossy(field).into_owned())
            .collect::<Vec<String>>();

        // single-column table: commas belong to the cell text
        if delimiter.is_none() && fields.len() > 1 {
            fields = vec![fields.join(",")];
        }
        rows.push(fields);
    }

    let mut rows = rows.into_iter();
    let headers = rows.next().unwrap_or_default();
    let rows: Vec<Vec<String>> = rows.collect();

    let wide_rows = rows.iter().filter(|row| row.len() > headers.len()).count();
    if wide_rows > 0 {
        tracing::warn!(
            source = name,
            rows = wide_rows,
            columns = headers.len(),
            "rows wider than the header, extra cells ignored"
        );
    }

    Ok(RawTable { headers, rows })
}

fn is_blank_row(row: &[String]) -> bool {
    row.iter().all(|cell| cell.trim().is_empty())
}

/// Map table rows onto records using a resolved layout
pub fn records_from_table(table: &RawTable, layout: &ColumnLayout, court: Court) -> RecordSet {
    table
        .rows
        .iter()
        .enumerate()
        .filter(|(_, row)| !is_blank_row(row))
        .map(|(index, row)| {
            let cell = |column: usize| row.get(column).map(|s| s.trim()).unwrap_or_default();

            let summary_text = cell(layout.summary.index).to_string();
            let outcome = layout
                .outcome
                .as_ref()
                .map(|c| cell(c.index))
                .filter(|v| !v.is_empty())
                .unwrap_or(UNSPECIFIED_OUTCOME)
                .to_string();
            let decision_id = layout
                .id
                .as_ref()
                .map(|c| cell(c.index))
                .filter(|v| !v.is_empty())
                .map(str::to_string)
                .unwrap_or_else(|| (index + 1).to_string());

            Record {
                court,
                decision_id,
                summary_text,
                outcome,
            }
        })
        .collect()
}

/// Resolve the column layout of a table without building records
pub fn inspect_columns(source: &TableSource) -> Result<ColumnLayout> {
    let table = read_table(source)?;
    ColumnLayout::resolve(&table.headers)
}

/// Read, normalize and map an external table. Blocking.
pub fn load_table(source: &TableSource) -> Result<RecordSet> {
    let table = read_table(source)?;
    let layout = ColumnLayout::resolve(&table.headers)?;

    tracing::debug!(
        source = %source,
        summary = %layout.summary.header,
        outcome = ?layout.outcome.as_ref().map(|c| c.header.as_str()),
        "resolved column layout"
    );

    let records = records_from_table(&table, &layout, EXTERNAL_COURT);
    tracing::info!(source = %source, records = records.len(), "loaded external table");
    Ok(records)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn csv_source(content: &str) -> TableSource {
        TableSource::bytes("upload.csv", content.as_bytes().to_vec())
    }

    #[test]
    fn test_load_with_expected_columns() {
        let source = csv_source(
            "Id_decisao,Ementa,Resultado\n\
             10,Recurso especial sobre dano moral.,Procedente\n\
             11,Habeas corpus.,Improcedente\n",
        );
        let records = load_table(&source).unwrap();

        assert_eq!(records.len(), 2);
        let first = &records.records()[0];
        assert_eq!(first.court, Court::Stf);
        assert_eq!(first.decision_id, "10");
        assert_eq!(first.summary_text, "Recurso especial sobre dano moral.");
        assert_eq!(first.outcome, "Procedente");
    }

    #[test]
    fn test_observation_note_column_feeds_summary() {
        let source = csv_source(
            "Processo,Observation note\n\
             RE 1,Nota sobre dano moral\n\
             RE 2,Outra nota\n",
        );
        let records = load_table(&source).unwrap();

        let summaries: Vec<&str> = records.iter().map(|r| r.summary_text.as_str()).collect();
        assert_eq!(summaries, vec!["Nota sobre dano moral", "Outra nota"]);
    }

    #[test]
    fn test_unrecognized_columns_use_first_column_and_unspecified() {
        let source = csv_source("Classe,Relator\nADI,Min. A\nRE,Min. B\n");
        let records = load_table(&source).unwrap();

        for (record, expected) in records.iter().zip(["ADI", "RE"]) {
            assert_eq!(record.summary_text, expected);
            assert_eq!(record.outcome, UNSPECIFIED_OUTCOME);
        }
        // numbered by row when there is no id column
        assert_eq!(records.records()[1].decision_id, "2");
    }

    #[test]
    fn test_missing_cells_become_empty_strings() {
        let source = csv_source("Ementa,Resultado\nTexto,\n,Procedente\n");
        let records = load_table(&source).unwrap();

        assert_eq!(records.records()[0].outcome, UNSPECIFIED_OUTCOME);
        assert_eq!(records.records()[1].summary_text, "");
        assert_eq!(records.records()[1].outcome, "Procedente");
    }

    #[test]
    fn test_semicolon_delimiter_and_bom() {
        let mut bytes = UTF8_BOM.to_vec();
        bytes.extend_from_slice("Ementa;Resultado\nA, B e C;Procedente\n".as_bytes());
        let records = load_table(&TableSource::bytes("stf.csv", bytes)).unwrap();

        assert_eq!(records.records()[0].summary_text, "A, B e C");
        assert_eq!(records.records()[0].outcome, "Procedente");
    }

    #[test]
    fn test_single_column_keeps_commas_in_text() {
        let source = csv_source("Ementa\nDano moral, coletivo e dano moral\n");
        let records = load_table(&source).unwrap();

        let summary = &records.records()[0].summary_text;
        assert_eq!(summary, "Dano moral, coletivo e dano moral");
        assert_eq!(crate::analyzer::count_occurrences(&summary.to_lowercase(), "dano moral"), 2);
    }

    #[test]
    fn test_sniff_delimiter() {
        assert_eq!(sniff_delimiter(b"Ementa;Resultado\nA,B;C\n"), Some(b';'));
        assert_eq!(sniff_delimiter(b"Ementa,Resultado\nA;B,C\n"), Some(b','));
        assert_eq!(sniff_delimiter(b"Ementa\nA, B; C\n"), None);
    }

    #[test]
    fn test_wide_rows_keep_leading_cells() {
        let source = csv_source("Ementa,Resultado\nTexto,Procedente,sobra\n");
        let records = load_table(&source).unwrap();

        assert_eq!(records.records()[0].summary_text, "Texto");
        assert_eq!(records.records()[0].outcome, "Procedente");
    }

    #[test]
    fn test_load_xlsx_workbook() {
        let mut workbook = rust_xlsxwriter::Workbook::new();
        let sheet = workbook.add_worksheet();
        for (col, header) in [" ID_DECISAO", "EMENTA", "resultado"].into_iter().enumerate() {
            sheet.write_string(0, col as u16, header).unwrap();
        }
        sheet.write_number(1, 0, 101.0).unwrap();
        sheet.write_string(1, 1, "Dano moral coletivo").unwrap();
        sheet.write_string(1, 2, "Procedente").unwrap();
        sheet.write_number(2, 0, 102.0).unwrap();
        sheet.write_string(2, 1, "Habeas corpus").unwrap();
        let bytes = workbook.save_to_buffer().unwrap();

        assert_eq!(TableFormat::detect(&bytes), TableFormat::Xlsx);
        let records = load_table(&TableSource::bytes("stf.xlsx", bytes)).unwrap();

        assert_eq!(records.len(), 2);
        let first = &records.records()[0];
        assert_eq!(first.court, Court::Stf);
        assert_eq!(first.decision_id, "101");
        assert_eq!(first.summary_text, "Dano moral coletivo");
        assert_eq!(first.outcome, "Procedente");
        let second = &records.records()[1];
        assert_eq!(second.decision_id, "102");
        assert_eq!(second.outcome, UNSPECIFIED_OUTCOME);
    }

    #[test]
    fn test_latin1_bytes_decode_lossily() {
        let mut bytes = b"Ementa\nrepercuss".to_vec();
        bytes.push(0xE3); // 'ã' in Latin-1
        bytes.extend_from_slice(b"o geral\n");
        let records = load_table(&TableSource::bytes("latin1.csv", bytes)).unwrap();

        assert!(records.records()[0].summary_text.starts_with("repercuss"));
        assert!(records.records()[0].summary_text.ends_with("o geral"));
    }

    #[test]
    fn test_blank_rows_are_skipped() {
        let source = csv_source("Ementa,Resultado\nA,Procedente\n,\nB,Improcedente\n");
        let records = load_table(&source).unwrap();
        assert_eq!(records.len(), 2);
    }

    #[test]
    fn test_missing_path_is_not_found() {
        let err = load_table(&TableSource::path("/definitely/missing/stf.xlsx")).unwrap_err();
        assert!(matches!(err, Error::SourceNotFound(_)));
        assert!(err.is_not_found());
    }

    #[test]
    fn test_empty_file_is_unreadable() {
        let err = load_table(&csv_source("")).unwrap_err();
        assert!(matches!(err, Error::SourceUnreadable(_)));
    }

    #[test]
    fn test_corrupt_workbook_is_unreadable() {
        let mut bytes = ZIP_MAGIC.to_vec();
        bytes.extend_from_slice(b"not really a zip archive");
        let err = load_table(&TableSource::bytes("broken.xlsx", bytes)).unwrap_err();
        assert!(matches!(err, Error::SourceUnreadable(_)));
    }

    #[test]
    fn test_load_from_path() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "Ementa,Resultado\nDano moral,Procedente\n").unwrap();

        let records = load_table(&TableSource::path(file.path())).unwrap();
        assert_eq!(records.len(), 1);
    }

    #[test]
    fn test_bytes_key_is_content_hash() {
        let a = TableSource::bytes("a.csv", b"Ementa\nx\n".to_vec());
        let b = TableSource::bytes("b.csv", b"Ementa\nx\n".to_vec());
        assert_eq!(a.key(), b.key());
        assert_ne!(a.key(), csv_source("Ementa\ny\n").key());
    }

    #[test]
    fn test_detect_format() {
        assert_eq!(TableFormat::detect(b"PK\x03\x04rest"), TableFormat::Xlsx);
        assert_eq!(TableFormat::detect(&[0xD0, 0xCF, 0x11, 0xE0, 0]), TableFormat::Xls);
        assert_eq!(TableFormat::detect(b"Ementa,Resultado"), TableFormat::Csv);
    }
}
