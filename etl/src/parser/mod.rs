//! Delimited-file reader and writer with encoding and delimiter auto-detection.
//!
//! Reading produces a [`Dataset`] whose cells are raw text, with empty cells
//! and the usual NA spellings read as missing. Writing always emits
//! comma-delimited UTF-8 with a header row, and only replaces the target
//! once the whole file has been written.

use serde_json::Value;
use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use crate::error::{CsvError, CsvResult};
use crate::models::{cell_text, Dataset};

/// Cell spellings read as missing values.
pub const NA_TOKENS: &[&str] = &[
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Result of parsing with metadata
#[derive(Debug, Clone)]
pub struct ParseResult {
    /// Parsed table
    pub dataset: Dataset,
    /// Detected encoding
    pub encoding: String,
    /// Detected delimiter
    pub delimiter: char,
}

/// Detect the encoding of raw bytes using chardet
pub fn detect_encoding(bytes: &[u8]) -> String {
    let result = chardet::detect(bytes);
    let charset = result.0;

    match charset.to_lowercase().as_str() {
        "" | "ascii" | "utf-8" | "utf8" => "utf-8".to_string(),
        "iso-8859-1" | "iso-8859-15" | "latin-1" | "latin1" => "iso-8859-1".to_string(),
        "windows-1252" | "cp1252" => "windows-1252".to_string(),
        _ => charset,
    }
}

/// Decode bytes to a string using the specified encoding
pub fn decode_content(bytes: &[u8], encoding: &str) -> String {
    let decoded = match encoding.to_lowercase().as_str() {
        "iso-8859-1" | "latin-1" | "latin1" => encoding_rs::ISO_8859_15.decode(bytes).0.into_owned(),
        "windows-1252" | "cp1252" => encoding_rs::WINDOWS_1252.decode(bytes).0.into_owned(),
        _ => String::from_utf8(bytes.to_vec())
            .unwrap_or_else(|_| String::from_utf8_lossy(bytes).into_owned()),
    };
    match decoded.strip_prefix('\u{feff}') {
        Some(rest) => rest.to_string(),
        None => decoded,
    }
}

/// Detect the delimiter by counting occurrences in the header line.
/// Falls back to a comma.
pub fn detect_delimiter(content: &str) -> char {
    let first_line = content.lines().next().unwrap_or("");

    let separators = [',', ';', '\t', '|'];
    let mut best_sep = ',';
    let mut best_count = 0;

    for &sep in &separators {
        let count = first_line.matches(sep).count();
        if count > best_count {
            best_count = count;
            best_sep = sep;
        }
    }

    best_sep
}

fn parse_cell(raw: &str) -> Value {
    if NA_TOKENS.contains(&raw) {
        Value::Null
    } else {
        Value::String(raw.to_string())
    }
}

/// Parse delimited text into a dataset.
///
/// Short rows are padded with missing cells; cells beyond the header are
/// ignored. Blank lines are skipped, but a row of empty cells is kept.
///
/// # Example
/// ```
/// use ecomload::parser::parse_str;
///
/// let ds = parse_str("order_id,price\n1,20.00\n2,NA", ',').unwrap();
/// assert_eq!(ds.len(), 2);
/// assert!(ds.rows[1][1].is_null());
/// ```
pub fn parse_str(content: &str, delimiter: char) -> CsvResult<Dataset> {
    if content.trim().is_empty() {
        return Err(CsvError::EmptyFile);
    }

    let mut reader = csv::ReaderBuilder::new()
        .delimiter(delimiter as u8)
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers: Vec<String> = reader
        .headers()
        .map_err(|e| parse_error(&e))?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();

    if headers.iter().all(|h| h.is_empty()) {
        return Err(CsvError::NoHeaders);
    }

    let mut dataset = Dataset::new(headers);
    let width = dataset.headers.len();

    for result in reader.records() {
        let record = result.map_err(|e| parse_error(&e))?;
        let mut row: Vec<Value> = record.iter().take(width).map(parse_cell).collect();
        row.resize(width, Value::Null);
        dataset.rows.push(row);
    }

    Ok(dataset)
}

fn parse_error(err: &csv::Error) -> CsvError {
    CsvError::Parse {
        line: err.position().map(|p| p.line()).unwrap_or(0),
        message: err.to_string(),
    }
}

/// Parse bytes with auto-detection of encoding and delimiter.
pub fn parse_bytes_auto(bytes: &[u8]) -> CsvResult<ParseResult> {
    let encoding = detect_encoding(bytes);
    let content = decode_content(bytes, &encoding);
    let delimiter = detect_delimiter(&content);
    let dataset = parse_str(&content, delimiter)?;

    Ok(ParseResult {
        dataset,
        encoding,
        delimiter,
    })
}

/// Read a file with auto-detection of encoding and delimiter.
pub fn read_dataset(path: &Path) -> CsvResult<ParseResult> {
    let bytes = fs::read(path).map_err(|source| match source.kind() {
        ErrorKind::NotFound => CsvError::NotFound {
            path: path.to_path_buf(),
        },
        _ => CsvError::Io {
            path: path.to_path_buf(),
            source,
        },
    })?;

    parse_bytes_auto(&bytes)
}

/// Write a dataset as comma-delimited UTF-8 with a header row.
///
/// The rows go to a sibling `.tmp` file first, which is renamed over `path`
/// once complete, so a failed write never leaves a truncated output behind.
pub fn write_dataset(path: &Path, dataset: &Dataset) -> CsvResult<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|source| CsvError::Io {
            path: parent.to_path_buf(),
            source,
        })?;
    }

    let tmp = tmp_path(path);
    if let Err(err) = write_rows(&tmp, dataset) {
        let _ = fs::remove_file(&tmp);
        return Err(err);
    }

    fs::rename(&tmp, path).map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn write_rows(path: &Path, dataset: &Dataset) -> CsvResult<()> {
    let write_err = |source: csv::Error| CsvError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut writer = csv::Writer::from_path(path).map_err(write_err)?;
    writer.write_record(&dataset.headers).map_err(write_err)?;
    for row in &dataset.rows {
        writer
            .write_record(row.iter().map(|v| cell_text(v).unwrap_or_default()))
            .map_err(write_err)?;
    }
    writer.flush().map_err(|source| CsvError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn tmp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_csv() {
        let ds = parse_str("name,age\nAlice,30\nBob,25", ',').unwrap();

        assert_eq!(ds.headers, vec!["name", "age"]);
        assert_eq!(ds.len(), 2);
        assert_eq!(ds.rows[0][0], "Alice");
        assert_eq!(ds.rows[1][1], "25");
    }

    #[test]
    fn test_quoted_values_keep_inner_whitespace() {
        let csv = "id,category_code\n1,\" Electronics/Phones \"\n2,\"a,b\"";
        let ds = parse_str(csv, ',').unwrap();

        assert_eq!(ds.rows[0][1], " Electronics/Phones ");
        assert_eq!(ds.rows[1][1], "a,b");
    }

    #[test]
    fn test_na_tokens_are_missing() {
        let ds = parse_str("a,b,c,d\n,NaN,null,N/A\nx,nan value,0,-", ',').unwrap();

        assert!(ds.rows[0].iter().all(Value::is_null));
        assert_eq!(ds.rows[1][1], "nan value");
        assert_eq!(ds.rows[1][3], "-");
    }

    #[test]
    fn test_short_rows_padded_and_extra_ignored() {
        let ds = parse_str("a;b;c\n1;;3\n1\n1;2;3;4", ';').unwrap();

        assert!(ds.rows[0][1].is_null());
        assert!(ds.rows[1][2].is_null());
        assert_eq!(ds.rows[2].len(), 3);
    }

    #[test]
    fn test_empty_lines_skipped() {
        let ds = parse_str("a,b\n1,2\n\n3,4\n", ',').unwrap();
        assert_eq!(ds.len(), 2);
    }

    #[test]
    fn test_row_of_empty_cells_kept_as_missing() {
        let ds = parse_str("a,b\n,\n1,2", ',').unwrap();

        assert_eq!(ds.len(), 2);
        assert!(ds.rows[0].iter().all(Value::is_null));
        assert_eq!(ds.rows[1][0], "1");
    }

    #[test]
    fn test_empty_csv_error() {
        assert!(matches!(parse_str("", ','), Err(CsvError::EmptyFile)));
    }

    #[test]
    fn test_detect_delimiter() {
        assert_eq!(detect_delimiter("a,b,c\n1,2,3"), ',');
        assert_eq!(detect_delimiter("a;b;c\n1;2;3"), ';');
        assert_eq!(detect_delimiter("a\tb\tc"), '\t');
        assert_eq!(detect_delimiter("a|b|c"), '|');
        assert_eq!(detect_delimiter("single"), ',');
    }

    #[test]
    fn test_auto_parse() {
        let result = parse_bytes_auto(b"order_id;price\n1;20.00\n").unwrap();

        assert_eq!(result.delimiter, ';');
        assert_eq!(result.encoding, "utf-8");
        assert_eq!(result.dataset.headers, vec!["order_id", "price"]);
    }

    #[test]
    fn test_latin1_decoding() {
        // "Société" in ISO-8859-1
        let bytes: &[u8] = &[0x53, 0x6F, 0x63, 0x69, 0xE9, 0x74, 0xE9];
        let decoded = decode_content(bytes, "iso-8859-1");
        assert_eq!(decoded, "Société");
    }

    #[test]
    fn test_bom_stripped() {
        let decoded = decode_content("\u{feff}order_id".as_bytes(), "utf-8");
        assert_eq!(decoded, "order_id");
    }

    #[test]
    fn test_read_missing_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = read_dataset(&dir.path().join("kz.csv")).unwrap_err();
        assert!(matches!(err, CsvError::NotFound { .. }));
    }

    #[test]
    fn test_write_then_read() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out").join("cleaned.csv");

        let mut ds = Dataset::from_text_rows(&["id", "brand"], &[vec![Some("1"), None]]);
        ds.push_column("price", vec![Value::from(20.0)]);
        write_dataset(&path, &ds).unwrap();

        let text = fs::read_to_string(&path).unwrap();
        assert_eq!(text, "id,brand,price\n1,,20.0\n");
        assert!(!tmp_path(&path).exists());

        let back = read_dataset(&path).unwrap().dataset;
        assert!(back.rows[0][1].is_null());
        assert_eq!(back.rows[0][2], "20.0");
    }
}
