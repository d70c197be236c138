use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

use calamine::{Data, Reader, open_workbook_auto_from_rs};
use encoding_rs::{Encoding, UTF_8, UTF_16BE, UTF_16LE, WINDOWS_1252};
use tracing::{debug, info};

use crate::error::SourceError;
use crate::http_client::fetch_bytes;

const SPREADSHEET_EXTENSIONS: &[&str] = &["xlsx", "xlsm", "xlsb", "xls", "ods"];
const ZIP_MAGIC: &[u8] = b"PK\x03\x04";
const OLE_MAGIC: &[u8] = &[0xD0, 0xCF, 0x11, 0xE0];

#[derive(Debug, Clone)]
pub enum TabularInput {
    File(PathBuf),
    Url(String),
    Pasted(String),
    Bytes { name: String, data: Vec<u8> },
}

impl TabularInput {
    pub fn from_arg(arg: &str) -> Self {
        let trimmed = arg.trim();
        let lower = trimmed.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            TabularInput::Url(trimmed.to_string())
        } else {
            TabularInput::File(PathBuf::from(trimmed))
        }
    }

    pub fn describe(&self) -> String {
        match self {
            TabularInput::File(path) => path.display().to_string(),
            TabularInput::Url(url) => url.clone(),
            TabularInput::Pasted(text) => format!("pasted text ({} lines)", text.lines().count()),
            TabularInput::Bytes { name, .. } => name.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h == name)
    }
}

pub fn load_table(input: &TabularInput) -> Result<RawTable, SourceError> {
    let table = match input {
        TabularInput::File(path) => {
            let data = fs::read(path).map_err(|source| SourceError::Io {
                path: path.clone(),
                source,
            })?;
            table_from_bytes(&path.to_string_lossy(), &data)?
        }
        TabularInput::Url(url) => {
            let body = fetch_bytes(url)?;
            let looks_like_sheet = body
                .content_type
                .as_deref()
                .map(|ct| ct.contains("spreadsheet") || ct.contains("excel"))
                .unwrap_or(false);
            if looks_like_sheet {
                read_spreadsheet(&body.bytes)?
            } else {
                table_from_bytes(url, &body.bytes)?
            }
        }
        TabularInput::Pasted(text) => parse_csv_text(&pasted_to_csv(text))?,
        TabularInput::Bytes { name, data } => table_from_bytes(name, data)?,
    };
    info!(
        source = %input.describe(),
        columns = table.headers.len(),
        rows = table.rows.len(),
        "loaded table"
    );
    Ok(table)
}

fn table_from_bytes(name: &str, data: &[u8]) -> Result<RawTable, SourceError> {
    if is_spreadsheet(name, data) {
        return read_spreadsheet(data);
    }
    parse_delimited_bytes(data)
}

fn is_spreadsheet(name: &str, data: &[u8]) -> bool {
    if data.starts_with(ZIP_MAGIC) || data.starts_with(OLE_MAGIC) {
        return true;
    }
    let path = name.split(['?', '#']).next().unwrap_or(name);
    Path::new(path)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SPREADSHEET_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
        .unwrap_or(false)
}

pub fn parse_delimited_bytes(data: &[u8]) -> Result<RawTable, SourceError> {
    let mut attempts = Vec::new();
    for encoding in candidate_encodings(data) {
        attempts.push(encoding.name());
        let Some(text) = decode_strict(encoding, data) else {
            debug!(encoding = encoding.name(), "decode failed");
            continue;
        };
        match parse_csv_text(&text) {
            Ok(table) => {
                debug!(encoding = encoding.name(), "decoded source");
                return Ok(table);
            }
            Err(err) => debug!(encoding = encoding.name(), error = %err, "parse failed"),
        }
    }
    Err(SourceError::Undecodable {
        attempts: attempts.join(", "),
    })
}

pub fn decode_text(data: &[u8]) -> Result<String, SourceError> {
    let mut attempts = Vec::new();
    for encoding in candidate_encodings(data) {
        attempts.push(encoding.name());
        if let Some(text) = decode_strict(encoding, data) {
            return Ok(text);
        }
    }
    Err(SourceError::Undecodable {
        attempts: attempts.join(", "),
    })
}

// BOM first, then UTF-8, UTF-16 only when NUL bytes show up, Windows-1252 last.
fn candidate_encodings(data: &[u8]) -> Vec<&'static Encoding> {
    if let Some((bom_encoding, _)) = Encoding::for_bom(data) {
        let mut out = vec![bom_encoding];
        out.extend([UTF_8, WINDOWS_1252].into_iter().filter(|e| *e != bom_encoding));
        return out;
    }
    let sample = &data[..data.len().min(512)];
    let (even_nuls, odd_nuls) = sample
        .iter()
        .enumerate()
        .filter(|(_, b)| **b == 0)
        .fold((0usize, 0usize), |(even, odd), (i, _)| {
            if i % 2 == 0 { (even + 1, odd) } else { (even, odd + 1) }
        });
    if even_nuls + odd_nuls == 0 {
        return vec![UTF_8, WINDOWS_1252];
    }
    // ASCII in UTF-16LE puts the zero byte second.
    let utf16 = if odd_nuls >= even_nuls { UTF_16LE } else { UTF_16BE };
    vec![UTF_8, utf16, WINDOWS_1252]
}

// NUL decodes fine as UTF-8 but never appears in a text table.
fn decode_strict(encoding: &'static Encoding, data: &[u8]) -> Option<String> {
    let body = match Encoding::for_bom(data) {
        Some((bom_encoding, len)) if bom_encoding == encoding => &data[len..],
        _ => data,
    };
    if (encoding == UTF_16LE || encoding == UTF_16BE) && body.len() % 2 != 0 {
        return None;
    }
    encoding
        .decode_without_bom_handling_and_without_replacement(body)
        .filter(|text| !text.contains('\0'))
        .map(|text| text.into_owned())
}

pub fn parse_csv_text(text: &str) -> Result<RawTable, SourceError> {
    let mut reader = csv::ReaderBuilder::new()
        .flexible(true)
        .from_reader(text.as_bytes());
    let headers: Vec<String> = match reader.headers() {
        Ok(record) => record.iter().map(|h| h.to_string()).collect(),
        Err(_) => return Err(SourceError::EmptySource),
    };
    if headers.iter().all(|h| h.trim().is_empty()) {
        return Err(SourceError::EmptySource);
    }

    let mut rows = Vec::new();
    for result in reader.records() {
        let record = match result {
            Ok(record) => record,
            Err(err) => {
                debug!(error = %err, "skipping malformed csv row");
                continue;
            }
        };
        if record.iter().all(|cell| cell.trim().is_empty()) {
            continue;
        }
        rows.push(record.iter().map(|cell| cell.to_string()).collect());
    }
    Ok(RawTable { headers, rows })
}

/// Turn pasted tab- or whitespace-separated text into comma-separated text.
///
/// Text whose first line already contains a comma (and no tab) is returned as-is.
/// Header cells are cleaned the same way the column normalizer cleans them. In
/// whitespace mode, rows with more fields than the header fold the leading extra
/// fields into the first column, so multi-word player names survive.
pub fn pasted_to_csv(text: &str) -> String {
    let lines: Vec<&str> = text
        .lines()
        .map(|l| l.trim_end_matches('\r'))
        .filter(|l| !l.trim().is_empty())
        .collect();
    let Some(first) = lines.first() else {
        return String::new();
    };
    if first.contains(',') && !first.contains('\t') {
        return lines.join("\n");
    }

    let tabbed = first.contains('\t');
    let split = |line: &str| -> Vec<String> {
        if tabbed {
            line.split('\t').map(|c| c.trim().to_string()).collect()
        } else {
            line.split_whitespace().map(|c| c.to_string()).collect()
        }
    };

    let header: Vec<String> = split(first)
        .iter()
        .map(|h| crate::columns::clean_header(h))
        .collect();
    let width = header.len();

    let mut writer = csv::WriterBuilder::new()
        .flexible(true)
        .terminator(csv::Terminator::Any(b'\n'))
        .from_writer(Vec::new());
    let _ = writer.write_record(&header);
    for line in &lines[1..] {
        let mut cells = split(line);
        if !tabbed && width > 0 && cells.len() > width {
            let extra = cells.len() - width;
            let rest = cells.split_off(extra + 1);
            let name = cells.join(" ");
            cells = std::iter::once(name).chain(rest).collect();
        }
        let _ = writer.write_record(&cells);
    }
    let bytes = writer.into_inner().unwrap_or_default();
    String::from_utf8(bytes)
        .unwrap_or_default()
        .trim_end_matches('\n')
        .to_string()
}

pub fn read_spreadsheet(data: &[u8]) -> Result<RawTable, SourceError> {
    let mut workbook = open_workbook_auto_from_rs(Cursor::new(data.to_vec()))?;
    let range = match workbook.worksheet_range_at(0) {
        Some(range) => range?,
        None => return Err(SourceError::EmptySource),
    };

    let mut rows = range.rows().map(|row| row.iter().map(cell_text).collect::<Vec<String>>());
    let Some(headers) = rows.next() else {
        return Err(SourceError::EmptySource);
    };
    let rows = rows
        .filter(|row| row.iter().any(|cell| !cell.trim().is_empty()))
        .collect();
    Ok(RawTable { headers, rows })
}

fn cell_text(cell: &Data) -> String {
    match cell {
        Data::Empty => String::new(),
        Data::String(s) => s.clone(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pasted_whitespace_text_becomes_csv() {
        let out = pasted_to_csv("Player Team GP\nX TOR 15");
        assert_eq!(out, "player,team,gp\nX,TOR,15");
    }

    #[test]
    fn pasted_multi_word_names_fold_into_first_column() {
        let out = pasted_to_csv("Player Team GP\nConnor McDavid EDM 15\n");
        assert_eq!(out, "player,team,gp\nConnor McDavid,EDM,15");
    }

    #[test]
    fn pasted_tabbed_text_keeps_spaces_and_quotes_commas() {
        let out = pasted_to_csv("Player\tShots For\tTOI\nAuston Matthews\t1,204\t1500.5\n");
        assert_eq!(out, "player,shots_for,toi\nAuston Matthews,\"1,204\",1500.5");
    }

    #[test]
    fn pasted_csv_is_left_alone() {
        let out = pasted_to_csv("Player,GP\nA,3\n");
        assert_eq!(out, "Player,GP\nA,3");
    }

    #[test]
    fn windows_1252_bytes_fall_back() {
        // "Stützle" with 0xFC (ü) is invalid UTF-8.
        let data = b"Player,GP\nTim St\xFCtzle,20\n";
        let table = parse_delimited_bytes(data).unwrap();
        assert_eq!(table.rows[0][0], "Tim Stützle");
    }

    #[test]
    fn utf8_bom_is_stripped() {
        let data = b"\xEF\xBB\xBFPlayer,GP\nA,3\n";
        let table = parse_delimited_bytes(data).unwrap();
        assert_eq!(table.headers[0], "Player");
    }

    #[test]
    fn utf16_with_bom_decodes() {
        let text = "Player,GP\nA,3\n";
        let mut data = vec![0xFF, 0xFE];
        for unit in text.encode_utf16() {
            data.extend_from_slice(&unit.to_le_bytes());
        }
        let table = parse_delimited_bytes(&data).unwrap();
        assert_eq!(table.headers, vec!["Player", "GP"]);
        assert_eq!(table.rows, vec![vec!["A".to_string(), "3".to_string()]]);
    }

    #[test]
    fn utf16_without_bom_decodes() {
        let text = "Player,GP\nA,3\n";
        let le: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        let be: Vec<u8> = text.encode_utf16().flat_map(|u| u.to_be_bytes()).collect();
        for data in [le, be] {
            let table = parse_delimited_bytes(&data).unwrap();
            assert_eq!(table.headers, vec!["Player", "GP"]);
            assert_eq!(table.rows, vec![vec!["A".to_string(), "3".to_string()]]);
        }
    }

    #[test]
    fn decode_text_uses_same_fallback() {
        assert_eq!(decode_text(b"Tim St\xFCtzle\t20").unwrap(), "Tim Stützle\t20");
        assert_eq!(decode_text("Lafrenière".as_bytes()).unwrap(), "Lafrenière");
        let le: Vec<u8> = "A B".encode_utf16().flat_map(|u| u.to_le_bytes()).collect();
        assert_eq!(decode_text(&le).unwrap(), "A B");
    }

    #[test]
    fn empty_source_is_unreadable() {
        assert!(matches!(parse_delimited_bytes(b""), Err(SourceError::Undecodable { .. })));
    }

    #[test]
    fn blank_rows_are_dropped() {
        let table = parse_csv_text("Player,GP\nA,3\n,\n\nB,4\n").unwrap();
        assert_eq!(table.rows.len(), 2);
    }

    #[test]
    fn spreadsheet_detected_by_extension_or_magic() {
        assert!(is_spreadsheet("stats.XLSX", b"anything"));
        assert!(is_spreadsheet("https://x.test/export?id=1", b"PK\x03\x04rest"));
        assert!(!is_spreadsheet("stats.csv", b"Player,GP"));
    }

    #[test]
    fn from_arg_detects_urls() {
        assert!(matches!(TabularInput::from_arg("https://x.test/a.csv"), TabularInput::Url(_)));
        assert!(matches!(TabularInput::from_arg("./a.csv"), TabularInput::File(_)));
    }
}
