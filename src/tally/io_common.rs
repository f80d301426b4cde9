use std::path::Path;

use chrono::NaiveDate;
use snafu::prelude::*;

use crate::tally::{ParsingDateSnafu, TallyResult};

const DATE_FORMAT: &str = "%d/%m/%Y";

/// The character encodings accepted for the input files.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub enum Encoding {
    /// ISO-8859-1, used by the electoral court.
    Latin1,
    Utf8,
}

/// Decodes a raw CSV field and trims it.
pub fn decode_field(raw: &[u8], encoding: Encoding) -> String {
    let s: String = match encoding {
        // Every ISO-8859-1 byte is the code point of the same value.
        Encoding::Latin1 => raw.iter().map(|&b| b as char).collect(),
        Encoding::Utf8 => String::from_utf8_lossy(raw).into_owned(),
    };
    s.trim_start_matches('\u{feff}').trim().to_string()
}

/// Position of a column in a header row.
pub fn header_index<'a, I>(headers: I, encoding: Encoding, column: &str) -> Option<usize>
where
    I: IntoIterator<Item = &'a [u8]>,
{
    headers
        .into_iter()
        .position(|h| decode_field(h, encoding) == column)
}

pub fn parse_date(s: &str) -> TallyResult<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).context(ParsingDateSnafu { value: s })
}

pub fn format_date(date: NaiveDate) -> String {
    date.format(DATE_FORMAT).to_string()
}

pub fn simplify_file_name(path: &str) -> String {
    Path::new(path)
        .file_name()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decodes_latin1() {
        let raw: &[u8] = &[b' ', b'J', b'o', 0xE3, b'o', b' '];
        assert_eq!(decode_field(raw, Encoding::Latin1), "João");
        assert_eq!(decode_field("João ".as_bytes(), Encoding::Utf8), "João");
    }

    #[test]
    fn finds_headers() {
        let headers: Vec<&[u8]> = vec![b"\xEF\xBB\xBFSG_UE", b"CD_CARGO"];
        assert_eq!(header_index(headers.clone(), Encoding::Utf8, "SG_UE"), Some(0));
        assert_eq!(header_index(headers.clone(), Encoding::Utf8, "CD_CARGO"), Some(1));
        assert_eq!(header_index(headers, Encoding::Utf8, "QT_VOTOS"), None);
    }

    #[test]
    fn dates() {
        let d = parse_date("06/10/2024").unwrap();
        assert_eq!(d, NaiveDate::from_ymd_opt(2024, 10, 6).unwrap());
        assert_eq!(format_date(d), "06/10/2024");
        assert!(parse_date("2024-10-06").is_err());
    }

    #[test]
    fn file_names() {
        assert_eq!(simplify_file_name("tests/data/x/votos.csv"), "votos.csv");
        assert_eq!(simplify_file_name("/"), "/");
    }
}
