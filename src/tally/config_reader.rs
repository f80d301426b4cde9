use crate::tally::io_common::Encoding;
use crate::tally::*;

use serde::{Deserialize, Serialize};
use serde_json::Value as JSValue;

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputSettings {
    #[serde(rename = "contestName")]
    pub contest_name: String,
    #[serde(rename = "outputDirectory")]
    pub output_directory: Option<String>,
    #[serde(rename = "contestDate")]
    pub contest_date: Option<String>,
    /// The municipality code.
    #[serde(rename = "contestJurisdiction")]
    pub contest_jurisdiction: Option<String>,
    #[serde(rename = "contestOffice")]
    pub contest_office: Option<String>,
}

/// The description of the contest, as written at the top of the summary.
#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    pub contest: String,
    pub date: Option<String>,
    pub jurisdiction: Option<String>,
    pub office: Option<String>,
    pub seats: usize,
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct FileSource {
    pub provider: String,
    #[serde(rename = "filePath")]
    pub file_path: String,
    pub delimiter: Option<String>,
    pub encoding: Option<String>,
}

impl FileSource {
    /// A file in the format of the electoral court, with the default settings.
    pub fn tse(path: &str) -> FileSource {
        FileSource {
            provider: "tse_csv".to_string(),
            file_path: path.to_string(),
            delimiter: None,
            encoding: None,
        }
    }

    pub fn delimiter_byte(&self) -> TallyResult<u8> {
        match self.delimiter.as_deref() {
            None => Ok(b';'),
            Some(s) if s.len() == 1 && s.is_ascii() => Ok(s.as_bytes()[0]),
            Some(s) => UnsupportedSnafu {
                what: "delimiter",
                value: s,
            }
            .fail(),
        }
    }

    pub fn encoding(&self) -> TallyResult<Encoding> {
        match self.encoding.as_deref().map(|s| s.to_lowercase()) {
            None => Ok(Encoding::Latin1),
            Some(s) => match s.as_str() {
                "latin1" | "iso-8859-1" => Ok(Encoding::Latin1),
                "utf8" | "utf-8" => Ok(Encoding::Utf8),
                _ => UnsupportedSnafu {
                    what: "encoding",
                    value: s.clone(),
                }
                .fail(),
            },
        }
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Serialize, Deserialize)]
pub struct TallyConfig {
    #[serde(rename = "outputSettings")]
    pub output_settings: OutputSettings,
    #[serde(rename = "candidateFileSource")]
    pub candidate_file_source: FileSource,
    #[serde(rename = "voteFileSource")]
    pub vote_file_source: FileSource,
}

pub fn read_config(path: &str) -> TallyResult<TallyConfig> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    debug!("read_config: {:?}", contents);
    let config: TallyConfig =
        serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(config)
}

pub fn read_summary(path: &str) -> TallyResult<JSValue> {
    let contents = fs::read_to_string(path).context(OpeningFileSnafu { path })?;
    let js: JSValue = serde_json::from_str(contents.as_str()).context(ParsingJsonSnafu { path })?;
    Ok(js)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_a_config() {
        let config: TallyConfig = serde_json::from_str(
            r#"{
            "outputSettings": {
                "contestName": "Vitória 2024",
                "contestDate": "06/10/2024",
                "contestJurisdiction": "57053"
            },
            "candidateFileSource": { "provider": "tse_csv", "filePath": "cand.csv" },
            "voteFileSource": {
                "provider": "tse_csv",
                "filePath": "votos.csv",
                "delimiter": ",",
                "encoding": "UTF-8"
            }
        }"#,
        )
        .unwrap();
        assert_eq!(config.output_settings.contest_name, "Vitória 2024");
        assert_eq!(config.output_settings.output_directory, None);
        assert_eq!(
            config.output_settings.contest_jurisdiction.as_deref(),
            Some("57053")
        );
        assert_eq!(config.candidate_file_source, FileSource::tse("cand.csv"));
        assert_eq!(config.candidate_file_source.delimiter_byte().unwrap(), b';');
        assert_eq!(
            config.candidate_file_source.encoding().unwrap(),
            Encoding::Latin1
        );
        assert_eq!(config.vote_file_source.delimiter_byte().unwrap(), b',');
        assert_eq!(config.vote_file_source.encoding().unwrap(), Encoding::Utf8);
    }

    #[test]
    fn rejects_bad_source_settings() {
        let mut cfs = FileSource::tse("x.csv");
        cfs.delimiter = Some(";;".to_string());
        cfs.encoding = Some("ebcdic".to_string());
        assert!(matches!(
            cfs.delimiter_byte(),
            Err(TallyError::Unsupported { .. })
        ));
        assert!(matches!(cfs.encoding(), Err(TallyError::Unsupported { .. })));
    }
}
