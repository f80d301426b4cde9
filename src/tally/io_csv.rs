// Readers for the CSV files published by the electoral court.

use std::fs::File;
use std::str::FromStr;

use csv::ByteRecord;

use crate::tally::io_common::{decode_field, header_index, simplify_file_name, Encoding};
use crate::tally::*;

const SG_UE: &str = "SG_UE";
const CD_CARGO: &str = "CD_CARGO";
const NR_CANDIDATO: &str = "NR_CANDIDATO";
const NM_URNA_CANDIDATO: &str = "NM_URNA_CANDIDATO";
const NR_PARTIDO: &str = "NR_PARTIDO";
const SG_PARTIDO: &str = "SG_PARTIDO";
const NR_FEDERACAO: &str = "NR_FEDERACAO";
const DT_NASCIMENTO: &str = "DT_NASCIMENTO";
const CD_SIT_TOT_TURNO: &str = "CD_SIT_TOT_TURNO";
const CD_GENERO: &str = "CD_GENERO";

const CD_MUNICIPIO: &str = "CD_MUNICIPIO";
const NR_VOTAVEL: &str = "NR_VOTAVEL";
const QT_VOTOS: &str = "QT_VOTOS";

const CANDIDATE_COLUMNS: [&str; 10] = [
    SG_UE,
    CD_CARGO,
    NR_CANDIDATO,
    NM_URNA_CANDIDATO,
    NR_PARTIDO,
    SG_PARTIDO,
    NR_FEDERACAO,
    DT_NASCIMENTO,
    CD_SIT_TOT_TURNO,
    CD_GENERO,
];

const VOTE_COLUMNS: [&str; 4] = [CD_CARGO, CD_MUNICIPIO, NR_VOTAVEL, QT_VOTOS];

/// An open file with the positions of the columns of interest.
struct TseFile<'a> {
    path: &'a str,
    encoding: Encoding,
    reader: csv::Reader<File>,
    columns: Vec<(&'static str, usize)>,
}

/// One data row of a file.
struct Row<'a> {
    file: &'a TseFile<'a>,
    lineno: usize,
    record: &'a ByteRecord,
}

impl<'a> TseFile<'a> {
    fn open(path: &'a str, cfs: &FileSource, columns: &[&'static str]) -> TallyResult<TseFile<'a>> {
        let encoding = cfs.encoding()?;
        let mut reader = csv::ReaderBuilder::new()
            .delimiter(cfs.delimiter_byte()?)
            .has_headers(true)
            .flexible(true)
            .from_path(path)
            .context(CsvOpenSnafu { path })?;
        let headers = reader
            .byte_headers()
            .context(CsvLineParseSnafu { path, lineno: 1usize })?
            .clone();
        let mut indices = Vec::new();
        for &column in columns {
            let idx = header_index(headers.iter(), encoding, column)
                .context(MissingColumnSnafu { column, path })?;
            indices.push((column, idx));
        }
        debug!("TseFile::open: {}: columns {:?}", path, indices);
        Ok(TseFile {
            path,
            encoding,
            reader,
            columns: indices,
        })
    }

    fn index(&self, column: &str) -> usize {
        self.columns
            .iter()
            .find(|(c, _)| *c == column)
            .map(|(_, idx)| *idx)
            .unwrap_or(usize::MAX)
    }
}

impl<'a> Row<'a> {
    fn text(&self, column: &str) -> TallyResult<String> {
        let raw = self
            .record
            .get(self.file.index(column))
            .context(CsvLineTooShortSnafu {
                path: self.file.path,
                lineno: self.lineno,
                column,
            })?;
        Ok(decode_field(raw, self.file.encoding))
    }

    fn parse<T: FromStr>(&self, column: &str) -> TallyResult<T> {
        let value = self.text(column)?;
        value.parse::<T>().ok().context(ParsingFieldSnafu {
            path: self.file.path,
            lineno: self.lineno,
            column,
            value: value.clone(),
        })
    }
}

/// Calls `f` on every data row of the file. Line numbers start at 1 with the
/// header.
fn for_each_row<F>(file: &mut TseFile, mut f: F) -> TallyResult<()>
where
    F: FnMut(&Row) -> TallyResult<()>,
{
    let mut record = ByteRecord::new();
    let mut idx: usize = 0;
    loop {
        let lineno = idx + 2;
        let more = file
            .reader
            .read_byte_record(&mut record)
            .context(CsvLineParseSnafu {
                path: file.path,
                lineno,
            })?;
        if !more {
            return Ok(());
        }
        let row = Row {
            file: &*file,
            lineno,
            record: &record,
        };
        f(&row)?;
        idx += 1;
    }
}

/// Reads all the candidacies of a `consulta_cand` file.
///
/// No filtering happens here: the registry decides which records it keeps.
pub fn read_candidates(path: &str, cfs: &FileSource) -> TallyResult<Vec<CandidateRecord>> {
    let mut file = TseFile::open(path, cfs, &CANDIDATE_COLUMNS)?;
    let mut res: Vec<CandidateRecord> = Vec::new();
    for_each_row(&mut file, |row| {
        let birth = row.text(DT_NASCIMENTO)?;
        let record = CandidateRecord {
            municipality: row.text(SG_UE)?,
            office_code: row.parse(CD_CARGO)?,
            number: row.parse(NR_CANDIDATO)?,
            ballot_name: row.text(NM_URNA_CANDIDATO)?,
            party_number: row.parse(NR_PARTIDO)?,
            party_acronym: row.text(SG_PARTIDO)?,
            federation_number: row.parse(NR_FEDERACAO)?,
            birth_date: parse_date(&birth)?,
            outcome_code: row.parse(CD_SIT_TOT_TURNO)?,
            gender_code: row.parse(CD_GENERO)?,
        };
        debug!("read_candidates: {}: {:?}", row.lineno, record);
        res.push(record);
        Ok(())
    })?;
    info!(
        "read_candidates: {} records from {}",
        res.len(),
        simplify_file_name(path)
    );
    Ok(res)
}

/// Reads the vote records of a `votacao_secao` file for one municipality.
///
/// Rows of other municipalities are skipped without being parsed further.
pub fn read_votes(path: &str, cfs: &FileSource, municipality: &str) -> TallyResult<Vec<VoteRecord>> {
    let mut file = TseFile::open(path, cfs, &VOTE_COLUMNS)?;
    let mut res: Vec<VoteRecord> = Vec::new();
    let mut skipped: usize = 0;
    for_each_row(&mut file, |row| {
        let m = row.text(CD_MUNICIPIO)?;
        if m != municipality {
            skipped += 1;
            return Ok(());
        }
        res.push(VoteRecord {
            office_code: row.parse(CD_CARGO)?,
            municipality: m,
            target: row.parse(NR_VOTAVEL)?,
            quantity: row.parse(QT_VOTOS)?,
        });
        Ok(())
    })?;
    info!(
        "read_votes: {} records for {} from {}, {} records of other municipalities",
        res.len(),
        municipality,
        simplify_file_name(path),
        skipped
    );
    Ok(res)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::io::Write;

    fn write_tmp(name: &str, contents: &[u8]) -> String {
        let dir = std::env::temp_dir().join(format!("ctally-io-csv-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        let p = dir.join(name);
        let mut f = File::create(&p).unwrap();
        f.write_all(contents).unwrap();
        p.display().to_string()
    }

    #[test]
    fn reads_the_fixture_candidates() {
        let path = "tests/data/small_city/candidatos.csv";
        let res = read_candidates(path, &FileSource::tse(path)).unwrap();
        assert_eq!(res.len(), 7);
        let joao = res.iter().find(|r| r.number == 11111).unwrap();
        assert_eq!(joao.ballot_name, "João");
        assert_eq!(joao.party_acronym, "ABC");
        assert_eq!(joao.federation_number, -1);
        assert_eq!(joao.birth_date, parse_date("01/01/1970").unwrap());
    }

    #[test]
    fn reads_the_fixture_votes() {
        let path = "tests/data/small_city/votos.csv";
        let res = read_votes(path, &FileSource::tse(path), "57053").unwrap();
        assert!(res.iter().all(|v| v.municipality == "57053"));
        assert_eq!(res.len(), 13);
    }

    #[test]
    fn columns_in_any_order() {
        let path = write_tmp(
            "any_order.csv",
            b"\"QT_VOTOS\";\"EXTRA\";\"NR_VOTAVEL\";\"CD_MUNICIPIO\";\"CD_CARGO\"\n\"12\";\"x\";\"11001\";\"1\";\"13\"\n",
        );
        let res = read_votes(&path, &FileSource::tse(&path), "1").unwrap();
        assert_eq!(
            res,
            vec![VoteRecord {
                office_code: 13,
                municipality: "1".to_string(),
                target: 11001,
                quantity: 12,
            }]
        );
    }

    #[test]
    fn missing_column() {
        let path = write_tmp("missing.csv", b"CD_CARGO;CD_MUNICIPIO;NR_VOTAVEL\n13;1;11001\n");
        let res = read_votes(&path, &FileSource::tse(&path), "1");
        assert!(matches!(res, Err(TallyError::MissingColumn { column, .. }) if column == "QT_VOTOS"));
    }

    #[test]
    fn bad_number_reports_the_line() {
        let path = write_tmp(
            "bad_number.csv",
            b"CD_CARGO;CD_MUNICIPIO;NR_VOTAVEL;QT_VOTOS\n13;1;11001;3\n13;1;11001;many\n",
        );
        let res = read_votes(&path, &FileSource::tse(&path), "1");
        assert!(matches!(
            res,
            Err(TallyError::ParsingField { lineno: 3, .. })
        ));
    }

    #[test]
    fn short_line() {
        let path = write_tmp(
            "short.csv",
            b"CD_CARGO;CD_MUNICIPIO;NR_VOTAVEL;QT_VOTOS\n13;1;11001\n",
        );
        let res = read_votes(&path, &FileSource::tse(&path), "1");
        assert!(matches!(
            res,
            Err(TallyError::CsvLineTooShort { lineno: 2, .. })
        ));
    }
}
