use log::{debug, info, warn};

use chrono::NaiveDate;
use council_tally::builder::Builder;
use council_tally::stats::{self, AgeBracket, RankedCandidate};
use council_tally::*;
use snafu::{prelude::*, Snafu};

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde_json::json;
use serde_json::Value as JSValue;
use text_diff::print_diff;

use crate::args::Args;
use crate::tally::config_reader::*;
use crate::tally::io_common::*;

pub mod config_reader;
pub mod io_common;
pub mod io_csv;
pub mod report;

#[derive(Debug, Snafu)]
pub enum TallyError {
    #[snafu(display("Error opening file {path}"))]
    OpeningFile {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error writing {path}"))]
    WritingOutput {
        source: std::io::Error,
        path: String,
    },
    #[snafu(display("Error opening CSV file {path}"))]
    CsvOpen { source: csv::Error, path: String },
    #[snafu(display("Error reading line {lineno} of {path}"))]
    CsvLineParse {
        source: csv::Error,
        path: String,
        lineno: usize,
    },
    #[snafu(display("Column {column} not found in the header of {path}"))]
    MissingColumn { column: String, path: String },
    #[snafu(display("{path}:{lineno}: the line has no value for column {column}"))]
    CsvLineTooShort {
        path: String,
        lineno: usize,
        column: String,
    },
    #[snafu(display("{path}:{lineno}: cannot read {value:?} in column {column}"))]
    ParsingField {
        path: String,
        lineno: usize,
        column: String,
        value: String,
    },
    #[snafu(display("Cannot read date {value:?}, expected dd/mm/yyyy"))]
    ParsingDate {
        source: chrono::ParseError,
        value: String,
    },
    #[snafu(display("Error reading JSON from {path}"))]
    ParsingJson {
        source: serde_json::Error,
        path: String,
    },
    #[snafu(display("Error producing JSON"))]
    WritingJson { source: serde_json::Error },
    #[snafu(display("Unsupported {what}: {value:?}"))]
    Unsupported { what: String, value: String },
    #[snafu(display("Missing {what}: pass it on the command line or in the configuration file"))]
    MissingSetting { what: String },
    #[snafu(display("Error while counting the votes"))]
    Tallying { source: TallyErrors },

    #[snafu(whatever, display("{message}"))]
    Whatever {
        message: String,
        #[snafu(source(from(Box<dyn std::error::Error>, Some)))]
        source: Option<Box<dyn std::error::Error>>,
    },
}

pub type TallyResult<T> = Result<T, TallyError>;

/// Everything needed for one run, after merging the command line and the
/// configuration file.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionSettings {
    pub contest_name: String,
    pub office: Option<String>,
    pub municipality: String,
    pub election_date: NaiveDate,
    pub candidate_source: (String, FileSource),
    pub vote_source: (String, FileSource),
    pub out: Option<String>,
    pub reference: Option<String>,
    pub print_report: bool,
}

fn join(root: &Path, file_path: &str) -> String {
    let p: PathBuf = root.join(file_path);
    p.as_path().display().to_string()
}

pub fn resolve_settings(args: &Args) -> TallyResult<ElectionSettings> {
    let (config, root) = match &args.config {
        Some(config_path) => {
            let config = read_config(config_path)?;
            info!("config: {:?}", config);
            let root = Path::new(config_path)
                .parent()
                .map(|p| p.to_path_buf())
                .unwrap_or_default();
            (Some(config), root)
        }
        None => (None, PathBuf::new()),
    };
    let settings = config.as_ref().map(|c| &c.output_settings);

    let municipality = match (&args.municipality, settings) {
        (Some(m), _) => m.clone(),
        (None, Some(OutputSettings {
            contest_jurisdiction: Some(m),
            ..
        })) => m.clone(),
        _ => {
            return MissingSettingSnafu {
                what: "municipality code",
            }
            .fail()
        }
    };

    let date_str = match (&args.date, settings) {
        (Some(d), _) => d.clone(),
        (None, Some(OutputSettings {
            contest_date: Some(d),
            ..
        })) => d.clone(),
        _ => {
            return MissingSettingSnafu {
                what: "election date",
            }
            .fail()
        }
    };
    let election_date = parse_date(&date_str)?;

    let candidate_source = match (&args.candidates, &config) {
        (Some(p), _) => (p.clone(), FileSource::tse(p)),
        (None, Some(c)) => (
            join(&root, &c.candidate_file_source.file_path),
            c.candidate_file_source.clone(),
        ),
        _ => {
            return MissingSettingSnafu {
                what: "candidate file",
            }
            .fail()
        }
    };
    let vote_source = match (&args.votes, &config) {
        (Some(p), _) => (p.clone(), FileSource::tse(p)),
        (None, Some(c)) => (
            join(&root, &c.vote_file_source.file_path),
            c.vote_file_source.clone(),
        ),
        _ => return MissingSettingSnafu { what: "vote file" }.fail(),
    };

    let out = match (&args.out, settings.and_then(|s| s.output_directory.clone())) {
        (Some(o), _) => Some(o.clone()),
        (None, Some(dir)) => Some(join(&root.join(dir), "summary.json")),
        _ => None,
    };

    Ok(ElectionSettings {
        contest_name: settings
            .map(|s| s.contest_name.clone())
            .unwrap_or_else(|| format!("Eleição municipal {}", municipality)),
        office: settings.and_then(|s| s.contest_office.clone()),
        municipality,
        election_date,
        candidate_source,
        vote_source,
        out,
        reference: args.reference.clone(),
        print_report: !args.quiet,
    })
}

fn candidate_to_json(registry: &ElectionRegistry, c: &Candidate) -> JSValue {
    let acronym = registry.party_of(c).map(|p| p.acronym()).unwrap_or("");
    json!({
        "number": c.number(),
        "name": c.ballot_name(),
        "party": acronym,
        "votes": c.votes(),
        "federated": c.is_federated(),
    })
}

fn ranked_to_json(registry: &ElectionRegistry, l: &[RankedCandidate]) -> Vec<JSValue> {
    l.iter()
        .map(|rc| {
            json!({
                "position": rc.position,
                "candidate": candidate_to_json(registry, rc.candidate),
            })
        })
        .collect()
}

// Shares are rounded so that summaries can be compared as text.
fn rounded_share(x: f64) -> f64 {
    (x * 10_000.0).round() / 10_000.0
}

fn count_to_json(count: u64, share: f64) -> JSValue {
    json!({"count": count, "share": rounded_share(share)})
}

fn age_key(bracket: AgeBracket) -> &'static str {
    match bracket {
        AgeBracket::Under30 => "under30",
        AgeBracket::From30To39 => "from30To39",
        AgeBracket::From40To49 => "from40To49",
        AgeBracket::From50To59 => "from50To59",
        AgeBracket::From60 => "from60",
    }
}

fn results_to_json(
    registry: &ElectionRegistry,
    summary: &AggregationSummary,
    election_date: NaiveDate,
) -> JSValue {
    let elected: Vec<JSValue> = registry
        .elected_candidates()
        .into_iter()
        .map(|c| candidate_to_json(registry, c))
        .collect();

    let parties: Vec<JSValue> = stats::party_ranking(registry)
        .iter()
        .map(|rp| {
            json!({
                "position": rp.position,
                "number": rp.party.number(),
                "acronym": rp.party.acronym(),
                "nominalVotes": rp.party.nominal_votes(),
                "listVotes": rp.party.list_votes(),
                "totalVotes": rp.party.total_votes(),
                "elected": rp.party.num_elected(),
            })
        })
        .collect();

    let extremes: Vec<JSValue> = stats::party_extremes(registry)
        .iter()
        .map(|e| {
            json!({
                "party": e.party.number(),
                "acronym": e.party.acronym(),
                "first": candidate_to_json(registry, e.first),
                "last": candidate_to_json(registry, e.last),
            })
        })
        .collect();

    let ages = stats::age_distribution(registry, election_date);
    let mut ages_js = serde_json::Map::new();
    for bracket in AgeBracket::ALL {
        ages_js.insert(
            age_key(bracket).to_string(),
            count_to_json(ages.count(bracket), ages.share(bracket)),
        );
    }

    let genders = stats::gender_distribution(registry);
    let totals = stats::vote_totals(registry);

    json!({
        "seats": registry.seat_count(),
        "elected": elected,
        "mostVoted": ranked_to_json(registry, &stats::most_voted(registry)),
        "pluralityOnly": ranked_to_json(registry, &stats::plurality_only(registry)),
        "proportionalBeneficiaries": stats::proportional_beneficiaries(registry)
            .map(|l| ranked_to_json(registry, &l)),
        "parties": parties,
        "partyExtremes": extremes,
        "ageDistribution": ages_js,
        "genderDistribution": {
            "male": count_to_json(genders.male, genders.share(Gender::Male)),
            "female": count_to_json(genders.female, genders.share(Gender::Female)),
            "unspecified": count_to_json(genders.unspecified, genders.share(Gender::Unspecified)),
        },
        "voteTotals": {
            "total": totals.total(),
            "nominal": count_to_json(totals.nominal, totals.nominal_share()),
            "list": count_to_json(totals.list, totals.list_share()),
        },
        "aggregation": {
            "nominalRecords": summary.nominal_records,
            "listRecords": summary.list_records,
            "filteredRecords": summary.filtered_records,
            "discardedRecords": summary.discarded_records,
        },
    })
}

fn build_summary_js(
    settings: &ElectionSettings,
    registry: &ElectionRegistry,
    summary: &AggregationSummary,
) -> JSValue {
    let c = OutputConfig {
        contest: settings.contest_name.clone(),
        date: Some(format_date(settings.election_date)),
        jurisdiction: Some(settings.municipality.clone()),
        office: settings.office.clone(),
        seats: registry.seat_count(),
    };
    json!({
        "config": c,
        "results": results_to_json(registry, summary, settings.election_date)
    })
}

/// Reads the inputs, tallies the election and produces the outputs.
pub fn run_election(settings: &ElectionSettings) -> TallyResult<()> {
    let (candidates_path, candidates_cfs) = &settings.candidate_source;
    let candidates = match candidates_cfs.provider.as_str() {
        "tse_csv" => io_csv::read_candidates(candidates_path, candidates_cfs)?,
        x => {
            return UnsupportedSnafu {
                what: "candidate provider",
                value: x,
            }
            .fail()
        }
    };
    let (votes_path, votes_cfs) = &settings.vote_source;
    let votes = match votes_cfs.provider.as_str() {
        "tse_csv" => io_csv::read_votes(votes_path, votes_cfs, &settings.municipality)?,
        x => {
            return UnsupportedSnafu {
                what: "vote provider",
                value: x,
            }
            .fail()
        }
    };

    let mut builder = Builder::new(&settings.municipality).candidates(&candidates);
    for v in votes {
        builder.add_vote(v);
    }
    let (registry, summary) = builder.build_with_summary().context(TallyingSnafu {})?;
    info!(
        "run_election: {} candidates, {} seats, {} valid votes",
        registry.num_candidates(),
        registry.seat_count(),
        summary.applied_votes()
    );

    if settings.print_report {
        let stdout = std::io::stdout();
        let mut lock = stdout.lock();
        report::write_report(&mut lock, &registry, settings.election_date)
            .context(WritingOutputSnafu { path: "stdout" })?;
    }

    let result_js = build_summary_js(settings, &registry, &summary);
    let pretty_js_stats = serde_json::to_string_pretty(&result_js).context(WritingJsonSnafu {})?;
    debug!("run_election: summary: {}", pretty_js_stats);

    match settings.out.as_deref() {
        Some("stdout") => println!("{}", pretty_js_stats),
        Some(out_path) => {
            info!("Writing summary to {:?}", out_path);
            let mut f = fs::File::create(out_path).context(WritingOutputSnafu { path: out_path })?;
            writeln!(f, "{}", pretty_js_stats).context(WritingOutputSnafu { path: out_path })?;
        }
        None => {}
    }

    // The reference summary, if provided for comparison
    if let Some(summary_p) = &settings.reference {
        let summary_ref = read_summary(summary_p)?;
        let pretty_js_summary_ref =
            serde_json::to_string_pretty(&summary_ref).context(WritingJsonSnafu {})?;
        if pretty_js_summary_ref != pretty_js_stats {
            warn!("Found differences with the reference summary {}", summary_p);
            print_diff(
                pretty_js_summary_ref.as_str(),
                pretty_js_stats.as_ref(),
                "\n",
            );
            whatever!("Difference detected between calculated summary and reference summary")
        }
        info!("Summary matches the reference {}", summary_p);
    }

    Ok(())
}

pub fn run(args: &Args) -> TallyResult<()> {
    let settings = resolve_settings(args)?;
    info!("settings: {:?}", settings);
    run_election(&settings)
}

#[cfg(test)]
fn run_election_test(test_name: &str, config_lpath: &str, summary_lpath: &str) -> TallyResult<()> {
    let test_dir = option_env!("CTALLY_TEST_DIR").unwrap_or("tests/data");
    info!("Running test {}", test_name);
    let args = Args {
        config: Some(format!("{}/{}/{}", test_dir, test_name, config_lpath)),
        municipality: None,
        candidates: None,
        votes: None,
        date: None,
        out: None,
        reference: Some(format!("{}/{}/{}", test_dir, test_name, summary_lpath)),
        quiet: true,
        verbose: false,
    };
    run(&args)
}

#[cfg(test)]
pub fn test_wrapper(test_name: &str) {
    let res = run_election_test(test_name, "config.json", "expected_summary.json");
    if let Err(e) = res {
        eprintln!("An error occured {}", e);
        if let Some(bt) = snafu::ErrorCompat::backtrace(&e) {
            eprintln!("trace: {}", bt);
        }
        panic!("test {} failed: {:?}", test_name, e);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    #[test]
    fn small_city() {
        init_logger();
        test_wrapper("small_city");
    }

    #[test]
    fn command_line_overrides_the_config() {
        let args = Args {
            config: Some("tests/data/small_city/config.json".to_string()),
            municipality: Some("12345".to_string()),
            candidates: None,
            votes: Some("other/votos.csv".to_string()),
            date: Some("01/01/2025".to_string()),
            out: None,
            reference: None,
            quiet: false,
            verbose: false,
        };
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.municipality, "12345");
        assert_eq!(
            settings.election_date,
            NaiveDate::from_ymd_opt(2025, 1, 1).unwrap()
        );
        assert_eq!(settings.vote_source.0, "other/votos.csv");
        assert_eq!(
            settings.candidate_source.0,
            Path::new("tests/data/small_city")
                .join("candidatos.csv")
                .display()
                .to_string()
        );
        assert_eq!(settings.contest_name, "Cidade Pequena 2024");
        assert_eq!(settings.out, None);
        assert!(settings.print_report);
    }

    #[test]
    fn missing_settings() {
        let args = Args {
            config: None,
            municipality: Some("57053".to_string()),
            candidates: Some("c.csv".to_string()),
            votes: Some("v.csv".to_string()),
            date: None,
            out: None,
            reference: None,
            quiet: true,
            verbose: false,
        };
        assert!(matches!(
            resolve_settings(&args),
            Err(TallyError::MissingSetting { .. })
        ));
        let args = Args {
            date: Some("06/10/2024".to_string()),
            ..args
        };
        let settings = resolve_settings(&args).unwrap();
        assert_eq!(settings.contest_name, "Eleição municipal 57053");
        assert_eq!(settings.candidate_source.1, FileSource::tse("c.csv"));
    }

    #[test]
    fn reference_mismatch_fails() {
        let args = Args {
            config: Some("tests/data/small_city/config.json".to_string()),
            municipality: None,
            candidates: None,
            votes: None,
            date: Some("01/01/2030".to_string()),
            out: None,
            reference: Some("tests/data/small_city/expected_summary.json".to_string()),
            quiet: true,
            verbose: false,
        };
        assert!(matches!(run(&args), Err(TallyError::Whatever { .. })));
    }
}
