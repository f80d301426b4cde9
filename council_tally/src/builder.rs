pub use crate::config::*;

use log::debug;

use crate::{AggregationSummary, ElectionRegistry};

/// A builder that collects raw records before creating the registry.
///
/// Building happens in phases: all the parties are registered first, so that
/// every candidate is created directly against its final party; the
/// candidates are registered next, and the votes are applied last.
///
/// ```
/// use council_tally::builder::Builder;
/// use council_tally::{CandidacyOutcome, CandidateRecord, Gender, Office, TallyErrors};
/// use chrono::NaiveDate;
///
/// let mut builder = Builder::new("57053");
/// builder.add_candidate(CandidateRecord {
///     municipality: "57053".to_string(),
///     office_code: Office::CouncilMember.code(),
///     number: 11001,
///     ballot_name: "Ana".to_string(),
///     party_number: 11,
///     party_acronym: "ABC".to_string(),
///     federation_number: -1,
///     birth_date: NaiveDate::from_ymd_opt(1970, 1, 1).unwrap(),
///     outcome_code: CandidacyOutcome::ElectedByPartyQuota.code(),
///     gender_code: Gender::Female.code(),
/// });
/// builder.add_vote_simple(11001, 500);
/// builder.add_vote_simple(11, 300);
///
/// let registry = builder.build()?;
/// assert_eq!(registry.seat_count(), 1);
/// assert_eq!(registry.find_party(11).unwrap().total_votes(), 800);
///
/// # Ok::<(), TallyErrors>(())
/// ```
pub struct Builder {
    pub(crate) _municipality: String,
    pub(crate) _candidates: Vec<CandidateRecord>,
    pub(crate) _votes: Vec<VoteRecord>,
}

impl Builder {
    pub fn new(municipality: &str) -> Builder {
        Builder {
            _municipality: municipality.to_string(),
            _candidates: Vec::new(),
            _votes: Vec::new(),
        }
    }

    pub fn candidates(self, records: &[CandidateRecord]) -> Builder {
        Builder {
            _municipality: self._municipality,
            _candidates: records.to_vec(),
            _votes: self._votes,
        }
    }

    pub fn add_candidate(&mut self, record: CandidateRecord) {
        self._candidates.push(record);
    }

    /// Adds a council member vote for this municipality.
    ///
    /// It is the simplest use case for most cases.
    pub fn add_vote_simple(&mut self, target: u32, quantity: i64) {
        let vote = VoteRecord {
            office_code: Office::CouncilMember.code(),
            municipality: self._municipality.clone(),
            target,
            quantity,
        };
        self.add_vote(vote)
    }

    pub fn add_vote(&mut self, vote: VoteRecord) {
        self._votes.push(vote);
    }

    pub fn build(self) -> Result<ElectionRegistry, TallyErrors> {
        self.build_with_summary().map(|(registry, _)| registry)
    }

    /// Same as [`Builder::build`], also returning what happened to the votes.
    pub fn build_with_summary(self) -> Result<(ElectionRegistry, AggregationSummary), TallyErrors> {
        let mut registry = ElectionRegistry::new(&self._municipality);
        for r in self._candidates.iter() {
            registry.register_party(r.party_number, &r.party_acronym);
        }
        debug!(
            "build: {} parties resolved from {} candidate records",
            registry.parties().count(),
            self._candidates.len()
        );
        registry.register_candidates(self._candidates.iter());
        let summary = registry.apply_votes(self._votes.iter())?;
        Ok((registry, summary))
    }
}
