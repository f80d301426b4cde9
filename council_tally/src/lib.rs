mod config;

pub mod aggregator;
pub mod builder;
pub mod manual;
pub mod stats;

use chrono::NaiveDate;
use log::{debug, info, warn};

use std::{cmp::Ordering, collections::BTreeMap};

pub use crate::aggregator::AggregationSummary;
pub use crate::config::*;

pub type PartyNumber = u32;

// **** Entities ****

/// Identity of a candidate: the municipality and the candidacy number.
#[derive(Eq, PartialEq, Debug, Clone, Hash, Ord, PartialOrd)]
pub struct CandidateKey {
    pub municipality: String,
    pub number: u32,
}

impl CandidateKey {
    pub fn new(municipality: &str, number: u32) -> CandidateKey {
        CandidateKey {
            municipality: municipality.to_string(),
            number,
        }
    }
}

/// A council member candidate that passed validation.
///
/// The party is held by number: the registry owns the one `Party` for each
/// number, so tallies can never be split across copies.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Candidate {
    key: CandidateKey,
    office: Office,
    ballot_name: String,
    party: PartyNumber,
    federation: Option<u32>,
    birth_date: NaiveDate,
    outcome: CandidacyOutcome,
    gender: Gender,
    votes: u64,
}

impl Candidate {
    fn new(record: &CandidateRecord, office: Office, party: PartyNumber) -> Candidate {
        Candidate {
            key: CandidateKey::new(&record.municipality, record.number),
            office,
            ballot_name: record.ballot_name.clone(),
            party,
            federation: u32::try_from(record.federation_number).ok(),
            birth_date: record.birth_date,
            outcome: CandidacyOutcome::from_code(record.outcome_code),
            gender: Gender::from_code(record.gender_code),
            votes: 0,
        }
    }

    pub fn key(&self) -> &CandidateKey {
        &self.key
    }

    pub fn municipality(&self) -> &str {
        &self.key.municipality
    }

    pub fn number(&self) -> u32 {
        self.key.number
    }

    pub fn office(&self) -> Office {
        self.office
    }

    pub fn ballot_name(&self) -> &str {
        &self.ballot_name
    }

    pub fn party_number(&self) -> PartyNumber {
        self.party
    }

    pub fn federation(&self) -> Option<u32> {
        self.federation
    }

    pub fn is_federated(&self) -> bool {
        self.federation.is_some()
    }

    pub fn birth_date(&self) -> NaiveDate {
        self.birth_date
    }

    pub fn outcome(&self) -> CandidacyOutcome {
        self.outcome
    }

    pub fn gender(&self) -> Gender {
        self.gender
    }

    pub fn votes(&self) -> u64 {
        self.votes
    }

    pub fn is_elected(&self) -> bool {
        self.outcome.is_elected()
    }
}

#[derive(Eq, PartialEq, Debug, Clone)]
pub struct Party {
    number: PartyNumber,
    acronym: String,
    nominal_votes: u64,
    list_votes: u64,
    // Registration order.
    candidates: Vec<CandidateKey>,
    elected: Vec<CandidateKey>,
}

impl Party {
    fn new(number: PartyNumber, acronym: &str) -> Party {
        Party {
            number,
            acronym: acronym.to_string(),
            nominal_votes: 0,
            list_votes: 0,
            candidates: Vec::new(),
            elected: Vec::new(),
        }
    }

    pub fn number(&self) -> PartyNumber {
        self.number
    }

    pub fn acronym(&self) -> &str {
        &self.acronym
    }

    pub fn nominal_votes(&self) -> u64 {
        self.nominal_votes
    }

    pub fn list_votes(&self) -> u64 {
        self.list_votes
    }

    pub fn total_votes(&self) -> u64 {
        self.nominal_votes + self.list_votes
    }

    pub fn candidates(&self) -> &[CandidateKey] {
        &self.candidates
    }

    pub fn elected(&self) -> &[CandidateKey] {
        &self.elected
    }

    pub fn num_elected(&self) -> usize {
        self.elected.len()
    }
}

// **** Orderings ****

/// Most votes first. Between equal vote counts, the older candidate first.
pub fn candidate_order(a: &Candidate, b: &Candidate) -> Ordering {
    b.votes
        .cmp(&a.votes)
        .then_with(|| a.birth_date.cmp(&b.birth_date))
}

/// Most total votes first. Between equal totals, the lower party number first.
pub fn party_order(a: &Party, b: &Party) -> Ordering {
    b.total_votes()
        .cmp(&a.total_votes())
        .then_with(|| a.number.cmp(&b.number))
}

/// Sorts by `candidate_order`, falling back to the key so that the output does
/// not depend on the storage order.
pub(crate) fn sort_candidates(candidates: &mut [&Candidate]) {
    candidates.sort_by(|a, b| candidate_order(a, b).then_with(|| a.key.cmp(&b.key)));
}

// **** Registry ****

/// All the candidates and parties of one council election in one municipality.
///
/// The registry is the only mutable state: candidates are registered first,
/// then votes are applied (see [`aggregator::apply_votes`]), then the
/// functions of [`stats`] are queried as often as needed.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct ElectionRegistry {
    municipality: String,
    candidates: BTreeMap<CandidateKey, Candidate>,
    parties: BTreeMap<PartyNumber, Party>,
    seat_count: usize,
}

impl ElectionRegistry {
    pub fn new(municipality: &str) -> ElectionRegistry {
        ElectionRegistry {
            municipality: municipality.to_string(),
            candidates: BTreeMap::new(),
            parties: BTreeMap::new(),
            seat_count: 0,
        }
    }

    pub fn municipality(&self) -> &str {
        &self.municipality
    }

    /// Number of council seats: the candidates registered with an elected
    /// outcome. Votes never change it.
    pub fn seat_count(&self) -> usize {
        self.seat_count
    }

    pub fn num_candidates(&self) -> usize {
        self.candidates.len()
    }

    /// Registers a party if its number has not been seen yet.
    ///
    /// The first registration wins: a later acronym for the same number is
    /// ignored.
    pub fn register_party(&mut self, number: PartyNumber, acronym: &str) -> &Party {
        self.party_entry(number, acronym)
    }

    fn party_entry(&mut self, number: PartyNumber, acronym: &str) -> &mut Party {
        self.parties.entry(number).or_insert_with(|| {
            debug!("register_party: new party {} {}", number, acronym);
            Party::new(number, acronym)
        })
    }

    /// Whether a candidate record takes part in this election: a council member
    /// of this municipality with a valid candidacy.
    pub fn is_valid(&self, record: &CandidateRecord) -> bool {
        Office::from_code(record.office_code) == Ok(Office::CouncilMember)
            && CandidacyOutcome::from_code(record.outcome_code) != CandidacyOutcome::Invalid
            && record.municipality == self.municipality
    }

    /// Registers a candidate and its party.
    ///
    /// The party is always registered. The candidate itself is only kept if
    /// it is valid; invalid records are dropped without error and `None` is
    /// returned. A record whose key is already registered is ignored as well.
    pub fn register_candidate(&mut self, record: &CandidateRecord) -> Option<&Candidate> {
        self.party_entry(record.party_number, &record.party_acronym);

        if !self.is_valid(record) {
            debug!(
                "register_candidate: dropping invalid candidate {} {:?}",
                record.number, record.ballot_name
            );
            return None;
        }
        let key = CandidateKey::new(&record.municipality, record.number);
        if self.candidates.contains_key(&key) {
            warn!(
                "register_candidate: candidate {:?} already registered, ignoring {:?}",
                key, record.ballot_name
            );
            return None;
        }

        let candidate = Candidate::new(record, Office::CouncilMember, record.party_number);
        let elected = candidate.is_elected();
        let party = self.party_entry(record.party_number, &record.party_acronym);
        party.candidates.push(key.clone());
        if elected {
            party.elected.push(key.clone());
            self.seat_count += 1;
        }
        self.candidates.insert(key.clone(), candidate);
        self.candidates.get(&key)
    }

    /// Registers all the records in order and returns how many candidates
    /// were kept.
    pub fn register_candidates<'a, I>(&mut self, records: I) -> usize
    where
        I: IntoIterator<Item = &'a CandidateRecord>,
    {
        let mut num_records = 0;
        let mut num_kept = 0;
        for record in records {
            num_records += 1;
            if self.register_candidate(record).is_some() {
                num_kept += 1;
            }
        }
        info!(
            "register_candidates: {} records, {} candidates kept, {} seats, {} parties",
            num_records,
            num_kept,
            self.seat_count,
            self.parties.len()
        );
        num_kept
    }

    pub fn find_candidate(&self, municipality: &str, number: u32) -> Option<&Candidate> {
        self.candidates.get(&CandidateKey::new(municipality, number))
    }

    pub fn find_party(&self, number: PartyNumber) -> Option<&Party> {
        self.parties.get(&number)
    }

    pub fn party_of(&self, candidate: &Candidate) -> Option<&Party> {
        self.parties.get(&candidate.party)
    }

    /// The candidates of a party, in registration order.
    pub fn party_candidates(&self, party: &Party) -> Vec<&Candidate> {
        party
            .candidates
            .iter()
            .filter_map(|key| self.candidates.get(key))
            .collect()
    }

    /// All the registered candidates, by key.
    pub fn candidates(&self) -> impl Iterator<Item = &Candidate> {
        self.candidates.values()
    }

    /// All the registered parties, by number.
    pub fn parties(&self) -> impl Iterator<Item = &Party> {
        self.parties.values()
    }

    /// The elected candidates, most voted first.
    pub fn elected_candidates(&self) -> Vec<&Candidate> {
        let mut res: Vec<&Candidate> = self.candidates().filter(|c| c.is_elected()).collect();
        sort_candidates(&mut res);
        res
    }

    /// All the candidates with a valid candidacy, most voted first.
    ///
    /// The list is not truncated to the number of seats.
    pub fn ranked_candidates(&self) -> Vec<&Candidate> {
        let mut res: Vec<&Candidate> = self
            .candidates()
            .filter(|c| c.outcome != CandidacyOutcome::Invalid)
            .collect();
        sort_candidates(&mut res);
        res
    }

    /// All the parties, most voted first.
    pub fn ranked_parties(&self) -> Vec<&Party> {
        let mut res: Vec<&Party> = self.parties().collect();
        res.sort_by(|a, b| party_order(a, b));
        res
    }

    /// Applies a batch of votes. See [`aggregator::apply_votes`].
    pub fn apply_votes<'a, I>(&mut self, votes: I) -> Result<AggregationSummary, TallyErrors>
    where
        I: IntoIterator<Item = &'a VoteRecord>,
    {
        aggregator::apply_votes(self, votes)
    }

    // Both credits are only called with keys resolved against this registry.

    fn credit_candidate(&mut self, key: &CandidateKey, quantity: u64) {
        if let Some(candidate) = self.candidates.get_mut(key) {
            candidate.votes += quantity;
            if let Some(party) = self.parties.get_mut(&candidate.party) {
                party.nominal_votes += quantity;
            }
        }
    }

    fn credit_party(&mut self, number: PartyNumber, quantity: u64) {
        if let Some(party) = self.parties.get_mut(&number) {
            party.list_votes += quantity;
        }
    }
}

#[cfg(test)]
pub(crate) mod test_util {
    use super::*;

    pub fn init_logger() {
        let _ = env_logger::builder().is_test(true).try_init();
    }

    pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    pub fn record(
        number: u32,
        party: (u32, &str),
        outcome: CandidacyOutcome,
        birth_date: NaiveDate,
    ) -> CandidateRecord {
        CandidateRecord {
            municipality: "57053".to_string(),
            office_code: Office::CouncilMember.code(),
            number,
            ballot_name: format!("Candidate {}", number),
            party_number: party.0,
            party_acronym: party.1.to_string(),
            federation_number: -1,
            birth_date,
            outcome_code: outcome.code(),
            gender_code: Gender::Unspecified.code(),
        }
    }

    pub fn vote(target: u32, quantity: i64) -> VoteRecord {
        VoteRecord {
            office_code: Office::CouncilMember.code(),
            municipality: "57053".to_string(),
            target,
            quantity,
        }
    }
}
