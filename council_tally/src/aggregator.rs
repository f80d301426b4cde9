use log::{debug, info};

use std::ops::RangeInclusive;

use crate::{CandidateKey, ElectionRegistry, Office, PartyNumber, TallyErrors, VoteRecord};

/// Targets reserved for blank and null votes. They are never counted.
pub const BLANK_AND_NULL_TARGETS: RangeInclusive<u32> = 95..=98;

/// Targets up to this number are party (list) votes, above it candidate votes.
pub const MAX_PARTY_TARGET: u32 = 99;

/// What happened to a batch of vote records.
#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct AggregationSummary {
    pub nominal_records: usize,
    pub nominal_votes: u64,
    pub list_records: usize,
    pub list_votes: u64,
    /// Records rejected by the validity filter (office, blank or null).
    pub filtered_records: usize,
    /// Valid records whose candidate or party is not registered.
    pub discarded_records: usize,
}

impl AggregationSummary {
    pub fn applied_votes(&self) -> u64 {
        self.nominal_votes + self.list_votes
    }
}

/// Whether a vote record may be counted at all: a council member vote that is
/// neither blank nor null.
pub fn is_countable(vote: &VoteRecord) -> bool {
    Office::from_code(vote.office_code) == Ok(Office::CouncilMember)
        && !BLANK_AND_NULL_TARGETS.contains(&vote.target)
}

pub fn is_nominal(vote: &VoteRecord) -> bool {
    vote.target > MAX_PARTY_TARGET
}

#[derive(Eq, PartialEq, Debug, Clone)]
enum Credit {
    Candidate(CandidateKey, u64),
    Party(PartyNumber, u64),
}

/// Adds a batch of votes to the registry.
///
/// Every record is counted once: nominal votes go to the candidate and to the
/// candidate's party, list votes go to the party. Records that fail the
/// validity filter or that point to an unknown candidate or party are skipped.
/// Duplicate records are not detected.
///
/// A negative quantity on a record that would have been counted rejects the
/// whole batch and leaves the registry untouched.
pub fn apply_votes<'a, I>(
    registry: &mut ElectionRegistry,
    votes: I,
) -> Result<AggregationSummary, TallyErrors>
where
    I: IntoIterator<Item = &'a VoteRecord>,
{
    let mut summary = AggregationSummary::default();
    let mut credits: Vec<Credit> = Vec::new();

    for vote in votes {
        if !is_countable(vote) {
            summary.filtered_records += 1;
            continue;
        }

        let credit = if is_nominal(vote) {
            registry
                .find_candidate(&vote.municipality, vote.target)
                .map(|c| quantity(vote).map(|q| Credit::Candidate(c.key().clone(), q)))
        } else {
            registry
                .find_party(vote.target)
                .map(|p| quantity(vote).map(|q| Credit::Party(p.number(), q)))
        };

        match credit {
            Some(c) => credits.push(c?),
            None => {
                debug!("apply_votes: no match for vote {:?}", vote);
                summary.discarded_records += 1;
            }
        }
    }

    for credit in credits {
        match credit {
            Credit::Candidate(key, q) => {
                registry.credit_candidate(&key, q);
                summary.nominal_records += 1;
                summary.nominal_votes += q;
            }
            Credit::Party(number, q) => {
                registry.credit_party(number, q);
                summary.list_records += 1;
                summary.list_votes += q;
            }
        }
    }

    info!(
        "apply_votes: {} nominal votes in {} records, {} list votes in {} records, {} filtered, {} discarded",
        summary.nominal_votes,
        summary.nominal_records,
        summary.list_votes,
        summary.list_records,
        summary.filtered_records,
        summary.discarded_records
    );
    Ok(summary)
}

fn quantity(vote: &VoteRecord) -> Result<u64, TallyErrors> {
    u64::try_from(vote.quantity).map_err(|_| TallyErrors::NegativeVoteQuantity {
        target: vote.target,
        quantity: vote.quantity,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_util::*;
    use crate::CandidacyOutcome;

    fn registry() -> ElectionRegistry {
        init_logger();
        let mut reg = ElectionRegistry::new("57053");
        reg.register_candidates(&[
            record(
                11001,
                (11, "ABC"),
                CandidacyOutcome::ElectedByPartyQuota,
                date(1970, 1, 1),
            ),
            record(
                22002,
                (22, "XYZ"),
                CandidacyOutcome::NotElected,
                date(1980, 1, 1),
            ),
        ]);
        reg
    }

    #[test]
    fn nominal_and_list_votes() {
        let mut reg = registry();
        assert_eq!(reg.seat_count(), 1);
        let summary = reg.apply_votes(&[vote(11001, 500), vote(22, 300)]).unwrap();

        let p11 = reg.find_party(11).unwrap();
        assert_eq!(p11.nominal_votes(), 500);
        assert_eq!(p11.list_votes(), 0);
        let p22 = reg.find_party(22).unwrap();
        assert_eq!(p22.nominal_votes(), 0);
        assert_eq!(p22.list_votes(), 300);
        assert_eq!(reg.find_candidate("57053", 11001).unwrap().votes(), 500);

        let total: u64 = reg.parties().map(|p| p.total_votes()).sum();
        assert_eq!(total, 800);
        assert_eq!(summary.applied_votes(), 800);
        assert_eq!(reg.seat_count(), 1);
    }

    #[test]
    fn blank_and_null_band_is_ignored() {
        let mut reg = registry();
        // Party numbers inside the band must not collect anything either.
        reg.register_party(95, "BLK");
        reg.register_party(98, "NUL");
        let votes: Vec<VoteRecord> = (95..=98).map(|t| vote(t, 1_000)).collect();
        let summary = reg.apply_votes(&votes).unwrap();
        assert_eq!(summary.filtered_records, 4);
        assert!(reg.parties().all(|p| p.total_votes() == 0));
        assert!(reg.candidates().all(|c| c.votes() == 0));
    }

    #[test]
    fn band_edges_are_counted() {
        let mut reg = registry();
        reg.register_party(94, "A");
        reg.register_party(99, "B");
        let summary = reg.apply_votes(&[vote(94, 3), vote(99, 4)]).unwrap();
        assert_eq!(summary.list_votes, 7);
        assert_eq!(reg.find_party(94).unwrap().list_votes(), 3);
        assert_eq!(reg.find_party(99).unwrap().list_votes(), 4);
    }

    #[test]
    fn other_offices_are_filtered() {
        let mut reg = registry();
        let mut v = vote(11001, 10);
        v.office_code = 11;
        let summary = reg.apply_votes(&[v]).unwrap();
        assert_eq!(summary.filtered_records, 1);
        assert_eq!(reg.find_candidate("57053", 11001).unwrap().votes(), 0);
    }

    #[test]
    fn unknown_candidate_vote_is_fully_discarded() {
        let mut reg = registry();
        let summary = reg.apply_votes(&[vote(11999, 50), vote(33, 10)]).unwrap();
        assert_eq!(summary.discarded_records, 2);
        assert!(reg.parties().all(|p| p.total_votes() == 0));
    }

    #[test]
    fn other_municipality_misses_the_candidate() {
        let mut reg = registry();
        let mut v = vote(11001, 10);
        v.municipality = "11111".to_string();
        let summary = reg.apply_votes(&[v]).unwrap();
        assert_eq!(summary.discarded_records, 1);
        assert_eq!(reg.find_party(11).unwrap().nominal_votes(), 0);
    }

    #[test]
    fn negative_quantity_rejects_the_batch() {
        let mut reg = registry();
        let res = reg.apply_votes(&[vote(11001, 10), vote(22, -3)]);
        assert_eq!(
            res,
            Err(TallyErrors::NegativeVoteQuantity {
                target: 22,
                quantity: -3
            })
        );
        assert_eq!(reg.find_candidate("57053", 11001).unwrap().votes(), 0);
        assert_eq!(reg.find_party(11).unwrap().nominal_votes(), 0);
    }

    #[test]
    fn negative_quantity_on_a_skipped_record_is_harmless() {
        let mut reg = registry();
        let summary = reg.apply_votes(&[vote(96, -3), vote(11999, -1)]).unwrap();
        assert_eq!(summary.filtered_records, 1);
        assert_eq!(summary.discarded_records, 1);
    }

    #[test]
    fn duplicate_records_are_counted_twice() {
        let mut reg = registry();
        let v = vote(11001, 10);
        reg.apply_votes(&[v.clone(), v]).unwrap();
        assert_eq!(reg.find_candidate("57053", 11001).unwrap().votes(), 20);
    }
}
