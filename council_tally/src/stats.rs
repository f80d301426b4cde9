//! Read-only rankings and distributions over a populated registry.
//!
//! Nothing here is cached: every function recomputes from the registry.

use chrono::{Datelike, NaiveDate};
use log::debug;

use std::cmp::Ordering;

use crate::{candidate_order, sort_candidates, Candidate, ElectionRegistry, Gender, Party};

/// A candidate with its 1-based position in the most voted ranking.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RankedCandidate<'a> {
    pub position: usize,
    pub candidate: &'a Candidate,
}

#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct RankedParty<'a> {
    pub position: usize,
    pub party: &'a Party,
}

/// The best and worst placed candidates of a party.
#[derive(Eq, PartialEq, Debug, Clone, Copy)]
pub struct PartyExtremes<'a> {
    pub party: &'a Party,
    pub first: &'a Candidate,
    pub last: &'a Candidate,
}

/// Fraction of `count` over `total`, or 0 when there is nothing to divide by.
pub fn share(count: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        count as f64 / total as f64
    }
}

fn ranked(registry: &ElectionRegistry) -> Vec<RankedCandidate<'_>> {
    registry
        .ranked_candidates()
        .into_iter()
        .enumerate()
        .map(|(idx, candidate)| RankedCandidate {
            position: idx + 1,
            candidate,
        })
        .collect()
}

/// The most voted candidates, as many as there are seats.
pub fn most_voted(registry: &ElectionRegistry) -> Vec<RankedCandidate<'_>> {
    let mut res = ranked(registry);
    res.truncate(registry.seat_count());
    res
}

/// Candidates who would have taken a seat under plurality voting but were
/// not elected.
pub fn plurality_only(registry: &ElectionRegistry) -> Vec<RankedCandidate<'_>> {
    most_voted(registry)
        .into_iter()
        .filter(|rc| !rc.candidate.is_elected())
        .collect()
}

/// Elected candidates who would not have taken a seat under plurality voting:
/// they received fewer votes than the last candidate within the seat count.
///
/// Returns `None` when there are no seats, since there is no such last
/// candidate.
pub fn proportional_beneficiaries(registry: &ElectionRegistry) -> Option<Vec<RankedCandidate<'_>>> {
    let seats = registry.seat_count();
    if seats == 0 {
        return None;
    }
    let all = ranked(registry);
    let threshold = all.get(seats - 1)?.candidate.votes();
    debug!(
        "proportional_beneficiaries: {} seats, last plurality seat at {} votes",
        seats, threshold
    );
    Some(
        all.into_iter()
            .filter(|rc| rc.candidate.is_elected() && rc.candidate.votes() < threshold)
            .collect(),
    )
}

pub fn party_ranking(registry: &ElectionRegistry) -> Vec<RankedParty<'_>> {
    registry
        .ranked_parties()
        .into_iter()
        .enumerate()
        .map(|(idx, party)| RankedParty {
            position: idx + 1,
            party,
        })
        .collect()
}

/// First and last placed candidates of every party that has candidates and
/// nominal votes.
///
/// Parties are ordered by their first placed candidate, using the candidate
/// order, then by party number.
pub fn party_extremes(registry: &ElectionRegistry) -> Vec<PartyExtremes<'_>> {
    let mut res: Vec<PartyExtremes> = Vec::new();
    for party in registry.parties() {
        if party.nominal_votes() == 0 {
            continue;
        }
        let mut candidates = registry.party_candidates(party);
        sort_candidates(&mut candidates);
        if let (Some(&first), Some(&last)) = (candidates.first(), candidates.last()) {
            res.push(PartyExtremes {
                party,
                first,
                last,
            });
        }
    }
    res.sort_by(|a, b| {
        candidate_order(a.first, b.first).then_with(|| a.party.number().cmp(&b.party.number()))
    });
    res
}

// **** Age ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash, PartialOrd, Ord)]
pub enum AgeBracket {
    Under30,
    From30To39,
    From40To49,
    From50To59,
    From60,
}

impl AgeBracket {
    pub const ALL: [AgeBracket; 5] = [
        AgeBracket::Under30,
        AgeBracket::From30To39,
        AgeBracket::From40To49,
        AgeBracket::From50To59,
        AgeBracket::From60,
    ];

    pub fn for_age(years: i32) -> AgeBracket {
        match years {
            y if y < 30 => AgeBracket::Under30,
            y if y < 40 => AgeBracket::From30To39,
            y if y < 50 => AgeBracket::From40To49,
            y if y < 60 => AgeBracket::From50To59,
            _ => AgeBracket::From60,
        }
    }

    fn index(self) -> usize {
        match self {
            AgeBracket::Under30 => 0,
            AgeBracket::From30To39 => 1,
            AgeBracket::From40To49 => 2,
            AgeBracket::From50To59 => 3,
            AgeBracket::From60 => 4,
        }
    }
}

/// Whole years between the birth date and the reference date.
pub fn age_at(birth_date: NaiveDate, reference: NaiveDate) -> i32 {
    let years = reference.year() - birth_date.year();
    match (reference.month(), reference.day()).cmp(&(birth_date.month(), birth_date.day())) {
        Ordering::Less => years - 1,
        _ => years,
    }
}

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct AgeDistribution {
    counts: [u64; 5],
}

impl AgeDistribution {
    pub fn count(&self, bracket: AgeBracket) -> u64 {
        self.counts[bracket.index()]
    }

    pub fn total(&self) -> u64 {
        self.counts.iter().sum()
    }

    pub fn share(&self, bracket: AgeBracket) -> f64 {
        share(self.count(bracket), self.total())
    }
}

/// Age of the elected candidates at the reference (election) date.
pub fn age_distribution(registry: &ElectionRegistry, reference: NaiveDate) -> AgeDistribution {
    let mut res = AgeDistribution::default();
    for c in registry.elected_candidates() {
        let bracket = AgeBracket::for_age(age_at(c.birth_date(), reference));
        res.counts[bracket.index()] += 1;
    }
    res
}

// **** Gender ****

#[derive(Eq, PartialEq, Debug, Clone, Default)]
pub struct GenderDistribution {
    pub male: u64,
    pub female: u64,
    pub unspecified: u64,
}

impl GenderDistribution {
    pub fn count(&self, gender: Gender) -> u64 {
        match gender {
            Gender::Male => self.male,
            Gender::Female => self.female,
            Gender::Unspecified => self.unspecified,
        }
    }

    pub fn total(&self) -> u64 {
        self.male + self.female + self.unspecified
    }

    pub fn share(&self, gender: Gender) -> f64 {
        share(self.count(gender), self.total())
    }
}

pub fn gender_distribution(registry: &ElectionRegistry) -> GenderDistribution {
    let mut res = GenderDistribution::default();
    for c in registry.elected_candidates() {
        match c.gender() {
            Gender::Male => res.male += 1,
            Gender::Female => res.female += 1,
            Gender::Unspecified => res.unspecified += 1,
        }
    }
    res
}

// **** Votes ****

#[derive(Eq, PartialEq, Debug, Clone, Copy, Default)]
pub struct VoteTotals {
    pub nominal: u64,
    pub list: u64,
}

impl VoteTotals {
    pub fn total(&self) -> u64 {
        self.nominal + self.list
    }

    pub fn nominal_share(&self) -> f64 {
        share(self.nominal, self.total())
    }

    pub fn list_share(&self) -> f64 {
        share(self.list, self.total())
    }
}

pub fn vote_totals(registry: &ElectionRegistry) -> VoteTotals {
    registry
        .parties()
        .fold(VoteTotals::default(), |acc, p| VoteTotals {
            nominal: acc.nominal + p.nominal_votes(),
            list: acc.list + p.list_votes(),
        })
}
