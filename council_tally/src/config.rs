// ********* Reference data ***********

use chrono::NaiveDate;
use std::error::Error;
use std::fmt::Display;

/// The office a candidate runs for, as coded by the electoral court (`CD_CARGO`).
///
/// Only council members are tabulated. There is deliberately no fallback value:
/// a code outside the table cannot be classified and is reported as
/// [`TallyErrors::UnknownOffice`].
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Office {
    CouncilMember,
}

impl Office {
    pub const ALL: [Office; 1] = [Office::CouncilMember];

    pub fn code(self) -> i32 {
        match self {
            Office::CouncilMember => 13,
        }
    }

    pub fn from_code(code: i32) -> Result<Office, TallyErrors> {
        match code {
            13 => Ok(Office::CouncilMember),
            _ => Err(TallyErrors::UnknownOffice { code }),
        }
    }
}

/// The official outcome of a candidacy after the count (`CD_SIT_TOT_TURNO`).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum CandidacyOutcome {
    ElectedOutright,
    ElectedByPartyQuota,
    ElectedByAverage,
    NotElected,
    Alternate,
    SecondRound,
    Invalid,
}

impl CandidacyOutcome {
    pub const ALL: [CandidacyOutcome; 7] = [
        CandidacyOutcome::ElectedOutright,
        CandidacyOutcome::ElectedByPartyQuota,
        CandidacyOutcome::ElectedByAverage,
        CandidacyOutcome::NotElected,
        CandidacyOutcome::Alternate,
        CandidacyOutcome::SecondRound,
        CandidacyOutcome::Invalid,
    ];

    pub fn code(self) -> i32 {
        match self {
            CandidacyOutcome::ElectedOutright => 1,
            CandidacyOutcome::ElectedByPartyQuota => 2,
            CandidacyOutcome::ElectedByAverage => 3,
            CandidacyOutcome::NotElected => 4,
            CandidacyOutcome::Alternate => 5,
            CandidacyOutcome::SecondRound => 6,
            CandidacyOutcome::Invalid => -1,
        }
    }

    /// Unknown codes are treated as an invalid candidacy.
    pub fn from_code(code: i32) -> CandidacyOutcome {
        match code {
            1 => CandidacyOutcome::ElectedOutright,
            2 => CandidacyOutcome::ElectedByPartyQuota,
            3 => CandidacyOutcome::ElectedByAverage,
            4 => CandidacyOutcome::NotElected,
            5 => CandidacyOutcome::Alternate,
            6 => CandidacyOutcome::SecondRound,
            _ => CandidacyOutcome::Invalid,
        }
    }

    /// Whether this outcome holds one of the proportional seats.
    ///
    /// `ElectedOutright` is a majoritarian seat and is not counted here: only
    /// the party quota and the average distribution fill council seats.
    pub fn is_elected(self) -> bool {
        matches!(
            self,
            CandidacyOutcome::ElectedByPartyQuota | CandidacyOutcome::ElectedByAverage
        )
    }
}

/// Gender as declared by the candidate (`CD_GENERO`).
#[derive(Eq, PartialEq, Debug, Clone, Copy, Hash)]
pub enum Gender {
    Male,
    Female,
    Unspecified,
}

impl Gender {
    pub const ALL: [Gender; 3] = [Gender::Male, Gender::Female, Gender::Unspecified];

    pub fn code(self) -> i32 {
        match self {
            Gender::Male => 2,
            Gender::Female => 4,
            Gender::Unspecified => 0,
        }
    }

    /// Unknown codes are treated as unspecified.
    pub fn from_code(code: i32) -> Gender {
        match code {
            2 => Gender::Male,
            4 => Gender::Female,
            _ => Gender::Unspecified,
        }
    }
}

// ********* Input data structures ***********

/// One row of the candidate source, before any validation.
///
/// The codes are kept raw: classification happens when the candidate is
/// registered.
#[derive(Eq, PartialEq, Debug, Clone)]
pub struct CandidateRecord {
    pub municipality: String,
    pub office_code: i32,
    pub number: u32,
    pub ballot_name: String,
    pub party_number: u32,
    pub party_acronym: String,
    /// -1 when the party is not part of a federation.
    pub federation_number: i32,
    pub birth_date: NaiveDate,
    pub outcome_code: i32,
    pub gender_code: i32,
}

/// One row of the vote source.
///
/// `target` is a candidate number when it is above 99 and a party number
/// otherwise. `quantity` is signed so that corrupted inputs can be detected
/// and rejected instead of wrapping around.
#[derive(Eq, PartialEq, Debug, Clone, Hash)]
pub struct VoteRecord {
    pub office_code: i32,
    pub municipality: String,
    pub target: u32,
    pub quantity: i64,
}

// ********* Errors **********

/// Errors that prevent an input from being classified or tallied.
#[derive(Eq, PartialEq, Debug, Clone)]
pub enum TallyErrors {
    /// The office code is not in the reference table.
    UnknownOffice { code: i32 },
    /// A vote record that would have been counted carries a negative quantity.
    NegativeVoteQuantity { target: u32, quantity: i64 },
}

impl Error for TallyErrors {}

impl Display for TallyErrors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TallyErrors::UnknownOffice { code } => write!(f, "unknown office code {}", code),
            TallyErrors::NegativeVoteQuantity { target, quantity } => write!(
                f,
                "negative vote quantity {} for target {}",
                quantity, target
            ),
        }
    }
}
