//! The text report, in Brazilian Portuguese.

use std::io::{self, Write};

use chrono::NaiveDate;
use council_tally::stats::{self, AgeBracket, RankedCandidate};
use council_tally::{Candidate, ElectionRegistry, Gender, Party};

/// Formats a count with `.` as the thousands separator.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut res = String::with_capacity(digits.len() + digits.len() / 3);
    for (idx, c) in digits.chars().enumerate() {
        if idx > 0 && (digits.len() - idx) % 3 == 0 {
            res.push('.');
        }
        res.push(c);
    }
    res
}

/// Formats a fraction as a percentage with two decimals and a decimal comma.
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0).replace('.', ",")
}

fn format_candidate(registry: &ElectionRegistry, c: &Candidate) -> String {
    format!(
        "{}{} ({}, {} votos)",
        if c.is_federated() { "*" } else { "" },
        c.ballot_name().to_uppercase(),
        registry.party_of(c).map(|p| p.acronym()).unwrap_or(""),
        format_count(c.votes())
    )
}

fn plural(n: u64, singular: &'static str, plural: &'static str) -> &'static str {
    if n > 1 {
        plural
    } else {
        singular
    }
}

fn format_party(p: &Party) -> String {
    let elected = p.num_elected() as u64;
    format!(
        "{} - {}, {} {} ({} {} e {} de legenda), {} {}",
        p.acronym(),
        p.number(),
        format_count(p.total_votes()),
        plural(p.total_votes(), "voto", "votos"),
        format_count(p.nominal_votes()),
        plural(p.nominal_votes(), "nominal", "nominais"),
        format_count(p.list_votes()),
        elected,
        plural(elected, "candidato eleito", "candidatos eleitos")
    )
}

fn write_ranked<W: Write>(
    w: &mut W,
    registry: &ElectionRegistry,
    l: &[RankedCandidate],
) -> io::Result<()> {
    for rc in l {
        writeln!(
            w,
            "{} - {}",
            rc.position,
            format_candidate(registry, rc.candidate)
        )?;
    }
    Ok(())
}

fn age_label(bracket: AgeBracket) -> &'static str {
    match bracket {
        AgeBracket::Under30 => "      Idade < 30",
        AgeBracket::From30To39 => "30 <= Idade < 40",
        AgeBracket::From40To49 => "40 <= Idade < 50",
        AgeBracket::From50To59 => "50 <= Idade < 60",
        AgeBracket::From60 => "60 <= Idade     ",
    }
}

/// Writes the full report of an election. Ages are computed at
/// `election_date`.
pub fn write_report<W: Write>(
    w: &mut W,
    registry: &ElectionRegistry,
    election_date: NaiveDate,
) -> io::Result<()> {
    writeln!(w, "Número de vagas: {}", registry.seat_count())?;
    writeln!(w)?;

    writeln!(w, "Vereadores eleitos:")?;
    for (idx, c) in registry.elected_candidates().into_iter().enumerate() {
        writeln!(w, "{} - {}", idx + 1, format_candidate(registry, c))?;
    }

    writeln!(w)?;
    writeln!(
        w,
        "Candidatos mais votados (em ordem decrescente de votação e respeitando número de vagas):"
    )?;
    write_ranked(w, registry, &stats::most_voted(registry))?;

    writeln!(w)?;
    writeln!(
        w,
        "Teriam sido eleitos se a votação fosse majoritária, e não foram eleitos:"
    )?;
    writeln!(w, "(com sua posição no ranking de mais votados)")?;
    write_ranked(w, registry, &stats::plurality_only(registry))?;

    writeln!(w)?;
    writeln!(w, "Eleitos, que se beneficiaram do sistema proporcional:")?;
    writeln!(w, "(com sua posição no ranking de mais votados)")?;
    if let Some(l) = stats::proportional_beneficiaries(registry) {
        write_ranked(w, registry, &l)?;
    }

    writeln!(w)?;
    writeln!(w, "Votação dos partidos e número de candidatos eleitos:")?;
    for rp in stats::party_ranking(registry) {
        writeln!(w, "{} - {}", rp.position, format_party(rp.party))?;
    }

    writeln!(w)?;
    writeln!(w, "Primeiro e último colocados de cada partido:")?;
    for (idx, e) in stats::party_extremes(registry).into_iter().enumerate() {
        writeln!(
            w,
            "{} - {} - {}, {} ({}, {} votos) / {} ({}, {} votos)",
            idx + 1,
            e.party.acronym(),
            e.party.number(),
            e.first.ballot_name(),
            e.first.number(),
            format_count(e.first.votes()),
            e.last.ballot_name(),
            e.last.number(),
            format_count(e.last.votes())
        )?;
    }

    writeln!(w)?;
    writeln!(w, "Eleitos, por faixa etária (na data da eleição):")?;
    let ages = stats::age_distribution(registry, election_date);
    for bracket in AgeBracket::ALL {
        writeln!(
            w,
            "{}: {} ({})",
            age_label(bracket),
            ages.count(bracket),
            format_percent(ages.share(bracket))
        )?;
    }

    writeln!(w)?;
    writeln!(w, "Eleitos, por gênero:")?;
    let genders = stats::gender_distribution(registry);
    writeln!(
        w,
        "Feminino:  {} ({})",
        genders.female,
        format_percent(genders.share(Gender::Female))
    )?;
    writeln!(
        w,
        "Masculino: {} ({})",
        genders.male,
        format_percent(genders.share(Gender::Male))
    )?;

    let totals = stats::vote_totals(registry);
    writeln!(w)?;
    writeln!(w, "Total de votos válidos:    {}", format_count(totals.total()))?;
    writeln!(
        w,
        "Total de votos nominais:   {} ({})",
        format_count(totals.nominal),
        format_percent(totals.nominal_share())
    )?;
    writeln!(
        w,
        "Total de votos de legenda: {} ({})",
        format_count(totals.list),
        format_percent(totals.list_share())
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use council_tally::builder::Builder;
    use council_tally::{CandidacyOutcome, CandidateRecord};

    fn record(
        number: u32,
        name: &str,
        party: (u32, &str),
        federation_number: i32,
        outcome: CandidacyOutcome,
        birth: (i32, u32, u32),
        gender: Gender,
    ) -> CandidateRecord {
        CandidateRecord {
            municipality: "57053".to_string(),
            office_code: 13,
            number,
            ballot_name: name.to_string(),
            party_number: party.0,
            party_acronym: party.1.to_string(),
            federation_number,
            birth_date: NaiveDate::from_ymd_opt(birth.0, birth.1, birth.2).unwrap(),
            outcome_code: outcome.code(),
            gender_code: gender.code(),
        }
    }

    fn report_of(builder: Builder) -> String {
        let registry = builder.build().unwrap();
        let mut out: Vec<u8> = Vec::new();
        let date = NaiveDate::from_ymd_opt(2024, 10, 6).unwrap();
        write_report(&mut out, &registry, date).unwrap();
        String::from_utf8(out).unwrap()
    }

    #[test]
    fn numbers() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1_000), "1.000");
        assert_eq!(format_count(1_234_567), "1.234.567");
        assert_eq!(format_percent(0.0), "0,00%");
        assert_eq!(format_percent(0.1234), "12,34%");
        assert_eq!(format_percent(1.0), "100,00%");
    }

    #[test]
    fn small_city_report() {
        let mut builder = Builder::new("57053").candidates(&[
            record(11111, "João", (11, "ABC"), -1, CandidacyOutcome::ElectedByPartyQuota, (1970, 1, 1), Gender::Male),
            record(11222, "Maria", (11, "ABC"), -1, CandidacyOutcome::Alternate, (1990, 3, 15), Gender::Female),
            record(22111, "Ana", (22, "XYZ"), 7, CandidacyOutcome::ElectedByAverage, (1995, 10, 10), Gender::Female),
            record(22222, "Pedro", (22, "XYZ"), 7, CandidacyOutcome::NotElected, (1960, 5, 20), Gender::Male),
        ]);
        builder.add_vote_simple(11111, 1_000);
        builder.add_vote_simple(11222, 700);
        builder.add_vote_simple(22111, 300);
        builder.add_vote_simple(22222, 800);
        builder.add_vote_simple(11, 100);
        builder.add_vote_simple(22, 200);
        let report = report_of(builder);
        let lines: Vec<&str> = report.lines().collect();

        assert_eq!(lines[0], "Número de vagas: 2");
        assert_eq!(lines[3], "1 - JOÃO (ABC, 1.000 votos)");
        assert_eq!(lines[4], "2 - *ANA (XYZ, 300 votos)");
        assert!(report.contains("\n2 - *PEDRO (XYZ, 800 votos)\n\nEleitos, que"));
        assert!(report.contains("ranking de mais votados)\n4 - *ANA (XYZ, 300 votos)\n"));
        assert!(report.contains("1 - ABC - 11, 1.800 votos (1.700 nominais e 100 de legenda), 1 candidato eleito"));
        assert!(report.contains("2 - XYZ - 22, 1.300 votos (1.100 nominais e 200 de legenda), 1 candidato eleito"));
        assert!(report.contains("1 - ABC - 11, João (11111, 1.000 votos) / Maria (11222, 700 votos)"));
        assert!(report.contains("2 - XYZ - 22, Pedro (22222, 800 votos) / Ana (22111, 300 votos)"));
        assert!(report.contains("      Idade < 30: 1 (50,00%)"));
        assert!(report.contains("50 <= Idade < 60: 1 (50,00%)"));
        assert!(report.contains("60 <= Idade     : 0 (0,00%)"));
        assert!(report.contains("Feminino:  1 (50,00%)"));
        assert!(report.contains("Masculino: 1 (50,00%)"));
        assert!(report.contains("Total de votos válidos:    3.100"));
        assert_eq!(
            lines.last().copied(),
            Some("Total de votos de legenda: 300 (9,68%)")
        );
    }

    #[test]
    fn empty_election() {
        let report = report_of(Builder::new("57053"));
        assert!(report.starts_with("Número de vagas: 0\n"));
        assert!(report.contains("Feminino:  0 (0,00%)"));
        assert!(report.contains("Total de votos nominais:   0 (0,00%)"));
    }
}
