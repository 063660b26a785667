//! Synthetic STJ decisions, standing in for a Datajud feed.

use crate::types::{Court, Record, RecordSet};
use rand::Rng;

/// Court assigned to every generated record
pub const SYNTHETIC_COURT: Court = Court::Stj;

/// Granted, denied and partially granted
pub const SYNTHETIC_OUTCOMES: [&str; 3] = ["Procedente", "Improcedente", "Parcialmente Procedente"];

pub const SYNTHETIC_SUMMARIES: [&str; 5] = [
    "Recurso especial sobre dano moral julgado improcedente.",
    "Pedido de habeas corpus parcialmente procedente.",
    "Reconhecida a repercussão geral em tema de direito administrativo.",
    "Ação declaratória de inconstitucionalidade julgada procedente.",
    "Pedido improvido por ausência de provas documentais.",
];

fn pick<'a, R: Rng + ?Sized>(choices: &[&'a str], rng: &mut R) -> &'a str {
    choices[rng.random_range(0..choices.len())]
}

/// Generate `count` records with ids `1..=count`. Outcome and summary are
/// drawn uniformly and independently from the fixed sets.
pub fn generate<R: Rng + ?Sized>(count: usize, rng: &mut R) -> RecordSet {
    (0..count)
        .map(|i| Record {
            court: SYNTHETIC_COURT,
            decision_id: (i + 1).to_string(),
            summary_text: pick(&SYNTHETIC_SUMMARIES, rng).to_string(),
            outcome: pick(&SYNTHETIC_OUTCOMES, rng).to_string(),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_generates_requested_count_from_fixed_sets() {
        let mut rng = StdRng::seed_from_u64(7);
        let records = generate(200, &mut rng);

        assert_eq!(records.len(), 200);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.court, Court::Stj);
            assert_eq!(record.decision_id, (i + 1).to_string());
            assert!(SYNTHETIC_OUTCOMES.contains(&record.outcome.as_str()));
            assert!(SYNTHETIC_SUMMARIES.contains(&record.summary_text.as_str()));
        }
    }

    #[test]
    fn test_same_seed_same_records() {
        let a = generate(50, &mut StdRng::seed_from_u64(42));
        let b = generate(50, &mut StdRng::seed_from_u64(42));
        assert_eq!(a, b);
    }

    #[test]
    fn test_all_labels_eventually_drawn() {
        let records = generate(500, &mut StdRng::seed_from_u64(1));
        for label in SYNTHETIC_OUTCOMES {
            assert!(records.iter().any(|r| r.outcome == label), "missing {}", label);
        }
        for summary in SYNTHETIC_SUMMARIES {
            assert!(records.iter().any(|r| r.summary_text == summary));
        }
    }

    #[test]
    fn test_zero_count() {
        let records = generate(0, &mut StdRng::seed_from_u64(0));
        assert!(records.is_empty());
    }
}
