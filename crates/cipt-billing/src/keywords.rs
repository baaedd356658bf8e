//! Keyword detection that opens the billing flow, and the document
//! narrowing those keywords imply.

use std::sync::OnceLock;

use chrono::{Datelike, NaiveDate};
use regex::Regex;

use cipt_core::types::BillingDocument;

fn billing_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"(?i)\b(dar(?:s)?|boleto|2.?ª? via|segunda via|guia(?: de pagamento)?|pagamento (?:do aluguel|de eventos)|pagamento)\b",
        )
        .unwrap()
    })
}

fn overdue_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)vencid|atrasad|pendent").unwrap())
}

fn current_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)vigent|atual|corrente|m[eê]s").unwrap())
}

/// Whether the message asks about a billing document.
pub fn mentions_billing(text: &str) -> bool {
    billing_regex().is_match(text)
}

/// Whether the message narrows to overdue documents.
pub fn mentions_overdue(text: &str) -> bool {
    overdue_regex().is_match(text)
}

/// Whether the message narrows to the current competence.
pub fn mentions_current(text: &str) -> bool {
    current_regex().is_match(text)
}

/// Narrow a listed document set by what the message asked for: only the
/// overdue documents, only the current competence, or everything.
///
/// Documents with an unparseable due date survive the overdue filter.
pub fn narrow_documents(
    query: &str,
    documents: Vec<BillingDocument>,
    today: NaiveDate,
) -> Vec<BillingDocument> {
    if mentions_overdue(query) {
        documents
            .into_iter()
            .filter(|d| {
                NaiveDate::parse_from_str(&d.due_date, "%Y-%m-%d")
                    .map(|due| due < today)
                    .unwrap_or(true)
            })
            .collect()
    } else if mentions_current(query) {
        documents
            .into_iter()
            .filter(|d| d.competence_month == today.month() && d.competence_year == today.year())
            .collect()
    } else {
        documents
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_billing_synonyms() {
        for text in [
            "dar",
            "dars",
            "boleto",
            "2 via",
            "2ª via",
            "segunda via",
            "guia",
            "guia de pagamento",
            "pagamento do aluguel",
            "pagamento de eventos",
            "pagamento",
        ] {
            assert!(mentions_billing(text), "failed to match: {}", text);
        }
    }

    #[test]
    fn test_billing_negative() {
        assert!(!mentions_billing("qual o horário de funcionamento?"));
        assert!(!mentions_billing("darei uma olhada"));
    }

    #[test]
    fn test_overdue_and_current_combinations() {
        assert!(mentions_billing("pagamento vencido") && mentions_overdue("pagamento vencido"));
        assert!(mentions_billing("guia vigente") && mentions_current("guia vigente"));
        assert!(mentions_overdue("estou com boletos atrasados"));
        assert!(mentions_current("a guia deste mês"));
        assert!(!mentions_overdue("guia vigente"));
    }

    fn doc(id: &str, month: u32, year: i32, due_date: &str) -> BillingDocument {
        BillingDocument {
            id: id.to_string(),
            competence_month: month,
            competence_year: year,
            due_date: due_date.to_string(),
            amount: 50.0,
        }
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 8, 1).unwrap()
    }

    #[test]
    fn test_narrow_overdue_keeps_past_due_only() {
        let documents = vec![
            doc("1", 6, 2024, "2024-06-10"),
            doc("2", 8, 2024, "2024-08-10"),
        ];
        let narrowed = narrow_documents("boletos vencidos", documents, today());
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].id, "1");
    }

    #[test]
    fn test_narrow_overdue_keeps_unparseable_due_date() {
        let documents = vec![doc("1", 6, 2024, "10/06/2024")];
        let narrowed = narrow_documents("dar atrasada", documents, today());
        assert_eq!(narrowed.len(), 1);
    }

    #[test]
    fn test_narrow_current_matches_competence() {
        let documents = vec![
            doc("1", 7, 2024, "2024-07-10"),
            doc("2", 8, 2024, "2024-08-10"),
        ];
        let narrowed = narrow_documents("a guia deste mês", documents, today());
        assert_eq!(narrowed.len(), 1);
        assert_eq!(narrowed[0].id, "2");
    }

    #[test]
    fn test_narrow_plain_query_keeps_everything() {
        let documents = vec![
            doc("1", 6, 2024, "2024-06-10"),
            doc("2", 8, 2024, "2024-08-10"),
        ];
        let narrowed = narrow_documents("segunda via", documents, today());
        assert_eq!(narrowed.len(), 2);
    }
}
