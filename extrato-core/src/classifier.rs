//! Deterministic transaction classifier.
//!
//! Maps a free-text description plus a signed amount to a semantic kind
//! (pix received, TED sent, fee, ...) and a cleaned counterparty label.
//! Ordered regex rules, first match wins. No scoring.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// Semantic type of a transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransactionKind {
    PixReceived,
    PixSent,
    TedReceived,
    TedSent,
    TransferReceived,
    TransferSent,
    BoletoPaid,
    BillPayment,
    Fee,
    Credit,
    Debit,
}

impl TransactionKind {
    /// Wire name, as serialized.
    pub fn as_str(&self) -> &'static str {
        match self {
            TransactionKind::PixReceived => "pix_received",
            TransactionKind::PixSent => "pix_sent",
            TransactionKind::TedReceived => "ted_received",
            TransactionKind::TedSent => "ted_sent",
            TransactionKind::TransferReceived => "transfer_received",
            TransactionKind::TransferSent => "transfer_sent",
            TransactionKind::BoletoPaid => "boleto_paid",
            TransactionKind::BillPayment => "bill_payment",
            TransactionKind::Fee => "fee",
            TransactionKind::Credit => "credit",
            TransactionKind::Debit => "debit",
        }
    }

    /// Human-facing label shown next to the counterparty.
    pub fn label(&self) -> &'static str {
        match self {
            TransactionKind::PixReceived => "Pix recebido",
            TransactionKind::PixSent => "Pix enviado",
            TransactionKind::TedReceived => "TED recebida",
            TransactionKind::TedSent => "TED enviada",
            TransactionKind::TransferReceived => "Transferência recebida",
            TransactionKind::TransferSent => "Transferência enviada",
            TransactionKind::BoletoPaid => "Boleto pago",
            TransactionKind::BillPayment => "Pagamento de fatura",
            TransactionKind::Fee => "Tarifa",
            TransactionKind::Credit => "Crédito",
            TransactionKind::Debit => "Débito",
        }
    }

    pub fn is_inflow(&self) -> bool {
        matches!(
            self,
            TransactionKind::PixReceived
                | TransactionKind::TedReceived
                | TransactionKind::TransferReceived
                | TransactionKind::Credit
        )
    }
}

/// Result of classification
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Classification {
    pub kind: TransactionKind,
    pub label: String,
    pub counterparty: String,
}

/// Counterparty used when nothing survives the cleanup.
pub const FALLBACK_COUNTERPARTY: &str = "Transação";

// Specific before generic: "transferência recebida pelo pix" must win over
// "transferência recebida".
const RULES: &[(&str, TransactionKind)] = &[
    (r"transfer[êe]ncia\s+recebida\s+(?:pelo|via)\s+pix", TransactionKind::PixReceived),
    (r"transfer[êe]ncia\s+enviada\s+(?:pelo|via)\s+pix", TransactionKind::PixSent),
    (r"\bpix\s+recebido", TransactionKind::PixReceived),
    (r"\bpix\s+enviado", TransactionKind::PixSent),
    (
        r"\bted\s+recebida|transfer[êe]ncia\s+recebida\s+(?:pela|via)\s+ted",
        TransactionKind::TedReceived,
    ),
    (
        r"\bted\s+enviada|transfer[êe]ncia\s+enviada\s+(?:pela|via)\s+ted",
        TransactionKind::TedSent,
    ),
    (r"transfer[êe]ncia\s+recebida", TransactionKind::TransferReceived),
    (r"transfer[êe]ncia\s+enviada", TransactionKind::TransferSent),
    (r"pagamento\s+de\s+boleto|boleto\s+pago", TransactionKind::BoletoPaid),
    (r"pagamento\s+de\s+fatura", TransactionKind::BillPayment),
    (r"\btarifa", TransactionKind::Fee),
    (r"cr[ée]dito\s+em\s+conta", TransactionKind::Credit),
];

fn rules() -> &'static [(Regex, TransactionKind)] {
    static RULES_RE: OnceLock<Vec<(Regex, TransactionKind)>> = OnceLock::new();
    RULES_RE.get_or_init(|| {
        RULES
            .iter()
            .map(|(pattern, kind)| (Regex::new(pattern).expect("invalid rule regex"), *kind))
            .collect()
    })
}

fn boilerplate_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"(?i)transfer[êe]ncia\s+(?:recebida|enviada)(?:\s+(?:pelo|pela|via)\s+(?:pix|ted))?",
            r"|\b(?:pix|ted)\s+(?:recebid[oa]|enviad[oa])",
            r"|pagamento\s+de\s+(?:fatura|boleto)",
            r"|boleto\s+pago",
            r"|cr[ée]dito\s+em\s+conta",
            r"|^\s*tarifa(?:\s+banc[áa]ria)?",
            r"|^\s*boleto\b",
        ))
        .expect("invalid boilerplate regex")
    })
}

/// CNPJ, masked CPF, or full CPF.
fn tax_id_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(concat!(
            r"\d{2}\.\d{3}\.\d{3}/\d{4}-\d{2}",
            r"|[•*]{3}\.\d{3}\.\d{3}-[•*]{2}",
            r"|\d{3}\.\d{3}\.\d{3}-\d{2}",
        ))
        .expect("invalid tax id regex")
    })
}

fn agency_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s*ag[êe]ncia:.*$").expect("invalid agency regex"))
}

fn account_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?i)\s*conta:.*$").expect("invalid account regex"))
}

/// "- BANK NAME (0260)" at the end of the text.
fn bank_suffix_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s*-\s*[^-]*\(\d{1,4}\)\s*$").expect("invalid bank regex"))
}

fn ws_re() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\s+").expect("invalid ws regex"))
}

/// Classify a transaction description.
///
/// Pure and deterministic; cheap enough to call for every row on every render.
pub fn classify(description: &str, amount: f64) -> Classification {
    let kind = classify_kind(description, amount);
    Classification {
        kind,
        label: kind.label().to_string(),
        counterparty: extract_counterparty(description),
    }
}

/// First matching rule, else credit/debit by sign (zero counts as debit).
pub fn classify_kind(description: &str, amount: f64) -> TransactionKind {
    let desc = description.to_lowercase();
    for (re, kind) in rules() {
        if re.is_match(&desc) {
            return *kind;
        }
    }
    if amount > 0.0 {
        TransactionKind::Credit
    } else {
        TransactionKind::Debit
    }
}

/// Strip boilerplate, tax ids and bank/agency/account suffixes from a description.
pub fn extract_counterparty(description: &str) -> String {
    let body = boilerplate_re().replace_all(description, " ");

    let candidate = match tax_id_re().find(&body) {
        // Suffix stripping can over-trim; the text before the tax id is the name.
        Some(m) => strip_suffixes(&body[..m.start()]),
        None => strip_suffixes(&body),
    };

    let collapsed = ws_re().replace_all(&candidate, " ");
    let cleaned = trim_separators(&collapsed);
    if cleaned.is_empty() {
        FALLBACK_COUNTERPARTY.to_string()
    } else {
        cleaned.to_string()
    }
}

fn strip_suffixes(text: &str) -> String {
    let text = agency_suffix_re().replace(text, "");
    let text = account_suffix_re().replace(&text, "");
    let text = bank_suffix_re().replace(&text, "");
    text.into_owned()
}

fn trim_separators(text: &str) -> &str {
    text.trim_matches(|c: char| {
        c.is_whitespace() || matches!(c, '-' | '–' | '—' | ':' | '|' | ',' | '/')
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pix_received_with_name() {
        for _ in 0..3 {
            let c = classify("Pix recebido - Maria Silva", 150.00);
            assert_eq!(c.kind, TransactionKind::PixReceived);
            assert_eq!(c.label, "Pix recebido");
            assert_eq!(c.counterparty, "Maria Silva");
        }
    }

    #[test]
    fn wire_names_match_serde() {
        let kinds = [
            TransactionKind::PixReceived,
            TransactionKind::PixSent,
            TransactionKind::TedReceived,
            TransactionKind::TedSent,
            TransactionKind::TransferReceived,
            TransactionKind::TransferSent,
            TransactionKind::BoletoPaid,
            TransactionKind::BillPayment,
            TransactionKind::Fee,
            TransactionKind::Credit,
            TransactionKind::Debit,
        ];
        for kind in kinds {
            assert_eq!(serde_json::to_value(kind).unwrap(), kind.as_str());
        }
    }

    #[test]
    fn unmatched_negative_falls_back_to_debit() {
        let c = classify("Lançamento diverso", -42.00);
        assert_eq!(c.kind, TransactionKind::Debit);
        assert_eq!(c.label, "Débito");
        assert_eq!(c.counterparty, "Lançamento diverso");
    }

    #[test]
    fn unmatched_positive_is_credit_and_zero_is_debit() {
        assert_eq!(classify_kind("Estorno compra", 20.0), TransactionKind::Credit);
        assert_eq!(classify_kind("Ajuste", 0.0), TransactionKind::Debit);
    }

    #[test]
    fn full_cpf_and_trailing_dash_are_removed() {
        let c = classify("Transferência enviada pelo Pix - João - 123.456.789-00", -50.0);
        assert_eq!(c.kind, TransactionKind::PixSent);
        assert_eq!(c.counterparty, "João");
    }

    #[test]
    fn specific_pix_transfer_wins_over_generic_transfer() {
        assert_eq!(
            classify_kind("Transferência recebida pelo Pix - Ana", 10.0),
            TransactionKind::PixReceived
        );
        assert_eq!(
            classify_kind("Transferência recebida - Ana", 10.0),
            TransactionKind::TransferReceived
        );
        assert_eq!(
            classify_kind("TRANSFERENCIA ENVIADA - ANA", -10.0),
            TransactionKind::TransferSent
        );
    }

    #[test]
    fn ted_boleto_fatura_fee_and_credit_rules() {
        assert_eq!(classify_kind("TED recebida - ACME", 900.0), TransactionKind::TedReceived);
        assert_eq!(classify_kind("TED enviada - ACME", -900.0), TransactionKind::TedSent);
        assert_eq!(
            classify_kind("Transferência enviada via TED - ACME", -900.0),
            TransactionKind::TedSent
        );
        assert_eq!(classify_kind("Pagamento de boleto - ENEL", -180.0), TransactionKind::BoletoPaid);
        assert_eq!(classify_kind("Pagamento de fatura", -1200.0), TransactionKind::BillPayment);
        assert_eq!(classify_kind("Tarifa mensal pacote", -29.9), TransactionKind::Fee);
        assert_eq!(classify_kind("Crédito em conta - salário", 5000.0), TransactionKind::Credit);
    }

    #[test]
    fn cnpj_and_bank_suffix_are_removed() {
        let c = classify(
            "Pix enviado - ACME LTDA - 12.345.678/0001-90 - ITAU UNIBANCO (0341)",
            -75.0,
        );
        assert_eq!(c.counterparty, "ACME LTDA");
    }

    #[test]
    fn masked_cpf_is_removed() {
        let c = classify(
            "Transferência recebida pelo Pix - ANA PAULA - •••.456.789-•• - NU PAGAMENTOS (0260)",
            30.0,
        );
        assert_eq!(c.kind, TransactionKind::PixReceived);
        assert_eq!(c.counterparty, "ANA PAULA");
    }

    #[test]
    fn agency_and_account_suffixes_are_removed() {
        let c = classify(
            "Pix recebido - Maria Souza - BANCO INTER (0077) Agência: 1 Conta: 12345-6",
            10.0,
        );
        assert_eq!(c.counterparty, "Maria Souza");
    }

    #[test]
    fn empty_counterparty_falls_back() {
        assert_eq!(classify("Pix recebido", 1.0).counterparty, FALLBACK_COUNTERPARTY);
        assert_eq!(classify("   ", -1.0).counterparty, FALLBACK_COUNTERPARTY);
    }

    #[test]
    fn kind_serializes_snake_case() {
        let json = serde_json::to_string(&TransactionKind::PixReceived).unwrap();
        assert_eq!(json, "\"pix_received\"");
    }
}
