//! Billing API client.
//!
//! The upstream exposes two endpoints: `GET /bot/dars?msisdn=` listing the
//! unpaid documents for a number, and `POST /bot/dars/{id}/emit?msisdn=`
//! returning the payable form. Responses come in two field dialects
//! (`competencia` vs `mes_referencia`/`ano_referencia`, `valor` vs
//! `valor_total`), both accepted here.

use std::collections::HashMap;
use std::sync::Mutex;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use cipt_core::error::{CiptError, Result};
use cipt_core::types::{BillingDocument, EmittedDocument};

/// External billing API.
#[async_trait]
pub trait BillingApi: Send + Sync {
    /// Unpaid documents for the given MSISDN.
    async fn list_dars(&self, msisdn: &str) -> Result<Vec<BillingDocument>>;

    /// Emit the payable form of a document. Idempotent upstream: emitting an
    /// already-emitted document returns the prior data.
    async fn emit_dar(&self, id: &str, msisdn: &str) -> Result<EmittedDocument>;
}

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

fn de_id<'de, D>(deserializer: D) -> std::result::Result<String, D::Error>
where
    D: serde::Deserializer<'de>,
{
    #[derive(Deserialize)]
    #[serde(untagged)]
    enum IdRepr {
        Text(String),
        Number(i64),
    }
    Ok(match IdRepr::deserialize(deserializer)? {
        IdRepr::Text(s) => s,
        IdRepr::Number(n) => n.to_string(),
    })
}

#[derive(Debug, Deserialize)]
struct WireDar {
    #[serde(deserialize_with = "de_id")]
    id: String,
    #[serde(default)]
    competencia: Option<String>,
    #[serde(default)]
    mes_referencia: Option<u32>,
    #[serde(default)]
    ano_referencia: Option<i32>,
    #[serde(default)]
    vencimento: Option<String>,
    #[serde(default)]
    data_vencimento: Option<String>,
    #[serde(default)]
    valor: Option<f64>,
    #[serde(default)]
    valor_total: Option<f64>,
}

fn parse_competence(text: &str) -> Option<(u32, i32)> {
    let (month, year) = text.split_once('/')?;
    Some((month.trim().parse().ok()?, year.trim().parse().ok()?))
}

impl WireDar {
    fn into_document(self) -> Result<BillingDocument> {
        let (competence_month, competence_year) =
            match (self.mes_referencia, self.ano_referencia, &self.competencia) {
                (Some(m), Some(y), _) => (m, y),
                (_, _, Some(c)) => parse_competence(c).ok_or_else(|| {
                    CiptError::Billing(format!("Unparseable competence '{}'", c))
                })?,
                _ => {
                    return Err(CiptError::Billing(
                        "Document without competence fields".to_string(),
                    ))
                }
            };
        let due_date = self
            .vencimento
            .or(self.data_vencimento)
            .ok_or_else(|| CiptError::Billing("Document without due date".to_string()))?;
        let amount = self
            .valor
            .or(self.valor_total)
            .ok_or_else(|| CiptError::Billing("Document without amount".to_string()))?;
        Ok(BillingDocument {
            id: self.id,
            competence_month,
            competence_year,
            due_date,
            amount,
        })
    }
}

#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    dars: Vec<WireDar>,
}

#[derive(Debug, Deserialize)]
struct WireEmitted {
    linha_digitavel: String,
    #[serde(default)]
    pdf_url: Option<String>,
    #[serde(default)]
    competencia: Option<String>,
    #[serde(default)]
    mes_referencia: Option<u32>,
    #[serde(default)]
    ano_referencia: Option<i32>,
    #[serde(default)]
    vencimento: Option<String>,
    #[serde(default)]
    data_vencimento: Option<String>,
    #[serde(default)]
    valor: Option<f64>,
    #[serde(default)]
    valor_total: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct EmitResponse {
    dar: WireEmitted,
}

impl WireEmitted {
    fn into_emitted(self) -> Result<EmittedDocument> {
        let competence = match (&self.competencia, self.mes_referencia, self.ano_referencia) {
            (Some(c), _, _) => c.clone(),
            (None, Some(m), Some(y)) => format!("{:02}/{}", m, y),
            _ => {
                return Err(CiptError::Billing(
                    "Emitted document without competence fields".to_string(),
                ))
            }
        };
        let due_date = self
            .vencimento
            .or(self.data_vencimento)
            .ok_or_else(|| CiptError::Billing("Emitted document without due date".to_string()))?;
        let amount = self
            .valor
            .or(self.valor_total)
            .ok_or_else(|| CiptError::Billing("Emitted document without amount".to_string()))?;
        Ok(EmittedDocument {
            payment_line: self.linha_digitavel,
            pdf_url: self.pdf_url,
            competence,
            due_date,
            amount,
        })
    }
}

// ---------------------------------------------------------------------------
// HttpBillingApi
// ---------------------------------------------------------------------------

/// Reqwest-backed [`BillingApi`].
pub struct HttpBillingApi {
    client: reqwest::Client,
    base_url: String,
}

impl HttpBillingApi {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
        }
    }

    fn map_failure(status: reqwest::StatusCode, body: String, msisdn: &str) -> CiptError {
        let lowered = body.to_lowercase();
        if lowered.contains("não associad") || lowered.contains("nao associad") {
            CiptError::MsisdnNotAssociated(msisdn.to_string())
        } else {
            CiptError::Billing(format!("Billing API error {}: {}", status, body))
        }
    }
}

#[async_trait]
impl BillingApi for HttpBillingApi {
    async fn list_dars(&self, msisdn: &str) -> Result<Vec<BillingDocument>> {
        let url = format!("{}/bot/dars", self.base_url);
        let response = self
            .client
            .get(&url)
            .query(&[("msisdn", msisdn)])
            .send()
            .await
            .map_err(|e| CiptError::Billing(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_failure(status, body, msisdn));
        }

        let parsed: ListResponse = response
            .json()
            .await
            .map_err(|e| CiptError::Billing(format!("Failed to parse list response: {}", e)))?;
        debug!(msisdn, count = parsed.dars.len(), "Billing documents listed");
        parsed.dars.into_iter().map(WireDar::into_document).collect()
    }

    async fn emit_dar(&self, id: &str, msisdn: &str) -> Result<EmittedDocument> {
        let url = format!("{}/bot/dars/{}/emit", self.base_url, id);
        let response = self
            .client
            .post(&url)
            .query(&[("msisdn", msisdn)])
            .send()
            .await
            .map_err(|e| CiptError::Billing(format!("Network error: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_failure(status, body, msisdn));
        }

        let parsed: EmitResponse = response
            .json()
            .await
            .map_err(|e| CiptError::Billing(format!("Failed to parse emit response: {}", e)))?;
        parsed.dar.into_emitted()
    }
}

// ---------------------------------------------------------------------------
// MockBillingApi
// ---------------------------------------------------------------------------

/// In-memory [`BillingApi`] for tests: documents keyed by MSISDN, emissions
/// recorded so re-emitting returns the same data.
#[derive(Default)]
pub struct MockBillingApi {
    documents: Mutex<HashMap<String, Vec<BillingDocument>>>,
    emitted: Mutex<HashMap<String, EmittedDocument>>,
}

impl MockBillingApi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_documents(&self, msisdn: &str, documents: Vec<BillingDocument>) {
        self.documents
            .lock()
            .unwrap()
            .insert(msisdn.to_string(), documents);
    }
}

#[async_trait]
impl BillingApi for MockBillingApi {
    async fn list_dars(&self, msisdn: &str) -> Result<Vec<BillingDocument>> {
        self.documents
            .lock()
            .unwrap()
            .get(msisdn)
            .cloned()
            .ok_or_else(|| CiptError::MsisdnNotAssociated(msisdn.to_string()))
    }

    async fn emit_dar(&self, id: &str, msisdn: &str) -> Result<EmittedDocument> {
        if let Some(prior) = self.emitted.lock().unwrap().get(id) {
            return Ok(prior.clone());
        }
        let docs = self
            .documents
            .lock()
            .unwrap()
            .get(msisdn)
            .cloned()
            .ok_or_else(|| CiptError::MsisdnNotAssociated(msisdn.to_string()))?;
        let document = docs
            .into_iter()
            .find(|d| d.id == id)
            .ok_or_else(|| CiptError::Billing(format!("Unknown document {}", id)))?;
        let emitted = EmittedDocument {
            payment_line: format!("85800000000-0 {}", document.id),
            pdf_url: Some(format!("https://billing.example/dars/{}.pdf", document.id)),
            competence: document.competence(),
            due_date: document.due_date.clone(),
            amount: document.amount,
        };
        self.emitted
            .lock()
            .unwrap()
            .insert(id.to_string(), emitted.clone());
        Ok(emitted)
    }
}
