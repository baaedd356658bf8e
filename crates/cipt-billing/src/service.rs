//! Billing lookup with the MSISDN format retry.
//!
//! Registrations carry the sender's number in whichever 9th-digit form the
//! tenant originally provided, so a "not associated" answer gets exactly one
//! retry with the alternate form. The form that worked is returned so the
//! later emit call reuses it.

use std::sync::Arc;

use tracing::{debug, warn};

use cipt_core::error::{CiptError, Result};
use cipt_core::types::{BillingDocument, EmittedDocument};

use crate::client::BillingApi;
use crate::msisdn::adjust_msisdn;

/// Billing API wrapper owning the retry policy.
pub struct BillingService {
    api: Arc<dyn BillingApi>,
}

impl BillingService {
    pub fn new(api: Arc<dyn BillingApi>) -> Self {
        Self { api }
    }

    /// List unpaid documents, retrying once with the alternate MSISDN form.
    ///
    /// Returns the documents and the MSISDN form the API accepted.
    pub async fn list_documents(&self, msisdn: &str) -> Result<(Vec<BillingDocument>, String)> {
        match self.api.list_dars(msisdn).await {
            Ok(documents) => Ok((documents, msisdn.to_string())),
            Err(CiptError::MsisdnNotAssociated(_)) => {
                let Some(adjusted) = adjust_msisdn(msisdn) else {
                    return Err(CiptError::MsisdnNotAssociated(msisdn.to_string()));
                };
                debug!(msisdn, adjusted, "Retrying billing lookup with adjusted MSISDN");
                match self.api.list_dars(&adjusted).await {
                    Ok(documents) => Ok((documents, adjusted)),
                    Err(e) => {
                        warn!(msisdn, error = %e, "Billing lookup failed after retry");
                        Err(e)
                    }
                }
            }
            Err(e) => Err(e),
        }
    }

    /// Emit a document, with the same single retry on the alternate form.
    pub async fn emit(&self, id: &str, msisdn: &str) -> Result<EmittedDocument> {
        match self.api.emit_dar(id, msisdn).await {
            Ok(emitted) => Ok(emitted),
            Err(CiptError::MsisdnNotAssociated(_)) => {
                let Some(adjusted) = adjust_msisdn(msisdn) else {
                    return Err(CiptError::MsisdnNotAssociated(msisdn.to_string()));
                };
                debug!(msisdn, adjusted, "Retrying billing emit with adjusted MSISDN");
                self.api.emit_dar(id, &adjusted).await
            }
            Err(e) => Err(e),
        }
    }
}
