use crate::cache::PaymentCache;
use crate::circuit::breaker::CircuitBreaker;
use crate::domain::card::{normalize_card_number, Settlement};
use crate::domain::payment::{
    Decision, DeclineReason, PaymentRecord, PaymentRequest, PaymentResponse, PaymentStatus, ProcessOutcome,
};
use crate::error::EngineError;
use crate::repo::ports::{CardStore, FraudStore, PaymentStore};
use crate::service::risk_checks::{approve_payment, check_for_fraud, check_funds};
use crate::validation::{structurally_valid, PaymentLimits};
use std::sync::Arc;
use uuid::Uuid;

const STORE_FAILED: &str = "failed to store payment details";
const RETRIEVE_FAILED: &str = "failed to retrieve payment details";

#[derive(Clone)]
pub struct PaymentService {
    pub payments: Arc<dyn PaymentStore>,
    pub cards: Arc<dyn CardStore>,
    pub fraud: Arc<dyn FraudStore>,
    /// `None` when caching is disabled; every read then goes to the store.
    pub cache: Option<Arc<dyn PaymentCache>>,
    pub breaker: CircuitBreaker,
    pub limits: PaymentLimits,
    /// Move declined payments to `Failure` instead of leaving them `In-Progress`.
    pub finalize_declines: bool,
}

impl PaymentService {
    pub async fn process_payment(&self, req: PaymentRequest) -> Result<ProcessOutcome, EngineError> {
        self.breaker.call(|| self.process_unguarded(req)).await
    }

    pub async fn retrieve_payment(&self, payment_id: &str) -> Result<PaymentResponse, EngineError> {
        self.breaker.call(|| self.retrieve_unguarded(payment_id)).await
    }

    async fn process_unguarded(&self, req: PaymentRequest) -> Result<ProcessOutcome, EngineError> {
        let record = PaymentRecord::in_progress(Uuid::new_v4().to_string(), &req);

        // The row exists before any evaluation so every attempt is auditable.
        self.payments.insert(&record).await.map_err(|e| {
            tracing::error!(error = %e, "failed to store payment details");
            EngineError::infrastructure(STORE_FAILED, e)
        })?;

        match self.evaluate(&record.payment_id, &req).await? {
            None => {
                tracing::info!(payment_id = %record.payment_id, status = "success", "payment processed");
                Ok(ProcessOutcome {
                    payment_id: record.payment_id,
                    status: Decision::Success,
                    decline_reason: None,
                })
            }
            Some(reason) => {
                tracing::warn!(
                    payment_id = %record.payment_id,
                    reason = ?reason,
                    "{}",
                    reason.message()
                );
                if self.finalize_declines {
                    if let Err(e) = self.payments.set_status(&record.payment_id, PaymentStatus::Failure).await {
                        tracing::error!(payment_id = %record.payment_id, error = %e, "failed to finalize declined payment");
                    }
                }
                Ok(ProcessOutcome {
                    payment_id: record.payment_id,
                    status: Decision::Failure,
                    decline_reason: Some(reason),
                })
            }
        }
    }

    /// Validation, funds, fraud, approval. The first failing stage wins.
    async fn evaluate(&self, payment_id: &str, req: &PaymentRequest) -> Result<Option<DeclineReason>, EngineError> {
        let today = chrono::Utc::now().date_naive();
        if !structurally_valid(req, &self.limits, today) {
            return Ok(Some(DeclineReason::InvalidCardDetails));
        }

        let card_number = normalize_card_number(&req.card_number);
        if !check_funds(self.cards.as_ref(), &card_number, req.amount).await {
            return Ok(Some(DeclineReason::InsufficientFunds));
        }
        if check_for_fraud(self.fraud.as_ref(), &card_number, req.amount, &req.currency).await {
            return Ok(Some(DeclineReason::SuspectedFraud));
        }

        match approve_payment(self.payments.as_ref(), payment_id, &card_number, req.amount).await {
            Ok(Settlement::Settled) => Ok(None),
            // Another payment drained the card between the funds check and the debit.
            Ok(Settlement::InsufficientFunds) => Ok(Some(DeclineReason::InsufficientFunds)),
            Ok(Settlement::CardMissing) => Ok(Some(DeclineReason::CardMissing)),
            Err(e) => {
                tracing::error!(payment_id, error = %e, "payment failed while approving payment");
                Err(EngineError::infrastructure(STORE_FAILED, e))
            }
        }
    }

    async fn retrieve_unguarded(&self, payment_id: &str) -> Result<PaymentResponse, EngineError> {
        if let Some(cache) = &self.cache {
            match cache.get(payment_id).await {
                Ok(Some(hit)) => {
                    tracing::debug!(payment_id, "payment cache hit");
                    return Ok(hit);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(payment_id, error = %e, "failed to retrieve payment details from cache");
                }
            }
        }

        let record = self
            .payments
            .find_by_payment_id(payment_id)
            .await
            .map_err(|e| {
                tracing::error!(payment_id, error = %e, "failed to retrieve payment details");
                EngineError::infrastructure(RETRIEVE_FAILED, e)
            })?
            .ok_or_else(|| {
                tracing::warn!(payment_id, "payment not found");
                EngineError::PaymentNotFound
            })?;

        let response = PaymentResponse::from_record(&record);

        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(payment_id, &response).await {
                tracing::warn!(payment_id, error = %e, "failed to cache payment details");
            }
        }

        Ok(response)
    }
}
