use crate::core::validate::ValidationEngine;
use crate::domain::model::{AuditEntry, ValidationOutcome};
use crate::domain::ports::{AuditLog, RegistryStore, SmsGateway};
use crate::utils::error::Result;

/// Inbound messages longer than this are treated as noise and kept out of
/// the audit log. A legacy cutoff, preserved deliberately.
pub const MAX_AUDITED_MESSAGE_LEN: usize = 40;

/// The validation engine's caller: classifies an inbound message, records
/// the outcome, and replies through the SMS gateway.
pub struct CheckService<S, A, G> {
    engine: ValidationEngine<S>,
    audit: A,
    gateway: G,
}

impl<S, A, G> CheckService<S, A, G>
where
    S: RegistryStore,
    A: AuditLog,
    G: SmsGateway,
{
    pub fn new(engine: ValidationEngine<S>, audit: A, gateway: G) -> Self {
        CheckService {
            engine,
            audit,
            gateway,
        }
    }

    /// Direct lookup, no audit record and no reply.
    pub async fn check(&self, raw: &str) -> Result<ValidationOutcome> {
        self.engine.validate(raw).await
    }

    /// The webhook-shaped path: validate, audit, reply.
    ///
    /// The audit record is written before the reply goes out; a transport
    /// failure is logged but does not undo the record or fail the request.
    pub async fn handle_message(&self, sender: &str, message: &str) -> Result<ValidationOutcome> {
        let outcome = self.engine.validate(message).await?;

        if message.chars().count() <= MAX_AUDITED_MESSAGE_LEN {
            self.audit
                .record(AuditEntry {
                    status: outcome.status,
                    sender: sender.to_string(),
                    message: message.to_string(),
                    answer: outcome.answer.clone(),
                    date: chrono::Local::now().naive_local(),
                })
                .await?;
        } else {
            tracing::debug!(
                "skipping audit for oversized message from {sender} ({} chars)",
                message.chars().count()
            );
        }

        if let Err(e) = self.gateway.send(sender, &outcome.answer).await {
            tracing::warn!("could not deliver the answer to {sender}: {e}");
        }

        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::memory::{MemoryAuditLog, MemoryRegistry};
    use crate::adapters::sms::NoopSmsGateway;
    use crate::core::normalize::normalize;
    use crate::domain::model::{SerialRange, ValidationStatus, SERIAL_WIDTH};
    use crate::utils::error::RegistryError;
    use async_trait::async_trait;
    use chrono::NaiveDate;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    struct FailingGateway {
        attempts: Arc<AtomicUsize>,
    }

    #[async_trait]
    impl SmsGateway for FailingGateway {
        async fn send(&self, _receptor: &str, _message: &str) -> Result<()> {
            self.attempts.fetch_add(1, Ordering::SeqCst);
            Err(RegistryError::SmsRejected { status: 502 })
        }
    }

    async fn seeded_store() -> MemoryRegistry {
        let store = MemoryRegistry::new();
        store.begin_import().await.unwrap();
        store
            .stage_ranges(vec![SerialRange {
                id: 1,
                reference: "REF-1".to_string(),
                description: "Batch 1".to_string(),
                start: normalize("AA100", SERIAL_WIDTH).unwrap(),
                end: normalize("AA200", SERIAL_WIDTH).unwrap(),
                effective_date: NaiveDate::from_ymd_opt(2023, 5, 20).unwrap(),
            }])
            .await
            .unwrap();
        store.commit_ranges().await.unwrap();
        store
    }

    #[tokio::test]
    async fn test_handle_message_audits_and_answers() {
        let audit = MemoryAuditLog::new();
        let service = CheckService::new(
            ValidationEngine::new(seeded_store().await, SERIAL_WIDTH),
            audit.clone(),
            NoopSmsGateway,
        );

        let outcome = service.handle_message("+989120000000", "AA150").await.unwrap();
        assert_eq!(outcome.status, ValidationStatus::Ok);

        let entries = audit.recent(10).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].sender, "+989120000000");
        assert_eq!(entries[0].message, "AA150");
        assert_eq!(entries[0].status, ValidationStatus::Ok);
        assert_eq!(entries[0].answer, outcome.answer);
    }

    #[tokio::test]
    async fn test_oversized_message_is_not_audited() {
        let audit = MemoryAuditLog::new();
        let service = CheckService::new(
            ValidationEngine::new(seeded_store().await, SERIAL_WIDTH),
            audit.clone(),
            NoopSmsGateway,
        );

        let message = "x".repeat(MAX_AUDITED_MESSAGE_LEN + 1);
        service.handle_message("sender", &message).await.unwrap();
        assert!(audit.recent(10).await.unwrap().is_empty());

        // The boundary itself is still audited.
        let message = "x".repeat(MAX_AUDITED_MESSAGE_LEN);
        service.handle_message("sender", &message).await.unwrap();
        assert_eq!(audit.recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_gateway_failure_keeps_the_audit_record() {
        let audit = MemoryAuditLog::new();
        let attempts = Arc::new(AtomicUsize::new(0));
        let service = CheckService::new(
            ValidationEngine::new(seeded_store().await, SERIAL_WIDTH),
            audit.clone(),
            FailingGateway {
                attempts: attempts.clone(),
            },
        );

        let outcome = service.handle_message("sender", "AA150").await.unwrap();
        assert_eq!(outcome.status, ValidationStatus::Ok);
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
        assert_eq!(audit.recent(10).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_status_counts_accumulate() {
        let audit = MemoryAuditLog::new();
        let service = CheckService::new(
            ValidationEngine::new(seeded_store().await, SERIAL_WIDTH),
            audit.clone(),
            NoopSmsGateway,
        );

        service.handle_message("s", "AA150").await.unwrap();
        service.handle_message("s", "AA999").await.unwrap();
        service.handle_message("s", "AA999").await.unwrap();

        let counts = audit.status_counts().await.unwrap();
        assert_eq!(counts.ok, 1);
        assert_eq!(counts.not_found, 2);
        assert_eq!(counts.failure, 0);
        assert_eq!(counts.double, 0);
    }
}
