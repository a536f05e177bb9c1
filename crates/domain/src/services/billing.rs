//! Subscription billing gate.
//!
//! Billing itself is external; the pipeline only asks one question:
//! is this family's account locked? A locked account must produce zero
//! writes, so the gate is consulted before any persistence.

use uuid::Uuid;

/// Boolean gate over the external subscription service.
#[async_trait::async_trait]
pub trait BillingGate: Send + Sync {
    async fn is_locked(&self, family_id: Uuid) -> bool;
}

/// Mock gate for development and testing.
#[derive(Debug, Clone, Default)]
pub struct MockBillingGate {
    pub locked: bool,
}

impl MockBillingGate {
    pub fn unlocked() -> Self {
        Self { locked: false }
    }

    pub fn locked() -> Self {
        Self { locked: true }
    }
}

#[async_trait::async_trait]
impl BillingGate for MockBillingGate {
    async fn is_locked(&self, family_id: Uuid) -> bool {
        if self.locked {
            tracing::debug!(family_id = %family_id, "Mock billing gate reports locked");
        }
        self.locked
    }
}
