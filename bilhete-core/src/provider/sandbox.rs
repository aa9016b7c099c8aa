//! Offline sandbox gateway.

use async_trait::async_trait;
use tracing::info;

use crate::{
    error::Result,
    model::TransactionStatus,
    provider::{ChargeOutcome, ChargeRequest, PaymentGateway},
};

/// Gateway used in sandbox mode: approves every charge without touching the
/// network.
///
/// Selected only by explicit configuration
/// ([`RunMode::Sandbox`](crate::config::RunMode::Sandbox)); a live
/// deployment with missing credentials fails configuration validation
/// instead of falling through to this branch.
#[derive(Debug, Default)]
pub struct SandboxGateway;

impl SandboxGateway {
    /// Creates the sandbox gateway.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl PaymentGateway for SandboxGateway {
    async fn charge(&self, request: &ChargeRequest) -> Result<ChargeOutcome> {
        info!(
            transaction_id = %request.transaction_id,
            amount = request.amount,
            "sandbox mode, simulating approved charge"
        );
        Ok(ChargeOutcome {
            status: TransactionStatus::Approved,
            provider_reference: None,
            payment_qr: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::PaymentMethod;

    #[tokio::test]
    async fn test_sandbox_always_approves() {
        let gateway = SandboxGateway::new();
        for method in [PaymentMethod::McxExpress, PaymentMethod::QrCode] {
            let outcome = gateway
                .charge(&ChargeRequest {
                    transaction_id: "TKT-1-ABC".to_owned(),
                    amount: 5000,
                    method,
                    method_phone: None,
                    description: "test".to_owned(),
                })
                .await
                .unwrap();
            assert_eq!(outcome.status, TransactionStatus::Approved);
            assert!(outcome.payment_qr.is_none());
        }
    }
}
