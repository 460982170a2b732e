//! The payment collaborator contract: `charge(amount, currency, method,
//! reference) → {settled, authorization_id} | error`. Card-network
//! acquisition is out of scope here; the core only consumes this trait
//! and never constructs a concrete implementation itself.

use async_trait::async_trait;
use rust_decimal::Decimal;

use crate::error::CoreResult;

#[derive(Debug, Clone)]
pub struct ChargeRequest {
    pub amount: Decimal,
    pub currency: String,
    pub method: String,
    pub reference: String,
}

#[derive(Debug, Clone)]
pub struct ChargeResult {
    pub settled: bool,
    pub authorization_id: Option<String>,
}

/// Implemented by whatever card-network integration a deployment wires
/// in; the core never constructs one concretely.
#[async_trait]
pub trait PaymentProcessor: Send + Sync {
    async fn charge(&self, request: ChargeRequest) -> CoreResult<ChargeResult>;
}

/// Settles every charge immediately - a stand-in for the real payment
/// network. Used for box-office / cash desk deployments where the amount
/// was already collected before checkout is called; a real deployment
/// wires in a card-network adapter instead.
#[derive(Debug, Default)]
pub struct ManualSettlementProcessor;

#[async_trait]
impl PaymentProcessor for ManualSettlementProcessor {
    async fn charge(&self, request: ChargeRequest) -> CoreResult<ChargeResult> {
        Ok(ChargeResult {
            settled: true,
            authorization_id: Some(request.reference),
        })
    }
}
