//! Checkout: plan → price → payment intent

use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;

use super::prices::PriceTable;
use super::stripe::{PaymentError, PaymentIntentParams, PaymentIntents};
use crate::common::logging::{log_collaborator_event, EventCategory};

/// Returned to the checkout page
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CheckoutSession {
    pub client_secret: String,
    pub amount: u64,
    pub currency: String,
}

#[derive(Clone)]
pub struct PaymentService {
    intents: Arc<dyn PaymentIntents>,
    prices: PriceTable,
}

impl PaymentService {
    pub fn new(intents: Arc<dyn PaymentIntents>, prices: PriceTable) -> Self {
        Self { intents, prices }
    }

    /// Create a payment intent for the `plan` field of a request body
    pub async fn checkout(&self, body: &Value) -> Result<CheckoutSession, PaymentError> {
        let received = body.get("plan").cloned().unwrap_or(Value::Null);
        let (plan, amount) = match received.as_str().and_then(|p| Some((p, self.prices.price(p)?))) {
            Some(found) => found,
            None => {
                return Err(PaymentError::InvalidPlan {
                    plans: self.prices.plans().collect::<Vec<_>>().join(", "),
                    received: received.clone(),
                })
            }
        };

        let params = PaymentIntentParams {
            amount,
            currency: self.prices.currency().to_string(),
            plan: plan.to_string(),
        };

        match self.intents.create_payment_intent(&params).await {
            Ok(intent) => {
                log_collaborator_event(EventCategory::Payment, "payment_intent_created", plan, true, None);
                Ok(CheckoutSession {
                    client_secret: intent.client_secret,
                    amount: params.amount,
                    currency: params.currency,
                })
            }
            Err(e) => {
                log_collaborator_event(
                    EventCategory::Payment,
                    "payment_intent_failed",
                    plan,
                    false,
                    Some(&e.to_string()),
                );
                Err(e)
            }
        }
    }
}
