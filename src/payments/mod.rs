//! Payments Module
//!
//! Plan pricing and Stripe payment intents for the checkout page.

pub mod prices;
pub mod service;
pub mod stripe;

pub use prices::PriceTable;
pub use service::{CheckoutSession, PaymentService};
pub use stripe::{
    parse_stripe_response, PaymentError, PaymentIntent, PaymentIntentParams, PaymentIntents,
    StripeClient,
};

#[cfg(test)]
pub use stripe::MockPaymentIntents;
