//! deposit-gate - Payment Verification Backend
//!
//! Server-side endpoints for a subscription checkout site:
//!
//! 1. **Deposit Verification** - Confirms a customer's exchange deposit by
//!    querying the operator's Bybit deposit history with a signed request
//! 2. **Payment Intents** - Creates Stripe payment intents for a plan
//! 3. **Profiles** - Stores signup profiles in Supabase
//!
//! Secrets stay on the server; the browser only ever sees the results.

pub mod api;
pub mod bybit;
pub mod common;
pub mod payments;
pub mod profiles;
pub mod verifier;

// Re-exports: Exchange client
pub use bybit::{
    BybitClient, DepositQuery, DepositRecord, DepositSource, ExchangeError, ExchangeTransport,
    RawResponse, ReqwestTransport, SignedRequest,
};

// Re-exports: Verification
pub use verifier::{
    DepositVerifier, NormalizedRequest, SearchWindow, ValidationError, VerificationRequest,
    VerificationResult, VerifyError, WindowEcho,
};

// Re-exports: Collaborators
pub use payments::{CheckoutSession, PaymentError, PaymentService, PriceTable, StripeClient};
pub use profiles::{PackageTable, ProfileError, ProfileService, SupabaseClient};

// Re-exports: Configuration and errors
pub use common::{ConfigError, GatewayConfig, GatewayError};
