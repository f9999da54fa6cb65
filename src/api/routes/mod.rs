//! API Routes Module
//!
//! Route handlers organized by domain:
//! - deposits: exchange deposit verification
//! - payments: Stripe payment intents
//! - profiles: signup profiles
//! - health: health check

pub mod deposits;
pub mod health;
pub mod payments;
pub mod profiles;
