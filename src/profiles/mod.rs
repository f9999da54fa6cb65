//! Profiles Module
//!
//! Signup form → `profiles` row in Supabase, with the plan resolved to a
//! package id.

pub mod form;
pub mod packages;
pub mod service;
pub mod supabase;

pub use form::{NewProfile, SignupForm, REQUIRED_FIELDS};
pub use packages::PackageTable;
pub use service::ProfileService;
pub use supabase::{parse_insert_response, ProfileError, ProfileStore, SupabaseClient};

#[cfg(test)]
pub use supabase::MockProfileStore;
