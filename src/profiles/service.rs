//! Signup: validate form → resolve package → insert profile

use serde_json::Value;
use std::sync::Arc;

use super::form::SignupForm;
use super::packages::PackageTable;
use super::supabase::{ProfileError, ProfileStore};
use crate::common::logging::{log_collaborator_event, EventCategory};

#[derive(Clone)]
pub struct ProfileService {
    store: Arc<dyn ProfileStore>,
    packages: PackageTable,
}

impl ProfileService {
    pub fn new(store: Arc<dyn ProfileStore>, packages: PackageTable) -> Self {
        Self { store, packages }
    }

    /// Create a profile from a signup body, returning the stored row
    pub async fn create(&self, body: &Value) -> Result<Value, ProfileError> {
        let form = SignupForm::from_body(body)?;
        let plan = form.plan.clone();
        let profile = form.into_profile(&self.packages)?;

        match self.store.insert_profile(&profile).await {
            Ok(row) => {
                log_collaborator_event(EventCategory::Profile, "profile_created", &plan, true, None);
                Ok(row)
            }
            Err(e) => {
                log_collaborator_event(
                    EventCategory::Profile,
                    "profile_insert_failed",
                    &plan,
                    false,
                    Some(&e.to_string()),
                );
                Err(e)
            }
        }
    }
}
