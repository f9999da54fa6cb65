//! Signup form validation

use serde::Serialize;
use serde_json::Value;

use super::packages::PackageTable;
use super::supabase::ProfileError;
use crate::verifier::coerce::value_to_text;

pub const REQUIRED_FIELDS: [&str; 7] = [
    "first_name",
    "last_name",
    "email",
    "phone",
    "nationality",
    "residence_country",
    "plan",
];

/// Signup form with every field trimmed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignupForm {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub whatsapp: Option<String>,
    pub nationality: String,
    pub residence_country: String,
    pub plan: String,
}

/// Row inserted into `profiles`
///
/// Column names follow the live table, typos included.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NewProfile {
    pub full_name: String,
    pub email: String,
    #[serde(rename = "Phone_num")]
    pub phone_num: String,
    pub whatsapp: Option<String>,
    pub country: String,
    pub residance_country: String,
    pub package_id: String,
}

fn text_field(body: &Value, name: &str) -> String {
    body.get(name)
        .and_then(value_to_text)
        .map(|s| s.trim().to_string())
        .unwrap_or_default()
}

impl SignupForm {
    /// Read the form out of a request body; every required field must be non-empty
    pub fn from_body(body: &Value) -> Result<Self, ProfileError> {
        let form = Self {
            first_name: text_field(body, "first_name"),
            last_name: text_field(body, "last_name"),
            email: text_field(body, "email"),
            phone: text_field(body, "phone"),
            whatsapp: Some(text_field(body, "whatsapp")).filter(|w| !w.is_empty()),
            nationality: text_field(body, "nationality"),
            residence_country: text_field(body, "residence_country"),
            plan: text_field(body, "plan"),
        };

        let required = [
            &form.first_name,
            &form.last_name,
            &form.email,
            &form.phone,
            &form.nationality,
            &form.residence_country,
            &form.plan,
        ];
        if required.iter().any(|v| v.is_empty()) {
            return Err(ProfileError::MissingFields(REQUIRED_FIELDS.join(", ")));
        }

        Ok(form)
    }

    /// Resolve the plan and build the row to insert
    pub fn into_profile(self, packages: &PackageTable) -> Result<NewProfile, ProfileError> {
        let package_id = packages
            .package_id(&self.plan)
            .ok_or_else(|| ProfileError::InvalidPlan(packages.plans().collect::<Vec<_>>().join(", ")))?
            .to_string();

        Ok(NewProfile {
            full_name: format!("{} {}", self.first_name, self.last_name).trim().to_string(),
            email: self.email,
            phone_num: self.phone,
            whatsapp: self.whatsapp,
            country: self.nationality,
            residance_country: self.residence_country,
            package_id,
        })
    }
}
