//! Plan → package id table

use std::collections::BTreeMap;

/// Maps signup plans to rows of the `packages` table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackageTable {
    packages: BTreeMap<String, String>,
}

impl Default for PackageTable {
    fn default() -> Self {
        Self::empty()
            .with_package("basic", "978b133e-6e14-4edf-aa44-133d11fb2929")
            .with_package("pro", "a1095068-a87d-4828-827e-cbfac0f0e736")
            .with_package("premium", "4b562e5d-0fef-4389-9d31-909c3f60b19c")
    }
}

impl PackageTable {
    pub fn empty() -> Self {
        Self {
            packages: BTreeMap::new(),
        }
    }

    pub fn with_package(mut self, plan: impl Into<String>, package_id: impl Into<String>) -> Self {
        self.packages.insert(plan.into(), package_id.into());
        self
    }

    pub fn package_id(&self, plan: &str) -> Option<&str> {
        self.packages.get(plan).map(String::as_str)
    }

    pub fn plans(&self) -> impl Iterator<Item = &str> {
        self.packages.keys().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_packages() {
        let table = PackageTable::default();
        assert_eq!(table.package_id("pro"), Some("a1095068-a87d-4828-827e-cbfac0f0e736"));
        assert_eq!(table.package_id("golden"), None);
        assert_eq!(table.plans().collect::<Vec<_>>(), vec!["basic", "premium", "pro"]);
    }
}
