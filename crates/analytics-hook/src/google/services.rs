//! Google Analytics service descriptors
//!
//! Two services back the hook: the v4 Reporting API for reading reports and
//! the v3 Management API for the core reporting endpoint and uploads.

use std::fmt;
use std::str::FromStr;

use crate::common::AnalyticsError;

/// Which Analytics service a client handle talks to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ServiceRole {
    Reporting,
    Management,
}

/// Immutable description of a Google API service
#[derive(Debug, PartialEq, Eq)]
pub struct ServiceDescriptor {
    pub name: &'static str,
    pub version: &'static str,
    pub scopes: &'static [&'static str],
    pub root_url: &'static str,
    pub upload_root_url: Option<&'static str>,
}

static REPORTING: ServiceDescriptor = ServiceDescriptor {
    name: "analyticsreporting",
    version: "v4",
    scopes: &["https://www.googleapis.com/auth/analytics.readonly"],
    root_url: "https://analyticsreporting.googleapis.com/v4",
    upload_root_url: None,
};

static MANAGEMENT: ServiceDescriptor = ServiceDescriptor {
    name: "analytics",
    version: "v3",
    scopes: &["https://www.googleapis.com/auth/analytics"],
    root_url: "https://www.googleapis.com/analytics/v3",
    upload_root_url: Some("https://www.googleapis.com/upload/analytics/v3"),
};

impl ServiceRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            ServiceRole::Reporting => "reporting",
            ServiceRole::Management => "management",
        }
    }

    pub fn descriptor(&self) -> &'static ServiceDescriptor {
        match self {
            ServiceRole::Reporting => &REPORTING,
            ServiceRole::Management => &MANAGEMENT,
        }
    }
}

impl fmt::Display for ServiceRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ServiceRole {
    type Err = AnalyticsError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "reporting" => Ok(ServiceRole::Reporting),
            "management" => Ok(ServiceRole::Management),
            other => Err(AnalyticsError::UnknownService(other.to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_descriptors() {
        let reporting = ServiceRole::Reporting.descriptor();
        assert_eq!(reporting.name, "analyticsreporting");
        assert_eq!(reporting.version, "v4");
        assert_eq!(reporting.scopes, ["https://www.googleapis.com/auth/analytics.readonly"]);

        let management = ServiceRole::Management.descriptor();
        assert_eq!(management.name, "analytics");
        assert_eq!(management.version, "v3");
        assert_eq!(management.scopes, ["https://www.googleapis.com/auth/analytics"]);
        assert!(management.upload_root_url.is_some());
    }

    #[test]
    fn test_parse_role() {
        assert_eq!("reporting".parse::<ServiceRole>().unwrap(), ServiceRole::Reporting);
        assert_eq!("management".parse::<ServiceRole>().unwrap(), ServiceRole::Management);
        assert!(matches!(
            "adsense".parse::<ServiceRole>(),
            Err(AnalyticsError::UnknownService(_))
        ));
    }
}
