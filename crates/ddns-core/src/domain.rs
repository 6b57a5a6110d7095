//! Domain name handling
//!
//! DNS providers address a record by its host part (`RR`) inside a registered
//! zone. [`DomainSpec::parse`] derives both from a configured fully-qualified
//! name; [`validate_domain_name`] is the load-time check that makes the
//! parser total.

use std::fmt;

/// Host part used for a record at the zone apex
pub const APEX: &str = "@";

/// A configured domain split into host part and registered domain
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct DomainSpec {
    /// Host part, e.g. `www`, `a.b`, or [`APEX`]
    pub sub_domain: String,
    /// Last two labels, e.g. `example.com`
    pub main_domain: String,
}

impl DomainSpec {
    /// Split a fully-qualified domain into `(sub_domain, main_domain)`.
    ///
    /// `main_domain` is always the last two labels. Everything before them is
    /// the sub domain, or [`APEX`] when there is nothing before them.
    ///
    /// Input is expected to have passed [`validate_domain_name`]; a single
    /// label is returned as its own main domain under the apex.
    ///
    /// ```
    /// use ddns_core::DomainSpec;
    ///
    /// let spec = DomainSpec::parse("a.b.example.com");
    /// assert_eq!(spec.sub_domain, "a.b");
    /// assert_eq!(spec.main_domain, "example.com");
    /// ```
    pub fn parse(domain: &str) -> Self {
        let labels: Vec<&str> = domain.split('.').collect();
        let split = labels.len().saturating_sub(2);

        let sub_domain = labels[..split].join(".");
        let main_domain = labels[split..].join(".");

        Self {
            sub_domain: if sub_domain.is_empty() {
                APEX.to_string()
            } else {
                sub_domain
            },
            main_domain,
        }
    }

    /// Whether this spec addresses the zone apex
    pub fn is_apex(&self) -> bool {
        self.sub_domain == APEX
    }

    /// The fully-qualified name this spec was parsed from
    pub fn fqdn(&self) -> String {
        if self.is_apex() {
            self.main_domain.clone()
        } else {
            format!("{}.{}", self.sub_domain, self.main_domain)
        }
    }
}

impl fmt::Display for DomainSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({} @ {})", self.fqdn(), self.sub_domain, self.main_domain)
    }
}

/// Validate that a string is a usable domain name
///
/// Basic RFC 1035 checks plus the requirement of at least two labels, since
/// the registered domain is taken from the last two.
pub fn validate_domain_name(domain: &str) -> Result<(), String> {
    if domain.is_empty() {
        return Err("Domain name cannot be empty".to_string());
    }

    if domain.len() > 253 {
        return Err(format!(
            "Domain name too long: {} chars (max 253). Got: {}",
            domain.len(),
            domain
        ));
    }

    let labels: Vec<&str> = domain.split('.').collect();
    if labels.len() < 2 {
        return Err(format!(
            "Domain name must have at least two labels (e.g. example.com). Got: '{}'",
            domain
        ));
    }

    for label in labels {
        if label.is_empty() {
            return Err(format!("Domain name has empty label: '{}'", domain));
        }

        if label.len() > 63 {
            return Err(format!(
                "Domain label too long: {} chars (max 63). Label: '{}'",
                label.len(),
                label
            ));
        }

        if !label.chars().all(|c| c.is_ascii_alphanumeric() || c == '-') {
            return Err(format!(
                "Domain label contains invalid characters. Label: '{}'. \
                Valid: alphanumeric and hyphen only.",
                label
            ));
        }

        if label.starts_with('-') || label.ends_with('-') {
            return Err(format!(
                "Domain label cannot start or end with hyphen. Label: '{}'",
                label
            ));
        }
    }

    Ok(())
}
