use serde::{Deserialize, Serialize};
use std::fmt;

/// A subscriber location in `city,region,country` form.
///
/// The canonical string has every comma-separated part trimmed, so
/// `"New York, NY, USA"` and `"New York,NY,USA"` are the same location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub struct Location {
    canonical: String,
    city: Option<String>,
    region: Option<String>,
    country: Option<String>,
}

impl Location {
    pub fn parse(raw: &str) -> Self {
        let parts: Vec<&str> = raw.split(',').map(str::trim).collect();
        let canonical = parts.join(",");
        let part = |index: usize| {
            parts
                .get(index)
                .filter(|value| !value.is_empty())
                .map(|value| value.to_string())
        };

        Self {
            city: part(0),
            region: part(1),
            country: part(2),
            canonical,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.canonical
    }

    pub fn is_empty(&self) -> bool {
        self.canonical.chars().all(|ch| ch == ',')
    }

    pub fn city(&self) -> Option<&str> {
        self.city.as_deref()
    }

    pub fn region(&self) -> Option<&str> {
        self.region.as_deref()
    }

    pub fn country(&self) -> Option<&str> {
        self.country.as_deref()
    }

    /// Short name used in notification titles.
    pub fn display_name(&self) -> &str {
        self.city().unwrap_or(&self.canonical)
    }

    /// Provider query string; empty parts are left out.
    pub fn query(&self) -> String {
        [self.city(), self.region(), self.country()]
            .into_iter()
            .flatten()
            .collect::<Vec<_>>()
            .join(", ")
    }
}

impl From<String> for Location {
    fn from(raw: String) -> Self {
        Self::parse(&raw)
    }
}

impl From<Location> for String {
    fn from(location: Location) -> Self {
        location.canonical
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.canonical)
    }
}
