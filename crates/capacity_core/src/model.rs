//! Domain records for capacities and their bootcamp/technology views.
//!
//! Only `Capacity` and the bootcamp assignment are persisted locally. The
//! technology-bearing shapes are read models assembled from remote data.

use serde::{Deserialize, Serialize};

/// A named bundle of technology skills.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Capacity {
    /// Absent until the store assigns one.
    pub id: Option<i64>,
    pub name: String,
    pub description: String,
    pub technologies: Vec<i64>,
}

impl Capacity {
    pub fn new(
        name: impl Into<String>,
        description: impl Into<String>,
        technologies: Vec<i64>,
    ) -> Self {
        Self {
            id: None,
            name: name.into(),
            description: description.into(),
            technologies,
        }
    }
}

/// Technology detail as reported by the technology service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TechnologyItem {
    pub id: i64,
    pub name: String,
}

/// Technology details grouped by capacity id, as returned by the gateway.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityTechnologies {
    pub id: i64,
    #[serde(default)]
    pub technologies: Vec<TechnologyItem>,
}

/// Presentation view of a capacity with its resolved technologies. Never persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacitySummary {
    pub id: i64,
    pub name: String,
    pub technologies: Vec<TechnologyItem>,
}

/// Item type of the paginated capacity listing.
pub type CapacityList = CapacitySummary;

/// Capacity reference without technologies (id + name), as stored locally.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapacityBasicItem {
    pub id: i64,
    pub name: String,
}

/// Capacities assigned to one bootcamp, before enrichment.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesBasicPerBootcamp {
    /// Bootcamp id.
    pub id: i64,
    pub capabilities: Vec<CapacityBasicItem>,
}

/// Capacities assigned to one bootcamp, enriched with technology details.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CapabilitiesPerBootcamp {
    /// Bootcamp id.
    pub id: i64,
    pub capabilities: Vec<CapacitySummary>,
}

/// Join-table row linking a capacity to a bootcamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BootcampAssignment {
    pub capacity_id: i64,
    pub bootcamp_id: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

impl SortOrder {
    /// Wire value used in query strings, both inbound and towards the technology service.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Ascending => "ASC",
            Self::Descending => "DESC",
        }
    }

    /// Case-insensitive parse of `ASC` / `DESC`.
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_uppercase().as_str() {
            "ASC" => Some(Self::Ascending),
            "DESC" => Some(Self::Descending),
            _ => None,
        }
    }
}

/// Sort key for the capacity listing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortItem {
    #[default]
    Name,
    Technologies,
}

impl SortItem {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Technologies => "technologies",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "name" => Some(Self::Name),
            "technologies" => Some(Self::Technologies),
            _ => None,
        }
    }
}
