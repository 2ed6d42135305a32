//! Professional directory records.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// Which kind of professional the user wants to see.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProfessionalKind {
    Counsellor,
    Doctor,
}

impl std::fmt::Display for ProfessionalKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Counsellor => "counsellor",
            Self::Doctor => "doctor",
        };
        write!(f, "{s}")
    }
}

impl std::str::FromStr for ProfessionalKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "counsellor" | "counselor" => Ok(Self::Counsellor),
            "doctor" => Ok(Self::Doctor),
            other => Err(format!("Unknown professional kind: {other}")),
        }
    }
}

/// One entry from the professional directory.
///
/// Counsellors are affiliated with a college; doctors carry a medical
/// specialization. Consumers match exhaustively, so a new category is a
/// compile-checked change everywhere the type is used.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Professional {
    Counsellor {
        id: String,
        name: String,
        college: String,
        rating: f32,
        #[serde(default)]
        review_count: u32,
    },
    Doctor {
        id: String,
        name: String,
        specialization: String,
        rating: f32,
        #[serde(default)]
        review_count: u32,
    },
}

impl Professional {
    pub fn id(&self) -> &str {
        match self {
            Self::Counsellor { id, .. } | Self::Doctor { id, .. } => id,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Counsellor { name, .. } | Self::Doctor { name, .. } => name,
        }
    }

    pub fn rating(&self) -> f32 {
        match self {
            Self::Counsellor { rating, .. } | Self::Doctor { rating, .. } => *rating,
        }
    }

    pub fn review_count(&self) -> u32 {
        match self {
            Self::Counsellor { review_count, .. } | Self::Doctor { review_count, .. } => {
                *review_count
            }
        }
    }

    pub fn kind(&self) -> ProfessionalKind {
        match self {
            Self::Counsellor { .. } => ProfessionalKind::Counsellor,
            Self::Doctor { .. } => ProfessionalKind::Doctor,
        }
    }

    /// Variant-specific affiliation line for display: the college for a
    /// counsellor, the specialization for a doctor.
    pub fn affiliation(&self) -> &str {
        match self {
            Self::Counsellor { college, .. } => college,
            Self::Doctor { specialization, .. } => specialization,
        }
    }
}

/// A college whose students can book affiliated counsellors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct College {
    pub id: String,
    pub name: String,
}

/// Sort a professional list by descending rating, stable for equal ratings.
pub fn sort_by_rating_desc(list: &mut [Professional]) {
    list.sort_by(|a, b| {
        b.rating()
            .partial_cmp(&a.rating())
            .unwrap_or(Ordering::Equal)
    });
}
