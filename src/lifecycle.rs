//! The candidate onboarding state machine.
//!
//! Every status the system persists is a closed enum here, and every
//! transition goes through one of the functions below. Handlers never
//! compare status strings directly.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
#[error("unknown status value: {0}")]
pub struct ParseStatusError(String);

/// Overall onboarding stage of a candidate. `status` on the candidates
/// table is the single source of truth; there is no separate `stage`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CandidateStatus {
    Applied,
    #[serde(rename = "Pending IT")]
    PendingIt,
    #[serde(rename = "Offer Sent")]
    OfferSent,
    Provisioned,
    Completed,
}

impl CandidateStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            CandidateStatus::Applied => "Applied",
            CandidateStatus::PendingIt => "Pending IT",
            CandidateStatus::OfferSent => "Offer Sent",
            CandidateStatus::Provisioned => "Provisioned",
            CandidateStatus::Completed => "Completed",
        }
    }
}

impl FromStr for CandidateStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Applied" => Ok(CandidateStatus::Applied),
            "Pending IT" => Ok(CandidateStatus::PendingIt),
            "Offer Sent" => Ok(CandidateStatus::OfferSent),
            "Provisioned" => Ok(CandidateStatus::Provisioned),
            "Completed" => Ok(CandidateStatus::Completed),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

impl fmt::Display for CandidateStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The candidate's decision on the offer, independent of whether one
/// was sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OfferDecision {
    None,
    Accepted,
    Rejected,
}

impl OfferDecision {
    pub fn as_str(&self) -> &'static str {
        match self {
            OfferDecision::None => "none",
            OfferDecision::Accepted => "accepted",
            OfferDecision::Rejected => "rejected",
        }
    }
}

impl FromStr for OfferDecision {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "none" => Ok(OfferDecision::None),
            "accepted" => Ok(OfferDecision::Accepted),
            "rejected" => Ok(OfferDecision::Rejected),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentStatus {
    Pending,
    Verified,
    Rejected,
}

impl DocumentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            DocumentStatus::Pending => "Pending",
            DocumentStatus::Verified => "Verified",
            DocumentStatus::Rejected => "Rejected",
        }
    }
}

impl FromStr for DocumentStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Pending" => Ok(DocumentStatus::Pending),
            "Verified" => Ok(DocumentStatus::Verified),
            "Rejected" => Ok(DocumentStatus::Rejected),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AssetStatus {
    Available,
    Allocated,
    Maintenance,
    Retired,
}

impl AssetStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AssetStatus::Available => "Available",
            AssetStatus::Allocated => "Allocated",
            AssetStatus::Maintenance => "Maintenance",
            AssetStatus::Retired => "Retired",
        }
    }
}

impl FromStr for AssetStatus {
    type Err = ParseStatusError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "Available" => Ok(AssetStatus::Available),
            "Allocated" => Ok(AssetStatus::Allocated),
            "Maintenance" => Ok(AssetStatus::Maintenance),
            "Retired" => Ok(AssetStatus::Retired),
            other => Err(ParseStatusError(other.to_string())),
        }
    }
}

/// Coarse three-state projection for list views. Computed here and only
/// here; responses carry it so no client re-derives it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Progress {
    Pending,
    InProgress,
    Completed,
}

/// Status after HR sends the offer letter. The provisioning track and
/// the offer track converge on `Completed` regardless of ordering.
pub fn status_after_offer_sent(credentials_created: bool) -> CandidateStatus {
    if credentials_created {
        CandidateStatus::Completed
    } else {
        CandidateStatus::OfferSent
    }
}

/// Status after IT provisions credentials.
pub fn status_after_provisioning(sent_offer_letter: bool) -> CandidateStatus {
    if sent_offer_letter {
        CandidateStatus::Completed
    } else {
        CandidateStatus::Provisioned
    }
}

pub fn derive_progress(status: CandidateStatus, has_asset_summary: bool) -> Progress {
    match status {
        CandidateStatus::Applied | CandidateStatus::PendingIt => Progress::Pending,
        CandidateStatus::OfferSent => Progress::InProgress,
        CandidateStatus::Provisioned => {
            if has_asset_summary {
                Progress::Completed
            } else {
                Progress::InProgress
            }
        }
        CandidateStatus::Completed => Progress::Completed,
    }
}
