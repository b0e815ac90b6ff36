use serde::{Deserialize, Serialize};

use crate::models::domain::{BuyerMatch, ScoredListing};

/// Outcome of a single pair evaluation
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateResponse {
    pub matched: bool,
    pub score: u8,
    /// First failing check, `None` when matched
    pub reason: Option<String>,
}

/// Response for the find matches endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindMatchesResponse {
    pub matches: Vec<ScoredListing>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Response for the find buyers endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FindBuyersResponse {
    pub matches: Vec<BuyerMatch>,
    #[serde(rename = "totalCandidates")]
    pub total_candidates: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    #[serde(rename = "statusCode")]
    pub status_code: u16,
}
