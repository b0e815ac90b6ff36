//! Estate Match - buyer/property matching engine for the agency CRM
//!
//! This library decides which listings satisfy a buyer's search criteria
//! (property type, size floor, price ceiling, geographic search area) and
//! ranks the accepted ones with a 0-100 fit score.

pub mod config;
pub mod core;
pub mod models;
pub mod routes;

// Re-export commonly used types
pub use crate::core::{
    compute_match_score, compute_shared_match_score, is_listing_matching_buyer,
    is_shared_listing_matching_buyer, Matcher, RejectReason, SearchArea, Verdict,
};
pub use models::{BuyerCriteria, Listing, MatchingPolicy, ScoringPolicy, SharedListing};
