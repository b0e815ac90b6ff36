use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::models::domain::{BuyerCriteria, Listing, SharedListing};

/// Request to evaluate a single owned listing against a buyer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateRequest {
    pub listing: Listing,
    pub buyer: BuyerCriteria,
}

/// Request to evaluate a single shared listing against a buyer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EvaluateSharedRequest {
    pub listing: SharedListing,
    pub buyer: BuyerCriteria,
}

/// Request to rank candidate listings for one buyer
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindMatchesRequest {
    pub buyer: BuyerCriteria,
    #[serde(default)]
    pub listings: Vec<Listing>,
    #[serde(rename = "sharedListings", alias = "shared_listings", default)]
    pub shared_listings: Vec<SharedListing>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}

/// Request to rank interested buyers for one listing
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct FindBuyersRequest {
    pub listing: Listing,
    #[serde(default)]
    pub buyers: Vec<BuyerCriteria>,
    #[validate(range(min = 1))]
    #[serde(default)]
    pub limit: Option<u16>,
}
