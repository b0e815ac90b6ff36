// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    BuyerCriteria, BuyerMatch, Coordinates, Listing, ListingSource, ListingStatus, LocationField,
    MatchingPolicy, NumericField, PropertyListing, ScoredListing, ScoringPolicy, SharedListing,
};
pub use requests::{EvaluateRequest, EvaluateSharedRequest, FindBuyersRequest, FindMatchesRequest};
pub use responses::{
    ErrorResponse, EvaluateResponse, FindBuyersResponse, FindMatchesResponse, HealthResponse,
};
