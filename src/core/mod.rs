// Core algorithm exports
pub mod distance;
pub mod filters;
pub mod geometry;
pub mod matcher;
pub mod scoring;

pub use distance::{haversine_distance, is_within_radius};
pub use filters::{normalize_property_type, is_available, meets_size_floor, within_price_ceiling};
pub use geometry::{extract_coordinates, is_point_in_search_area, GeometryError, SearchArea, Zone};
pub use matcher::{
    compute_match_score, compute_shared_match_score, is_listing_matching_buyer,
    is_shared_listing_matching_buyer, BuyerMatchResult, MatchResult, Matcher, PreparedCriteria,
    RejectReason, Verdict,
};
pub use scoring::calculate_match_score;
