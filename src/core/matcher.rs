use std::cmp::Ordering;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::{
    filters::{
        is_available, matches_property_type, meets_size_floor, normalize_property_type,
        within_price_ceiling,
    },
    geometry::{extract_coordinates, GeometryError, SearchArea},
    scoring::calculate_match_score,
};
use crate::models::{
    BuyerCriteria, BuyerMatch, Listing, MatchingPolicy, PropertyListing, ScoredListing,
    ScoringPolicy, SharedListing,
};

/// First failing check for a (listing, buyer) pair
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    Unavailable,
    PropertyType,
    Size,
    Price,
    MissingCoordinates,
    InvalidSearchArea,
    OutsideSearchArea,
}

impl RejectReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            RejectReason::Unavailable => "unavailable",
            RejectReason::PropertyType => "property_type",
            RejectReason::Size => "size",
            RejectReason::Price => "price",
            RejectReason::MissingCoordinates => "missing_coordinates",
            RejectReason::InvalidSearchArea => "invalid_search_area",
            RejectReason::OutsideSearchArea => "outside_search_area",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Outcome of matching one listing against one buyer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    Match,
    Reject(RejectReason),
}

impl Verdict {
    pub fn is_match(&self) -> bool {
        matches!(self, Verdict::Match)
    }

    pub fn reason(&self) -> Option<RejectReason> {
        match self {
            Verdict::Match => None,
            Verdict::Reject(reason) => Some(*reason),
        }
    }
}

/// Buyer criteria with the property type normalized and the search area
/// resolved, so a batch only does that work once per buyer
#[derive(Debug, Clone)]
pub struct PreparedCriteria<'a> {
    buyer: &'a BuyerCriteria,
    property_type: String,
    search_area: Option<Result<SearchArea, GeometryError>>,
}

/// Result of ranking listings for a buyer
#[derive(Debug)]
pub struct MatchResult {
    pub matches: Vec<ScoredListing>,
    pub total_candidates: usize,
}

/// Result of ranking buyers for a listing
#[derive(Debug)]
pub struct BuyerMatchResult {
    pub matches: Vec<BuyerMatch>,
    pub total_candidates: usize,
}

/// Buyer/listing matcher
///
/// # Checks (in order, first failure wins)
/// 1. Availability
/// 2. Property type
/// 3. Size floor (with tolerance)
/// 4. Price ceiling (with tolerance)
/// 5. Geographic containment
///
/// Holds only immutable policies; share freely across threads.
#[derive(Debug, Clone, Default)]
pub struct Matcher {
    matching: MatchingPolicy,
    scoring: ScoringPolicy,
}

impl Matcher {
    pub fn new(matching: MatchingPolicy, scoring: ScoringPolicy) -> Self {
        Self { matching, scoring }
    }

    pub fn scoring_policy(&self) -> &ScoringPolicy {
        &self.scoring
    }

    /// Normalize a buyer's criteria for repeated evaluation
    pub fn prepare<'a>(&self, buyer: &'a BuyerCriteria) -> PreparedCriteria<'a> {
        let property_type = buyer
            .property_type
            .as_deref()
            .map(normalize_property_type)
            .unwrap_or_default();

        let search_area = buyer
            .search_area
            .as_ref()
            .map(|area| SearchArea::parse(area, self.matching.point_zone_radius_m));

        if let Some(Err(e)) = &search_area {
            tracing::warn!(
                buyer_id = buyer.buyer_id.as_deref().unwrap_or("-"),
                error = %e,
                "buyer search area is invalid, no listing will match it"
            );
        }

        PreparedCriteria {
            buyer,
            property_type,
            search_area,
        }
    }

    /// Match one listing against one buyer
    pub fn evaluate<L: PropertyListing + ?Sized>(&self, listing: &L, buyer: &BuyerCriteria) -> Verdict {
        self.evaluate_prepared(listing, &self.prepare(buyer))
    }

    /// Match one listing against already prepared criteria
    pub fn evaluate_prepared<L: PropertyListing + ?Sized>(
        &self,
        listing: &L,
        criteria: &PreparedCriteria<'_>,
    ) -> Verdict {
        let verdict = match self.first_failure(listing, criteria) {
            Some(reason) => Verdict::Reject(reason),
            None => Verdict::Match,
        };

        match verdict {
            Verdict::Match => tracing::debug!(listing_id = listing.listing_id(), "listing matches buyer"),
            Verdict::Reject(reason) => tracing::debug!(
                listing_id = listing.listing_id(),
                reason = %reason,
                "listing rejected"
            ),
        }

        verdict
    }

    fn first_failure<L: PropertyListing + ?Sized>(
        &self,
        listing: &L,
        criteria: &PreparedCriteria<'_>,
    ) -> Option<RejectReason> {
        let buyer = criteria.buyer;

        if !is_available(listing.status()) {
            return Some(RejectReason::Unavailable);
        }

        if !matches_property_type(listing.property_type(), &criteria.property_type) {
            return Some(RejectReason::PropertyType);
        }

        if !meets_size_floor(listing.size(), buyer.min_size, self.matching.min_size_factor) {
            return Some(RejectReason::Size);
        }

        if !within_price_ceiling(listing.price(), buyer.max_price, self.matching.max_price_factor) {
            return Some(RejectReason::Price);
        }

        // Geography is the one check where missing listing data fails
        let area = match &criteria.search_area {
            None => return None,
            Some(Err(_)) => return Some(RejectReason::InvalidSearchArea),
            Some(Ok(area)) => area,
        };

        match extract_coordinates(listing) {
            None => Some(RejectReason::MissingCoordinates),
            Some(point) if !area.contains(point) => Some(RejectReason::OutsideSearchArea),
            Some(_) => None,
        }
    }

    pub fn is_match<L: PropertyListing + ?Sized>(&self, listing: &L, buyer: &BuyerCriteria) -> bool {
        self.evaluate(listing, buyer).is_match()
    }

    /// Fit score in [0, 100]; 0 when the pair does not match
    pub fn score<L: PropertyListing + ?Sized>(&self, listing: &L, buyer: &BuyerCriteria) -> u8 {
        self.score_prepared(listing, &self.prepare(buyer))
    }

    pub fn score_prepared<L: PropertyListing + ?Sized>(
        &self,
        listing: &L,
        criteria: &PreparedCriteria<'_>,
    ) -> u8 {
        if !self.evaluate_prepared(listing, criteria).is_match() {
            return 0;
        }
        calculate_match_score(listing.size(), listing.price(), criteria.buyer, &self.scoring)
    }

    /// Rank owned and shared listings for one buyer
    ///
    /// # Arguments
    /// * `buyer` - The buyer's search criteria
    /// * `listings` - Candidate agency listings
    /// * `shared_listings` - Candidate multi-agency listings
    /// * `limit` - Maximum number of matches to return
    ///
    /// # Returns
    /// MatchResult with accepted listings, best score first
    pub fn find_matches(
        &self,
        buyer: &BuyerCriteria,
        listings: &[Listing],
        shared_listings: &[SharedListing],
        limit: usize,
    ) -> MatchResult {
        let total_candidates = listings.len() + shared_listings.len();
        let criteria = self.prepare(buyer);

        let owned = listings.iter().map(|l| l as &dyn PropertyListing);
        let shared = shared_listings.iter().map(|l| l as &dyn PropertyListing);

        let mut matches: Vec<ScoredListing> = owned
            .chain(shared)
            .filter(|listing| self.evaluate_prepared(*listing, &criteria).is_match())
            .map(|listing| ScoredListing {
                listing_id: listing.listing_id().to_string(),
                source: listing.source(),
                score: calculate_match_score(listing.size(), listing.price(), buyer, &self.scoring),
                price: listing.price(),
                size: listing.size(),
                title: listing.title().map(str::to_string),
            })
            .collect();

        // Best score first, then cheaper, then by id for a stable order
        matches.sort_by(|a, b| {
            b.score
                .cmp(&a.score)
                .then_with(|| compare_price(a.price, b.price))
                .then_with(|| a.listing_id.cmp(&b.listing_id))
        });
        matches.truncate(limit);

        tracing::debug!(
            buyer_id = buyer.buyer_id.as_deref().unwrap_or("-"),
            total_candidates,
            matched = matches.len(),
            "ranked listings for buyer"
        );

        MatchResult {
            matches,
            total_candidates,
        }
    }

    /// Rank buyers interested in one listing
    pub fn find_buyers<L: PropertyListing + ?Sized>(
        &self,
        listing: &L,
        buyers: &[BuyerCriteria],
        limit: usize,
    ) -> BuyerMatchResult {
        let mut matches: Vec<BuyerMatch> = buyers
            .iter()
            .filter_map(|buyer| {
                let criteria = self.prepare(buyer);
                self.evaluate_prepared(listing, &criteria)
                    .is_match()
                    .then(|| BuyerMatch {
                        buyer_id: buyer.buyer_id.clone(),
                        score: calculate_match_score(
                            listing.size(),
                            listing.price(),
                            buyer,
                            &self.scoring,
                        ),
                    })
            })
            .collect();

        matches.sort_by(|a, b| b.score.cmp(&a.score).then_with(|| a.buyer_id.cmp(&b.buyer_id)));
        matches.truncate(limit);

        BuyerMatchResult {
            matches,
            total_candidates: buyers.len(),
        }
    }
}

/// Known prices before unknown ones, ascending
fn compare_price(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => a.partial_cmp(&b).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// Does an agency listing satisfy the buyer's criteria (default policy)
pub fn is_listing_matching_buyer(listing: &Listing, buyer: &BuyerCriteria) -> bool {
    Matcher::default().is_match(listing, buyer)
}

/// Does a shared listing satisfy the buyer's criteria (default policy).
/// Shared listings carry no status and are always considered available.
pub fn is_shared_listing_matching_buyer(listing: &SharedListing, buyer: &BuyerCriteria) -> bool {
    Matcher::default().is_match(listing, buyer)
}

/// Fit score of an agency listing for a buyer (default policy)
pub fn compute_match_score(listing: &Listing, buyer: &BuyerCriteria) -> u8 {
    Matcher::default().score(listing, buyer)
}

/// Fit score of a shared listing for a buyer (default policy)
pub fn compute_shared_match_score(listing: &SharedListing, buyer: &BuyerCriteria) -> u8 {
    Matcher::default().score(listing, buyer)
}
