use crate::models::ListingStatus;

/// Normalize a free-text property type for comparison.
///
/// Trims and lowercases, then folds known synonyms onto a canonical name.
/// Unknown types pass through normalized but unmapped.
pub fn normalize_property_type(raw: &str) -> String {
    let normalized = raw.trim().to_lowercase();
    let canonical = match normalized.as_str() {
        "appartamento" | "apartment" | "monolocale" => "apartment",
        "attico" => "penthouse",
        "villa" => "villa",
        "loft" => "loft",
        _ => return normalized,
    };
    canonical.to_string()
}

/// A numeric criterion counts as specified only when positive and finite.
/// The CRM stores unset numbers as 0.
#[inline]
pub fn specified(value: Option<f64>) -> Option<f64> {
    value.filter(|v| v.is_finite() && *v > 0.0)
}

/// Listings without a status (shared feeds) are implicitly available
#[inline]
pub fn is_available(status: Option<ListingStatus>) -> bool {
    matches!(status, None | Some(ListingStatus::Available))
}

/// Check the listing type against an already normalized wanted type.
/// An empty wanted type disables the check.
#[inline]
pub fn matches_property_type(listing_type: Option<&str>, wanted: &str) -> bool {
    if wanted.is_empty() {
        return true;
    }
    normalize_property_type(listing_type.unwrap_or_default()) == wanted
}

/// `size >= min_size * factor`; skipped when either side is unspecified.
/// There is no upper bound on size.
#[inline]
pub fn meets_size_floor(size: Option<f64>, min_size: Option<f64>, factor: f64) -> bool {
    match (specified(size), specified(min_size)) {
        (Some(size), Some(min_size)) => size >= min_size * factor,
        _ => true,
    }
}

/// `price <= max_price * factor`; skipped when either side is unspecified
#[inline]
pub fn within_price_ceiling(price: Option<f64>, max_price: Option<f64>, factor: f64) -> bool {
    match (specified(price), specified(max_price)) {
        (Some(price), Some(max_price)) => price <= max_price * factor,
        _ => true,
    }
}
