use serde::{Deserialize, Deserializer, Serialize};

/// Lifecycle status of an agency-owned listing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingStatus {
    Available,
    Pending,
    Sold,
    /// Any value the CRM does not define; never matchable
    #[serde(other)]
    Unknown,
}

impl ListingStatus {
    /// Case-insensitive parse; unrecognised values map to `Unknown`
    pub fn parse(raw: &str) -> Self {
        match raw.trim().to_ascii_lowercase().as_str() {
            "available" => ListingStatus::Available,
            "pending" => ListingStatus::Pending,
            "sold" => ListingStatus::Sold,
            _ => ListingStatus::Unknown,
        }
    }
}

/// Status deserializer that never fails the surrounding record.
/// `null` reads as absent; non-string values read as `Unknown`.
fn lenient_status<'de, D>(deserializer: D) -> Result<Option<ListingStatus>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(match raw {
        serde_json::Value::Null => None,
        serde_json::Value::String(text) => Some(ListingStatus::parse(&text)),
        _ => Some(ListingStatus::Unknown),
    })
}

/// A numeric value as stored by the CRM: a JSON number or a numeric string.
///
/// Anything else is kept as `Invalid` so a single bad record never fails a
/// whole batch at deserialization time.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NumericField {
    Number(f64),
    Text(String),
    Invalid(serde_json::Value),
}

impl NumericField {
    /// Parsed value, if it is a finite number
    pub fn value(&self) -> Option<f64> {
        let parsed = match self {
            NumericField::Number(n) => Some(*n),
            NumericField::Text(s) => s.trim().parse::<f64>().ok(),
            NumericField::Invalid(_) => None,
        };
        parsed.filter(|v| v.is_finite())
    }
}

/// Nested location value of a listing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LocationField {
    /// JSON document stored as text, e.g. `"{\"lat\":45.4,\"lng\":9.1}"`
    Encoded(String),
    /// Object carrying `lat` / `lng` members
    Object(serde_json::Map<String, serde_json::Value>),
    Other(serde_json::Value),
}

/// A WGS84 point
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }
}

/// Read access to the fields the matcher needs from any listing shape.
///
/// Owned and shared listings differ only in their metadata, so both go
/// through the same criteria checks via this trait.
pub trait PropertyListing {
    fn listing_id(&self) -> &str;
    /// `None` for listings that carry no status (implicitly available)
    fn status(&self) -> Option<ListingStatus>;
    fn property_type(&self) -> Option<&str>;
    fn size(&self) -> Option<f64>;
    fn price(&self) -> Option<f64>;
    fn location(&self) -> Option<&LocationField>;
    fn latitude(&self) -> Option<&NumericField>;
    fn longitude(&self) -> Option<&NumericField>;
    fn title(&self) -> Option<&str>;
    fn source(&self) -> ListingSource;
}

/// Agency-owned property listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Listing {
    pub id: String,
    /// Absent status reads as implicitly available
    #[serde(default, deserialize_with = "lenient_status")]
    pub status: Option<ListingStatus>,
    #[serde(rename = "type", alias = "propertyType", default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub location: Option<LocationField>,
    #[serde(default)]
    pub latitude: Option<NumericField>,
    #[serde(default)]
    pub longitude: Option<NumericField>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "agentId", default)]
    pub agent_id: Option<String>,
}

impl PropertyListing for Listing {
    fn listing_id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> Option<ListingStatus> {
        self.status
    }

    fn property_type(&self) -> Option<&str> {
        self.property_type.as_deref()
    }

    fn size(&self) -> Option<f64> {
        self.size
    }

    fn price(&self) -> Option<f64> {
        self.price
    }

    fn location(&self) -> Option<&LocationField> {
        self.location.as_ref()
    }

    fn latitude(&self) -> Option<&NumericField> {
        self.latitude.as_ref()
    }

    fn longitude(&self) -> Option<&NumericField> {
        self.longitude.as_ref()
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn source(&self) -> ListingSource {
        ListingSource::Owned
    }
}

/// Listing published by another agency (multi-agency / competitor feed).
/// Has no status: anything still in the feed is considered available.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SharedListing {
    pub id: String,
    #[serde(rename = "type", alias = "propertyType", default)]
    pub property_type: Option<String>,
    #[serde(default)]
    pub size: Option<f64>,
    #[serde(default)]
    pub price: Option<f64>,
    #[serde(default)]
    pub location: Option<LocationField>,
    #[serde(default)]
    pub latitude: Option<NumericField>,
    #[serde(default)]
    pub longitude: Option<NumericField>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub address: Option<String>,
    #[serde(rename = "agencyName", default)]
    pub agency_name: Option<String>,
    #[serde(rename = "sourceUrl", default)]
    pub source_url: Option<String>,
}

impl PropertyListing for SharedListing {
    fn listing_id(&self) -> &str {
        &self.id
    }

    fn status(&self) -> Option<ListingStatus> {
        None
    }

    fn property_type(&self) -> Option<&str> {
        self.property_type.as_deref()
    }

    fn size(&self) -> Option<f64> {
        self.size
    }

    fn price(&self) -> Option<f64> {
        self.price
    }

    fn location(&self) -> Option<&LocationField> {
        self.location.as_ref()
    }

    fn latitude(&self) -> Option<&NumericField> {
        self.latitude.as_ref()
    }

    fn longitude(&self) -> Option<&NumericField> {
        self.longitude.as_ref()
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn source(&self) -> ListingSource {
        ListingSource::Shared
    }
}

/// Search profile attached to a buyer-type client
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BuyerCriteria {
    #[serde(rename = "buyerId", default)]
    pub buyer_id: Option<String>,
    #[serde(rename = "propertyType", default)]
    pub property_type: Option<String>,
    #[serde(rename = "minSize", default)]
    pub min_size: Option<f64>,
    #[serde(rename = "maxPrice", default)]
    pub max_price: Option<f64>,
    /// FeatureCollection, circle, Feature or raw `[lng, lat]` ring
    #[serde(rename = "searchArea", default)]
    pub search_area: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingSource {
    Owned,
    Shared,
}

/// Listing accepted for a buyer, with its rank score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScoredListing {
    #[serde(rename = "listingId")]
    pub listing_id: String,
    pub source: ListingSource,
    pub score: u8,
    pub price: Option<f64>,
    pub size: Option<f64>,
    pub title: Option<String>,
}

/// Buyer whose criteria a listing satisfies, with its rank score
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BuyerMatch {
    #[serde(rename = "buyerId")]
    pub buyer_id: Option<String>,
    pub score: u8,
}

/// Tolerance bands applied by the criteria matcher
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MatchingPolicy {
    /// Listings at or above `min_size * min_size_factor` pass
    pub min_size_factor: f64,
    /// Listings at or below `max_price * max_price_factor` pass
    pub max_price_factor: f64,
    /// Implicit radius of a Point zone inside a FeatureCollection
    pub point_zone_radius_m: f64,
}

impl MatchingPolicy {
    /// Narrower band still used by older deployments (-10% / +10% / 1 km)
    pub fn legacy() -> Self {
        Self {
            min_size_factor: 0.9,
            max_price_factor: 1.10,
            point_zone_radius_m: 1000.0,
        }
    }
}

impl Default for MatchingPolicy {
    fn default() -> Self {
        Self {
            min_size_factor: 0.8,
            max_price_factor: 1.20,
            point_zone_radius_m: 2000.0,
        }
    }
}

/// Penalties applied by the score calculator
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ScoringPolicy {
    pub size_overshoot_factor: f64,
    pub size_penalty_cap: f64,
    pub size_penalty_slope: f64,
    pub over_budget_penalty_cap: f64,
    pub over_budget_penalty_slope: f64,
    pub under_budget_threshold: f64,
    pub under_budget_penalty_cap: f64,
    pub under_budget_penalty_slope: f64,
}

impl Default for ScoringPolicy {
    fn default() -> Self {
        Self {
            size_overshoot_factor: 1.5,
            size_penalty_cap: 30.0,
            size_penalty_slope: 30.0,
            over_budget_penalty_cap: 40.0,
            over_budget_penalty_slope: 400.0,
            under_budget_threshold: 0.8,
            under_budget_penalty_cap: 15.0,
            under_budget_penalty_slope: 75.0,
        }
    }
}
