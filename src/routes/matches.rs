use actix_web::{web, HttpResponse, Responder};
use validator::Validate;

use crate::core::{calculate_match_score, Matcher};
use crate::models::{
    BuyerCriteria, ErrorResponse, EvaluateRequest, EvaluateResponse, EvaluateSharedRequest, FindBuyersRequest,
    FindBuyersResponse, FindMatchesRequest, FindMatchesResponse, HealthResponse, PropertyListing,
};

/// Application state shared across all handlers
#[derive(Clone)]
pub struct AppState {
    pub matcher: Matcher,
    pub default_limit: usize,
    pub max_limit: usize,
}

impl AppState {
    /// Requested limit, defaulted and capped by configuration
    fn limit(&self, requested: Option<u16>) -> usize {
        requested
            .map(usize::from)
            .unwrap_or(self.default_limit)
            .min(self.max_limit)
    }
}

/// Configure all match-related routes
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg
        .route("/health", web::get().to(health_check))
        .route("/matches/evaluate", web::post().to(evaluate))
        .route("/matches/evaluate-shared", web::post().to(evaluate_shared))
        .route("/matches/find", web::post().to(find_matches))
        .route("/matches/buyers", web::post().to(find_buyers));
}

/// Health check endpoint
async fn health_check() -> impl Responder {
    HttpResponse::Ok().json(HealthResponse {
        status: "healthy".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        timestamp: chrono::Utc::now(),
    })
}

fn evaluation<L: PropertyListing + ?Sized>(
    matcher: &Matcher,
    listing: &L,
    buyer: &BuyerCriteria,
) -> EvaluateResponse {
    let verdict = matcher.evaluate(listing, buyer);
    let score = if verdict.is_match() {
        calculate_match_score(listing.size(), listing.price(), buyer, matcher.scoring_policy())
    } else {
        0
    };

    EvaluateResponse {
        matched: verdict.is_match(),
        score,
        reason: verdict.reason().map(|r| r.to_string()),
    }
}

/// Evaluate one agency listing against one buyer
///
/// POST /api/v1/matches/evaluate
///
/// Request body:
/// ```json
/// {
///   "listing": { "id": "string", "status": "available", "type": "apartment", "price": 250000 },
///   "buyer": { "maxPrice": 300000, "searchArea": { "center": {"lat": 45.46, "lng": 9.19}, "radius": 1500 } }
/// }
/// ```
async fn evaluate(
    state: web::Data<AppState>,
    req: web::Json<EvaluateRequest>,
) -> impl Responder {
    let response = evaluation(&state.matcher, &req.listing, &req.buyer);

    tracing::info!(
        listing_id = %req.listing.id,
        matched = response.matched,
        score = response.score,
        "evaluated listing"
    );

    HttpResponse::Ok().json(response)
}

/// Evaluate one shared (multi-agency) listing against one buyer
///
/// POST /api/v1/matches/evaluate-shared
async fn evaluate_shared(
    state: web::Data<AppState>,
    req: web::Json<EvaluateSharedRequest>,
) -> impl Responder {
    let response = evaluation(&state.matcher, &req.listing, &req.buyer);

    tracing::info!(
        listing_id = %req.listing.id,
        matched = response.matched,
        score = response.score,
        "evaluated shared listing"
    );

    HttpResponse::Ok().json(response)
}

/// Rank candidate listings for a buyer
///
/// POST /api/v1/matches/find
///
/// Request body:
/// ```json
/// {
///   "buyer": { "buyerId": "string", "propertyType": "apartment", "minSize": 50, "maxPrice": 300000 },
///   "listings": [],
///   "sharedListings": [],
///   "limit": 20
/// }
/// ```
async fn find_matches(
    state: web::Data<AppState>,
    req: web::Json<FindMatchesRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_matches request: field_errors={:?}", errors);
        return validation_error(errors);
    }

    let limit = state.limit(req.limit);
    let result = state
        .matcher
        .find_matches(&req.buyer, &req.listings, &req.shared_listings, limit);

    tracing::info!(
        buyer_id = req.buyer.buyer_id.as_deref().unwrap_or("-"),
        "Returning {} matches (from {} candidates)",
        result.matches.len(),
        result.total_candidates
    );

    HttpResponse::Ok().json(FindMatchesResponse {
        matches: result.matches,
        total_candidates: result.total_candidates,
    })
}

/// Rank buyers whose criteria a listing satisfies
///
/// POST /api/v1/matches/buyers
///
/// Request body:
/// ```json
/// {
///   "listing": { "id": "string", "status": "available", "type": "villa", "price": 450000 },
///   "buyers": [],
///   "limit": 20
/// }
/// ```
async fn find_buyers(
    state: web::Data<AppState>,
    req: web::Json<FindBuyersRequest>,
) -> impl Responder {
    if let Err(errors) = req.validate() {
        tracing::info!("Validation failed for find_buyers request: field_errors={:?}", errors);
        return validation_error(errors);
    }

    let limit = state.limit(req.limit);
    let result = state.matcher.find_buyers(&req.listing, &req.buyers, limit);

    tracing::info!(
        listing_id = %req.listing.id,
        "Returning {} buyers (from {} candidates)",
        result.matches.len(),
        result.total_candidates
    );

    HttpResponse::Ok().json(FindBuyersResponse {
        matches: result.matches,
        total_candidates: result.total_candidates,
    })
}

fn validation_error(errors: validator::ValidationErrors) -> HttpResponse {
    HttpResponse::BadRequest().json(ErrorResponse {
        error: "Validation failed".to_string(),
        message: errors.to_string(),
        status_code: 400,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use serde_json::{json, Value};

    fn state() -> AppState {
        AppState {
            matcher: Matcher::default(),
            default_limit: 20,
            max_limit: 2,
        }
    }

    fn listing(id: &str, price: u32) -> Value {
        json!({
            "id": id,
            "status": "available",
            "type": "Appartamento",
            "price": price,
            "size": 60,
            "latitude": "45.46",
            "longitude": "9.19"
        })
    }

    #[actix_web::test]
    async fn test_health_check() {
        let app = test::init_service(App::new().configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: HealthResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.status, "healthy");
    }

    #[actix_web::test]
    async fn test_evaluate_reports_reason() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/evaluate")
            .set_json(json!({
                "listing": listing("p1", 365000),
                "buyer": {"maxPrice": 300000, "minSize": 50, "propertyType": "apartment"}
            }))
            .to_request();
        let body: EvaluateResponse = test::call_and_read_body_json(&app, req).await;

        assert!(!body.matched);
        assert_eq!(body.score, 0);
        assert_eq!(body.reason.as_deref(), Some("price"));
    }

    #[actix_web::test]
    async fn test_evaluate_shared_listing() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/evaluate-shared")
            .set_json(json!({
                "listing": {"id": "s1", "type": "villa", "price": 500000, "location": {"lat": 45.46, "lng": 9.19}},
                "buyer": {
                    "propertyType": "Villa",
                    "searchArea": {"center": {"lat": 45.46, "lng": 9.19}, "radius": 100}
                }
            }))
            .to_request();
        let body: EvaluateResponse = test::call_and_read_body_json(&app, req).await;

        assert!(body.matched);
        assert_eq!(body.score, 100);
        assert_eq!(body.reason, None);
    }

    #[actix_web::test]
    async fn test_find_matches_caps_limit() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/find")
            .set_json(json!({
                "buyer": {"buyerId": "b1", "maxPrice": 300000},
                "listings": [listing("a", 250000), listing("b", 260000), listing("c", 270000)],
                "limit": 50
            }))
            .to_request();
        let body: FindMatchesResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.total_candidates, 3);
        assert_eq!(body.matches.len(), 2);
        assert_eq!(body.matches[0].listing_id, "a");
    }

    #[actix_web::test]
    async fn test_find_matches_tolerates_odd_statuses() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let mut capitalised = listing("a", 250000);
        capitalised["status"] = json!("Available");
        let mut archived = listing("b", 250000);
        archived["status"] = json!("archived");

        let req = test::TestRequest::post()
            .uri("/matches/find")
            .set_json(json!({
                "buyer": {"maxPrice": 300000},
                "listings": [capitalised, archived]
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);

        let body: FindMatchesResponse = test::read_body_json(resp).await;
        assert_eq!(body.total_candidates, 2);
        assert_eq!(body.matches.len(), 1);
        assert_eq!(body.matches[0].listing_id, "a");
    }

    #[actix_web::test]
    async fn test_find_matches_rejects_zero_limit() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/find")
            .set_json(json!({"buyer": {}, "listings": [], "limit": 0}))
            .to_request();
        let resp = test::call_service(&app, req).await;

        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn test_find_buyers() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(state()))
                .configure(configure),
        )
        .await;

        let req = test::TestRequest::post()
            .uri("/matches/buyers")
            .set_json(json!({
                "listing": listing("p1", 280000),
                "buyers": [
                    {"buyerId": "villa", "propertyType": "villa"},
                    {"buyerId": "budget", "maxPrice": 300000}
                ]
            }))
            .to_request();
        let body: FindBuyersResponse = test::call_and_read_body_json(&app, req).await;

        assert_eq!(body.total_candidates, 2);
        assert_eq!(body.matches.len(), 1);
        assert_eq!(body.matches[0].buyer_id.as_deref(), Some("budget"));
    }
}
