mod common;

use axum::http::{Method, StatusCode};
use common::{
    response_json, TestApp, AMENITY_ID, HOST_ID, PROPERTY_ID, REVIEW_ID, USER_ID,
};
use serde_json::json;

#[tokio::test]
async fn health_reports_database_up() {
    let app = TestApp::empty().await;

    let (status, body) = response_json(app.request(Method::GET, "/health", None, None).await).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "up");
    assert_eq!(body["database"], "up");
}

#[tokio::test]
async fn unknown_property_is_not_found() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/properties/missing-id", None, None)
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["message"], "Property with id missing-id was not found!");
}

#[tokio::test]
async fn property_detail_carries_relations() {
    let app = TestApp::new().await;

    let (status, body) = response_json(
        app.request(Method::GET, &format!("/properties/{}", PROPERTY_ID), None, None)
            .await,
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["bathRoomCount"], 2);
    assert_eq!(body["host"]["id"], HOST_ID);
    assert_eq!(body["amenities"][0]["id"], AMENITY_ID);
    assert_eq!(body["reviews"][0]["id"], REVIEW_ID);
    assert!(body["host"].get("password").is_none());
}

#[tokio::test]
async fn duplicate_email_is_a_conflict() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/users",
            Some(json!({
                "username": "another",
                "password": "Another123!",
                "name": "Another Guest",
                "email": "guest@example.com",
                "phoneNumber": "+12025550777"
            })),
            None,
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert!(body["message"].as_str().unwrap().contains("email"));
}

#[tokio::test]
async fn weak_password_names_the_field() {
    let app = TestApp::new().await;

    let response = app
        .request(
            Method::POST,
            "/users",
            Some(json!({
                "username": "weakling",
                "password": "short",
                "name": "Weak Password",
                "email": "weak@example.com",
                "phoneNumber": "+12025550888"
            })),
            None,
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn created_user_never_exposes_password() {
    let app = TestApp::new().await;

    let (status, body) = response_json(
        app.request(
            Method::POST,
            "/users",
            Some(json!({
                "username": "fresh",
                "password": "Fresh1234!",
                "name": "Fresh Face",
                "email": "fresh@example.com",
                "phoneNumber": "+12025550555"
            })),
            None,
        )
        .await,
    )
    .await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "User created successfully!");
    assert_eq!(body["user"]["role"], "user");
    assert!(body["user"].get("password").is_none());
}

#[tokio::test]
async fn review_rating_must_be_between_one_and_five() {
    let app = TestApp::new().await;

    for rating in [0, 6] {
        let response = app
            .request_authenticated(
                Method::POST,
                "/reviews",
                Some(json!({ "userId": USER_ID, "propertyId": PROPERTY_ID, "rating": rating })),
            )
            .await;
        let (status, body) = response_json(response).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "rating {}", rating);
        assert_eq!(body["message"], "Rating must be between 1 and 5");
    }

    let response = app
        .request_authenticated(
            Method::POST,
            "/reviews",
            Some(json!({ "userId": USER_ID, "propertyId": PROPERTY_ID, "rating": 5 })),
        )
        .await;
    assert_eq!(response.status(), StatusCode::CREATED);
}

#[tokio::test]
async fn review_for_unknown_user_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/reviews",
            Some(json!({ "userId": "ghost", "propertyId": PROPERTY_ID, "rating": 3 })),
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "User with id ghost does not exist");
}

#[tokio::test]
async fn non_numeric_rating_filter_is_a_validation_error() {
    let app = TestApp::new().await;

    let response = app
        .request(Method::GET, "/reviews?rating=great", None, None)
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"].is_string());
}

#[tokio::test]
async fn deleting_missing_rows_is_not_found() {
    let app = TestApp::new().await;

    for (path, resource) in [
        ("/users/nope", "User"),
        ("/hosts/nope", "Host"),
        ("/properties/nope", "Property"),
        ("/amenities/nope", "Amenity"),
        ("/reviews/nope", "Review"),
        ("/bookings/nope", "Booking"),
    ] {
        let (status, body) =
            response_json(app.request_authenticated(Method::DELETE, path, None).await).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{}", path);
        assert_eq!(
            body["message"],
            format!("{} with id nope was not found!", resource)
        );
    }
}

#[tokio::test]
async fn deleting_a_user_removes_their_reviews_and_bookings() {
    let app = TestApp::new().await;

    let (status, body) = response_json(
        app.request_authenticated(Method::DELETE, &format!("/users/{}", USER_ID), None)
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        format!("User with ID {} successfully deleted", USER_ID)
    );

    let (_, reviews) = response_json(app.request(Method::GET, "/reviews", None, None).await).await;
    let (_, bookings) =
        response_json(app.request(Method::GET, "/bookings", None, None).await).await;
    assert_eq!(reviews.as_array().map(Vec::len), Some(0));
    assert_eq!(bookings.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn malformed_json_is_a_bad_request() {
    let app = TestApp::new().await;

    let response = app
        .request_raw(Method::POST, "/amenities", "{\"name\": ")
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert!(body["message"]
        .as_str()
        .unwrap()
        .starts_with("Invalid JSON body"));
}

#[tokio::test]
async fn property_with_unknown_host_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/properties",
            Some(json!({
                "title": "Loft",
                "description": "Open plan loft",
                "location": "Berlin",
                "pricePerNight": 90,
                "bedroomCount": 1,
                "bathRoomCount": 1,
                "maxGuestCount": 2,
                "hostId": "h-unknown"
            })),
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Host with id h-unknown does not exist");
}

#[tokio::test]
async fn property_amenities_are_replaced_on_update() {
    let app = TestApp::new().await;

    let (status, created) = response_json(
        app.request_authenticated(Method::POST, "/amenities", Some(json!({ "name": "Pool" })))
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let pool_id = created["amenity"]["id"].as_str().unwrap().to_string();

    let (status, body) = response_json(
        app.request_authenticated(
            Method::PUT,
            &format!("/properties/{}", PROPERTY_ID),
            Some(json!({ "amenityIds": [pool_id] })),
        )
        .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let amenities = body["property"]["amenities"].as_array().unwrap();
    assert_eq!(amenities.len(), 1);
    assert_eq!(amenities[0]["name"], "Pool");

    let (_, filtered) = response_json(
        app.request(Method::GET, "/properties?amenities=Wifi", None, None)
            .await,
    )
    .await;
    assert_eq!(filtered.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn properties_filter_by_location_and_amenity() {
    let app = TestApp::new().await;

    let (status, by_amenity) = response_json(
        app.request(Method::GET, "/properties?amenities=Wifi,Sauna", None, None)
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(by_amenity.as_array().map(Vec::len), Some(1));

    let (_, by_location) = response_json(
        app.request(Method::GET, "/properties?location=Nowhere", None, None)
            .await,
    )
    .await;
    assert_eq!(by_location.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn host_and_amenity_filters_ignore_case() {
    let app = TestApp::new().await;

    let (_, hosts) =
        response_json(app.request(Method::GET, "/hosts?name=HANNAH", None, None).await).await;
    assert_eq!(hosts.as_array().map(Vec::len), Some(1));
    assert_eq!(hosts[0]["listings"][0]["id"], PROPERTY_ID);

    let (_, amenities) =
        response_json(app.request(Method::GET, "/amenities?name=wi", None, None).await).await;
    assert_eq!(amenities.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn blank_amenity_name_is_rejected() {
    let app = TestApp::new().await;

    let (status, body) = response_json(
        app.request_authenticated(Method::POST, "/amenities", Some(json!({ "name": "   " })))
            .await,
    )
    .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Missing required fields: name");
}

async fn listed(app: &TestApp, uri: &str) -> usize {
    let (status, body) = response_json(app.request(Method::GET, uri, None, None).await).await;
    assert_eq!(status, StatusCode::OK, "{}", uri);
    body.as_array().map(Vec::len).unwrap_or_default()
}

#[tokio::test]
async fn properties_filter_by_nightly_price() {
    let app = TestApp::new().await;

    assert_eq!(listed(&app, "/properties?pricePerNight=150").await, 1);
    assert_eq!(listed(&app, "/properties?pricePerNight=150.00").await, 1);
    assert_eq!(listed(&app, "/properties?pricePerNight=151").await, 0);
}

#[tokio::test]
async fn users_filter_by_username_and_email() {
    let app = TestApp::new().await;

    assert_eq!(listed(&app, "/users?username=guest").await, 1);
    assert_eq!(listed(&app, "/users?username=nobody").await, 0);
    assert_eq!(listed(&app, "/users?email=guest@example.com").await, 1);
    assert_eq!(listed(&app, "/users?email=other@example.com").await, 0);
}

#[tokio::test]
async fn reviews_filter_by_user_property_and_rating() {
    let app = TestApp::new().await;

    assert_eq!(listed(&app, &format!("/reviews?userId={}", USER_ID)).await, 1);
    assert_eq!(listed(&app, "/reviews?userId=ghost").await, 0);
    assert_eq!(listed(&app, &format!("/reviews?propertyId={}", PROPERTY_ID)).await, 1);
    assert_eq!(listed(&app, "/reviews?propertyId=p9").await, 0);
    assert_eq!(listed(&app, "/reviews?rating=4").await, 1);
    assert_eq!(listed(&app, "/reviews?rating=5").await, 0);
}

#[tokio::test]
async fn bookings_filter_by_user_and_property() {
    let app = TestApp::new().await;

    assert_eq!(listed(&app, &format!("/bookings?userId={}", USER_ID)).await, 1);
    assert_eq!(listed(&app, "/bookings?userId=ghost").await, 0);
    assert_eq!(listed(&app, &format!("/bookings?propertyId={}", PROPERTY_ID)).await, 1);
    assert_eq!(listed(&app, "/bookings?propertyId=p9").await, 0);
}

#[tokio::test]
async fn name_filters_treat_wildcards_literally() {
    let app = TestApp::new().await;

    assert_eq!(listed(&app, "/amenities?name=_").await, 0);
    assert_eq!(listed(&app, "/amenities?name=%25").await, 0);
    assert_eq!(listed(&app, "/hosts?name=h_nnah").await, 0);
    assert_eq!(listed(&app, "/hosts?name=hannah").await, 1);
}
