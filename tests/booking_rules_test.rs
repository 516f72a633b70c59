mod common;

use axum::http::{Method, StatusCode};
use common::{response_json, TestApp, BOOKING_ID, PROPERTY_ID, USER_ID};
use serde_json::json;

fn booking_body(checkin: &str, checkout: &str) -> serde_json::Value {
    json!({
        "userId": USER_ID,
        "propertyId": PROPERTY_ID,
        "checkinDate": checkin,
        "checkoutDate": checkout,
        "numberOfGuests": 2,
        "totalPrice": 300
    })
}

#[tokio::test]
async fn valid_booking_is_created_with_pending_status() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/bookings",
            Some(booking_body("2024-06-01", "2024-06-03")),
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["message"], "Booking created successfully!");
    assert_eq!(body["booking"]["bookingStatus"], "pending");
    assert_eq!(body["booking"]["userId"], USER_ID);
    assert_eq!(body["booking"]["numberOfGuests"], 2);
}

#[tokio::test]
async fn checkout_before_checkin_is_rejected_and_nothing_is_stored() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/bookings",
            Some(booking_body("2024-06-03", "2024-06-01")),
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Check-out date must be after check-in date.");

    let (_, list) = response_json(app.request(Method::GET, "/bookings", None, None).await).await;
    assert_eq!(list.as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn same_day_checkout_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/bookings",
            Some(booking_body("2024-06-01T12:00:00Z", "2024-06-01T12:00:00Z")),
        )
        .await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn unparsable_date_is_reported_before_ordering() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/bookings",
            Some(booking_body("next tuesday", "2024-06-01")),
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Invalid date format. Check-in and check-out dates must be valid dates."
    );
}

#[tokio::test]
async fn missing_fields_are_listed() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::POST,
            "/bookings",
            Some(json!({ "userId": USER_ID, "checkinDate": "2024-06-01" })),
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(
        body["message"],
        "Missing required fields: propertyId, checkoutDate, numberOfGuests, totalPrice"
    );
}

#[tokio::test]
async fn booking_for_unknown_property_is_a_validation_error() {
    let app = TestApp::new().await;

    let mut body = booking_body("2024-06-01", "2024-06-03");
    body["propertyId"] = json!("does-not-exist");
    let response = app
        .request_authenticated(Method::POST, "/bookings", Some(body))
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Property with id does-not-exist does not exist");
}

#[tokio::test]
async fn zero_guests_and_unknown_status_are_rejected() {
    let app = TestApp::new().await;

    let mut zero_guests = booking_body("2024-06-01", "2024-06-03");
    zero_guests["numberOfGuests"] = json!(0);
    let response = app
        .request_authenticated(Method::POST, "/bookings", Some(zero_guests))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);

    let mut bad_status = booking_body("2024-06-01", "2024-06-03");
    bad_status["bookingStatus"] = json!("archived");
    let response = app
        .request_authenticated(Method::POST, "/bookings", Some(bad_status))
        .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn update_is_checked_against_stored_dates() {
    let app = TestApp::new().await;

    // Stored stay is 2024-03-01 .. 2024-03-04
    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/bookings/{}", BOOKING_ID),
            Some(json!({ "checkinDate": "2024-03-05" })),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "Check-out date must be after check-in date.");

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/bookings/{}", BOOKING_ID),
            Some(json!({ "checkoutDate": "2024-03-06", "bookingStatus": "cancelled" })),
        )
        .await;
    let (status, body) = response_json(response).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        body["message"],
        format!("Booking with ID {} successfully updated", BOOKING_ID)
    );
    assert_eq!(body["booking"]["bookingStatus"], "cancelled");
}

#[tokio::test]
async fn empty_update_is_rejected() {
    let app = TestApp::new().await;

    let response = app
        .request_authenticated(
            Method::PUT,
            &format!("/bookings/{}", BOOKING_ID),
            Some(json!({})),
        )
        .await;
    let (status, body) = response_json(response).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["message"], "No valid fields provided for update.");
}

#[tokio::test]
async fn bookings_are_filtered_by_status() {
    let app = TestApp::new().await;

    let (status, confirmed) = response_json(
        app.request(Method::GET, "/bookings?bookingStatus=confirmed", None, None)
            .await,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(confirmed.as_array().map(Vec::len), Some(1));
    assert_eq!(confirmed[0]["user"]["id"], USER_ID);
    assert_eq!(confirmed[0]["property"]["id"], PROPERTY_ID);

    let (_, pending) = response_json(
        app.request(Method::GET, "/bookings?bookingStatus=pending", None, None)
            .await,
    )
    .await;
    assert_eq!(pending.as_array().map(Vec::len), Some(0));
}
