mod common;

use std::{fs, path::Path};

use axum::http::{Method, StatusCode};
use common::{base_fixtures, response_json, TestApp, HOST_ID, PROPERTY_ID};
use rust_decimal_macros::dec;
use stayhub_api::{
    errors::ServiceError,
    services::seed::{FixtureError, Fixtures, SeedOrchestrator, SeedReport, SeedStep},
};
use tempfile::tempdir;

#[tokio::test]
async fn bundled_fixtures_seed_cleanly() {
    let app = TestApp::empty().await;
    let fixtures = Fixtures::load_dir(&Path::new(env!("CARGO_MANIFEST_DIR")).join("data"))
        .expect("bundled fixtures parse");

    let report = SeedOrchestrator::new(app.state.db.as_ref())
        .run(&fixtures, true)
        .await
        .expect("bundled fixtures seed");

    assert_eq!(
        report,
        SeedReport {
            reset: true,
            users: 3,
            hosts: 2,
            amenities: 5,
            properties: 3,
            property_amenities: 7,
            reviews: 3,
            bookings: 3,
        }
    );

    let (status, properties) =
        response_json(app.request(Method::GET, "/properties", None, None).await).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(properties.as_array().map(Vec::len), Some(3));
}

#[tokio::test]
async fn seeding_twice_converges_to_the_same_rows() {
    let app = TestApp::new().await;
    let orchestrator = SeedOrchestrator::new(app.state.db.as_ref());

    let first = orchestrator.run(&base_fixtures(), false).await.unwrap();
    let second = orchestrator.run(&base_fixtures(), false).await.unwrap();
    assert_eq!(first, second);

    let (_, users) = response_json(app.request(Method::GET, "/users", None, None).await).await;
    let (_, property) = response_json(
        app.request(Method::GET, &format!("/properties/{}", PROPERTY_ID), None, None)
            .await,
    )
    .await;
    assert_eq!(users.as_array().map(Vec::len), Some(1));
    assert_eq!(property["amenities"].as_array().map(Vec::len), Some(1));
}

#[tokio::test]
async fn reseeding_updates_existing_rows() {
    let app = TestApp::new().await;
    let mut fixtures = base_fixtures();
    fixtures.properties[0].title = "Renamed Beach House".to_string();

    SeedOrchestrator::new(app.state.db.as_ref())
        .run(&fixtures, false)
        .await
        .unwrap();

    let (_, property) = response_json(
        app.request(Method::GET, &format!("/properties/{}", PROPERTY_ID), None, None)
            .await,
    )
    .await;
    assert_eq!(property["title"], "Renamed Beach House");
}

#[tokio::test]
async fn property_with_unknown_host_stops_at_properties() {
    let app = TestApp::empty().await;
    let mut fixtures = base_fixtures();
    fixtures.hosts.clear();

    let err = SeedOrchestrator::new(app.state.db.as_ref())
        .run(&fixtures, false)
        .await
        .unwrap_err();

    assert_eq!(err.step, SeedStep::Properties);
    assert!(matches!(err.source, ServiceError::Validation { .. }));
    assert_eq!(
        err.to_string(),
        format!(
            "seeding failed at step 'properties': Host with id {} does not exist",
            HOST_ID
        )
    );
}

#[tokio::test]
async fn inverted_fixture_booking_stops_at_bookings() {
    let app = TestApp::empty().await;
    let mut fixtures = base_fixtures();
    fixtures.bookings[0].checkout_date = "2024-02-01".to_string();

    let err = SeedOrchestrator::new(app.state.db.as_ref())
        .run(&fixtures, false)
        .await
        .unwrap_err();

    assert_eq!(err.step, SeedStep::Bookings);
}

#[tokio::test]
async fn fixture_bookings_must_have_guests_and_a_price() {
    let app = TestApp::empty().await;
    let orchestrator = SeedOrchestrator::new(app.state.db.as_ref());

    let mut no_guests = base_fixtures();
    no_guests.bookings[0].number_of_guests = 0;
    let err = orchestrator.run(&no_guests, true).await.unwrap_err();
    assert_eq!(err.step, SeedStep::Bookings);
    assert_eq!(err.source.fields(), ["numberOfGuests".to_string()]);

    let mut negative_price = base_fixtures();
    negative_price.bookings[0].total_price = dec!(-5);
    let err = orchestrator.run(&negative_price, true).await.unwrap_err();
    assert_eq!(err.step, SeedStep::Bookings);
    assert_eq!(err.source.fields(), ["totalPrice".to_string()]);

    let (_, bookings) =
        response_json(app.request(Method::GET, "/bookings", None, None).await).await;
    assert_eq!(bookings.as_array().map(Vec::len), Some(0));
}

#[tokio::test]
async fn fixture_properties_follow_listing_rules() {
    let app = TestApp::empty().await;
    let orchestrator = SeedOrchestrator::new(app.state.db.as_ref());

    let mut no_bedrooms = base_fixtures();
    no_bedrooms.properties[0].bedroom_count = 0;
    let err = orchestrator.run(&no_bedrooms, true).await.unwrap_err();
    assert_eq!(err.step, SeedStep::Properties);
    assert_eq!(err.source.fields(), ["bedroomCount".to_string()]);

    let mut free_stay = base_fixtures();
    free_stay.properties[0].price_per_night = dec!(0);
    let err = orchestrator.run(&free_stay, true).await.unwrap_err();
    assert_eq!(err.step, SeedStep::Properties);
    assert_eq!(err.source.fields(), ["pricePerNight".to_string()]);

    let mut overrated = base_fixtures();
    overrated.properties[0].rating = Some(6);
    let err = orchestrator.run(&overrated, true).await.unwrap_err();
    assert_eq!(err.step, SeedStep::Properties);
}

#[tokio::test]
async fn reset_clears_rows_missing_from_fixtures() {
    let app = TestApp::new().await;

    let report = SeedOrchestrator::new(app.state.db.as_ref())
        .run(&Fixtures::default(), true)
        .await
        .unwrap();
    assert!(report.reset);

    for path in ["/users", "/hosts", "/amenities", "/properties", "/reviews", "/bookings"] {
        let (_, rows) = response_json(app.request(Method::GET, path, None, None).await).await;
        assert_eq!(rows.as_array().map(Vec::len), Some(0), "{}", path);
    }
}

#[test]
fn fixture_directory_tolerates_missing_files() {
    let dir = tempdir().unwrap();
    fs::write(
        dir.path().join("amenities.json"),
        r#"{"amenities":[{"id":"a1","name":"Wifi"},{"id":"a2","name":"Pool"}]}"#,
    )
    .unwrap();

    let fixtures = Fixtures::load_dir(dir.path()).unwrap();

    assert_eq!(fixtures.amenities.len(), 2);
    assert!(fixtures.users.is_empty());
    assert!(fixtures.bookings.is_empty());
}

#[test]
fn malformed_fixture_file_names_the_path() {
    let dir = tempdir().unwrap();
    let path = dir.path().join("users.json");
    fs::write(&path, "{ not json").unwrap();

    let err = Fixtures::load_dir(dir.path()).unwrap_err();

    assert!(matches!(err, FixtureError::Parse { .. }));
    assert!(err.to_string().contains("users.json"));
}
