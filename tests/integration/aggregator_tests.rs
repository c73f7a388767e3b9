//! Probe-then-fetch behaviour of the subregion aggregator

use crate::{card_body, create_test_config, create_transport, date, form_field};
use gibdd_crashes::config::Config;
use gibdd_crashes::{split_range, GibddError, PageFetcher, SubregionAggregator};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const CARD_PATH: &str = "/map/getDTPCardData";

fn aggregator(config: &Config) -> SubregionAggregator {
    let fetcher = PageFetcher::new(create_transport(config));
    SubregionAggregator::new(fetcher, config.fetch.legacy_page_size)
}

#[tokio::test]
async fn test_same_year_range_uses_probe_and_sized_fetch() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("en", "1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Армавир", 2, &[1])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("en", "2")))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Армавир", 2, &[1, 2])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let aggregator = aggregator(&create_test_config(&mock_server));
    let pages = aggregator
        .fetch_range("90", "90401", date(2019, 1, 1), date(2019, 2, 1))
        .await
        .unwrap();

    assert_eq!(pages.len(), 1);
    assert_eq!(pages[0].window.year(), 2019);
    assert_eq!(pages[0].window.first_month(), 1);
    assert_eq!(pages[0].window.last_month(), 2);
    assert_eq!(pages[0].region_name, "Армавир");
    assert_eq!(pages[0].total_count, 2);
    let ids: Vec<u64> = pages[0].cards.iter().map(|c| c.id).collect();
    assert_eq!(ids, vec![1, 2]);
}

#[tokio::test]
async fn test_fetch_year_is_repeatable() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("en", "1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Армавир", 3, &[1])))
        .expect(2)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("en", "3")))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(card_body("Армавир", 3, &[1, 2, 3])),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let aggregator = aggregator(&create_test_config(&mock_server));
    let window = split_range(date(2019, 4, 1), date(2019, 9, 30)).unwrap()[0];

    let first = aggregator.fetch_year("3", "3410", &window).await.unwrap();
    let second = aggregator.fetch_year("3", "3410", &window).await.unwrap();

    assert_eq!(first.len(), 3);
    assert_eq!(first, second);
}

#[tokio::test]
async fn test_probe_request_carries_region_and_months() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("ParReg", "90")))
        .and(body_string_contains(form_field("reg", "90401")))
        .and(body_string_contains(form_field("st", "0")))
        .and(body_string_contains(form_field("en", "1")))
        .and(body_string_contains(r#"\"MONTHS:3.2020\""#))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Владикавказ", 0, &[])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let aggregator = aggregator(&create_test_config(&mock_server));
    let pages = aggregator
        .fetch_range("90", "90401", date(2020, 3, 5), date(2020, 3, 20))
        .await
        .unwrap();

    // A zero count needs no sized fetch
    assert_eq!(pages.len(), 1);
    assert!(pages[0].is_empty());
}

#[tokio::test]
async fn test_multi_year_range_is_chronological() {
    let mock_server = MockServer::start().await;

    let windows = [
        ("MONTHS:11.2018", 2018u64),
        ("MONTHS:1.2019", 2019),
        ("MONTHS:1.2020", 2020),
    ];
    for (tag, id) in windows {
        let body = card_body("Армавир", 1, &[id]);
        Mock::given(method("POST"))
            .and(path(CARD_PATH))
            .and(body_string_contains(tag))
            .respond_with(ResponseTemplate::new(200).set_body_string(body))
            .expect(2)
            .mount(&mock_server)
            .await;
    }

    let aggregator = aggregator(&create_test_config(&mock_server));
    let pages = aggregator
        .fetch_range("3", "3410", date(2018, 11, 15), date(2020, 2, 10))
        .await
        .unwrap();

    let years: Vec<i32> = pages.iter().map(|p| p.window.year()).collect();
    assert_eq!(years, vec![2018, 2019, 2020]);
    assert_eq!((pages[0].window.first_month(), pages[0].window.last_month()), (11, 12));
    assert_eq!((pages[1].window.first_month(), pages[1].window.last_month()), (1, 12));
    assert_eq!((pages[2].window.first_month(), pages[2].window.last_month()), (1, 2));

    let ids: Vec<u64> = pages.iter().map(|p| p.cards[0].id).collect();
    assert_eq!(ids, vec![2018, 2019, 2020]);
}

#[tokio::test]
async fn test_empty_year_keeps_its_place() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains("MONTHS:1.2018"))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Армавир", 1, &[1])))
        .mount(&mock_server)
        .await;

    // No data envelope at all for 2019
    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains("MONTHS:1.2019"))
        .respond_with(ResponseTemplate::new(200).set_body_string("{}"))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains("MONTHS:1.2020"))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Армавир", 1, &[3])))
        .mount(&mock_server)
        .await;

    let aggregator = aggregator(&create_test_config(&mock_server));
    let pages = aggregator
        .fetch_range("3", "3410", date(2018, 1, 1), date(2020, 6, 30))
        .await
        .unwrap();

    assert_eq!(pages.len(), 3);
    assert_eq!(pages[0].len(), 1);
    assert!(pages[1].is_empty());
    assert_eq!(pages[1].window.year(), 2019);
    assert_eq!(pages[2].len(), 1);
}

#[tokio::test]
async fn test_sized_fetch_empty_after_probe_is_not_found() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("en", "1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Армавир", 5, &[1])))
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("en", "5")))
        .respond_with(ResponseTemplate::new(200).set_body_string(r#"{"data": ""}"#))
        .expect(1)
        .mount(&mock_server)
        .await;

    let aggregator = aggregator(&create_test_config(&mock_server));
    let err = aggregator
        .fetch_range("3", "3410", date(2019, 1, 1), date(2019, 12, 31))
        .await
        .unwrap_err();

    assert!(matches!(err, GibddError::Fetch { .. }));
    assert!(matches!(
        err.root_cause(),
        GibddError::CrashesNotFound { .. }
    ));
    assert!(err.to_string().contains("3410"));
}

#[tokio::test]
async fn test_http_failure_propagates_with_context() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&mock_server)
        .await;

    let aggregator = aggregator(&create_test_config(&mock_server));
    let err = aggregator
        .fetch_range("3", "3410", date(2018, 1, 1), date(2019, 12, 31))
        .await
        .unwrap_err();

    match err {
        GibddError::Fetch { window, source, .. } => {
            assert_eq!(window, "2018 months 1-12");
            assert!(matches!(*source, GibddError::RequestFailed { status: 503, .. }));
        }
        other => panic!("Expected Fetch, got {:?}", other),
    }
}

#[tokio::test]
async fn test_invalid_period_sends_nothing() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200))
        .expect(0)
        .mount(&mock_server)
        .await;

    let aggregator = aggregator(&create_test_config(&mock_server));
    let result = aggregator
        .fetch_range("3", "3410", date(2020, 1, 1), date(2019, 1, 1))
        .await;

    assert!(matches!(result, Err(GibddError::InvalidPeriod { .. })));
}

#[tokio::test]
async fn test_count_range_uses_probes_only() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("en", "1")))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Армавир", 7, &[1])))
        .expect(2)
        .mount(&mock_server)
        .await;

    let aggregator = aggregator(&create_test_config(&mock_server));
    let count = aggregator
        .count_range("3", "3410", date(2019, 6, 1), date(2020, 3, 1))
        .await
        .unwrap();

    assert_eq!(count, 14);
}

#[tokio::test]
#[allow(deprecated)]
async fn test_paged_fetch_walks_until_short_page() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("st", "0")))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Армавир", 3, &[1, 2])))
        .expect(1)
        .mount(&mock_server)
        .await;

    Mock::given(method("POST"))
        .and(path(CARD_PATH))
        .and(body_string_contains(form_field("st", "2")))
        .respond_with(ResponseTemplate::new(200).set_body_string(card_body("Армавир", 3, &[3])))
        .expect(1)
        .mount(&mock_server)
        .await;

    let mut config = create_test_config(&mock_server);
    config.fetch.legacy_page_size = 2;
    let aggregator = aggregator(&config);

    let window = split_range(date(2019, 1, 1), date(2019, 12, 31)).unwrap()[0];
    let pages = aggregator
        .fetch_year_paged("3", "3410", &window)
        .await
        .unwrap();

    assert_eq!(pages.len(), 2);
    let total: usize = pages.iter().map(|p| p.len()).sum();
    assert_eq!(total, 3);
}
