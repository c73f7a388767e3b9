//! Region directory fetch and cache

use crate::{create_test_config, create_transport};
use gibdd_crashes::region::{load_directory, save_directory, DirectoryClient};
use gibdd_crashes::{CountryDirectory, Region};
use tempfile::TempDir;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const MAP_PATH: &str = "/map/getMainMapData";

fn map_body(entries: serde_json::Value) -> String {
    let maps = entries.to_string();
    let metabase = serde_json::json!([{ "maps": maps }]).to_string();
    serde_json::json!({ "metabase": metabase }).to_string()
}

async fn mount_children(server: &MockServer, region: &str, entries: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path(MAP_PATH))
        .and(body_string_contains(format!(r#""region":"{}""#, region)))
        .respond_with(ResponseTemplate::new(200).set_body_string(map_body(entries)))
        .expect(1)
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_fetch_country_directory() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        CountryDirectory::OKATO,
        serde_json::json!([
            { "id": "90", "name": "Республика Северная Осетия-Алания" },
            { "id": 3, "name": "Краснодарский край" }
        ]),
    )
    .await;
    mount_children(
        &mock_server,
        "90",
        serde_json::json!([
            { "id": "90401", "name": "Владикавказ" },
            { "id": "90205", "name": "Алагирский район" }
        ]),
    )
    .await;
    mount_children(
        &mock_server,
        "3",
        serde_json::json!([{ "id": "3401", "name": "Город Краснодар" }]),
    )
    .await;

    let config = create_test_config(&mock_server);
    let client = DirectoryClient::with_period(create_transport(&config), 2021, 10);
    let directory = client.fetch_country_directory().await.unwrap();

    assert_eq!(directory.regions.len(), 2);
    assert_eq!(directory.district_count(), 3);

    match directory.get_region("90205") {
        Some(Region::Subregion { parent, region }) => {
            assert_eq!(parent.okato.as_deref(), Some("90"));
            assert_eq!(region.name, "Алагирский район");
        }
        other => panic!("Expected subregion, got {:?}", other),
    }

    let tmp = TempDir::new().unwrap();
    let cache = tmp.path().join("regions.json");
    save_directory(&cache, &directory).unwrap();
    assert_eq!(load_directory(&cache).unwrap(), directory);
}

#[tokio::test]
async fn test_request_carries_period_tag() {
    let mock_server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(MAP_PATH))
        .and(body_string_contains("MONTHS:12.2020"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(map_body(serde_json::json!([{ "id": "90", "name": "Осетия" }]))),
        )
        .expect(1)
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server);
    let client = DirectoryClient::with_period(create_transport(&config), 2020, 12);
    let children = client.fetch_children(CountryDirectory::OKATO).await.unwrap();

    assert_eq!(children.len(), 1);
    assert_eq!(children[0].okato.as_deref(), Some("90"));
}

#[tokio::test]
async fn test_failing_region_is_skipped() {
    let mock_server = MockServer::start().await;

    mount_children(
        &mock_server,
        CountryDirectory::OKATO,
        serde_json::json!([
            { "id": "90", "name": "Республика Северная Осетия-Алания" },
            { "id": "3", "name": "Краснодарский край" }
        ]),
    )
    .await;
    mount_children(
        &mock_server,
        "90",
        serde_json::json!([{ "id": "90401", "name": "Владикавказ" }]),
    )
    .await;

    Mock::given(method("POST"))
        .and(path(MAP_PATH))
        .and(body_string_contains(r#""region":"3""#))
        .respond_with(ResponseTemplate::new(200).set_body_string("not json"))
        .mount(&mock_server)
        .await;

    let config = create_test_config(&mock_server);
    let client = DirectoryClient::with_period(create_transport(&config), 2021, 10);
    let directory = client.fetch_country_directory().await.unwrap();

    assert_eq!(directory.regions.len(), 1);
    assert_eq!(directory.regions[0].name, "Республика Северная Осетия-Алания");
}
