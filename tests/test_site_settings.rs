mod common;

use std::future::IntoFuture;

#[tokio::test]
async fn get_creates_defaults_once() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let first: serde_json::Value = server.get("/api/site-settings").await.json();
    assert_eq!(first["data"]["yearsOfExperience"], "10+");
    assert_eq!(first["data"]["companyFoundedYear"], 2014);

    let second: serde_json::Value = server.get("/api/site-settings").await.json();
    assert_eq!(first["data"]["id"], second["data"]["id"]);
    assert_eq!(env.count("sitesettings").await, 1);
}

#[tokio::test]
async fn update_before_any_read_creates_single_document() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .put("/api/site-settings")
        .json(&serde_json::json!({ "happyClients": "80+" }))
        .await
        .json();
    assert_eq!(body["message"], "Site settings updated successfully");
    assert_eq!(body["data"]["happyClients"], "80+");
    // Fields not in the request keep their stock values.
    assert_eq!(body["data"]["clientSatisfaction"], "98%");

    assert_eq!(env.count("sitesettings").await, 1);
}

#[tokio::test]
async fn concurrent_updates_never_duplicate_the_singleton() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let requests = (0..8).map(|i| {
        server
            .put("/api/site-settings")
            .json(&serde_json::json!({ "propertiesManaged": format!("{}+", 50 + i) }))
            .into_future()
    });
    futures::future::join_all(requests).await;

    assert_eq!(env.count("sitesettings").await, 1);
    let body: serde_json::Value = server.get("/api/site-settings").await.json();
    assert!(body["data"]["propertiesManaged"]
        .as_str()
        .unwrap()
        .ends_with('+'));
}

#[tokio::test]
async fn keyless_settings_document_is_adopted() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    // Written by an earlier deployment: no `key` field.
    let now = bson::DateTime::now();
    env.db
        .collection::<bson::Document>("sitesettings")
        .insert_one(bson::doc! {
            "yearsOfExperience": "15+",
            "happyClients": "120+",
            "clientSatisfaction": "99%",
            "propertiesManaged": "75+",
            "companyFoundedYear": 2009,
            "createdAt": now,
            "updatedAt": now,
            "__v": 0,
        })
        .await
        .unwrap();
    modern_services::db::connection::ensure_indexes(&env.db)
        .await
        .unwrap();

    let body: serde_json::Value = server.get("/api/site-settings").await.json();
    assert_eq!(body["data"]["yearsOfExperience"], "15+");
    assert_eq!(body["data"]["companyFoundedYear"], 2009);

    let body: serde_json::Value = server
        .put("/api/site-settings")
        .json(&serde_json::json!({ "happyClients": "130+" }))
        .await
        .json();
    assert_eq!(body["data"]["happyClients"], "130+");
    assert_eq!(body["data"]["propertiesManaged"], "75+");

    assert_eq!(env.count("sitesettings").await, 1);
}

#[tokio::test]
async fn empty_value_clears_a_statistic() {
    let env = common::TestEnv::start().await;
    let server = env.server();

    let body: serde_json::Value = server
        .put("/api/site-settings")
        .json(&serde_json::json!({ "clientSatisfaction": "  " }))
        .await
        .json();
    assert_eq!(body["data"]["clientSatisfaction"], "");
    assert_eq!(body["data"]["yearsOfExperience"], "10+");
}
