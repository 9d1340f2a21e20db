use catalog_api::app::{AppServices, build_app};
use catalog_api::config::{AdminSeed, AppConfig, StorageConfig};
use reqwest::StatusCode;
use serde_json::{Value, json};

const ORIGIN: &str = "http://localhost:8080";

struct TestServer {
    base_url: String,
    handle: tokio::task::JoinHandle<()>,
}

impl TestServer {
    async fn spawn(services: AppServices) -> Self {
        // Build app (same router as prod), but bind to an ephemeral port.
        let app = build_app(services, &[ORIGIN.to_string()]);
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("failed to bind ephemeral port");
        let addr = listener.local_addr().unwrap();
        let base_url = format!("http://{}", addr);

        let handle = tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        Self { base_url, handle }
    }

    /// In-memory catalog, no authenticators.
    async fn open() -> Self {
        Self::spawn(AppServices::in_memory()).await
    }

    /// In-memory catalog guarded by a static token and a seeded admin user.
    async fn secured() -> Self {
        let config = AppConfig {
            storage: StorageConfig::InMemory,
            api_token: Some("test-token".to_string()),
            admin: Some(AdminSeed {
                username: "admin".to_string(),
                password: "correct horse".to_string(),
            }),
            ..AppConfig::default()
        };
        Self::spawn(AppServices::from_config(&config).await.unwrap()).await
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn create_product(client: &reqwest::Client, srv: &TestServer, body: Value) -> Value {
    let res = client
        .post(srv.url("/products"))
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    res.json().await.unwrap()
}

#[tokio::test]
async fn health_is_public_and_tagged_with_request_id() {
    let srv = TestServer::secured().await;

    let res = reqwest::get(srv.url("/health")).await.unwrap();

    assert_eq!(res.status(), StatusCode::OK);
    let request_id = res.headers().get("x-request-id").unwrap().to_str().unwrap();
    assert_eq!(request_id.len(), 36);
}

#[tokio::test]
async fn product_lifecycle_with_price_history() {
    let srv = TestServer::open().await;
    let client = reqwest::Client::new();

    let created = create_product(
        &client,
        &srv,
        json!({
            "name": "Kettle",
            "description": "1.7L",
            "price": 2500,
            "images": [{ "url": "front.jpg" }, { "url": "side.jpg" }],
        }),
    )
    .await;
    let id = created["id"].as_i64().unwrap();
    assert_eq!(created["price"], 2500);
    assert_eq!(created["images"].as_array().unwrap().len(), 2);

    let fetched: Value = client
        .get(srv.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched, created);

    // No history before the first change.
    let res = client
        .get(srv.url(&format!("/products/{id}/price_history")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);

    // Query-string form.
    let res = client
        .put(srv.url(&format!("/products/{id}/price?new_price=2000")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["price"], 2000);

    // Same price again: no new history row.
    let res = client
        .put(srv.url(&format!("/products/{id}/price?new_price=2000")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    // JSON body form.
    let res = client
        .put(srv.url(&format!("/products/{id}/price")))
        .json(&json!({ "new_price": 1800 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let history: Value = client
        .get(srv.url(&format!("/products/{id}/price_history")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let history = history.as_array().unwrap();
    let prices: Vec<i64> = history.iter().map(|e| e["price"].as_i64().unwrap()).collect();
    assert_eq!(prices, vec![2000, 1800]);
    assert!(history.iter().all(|e| e["product_id"] == id));
    assert!(history[0]["timestamp"].is_string());

    let listed: Value = client.get(srv.url("/products")).send().await.unwrap().json().await.unwrap();
    assert_eq!(listed.as_array().unwrap().len(), 1);
    assert_eq!(listed[0]["price"], 1800);

    let res = client
        .delete(srv.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["message"], "Product deleted successfully");

    for path in [format!("/products/{id}"), format!("/products/{id}/price_history")] {
        let res = client.get(srv.url(&path)).send().await.unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        let body: Value = res.json().await.unwrap();
        assert_eq!(body["error"], "not_found");
    }
}

#[tokio::test]
async fn bad_input_is_rejected_with_400() {
    let srv = TestServer::open().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/products"))
        .json(&json!({ "name": "", "price": 10 }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "validation_error");

    let res = client
        .post(srv.url("/products"))
        .json(&json!({ "name": "Mug" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_body");

    let res = client.get(srv.url("/products/abc")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    let body: Value = res.json().await.unwrap();
    assert_eq!(body["error"], "invalid_id");

    let product = create_product(&client, &srv, json!({ "name": "Mug", "price": 300 })).await;
    let id = product["id"].as_i64().unwrap();

    for query in ["?new_price=-1", "?new_price=cheap", ""] {
        let res = client
            .put(srv.url(&format!("/products/{id}/price{query}")))
            .send()
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST, "query {query:?}");
    }

    // The failed updates left the price alone.
    let fetched: Value = client
        .get(srv.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["price"], 300);

    let res = client
        .put(srv.url("/products/9999/price?new_price=5"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn images_and_taxonomy() {
    let srv = TestServer::open().await;
    let client = reqwest::Client::new();

    let res = client
        .post(srv.url("/categories"))
        .json(&json!({ "name": "Kitchen" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let category: Value = res.json().await.unwrap();
    let category_id = category["id"].as_i64().unwrap();

    let res = client
        .post(srv.url(&format!("/categories/{category_id}/product_types")))
        .json(&json!({ "name": "Kettles" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let product_type: Value = res.json().await.unwrap();
    assert_eq!(product_type["category_id"], category_id);

    let types: Value = client
        .get(srv.url(&format!("/categories/{category_id}/product_types")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(types.as_array().unwrap().len(), 1);

    let product = create_product(
        &client,
        &srv,
        json!({ "name": "Kettle", "price": 2500, "product_type_id": product_type["id"] }),
    )
    .await;
    assert_eq!(product["product_type_id"], product_type["id"]);
    let id = product["id"].as_i64().unwrap();

    let res = client
        .post(srv.url(&format!("/products/{id}/images")))
        .json(&json!({ "url": "top.jpg" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);

    let fetched: Value = client
        .get(srv.url(&format!("/products/{id}")))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(fetched["images"][0]["url"], "top.jpg");

    let res = client
        .post(srv.url("/categories/404/product_types"))
        .json(&json!({ "name": "Ghosts" }))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn writes_require_credentials_when_auth_is_configured() {
    let srv = TestServer::secured().await;
    let client = reqwest::Client::new();
    let body = json!({ "name": "Lamp", "price": 4000 });

    let res = client.post(srv.url("/products")).json(&body).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/products"))
        .bearer_auth("wrong-token")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let res = client
        .post(srv.url("/products"))
        .bearer_auth("test-token")
        .json(&body)
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::CREATED);
    let id = res.json::<Value>().await.unwrap()["id"].as_i64().unwrap();

    let res = client
        .put(srv.url(&format!("/products/{id}/price?new_price=3500")))
        .basic_auth("admin", Some("correct horse"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::OK);

    let res = client
        .delete(srv.url(&format!("/products/{id}")))
        .basic_auth("admin", Some("wrong"))
        .send()
        .await
        .unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    // Reads stay public.
    let res = client.get(srv.url(&format!("/products/{id}"))).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::OK);
}

#[tokio::test]
async fn whoami_reports_the_authenticated_principal() {
    let srv = TestServer::secured().await;
    let client = reqwest::Client::new();

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

    let body: Value = client
        .get(srv.url("/whoami"))
        .bearer_auth("test-token")
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["method"], "static_token");
    assert!(body["user_id"].is_null());

    let body: Value = client
        .get(srv.url("/whoami"))
        .basic_auth("admin", Some("correct horse"))
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["subject"], "admin");
    assert_eq!(body["method"], "user_credentials");
    assert!(body["user_id"].is_i64());
}

#[tokio::test]
async fn open_mode_allows_anonymous_writes() {
    let srv = TestServer::open().await;
    let client = reqwest::Client::new();

    create_product(&client, &srv, json!({ "name": "Chair", "price": 100 })).await;

    let res = client.get(srv.url("/whoami")).send().await.unwrap();
    assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let srv = TestServer::secured().await;
    let client = reqwest::Client::new();

    let res = client
        .request(reqwest::Method::OPTIONS, srv.url("/products"))
        .header("Origin", ORIGIN)
        .header("Access-Control-Request-Method", "POST")
        .header("Access-Control-Request-Headers", "authorization,content-type")
        .send()
        .await
        .unwrap();

    assert!(res.status().is_success());
    let headers = res.headers();
    assert_eq!(headers["access-control-allow-origin"], ORIGIN);
    assert_eq!(headers["access-control-allow-credentials"], "true");
}
