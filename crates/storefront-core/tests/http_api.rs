//! `ApiClient` against a small local HTTP server.

use std::net::SocketAddr;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};

use storefront_core::{
    seed, ApiClient, ApiError, Customer, CustomerRepository, LocalStore, MemoryStore, Money, Product, ProductRepository,
    RemoteSource, RemoteWrite, Sale, SaleItem, SaleRepository, Source,
};

#[derive(Clone, Default)]
struct Received {
    created: Arc<Mutex<Vec<Product>>>,
    replaced: Arc<Mutex<Vec<(String, Product)>>>,
    deleted: Arc<Mutex<Vec<String>>>,
    sales: Arc<Mutex<Vec<serde_json::Value>>>,
    auth: Arc<Mutex<Vec<String>>>,
}

async fn list_products(State(received): State<Received>, headers: HeaderMap) -> Json<Vec<Product>> {
    if let Some(auth) = headers.get("authorization").and_then(|v| v.to_str().ok()) {
        received.auth.lock().unwrap().push(auth.to_string());
    }
    Json(seed::products())
}

async fn get_product(Path(id): Path<String>) -> Result<Json<Product>, StatusCode> {
    seed::products()
        .into_iter()
        .find(|p| p.id == id)
        .map(Json)
        .ok_or(StatusCode::NOT_FOUND)
}

async fn create_product(State(received): State<Received>, Json(product): Json<Product>) -> StatusCode {
    received.created.lock().unwrap().push(product);
    StatusCode::CREATED
}

async fn replace_product(
    State(received): State<Received>,
    Path(id): Path<String>,
    Json(product): Json<Product>,
) -> StatusCode {
    received.replaced.lock().unwrap().push((id, product));
    StatusCode::NO_CONTENT
}

async fn delete_product(State(received): State<Received>, Path(id): Path<String>) -> StatusCode {
    received.deleted.lock().unwrap().push(id);
    StatusCode::NO_CONTENT
}

async fn create_sale(State(received): State<Received>, Json(body): Json<serde_json::Value>) -> StatusCode {
    received.sales.lock().unwrap().push(body);
    StatusCode::CREATED
}

async fn serve() -> (SocketAddr, Received) {
    let received = Received::default();
    let app = Router::new()
        .route("/products", get(list_products).post(create_product))
        .route(
            "/products/{id}",
            get(get_product).put(replace_product).delete(delete_product),
        )
        .route(
            "/customers",
            get(|| async { (StatusCode::INTERNAL_SERVER_ERROR, "database unavailable") }),
        )
        .route("/sales", get(|| async { "not json" }).post(create_sale))
        .with_state(received.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    (addr, received)
}

fn client(addr: SocketAddr) -> ApiClient {
    ApiClient::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap()
}

#[tokio::test]
async fn test_list_and_get() {
    let (addr, received) = serve().await;
    let api = client(addr).with_token("token-123".to_string());

    let products = api.list::<Product>().await.unwrap();
    assert_eq!(products, seed::products());
    assert_eq!(received.auth.lock().unwrap().as_slice(), ["Bearer token-123"]);

    let monitor = api.get::<Product>("2").await.unwrap().unwrap();
    assert_eq!(monitor.name, "Monitor Gaming 4K");
    assert!(api.get::<Product>("99").await.unwrap().is_none());
}

#[tokio::test]
async fn test_writes_send_entity_bodies() {
    let (addr, received) = serve().await;
    let api = client(addr);
    let product = seed::products().remove(0);

    api.create(&product).await.unwrap();
    api.replace(&product).await.unwrap();
    api.delete::<Product>("1").await.unwrap();

    assert_eq!(received.created.lock().unwrap().as_slice(), [product.clone()]);
    assert_eq!(received.replaced.lock().unwrap().as_slice(), [("1".to_string(), product)]);
    assert_eq!(received.deleted.lock().unwrap().as_slice(), ["1".to_string()]);
}

#[tokio::test]
async fn test_error_statuses() {
    let (addr, _) = serve().await;
    let api = client(addr);

    match api.list::<Customer>().await {
        Err(ApiError::ServerError(body)) => assert_eq!(body, "database unavailable"),
        other => panic!("expected server error, got {:?}", other.map(|c| c.len())),
    }
    assert!(matches!(
        api.list::<Sale>().await,
        Err(ApiError::InvalidResponse(_))
    ));
    // No customer routes by id at all.
    assert!(api.delete::<Customer>("1").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_repository_over_http() {
    let (addr, _) = serve().await;
    let api = Arc::new(client(addr));
    let local = Arc::new(MemoryStore::new());

    let products = ProductRepository::new(Arc::clone(&api), Arc::clone(&local), Vec::new());
    let fetched = products.by_category("Tecnología").await;
    assert_eq!(fetched.source, Source::Remote);
    assert_eq!(fetched.data.len(), 3);

    let patched = products.set_stock("3", 8).await;
    assert_eq!(patched.outcome.remote, RemoteWrite::Accepted);

    let customers = CustomerRepository::new(api, local, seed::customers());
    let fetched = customers.all().await;
    assert_eq!(fetched.source, Source::Seed);
    assert_eq!(fetched.data.len(), 2);
}

#[tokio::test]
async fn test_unreachable_server_falls_back() {
    let api = ApiClient::new("http://127.0.0.1:1", Duration::from_secs(2)).unwrap();
    assert!(matches!(
        api.list::<Product>().await,
        Err(ApiError::NetworkError(_))
    ));

    let repo = ProductRepository::new(Arc::new(api), Arc::new(MemoryStore::new()), seed::products());
    let fetched = repo.get("1").await;
    assert_eq!(fetched.source, Source::Seed);
    assert_eq!(fetched.data.map(|p| p.stock), Some(5));
}

#[tokio::test]
async fn test_sale_body_carries_recomputed_totals() {
    let (addr, received) = serve().await;
    let repo = SaleRepository::new(Arc::new(client(addr)), Arc::new(MemoryStore::new()), Vec::new());

    let items = vec![
        SaleItem::new("1", "Laptop Gaming", 2, Money::from_cents(100)),
        SaleItem::new("3", "Smartphone", 1, Money::from_cents(250)),
    ];
    let mut sale = Sale::new("s1", "1", items);
    sale.total = Money::from_cents(5);
    sale.items[0].line_total = Money::from_cents(1);

    let outcome = repo.insert(sale).await;
    assert!(outcome.is_synced());

    let bodies = received.sales.lock().unwrap().clone();
    assert_eq!(bodies.len(), 1);
    assert_eq!(bodies[0]["total"], 450);
    assert_eq!(bodies[0]["items"][0]["lineTotal"], 200);

    let stored = repo.local().get::<Sale>("s1").unwrap().unwrap();
    assert_eq!(serde_json::to_value(&stored).unwrap(), bodies[0]);
}
