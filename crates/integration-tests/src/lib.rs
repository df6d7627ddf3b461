//! Integration tests for the FreshMart storefront.
//!
//! The tests run the client library and the storefront router against
//! [`MockCommerceApi`], an in-process stand-in for the commerce REST API
//! served by axum on an ephemeral port. No network access is needed.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p freshmart-integration-tests
//! ```
//!
//! # Fixtures
//!
//! - 30 products: `p01`..`p26` filler, plus `milk`, `choc`, `tea` (3 in
//!   stock) and `cheese` (sold out)
//! - 2 brands
//! - one account, [`EMAIL`] / [`PASSWORD`]
//! - coupons [`COUPON`] (10% off) and [`BAD_DISCOUNT_COUPON`] (a discounted
//!   total above the cart total)

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::collections::{HashMap, HashSet};
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, PoisonError};

use axum::{
    Json, Router,
    extract::{Path, Query, Request, State},
    http::{HeaderMap, StatusCode},
    middleware::{self, Next},
    response::Response,
    routing::{get, post, put},
};
use freshmart_storefront::api::{Api, ApiClient};
use freshmart_storefront::config::ApiConfig;
use freshmart_storefront::storage::KeyValueStore;
use serde::Deserialize;
use serde_json::{Value, json};

/// The seeded account.
pub const EMAIL: &str = "mona@example.com";
pub const PASSWORD: &str = "secret123";
pub const NAME: &str = "Mona Adel";

/// 10% off.
pub const COUPON: &str = "SAVE10";

/// Makes the server report a discounted total above the cart total.
pub const BAD_DISCOUNT_COUPON: &str = "OVERCHARGE";

/// Number of seeded products.
pub const PRODUCT_COUNT: usize = 30;

type Reply = (StatusCode, Json<Value>);

/// One request the mock received.
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub query: HashMap<String, String>,
}

#[derive(Debug, Clone)]
struct MockProduct {
    id: String,
    title: String,
    price: u64,
    quantity: i64,
}

impl MockProduct {
    fn new(id: &str, title: &str, price: u64, quantity: i64) -> Self {
        Self {
            id: id.to_string(),
            title: title.to_string(),
            price,
            quantity,
        }
    }

    fn document(&self) -> Value {
        json!({
            "_id": self.id,
            "id": self.id,
            "title": self.title,
            "slug": self.title.to_lowercase().replace(' ', "-"),
            "description": format!("{} from the mock store", self.title),
            "price": self.price,
            "imageCover": format!("uploads/{}.jpeg", self.id),
            "images": [format!("uploads/{}-1.jpeg", self.id)],
            "category": { "_id": "c1", "name": "Groceries", "slug": "groceries" },
            "brand": { "_id": "b1", "name": "Juhayna", "slug": "juhayna" },
            "ratingsAverage": 4.5,
            "ratingsQuantity": 12,
            "sold": 40,
            "quantity": self.quantity,
        })
    }
}

#[derive(Debug)]
struct MockState {
    products: Vec<MockProduct>,
    valid_tokens: HashSet<String>,
    issued_tokens: u32,
    /// `None` until the first add: reading a missing cart is a 404.
    cart: Option<Vec<(String, u32)>>,
    coupon: Option<String>,
    wishlist: Vec<String>,
    wishlist_down: bool,
    requests: Vec<RecordedRequest>,
}

impl MockState {
    fn seeded() -> Self {
        let mut products: Vec<MockProduct> = (1..=26)
            .map(|n| MockProduct::new(&format!("p{n:02}"), &format!("Pantry Item {n:02}"), 10 * n, 50))
            .collect();
        products.push(MockProduct::new("milk", "Fresh Milk", 40, 100));
        products.push(MockProduct::new("choc", "Milk Chocolate", 30, 20));
        products.push(MockProduct::new("tea", "Green Tea", 60, 3));
        products.push(MockProduct::new("cheese", "Aged Cheese", 120, 0));

        Self {
            products,
            valid_tokens: HashSet::new(),
            issued_tokens: 0,
            cart: None,
            coupon: None,
            wishlist: Vec::new(),
            wishlist_down: false,
            requests: Vec::new(),
        }
    }

    fn issue_token(&mut self) -> String {
        self.issued_tokens += 1;
        let token = format!("token-{}", self.issued_tokens);
        self.valid_tokens.insert(token.clone());
        token
    }

    fn product(&self, id: &str) -> Option<&MockProduct> {
        self.products.iter().find(|p| p.id == id)
    }

    fn cart_json(&self, with_documents: bool) -> Value {
        let lines = self.cart.clone().unwrap_or_default();
        let mut total = 0;
        let products: Vec<Value> = lines
            .iter()
            .filter_map(|(id, count)| {
                let product = self.product(id)?;
                total += product.price * u64::from(*count);
                let reference = if with_documents {
                    product.document()
                } else {
                    json!(product.id)
                };
                Some(json!({
                    "_id": format!("line-{id}"),
                    "count": count,
                    "price": product.price,
                    "product": reference,
                }))
            })
            .collect();

        let count: u32 = lines.iter().map(|(_, c)| c).sum();
        let mut data = json!({
            "_id": "cart-1",
            "products": products,
            "totalCartPrice": total,
        });
        match self.coupon.as_deref() {
            Some(COUPON) => data["totalPriceAfterDiscount"] = json!(total * 9 / 10),
            Some(BAD_DISCOUNT_COUPON) => data["totalPriceAfterDiscount"] = json!(total + 50),
            _ => {}
        }
        json!({ "status": "success", "numOfCartItems": count, "data": data })
    }
}

type Shared = Arc<Mutex<MockState>>;

fn lock(state: &Shared) -> std::sync::MutexGuard<'_, MockState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

fn reply(status: StatusCode, body: Value) -> Reply {
    (status, Json(body))
}

fn fail(status: StatusCode, message: &str) -> Reply {
    reply(status, json!({ "statusMsg": "fail", "message": message }))
}

/// The request's token, checked against the issued ones.
fn authorize(state: &MockState, headers: &HeaderMap) -> Result<(), Reply> {
    let token = headers
        .get("token")
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or_else(|| {
            headers
                .get("authorization")
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.strip_prefix("Bearer "))
                .map(str::to_string)
        });

    match token {
        Some(token) if state.valid_tokens.contains(&token) => Ok(()),
        _ => Err(fail(
            StatusCode::UNAUTHORIZED,
            "Invalid Token. please login again",
        )),
    }
}

// =============================================================================
// Handlers
// =============================================================================

#[derive(Deserialize)]
struct SignIn {
    email: String,
    password: String,
}

async fn sign_in(State(state): State<Shared>, Json(body): Json<SignIn>) -> Reply {
    let mut state = lock(&state);
    if body.email != EMAIL || body.password != PASSWORD {
        return fail(StatusCode::UNAUTHORIZED, "Incorrect email or password");
    }
    let token = state.issue_token();
    reply(
        StatusCode::OK,
        json!({
            "message": "success",
            "user": { "name": NAME, "email": EMAIL, "role": "user" },
            "token": token,
        }),
    )
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct SignUp {
    name: String,
    email: String,
    password: String,
    re_password: String,
}

async fn sign_up(State(state): State<Shared>, Json(body): Json<SignUp>) -> Reply {
    let mut state = lock(&state);
    if body.email == EMAIL {
        return fail(StatusCode::CONFLICT, "Account Already Exists");
    }
    if body.password != body.re_password {
        return reply(
            StatusCode::BAD_REQUEST,
            json!({ "message": "fail", "errors": { "msg": "Password confirmation is incorrect" } }),
        );
    }
    let token = state.issue_token();
    reply(
        StatusCode::CREATED,
        json!({
            "message": "success",
            "user": { "name": body.name, "email": body.email, "role": "user" },
            "token": token,
        }),
    )
}

async fn verify_token(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let state = lock(&state);
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    reply(
        StatusCode::OK,
        json!({
            "message": "verified",
            "decoded": { "id": "user-1", "name": NAME, "role": "user" },
        }),
    )
}

async fn change_password(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = lock(&state);
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    state.valid_tokens.clear();
    let token = state.issue_token();
    reply(StatusCode::OK, json!({ "message": "success", "token": token }))
}

async fn list_products(
    State(state): State<Shared>,
    Query(query): Query<HashMap<String, String>>,
) -> Reply {
    let state = lock(&state);
    let keyword = query.get("keyword").map(|k| k.to_lowercase());
    let mut matches: Vec<&MockProduct> = state
        .products
        .iter()
        .filter(|p| {
            keyword
                .as_ref()
                .is_none_or(|k| p.title.to_lowercase().contains(k))
        })
        .collect();

    match query.get("sort").map(String::as_str) {
        Some("price") => matches.sort_by_key(|p| p.price),
        Some("-price") => matches.sort_by_key(|p| std::cmp::Reverse(p.price)),
        Some("title") => matches.sort_by(|a, b| a.title.cmp(&b.title)),
        Some("-title") => matches.sort_by(|a, b| b.title.cmp(&a.title)),
        _ => {}
    }

    let limit: usize = query.get("limit").and_then(|l| l.parse().ok()).unwrap_or(40);
    let page: usize = query.get("page").and_then(|p| p.parse().ok()).unwrap_or(1);
    let pages = matches.len().div_ceil(limit.max(1)).max(1);
    let data: Vec<Value> = matches
        .iter()
        .skip((page.max(1) - 1) * limit)
        .take(limit)
        .map(|p| p.document())
        .collect();

    let mut metadata = json!({ "currentPage": page, "numberOfPages": pages, "limit": limit });
    if page < pages {
        metadata["nextPage"] = json!(page + 1);
    }
    reply(
        StatusCode::OK,
        json!({ "results": matches.len(), "metadata": metadata, "data": data }),
    )
}

async fn get_product(State(state): State<Shared>, Path(id): Path<String>) -> Reply {
    let state = lock(&state);
    match state.product(&id) {
        Some(product) => reply(StatusCode::OK, json!({ "data": product.document() })),
        None => fail(StatusCode::NOT_FOUND, "No product for this id"),
    }
}

fn brand_documents() -> Vec<Value> {
    vec![
        json!({ "_id": "b1", "name": "Juhayna", "slug": "juhayna", "image": "uploads/juhayna.png" }),
        json!({ "_id": "b2", "name": "Nestle", "slug": "nestle", "image": "uploads/nestle.png" }),
    ]
}

async fn list_brands() -> Reply {
    let data = brand_documents();
    reply(StatusCode::OK, json!({ "results": data.len(), "data": data }))
}

async fn get_brand(Path(id): Path<String>) -> Reply {
    match brand_documents().into_iter().find(|b| b["_id"] == id.as_str()) {
        Some(brand) => reply(StatusCode::OK, json!({ "data": brand })),
        None => fail(StatusCode::NOT_FOUND, "No brand for this id"),
    }
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let state = lock(&state);
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    if state.cart.is_none() {
        return fail(StatusCode::NOT_FOUND, "No cart exist for this user");
    }
    reply(StatusCode::OK, state.cart_json(true))
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct ProductRef {
    product_id: String,
}

async fn add_to_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ProductRef>,
) -> Reply {
    let mut state = lock(&state);
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    if state.product(&body.product_id).is_none() {
        return fail(StatusCode::NOT_FOUND, "No product for this id");
    }

    let lines = state.cart.get_or_insert_with(Vec::new);
    match lines.iter_mut().find(|(id, _)| *id == body.product_id) {
        Some((_, count)) => *count += 1,
        None => lines.push((body.product_id, 1)),
    }
    let mut body = state.cart_json(false);
    body["message"] = json!("Product added successfully to your cart");
    reply(StatusCode::OK, body)
}

#[derive(Deserialize)]
struct CountUpdate {
    count: u32,
}

async fn update_cart_line(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
    Json(body): Json<CountUpdate>,
) -> Reply {
    let mut state = lock(&state);
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    let line = state
        .cart
        .as_mut()
        .and_then(|lines| lines.iter_mut().find(|(pid, _)| *pid == id));
    match line {
        Some((_, count)) => *count = body.count,
        None => return fail(StatusCode::NOT_FOUND, "No product in your cart with this id"),
    }
    reply(StatusCode::OK, state.cart_json(false))
}

async fn remove_cart_line(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut state = lock(&state);
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    if let Some(lines) = state.cart.as_mut() {
        lines.retain(|(pid, _)| *pid != id);
    }
    reply(StatusCode::OK, state.cart_json(false))
}

async fn clear_cart(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let mut state = lock(&state);
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    state.cart = None;
    state.coupon = None;
    reply(StatusCode::OK, json!({ "message": "success" }))
}

#[derive(Deserialize)]
struct CouponBody {
    coupon: String,
}

async fn apply_coupon(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CouponBody>,
) -> Reply {
    let mut state = lock(&state);
    if let Err(rejected) = authorize(&state, &headers) {
        return rejected;
    }
    if body.coupon != COUPON && body.coupon != BAD_DISCOUNT_COUPON {
        return fail(StatusCode::BAD_REQUEST, "Coupon is Invalid or has Expired");
    }
    state.coupon = Some(body.coupon);
    reply(StatusCode::OK, state.cart_json(false))
}

fn wishlist_guard(state: &MockState, headers: &HeaderMap) -> Result<(), Reply> {
    authorize(state, headers)?;
    if state.wishlist_down {
        return Err(fail(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error"));
    }
    Ok(())
}

async fn get_wishlist(State(state): State<Shared>, headers: HeaderMap) -> Reply {
    let state = lock(&state);
    if let Err(rejected) = wishlist_guard(&state, &headers) {
        return rejected;
    }
    let data: Vec<Value> = state
        .wishlist
        .iter()
        .filter_map(|id| state.product(id).map(MockProduct::document))
        .collect();
    reply(
        StatusCode::OK,
        json!({ "status": "success", "count": data.len(), "data": data }),
    )
}

async fn add_to_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<ProductRef>,
) -> Reply {
    let mut state = lock(&state);
    if let Err(rejected) = wishlist_guard(&state, &headers) {
        return rejected;
    }
    if !state.wishlist.contains(&body.product_id) {
        state.wishlist.push(body.product_id);
    }
    reply(
        StatusCode::OK,
        json!({
            "status": "success",
            "message": "Product added successfully to your wishlist",
            "data": state.wishlist,
        }),
    )
}

async fn remove_from_wishlist(
    State(state): State<Shared>,
    headers: HeaderMap,
    Path(id): Path<String>,
) -> Reply {
    let mut state = lock(&state);
    if let Err(rejected) = wishlist_guard(&state, &headers) {
        return rejected;
    }
    state.wishlist.retain(|w| *w != id);
    reply(
        StatusCode::OK,
        json!({
            "status": "success",
            "message": "Product removed successfully from your wishlist",
            "data": state.wishlist,
        }),
    )
}

/// Record every request before it is handled.
async fn record(State(state): State<Shared>, request: Request, next: Next) -> Response {
    let query = request
        .uri()
        .query()
        .map(|q| {
            q.split('&')
                .filter_map(|pair| pair.split_once('='))
                .map(|(k, v)| (decode(k), decode(v)))
                .collect()
        })
        .unwrap_or_default();
    let path = request
        .uri()
        .path()
        .strip_prefix("/api/v1")
        .unwrap_or_else(|| request.uri().path())
        .to_string();

    lock(&state).requests.push(RecordedRequest {
        method: request.method().to_string(),
        path,
        query,
    });
    next.run(request).await
}

fn decode(raw: &str) -> String {
    let spaced = raw.replace('+', " ");
    let bytes = spaced.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while let Some(&b) = bytes.get(i) {
        if b == b'%'
            && let Some(hex) = spaced.get(i + 1..i + 3)
            && let Ok(value) = u8::from_str_radix(hex, 16)
        {
            out.push(value);
            i += 3;
            continue;
        }
        out.push(b);
        i += 1;
    }
    String::from_utf8_lossy(&out).into_owned()
}

fn router(state: Shared) -> Router {
    let api = Router::new()
        .route("/auth/signin", post(sign_in))
        .route("/auth/signup", post(sign_up))
        .route("/auth/verifyToken", get(verify_token))
        .route("/users/changeMyPassword", put(change_password))
        .route("/products", get(list_products))
        .route("/products/{id}", get(get_product))
        .route("/brands", get(list_brands))
        .route("/brands/{id}", get(get_brand))
        .route(
            "/cart",
            get(get_cart).post(add_to_cart).delete(clear_cart),
        )
        .route("/cart/applycoupon", put(apply_coupon))
        .route(
            "/cart/{id}",
            put(update_cart_line).delete(remove_cart_line),
        )
        .route("/wishlist", get(get_wishlist).post(add_to_wishlist))
        .route("/wishlist/{id}", axum::routing::delete(remove_from_wishlist));

    Router::new()
        .nest("/api/v1", api)
        .layer(middleware::from_fn_with_state(state.clone(), record))
        .with_state(state)
}

// =============================================================================
// MockCommerceApi
// =============================================================================

/// A running mock commerce API.
#[derive(Clone)]
pub struct MockCommerceApi {
    addr: SocketAddr,
    state: Shared,
}

impl MockCommerceApi {
    /// Serve the mock on an ephemeral local port.
    ///
    /// # Panics
    ///
    /// Panics if no local port can be bound.
    #[allow(clippy::expect_used)]
    pub async fn start() -> Self {
        let state: Shared = Arc::new(Mutex::new(MockState::seeded()));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0")
            .await
            .expect("Failed to bind mock API");
        let addr = listener.local_addr().expect("Mock API has no address");

        let app = router(state.clone());
        tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Mock API stopped");
            }
        });

        Self { addr, state }
    }

    /// Base URL the client should use.
    #[must_use]
    pub fn base_url(&self) -> String {
        format!("http://{}/api/v1", self.addr)
    }

    /// Client configuration pointing at the mock.
    #[must_use]
    pub fn config(&self) -> ApiConfig {
        ApiConfig {
            image_base_url: format!("http://{}", self.addr),
            ..ApiConfig::with_base_url(self.base_url())
        }
    }

    /// A fresh client (with its own cache) pointing at the mock.
    ///
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be built.
    #[must_use]
    #[allow(clippy::expect_used)]
    pub fn client(&self) -> ApiClient {
        ApiClient::new(&self.config()).expect("Failed to build API client")
    }

    /// An API bound to `storage`.
    #[must_use]
    pub fn api<S: KeyValueStore>(&self, storage: S) -> Api<S> {
        Api::new(self.client(), storage)
    }

    /// Make every wishlist endpoint answer 500.
    pub fn set_wishlist_down(&self, down: bool) {
        lock(&self.state).wishlist_down = down;
    }

    /// Revoke every issued token.
    pub fn expire_sessions(&self) {
        lock(&self.state).valid_tokens.clear();
    }

    /// Product ids on the server-side wishlist.
    #[must_use]
    pub fn server_wishlist(&self) -> Vec<String> {
        lock(&self.state).wishlist.clone()
    }

    /// Every request received so far.
    #[must_use]
    pub fn requests(&self) -> Vec<RecordedRequest> {
        lock(&self.state).requests.clone()
    }

    /// Requests to `path` with `method`.
    #[must_use]
    pub fn requests_to(&self, method: &str, path: &str) -> Vec<RecordedRequest> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path == path)
            .collect()
    }

    /// Forget recorded requests.
    pub fn reset_requests(&self) {
        lock(&self.state).requests.clear();
    }
}
