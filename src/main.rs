//! VoltStore - Self-hosted Electronics Store Service

use anyhow::Result;
use axum::{
    extract::{Path, Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    routing::{get, post, put},
    Json, Router,
};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::postgres::PgPoolOptions;
use sqlx::PgPool;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use uuid::Uuid;
use validator::Validate;

use voltstore::domain::aggregates::cart::{line_total, CartError, CartLine, CartTotals};
use voltstore::domain::aggregates::product::{
    feature_first, Laptop, ProductCard, ProductKind, ProductVariant, Smartphone, ALL_KINDS,
};
use voltstore::domain::image_rules::ImagePolicy;
use voltstore::domain::specs;
use voltstore::domain::value_objects::{Quantity, Slug};
use voltstore::error::StoreError;

const LAPTOP_COLS: &str = "id, category_id, title, slug, description, price, diagonal, display_type, processor_frequency, ram, graphics_card, time_without_charge, created_at";
const SMARTPHONE_COLS: &str = "id, category_id, title, slug, description, price, diagonal, display_type, resolution, ram, have_sd, sd_volume_max, accum_volume, main_cam, frontal_cam, created_at";
const CART_LINE_COLS: &str = "id, kind, product_id, quantity, total_price";

const LATEST_PER_KIND: i64 = 5;

#[derive(Clone)]
pub struct AppState {
    pub db: PgPool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with(tracing_subscriber::fmt::layer())
        .init();
    let db = PgPoolOptions::new().max_connections(10).connect(&std::env::var("DATABASE_URL")?).await?;
    sqlx::migrate!("./migrations").run(&db).await?;
    let state = AppState { db };

    let app = Router::new()
        .route("/health", get(|| async { Json(serde_json::json!({"status": "healthy", "service": "voltstore"})) }))
        .route("/api/v1/categories", get(list_categories).post(create_category))
        .route("/api/v1/categories/:id", get(get_category))
        .route("/api/v1/categories/eligible/:kind", get(eligible_categories))
        .route("/api/v1/specs/:kind", get(spec_template))
        .route("/api/v1/products/latest", get(latest_products))
        .route("/api/v1/products/:kind", get(list_products).post(create_product))
        .route("/api/v1/products/:kind/:slug", get(product_detail).put(update_product).delete(delete_product))
        .route("/api/v1/products/:kind/:slug/image", get(product_image))
        .route("/api/v1/customers", post(create_customer))
        .route("/api/v1/customers/:id", get(get_customer))
        .route("/api/v1/carts/:customer_id", get(get_cart).delete(clear_cart))
        .route("/api/v1/carts/:customer_id/items", post(add_cart_item))
        .route("/api/v1/carts/:customer_id/items/:item_id", put(update_cart_item).delete(remove_cart_item))
        .layer(TraceLayer::new_for_http()).layer(CorsLayer::permissive()).with_state(state);

    let port = std::env::var("PORT").unwrap_or_else(|_| "8084".to_string());
    tracing::info!("🚀 VoltStore listening on 0.0.0.0:{}", port);
    axum::serve(tokio::net::TcpListener::bind(format!("0.0.0.0:{}", port)).await?, app).await?;
    Ok(())
}

// ---------------------------------------------------------------------------
// Categories

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Category { pub id: Uuid, pub name: String, pub slug: String }

#[derive(Debug, Deserialize)]
pub struct CreateCategoryRequest { pub name: String }

async fn list_categories(State(s): State<AppState>) -> Result<Json<Vec<Category>>, StoreError> {
    let cats = sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories ORDER BY name").fetch_all(&s.db).await?;
    Ok(Json(cats))
}

async fn get_category(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Category>, StoreError> {
    sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE id = $1")
        .bind(id).fetch_optional(&s.db).await?.map(Json).ok_or(StoreError::NotFound)
}

async fn create_category(State(s): State<AppState>, Json(r): Json<CreateCategoryRequest>) -> Result<(StatusCode, Json<Category>), StoreError> {
    let slug = Slug::from_title(&r.name)?;
    let c = sqlx::query_as::<_, Category>("INSERT INTO categories (id, name, slug) VALUES ($1, $2, $3) RETURNING id, name, slug")
        .bind(Uuid::now_v7()).bind(&r.name).bind(slug.as_str()).fetch_one(&s.db).await?;
    Ok((StatusCode::CREATED, Json(c)))
}

/// Categories a product of this kind may be filed under. Presentation-layer
/// rule: each variant's admin form only offers its own category slug.
async fn eligible_categories(State(s): State<AppState>, Path(kind): Path<String>) -> Result<Json<Vec<Category>>, StoreError> {
    let kind: ProductKind = kind.parse()?;
    let cats = sqlx::query_as::<_, Category>("SELECT id, name, slug FROM categories WHERE slug = $1")
        .bind(kind.category_slug()).fetch_all(&s.db).await?;
    Ok(Json(cats))
}

// ---------------------------------------------------------------------------
// Products

#[derive(Debug, Deserialize)]
pub struct ListParams { pub page: Option<u32>, pub per_page: Option<u32> }

#[derive(Debug, Serialize)]
pub struct PaginatedResponse<T> { pub data: Vec<T>, pub total: i64, pub page: u32 }

#[derive(Debug, sqlx::FromRow)]
struct CardRow { id: Uuid, title: String, slug: String, price: Decimal, created_at: DateTime<Utc> }

async fn fetch_cards(db: &PgPool, kind: ProductKind, limit: i64, offset: i64) -> Result<Vec<ProductCard>, StoreError> {
    let sql = format!("SELECT id, title, slug, price, created_at FROM {} ORDER BY created_at DESC LIMIT $1 OFFSET $2", kind.table());
    let rows: Vec<CardRow> = sqlx::query_as(&sql).bind(limit).bind(offset).fetch_all(db).await?;
    Ok(rows.into_iter()
        .map(|r| ProductCard { kind, id: r.id, title: r.title, slug: r.slug, price: r.price, created_at: r.created_at })
        .collect())
}

/// Resolves a generic (kind, id) reference to the concrete record. Performed
/// on every access, never cached.
async fn resolve_variant(db: &PgPool, kind: ProductKind, id: Uuid) -> Result<ProductVariant, StoreError> {
    let found = match kind {
        ProductKind::Laptop => {
            let sql = format!("SELECT {LAPTOP_COLS} FROM laptops WHERE id = $1");
            sqlx::query_as::<_, Laptop>(&sql).bind(id).fetch_optional(db).await?.map(ProductVariant::Laptop)
        }
        ProductKind::Smartphone => {
            let sql = format!("SELECT {SMARTPHONE_COLS} FROM smartphones WHERE id = $1");
            sqlx::query_as::<_, Smartphone>(&sql).bind(id).fetch_optional(db).await?.map(ProductVariant::Smartphone)
        }
    };
    found.ok_or(StoreError::NotFound)
}

async fn variant_by_slug(db: &PgPool, kind: ProductKind, slug: &str) -> Result<ProductVariant, StoreError> {
    let found = match kind {
        ProductKind::Laptop => {
            let sql = format!("SELECT {LAPTOP_COLS} FROM laptops WHERE slug = $1");
            sqlx::query_as::<_, Laptop>(&sql).bind(slug).fetch_optional(db).await?.map(ProductVariant::Laptop)
        }
        ProductKind::Smartphone => {
            let sql = format!("SELECT {SMARTPHONE_COLS} FROM smartphones WHERE slug = $1");
            sqlx::query_as::<_, Smartphone>(&sql).bind(slug).fetch_optional(db).await?.map(ProductVariant::Smartphone)
        }
    };
    found.ok_or(StoreError::NotFound)
}

#[derive(Debug, Serialize)]
pub struct ProductDetail {
    #[serde(flatten)]
    pub product: ProductVariant,
    pub specifications: Vec<specs::SpecRow>,
}

async fn product_detail(State(s): State<AppState>, Path((kind, slug)): Path<(String, String)>) -> Result<Json<ProductDetail>, StoreError> {
    let kind: ProductKind = kind.parse()?;
    let product = variant_by_slug(&s.db, kind, &slug).await?;
    let specifications = specs::rows(&product);
    Ok(Json(ProductDetail { product, specifications }))
}

async fn list_products(State(s): State<AppState>, Path(kind): Path<String>, Query(p): Query<ListParams>) -> Result<Json<PaginatedResponse<ProductCard>>, StoreError> {
    let kind: ProductKind = kind.parse()?;
    let page = p.page.unwrap_or(1).max(1); let per_page = p.per_page.unwrap_or(20).min(100);
    let cards = fetch_cards(&s.db, kind, per_page as i64, ((page - 1) * per_page) as i64).await?;
    let total: (i64,) = sqlx::query_as(&format!("SELECT COUNT(*) FROM {}", kind.table())).fetch_one(&s.db).await?;
    Ok(Json(PaginatedResponse { data: cards, total: total.0, page }))
}

async fn spec_template(Path(kind): Path<String>) -> Result<Json<Vec<&'static str>>, StoreError> {
    Ok(Json(specs::labels(&kind)?.to_vec()))
}

#[derive(Debug, Deserialize)]
pub struct LatestParams { pub kinds: Option<String>, pub featured: Option<String> }

/// Up to five newest products per requested kind, concatenated in call
/// order. The featured kind moves to the front only when it is actually one
/// of the requested kinds; anything else leaves the concatenation as is.
async fn latest_products(State(s): State<AppState>, Query(p): Query<LatestParams>) -> Result<Json<Vec<ProductCard>>, StoreError> {
    let kinds = match p.kinds.as_deref() {
        Some(csv) => csv.split(',').map(|t| t.trim().parse::<ProductKind>()).collect::<Result<Vec<_>, _>>()?,
        None => ALL_KINDS.to_vec(),
    };
    let mut cards = Vec::new();
    for kind in &kinds {
        cards.extend(fetch_cards(&s.db, *kind, LATEST_PER_KIND, 0).await?);
    }
    if let Some(tag) = p.featured.as_deref() {
        if let Ok(kind) = tag.parse::<ProductKind>() {
            if kinds.contains(&kind) {
                feature_first(&mut cards, kind);
            }
        }
    }
    Ok(Json(cards))
}

#[derive(Debug, Deserialize)]
pub struct CreateLaptopRequest {
    pub category_id: Uuid, pub title: String, pub slug: String, pub image: String,
    pub description: Option<String>, pub price: Decimal,
    pub diagonal: String, pub display_type: String, pub processor_frequency: String,
    pub ram: String, pub graphics_card: String, pub time_without_charge: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateSmartphoneRequest {
    pub category_id: Uuid, pub title: String, pub slug: String, pub image: String,
    pub description: Option<String>, pub price: Decimal,
    pub diagonal: String, pub display_type: String, pub resolution: String, pub ram: String,
    pub have_sd: bool, pub sd_volume_max: String, pub accum_volume: String,
    pub main_cam: String, pub frontal_cam: String,
}

fn parse_body<T: serde::de::DeserializeOwned>(body: serde_json::Value) -> Result<T, StoreError> {
    serde_json::from_value(body).map_err(|e| StoreError::BadRequest(format!("invalid payload: {e}")))
}

/// Decodes the base64 blob and runs it through the image rules. The one
/// validation component for every product write path.
fn decode_image(encoded: &str) -> Result<Vec<u8>, StoreError> {
    let blob = BASE64.decode(encoded).map_err(|e| StoreError::BadRequest(format!("invalid base64 image: {e}")))?;
    ImagePolicy::default().validate(&blob)?;
    Ok(blob)
}

async fn create_product(State(s): State<AppState>, Path(kind): Path<String>, Json(body): Json<serde_json::Value>) -> Result<(StatusCode, Json<ProductVariant>), StoreError> {
    let kind: ProductKind = kind.parse()?;
    let product = match kind {
        ProductKind::Laptop => {
            let r: CreateLaptopRequest = parse_body(body)?;
            let slug = Slug::new(r.slug)?;
            let image = decode_image(&r.image)?;
            let sql = format!("INSERT INTO laptops (id, category_id, title, slug, image, description, price, diagonal, display_type, processor_frequency, ram, graphics_card, time_without_charge) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13) RETURNING {LAPTOP_COLS}");
            let row: Laptop = sqlx::query_as(&sql)
                .bind(Uuid::now_v7()).bind(r.category_id).bind(&r.title).bind(slug.as_str()).bind(&image)
                .bind(&r.description).bind(r.price).bind(&r.diagonal).bind(&r.display_type)
                .bind(&r.processor_frequency).bind(&r.ram).bind(&r.graphics_card).bind(&r.time_without_charge)
                .fetch_one(&s.db).await?;
            ProductVariant::Laptop(row)
        }
        ProductKind::Smartphone => {
            let r: CreateSmartphoneRequest = parse_body(body)?;
            let slug = Slug::new(r.slug)?;
            let image = decode_image(&r.image)?;
            let sql = format!("INSERT INTO smartphones (id, category_id, title, slug, image, description, price, diagonal, display_type, resolution, ram, have_sd, sd_volume_max, accum_volume, main_cam, frontal_cam) VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14, $15, $16) RETURNING {SMARTPHONE_COLS}");
            let row: Smartphone = sqlx::query_as(&sql)
                .bind(Uuid::now_v7()).bind(r.category_id).bind(&r.title).bind(slug.as_str()).bind(&image)
                .bind(&r.description).bind(r.price).bind(&r.diagonal).bind(&r.display_type).bind(&r.resolution)
                .bind(&r.ram).bind(r.have_sd).bind(&r.sd_volume_max).bind(&r.accum_volume)
                .bind(&r.main_cam).bind(&r.frontal_cam)
                .fetch_one(&s.db).await?;
            ProductVariant::Smartphone(row)
        }
    };
    tracing::info!(kind = %product.kind(), slug = %product.slug(), "product created");
    Ok((StatusCode::CREATED, Json(product)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateLaptopRequest {
    pub category_id: Uuid, pub title: String, pub image: Option<String>,
    pub description: Option<String>, pub price: Decimal,
    pub diagonal: String, pub display_type: String, pub processor_frequency: String,
    pub ram: String, pub graphics_card: String, pub time_without_charge: String,
}

#[derive(Debug, Deserialize)]
pub struct UpdateSmartphoneRequest {
    pub category_id: Uuid, pub title: String, pub image: Option<String>,
    pub description: Option<String>, pub price: Decimal,
    pub diagonal: String, pub display_type: String, pub resolution: String, pub ram: String,
    pub have_sd: bool, pub sd_volume_max: String, pub accum_volume: String,
    pub main_cam: String, pub frontal_cam: String,
}

async fn update_product(State(s): State<AppState>, Path((kind, slug)): Path<(String, String)>, Json(body): Json<serde_json::Value>) -> Result<Json<ProductVariant>, StoreError> {
    let kind: ProductKind = kind.parse()?;
    let product = match kind {
        ProductKind::Laptop => {
            let r: UpdateLaptopRequest = parse_body(body)?;
            let image = r.image.as_deref().map(decode_image).transpose()?;
            let sql = format!("UPDATE laptops SET category_id = $2, title = $3, image = COALESCE($4, image), description = $5, price = $6, diagonal = $7, display_type = $8, processor_frequency = $9, ram = $10, graphics_card = $11, time_without_charge = $12 WHERE slug = $1 RETURNING {LAPTOP_COLS}");
            sqlx::query_as::<_, Laptop>(&sql)
                .bind(&slug).bind(r.category_id).bind(&r.title).bind(&image).bind(&r.description)
                .bind(r.price).bind(&r.diagonal).bind(&r.display_type).bind(&r.processor_frequency)
                .bind(&r.ram).bind(&r.graphics_card).bind(&r.time_without_charge)
                .fetch_optional(&s.db).await?.map(ProductVariant::Laptop)
        }
        ProductKind::Smartphone => {
            let r: UpdateSmartphoneRequest = parse_body(body)?;
            let image = r.image.as_deref().map(decode_image).transpose()?;
            let sql = format!("UPDATE smartphones SET category_id = $2, title = $3, image = COALESCE($4, image), description = $5, price = $6, diagonal = $7, display_type = $8, resolution = $9, ram = $10, have_sd = $11, sd_volume_max = $12, accum_volume = $13, main_cam = $14, frontal_cam = $15 WHERE slug = $1 RETURNING {SMARTPHONE_COLS}");
            sqlx::query_as::<_, Smartphone>(&sql)
                .bind(&slug).bind(r.category_id).bind(&r.title).bind(&image).bind(&r.description)
                .bind(r.price).bind(&r.diagonal).bind(&r.display_type).bind(&r.resolution)
                .bind(&r.ram).bind(r.have_sd).bind(&r.sd_volume_max).bind(&r.accum_volume)
                .bind(&r.main_cam).bind(&r.frontal_cam)
                .fetch_optional(&s.db).await?.map(ProductVariant::Smartphone)
        }
    };
    product.map(Json).ok_or(StoreError::NotFound)
}

async fn delete_product(State(s): State<AppState>, Path((kind, slug)): Path<(String, String)>) -> Result<StatusCode, StoreError> {
    let kind: ProductKind = kind.parse()?;
    let result = sqlx::query(&format!("DELETE FROM {} WHERE slug = $1", kind.table())).bind(&slug).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(StoreError::NotFound);
    }
    tracing::info!(kind = %kind, slug = %slug, "product deleted");
    Ok(StatusCode::NO_CONTENT)
}

async fn product_image(State(s): State<AppState>, Path((kind, slug)): Path<(String, String)>) -> Result<impl IntoResponse, StoreError> {
    let kind: ProductKind = kind.parse()?;
    let row: Option<(Vec<u8>,)> = sqlx::query_as(&format!("SELECT image FROM {} WHERE slug = $1", kind.table()))
        .bind(&slug).fetch_optional(&s.db).await?;
    let (blob,) = row.ok_or(StoreError::NotFound)?;
    let mime = image::guess_format(&blob).map(|f| f.to_mime_type()).unwrap_or("application/octet-stream");
    Ok(([(header::CONTENT_TYPE, mime)], blob))
}

// ---------------------------------------------------------------------------
// Customers

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Customer { pub id: Uuid, pub account_id: Uuid, pub phone: String, pub address: String }

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCustomerRequest {
    pub account_id: Uuid,
    #[validate(length(min = 1, max = 20))]
    pub phone: String,
    #[validate(length(min = 1, max = 255))]
    pub address: String,
}

async fn create_customer(State(s): State<AppState>, Json(r): Json<CreateCustomerRequest>) -> Result<(StatusCode, Json<Customer>), StoreError> {
    r.validate().map_err(|e| StoreError::BadRequest(e.to_string()))?;
    let c = sqlx::query_as::<_, Customer>("INSERT INTO customers (id, account_id, phone, address) VALUES ($1, $2, $3, $4) RETURNING id, account_id, phone, address")
        .bind(Uuid::now_v7()).bind(r.account_id).bind(&r.phone).bind(&r.address)
        .fetch_one(&s.db).await?;
    Ok((StatusCode::CREATED, Json(c)))
}

async fn get_customer(State(s): State<AppState>, Path(id): Path<Uuid>) -> Result<Json<Customer>, StoreError> {
    sqlx::query_as::<_, Customer>("SELECT id, account_id, phone, address FROM customers WHERE id = $1")
        .bind(id).fetch_optional(&s.db).await?.map(Json).ok_or(StoreError::NotFound)
}

// ---------------------------------------------------------------------------
// Carts

#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
pub struct Cart { pub id: Uuid, pub owner_id: Uuid, pub total_products: i32, pub final_price: Decimal }

#[derive(Debug, Serialize)]
pub struct CartItemView {
    pub id: Uuid, pub kind: ProductKind, pub product_id: Uuid,
    pub title: String, pub quantity: i32, pub total_price: Decimal,
}

#[derive(Debug, Serialize)]
pub struct CartView {
    pub id: Uuid, pub owner_id: Uuid, pub items: Vec<CartItemView>,
    pub total_products: i32, pub final_price: Decimal,
}

async fn get_or_create_cart(db: &PgPool, customer_id: Uuid) -> Result<Cart, StoreError> {
    let customer: Option<(Uuid,)> = sqlx::query_as("SELECT id FROM customers WHERE id = $1").bind(customer_id).fetch_optional(db).await?;
    customer.ok_or(StoreError::NotFound)?;
    if let Some(cart) = sqlx::query_as::<_, Cart>("SELECT id, owner_id, total_products, final_price FROM carts WHERE owner_id = $1")
        .bind(customer_id).fetch_optional(db).await?
    {
        return Ok(cart);
    }
    let cart = sqlx::query_as::<_, Cart>("INSERT INTO carts (id, owner_id) VALUES ($1, $2) ON CONFLICT (owner_id) DO UPDATE SET owner_id = EXCLUDED.owner_id RETURNING id, owner_id, total_products, final_price")
        .bind(Uuid::now_v7()).bind(customer_id).fetch_one(db).await?;
    Ok(cart)
}

async fn load_lines(db: &PgPool, cart_id: Uuid) -> Result<Vec<CartLine>, StoreError> {
    let sql = format!("SELECT {CART_LINE_COLS} FROM cart_products WHERE cart_id = $1 ORDER BY id");
    Ok(sqlx::query_as(&sql).bind(cart_id).fetch_all(db).await?)
}

/// Recomputes the cart's cached aggregates from its lines. Called by every
/// mutating cart handler in the same request, so the stored totals are never
/// left stale behind a line change.
async fn recompute_cart(db: &PgPool, cart_id: Uuid) -> Result<CartTotals, StoreError> {
    let lines = load_lines(db, cart_id).await?;
    let totals = CartTotals::compute(&lines);
    sqlx::query("UPDATE carts SET total_products = $2, final_price = $3 WHERE id = $1")
        .bind(cart_id).bind(totals.total_products).bind(totals.final_price).execute(db).await?;
    Ok(totals)
}

async fn get_cart(State(s): State<AppState>, Path(customer_id): Path<Uuid>) -> Result<Json<CartView>, StoreError> {
    let cart = get_or_create_cart(&s.db, customer_id).await?;
    let lines = load_lines(&s.db, cart.id).await?;
    let mut items = Vec::with_capacity(lines.len());
    for line in lines {
        let kind: ProductKind = line.kind.parse()?;
        let product = resolve_variant(&s.db, kind, line.product_id).await?;
        items.push(CartItemView {
            id: line.id, kind, product_id: line.product_id,
            title: product.title().to_string(), quantity: line.quantity, total_price: line.total_price,
        });
    }
    Ok(Json(CartView { id: cart.id, owner_id: cart.owner_id, items, total_products: cart.total_products, final_price: cart.final_price }))
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest { pub kind: String, pub product_id: Uuid, pub quantity: u32 }

async fn add_cart_item(State(s): State<AppState>, Path(customer_id): Path<Uuid>, Json(r): Json<AddCartItemRequest>) -> Result<(StatusCode, Json<CartLine>), StoreError> {
    let kind: ProductKind = r.kind.parse()?;
    let quantity = Quantity::new(r.quantity)?;
    let product = resolve_variant(&s.db, kind, r.product_id).await?;
    let cart = get_or_create_cart(&s.db, customer_id).await?;
    let total = line_total(product.price(), quantity.value());
    let sql = format!(
        "INSERT INTO cart_products (id, owner_id, cart_id, kind, product_id, quantity, total_price) VALUES ($1, $2, $3, $4, $5, $6, $7) \
         ON CONFLICT (cart_id, kind, product_id) DO UPDATE SET quantity = cart_products.quantity + EXCLUDED.quantity, total_price = $8 * (cart_products.quantity + EXCLUDED.quantity) \
         RETURNING {CART_LINE_COLS}"
    );
    let line: CartLine = sqlx::query_as(&sql)
        .bind(Uuid::now_v7()).bind(customer_id).bind(cart.id).bind(kind.as_str()).bind(product.id())
        .bind(quantity.value() as i32).bind(total).bind(product.price())
        .fetch_one(&s.db).await?;
    recompute_cart(&s.db, cart.id).await?;
    Ok((StatusCode::CREATED, Json(line)))
}

#[derive(Debug, Deserialize)]
pub struct UpdateCartItemRequest { pub quantity: u32 }

async fn update_cart_item(State(s): State<AppState>, Path((customer_id, item_id)): Path<(Uuid, Uuid)>, Json(r): Json<UpdateCartItemRequest>) -> Result<Json<CartLine>, StoreError> {
    let quantity = Quantity::new(r.quantity)?;
    let cart = get_or_create_cart(&s.db, customer_id).await?;
    let sql = format!("SELECT {CART_LINE_COLS} FROM cart_products WHERE id = $1 AND cart_id = $2");
    let existing: CartLine = sqlx::query_as(&sql).bind(item_id).bind(cart.id)
        .fetch_optional(&s.db).await?.ok_or(CartError::ItemNotFound)?;
    let kind: ProductKind = existing.kind.parse()?;
    let product = resolve_variant(&s.db, kind, existing.product_id).await?;
    let total = line_total(product.price(), quantity.value());
    let sql = format!("UPDATE cart_products SET quantity = $2, total_price = $3 WHERE id = $1 RETURNING {CART_LINE_COLS}");
    let line: CartLine = sqlx::query_as(&sql)
        .bind(item_id).bind(quantity.value() as i32).bind(total)
        .fetch_one(&s.db).await?;
    recompute_cart(&s.db, cart.id).await?;
    Ok(Json(line))
}

async fn remove_cart_item(State(s): State<AppState>, Path((customer_id, item_id)): Path<(Uuid, Uuid)>) -> Result<StatusCode, StoreError> {
    let cart = get_or_create_cart(&s.db, customer_id).await?;
    let result = sqlx::query("DELETE FROM cart_products WHERE id = $1 AND cart_id = $2").bind(item_id).bind(cart.id).execute(&s.db).await?;
    if result.rows_affected() == 0 {
        return Err(CartError::ItemNotFound.into());
    }
    recompute_cart(&s.db, cart.id).await?;
    Ok(StatusCode::NO_CONTENT)
}

async fn clear_cart(State(s): State<AppState>, Path(customer_id): Path<Uuid>) -> Result<StatusCode, StoreError> {
    let cart = get_or_create_cart(&s.db, customer_id).await?;
    sqlx::query("DELETE FROM cart_products WHERE cart_id = $1").bind(cart.id).execute(&s.db).await?;
    recompute_cart(&s.db, cart.id).await?;
    Ok(StatusCode::NO_CONTENT)
}
