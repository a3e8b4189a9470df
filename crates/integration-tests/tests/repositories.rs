//! Storefront repositories against a migrated database.
//!
//! Requires `DATABASE_URL`; each test gets its own database from the sqlx
//! test harness.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use sqlx::PgPool;

use metra_core::cart::Cart;
use metra_core::search::tokenize;
use metra_core::{Email, ProductId, UserId};
use metra_integration_tests::{insert_category, insert_product, insert_user, migrate};
use metra_storefront::db::analytics::Counter;
use metra_storefront::db::orders::CheckoutError;
use metra_storefront::db::reviews::ReviewWrite;
use metra_storefront::db::{
    AnalyticsRepository, CatalogRepository, OrderRepository, ReviewRepository,
};
use metra_storefront::models::{OrderDetails, Product};

fn dollars(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

fn details() -> OrderDetails {
    OrderDetails {
        first_name: "Ada".to_string(),
        last_name: "Lovelace".to_string(),
        email: Email::parse("ada@example.com").unwrap(),
        address: "12 St James's Square".to_string(),
        shipping_address: "12 St James's Square".to_string(),
        postal_code: "SW1Y 4JH".to_string(),
        city: "London".to_string(),
    }
}

async fn search(pool: &PgPool, query: &str) -> Vec<String> {
    let products: Vec<Product> = CatalogRepository::new(pool)
        .search(&tokenize(query), 8)
        .await
        .unwrap();
    products.into_iter().map(|p| p.name).collect()
}

async fn average_rating(pool: &PgPool, id: ProductId) -> Decimal {
    CatalogRepository::new(pool)
        .get_by_id(id)
        .await
        .unwrap()
        .unwrap()
        .average_rating
}

async fn stock_of(pool: &PgPool, id: ProductId) -> i32 {
    sqlx::query_scalar("SELECT stock FROM store.product WHERE id = $1")
        .bind(id.as_i32())
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn orders_of(pool: &PgPool, user: UserId) -> i64 {
    sqlx::query_scalar("SELECT COUNT(*) FROM store.order WHERE user_id = $1")
        .bind(user.as_i32())
        .fetch_one(pool)
        .await
        .unwrap()
}

async fn counters(pool: &PgPool, id: ProductId) -> Vec<(i64, i64, i64)> {
    sqlx::query_as(
        "SELECT views, cart_additions, purchases FROM dashboard.product_analytics \
         WHERE product_id = $1 ORDER BY last_updated DESC",
    )
    .bind(id.as_i32())
    .fetch_all(pool)
    .await
    .unwrap()
}

// -----------------------------------------------------------------------------
// Checkout
// -----------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn place_order_writes_one_item_per_line_at_snapshot_price(pool: PgPool) {
    migrate(&pool).await;
    let kitchen = insert_category(&pool, "Kitchen").await;
    let teapot = insert_product(&pool, kitchen, "Teapot", "20.00", 5).await;
    let mug = insert_product(&pool, kitchen, "Mug", "7.50", 3).await;
    let ada = insert_user(&pool, "ada").await;

    let mut cart = Cart::new();
    cart.add(teapot, dollars(2_000), 1, 5).unwrap();
    cart.add(mug, dollars(750), 1, 3).unwrap();
    cart.add(teapot, dollars(2_000), 1, 5).unwrap();

    // The catalog price moves after the teapot went into the cart.
    sqlx::query("UPDATE store.product SET price = 25.00 WHERE id = $1")
        .bind(teapot.as_i32())
        .execute(&pool)
        .await
        .unwrap();

    let orders = OrderRepository::new(&pool);
    let order_id = orders.place_order(ada, &details(), &cart).await.unwrap();

    assert_eq!(orders_of(&pool, ada).await, 1);
    let lines: Vec<(String, Decimal, i32)> = orders
        .lines(order_id)
        .await
        .unwrap()
        .into_iter()
        .map(|line| (line.product_name, line.price, line.quantity))
        .collect();
    assert_eq!(
        lines,
        [
            ("Teapot".to_string(), dollars(2_000), 2),
            ("Mug".to_string(), dollars(750), 1),
        ]
    );

    let order = orders.get_for_user(order_id, ada).await.unwrap().unwrap();
    // 47.50 + 5.00 shipping + 3.56 tax
    assert_eq!(order.total_amount, dollars(5_606));
    assert!(!order.paid);

    assert_eq!(stock_of(&pool, teapot).await, 3);
    assert_eq!(stock_of(&pool, mug).await, 2);
    assert_eq!(counters(&pool, teapot).await, [(0, 0, 1)]);
    assert_eq!(counters(&pool, mug).await, [(0, 0, 1)]);
}

#[sqlx::test(migrations = false)]
async fn place_order_rolls_back_when_stock_runs_short(pool: PgPool) {
    migrate(&pool).await;
    let kitchen = insert_category(&pool, "Kitchen").await;
    let teapot = insert_product(&pool, kitchen, "Teapot", "20.00", 5).await;
    let mug = insert_product(&pool, kitchen, "Mug", "7.50", 1).await;
    let ada = insert_user(&pool, "ada").await;

    // Stock was higher when the mugs went into the cart.
    let mut cart = Cart::new();
    cart.add(teapot, dollars(2_000), 2, 5).unwrap();
    cart.add(mug, dollars(750), 2, 10).unwrap();

    let err = OrderRepository::new(&pool)
        .place_order(ada, &details(), &cart)
        .await
        .unwrap_err();
    assert!(
        matches!(&err, CheckoutError::InsufficientStock(name) if name == "Mug"),
        "{err:?}"
    );

    assert_eq!(orders_of(&pool, ada).await, 0);
    assert_eq!(stock_of(&pool, teapot).await, 5);
    assert_eq!(stock_of(&pool, mug).await, 1);
    assert!(counters(&pool, teapot).await.is_empty());
}

#[sqlx::test(migrations = false)]
async fn place_order_rejects_deleted_and_unavailable_products(pool: PgPool) {
    migrate(&pool).await;
    let kitchen = insert_category(&pool, "Kitchen").await;
    let teapot = insert_product(&pool, kitchen, "Teapot", "20.00", 5).await;
    let vase = insert_product(&pool, kitchen, "Vase", "99.99", 5).await;
    let ada = insert_user(&pool, "ada").await;
    let orders = OrderRepository::new(&pool);

    let mut cart = Cart::new();
    cart.add(vase, dollars(9_999), 1, 5).unwrap();
    sqlx::query("DELETE FROM store.product WHERE id = $1")
        .bind(vase.as_i32())
        .execute(&pool)
        .await
        .unwrap();
    let err = orders.place_order(ada, &details(), &cart).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Unavailable), "{err:?}");

    let mut cart = Cart::new();
    cart.add(teapot, dollars(2_000), 1, 5).unwrap();
    sqlx::query("UPDATE store.product SET available = FALSE WHERE id = $1")
        .bind(teapot.as_i32())
        .execute(&pool)
        .await
        .unwrap();
    let err = orders.place_order(ada, &details(), &cart).await.unwrap_err();
    assert!(matches!(err, CheckoutError::Unavailable), "{err:?}");

    assert_eq!(orders_of(&pool, ada).await, 0);
    assert_eq!(stock_of(&pool, teapot).await, 5);
}

// -----------------------------------------------------------------------------
// Catalog
// -----------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn search_matches_every_token_across_fields(pool: PgPool) {
    migrate(&pool).await;
    let apparel = insert_category(&pool, "Apparel").await;
    let kitchen = insert_category(&pool, "Kitchen").await;
    insert_product(&pool, apparel, "Wool Socks", "12.00", 10).await;
    insert_product(&pool, apparel, "Cotton Socks", "8.00", 10).await;
    let teapot = insert_product(&pool, kitchen, "Teapot", "20.00", 5).await;
    let hat = insert_product(&pool, apparel, "Wool Hat", "15.00", 5).await;

    sqlx::query("UPDATE store.product SET description = 'Cast iron teapot' WHERE id = $1")
        .bind(teapot.as_i32())
        .execute(&pool)
        .await
        .unwrap();
    sqlx::query("UPDATE store.product SET available = FALSE WHERE id = $1")
        .bind(hat.as_i32())
        .execute(&pool)
        .await
        .unwrap();

    assert_eq!(search(&pool, "wool").await, ["Wool Socks"]);
    assert_eq!(search(&pool, "SOCKS").await, ["Cotton Socks", "Wool Socks"]);
    assert_eq!(search(&pool, "socks wool").await, ["Wool Socks"]);
    assert_eq!(search(&pool, "iron").await, ["Teapot"]);
    assert_eq!(search(&pool, "kitchen").await, ["Teapot"]);
    assert!(search(&pool, "zebra").await.is_empty());
    assert!(search(&pool, "wool teapot").await.is_empty());
}

#[sqlx::test(migrations = false)]
async fn search_treats_like_wildcards_literally(pool: PgPool) {
    migrate(&pool).await;
    let kitchen = insert_category(&pool, "Kitchen").await;
    insert_product(&pool, kitchen, "Teapot", "20.00", 5).await;

    let catalog = CatalogRepository::new(&pool);
    let found = catalog.search(&["t_apot".to_string()], 8).await.unwrap();
    assert!(found.is_empty());
}

#[sqlx::test(migrations = false)]
async fn get_available_by_id_skips_unavailable_products(pool: PgPool) {
    migrate(&pool).await;
    let kitchen = insert_category(&pool, "Kitchen").await;
    let teapot = insert_product(&pool, kitchen, "Teapot", "20.00", 5).await;
    let catalog = CatalogRepository::new(&pool);

    assert!(catalog.get_available_by_id(teapot).await.unwrap().is_some());

    sqlx::query("UPDATE store.product SET available = FALSE WHERE id = $1")
        .bind(teapot.as_i32())
        .execute(&pool)
        .await
        .unwrap();
    assert!(catalog.get_available_by_id(teapot).await.unwrap().is_none());
    assert!(catalog.get_by_id(teapot).await.unwrap().is_some());
}

// -----------------------------------------------------------------------------
// Reviews
// -----------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn review_upsert_recomputes_average(pool: PgPool) {
    migrate(&pool).await;
    let kitchen = insert_category(&pool, "Kitchen").await;
    let teapot = insert_product(&pool, kitchen, "Teapot", "20.00", 5).await;
    let ada = insert_user(&pool, "ada").await;
    let bob = insert_user(&pool, "bob").await;

    let reviews = ReviewRepository::new(&pool);

    assert_eq!(
        reviews.upsert(teapot, ada, 5, "Lovely pour").await.unwrap(),
        ReviewWrite::Created
    );
    assert_eq!(
        reviews.upsert(teapot, bob, 2, "Lid rattles").await.unwrap(),
        ReviewWrite::Created
    );
    assert_eq!(average_rating(&pool, teapot).await, dollars(350));

    assert_eq!(
        reviews.upsert(teapot, bob, 4, "Lid fixed").await.unwrap(),
        ReviewWrite::Updated
    );
    assert_eq!(average_rating(&pool, teapot).await, dollars(450));

    let listed = reviews.list_for_product(teapot).await.unwrap();
    assert_eq!(listed.len(), 2);
    let bobs = listed.iter().find(|r| r.username == "bob").unwrap();
    assert_eq!((bobs.rating, bobs.comment.as_str()), (4, "Lid fixed"));
}

// -----------------------------------------------------------------------------
// Analytics counters
// -----------------------------------------------------------------------------

#[sqlx::test(migrations = false)]
async fn analytics_counters_bump_the_newest_row(pool: PgPool) {
    migrate(&pool).await;
    let kitchen = insert_category(&pool, "Kitchen").await;
    let teapot = insert_product(&pool, kitchen, "Teapot", "20.00", 5).await;
    let analytics = AnalyticsRepository::new(&pool);

    // No row yet: the first event creates one.
    analytics.record(teapot, Counter::View).await;
    assert_eq!(counters(&pool, teapot).await, [(1, 0, 0)]);

    sqlx::query(
        "INSERT INTO dashboard.product_analytics (product_id, views, last_updated) \
         VALUES ($1, 100, NOW() - INTERVAL '1 day')",
    )
    .bind(teapot.as_i32())
    .execute(&pool)
    .await
    .unwrap();

    analytics.record(teapot, Counter::View).await;
    analytics.record(teapot, Counter::CartAddition).await;
    analytics.record(teapot, Counter::CartAddition).await;

    assert_eq!(counters(&pool, teapot).await, [(2, 2, 0), (100, 0, 0)]);
}
