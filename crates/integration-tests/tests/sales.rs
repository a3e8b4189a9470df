//! Sales aggregation over a migrated database.

#![allow(clippy::unwrap_used)]

use rust_decimal::Decimal;
use sqlx::PgPool;

use metra_admin::db::SalesRepository;
use metra_admin::models::TopProduct;
use metra_core::{ProductId, UserId};
use metra_integration_tests::{insert_category, insert_product, insert_user, migrate};

fn dollars(cents: i64) -> Decimal {
    Decimal::new(cents, 2)
}

/// Insert an order placed `days_ago` with `(product, unit price, quantity)` lines.
async fn insert_order(
    pool: &PgPool,
    user: UserId,
    paid: bool,
    days_ago: i32,
    lines: &[(ProductId, &str, i32)],
) {
    let order_id: i32 = sqlx::query_scalar(
        "INSERT INTO store.order (user_id, paid, created_at) \
         VALUES ($1, $2, NOW() - make_interval(days => $3)) RETURNING id",
    )
    .bind(user.as_i32())
    .bind(paid)
    .bind(days_ago)
    .fetch_one(pool)
    .await
    .unwrap();

    for &(product, price, quantity) in lines {
        sqlx::query(
            "INSERT INTO store.order_item (order_id, product_id, price, quantity) \
             VALUES ($1, $2, $3::numeric, $4)",
        )
        .bind(order_id)
        .bind(product.as_i32())
        .bind(price)
        .bind(quantity)
        .execute(pool)
        .await
        .unwrap();
    }
}

#[sqlx::test(migrations = false)]
async fn report_sums_paid_orders_inside_the_window(pool: PgPool) {
    migrate(&pool).await;
    let kitchen = insert_category(&pool, "Kitchen").await;
    let apparel = insert_category(&pool, "Apparel").await;
    insert_category(&pool, "Garden").await;
    let teapot = insert_product(&pool, kitchen, "Teapot", "20.00", 50).await;
    let socks = insert_product(&pool, apparel, "Socks", "5.00", 50).await;
    let ada = insert_user(&pool, "ada").await;

    insert_order(&pool, ada, true, 2, &[(teapot, "20.00", 2), (socks, "5.00", 1)]).await;
    insert_order(&pool, ada, true, 10, &[(socks, "5.00", 3)]).await;
    // Unpaid, then too old: neither counts.
    insert_order(&pool, ada, false, 1, &[(teapot, "20.00", 1)]).await;
    insert_order(&pool, ada, true, 40, &[(teapot, "20.00", 5)]).await;

    let report = SalesRepository::new(&pool).report(30).await.unwrap();

    assert_eq!(report.period, "Last 30 days");
    assert_eq!(report.total_sales, dollars(6_000));
    assert_eq!(report.orders_count, 2);
    assert_eq!(report.average_order_value, dollars(3_000));
    assert_eq!(
        report.sales_by_category.into_iter().collect::<Vec<_>>(),
        [
            ("Apparel".to_string(), dollars(2_000)),
            ("Garden".to_string(), Decimal::ZERO),
            ("Kitchen".to_string(), dollars(4_000)),
        ]
    );
    assert_eq!(
        report.top_products,
        [
            TopProduct {
                name: "Teapot".to_string(),
                sales: 1,
                revenue: dollars(4_000),
            },
            TopProduct {
                name: "Socks".to_string(),
                sales: 2,
                revenue: dollars(2_000),
            },
        ]
    );

    let week = SalesRepository::new(&pool).report(7).await.unwrap();
    assert_eq!(week.total_sales, dollars(4_500));
    assert_eq!(week.orders_count, 1);
    assert_eq!(week.sales_by_category["Apparel"], dollars(500));
}

#[sqlx::test(migrations = false)]
async fn report_for_an_empty_window_is_all_zeroes(pool: PgPool) {
    migrate(&pool).await;
    insert_category(&pool, "Kitchen").await;

    let report = SalesRepository::new(&pool).report(1).await.unwrap();

    assert_eq!(report.period, "Last 1 days");
    assert_eq!(report.total_sales, Decimal::ZERO);
    assert_eq!(report.orders_count, 0);
    assert_eq!(report.average_order_value, Decimal::ZERO);
    assert_eq!(report.sales_by_category["Kitchen"], Decimal::ZERO);
    assert!(report.top_products.is_empty());
}
