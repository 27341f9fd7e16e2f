mod common;

use anyhow::Result;
use bookstore_api::config::OrderConfig;
use bookstore_api::database::models::OrderStatus;
use bookstore_api::services::{BookPatch, OrderItemInput, OrderSweeper, ServiceError};

use common::{backdate_order, count_orders, dec, seed_book, seed_category, seed_user, test_state};

fn item(book_id: i64, quantity: i32) -> OrderItemInput {
    OrderItemInput { book_id, quantity }
}

#[tokio::test]
async fn total_is_snapshotted_at_creation() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let user = seed_user(&state).await?;
    let category = seed_category(&state).await?;
    let dune = seed_book(&state, &category, "50.00").await?;
    let emma = seed_book(&state, &category, "12.25").await?;

    let created = state
        .orders
        .create_order(user.id, &[item(dune.id, 2), item(emma.id, 3)])
        .await?;
    assert_eq!(created.order.total_price, dec("136.75"));
    assert_eq!(created.order.status, OrderStatus::Pending);
    assert_eq!(created.lines.len(), 2);

    state
        .books
        .update(
            dune.id,
            BookPatch {
                price: Some(dec("80.00")),
                ..Default::default()
            },
            None,
        )
        .await?;

    let orders = state.orders.list_orders_by_user(user.id).await?;
    assert_eq!(orders.len(), 1);
    assert_eq!(orders[0].order.total_price, dec("136.75"));
    let dune_line = orders[0].lines.iter().find(|l| l.book_id == dune.id).unwrap();
    assert_eq!(dune_line.unit_price, dec("50.00"));
    assert_eq!(dune_line.sub_total, dec("100.00"));
    Ok(())
}

#[tokio::test]
async fn over_quantity_persists_nothing() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let user = seed_user(&state).await?;
    let category = seed_category(&state).await?;
    let book = seed_book(&state, &category, "10.00").await?;
    let other = seed_book(&state, &category, "10.00").await?;

    let err = state
        .orders
        .create_order(user.id, &[item(book.id, 3), item(other.id, 3)])
        .await
        .unwrap_err();
    assert!(matches!(err, ServiceError::Validation { .. }), "got {err:?}");
    assert_eq!(count_orders(&state.pool, user.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn missing_book_rolls_back_everything() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let user = seed_user(&state).await?;
    let category = seed_category(&state).await?;
    let book = seed_book(&state, &category, "10.00").await?;

    let err = state
        .orders
        .create_order(user.id, &[item(book.id, 1), item(i64::MAX, 1)])
        .await
        .unwrap_err();
    match err {
        ServiceError::Validation { field_errors, .. } => {
            assert!(field_errors["book_id"].contains(&i64::MAX.to_string()));
        }
        other => panic!("unexpected error: {other:?}"),
    }
    assert_eq!(count_orders(&state.pool, user.id).await?, 0);
    Ok(())
}

#[tokio::test]
async fn paying_twice_succeeds_once() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let user = seed_user(&state).await?;
    let category = seed_category(&state).await?;
    let book = seed_book(&state, &category, "20.00").await?;
    let order = state.orders.create_order(user.id, &[item(book.id, 1)]).await?;

    let paid = state.orders.pay_order(order.order.id, user.id).await?;
    assert_eq!(paid.order.status, OrderStatus::Paid);

    let again = state.orders.pay_order(order.order.id, user.id).await.unwrap_err();
    assert!(matches!(again, ServiceError::OrderNotPayable(OrderStatus::Paid)), "got {again:?}");

    let orders = state.orders.list_orders_by_user(user.id).await?;
    assert_eq!(orders[0].order.status, OrderStatus::Paid);
    Ok(())
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_payments_succeed_once() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let user = seed_user(&state).await?;
    let category = seed_category(&state).await?;
    let book = seed_book(&state, &category, "20.00").await?;
    let user_id = user.id;

    for _ in 0..5 {
        let order = state.orders.create_order(user_id, &[item(book.id, 1)]).await?;
        let order_id = order.order.id;

        let first = tokio::spawn({
            let orders = state.orders.clone();
            async move { orders.pay_order(order_id, user_id).await }
        });
        let second = tokio::spawn({
            let orders = state.orders.clone();
            async move { orders.pay_order(order_id, user_id).await }
        });
        let results = [first.await?, second.await?];

        let paid = results.iter().filter(|r| r.is_ok()).count();
        assert_eq!(paid, 1, "results: {results:?}");
        for err in results.iter().filter_map(|r| r.as_ref().err()) {
            assert!(
                matches!(err, ServiceError::OrderNotPayable(OrderStatus::Paid) | ServiceError::NotFound(_)),
                "got {err:?}"
            );
        }
    }
    Ok(())
}

#[tokio::test]
async fn strangers_cannot_pay() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let owner = seed_user(&state).await?;
    let stranger = seed_user(&state).await?;
    let category = seed_category(&state).await?;
    let book = seed_book(&state, &category, "20.00").await?;
    let order = state.orders.create_order(owner.id, &[item(book.id, 1)]).await?;

    let err = state.orders.pay_order(order.order.id, stranger.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::Forbidden(_)), "got {err:?}");

    let orders = state.orders.list_orders_by_user(owner.id).await?;
    assert_eq!(orders[0].order.status, OrderStatus::Pending);
    Ok(())
}

#[tokio::test]
async fn unknown_order_is_not_found() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let user = seed_user(&state).await?;
    let err = state.orders.pay_order(i64::MAX, user.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn sweep_cancels_stale_orders_but_keeps_paid_ones() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let user = seed_user(&state).await?;
    let category = seed_category(&state).await?;
    let book = seed_book(&state, &category, "15.00").await?;

    let stale = state.orders.create_order(user.id, &[item(book.id, 1)]).await?;
    let paid = state.orders.create_order(user.id, &[item(book.id, 2)]).await?;
    let fresh = state.orders.create_order(user.id, &[item(book.id, 1)]).await?;
    backdate_order(&state.pool, stale.order.id, 16).await?;
    backdate_order(&state.pool, paid.order.id, 20).await?;
    state.orders.pay_order(paid.order.id, user.id).await?;

    let sweeper = OrderSweeper::new(state.pool.clone(), &OrderConfig::default());
    let cancelled = sweeper.sweep_once().await?;
    assert!(cancelled >= 1);

    let orders = state.orders.list_orders_by_user(user.id).await?;
    let status_of = |id: i64| orders.iter().find(|o| o.order.id == id).unwrap().order.status;
    assert_eq!(status_of(stale.order.id), OrderStatus::Cancelled);
    assert_eq!(status_of(paid.order.id), OrderStatus::Paid);
    assert_eq!(status_of(fresh.order.id), OrderStatus::Pending);

    let late = state.orders.pay_order(stale.order.id, user.id).await.unwrap_err();
    assert!(matches!(late, ServiceError::OrderNotPayable(OrderStatus::Cancelled)), "got {late:?}");
    Ok(())
}

#[tokio::test]
async fn duplicate_lines_are_merged() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let user = seed_user(&state).await?;
    let category = seed_category(&state).await?;
    let book = seed_book(&state, &category, "7.50").await?;

    let created = state
        .orders
        .create_order(user.id, &[item(book.id, 1), item(book.id, 2)])
        .await?;
    assert_eq!(created.lines.len(), 1);
    assert_eq!(created.lines[0].quantity, 3);
    assert_eq!(created.order.total_price, dec("22.50"));
    Ok(())
}
