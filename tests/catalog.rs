mod common;

use anyhow::Result;
use bookstore_api::services::{BookInput, BookPatch, OrderItemInput, ServiceError};
use bookstore_api::types::Pagination;

use common::{dec, seed_book, seed_category, seed_user, test_state, unique};

fn conflict_field(err: ServiceError) -> String {
    match err {
        ServiceError::Conflict { field, .. } => field,
        other => panic!("expected conflict, got {other:?}"),
    }
}

#[tokio::test]
async fn category_names_are_unique() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let name = unique("Fiction");
    let fiction = state.categories.create(&name).await?;

    let err = state.categories.create(&format!("  {name} ")).await.unwrap_err();
    assert_eq!(conflict_field(err), "name");

    let same = state.categories.update(fiction.id, &name).await?;
    assert_eq!(same.name, name);

    let other = state.categories.create(&unique("Poetry")).await?;
    let err = state.categories.update(other.id, &name).await.unwrap_err();
    assert_eq!(conflict_field(err), "name");
    Ok(())
}

#[tokio::test]
async fn missing_category_is_not_found() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let err = state.categories.update(i64::MAX, &unique("Ghost")).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");

    let taken = seed_category(&state).await?;
    let err = state.categories.update(i64::MAX, &taken.name).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
    let err = state.categories.delete(i64::MAX).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn category_with_books_cannot_be_deleted() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let category = seed_category(&state).await?;
    seed_book(&state, &category, "9.99").await?;

    let err = state.categories.delete(category.id).await.unwrap_err();
    assert_eq!(conflict_field(err), "category_id");
    Ok(())
}

#[tokio::test]
async fn paging_past_the_end_is_empty() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    seed_category(&state).await?;

    let first = state.categories.list(Pagination::new(Some(1), Some(1))).await?;
    assert_eq!(first.items.len(), 1);
    assert_eq!(first.total_pages, first.total_items);

    let beyond = state
        .categories
        .list(Pagination::new(Some(first.total_pages + 1_000_000), Some(1)))
        .await?;
    assert!(beyond.items.is_empty());
    assert!(beyond.total_items >= first.total_items);
    Ok(())
}

#[tokio::test]
async fn book_titles_are_unique_but_other_fields_are_not() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let category = seed_category(&state).await?;
    let book = seed_book(&state, &category, "30.00").await?;

    let err = state
        .books
        .create(
            BookInput {
                title: book.title.clone(),
                author: "Someone Else".to_string(),
                price: dec("1.00"),
                year: None,
                category_id: category.id,
            },
            Some(b"img".to_vec()),
        )
        .await
        .unwrap_err();
    assert_eq!(conflict_field(err), "title");

    // Same price, year and image as another book is fine.
    let twin = state
        .books
        .create(
            BookInput {
                title: unique("twin"),
                author: book.author.clone(),
                price: book.price,
                year: book.year,
                category_id: category.id,
            },
            Some(b"cover".to_vec()),
        )
        .await?;

    let updated = state
        .books
        .update(
            twin.id,
            BookPatch {
                title: Some(twin.title.clone()),
                price: Some(dec("31.00")),
                ..Default::default()
            },
            None,
        )
        .await?;
    assert_eq!(updated.price, dec("31.00"));
    assert_eq!(updated.image_base64, twin.image_base64);
    assert_eq!(updated.category_name, category.name);
    Ok(())
}

#[tokio::test]
async fn books_need_an_existing_category_and_an_image() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let input = BookInput {
        title: unique("orphan"),
        author: "Nobody".to_string(),
        price: dec("5.00"),
        year: None,
        category_id: i64::MAX,
    };

    match state.books.create(input.clone(), Some(b"x".to_vec())).await.unwrap_err() {
        ServiceError::Validation { field_errors, .. } => assert!(field_errors.contains_key("category_id")),
        other => panic!("unexpected error: {other:?}"),
    }

    let category = seed_category(&state).await?;
    let input = BookInput {
        category_id: category.id,
        ..input
    };
    match state.books.create(input, None).await.unwrap_err() {
        ServiceError::Validation { field_errors, .. } => assert!(field_errors.contains_key("image")),
        other => panic!("unexpected error: {other:?}"),
    }
    Ok(())
}

#[tokio::test]
async fn ordered_books_cannot_be_deleted() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let user = seed_user(&state).await?;
    let category = seed_category(&state).await?;
    let ordered = seed_book(&state, &category, "10.00").await?;
    let spare = seed_book(&state, &category, "10.00").await?;
    state
        .orders
        .create_order(user.id, &[OrderItemInput { book_id: ordered.id, quantity: 1 }])
        .await?;

    let err = state.books.delete(ordered.id).await.unwrap_err();
    assert_eq!(conflict_field(err), "book_id");

    state.books.delete(spare.id).await?;
    let err = state.books.get(spare.id).await.unwrap_err();
    assert!(matches!(err, ServiceError::NotFound(_)), "got {err:?}");
    Ok(())
}

#[tokio::test]
async fn price_stats_cover_the_catalog() -> Result<()> {
    let Some(state) = test_state().await? else { return Ok(()) };
    let category = seed_category(&state).await?;
    let cheap = seed_book(&state, &category, "0.50").await?;
    seed_book(&state, &category, "999.00").await?;

    let stats = state.books.price_stats().await?;
    assert!(stats.total_books >= 2);
    assert!(stats.min_price.unwrap() <= cheap.price);
    assert!(stats.max_price.unwrap() >= dec("999.00"));
    assert!(stats.avg_price.is_some());
    assert!(state.books.total().await? >= stats.total_books);
    Ok(())
}
