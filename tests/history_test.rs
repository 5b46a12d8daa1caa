mod common;

use anyhow::Result;
use common::{breakdown_for, test_service, DinnerTable};
use conto::application::AppError;
use uuid::Uuid;

#[tokio::test]
async fn test_save_and_list_history() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;
    service.set_tax_rate(0.10).await?;
    service.set_tip_rate(0.20).await?;

    let saved = service.save_bill(Some("Dinner at Luigi's".to_string())).await?;
    assert_eq!(saved.total_cents, 2600);
    assert_eq!(saved.label.as_deref(), Some("Dinner at Luigi's"));

    let entries = service.history().await?;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].id, saved.id);
    assert_eq!(entries[0].total_cents, 2600);

    Ok(())
}

#[tokio::test]
async fn test_history_lists_newest_first() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;

    let first = service.save_bill(Some("first".to_string())).await?;
    let second = service.save_bill(Some("second".to_string())).await?;

    let entries = service.history().await?;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].id, second.id);
    assert_eq!(entries[1].id, first.id);

    Ok(())
}

#[tokio::test]
async fn test_replay_reproduces_summary_after_reset() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;
    service.set_tax_rate(0.10).await?;
    service.set_tip_rate(0.20).await?;
    let live_summary = service.summary().await?;

    let saved = service.save_bill(None).await?;
    service.reset().await?;

    // The current bill is gone, but the snapshot replays identically
    let (restored, replayed) = service.replay(saved.id).await?;
    assert_eq!(restored.bill.people.len(), 2);
    assert_eq!(replayed, live_summary);
    assert_eq!(breakdown_for(&replayed, "Alice").total, 1560);

    Ok(())
}

#[tokio::test]
async fn test_delete_saved_bill() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;
    let saved = service.save_bill(None).await?;

    service.delete_saved(saved.id).await?;
    assert!(service.history().await?.is_empty());

    let result = service.delete_saved(saved.id).await;
    assert!(matches!(result, Err(AppError::SavedBillNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_unknown_saved_bill() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let result = service.saved_bill(Uuid::new_v4()).await;
    assert!(matches!(result, Err(AppError::SavedBillNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_clear_history() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;
    service.save_bill(None).await?;
    service.save_bill(None).await?;

    let removed = service.clear_history().await?;
    assert_eq!(removed, 2);
    assert!(service.history().await?.is_empty());

    Ok(())
}

#[tokio::test]
async fn test_corrupt_snapshot_is_rejected() -> Result<()> {
    let (service, temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;
    let saved = service.save_bill(None).await?;

    // Vandalize the stored snapshot behind the service's back
    let db_path = temp.path().join("test.db");
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}", db_path.display())).await?;
    sqlx::query("UPDATE saved_bills SET snapshot = '{\"people\": 42}'")
        .execute(&pool)
        .await?;

    let result = service.saved_bill(saved.id).await;
    assert!(matches!(result, Err(AppError::InvalidSnapshot(_))));

    // The listing still works: it never touches the payload
    assert_eq!(service.history().await?.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_invalid_stored_bill_falls_back_to_default() -> Result<()> {
    let (service, temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;

    // Break the shape invariant directly in storage
    let db_path = temp.path().join("test.db");
    let pool = sqlx::SqlitePool::connect(&format!("sqlite:{}", db_path.display())).await?;
    sqlx::query("UPDATE items SET price_cents = -500 WHERE name = 'Burger'")
        .execute(&pool)
        .await?;

    // The invalid state is replaced with an empty bill instead of reaching
    // the calculation core
    let bill = service.bill().await?;
    assert!(bill.people.is_empty());
    assert!(bill.items.is_empty());

    let summary = service.summary().await?;
    assert_eq!(summary.grand_total, 0);

    Ok(())
}
