mod common;

use anyhow::Result;
use common::{test_service, DinnerTable};
use conto::application::AppError;

#[tokio::test]
async fn test_add_and_list_people() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.add_person("Alice").await?;
    service.add_person("Bob").await?;

    let people = service.list_people().await?;
    let names: Vec<&str> = people.iter().map(|p| p.name.as_str()).collect();
    assert_eq!(names, vec!["Alice", "Bob"]);

    Ok(())
}

#[tokio::test]
async fn test_person_name_is_trimmed_and_required() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let person = service.add_person("  Alice  ").await?;
    assert_eq!(person.name, "Alice");

    let result = service.add_person("   ").await;
    assert!(matches!(result, Err(AppError::EmptyName)));

    Ok(())
}

#[tokio::test]
async fn test_duplicate_person_rejected() -> Result<()> {
    let (service, _temp) = test_service().await?;

    service.add_person("Alice").await?;
    let result = service.add_person("Alice").await;
    assert!(matches!(result, Err(AppError::PersonAlreadyExists(_))));

    Ok(())
}

#[tokio::test]
async fn test_add_item_validates_price() -> Result<()> {
    let (service, _temp) = test_service().await?;

    let item = service.add_item("Burger", 1200).await?;
    assert_eq!(item.price_cents, 1200);

    let result = service.add_item("Impossible", -1).await;
    assert!(matches!(result, Err(AppError::InvalidAmount(_))));

    Ok(())
}

#[tokio::test]
async fn test_assign_requires_known_names() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.add_person("Alice").await?;
    service.add_item("Burger", 1200).await?;

    let result = service
        .assign_item("Burger", &["Mallory".to_string()])
        .await;
    assert!(matches!(result, Err(AppError::PersonNotFound(_))));

    let result = service.assign_item("Pizza", &["Alice".to_string()]).await;
    assert!(matches!(result, Err(AppError::ItemNotFound(_))));

    Ok(())
}

#[tokio::test]
async fn test_assign_rejects_duplicate_person() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.add_person("Alice").await?;
    service.add_item("Burger", 1200).await?;

    let result = service
        .assign_item("Burger", &["Alice".to_string(), "Alice".to_string()])
        .await;
    assert!(matches!(result, Err(AppError::DuplicateAssignee { .. })));

    Ok(())
}

#[tokio::test]
async fn test_assignment_preserves_order() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::shared_platter(&service).await?;

    let bill = service.bill().await?;
    let item = bill.item_by_name("Platter").unwrap();
    let assignment = bill.assignments.get(&item.id).unwrap();

    let ordered_names: Vec<&str> = assignment
        .person_ids
        .iter()
        .map(|id| bill.person(*id).unwrap().name.as_str())
        .collect();
    assert_eq!(ordered_names, vec!["Carol", "Alice", "Bob"]);

    Ok(())
}

#[tokio::test]
async fn test_remove_person_scrubs_assignments() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::shared_platter(&service).await?;

    service.remove_person("Carol").await?;

    let bill = service.bill().await?;
    let item = bill.item_by_name("Platter").unwrap();
    let assignment = bill.assignments.get(&item.id).unwrap();
    let names: Vec<&str> = assignment
        .person_ids
        .iter()
        .map(|id| bill.person(*id).unwrap().name.as_str())
        .collect();
    assert_eq!(names, vec!["Alice", "Bob"]);

    Ok(())
}

#[tokio::test]
async fn test_removing_last_assignee_drops_assignment() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.add_person("Alice").await?;
    service.add_item("Burger", 1200).await?;
    service
        .assign_item("Burger", &["Alice".to_string()])
        .await?;

    service.remove_person("Alice").await?;

    let bill = service.bill().await?;
    assert!(bill.assignments.is_empty());
    assert_eq!(bill.items.len(), 1);

    Ok(())
}

#[tokio::test]
async fn test_remove_item_drops_assignment() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;

    service.remove_item("Burger").await?;

    let bill = service.bill().await?;
    assert_eq!(bill.items.len(), 1);
    assert_eq!(bill.assignments.len(), 1);
    assert!(bill.item_by_name("Burger").is_none());

    Ok(())
}

#[tokio::test]
async fn test_unassign_item() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;

    service.unassign_item("Burger").await?;

    let bill = service.bill().await?;
    assert_eq!(bill.assignments.len(), 1);
    // The item itself stays on the bill
    assert!(bill.item_by_name("Burger").is_some());

    Ok(())
}

#[tokio::test]
async fn test_custom_split_happy_path() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.add_person("Alice").await?;
    service.add_person("Bob").await?;
    service.add_item("Steak", 1000).await?;
    service
        .assign_item("Steak", &["Alice".to_string(), "Bob".to_string()])
        .await?;

    service
        .set_custom_split(
            "Steak",
            &[("Alice".to_string(), 600), ("Bob".to_string(), 400)],
        )
        .await?;

    let bill = service.bill().await?;
    let item = bill.item_by_name("Steak").unwrap();
    let split = bill.assignments[&item.id].custom_split.as_ref().unwrap();
    assert_eq!(split.len(), 2);

    Ok(())
}

#[tokio::test]
async fn test_custom_split_must_sum_to_price() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.add_person("Alice").await?;
    service.add_person("Bob").await?;
    service.add_item("Steak", 1000).await?;
    service
        .assign_item("Steak", &["Alice".to_string(), "Bob".to_string()])
        .await?;

    let result = service
        .set_custom_split(
            "Steak",
            &[("Alice".to_string(), 600), ("Bob".to_string(), 300)],
        )
        .await;
    assert!(matches!(
        result,
        Err(AppError::SplitSumMismatch {
            expected: 1000,
            actual: 900,
            ..
        })
    ));

    Ok(())
}

#[tokio::test]
async fn test_custom_split_requires_assignment_membership() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.add_person("Alice").await?;
    service.add_person("Carol").await?;
    service.add_item("Steak", 1000).await?;
    service
        .assign_item("Steak", &["Alice".to_string()])
        .await?;

    // Carol exists but is not assigned to the steak
    let result = service
        .set_custom_split("Steak", &[("Carol".to_string(), 1000)])
        .await;
    assert!(matches!(
        result,
        Err(AppError::SplitPersonNotAssigned { .. })
    ));

    // An unassigned item cannot have a custom split at all
    service.add_item("Fries", 500).await?;
    let result = service
        .set_custom_split("Fries", &[("Alice".to_string(), 500)])
        .await;
    assert!(matches!(result, Err(AppError::ItemNotAssigned { .. })));

    Ok(())
}

#[tokio::test]
async fn test_reassigning_clears_custom_split() -> Result<()> {
    let (service, _temp) = test_service().await?;
    service.add_person("Alice").await?;
    service.add_person("Bob").await?;
    service.add_item("Steak", 1000).await?;
    service
        .assign_item("Steak", &["Alice".to_string(), "Bob".to_string()])
        .await?;
    service
        .set_custom_split(
            "Steak",
            &[("Alice".to_string(), 600), ("Bob".to_string(), 400)],
        )
        .await?;

    service
        .assign_item("Steak", &["Bob".to_string(), "Alice".to_string()])
        .await?;

    let bill = service.bill().await?;
    let item = bill.item_by_name("Steak").unwrap();
    assert_eq!(bill.assignments[&item.id].custom_split, None);

    Ok(())
}

#[tokio::test]
async fn test_tax_and_tip_validation() -> Result<()> {
    let (service, _temp) = test_service().await?;

    assert!(matches!(
        service.set_tax_rate(1.5).await,
        Err(AppError::InvalidRate(_))
    ));
    assert!(matches!(
        service.set_tip_rate(-0.2).await,
        Err(AppError::InvalidRate(_))
    ));
    assert!(matches!(
        service.set_tax_exact(-100).await,
        Err(AppError::InvalidAmount(_))
    ));

    service.set_tax_rate(0.0825).await?;
    service.set_tip_rate(0.2).await?;
    let bill = service.bill().await?;
    assert_eq!(bill.tip_rate, 0.2);

    Ok(())
}

#[tokio::test]
async fn test_reset_empties_bill() -> Result<()> {
    let (service, _temp) = test_service().await?;
    DinnerTable::burger_salad(&service).await?;
    service.set_tax_rate(0.1).await?;
    service.set_tip_rate(0.25).await?;

    service.reset().await?;

    let bill = service.bill().await?;
    assert!(bill.people.is_empty());
    assert!(bill.items.is_empty());
    assert!(bill.assignments.is_empty());
    assert_eq!(bill.tax_input, None);
    assert_eq!(bill.tip_rate, conto::domain::DEFAULT_TIP_RATE);

    Ok(())
}
