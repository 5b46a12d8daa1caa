// Allow dead_code because these helpers are used across different test files
// which are compiled separately
#![allow(dead_code)]

use anyhow::Result;
use conto::application::BillService;
use tempfile::TempDir;

/// Helper to create a test service with a temporary database
pub async fn test_service() -> Result<(BillService, TempDir)> {
    let temp_dir = TempDir::new()?;
    let db_path = temp_dir.path().join("test.db");
    let service = BillService::init(db_path.to_str().unwrap()).await?;
    Ok((service, temp_dir))
}

/// Test fixture: standard table setups
pub struct DinnerTable;

impl DinnerTable {
    /// Alice and Bob, each eating their own dish: a 12.00 burger and an
    /// 8.00 salad
    pub async fn burger_salad(service: &BillService) -> Result<()> {
        service.add_person("Alice").await?;
        service.add_person("Bob").await?;
        service.add_item("Burger", 1200).await?;
        service.add_item("Salad", 800).await?;
        service
            .assign_item("Burger", &["Alice".to_string()])
            .await?;
        service.assign_item("Salad", &["Bob".to_string()]).await?;
        Ok(())
    }

    /// Three friends sharing a 10.00 platter, assigned in a fixed order
    pub async fn shared_platter(service: &BillService) -> Result<()> {
        for name in ["Alice", "Bob", "Carol"] {
            service.add_person(name).await?;
        }
        service.add_item("Platter", 1000).await?;
        service
            .assign_item(
                "Platter",
                &["Carol".to_string(), "Alice".to_string(), "Bob".to_string()],
            )
            .await?;
        Ok(())
    }
}

/// Find one person's breakdown in a summary by name
pub fn breakdown_for<'a>(
    summary: &'a conto::domain::BillSummary,
    name: &str,
) -> &'a conto::domain::PersonBreakdown {
    summary
        .person_breakdowns
        .iter()
        .find(|b| b.person_name == name)
        .unwrap_or_else(|| panic!("no breakdown for {}", name))
}
