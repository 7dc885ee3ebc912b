use billing_usage::error::LoaderError;
use billing_usage::loader::{CsvLoader, FileSource};
use billing_usage::CategoryRegistry;
use tempfile::TempDir;

mod common;

#[tokio::test]
async fn test_load_single_export() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    common::write_export(
        temp_dir.path(),
        "20240101",
        "actions",
        &["john,repo1,120,5.00", "jane,repo2,300,8.25", "broken,line", "bob,repo3,60,free"],
    )?;

    let registry = CategoryRegistry::seeded();
    let actions = registry.get("actions").unwrap();
    let loader = CsvLoader::new(FileSource::new(temp_dir.path()));

    let records = loader.load(&actions, "20240101").await?;
    assert_eq!(records.len(), 2);
    assert_eq!(records[0].actor_name, "john");
    assert_eq!(records[0].time_usage(), Some(120.0));
    assert_eq!(records[1].cost, 8.25);

    Ok(())
}

#[tokio::test]
async fn test_storage_export_reads_capacity() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    common::write_export(temp_dir.path(), "20240201", "storage", &["jane,repo1,2048,0.50"])?;

    let registry = CategoryRegistry::seeded();
    let storage = registry.get("storage").unwrap();
    let loader = CsvLoader::new(FileSource::new(temp_dir.path()));

    let records = loader.load(&storage, "20240201").await?;
    assert_eq!(records[0].capacity_usage(), Some(2048.0));
    assert_eq!(records[0].time_usage(), None);

    Ok(())
}

#[tokio::test]
async fn test_missing_export_is_unavailable() {
    let temp_dir = TempDir::new().unwrap();
    let registry = CategoryRegistry::seeded();
    let actions = registry.get("actions").unwrap();
    let loader = CsvLoader::new(FileSource::new(temp_dir.path()));

    let err = loader.load(&actions, "20240301").await.unwrap_err();
    assert!(matches!(err, LoaderError::SourceUnavailable { .. }));

    let err = loader.load(&actions, "2024-03").await.unwrap_err();
    assert!(matches!(err, LoaderError::InvalidDate(_)));
}

#[tokio::test]
async fn test_load_year_degrades_missing_months() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    common::write_export(temp_dir.path(), "20240101", "actions", &["john,repo1,100,5.0"])?;
    common::write_export(temp_dir.path(), "20240301", "actions", &["john,repo1,150,7.5"])?;
    // another category must not leak in
    common::write_export(temp_dir.path(), "20240201", "storage", &["john,repo1,10,1.0"])?;

    let registry = CategoryRegistry::seeded();
    let actions = registry.get("actions").unwrap();
    let loader = CsvLoader::new(FileSource::new(temp_dir.path()));

    let report = loader.load_year(&actions, 2024).await;
    assert_eq!(report.periods.len(), 12);
    assert_eq!(report.failures.len(), 10);
    assert_eq!(report.periods["2024-01"].len(), 1);
    assert!(report.periods["2024-02"].is_empty());
    assert_eq!(report.periods["2024-03"][0].cost, 7.5);

    let keys: Vec<&String> = report.periods.keys().collect();
    assert_eq!(keys.first().map(|k| k.as_str()), Some("2024-01"));
    assert_eq!(keys.last().map(|k| k.as_str()), Some("2024-12"));

    Ok(())
}

#[tokio::test]
async fn test_load_many_keeps_file_dates() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    common::write_export(temp_dir.path(), "20250601", "codespaces", &["jane,repo9,30,2.0"])?;

    let registry = CategoryRegistry::seeded();
    let codespaces = registry.get("codespaces").unwrap();
    let loader = CsvLoader::new(FileSource::new(temp_dir.path()));

    let dates = vec!["20250601".to_string(), "20250501".to_string()];
    let report = loader.load_many(&codespaces, &dates).await;
    assert_eq!(report.periods["20250601"].len(), 1);
    assert!(report.periods["20250501"].is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].key, "20250501");

    Ok(())
}

#[tokio::test]
async fn test_available_dates() -> anyhow::Result<()> {
    let temp_dir = TempDir::new()?;
    common::write_export(temp_dir.path(), "20241101", "actions", &[])?;
    common::write_export(temp_dir.path(), "20240401", "actions", &[])?;
    common::write_export(temp_dir.path(), "20250101", "actions", &[])?;
    common::write_export(temp_dir.path(), "20240501", "storage", &[])?;

    let registry = CategoryRegistry::seeded();
    let actions = registry.get("actions").unwrap();
    let source = FileSource::new(temp_dir.path());

    assert_eq!(
        source.discover_dates("actions")?,
        vec!["20240401", "20241101", "20250101"]
    );

    let loader = CsvLoader::new(source);
    assert_eq!(
        loader.available_dates(&actions, 2024..=2024).await,
        vec!["20240401", "20241101"]
    );

    Ok(())
}
