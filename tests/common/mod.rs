#![allow(dead_code)]

use anyhow::Result;
use billing_usage::UsageRecord;
use std::fs;
use std::path::Path;

pub const CSV_HEADER: &str = "user_name,repository_name,usage,cost";

/// Write an export as `<root>/monthly/<date>-<category>.csv`.
pub fn write_export(root: &Path, date: &str, category: &str, rows: &[&str]) -> Result<()> {
    let monthly = root.join("monthly");
    fs::create_dir_all(&monthly)?;

    let mut content = String::from(CSV_HEADER);
    content.push('\n');
    for row in rows {
        content.push_str(row);
        content.push('\n');
    }

    fs::write(monthly.join(format!("{}-{}.csv", date, category)), content)?;
    Ok(())
}

pub fn sample_records() -> Vec<UsageRecord> {
    vec![
        UsageRecord::new("john", "repo1", 5.0).with_time(10.0),
        UsageRecord::new("jane", "repo2", 8.0).with_time(20.0),
        UsageRecord::new("john", "repo2", 3.0).with_time(15.0),
        UsageRecord::new("jane", "repo1", 2.0).with_capacity(100.0),
    ]
}
