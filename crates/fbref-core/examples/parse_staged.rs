use std::path::PathBuf;

use fbref_core::{parse_only, Category, FetchMode, Season, Staging};

/// Parses whatever is staged in a directory and prints a short report.
///
/// Usage: `cargo run --example parse_staged -- [staging_dir]`
fn main() -> Result<(), Box<dyn std::error::Error>> {
    let root = std::env::args()
        .nth(1)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("data_html"));
    let staging = Staging::new(&root);
    let seasons = Season::defaults();

    println!("Parsing staged files in {}\n", staging.root().display());

    for mode in [FetchMode::Http, FetchMode::Browser] {
        for result in parse_only(&staging, &Category::ALL, mode, &seasons) {
            if result.is_empty() {
                continue;
            }

            println!(
                "{} ({mode}): {} rows x {} columns from {} seasons",
                result.category,
                result.table.len(),
                result.table.width(),
                result.seasons.len()
            );
            println!("  columns: {}", result.table.columns.join(", "));
            for skip in &result.skipped {
                println!("  skipped {}: {:?}", skip.season, skip.reason);
            }
        }
    }

    Ok(())
}
