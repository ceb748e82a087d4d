//! Markdown summary generation
//!
//! This module renders a human-readable report of a crawl run: when it ran,
//! which configuration it used, and what each site yielded.

use crate::crawler::Step;
use crate::output::stats::CrawlStats;
use crate::output::traits::OutputResult;
use std::fs::File;
use std::io::Write;
use std::path::Path;

/// Generates a markdown summary from crawl statistics
///
/// # Arguments
///
/// * `stats` - The finished run's statistics
/// * `config_hash` - SHA-256 of the configuration file
/// * `output_path` - Path where the markdown file should be written
///
/// # Returns
///
/// * `Ok(())` - Successfully wrote markdown summary
/// * `Err(OutputError)` - Failed to write summary
pub fn generate_markdown_summary(
    stats: &CrawlStats,
    config_hash: &str,
    output_path: &Path,
) -> OutputResult<()> {
    let markdown = format_markdown_summary(stats, config_hash);

    let mut file = File::create(output_path)?;
    file.write_all(markdown.as_bytes())?;

    Ok(())
}

/// Formats crawl statistics as markdown
pub fn format_markdown_summary(stats: &CrawlStats, config_hash: &str) -> String {
    let mut md = String::new();

    md.push_str("# Catalog-Ripple Crawl Summary\n\n");

    // Run metadata
    md.push_str("## Run Information\n\n");
    md.push_str(&format!(
        "- **Started**: {}\n",
        stats.started_at.format("%Y-%m-%d %H:%M:%S UTC")
    ));
    if let Some(finished) = &stats.finished_at {
        md.push_str(&format!(
            "- **Finished**: {}\n",
            finished.format("%Y-%m-%d %H:%M:%S UTC")
        ));
    }
    if let Some(duration) = stats.duration_seconds() {
        md.push_str(&format!(
            "- **Duration**: {} seconds ({:.2} minutes)\n",
            duration,
            duration as f64 / 60.0
        ));
    }
    md.push_str(&format!("- **Config Hash**: {}\n\n", config_hash));

    // Overall statistics
    md.push_str("## Overall Statistics\n\n");
    md.push_str(&format!("- **Pages Fetched**: {}\n", stats.pages_fetched));
    md.push_str(&format!("- **Fetch Failures**: {}\n", stats.fetch_failures));
    md.push_str(&format!(
        "- **Summary Records**: {}\n",
        stats.total_summaries()
    ));
    md.push_str(&format!(
        "- **Product Records**: {}\n",
        stats.total_products()
    ));
    md.push_str(&format!(
        "- **Dropped Records**: {}\n",
        stats.dropped_records
    ));
    md.push_str(&format!(
        "- **Success Rate**: {:.2}%\n\n",
        stats.success_rate()
    ));

    // Directive breakdown
    md.push_str("## Directives by Step\n\n");
    md.push_str("| Step | Issued |\n");
    md.push_str("|------|--------|\n");
    for step in Step::ALL {
        md.push_str(&format!("| {} | {} |\n", step, stats.directives_for(step)));
    }
    md.push('\n');

    // Per-site breakdown
    if !stats.sites.is_empty() {
        md.push_str("## Sites\n\n");
        md.push_str("| Site | Listing Pages | Summaries | Products | Distinct Products | Detail Fetches Skipped |\n");
        md.push_str("|------|---------------|-----------|----------|-------------------|------------------------|\n");
        for (site, counts) in &stats.sites {
            md.push_str(&format!(
                "| {} | {} | {} | {} | {} | {} |\n",
                site,
                counts.listing_pages,
                counts.summaries,
                counts.products,
                counts.distinct_products,
                counts.detail_fetches_skipped
            ));
        }
        md.push('\n');
    }

    md
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sites::SiteKind;
    use tempfile::NamedTempFile;

    fn stats() -> CrawlStats {
        let mut stats = CrawlStats::new();
        stats.pages_fetched = 12;
        stats.fetch_failures = 1;
        stats.record_directive(Step::Navigation);
        stats.record_directive(Step::Listing);
        let site = stats.site_mut(SiteKind::LacosteJp);
        site.summaries = 8;
        site.products = 5;
        site.distinct_products = 3;
        site.detail_fetches_skipped = 5;
        site.listing_pages = 2;
        stats.finish();
        stats
    }

    #[test]
    fn test_format_contains_sections() {
        let md = format_markdown_summary(&stats(), "abc123");

        assert!(md.starts_with("# Catalog-Ripple Crawl Summary"));
        assert!(md.contains("- **Config Hash**: abc123"));
        assert!(md.contains("- **Pages Fetched**: 12"));
        assert!(md.contains("| listing | 1 |"));
        assert!(md.contains("| color-page | 0 |"));
        assert!(md.contains("| lacoste-jp | 2 | 8 | 5 | 3 | 5 |"));
        assert!(md.contains("- **Finished**:"));
    }

    #[test]
    fn test_generate_writes_file() {
        let file = NamedTempFile::new().unwrap();
        generate_markdown_summary(&stats(), "abc123", file.path()).unwrap();

        let content = std::fs::read_to_string(file.path()).unwrap();
        assert!(content.contains("## Sites"));
    }
}
