//! Seed keyword discovery and expansion.
//!
//! Seeds come either from a flat CSV file with a `keyword` column or
//! from the trends source (daily trending merged with the shopping
//! category chart), expanded per seed via rising related queries.
//! Every merge goes through an order-preserving dedup so output rows
//! are reproducible run to run.

use crate::trends::TrendsClient;
use anyhow::{Context, Result};
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, info};

/// Remove duplicates while preserving first-occurrence order.
pub fn dedupe<I>(items: I) -> Vec<String>
where
    I: IntoIterator<Item = String>,
{
    let mut seen = HashSet::new();
    items
        .into_iter()
        .filter(|item| seen.insert(item.clone()))
        .collect()
}

/// Split one CSV line into cells, honoring double-quoted fields with
/// doubled-quote escapes. Inverse of the quoting rules the CSV sink
/// writes, so the reader can consume its own output.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut in_quotes = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut cell));
            }
            _ => cell.push(c),
        }
    }
    cells.push(cell);
    cells
}

/// Read seed keywords from a CSV file with a `keyword` column.
///
/// Other columns are ignored; blank cells are skipped. The column is
/// located by header name, case-insensitively. Quoted cells may
/// contain commas.
pub fn read_seed_file(path: &Path) -> Result<Vec<String>> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read seed file: {}", path.display()))?;

    let mut lines = content.lines();
    let header = lines
        .next()
        .with_context(|| format!("Seed file is empty: {}", path.display()))?;

    let column = split_csv_line(header)
        .iter()
        .position(|name| name.trim().eq_ignore_ascii_case("keyword"))
        .with_context(|| format!("Seed file has no 'keyword' column: {}", path.display()))?;

    let seeds: Vec<String> = lines
        .filter_map(|line| split_csv_line(line).into_iter().nth(column))
        .map(|cell| cell.trim().to_string())
        .filter(|kw| !kw.is_empty())
        .collect();

    Ok(dedupe(seeds))
}

/// Discovers an initial candidate keyword set and expands it.
pub struct SeedDiscovery {
    trends: Arc<TrendsClient>,
    trending_limit: usize,
}

impl SeedDiscovery {
    pub fn new(trends: Arc<TrendsClient>, trending_limit: usize) -> Self {
        Self {
            trends,
            trending_limit,
        }
    }

    /// Merge the daily-trending and category-chart sources.
    ///
    /// Each sub-source failure degrades to an empty list independently,
    /// so a partial outage never aborts discovery.
    pub async fn discover_trending(&self) -> Vec<String> {
        let mut daily = self.trends.fetch_trending().await;
        daily.truncate(self.trending_limit);

        let mut chart = self.trends.fetch_chart().await;
        chart.truncate(self.trending_limit);

        debug!(
            "discovery sub-sources: {} daily, {} chart",
            daily.len(),
            chart.len()
        );

        dedupe(daily.into_iter().chain(chart))
    }

    /// Rising related queries for one seed; empty when the source is
    /// exhausted or unavailable.
    pub async fn expand(&self, seed: &str) -> Vec<String> {
        self.trends.fetch_rising(seed).await
    }

    /// Full candidate set: trending seeds plus their expansions, in
    /// first-seen order.
    pub async fn collect(&self) -> Vec<String> {
        let trending = self.discover_trending().await;
        info!("Discovered {} trending seeds", trending.len());

        let mut all = trending.clone();
        for seed in &trending {
            // Sequential on purpose: expansions share the trends source
            // rate budget.
            all.extend(self.expand(seed).await);
        }

        let keywords = dedupe(all);
        info!("{} candidate keywords after expansion", keywords.len());
        keywords
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trends::{FetchError, RetryPolicy, TrendSource};
    use async_trait::async_trait;

    struct FakeTrends {
        daily: Result<Vec<String>, FetchError>,
        chart: Result<Vec<String>, FetchError>,
        rising: Vec<String>,
    }

    #[async_trait]
    impl TrendSource for FakeTrends {
        async fn interest_over_time(&self, _keyword: &str) -> Result<Vec<f64>, FetchError> {
            Ok(Vec::new())
        }

        async fn rising_related(&self, _keyword: &str) -> Result<Vec<String>, FetchError> {
            Ok(self.rising.clone())
        }

        async fn trending_daily(&self) -> Result<Vec<String>, FetchError> {
            self.daily.clone()
        }

        async fn category_chart(&self) -> Result<Vec<String>, FetchError> {
            self.chart.clone()
        }
    }

    fn discovery(source: FakeTrends) -> SeedDiscovery {
        let client = TrendsClient::new(Arc::new(source), RetryPolicy::immediate(), 10);
        SeedDiscovery::new(Arc::new(client), 20)
    }

    fn words(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn test_dedupe_preserves_first_seen_order() {
        let input = words(&["a", "b", "a", "c", "b"]);
        assert_eq!(dedupe(input), words(&["a", "b", "c"]));
    }

    #[test]
    fn test_dedupe_empty() {
        assert!(dedupe(Vec::new()).is_empty());
    }

    #[tokio::test]
    async fn test_trending_merge_dedupes_across_sources() {
        let discovery = discovery(FakeTrends {
            daily: Ok(words(&["phone case", "yoga mat"])),
            chart: Ok(words(&["yoga mat", "air fryer"])),
            rising: Vec::new(),
        });

        let seeds = discovery.discover_trending().await;
        assert_eq!(seeds, words(&["phone case", "yoga mat", "air fryer"]));
    }

    #[tokio::test]
    async fn test_trending_partial_failure_degrades_independently() {
        let discovery = discovery(FakeTrends {
            daily: Err(FetchError::Source("http 500".to_string())),
            chart: Ok(words(&["air fryer"])),
            rising: Vec::new(),
        });

        let seeds = discovery.discover_trending().await;
        assert_eq!(seeds, words(&["air fryer"]));
    }

    #[tokio::test]
    async fn test_collect_unions_seeds_and_expansions() {
        let discovery = discovery(FakeTrends {
            daily: Ok(words(&["yoga mat"])),
            chart: Ok(Vec::new()),
            rising: words(&["yoga mat thick", "yoga mat", "yoga mat travel"]),
        });

        let keywords = discovery.collect().await;
        assert_eq!(
            keywords,
            words(&["yoga mat", "yoga mat thick", "yoga mat travel"])
        );
    }

    #[test]
    fn test_read_seed_file() {
        let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("fixtures/seeds.csv");
        let seeds = read_seed_file(&path).unwrap();
        assert_eq!(
            seeds,
            words(&["yoga mat", "standing desk", "cold brew maker"])
        );
    }

    #[test]
    fn test_read_seed_file_quoted_comma_keyword() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("quoted.csv");
        std::fs::write(
            &path,
            "keyword,notes\n\"mats, 6mm\",core\n\"6\"\" mat\",\nyoga mat,\n",
        )
        .unwrap();

        let seeds = read_seed_file(&path).unwrap();
        assert_eq!(seeds, words(&["mats, 6mm", "6\" mat", "yoga mat"]));
    }

    #[test]
    fn test_split_csv_line_plain_and_quoted() {
        assert_eq!(split_csv_line("a,b,c"), words(&["a", "b", "c"]));
        assert_eq!(split_csv_line("\"a, b\",c"), words(&["a, b", "c"]));
        assert_eq!(split_csv_line("a,,c"), words(&["a", "", "c"]));
    }

    #[test]
    fn test_read_seed_file_missing_column() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.csv");
        std::fs::write(&path, "term,score\nfoo,1\n").unwrap();
        assert!(read_seed_file(&path).is_err());
    }
}
