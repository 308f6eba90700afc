use {
    crate::decoder::Observation,
    serde::Serialize,
    std::collections::HashMap,
};

/// Running totals for one category
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct CategoryStats {
    pub count: u64,
    pub sum_a: f64,
    pub sum_b: f64,
}

impl CategoryStats {
    pub fn mean_a(&self) -> f64 {
        self.sum_a / self.count as f64
    }

    pub fn mean_b(&self) -> f64 {
        self.sum_b / self.count as f64
    }
}

/// One row of a snapshot: the running means of a category
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CategoryMean {
    pub category: String,
    pub mean_a: f64,
    pub mean_b: f64,
}

/// Point-in-time view of all categories, in first-seen order
pub type Snapshot = Vec<CategoryMean>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreError {
    /// A new category arrived while the store already holds `limit` categories
    CategoryLimit { category: String, limit: usize },
}

impl std::fmt::Display for StoreError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StoreError::CategoryLimit { category, limit } => write!(
                f,
                "Category limit of {} reached, rejecting new category '{}'",
                limit, category
            ),
        }
    }
}

impl std::error::Error for StoreError {}

/// Append-only table of per-category running sums.
///
/// Entries are kept in a `Vec` in the order their category was first seen,
/// with a `HashMap` index from category to slot so inserts stay O(1).
/// Every present entry has `count >= 1`; nothing is ever removed.
#[derive(Debug, Default)]
pub struct AggregationStore {
    entries: Vec<(String, CategoryStats)>,
    index: HashMap<String, usize>,
    max_categories: Option<usize>,
}

impl AggregationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store that rejects observations for new categories once `limit` is reached
    pub fn with_category_limit(limit: usize) -> Self {
        Self {
            max_categories: Some(limit),
            ..Self::default()
        }
    }

    pub fn category_limit(&self) -> Option<usize> {
        self.max_categories
    }

    /// Fold one observation into its category's running sums
    pub fn insert(&mut self, observation: Observation) -> Result<(), StoreError> {
        let Observation {
            category,
            metric_a,
            metric_b,
        } = observation;

        let slot = match self.index.get(&category) {
            Some(&slot) => slot,
            None => {
                if let Some(limit) = self.max_categories {
                    if self.entries.len() >= limit {
                        return Err(StoreError::CategoryLimit { category, limit });
                    }
                }
                self.entries.push((category.clone(), CategoryStats::default()));
                let slot = self.entries.len() - 1;
                self.index.insert(category, slot);
                slot
            }
        };

        let stats = &mut self.entries[slot].1;
        stats.count += 1;
        stats.sum_a += metric_a;
        stats.sum_b += metric_b;
        Ok(())
    }

    /// Current means for every category, in first-seen order
    pub fn snapshot(&self) -> Snapshot {
        self.entries
            .iter()
            .map(|(category, stats)| CategoryMean {
                category: category.clone(),
                mean_a: stats.mean_a(),
                mean_b: stats.mean_b(),
            })
            .collect()
    }

    pub fn get(&self, category: &str) -> Option<&CategoryStats> {
        self.index.get(category).map(|&slot| &self.entries[slot].1)
    }

    /// Number of categories
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Observations folded in across all categories
    pub fn total_observations(&self) -> u64 {
        self.entries.iter().map(|(_, stats)| stats.count).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn obs(category: &str, a: f64, b: f64) -> Observation {
        Observation {
            category: category.to_string(),
            metric_a: a,
            metric_b: b,
        }
    }

    fn assert_close(actual: f64, expected: f64) {
        assert!(
            (actual - expected).abs() < 1e-9,
            "expected {}, got {}",
            expected,
            actual
        );
    }

    #[test]
    fn test_fog_and_rain_means() {
        let mut store = AggregationStore::new();
        store.insert(obs("Fog", 101.24, 4.0)).unwrap();
        store.insert(obs("Fog", 100.0, 6.0)).unwrap();
        store.insert(obs("Rain", 99.5, 10.0)).unwrap();

        let snapshot = store.snapshot();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot[0].category, "Fog");
        assert_close(snapshot[0].mean_a, 100.62);
        assert_close(snapshot[0].mean_b, 5.0);
        assert_eq!(snapshot[1].category, "Rain");
        assert_close(snapshot[1].mean_a, 99.5);
        assert_close(snapshot[1].mean_b, 10.0);

        assert_eq!(store.get("Fog").unwrap().count, 2);
        assert_eq!(store.total_observations(), 3);
    }

    #[test]
    fn test_running_mean_matches_arithmetic_mean() {
        let values: Vec<(f64, f64)> = (0..250)
            .map(|i| (i as f64 * 0.37 - 20.0, (i % 17) as f64 * 1.5))
            .collect();

        let mut store = AggregationStore::new();
        for (a, b) in &values {
            store.insert(obs("Snow", *a, *b)).unwrap();
        }

        let n = values.len() as f64;
        let expected_a = values.iter().map(|(a, _)| a).sum::<f64>() / n;
        let expected_b = values.iter().map(|(_, b)| b).sum::<f64>() / n;

        let snapshot = store.snapshot();
        assert_close(snapshot[0].mean_a, expected_a);
        assert_close(snapshot[0].mean_b, expected_b);
    }

    #[test]
    fn test_snapshot_is_idempotent() {
        let mut store = AggregationStore::new();
        store.insert(obs("Clear", 101.0, 12.0)).unwrap();
        store.insert(obs("Cloudy", 100.5, 8.0)).unwrap();

        assert_eq!(store.snapshot(), store.snapshot());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let mut store = AggregationStore::new();
        for category in ["Snow", "Fog", "Rain", "Fog", "Clear", "Snow"] {
            store.insert(obs(category, 1.0, 1.0)).unwrap();
        }

        let order: Vec<String> = store.snapshot().into_iter().map(|m| m.category).collect();
        assert_eq!(order, vec!["Snow", "Fog", "Rain", "Clear"]);
    }

    #[test]
    fn test_category_limit_rejects_only_new_categories() {
        let mut store = AggregationStore::with_category_limit(2);
        store.insert(obs("Fog", 1.0, 1.0)).unwrap();
        store.insert(obs("Rain", 2.0, 2.0)).unwrap();

        let err = store.insert(obs("Snow", 3.0, 3.0)).unwrap_err();
        assert_eq!(
            err,
            StoreError::CategoryLimit {
                category: "Snow".to_string(),
                limit: 2
            }
        );
        assert_eq!(store.len(), 2);
        assert!(store.get("Snow").is_none());

        // Existing categories keep accumulating
        store.insert(obs("Fog", 3.0, 3.0)).unwrap();
        assert_eq!(store.get("Fog").unwrap().count, 2);
    }

    #[test]
    fn test_empty_store() {
        let store = AggregationStore::new();
        assert!(store.is_empty());
        assert!(store.snapshot().is_empty());
        assert_eq!(store.category_limit(), None);
    }
}
