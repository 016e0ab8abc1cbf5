use std::sync::Mutex;

use anyhow::bail;
use gau_alloc::{CategoryResult, CategorySearch};

use crate::lock;

/// Fixed-catalogue [`CategorySearch`]. Matches titles by case-insensitive
/// substring and records each `(term, excluded_ids)` it receives.
#[derive(Default)]
pub struct StubCategorySearch {
    catalogue: Vec<CategoryResult>,
    calls: Mutex<Vec<(String, Vec<String>)>>,
    failing: Mutex<bool>,
}

impl StubCategorySearch {
    pub fn new(entries: &[(&str, &str)]) -> Self {
        Self {
            catalogue: entries
                .iter()
                .map(|(id, title)| CategoryResult {
                    id: id.to_string(),
                    title: title.to_string(),
                    subtitle: None,
                    icon: None,
                })
                .collect(),
            ..Self::default()
        }
    }

    pub fn set_failing(&self, failing: bool) {
        *lock(&self.failing) = failing;
    }

    pub fn calls(&self) -> Vec<(String, Vec<String>)> {
        lock(&self.calls).clone()
    }
}

#[async_trait::async_trait]
impl CategorySearch for StubCategorySearch {
    async fn search(
        &self,
        term: &str,
        excluded_ids: &[String],
    ) -> anyhow::Result<Vec<CategoryResult>> {
        lock(&self.calls).push((term.to_string(), excluded_ids.to_vec()));
        if *lock(&self.failing) {
            bail!("search backend unavailable");
        }
        let needle = term.to_lowercase();
        Ok(self
            .catalogue
            .iter()
            .filter(|c| !excluded_ids.contains(&c.id))
            .filter(|c| c.title.to_lowercase().contains(&needle))
            .cloned()
            .collect())
    }
}
