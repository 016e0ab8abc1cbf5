//! Category lookup in front of a [`CategorySearch`] backend.
//!
//! Terms are cleaned (trimmed, `*` stripped, lower-cased) before they reach
//! the backend. Short terms never hit the backend, and a term identical to
//! the previous one is skipped. Backend failures are logged, reported once
//! through the notifier and degrade to an empty list so row editing is never
//! blocked.

use std::sync::Arc;

use tracing::error;

use crate::store::{CategoryResult, CategorySearch, Notifier};
use crate::types::CategorySelection;

pub const DEFAULT_MIN_TERM_LENGTH: usize = 2;
pub const DEFAULT_RESULT_ICON: &str = "standard:default";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LookupSettings {
    pub min_term_length: usize,
    pub default_icon: String,
    pub error_message: String,
}

impl Default for LookupSettings {
    fn default() -> Self {
        Self {
            min_term_length: DEFAULT_MIN_TERM_LENGTH,
            default_icon: DEFAULT_RESULT_ICON.to_string(),
            error_message: "An error occurred while searching with the lookup field.".to_string(),
        }
    }
}

/// Normalise a raw search term.
pub fn clean_search_term(raw: &str) -> String {
    raw.trim().replace('*', "").to_lowercase()
}

pub struct CategoryLookup {
    backend: Arc<dyn CategorySearch>,
    notifier: Arc<dyn Notifier>,
    settings: LookupSettings,
    last_term: Option<String>,
}

impl CategoryLookup {
    pub fn new(backend: Arc<dyn CategorySearch>, notifier: Arc<dyn Notifier>) -> Self {
        Self::with_settings(backend, notifier, LookupSettings::default())
    }

    pub fn with_settings(
        backend: Arc<dyn CategorySearch>,
        notifier: Arc<dyn Notifier>,
        settings: LookupSettings,
    ) -> Self {
        Self {
            backend,
            notifier,
            settings,
            last_term: None,
        }
    }

    /// Search for `raw_term`, excluding ids already in `selection`.
    ///
    /// Returns `None` when the cleaned term equals the previous one (results
    /// on screen stay as they are), `Some(vec![])` for a term shorter than the
    /// minimum.
    pub async fn search(
        &mut self,
        raw_term: &str,
        selection: &[CategorySelection],
    ) -> Option<Vec<CategoryResult>> {
        let term = clean_search_term(raw_term);
        if self.last_term.as_deref() == Some(term.as_str()) {
            return None;
        }
        self.last_term = Some(term.clone());

        if term.chars().count() < self.settings.min_term_length {
            return Some(Vec::new());
        }

        let excluded: Vec<String> = selection.iter().filter_map(|s| s.id.clone()).collect();
        match self.backend.search(&term, &excluded).await {
            Ok(results) => Some(
                results
                    .into_iter()
                    .map(|r| self.with_default_icon(r))
                    .collect(),
            ),
            Err(e) => {
                error!(term = %term, error = %e, "lookup error");
                self.notifier.notify_error(&self.settings.error_message);
                Some(Vec::new())
            }
        }
    }

    /// Forget the previous term so the next search always runs.
    pub fn reset(&mut self) {
        self.last_term = None;
    }

    fn with_default_icon(&self, mut r: CategoryResult) -> CategoryResult {
        if r.icon.is_none() {
            r.icon = Some(self.settings.default_icon.clone());
        }
        r
    }
}

impl From<CategoryResult> for CategorySelection {
    fn from(r: CategoryResult) -> Self {
        CategorySelection {
            id: Some(r.id),
            title: r.title,
            icon: r.icon.unwrap_or_else(|| DEFAULT_RESULT_ICON.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Mutex;

    struct Fixed {
        calls: Mutex<Vec<(String, Vec<String>)>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl CategorySearch for Fixed {
        async fn search(&self, term: &str, excluded: &[String]) -> anyhow::Result<Vec<CategoryResult>> {
            self.calls
                .lock()
                .unwrap()
                .push((term.to_string(), excluded.to_vec()));
            if self.fail {
                anyhow::bail!("backend down");
            }
            Ok(vec![CategoryResult {
                id: "g1".into(),
                title: "General Fund".into(),
                subtitle: None,
                icon: None,
            }])
        }
    }

    #[derive(Default)]
    struct Count(Mutex<usize>);

    impl Notifier for Count {
        fn notify_success(&self, _: &str) {}
        fn notify_error(&self, _: &str) {
            *self.0.lock().unwrap() += 1;
        }
    }

    fn backend(fail: bool) -> Arc<Fixed> {
        Arc::new(Fixed {
            calls: Mutex::new(Vec::new()),
            fail,
        })
    }

    #[test]
    fn clean_term_strips_wildcards_and_case() {
        assert_eq!(clean_search_term("  Gen*eral* "), "general");
    }

    #[tokio::test]
    async fn short_terms_skip_the_backend() {
        let b = backend(false);
        let mut l = CategoryLookup::new(b.clone(), Arc::new(Count::default()));
        assert_eq!(l.search("g", &[]).await, Some(Vec::new()));
        assert!(b.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn repeated_term_is_skipped_and_icon_defaulted() {
        let b = backend(false);
        let mut l = CategoryLookup::new(b.clone(), Arc::new(Count::default()));
        let hits = l.search("Gen", &[]).await.unwrap();
        assert_eq!(hits[0].icon.as_deref(), Some(DEFAULT_RESULT_ICON));
        assert_eq!(l.search("gen ", &[]).await, None);
        assert_eq!(b.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn selection_ids_are_excluded() {
        let b = backend(false);
        let mut l = CategoryLookup::new(b.clone(), Arc::new(Count::default()));
        let sel = CategorySelection {
            id: Some("g9".into()),
            title: "Other".into(),
            icon: DEFAULT_RESULT_ICON.into(),
        };
        l.search("fund", &[sel]).await;
        assert_eq!(b.calls.lock().unwrap()[0].1, vec!["g9".to_string()]);
    }

    #[tokio::test]
    async fn backend_failure_degrades_to_empty() {
        let notes = Arc::new(Count::default());
        let mut l = CategoryLookup::new(backend(true), notes.clone());
        assert_eq!(l.search("fund", &[]).await, Some(Vec::new()));
        assert_eq!(*notes.0.lock().unwrap(), 1);
    }
}
