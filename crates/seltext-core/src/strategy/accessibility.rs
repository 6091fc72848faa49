use super::{run_blocking, StrategyContext, StrategyExecutor};
use crate::error::{AccessibilityFailure, ExtractionError, ExtractionResult};
use crate::model::{normalize_text, ExtractionStrategy, FailureCategory, TEXT_FIELD_ROLES};
use crate::ports::AccessibilityApi;
use async_trait::async_trait;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, trace};

/// Selection read from the focused element, with that element's editability.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AxSelection {
    pub text: String,
    pub editable: bool,
}

/// Reads the selection straight from the focused element.
pub struct AccessibilityQuery {
    api: Arc<dyn AccessibilityApi>,
    timeout: Duration,
}

impl AccessibilityQuery {
    pub fn new(api: Arc<dyn AccessibilityApi>, timeout: Duration) -> Self {
        Self { api, timeout }
    }

    pub async fn query(&self) -> Result<String, AccessibilityFailure> {
        self.query_selection().await.map(|selection| selection.text)
    }

    /// Like [`AccessibilityQuery::query`], keeping the role read in the same pass.
    pub async fn query_selection(&self) -> Result<AxSelection, AccessibilityFailure> {
        let api = self.api.clone();
        let result = run_blocking(ExtractionStrategy::Accessibility, self.timeout, move || {
            api.focused_element()
        })
        .await;

        let category = match result {
            Ok(Ok(info)) => match info.selection().as_deref().and_then(normalize_text) {
                Some(text) => {
                    trace!(%text, role = ?info.role, "Accessibility selection");
                    return Ok(AxSelection {
                        text,
                        editable: info.is_text_field(),
                    });
                }
                None => FailureCategory::EmptyResult,
            },
            Ok(Err(err)) => {
                debug!(code = err.code, category = ?err.category, "Accessibility query failed");
                err.category
            }
            Err(err) => {
                debug!(error = %err, "Accessibility query did not complete");
                FailureCategory::EmptyResult
            }
        };
        Err(AccessibilityFailure { category })
    }

    /// Whether the focused element accepts text. `None` when the probe fails.
    ///
    /// Reads only the element's role, so it answers even when the element's
    /// text attributes do not.
    pub async fn probe_editable(&self) -> Option<bool> {
        let api = self.api.clone();
        match run_blocking(ExtractionStrategy::Accessibility, self.timeout, move || {
            api.focused_role()
        })
        .await
        {
            Ok(Ok(role)) => {
                Some(role.is_some_and(|role| TEXT_FIELD_ROLES.contains(&role.as_str())))
            }
            Ok(Err(err)) => {
                trace!(code = err.code, "Editability probe failed");
                None
            }
            Err(_) => None,
        }
    }
}

#[async_trait]
impl StrategyExecutor for AccessibilityQuery {
    fn strategy(&self) -> ExtractionStrategy {
        ExtractionStrategy::Accessibility
    }

    async fn extract(&self, _ctx: &StrategyContext) -> ExtractionResult<String> {
        self.query().await.map_err(ExtractionError::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AxError;
    use crate::model::{FocusedElementInfo, TextRange};
    use crate::testing::FakeAccessibility;

    fn query(api: FakeAccessibility) -> AccessibilityQuery {
        AccessibilityQuery::new(Arc::new(api), Duration::from_millis(200))
    }

    #[tokio::test]
    async fn test_query_returns_trimmed_selection() {
        let api = FakeAccessibility::with_element(FocusedElementInfo {
            selected_text: Some("  hello  ".into()),
            role: Some("AXTextArea".into()),
            ..Default::default()
        });
        let query = query(api);
        assert_eq!(
            query.query_selection().await.unwrap(),
            AxSelection {
                text: "hello".into(),
                editable: true
            }
        );
        assert_eq!(query.probe_editable().await, Some(true));
    }

    #[tokio::test]
    async fn test_query_slices_selected_range() {
        let api = FakeAccessibility::with_element(FocusedElementInfo {
            full_text: Some("one two three".into()),
            selected_range: Some(TextRange { offset: 4, length: 3 }),
            ..Default::default()
        });
        assert_eq!(query(api).query().await.unwrap(), "two");
    }

    #[tokio::test]
    async fn test_query_without_selection_is_empty_result() {
        let api = FakeAccessibility::with_element(FocusedElementInfo {
            full_text: Some("whole document".into()),
            selected_text: Some(String::new()),
            ..Default::default()
        });
        let err = query(api).query().await.unwrap_err();
        assert_eq!(err.category, FailureCategory::EmptyResult);
    }

    #[tokio::test]
    async fn test_query_maps_port_error_category() {
        let api = FakeAccessibility::with_error(AxError::new(FailureCategory::NoValue, -25212));
        let query = query(api);
        assert_eq!(query.query().await.unwrap_err().category, FailureCategory::NoValue);
        assert_eq!(query.probe_editable().await, None);
    }

    #[tokio::test]
    async fn test_probe_reads_role_when_text_is_unavailable() {
        let api = FakeAccessibility::with_error(AxError::new(FailureCategory::NoValue, -25212))
            .with_role("AXTextArea");
        let query = query(api);
        assert_eq!(query.query().await.unwrap_err().category, FailureCategory::NoValue);
        assert_eq!(query.probe_editable().await, Some(true));
    }

    #[tokio::test]
    async fn test_query_timeout_counts_as_empty() {
        let api = FakeAccessibility::with_element(FocusedElementInfo {
            selected_text: Some("late".into()),
            ..Default::default()
        })
        .delayed(Duration::from_millis(300));
        let query = AccessibilityQuery::new(Arc::new(api), Duration::from_millis(50));
        assert_eq!(query.query().await.unwrap_err().category, FailureCategory::EmptyResult);
    }
}
