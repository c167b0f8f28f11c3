//! Test harness for driving a [`ProviderService`] the way the plugin host does.
//!
//! # Example
//!
//! ```ignore
//! use platform_provider::testing::{assert_attr, ProviderTester};
//! use serde_json::json;
//!
//! #[tokio::test]
//! async fn test_create_repo() {
//!     let tester = ProviderTester::connect(&server.uri(), "acc", "key").await.unwrap();
//!
//!     let state = tester
//!         .lifecycle_create("platform_repo", json!({"identifier": "repo1"}))
//!         .await
//!         .unwrap();
//!
//!     assert_attr(&state, "identifier", json!("repo1"));
//! }
//! ```

use serde_json::{json, Value};
use thiserror::Error;

use crate::error::ProviderError;
use crate::provider::PlatformProvider;
use crate::schema::{Diagnostic, ProviderSchema};
use crate::service::ProviderService;
use crate::types::{ImportedResource, PlanResult};

/// Wraps a provider with terse, test-friendly calls.
pub struct ProviderTester<P: ProviderService> {
    provider: P,
}

impl ProviderTester<PlatformProvider> {
    /// A [`PlatformProvider`] configured against `endpoint`.
    pub async fn connect(endpoint: &str, account_id: &str, api_key: &str) -> Result<Self, TestError> {
        let tester = Self::new(PlatformProvider::new());
        tester
            .configure(json!({
                "endpoint": endpoint,
                "account_id": account_id,
                "api_key": api_key,
            }))
            .await?;
        Ok(tester)
    }
}

impl<P: ProviderService> ProviderTester<P> {
    pub fn new(provider: P) -> Self {
        Self { provider }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    // =========================================================================
    // Schema & Metadata
    // =========================================================================

    pub fn schema(&self) -> ProviderSchema {
        self.provider.schema()
    }

    pub fn resource_types(&self) -> Vec<String> {
        self.provider.metadata().resources
    }

    pub fn data_source_types(&self) -> Vec<String> {
        self.provider.metadata().data_sources
    }

    // =========================================================================
    // Provider Lifecycle
    // =========================================================================

    /// Validate provider configuration; error diagnostics become `Err`.
    pub async fn validate_provider_config(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.validate_provider_config(config).await?;
        check_diagnostics(diagnostics)
    }

    /// Configure the provider; error diagnostics become `Err`.
    pub async fn configure(&self, config: Value) -> Result<(), TestError> {
        let diagnostics = self.provider.configure(config).await?;
        check_diagnostics(diagnostics)
    }

    // =========================================================================
    // Resource Operations
    // =========================================================================

    /// Raw diagnostics for a resource configuration, warnings included.
    pub async fn diagnostics(&self, resource_type: &str, config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
        self.provider.validate_resource_config(resource_type, config).await
    }

    /// Validate a resource configuration; error diagnostics become `Err`.
    pub async fn validate_resource_config(&self, resource_type: &str, config: Value) -> Result<(), TestError> {
        let diagnostics = self.diagnostics(resource_type, config).await?;
        check_diagnostics(diagnostics)
    }

    pub async fn plan_create(&self, resource_type: &str, proposed_state: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, None, proposed_state.clone(), proposed_state)
            .await
    }

    pub async fn plan_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        proposed_state: Value,
    ) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(
                resource_type,
                Some(prior_state),
                proposed_state.clone(),
                proposed_state,
            )
            .await
    }

    pub async fn plan_destroy(&self, resource_type: &str, prior_state: Value) -> Result<PlanResult, ProviderError> {
        self.provider
            .plan(resource_type, Some(prior_state), Value::Null, Value::Null)
            .await
    }

    pub async fn create(&self, resource_type: &str, planned_state: Value) -> Result<Value, ProviderError> {
        self.provider.create(resource_type, planned_state).await
    }

    /// Read state; `None` when the resource is gone.
    pub async fn read(&self, resource_type: &str, current_state: Value) -> Result<Option<Value>, ProviderError> {
        self.provider.read(resource_type, current_state).await
    }

    /// Read state, treating an absent resource as a failure.
    pub async fn read_existing(&self, resource_type: &str, current_state: Value) -> Result<Value, TestError> {
        self.read(resource_type, current_state)
            .await?
            .ok_or_else(|| TestError::Absent(resource_type.to_string()))
    }

    pub async fn update(
        &self,
        resource_type: &str,
        prior_state: Value,
        planned_state: Value,
    ) -> Result<Value, ProviderError> {
        self.provider
            .update(resource_type, prior_state, planned_state)
            .await
    }

    pub async fn delete(&self, resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
        self.provider.delete(resource_type, current_state).await
    }

    pub async fn import_resource(&self, resource_type: &str, id: &str) -> Result<Vec<ImportedResource>, ProviderError> {
        self.provider.import_resource(resource_type, id).await
    }

    // =========================================================================
    // Data Source Operations
    // =========================================================================

    pub async fn validate_data_source_config(&self, data_source_type: &str, config: Value) -> Result<(), TestError> {
        let diagnostics = self
            .provider
            .validate_data_source_config(data_source_type, config)
            .await?;
        check_diagnostics(diagnostics)
    }

    pub async fn read_data_source(&self, data_source_type: &str, config: Value) -> Result<Value, ProviderError> {
        self.provider
            .read_data_source(data_source_type, config)
            .await
    }

    // =========================================================================
    // Lifecycle Helpers
    // =========================================================================

    /// validate → plan → create → read. Returns the state after read.
    pub async fn lifecycle_create(&self, resource_type: &str, config: Value) -> Result<Value, TestError> {
        self.validate_resource_config(resource_type, config.clone())
            .await?;
        let plan = self.plan_create(resource_type, config).await?;
        let created = self.create(resource_type, plan.planned_state).await?;
        self.read_existing(resource_type, created).await
    }

    /// plan → update → read. Returns the state after read.
    pub async fn lifecycle_update(
        &self,
        resource_type: &str,
        prior_state: Value,
        config: Value,
    ) -> Result<Value, TestError> {
        let plan = self
            .plan_update(resource_type, prior_state.clone(), config)
            .await?;
        if plan.requires_replace {
            return Err(TestError::Replacement(resource_type.to_string()));
        }
        let updated = self
            .update(resource_type, prior_state, plan.planned_state)
            .await?;
        self.read_existing(resource_type, updated).await
    }

    /// plan destroy → delete → read, which must report the resource gone.
    pub async fn lifecycle_delete(&self, resource_type: &str, current_state: Value) -> Result<(), TestError> {
        self.plan_destroy(resource_type, current_state.clone())
            .await?;
        self.delete(resource_type, current_state.clone()).await?;
        match self.read(resource_type, current_state).await? {
            None => Ok(()),
            Some(_) => Err(TestError::StillPresent(resource_type.to_string())),
        }
    }

    /// create → update → delete. Returns the state after the update.
    pub async fn lifecycle_crud(
        &self,
        resource_type: &str,
        initial_config: Value,
        updated_config: Value,
    ) -> Result<Value, TestError> {
        let created = self.lifecycle_create(resource_type, initial_config).await?;
        let updated = self
            .lifecycle_update(resource_type, created, updated_config)
            .await?;
        self.lifecycle_delete(resource_type, updated.clone())
            .await?;
        Ok(updated)
    }
}

/// Failure of a tester call.
#[derive(Debug, Error)]
pub enum TestError {
    /// Validation or configuration produced error diagnostics.
    #[error("{}", format_diagnostics(.0))]
    Diagnostics(Vec<Diagnostic>),
    /// The provider returned an error.
    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
    /// A read found nothing where a resource was expected.
    #[error("{0} is absent after the operation")]
    Absent(String),
    /// A read after delete still found the resource.
    #[error("{0} still exists after delete")]
    StillPresent(String),
    /// An update plan asked for replacement.
    #[error("{0} update requires replacement")]
    Replacement(String),
}

fn format_diagnostics(diagnostics: &[Diagnostic]) -> String {
    let mut out = format!("Operation failed with {} diagnostic(s):", diagnostics.len());
    for diag in diagnostics {
        out.push_str(&format!("\n  [{:?}] {}", diag.severity, diag.summary));
        if let Some(detail) = &diag.detail {
            out.push_str(&format!(": {}", detail));
        }
        if let Some(attr) = &diag.attribute {
            out.push_str(&format!(" (at {})", attr));
        }
    }
    out
}

fn check_diagnostics(diagnostics: Vec<Diagnostic>) -> Result<(), TestError> {
    let errors: Vec<_> = diagnostics.into_iter().filter(Diagnostic::is_error).collect();
    if errors.is_empty() {
        Ok(())
    } else {
        Err(TestError::Diagnostics(errors))
    }
}

// =========================================================================
// State Helpers
// =========================================================================

/// Look up a dotted attribute path in state.
///
/// Numeric segments index lists (`source.0.repo`); a trailing `#` yields the
/// element count of a list (`tags.#`). Null counts as an empty list.
pub fn attr(state: &Value, path: &str) -> Option<Value> {
    let mut current = state;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        if segment == "#" && segments.peek().is_none() {
            return match current {
                Value::Array(items) => Some(Value::from(items.len())),
                Value::Null => Some(Value::from(0)),
                _ => None,
            };
        }
        current = match current {
            Value::Array(items) => items.get(segment.parse::<usize>().ok()?)?,
            Value::Object(map) => map.get(segment)?,
            _ => return None,
        };
    }
    Some(current.clone())
}

/// Assert a state attribute equals `expected`.
///
/// # Panics
///
/// Panics if the attribute is missing or differs.
pub fn assert_attr(state: &Value, path: &str, expected: Value) {
    let actual = attr(state, path);
    assert_eq!(
        actual.as_ref(),
        Some(&expected),
        "attribute '{}' mismatch in state {}",
        path,
        state
    );
}

/// Assert a state attribute is set to a non-empty value.
///
/// # Panics
///
/// Panics if the attribute is missing, null, an empty string or an empty list.
pub fn assert_attr_set(state: &Value, path: &str) {
    let set = match attr(state, path) {
        None | Some(Value::Null) => false,
        Some(Value::String(s)) => !s.is_empty(),
        Some(Value::Array(items)) => !items.is_empty(),
        Some(_) => true,
    };
    assert!(set, "expected attribute '{}' to be set in state {}", path, state);
}

// =========================================================================
// Assertion Helpers
// =========================================================================

/// Assert a plan creates the resource.
///
/// # Panics
///
/// Panics if the plan has no changes or requires replacement.
pub fn assert_plan_creates(plan: &PlanResult) {
    assert!(
        !plan.changes.is_empty(),
        "Expected plan to have changes for create, but got no changes"
    );
    assert!(!plan.requires_replace, "Expected plan to create, not replace");
}

/// # Panics
///
/// Panics if the plan has any changes.
pub fn assert_plan_no_changes(plan: &PlanResult) {
    assert!(
        plan.changes.is_empty(),
        "Expected no changes, but got {} change(s): {:?}",
        plan.changes.len(),
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// # Panics
///
/// Panics if the plan does not require replacement.
pub fn assert_plan_replaces(plan: &PlanResult) {
    assert!(
        plan.requires_replace,
        "Expected plan to require replacement, but it does not"
    );
}

/// # Panics
///
/// Panics if the plan requires replacement.
pub fn assert_plan_updates_in_place(plan: &PlanResult) {
    assert!(
        !plan.requires_replace,
        "Expected plan to update in place, but it requires replacement"
    );
}

/// Assert a plan destroys the resource.
///
/// # Panics
///
/// Panics if the planned state is not null.
pub fn assert_plan_destroys(plan: &PlanResult) {
    assert!(
        plan.planned_state.is_null(),
        "Expected plan to destroy, but planned state is {}",
        plan.planned_state
    );
}

/// # Panics
///
/// Panics if the plan does not change `path`.
pub fn assert_plan_changes_attribute(plan: &PlanResult, path: &str) {
    assert!(
        plan.changes.iter().any(|c| c.path == path),
        "Expected plan to change attribute '{}', but it was not changed. Changed attributes: {:?}",
        path,
        plan.changes.iter().map(|c| &c.path).collect::<Vec<_>>()
    );
}

/// # Panics
///
/// Panics if the plan changes `path`.
pub fn assert_plan_does_not_change_attribute(plan: &PlanResult, path: &str) {
    assert!(
        !plan.changes.iter().any(|c| c.path == path),
        "Expected plan to not change attribute '{}', but it was changed",
        path
    );
}

/// # Panics
///
/// Panics if there are any error diagnostics.
pub fn assert_no_errors(diagnostics: &[Diagnostic]) {
    let errors: Vec<_> = diagnostics.iter().filter(|d| d.is_error()).collect();
    assert!(
        errors.is_empty(),
        "Expected no errors, but got {} error(s): {:?}",
        errors.len(),
        errors.iter().map(|d| &d.summary).collect::<Vec<_>>()
    );
}

/// # Panics
///
/// Panics if there are no error diagnostics.
pub fn assert_has_errors(diagnostics: &[Diagnostic]) {
    assert!(
        diagnostics.iter().any(Diagnostic::is_error),
        "Expected at least one error, but got none"
    );
}

/// Assert an error diagnostic mentions `substring` and points at `attribute`.
///
/// # Panics
///
/// Panics if no error diagnostic matches both.
pub fn assert_error_at(diagnostics: &[Diagnostic], attribute: &str, substring: &str) {
    let found = diagnostics.iter().any(|d| {
        d.is_error() && d.attribute.as_deref() == Some(attribute) && d.summary.contains(substring)
    });
    assert!(
        found,
        "Expected an error at '{}' containing '{}', got: {:?}",
        attribute,
        substring,
        diagnostics
            .iter()
            .map(|d| (&d.attribute, &d.summary))
            .collect::<Vec<_>>()
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{DiagnosticSeverity, Schema};
    use crate::mapping::{Field, FieldKind};
    use std::collections::HashMap;
    use std::sync::Mutex;

    const NOTE_FIELDS: &[Field] = &[
        Field::required("identifier", FieldKind::String, "Identifier.").force_new(),
        Field::optional("text", FieldKind::String, "Text."),
        Field::computed("id", FieldKind::String, "Stored id."),
    ];

    /// Keeps notes in memory, keyed by identifier.
    #[derive(Default)]
    struct NoteProvider {
        notes: Mutex<HashMap<String, Value>>,
    }

    #[async_trait::async_trait]
    impl ProviderService for NoteProvider {
        fn schema(&self) -> ProviderSchema {
            ProviderSchema::new().with_resource("note", Schema::v0().with_fields(NOTE_FIELDS))
        }

        async fn configure(&self, _config: Value) -> Result<Vec<Diagnostic>, ProviderError> {
            Ok(vec![])
        }

        async fn plan(
            &self,
            _resource_type: &str,
            prior_state: Option<Value>,
            proposed_state: Value,
            _config: Value,
        ) -> Result<PlanResult, ProviderError> {
            let schema = Schema::v0().with_fields(NOTE_FIELDS);
            Ok(crate::plan::plan(&schema, prior_state.as_ref(), &proposed_state))
        }

        async fn create(&self, _resource_type: &str, mut planned_state: Value) -> Result<Value, ProviderError> {
            planned_state["id"] = planned_state["identifier"].clone();
            let id = planned_state["id"].as_str().unwrap_or_default().to_string();
            self.notes.lock().unwrap().insert(id, planned_state.clone());
            Ok(planned_state)
        }

        async fn read(&self, _resource_type: &str, current_state: Value) -> Result<Option<Value>, ProviderError> {
            let id = current_state["identifier"].as_str().unwrap_or_default();
            Ok(self.notes.lock().unwrap().get(id).cloned())
        }

        async fn update(
            &self,
            resource_type: &str,
            _prior_state: Value,
            planned_state: Value,
        ) -> Result<Value, ProviderError> {
            self.create(resource_type, planned_state).await
        }

        async fn delete(&self, _resource_type: &str, current_state: Value) -> Result<(), ProviderError> {
            let id = current_state["identifier"].as_str().unwrap_or_default();
            self.notes.lock().unwrap().remove(id);
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_lifecycle_crud() {
        let tester = ProviderTester::new(NoteProvider::default());
        let state = tester
            .lifecycle_crud(
                "note",
                json!({"identifier": "n1", "text": "first"}),
                json!({"identifier": "n1", "text": "second"}),
            )
            .await
            .unwrap();

        assert_attr(&state, "text", json!("second"));
        assert_attr(&state, "id", json!("n1"));
        assert!(tester.provider().notes.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_lifecycle_update_rejects_replacement() {
        let tester = ProviderTester::new(NoteProvider::default());
        let created = tester
            .lifecycle_create("note", json!({"identifier": "n1"}))
            .await
            .unwrap();

        let err = tester
            .lifecycle_update("note", created, json!({"identifier": "n2"}))
            .await
            .unwrap_err();
        assert!(matches!(err, TestError::Replacement(_)));
    }

    #[tokio::test]
    async fn test_read_existing_reports_absent() {
        let tester = ProviderTester::new(NoteProvider::default());
        let err = tester
            .read_existing("note", json!({"identifier": "missing"}))
            .await
            .unwrap_err();
        assert_eq!(err.to_string(), "note is absent after the operation");
    }

    #[tokio::test]
    async fn test_plan_helpers() {
        let tester = ProviderTester::new(NoteProvider::default());
        let prior = json!({"id": "n1", "identifier": "n1", "text": "a"});

        let plan = tester.plan_create("note", json!({"identifier": "n1"})).await.unwrap();
        assert_plan_creates(&plan);

        let plan = tester.plan_update("note", prior.clone(), prior.clone()).await.unwrap();
        assert_plan_no_changes(&plan);

        let plan = tester
            .plan_update("note", prior.clone(), json!({"identifier": "n1", "text": "b"}))
            .await
            .unwrap();
        assert_plan_changes_attribute(&plan, "text");
        assert_plan_does_not_change_attribute(&plan, "id");
        assert_plan_updates_in_place(&plan);

        let plan = tester
            .plan_update("note", prior.clone(), json!({"identifier": "n9"}))
            .await
            .unwrap();
        assert_plan_replaces(&plan);

        let plan = tester.plan_destroy("note", prior).await.unwrap();
        assert_plan_destroys(&plan);
    }

    #[test]
    fn test_attr_paths() {
        let state = json!({
            "tags": ["a:1", "b:2"],
            "source": [{"repo": "octo/hello"}],
            "delegate_selectors": null
        });

        assert_eq!(attr(&state, "tags.#"), Some(json!(2)));
        assert_eq!(attr(&state, "delegate_selectors.#"), Some(json!(0)));
        assert_eq!(attr(&state, "source.0.repo"), Some(json!("octo/hello")));
        assert_eq!(attr(&state, "source.1.repo"), None);
        assert_eq!(attr(&state, "missing"), None);

        assert_attr_set(&state, "source.0.repo");
    }

    #[test]
    #[should_panic(expected = "expected attribute 'delegate_selectors' to be set")]
    fn test_assert_attr_set_fails_on_null() {
        assert_attr_set(&json!({"delegate_selectors": null}), "delegate_selectors");
    }

    #[test]
    #[should_panic(expected = "Expected no errors")]
    fn test_assert_no_errors_fails() {
        assert_no_errors(&[Diagnostic::error("An error")]);
    }

    #[test]
    fn test_diagnostic_assertions() {
        let diagnostics = vec![
            Diagnostic::warning("Just a warning"),
            Diagnostic::error("Invalid value 'Org' for attribute 'connection_type'")
                .with_attribute("connection_type"),
        ];
        assert_has_errors(&diagnostics);
        assert_error_at(&diagnostics, "connection_type", "Invalid value");
        assert_no_errors(&diagnostics[..1]);
    }

    #[test]
    fn test_error_display() {
        let err = TestError::Diagnostics(vec![
            Diagnostic::error("First error").with_attribute("field1"),
            Diagnostic {
                severity: DiagnosticSeverity::Error,
                summary: "Second error".to_string(),
                detail: Some("More info".to_string()),
                attribute: None,
            },
        ]);

        let display = err.to_string();
        assert!(display.contains("2 diagnostic(s)"));
        assert!(display.contains("First error"));
        assert!(display.contains("(at field1)"));
        assert!(display.contains("Second error: More info"));
    }
}
