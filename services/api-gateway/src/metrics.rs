//! Prometheus counters for the import endpoints.

use fieldops_models::{EntityKind, ImportResult};
use fieldops_utils::MonitoringConfig;
use prometheus::{IntCounterVec, Opts, Registry, TextEncoder};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ImportMode {
    Preview,
    Execute,
}

impl ImportMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Preview => "preview",
            Self::Execute => "execute",
        }
    }
}

#[derive(Clone)]
pub struct ImportMetrics {
    registry: Registry,
    imports: IntCounterVec,
    rows: IntCounterVec,
}

impl ImportMetrics {
    pub fn new(config: &MonitoringConfig) -> prometheus::Result<Self> {
        let registry = Registry::new_custom(Some(config.prometheus_namespace.clone()), None)?;

        let imports = IntCounterVec::new(
            Opts::new("imports_total", "Bulk imports by entity kind, mode and outcome"),
            &["kind", "mode", "outcome"],
        )?;
        let rows = IntCounterVec::new(
            Opts::new("import_rows_total", "Imported rows by entity kind and outcome"),
            &["kind", "outcome"],
        )?;

        registry.register(Box::new(imports.clone()))?;
        registry.register(Box::new(rows.clone()))?;

        Ok(Self {
            registry,
            imports,
            rows,
        })
    }

    pub fn observe(&self, kind: EntityKind, mode: ImportMode, result: &ImportResult) {
        let outcome = if result.success { "success" } else { "rejected" };
        self.imports
            .with_label_values(&[kind.as_str(), mode.as_str(), outcome])
            .inc();

        let rows = [
            ("created", u64::from(result.created)),
            ("updated", u64::from(result.updated)),
            ("invalid", result.errors.len() as u64),
        ];
        for (outcome, count) in rows {
            if count > 0 {
                self.rows.with_label_values(&[kind.as_str(), outcome]).inc_by(count);
            }
        }
    }

    /// An import that aborted on a file or storage error.
    pub fn observe_failure(&self, kind: EntityKind, mode: ImportMode) {
        self.imports
            .with_label_values(&[kind.as_str(), mode.as_str(), "failed"])
            .inc();
    }

    pub fn render(&self) -> prometheus::Result<String> {
        TextEncoder::new().encode_to_string(&self.registry.gather())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn metrics() -> ImportMetrics {
        ImportMetrics::new(&MonitoringConfig {
            metrics_enabled: true,
            prometheus_namespace: "fieldops".to_string(),
        })
        .unwrap()
    }

    #[test]
    fn test_committed_rows_are_counted_by_outcome() {
        let metrics = metrics();
        metrics.observe(EntityKind::Clients, ImportMode::Execute, &ImportResult::committed(3, 2));

        let created = metrics.rows.with_label_values(&["clients", "created"]).get();
        let updated = metrics.rows.with_label_values(&["clients", "updated"]).get();
        assert_eq!(created, 3);
        assert_eq!(updated, 2);

        let text = metrics.render().unwrap();
        assert!(text.contains("fieldops_imports_total"));
        assert!(text.contains("outcome=\"success\""));
    }

    #[test]
    fn test_failures_use_their_own_outcome() {
        let metrics = metrics();
        metrics.observe_failure(EntityKind::Employes, ImportMode::Preview);

        let failed = metrics
            .imports
            .with_label_values(&["employes", "preview", "failed"])
            .get();
        assert_eq!(failed, 1);
    }
}
