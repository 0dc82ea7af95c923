// src/health/registry.rs
use super::component::Component;
use super::identity::{persistent_service_id, IdentityError};
use super::panic_hook::CheckScope;
use super::report::{HealthzReport, SERVICE_ID_KEY};
use super::status::Status;
use crate::config::HealthzConfig;
use crate::metrics::MetricsCollector;
use std::any::Any;
use std::collections::BTreeMap;
use std::panic::{self, AssertUnwindSafe};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Instant;
use tracing::{debug, error, info, Dispatch};

/// A user supplied health check.
pub trait HealthMonitor: Send + Sync {
    fn check(&self, ctx: &mut CheckContext<'_>) -> Status;
}

impl<F> HealthMonitor for F
where
    F: Fn(&mut CheckContext<'_>) -> Status + Send + Sync,
{
    fn check(&self, ctx: &mut CheckContext<'_>) -> Status {
        self(ctx)
    }
}

/// What a running check may see and touch: its own component record,
/// the notes of the current pass and the report metadata.
pub struct CheckContext<'a> {
    component: &'a mut Component,
    notes: &'a mut Vec<String>,
    metadata: &'a mut BTreeMap<String, String>,
}

impl<'a> CheckContext<'a> {
    pub fn component(&self) -> &Component {
        &*self.component
    }

    pub fn component_mut(&mut self) -> &mut Component {
        &mut *self.component
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn get(&self, key: &str) -> &str {
        self.metadata.get(key).map(String::as_str).unwrap_or("")
    }

    pub fn set(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.metadata.insert(key.into(), value.into());
    }
}

struct RegisteredCheck {
    kind: String,
    name: String,
    monitor: Box<dyn HealthMonitor>,
}

/// Registry of named checks plus the report they feed.
///
/// Checks are registered through `&mut self` before the registry is shared;
/// every aggregation pass then runs under one lock so concurrent requests
/// never interleave notes or component writes.
pub struct Healthz {
    config: HealthzConfig,
    checks: Vec<RegisteredCheck>,
    state: Mutex<HealthzReport>,
    dispatch: Dispatch,
    metrics: Option<Arc<MetricsCollector>>,
}

impl Healthz {
    /// Build a registry logging through the dispatcher current at the call site.
    pub fn new(config: HealthzConfig) -> Result<Self, IdentityError> {
        let dispatch = tracing::dispatcher::get_default(Dispatch::clone);
        Self::with_dispatch(config, dispatch)
    }

    pub fn with_dispatch(config: HealthzConfig, dispatch: Dispatch) -> Result<Self, IdentityError> {
        let service_id = tracing::dispatcher::with_default(&dispatch, || {
            persistent_service_id(&config.service_file)
        })?;

        let mut report = HealthzReport::default();
        report.set(SERVICE_ID_KEY, service_id);
        for (key, value) in [
            ("version", &config.version),
            ("release", &config.release),
            ("description", &config.description),
        ] {
            if !value.is_empty() {
                report.set(key, value.as_str());
            }
        }

        Ok(Self {
            config,
            checks: Vec::new(),
            state: Mutex::new(report),
            dispatch,
            metrics: None,
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<MetricsCollector>) -> Self {
        metrics.set_registered_checks(self.checks.len());
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &HealthzConfig {
        &self.config
    }

    pub fn service_id(&self) -> String {
        self.get(SERVICE_ID_KEY)
    }

    pub fn check_count(&self) -> usize {
        self.checks.len()
    }

    pub fn check_names(&self) -> impl Iterator<Item = &str> {
        self.checks.iter().map(|c| c.name.as_str())
    }

    /// Register `monitor` under `name`. A second registration with the same
    /// name replaces the first one, component record included.
    pub fn add_check<M>(&mut self, kind: impl Into<String>, name: impl Into<String>, monitor: M)
    where
        M: HealthMonitor + 'static,
    {
        let kind = kind.into();
        let name = name.into();

        self.state
            .get_mut()
            .unwrap_or_else(PoisonError::into_inner)
            .details
            .insert(name.clone(), Component::new(kind.clone(), name.clone()));

        let check = RegisteredCheck {
            kind,
            name: name.clone(),
            monitor: Box::new(monitor),
        };
        match self.checks.iter_mut().find(|c| c.name == name) {
            Some(existing) => *existing = check,
            None => self.checks.push(check),
        }

        if let Some(metrics) = &self.metrics {
            metrics.set_registered_checks(self.checks.len());
        }
        self.log(|| info!(check = %name, "Check has been added to health monitor"));
    }

    /// Metadata lookup; a missing key yields an empty string.
    pub fn get(&self, key: &str) -> String {
        self.lock().get(key).to_string()
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.lock().set(key, value);
    }

    /// Last computed report, without running any check.
    pub fn report(&self) -> HealthzReport {
        self.lock().clone()
    }

    /// Run every check once, roll up the overall status and return a
    /// snapshot of the resulting report.
    pub fn aggregate(&self) -> HealthzReport {
        let started = Instant::now();
        let mut report = self.lock();
        report.notes.clear();

        let mut overall = Status::Pass;
        for check in &self.checks {
            let status = self.run_check(check, &mut report);
            report.notes.push(format!("{} {}", check.name, status));
            overall = overall.rollup(status);

            if let Some(metrics) = &self.metrics {
                metrics.record_check(&check.name, status);
            }
        }

        let dropped = report.truncate_notes(self.config.notes_count);
        if dropped > 0 {
            self.log(|| debug!(dropped, limit = self.config.notes_count, "Truncated health notes"));
        }
        report.status = overall;

        if let Some(metrics) = &self.metrics {
            metrics.record_notes_dropped(dropped);
            metrics.record_aggregation(overall, started.elapsed());
        }
        self.log(|| {
            debug!(
                status = %overall,
                checks = self.checks.len(),
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Health aggregation complete"
            )
        });

        report.clone()
    }

    // Fail is the result unless the check returns normally.
    fn run_check(&self, check: &RegisteredCheck, report: &mut HealthzReport) -> Status {
        let HealthzReport {
            notes,
            metadata,
            details,
            ..
        } = report;
        let component = details
            .entry(check.name.clone())
            .or_insert_with(|| Component::new(check.kind.clone(), check.name.clone()));

        let outcome = {
            let mut ctx = CheckContext {
                component: &mut *component,
                notes: &mut *notes,
                metadata: &mut *metadata,
            };
            panic::catch_unwind(AssertUnwindSafe(|| {
                let _scope = CheckScope::enter();
                check.monitor.check(&mut ctx)
            }))
        };

        let status = match outcome {
            Ok(status) => status,
            Err(payload) => {
                let reason = panic_message(payload.as_ref());
                self.log(|| {
                    error!(check = %check.name, %reason, "Recovered from a panic caused by health monitor")
                });
                notes.push(format!("Recovered from a panic caused by HealthMonitor {}", check.name));
                if let Some(metrics) = &self.metrics {
                    metrics.record_panic(&check.name);
                }
                Status::Fail
            }
        };

        component.record(status);
        status
    }

    // A panic inside a check is caught before it can poison the lock, and
    // every pass rebuilds the notes anyway.
    fn lock(&self) -> MutexGuard<'_, HealthzReport> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn log<T>(&self, f: impl FnOnce() -> T) -> T {
        tracing::dispatcher::with_default(&self.dispatch, f)
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> &str {
    payload
        .downcast_ref::<&str>()
        .copied()
        .or_else(|| payload.downcast_ref::<String>().map(String::as_str))
        .unwrap_or("non-string panic payload")
}

#[cfg(test)]
mod tests {
    use super::*;

    fn registry() -> (tempfile::TempDir, Healthz) {
        let dir = tempfile::tempdir().unwrap();
        let config = HealthzConfig {
            service_file: dir.path().join("service").to_string_lossy().into_owned(),
            ..HealthzConfig::default()
        };
        let healthz = Healthz::with_dispatch(config, Dispatch::none()).unwrap();
        (dir, healthz)
    }

    #[test]
    fn service_id_is_stored_as_metadata() {
        let (_dir, healthz) = registry();
        assert!(healthz.service_id().starts_with("api"));
        assert_eq!(healthz.get("missing"), "");
    }

    #[test]
    fn re_registering_replaces_entry() {
        let (_dir, mut healthz) = registry();
        healthz.add_check("db", "x", |_: &mut CheckContext<'_>| Status::Fail);
        healthz.add_check("cache", "x", |_: &mut CheckContext<'_>| Status::Pass);

        assert_eq!(healthz.check_count(), 1);
        let report = healthz.aggregate();
        assert_eq!(report.status, Status::Pass);
        assert_eq!(report.details.len(), 1);
        assert_eq!(report.details["x"].kind, "cache");
    }

    #[test]
    fn check_can_note_and_set_metadata() {
        let (_dir, mut healthz) = registry();
        healthz.add_check("disk", "disk", |ctx: &mut CheckContext<'_>| {
            ctx.note("disk 91% full");
            ctx.set("disk_usage", "91");
            assert_eq!(ctx.component().name, "disk");
            Status::Warning
        });

        let report = healthz.aggregate();
        assert_eq!(report.notes, vec!["disk 91% full", "disk warn"]);
        assert_eq!(report.get("disk_usage"), "91");
        assert_eq!(healthz.get("disk_usage"), "91");
    }

    #[test]
    fn panic_payload_messages() {
        let payload: Box<dyn Any + Send> = Box::new("boom");
        assert_eq!(panic_message(payload.as_ref()), "boom");
        let payload: Box<dyn Any + Send> = Box::new(String::from("bang"));
        assert_eq!(panic_message(payload.as_ref()), "bang");
        let payload: Box<dyn Any + Send> = Box::new(42u8);
        assert_eq!(panic_message(payload.as_ref()), "non-string panic payload");
    }
}
