//! Install scheduling
//!
//! Executes a resolution plan with bounded parallelism. A package starts
//! only once every prerequisite in the plan is installed; independent
//! packages build concurrently, each inside its own build context. A
//! failure always aborts the failed package's dependents; whether
//! unrelated packages keep building is the failure policy's call.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::defaults;
use crate::core::context::BuildContext;
use crate::core::descriptor::Descriptor;
use crate::core::executor::run_steps;
use crate::core::fetch::fetch_sources;
use crate::core::installer::{publish, render_caveats};
use crate::core::platform::Platform;
use crate::core::resolver::ResolutionPlan;
use crate::core::state::{InstallState, StateTracker};
use crate::error::{BuildError, CellarError};
use crate::infra::download::Fetcher;

/// What to do with unrelated pending builds after a failure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailurePolicy {
    /// Stop launching new builds after the first failure
    #[default]
    FailFast,
    /// Keep building packages whose own prerequisites all succeeded
    BestEffort,
}

/// Options for an install run
#[derive(Debug, Clone)]
pub struct InstallOptions {
    /// Target install prefix
    pub prefix: PathBuf,
    /// Download cache directory
    pub cache_dir: PathBuf,
    /// Maximum concurrent package builds
    pub jobs: usize,
    /// Re-download sources even when cached copies verify
    pub force_fetch: bool,
    /// Failure policy for sibling builds
    pub policy: FailurePolicy,
    /// Platform used for caveat rendering
    pub platform: Platform,
}

impl Default for InstallOptions {
    fn default() -> Self {
        Self {
            prefix: defaults::default_prefix(),
            cache_dir: defaults::default_cache_dir(),
            jobs: defaults::default_jobs(),
            force_fetch: false,
            policy: FailurePolicy::default(),
            platform: Platform::current(),
        }
    }
}

/// Outcome of an install run
#[derive(Debug, Default)]
pub struct InstallReport {
    /// Packages published into the prefix, in completion order
    pub installed: Vec<String>,
    /// Packages already present in the prefix, left untouched
    pub already_installed: Vec<String>,
    /// Packages whose own fetch or build failed
    pub failed: Vec<(String, String)>,
    /// Packages never attempted (failed prerequisite or aborted run)
    pub skipped: Vec<(String, String)>,
    /// Rendered caveats per installed package
    pub caveats: Vec<(String, String)>,
    /// First hard failure, for exit-code classification
    pub first_error: Option<CellarError>,
}

impl InstallReport {
    /// Whether every planned package ended up installed
    pub fn is_success(&self) -> bool {
        self.failed.is_empty() && self.skipped.is_empty()
    }
}

type WorkerResult = (String, Result<Option<String>, CellarError>);

/// Execute `plan` against `options`.
///
/// Cancellation propagates to in-flight build steps and every build
/// context is cleaned up before this returns.
pub async fn run_plan(
    plan: &ResolutionPlan,
    options: &InstallOptions,
    cancel: &CancellationToken,
) -> InstallReport {
    let states = Arc::new(Mutex::new(StateTracker::new(
        plan.iter().map(|d| d.name().to_string()),
    )));
    let semaphore = Arc::new(Semaphore::new(options.jobs.max(1)));
    let fetcher = Fetcher::new();

    // Dependency edges restricted to plan members; membership already
    // encodes the optional-dependency decision.
    let plan_names: Vec<String> = plan.iter().map(|d| d.name().to_string()).collect();
    let gates: HashMap<String, Vec<String>> = plan
        .iter()
        .map(|d| {
            let deps = d
                .dependency_names(true)
                .into_iter()
                .filter(|dep| plan_names.iter().any(|n| n.as_str() == *dep))
                .map(ToString::to_string)
                .collect();
            (d.name().to_string(), deps)
        })
        .collect();

    let mut report = InstallReport::default();
    let mut pending: Vec<Descriptor> = Vec::new();

    for descriptor in plan.iter() {
        let name = descriptor.name();
        states.lock().unwrap().set(name, InstallState::Resolving);

        if options.prefix.join(name).exists() {
            tracing::debug!(package = name, "already installed, skipping");
            states.lock().unwrap().set(name, InstallState::Installed);
            report.already_installed.push(name.to_string());
        } else {
            pending.push(descriptor.clone());
        }
    }

    let mut running: JoinSet<WorkerResult> = JoinSet::new();
    let mut stop_launching = false;

    loop {
        if cancel.is_cancelled() {
            stop_launching = true;
        }

        if !stop_launching {
            launch_ready(
                &gates,
                &states,
                &semaphore,
                &fetcher,
                options,
                cancel,
                &mut pending,
                &mut running,
                &mut report,
            );
        }

        match running.join_next().await {
            Some(Ok((name, Ok(caveats)))) => {
                states.lock().unwrap().set(&name, InstallState::Installed);
                if let Some(text) = caveats {
                    report.caveats.push((name.clone(), text));
                }
                report.installed.push(name);
            }
            Some(Ok((name, Err(error)))) => {
                let reason = error.to_string();
                states
                    .lock()
                    .unwrap()
                    .set(&name, InstallState::Failed(reason.clone()));
                report.failed.push((name, reason));
                if report.first_error.is_none() {
                    report.first_error = Some(error);
                }
                if options.policy == FailurePolicy::FailFast {
                    stop_launching = true;
                }
            }
            Some(Err(join_error)) => {
                // A panicked worker is a bug; surface it and stop.
                if report.first_error.is_none() {
                    report.first_error = Some(CellarError::Generic(join_error.to_string()));
                }
                stop_launching = true;
            }
            None => {
                if pending.is_empty() {
                    break;
                }
                if stop_launching {
                    drain_with_reason(&states, &mut pending, &mut report, "install aborted");
                    break;
                }
                // Nothing is running and nothing became ready: the launch
                // pass will clear packages gated on failures next time
                // around, so only an unschedulable remainder lands here.
                let blocked = drain_blocked(&gates, &states, &mut pending, &mut report);
                if !blocked {
                    drain_with_reason(&states, &mut pending, &mut report, "unschedulable");
                    break;
                }
            }
        }
    }

    report
}

/// Spawn a worker for every pending package whose gates are satisfied and
/// fail those gated on a failed prerequisite.
#[allow(clippy::too_many_arguments)]
fn launch_ready(
    gates: &HashMap<String, Vec<String>>,
    states: &Arc<Mutex<StateTracker>>,
    semaphore: &Arc<Semaphore>,
    fetcher: &Fetcher,
    options: &InstallOptions,
    cancel: &CancellationToken,
    pending: &mut Vec<Descriptor>,
    running: &mut JoinSet<WorkerResult>,
    report: &mut InstallReport,
) {
    let mut index = 0;
    while index < pending.len() {
        let name = pending[index].name().to_string();
        let deps = gates.get(&name).map(Vec::as_slice).unwrap_or_default();

        let (ready, failed_dep) = {
            let tracker = states.lock().unwrap();
            let failed_dep = deps.iter().find(|d| tracker.is_failed(d)).cloned();
            let ready = failed_dep.is_none() && deps.iter().all(|d| tracker.is_installed(d));
            (ready, failed_dep)
        };

        if let Some(dependency) = failed_dep {
            let reason = BuildError::PrerequisiteFailed {
                package: name.clone(),
                dependency,
            }
            .to_string();
            states
                .lock()
                .unwrap()
                .set(&name, InstallState::Failed(reason.clone()));
            report.skipped.push((name, reason));
            pending.remove(index);
            continue;
        }

        if ready {
            let descriptor = pending.remove(index);
            let states = states.clone();
            let semaphore = semaphore.clone();
            let fetcher = fetcher.clone();
            let options = options.clone();
            let cancel = cancel.clone();

            running.spawn(async move {
                let name = descriptor.name().to_string();
                let result =
                    build_one(&descriptor, &states, &semaphore, &fetcher, &options, &cancel).await;
                (name, result)
            });
            continue;
        }

        index += 1;
    }
}

/// Clear pending packages gated on failed prerequisites; returns whether
/// anything was cleared.
fn drain_blocked(
    gates: &HashMap<String, Vec<String>>,
    states: &Arc<Mutex<StateTracker>>,
    pending: &mut Vec<Descriptor>,
    report: &mut InstallReport,
) -> bool {
    let mut cleared = false;
    let mut index = 0;
    while index < pending.len() {
        let name = pending[index].name().to_string();
        let deps = gates.get(&name).map(Vec::as_slice).unwrap_or_default();
        let failed_dep = {
            let tracker = states.lock().unwrap();
            deps.iter().find(|d| tracker.is_failed(d)).cloned()
        };
        if let Some(dependency) = failed_dep {
            let reason = BuildError::PrerequisiteFailed {
                package: name.clone(),
                dependency,
            }
            .to_string();
            states
                .lock()
                .unwrap()
                .set(&name, InstallState::Failed(reason.clone()));
            report.skipped.push((name, reason));
            pending.remove(index);
            cleared = true;
        } else {
            index += 1;
        }
    }
    cleared
}

/// Mark every remaining pending package failed with a shared reason.
fn drain_with_reason(
    states: &Arc<Mutex<StateTracker>>,
    pending: &mut Vec<Descriptor>,
    report: &mut InstallReport,
    reason: &str,
) {
    for descriptor in pending.drain(..) {
        let name = descriptor.name().to_string();
        states
            .lock()
            .unwrap()
            .set(&name, InstallState::Failed(reason.to_string()));
        report.skipped.push((name, reason.to_string()));
    }
}

/// Fetch, build, and publish a single package.
async fn build_one(
    descriptor: &Descriptor,
    states: &Arc<Mutex<StateTracker>>,
    semaphore: &Arc<Semaphore>,
    fetcher: &Fetcher,
    options: &InstallOptions,
    cancel: &CancellationToken,
) -> Result<Option<String>, CellarError> {
    let _permit = semaphore
        .acquire()
        .await
        .map_err(|e| CellarError::Generic(e.to_string()))?;
    let name = descriptor.name();

    states.lock().unwrap().set(name, InstallState::Fetching);
    let outcome = fetch_sources(fetcher, &options.cache_dir, descriptor, options.force_fetch).await?;

    states.lock().unwrap().set(name, InstallState::Building);
    let mut context = BuildContext::create(descriptor, &options.prefix, defaults::default_jobs())?;
    context.stage_inputs(&outcome.sources)?;
    run_steps(descriptor, &context, cancel).await?;

    publish(&context)?;

    Ok(render_caveats(descriptor, &options.prefix, options.platform))
}
