//! Scenario runner.
//!
//! Every configured component gets a named [`Shutter`]. Workers are admitted
//! through [`Shutter::locked_init`] and counted; the terminating callback
//! drains that count and simulates cleanup. Components are bound as the
//! configuration says, the trigger component is shut down after a delay, and
//! the runner waits for the whole graph to settle.

use crate::config::{find_named, AppConfig, ComponentSettings, Named};
use crate::error::DemoError;
use shutter::{register_on_terminated, register_on_terminating, with_name, Shutter, ShutterError, Signal};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

const WORKER_TICK: Duration = Duration::from_millis(10);

/// Outcome of one component after the scenario has run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ComponentReport {
    /// Component name
    pub name: String,
    /// Cause its shutter recorded, `None` for a clean shutdown
    pub cause: Option<String>,
    /// Workers admitted through `locked_init`
    pub workers_started: usize,
    /// Workers the terminating callback found still active
    pub workers_drained: usize,
    /// Whether the shutter reached the terminated phase
    pub terminated: bool,
}

/// Outcome of a whole scenario run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunReport {
    /// Per-component outcomes, in configuration order
    pub components: Vec<ComponentReport>,
    /// Whether a worker started after the trigger was turned away
    pub late_worker_refused: bool,
}

impl RunReport {
    /// Looks up a component's outcome by name.
    pub fn component(&self, name: &str) -> Option<&ComponentReport> {
        find_named(&self.components, name)
    }

    /// Logs one line per component.
    pub fn log_summary(&self) {
        info!("📊 Shutdown summary");
        for component in &self.components {
            info!(
                component = %component.name,
                cause = component.cause.as_deref().unwrap_or("clean"),
                started = component.workers_started,
                drained = component.workers_drained,
                terminated = component.terminated,
                "   {}",
                component.name
            );
        }
    }
}

impl Named for ComponentReport {
    fn name(&self) -> &str {
        &self.name
    }
}

struct Component {
    name: String,
    shutter: Shutter,
    active: Arc<AtomicUsize>,
    drained: Arc<AtomicUsize>,
    started: usize,
}

impl Component {
    fn new(settings: &ComponentSettings) -> Self {
        let active = Arc::new(AtomicUsize::new(0));
        let drained = Arc::new(AtomicUsize::new(0));
        let cleanup = Duration::from_millis(settings.cleanup_ms);

        let terminating = {
            let name = settings.name.clone();
            let active = active.clone();
            let drained = drained.clone();
            register_on_terminating(move |err| {
                let workers = active.swap(0, Ordering::SeqCst);
                drained.store(workers, Ordering::SeqCst);
                let cause = err.map(|e| e.to_string());
                info!(component = %name, workers, ?cause, "🧹 Cleaning up");
                std::thread::sleep(cleanup);
            })
        };
        let terminated = {
            let name = settings.name.clone();
            register_on_terminated(move |_| info!(component = %name, "✅ Terminated"))
        };

        Self {
            name: settings.name.clone(),
            shutter: Shutter::with_options([with_name(settings.name.clone()), terminating, terminated]),
            active,
            drained,
            started: 0,
        }
    }

    /// Admits one worker unless the component is already shutting down.
    fn admit_worker(&self) -> Result<Signal, ShutterError> {
        self.shutter.locked_init(|| {
            self.active.fetch_add(1, Ordering::SeqCst);
            Ok(self.shutter.terminating())
        })
    }

    fn report(&self) -> ComponentReport {
        ComponentReport {
            name: self.name.clone(),
            cause: self.shutter.err().map(|e| e.to_string()),
            workers_started: self.started,
            workers_drained: self.drained.load(Ordering::SeqCst),
            terminated: self.shutter.is_terminated(),
        }
    }
}

impl Named for Component {
    fn name(&self) -> &str {
        &self.name
    }
}

async fn run_worker(component: String, worker: usize, terminating: Signal) -> u64 {
    let mut interval = tokio::time::interval(WORKER_TICK);
    let mut ticks = 0;
    loop {
        tokio::select! {
            _ = terminating.fired() => break,
            _ = interval.tick() => ticks += 1,
        }
    }
    debug!(component = %component, worker, ticks, "Worker stopped");
    ticks
}

/// Runs one scenario described by an [`AppConfig`].
pub struct Application {
    config: AppConfig,
}

impl Application {
    /// Validates `config` and prepares a run.
    pub fn new(config: AppConfig) -> Result<Self, DemoError> {
        config.validate().map_err(DemoError::InvalidConfig)?;
        Ok(Self { config })
    }

    fn find<'a>(components: &'a [Component], name: &str) -> Result<&'a Component, DemoError> {
        find_named(components, name).ok_or_else(|| DemoError::UnknownComponent(name.to_string()))
    }

    /// Plays out the scenario and reports how each component ended.
    pub async fn run(self) -> Result<RunReport, DemoError> {
        let mut components: Vec<Component> = self.config.components.iter().map(Component::new).collect();

        for settings in &self.config.components {
            if let Some(peer) = &settings.bind {
                let component = Self::find(&components, &settings.name)?;
                let peer = Self::find(&components, peer)?;
                info!("🔗 Binding {} <-> {}", component.name, peer.name);
                component.shutter.bind(&peer.shutter);
            }
        }

        let mut workers: Vec<JoinHandle<u64>> = Vec::new();
        for (component, settings) in components.iter_mut().zip(&self.config.components) {
            for worker in 0..settings.workers {
                match component.admit_worker() {
                    Ok(terminating) => {
                        component.started += 1;
                        workers.push(tokio::spawn(run_worker(component.name.clone(), worker, terminating)));
                    }
                    Err(e) => warn!(component = %component.name, worker, "Worker refused: {e}"),
                }
            }
        }
        info!("🚀 Started {} workers across {} components", workers.len(), components.len());

        let scenario = &self.config.scenario;
        tokio::time::sleep(Duration::from_millis(scenario.trigger_after_ms)).await;

        let trigger = Self::find(&components, &scenario.trigger)?;
        info!(
            component = %trigger.name,
            cause = scenario.cause.as_deref().unwrap_or("clean"),
            "🛑 Shutting down"
        );
        let shutter = trigger.shutter.clone();
        let cause = scenario.cause.clone();
        tokio::task::spawn_blocking(move || match cause {
            Some(cause) => shutter.shutdown_with_error(cause),
            None => shutter.shutdown(None),
        })
        .await?;

        let late_worker_refused = match trigger.admit_worker() {
            Ok(_) => false,
            Err(e) => {
                info!(component = %trigger.name, "Late worker refused: {e}");
                true
            }
        };

        // Components outside the trigger's binding graph are still running.
        for component in components.iter().filter(|c| !c.shutter.is_terminating()) {
            info!(component = %component.name, "Not bound to {}, stopping cleanly", trigger.name);
            let shutter = component.shutter.clone();
            tokio::task::spawn_blocking(move || shutter.shutdown(None)).await?;
        }

        for component in &components {
            component.shutter.terminated().fired().await;
        }
        for worker in workers {
            worker.await?;
        }

        Ok(RunReport {
            components: components.iter().map(Component::report).collect(),
            late_worker_refused,
        })
    }
}
