//! Loader facade: fetch, then build a model on a worker
//!
//! Progress crosses from the engine to the main schedule through a channel;
//! the result comes back as a Bevy [`Task`].

use crate::config::ViewerConfig;
use crate::fetch::{HttpFetcher, PayloadFetcher};
use bevy::prelude::*;
use bevy::tasks::{AsyncComputeTaskPool, IoTaskPool, Task};
use crossbeam_channel::{Receiver, Sender};
use ifc_vision_model::{
    EngineSettings, GeometryEngine, LoaderError, ModelGeometry, Payload, ProgressCallback,
    ResolvedSource,
};
use ifc_vision_parser::StepEngine;
use std::sync::Arc;

/// One progress report from the engine
#[derive(Clone, Debug, PartialEq)]
pub struct LoadProgress {
    pub phase: String,
    /// Clamped to 0..=100
    pub percent: f32,
}

/// An in-flight load
pub struct PendingLoad {
    pub task: Task<Result<ModelGeometry, LoaderError>>,
    pub progress: Receiver<LoadProgress>,
}

/// Wraps the geometry engine and the payload fetcher
#[derive(Resource, Clone)]
pub struct LoaderFacade {
    engine: Arc<dyn GeometryEngine>,
    fetcher: Arc<dyn PayloadFetcher>,
    pub settings: EngineSettings,
    /// Run the engine on the async compute pool instead of the load task
    pub offload_to_worker: bool,
}

impl Default for LoaderFacade {
    fn default() -> Self {
        Self::new(Arc::new(StepEngine::new()), Arc::new(HttpFetcher::default()))
    }
}

impl LoaderFacade {
    pub fn new(engine: Arc<dyn GeometryEngine>, fetcher: Arc<dyn PayloadFetcher>) -> Self {
        Self {
            engine,
            fetcher,
            settings: EngineSettings::default(),
            offload_to_worker: true,
        }
    }

    /// Bundled engine configured from the viewer config
    pub fn from_config(config: &ViewerConfig) -> Self {
        let fetcher = HttpFetcher {
            max_bytes: config.loader.max_download_bytes,
        };
        Self {
            settings: config.engine.clone(),
            offload_to_worker: config.loader.offload_to_worker,
            ..Self::new(Arc::new(StepEngine::new()), Arc::new(fetcher))
        }
    }

    pub fn engine_name(&self) -> &str {
        self.engine.name()
    }

    /// Start building a model from a resolved source
    ///
    /// Must be called with the IO pool initialised (any Bevy app with
    /// `TaskPoolPlugin`).
    pub fn load(&self, source: ResolvedSource) -> PendingLoad {
        let (tx, rx) = crossbeam_channel::unbounded();
        let engine = self.engine.clone();
        let fetcher = self.fetcher.clone();
        let settings = self.settings.clone();
        let offload = self.offload_to_worker;
        let name = source.descriptor.display_name.clone();

        log::info!(
            "[Loader] Building {} with {} engine",
            name,
            self.engine.name()
        );

        let task = IoTaskPool::get().spawn(async move {
            let bytes = match source.payload {
                Payload::Bytes(bytes) => bytes,
                Payload::Url(url) => fetcher.fetch(url).await?,
            };
            log::debug!("[Loader] {}: {} bytes", name, bytes.len());

            let build = move || build_model(engine.as_ref(), &bytes, &settings, tx);
            if offload {
                AsyncComputeTaskPool::get().spawn(async move { build() }).await
            } else {
                build()
            }
        });

        PendingLoad { task, progress: rx }
    }
}

fn build_model(
    engine: &dyn GeometryEngine,
    bytes: &[u8],
    settings: &EngineSettings,
    progress: Sender<LoadProgress>,
) -> Result<ModelGeometry, LoaderError> {
    let on_progress: ProgressCallback = Box::new(move |phase: &str, percent: f32| {
        let percent = if percent.is_finite() {
            percent.clamp(0.0, 100.0)
        } else {
            0.0
        };
        // The receiver is gone once the session has ended
        let _ = progress.send(LoadProgress {
            phase: phase.to_string(),
            percent,
        });
    });
    Ok(engine.build(bytes, settings, on_progress)?)
}
