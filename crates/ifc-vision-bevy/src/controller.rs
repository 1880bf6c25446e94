//! Load controller: one acquisition at a time, end to end
//!
//! ```text
//! trigger ──► Resolving ──► Loading ──► Attaching ──► Idle
//!                 │            │
//!                 │            └──► Failed ──► Idle
//!                 ├──► Cancelled ──► Idle
//!                 └──► Failed ──► Idle
//! ```
//!
//! The controller never blocks: [`LoadController::poll`] is called once per
//! frame and advances the session when its task has finished. The scene is
//! only touched while attaching, so a failed or cancelled load leaves the
//! previous model in place.

use crate::facade::{LoaderFacade, PendingLoad};
use crate::source::SourceAdapter;
use bevy::prelude::*;
use bevy::tasks::{block_on, poll_once, IoTaskPool, Task};
use ifc_vision_model::{
    LoadError, LoadState, ModelNode, Notification, NotificationSink, ResolveError,
    ResolvedSource, SceneHandle, SessionId, SourceDescriptor,
};

/// Observable controller activity
#[derive(Clone, Debug, PartialEq)]
pub enum ControllerEvent {
    StateChanged {
        session: SessionId,
        from: LoadState,
        to: LoadState,
    },
    Progress {
        session: SessionId,
        phase: String,
        percent: f32,
    },
}

enum Phase {
    Resolving(Task<Result<ResolvedSource, ResolveError>>),
    Loading {
        descriptor: SourceDescriptor,
        pending: PendingLoad,
    },
}

/// Drives load sessions and owns their state
#[derive(Resource, Default)]
pub struct LoadController {
    state: LoadState,
    session: Option<SessionId>,
    phase: Option<Phase>,
    /// Set while loading; never decreases
    percent: Option<f32>,
    next_id: u64,
    events: Vec<ControllerEvent>,
}

impl LoadController {
    pub fn state(&self) -> LoadState {
        self.state
    }

    pub fn is_busy(&self) -> bool {
        !self.state.is_idle()
    }

    /// Id of the active session
    pub fn session(&self) -> Option<SessionId> {
        self.session
    }

    /// Progress of the active session; `None` unless loading
    pub fn percent_complete(&self) -> Option<f32> {
        self.percent
    }

    /// Events raised since the last call
    pub fn take_events(&mut self) -> Vec<ControllerEvent> {
        std::mem::take(&mut self.events)
    }

    /// Start a session for `adapter`
    ///
    /// Rejected with [`LoadError::Busy`] while another session is active; the
    /// active session is not affected. Needs the IO task pool.
    pub fn trigger(&mut self, adapter: SourceAdapter) -> Result<SessionId, LoadError> {
        if self.is_busy() {
            log::debug!(
                "[Loader] Busy ({}), rejecting {}",
                self.state,
                adapter.label()
            );
            return Err(LoadError::Busy);
        }

        self.next_id += 1;
        let id = SessionId(self.next_id);
        log::info!("[Loader] {} resolving {}", id, adapter.label());

        self.session = Some(id);
        self.phase = Some(Phase::Resolving(IoTaskPool::get().spawn(adapter.resolve())));
        self.transition(LoadState::Resolving);
        Ok(id)
    }

    /// Advance the active session, if its current step has finished
    pub fn poll(
        &mut self,
        facade: &LoaderFacade,
        scene: &mut dyn SceneHandle,
        sink: &mut dyn NotificationSink,
    ) {
        let Some(phase) = self.phase.take() else {
            return;
        };

        match phase {
            Phase::Resolving(mut task) => match block_on(poll_once(&mut task)) {
                None => self.phase = Some(Phase::Resolving(task)),
                Some(Ok(resolved)) => {
                    sink.notify(Notification::Started {
                        display_name: resolved.descriptor.display_name.clone(),
                    });
                    self.phase = Some(Phase::Loading {
                        descriptor: resolved.descriptor.clone(),
                        pending: facade.load(resolved),
                    });
                    self.percent = Some(0.0);
                    self.transition(LoadState::Loading);
                }
                Some(Err(err)) => self.fail(err.into(), sink),
            },
            Phase::Loading {
                descriptor,
                mut pending,
            } => {
                self.drain_progress(&pending);
                match block_on(poll_once(&mut pending.task)) {
                    None => {
                        self.phase = Some(Phase::Loading {
                            descriptor,
                            pending,
                        })
                    }
                    Some(Ok(geometry)) => {
                        // Everything the worker sent before finishing
                        self.drain_progress(&pending);
                        self.transition(LoadState::Attaching);
                        self.attach(ModelNode::new(descriptor, geometry), scene, sink);
                    }
                    Some(Err(err)) => self.fail(err.into(), sink),
                }
            }
        }
    }

    fn drain_progress(&mut self, pending: &PendingLoad) {
        let Some(session) = self.session else {
            return;
        };
        for report in pending.progress.try_iter() {
            let current = self.percent.unwrap_or(0.0);
            // Regressions are dropped so observers see a monotonic value
            if report.percent < current {
                continue;
            }
            self.percent = Some(report.percent);
            self.events.push(ControllerEvent::Progress {
                session,
                phase: report.phase,
                percent: report.percent,
            });
        }
    }

    fn attach(
        &mut self,
        model: ModelNode,
        scene: &mut dyn SceneHandle,
        sink: &mut dyn NotificationSink,
    ) {
        let descriptor = model.origin.clone();
        scene.reset();
        match scene.attach(model) {
            Ok(()) => {
                log::info!("[Loader] Attached {}", descriptor.display_name);
                sink.notify(Notification::Succeeded {
                    display_name: descriptor.display_name,
                    size_bytes: descriptor.size_bytes,
                });
            }
            Err(err) => {
                log::error!("[Loader] Attach failed: {}", err);
                sink.notify(Notification::Failed {
                    reason: err.to_string(),
                });
            }
        }
        self.transition(LoadState::Idle);
    }

    fn fail(&mut self, err: LoadError, sink: &mut dyn NotificationSink) {
        if err.is_failure() {
            log::warn!("[Loader] Load failed: {}", err);
            self.transition(LoadState::Failed);
            sink.notify(Notification::Failed {
                reason: err.to_string(),
            });
        } else {
            log::info!("[Loader] Selection cancelled");
            self.transition(LoadState::Cancelled);
        }
        self.transition(LoadState::Idle);
    }

    fn transition(&mut self, to: LoadState) {
        let from = self.state;
        debug_assert!(from.can_transition_to(to), "{} -> {}", from, to);
        let session = self.session.unwrap_or_default();
        log::debug!("[Loader] {}: {} -> {}", session, from, to);
        self.state = to;
        self.events.push(ControllerEvent::StateChanged { session, from, to });
        if to.is_idle() {
            self.session = None;
            self.phase = None;
            self.percent = None;
        }
    }
}
