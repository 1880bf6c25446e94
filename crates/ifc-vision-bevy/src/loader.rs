//! Load triggers and the per-frame controller system
//!
//! File drops, `LoadLocalFile` and `OpenCloudPicker` messages become
//! [`SourceAdapter`]s and are handed to the [`LoadController`]. Once per frame
//! [`drive_load_controller`] polls the active session and publishes what
//! happened as messages and UI resources.

use crate::config::ViewerConfig;
use crate::controller::{ControllerEvent, LoadController};
use crate::facade::LoaderFacade;
use crate::notify::{NotificationMessage, Notifications, ProgressIndicator};
use crate::scene::ModelScene;
use crate::source::{
    is_ifc_file, platform_chooser, ChooserOptions, CloudChooser, CloudPicker, LocalDrop,
    SourceAdapter,
};
use bevy::prelude::*;
use bevy::window::FileDragAndDrop;
use ifc_vision_model::{LoadError, LoadState, SessionId};
use std::path::PathBuf;
use std::sync::Arc;

/// Plugin for model acquisition
///
/// Resources inserted before this plugin (a custom [`LoaderFacade`] or
/// [`CloudPickerBackend`]) are kept.
pub struct LoaderPlugin;

impl Plugin for LoaderPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerConfig>();
        let config = app.world().resource::<ViewerConfig>().clone();

        if !app.world().contains_resource::<LoaderFacade>() {
            app.insert_resource(LoaderFacade::from_config(&config));
        }
        if !app.world().contains_resource::<CloudPickerBackend>() {
            app.insert_resource(CloudPickerBackend::new(platform_chooser(), &config));
        }

        app.add_message::<FileDragAndDrop>()
            .add_message::<OpenCloudPicker>()
            .add_message::<LoadLocalFile>()
            .add_message::<LoadRejected>()
            .add_message::<LoadStateChanged>()
            .add_message::<NotificationMessage>()
            .init_resource::<LoadController>()
            .insert_resource(Notifications::with_capacity(
                config.notifications.max_visible,
            ))
            .init_resource::<ProgressIndicator>()
            .add_systems(
                Update,
                (
                    handle_file_drop,
                    handle_load_local_file,
                    handle_open_cloud_picker,
                    drive_load_controller,
                )
                    .chain(),
            );
    }
}

/// Message to open the cloud picker
#[derive(Message, Clone, Debug, Default)]
pub struct OpenCloudPicker;

/// Message to load a file from disk (CLI argument, native drops)
#[derive(Message, Clone, Debug)]
pub struct LoadLocalFile {
    pub path: PathBuf,
}

/// Emitted when a trigger arrives while a session is active
#[derive(Message, Clone, Debug)]
pub struct LoadRejected {
    pub source: String,
    pub error: LoadError,
}

/// Emitted for every controller state transition
#[derive(Message, Clone, Debug, PartialEq)]
pub struct LoadStateChanged {
    pub session: SessionId,
    pub from: LoadState,
    pub to: LoadState,
}

/// Chooser used for [`OpenCloudPicker`] requests
#[derive(Resource, Clone)]
pub struct CloudPickerBackend {
    pub chooser: Arc<dyn CloudChooser>,
    pub options: ChooserOptions,
}

impl CloudPickerBackend {
    pub fn new(chooser: Arc<dyn CloudChooser>, config: &ViewerConfig) -> Self {
        Self {
            chooser,
            options: (&config.chooser).into(),
        }
    }
}

/// Hand `adapter` to the controller, reporting a busy rejection
pub(crate) fn start_session(
    controller: &mut LoadController,
    adapter: SourceAdapter,
    rejected: &mut MessageWriter<LoadRejected>,
) {
    let source = adapter.label();
    if let Err(error) = controller.trigger(adapter) {
        log::info!("[Loader] Ignoring {}: {}", source, error);
        rejected.write(LoadRejected { source, error });
    }
}

/// Turn dropped `.ifc` files into load requests
fn handle_file_drop(
    mut drops: MessageReader<FileDragAndDrop>,
    mut load_requests: MessageWriter<LoadLocalFile>,
) {
    for event in drops.read() {
        if let FileDragAndDrop::DroppedFile { path_buf, .. } = event {
            let name = path_buf.to_string_lossy();
            if is_ifc_file(&name) {
                log::info!("[Loader] File dropped: {}", name);
                load_requests.write(LoadLocalFile {
                    path: path_buf.clone(),
                });
            } else {
                log::debug!("[Loader] Ignoring non-IFC drop: {}", name);
            }
        }
    }
}

fn handle_load_local_file(
    mut requests: MessageReader<LoadLocalFile>,
    mut controller: ResMut<LoadController>,
    mut rejected: MessageWriter<LoadRejected>,
) {
    for request in requests.read() {
        let adapter = SourceAdapter::LocalDrop(LocalDrop::from_path(&request.path));
        start_session(&mut controller, adapter, &mut rejected);
    }
}

fn handle_open_cloud_picker(
    mut requests: MessageReader<OpenCloudPicker>,
    backend: Res<CloudPickerBackend>,
    mut controller: ResMut<LoadController>,
    mut rejected: MessageWriter<LoadRejected>,
) {
    for _ in requests.read() {
        let picker = CloudPicker::new(backend.chooser.clone(), backend.options.clone());
        start_session(&mut controller, SourceAdapter::CloudPicker(picker), &mut rejected);
    }
}

/// Poll the active session and publish its events
pub fn drive_load_controller(
    mut controller: ResMut<LoadController>,
    facade: Res<LoaderFacade>,
    mut scene: ResMut<ModelScene>,
    mut notifications: ResMut<Notifications>,
    mut progress: ResMut<ProgressIndicator>,
    mut state_changes: MessageWriter<LoadStateChanged>,
    mut notification_messages: MessageWriter<NotificationMessage>,
) {
    if controller.is_busy() {
        controller.poll(&facade, &mut *scene, &mut *notifications);
    }

    for event in controller.take_events() {
        match event {
            ControllerEvent::StateChanged { session, from, to } => {
                match to {
                    LoadState::Resolving => progress.open(),
                    LoadState::Idle => progress.close(),
                    _ => {}
                }
                state_changes.write(LoadStateChanged { session, from, to });
            }
            ControllerEvent::Progress { phase, percent, .. } => {
                progress.update(&phase, percent);
            }
        }
    }

    for notification in notifications.drain_new() {
        notification_messages.write(NotificationMessage(notification));
    }
}
