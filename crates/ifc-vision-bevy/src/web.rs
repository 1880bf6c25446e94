//! Browser integration: Dropbox Chooser, `fetch()` and canvas file drops

use crate::config::ViewerConfig;
use crate::controller::LoadController;
use crate::loader::{drive_load_controller, start_session, LoadRejected};
use crate::source::{is_ifc_file, ChooserOptions, ChosenFile, CloudChooser, LocalDrop, SourceAdapter};
use bevy::prelude::*;
use bevy::tasks::BoxedFuture;
use futures_channel::oneshot;
use ifc_vision_model::{LoaderError, ResolveError};
use js_sys::{Array, Function, Object, Reflect, Uint8Array};
use std::cell::RefCell;
use std::rc::Rc;
use std::sync::{Arc, Mutex};
use wasm_bindgen::closure::Closure;
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;

const DROPBOX_SCRIPT_ID: &str = "dropboxjs";
const DROPBOX_SCRIPT_URL: &str = "https://www.dropbox.com/static/api/2/dropins.js";

/// Browser-only load sources
pub struct WebSourcesPlugin;

impl Plugin for WebSourcesPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<ViewerConfig>()
            .init_resource::<WebDropQueue>()
            .add_systems(Startup, (load_dropbox_script, install_drop_listeners))
            .add_systems(Update, drain_web_drops.before(drive_load_controller));
    }
}

fn chooser_error(msg: impl Into<String>) -> ResolveError {
    ResolveError::Chooser(msg.into())
}

fn js_chooser_error(err: JsValue) -> ResolveError {
    chooser_error(format!("{:?}", err))
}

/// Dropbox Chooser (`window.Dropbox.choose`)
///
/// Needs the drop-ins script, see [`ensure_dropbox_script`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DropboxChooser;

impl CloudChooser for DropboxChooser {
    fn label(&self) -> &str {
        "Dropbox"
    }

    fn choose(
        &self,
        options: &ChooserOptions,
    ) -> BoxedFuture<'static, Result<Option<ChosenFile>, ResolveError>> {
        let extensions = options.extensions.clone();
        Box::pin(async move { choose_dropbox(&extensions).await })
    }
}

async fn choose_dropbox(extensions: &[String]) -> Result<Option<ChosenFile>, ResolveError> {
    let window = web_sys::window().ok_or_else(|| chooser_error("no window"))?;
    let dropbox = Reflect::get(&window, &"Dropbox".into()).map_err(js_chooser_error)?;
    if dropbox.is_undefined() {
        return Err(chooser_error("Dropbox Chooser is not loaded (missing app key?)"));
    }
    let choose: Function = Reflect::get(&dropbox, &"choose".into())
        .map_err(js_chooser_error)?
        .dyn_into()
        .map_err(|_| chooser_error("Dropbox.choose is not a function"))?;

    // Exactly one of the callbacks fires
    let (tx, rx) = oneshot::channel::<Option<JsValue>>();
    let tx = Rc::new(RefCell::new(Some(tx)));

    let on_success = {
        let tx = tx.clone();
        Closure::wrap(Box::new(move |files: JsValue| {
            if let Some(tx) = tx.borrow_mut().take() {
                let _ = tx.send(Some(files));
            }
        }) as Box<dyn FnMut(JsValue)>)
    };
    let on_cancel = Closure::wrap(Box::new(move || {
        if let Some(tx) = tx.borrow_mut().take() {
            let _ = tx.send(None);
        }
    }) as Box<dyn FnMut()>);

    let options = Object::new();
    let set = |key: &str, value: &JsValue| {
        Reflect::set(&options, &key.into(), value).map_err(js_chooser_error)
    };
    let extensions: Array = extensions.iter().map(|ext| JsValue::from_str(ext)).collect();
    set("success", on_success.as_ref())?;
    set("cancel", on_cancel.as_ref())?;
    set("linkType", &JsValue::from_str("direct"))?;
    set("multiselect", &JsValue::FALSE)?;
    set("extensions", &extensions)?;
    set("folderselect", &JsValue::FALSE)?;

    log::debug!("[Source] Opening Dropbox Chooser");
    choose.call1(&dropbox, &options).map_err(js_chooser_error)?;

    let files = rx
        .await
        .map_err(|_| chooser_error("Dropbox Chooser closed without a result"))?;
    drop((on_success, on_cancel));

    let Some(files) = files else {
        return Ok(None);
    };
    let file = Array::from(&files).get(0);
    if file.is_undefined() {
        return Ok(None);
    }

    let string_field = |key: &str| {
        Reflect::get(&file, &key.into())
            .ok()
            .and_then(|v| v.as_string())
            .ok_or_else(|| chooser_error(format!("Dropbox result has no '{}'", key)))
    };
    Ok(Some(ChosenFile {
        name: string_field("name")?,
        link: string_field("link")?,
        bytes: Reflect::get(&file, &"bytes".into())
            .ok()
            .and_then(|v| v.as_f64())
            .map(|b| b as u64),
    }))
}

/// Add the Dropbox drop-ins script to the page once
pub fn ensure_dropbox_script(app_key: &str) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    if document.get_element_by_id(DROPBOX_SCRIPT_ID).is_some() {
        return Ok(());
    }

    let script = document.create_element("script")?;
    script.set_id(DROPBOX_SCRIPT_ID);
    script.set_attribute("src", DROPBOX_SCRIPT_URL)?;
    script.set_attribute("type", "text/javascript")?;
    script.set_attribute("data-app-key", app_key)?;
    let head = document
        .head()
        .ok_or_else(|| JsValue::from_str("no <head>"))?;
    head.append_child(&script)?;
    log::info!("[Source] Dropbox Chooser script added");
    Ok(())
}

fn load_dropbox_script(config: Res<ViewerConfig>) {
    let Some(app_key) = config.chooser.app_key.as_deref() else {
        log::debug!("[Source] No Dropbox app key configured");
        return;
    };
    if let Err(err) = ensure_dropbox_script(app_key) {
        log::error!("[Source] Failed to add Dropbox script: {:?}", err);
    }
}

/// Download `url` with the browser's `fetch()`
pub async fn fetch_bytes(url: String) -> Result<Arc<[u8]>, LoaderError> {
    let io = |what: &str, err: JsValue| LoaderError::io(format!("{}: {} ({:?})", url, what, err));

    let window = web_sys::window().ok_or_else(|| LoaderError::io("no window"))?;
    log::info!("[Fetch] GET {}", url);
    let response = JsFuture::from(window.fetch_with_str(&url))
        .await
        .map_err(|e| io("fetch failed", e))?;
    let response: web_sys::Response = response
        .dyn_into()
        .map_err(|e| io("not a Response", e))?;
    if !response.ok() {
        return Err(LoaderError::io(format!(
            "{}: HTTP {}",
            url,
            response.status()
        )));
    }
    let buffer = JsFuture::from(response.array_buffer().map_err(|e| io("no body", e))?)
        .await
        .map_err(|e| io("failed to read body", e))?;
    let bytes = Uint8Array::new(&buffer).to_vec();
    log::debug!("[Fetch] {} bytes from {}", bytes.len(), url);
    Ok(Arc::from(bytes))
}

/// Files dropped on the canvas, read by the DOM listener
#[derive(Resource, Clone, Default)]
pub struct WebDropQueue(Arc<Mutex<Vec<LocalDrop>>>);

impl WebDropQueue {
    fn push(&self, drop: LocalDrop) {
        if let Ok(mut queue) = self.0.lock() {
            queue.push(drop);
        }
    }

    fn take(&self) -> Vec<LocalDrop> {
        self.0
            .lock()
            .map(|mut queue| std::mem::take(&mut *queue))
            .unwrap_or_default()
    }
}

fn install_drop_listeners(config: Res<ViewerConfig>, queue: Res<WebDropQueue>) {
    if let Err(err) = add_drop_listeners(&config.window.canvas, (*queue).clone()) {
        log::error!("[Source] Failed to install drop listeners: {:?}", err);
    }
}

fn add_drop_listeners(selector: &str, queue: WebDropQueue) -> Result<(), JsValue> {
    let document = web_sys::window()
        .and_then(|w| w.document())
        .ok_or_else(|| JsValue::from_str("no document"))?;
    let canvas = document
        .query_selector(selector)?
        .ok_or_else(|| JsValue::from_str(&format!("no element matches {}", selector)))?;

    let on_dragover = Closure::wrap(Box::new(|event: web_sys::DragEvent| {
        event.prevent_default();
    }) as Box<dyn FnMut(web_sys::DragEvent)>);

    let on_drop = Closure::wrap(Box::new(move |event: web_sys::DragEvent| {
        event.prevent_default();
        let Some(files) = event.data_transfer().and_then(|dt| dt.files()) else {
            return;
        };
        for index in 0..files.length() {
            let Some(file) = files.get(index) else {
                continue;
            };
            let name = file.name();
            if !is_ifc_file(&name) {
                log::debug!("[Loader] Ignoring non-IFC drop: {}", name);
                continue;
            }
            log::info!("[Loader] File dropped: {}", name);
            let queue = queue.clone();
            wasm_bindgen_futures::spawn_local(async move {
                let file = gloo_file::File::from(file);
                match gloo_file::futures::read_as_bytes(&file).await {
                    Ok(bytes) => queue.push(LocalDrop::from_bytes(name, bytes)),
                    Err(err) => log::error!("[Loader] Failed to read {}: {}", name, err),
                }
            });
        }
    }) as Box<dyn FnMut(web_sys::DragEvent)>);

    canvas.add_event_listener_with_callback("dragover", on_dragover.as_ref().unchecked_ref())?;
    canvas.add_event_listener_with_callback("drop", on_drop.as_ref().unchecked_ref())?;
    // Listeners live as long as the page
    on_dragover.forget();
    on_drop.forget();

    log::debug!("[Source] Drop listeners installed on {}", selector);
    Ok(())
}

fn drain_web_drops(
    queue: Res<WebDropQueue>,
    mut controller: ResMut<LoadController>,
    mut rejected: MessageWriter<LoadRejected>,
) {
    for drop in queue.take() {
        start_session(&mut controller, SourceAdapter::LocalDrop(drop), &mut rejected);
    }
}
