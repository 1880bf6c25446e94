//! Source adapters: where an IFC payload comes from
//!
//! A [`SourceAdapter`] is created at the trigger site (file drop, picker
//! button) and handed to the load controller, which resolves it on the IO pool.

use crate::config::ChooserConfig;
use bevy::tasks::BoxedFuture;
use ifc_vision_model::{ResolveError, ResolvedSource, SourceDescriptor, SourceOrigin};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Whether a file name carries the `.ifc` extension (any case)
pub fn is_ifc_file(name: &str) -> bool {
    Path::new(name)
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("ifc"))
}

/// Where the bytes of a dropped file live
#[derive(Clone, Debug)]
pub enum DropData {
    /// Native drop: read from disk on resolve
    Path(PathBuf),
    /// Browser drop: already read into memory
    Bytes(Arc<[u8]>),
}

/// A file dropped onto the viewport
#[derive(Clone, Debug)]
pub struct LocalDrop {
    pub name: String,
    pub size_bytes: Option<u64>,
    pub data: DropData,
}

impl LocalDrop {
    /// Drop of a file on disk; size is taken from its metadata
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.display().to_string());
        let size_bytes = std::fs::metadata(&path).ok().map(|m| m.len());
        Self {
            name,
            size_bytes,
            data: DropData::Path(path),
        }
    }

    /// Drop of a file already read into memory
    pub fn from_bytes(name: impl Into<String>, bytes: impl Into<Arc<[u8]>>) -> Self {
        let bytes = bytes.into();
        Self {
            name: name.into(),
            size_bytes: Some(bytes.len() as u64),
            data: DropData::Bytes(bytes),
        }
    }

    pub fn resolve(self) -> Result<ResolvedSource, ResolveError> {
        let bytes = match self.data {
            DropData::Path(path) => Arc::from(std::fs::read(&path)?),
            DropData::Bytes(bytes) => bytes,
        };
        let size = self.size_bytes.unwrap_or(bytes.len() as u64);
        let descriptor = SourceDescriptor::new(SourceOrigin::LocalFile, self.name, Some(size));
        Ok(ResolvedSource::bytes(descriptor, bytes))
    }
}

/// Options passed to a cloud chooser
#[derive(Clone, Debug, PartialEq)]
pub struct ChooserOptions {
    /// Accepted extensions, with leading dot
    pub extensions: Vec<String>,
    pub download_suffix: String,
}

impl Default for ChooserOptions {
    fn default() -> Self {
        (&ChooserConfig::default()).into()
    }
}

impl From<&ChooserConfig> for ChooserOptions {
    fn from(config: &ChooserConfig) -> Self {
        Self {
            extensions: config.extensions.clone(),
            download_suffix: config.download_suffix.clone(),
        }
    }
}

/// A file picked in a cloud chooser
#[derive(Clone, Debug, PartialEq)]
pub struct ChosenFile {
    pub name: String,
    /// Share link as returned by the chooser
    pub link: String,
    pub bytes: Option<u64>,
}

/// External selection dialog
///
/// `Ok(None)` means the user dismissed the dialog.
pub trait CloudChooser: Send + Sync {
    fn label(&self) -> &str;

    fn choose(
        &self,
        options: &ChooserOptions,
    ) -> BoxedFuture<'static, Result<Option<ChosenFile>, ResolveError>>;
}

/// Turn a share link into a direct-download link
///
/// Only http(s) links get the suffix; a suffix starting with `?` is joined
/// with `&` when the link already has a query.
pub fn direct_link(link: &str, suffix: &str) -> String {
    let is_http = link.starts_with("http://") || link.starts_with("https://");
    if !is_http || suffix.is_empty() || link.ends_with(suffix) {
        return link.to_string();
    }
    match suffix.strip_prefix('?') {
        Some(query) if link.contains('?') => format!("{}&{}", link, query),
        _ => format!("{}{}", link, suffix),
    }
}

/// A cloud file chosen through a [`CloudChooser`]
#[derive(Clone)]
pub struct CloudPicker {
    chooser: Arc<dyn CloudChooser>,
    options: ChooserOptions,
}

impl CloudPicker {
    pub fn new(chooser: Arc<dyn CloudChooser>, options: ChooserOptions) -> Self {
        Self { chooser, options }
    }

    pub fn label(&self) -> &str {
        self.chooser.label()
    }

    pub async fn resolve(self) -> Result<ResolvedSource, ResolveError> {
        let Some(file) = self.chooser.choose(&self.options).await? else {
            return Err(ResolveError::Cancelled);
        };
        let url = direct_link(&file.link, &self.options.download_suffix);
        log::debug!("[Source] {} chose {} -> {}", self.chooser.label(), file.name, url);
        let descriptor = SourceDescriptor::new(SourceOrigin::CloudLink, file.name, file.bytes);
        Ok(ResolvedSource::url(descriptor, url))
    }
}

/// One way of obtaining an IFC payload
#[derive(Clone)]
pub enum SourceAdapter {
    LocalDrop(LocalDrop),
    CloudPicker(CloudPicker),
}

impl SourceAdapter {
    pub fn origin(&self) -> SourceOrigin {
        match self {
            SourceAdapter::LocalDrop(_) => SourceOrigin::LocalFile,
            SourceAdapter::CloudPicker(_) => SourceOrigin::CloudLink,
        }
    }

    /// Short description for logs
    pub fn label(&self) -> String {
        match self {
            SourceAdapter::LocalDrop(drop) => drop.name.clone(),
            SourceAdapter::CloudPicker(picker) => picker.label().to_string(),
        }
    }

    /// Produce the payload (bytes or a fetchable link) and its metadata
    pub fn resolve(self) -> BoxedFuture<'static, Result<ResolvedSource, ResolveError>> {
        match self {
            SourceAdapter::LocalDrop(drop) => Box::pin(async move { drop.resolve() }),
            SourceAdapter::CloudPicker(picker) => Box::pin(picker.resolve()),
        }
    }
}

/// Native file dialog standing in for a cloud chooser; returns `file://` links
#[cfg(all(
    not(target_arch = "wasm32"),
    not(target_os = "ios"),
    not(target_os = "macos")
))]
#[derive(Clone, Copy, Debug, Default)]
pub struct DialogChooser;

#[cfg(all(
    not(target_arch = "wasm32"),
    not(target_os = "ios"),
    not(target_os = "macos")
))]
impl CloudChooser for DialogChooser {
    fn label(&self) -> &str {
        "file dialog"
    }

    fn choose(
        &self,
        options: &ChooserOptions,
    ) -> BoxedFuture<'static, Result<Option<ChosenFile>, ResolveError>> {
        let extensions: Vec<String> = options
            .extensions
            .iter()
            .map(|ext| ext.trim_start_matches('.').to_string())
            .collect();

        Box::pin(async move {
            use rfd::AsyncFileDialog;

            let Some(file) = AsyncFileDialog::new()
                .add_filter("IFC Files", &extensions)
                .set_title("Open IFC File")
                .pick_file()
                .await
            else {
                return Ok(None);
            };

            let path = file.path().to_path_buf();
            let bytes = std::fs::metadata(&path).ok().map(|m| m.len());
            Ok(Some(ChosenFile {
                name: file.file_name(),
                link: format!("file://{}", path.display()),
                bytes,
            }))
        })
    }
}

/// Chooser for platforms without a picker backend
#[derive(Clone, Copy, Debug, Default)]
pub struct UnavailableChooser;

impl CloudChooser for UnavailableChooser {
    fn label(&self) -> &str {
        "unavailable"
    }

    fn choose(
        &self,
        _options: &ChooserOptions,
    ) -> BoxedFuture<'static, Result<Option<ChosenFile>, ResolveError>> {
        Box::pin(async {
            Err(ResolveError::Chooser(
                "no file picker on this platform".to_string(),
            ))
        })
    }
}

/// The chooser used for `OpenCloudPicker` requests
pub fn platform_chooser() -> Arc<dyn CloudChooser> {
    #[cfg(target_arch = "wasm32")]
    {
        Arc::new(crate::web::DropboxChooser)
    }
    #[cfg(all(
        not(target_arch = "wasm32"),
        not(target_os = "ios"),
        not(target_os = "macos")
    ))]
    {
        Arc::new(DialogChooser)
    }
    #[cfg(any(target_os = "ios", target_os = "macos"))]
    {
        Arc::new(UnavailableChooser)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bevy::tasks::block_on;
    use ifc_vision_model::Payload;

    /// Chooser returning a fixed answer
    struct ScriptedChooser(Option<ChosenFile>);

    impl CloudChooser for ScriptedChooser {
        fn label(&self) -> &str {
            "scripted"
        }

        fn choose(
            &self,
            _options: &ChooserOptions,
        ) -> BoxedFuture<'static, Result<Option<ChosenFile>, ResolveError>> {
            let answer = self.0.clone();
            Box::pin(async move { Ok(answer) })
        }
    }

    fn picker(answer: Option<ChosenFile>) -> SourceAdapter {
        SourceAdapter::CloudPicker(CloudPicker::new(
            Arc::new(ScriptedChooser(answer)),
            ChooserOptions::default(),
        ))
    }

    #[test]
    fn test_is_ifc_file() {
        assert!(is_ifc_file("model.ifc"));
        assert!(is_ifc_file("MODEL.IFC"));
        assert!(!is_ifc_file("model.ifczip"));
        assert!(!is_ifc_file("ifc"));
    }

    #[test]
    fn test_direct_link() {
        assert_eq!(
            direct_link("https://www.dropbox.com/s/abc/model.ifc", "?dl=1"),
            "https://www.dropbox.com/s/abc/model.ifc?dl=1"
        );
        assert_eq!(
            direct_link("https://www.dropbox.com/scl/fi/abc/model.ifc?rlkey=x", "?dl=1"),
            "https://www.dropbox.com/scl/fi/abc/model.ifc?rlkey=x&dl=1"
        );
        assert_eq!(
            direct_link("https://example.com/model.ifc?dl=1", "?dl=1"),
            "https://example.com/model.ifc?dl=1"
        );
        assert_eq!(direct_link("file:///tmp/model.ifc", "?dl=1"), "file:///tmp/model.ifc");
    }

    #[test]
    fn test_local_drop_from_bytes() {
        let resolved = block_on(
            SourceAdapter::LocalDrop(LocalDrop::from_bytes("model.ifc", vec![0u8; 16])).resolve(),
        )
        .unwrap();
        assert_eq!(resolved.descriptor.origin, SourceOrigin::LocalFile);
        assert_eq!(resolved.descriptor.display_name, "model.ifc");
        assert_eq!(resolved.descriptor.size_bytes, Some(16));
        assert!(!resolved.payload.is_url());
    }

    #[test]
    fn test_local_drop_missing_path_fails() {
        let drop = LocalDrop::from_path("/nonexistent/dir/model.ifc");
        assert_eq!(drop.name, "model.ifc");
        assert_eq!(drop.size_bytes, None);
        assert!(matches!(drop.resolve(), Err(ResolveError::Io(_))));
    }

    #[test]
    fn test_cloud_picker_returns_direct_link() {
        let chosen = ChosenFile {
            name: "tower.ifc".to_string(),
            link: "https://www.dropbox.com/s/abc/tower.ifc".to_string(),
            bytes: Some(1_500_000),
        };
        let resolved = block_on(picker(Some(chosen)).resolve()).unwrap();
        assert_eq!(resolved.descriptor.origin, SourceOrigin::CloudLink);
        assert_eq!(resolved.descriptor.size_bytes, Some(1_500_000));
        assert!(matches!(
            resolved.payload,
            Payload::Url(ref url) if url == "https://www.dropbox.com/s/abc/tower.ifc?dl=1"
        ));
    }

    #[test]
    fn test_cloud_picker_dismissal_is_cancellation() {
        let err = block_on(picker(None).resolve()).unwrap_err();
        assert!(matches!(err, ResolveError::Cancelled));
    }

    #[test]
    fn test_unavailable_chooser_fails() {
        let adapter = SourceAdapter::CloudPicker(CloudPicker::new(
            Arc::new(UnavailableChooser),
            ChooserOptions::default(),
        ));
        assert_eq!(adapter.origin(), SourceOrigin::CloudLink);
        assert!(matches!(
            block_on(adapter.resolve()),
            Err(ResolveError::Chooser(_))
        ));
    }
}
