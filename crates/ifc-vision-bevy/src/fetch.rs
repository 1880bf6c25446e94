//! Fetching payloads referenced by URL

use bevy::tasks::BoxedFuture;
use ifc_vision_model::LoaderError;
use std::sync::Arc;

/// Downloads the bytes behind a resolved link
pub trait PayloadFetcher: Send + Sync {
    fn fetch(&self, url: String) -> BoxedFuture<'static, Result<Arc<[u8]>, LoaderError>>;
}

/// Default fetcher: HTTP(S) and `file://` natively, `fetch()` in the browser
#[derive(Clone, Copy, Debug)]
pub struct HttpFetcher {
    pub max_bytes: u64,
}

impl Default for HttpFetcher {
    fn default() -> Self {
        Self {
            max_bytes: 1024 * 1024 * 1024,
        }
    }
}

impl PayloadFetcher for HttpFetcher {
    #[cfg(not(target_arch = "wasm32"))]
    fn fetch(&self, url: String) -> BoxedFuture<'static, Result<Arc<[u8]>, LoaderError>> {
        let max_bytes = self.max_bytes;
        // Runs on the IO pool, so blocking here is fine
        Box::pin(async move { fetch_blocking(&url, max_bytes) })
    }

    #[cfg(target_arch = "wasm32")]
    fn fetch(&self, url: String) -> BoxedFuture<'static, Result<Arc<[u8]>, LoaderError>> {
        Box::pin(crate::web::fetch_bytes(url))
    }
}

#[cfg(not(target_arch = "wasm32"))]
fn fetch_blocking(url: &str, max_bytes: u64) -> Result<Arc<[u8]>, LoaderError> {
    if let Some(path) = url.strip_prefix("file://") {
        log::debug!("[Fetch] Reading {}", path);
        return Ok(Arc::from(std::fs::read(path)?));
    }

    log::info!("[Fetch] GET {}", url);
    let mut response = ureq::get(url)
        .call()
        .map_err(|e| LoaderError::io(format!("{}: {}", url, e)))?;
    let bytes = response
        .body_mut()
        .with_config()
        .limit(max_bytes)
        .read_to_vec()
        .map_err(|e| LoaderError::io(format!("{}: {}", url, e)))?;
    log::debug!("[Fetch] {} bytes from {}", bytes.len(), url);
    Ok(Arc::from(bytes))
}

#[cfg(all(test, not(target_arch = "wasm32")))]
mod tests {
    use super::*;
    use bevy::tasks::block_on;

    #[test]
    fn test_fetch_file_link() {
        let path = std::env::temp_dir().join("ifc-vision-fetch-test.ifc");
        std::fs::write(&path, b"ISO-10303-21;").unwrap();

        let url = format!("file://{}", path.display());
        let bytes = block_on(HttpFetcher::default().fetch(url)).unwrap();
        assert_eq!(&bytes[..], b"ISO-10303-21;");

        std::fs::remove_file(&path).ok();
    }

    #[test]
    fn test_missing_file_is_io_error() {
        let err = block_on(HttpFetcher::default().fetch("file:///nonexistent/x.ifc".to_string()))
            .unwrap_err();
        assert!(matches!(err, LoaderError::Io(_)));
    }

    #[test]
    fn test_unreachable_host_is_io_error() {
        let err = block_on(HttpFetcher::default().fetch("http://127.0.0.1:9/model.ifc".to_string()))
            .unwrap_err();
        assert!(matches!(err, LoaderError::Io(ref msg) if msg.contains("127.0.0.1")));
    }
}
