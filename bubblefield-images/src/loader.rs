use crate::{normalize_avatar_url, Fetcher, ImageCache, ImageError};
use bubblefield_core::{BubbleId, ImageEvent, ImageOutcome, ImageSource};
use crossbeam_channel::{unbounded, Receiver, Sender};
use log::{debug, info};
use std::sync::Arc;
use std::time::Duration;
use tokio::runtime::{Handle, Runtime};

/// Bridges the async [`ImageCache`] to the simulation's synchronous [`ImageSource`] seam.
///
/// Requests are spawned onto a tokio runtime; finished loads are queued on a channel and
/// picked up by [`ImageSource::drain`] on the render thread.
pub struct AvatarLoader<F> {
    cache: Arc<ImageCache<F>>,
    handle: Handle,
    tx: Sender<ImageEvent>,
    rx: Receiver<ImageEvent>,
    runtime: Option<Runtime>,
}

impl<F: Fetcher> AvatarLoader<F> {
    /// Uses a runtime owned by the caller
    pub fn new(cache: Arc<ImageCache<F>>, handle: Handle) -> Self {
        let (tx, rx) = unbounded();
        AvatarLoader {
            cache,
            handle,
            tx,
            rx,
            runtime: None,
        }
    }

    /// Starts a private background runtime for image loading
    pub fn start(
        fetcher: F,
        max_concurrent: usize,
        timeout: Duration,
    ) -> Result<Self, ImageError> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("avatar-loader")
            .enable_all()
            .build()
            .map_err(|e| ImageError::Runtime(e.to_string()))?;
        info!(
            "Avatar loader started ({} concurrent loads, {} ms timeout)",
            max_concurrent,
            timeout.as_millis()
        );

        let cache = ImageCache::new(fetcher, max_concurrent, timeout);
        let mut loader = Self::new(cache, runtime.handle().clone());
        loader.runtime = Some(runtime);
        Ok(loader)
    }

    pub fn cache(&self) -> &Arc<ImageCache<F>> {
        &self.cache
    }
}

impl<F: Fetcher> ImageSource for AvatarLoader<F> {
    fn request(&mut self, bubble: BubbleId, url: &str) {
        let url = normalize_avatar_url(url).into_owned();
        let cache = Arc::clone(&self.cache);
        let tx = self.tx.clone();

        self.handle.spawn(async move {
            let outcome = match cache.load(&url).await {
                Ok(image) => ImageOutcome::Loaded(image),
                Err(err) => ImageOutcome::Failed(err.to_string()),
            };
            // The receiver only goes away with the loader itself
            let _ = tx.send(ImageEvent { bubble, outcome });
        });
    }

    fn drain(&mut self) -> Vec<ImageEvent> {
        self.rx.try_iter().collect()
    }
}

impl<F> Drop for AvatarLoader<F> {
    fn drop(&mut self) {
        if let Some(runtime) = self.runtime.take() {
            debug!("Shutting down avatar loader");
            self.cache.close();
            runtime.shutdown_background();
        }
    }
}
