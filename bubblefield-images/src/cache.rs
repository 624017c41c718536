use crate::{Fetcher, ImageError};
use bubblefield_core::ImageHandle;
use futures::future::{BoxFuture, FutureExt, Shared};
use log::debug;
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;
use tokio::sync::Semaphore;

type SharedLoad = Shared<BoxFuture<'static, Result<ImageHandle, ImageError>>>;

/// Session-wide image cache.
///
/// - concurrent requests for one URL share a single fetch
/// - decoded images are kept by URL for the lifetime of the cache
/// - at most `max_concurrent` fetches run at once; the rest wait for a permit
/// - each load (queueing included) is bounded by `timeout`
///
/// Failures are not cached, so a later request retries the URL.
pub struct ImageCache<F> {
    fetcher: F,
    limiter: Semaphore,
    timeout: Duration,
    loaded: Mutex<HashMap<String, ImageHandle>>,
    in_flight: Mutex<HashMap<String, SharedLoad>>,
}

impl<F: Fetcher> ImageCache<F> {
    pub fn new(fetcher: F, max_concurrent: usize, timeout: Duration) -> Arc<Self> {
        Arc::new(Self {
            fetcher,
            limiter: Semaphore::new(max_concurrent.max(1)),
            timeout,
            loaded: Mutex::new(HashMap::new()),
            in_flight: Mutex::new(HashMap::new()),
        })
    }

    /// Loads `url`, joining an in-flight request or returning the cached image if there is one.
    pub async fn load(self: &Arc<Self>, url: &str) -> Result<ImageHandle, ImageError> {
        let pending = {
            let mut in_flight = lock(&self.in_flight);
            if let Some(image) = lock(&self.loaded).get(url) {
                return Ok(image.clone());
            }
            match in_flight.get(url) {
                Some(load) => load.clone(),
                None => {
                    let cache = Arc::clone(self);
                    let key = url.to_string();
                    let load = async move { cache.fetch_and_decode(key).await }
                        .boxed()
                        .shared();
                    in_flight.insert(url.to_string(), load.clone());
                    load
                }
            }
        };
        pending.await
    }

    async fn fetch_and_decode(&self, url: String) -> Result<ImageHandle, ImageError> {
        let result = match tokio::time::timeout(self.timeout, self.fetch_limited(&url)).await {
            Ok(result) => result,
            Err(_) => Err(ImageError::Timeout {
                url: url.clone(),
                millis: self.timeout.as_millis() as u64,
            }),
        };

        match &result {
            Ok(image) => {
                lock(&self.loaded).insert(url.clone(), image.clone());
            }
            Err(err) => debug!("image load failed: {err}"),
        }
        lock(&self.in_flight).remove(&url);

        result
    }

    async fn fetch_limited(&self, url: &str) -> Result<ImageHandle, ImageError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ImageError::Closed)?;
        let bytes = self.fetcher.fetch(url).await?;
        decode(url, &bytes)
    }
}

impl<F> ImageCache<F> {
    pub fn cached_len(&self) -> usize {
        lock(&self.loaded).len()
    }

    pub fn in_flight_len(&self) -> usize {
        lock(&self.in_flight).len()
    }

    /// Decoded pixel memory held by the cache
    pub fn cached_bytes(&self) -> usize {
        lock(&self.loaded)
            .values()
            .map(|image| image.pixels().len())
            .sum()
    }

    /// Refuses further fetches. Loads still waiting for a permit fail with
    /// [`ImageError::Closed`].
    pub fn close(&self) {
        self.limiter.close();
    }
}

fn decode(url: &str, bytes: &[u8]) -> Result<ImageHandle, ImageError> {
    let decoded = image::load_from_memory(bytes).map_err(|e| ImageError::Decode {
        url: url.to_string(),
        reason: e.to_string(),
    })?;
    let rgba = decoded.to_rgba8();
    let (width, height) = rgba.dimensions();
    ImageHandle::from_rgba(width, height, rgba.into_raw()).ok_or_else(|| ImageError::Decode {
        url: url.to_string(),
        reason: "pixel buffer does not match image size".to_string(),
    })
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}
