//! Background task spawning.
//!
//! Network requests are async but egui's update() is synchronous. Native
//! builds run them on a small tokio runtime; WASM builds hand them to the
//! browser's event loop.

use std::future::Future;

#[cfg(not(target_arch = "wasm32"))]
use std::sync::Arc;

/// Cheaply cloneable handle for spawning background futures.
#[derive(Clone)]
pub struct TaskSpawner {
    #[cfg(not(target_arch = "wasm32"))]
    runtime: Arc<tokio::runtime::Runtime>,
}

impl TaskSpawner {
    #[cfg(not(target_arch = "wasm32"))]
    pub fn new() -> std::io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .worker_threads(2)
            .thread_name("disaster-eye-io")
            .enable_all()
            .build()?;
        Ok(Self {
            runtime: Arc::new(runtime),
        })
    }

    #[cfg(target_arch = "wasm32")]
    pub fn new() -> std::io::Result<Self> {
        Ok(Self {})
    }

    #[cfg(not(target_arch = "wasm32"))]
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + Send + 'static,
    {
        self.runtime.spawn(future);
    }

    #[cfg(target_arch = "wasm32")]
    pub fn spawn<F>(&self, future: F)
    where
        F: Future<Output = ()> + 'static,
    {
        wasm_bindgen_futures::spawn_local(future);
    }
}
