use std::future::Future;

use tokio::runtime::{Builder, Handle};

/// Spawns `future` in the background.
///
/// Uses the ambient tokio runtime when called from within one; otherwise the future
/// is driven to completion on a dedicated thread.
pub fn spawn_detached<F>(future: F)
where
    F: Future<Output = ()> + Send + 'static,
{
    if let Ok(handle) = Handle::try_current() {
        handle.spawn(future);
        return;
    }

    std::thread::spawn(move || match Builder::new_current_thread().enable_all().build() {
        Ok(runtime) => runtime.block_on(future),
        Err(err) => log::error!(target: "facebook_rs_sdk", "failed to build background runtime: {err}"),
    });
}
