//! Process-wide bridge for embedders that want `init`/`shutdown` brackets
//! instead of passing a [`Bridge`] around.
//!
//! The runtime is single-threaded, so "process-wide" means one bridge per
//! thread. Using it before [`init`] or after [`shutdown`] returns
//! [`Error::NotInitialized`].
//!
//! ```ignore
//! objbridge::global::init(BridgeConfig::default());
//! let add = objbridge::global::with_bridge(|bridge| bridge.function_of(add_fn()))??;
//! objbridge::global::shutdown();
//! ```

use std::cell::RefCell;

use crate::bridge::Bridge;
use crate::config::BridgeConfig;
use crate::error::{Error, Result};
use crate::logging::warn;

thread_local! {
    static BRIDGE: RefCell<Option<Bridge>> = const { RefCell::new(None) };
}

/// Start the bridge. A bridge that is already running is shut down first.
pub fn init(config: BridgeConfig) {
    let previous = BRIDGE.with(|cell| cell.borrow_mut().replace(Bridge::with_config(config)));
    if let Some(previous) = previous {
        warn!("bridge initialized twice; shutting down the previous instance");
        previous.shutdown();
    }
}

/// Stop the bridge, clearing all holders and registration metadata.
pub fn shutdown() {
    if let Some(bridge) = BRIDGE.with(|cell| cell.borrow_mut().take()) {
        bridge.shutdown();
    }
}

pub fn is_initialized() -> bool {
    BRIDGE.with(|cell| cell.borrow().is_some())
}

/// Run `f` with the bridge.
///
/// # Panics
///
/// Panics if `f` re-enters `with_bridge`.
pub fn with_bridge<R>(f: impl FnOnce(&mut Bridge) -> R) -> Result<R> {
    BRIDGE.with(|cell| {
        let mut guard = cell.borrow_mut();
        let bridge = guard.as_mut().ok_or(Error::NotInitialized)?;
        Ok(f(bridge))
    })
}
