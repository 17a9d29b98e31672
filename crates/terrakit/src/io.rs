//! I/O options and cooperative cancellation.

use std::sync::atomic::{AtomicBool, Ordering};

use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;

/// Something long-running work can poll to find out whether to stop.
pub trait Cancelable {
    /// Whether the work should stop.
    fn is_canceled(&self) -> bool;
}

impl Cancelable for CancellationToken {
    fn is_canceled(&self) -> bool {
        self.is_cancelled()
    }
}

impl Cancelable for AtomicBool {
    fn is_canceled(&self) -> bool {
        self.load(Ordering::Acquire)
    }
}

impl<C: Cancelable + ?Sized> Cancelable for &C {
    fn is_canceled(&self) -> bool {
        (**self).is_canceled()
    }
}

/// A cancelable that never cancels.
#[derive(Debug, Clone, Copy, Default)]
pub struct NeverCancel;

impl Cancelable for NeverCancel {
    fn is_canceled(&self) -> bool {
        false
    }
}

/// HTTP proxy to route remote reads through.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProxySettings {
    pub host: String,
    pub port: u16,
}

/// Options passed to layer opens and long-running builders.
#[derive(Debug, Clone, Default)]
pub struct IoOptions {
    cancel: CancellationToken,
    proxy: Option<ProxySettings>,
}

impl IoOptions {
    /// Options with a fresh token and no proxy.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Use an existing token so several operations can be canceled together.
    #[must_use]
    pub fn with_cancel_token(mut self, cancel: CancellationToken) -> Self {
        self.cancel = cancel;
        self
    }

    /// Route requests through `proxy`.
    #[must_use]
    pub fn with_proxy(mut self, proxy: ProxySettings) -> Self {
        self.proxy = Some(proxy);
        self
    }

    /// Token shared by everything using these options.
    #[must_use]
    pub fn cancel_token(&self) -> &CancellationToken {
        &self.cancel
    }

    /// Proxy to use, if any.
    #[must_use]
    pub fn proxy(&self) -> Option<&ProxySettings> {
        self.proxy.as_ref()
    }

    /// Request cancellation of everything using these options.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }
}

impl Cancelable for IoOptions {
    fn is_canceled(&self) -> bool {
        self.cancel.is_cancelled()
    }
}
