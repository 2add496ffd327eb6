use std::sync::atomic::{AtomicU64, Ordering};

use crate::error::TransportResult;
use crate::transport::{HostTransport, TransportStats};

/// Transport backed by a closure, for shims that already own a native
/// "post message" function.
pub struct FnTransport<F> {
    post: F,
    name: String,
    sent: AtomicU64,
    bytes: AtomicU64,
    errors: AtomicU64,
}

impl<F> FnTransport<F>
where
    F: Fn(&str) -> TransportResult<()> + Send + Sync + 'static,
{
    pub fn new(name: impl Into<String>, post: F) -> Self {
        Self {
            post,
            name: name.into(),
            sent: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
            errors: AtomicU64::new(0),
        }
    }
}

impl<F> HostTransport for FnTransport<F>
where
    F: Fn(&str) -> TransportResult<()> + Send + Sync + 'static,
{
    fn post_message(&self, message: &str) -> TransportResult<()> {
        let result = (self.post)(message);
        match &result {
            Ok(()) => {
                self.sent.fetch_add(1, Ordering::Relaxed);
                self.bytes.fetch_add(message.len() as u64, Ordering::Relaxed);
            }
            Err(_) => {
                self.errors.fetch_add(1, Ordering::Relaxed);
            }
        }
        result
    }

    fn stats(&self) -> Option<TransportStats> {
        Some(TransportStats {
            messages_sent: self.sent.load(Ordering::Relaxed),
            bytes_sent: self.bytes.load(Ordering::Relaxed),
            send_errors: self.errors.load(Ordering::Relaxed),
        })
    }

    fn name(&self) -> &str {
        &self.name
    }
}

impl<F> std::fmt::Debug for FnTransport<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FnTransport")
            .field("name", &self.name)
            .finish()
    }
}
