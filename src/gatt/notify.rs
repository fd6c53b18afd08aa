//! Button state notifications
//!
//! Pushes button changes to the subscribed peer. Delivery is best-effort:
//! having nobody to deliver to is a normal outcome, not an error.

use core::future::Future;

use log::{debug, warn};

use super::access::{ButtonSource, LedButtonService, LedSink};
use super::registry::Attribute;

/// Errors from the transport's notify primitive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NotifyError {
    /// No active connection
    NotConnected,
    /// Out of transmit buffers
    NoBuffers,
    /// Any other transport failure
    Transport,
}

/// Outcome of a notification attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Handed to the transport for the subscribed peer
    Sent,
    /// Nobody connected or subscribed; nothing was sent
    NoSubscribers,
}

/// Transport notify primitive
pub trait NotifyTransport {
    /// Send an unsolicited value update for `attribute`
    fn notify(
        &mut self,
        attribute: Attribute,
        payload: &[u8],
    ) -> impl Future<Output = Result<(), NotifyError>>;
}

/// Send a staged payload produced by [`LedButtonService::stage_button_state`]
///
/// Split from staging so callers holding the service behind a lock can
/// release it before awaiting the transport.
pub async fn deliver<T: NotifyTransport>(
    transport: &mut T,
    payload: Option<[u8; 1]>,
) -> Result<Delivery, NotifyError> {
    let Some(payload) = payload else {
        debug!("Button notify skipped, no subscriber");
        return Ok(Delivery::NoSubscribers);
    };

    match transport.notify(Attribute::ButtonValue, &payload).await {
        Ok(()) => Ok(Delivery::Sent),
        Err(NotifyError::NotConnected) => Ok(Delivery::NoSubscribers),
        Err(e) => {
            warn!("Button notify failed: {:?}", e);
            Err(e)
        }
    }
}

impl<L: LedSink, B: ButtonSource> LedButtonService<L, B> {
    /// Notify the subscribed peer of a new button state
    ///
    /// Updates the cached value whether or not anyone is listening.
    pub async fn send_button_state<T: NotifyTransport>(
        &mut self,
        transport: &mut T,
        state: bool,
    ) -> Result<Delivery, NotifyError> {
        let payload = self.stage_button_state(state);
        deliver(transport, payload).await
    }
}
