//! Connection lifecycle state machine
//!
//! ```text
//!              connect ok                 disconnect
//! Advertising ───────────► Connected(h) ─────────────► Recycling
//!   ▲   │ connect failed                                   │
//!   │   └──────┘                                           │
//!   └──────────────── connection object freed ─────────────┘
//!                     (schedules advertising start)
//! ```
//!
//! Advertising is only restarted once the host has released the previous
//! connection object, never directly on disconnect.

use log::{info, warn};

use crate::advertising::AdvertisingStarter;
use crate::platform::{IndicatorId, Indicators};

/// Identifier of an active connection
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConnectionHandle(pub u16);

/// Link states tracked by the peripheral
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkState {
    /// Discoverable, waiting for a central
    Advertising,
    /// One central connected
    Connected(ConnectionHandle),
    /// Disconnected; waiting for the host to free the connection object
    Recycling,
}

/// Events reported by the host stack
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionEvent {
    /// Connection attempt finished; `status` is zero on success
    Connected { handle: ConnectionHandle, status: u8 },
    /// Link terminated with an HCI reason code
    Disconnected { handle: ConnectionHandle, reason: u8 },
    /// Previous connection object has been released
    Recycled,
}

/// Result of feeding an event to the state machine
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transition {
    /// State changed from `from` to `to`
    Moved { from: LinkState, to: LinkState },
    /// Event applied but state is unchanged (failed connect)
    Stayed(LinkState),
    /// Event does not apply to the current state
    Ignored(LinkState),
}

/// Connection lifecycle
///
/// Single-connection model: one handle at most, no per-connection keying.
pub struct ConnectionLifecycle<I, A> {
    state: LinkState,
    indicators: I,
    advertising: A,
    last_disconnect_reason: Option<u8>,
}

impl<I: Indicators, A: AdvertisingStarter> ConnectionLifecycle<I, A> {
    /// Start in `Advertising`; boot has already scheduled the first start
    pub fn new(indicators: I, advertising: A) -> Self {
        Self {
            state: LinkState::Advertising,
            indicators,
            advertising,
            last_disconnect_reason: None,
        }
    }

    pub fn state(&self) -> LinkState {
        self.state
    }

    /// HCI reason of the most recent disconnect, for diagnostics only
    pub fn last_disconnect_reason(&self) -> Option<u8> {
        self.last_disconnect_reason
    }

    /// Feed one host event through the state machine
    pub fn handle(&mut self, event: ConnectionEvent) -> Transition {
        let from = self.state;

        match (from, event) {
            (LinkState::Advertising, ConnectionEvent::Connected { status, .. }) if status != 0 => {
                warn!("Connection failed (err {})", status);
                Transition::Stayed(from)
            }
            (LinkState::Advertising, ConnectionEvent::Connected { handle, .. }) => {
                info!("Connected");
                self.indicators.set_indicator(IndicatorId::ConStatus, true);
                self.move_to(LinkState::Connected(handle))
            }
            (LinkState::Connected(current), ConnectionEvent::Disconnected { handle, reason })
                if current == handle =>
            {
                info!("Disconnected (reason {})", reason);
                self.last_disconnect_reason = Some(reason);
                self.indicators.set_indicator(IndicatorId::ConStatus, false);
                self.move_to(LinkState::Recycling)
            }
            (LinkState::Recycling, ConnectionEvent::Recycled) => {
                info!("Connection object available from previous conn. Disconnect is complete!");
                self.advertising.advertising_start();
                self.move_to(LinkState::Advertising)
            }
            (state, event) => {
                warn!("Ignoring {:?} in state {:?}", event, state);
                Transition::Ignored(state)
            }
        }
    }

    fn move_to(&mut self, to: LinkState) -> Transition {
        let from = self.state;
        self.state = to;
        Transition::Moved { from, to }
    }
}
