//! Live-channel connection state machine
//!
//! Pure transition table, no sockets or timers. The driver in
//! `stream_service` feeds it transport events and executes the directives
//! it returns.

use std::fmt;
use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConnectionState {
    Connecting,
    Connected,
    Disconnected,
    Errored,
}

impl ConnectionState {
    pub fn label(&self) -> &'static str {
        match self {
            ConnectionState::Connecting => "connecting",
            ConnectionState::Connected => "connected",
            ConnectionState::Disconnected => "disconnected",
            ConnectionState::Errored => "error",
        }
    }
}

impl fmt::Display for ConnectionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// What happened on the transport or its timers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportEvent {
    Start,
    Opened,
    /// The connect attempt itself failed
    OpenFailed,
    Errored,
    Closed,
    ReconnectDue,
    Dispose,
}

/// Side effects the driver must carry out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Directive {
    Open,
    ScheduleReconnect(Duration),
    CancelReconnect,
    CancelHeartbeat,
    CloseTransport,
}

#[derive(Debug)]
pub struct ConnectionMachine {
    state: ConnectionState,
    reconnect_delay: Duration,
    reconnect_pending: bool,
    disposed: bool,
    reconnects: u64,
}

impl ConnectionMachine {
    pub const DEFAULT_RECONNECT_DELAY: Duration = Duration::from_millis(3000);

    pub fn new(reconnect_delay: Duration) -> Self {
        Self {
            state: ConnectionState::Disconnected,
            reconnect_delay,
            reconnect_pending: false,
            disposed: false,
            reconnects: 0,
        }
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn reconnect_pending(&self) -> bool {
        self.reconnect_pending
    }

    pub fn is_disposed(&self) -> bool {
        self.disposed
    }

    /// Number of reconnect attempts started so far
    pub fn reconnects(&self) -> u64 {
        self.reconnects
    }

    /// Heartbeats go out only while the transport is open
    pub fn can_send(&self) -> bool {
        !self.disposed && self.state == ConnectionState::Connected
    }

    /// Apply one event and return the directives to execute, in order
    pub fn handle(&mut self, event: TransportEvent) -> Vec<Directive> {
        use ConnectionState::*;
        use TransportEvent::*;

        if self.disposed {
            return Vec::new();
        }

        match (self.state, event) {
            (_, Dispose) => {
                self.disposed = true;
                self.reconnect_pending = false;
                self.state = Disconnected;
                vec![
                    Directive::CancelHeartbeat,
                    Directive::CancelReconnect,
                    Directive::CloseTransport,
                ]
            }
            (Disconnected, Start) if !self.reconnect_pending => {
                self.state = Connecting;
                vec![Directive::Open]
            }
            (Connecting, Opened) => {
                self.state = Connected;
                Vec::new()
            }
            (Connecting | Connected, TransportEvent::Errored) => {
                // the close that follows schedules the reconnect
                self.state = ConnectionState::Errored;
                Vec::new()
            }
            (Connecting | Connected | ConnectionState::Errored, Closed | OpenFailed) => {
                self.state = Disconnected;
                self.schedule_reconnect()
            }
            (Disconnected, Closed | OpenFailed) => self.schedule_reconnect(),
            (Disconnected | ConnectionState::Errored, ReconnectDue) if self.reconnect_pending => {
                self.reconnect_pending = false;
                self.reconnects += 1;
                self.state = Connecting;
                vec![Directive::Open]
            }
            _ => Vec::new(),
        }
    }

    /// At most one reconnect timer is ever pending
    fn schedule_reconnect(&mut self) -> Vec<Directive> {
        if self.reconnect_pending {
            return Vec::new();
        }
        self.reconnect_pending = true;
        vec![Directive::ScheduleReconnect(self.reconnect_delay)]
    }
}

impl Default for ConnectionMachine {
    fn default() -> Self {
        Self::new(Self::DEFAULT_RECONNECT_DELAY)
    }
}
