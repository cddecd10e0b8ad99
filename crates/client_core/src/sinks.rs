//! Notification and navigation collaborators handed to each machine.

use std::sync::{Arc, Mutex, PoisonError};

use crossbeam_channel::{Sender, TrySendError};
use shared::protocol::{Notice, Route};
use tracing::warn;

pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

pub trait Navigator: Send + Sync {
    fn navigate_to(&self, route: Route);
}

#[derive(Clone)]
pub struct Sinks {
    pub notifier: Arc<dyn Notifier>,
    pub navigator: Arc<dyn Navigator>,
}

impl Sinks {
    pub fn new(notifier: Arc<dyn Notifier>, navigator: Arc<dyn Navigator>) -> Self {
        Self {
            notifier,
            navigator,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Notice(Notice),
    Navigate(Route),
}

/// Forwards notices and navigation to a UI loop over a bounded channel.
#[derive(Clone)]
pub struct ChannelSink {
    tx: Sender<UiEvent>,
}

impl ChannelSink {
    pub fn new(tx: Sender<UiEvent>) -> Self {
        Self { tx }
    }

    fn send(&self, event: UiEvent) {
        match self.tx.try_send(event) {
            Ok(()) => {}
            Err(TrySendError::Full(event)) => {
                warn!(?event, "ui event queue is full; dropping event");
            }
            Err(TrySendError::Disconnected(event)) => {
                warn!(?event, "ui event receiver disconnected; dropping event");
            }
        }
    }
}

impl Notifier for ChannelSink {
    fn notify(&self, notice: Notice) {
        self.send(UiEvent::Notice(notice));
    }
}

impl Navigator for ChannelSink {
    fn navigate_to(&self, route: Route) {
        self.send(UiEvent::Navigate(route));
    }
}

/// Keeps everything it receives; for tests and scripted sessions.
#[derive(Default)]
pub struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
    routes: Mutex<Vec<Route>>,
}

impl RecordingSink {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn notices(&self) -> Vec<Notice> {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn routes(&self) -> Vec<Route> {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn sinks(self: &Arc<Self>) -> Sinks {
        Sinks::new(self.clone(), self.clone())
    }
}

impl Notifier for RecordingSink {
    fn notify(&self, notice: Notice) {
        self.notices
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(notice);
    }
}

impl Navigator for RecordingSink {
    fn navigate_to(&self, route: Route) {
        self.routes
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(route);
    }
}
