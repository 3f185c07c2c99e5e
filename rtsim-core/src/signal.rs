//! One-way control notifications.
//!
//! The orchestrator talks to a worker only through two payload-less events,
//! [`Notification::Start`] and [`Notification::Stop`]. Delivery is
//! fire-and-forget: the sender never waits for the receiver. Notifications to
//! the same receiver arrive in the order they were sent.

use std::fmt;
use std::str::FromStr;

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TryRecvError;

use crate::error::NotifyError;

/// Control event delivered to a worker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Notification {
    /// Begin the task lifecycle.
    Start,
    /// Terminate immediately.
    Stop,
}

impl Notification {
    /// Wire representation, used on the stdin of process workers.
    pub fn as_str(&self) -> &'static str {
        match self {
            Notification::Start => "start",
            Notification::Stop => "stop",
        }
    }
}

impl fmt::Display for Notification {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Notification {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "start" => Ok(Notification::Start),
            "stop" => Ok(Notification::Stop),
            other => Err(format!("unknown notification `{other}`")),
        }
    }
}

/// Create a connected sender/receiver pair for one worker.
pub fn notification_channel() -> (NotificationSender, NotificationReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (NotificationSender { tx }, NotificationReceiver { rx })
}

/// Sending half of a notification channel.
///
/// Cloneable and usable from any thread; sending never blocks.
#[derive(Debug, Clone)]
pub struct NotificationSender {
    tx: mpsc::UnboundedSender<Notification>,
}

impl NotificationSender {
    /// Deliver a notification.
    pub fn send(&self, notification: Notification) -> Result<(), NotifyError> {
        self.tx
            .send(notification)
            .map_err(|_| NotifyError::Disconnected)
    }
}

/// Receiving half of a notification channel, owned by the worker.
#[derive(Debug)]
pub struct NotificationReceiver {
    rx: mpsc::UnboundedReceiver<Notification>,
}

impl NotificationReceiver {
    /// Wait for the next notification.
    ///
    /// Returns `None` once every sender has been dropped and the queue is
    /// drained.
    pub async fn recv(&mut self) -> Option<Notification> {
        self.rx.recv().await
    }

    /// Take the next queued notification without waiting.
    ///
    /// `Ok(None)` means nothing is queued; `Err` means every sender is gone.
    pub fn try_recv(&mut self) -> Result<Option<Notification>, NotifyError> {
        match self.rx.try_recv() {
            Ok(notification) => Ok(Some(notification)),
            Err(TryRecvError::Empty) => Ok(None),
            Err(TryRecvError::Disconnected) => Err(NotifyError::Disconnected),
        }
    }
}
