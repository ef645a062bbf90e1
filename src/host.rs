//! Host integration: event subscriptions and canvas size
//!
//! The warper never talks to a window system directly. Whatever embeds it
//! supplies a [`HostPort`], which is told when to start and stop delivering
//! pointer and key events.

use std::fmt;

/// A stream of input events the host can deliver
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum InputChannel {
    Pointer,
    Keys,
}

/// Capabilities the warper needs from its host
pub trait HostPort {
    /// Start delivering events on `channel`
    fn subscribe(&mut self, channel: InputChannel);

    /// Stop delivering events on `channel`
    fn unsubscribe(&mut self, channel: InputChannel);

    /// Size of the default canvas, used when no base rectangle is given
    fn canvas_size(&self) -> (f64, f64);
}

/// A host without a window, for command-line use and tests
///
/// Keeps track of which channels are currently subscribed.
#[derive(Debug, Clone)]
pub struct HeadlessHost {
    width: f64,
    height: f64,
    pointer: bool,
    keys: bool,
}

impl HeadlessHost {
    pub fn new(width: f64, height: f64) -> Self {
        Self {
            width,
            height,
            pointer: false,
            keys: false,
        }
    }

    pub fn is_subscribed(&self, channel: InputChannel) -> bool {
        match channel {
            InputChannel::Pointer => self.pointer,
            InputChannel::Keys => self.keys,
        }
    }

    fn flag(&mut self, channel: InputChannel) -> &mut bool {
        match channel {
            InputChannel::Pointer => &mut self.pointer,
            InputChannel::Keys => &mut self.keys,
        }
    }
}

impl HostPort for HeadlessHost {
    fn subscribe(&mut self, channel: InputChannel) {
        let flag = self.flag(channel);
        if *flag {
            tracing::warn!("{} events already subscribed", channel);
        }
        *flag = true;
        tracing::debug!("Subscribed to {} events", channel);
    }

    fn unsubscribe(&mut self, channel: InputChannel) {
        let flag = self.flag(channel);
        if !*flag {
            tracing::warn!("{} events were not subscribed", channel);
        }
        *flag = false;
        tracing::debug!("Unsubscribed from {} events", channel);
    }

    fn canvas_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }
}

impl fmt::Display for InputChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InputChannel::Pointer => f.write_str("pointer"),
            InputChannel::Keys => f.write_str("keys"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_headless_subscriptions() {
        let mut host = HeadlessHost::new(640.0, 480.0);
        assert_eq!(host.canvas_size(), (640.0, 480.0));
        assert!(!host.is_subscribed(InputChannel::Pointer));

        host.subscribe(InputChannel::Pointer);
        assert!(host.is_subscribed(InputChannel::Pointer));
        assert!(!host.is_subscribed(InputChannel::Keys));

        host.unsubscribe(InputChannel::Pointer);
        assert!(!host.is_subscribed(InputChannel::Pointer));
    }

    #[test]
    fn test_channel_names() {
        assert_eq!(InputChannel::Pointer.to_string(), "pointer");
        assert_eq!(InputChannel::Keys.to_string(), "keys");
    }
}
