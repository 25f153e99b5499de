//! Events flowing from the transport's worker threads to its owner.
//!
//! The loops never call observer code directly. They push `TransportEvent`s
//! onto a channel and the owning context drains it on its own thread, then
//! dispatches each event to a [`TransportObserver`].

use super::error::TransportError;

/// Something the owner of a `Transport` should know about.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// A session was opened.
    Connected { port: String, baud_rate: u32 },
    /// Text decoded from the device.
    Data(String),
    /// A connect, read or write failure.
    Error(TransportError),
    /// `disconnect` completed.
    Disconnected,
}

impl TransportEvent {
    /// Route this event to the matching observer hook.
    pub fn dispatch<O: TransportObserver + ?Sized>(self, observer: &mut O) {
        match self {
            Self::Connected { port, baud_rate } => observer.on_connect(&port, baud_rate),
            Self::Data(text) => observer.on_data(&text),
            Self::Error(err) => observer.on_error(&err),
            Self::Disconnected => observer.on_disconnect(),
        }
    }
}

/// Receiver side of the four transport hooks. Every hook is optional.
pub trait TransportObserver {
    fn on_data(&mut self, _text: &str) {}
    fn on_error(&mut self, _error: &TransportError) {}
    fn on_connect(&mut self, _port: &str, _baud_rate: u32) {}
    fn on_disconnect(&mut self) {}
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct Recorder {
        calls: Vec<String>,
    }

    impl TransportObserver for Recorder {
        fn on_data(&mut self, text: &str) {
            self.calls.push(format!("data:{text}"));
        }
        fn on_error(&mut self, error: &TransportError) {
            self.calls.push(format!("error:{error}"));
        }
        fn on_connect(&mut self, port: &str, baud_rate: u32) {
            self.calls.push(format!("connect:{port}@{baud_rate}"));
        }
        fn on_disconnect(&mut self) {
            self.calls.push("disconnect".into());
        }
    }

    #[test]
    fn test_dispatch_routes_each_variant() {
        let mut recorder = Recorder::default();
        let events = vec![
            TransportEvent::Connected {
                port: "/dev/ttyUSB0".into(),
                baud_rate: 115_200,
            },
            TransportEvent::Data("ok\n".into()),
            TransportEvent::Error(TransportError::QueueClosed),
            TransportEvent::Disconnected,
        ];
        for event in events {
            event.dispatch(&mut recorder);
        }

        assert_eq!(
            recorder.calls,
            vec![
                "connect:/dev/ttyUSB0@115200",
                "data:ok\n",
                "error:Outbound queue closed",
                "disconnect",
            ]
        );
    }

    #[test]
    fn test_default_hooks_ignore_events() {
        struct Silent;
        impl TransportObserver for Silent {}

        TransportEvent::Data("ignored".into()).dispatch(&mut Silent);
        TransportEvent::Disconnected.dispatch(&mut Silent);
    }
}
