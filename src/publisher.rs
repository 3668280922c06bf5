//! Publish side of the messaging link.
//!
//! The panel only knows the [`Publisher`] trait. Whatever owns the broker
//! connection plugs in behind it; [`ChannelPublisher`] hands publications to
//! such an owner over an mpsc channel.

use std::sync::mpsc::{channel, Receiver, Sender};

use crate::error::PublishError;

/// One outbound message.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Publication {
    pub topic: String,
    pub payload: String,
}

/// Capability that sends a payload to a topic.
pub trait Publisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError>;
}

impl<P: Publisher + ?Sized> Publisher for Box<P> {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError> {
        (**self).publish(topic, payload)
    }
}

/// Forwards publications to the receiving end of a channel.
#[derive(Clone, Debug)]
pub struct ChannelPublisher {
    tx: Sender<Publication>,
}

impl ChannelPublisher {
    pub fn new(tx: Sender<Publication>) -> Self {
        Self { tx }
    }

    /// Creates a publisher together with the receiver that drains it.
    pub fn pair() -> (Self, Receiver<Publication>) {
        let (tx, rx) = channel();
        (Self::new(tx), rx)
    }
}

impl Publisher for ChannelPublisher {
    fn publish(&mut self, topic: &str, payload: &str) -> Result<(), PublishError> {
        log::debug!("publish {topic}: {payload}");
        self.tx
            .send(Publication {
                topic: topic.to_owned(),
                payload: payload.to_owned(),
            })
            .map_err(|_| PublishError::Disconnected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn channel_publisher_forwards_topic_and_payload() {
        let (mut publisher, rx) = ChannelPublisher::pair();
        publisher.publish("dccalibrated/data", "$ResetCalibrationData#").unwrap();
        let got = rx.try_recv().unwrap();
        assert_eq!(got.topic, "dccalibrated/data");
        assert_eq!(got.payload, "$ResetCalibrationData#");
    }

    #[test]
    fn dropped_receiver_reports_disconnected() {
        let (mut publisher, rx) = ChannelPublisher::pair();
        drop(rx);
        assert_eq!(
            publisher.publish("t", "p"),
            Err(PublishError::Disconnected)
        );
    }

    #[test]
    fn boxed_publisher_delegates() {
        let (publisher, rx) = ChannelPublisher::pair();
        let mut boxed: Box<dyn Publisher> = Box::new(publisher);
        boxed.publish("a", "b").unwrap();
        assert_eq!(rx.try_recv().unwrap().payload, "b");
    }
}
