// Messaging - change notifications from the editing session to subscribers

pub mod channels;
pub mod notification;

pub use channels::{ChangeConsumer, ChangeProducer, create_change_channel};
pub use notification::{ChangeEvent, NodeProperty, Notification};
