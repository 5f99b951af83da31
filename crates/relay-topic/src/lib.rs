//! Hierarchical topic fan-out for binlog-relay.
//!
//! One row-change event is delivered to up to four topic levels, broadest
//! first:
//!
//! | level  | key              | payload                      |
//! |--------|------------------|------------------------------|
//! | action | `write`          | the whole normalized event   |
//! | schema | `write@db`       | the whole normalized event   |
//! | table  | `write@db.tbl`   | the event's row batch        |
//! | row    | `write@db.tbl#row` | one row per publish        |
//!
//! plus a reserved position topic that carries a position-advanced
//! notification once per source event.
//!
//! Topics are resolved through a [`TopicRegistry`] instance owned by the
//! replication context; there is no process-wide signal namespace, so tests
//! run as many independent registries as they like. Equal paths resolve to
//! the identical handle, so two subscribers targeting the same table share
//! one fan-out list.

mod dispatch;
mod message;
mod path;
mod registry;
mod topic;

pub use dispatch::Dispatcher;
pub use message::TopicMessage;
pub use path::TopicPath;
pub use registry::{TopicRegistry, POSITION_TOPIC};
pub use topic::{SubscriberFn, SubscriptionId, Topic, TopicHandle};
