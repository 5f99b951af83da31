//! Topic registry: path → handle memoization.

use std::collections::HashMap;
use std::sync::Mutex;

use relay_core::Action;

use crate::path::TopicPath;
use crate::topic::{Topic, TopicHandle};

/// Key of the reserved position topic, kept outside the action hierarchy.
pub const POSITION_TOPIC: &str = "binlog_pos";

/// Creates and memoizes topic handles by hierarchical path.
///
/// `resolve` is a pure function of the path with memoized identity: equal
/// paths return the same `Arc<Topic>`, so independently-written subscribers
/// targeting the same schema and table converge on one fan-out list.
///
/// A registry is owned by its replication context and handed to whatever
/// needs to publish or subscribe. There are no process-wide globals, and
/// tests run independent instances side by side.
///
/// Topics are created once and then read-mostly; the internal map is
/// mutex-guarded so `resolve` is safe from any thread.
pub struct TopicRegistry {
    topics: Mutex<HashMap<TopicPath, TopicHandle>>,
    position: TopicHandle,
}

impl TopicRegistry {
    pub fn new() -> Self {
        Self {
            topics: Mutex::new(HashMap::new()),
            position: Topic::new(POSITION_TOPIC),
        }
    }

    /// Resolve a path to its unique topic handle, creating it on first use.
    pub fn resolve(&self, path: &TopicPath) -> TopicHandle {
        let mut topics = self.topics.lock().unwrap();
        if let Some(handle) = topics.get(path) {
            return handle.clone();
        }
        let handle = Topic::new(path.to_string());
        topics.insert(path.clone(), handle.clone());
        handle
    }

    /// The reserved topic carrying position-advanced notifications.
    pub fn position_topic(&self) -> TopicHandle {
        self.position.clone()
    }

    /// Action-level topic: every event with this action, any schema/table.
    pub fn action_topic(&self, action: Action) -> TopicHandle {
        self.resolve(&TopicPath::action(action))
    }

    /// Schema-level topic.
    pub fn schema_topic(&self, action: Action, schema: impl Into<String>) -> TopicHandle {
        self.resolve(&TopicPath::schema(action, schema))
    }

    /// Table-level topic: subscribers receive the whole row batch per event.
    pub fn table_topic(
        &self,
        action: Action,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> TopicHandle {
        self.resolve(&TopicPath::table(action, schema, table))
    }

    /// Row-level topic: subscribers receive one publish per row.
    pub fn row_topic(
        &self,
        action: Action,
        schema: impl Into<String>,
        table: impl Into<String>,
    ) -> TopicHandle {
        self.resolve(&TopicPath::row(action, schema, table))
    }
}

impl Default for TopicRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Debug for TopicRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let topics = self.topics.lock().unwrap();
        f.debug_struct("TopicRegistry")
            .field("topics", &topics.len())
            .finish()
    }
}
