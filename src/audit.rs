// 🧾 Audit Log - append-only history of accepted mutations
//
// Events go in through `record` (crate-internal, used by the owning entity and the
// types built on top of it). Everything that reads the log gets an owned copy.

use crate::event::{Event, EventKind, EventTag};
use crate::field::EntityField;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, Clone, Serialize)]
pub struct AuditLog<F> {
    entity_id: String,
    events: Vec<Event<F>>,
}

impl<F: EntityField> AuditLog<F> {
    pub(crate) fn new(entity_id: impl Into<String>) -> Self {
        AuditLog {
            entity_id: entity_id.into(),
            events: Vec::new(),
        }
    }

    /// Append one event. Never rewrites or removes earlier entries.
    pub(crate) fn record(&mut self, actor: &str, kind: EventKind<F>, detail: Option<String>) {
        let event = Event::new(actor, kind, detail);
        tracing::debug!(
            entity = F::ENTITY,
            id = %self.entity_id,
            tag = %event.tag(),
            field = event.field().map(|f| f.name()).unwrap_or("*"),
            actor = %event.actor,
            "event recorded"
        );
        self.events.push(event);
    }

    pub fn entity_id(&self) -> &str {
        &self.entity_id
    }

    /// Owned copy of every event, oldest first
    pub fn snapshot(&self) -> Vec<Event<F>> {
        self.events.clone()
    }

    pub fn len(&self) -> usize {
        self.events.len()
    }

    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    pub fn last(&self) -> Option<Event<F>> {
        self.events.last().cloned()
    }

    /// The `n` most recent events, oldest first
    pub fn recent(&self, n: usize) -> Vec<Event<F>> {
        let start = self.events.len().saturating_sub(n);
        self.events[start..].to_vec()
    }

    pub fn count_tag(&self, tag: EventTag) -> usize {
        self.events.iter().filter(|e| e.tag() == tag).count()
    }

    /// Events about a single field
    pub fn for_field(&self, field: F) -> Vec<Event<F>> {
        self.events
            .iter()
            .filter(|e| e.field() == Some(field))
            .cloned()
            .collect()
    }

    /// Events with `from <= timestamp < to`
    pub fn between(&self, from: DateTime<Utc>, to: DateTime<Utc>) -> Vec<Event<F>> {
        self.events
            .iter()
            .filter(|e| e.timestamp >= from && e.timestamp < to)
            .cloned()
            .collect()
    }

    /// Export for display or archival
    pub fn to_json(&self) -> serde_json::Result<serde_json::Value> {
        serde_json::to_value(self)
    }
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::{FieldValue, SYSTEM_ACTOR};
    use crate::field::{FieldDefinition, FieldType};
    use chrono::Duration;
    use strum::{EnumIter, IntoStaticStr};

    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, EnumIter, IntoStaticStr)]
    #[strum(serialize_all = "snake_case")]
    enum LedgerField {
        Name,
        Balance,
    }

    impl EntityField for LedgerField {
        const ENTITY: &'static str = "ledger";

        fn definition(self) -> FieldDefinition {
            FieldDefinition::new(FieldType::Text).controlled_by("update")
        }
    }

    fn rename(log: &mut AuditLog<LedgerField>, before: &str, after: &str) {
        log.record(
            SYSTEM_ACTOR,
            EventKind::FieldUpdate {
                field: LedgerField::Name,
                before: FieldValue::from(before),
                after: FieldValue::from(after),
            },
            None,
        );
    }

    #[test]
    fn test_record_appends_in_order() {
        let mut log = AuditLog::new("ledger-1");
        rename(&mut log, "a", "b");
        rename(&mut log, "b", "c");

        let events = log.snapshot();
        assert_eq!(events.len(), 2);
        assert_eq!(events[0].after(), Some(FieldValue::from("b")));
        assert_eq!(events[1].after(), Some(FieldValue::from("c")));
        assert!(events[0].timestamp <= events[1].timestamp);
    }

    #[test]
    fn test_snapshot_is_a_copy() {
        let mut log = AuditLog::new("ledger-1");
        rename(&mut log, "a", "b");

        let mut copy = log.snapshot();
        copy.clear();

        assert_eq!(log.len(), 1);
        assert_eq!(log.snapshot().len(), 1);
    }

    #[test]
    fn test_recent_and_count() {
        let mut log = AuditLog::new("ledger-1");
        for i in 0..5 {
            rename(&mut log, &i.to_string(), &(i + 1).to_string());
        }
        log.record(
            SYSTEM_ACTOR,
            EventKind::ResourceLoad {
                field: LedgerField::Balance,
                amount: 10.0,
                before: 0.0,
                after: 10.0,
            },
            None,
        );

        let recent = log.recent(3);
        assert_eq!(recent.len(), 3);
        assert_eq!(recent[2].tag(), EventTag::ResourceLoad);
        assert_eq!(log.recent(100).len(), 6);

        assert_eq!(log.count_tag(EventTag::FieldUpdate), 5);
        assert_eq!(log.count_tag(EventTag::ResourceLoad), 1);
        assert_eq!(log.for_field(LedgerField::Balance).len(), 1);
        assert_eq!(log.last().unwrap().tag(), EventTag::ResourceLoad);
    }

    #[test]
    fn test_between_filters_by_time() {
        let mut log = AuditLog::new("ledger-1");
        let start = Utc::now() - Duration::seconds(1);
        rename(&mut log, "a", "b");
        let end = Utc::now() + Duration::seconds(1);

        assert_eq!(log.between(start, end).len(), 1);
        assert!(log.between(end, end + Duration::seconds(5)).is_empty());
    }

    #[test]
    fn test_to_json() {
        let mut log = AuditLog::new("ledger-1");
        rename(&mut log, "a", "b");

        let json = log.to_json().unwrap();
        assert_eq!(json["entity_id"], "ledger-1");
        assert_eq!(json["events"][0]["kind"], "field_update");
        assert_eq!(json["events"][0]["field"], "Name");
    }
}
