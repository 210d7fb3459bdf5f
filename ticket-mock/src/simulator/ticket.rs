use std::time::SystemTime;

use rama::telemetry::tracing;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

const NUMBER_PREFIX: &str = "INC";

/// State assigned to every new ticket ("New").
pub const INITIAL_STATE: &str = "1";

/// Account recorded as creator of every ticket.
pub const CREATED_BY: &str = "azure_insight";

/// Identifier returned instead of a ticket number when creation is disabled.
pub const DISABLED_SENTINEL: &str = "TEST_DISABLED";

/// Format the ticket number for the given counter value.
pub fn format_ticket_number(counter: u64) -> String {
    format!("{NUMBER_PREFIX}{counter:07}")
}

/// Business fields of a creation request.
///
/// Values are kept as-is: the mock does not validate
/// what the caller sends for these fields.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IncidentPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub caller_id: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub assignment_group: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub impact: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub urgency: Option<Value>,
}

impl IncidentPayload {
    /// Read the business fields from a JSON request body.
    ///
    /// Only a JSON object carries fields: an empty body, invalid JSON
    /// or any other JSON value yields an empty payload.
    pub fn from_json_slice(body: &[u8]) -> Self {
        if body.is_empty() {
            return Self::default();
        }
        match serde_json::from_slice::<Map<String, Value>>(body) {
            Ok(fields) => Self::from_fields(fields),
            Err(err) => {
                tracing::debug!("ignore incident body which is not a JSON object: {err}");
                Self::default()
            }
        }
    }

    fn from_fields(mut fields: Map<String, Value>) -> Self {
        let mut take = |key: &str| fields.remove(key).filter(|value| !value.is_null());
        Self {
            short_description: take("short_description"),
            description: take("description"),
            caller_id: take("caller_id"),
            assignment_group: take("assignment_group"),
            impact: take("impact"),
            urgency: take("urgency"),
        }
    }
}

/// An incident record as created by the mock.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Ticket {
    pub sys_id: String,
    pub number: String,
    #[serde(flatten)]
    pub fields: IncidentPayload,
    pub state: String,
    pub created_on: String,
    pub created_by: String,
}

/// Placeholder returned when ticket creation is disabled.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TicketStub {
    pub sys_id: String,
    pub number: String,
    pub short_description: String,
}

impl Default for TicketStub {
    fn default() -> Self {
        Self {
            sys_id: DISABLED_SENTINEL.to_owned(),
            number: DISABLED_SENTINEL.to_owned(),
            short_description: "Ticket creation disabled for testing".to_owned(),
        }
    }
}

/// Append-only, ordered ticket storage with its number counter.
#[derive(Debug)]
pub struct TicketStore {
    tickets: Vec<Ticket>,
    counter: u64,
}

impl Default for TicketStore {
    fn default() -> Self {
        Self {
            tickets: Vec::new(),
            counter: 1,
        }
    }
}

impl TicketStore {
    /// Create a ticket for the payload and append it.
    pub fn create(&mut self, fields: IncidentPayload, created_on: SystemTime) -> Ticket {
        let number = format_ticket_number(self.counter);
        let ticket = Ticket {
            sys_id: number.clone(),
            number,
            fields,
            state: INITIAL_STATE.to_owned(),
            created_on: humantime::format_rfc3339_millis(created_on).to_string(),
            created_by: CREATED_BY.to_owned(),
        };

        self.tickets.push(ticket.clone());
        self.counter += 1;

        ticket
    }

    #[inline(always)]
    pub fn tickets(&self) -> &[Ticket] {
        &self.tickets
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.tickets.len()
    }

    #[cfg(test)]
    pub fn is_empty(&self) -> bool {
        self.tickets.is_empty()
    }

    /// Number the next created ticket will get.
    #[cfg(test)]
    pub fn next_number(&self) -> String {
        format_ticket_number(self.counter)
    }

    /// Remove all tickets and reset the counter,
    /// returning the amount of removed tickets.
    pub fn clear(&mut self) -> usize {
        let cleared = self.tickets.len();
        self.tickets.clear();
        self.counter = 1;
        cleared
    }
}

#[cfg(test)]
mod tests {
    use std::time::{Duration, UNIX_EPOCH};

    use serde_json::json;

    use super::*;

    fn payload(short_description: &str) -> IncidentPayload {
        IncidentPayload {
            short_description: Some(json!(short_description)),
            ..Default::default()
        }
    }

    #[test]
    fn test_format_ticket_number() {
        for (counter, expected) in [
            (1, "INC0000001"),
            (42, "INC0000042"),
            (1_234_567, "INC1234567"),
            (9_999_999, "INC9999999"),
            (10_000_000, "INC10000000"),
        ] {
            assert_eq!(expected, format_ticket_number(counter), "counter = {counter}");
        }
    }

    #[test]
    fn test_store_numbers_strictly_increasing() {
        let mut store = TicketStore::default();
        let numbers: Vec<_> = (0..25)
            .map(|i| {
                store
                    .create(payload(&format!("ticket {i}")), SystemTime::now())
                    .number
            })
            .collect();

        assert_eq!("INC0000001", numbers[0]);
        assert_eq!("INC0000025", numbers[24]);
        assert!(numbers.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(25, store.len());
        assert_eq!("INC0000026", store.next_number());
    }

    #[test]
    fn test_store_clear_resets_counter() {
        let mut store = TicketStore::default();
        for _ in 0..3 {
            store.create(payload("disk full"), SystemTime::now());
        }

        assert_eq!(3, store.clear());
        assert!(store.is_empty());
        assert_eq!(0, store.clear());

        let ticket = store.create(payload("disk full"), SystemTime::now());
        assert_eq!("INC0000001", ticket.number);
        assert_eq!("INC0000001", ticket.sys_id);
    }

    #[test]
    fn test_ticket_json_layout() {
        let mut store = TicketStore::default();
        let ticket = store.create(
            IncidentPayload {
                short_description: Some(json!("disk full")),
                impact: Some(json!(2)),
                urgency: Some(json!(null)),
                ..Default::default()
            },
            UNIX_EPOCH + Duration::from_millis(1_700_000_000_123),
        );

        assert_eq!(
            json!({
                "sys_id": "INC0000001",
                "number": "INC0000001",
                "short_description": "disk full",
                "impact": 2,
                "urgency": null,
                "state": "1",
                "created_on": "2023-11-14T22:13:20.123Z",
                "created_by": "azure_insight",
            }),
            serde_json::to_value(&ticket).unwrap(),
        );
    }

    #[test]
    fn test_payload_passthrough_unvalidated() {
        let payload = IncidentPayload::from_json_slice(
            br#"{
                "short_description": ["not", "a", "string"],
                "caller_id": {"sys_id": 7},
                "urgency": null,
                "unknown_field": true
            }"#,
        );

        assert_eq!(Some(json!(["not", "a", "string"])), payload.short_description);
        assert_eq!(Some(json!({"sys_id": 7})), payload.caller_id);
        assert_eq!(None, payload.description);
        assert_eq!(None, payload.urgency);
    }

    #[test]
    fn test_payload_only_from_json_object() {
        for body in [
            &b""[..],
            b"   ",
            b"short_description=disk+full",
            b"{\"short_description\": ",
            br#"["disk full", "details"]"#,
            br#""disk full""#,
            b"42",
            b"null",
        ] {
            assert_eq!(
                IncidentPayload::default(),
                IncidentPayload::from_json_slice(body),
                "body = {}",
                String::from_utf8_lossy(body),
            );
        }
    }

    #[test]
    fn test_stub_json_layout() {
        assert_eq!(
            json!({
                "sys_id": "TEST_DISABLED",
                "number": "TEST_DISABLED",
                "short_description": "Ticket creation disabled for testing",
            }),
            serde_json::to_value(TicketStub::default()).unwrap(),
        );
    }
}
