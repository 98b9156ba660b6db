use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

use crate::datetime::{format_time, parse_flexible_date, parse_time, to_display};
use crate::error::{AgendaError, AgendaResult, ValidationError};

/// Stored events are read back through [`CalendarEvent::restore`], so a list
/// that breaks the model invariants never deserializes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "stored::StoredEvent", into = "stored::StoredEvent")]
pub struct CalendarEvent {
    id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub all_day: bool,
}

/// Validated event fields, ready to become a new event or replace an
/// existing one.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventDraft {
    pub title: String,
    pub description: Option<String>,
    pub date: NaiveDate,
    pub time: Option<NaiveTime>,
    pub end_time: Option<NaiveTime>,
    pub all_day: bool,
}

impl CalendarEvent {
    /// New event with a freshly generated id.
    pub fn create(draft: EventDraft) -> Self {
        Self::with_id(Uuid::new_v4(), draft)
    }

    /// Rebuild an event that already has an id (read from a store). Title,
    /// all-day and time-range rules are the same ones the form enforces.
    pub fn restore(id: Uuid, draft: EventDraft) -> AgendaResult<Self> {
        let problem = if draft.title.trim().is_empty() {
            Some("blank title")
        } else if draft.all_day && (draft.time.is_some() || draft.end_time.is_some()) {
            Some("all-day event with a time")
        } else {
            match (draft.time, draft.end_time) {
                (None, Some(_)) => Some("end time without a start time"),
                (Some(start), Some(end)) if end < start => Some("end time before start time"),
                _ => None,
            }
        };

        match problem {
            Some(problem) => Err(AgendaError::MalformedEvent(format!("{}: {}", id, problem))),
            None => Ok(Self::with_id(id, draft)),
        }
    }

    fn with_id(id: Uuid, draft: EventDraft) -> Self {
        Self {
            id,
            title: draft.title,
            description: draft.description,
            date: draft.date,
            time: draft.time,
            end_time: draft.end_time,
            all_day: draft.all_day,
        }
    }

    pub fn id(&self) -> Uuid {
        self.id
    }

    /// Full-field replace; the id is kept.
    pub fn replace(&mut self, draft: EventDraft) {
        *self = Self::with_id(self.id, draft);
    }

    pub fn is_all_day(&self) -> bool {
        self.all_day
    }

    /// Ordering key: all-day and untimed events count as midnight.
    pub fn starts_at(&self) -> NaiveDateTime {
        let time = if self.is_all_day() {
            NaiveTime::MIN
        } else {
            self.time.unwrap_or(NaiveTime::MIN)
        };
        self.date.and_time(time)
    }
}

impl fmt::Display for CalendarEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.time, self.end_time) {
            _ if self.is_all_day() => write!(f, "[ALL DAY] {}: {}", to_display(self.date), self.title),
            (Some(start), Some(end)) => write!(
                f,
                "{} {}-{}: {}",
                to_display(self.date),
                format_time(start),
                format_time(end),
                self.title
            ),
            (Some(start), None) => write!(
                f,
                "{} {}: {}",
                to_display(self.date),
                format_time(start),
                self.title
            ),
            (None, _) => write!(f, "{}: {}", to_display(self.date), self.title),
        }
    }
}

/// Sort ascending by date and start time, untimed events first on their day.
/// The sort is stable, so ties keep their insertion order.
pub fn sort_events(events: &mut [CalendarEvent]) {
    events.sort_by(|a, b| a.starts_at().cmp(&b.starts_at()));
}

/// Raw contents of the add/edit form, exactly as the user typed them.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventForm {
    pub title: String,
    pub description: String,
    pub date: String,
    pub time: String,
    pub end_time: String,
    pub all_day: bool,
}

impl EventForm {
    /// Pre-fill the form for editing `event`.
    pub fn from_event(event: &CalendarEvent) -> Self {
        Self {
            title: event.title.clone(),
            description: event.description.clone().unwrap_or_default(),
            date: to_display(event.date),
            time: event.time.map(format_time).unwrap_or_default(),
            end_time: event.end_time.map(format_time).unwrap_or_default(),
            all_day: event.all_day,
        }
    }

    /// Checks run in order: date, title, start time, end time. The first
    /// failure wins.
    pub fn validate(&self) -> Result<EventDraft, ValidationError> {
        let date = parse_flexible_date(&self.date).ok_or(ValidationError::InvalidDate)?;

        let title = self.title.trim();
        if title.is_empty() {
            return Err(ValidationError::MissingTitle);
        }

        let (time, end_time) = if self.all_day {
            (None, None)
        } else {
            let start = parse_time(&self.time).ok_or(ValidationError::InvalidTime)?;
            let end = match self.end_time.as_str() {
                "" => None,
                raw => {
                    let end = parse_time(raw).ok_or(ValidationError::InvalidEndTime)?;
                    if end < start {
                        return Err(ValidationError::InvalidEndTime);
                    }
                    Some(end)
                }
            };
            (Some(start), end)
        };

        let description = Some(self.description.trim())
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Ok(EventDraft {
            title: title.to_string(),
            description,
            date,
            time,
            end_time,
            all_day: self.all_day,
        })
    }
}

mod stored {
    use chrono::{NaiveDate, NaiveTime};
    use serde::{Deserialize, Serialize};
    use uuid::Uuid;

    use super::{CalendarEvent, EventDraft};
    use crate::error::AgendaError;

    /// On-disk JSON shape: camelCase keys, `YYYY-MM-DD` dates, `HH:MM` times.
    #[derive(Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct StoredEvent {
        id: Uuid,
        title: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        description: Option<String>,
        #[serde(with = "iso_date")]
        date: NaiveDate,
        #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
        time: Option<NaiveTime>,
        #[serde(default, with = "hhmm", skip_serializing_if = "Option::is_none")]
        end_time: Option<NaiveTime>,
        #[serde(default)]
        all_day: bool,
    }

    impl From<CalendarEvent> for StoredEvent {
        fn from(event: CalendarEvent) -> Self {
            Self {
                id: event.id,
                title: event.title,
                description: event.description,
                date: event.date,
                time: event.time,
                end_time: event.end_time,
                all_day: event.all_day,
            }
        }
    }

    impl TryFrom<StoredEvent> for CalendarEvent {
        type Error = AgendaError;

        fn try_from(stored: StoredEvent) -> Result<Self, Self::Error> {
            CalendarEvent::restore(
                stored.id,
                EventDraft {
                    title: stored.title,
                    description: stored.description,
                    date: stored.date,
                    time: stored.time,
                    end_time: stored.end_time,
                    all_day: stored.all_day,
                },
            )
        }
    }

    mod iso_date {
        use chrono::NaiveDate;
        use serde::{de, Deserialize, Deserializer, Serializer};

        use crate::datetime::{parse_iso_date, to_iso};

        pub fn serialize<S: Serializer>(date: &NaiveDate, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.serialize_str(&to_iso(*date))
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDate, D::Error> {
            let raw = String::deserialize(deserializer)?;
            parse_iso_date(&raw).ok_or_else(|| de::Error::custom(format!("invalid date '{}'", raw)))
        }
    }

    mod hhmm {
        use chrono::NaiveTime;
        use serde::{de, Deserialize, Deserializer, Serializer};

        use crate::datetime::{format_time, parse_time};

        pub fn serialize<S: Serializer>(
            time: &Option<NaiveTime>,
            serializer: S,
        ) -> Result<S::Ok, S::Error> {
            match time {
                Some(t) => serializer.serialize_some(&format_time(*t)),
                None => serializer.serialize_none(),
            }
        }

        pub fn deserialize<'de, D: Deserializer<'de>>(
            deserializer: D,
        ) -> Result<Option<NaiveTime>, D::Error> {
            let raw: Option<String> = Option::deserialize(deserializer)?;
            raw.map(|s| parse_time(&s).ok_or_else(|| de::Error::custom(format!("invalid time '{}'", s))))
                .transpose()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(title: &str, date: &str, time: &str) -> EventForm {
        EventForm {
            title: title.to_string(),
            date: date.to_string(),
            time: time.to_string(),
            ..Default::default()
        }
    }

    fn event(date: &str, time: Option<&str>, all_day: bool) -> CalendarEvent {
        CalendarEvent::create(EventDraft {
            title: format!("{} {:?}", date, time),
            description: None,
            date: parse_flexible_date(date).unwrap(),
            time: time.map(|t| parse_time(t).unwrap()),
            end_time: None,
            all_day,
        })
    }

    #[test]
    fn test_validate_accepts_timed_event() {
        let mut f = form("  Dentist  ", "05/07/2025", "09:30");
        f.end_time = "10:15".to_string();
        f.description = "  bring card ".to_string();
        let draft = f.validate().unwrap();
        assert_eq!(draft.title, "Dentist");
        assert_eq!(draft.description.as_deref(), Some("bring card"));
        assert_eq!(draft.date, NaiveDate::from_ymd_opt(2025, 7, 5).unwrap());
        assert_eq!(draft.time, NaiveTime::from_hms_opt(9, 30, 0));
        assert_eq!(draft.end_time, NaiveTime::from_hms_opt(10, 15, 0));
        assert!(!draft.all_day);
    }

    #[test]
    fn test_validate_all_day_drops_times() {
        let mut f = form("Holiday", "2025-12-25", "garbage");
        f.end_time = "also garbage".to_string();
        f.all_day = true;
        let draft = f.validate().unwrap();
        assert!(draft.all_day);
        assert_eq!(draft.time, None);
        assert_eq!(draft.end_time, None);
    }

    #[test]
    fn test_validate_order_of_checks() {
        assert_eq!(form("", "31/02/2024", "").validate(), Err(ValidationError::InvalidDate));
        assert_eq!(form("   ", "29/02/2024", "").validate(), Err(ValidationError::MissingTitle));
        assert_eq!(form("Run", "29/02/2024", "9:30").validate(), Err(ValidationError::InvalidTime));
        assert_eq!(form("Run", "29/02/2024", "").validate(), Err(ValidationError::InvalidTime));

        let mut f = form("Run", "29/02/2024", "09:30");
        f.end_time = "09:00".to_string();
        assert_eq!(f.validate(), Err(ValidationError::InvalidEndTime));
    }

    #[test]
    fn test_form_round_trip_through_edit() {
        let mut f = form("Standup", "2025-01-02", "08:00");
        f.end_time = "08:15".to_string();
        let original = CalendarEvent::create(f.validate().unwrap());
        let prefilled = EventForm::from_event(&original);
        assert_eq!(prefilled.date, "02/01/2025");
        assert_eq!(prefilled.time, "08:00");

        let mut edited = original.clone();
        edited.replace(prefilled.validate().unwrap());
        assert_eq!(edited, original);
    }

    #[test]
    fn test_replace_keeps_id() {
        let mut ev = event("2025-01-01", Some("10:00"), false);
        let id = ev.id();
        ev.replace(form("Renamed", "03/01/2025", "11:00").validate().unwrap());
        assert_eq!(ev.id(), id);
        assert_eq!(ev.title, "Renamed");
    }

    #[test]
    fn test_sort_all_day_first_on_same_date() {
        let mut events = vec![
            event("2025-01-02", None, true),
            event("2025-01-02", Some("08:00"), false),
            event("2025-01-01", Some("23:00"), false),
        ];
        sort_events(&mut events);
        let order: Vec<String> = events.iter().map(|e| e.starts_at().to_string()).collect();
        assert_eq!(
            order,
            vec!["2025-01-01 23:00:00", "2025-01-02 00:00:00", "2025-01-02 08:00:00"]
        );
        assert!(events[1].all_day);
    }

    #[test]
    fn test_json_shape() {
        let mut f = form("Lunch", "05/07/2025", "12:00");
        f.end_time = "13:00".to_string();
        let ev = CalendarEvent::create(f.validate().unwrap());
        let json = serde_json::to_value(&ev).unwrap();
        assert_eq!(json["date"], "2025-07-05");
        assert_eq!(json["time"], "12:00");
        assert_eq!(json["endTime"], "13:00");
        assert_eq!(json["allDay"], false);
        assert!(json.get("description").is_none());

        let back: CalendarEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back, ev);
    }

    #[test]
    fn test_json_rejects_bad_time() {
        let raw = r#"{"id":"7d444840-9dc0-11d1-b245-5ffdce74fad2","title":"x","date":"2025-07-05","time":"25:00"}"#;
        assert!(serde_json::from_str::<CalendarEvent>(raw).is_err());
    }

    #[test]
    fn test_json_rejects_broken_invariants() {
        let id = r#""id":"7d444840-9dc0-11d1-b245-5ffdce74fad2","date":"2025-07-05""#;
        for fields in [
            r#""title":"   ","time":"10:00""#,
            r#""title":"x","allDay":true,"time":"10:00""#,
            r#""title":"x","allDay":true,"endTime":"08:00""#,
            r#""title":"x","endTime":"08:00""#,
            r#""title":"x","time":"10:00","endTime":"08:00""#,
        ] {
            let raw = format!("{{{},{}}}", id, fields);
            assert!(serde_json::from_str::<CalendarEvent>(&raw).is_err(), "{raw}");
        }

        let ok = format!(r#"{{{},"title":"x","time":"08:00","endTime":"08:00"}}"#, id);
        assert!(serde_json::from_str::<CalendarEvent>(&ok).is_ok());
    }

    #[test]
    fn test_restore_reports_the_problem() {
        let draft = EventDraft {
            title: "x".to_string(),
            description: None,
            date: NaiveDate::from_ymd_opt(2025, 7, 5).unwrap(),
            time: None,
            end_time: NaiveTime::from_hms_opt(8, 0, 0),
            all_day: false,
        };
        let err = CalendarEvent::restore(Uuid::nil(), draft).unwrap_err();
        assert!(err.to_string().contains("end time without a start time"));
    }

    #[test]
    fn test_all_day_sorts_at_midnight_even_with_a_time() {
        let mut all_day = event("2025-01-02", Some("10:00"), true);
        all_day.title = "all day".to_string();
        let mut events = vec![event("2025-01-02", Some("08:00"), false), all_day];
        sort_events(&mut events);
        assert_eq!(events[0].title, "all day");
        assert_eq!(events[0].starts_at().to_string(), "2025-01-02 00:00:00");
    }

    #[test]
    fn test_display() {
        let ev = event("2025-07-05", None, true);
        assert!(ev.to_string().starts_with("[ALL DAY] 05/07/2025"));
        let ev = event("2025-07-05", Some("09:00"), false);
        assert!(ev.to_string().starts_with("05/07/2025 09:00:"));
    }
}
