use crate::config::Selectors;
use crate::engine::AutomationEngine;
use crate::entry::Entry;
use crate::error::{EngineError, RowFault, RowParseFailure};
use crate::listing::locator::{LocateError, MetadataLocator};
use chrono::{DateTime, NaiveDateTime, TimeZone, Utc};

/// Failure while parsing one row
#[derive(Debug)]
pub enum RowError {
    /// The row itself is malformed; skip it
    Malformed(RowParseFailure),
    /// The engine failed underneath us; the whole page is suspect
    Engine(EngineError),
}

impl From<EngineError> for RowError {
    fn from(e: EngineError) -> Self {
        RowError::Engine(e)
    }
}

/// Turns one title row into an [`Entry`]
pub struct RowParser<E: AutomationEngine> {
    title_selector: String,
    timestamp_attribute: String,
    locator: Box<dyn MetadataLocator<E>>,
}

impl<E: AutomationEngine> RowParser<E> {
    pub fn new(selectors: &Selectors, locator: Box<dyn MetadataLocator<E>>) -> Self {
        Self {
            title_selector: selectors.title.clone(),
            timestamp_attribute: selectors.timestamp_attribute.clone(),
            locator,
        }
    }

    pub fn set_locator(&mut self, locator: Box<dyn MetadataLocator<E>>) {
        self.locator = locator;
    }

    /// Parse the row at `index` of page `page`
    pub async fn parse_row(
        &self,
        engine: &E,
        row: &E::Handle,
        page: usize,
        index: usize,
    ) -> Result<Entry, RowError> {
        let fail = |fault: RowFault| RowError::Malformed(RowParseFailure { page, index, fault });

        let (anchor, age) = futures::join!(
            engine.query_within(row, &self.title_selector),
            self.locator.locate(engine, row),
        );
        let anchor = anchor?.ok_or_else(|| fail(RowFault::MissingAnchor))?;
        let age = age.map_err(|e| match e {
            LocateError::Missing(fault) => fail(fault),
            LocateError::Engine(e) => RowError::Engine(e),
        })?;

        let (title, link, stamp) = futures::join!(
            engine.read_text(&anchor),
            engine.read_attribute(&anchor, "href"),
            engine.read_attribute(&age, &self.timestamp_attribute),
        );
        let title = title?.trim().to_string();
        let link = link?.ok_or_else(|| fail(RowFault::MissingLink))?;
        let stamp = stamp?.ok_or_else(|| {
            fail(RowFault::MissingTimestamp(self.timestamp_attribute.clone()))
        })?;
        let recency = parse_recency(&stamp)
            .ok_or_else(|| fail(RowFault::UnparsableTimestamp(stamp.clone())))?;

        Ok(Entry::new(title, link, recency))
    }
}

/// Parses the age indicator's timestamp attribute into an absolute instant.
///
/// The listing writes `"2025-10-14T18:22:03 1760466123"`: an ISO-8601
/// instant in UTC followed by the same instant in unix seconds. The ISO part
/// is authoritative; a value consisting only of unix seconds is accepted too.
/// Relative text such as `"3 hours ago"` is rejected.
pub fn parse_recency(raw: &str) -> Option<DateTime<Utc>> {
    let mut tokens = raw.split_whitespace();
    let first = tokens.next()?;

    if let Ok(at) = DateTime::parse_from_rfc3339(first) {
        return Some(at.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(first, "%Y-%m-%dT%H:%M:%S") {
        return Some(naive.and_utc());
    }
    if tokens.next().is_none() && first.bytes().all(|b| b.is_ascii_digit()) {
        let secs = first.parse::<i64>().ok()?;
        return Utc.timestamp_opt(secs, 0).single();
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_listing_timestamp() {
        let at = parse_recency("2025-10-14T18:22:03 1760466123").unwrap();
        assert_eq!(at.timestamp(), 1_760_466_123);
    }

    #[test]
    fn test_parse_rfc3339_and_epoch() {
        let rfc = parse_recency("2025-10-14T20:22:03+02:00").unwrap();
        assert_eq!(rfc.timestamp(), 1_760_466_123);

        let epoch = parse_recency("1760466123").unwrap();
        assert_eq!(epoch, rfc);
    }

    #[test]
    fn test_full_instant_orders_within_a_day() {
        // Same date, different times: a date-only or time-only slice would tie or misorder
        let earlier = parse_recency("2025-10-14T09:00:00 1760432400").unwrap();
        let later = parse_recency("2025-10-14T18:00:00 1760464800").unwrap();
        assert!(later > earlier);

        let yesterday_late = parse_recency("2025-10-13T23:59:59 1760399999").unwrap();
        assert!(earlier > yesterday_late);
    }

    #[test]
    fn test_rejects_relative_and_empty() {
        assert!(parse_recency("3 hours ago").is_none());
        assert!(parse_recency("").is_none());
        assert!(parse_recency("   ").is_none());
        assert!(parse_recency("yesterday").is_none());
        assert!(parse_recency("2025-13-40T99:00:00").is_none());
    }
}
