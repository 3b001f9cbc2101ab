use crate::entry::Entry;
use std::io::{self, Write};
use url::Url;

/// Options for the ranked text report
#[derive(Debug, Clone, Default)]
pub struct ReportOptions {
    /// Print each entry's link, resolved against this base, under its title
    pub links_base: Option<Url>,
}

/// Writes entries as `"<rank> <title>"` lines, rank starting at 1
pub fn write_ranked<W: Write>(
    out: &mut W,
    entries: &[Entry],
    options: &ReportOptions,
) -> io::Result<()> {
    writeln!(out, "Extracted Entries:")?;
    for (rank, entry) in entries.iter().enumerate() {
        writeln!(out, "{} {}", rank + 1, entry.title())?;
        if let Some(base) = &options.links_base {
            writeln!(out, "\t{}", entry.resolve_link(base))?;
        }
    }
    Ok(())
}

/// Writes entries as a JSON array, in the given order
pub fn write_json<W: Write>(out: &mut W, entries: &[Entry]) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut *out, entries)?;
    writeln!(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn entries() -> Vec<Entry> {
        vec![
            Entry::new("Newest", "item?id=2", Utc.timestamp_opt(200, 0).unwrap()),
            Entry::new("Older", "https://example.com/a", Utc.timestamp_opt(100, 0).unwrap()),
        ]
    }

    #[test]
    fn test_ranked_lines() {
        let mut out = Vec::new();
        write_ranked(&mut out, &entries(), &ReportOptions::default()).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Extracted Entries:\n1 Newest\n2 Older\n"
        );
    }

    #[test]
    fn test_ranked_lines_with_links() {
        let options = ReportOptions {
            links_base: Some(Url::parse("https://news.ycombinator.com/newest").unwrap()),
        };
        let mut out = Vec::new();
        write_ranked(&mut out, &entries(), &options).unwrap();
        assert_eq!(
            String::from_utf8(out).unwrap(),
            "Extracted Entries:\n1 Newest\n\thttps://news.ycombinator.com/item?id=2\n2 Older\n\thttps://example.com/a\n"
        );
    }

    #[test]
    fn test_empty_report() {
        let mut out = Vec::new();
        write_ranked(&mut out, &[], &ReportOptions::default()).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "Extracted Entries:\n");
    }

    #[test]
    fn test_json_keeps_order() {
        let mut out = Vec::new();
        write_json(&mut out, &entries()).unwrap();
        let parsed: Vec<Entry> = serde_json::from_slice(&out).unwrap();
        assert_eq!(parsed, entries());
    }
}
