//! Community submission rows.
//!
//! CSV with the columns `testcase-id, verdict, format, date, source, engine,
//! user-agent`. Fields may be double-quoted, with `""` as an escaped quote.

use chrono::{DateTime, NaiveDate, NaiveDateTime};
use tracing::{debug, warn};

use super::{LoadStats, Parsed};
use crate::config::ReportConfig;
use crate::domain::error::Result;
use crate::domain::record::{Reliability, ResultRecord, SubmissionFields, SubmissionResult};
use crate::domain::test_id::TestId;
use crate::registry::TestRegistry;
use crate::reporter::is_reserved_engine_name;

const FIELD_COUNT: usize = 7;
const HEADER_FIRST_FIELDS: [&str; 3] = ["testcase", "testcase-id", "id"];

/// One accepted submission row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Submission {
    pub id: TestId,
    pub result: SubmissionResult,
}

/// Split one CSV line, honouring double quotes.
fn split_csv_line(line: &str) -> Vec<String> {
    let mut fields = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    let mut chars = line.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '"' if quoted && chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
            }
            '"' => quoted = !quoted,
            ',' if !quoted => fields.push(std::mem::take(&mut current)),
            _ => current.push(c),
        }
    }
    fields.push(current);
    fields
}

fn parse_date(raw: &str) -> Option<NaiveDateTime> {
    let raw = raw.trim();
    NaiveDateTime::parse_from_str(raw, "%Y-%m-%d %H:%M:%S")
        .ok()
        .or_else(|| DateTime::parse_from_rfc3339(raw).ok().map(|dt| dt.naive_utc()))
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Parse submission CSV text.
///
/// Rows with too few fields, an empty id, verdict or engine, an unreadable
/// date, or an engine named like a fixed snapshot key (`id`, `issue`) are
/// skipped with a warning.
pub fn parse_submissions(text: &str, config: &ReportConfig) -> Parsed<Submission> {
    let mut parsed = Parsed::default();

    for (index, raw) in text.lines().enumerate() {
        let line = raw.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let fields = split_csv_line(line);
        let first = fields[0].trim();
        if index == 0
            && HEADER_FIRST_FIELDS
                .iter()
                .any(|header| first.eq_ignore_ascii_case(header))
        {
            continue;
        }
        if fields.len() < FIELD_COUNT {
            warn!(line = index + 1, fields = fields.len(), "submission row too short, skipped");
            parsed.skipped += 1;
            continue;
        }

        let [id, verdict, format, date, source, engine, user_agent] = [
            &fields[0], &fields[1], &fields[2], &fields[3], &fields[4], &fields[5], &fields[6],
        ]
        .map(|field| field.trim());

        let Some(id) = TestId::from_path(id) else {
            warn!(line = index + 1, id, "submission has no usable test id, skipped");
            parsed.skipped += 1;
            continue;
        };
        if verdict.is_empty() || engine.is_empty() {
            warn!(line = index + 1, test = %id, "submission without verdict or engine, skipped");
            parsed.skipped += 1;
            continue;
        }
        let Some(date) = parse_date(date) else {
            warn!(line = index + 1, test = %id, date, "submission date unreadable, skipped");
            parsed.skipped += 1;
            continue;
        };

        let reliability = if config.is_trusted(source) {
            Reliability::Trusted
        } else {
            Reliability::Anonymous
        };
        let result = SubmissionResult::new(
            SubmissionFields {
                engine: engine.to_string(),
                user_agent: user_agent.to_string(),
                verdict: verdict.to_string(),
                format: (!format.is_empty()).then(|| format.to_string()),
                date: Some(date),
                source: source.to_string(),
                reliability,
            },
            &config.engine_alias,
        );

        if is_reserved_engine_name(result.engine()) {
            warn!(line = index + 1, test = %id, engine = result.engine(), "engine name is reserved, skipped");
            parsed.skipped += 1;
            continue;
        }

        debug!(test = %id, engine = result.engine(), verdict = %result.verdict(), "submission row");
        parsed.records.push(Submission { id, result });
    }
    parsed
}

/// Feed submissions through the precedence comparator.
///
/// Tests are created on first reference.
pub fn apply_submissions(
    registry: &mut TestRegistry,
    submissions: Vec<Submission>,
) -> Result<LoadStats> {
    let mut stats = LoadStats::default();
    for Submission { id, result } in submissions {
        registry
            .get_or_create(&id)
            .add_result(ResultRecord::Submission(result))?;
        stats.applied += 1;
    }
    Ok(stats)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::verdict::Verdict;

    fn config() -> ReportConfig {
        ReportConfig {
            trusted_sources: vec!["fantasai".to_string()],
            ..ReportConfig::default()
        }
    }

    #[test]
    fn test_split_handles_quotes_and_escapes() {
        let fields = split_csv_line(r#"t-001,pass,html,"2016-01-02 03:04:05","a, b","say ""hi""",ua"#);
        assert_eq!(
            fields,
            vec!["t-001", "pass", "html", "2016-01-02 03:04:05", "a, b", "say \"hi\"", "ua"]
        );
    }

    #[test]
    fn test_date_formats() {
        assert!(parse_date("2016-01-02 03:04:05").is_some());
        assert!(parse_date("2016-01-02T03:04:05Z").is_some());
        assert_eq!(
            parse_date("2016-01-02"),
            NaiveDate::from_ymd_opt(2016, 1, 2).and_then(|d| d.and_hms_opt(0, 0, 0))
        );
        assert!(parse_date("yesterday").is_none());
        assert!(parse_date("").is_none());
    }

    #[test]
    fn test_parse_rows() {
        let text = "testcase-id,result,format,date,source,engine,useragent\n\
                    t-001,pass,html,2016-01-02 03:04:05,fantasai,Gecko,Mozilla/5.0 Firefox/44.0\n\
                    t-002,fail,xhtml1,2016-01-03,someone,WebKit,Mozilla/5.0 Chrome/48.0 Safari/537.36\n\
                    t-003,pass,html,not-a-date,someone,gecko,ua\n\
                    t-004,pass\n";
        let parsed = parse_submissions(text, &config());

        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.records.len(), 2);

        let first = &parsed.records[0];
        assert_eq!(first.id.as_str(), "t-001");
        assert_eq!(first.result.engine(), "gecko");
        assert_eq!(first.result.reliability(), Reliability::Trusted);
        assert_eq!(first.result.format(), Some("html"));

        let second = &parsed.records[1];
        assert_eq!(second.result.engine(), "blink");
        assert_eq!(second.result.reliability(), Reliability::Anonymous);
        assert_eq!(second.result.verdict(), &Verdict::Fail);
    }

    #[test]
    fn test_apply_keeps_latest_and_creates_tests() {
        let text = "t-009,fail,html,2016-01-01,someone,gecko,ua\n\
                    t-009,pass,html,2016-02-01,someone,gecko,ua\n\
                    t-009,fail,html,2016-01-15,someone,gecko,ua\n";
        let parsed = parse_submissions(text, &config());
        let mut registry = TestRegistry::new("blink");

        let stats = apply_submissions(&mut registry, parsed.records).expect("apply");

        assert_eq!(stats.applied, 3);
        let test = registry.get(&TestId::new("t-009").expect("id")).expect("created");
        assert_eq!(test.result("gecko").expect("gecko").verdict(), Verdict::Pass);
        assert!(!test.in_template());
    }

    #[test]
    fn test_engine_names_clashing_with_snapshot_keys_are_skipped() {
        let text = "t-001,fail,html,2016-01-02,fantasai,id,ua\n\
                    t-001,fail,html,2016-01-02,fantasai,ISSUE,ua\n\
                    t-001,pass,html,2016-01-02,fantasai,gecko,ua\n";
        let parsed = parse_submissions(text, &config());

        assert_eq!(parsed.skipped, 2);
        assert_eq!(parsed.records.len(), 1);
        assert_eq!(parsed.records[0].result.engine(), "gecko");
    }
}
