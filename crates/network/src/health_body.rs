use std::collections::BTreeMap;

use primitives::StatusValue;

/// Parse a multi-component health body of newline separated `key=value` lines.
///
/// A value of `1` maps to [`StatusValue::Operational`], anything else to
/// [`StatusValue::MajorOutage`]. Blank lines are skipped. Returns `None` for an
/// empty body or when any line is not a `key=value` pair.
pub fn parse_health_body(body: &str) -> Option<BTreeMap<String, StatusValue>> {
    let mut statuses = BTreeMap::new();

    for line in body.lines().map(str::trim).filter(|l| !l.is_empty()) {
        let (key, value) = line.split_once('=')?;
        let key = key.trim();
        if key.is_empty() {
            return None;
        }
        statuses.insert(key.to_owned(), StatusValue::from_flag(value.trim()));
    }

    (!statuses.is_empty()).then_some(statuses)
}
