//! Saved matches that have not kicked off yet

use chrono::{NaiveDate, NaiveTime};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use crate::models::SavedMatch;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingMatch {
    pub match_id: String,
    pub home_team: String,
    pub away_team: String,
    /// Kickoff, epoch milliseconds (UTC)
    pub kickoff: i64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ev: Option<f64>,
}

/// Kickoff of a match from `data.matchDate` (`YYYY-MM-DD`) and
/// `data.matchTime` (`HH:MM`, seconds ignored)
pub fn kickoff_millis(saved: &SavedMatch) -> Option<i64> {
    let data = saved.extra.get("data")?;
    let date = data.get("matchDate")?.as_str()?.trim();
    let time = data.get("matchTime")?.as_str()?.trim();

    let date = NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()?;

    let mut parts = time.split(':');
    let hour: u32 = parts.next()?.trim().parse().ok()?;
    let minute: u32 = parts.next()?.trim().parse().ok()?;
    let time = NaiveTime::from_hms_opt(hour, minute, 0)?;

    Some(date.and_time(time).and_utc().timestamp_millis())
}

fn team(data: Option<&Value>, key: &str) -> String {
    data.and_then(|d| d.get(key))
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string()
}

/// Matches kicking off strictly after `now`, soonest first
///
/// Matches without a parseable date and time are skipped.
pub fn upcoming_matches(matches: &[SavedMatch], now: i64) -> Vec<UpcomingMatch> {
    let mut upcoming: Vec<UpcomingMatch> = matches
        .iter()
        .filter_map(|saved| {
            let Some(kickoff) = kickoff_millis(saved) else {
                debug!(match_id = %saved.id, "skipping match without a usable kickoff");
                return None;
            };
            if kickoff <= now {
                return None;
            }

            let data = saved.extra.get("data");
            Some(UpcomingMatch {
                match_id: saved.id.clone(),
                home_team: team(data, "homeTeam"),
                away_team: team(data, "awayTeam"),
                kickoff,
                ev: saved.ev(),
            })
        })
        .collect();

    upcoming.sort_by(|a, b| {
        a.kickoff
            .cmp(&b.kickoff)
            .then_with(|| a.match_id.cmp(&b.match_id))
    });
    upcoming
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn fixture(id: &str, date: &str, time: &str) -> SavedMatch {
        let mut saved = SavedMatch::new(id, 0);
        saved.extra.insert(
            "data".to_string(),
            json!({
                "homeTeam": format!("{} home", id),
                "awayTeam": format!("{} away", id),
                "matchDate": date,
                "matchTime": time,
            }),
        );
        saved
    }

    // 2024-06-01 12:00 UTC
    const NOW: i64 = 1_717_243_200_000;

    #[test]
    fn test_kickoff_millis() {
        assert_eq!(kickoff_millis(&fixture("a", "2024-06-01", "12:00")), Some(NOW));
        assert_eq!(
            kickoff_millis(&fixture("a", "2024-06-01", "12:30:45")),
            Some(NOW + 30 * 60_000)
        );
        assert_eq!(kickoff_millis(&SavedMatch::new("bare", 0)), None);
    }

    #[test]
    fn test_upcoming_sorted_soonest_first() {
        let matches = vec![
            fixture("late", "2024-06-03", "20:00"),
            fixture("soon", "2024-06-01", "12:01"),
            fixture("mid", "2024-06-02", "09:15"),
        ];

        let upcoming = upcoming_matches(&matches, NOW);
        let ids: Vec<&str> = upcoming.iter().map(|m| m.match_id.as_str()).collect();
        assert_eq!(ids, vec!["soon", "mid", "late"]);
        assert_eq!(upcoming[0].home_team, "soon home");
        assert_eq!(upcoming[0].away_team, "soon away");
        assert!(upcoming.windows(2).all(|w| w[0].kickoff <= w[1].kickoff));
    }

    #[test]
    fn test_upcoming_drops_past_matches() {
        let matches = vec![
            fixture("yesterday", "2024-05-31", "21:00"),
            fixture("kicking_off", "2024-06-01", "12:00"),
            fixture("tomorrow", "2024-06-02", "16:00"),
        ];

        let upcoming = upcoming_matches(&matches, NOW);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].match_id, "tomorrow");
    }

    #[test]
    fn test_upcoming_skips_malformed_dates() {
        let mut no_data = SavedMatch::new("no_data", 0);
        no_data.extra.insert("data".to_string(), json!({ "homeTeam": "X" }));

        let matches = vec![
            fixture("slashes", "02/06/2024", "16:00"),
            fixture("bad_month", "2024-13-02", "16:00"),
            fixture("bad_hour", "2024-06-02", "25:00"),
            fixture("no_minutes", "2024-06-02", "16"),
            fixture("empty", "", ""),
            no_data,
            fixture("ok", "2024-06-02", "16:00"),
        ];

        let upcoming = upcoming_matches(&matches, NOW);
        assert_eq!(upcoming.len(), 1);
        assert_eq!(upcoming[0].match_id, "ok");
    }

    #[test]
    fn test_upcoming_empty() {
        assert!(upcoming_matches(&[], NOW).is_empty());
    }
}
