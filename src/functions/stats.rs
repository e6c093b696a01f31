//! Stats-proxy endpoint
//!
//! Aggregates three upstream game-API calls (metadata, votes, favorites) into
//! one summary. Upstream shapes drift, so all coercion lives here at the
//! boundary: consumers get typed, nullable numbers and never see the raw
//! payloads.

use serde::Serialize;
use serde_json::{Value, json};

use super::ApiResponse;

/// Fallback ids when the query doesn't name a game
pub const DEFAULT_UNIVERSE_ID: &str = "7248594700";
pub const DEFAULT_PLACE_ID: &str = "108476677636434";

/// An upstream call that failed
#[derive(Debug, Clone)]
pub struct FetchError(pub String);

impl std::fmt::Display for FetchError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "upstream fetch failed: {}", self.0)
    }
}

impl std::error::Error for FetchError {}

/// Upstream JSON fetcher, injected so tests can serve canned payloads
pub trait UpstreamFetch {
    fn get_json(&self, url: &str) -> Result<Value, FetchError>;
}

/// Query parameters identifying the game
#[derive(Debug, Clone, Default)]
pub struct StatsQuery {
    pub universe_id: Option<String>,
    pub place_id: Option<String>,
}

impl StatsQuery {
    fn universe_id(&self) -> &str {
        self.universe_id.as_deref().unwrap_or(DEFAULT_UNIVERSE_ID)
    }

    fn place_id(&self) -> &str {
        self.place_id.as_deref().unwrap_or(DEFAULT_PLACE_ID)
    }
}

/// The aggregated summary; `None` fields serialize as JSON null
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatsSummary {
    pub likes: Option<u64>,
    pub visits: Option<u64>,
    pub playing: Option<u64>,
    pub favorites: Option<u64>,
    #[serde(rename = "updatedAt")]
    pub updated_at: u64,
}

/// Handle a GET to the stats proxy
///
/// Any upstream failure (after the favorites place-id fallback) collapses to
/// a single 502 `fetch_failed`; partial upstream data is not stitched.
pub fn game_stats<F: UpstreamFetch>(fetch: &F, query: &StatsQuery, now_ms: u64) -> ApiResponse {
    let universe = query.universe_id();
    let place = query.place_id();

    let fetched = (|| -> Result<StatsSummary, FetchError> {
        let games = fetch.get_json(&format!(
            "https://games.roblox.com/v1/games?universeIds={universe}"
        ))?;
        let votes = fetch.get_json(&format!(
            "https://games.roblox.com/v1/games/votes?universeIds={universe}"
        ))?;
        let favs = fetch
            .get_json(&format!(
                "https://games.roblox.com/v1/games/{universe}/favorites/count"
            ))
            .or_else(|_| {
                fetch.get_json(&format!(
                    "https://games.roblox.com/v1/games/{place}/favorites/count"
                ))
            })?;

        Ok(summarize(&games, &votes, &favs, now_ms))
    })();

    match fetched {
        Ok(summary) => match serde_json::to_value(&summary) {
            Ok(body) => ApiResponse::json(200, body),
            Err(e) => {
                log::warn!("Stats summary failed to serialize: {e}");
                ApiResponse::json(502, json!({ "error": "fetch_failed" }))
            }
        },
        Err(e) => {
            log::warn!("Stats proxy upstream failure: {e}");
            ApiResponse::json(502, json!({ "error": "fetch_failed" }))
        }
    }
}

/// Collapse the three upstream payloads into a summary
fn summarize(games: &Value, votes: &Value, favs: &Value, now_ms: u64) -> StatsSummary {
    let row = games
        .get("data")
        .and_then(|d| d.get(0))
        .cloned()
        .unwrap_or(Value::Null);

    let vote_row = votes.get("data").and_then(|d| d.get(0));
    let likes_accurate = vote_row
        .and_then(|v| as_count(v.get("upVotes")))
        .or_else(|| vote_row.and_then(|v| as_count(v.get("upvotes"))));
    let likes = likes_accurate
        .or_else(|| as_count(row.get("likeCount")))
        .or_else(|| as_count(row.get("upVotes")))
        .or_else(|| as_count(row.get("voteCount")));

    let favorites = as_count(Some(favs))
        .or_else(|| as_count(favs.get("favoritesCount")))
        .or_else(|| as_count(favs.get("count")))
        .or_else(|| as_count(favs.get("favoritedCount")));

    StatsSummary {
        likes,
        visits: as_count(row.get("visits")),
        playing: as_count(row.get("playing")).or_else(|| as_count(row.get("playerCount"))),
        favorites,
        updated_at: now_ms,
    }
}

/// Lenient numeric coercion: accepts numbers and numeric strings
fn as_count(value: Option<&Value>) -> Option<u64> {
    match value? {
        Value::Number(n) => n.as_u64().or_else(|| n.as_f64().map(|f| f.max(0.0) as u64)),
        Value::String(s) => s.trim().parse::<u64>().ok(),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::collections::HashMap;

    /// Canned upstream: maps URL substrings to payloads (or failures)
    struct FakeUpstream {
        responses: HashMap<&'static str, Result<Value, FetchError>>,
        calls: RefCell<Vec<String>>,
    }

    impl FakeUpstream {
        fn new() -> Self {
            Self {
                responses: HashMap::new(),
                calls: RefCell::new(Vec::new()),
            }
        }

        fn with(mut self, fragment: &'static str, result: Result<Value, FetchError>) -> Self {
            self.responses.insert(fragment, result);
            self
        }
    }

    impl UpstreamFetch for FakeUpstream {
        fn get_json(&self, url: &str) -> Result<Value, FetchError> {
            self.calls.borrow_mut().push(url.to_string());
            for (fragment, result) in &self.responses {
                if url.contains(fragment) {
                    return result.clone();
                }
            }
            Err(FetchError(format!("no canned response for {url}")))
        }
    }

    fn happy_upstream() -> FakeUpstream {
        FakeUpstream::new()
            .with(
                "games?universeIds",
                Ok(json!({ "data": [{ "visits": 1500, "playing": 12 }] })),
            )
            .with(
                "votes?universeIds",
                Ok(json!({ "data": [{ "upVotes": 321 }] })),
            )
            .with("favorites/count", Ok(json!({ "favoritesCount": 44 })))
    }

    #[test]
    fn test_aggregates_all_three_calls() {
        let res = game_stats(&happy_upstream(), &StatsQuery::default(), 999);
        assert_eq!(res.status, 200);
        assert_eq!(res.body["likes"], 321);
        assert_eq!(res.body["visits"], 1500);
        assert_eq!(res.body["playing"], 12);
        assert_eq!(res.body["favorites"], 44);
        assert_eq!(res.body["updatedAt"], 999);
    }

    #[test]
    fn test_default_ids_in_urls() {
        let upstream = happy_upstream();
        game_stats(&upstream, &StatsQuery::default(), 0);
        let calls = upstream.calls.borrow();
        assert!(calls[0].contains(DEFAULT_UNIVERSE_ID));
    }

    #[test]
    fn test_likes_falls_back_to_metadata_row() {
        let upstream = FakeUpstream::new()
            .with(
                "games?universeIds",
                Ok(json!({ "data": [{ "likeCount": 77, "visits": 10 }] })),
            )
            .with("votes?universeIds", Ok(json!({ "data": [{}] })))
            .with("favorites/count", Ok(json!(5)));
        let res = game_stats(&upstream, &StatsQuery::default(), 0);
        assert_eq!(res.body["likes"], 77);
        // Bare-number favorites payload
        assert_eq!(res.body["favorites"], 5);
    }

    #[test]
    fn test_numeric_string_favorites_coerced() {
        let upstream = FakeUpstream::new()
            .with("games?universeIds", Ok(json!({ "data": [{}] })))
            .with("votes?universeIds", Ok(json!({ "data": [{}] })))
            .with("favorites/count", Ok(json!({ "count": "123" })));
        let res = game_stats(&upstream, &StatsQuery::default(), 0);
        assert_eq!(res.body["favorites"], 123);
        // Unknown fields coerce to null, not errors
        assert_eq!(res.body["likes"], Value::Null);
        assert_eq!(res.body["visits"], Value::Null);
    }

    #[test]
    fn test_favorites_place_id_fallback() {
        let upstream = FakeUpstream::new()
            .with("games?universeIds", Ok(json!({ "data": [{}] })))
            .with("votes?universeIds", Ok(json!({ "data": [{}] })))
            .with(
                "games/7248594700/favorites",
                Err(FetchError("403".to_string())),
            )
            .with("games/108476677636434/favorites", Ok(json!(9)));
        let res = game_stats(&upstream, &StatsQuery::default(), 0);
        assert_eq!(res.status, 200);
        assert_eq!(res.body["favorites"], 9);
    }

    #[test]
    fn test_upstream_failure_is_502() {
        let upstream = FakeUpstream::new()
            .with("games?universeIds", Err(FetchError("timeout".to_string())));
        let res = game_stats(&upstream, &StatsQuery::default(), 0);
        assert_eq!(res.status, 502);
        assert_eq!(res.body["error"], "fetch_failed");
    }

    #[test]
    fn test_unexpected_shapes_never_crash() {
        let upstream = FakeUpstream::new()
            .with("games?universeIds", Ok(json!("not an object")))
            .with("votes?universeIds", Ok(json!([1, 2, 3])))
            .with("favorites/count", Ok(json!(null)));
        let res = game_stats(&upstream, &StatsQuery::default(), 0);
        assert_eq!(res.status, 200);
        assert_eq!(res.body["likes"], Value::Null);
        assert_eq!(res.body["favorites"], Value::Null);
    }

    #[test]
    fn test_explicit_ids_used() {
        let upstream = FakeUpstream::new()
            .with("games?universeIds=42", Ok(json!({ "data": [{}] })))
            .with("votes?universeIds=42", Ok(json!({ "data": [{}] })))
            .with("games/42/favorites", Ok(json!(1)));
        let query = StatsQuery {
            universe_id: Some("42".to_string()),
            place_id: Some("43".to_string()),
        };
        let res = game_stats(&upstream, &query, 0);
        assert_eq!(res.status, 200);
    }
}
