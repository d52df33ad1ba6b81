// MLB Stats API client.
//
// Fetches the live game feed and the daily schedule as raw JSON. Decoding
// into domain types happens in pitchfeed-baseball; this layer only reports
// transport and HTTP failures.

use async_trait::async_trait;
use chrono::NaiveDate;
use pitchfeed_baseball::GamePk;
use pitchfeed_core::config::ApiConfig;
use pitchfeed_core::error::FeedError;
use pitchfeed_core::feed::FeedKind;
use serde_json::Value;
use tracing::debug;

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// `fields` filter for the play-by-play feed: status plus the play list.
pub const PLAY_BY_PLAY_FIELDS: &str = "gameData,status,abstractGameState,detailedState,\
liveData,plays,allPlays,atBatIndex,result,eventType,description,awayScore,homeScore,\
about,inning,halfInning,isComplete,count,balls,strikes,outs,matchup,batter,pitcher,fullName";

/// Sport id for Major League Baseball.
const MLB_SPORT_ID: &str = "1";

// ---------------------------------------------------------------------------
// Source traits
// ---------------------------------------------------------------------------

/// Where a poller gets live feed documents from.
#[async_trait]
pub trait FeedSource: Send + Sync + 'static {
    async fn fetch_feed(&self, game_pk: GamePk, kind: FeedKind) -> Result<Value, FeedError>;
}

/// Where the games list refresher gets schedule documents from.
#[async_trait]
pub trait ScheduleSource: Send + Sync + 'static {
    /// `None` means today in the API's own timezone.
    async fn fetch_schedule(&self, date: Option<NaiveDate>) -> Result<Value, FeedError>;
}

// ---------------------------------------------------------------------------
// StatsApiClient
// ---------------------------------------------------------------------------

pub struct StatsApiClient {
    http: reqwest::Client,
    base_url: String,
}

impl StatsApiClient {
    pub fn from_config(config: &ApiConfig) -> anyhow::Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(config.user_agent.clone())
            .timeout(config.timeout())
            .build()?;
        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
        })
    }

    pub fn feed_url(&self, game_pk: GamePk) -> String {
        format!("{}/api/v1.1/game/{game_pk}/feed/live", self.base_url)
    }

    pub fn schedule_url(&self) -> String {
        format!("{}/api/v1/schedule", self.base_url)
    }

    /// Query parameters for a feed request of the given kind.
    pub fn feed_query(kind: FeedKind) -> Vec<(&'static str, String)> {
        match kind {
            FeedKind::AtBat => Vec::new(),
            FeedKind::PlayByPlay => vec![("fields", PLAY_BY_PLAY_FIELDS.to_string())],
        }
    }

    /// Query parameters for a schedule request.
    pub fn schedule_query(date: Option<NaiveDate>) -> Vec<(&'static str, String)> {
        let mut query = vec![
            ("sportId", MLB_SPORT_ID.to_string()),
            ("hydrate", "team".to_string()),
        ];
        if let Some(date) = date {
            query.push(("date", date.format("%Y-%m-%d").to_string()));
        }
        query
    }

    async fn get_json(&self, url: &str, query: &[(&'static str, String)]) -> Result<Value, FeedError> {
        debug!(url, "GET");
        let response = self
            .http
            .get(url)
            .query(query)
            .send()
            .await
            .map_err(|e| FeedError::Fetch {
                url: url.to_string(),
                message: e.to_string(),
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(FeedError::Fetch {
                url: url.to_string(),
                message: format!("HTTP {status}"),
            });
        }

        response.json::<Value>().await.map_err(|e| {
            if e.is_decode() {
                FeedError::Parse(format!("{url}: {e}"))
            } else {
                FeedError::Fetch {
                    url: url.to_string(),
                    message: e.to_string(),
                }
            }
        })
    }
}

#[async_trait]
impl FeedSource for StatsApiClient {
    async fn fetch_feed(&self, game_pk: GamePk, kind: FeedKind) -> Result<Value, FeedError> {
        let url = self.feed_url(game_pk);
        self.get_json(&url, &Self::feed_query(kind)).await
    }
}

#[async_trait]
impl ScheduleSource for StatsApiClient {
    async fn fetch_schedule(&self, date: Option<NaiveDate>) -> Result<Value, FeedError> {
        let url = self.schedule_url();
        self.get_json(&url, &Self::schedule_query(date)).await
    }
}
