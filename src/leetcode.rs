use std::time::Duration;

use anyhow::{Context, Result};
use reqwest::Client;
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::activity::SolveEvent;
use crate::config::LeetCodeConfig;

const DAILY_QUERY: &str = "query questionOfToday {
  activeDailyCodingChallengeQuestion {
    date
    link
    question { title titleSlug difficulty }
  }
}";

const RECENT_AC_QUERY: &str = "query recentAcSubmissions($username: String!, $limit: Int!) {
  recentAcSubmissionList(username: $username, limit: $limit) {
    titleSlug
    timestamp
  }
}";

/// Today's problem of the day.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DailyTarget {
    pub date: String,
    pub slug: String,
    pub title: String,
    pub difficulty: String,
    pub link: String,
}

#[async_trait::async_trait]
pub trait SubmissionSource: Send + Sync {
    async fn recent_solves(&self, subject: &str) -> Result<Vec<SolveEvent>>;
}

#[async_trait::async_trait]
pub trait DailyTargetSource: Send + Sync {
    async fn daily_target(&self) -> Result<DailyTarget>;
}

// --- Wire types ---

#[derive(Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Option<serde_json::Value>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct DailyData {
    active_daily_coding_challenge_question: Option<DailyQuestion>,
}

#[derive(Deserialize)]
struct DailyQuestion {
    date: String,
    link: String,
    question: QuestionInfo,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct QuestionInfo {
    title: String,
    title_slug: String,
    difficulty: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RecentAcData {
    recent_ac_submission_list: Option<Vec<AcSubmission>>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct AcSubmission {
    title_slug: String,
    timestamp: Timestamp,
}

/// LeetCode sends epoch seconds as a string; accept plain numbers too.
#[derive(Deserialize)]
#[serde(untagged)]
enum Timestamp {
    Number(i64),
    Text(String),
}

impl Timestamp {
    fn seconds(&self) -> Result<i64> {
        match self {
            Self::Number(n) => Ok(*n),
            Self::Text(s) => s
                .trim()
                .parse()
                .with_context(|| format!("Invalid submission timestamp '{s}'")),
        }
    }
}

// --- Client ---

pub struct LeetCodeClient {
    client: Client,
    endpoint: String,
    site: String,
    recent_limit: u32,
}

impl LeetCodeClient {
    pub fn new(config: &LeetCodeConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .user_agent(concat!("leetnudge/", env!("CARGO_PKG_VERSION")))
            .build()
            .context("Failed to build HTTP client")?;
        Ok(Self {
            client,
            endpoint: config.endpoint.clone(),
            site: config.site.trim_end_matches('/').to_string(),
            recent_limit: config.recent_limit,
        })
    }

    async fn query<T: DeserializeOwned>(&self, body: serde_json::Value) -> Result<T> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("Referer", &self.site)
            .json(&body)
            .send()
            .await
            .context("Failed to call LeetCode GraphQL")?;

        if !response.status().is_success() {
            anyhow::bail!(
                "LeetCode API error: {} {}",
                response.status(),
                response.text().await.unwrap_or_default()
            );
        }

        let body: GraphQlResponse<T> = response
            .json()
            .await
            .context("Failed to parse LeetCode response")?;
        unwrap_data(body)
    }
}

fn unwrap_data<T>(body: GraphQlResponse<T>) -> Result<T> {
    if let Some(errors) = body.errors.filter(|e| !e.is_null()) {
        anyhow::bail!("LeetCode GraphQL error: {errors}");
    }
    body.data
        .ok_or_else(|| anyhow::anyhow!("LeetCode response has no data"))
}

fn to_target(data: DailyData, site: &str) -> Result<DailyTarget> {
    let q = data
        .active_daily_coding_challenge_question
        .ok_or_else(|| anyhow::anyhow!("No active daily challenge in response"))?;
    let link = if q.link.starts_with("http") {
        q.link
    } else {
        format!("{site}{}", q.link)
    };
    Ok(DailyTarget {
        date: q.date,
        slug: q.question.title_slug,
        title: q.question.title,
        difficulty: q.question.difficulty,
        link,
    })
}

fn to_events(subject: &str, data: RecentAcData) -> Result<Vec<SolveEvent>> {
    let Some(list) = data.recent_ac_submission_list else {
        tracing::warn!("User '{subject}' not found or has no submissions");
        return Ok(Vec::new());
    };
    list.into_iter()
        .map(|s| {
            Ok(SolveEvent {
                solved_at: s.timestamp.seconds()?,
                problem: s.title_slug,
            })
        })
        .collect()
}

#[async_trait::async_trait]
impl DailyTargetSource for LeetCodeClient {
    async fn daily_target(&self) -> Result<DailyTarget> {
        tracing::debug!("Fetching problem of the day");
        let data: DailyData = self.query(json!({ "query": DAILY_QUERY })).await?;
        to_target(data, &self.site)
    }
}

#[async_trait::async_trait]
impl SubmissionSource for LeetCodeClient {
    async fn recent_solves(&self, subject: &str) -> Result<Vec<SolveEvent>> {
        tracing::debug!("Fetching last {} accepted submissions for {subject}", self.recent_limit);
        let data: RecentAcData = self
            .query(json!({
                "query": RECENT_AC_QUERY,
                "variables": { "username": subject, "limit": self.recent_limit },
            }))
            .await
            .with_context(|| format!("Fetching submissions for '{subject}'"))?;
        to_events(subject, data)
    }
}
