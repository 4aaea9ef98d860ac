use anyhow::{Context, Result};
use reqwest::Client;
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

use crate::catalog::Question;

const GRAPHQL_URL: &str = "https://leetcode.com/graphql";
const PROBLEMS_INDEX_URL: &str = "https://leetcode.com/api/problems/all/";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_STATS_QUERY: &str = "
query getUserProfile($username: String!) {
    matchedUser(username: $username) {
        username
        submitStats {
            acSubmissionNum {
                difficulty
                count
            }
        }
    }
}";

const RECENT_ACCEPTED_QUERY: &str = "
query getRecentSubmissions($username: String!, $limit: Int!) {
    recentAcSubmissionList(username: $username, limit: $limit) {
        title
        titleSlug
        timestamp
    }
}";

const DIFFICULTY_QUERY: &str = "
query getProblemDifficulty($titleSlug: String!) {
    question(titleSlug: $titleSlug) {
        difficulty
    }
}";

const QUESTION_DETAIL_QUERY: &str = "
query getQuestionDetail($titleSlug: String!) {
    question(titleSlug: $titleSlug) {
        title
        content
        difficulty
        topicTags {
            name
        }
    }
}";

#[derive(Serialize)]
struct RequestBody {
    query: String,
    variables: Value,
}

#[derive(Deserialize)]
struct QueryResponse {
    data: Option<Value>,
}

/// Solved-problem counts for a LeetCode user.
#[derive(Debug, Clone, Copy)]
pub struct UserStats {
    pub total_solved: u32,
    pub easy_solved: u32,
    pub medium_solved: u32,
    pub hard_solved: u32,
}

/// One recently-accepted submission as LeetCode reports it. The
/// timestamp comes over the wire as a decimal string.
#[derive(Debug, Clone, Deserialize)]
pub struct RecentSubmission {
    pub title: String,
    #[serde(rename = "titleSlug")]
    pub title_slug: String,
    timestamp: String,
}

impl RecentSubmission {
    pub fn timestamp_secs(&self) -> Result<i64> {
        self.timestamp
            .parse()
            .with_context(|| format!("Bad submission timestamp: {}", self.timestamp))
    }
}

/// Returns an error message for when a JSON attribute can't be obtained.
fn err_cant_get(attribute: &str, subject: &str) -> String {
    format!("Couldn't get {} for {}", attribute, subject)
}

fn client() -> Result<Client> {
    Ok(Client::builder().timeout(REQUEST_TIMEOUT).build()?)
}

/// Runs a GraphQL query against the LeetCode servers.
async fn query_graphql(query: &str, variables: Value) -> Result<Value> {
    let body = RequestBody { query: query.to_string(), variables };
    let headers = HeaderMap::from_iter([
        (header::CONTENT_TYPE, HeaderValue::from_static("application/json")),
        (HeaderName::from_static("referer"), HeaderValue::from_static("https://leetcode.com")),
    ]);

    let response = client()?
        .post(GRAPHQL_URL)
        .headers(headers)
        .json(&body)
        .send()
        .await?
        .json::<QueryResponse>()
        .await?;

    response.data.context("No data found in the response.")
}

/// Fetches the solved-problem counts for `username`.
pub async fn fetch_user_stats(username: &str) -> Result<UserStats> {
    let data = query_graphql(
        USER_STATS_QUERY,
        serde_json::json!({ "username": username }),
    )
    .await?;

    // A null matchedUser means the account doesn't exist.
    let user = data
        .get("matchedUser")
        .and_then(|user| if user.is_null() { None } else { Some(user) })
        .with_context(|| format!("Could not find leetcode user: {}", username))?;

    let num_solved_array = user
        .get("submitStats").context(err_cant_get("submission statistics", username))?
        .get("acSubmissionNum").context("Couldn't retrieve submission statistics.")?
        .as_array().context("Malformed submission data; check JSON schema.")?;

    // acSubmissionNum is ordered [All, Easy, Medium, Hard].
    let count_at = |index: usize| -> Result<u32> {
        let count = num_solved_array
            .get(index)
            .and_then(|entry| entry.get("count"))
            .and_then(Value::as_u64)
            .with_context(|| err_cant_get("solved count", username))?;
        Ok(count as u32)
    };

    Ok(UserStats {
        total_solved: count_at(0)?,
        easy_solved: count_at(1)?,
        medium_solved: count_at(2)?,
        hard_solved: count_at(3)?,
    })
}

/// Up to `limit` of the user's most recently accepted submissions.
pub async fn fetch_recent_accepted(username: &str, limit: u32) -> Result<Vec<RecentSubmission>> {
    let data = query_graphql(
        RECENT_ACCEPTED_QUERY,
        serde_json::json!({ "username": username, "limit": limit }),
    )
    .await?;

    let raw_submissions = data
        .get("recentAcSubmissionList")
        .context(err_cant_get("recentAcSubmissionList", username))?
        .as_array()
        .context("Couldn't deserialize recentAcSubmissionList into an array.")?;

    raw_submissions
        .iter()
        .map(|val| {
            serde_json::from_value::<RecentSubmission>(val.clone())
                .context("Couldn't deserialize values into Submissions.")
        })
        .collect()
}

/// The difficulty label for a problem slug, or "Unknown" when LeetCode
/// doesn't know the problem.
pub async fn fetch_difficulty(title_slug: &str) -> Result<String> {
    let data = query_graphql(
        DIFFICULTY_QUERY,
        serde_json::json!({ "titleSlug": title_slug }),
    )
    .await?;

    let difficulty = data
        .get("question")
        .and_then(|q| q.get("difficulty"))
        .and_then(Value::as_str)
        .unwrap_or("Unknown");

    Ok(difficulty.to_string())
}

/// Best-effort lookup of a question by its frontend number: resolve the
/// number to a slug through the problems index, then pull the detail.
/// Returns None when the number doesn't resolve.
pub async fn fetch_question_by_number(number: u32) -> Result<Option<Question>> {
    let index = client()?
        .get(PROBLEMS_INDEX_URL)
        .send()
        .await?
        .json::<Value>()
        .await?;

    let pairs = index
        .get("stat_status_pairs")
        .and_then(Value::as_array)
        .context("Malformed problems index; check JSON schema.")?;

    let Some(slug) = pairs.iter().find_map(|pair| {
        let stat = pair.get("stat")?;
        let id = stat.get("frontend_question_id")?.as_u64()?;
        (id == number as u64)
            .then(|| stat.get("question__title_slug")?.as_str().map(String::from))
            .flatten()
    }) else {
        return Ok(None);
    };

    let data = query_graphql(
        QUESTION_DETAIL_QUERY,
        serde_json::json!({ "titleSlug": slug }),
    )
    .await?;

    let Some(question) = data.get("question").filter(|q| !q.is_null()) else {
        return Ok(None);
    };

    let tags = question
        .get("topicTags")
        .and_then(Value::as_array)
        .map(|tags| {
            tags.iter()
                .filter_map(|tag| tag.get("name").and_then(Value::as_str))
                .collect::<Vec<_>>()
                .join(", ")
        })
        .unwrap_or_default();

    Ok(Some(Question {
        id: number,
        title: question
            .get("title")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        description: question
            .get("content")
            .and_then(Value::as_str)
            .unwrap_or("Description not available.")
            .to_string(),
        difficulty: question
            .get("difficulty")
            .and_then(Value::as_str)
            .unwrap_or("Unknown")
            .to_string(),
        category: tags,
        hints: vec![],
        url: format!("https://leetcode.com/problems/{slug}/"),
    }))
}
