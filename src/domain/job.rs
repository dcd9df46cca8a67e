use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_aux::field_attributes::deserialize_number_from_string;
use uuid::Uuid;

use super::lead::Lead;

pub const DEFAULT_MAX_RESULTS: u32 = 20;

fn default_max_results() -> u32 {
    DEFAULT_MAX_RESULTS
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ScrapeQuery {
    pub keyword: String,
    pub location: String,
    #[serde(
        default = "default_max_results",
        deserialize_with = "deserialize_number_from_string"
    )]
    pub max_results: u32,
}

impl ScrapeQuery {
    pub fn new(keyword: impl Into<String>, location: impl Into<String>, max_results: u32) -> Self {
        ScrapeQuery {
            keyword: keyword.into(),
            location: location.into(),
            max_results,
        }
    }

    pub fn search_query(&self) -> String {
        format!("{} {}", self.keyword.trim(), self.location.trim())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Running,
    Completed,
    Failed,
}

impl JobState {
    pub fn is_terminal(&self) -> bool {
        !matches!(self, JobState::Running)
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Job {
    pub id: Uuid,
    pub state: JobState,
    pub query: ScrapeQuery,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub results: Vec<Lead>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

impl Job {
    pub fn start(query: ScrapeQuery) -> Self {
        Job {
            id: Uuid::new_v4(),
            state: JobState::Running,
            query,
            started_at: Utc::now(),
            finished_at: None,
            results: vec![],
            error: None,
            persistence_error: None,
        }
    }

    /// Returns false and leaves the job untouched if it already finished.
    pub fn complete(&mut self, results: Vec<Lead>, persistence_error: Option<String>) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = JobState::Completed;
        self.results = results;
        self.persistence_error = persistence_error;
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn fail(&mut self, error: String) -> bool {
        if self.state.is_terminal() {
            return false;
        }
        self.state = JobState::Failed;
        self.error = Some(error);
        self.finished_at = Some(Utc::now());
        true
    }

    pub fn summary(&self) -> JobSummary {
        JobSummary {
            id: self.id,
            state: self.state,
            query: self.query.clone(),
            started_at: self.started_at,
            finished_at: self.finished_at,
            result_count: self.results.len(),
            error: self.error.clone(),
            persistence_error: self.persistence_error.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobSummary {
    pub id: Uuid,
    pub state: JobState,
    pub query: ScrapeQuery,
    pub started_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
    pub result_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub persistence_error: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn terminal_states_are_final() {
        let mut job = Job::start(ScrapeQuery::new("Bengkel Las", "Surabaya", 5));
        assert_eq!(job.state, JobState::Running);

        assert!(job.fail("boom".to_string()));
        assert!(!job.complete(vec![], None));
        assert!(!job.fail("again".to_string()));

        assert_eq!(job.state, JobState::Failed);
        assert_eq!(job.error.as_deref(), Some("boom"));
    }

    #[test]
    fn search_query_joins_keyword_and_location() {
        let query = ScrapeQuery::new(" Bengkel Las ", "Surabaya", 5);
        assert_eq!(query.search_query(), "Bengkel Las Surabaya");
    }

    #[test]
    fn max_results_defaults_when_missing() {
        let query: ScrapeQuery =
            serde_json::from_str(r#"{"keyword": "Cafe", "location": "Malang"}"#).unwrap();
        assert_eq!(query.max_results, DEFAULT_MAX_RESULTS);

        let query: ScrapeQuery =
            serde_json::from_str(r#"{"keyword": "Cafe", "location": "Malang", "maxResults": "7"}"#)
                .unwrap();
        assert_eq!(query.max_results, 7);
    }

    #[test]
    fn summary_omits_results() {
        let mut job = Job::start(ScrapeQuery::new("Cafe", "Malang", 5));
        job.complete(vec![], Some("db down".to_string()));

        let summary = serde_json::to_value(job.summary()).unwrap();
        assert!(summary.get("results").is_none());
        assert_eq!(summary["resultCount"], 0);
        assert_eq!(summary["state"], "completed");
        assert_eq!(summary["persistenceError"], "db down");
    }
}
