//! HTTP implementation of the backend contract
//!
//! Talks JSON to the scheduling service with a bearer credential on every request.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, Method, RequestBuilder, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::json;

use crate::api::client::ScheduleApi;
use crate::domain::{Employee, EmployeeEnvelope, Facility, NewNotification, Notification, Schedule, Shift};
use crate::error::{Result, ShiftsyncError};
use crate::session::BearerToken;

/// Where the scheduling backend listens in a local setup
const DEFAULT_BASE_URL: &str = "http://localhost:8080";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Configuration for the HTTP client
#[derive(Debug, Clone)]
pub struct HttpApiConfig {
    pub base_url: String,
    pub timeout: Duration,
}

impl Default for HttpApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl HttpApiConfig {
    /// Create a new config pointing at a specific server
    pub fn with_base_url(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

/// reqwest-backed `ScheduleApi`
pub struct HttpApi {
    client: Client,
    config: HttpApiConfig,
    base: Url,
}

impl HttpApi {
    pub fn new(config: HttpApiConfig) -> Result<Self> {
        let base = Url::parse(&config.base_url)
            .map_err(|e| ShiftsyncError::InvalidInput(format!("base URL {:?}: {}", config.base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(ShiftsyncError::InvalidInput(format!(
                "base URL {:?} cannot carry a path",
                config.base_url
            )));
        }

        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ShiftsyncError::Network(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self { client, config, base })
    }

    pub fn base_url(&self) -> &str {
        &self.config.base_url
    }

    /// Append path segments to the base URL. Each segment is percent-encoded,
    /// so an id containing `/`, `?` or `#` stays a single segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejected bases that cannot carry a path
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    fn request(&self, method: Method, segments: &[&str], token: &BearerToken) -> RequestBuilder {
        self.client
            .request(method, self.url(segments))
            .header(reqwest::header::AUTHORIZATION, token.header_value())
    }

    /// Send and return the raw body of a 2xx response
    async fn send_raw(&self, builder: RequestBuilder, what: &str) -> Result<Vec<u8>> {
        let response = builder.send().await.map_err(|e| {
            tracing::debug!(request = what, error = %e, "Request failed before a response");
            ShiftsyncError::Network(format!("{}: {}", what, e))
        })?;

        let status = response.status();
        let body = response.bytes().await?.to_vec();

        if !status.is_success() {
            let message = String::from_utf8_lossy(&body).into_owned();
            return Err(error_for_status(status, what, message));
        }

        Ok(body)
    }

    async fn send_json<T: DeserializeOwned>(&self, builder: RequestBuilder, what: &str) -> Result<T> {
        let body = self.send_raw(builder, what).await?;
        Ok(serde_json::from_slice(&body)?)
    }
}

/// Map a non-2xx status to an error; 404 is its own kind so lookups can treat
/// it as an expected outcome.
fn error_for_status(status: StatusCode, what: &str, body: String) -> ShiftsyncError {
    if status == StatusCode::NOT_FOUND {
        return ShiftsyncError::NotFound(what.to_string());
    }

    let message = if body.trim().is_empty() {
        status.canonical_reason().unwrap_or("Unknown error").to_string()
    } else {
        body
    };

    ShiftsyncError::Api {
        status: status.as_u16(),
        message,
    }
}

#[async_trait]
impl ScheduleApi for HttpApi {
    async fn list_schedules(&self, token: &BearerToken) -> Result<Vec<Schedule>> {
        self.send_json(self.request(Method::GET, &["schedules"], token), "list schedules")
            .await
    }

    async fn generate_schedule(&self, token: &BearerToken, facility_id: &str) -> Result<Schedule> {
        let builder = self
            .request(Method::POST, &["schedules"], token)
            .json(&json!({ "facility": facility_id }));
        self.send_json(builder, "generate schedule").await
    }

    async fn update_schedule(&self, token: &BearerToken, schedule_id: &str, shifts: &[Shift]) -> Result<Schedule> {
        let builder = self
            .request(Method::PATCH, &["schedules", schedule_id], token)
            .json(&json!({ "shifts": shifts }));
        self.send_json(builder, &format!("schedule {}", schedule_id)).await
    }

    async fn delete_schedule(&self, token: &BearerToken, schedule_id: &str) -> Result<()> {
        let builder = self.request(Method::DELETE, &["schedules", schedule_id], token);
        self.send_raw(builder, &format!("schedule {}", schedule_id)).await?;
        Ok(())
    }

    async fn get_employee(&self, token: &BearerToken, employee_id: &str) -> Result<Employee> {
        let builder = self.request(Method::GET, &["employees", employee_id], token);
        let envelope: EmployeeEnvelope = self.send_json(builder, &format!("employee {}", employee_id)).await?;
        Ok(envelope.employee)
    }

    async fn list_employees(&self, token: &BearerToken) -> Result<Vec<Employee>> {
        self.send_json(self.request(Method::GET, &["employees"], token), "list employees")
            .await
    }

    async fn get_facility(&self, token: &BearerToken) -> Result<Facility> {
        self.send_json(self.request(Method::GET, &["facilities"], token), "facility")
            .await
    }

    async fn send_notification(&self, token: &BearerToken, notification: &NewNotification) -> Result<Notification> {
        let builder = self.request(Method::POST, &["notifications"], token).json(notification);
        self.send_json(builder, "send notification").await
    }

    async fn list_notifications(&self, token: &BearerToken) -> Result<Vec<Notification>> {
        self.send_json(self.request(Method::GET, &["notifications"], token), "list notifications")
            .await
    }
}

impl std::fmt::Debug for HttpApi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpApi")
            .field("base_url", &self.config.base_url)
            .field("timeout", &self.config.timeout)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = HttpApiConfig::default();
        assert_eq!(config.base_url, DEFAULT_BASE_URL);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
    }

    #[test]
    fn test_url_joining() {
        let api = HttpApi::new(HttpApiConfig::with_base_url("http://sched.example:9000/")).unwrap();
        assert_eq!(api.url(&["schedules"]).as_str(), "http://sched.example:9000/schedules");
        assert_eq!(
            api.url(&["employees", "e1"]).as_str(),
            "http://sched.example:9000/employees/e1"
        );

        let prefixed = HttpApi::new(HttpApiConfig::with_base_url("http://sched.example/api")).unwrap();
        assert_eq!(prefixed.url(&["facilities"]).as_str(), "http://sched.example/api/facilities");
    }

    #[test]
    fn test_url_segments_are_encoded() {
        let api = HttpApi::new(HttpApiConfig::default()).unwrap();
        assert_eq!(
            api.url(&["employees", "e1?expand=all"]).as_str(),
            "http://localhost:8080/employees/e1%3Fexpand=all"
        );
        assert_eq!(
            api.url(&["schedules", "a/b#c"]).as_str(),
            "http://localhost:8080/schedules/a%2Fb%23c"
        );
    }

    #[test]
    fn test_invalid_base_url_rejected() {
        let err = HttpApi::new(HttpApiConfig::with_base_url("not a url")).unwrap_err();
        assert!(matches!(err, ShiftsyncError::InvalidInput(_)));
        assert!(HttpApi::new(HttpApiConfig::with_base_url("mailto:ops@example.com")).is_err());
    }

    #[test]
    fn test_request_carries_bearer_header() {
        let api = HttpApi::new(HttpApiConfig::default()).unwrap();
        let token = BearerToken::new("tok");
        let request = api.request(Method::GET, &["schedules"], &token).build().unwrap();

        assert_eq!(request.url().as_str(), "http://localhost:8080/schedules");
        assert_eq!(request.headers()[reqwest::header::AUTHORIZATION], "Bearer tok");
    }

    #[test]
    fn test_error_for_status_not_found() {
        let err = error_for_status(StatusCode::NOT_FOUND, "employee e9", String::new());
        assert!(err.is_not_found());
        assert_eq!(err.to_string(), "Not found: employee e9");
    }

    #[test]
    fn test_error_for_status_uses_body() {
        let err = error_for_status(StatusCode::BAD_REQUEST, "generate schedule", "no facility".to_string());
        assert!(matches!(err, ShiftsyncError::Api { status: 400, ref message } if message == "no facility"));
    }

    #[test]
    fn test_error_for_status_empty_body() {
        let err = error_for_status(StatusCode::INTERNAL_SERVER_ERROR, "x", "  ".to_string());
        assert_eq!(err.to_string(), "API error 500: Internal Server Error");
    }

    #[tokio::test]
    async fn test_unreachable_server_is_network_error() {
        let config = HttpApiConfig {
            base_url: "http://127.0.0.1:1".to_string(),
            timeout: Duration::from_secs(2),
        };
        let api = HttpApi::new(config).unwrap();
        let result = api.list_schedules(&BearerToken::new("tok")).await;
        assert!(matches!(result, Err(ShiftsyncError::Network(_))));
    }

    #[test]
    fn test_debug_impl() {
        let api = HttpApi::new(HttpApiConfig::default()).unwrap();
        let debug_str = format!("{:?}", api);
        assert!(debug_str.contains("HttpApi"));
        assert!(debug_str.contains(DEFAULT_BASE_URL));
    }

    #[test]
    fn test_send_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<HttpApi>();
    }
}
