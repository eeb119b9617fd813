// --- File: crates/bodyshop_gcal/src/service.rs ---
//! Google Calendar service implementation.
//!
//! Talks to the Calendar v3 REST API directly with an OAuth2 bearer token.
//! The token is kept in memory and replaced by [`CalendarService::refresh_credentials`];
//! callers decide when to refresh (see `logic::with_credential_retry`).

use bodyshop_common::services::{
    BoxFuture, CalendarEntry, CalendarService, CalendarServiceError, CreatedEvent,
    NewCalendarEvent,
};
use bodyshop_config::GcalConfig;
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use reqwest::Url;
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::json;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::auth::{classify_failure, create_http_client, refresh_access_token};

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct EventsPage {
    #[serde(default)]
    items: Vec<ApiEvent>,
    next_page_token: Option<String>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ApiEvent {
    id: String,
    summary: Option<String>,
    html_link: Option<String>,
    start: Option<ApiEventTime>,
    end: Option<ApiEventTime>,
}

#[derive(Deserialize, Debug)]
#[serde(rename_all = "camelCase")]
struct ApiEventTime {
    date_time: Option<DateTime<FixedOffset>>,
}

impl From<ApiEvent> for CalendarEntry {
    fn from(event: ApiEvent) -> Self {
        CalendarEntry {
            id: event.id,
            summary: event.summary,
            start: event.start.and_then(|t| t.date_time),
            end: event.end.and_then(|t| t.date_time),
        }
    }
}

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    http: reqwest::Client,
    config: GcalConfig,
    access_token: RwLock<Option<String>>,
}

impl GoogleCalendarService {
    pub fn new(config: GcalConfig) -> Result<Self, CalendarServiceError> {
        let http = create_http_client(&config)?;
        Ok(Self {
            http,
            access_token: RwLock::new(config.access_token.clone()),
            config,
        })
    }

    /// Current access token, fetching one first if none is cached.
    async fn bearer(&self) -> Result<String, CalendarServiceError> {
        if let Some(token) = self.access_token.read().await.as_ref() {
            return Ok(token.clone());
        }
        self.refresh().await
    }

    async fn refresh(&self) -> Result<String, CalendarServiceError> {
        let token = refresh_access_token(&self.http, &self.config).await?;
        *self.access_token.write().await = Some(token.clone());
        Ok(token)
    }

    fn events_url(&self, calendar_id: &str) -> Result<Url, CalendarServiceError> {
        let mut url = Url::parse(&self.config.api_base).map_err(|e| {
            CalendarServiceError::InvalidResponse(format!("bad api_base: {}", e))
        })?;
        url.path_segments_mut()
            .map_err(|_| CalendarServiceError::InvalidResponse("api_base cannot be a base".into()))?
            .pop_if_empty()
            .push("calendars")
            .push(calendar_id)
            .push("events");
        Ok(url)
    }
}

async fn read_json<T: DeserializeOwned>(
    response: reqwest::Response,
) -> Result<T, CalendarServiceError> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(classify_failure(status.as_u16(), body));
    }
    response
        .json::<T>()
        .await
        .map_err(|e| CalendarServiceError::InvalidResponse(e.to_string()))
}

fn transport(err: reqwest::Error) -> CalendarServiceError {
    CalendarServiceError::Transport(err.to_string())
}

impl CalendarService for GoogleCalendarService {
    /// Lists single event instances in `[time_min, time_max)` ordered by start,
    /// following `nextPageToken` until the window is exhausted.
    fn list_events(
        &self,
        calendar_id: &str,
        time_min: DateTime<Utc>,
        time_max: DateTime<Utc>,
        time_zone: &str,
    ) -> BoxFuture<'_, Vec<CalendarEntry>, CalendarServiceError> {
        let calendar_id = calendar_id.to_string();
        let time_zone = time_zone.to_string();

        Box::pin(async move {
            let url = self.events_url(&calendar_id)?;
            let token = self.bearer().await?;
            let time_min = time_min.to_rfc3339_opts(SecondsFormat::Secs, true);
            let time_max = time_max.to_rfc3339_opts(SecondsFormat::Secs, true);

            let mut entries = Vec::new();
            let mut page_token: Option<String> = None;
            loop {
                let mut request = self
                    .http
                    .get(url.clone())
                    .bearer_auth(&token)
                    .query(&[
                        ("timeMin", time_min.as_str()),
                        ("timeMax", time_max.as_str()),
                        ("singleEvents", "true"),
                        ("orderBy", "startTime"),
                        ("timeZone", time_zone.as_str()),
                    ]);
                if let Some(page) = &page_token {
                    request = request.query(&[("pageToken", page.as_str())]);
                }

                let response = request.send().await.map_err(transport)?;
                let page: EventsPage = read_json(response).await?;
                entries.extend(page.items.into_iter().map(CalendarEntry::from));

                match page.next_page_token {
                    Some(next) => page_token = Some(next),
                    None => break,
                }
            }

            debug!(calendar_id = %calendar_id, count = entries.len(), "Listed calendar events");
            Ok(entries)
        })
    }

    fn create_event(
        &self,
        calendar_id: &str,
        event: NewCalendarEvent,
    ) -> BoxFuture<'_, CreatedEvent, CalendarServiceError> {
        let calendar_id = calendar_id.to_string();

        Box::pin(async move {
            let url = self.events_url(&calendar_id)?;
            let token = self.bearer().await?;
            let body = json!({
                "summary": event.summary,
                "description": event.description,
                "start": { "dateTime": event.start.to_rfc3339(), "timeZone": event.time_zone },
                "end": { "dateTime": event.end.to_rfc3339(), "timeZone": event.time_zone },
            });

            let response = self
                .http
                .post(url)
                .bearer_auth(&token)
                .json(&body)
                .send()
                .await
                .map_err(transport)?;
            let created: ApiEvent = read_json(response).await?;

            info!(event_id = %created.id, calendar_id = %calendar_id, "Inserted calendar event");
            Ok(CreatedEvent {
                id: created.id,
                html_link: created.html_link,
            })
        })
    }

    fn refresh_credentials(&self) -> BoxFuture<'_, (), CalendarServiceError> {
        Box::pin(async move {
            self.refresh().await?;
            Ok(())
        })
    }
}
