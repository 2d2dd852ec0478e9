use chrono::NaiveDate;
use familyboard::components::calendar::{
    BoardTimeZone, CalendarManager, CalendarProvider, GraphCalendarProvider, QueryWindow,
    RefreshCredentials, RefreshingToken, StaticToken, TokenSource,
};
use familyboard::error::Error;
use serde_json::json;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use wiremock::matchers::{body_string_contains, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn provider(server: &MockServer, tokens: Arc<dyn TokenSource>) -> GraphCalendarProvider {
    GraphCalendarProvider::new(reqwest::Client::new(), &format!("{}/v1.0", server.uri()), tokens)
        .unwrap()
}

fn static_token() -> Arc<dyn TokenSource> {
    Arc::new(StaticToken::new("test-token"))
}

fn window() -> QueryWindow {
    let tz = BoardTimeZone::Named(chrono_tz::UTC);
    QueryWindow::for_dates(
        &tz,
        NaiveDate::from_ymd_opt(2021, 2, 1).unwrap(),
        NaiveDate::from_ymd_opt(2021, 2, 28).unwrap(),
    )
    .unwrap()
}

fn graph_event(id: &str, start: &str) -> serde_json::Value {
    json!({
        "id": id,
        "subject": format!("Event {}", id),
        "isAllDay": false,
        "start": { "dateTime": start, "timeZone": "UTC" },
        "end": { "dateTime": start, "timeZone": "UTC" }
    })
}

#[tokio::test]
async fn test_list_calendars() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars"))
        .and(header("Authorization", "Bearer test-token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                { "id": "cal-1", "name": "Calendar", "color": "auto", "canEdit": true },
                { "id": "cal-2", "name": "Family" }
            ]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let calendars = provider(&server, static_token()).list_calendars().await.unwrap();
    assert_eq!(calendars.len(), 2);
    assert_eq!(calendars[1].id, "cal-2");
    assert_eq!(calendars[1].name, "Family");
}

#[tokio::test]
async fn test_calendar_view_query_and_continuation() {
    let server = MockServer::start().await;
    let next_link = format!("{}/v1.0/me/calendars/cal-2/calendarView?$skiptoken=abc", server.uri());

    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars/cal-2/calendarView"))
        .and(query_param("startDateTime", "2021-02-01T00:00:00Z"))
        .and(query_param("endDateTime", "2021-02-28T23:59:59.999999999Z"))
        .and(header("Prefer", r#"outlook.timezone="UTC""#))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [graph_event("a", "2021-02-03T10:00:00.0000000")],
            "@odata.nextLink": next_link
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars/cal-2/calendarView"))
        .and(query_param("$skiptoken", "abc"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [graph_event("b", "2021-02-04T10:00:00.0000000")]
        })))
        .expect(1)
        .mount(&server)
        .await;

    let provider = provider(&server, static_token());
    let first = provider.list_events("cal-2", &window(), None).await.unwrap();
    assert_eq!(first.events[0].id, "a");
    assert_eq!(first.next_page.as_deref(), Some(next_link.as_str()));

    let second = provider
        .list_events("cal-2", &window(), first.next_page.as_deref())
        .await
        .unwrap();
    assert_eq!(second.events[0].id, "b");
    assert!(second.next_page.is_none());
}

#[tokio::test]
async fn test_continuation_to_another_origin_is_refused() {
    let server = MockServer::start().await;
    let elsewhere = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "value": [] })))
        .expect(0)
        .mount(&elsewhere)
        .await;

    let link = format!("{}/v1.0/me/calendars/cal-2/calendarView?$skip=10", elsewhere.uri());
    let result = provider(&server, static_token())
        .list_events("cal-2", &window(), Some(&link))
        .await;
    assert!(matches!(result, Err(Error::Other(msg)) if msg.contains("is not on")));
}

#[tokio::test]
async fn test_manager_over_graph_end_to_end() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "cal-2", "name": "Family" }]
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars/cal-2/calendarView"))
        .and(query_param("startDateTime", "2021-02-01T00:00:00Z"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [
                graph_event("a", "2021-02-03T10:00:00.0000000"),
                graph_event("b", "2021-02-05T10:00:00.0000000")
            ],
            "@odata.nextLink": format!(
                "{}/v1.0/me/calendars/cal-2/calendarView?$skip=2",
                server.uri()
            )
        })))
        .expect(2)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars/cal-2/calendarView"))
        .and(query_param("$skip", "2"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [graph_event("c", "2021-02-20T10:00:00.0000000")]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let manager = CalendarManager::new(
        Arc::new(provider(&server, static_token())),
        BoardTimeZone::Named(chrono_tz::UTC),
    );
    let cancel = CancellationToken::new();
    let february = NaiveDate::from_ymd_opt(2021, 2, 9).unwrap();

    for _ in 0..2 {
        let events = manager
            .get_months_events("Family", february, &cancel)
            .await
            .unwrap()
            .into_events();
        let ids: Vec<_> = events.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "b", "c"]);
    }
}

#[tokio::test]
async fn test_expired_token_is_refreshed_once() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "refresh_token": "refresh-2",
            "expires_in": 3600
        })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars"))
        .and(header("Authorization", "Bearer stale"))
        .respond_with(ResponseTemplate::new(401).set_body_string("InvalidAuthenticationToken"))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars"))
        .and(header("Authorization", "Bearer fresh"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "value": [{ "id": "cal-1", "name": "Family" }]
        })))
        .expect(2)
        .mount(&server)
        .await;

    let tokens = Arc::new(RefreshingToken::new(
        reqwest::Client::new(),
        "stale",
        RefreshCredentials {
            token_url: format!("{}/token", server.uri()),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh-1".to_string(),
        },
    ));
    let provider = provider(&server, tokens.clone());

    assert_eq!(provider.list_calendars().await.unwrap().len(), 1);
    assert_eq!(tokens.access_token().await.unwrap(), "fresh");
    // The refreshed token is reused without another refresh
    assert_eq!(provider.list_calendars().await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_static_token_rejection_is_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars"))
        .respond_with(ResponseTemplate::new(401))
        .expect(1)
        .mount(&server)
        .await;

    let result = provider(&server, static_token()).list_calendars().await;
    assert!(matches!(result, Err(Error::Auth(_))));
}

#[tokio::test]
async fn test_second_rejection_after_refresh_fails() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "access_token": "fresh" })))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars"))
        .respond_with(ResponseTemplate::new(401).set_body_string("still no"))
        .expect(2)
        .mount(&server)
        .await;

    let tokens = Arc::new(RefreshingToken::new(
        reqwest::Client::new(),
        "stale",
        RefreshCredentials {
            token_url: format!("{}/token", server.uri()),
            client_id: "client".to_string(),
            client_secret: "secret".to_string(),
            refresh_token: "refresh-1".to_string(),
        },
    ));

    let result = provider(&server, tokens).list_calendars().await;
    assert!(matches!(result, Err(Error::Upstream { status: 401, .. })));
}

#[tokio::test]
async fn test_server_error_is_reported_with_status_and_body() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1.0/me/calendars/cal-1/calendarView"))
        .respond_with(ResponseTemplate::new(503).set_body_string("Service Unavailable"))
        .mount(&server)
        .await;

    let result = provider(&server, static_token())
        .list_events("cal-1", &window(), None)
        .await;
    match result {
        Err(Error::Upstream { status, body }) => {
            assert_eq!(status, 503);
            assert_eq!(body, "Service Unavailable");
        }
        other => panic!("unexpected result: {:?}", other.map(|p| p.events.len())),
    }
}

#[tokio::test]
async fn test_invalid_base_url_is_config_error() {
    let result = GraphCalendarProvider::new(reqwest::Client::new(), "not a url", static_token());
    assert!(matches!(result, Err(Error::Config(_))));
}
