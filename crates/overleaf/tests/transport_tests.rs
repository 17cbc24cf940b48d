use std::net::TcpListener;
use std::time::Duration;

use httpmock::Method::{GET, POST};
use httpmock::MockServer;
use overleaf::{RemoteConfig, ReqwestTransport, DEFAULT_USER_AGENT};
use pipeline::{RemoteRequest, RemoteTransport};
use serde_json::json;

fn can_bind_localhost() -> bool {
    TcpListener::bind("127.0.0.1:0").is_ok()
}

fn transport_for(server: &MockServer) -> ReqwestTransport {
    let config = RemoteConfig {
        base_url: server.base_url(),
        ..RemoteConfig::default()
    };
    ReqwestTransport::new(&config).unwrap()
}

#[tokio::test]
async fn get_sends_browser_identity_and_captures_cookies() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let page = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/read/abcd1234efgh")
                .header("user-agent", DEFAULT_USER_AGENT)
                .header("origin", server.base_url());
            then.status(200)
                .header("set-cookie", "overleaf_session2=s%3Aabc; Path=/; HttpOnly")
                .header("set-cookie", "GCLB=CKb; path=/")
                .body("<html></html>");
        })
        .await;

    let response = transport_for(&server)
        .send(RemoteRequest::get(server.url("/read/abcd1234efgh")))
        .await
        .unwrap();

    page.assert_async().await;
    assert_eq!(response.status, 200);
    assert_eq!(response.text(), "<html></html>");
    assert_eq!(
        response.set_cookies,
        vec![
            "overleaf_session2=s%3Aabc; Path=/; HttpOnly".to_string(),
            "GCLB=CKb; path=/".to_string()
        ]
    );
}

#[tokio::test]
async fn redirects_are_followed_and_final_url_reported() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/read/abcd1234efgh");
            then.status(302)
                .header("location", server.url("/read/abcd1234efgh/landing"));
        })
        .await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/read/abcd1234efgh/landing");
            then.status(200).header("set-cookie", "sess=1").body("ok");
        })
        .await;

    let response = transport_for(&server)
        .send(RemoteRequest::get(server.url("/read/abcd1234efgh")))
        .await
        .unwrap();

    assert_eq!(response.status, 200);
    assert_eq!(response.final_url, server.url("/read/abcd1234efgh/landing"));
    assert_eq!(response.set_cookies, vec!["sess=1".to_string()]);
}

#[tokio::test]
async fn post_sends_json_body_and_stage_headers() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    let grant = server
        .mock_async(|when, then| {
            when.method(POST)
                .path("/read/abcd1234efgh/grant")
                .header("cookie", "sess=1")
                .header("referer", server.url("/read/abcd1234efgh"))
                .header("content-type", "application/json")
                .json_body(json!({ "_csrf": "csrf-xyz" }));
            then.status(200)
                .json_body(json!({ "redirect": "/project/p42" }));
        })
        .await;

    let request = RemoteRequest::post_json(
        server.url("/read/abcd1234efgh/grant"),
        json!({ "_csrf": "csrf-xyz" }),
    )
    .header("Cookie", "sess=1")
    .header("Referer", server.url("/read/abcd1234efgh"));

    let response = transport_for(&server).send(request).await.unwrap();

    grant.assert_async().await;
    assert_eq!(response.json().unwrap()["redirect"], "/project/p42");
    assert!(response.set_cookies.is_empty());
}

#[tokio::test]
async fn error_statuses_are_returned_not_raised() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(GET).path("/read/badtoken0000");
            then.status(404).body("not found");
        })
        .await;

    let response = transport_for(&server)
        .send(RemoteRequest::get(server.url("/read/badtoken0000")))
        .await
        .unwrap();

    assert_eq!(response.status, 404);
    assert!(!response.is_ok());
}

#[tokio::test]
async fn slow_responses_time_out() {
    if !can_bind_localhost() {
        eprintln!("Skipping httpmock tests: cannot bind to localhost");
        return;
    }

    let server = MockServer::start_async().await;
    server
        .mock_async(|when, then| {
            when.method(POST).path("/project/p42/compile");
            then.status(200).delay(Duration::from_secs(3));
        })
        .await;

    let config = RemoteConfig {
        base_url: server.base_url(),
        request_timeout_secs: 1,
        ..RemoteConfig::default()
    };
    let transport = ReqwestTransport::new(&config).unwrap();

    let err = transport
        .send(RemoteRequest::post_json(
            server.url("/project/p42/compile"),
            json!({}),
        ))
        .await
        .unwrap_err();

    assert!(err.timed_out);
}

#[test]
fn invalid_configuration_is_rejected_at_construction() {
    let config = RemoteConfig {
        user_agent: "bad\nagent".to_string(),
        ..RemoteConfig::default()
    };
    assert!(ReqwestTransport::new(&config).is_err());
}
