//! Mock TLDR API helpers

use serde_json::json;
use wiremock::matchers::{method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Token every mounted endpoint requires
pub const TOKEN: &str = "test-token";

/// API root on the mock server
pub fn api_base(server: &MockServer) -> String {
    format!("{}/api", server.uri())
}

/// Accept one submission and answer with `job_id`
pub async fn mount_submit(server: &MockServer, job_id: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/api/modules/build3d37/submit"))
        .and(query_param("token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "job_id": job_id })))
        .expect(1)
        .mount(server)
        .await;
}

/// Report `statuses` in order, then `Completed` with `outputs` from then on
pub async fn mount_status_sequence(
    server: &MockServer,
    job_id: &str,
    statuses: &[&str],
    outputs: &[&str],
) {
    let status_path = format!("/api/results/download/{job_id}");
    for status in statuses {
        Mock::given(method("GET"))
            .and(path(status_path.as_str()))
            .and(query_param("token", TOKEN))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": status })))
            .up_to_n_times(1)
            .mount(server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(status_path.as_str()))
        .and(query_param("token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "Completed",
            "output_list": outputs,
        })))
        .mount(server)
        .await;
}

/// Serve `body` as the artifact `filename` of `job_id`
pub async fn mount_artifact(server: &MockServer, job_id: &str, filename: &str, body: Vec<u8>) {
    Mock::given(method("GET"))
        .and(path(format!("/api/results/download/{job_id}/{filename}")))
        .and(query_param("token", TOKEN))
        .respond_with(ResponseTemplate::new(200).set_body_bytes(body))
        .expect(1)
        .mount(server)
        .await;
}

/// Report `Invalid input` for every status check of `job_id`
pub async fn mount_invalid_input(server: &MockServer, job_id: &str) {
    Mock::given(method("GET"))
        .and(path(format!("/api/results/download/{job_id}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({ "status": "Invalid input" })))
        .expect(1)
        .mount(server)
        .await;
}
