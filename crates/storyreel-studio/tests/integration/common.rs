//! Mock backend helpers.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{json, Value};
use tokio::sync::mpsc::UnboundedReceiver;
use wiremock::matchers::{method, path, path_regex};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storyreel_client::{ClientConfig, StudioClient};
use storyreel_models::{ArtifactClass, Notice};
use storyreel_studio::{ChannelNotifier, Studio, StudioConfig};

/// Script of one chapter with one scene whose shots open with `openings`.
pub fn script_json(openings: &[&str]) -> Value {
    let shots: Vec<Value> = openings
        .iter()
        .enumerate()
        .map(|(i, opening)| {
            json!({
                "shot_number": i + 1,
                "detailed_opening_scene_description": opening,
                "detailed_closing_scene_description": format!("after {opening}"),
                "director_instructions": null
            })
        })
        .collect();
    json!({
        "chapters": [{
            "chapter_number": 1,
            "chapter_title": "Arrival",
            "chapter_description": "A visitor comes to the house",
            "key_events": [],
            "main_characters": ["Visitor"],
            "scenes": [{
                "scene_number": 1,
                "general_scene_description_and_motivations": "A visitor arrives at night",
                "narration_text": "It was late.",
                "shots": shots
            }]
        }]
    })
}

pub fn map_body(class: ArtifactClass, entries: Value) -> ResponseTemplate {
    let mut body = json!({ "status": "success" });
    body[class.map_field()] = entries;
    ResponseTemplate::new(200).set_body_json(body)
}

/// Serve `script` and empty maps for every artifact endpoint. Specific
/// mocks mounted afterwards take precedence.
pub async fn mount_project(server: &MockServer, project: &str, script: Value) {
    Mock::given(method("GET"))
        .and(path(format!("/api/script/{project}")))
        .respond_with(ResponseTemplate::new(200).set_body_json(script))
        .mount(server)
        .await;

    for class in ArtifactClass::ALL {
        let pattern = format!(
            r"^/api/get-(all|scene)-{}/{project}(/\d+/\d+)?$",
            class.path_segment()
        );
        Mock::given(method("GET"))
            .and(path_regex(pattern))
            .respond_with(map_body(*class, json!({})))
            .with_priority(10)
            .mount(server)
            .await;
    }
}

pub fn studio_for(server: &MockServer, project: &str) -> (Studio, UnboundedReceiver<Notice>) {
    let client = StudioClient::new(ClientConfig::default().with_base_url(server.uri()))
        .expect("Failed to build client");
    let (notifier, notices) = ChannelNotifier::new();
    let config = StudioConfig {
        batch_delay: Duration::from_millis(20),
        ..Default::default()
    };
    let studio = Studio::builder(project, Arc::new(client))
        .notifier(Arc::new(notifier))
        .config(config)
        .build();
    (studio, notices)
}

pub fn drain(notices: &mut UnboundedReceiver<Notice>) -> Vec<Notice> {
    let mut drained = Vec::new();
    while let Ok(notice) = notices.try_recv() {
        drained.push(notice);
    }
    drained
}
