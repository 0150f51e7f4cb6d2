//! Generation scenarios against a mock backend.

use serde_json::json;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use storyreel_models::wire::ProjectDetails;
use storyreel_models::{ArtifactClass, ArtifactKey, SceneRef, Severity, ShotRef, Slot, SlotKind};
use storyreel_studio::GenerationOptions;

use super::common::{drain, map_body, mount_project, script_json, studio_for};

/// Opening image for shot 2 lands next to the existing shot 1 image.
#[tokio::test]
async fn test_generate_second_opening_image() {
    let server = MockServer::start().await;
    mount_project(&server, "demo", script_json(&["a quiet hallway", "a red door"])).await;

    Mock::given(method("GET"))
        .and(path("/api/get-scene-images/demo/1/1"))
        .respond_with(map_body(
            ArtifactClass::Image,
            json!({ "1-1-1-opening": "aGFsbHdheQ==" }),
        ))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/regenerate-image/demo"))
        .and(body_partial_json(json!({
            "chapter_index": 1,
            "scene_index": 1,
            "shot_index": 2,
            "type": "opening",
            "custom_prompt": "a red door"
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "base64_image": "cmVkIGRvb3I="
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (studio, _notices) = studio_for(&server, "demo");
    studio.open().await.expect("Failed to open project");
    studio
        .refresh_scene(SceneRef::new(0, 0))
        .await
        .expect("Failed to fetch scene");

    studio
        .generate(
            Slot::opening_image(ShotRef::new(0, 0, 1)),
            &GenerationOptions::default(),
        )
        .await
        .expect("Generation failed");

    let images = studio.cache().snapshot(ArtifactClass::Image);
    assert_eq!(
        images[&ArtifactKey::from("1-1-1-opening")].as_str(),
        "aGFsbHdheQ=="
    );
    assert_eq!(
        images[&ArtifactKey::from("1-1-2-opening")].as_str(),
        "cmVkIGRvb3I="
    );
}

/// Three pending images, the second call fails: two stored, one missing.
#[tokio::test]
async fn test_batch_with_one_server_error() {
    let server = MockServer::start().await;
    mount_project(&server, "demo", script_json(&["one", "two", "three"])).await;

    Mock::given(method("POST"))
        .and(path("/api/regenerate-image/demo"))
        .and(body_partial_json(json!({ "shot_index": 2 })))
        .respond_with(ResponseTemplate::new(500).set_body_json(json!({
            "detail": "model crashed"
        })))
        .with_priority(1)
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/regenerate-image/demo"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "success",
            "base64_image": "aW1hZ2U="
        })))
        .expect(2)
        .mount(&server)
        .await;

    let (studio, mut notices) = studio_for(&server, "demo");
    studio.open().await.expect("Failed to open project");
    drain(&mut notices);

    let report = studio
        .generate_all(SlotKind::OpeningImage, &GenerationOptions::default())
        .await
        .expect("Batch did not run");

    assert_eq!(report.total, 3);
    assert_eq!(report.succeeded, 2);
    assert_eq!(report.failed, 1);

    let images = studio.cache().snapshot(ArtifactClass::Image);
    assert!(images.contains_key(&ArtifactKey::from("1-1-1-opening")));
    assert!(images.contains_key(&ArtifactKey::from("1-1-3-opening")));
    assert!(!images.contains_key(&ArtifactKey::from("1-1-2-opening")));

    let notices = drain(&mut notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, Severity::Warning);
    assert_eq!(notices[0].description, "2 succeeded, 1 failed");
}

/// A failed scene fetch reports once and keeps what was cached.
#[tokio::test]
async fn test_scene_fetch_error_keeps_cache() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/api/get-all-images/demo"))
        .respond_with(map_body(
            ArtifactClass::Image,
            json!({ "1-1-1-opening": "b2xk" }),
        ))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/api/get-scene-videos/demo/1/1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "status": "error",
            "message": "video index unavailable"
        })))
        .mount(&server)
        .await;
    mount_project(&server, "demo", script_json(&["a quiet hallway"])).await;

    let (studio, mut notices) = studio_for(&server, "demo");
    studio.open().await.expect("Failed to open project");
    drain(&mut notices);

    assert!(studio.refresh_scene(SceneRef::new(0, 0)).await.is_err());

    assert_eq!(
        studio
            .cache()
            .get(ArtifactClass::Image, &ArtifactKey::from("1-1-1-opening"))
            .map(|a| a.into_inner()),
        Some("b2xk".to_string())
    );
    let notices = drain(&mut notices);
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, Severity::Error);
    assert_eq!(notices[0].description, "video index unavailable");
}

/// A new project's script comes back from the backend and feeds video assembly.
#[tokio::test]
async fn test_new_project_then_assemble_video() {
    let server = MockServer::start().await;
    let generated = script_json(&["a keeper climbs the stairs"]);
    Mock::given(method("POST"))
        .and(path("/api/generate-script"))
        .and(body_partial_json(json!({
            "project": "lighthouse",
            "subject": "a keeper vanishes",
            "number_of_shots": 1
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Script generated successfully",
            "script": generated
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/api/generate-video/lighthouse"))
        .and(body_partial_json(json!({ "chapters": [{ "chapter_title": "Arrival" }] })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "message": "Video generated successfully"
        })))
        .expect(1)
        .mount(&server)
        .await;

    let (studio, mut notices) = studio_for(&server, "lighthouse");
    let details = ProjectDetails::new("lighthouse", "mystery", "a keeper vanishes");
    let script = studio
        .create_project(&details)
        .await
        .expect("Failed to create project");
    studio.assemble_video().await.expect("Assembly failed");

    assert_eq!(script.shot_count(), 1);
    assert_eq!(studio.script(), Some(script));
    let severities: Vec<_> = drain(&mut notices).into_iter().map(|n| n.severity).collect();
    assert_eq!(severities, vec![Severity::Success, Severity::Success]);
}
