//! In-memory backend for unit tests.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;

use storyreel_client::{ClientError, ClientResult, StudioBackend};
use storyreel_models::wire::{
    FaceBox, FaceDetectRequest, FaceSwapRequest, ImageRequest, MusicRequest, NarrationRequest,
    NarrationUpdate, ProjectDetails, RegenerateChapterRequest, RegenerateSceneRequest,
    RegenerateShotRequest, SceneVideoRequest, ShotFieldUpdate, ShotVideoRequest,
};
use storyreel_models::{
    from_wire_index, Artifact, ArtifactClass, ArtifactKey, ArtifactMap, Chapter, KeyCodec, Scene,
    SceneRef, Script, Shot, ShotRef,
};

/// One chapter with one scene whose shots open with `openings`.
pub(crate) fn script_with_openings(openings: &[&str]) -> Script {
    let shots = openings
        .iter()
        .enumerate()
        .map(|(i, opening)| Shot {
            shot_number: i as i64 + 1,
            detailed_opening_scene_description: opening.to_string(),
            detailed_closing_scene_description: format!("after {opening}"),
            ..Default::default()
        })
        .collect();
    Script {
        chapters: vec![Chapter {
            chapter_number: 1,
            chapter_title: "Arrival".to_string(),
            chapter_description: "A visitor comes to the house".to_string(),
            scenes: vec![Scene {
                scene_number: 1,
                general_scene_description_and_motivations: "A visitor arrives at night"
                    .to_string(),
                narration_text: "It was late.".to_string(),
                shots,
                ..Default::default()
            }],
            ..Default::default()
        }],
        ..Default::default()
    }
}

/// The "demo" project: one chapter, one scene, two shots.
pub(crate) fn demo_script() -> Script {
    script_with_openings(&["a quiet hallway", "a red door"])
}

pub(crate) fn map(entries: &[(&str, &str)]) -> ArtifactMap {
    entries
        .iter()
        .map(|(k, v)| (ArtifactKey::from(*k), Artifact::new(*v)))
        .collect()
}

/// Start and end of one generation call.
#[derive(Debug, Clone, Copy)]
pub(crate) struct CallSpan {
    pub op: &'static str,
    pub started: Instant,
    pub finished: Instant,
}

/// Scriptable [`StudioBackend`].
///
/// Generation calls store their artifact in the backend's own maps, the
/// way the real service persists files that later fetches return.
#[derive(Default)]
pub(crate) struct FakeBackend {
    script: Mutex<Script>,
    saved: Mutex<Option<Script>>,
    maps: Mutex<HashMap<ArtifactClass, ArtifactMap>>,
    calls: Mutex<Vec<&'static str>>,
    spans: Mutex<Vec<CallSpan>>,
    failing: Mutex<HashSet<&'static str>>,
    failing_calls: Mutex<HashSet<(&'static str, usize)>>,
    latency: Mutex<Duration>,
}

impl FakeBackend {
    pub fn new(script: Script) -> Self {
        Self {
            script: Mutex::new(script),
            ..Default::default()
        }
    }

    pub fn with_map(self, class: ArtifactClass, entries: &[(&str, &str)]) -> Self {
        self.maps.lock().unwrap().insert(class, map(entries));
        self
    }

    /// Every call of `op` fails with HTTP 500.
    pub fn fail(&self, op: &'static str) {
        self.failing.lock().unwrap().insert(op);
    }

    /// The `nth` call (1-based) of `op` fails with HTTP 500.
    pub fn fail_call(&self, op: &'static str, nth: usize) {
        self.failing_calls.lock().unwrap().insert((op, nth));
    }

    /// How long each generation call takes.
    pub fn set_latency(&self, latency: Duration) {
        *self.latency.lock().unwrap() = latency;
    }

    pub fn calls(&self) -> Vec<&'static str> {
        self.calls.lock().unwrap().clone()
    }

    pub fn count(&self, op: &str) -> usize {
        self.calls.lock().unwrap().iter().filter(|c| **c == op).count()
    }

    pub fn spans(&self) -> Vec<CallSpan> {
        self.spans.lock().unwrap().clone()
    }

    pub fn saved_script(&self) -> Option<Script> {
        self.saved.lock().unwrap().clone()
    }

    fn enter(&self, op: &'static str) -> ClientResult<()> {
        let nth = {
            let mut calls = self.calls.lock().unwrap();
            calls.push(op);
            calls.iter().filter(|c| **c == op).count()
        };
        let fails = self.failing.lock().unwrap().contains(op)
            || self.failing_calls.lock().unwrap().contains(&(op, nth));
        if fails {
            return Err(ClientError::http(500, format!("{op} failed")));
        }
        Ok(())
    }

    /// A generation call: takes `latency`, then stores the artifact.
    async fn generate(
        &self,
        op: &'static str,
        stored: Option<(ArtifactClass, ArtifactKey, Artifact)>,
    ) -> ClientResult<()> {
        let started = Instant::now();
        let entered = self.enter(op);
        let latency = *self.latency.lock().unwrap();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if entered.is_ok() {
            if let Some((class, key, artifact)) = stored {
                self.maps
                    .lock()
                    .unwrap()
                    .entry(class)
                    .or_default()
                    .insert(key, artifact);
            }
        }
        self.spans.lock().unwrap().push(CallSpan {
            op,
            started,
            finished: Instant::now(),
        });
        entered
    }
}

fn shot_ref(chapter: u32, scene: u32, shot: u32) -> ShotRef {
    let index = |n| from_wire_index(n).unwrap_or_default();
    ShotRef::new(index(chapter), index(scene), index(shot))
}

fn scene_ref(chapter: u32, scene: u32) -> SceneRef {
    let index = |n| from_wire_index(n).unwrap_or_default();
    SceneRef::new(index(chapter), index(scene))
}

#[async_trait]
impl StudioBackend for FakeBackend {
    async fn list_projects(&self) -> ClientResult<Vec<String>> {
        self.enter("list_projects")?;
        Ok(vec!["demo".to_string()])
    }

    async fn load_script(&self, _project: &str) -> ClientResult<Script> {
        self.enter("load_script")?;
        Ok(self.script.lock().unwrap().clone())
    }

    /// One chapter titled after the subject, with `number_of_shots` shots.
    async fn create_script(&self, details: &ProjectDetails) -> ClientResult<Script> {
        self.enter("create_script")?;
        let openings: Vec<String> = (1..=details.number_of_shots)
            .map(|n| format!("{} {n}", details.subject))
            .collect();
        let openings: Vec<&str> = openings.iter().map(String::as_str).collect();
        let mut script = script_with_openings(&openings);
        script.chapters[0].chapter_title = details.subject.clone();
        script.black_and_white = details.black_and_white;
        *self.script.lock().unwrap() = script.clone();
        Ok(script)
    }

    async fn update_shot_field(
        &self,
        _project: &str,
        _update: &ShotFieldUpdate,
    ) -> ClientResult<()> {
        self.enter("update_shot_field")
    }

    async fn replace_script(&self, _project: &str, script: &Script) -> ClientResult<()> {
        self.enter("replace_script")?;
        *self.saved.lock().unwrap() = Some(script.clone());
        Ok(())
    }

    async fn regenerate_chapter(
        &self,
        _project: &str,
        request: &RegenerateChapterRequest,
    ) -> ClientResult<Script> {
        self.enter("regenerate_chapter")?;
        let mut script = self.script.lock().unwrap().clone();
        if let Some(chapter) = from_wire_index(request.chapter_index)
            .and_then(|index| script.chapter_mut(index))
        {
            chapter.chapter_title = format!("Regenerated: {}", request.instructions);
        }
        Ok(script)
    }

    async fn regenerate_scene(
        &self,
        _project: &str,
        request: &RegenerateSceneRequest,
    ) -> ClientResult<Script> {
        self.enter("regenerate_scene")?;
        let mut script = self.script.lock().unwrap().clone();
        let at = scene_ref(request.chapter_index, request.scene_index);
        if let Some(scene) = script.scene_mut(at) {
            scene.general_scene_description_and_motivations = request.instructions.clone();
        }
        Ok(script)
    }

    async fn regenerate_shot(
        &self,
        _project: &str,
        request: &RegenerateShotRequest,
    ) -> ClientResult<Shot> {
        self.enter("regenerate_shot")?;
        Ok(Shot {
            shot_number: request.shot_index as i64,
            detailed_opening_scene_description: request.instructions.clone(),
            detailed_closing_scene_description: request.instructions.clone(),
            ..Default::default()
        })
    }

    async fn generate_image(&self, _project: &str, request: &ImageRequest) -> ClientResult<String> {
        let at = shot_ref(request.chapter_index, request.scene_index, request.shot_index);
        let key = ArtifactKey::image(at, request.frame);
        let image = format!("img:{}", request.custom_prompt);
        self.generate(
            "generate_image",
            Some((ArtifactClass::Image, key, Artifact::new(image.clone()))),
        )
        .await?;
        Ok(image)
    }

    async fn regenerate_narration(
        &self,
        _project: &str,
        request: &NarrationRequest,
    ) -> ClientResult<String> {
        self.enter("regenerate_narration")?;
        Ok(format!("rewritten: {}", request.instructions))
    }

    async fn update_narration(
        &self,
        _project: &str,
        update: &NarrationUpdate,
    ) -> ClientResult<String> {
        self.enter("update_narration")?;
        Ok(update.narration_text.clone())
    }

    async fn generate_background_music(
        &self,
        _project: &str,
        request: &MusicRequest,
    ) -> ClientResult<()> {
        let at = scene_ref(request.chapter_number, request.scene_number);
        let key = ArtifactKey::scene(at);
        let url = format!("https://cdn.test/music/{key}-{}.mp3", request.style);
        self.generate(
            "generate_background_music",
            Some((ArtifactClass::Music, key, Artifact::new(url))),
        )
        .await
    }

    async fn generate_shot_video(
        &self,
        _project: &str,
        request: &ShotVideoRequest,
    ) -> ClientResult<()> {
        let at = shot_ref(request.chapter_number, request.scene_number, request.shot_number);
        let key = KeyCodec::default().shot_video_key(at);
        let url = format!("https://cdn.test/video/{key}.mp4");
        self.generate(
            "generate_shot_video",
            Some((ArtifactClass::Video, key, Artifact::new(url))),
        )
        .await
    }

    async fn generate_scene_video(
        &self,
        _project: &str,
        request: &SceneVideoRequest,
    ) -> ClientResult<()> {
        let at = scene_ref(request.chapter_number, request.scene_number);
        let key = KeyCodec::default().scene_video_key(at);
        let url = format!("https://cdn.test/video/{key}.mp4");
        self.generate(
            "generate_scene_video",
            Some((ArtifactClass::Video, key, Artifact::new(url))),
        )
        .await
    }

    async fn start_image_generation(&self, _project: &str, _script: &Script) -> ClientResult<()> {
        self.enter("start_image_generation")
    }

    async fn assemble_video(&self, _project: &str, script: &Script) -> ClientResult<()> {
        self.enter("assemble_video")?;
        *self.saved.lock().unwrap() = Some(script.clone());
        Ok(())
    }

    async fn fetch_all(&self, _project: &str, class: ArtifactClass) -> ClientResult<ArtifactMap> {
        self.enter("fetch_all")?;
        Ok(self
            .maps
            .lock()
            .unwrap()
            .get(&class)
            .cloned()
            .unwrap_or_default())
    }

    async fn fetch_scene(
        &self,
        _project: &str,
        class: ArtifactClass,
        scene: SceneRef,
    ) -> ClientResult<ArtifactMap> {
        self.enter("fetch_scene")?;
        let prefix = ArtifactKey::scene(scene).as_str().to_string();
        let nested = format!("{prefix}-");
        Ok(self
            .maps
            .lock()
            .unwrap()
            .get(&class)
            .map(|all| {
                all.iter()
                    .filter(|(key, _)| key.as_str() == prefix || key.as_str().starts_with(&nested))
                    .map(|(key, artifact)| (key.clone(), artifact.clone()))
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn detect_faces(
        &self,
        _project: &str,
        _request: &FaceDetectRequest,
    ) -> ClientResult<Vec<FaceBox>> {
        self.enter("detect_faces")?;
        Ok(vec![FaceBox {
            x: 10.0,
            y: 20.0,
            width: 64.0,
            height: 64.0,
            confidence: Some(0.98),
        }])
    }

    async fn swap_faces(&self, _project: &str, request: &FaceSwapRequest) -> ClientResult<String> {
        self.enter("swap_faces")?;
        Ok(format!("swapped:{}", request.sources.len()))
    }
}
