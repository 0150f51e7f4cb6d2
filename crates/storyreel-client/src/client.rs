//! Generation backend HTTP client.

use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, Url};
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::{debug, warn};

use storyreel_models::wire::{
    ArtifactMapResponse, ErrorBody, FaceBox, FaceDetectRequest, FaceDetectResponse,
    FaceSwapRequest, FaceSwapResponse, ImageRequest, ImageResponse, ImageUpload, MusicRequest,
    NarrationRequest, NarrationResponse, NarrationUpdate, ProjectDetails, ProjectList,
    RegenerateChapterRequest, RegenerateSceneRequest, RegenerateShotRequest, SceneVideoRequest,
    ScriptEnvelope, ShotEnvelope, ShotFieldUpdate, ShotVideoRequest, StatusResponse,
};
use storyreel_models::{wire_index, ArtifactClass, ArtifactMap, SceneRef, Script, Shot};

use crate::backend::StudioBackend;
use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};

/// HTTP client for the generation backend.
#[derive(Debug, Clone)]
pub struct StudioClient {
    http: Client,
    base: Url,
    config: ClientConfig,
}

impl StudioClient {
    /// Create a new client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let invalid = |reason: String| ClientError::InvalidBaseUrl {
            url: config.base_url.clone(),
            reason,
        };
        let base = Url::parse(&config.base_url).map_err(|e| invalid(e.to_string()))?;
        if base.cannot_be_a_base() {
            return Err(invalid("not a hierarchical URL".to_string()));
        }

        let http = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(ClientError::Network)?;

        Ok(Self { http, base, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Base URL plus `segments`, each percent-encoded as one path segment.
    fn url(&self, segments: &[&str]) -> Url {
        let mut url = self.base.clone();
        // `new` rejects bases that cannot carry a path.
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    /// GET with a `t=<millis>` cache buster.
    fn get(&self, path: &[&str]) -> RequestBuilder {
        self.http
            .get(self.url(path))
            .query(&[("t", Utc::now().timestamp_millis())])
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        path: &[&str],
        timeout: Option<Duration>,
    ) -> ClientResult<T> {
        let mut request = self.get(path);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let budget = timeout.unwrap_or(self.config.request_timeout);
        debug!(path = %path.join("/"), "GET");
        let response = send(request, budget).await?;
        read_json(response).await
    }

    async fn send_json<B, T>(
        &self,
        method: Method,
        path: &[&str],
        body: &B,
        timeout: Option<Duration>,
    ) -> ClientResult<T>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let mut request = self.http.request(method.clone(), self.url(path)).json(body);
        if let Some(timeout) = timeout {
            request = request.timeout(timeout);
        }
        let budget = timeout.unwrap_or(self.config.request_timeout);
        debug!(path = %path.join("/"), %method, "sending request");
        let response = send(request, budget).await?;
        read_json(response).await
    }

    /// Send and require a success envelope.
    async fn send_for_status<B>(
        &self,
        method: Method,
        path: &[&str],
        body: &B,
        timeout: Option<Duration>,
    ) -> ClientResult<()>
    where
        B: Serialize + ?Sized,
    {
        let status: StatusResponse = self.send_json(method, path, body, timeout).await?;
        ensure_success(&status)
    }

    async fn fetch_map(
        &self,
        path: &[&str],
        class: ArtifactClass,
        timeout: Option<Duration>,
    ) -> ClientResult<ArtifactMap> {
        let response: ArtifactMapResponse = self.get_json(path, timeout).await?;
        ensure_success(&response.status())?;
        Ok(response.take_map(class)?)
    }
}

async fn send(request: RequestBuilder, budget: Duration) -> ClientResult<Response> {
    request.send().await.map_err(|e| {
        if e.is_timeout() {
            ClientError::Timeout(budget)
        } else {
            ClientError::Network(e)
        }
    })
}

async fn read_json<T: DeserializeOwned>(response: Response) -> ClientResult<T> {
    let status = response.status();
    let body = response.text().await?;

    if !status.is_success() {
        let detail = serde_json::from_str::<ErrorBody>(&body)
            .map(|b| b.detail_text())
            .unwrap_or_else(|_| {
                if body.trim().is_empty() {
                    status
                        .canonical_reason()
                        .unwrap_or("request failed")
                        .to_string()
                } else {
                    body.clone()
                }
            });
        warn!(status = status.as_u16(), %detail, "backend request failed");
        return Err(ClientError::http(status.as_u16(), detail));
    }

    Ok(serde_json::from_str(&body)?)
}

fn ensure_success(status: &StatusResponse) -> ClientResult<()> {
    if status.is_success() {
        return Ok(());
    }
    Err(ClientError::envelope(
        status.status.clone().unwrap_or_default(),
        status
            .message
            .clone()
            .unwrap_or_else(|| "The backend did not report success".to_string()),
    ))
}

fn image_part(upload: &ImageUpload) -> ClientResult<Part> {
    Ok(Part::bytes(upload.bytes.clone())
        .file_name(upload.file_name.clone())
        .mime_str(upload.mime)?)
}

#[async_trait]
impl StudioBackend for StudioClient {
    async fn list_projects(&self) -> ClientResult<Vec<String>> {
        let list: ProjectList = self.get_json(&["list-projects"], None).await?;
        Ok(list.projects)
    }

    async fn load_script(&self, project: &str) -> ClientResult<Script> {
        self.get_json(&["api", "script", project], None).await
    }

    async fn create_script(&self, details: &ProjectDetails) -> ClientResult<Script> {
        let envelope: ScriptEnvelope = self
            .send_json(
                Method::POST,
                &["api", "generate-script"],
                details,
                None,
            )
            .await?;
        Ok(envelope.into_script())
    }

    async fn update_shot_field(&self, project: &str, update: &ShotFieldUpdate) -> ClientResult<()> {
        self.send_for_status(
            Method::PUT,
            &["api", "update-shot-description", project],
            update,
            None,
        )
        .await
    }

    async fn replace_script(&self, project: &str, script: &Script) -> ClientResult<()> {
        // The endpoint echoes the document back; only the status code matters.
        let _: serde_json::Value = self
            .send_json(
                Method::PUT,
                &["api", "update-script", project],
                script,
                None,
            )
            .await?;
        Ok(())
    }

    async fn regenerate_chapter(
        &self,
        project: &str,
        request: &RegenerateChapterRequest,
    ) -> ClientResult<Script> {
        let envelope: ScriptEnvelope = self
            .send_json(
                Method::POST,
                &["api", "regenerate-chapter", project],
                request,
                None,
            )
            .await?;
        Ok(envelope.into_script())
    }

    async fn regenerate_scene(
        &self,
        project: &str,
        request: &RegenerateSceneRequest,
    ) -> ClientResult<Script> {
        let envelope: ScriptEnvelope = self
            .send_json(
                Method::POST,
                &["api", "regenerate-scene", project],
                request,
                None,
            )
            .await?;
        Ok(envelope.into_script())
    }

    async fn regenerate_shot(
        &self,
        project: &str,
        request: &RegenerateShotRequest,
    ) -> ClientResult<Shot> {
        let envelope: ShotEnvelope = self
            .send_json(
                Method::POST,
                &["api", "regenerate-shot", project],
                request,
                None,
            )
            .await?;
        Ok(envelope.into_shot())
    }

    async fn generate_image(&self, project: &str, request: &ImageRequest) -> ClientResult<String> {
        let response: ImageResponse = self
            .send_json(
                Method::POST,
                &["api", "regenerate-image", project],
                request,
                None,
            )
            .await?;
        ensure_success(&StatusResponse {
            status: response.status,
            message: response.message,
        })?;
        response
            .base64_image
            .filter(|image| !image.is_empty())
            .ok_or_else(|| ClientError::invalid_response("image response carried no base64_image"))
    }

    async fn regenerate_narration(
        &self,
        project: &str,
        request: &NarrationRequest,
    ) -> ClientResult<String> {
        let response: NarrationResponse = self
            .send_json(
                Method::POST,
                &["api", "regenerate-narration", project],
                request,
                None,
            )
            .await?;
        Ok(response.narration)
    }

    async fn update_narration(
        &self,
        project: &str,
        update: &NarrationUpdate,
    ) -> ClientResult<String> {
        let response: NarrationResponse = self
            .send_json(
                Method::PUT,
                &["api", "update-narration", project],
                update,
                None,
            )
            .await?;
        Ok(response.narration)
    }

    async fn generate_background_music(
        &self,
        project: &str,
        request: &MusicRequest,
    ) -> ClientResult<()> {
        self.send_for_status(
            Method::POST,
            &["api", "generate-background-music", project],
            request,
            None,
        )
        .await
    }

    async fn generate_shot_video(
        &self,
        project: &str,
        request: &ShotVideoRequest,
    ) -> ClientResult<()> {
        self.send_for_status(
            Method::POST,
            &["api", "generate-shot-video", project],
            request,
            Some(self.config.video_submit_timeout),
        )
        .await
    }

    async fn generate_scene_video(
        &self,
        project: &str,
        request: &SceneVideoRequest,
    ) -> ClientResult<()> {
        self.send_for_status(
            Method::POST,
            &["api", "generate-scene-video", project],
            request,
            Some(self.config.video_submit_timeout),
        )
        .await
    }

    async fn start_image_generation(&self, project: &str, script: &Script) -> ClientResult<()> {
        self.send_for_status(
            Method::POST,
            &["api", "generate-images", project],
            script,
            None,
        )
        .await
    }

    async fn assemble_video(&self, project: &str, script: &Script) -> ClientResult<()> {
        self.send_for_status(
            Method::POST,
            &["api", "generate-video", project],
            script,
            None,
        )
        .await
    }

    async fn fetch_all(&self, project: &str, class: ArtifactClass) -> ClientResult<ArtifactMap> {
        let endpoint = format!("get-all-{}", class.path_segment());
        self.fetch_map(&["api", endpoint.as_str(), project], class, None)
            .await
    }

    async fn fetch_scene(
        &self,
        project: &str,
        class: ArtifactClass,
        scene: SceneRef,
    ) -> ClientResult<ArtifactMap> {
        let endpoint = format!("get-scene-{}", class.path_segment());
        let chapter = scene.chapter_number().to_string();
        let scene_number = scene.scene_number().to_string();
        self.fetch_map(
            &[
                "api",
                endpoint.as_str(),
                project,
                chapter.as_str(),
                scene_number.as_str(),
            ],
            class,
            Some(self.config.scene_fetch_timeout),
        )
        .await
    }

    async fn detect_faces(
        &self,
        project: &str,
        request: &FaceDetectRequest,
    ) -> ClientResult<Vec<FaceBox>> {
        let form = Form::new().part("image", image_part(&request.image)?);
        let query = [
            ("chapter_index", wire_index(request.at.chapter).to_string()),
            ("scene_index", wire_index(request.at.scene).to_string()),
            ("shot_index", wire_index(request.at.shot).to_string()),
            ("type", request.frame.to_string()),
        ];
        let http = self
            .http
            .post(self.url(&["api", "detect-faces", project]))
            .query(&query)
            .multipart(form);

        let response = send(http, self.config.request_timeout).await?;
        let detected: FaceDetectResponse = read_json(response).await?;
        ensure_success(&StatusResponse {
            status: detected.status,
            message: None,
        })?;
        Ok(detected.faces)
    }

    async fn swap_faces(&self, project: &str, request: &FaceSwapRequest) -> ClientResult<String> {
        let mut form = Form::new().part("target_image", image_part(&request.target)?);
        for source in &request.sources {
            form = form.part("source_images", image_part(source)?);
        }
        let query = [
            ("chapter_index", wire_index(request.at.chapter).to_string()),
            ("scene_index", wire_index(request.at.scene).to_string()),
            ("shot_index", wire_index(request.at.shot).to_string()),
            ("type", request.frame.to_string()),
        ];
        let http = self
            .http
            .post(self.url(&["api", "swap-faces-custom", project]))
            .query(&query)
            .multipart(form);

        let response = send(http, self.config.request_timeout).await?;
        let swapped: FaceSwapResponse = read_json(response).await?;
        ensure_success(&StatusResponse {
            status: swapped.status,
            message: swapped.message,
        })?;
        swapped
            .swapped_image
            .ok_or_else(|| ClientError::invalid_response("swap response carried no image"))
    }
}
