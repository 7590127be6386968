//! HTTP route handlers for the earshot service.
//!
//! Accepts multipart uploads, runs the decode + fingerprint work on the
//! blocking pool, and maps engine outcomes onto the wire format. Core
//! errors come back as well-formed JSON, never as 5xx.

use std::sync::Arc;

use axum::extract::{Multipart, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Serialize;
use tracing::warn;

use crate::audio;
use crate::engine::{Candidate, Engine, Identification, Song};

#[derive(Serialize)]
pub struct SongListResponse {
    songs: Vec<Song>,
}

#[derive(Serialize)]
pub struct AddSongResponse {
    id: usize,
    name: String,
}

#[derive(Serialize)]
pub struct ErrorResponse {
    error: &'static str,
}

/// Wire shape of an identification outcome.
#[derive(Serialize)]
#[serde(untagged)]
pub enum IdentifyResponse {
    Match {
        #[serde(rename = "match")]
        song_id: usize,
        name: String,
        external_ref: String,
        score: usize,
        offset_frames: i64,
        top: Vec<Candidate>,
    },
    NoMatch {
        #[serde(rename = "match")]
        song_id: Option<usize>,
        score: usize,
    },
    Error {
        error: &'static str,
    },
}

#[derive(Default)]
struct Upload {
    file: Vec<u8>,
    name: Option<String>,
    external_ref: Option<String>,
}

async fn read_upload(form: &mut Multipart) -> Result<Upload, &'static str> {
    let mut upload = Upload::default();

    while let Some(field) = form.next_field().await.map_err(|_| "bad_multipart")? {
        let Some(name) = field.name().map(str::to_owned) else {
            continue;
        };
        match name.as_str() {
            "file" => upload.file = field.bytes().await.map_err(|_| "bad_multipart")?.to_vec(),
            "name" => upload.name = Some(field.text().await.map_err(|_| "bad_multipart")?),
            "ref" => upload.external_ref = Some(field.text().await.map_err(|_| "bad_multipart")?),
            _ => {}
        }
    }

    if upload.file.is_empty() {
        return Err("missing_file");
    }
    Ok(upload)
}

/// `GET /songs`: snapshot of the registry.
pub async fn list_songs(State(engine): State<Arc<Engine>>) -> Json<SongListResponse> {
    Json(SongListResponse {
        songs: engine.list_songs(),
    })
}

/// `POST /songs`: register an uploaded recording.
///
/// Form fields: `file` (audio bytes), `name` (display name), optional
/// `ref` (external reference URL).
pub async fn add_song(
    State(engine): State<Arc<Engine>>,
    mut form: Multipart,
) -> Result<Json<AddSongResponse>, (StatusCode, Json<ErrorResponse>)> {
    let upload = read_upload(&mut form)
        .await
        .map_err(|error| (StatusCode::BAD_REQUEST, Json(ErrorResponse { error })))?;

    let name = upload.name.clone().unwrap_or_else(|| "untitled".to_owned());
    let response_name = name.clone();

    let outcome = tokio::task::spawn_blocking(move || -> Result<usize, &'static str> {
        let clip = audio::ingest(&upload.file).map_err(|err| {
            warn!(error = %err, "failed to decode upload");
            "decode_failed"
        })?;
        let external_ref = upload.external_ref.unwrap_or_default();
        engine
            .add_song(&clip.samples, clip.sample_rate, &name, &external_ref)
            .map_err(|err| err.kind())
    })
    .await
    .map_err(|_| {
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            Json(ErrorResponse { error: "internal" }),
        )
    })?;

    match outcome {
        Ok(id) => Ok(Json(AddSongResponse {
            id,
            name: response_name,
        })),
        Err(error) => Err((StatusCode::BAD_REQUEST, Json(ErrorResponse { error }))),
    }
}

/// `POST /identify`: identify an uploaded clip.
///
/// Always responds 200 with one of the [`IdentifyResponse`] shapes; the
/// caller distinguishes them by their fields.
pub async fn identify(
    State(engine): State<Arc<Engine>>,
    mut form: Multipart,
) -> Json<IdentifyResponse> {
    let upload = match read_upload(&mut form).await {
        Ok(upload) => upload,
        Err(error) => return Json(IdentifyResponse::Error { error }),
    };

    let outcome = tokio::task::spawn_blocking(move || {
        let clip = match audio::ingest(&upload.file) {
            Ok(clip) => clip,
            Err(err) => {
                warn!(error = %err, "failed to decode query");
                return IdentifyResponse::Error {
                    error: "decode_failed",
                };
            }
        };

        match engine.identify(&clip.samples, clip.sample_rate) {
            Ok(Identification::Match(report)) => IdentifyResponse::Match {
                song_id: report.song_id,
                name: report.name,
                external_ref: report.external_ref,
                score: report.score,
                offset_frames: report.offset_frames,
                top: report.top,
            },
            Ok(Identification::NoMatch) => IdentifyResponse::NoMatch {
                song_id: None,
                score: 0,
            },
            Err(err) => IdentifyResponse::Error { error: err.kind() },
        }
    })
    .await;

    match outcome {
        Ok(response) => Json(response),
        Err(_) => Json(IdentifyResponse::Error { error: "internal" }),
    }
}
