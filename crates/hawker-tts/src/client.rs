//! The provider client: composes the request, dials the socket, drains
//! the audio stream into a temp file and publishes it atomically.
//!
//! ## Cancellation
//!
//! The caller's token is raced against the dial and against every frame
//! read. A token firing mid-stream closes the socket (by drop) and
//! removes the temp file — a partial MP3 is never renamed into place.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use futures_util::{SinkExt, StreamExt};
use serde_json::json;
use tokio::fs;
use tokio::io::AsyncWriteExt;
use tokio::net::TcpStream;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};
use uuid::Uuid;

use hawker_core::ports::{AudioSynthesizer, SynthesisError};
use hawker_core::settings::TtsSettings;

use crate::error::TtsError;
use crate::protocol::{self, ServerFrame};
use crate::voices;

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;

/// WebSocket TTS client writing MP3s under the static audio root.
pub struct DoubaoTtsService {
    settings: TtsSettings,
    audio_root: PathBuf,
}

impl DoubaoTtsService {
    pub fn new(settings: TtsSettings, audio_root: PathBuf) -> Self {
        Self { settings, audio_root }
    }

    async fn synthesize(
        &self,
        cancel: &CancellationToken,
        text: &str,
        identifier: &str,
        voice: &str,
    ) -> Result<String, TtsError> {
        let file_name = format!("{identifier}.mp3");
        let final_path = self.audio_root.join(&file_name);

        // Identifiers may carry subdirectories ("intros/...").
        if let Some(parent) = final_path.parent() {
            fs::create_dir_all(parent).await?;
        }

        let payload = self.request_payload(text, voice);
        let compressed = protocol::gzip_compress(&payload)?;
        let frame = protocol::encode_request_frame(&compressed);

        let mut request = self
            .settings
            .endpoint
            .as_str()
            .into_client_request()
            .map_err(|e| TtsError::Dial(e.to_string()))?;
        let auth = HeaderValue::from_str(&format!("Bearer;{}", self.settings.access_token))
            .map_err(|e| TtsError::Dial(e.to_string()))?;
        request.headers_mut().insert("Authorization", auth);

        let (mut socket, _) = tokio::select! {
            _ = cancel.cancelled() => return Err(TtsError::Cancelled),
            connected = connect_async(request) => {
                connected.map_err(|e| TtsError::Dial(e.to_string()))?
            }
        };
        debug!(identifier, voice, "TTS socket connected");

        socket
            .send(Message::Binary(frame))
            .await
            .map_err(|e| TtsError::Stream(e.to_string()))?;

        let tmp_path = self.audio_root.join(format!("{identifier}.tmp"));
        match stream_to_file(cancel, &mut socket, &tmp_path).await {
            Ok(()) => {
                // The temp handle is closed; publish atomically.
                if let Err(e) = fs::rename(&tmp_path, &final_path).await {
                    let _ = fs::remove_file(&tmp_path).await;
                    return Err(e.into());
                }
                info!(identifier, voice, "audio synthesized");
                Ok(format!("/static/audio/{file_name}"))
            }
            Err(e) => {
                let _ = fs::remove_file(&tmp_path).await;
                Err(e)
            }
        }
    }

    fn request_payload(&self, text: &str, voice: &str) -> Vec<u8> {
        let request = json!({
            "app": {
                "appid": self.settings.app_id,
                "token": self.settings.access_token,
                "cluster": self.settings.cluster_id,
            },
            "user": { "uid": "hawker_go_cli" },
            "audio": {
                "voice_type": voices::provider_voice_id(voice),
                "encoding": "mp3",
                "speed_ratio": 1.0,
                "volume_ratio": 1.0,
                "pitch_ratio": 1.0,
            },
            "request": {
                "reqid": Uuid::new_v4().to_string(),
                "text": text,
                "text_type": "plain",
                "operation": "query",
            },
        });
        serde_json::to_vec(&request).expect("static request shape serializes")
    }
}

/// Drain audio frames into `tmp_path` until the negative-sequence
/// final chunk. The file handle is closed (dropped) before returning so
/// the caller can rename immediately.
async fn stream_to_file(
    cancel: &CancellationToken,
    socket: &mut Socket,
    tmp_path: &Path,
) -> Result<(), TtsError> {
    let mut file = fs::File::create(tmp_path).await?;

    loop {
        let message = tokio::select! {
            _ = cancel.cancelled() => return Err(TtsError::Cancelled),
            message = socket.next() => message,
        };

        match message {
            Some(Ok(Message::Binary(data))) => match protocol::parse_server_frame(&data) {
                ServerFrame::Audio { sequence, data } => {
                    file.write_all(data).await?;
                    if sequence < 0 {
                        file.sync_all().await?;
                        return Ok(());
                    }
                }
                ServerFrame::Error { message } => return Err(TtsError::Provider(message)),
                ServerFrame::Ignored => {}
            },
            // A close before the final chunk means the MP3 is partial;
            // it must not be published.
            Some(Ok(Message::Close(_))) | None => {
                return Err(TtsError::Stream(
                    "connection closed before the final audio frame".to_owned(),
                ));
            }
            Some(Ok(_)) => {}
            Some(Err(e)) => return Err(TtsError::Stream(e.to_string())),
        }
    }
}

#[async_trait]
impl AudioSynthesizer for DoubaoTtsService {
    async fn generate_audio(
        &self,
        cancel: &CancellationToken,
        text: &str,
        identifier: &str,
        voice: &str,
    ) -> Result<String, SynthesisError> {
        self.synthesize(cancel, text, identifier, voice)
            .await
            .map_err(SynthesisError::from)
    }

    fn provider_voice_id(&self, voice: &str) -> String {
        voices::provider_voice_id(voice).to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn service() -> DoubaoTtsService {
        DoubaoTtsService::new(
            TtsSettings {
                app_id: "app".into(),
                access_token: "token".into(),
                cluster_id: "cluster".into(),
                endpoint: "wss://example.invalid/tts".into(),
            },
            std::env::temp_dir(),
        )
    }

    #[test]
    fn request_payload_carries_the_provider_contract() {
        let payload = service().request_payload("走过路过", "soft_girl");
        let json: serde_json::Value = serde_json::from_slice(&payload).unwrap();

        assert_eq!(json["app"]["appid"], "app");
        assert_eq!(json["app"]["token"], "token");
        assert_eq!(json["app"]["cluster"], "cluster");
        assert_eq!(json["user"]["uid"], "hawker_go_cli");
        assert_eq!(json["audio"]["voice_type"], "zh_female_vv_uranus_bigtts");
        assert_eq!(json["audio"]["encoding"], "mp3");
        assert_eq!(json["audio"]["speed_ratio"], 1.0);
        assert_eq!(json["request"]["text"], "走过路过");
        assert_eq!(json["request"]["text_type"], "plain");
        assert_eq!(json["request"]["operation"], "query");
        // Fresh reqid per call.
        assert!(json["request"]["reqid"].as_str().unwrap().len() >= 32);
    }

    #[tokio::test]
    async fn pre_cancelled_token_aborts_before_the_dial() {
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = service()
            .synthesize(&cancel, "text", "p1_sunny_boy_00000000", "sunny_boy")
            .await
            .unwrap_err();
        assert!(matches!(err, TtsError::Cancelled));
    }
}
