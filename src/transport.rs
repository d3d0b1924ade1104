use anyhow::Result;
use async_trait::async_trait;

use crate::track::Track;

/// Conexión de voz de una sala, implementada por el bot anfitrión.
///
/// El núcleo nunca toca el gateway ni decodifica audio: pide reproducir
/// un stream y consulta el estado. El anfitrión debe entregar
/// exactamente una notificación de fin por cada `play` aceptado
/// (fin natural, `stop` o error), llamando a
/// [`Room::on_playback_complete`](crate::player::Room::on_playback_complete)
/// desde una tarea propia, nunca desde dentro de la llamada a `play`.
#[async_trait]
pub trait VoiceTransport: Send + Sync {
    /// Inicia la reproducción de la pista con el volumen dado (0.0-1.0).
    async fn play(&self, track: &Track, volume: f32) -> Result<()>;

    /// Detiene la reproducción en curso, si la hay.
    async fn stop(&self) -> Result<()>;

    async fn pause(&self) -> Result<()>;

    async fn resume(&self) -> Result<()>;

    /// Ajusta el volumen de la salida activa (0.0-1.0).
    async fn set_volume(&self, volume: f32) -> Result<()>;

    fn is_playing(&self) -> bool;

    fn is_paused(&self) -> bool;

    fn is_connected(&self) -> bool;

    /// Abandona el canal de voz.
    async fn disconnect(&self) -> Result<()>;
}

/// Canal de texto (u otro destino) donde la sala publica avisos.
#[async_trait]
pub trait NotificationSink: Send + Sync {
    /// Publica un mensaje de estado legible para humanos.
    async fn post(&self, message: &str) -> Result<()>;
}
