pub mod soundcloud;
pub mod ytdlp;

use async_trait::async_trait;
use serde::Deserialize;

pub use soundcloud::SoundCloudResolver;
pub use ytdlp::YtDlpExtractor;

use crate::error::{ExtractError, ResolveError};
use crate::track::Track;

/// Convierte lo que escribió el usuario en una pista reproducible.
#[async_trait]
pub trait TrackResolver: Send + Sync {
    /// Resuelve una búsqueda o un enlace en una [`Track`] con stream.
    async fn resolve(&self, query: &str) -> Result<Track, ResolveError>;
}

/// La capa que habla con el backend de extracción (yt-dlp).
///
/// Va separada del resolver para poder simularla en los tests: el
/// protocolo de reintentos se prueba sin lanzar ningún proceso.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait InfoExtractor: Send + Sync {
    /// Ejecuta una consulta (URL o `scsearch1:...`) y devuelve el
    /// documento de metadata que emitió el backend.
    async fn extract(&self, query: &str) -> Result<MediaInfo, ExtractError>;
}

/// Documento de metadata tal como lo emite yt-dlp.
///
/// Solo se declaran los campos que usa el resolver; el resto del JSON
/// se ignora. Todos son opcionales porque ningún extractor garantiza
/// el juego completo.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct MediaInfo {
    #[serde(default, deserialize_with = "id_as_string")]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    /// URL de stream directo, cuando el extractor ya eligió formato.
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub webpage_url: Option<String>,
    #[serde(default)]
    pub original_url: Option<String>,
    #[serde(default)]
    pub formats: Option<Vec<FormatInfo>>,
    /// Presente en búsquedas y playlists; puede traer huecos `null`.
    #[serde(default)]
    pub entries: Option<Vec<Option<MediaInfo>>>,
}

/// Un formato disponible dentro de un documento de metadata.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FormatInfo {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub protocol: Option<String>,
    #[serde(default)]
    pub preference: Option<f64>,
    #[serde(default)]
    pub abr: Option<f64>,
}

/// SoundCloud entrega ids numéricos y otros extractores los dan como
/// cadena; aquí se normalizan a cadena.
fn id_as_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: serde::Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
