use std::path::PathBuf;

use async_process::Command;
use async_trait::async_trait;
use parking_lot::Mutex;
use regex::Regex;
use tokio::sync::Semaphore;
use tracing::{debug, info, warn};

use super::{InfoExtractor, MediaInfo};
use crate::config::Config;
use crate::error::ExtractError;

/// Extractor de metadata respaldado por el binario `yt-dlp`.
///
/// Cada consulta lanza un proceso con `--dump-single-json`, así que
/// tanto las pistas sueltas como las búsquedas y playlists llegan en un
/// solo documento (estas últimas con `entries`). Un semáforo limita los
/// procesos concurrentes para no gatillar rate limiting.
pub struct YtDlpExtractor {
    configured_path: Option<PathBuf>,
    binary: Mutex<Option<PathBuf>>,
    limiter: Semaphore,
}

impl YtDlpExtractor {
    pub fn new(config: &Config) -> Self {
        Self {
            configured_path: config.ytdlp_path.clone(),
            binary: Mutex::new(None),
            limiter: Semaphore::new(config.resolver_concurrency.max(1)),
        }
    }

    /// Ruta al binario, resuelta una sola vez y cacheada.
    ///
    /// Orden: ruta configurada, después el PATH, y como último recurso
    /// el nombre pelado para que lo resuelva el sistema.
    fn binary_path(&self) -> PathBuf {
        let mut cached = self.binary.lock();
        if let Some(path) = cached.as_ref() {
            return path.clone();
        }

        let path = self
            .configured_path
            .clone()
            .or_else(find_in_path)
            .unwrap_or_else(|| PathBuf::from("yt-dlp"));

        info!("🔧 Usando yt-dlp en: {}", path.display());
        *cached = Some(path.clone());
        path
    }
}

#[async_trait]
impl InfoExtractor for YtDlpExtractor {
    async fn extract(&self, query: &str) -> Result<MediaInfo, ExtractError> {
        let _permit = self
            .limiter
            .acquire()
            .await
            .map_err(|_| ExtractError::new("el limitador de yt-dlp está cerrado"))?;

        let binary = self.binary_path();
        debug!("🔎 yt-dlp ({}) <- {query}", binary.display());

        let output = Command::new(&binary)
            .args(&[
                "--dump-single-json",
                "--no-warnings",
                "--quiet",
                "--no-playlist",
                "-f",
                "bestaudio/best",
                "--default-search",
                "scsearch1",
                "--source-address",
                "0.0.0.0",
                query,
            ])
            .output()
            .await
            .map_err(|e| ExtractError::new(format!("no se pudo ejecutar yt-dlp: {e}")))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            warn!("⚠️ yt-dlp falló para '{query}': {}", stderr.trim());

            let mut error = ExtractError::new(format!("yt-dlp error: {}", stderr.trim()));
            if let Some(id) = recover_track_id(&stderr) {
                debug!("🔁 Id {id} encontrado en el stderr de yt-dlp");
                error = error.with_recovered_id(id);
            }
            return Err(error);
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        serde_json::from_str(stdout.trim())
            .map_err(|e| ExtractError::new(format!("respuesta de yt-dlp ilegible: {e}")))
    }
}

/// Los errores de la API de SoundCloud citan la URI de la pista con
/// percent-encoding; de ahí se rescata un id para reintentar.
fn recover_track_id(stderr: &str) -> Option<String> {
    let uri_regex = Regex::new(r"soundcloud%3Atracks%3A(\d+)").ok()?;
    uri_regex.captures(stderr).map(|c| c[1].to_string())
}

/// Busca yt-dlp (o yt-dlp.exe) en los directorios del PATH.
fn find_in_path() -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        for name in ["yt-dlp", "yt-dlp.exe"] {
            let candidate = dir.join(name);
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}
