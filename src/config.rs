use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    // Reproducción
    pub default_volume: f32,
    pub max_queue_size: usize,
    pub history_capacity: usize,

    // Desconexión por inactividad
    pub idle_timeout_secs: u64, // En segundos

    // Resolución de pistas
    pub resolver_concurrency: usize,
    pub ytdlp_path: Option<PathBuf>,
}

impl Config {
    pub fn load() -> Result<Self> {
        dotenvy::dotenv().ok();

        let config = Self {
            // Reproducción
            default_volume: std::env::var("DEFAULT_VOLUME")
                .unwrap_or_else(|_| "1.0".to_string())
                .parse()?,
            max_queue_size: std::env::var("MAX_QUEUE_SIZE")
                .unwrap_or_else(|_| "1000".to_string())
                .parse()?,
            history_capacity: std::env::var("HISTORY_CAPACITY")
                .unwrap_or_else(|_| "50".to_string())
                .parse()?,

            // Inactividad
            idle_timeout_secs: std::env::var("IDLE_TIMEOUT_SECS")
                .unwrap_or_else(|_| "120".to_string())
                .parse()?,

            // Resolución
            resolver_concurrency: match std::env::var("RESOLVER_CONCURRENCY") {
                Ok(val) if !val.trim().is_empty() => val.parse()?,
                _ => num_cpus::get().min(4),
            },
            ytdlp_path: std::env::var("YTDLP_PATH")
                .ok()
                .map(|raw| raw.trim().trim_matches('"').to_string())
                .filter(|s| !s.is_empty())
                .map(PathBuf::from),
        };

        config.validate()?;

        Ok(config)
    }

    /// Duración del temporizador de desconexión por inactividad.
    pub fn idle_timeout(&self) -> Duration {
        Duration::from_secs(self.idle_timeout_secs)
    }

    /// Comprueba que los valores de configuración sean coherentes.
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=1.0).contains(&self.default_volume) {
            anyhow::bail!(
                "Default volume must be between 0.0 and 1.0, got: {}",
                self.default_volume
            );
        }

        if self.max_queue_size == 0 {
            anyhow::bail!("Max queue size must be greater than 0");
        }

        if self.history_capacity == 0 {
            anyhow::bail!("History capacity must be greater than 0");
        }

        if self.idle_timeout_secs == 0 {
            anyhow::bail!("Idle timeout must be greater than 0");
        }

        if self.resolver_concurrency == 0 {
            anyhow::bail!("Resolver concurrency must be greater than 0");
        }

        Ok(())
    }

    /// Resumen de la configuración activa, apto para logs.
    pub fn summary(&self) -> String {
        format!(
            "Config Summary:\n  \
            Playback: {}% vol, {} queue, {} history\n  \
            Idle: disconnect after {}s\n  \
            Resolver: {} concurrent lookups, yt-dlp: {}",
            (self.default_volume * 100.0) as u32,
            self.max_queue_size,
            self.history_capacity,
            self.idle_timeout_secs,
            self.resolver_concurrency,
            self.ytdlp_path
                .as_ref()
                .map_or("PATH".to_string(), |p| p.display().to_string()),
        )
    }
}

/// Valores por defecto cuando no hay variables de entorno.
impl Default for Config {
    fn default() -> Self {
        Self {
            default_volume: 1.0,
            max_queue_size: 1000,
            history_capacity: 50,
            idle_timeout_secs: 120,
            resolver_concurrency: num_cpus::get().min(4),
            ytdlp_path: None,
        }
    }
}
