//! Motor de reproducción por salas para bots de música.
//!
//! La crate separa tres capas: el estado de reproducción por sala
//! ([`player`]), la resolución de búsquedas y enlaces de SoundCloud en
//! pistas con stream ([`sources`]) y los traits con los que se engancha
//! el host ([`transport`]). El host aporta el transporte de voz y el
//! destino de avisos; colas, repetición, volumen, reintentos de
//! extracción y la desconexión por inactividad viven acá.

pub mod config;
pub mod error;
pub mod player;
pub mod sources;
pub mod track;
pub mod transport;

pub use config::Config;
pub use error::{ExtractError, PlayerError, ResolveError};
pub use player::{
    EnqueueOutcome, LoopMode, PlayerManager, Room, RoomId, RoomSnapshot, TrackQueue,
};
pub use sources::{
    FormatInfo, InfoExtractor, MediaInfo, SoundCloudResolver, TrackResolver, YtDlpExtractor,
};
pub use track::Track;
pub use transport::{NotificationSink, VoiceTransport};
