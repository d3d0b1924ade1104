use std::sync::{Arc, Weak};
use std::time::Duration;

use tokio::sync::Mutex;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

use crate::config::Config;
use crate::error::PlayerError;
use crate::player::queue::{LoopMode, TrackQueue};
use crate::player::RoomId;
use crate::track::Track;
use crate::transport::{NotificationSink, VoiceTransport};

/// Resultado de encolar una pista.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnqueueOutcome {
    /// La sala estaba libre y la reproducción arrancó de inmediato.
    Started,
    /// La pista quedó en espera en la posición dada (1-based).
    Queued(usize),
}

/// Copia del estado visible de una sala, para listados y embeds.
#[derive(Debug, Clone)]
pub struct RoomSnapshot {
    pub now_playing: Option<Track>,
    pub queue: Vec<Track>,
    /// Historial de reproducción, de la pista más antigua a la más reciente.
    pub history: Vec<Track>,
    pub loop_mode: LoopMode,
    pub stay_mode: bool,
    /// Volumen como porcentaje 0-100.
    pub volume: u8,
    pub idle_timer_armed: bool,
}

struct RoomState {
    queue: TrackQueue,
    now_playing: Option<Track>,
    stay_mode: bool,
    volume: f32,
    /// El transporte debe todavía una notificación de fin.
    completion_pending: bool,
    /// La próxima notificación de fin no debe avanzar la cola:
    /// la reproducción se cortó a propósito (stop o disconnect).
    suppress_completion: bool,
    idle_token: Option<CancellationToken>,
    notifier: Option<Arc<dyn NotificationSink>>,
}

impl RoomState {
    fn cancel_idle_timer(&mut self) {
        if let Some(token) = self.idle_token.take() {
            token.cancel();
        }
    }
}

/// Una sala de reproducción: cola, pista actual y temporizador de
/// inactividad, con todas las mutaciones serializadas por un mutex.
///
/// El transporte queda fijado al crear la sala. El destino de avisos se
/// puede reasignar en cualquier momento con [`Room::set_notifier`], igual
/// que el bot re-asocia el canal de texto en cada comando de play.
pub struct Room {
    id: RoomId,
    transport: Arc<dyn VoiceTransport>,
    idle_timeout: Duration,
    state: Mutex<RoomState>,
    self_ref: Weak<Room>,
}

impl Room {
    pub fn new(id: RoomId, transport: Arc<dyn VoiceTransport>, config: &Config) -> Arc<Self> {
        Arc::new_cyclic(|self_ref| Self {
            id,
            transport,
            idle_timeout: config.idle_timeout(),
            state: Mutex::new(RoomState {
                queue: TrackQueue::new(config.max_queue_size, config.history_capacity),
                now_playing: None,
                stay_mode: false,
                volume: config.default_volume,
                completion_pending: false,
                suppress_completion: false,
                idle_token: None,
                notifier: None,
            }),
            self_ref: self_ref.clone(),
        })
    }

    pub fn id(&self) -> RoomId {
        self.id
    }

    /// Asigna el destino de los avisos de la sala.
    pub async fn set_notifier(&self, sink: Arc<dyn NotificationSink>) {
        let mut state = self.state.lock().await;
        state.notifier = Some(sink);
    }

    /// Agrega una pista al final de la cola; si la sala está libre la
    /// reproducción arranca de inmediato.
    pub async fn enqueue(&self, track: Track) -> Result<EnqueueOutcome, PlayerError> {
        let mut state = self.state.lock().await;

        let position = state.queue.push(track)?;
        state.cancel_idle_timer();

        if self.transport.is_playing() || self.transport.is_paused() {
            return Ok(EnqueueOutcome::Queued(position));
        }

        match self.play_next(&mut state, None).await? {
            Some(_) => Ok(EnqueueOutcome::Started),
            // Sin transporte conectado la pista queda en espera
            None => Ok(EnqueueOutcome::Queued(position)),
        }
    }

    /// Notificación del transporte: la reproducción aceptada terminó,
    /// sea por fin natural, por un corte o por el error adjunto.
    ///
    /// Debe llegar exactamente una vez por cada `play` aceptado y desde
    /// una tarea ajena a la llamada a `play`.
    pub async fn on_playback_complete(&self, error: Option<anyhow::Error>) {
        let mut state = self.state.lock().await;
        state.completion_pending = false;

        let finished = state.now_playing.take();

        if let Some(e) = &error {
            error!("❌ Error de reproducción en la sala {}: {e:#}", self.id);
        }

        if state.suppress_completion {
            // El corte fue a propósito: no avanzar ni armar el temporizador
            state.suppress_completion = false;
            return;
        }

        // Una pista que terminó con error no se repite ni con LoopMode::One
        let replay = if error.is_none() { finished } else { None };

        if let Err(e) = self.play_next(&mut state, replay).await {
            error!("❌ La sala {} no pudo avanzar de pista: {e}", self.id);
        }
    }

    /// Salta la pista actual. El avance llega con la notificación de
    /// fin de la reproducción cortada, nunca desde aquí.
    pub async fn skip(&self) -> Result<Option<Track>, PlayerError> {
        let mut state = self.state.lock().await;

        if !self.transport.is_playing() {
            return Err(PlayerError::NothingPlaying);
        }

        self.transport.stop().await.map_err(PlayerError::Transport)?;

        // Vaciar el slot evita que LoopMode::One repita la pista saltada
        let skipped = state.now_playing.take();
        if let Some(track) = &skipped {
            info!("⏭️ Pista saltada en la sala {}: {}", self.id, track.title);
        }

        Ok(skipped)
    }

    /// Detiene la reproducción y vacía la cola.
    ///
    /// El historial se conserva y no se arma ningún temporizador de
    /// inactividad nuevo: un stop explícito no es inactividad.
    pub async fn stop(&self) {
        let mut state = self.state.lock().await;

        state.queue.clear();
        state.now_playing = None;

        if state.completion_pending {
            state.suppress_completion = true;
        }

        if self.transport.is_playing() || self.transport.is_paused() {
            if let Err(e) = self.transport.stop().await {
                warn!(
                    "⚠️ El transporte de la sala {} no se detuvo limpiamente: {e}",
                    self.id
                );
            }
        }

        info!("⏹️ Reproducción detenida en la sala {}", self.id);
    }

    pub async fn pause(&self) -> Result<(), PlayerError> {
        let _guard = self.state.lock().await;

        if !self.transport.is_playing() {
            return Err(PlayerError::NothingPlaying);
        }

        self.transport.pause().await.map_err(PlayerError::Transport)?;
        info!("⏸️ Reproducción pausada en la sala {}", self.id);
        Ok(())
    }

    pub async fn resume(&self) -> Result<(), PlayerError> {
        let _guard = self.state.lock().await;

        if !self.transport.is_paused() {
            return Err(PlayerError::NothingPaused);
        }

        self.transport.resume().await.map_err(PlayerError::Transport)?;
        info!("▶️ Reproducción reanudada en la sala {}", self.id);
        Ok(())
    }

    pub async fn set_loop(&self, mode: LoopMode) {
        let mut state = self.state.lock().await;
        state.queue.set_loop_mode(mode);
    }

    /// Avanza al siguiente modo de repetición y lo devuelve.
    pub async fn cycle_loop(&self) -> LoopMode {
        let mut state = self.state.lock().await;
        state.queue.cycle_loop()
    }

    /// Activa o desactiva el modo de permanencia; activarlo cancela el
    /// temporizador de inactividad pendiente.
    pub async fn set_stay(&self, enabled: bool) {
        let mut state = self.state.lock().await;
        state.stay_mode = enabled;
        if enabled {
            state.cancel_idle_timer();
        }
        info!(
            "🛋️ Stay mode {} en la sala {}",
            if enabled { "activado" } else { "desactivado" },
            self.id
        );
    }

    pub async fn toggle_stay(&self) -> bool {
        let mut state = self.state.lock().await;
        let enabled = !state.stay_mode;
        state.stay_mode = enabled;
        if enabled {
            state.cancel_idle_timer();
        }
        info!(
            "🛋️ Stay mode {} en la sala {}",
            if enabled { "activado" } else { "desactivado" },
            self.id
        );
        enabled
    }

    /// Fija el volumen de la sala como porcentaje 0-100.
    ///
    /// Con una pista sonando o pausada el cambio se aplica al transporte
    /// de inmediato; si no, queda guardado para el próximo play.
    pub async fn set_volume(&self, percent: i64) -> Result<(), PlayerError> {
        if !(0..=100).contains(&percent) {
            return Err(PlayerError::InvalidVolume(percent));
        }

        let mut state = self.state.lock().await;
        state.volume = percent as f32 / 100.0;

        if self.transport.is_playing() || self.transport.is_paused() {
            self.transport
                .set_volume(state.volume)
                .await
                .map_err(PlayerError::Transport)?;
        }

        info!("🔊 Volumen de la sala {} ajustado a {}%", self.id, percent);
        Ok(())
    }

    /// Volumen actual como porcentaje 0-100.
    pub async fn volume(&self) -> u8 {
        let state = self.state.lock().await;
        (state.volume * 100.0).round() as u8
    }

    /// Mueve una pista de la cola (posiciones 1-based; el destino se
    /// ajusta al rango). Devuelve la pista y su posición final.
    pub async fn move_track(&self, from: i64, to: i64) -> Result<(Track, usize), PlayerError> {
        let mut state = self.state.lock().await;
        state.queue.move_track(from, to)
    }

    /// Quita la pista en la posición 1-based dada y la devuelve.
    pub async fn remove_track(&self, index: i64) -> Result<Track, PlayerError> {
        let mut state = self.state.lock().await;
        state.queue.remove_track(index)
    }

    /// Mezcla la cola; devuelve cuántas pistas se mezclaron.
    pub async fn shuffle(&self) -> usize {
        let mut state = self.state.lock().await;
        state.queue.shuffle()
    }

    /// Saca la sala del canal de voz a petición del anfitrión.
    ///
    /// Cancela el temporizador, descarta la pista actual y suprime la
    /// notificación de fin que el corte genera. La cola queda intacta a
    /// la espera de una reconexión.
    pub async fn disconnect(&self) -> Result<(), PlayerError> {
        let mut state = self.state.lock().await;

        state.cancel_idle_timer();
        state.now_playing = None;
        if state.completion_pending {
            state.suppress_completion = true;
        }

        self.transport
            .disconnect()
            .await
            .map_err(PlayerError::Transport)?;

        info!("👋 Sala {} desconectada", self.id);
        Ok(())
    }

    pub async fn now_playing(&self) -> Option<Track> {
        self.state.lock().await.now_playing.clone()
    }

    pub async fn snapshot(&self) -> RoomSnapshot {
        let state = self.state.lock().await;
        RoomSnapshot {
            now_playing: state.now_playing.clone(),
            queue: state.queue.tracks().iter().cloned().collect(),
            history: state.queue.history().iter().cloned().collect(),
            loop_mode: state.queue.loop_mode(),
            stay_mode: state.stay_mode,
            volume: (state.volume * 100.0).round() as u8,
            idle_timer_armed: state.idle_token.is_some(),
        }
    }

    /// Avanza la reproducción: pide a la cola la próxima pista y se la
    /// entrega al transporte. `finished` es la pista que acaba de
    /// terminar sin error, candidata a repetirse con `LoopMode::One`.
    ///
    /// Si el transporte rechaza el play, la pista vuelve al frente de
    /// la cola y el intento aborta sin reintentos automáticos.
    async fn play_next(
        &self,
        state: &mut RoomState,
        finished: Option<Track>,
    ) -> Result<Option<Track>, PlayerError> {
        state.cancel_idle_timer();

        if !self.transport.is_connected() {
            state.now_playing = None;
            debug!("🔌 La sala {} no tiene transporte conectado", self.id);
            return Ok(None);
        }

        let Some(track) = state.queue.select_next(finished) else {
            state.now_playing = None;
            if !state.stay_mode {
                self.arm_idle_timer(state);
            }
            return Ok(None);
        };

        state.now_playing = Some(track.clone());

        if let Err(e) = self.transport.play(&track, state.volume).await {
            error!(
                "❌ No se pudo reproducir {} en la sala {}: {e:#}",
                track.title, self.id
            );
            state.now_playing = None;
            state.queue.push_front(track.clone());
            self.notify(
                state,
                &format!(
                    "No pude reproducir **{}**, la dejé al frente de la cola",
                    track.title
                ),
            )
            .await;
            return Err(PlayerError::Transport(e));
        }

        state.completion_pending = true;
        info!("🎵 Reproduciendo en la sala {}: {}", self.id, track.title);

        let announce = format!(
            "Reproduciendo **{}** 🎶{} ({})",
            track.title,
            state.queue.loop_mode().emoji(),
            track.page_url
        );
        self.notify(state, &announce).await;

        Ok(Some(track))
    }

    /// Programa la desconexión por inactividad, reemplazando cualquier
    /// temporizador anterior (nunca hay más de uno en vuelo).
    fn arm_idle_timer(&self, state: &mut RoomState) {
        state.cancel_idle_timer();

        let token = CancellationToken::new();
        state.idle_token = Some(token.clone());

        let room = self.self_ref.clone();
        let delay = self.idle_timeout;
        tokio::spawn(async move {
            tokio::select! {
                _ = token.cancelled() => return,
                _ = tokio::time::sleep(delay) => {}
            }
            if let Some(room) = room.upgrade() {
                room.idle_timer_fired(token).await;
            }
        });

        debug!(
            "⏲️ Temporizador de inactividad armado en la sala {} ({}s)",
            self.id,
            self.idle_timeout.as_secs()
        );
    }

    async fn idle_timer_fired(&self, token: CancellationToken) {
        let mut state = self.state.lock().await;

        // Una cancelación pudo colarse entre el sleep y la toma del lock
        if token.is_cancelled() {
            return;
        }
        state.idle_token = None;

        // La sala tiene que seguir igual de ociosa que cuando se armó
        if state.stay_mode || state.now_playing.is_some() || !state.queue.is_empty() {
            return;
        }
        if !self.transport.is_connected() {
            return;
        }

        if let Err(e) = self.transport.disconnect().await {
            warn!(
                "⚠️ No se pudo desconectar la sala {} por inactividad: {e}",
                self.id
            );
            return;
        }

        info!("👋 Sala {} desconectada por inactividad", self.id);
        self.notify(&state, "Me salí del canal de voz por inactividad 👋")
            .await;
    }

    async fn notify(&self, state: &RoomState, message: &str) {
        if let Some(sink) = &state.notifier {
            if let Err(e) = sink.post(message).await {
                warn!("⚠️ No se pudo publicar el aviso de la sala {}: {e}", self.id);
            }
        }
    }
}
