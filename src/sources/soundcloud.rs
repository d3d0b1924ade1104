use std::borrow::Cow;
use std::cmp::Ordering;
use std::collections::{HashSet, VecDeque};

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;
use url::Url;

use super::{FormatInfo, InfoExtractor, MediaInfo, TrackResolver, YtDlpExtractor};
use crate::config::Config;
use crate::error::{ExtractError, ResolveError};
use crate::track::Track;

/// Resolver de pistas de SoundCloud montado sobre un extractor.
///
/// Acepta lo que sea que pegue el usuario: URLs de pista, URLs con
/// percent-encoding anidado (embeds, enlaces de la API), URIs
/// `soundcloud:tracks:<id>` o texto libre. Cuando el extractor falla,
/// reintenta con consultas alternativas derivadas del id de la pista,
/// incluso si ese id recién aparece dentro del propio error.
pub struct SoundCloudResolver<E = YtDlpExtractor> {
    extractor: E,
}

impl SoundCloudResolver {
    pub fn new(config: &Config) -> Self {
        Self {
            extractor: YtDlpExtractor::new(config),
        }
    }
}

impl<E: InfoExtractor> SoundCloudResolver<E> {
    /// Monta el resolver sobre un extractor arbitrario (tests).
    pub fn with_extractor(extractor: E) -> Self {
        Self { extractor }
    }

    /// Recorre los candidatos en orden hasta que alguno devuelva un
    /// documento utilizable.
    ///
    /// Un error con id recuperado agrega el trío de consultas de ese id
    /// a la lista maestra y vuelve a encolar todo lo no intentado; el
    /// conjunto `attempted` garantiza una sola ejecución por consulta.
    async fn run_worklist(
        &self,
        mut master: Vec<Candidate>,
        mut seen: HashSet<String>,
    ) -> Result<MediaInfo, ResolveError> {
        let mut worklist: VecDeque<Candidate> = master.iter().cloned().collect();
        let mut attempted: HashSet<String> = HashSet::new();
        let mut last_error: Option<ExtractError> = None;

        while let Some(candidate) = worklist.pop_front() {
            let query = candidate.query();
            if !attempted.insert(query.clone()) {
                continue;
            }

            debug!("🔎 Probando candidato SoundCloud: {query}");
            let mut info = match self.extractor.extract(&query).await {
                Ok(info) => info,
                Err(error) => {
                    if let Some(id) = error.recovered_track_id.as_deref() {
                        debug!("🔁 Id {id} rescatado del error, armando reintentos");
                        push_id_candidates(&mut master, &mut seen, id);
                        for extra in &master {
                            if !attempted.contains(&extra.query()) {
                                worklist.push_back(extra.clone());
                            }
                        }
                    }
                    last_error = Some(error);
                    continue;
                }
            };

            if let Some(entries) = info.entries.take() {
                for entry in entries.into_iter().flatten() {
                    if let Some(resolved) = self.resolve_entry(entry).await {
                        return Ok(resolved);
                    }
                }
                continue;
            }

            return Ok(info);
        }

        match last_error {
            Some(error) => Err(ResolveError::Exhausted(error)),
            None => Err(ResolveError::NoResults),
        }
    }

    /// Convierte una entrada de búsqueda o playlist en su documento
    /// final, consultando la API por id cuando se puede.
    async fn resolve_entry(&self, entry: MediaInfo) -> Option<MediaInfo> {
        let mut urls: Vec<String> = Vec::new();

        if let Some(id) = entry.id.as_deref() {
            if !id.is_empty() && id.chars().all(|c| c.is_ascii_digit()) {
                urls.push(format!("https://api.soundcloud.com/tracks/{id}"));
            }
        }

        if let Some(entry_url) = entry.url.as_deref() {
            let decoded = urlencoding::decode(entry_url)
                .map(Cow::into_owned)
                .unwrap_or_else(|_| entry_url.to_string());
            if let Some(id) = capture_track_id(&decoded) {
                urls.push(format!("https://api.soundcloud.com/tracks/{id}"));
            }
            if entry_url.starts_with("http://") || entry_url.starts_with("https://") {
                urls.push(entry_url.to_string());
            }
        }

        for url in urls {
            debug!("🔎 Resolviendo entrada vía {url}");
            if let Ok(info) = self.extractor.extract(&url).await {
                return Some(info);
            }
        }

        // Una entrada que ya trae formats sirve tal cual
        if entry.formats.as_ref().is_some_and(|f| !f.is_empty()) {
            return Some(entry);
        }

        None
    }
}

#[async_trait]
impl<E: InfoExtractor> TrackResolver for SoundCloudResolver<E> {
    async fn resolve(&self, query: &str) -> Result<Track, ResolveError> {
        let raw = query.trim();
        if raw.is_empty() {
            return Err(ResolveError::EmptyQuery);
        }

        let search = fully_decode(raw);

        let mut master: Vec<Candidate> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();

        if let Some(id) = extract_track_id(&search) {
            push_id_candidates(&mut master, &mut seen, &id);
        } else if is_http_url(&search) {
            push_candidate(&mut master, &mut seen, Candidate::Direct(search.clone()));
        } else {
            push_candidate(&mut master, &mut seen, Candidate::TextSearch(search.clone()));
        }

        debug!("🔎 Candidatos para '{raw}': {master:?}");

        let info = self.run_worklist(master, seen).await?;
        into_track(info, &search)
    }
}

/// Una consulta candidata del protocolo de reintentos.
#[derive(Debug, Clone, PartialEq, Eq)]
enum Candidate {
    /// Consulta directa a la API pública por id.
    ApiUrl(String),
    /// Búsqueda del id pelado.
    IdSearch(String),
    /// Búsqueda de "soundcloud track <id>".
    IdTrackSearch(String),
    /// URL http(s) tal cual quedó tras decodificar.
    Direct(String),
    /// Búsqueda de texto libre.
    TextSearch(String),
}

impl Candidate {
    /// La consulta literal que recibe el extractor.
    fn query(&self) -> String {
        match self {
            Candidate::ApiUrl(id) => format!("https://api.soundcloud.com/tracks/{id}"),
            Candidate::IdSearch(id) => format!("scsearch1:{id}"),
            Candidate::IdTrackSearch(id) => format!("scsearch1:soundcloud track {id}"),
            Candidate::Direct(url) => url.clone(),
            Candidate::TextSearch(text) => format!("scsearch1:{text}"),
        }
    }
}

fn push_candidate(master: &mut Vec<Candidate>, seen: &mut HashSet<String>, candidate: Candidate) {
    if seen.insert(candidate.query()) {
        master.push(candidate);
    }
}

/// El trío de consultas que se deriva de un id: API primero, después
/// las dos búsquedas de respaldo.
fn push_id_candidates(master: &mut Vec<Candidate>, seen: &mut HashSet<String>, id: &str) {
    push_candidate(master, seen, Candidate::ApiUrl(id.to_string()));
    push_candidate(master, seen, Candidate::IdSearch(id.to_string()));
    push_candidate(master, seen, Candidate::IdTrackSearch(id.to_string()));
}

/// Decodifica percent-encoding hasta el punto fijo: los embeds y los
/// enlaces de la API anidan varias capas.
fn fully_decode(query: &str) -> String {
    let mut current = query.to_string();
    loop {
        match urlencoding::decode(&current) {
            Ok(decoded) => {
                if decoded == current {
                    return current;
                }
                current = decoded.into_owned();
            }
            // Bytes que no son UTF-8 válido: se queda como está
            Err(_) => return current,
        }
    }
}

/// Saca un id numérico de pista de una consulta ya decodificada:
/// primero la URI `soundcloud:tracks:<id>` (con o sin prefijo),
/// después la cola de una URL de la API.
fn extract_track_id(search: &str) -> Option<String> {
    if let Some(id) = capture_track_id(search) {
        return Some(id);
    }

    if let Some(tail) = search.strip_prefix("https://api.soundcloud.com/tracks/") {
        let tail = tail.rsplit('/').next().unwrap_or(tail);
        if !tail.is_empty() && tail.chars().all(|c| c.is_ascii_digit()) {
            return Some(tail.to_string());
        }
    }

    None
}

fn capture_track_id(text: &str) -> Option<String> {
    let id_regex = Regex::new(r"(?:soundcloud:)?tracks?:(\d+)").ok()?;
    id_regex.captures(text).map(|c| c[1].to_string())
}

/// Una URL http(s) bien formada va directo al extractor; cualquier
/// otra cosa se trata como texto de búsqueda.
fn is_http_url(value: &str) -> bool {
    (value.starts_with("http://") || value.starts_with("https://"))
        && Url::parse(value).is_ok()
}

/// Arma la [`Track`] final a partir del documento de metadata.
///
/// El stream directo vale solo si no está vacío y no es una URI
/// `soundcloud:` (esas no las puede abrir ffmpeg); si no hay, se elige
/// el mejor formato de la lista.
fn into_track(info: MediaInfo, search: &str) -> Result<Track, ResolveError> {
    let mut stream_url = info.url.clone().filter(|u| is_playable_stream(u));

    if stream_url.is_none() {
        let formats = info.formats.as_deref().unwrap_or(&[]);
        if formats.is_empty() {
            return Err(ResolveError::NoPlayableStream);
        }
        stream_url = best_format(formats)
            .and_then(|f| f.url.clone())
            .filter(|u| is_playable_stream(u));
    }

    let Some(stream_url) = stream_url else {
        return Err(ResolveError::NoPlayableStream);
    };

    let title = info
        .title
        .unwrap_or_else(|| "SoundCloud track".to_string());
    let page_url = info
        .webpage_url
        .filter(|u| !u.is_empty())
        .or_else(|| info.original_url.filter(|u| !u.is_empty()))
        .unwrap_or_else(|| search.to_string());

    Ok(Track::new(title, stream_url, page_url))
}

fn is_playable_stream(url: &str) -> bool {
    !url.is_empty() && !url.starts_with("soundcloud:")
}

/// El mejor formato según (preference, protocolo, abr); en empate gana
/// el primero de la lista.
fn best_format(formats: &[FormatInfo]) -> Option<&FormatInfo> {
    formats.iter().fold(None, |best, format| match best {
        None => Some(format),
        Some(current) => {
            if compare_keys(format_key(format), format_key(current)) == Ordering::Greater {
                Some(format)
            } else {
                Some(current)
            }
        }
    })
}

fn format_key(format: &FormatInfo) -> (f64, u8, f64) {
    (
        format.preference.unwrap_or(0.0),
        protocol_score(format.protocol.as_deref()),
        format.abr.unwrap_or(0.0),
    )
}

/// ffmpeg se lleva mejor con streams progresivos que con HLS.
fn protocol_score(protocol: Option<&str>) -> u8 {
    match protocol.unwrap_or("") {
        "http" | "https" | "progressive" => 3,
        "hls" | "m3u8" | "m3u8_native" => 2,
        _ => 1,
    }
}

fn compare_keys(a: (f64, u8, f64), b: (f64, u8, f64)) -> Ordering {
    a.0.total_cmp(&b.0)
        .then(a.1.cmp(&b.1))
        .then(a.2.total_cmp(&b.2))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sources::MockInfoExtractor;
    use mockall::predicate::eq;
    use mockall::Sequence;
    use pretty_assertions::assert_eq;

    fn stream_info(title: &str, stream: &str, page: &str) -> MediaInfo {
        MediaInfo {
            title: Some(title.to_string()),
            url: Some(stream.to_string()),
            webpage_url: Some(page.to_string()),
            ..MediaInfo::default()
        }
    }

    fn format(url: &str, protocol: &str, preference: Option<f64>, abr: Option<f64>) -> FormatInfo {
        FormatInfo {
            url: Some(url.to_string()),
            protocol: Some(protocol.to_string()),
            preference,
            abr,
        }
    }

    #[test]
    fn test_fully_decode_reaches_fixed_point() {
        assert_eq!(
            fully_decode("https%253A%252F%252Fsoundcloud.com%252Fx"),
            "https://soundcloud.com/x"
        );
        assert_eq!(fully_decode("hola mundo"), "hola mundo");
        // Un % suelto no es un escape y no debe romper nada
        assert_eq!(fully_decode("100%"), "100%");
    }

    #[test]
    fn test_extract_track_id_variants() {
        assert_eq!(
            extract_track_id("soundcloud:tracks:123").as_deref(),
            Some("123")
        );
        assert_eq!(extract_track_id("tracks:456").as_deref(), Some("456"));
        assert_eq!(extract_track_id("track:789").as_deref(), Some("789"));
        assert_eq!(
            extract_track_id("https://api.soundcloud.com/tracks/321").as_deref(),
            Some("321")
        );
        assert_eq!(
            extract_track_id("https://api.soundcloud.com/tracks/abc"),
            None
        );
        assert_eq!(extract_track_id("https://soundcloud.com/a/b"), None);
        assert_eq!(extract_track_id("una canción cualquiera"), None);
    }

    #[tokio::test]
    async fn test_text_query_becomes_single_search_candidate() {
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("scsearch1:nightcore lluvia"))
            .times(1)
            .returning(|_| {
                Ok(stream_info(
                    "Lluvia",
                    "https://cdn.example/lluvia.mp3",
                    "https://soundcloud.com/x/lluvia",
                ))
            });

        let resolver = SoundCloudResolver::with_extractor(extractor);
        let track = resolver.resolve("  nightcore lluvia  ").await.unwrap();

        assert_eq!(track.title, "Lluvia");
        assert_eq!(track.stream_url, "https://cdn.example/lluvia.mp3");
    }

    #[tokio::test]
    async fn test_http_url_goes_directly_to_extractor() {
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("https://soundcloud.com/artista/cancion"))
            .times(1)
            .returning(|_| {
                Ok(stream_info(
                    "Canción",
                    "https://cdn.example/s.mp3",
                    "https://soundcloud.com/artista/cancion",
                ))
            });

        let resolver = SoundCloudResolver::with_extractor(extractor);
        let track = resolver
            .resolve("https://soundcloud.com/artista/cancion")
            .await
            .unwrap();

        assert_eq!(track.page_url, "https://soundcloud.com/artista/cancion");
    }

    #[tokio::test]
    async fn test_percent_encoded_url_is_decoded_first() {
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("https://soundcloud.com/a/b"))
            .times(1)
            .returning(|_| {
                Ok(stream_info(
                    "B",
                    "https://cdn.example/b.mp3",
                    "https://soundcloud.com/a/b",
                ))
            });

        let resolver = SoundCloudResolver::with_extractor(extractor);
        resolver
            .resolve("https%3A%2F%2Fsoundcloud.com%2Fa%2Fb")
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_malformed_url_falls_back_to_search() {
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("scsearch1:https://"))
            .times(1)
            .returning(|_| {
                Ok(stream_info(
                    "Algo",
                    "https://cdn.example/algo.mp3",
                    "https://soundcloud.com/x/algo",
                ))
            });

        let resolver = SoundCloudResolver::with_extractor(extractor);
        resolver.resolve("https://").await.unwrap();
    }

    #[tokio::test]
    async fn test_track_id_builds_retry_ladder_in_order() {
        let mut seq = Sequence::new();
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("https://api.soundcloud.com/tracks/123"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ExtractError::new("HTTP 404")));
        extractor
            .expect_extract()
            .with(eq("scsearch1:123"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ExtractError::new("sin resultados")));
        extractor
            .expect_extract()
            .with(eq("scsearch1:soundcloud track 123"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(stream_info(
                    "Rescatada",
                    "https://cdn.example/r.mp3",
                    "https://soundcloud.com/x/r",
                ))
            });

        let resolver = SoundCloudResolver::with_extractor(extractor);
        let track = resolver.resolve("soundcloud:tracks:123").await.unwrap();

        assert_eq!(track.title, "Rescatada");
    }

    #[tokio::test]
    async fn test_recovered_id_from_error_spawns_retries() {
        let mut seq = Sequence::new();
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("scsearch1:tema perdido"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Err(ExtractError::new("HTTP 403 en soundcloud%3Atracks%3A555")
                    .with_recovered_id("555"))
            });
        extractor
            .expect_extract()
            .with(eq("https://api.soundcloud.com/tracks/555"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(stream_info(
                    "Tema perdido",
                    "https://cdn.example/555.mp3",
                    "https://soundcloud.com/x/555",
                ))
            });

        let resolver = SoundCloudResolver::with_extractor(extractor);
        let track = resolver.resolve("tema perdido").await.unwrap();

        assert_eq!(track.title, "Tema perdido");
    }

    #[tokio::test]
    async fn test_each_candidate_runs_at_most_once() {
        // La consulta ya es la URL de la API; el error recupera el mismo
        // id, así que el trío se deduplica y nada corre dos veces
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("https://api.soundcloud.com/tracks/88"))
            .times(1)
            .returning(|_| Err(ExtractError::new("HTTP 500").with_recovered_id("88")));
        extractor
            .expect_extract()
            .with(eq("scsearch1:88"))
            .times(1)
            .returning(|_| Err(ExtractError::new("nada")));
        extractor
            .expect_extract()
            .with(eq("scsearch1:soundcloud track 88"))
            .times(1)
            .returning(|_| Err(ExtractError::new("tampoco")));

        let resolver = SoundCloudResolver::with_extractor(extractor);
        let error = resolver
            .resolve("https://api.soundcloud.com/tracks/88")
            .await
            .unwrap_err();

        match error {
            ResolveError::Exhausted(cause) => assert_eq!(cause.message, "tampoco"),
            other => panic!("se esperaba Exhausted, llegó {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_empty_query_is_rejected_without_extraction() {
        let extractor = MockInfoExtractor::new();
        let resolver = SoundCloudResolver::with_extractor(extractor);

        assert!(matches!(
            resolver.resolve("   ").await,
            Err(ResolveError::EmptyQuery)
        ));
    }

    #[tokio::test]
    async fn test_search_result_entry_resolved_by_id() {
        let mut seq = Sequence::new();
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("scsearch1:lofi"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(MediaInfo {
                    entries: Some(vec![
                        None,
                        Some(MediaInfo {
                            id: Some("77".to_string()),
                            ..MediaInfo::default()
                        }),
                    ]),
                    ..MediaInfo::default()
                })
            });
        extractor
            .expect_extract()
            .with(eq("https://api.soundcloud.com/tracks/77"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(stream_info(
                    "Lofi 77",
                    "https://cdn.example/77.mp3",
                    "https://soundcloud.com/x/77",
                ))
            });

        let resolver = SoundCloudResolver::with_extractor(extractor);
        let track = resolver.resolve("lofi").await.unwrap();

        assert_eq!(track.title, "Lofi 77");
    }

    #[tokio::test]
    async fn test_entry_url_with_encoded_uri_then_raw_url() {
        let mut seq = Sequence::new();
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("scsearch1:remix"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(MediaInfo {
                    entries: Some(vec![Some(MediaInfo {
                        url: Some(
                            "https://soundcloud.com/x/remix?in=soundcloud%3Atracks%3A42"
                                .to_string(),
                        ),
                        ..MediaInfo::default()
                    })]),
                    ..MediaInfo::default()
                })
            });
        // Primero el id sacado de la URL decodificada, después la URL cruda
        extractor
            .expect_extract()
            .with(eq("https://api.soundcloud.com/tracks/42"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| Err(ExtractError::new("HTTP 404")));
        extractor
            .expect_extract()
            .with(eq("https://soundcloud.com/x/remix?in=soundcloud%3Atracks%3A42"))
            .times(1)
            .in_sequence(&mut seq)
            .returning(|_| {
                Ok(stream_info(
                    "Remix",
                    "https://cdn.example/remix.mp3",
                    "https://soundcloud.com/x/remix",
                ))
            });

        let resolver = SoundCloudResolver::with_extractor(extractor);
        let track = resolver.resolve("remix").await.unwrap();

        assert_eq!(track.title, "Remix");
    }

    #[tokio::test]
    async fn test_entry_with_formats_serves_as_fallback() {
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("scsearch1:mixtape"))
            .times(1)
            .returning(|_| {
                Ok(MediaInfo {
                    entries: Some(vec![Some(MediaInfo {
                        title: Some("Mixtape".to_string()),
                        url: Some("soundcloud:tracks:9:stream".to_string()),
                        formats: Some(vec![format(
                            "https://cdn.example/mix.mp3",
                            "https",
                            None,
                            Some(128.0),
                        )]),
                        webpage_url: Some("https://soundcloud.com/x/mix".to_string()),
                        ..MediaInfo::default()
                    })]),
                    ..MediaInfo::default()
                })
            });

        let resolver = SoundCloudResolver::with_extractor(extractor);
        let track = resolver.resolve("mixtape").await.unwrap();

        // El url directo es una URI soundcloud:, así que manda el formato
        assert_eq!(track.stream_url, "https://cdn.example/mix.mp3");
    }

    #[tokio::test]
    async fn test_exhausted_keeps_last_error() {
        let mut extractor = MockInfoExtractor::new();
        extractor
            .expect_extract()
            .with(eq("scsearch1:nada de nada"))
            .times(1)
            .returning(|_| Err(ExtractError::new("HTTP 503")));

        let resolver = SoundCloudResolver::with_extractor(extractor);
        let error = resolver.resolve("nada de nada").await.unwrap_err();

        match error {
            ResolveError::Exhausted(cause) => assert_eq!(cause.message, "HTTP 503"),
            other => panic!("se esperaba Exhausted, llegó {other:?}"),
        }
    }

    #[test]
    fn test_progressive_protocol_beats_higher_bitrate_hls() {
        let formats = vec![
            format("https://cdn.example/hls", "hls", None, Some(999.0)),
            format("https://cdn.example/http", "http", None, Some(64.0)),
        ];
        let best = best_format(&formats).unwrap();
        assert_eq!(best.url.as_deref(), Some("https://cdn.example/http"));
    }

    #[test]
    fn test_preference_outranks_protocol() {
        let formats = vec![
            format("https://cdn.example/https", "https", Some(-1.0), Some(128.0)),
            format("https://cdn.example/hls", "hls", Some(0.0), Some(10.0)),
        ];
        let best = best_format(&formats).unwrap();
        assert_eq!(best.url.as_deref(), Some("https://cdn.example/hls"));
    }

    #[test]
    fn test_bitrate_breaks_protocol_ties() {
        let formats = vec![
            format("https://cdn.example/a", "https", None, Some(64.0)),
            format("https://cdn.example/b", "https", None, Some(128.0)),
        ];
        let best = best_format(&formats).unwrap();
        assert_eq!(best.url.as_deref(), Some("https://cdn.example/b"));
    }

    #[test]
    fn test_full_tie_keeps_first_format() {
        let formats = vec![
            format("https://cdn.example/primero", "https", None, Some(128.0)),
            format("https://cdn.example/segundo", "https", None, Some(128.0)),
        ];
        let best = best_format(&formats).unwrap();
        assert_eq!(best.url.as_deref(), Some("https://cdn.example/primero"));
    }

    #[test]
    fn test_unknown_protocol_scores_lowest() {
        let formats = vec![
            format("https://cdn.example/raro", "rtmp", None, Some(320.0)),
            format("https://cdn.example/hls", "m3u8_native", None, Some(64.0)),
        ];
        let best = best_format(&formats).unwrap();
        assert_eq!(best.url.as_deref(), Some("https://cdn.example/hls"));
    }

    #[test]
    fn test_into_track_rejects_soundcloud_uris_everywhere() {
        // Stream directo con URI opaca y sin formats: no hay nada que abrir
        let info = MediaInfo {
            url: Some("soundcloud:tracks:1:preview".to_string()),
            ..MediaInfo::default()
        };
        assert!(matches!(
            into_track(info, "x"),
            Err(ResolveError::NoPlayableStream)
        ));

        // Formats cuyo mejor candidato también es una URI opaca
        let info = MediaInfo {
            formats: Some(vec![FormatInfo {
                url: Some("soundcloud:tracks:1:hq".to_string()),
                protocol: Some("https".to_string()),
                ..FormatInfo::default()
            }]),
            ..MediaInfo::default()
        };
        assert!(matches!(
            into_track(info, "x"),
            Err(ResolveError::NoPlayableStream)
        ));
    }

    #[test]
    fn test_into_track_title_and_page_fallbacks() {
        let info = MediaInfo {
            url: Some("https://cdn.example/s.mp3".to_string()),
            original_url: Some("https://soundcloud.com/orig".to_string()),
            webpage_url: Some(String::new()),
            ..MediaInfo::default()
        };
        let track = into_track(info, "busqueda original").unwrap();
        assert_eq!(track.title, "SoundCloud track");
        assert_eq!(track.page_url, "https://soundcloud.com/orig");

        let info = MediaInfo {
            url: Some("https://cdn.example/s.mp3".to_string()),
            ..MediaInfo::default()
        };
        let track = into_track(info, "busqueda original").unwrap();
        assert_eq!(track.page_url, "busqueda original");
    }
}
