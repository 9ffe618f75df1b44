//! Card service: fetch, normalize, pick a character, render.
//!
//! "No data" is an expected outcome, reported as
//! [`CardOutcome::NotAvailable`] so callers can show a friendly message.
//! Only internal faults (PNG encoding, a crashed render worker) are errors.

use std::fmt;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::assets::AssetResolver;
use crate::fetch::ProfileSource;
use crate::model::{Profile, Uid};
use crate::normalize::{NormalizeError, Normalizer};
use crate::render::{self, theme::CardTheme, RenderError};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Unavailable {
    /// Every provider failed or timed out.
    ProviderUnavailable,
    /// A payload arrived but no character list could be located in it.
    UnrecognizedSchema,
    /// The character list was present but empty.
    NoCharacters,
}

impl fmt::Display for Unavailable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Unavailable::ProviderUnavailable => {
                write!(f, "profile providers are unavailable, try again later")
            }
            Unavailable::UnrecognizedSchema => {
                write!(f, "provider response could not be understood")
            }
            Unavailable::NoCharacters => write!(f, "profile has no characters on display"),
        }
    }
}

#[derive(Debug)]
pub enum CardServiceError {
    Render(RenderError),
    Worker(tokio::task::JoinError),
}

impl fmt::Display for CardServiceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CardServiceError::Render(err) => write!(f, "{}", err),
            CardServiceError::Worker(err) => write!(f, "render worker failed: {}", err),
        }
    }
}

impl std::error::Error for CardServiceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            CardServiceError::Render(err) => Some(err),
            CardServiceError::Worker(err) => Some(err),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedCard {
    pub png: Vec<u8>,
    pub uid: u64,
    /// Index actually rendered, after clamping.
    pub character_index: usize,
    pub character_name: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CardOutcome {
    Ready(RenderedCard),
    NotAvailable(Unavailable),
}

pub struct CardService {
    source: Arc<dyn ProfileSource>,
    normalizer: Normalizer,
    resolver: Arc<AssetResolver>,
    theme: Arc<CardTheme>,
}

impl CardService {
    pub fn new(
        source: Arc<dyn ProfileSource>,
        normalizer: Normalizer,
        resolver: Arc<AssetResolver>,
        theme: CardTheme,
    ) -> Self {
        Self {
            source,
            normalizer,
            resolver,
            theme: Arc::new(theme),
        }
    }

    pub async fn get_profile(&self, uid: Uid, force_refresh: bool) -> Result<Profile, Unavailable> {
        let Some(payload) = self.source.fetch(uid, force_refresh).await else {
            return Err(Unavailable::ProviderUnavailable);
        };
        debug!(uid = %uid, source = %payload.source, cached = payload.from_cache, "Normalizing payload");
        match self.normalizer.normalize(&payload.body, uid) {
            Ok(profile) => Ok(profile),
            Err(NormalizeError::UnrecognizedSchema { .. }) => Err(Unavailable::UnrecognizedSchema),
        }
    }

    /// Render the card for `characters[character_index]`; an index past the
    /// end falls back to the first character.
    pub async fn get_card(
        &self,
        uid: Uid,
        character_index: usize,
        force_refresh: bool,
    ) -> Result<CardOutcome, CardServiceError> {
        let profile = match self.get_profile(uid, force_refresh).await {
            Ok(profile) => profile,
            Err(reason) => {
                info!(uid = %uid, reason = %reason, "Card not available");
                return Ok(CardOutcome::NotAvailable(reason));
            }
        };
        let Some((index, build)) = profile.character_or_first(character_index) else {
            info!(uid = %uid, "Profile has no characters");
            return Ok(CardOutcome::NotAvailable(Unavailable::NoCharacters));
        };
        if index != character_index {
            warn!(
                uid = %uid,
                requested = character_index,
                available = profile.characters.len(),
                "Character index out of range, using first character"
            );
        }

        let build = build.clone();
        let character_name = build.name.clone();
        let theme = Arc::clone(&self.theme);
        let resolver = Arc::clone(&self.resolver);
        let png = tokio::task::spawn_blocking(move || render::render_png(&build, &theme, &resolver))
            .await
            .map_err(CardServiceError::Worker)?
            .map_err(CardServiceError::Render)?;

        Ok(CardOutcome::Ready(RenderedCard {
            png,
            uid: uid.get(),
            character_index: index,
            character_name,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fetch::{ProfileFetcher, ProviderEndpoint, RawPayload};
    use crate::gamedata::StaticGameDatabase;
    use crate::render::read_metadata;
    use crate::utils::test_utils::{StubResponse, StubServer};
    use async_trait::async_trait;
    use chrono::Utc;
    use serde_json::{json, Value};
    use std::time::{Duration, Instant};

    struct FixedSource(Option<Value>);

    #[async_trait]
    impl ProfileSource for FixedSource {
        async fn fetch(&self, uid: Uid, _force_refresh: bool) -> Option<RawPayload> {
            self.0.clone().map(|body| RawPayload {
                uid: uid.get(),
                source: "fixed".to_string(),
                fetched_at: Utc::now(),
                from_cache: false,
                body,
            })
        }
    }

    fn service(source: Arc<dyn ProfileSource>) -> CardService {
        CardService::new(
            source,
            Normalizer::new(Arc::new(StaticGameDatabase::empty())),
            Arc::new(AssetResolver::placeholders_only()),
            CardTheme::default(),
        )
    }

    fn uid() -> Uid {
        Uid::new(800123456).unwrap()
    }

    #[tokio::test]
    async fn renders_requested_character() {
        let body = json!({"characters": [{"name": "Acheron", "id": 1308}, {"name": "Seele", "id": 1102}]});
        let service = service(Arc::new(FixedSource(Some(body))));
        let CardOutcome::Ready(card) = service.get_card(uid(), 1, false).await.unwrap() else {
            panic!("expected a card");
        };
        assert_eq!(card.character_index, 1);
        assert_eq!(card.character_name, "Seele");
        let metadata = read_metadata(&card.png).unwrap();
        assert_eq!(metadata.uid, 800123456);
        assert_eq!(metadata.character_id, 1102);
    }

    #[tokio::test]
    async fn out_of_range_index_uses_first_character() {
        let body = json!({"characters": [{"name": "Acheron"}]});
        let service = service(Arc::new(FixedSource(Some(body))));
        let CardOutcome::Ready(card) = service.get_card(uid(), 9, false).await.unwrap() else {
            panic!("expected a card");
        };
        assert_eq!(card.character_index, 0);
        assert_eq!(card.character_name, "Acheron");
    }

    #[tokio::test]
    async fn missing_data_is_not_available_not_an_error() {
        let none = service(Arc::new(FixedSource(None)));
        assert_eq!(
            none.get_card(uid(), 0, false).await.unwrap(),
            CardOutcome::NotAvailable(Unavailable::ProviderUnavailable)
        );

        let odd = service(Arc::new(FixedSource(Some(json!({"retcode": 0, "data": {}})))));
        assert_eq!(
            odd.get_card(uid(), 0, false).await.unwrap(),
            CardOutcome::NotAvailable(Unavailable::UnrecognizedSchema)
        );

        let empty = service(Arc::new(FixedSource(Some(json!({"characters": []})))));
        assert_eq!(
            empty.get_card(uid(), 0, false).await.unwrap(),
            CardOutcome::NotAvailable(Unavailable::NoCharacters)
        );
    }

    #[tokio::test]
    async fn all_candidates_failing_returns_promptly() {
        let server = StubServer::start(vec![
            ("/down/800123456", StubResponse::status(503)),
            ("/slow/800123456", StubResponse::status(200).delayed(Duration::from_secs(5))),
        ])
        .await;
        let endpoints = ["/down/{uid}", "/slow/{uid}", "/down/{uid}", "/slow/{uid}", "/down/{uid}", "/slow/{uid}"]
            .iter()
            .map(|path| ProviderEndpoint::new("stub", server.template(path)))
            .collect();
        let fetcher = ProfileFetcher::new(endpoints, Duration::from_millis(200)).unwrap();
        let service = service(Arc::new(fetcher));

        let started = Instant::now();
        let outcome = service.get_card(uid(), 0, false).await.unwrap();
        assert_eq!(outcome, CardOutcome::NotAvailable(Unavailable::ProviderUnavailable));
        assert!(started.elapsed() < Duration::from_secs(4));
    }
}
