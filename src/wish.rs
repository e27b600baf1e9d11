//! Greeting-card text generation
//!
//! Independent of the particle engine. Every path through [`compose_wish`]
//! returns a printable message: generator failures degrade to fixed fallbacks.

use bevy::prelude::*;
use bevy::tasks::{block_on, futures_lite::future, IoTaskPool, Task};
use std::fmt;
use std::sync::Arc;
use thiserror::Error;

/// Shown when the generator answers with nothing usable.
pub const EMPTY_REPLY_FALLBACK: &str =
    "May your holidays be as timeless as gold and as deep as the winter night.";
/// Shown when the generator fails outright.
pub const ERROR_FALLBACK: &str = "Wishing you a season of splendor and a new year of prosperity.";

pub const MAX_WISH_WORDS: usize = 40;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Default)]
pub enum Tone {
    #[default]
    Professional,
    Romantic,
    Family,
    Witty,
}

impl fmt::Display for Tone {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Tone::Professional => "Professional",
            Tone::Romantic => "Romantic",
            Tone::Family => "Family",
            Tone::Witty => "Witty",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WishRequest {
    pub recipient_name: String,
    pub relationship: String,
    pub tone: Tone,
}

#[derive(Debug, Error)]
pub enum WishError {
    #[error("no API key configured (set {0})")]
    MissingApiKey(&'static str),
    #[error("request failed: {0}")]
    Http(String),
    #[error("unexpected response: {0}")]
    Decode(String),
}

pub type Result<T> = std::result::Result<T, WishError>;

/// Backend that turns a request and its prompt into text. `Ok(None)` means "answered, but empty".
pub trait GreetingGenerator: Send + Sync {
    fn generate(&self, request: &WishRequest, prompt: &str) -> Result<Option<String>>;
}

pub fn build_prompt(request: &WishRequest) -> String {
    format!(
        "You are a creative director for a high-end luxury lifestyle brand.\n\
         Write a short, sophisticated, and warm Christmas greeting card message.\n\
         \n\
         Recipient: {}\n\
         Relationship: {}\n\
         Tone: {} (Make it sound expensive, elegant, and timeless)\n\
         \n\
         Constraints:\n\
         - Maximum {} words.\n\
         - Do not use hashtags.\n\
         - Focus on themes of gold, light, timelessness, and prosperity.\n\
         - Return ONLY the message text.",
        request.recipient_name.trim(),
        request.relationship.trim(),
        request.tone,
        MAX_WISH_WORDS,
    )
}

/// Ask `generator` for a greeting; never fails.
pub fn compose_wish(generator: &dyn GreetingGenerator, request: &WishRequest) -> String {
    match generator.generate(request, &build_prompt(request)) {
        Ok(Some(text)) if !text.trim().is_empty() => text.trim().to_string(),
        Ok(_) => EMPTY_REPLY_FALLBACK.to_string(),
        Err(err) => {
            warn!("Greeting generation failed: {}", err);
            ERROR_FALLBACK.to_string()
        }
    }
}

/// Offline generator: fills a per-tone template with the recipient's name.
pub struct TemplateGreetings;

impl TemplateGreetings {
    fn render(request: &WishRequest) -> String {
        let name = request.recipient_name.trim();
        let name = if name.is_empty() { "you" } else { name };
        match request.tone {
            Tone::Professional => format!(
                "To {}, with gratitude for a year of fine partnership. May the season gild every endeavour ahead.",
                name
            ),
            Tone::Romantic => format!(
                "{}, you are the light I find in every winter night. May this Christmas glow as golden as us.",
                name
            ),
            Tone::Family => format!(
                "Dearest {}, may our table be warm, our hearts full, and this season as timeless as family.",
                name
            ),
            Tone::Witty => format!(
                "{}, may your gifts be gold, your wrapping effortless, and your resolutions delightfully optional.",
                name
            ),
        }
    }
}

impl GreetingGenerator for TemplateGreetings {
    fn generate(&self, request: &WishRequest, _prompt: &str) -> Result<Option<String>> {
        Ok(Some(Self::render(request)))
    }
}

#[cfg(feature = "network")]
pub mod gemini {
    //! Gemini `generateContent` client (blocking; run it off the main thread)

    use super::{GreetingGenerator, Result, WishError, WishRequest};

    pub const API_KEY_VAR: &str = "GEMINI_API_KEY";
    const MODEL: &str = "gemini-2.5-flash";
    const ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta/models";

    pub struct GeminiGreetings {
        client: reqwest::blocking::Client,
        api_key: String,
    }

    impl GeminiGreetings {
        pub fn from_env() -> Result<Self> {
            let api_key = std::env::var(API_KEY_VAR).map_err(|_| WishError::MissingApiKey(API_KEY_VAR))?;
            Ok(Self {
                client: reqwest::blocking::Client::new(),
                api_key,
            })
        }
    }

    impl GreetingGenerator for GeminiGreetings {
        fn generate(&self, _request: &WishRequest, prompt: &str) -> Result<Option<String>> {
            let body = serde_json::json!({
                "contents": [{ "parts": [{ "text": prompt }] }]
            });
            let response = self
                .client
                .post(format!("{}/{}:generateContent", ENDPOINT, MODEL))
                .query(&[("key", self.api_key.as_str())])
                .json(&body)
                .send()
                .and_then(|r| r.error_for_status())
                .map_err(|e| WishError::Http(e.to_string()))?;

            let value: serde_json::Value = response.json().map_err(|e| WishError::Decode(e.to_string()))?;
            Ok(value
                .pointer("/candidates/0/content/parts/0/text")
                .and_then(|text| text.as_str())
                .map(str::to_string))
        }
    }
}

/// The generator used by the app.
#[derive(Resource, Clone)]
pub struct WishService(pub Arc<dyn GreetingGenerator>);

impl Default for WishService {
    fn default() -> Self {
        #[cfg(feature = "network")]
        {
            match gemini::GeminiGreetings::from_env() {
                Ok(client) => return Self(Arc::new(client)),
                Err(err) => warn!("{}; using offline greetings", err),
            }
        }
        Self(Arc::new(TemplateGreetings))
    }
}

/// In-flight generation; polled until the message is ready.
#[derive(Component)]
pub struct PendingWish {
    task: Task<String>,
}

/// Last greeting that finished generating.
#[derive(Resource, Default, Debug)]
pub struct LatestWish(pub Option<String>);

pub struct WishPlugin;

impl Plugin for WishPlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<WishService>()
            .init_resource::<LatestWish>()
            .add_systems(Update, (request_wish_system, poll_wish_system));
    }
}

/// System: W requests a greeting for a default recipient
fn request_wish_system(
    mut commands: Commands,
    keyboard: Res<ButtonInput<KeyCode>>,
    service: Res<WishService>,
    pending: Query<(), With<PendingWish>>,
) {
    if !keyboard.just_pressed(KeyCode::KeyW) || !pending.is_empty() {
        return;
    }
    let request = WishRequest {
        recipient_name: "Friend".to_string(),
        relationship: "Friend".to_string(),
        tone: Tone::default(),
    };
    let generator = service.0.clone();
    // The Gemini client blocks on HTTP, so it belongs on the I/O pool
    let task = IoTaskPool::get().spawn(async move { compose_wish(generator.as_ref(), &request) });
    info!("Generating greeting...");
    commands.spawn(PendingWish { task });
}

fn poll_wish_system(
    mut commands: Commands,
    mut pending: Query<(Entity, &mut PendingWish)>,
    mut latest: ResMut<LatestWish>,
) {
    for (entity, mut wish) in pending.iter_mut() {
        if let Some(message) = block_on(future::poll_once(&mut wish.task)) {
            info!("Greeting: {}", message);
            latest.0 = Some(message);
            commands.entity(entity).despawn();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Fixed(Result<Option<String>>);

    impl GreetingGenerator for Fixed {
        fn generate(&self, _request: &WishRequest, _prompt: &str) -> Result<Option<String>> {
            match &self.0 {
                Ok(text) => Ok(text.clone()),
                Err(_) => Err(WishError::Http("offline".into())),
            }
        }
    }

    fn request(tone: Tone) -> WishRequest {
        WishRequest {
            recipient_name: " Ada ".to_string(),
            relationship: "Colleague".to_string(),
            tone,
        }
    }

    #[test]
    fn prompt_carries_the_request() {
        let prompt = build_prompt(&request(Tone::Witty));
        assert!(prompt.contains("Recipient: Ada\n"));
        assert!(prompt.contains("Relationship: Colleague"));
        assert!(prompt.contains("Tone: Witty"));
        assert!(prompt.contains("Maximum 40 words"));
    }

    #[test]
    fn generated_text_is_trimmed() {
        let generator = Fixed(Ok(Some("  Golden wishes.\n".into())));
        assert_eq!(compose_wish(&generator, &request(Tone::Family)), "Golden wishes.");
    }

    #[test]
    fn empty_reply_uses_the_empty_fallback() {
        assert_eq!(compose_wish(&Fixed(Ok(None)), &request(Tone::Family)), EMPTY_REPLY_FALLBACK);
        assert_eq!(compose_wish(&Fixed(Ok(Some("   ".into()))), &request(Tone::Family)), EMPTY_REPLY_FALLBACK);
    }

    #[test]
    fn errors_degrade_to_the_error_fallback() {
        let generator = Fixed(Err(WishError::Http("x".into())));
        assert_eq!(compose_wish(&generator, &request(Tone::Romantic)), ERROR_FALLBACK);
    }

    #[test]
    fn templates_stay_within_the_word_limit() {
        for tone in [Tone::Professional, Tone::Romantic, Tone::Family, Tone::Witty] {
            let text = compose_wish(&TemplateGreetings, &request(tone));
            assert!(text.contains("Ada"));
            assert!(text.split_whitespace().count() <= MAX_WISH_WORDS);
            assert!(!text.contains('#'));
        }
    }

    #[test]
    fn w_key_generates_off_the_main_thread() {
        let mut app = App::new();
        app.add_plugins(MinimalPlugins)
            .init_resource::<ButtonInput<KeyCode>>()
            .add_plugins(WishPlugin)
            .insert_resource(WishService(Arc::new(Fixed(Ok(Some("Golden wishes.".into()))))));

        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().press(KeyCode::KeyW);
        app.update();
        app.world_mut().resource_mut::<ButtonInput<KeyCode>>().clear();

        for _ in 0..500 {
            if app.world().resource::<LatestWish>().0.is_some() {
                break;
            }
            std::thread::sleep(std::time::Duration::from_millis(2));
            app.update();
        }
        assert_eq!(app.world().resource::<LatestWish>().0.as_deref(), Some("Golden wishes."));

        let world = app.world_mut();
        assert_eq!(world.query::<&PendingWish>().iter(world).count(), 0);
    }

    #[test]
    fn template_handles_a_blank_name() {
        let mut req = request(Tone::Professional);
        req.recipient_name = "  ".into();
        assert!(compose_wish(&TemplateGreetings, &req).starts_with("To you,"));
    }
}
