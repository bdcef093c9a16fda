use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use eyre::Result;
use log::{debug, warn};
use serde::Deserialize;

use crate::captions::{self, CaptionFormat};
use crate::config::Config;
use crate::identity::shuffled;
use crate::strategy::{Acquisition, MIN_CAPTION_CHARS, MIN_DESCRIPTION_CHARS, Strategy, StrategyInput};

const CAPTION_FETCH_ATTEMPTS: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const IDENTITY_DELAY: Duration = Duration::from_secs(1);
const INSTANCE_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(15);

/// One caption descriptor as exposed by a mirror instance.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CaptionDescriptor {
    pub label: Option<String>,
    pub language_code: Option<String>,
    pub url: Option<String>,
}

impl CaptionDescriptor {
    fn is_english(&self) -> bool {
        self.language_code.as_deref().map(|c| c.starts_with("en")).unwrap_or(false)
    }
}

#[derive(Debug, Deserialize)]
struct VideoDetailsResponse {
    title: Option<String>,
    description: Option<String>,
    #[serde(default)]
    captions: Vec<CaptionDescriptor>,
}

/// Read-only mirror strategy: iterates configured instances under rotated
/// identities, querying the captions endpoint first, then the video-details
/// endpoint, then falling back to the description.
pub struct MirrorApi {
    config: Arc<Config>,
}

impl MirrorApi {
    pub fn new(config: Arc<Config>) -> Self {
        MirrorApi { config }
    }

    async fn try_instance(
        &self,
        client: &reqwest::Client,
        instance: &str,
        user_agent: &str,
        video_id: &str,
    ) -> Option<String> {
        // Captions endpoint first: focused on subtitles only.
        let captions_url = format!("{instance}/api/v1/captions/{video_id}");
        match fetch_json::<Vec<CaptionDescriptor>>(client, &captions_url, instance, user_agent).await {
            Ok(descriptors) if !descriptors.is_empty() => {
                debug!("Found {} caption tracks on {instance}", descriptors.len());
                if let Some(text) = self
                    .try_descriptors(client, instance, user_agent, &descriptors)
                    .await
                {
                    return Some(text);
                }
            }
            Ok(_) => debug!("No caption tracks on {instance}"),
            Err(e) => debug!("Captions endpoint failed on {instance}: {e}"),
        }

        // Video-details endpoint: may carry embedded captions, and at worst
        // a description to fall back on.
        let details_url = format!("{instance}/api/v1/videos/{video_id}");
        match fetch_json::<VideoDetailsResponse>(client, &details_url, instance, user_agent).await {
            Ok(details) => {
                if !details.captions.is_empty() {
                    debug!("Found {} captions in video details on {instance}", details.captions.len());
                    if let Some(text) = self
                        .try_descriptors(client, instance, user_agent, &details.captions)
                        .await
                    {
                        return Some(text);
                    }
                }
                if let Some(description) = details.description.as_deref() {
                    if description.chars().count() > MIN_DESCRIPTION_CHARS {
                        let title = details.title.as_deref().unwrap_or("Unknown");
                        debug!("Using video description from {instance} as fallback");
                        return Some(format!("Title: {title}\n\nDescription: {description}"));
                    }
                }
            }
            Err(e) => debug!("Video-details endpoint failed on {instance}: {e}"),
        }

        None
    }

    async fn try_descriptors(
        &self,
        client: &reqwest::Client,
        instance: &str,
        user_agent: &str,
        descriptors: &[CaptionDescriptor],
    ) -> Option<String> {
        for descriptor in prioritize_english(descriptors) {
            let Some(raw_url) = descriptor.url.as_deref() else {
                continue;
            };
            let caption_url = resolve_caption_url(instance, raw_url);
            if let Some(text) = fetch_caption_with_retries(client, &caption_url, user_agent).await {
                return Some(text);
            }
        }
        None
    }
}

#[async_trait]
impl Strategy for MirrorApi {
    fn name(&self) -> &'static str {
        "mirror-api"
    }

    async fn attempt(&self, input: &StrategyInput) -> Acquisition {
        let client = match reqwest::Client::builder().timeout(REQUEST_TIMEOUT).build() {
            Ok(client) => client,
            Err(e) => return Acquisition::Failed(format!("client setup failed: {e}")),
        };

        // Shuffle instances and identities per request to spread load;
        // the configured lists themselves stay untouched.
        for instance in shuffled(&self.config.mirror_instances) {
            for user_agent in shuffled(&self.config.user_agents) {
                if let Some(text) = self
                    .try_instance(&client, &instance, &user_agent, &input.video_id)
                    .await
                {
                    return Acquisition::Success(text);
                }
                tokio::time::sleep(IDENTITY_DELAY).await;
            }
            tokio::time::sleep(INSTANCE_DELAY).await;
        }

        warn!("All mirror instances failed for video ID: {}", input.video_id);
        Acquisition::Empty
    }
}

async fn fetch_json<T: serde::de::DeserializeOwned>(
    client: &reqwest::Client,
    url: &str,
    instance: &str,
    user_agent: &str,
) -> Result<T> {
    let value = client
        .get(url)
        .header("User-Agent", user_agent)
        .header("Accept", "application/json")
        .header("Referer", instance)
        .send()
        .await?
        .error_for_status()?
        .json::<T>()
        .await?;
    Ok(value)
}

/// Fetch one caption URL with a small retry budget, returning parsed flat
/// text when it clears the usable-captions gate.
async fn fetch_caption_with_retries(client: &reqwest::Client, url: &str, user_agent: &str) -> Option<String> {
    for attempt in 1..=CAPTION_FETCH_ATTEMPTS {
        match client.get(url).header("User-Agent", user_agent).send().await {
            Ok(resp) if resp.status().is_success() => {
                let content = resp.text().await.unwrap_or_default();
                let flat = captions::parse(&content, CaptionFormat::from_url(url));
                if flat.chars().count() > MIN_CAPTION_CHARS {
                    return Some(flat);
                }
                debug!("Caption payload from {url} too short, moving on");
                return None;
            }
            Ok(resp) => {
                warn!("Caption fetch attempt {attempt} returned HTTP {}", resp.status());
            }
            Err(e) => {
                warn!("Caption fetch attempt {attempt} failed: {e}");
            }
        }
        if attempt < CAPTION_FETCH_ATTEMPTS {
            tokio::time::sleep(RETRY_DELAY).await;
        }
    }
    None
}

/// English-coded descriptors when any exist, otherwise everything.
fn prioritize_english(descriptors: &[CaptionDescriptor]) -> Vec<CaptionDescriptor> {
    let english: Vec<CaptionDescriptor> = descriptors.iter().filter(|d| d.is_english()).cloned().collect();
    if english.is_empty() {
        descriptors.to_vec()
    } else {
        english
    }
}

/// Mirror instances report caption URLs relative to themselves.
fn resolve_caption_url(instance: &str, url: &str) -> String {
    if url.starts_with('/') {
        format!("{instance}{url}")
    } else {
        url.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn descriptor(lang: Option<&str>, url: Option<&str>) -> CaptionDescriptor {
        CaptionDescriptor {
            label: lang.map(|l| l.to_string()),
            language_code: lang.map(|l| l.to_string()),
            url: url.map(|u| u.to_string()),
        }
    }

    #[test]
    fn test_prioritize_english_filters() {
        let descriptors = vec![
            descriptor(Some("fr"), Some("/fr")),
            descriptor(Some("en-US"), Some("/en-US")),
            descriptor(Some("en"), Some("/en")),
        ];
        let ordered = prioritize_english(&descriptors);
        assert_eq!(ordered.len(), 2);
        assert!(ordered.iter().all(|d| d.is_english()));
    }

    #[test]
    fn test_prioritize_english_keeps_all_without_english() {
        let descriptors = vec![descriptor(Some("fr"), None), descriptor(Some("de"), None)];
        assert_eq!(prioritize_english(&descriptors).len(), 2);
    }

    #[test]
    fn test_resolve_caption_url_relative() {
        assert_eq!(
            resolve_caption_url("https://inv.example", "/api/v1/captions/abc?label=en"),
            "https://inv.example/api/v1/captions/abc?label=en"
        );
    }

    #[test]
    fn test_resolve_caption_url_absolute() {
        assert_eq!(
            resolve_caption_url("https://inv.example", "https://other.example/c.vtt"),
            "https://other.example/c.vtt"
        );
    }

    #[test]
    fn test_caption_descriptor_decode() {
        let json = r#"[
            {"label": "English", "languageCode": "en", "url": "/api/v1/captions/abc?label=English"},
            {"label": "Deutsch", "languageCode": "de", "url": "/api/v1/captions/abc?label=Deutsch"}
        ]"#;
        let descriptors: Vec<CaptionDescriptor> = serde_json::from_str(json).unwrap();
        assert_eq!(descriptors.len(), 2);
        assert!(descriptors[0].is_english());
        assert!(!descriptors[1].is_english());
    }

    #[test]
    fn test_video_details_decode() {
        let json = r#"{
            "title": "Some Video",
            "videoId": "abc",
            "description": "text",
            "captions": [{"label": "English", "languageCode": "en", "url": "/c"}]
        }"#;
        let details: VideoDetailsResponse = serde_json::from_str(json).unwrap();
        assert_eq!(details.title.as_deref(), Some("Some Video"));
        assert_eq!(details.captions.len(), 1);
    }

    #[test]
    fn test_video_details_decode_without_captions() {
        let details: VideoDetailsResponse = serde_json::from_str(r#"{"title": "t"}"#).unwrap();
        assert!(details.captions.is_empty());
        assert!(details.description.is_none());
    }
}
