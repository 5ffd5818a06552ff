//! Supported AI chat platforms and their per-backend configuration.

use serde::{Deserialize, Serialize};

/// One external AI chat platform probed for brand visibility.
///
/// Enum order is the stable presentation order: run results and analytics
/// always report platforms in this order, never in completion order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformId {
    #[serde(rename = "chatgpt")]
    ChatGpt,
    Claude,
    Gemini,
    Perplexity,
}

impl PlatformId {
    /// All supported platforms in stable presentation order.
    pub const ALL: [PlatformId; 4] = [
        PlatformId::ChatGpt,
        PlatformId::Claude,
        PlatformId::Gemini,
        PlatformId::Perplexity,
    ];

    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            PlatformId::ChatGpt => "chatgpt",
            PlatformId::Claude => "claude",
            PlatformId::Gemini => "gemini",
            PlatformId::Perplexity => "perplexity",
        }
    }

    /// Parse a platform name as used in APIs and storage.
    ///
    /// Returns `None` for unknown names; callers surface that as a
    /// validation error before any side effect.
    #[must_use]
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "chatgpt" => Some(PlatformId::ChatGpt),
            "claude" => Some(PlatformId::Claude),
            "gemini" => Some(PlatformId::Gemini),
            "perplexity" => Some(PlatformId::Perplexity),
            _ => None,
        }
    }

    /// Env-var name fragment (`AIVIS_<FRAGMENT>_API_KEY` etc.).
    fn env_fragment(self) -> &'static str {
        match self {
            PlatformId::ChatGpt => "CHATGPT",
            PlatformId::Claude => "CLAUDE",
            PlatformId::Gemini => "GEMINI",
            PlatformId::Perplexity => "PERPLEXITY",
        }
    }

    /// Default API base for the platform's OpenAI-compatible endpoint.
    fn default_base_url(self) -> &'static str {
        match self {
            PlatformId::ChatGpt => "https://api.openai.com/v1",
            PlatformId::Claude => "https://api.anthropic.com/v1",
            PlatformId::Gemini => "https://generativelanguage.googleapis.com/v1beta/openai",
            PlatformId::Perplexity => "https://api.perplexity.ai",
        }
    }

    fn default_model(self) -> &'static str {
        match self {
            PlatformId::ChatGpt => "gpt-4o-mini",
            PlatformId::Claude => "claude-3-5-haiku-latest",
            PlatformId::Gemini => "gemini-2.0-flash",
            PlatformId::Perplexity => "sonar",
        }
    }
}

impl std::fmt::Display for PlatformId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Connection settings for one platform backend.
#[derive(Debug, Clone)]
pub struct PlatformConfig {
    pub id: PlatformId,
    pub base_url: String,
    pub model: String,
    pub api_key: String,
}

/// The set of platforms enabled for this deployment, in stable order.
#[derive(Debug, Clone, Default)]
pub struct PlatformSet {
    platforms: Vec<PlatformConfig>,
}

impl PlatformSet {
    /// Build the enabled platform set from environment variables.
    ///
    /// A platform is enabled when `AIVIS_<PLATFORM>_API_KEY` is set;
    /// `AIVIS_<PLATFORM>_BASE_URL` and `AIVIS_<PLATFORM>_MODEL` override the
    /// defaults. Platforms with no key are silently skipped — deployments
    /// enable exactly the backends they hold credentials for.
    #[must_use]
    pub fn from_env() -> Self {
        let platforms = PlatformId::ALL
            .into_iter()
            .filter_map(|id| {
                let fragment = id.env_fragment();
                let api_key = std::env::var(format!("AIVIS_{fragment}_API_KEY")).ok()?;
                let base_url = std::env::var(format!("AIVIS_{fragment}_BASE_URL"))
                    .unwrap_or_else(|_| id.default_base_url().to_string());
                let model = std::env::var(format!("AIVIS_{fragment}_MODEL"))
                    .unwrap_or_else(|_| id.default_model().to_string());
                Some(PlatformConfig {
                    id,
                    base_url,
                    model,
                    api_key,
                })
            })
            .collect();
        Self { platforms }
    }

    /// Build a set from explicit configs, re-sorted into stable order.
    #[must_use]
    pub fn new(mut platforms: Vec<PlatformConfig>) -> Self {
        platforms.sort_by_key(|p| PlatformId::ALL.iter().position(|id| *id == p.id));
        Self { platforms }
    }

    /// Enabled platforms in stable presentation order.
    #[must_use]
    pub fn ordered(&self) -> &[PlatformConfig] {
        &self.platforms
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.platforms.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.platforms.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_round_trips_every_platform() {
        for id in PlatformId::ALL {
            assert_eq!(PlatformId::parse(id.as_str()), Some(id));
        }
    }

    #[test]
    fn parse_rejects_unknown_platform() {
        assert_eq!(PlatformId::parse("copilot"), None);
        assert_eq!(PlatformId::parse(""), None);
    }

    #[test]
    fn serde_names_match_as_str() {
        let json = serde_json::to_string(&PlatformId::ChatGpt).expect("serialize");
        assert_eq!(json, "\"chatgpt\"");
        let back: PlatformId = serde_json::from_str("\"perplexity\"").expect("deserialize");
        assert_eq!(back, PlatformId::Perplexity);
    }

    #[test]
    fn new_restores_stable_order() {
        let cfg = |id: PlatformId| PlatformConfig {
            id,
            base_url: "http://localhost".to_string(),
            model: "m".to_string(),
            api_key: "k".to_string(),
        };
        let set = PlatformSet::new(vec![cfg(PlatformId::Perplexity), cfg(PlatformId::ChatGpt)]);
        let order: Vec<PlatformId> = set.ordered().iter().map(|p| p.id).collect();
        assert_eq!(order, vec![PlatformId::ChatGpt, PlatformId::Perplexity]);
    }
}
