//! Interactive first-run setup wizard (`narrator setup`)

use std::path::PathBuf;

use dialoguer::{Confirm, Input, Select};

use crate::config::file::{
    LlmFileConfig, NarratorConfigFile, NavigationFileConfig, TtsFileConfig,
};
use crate::config::{LlmProvider, TtsProviderKind};
use crate::poi::DEFAULT_TRIGGER_THRESHOLD;

/// Run the interactive setup wizard
///
/// # Errors
///
/// Returns error if user input fails or config cannot be written
#[allow(clippy::too_many_lines)]
pub fn run_setup() -> anyhow::Result<()> {
    println!("Route Narrator Setup\n");

    // Load existing config if present
    let existing = crate::config::file::load_config_file();
    let config_path = crate::config::file::config_file_path()
        .unwrap_or_else(|| PathBuf::from("~/.config/route-narrator/config.toml"));

    if config_path.exists() {
        println!("Existing config found at {}\n", config_path.display());
    }

    let mut api_keys = existing.api_keys;

    // 1. Routing key
    api_keys.openrouteservice = prompt_key(
        "OpenRouteService",
        "ORS_API_KEY",
        api_keys.openrouteservice.take(),
    )?;

    // 2. LLM provider + API key
    let providers = ["Gemini", "OpenAI"];
    let default_provider = existing
        .llm
        .provider
        .as_deref()
        .and_then(LlmProvider::from_name)
        .map_or(0, |p| match p {
            LlmProvider::Gemini => 0,
            LlmProvider::OpenAi => 1,
        });

    let provider_idx = Select::new()
        .with_prompt("Select a narrator LLM provider")
        .items(&providers)
        .default(default_provider)
        .interact()?;
    let provider = if provider_idx == 0 {
        LlmProvider::Gemini
    } else {
        LlmProvider::OpenAi
    };

    match provider {
        LlmProvider::Gemini => {
            api_keys.gemini = prompt_key("Gemini", "GEMINI_API_KEY", api_keys.gemini.take())?;
        }
        LlmProvider::OpenAi => {
            api_keys.openai = prompt_key("OpenAI", "OPENAI_API_KEY", api_keys.openai.take())?;
        }
    }

    // 3. LLM model
    let default_model = existing
        .llm
        .model
        .filter(|m| {
            existing.llm.provider.as_deref().and_then(LlmProvider::from_name) == Some(provider)
                && !m.is_empty()
        })
        .unwrap_or_else(|| provider.default_model().to_string());

    let model: String = Input::new()
        .with_prompt("LLM model")
        .default(default_model)
        .interact_text()?;

    // 4. Speech
    let tts_providers = ["OpenAI", "ElevenLabs"];
    let default_tts = existing
        .tts
        .provider
        .as_deref()
        .and_then(TtsProviderKind::from_name)
        .map_or(0, |p| match p {
            TtsProviderKind::OpenAi => 0,
            TtsProviderKind::ElevenLabs => 1,
        });

    let tts_idx = Select::new()
        .with_prompt("Select a speech provider")
        .items(&tts_providers)
        .default(default_tts)
        .interact()?;

    let (tts_name, default_voice) = if tts_idx == 0 {
        if api_keys.openai.is_none() {
            api_keys.openai = prompt_key("OpenAI", "OPENAI_API_KEY", None)?;
        }
        ("openai", "alloy")
    } else {
        api_keys.elevenlabs = prompt_key(
            "ElevenLabs",
            "ELEVENLABS_API_KEY",
            api_keys.elevenlabs.take(),
        )?;
        ("elevenlabs", "21m00Tcm4TlvDq8ikWAM")
    };

    let same_tts = existing.tts.provider.as_deref() == Some(tts_name);
    let voice: String = Input::new()
        .with_prompt("Voice")
        .default(
            existing
                .tts
                .voice
                .clone()
                .filter(|_| same_tts)
                .unwrap_or_else(|| default_voice.to_string()),
        )
        .interact_text()?;

    // 5. Navigation tuning
    let poi_count: usize = Input::new()
        .with_prompt("Points of interest per route")
        .default(existing.navigation.poi_count.unwrap_or(5))
        .validate_with(|n: &usize| if *n == 0 { Err("must be at least 1") } else { Ok(()) })
        .interact_text()?;

    let threshold: f64 = Input::new()
        .with_prompt("Trigger distance (degrees)")
        .default(existing.navigation.threshold.unwrap_or(DEFAULT_TRIGGER_THRESHOLD))
        .validate_with(|t: &f64| {
            if t.is_finite() && *t > 0.0 {
                Ok(())
            } else {
                Err("must be a positive number")
            }
        })
        .interact_text()?;

    // 6. Build and write config
    let config_file = NarratorConfigFile {
        api_keys,
        llm: LlmFileConfig {
            provider: Some(provider_name(provider).to_string()),
            model: Some(model),
            temperature: existing.llm.temperature,
        },
        tts: TtsFileConfig {
            provider: Some(tts_name.to_string()),
            model: existing.tts.model.filter(|_| same_tts),
            voice: Some(voice),
            speed: existing.tts.speed,
        },
        geocoder: existing.geocoder,
        router: existing.router,
        navigation: NavigationFileConfig {
            threshold: Some(threshold),
            poi_count: Some(poi_count),
            max_prompt_points: existing.navigation.max_prompt_points,
            audio_dir: existing.navigation.audio_dir,
        },
        http: existing.http,
    };

    if config_path.exists()
        && !Confirm::new()
            .with_prompt(format!("Overwrite {}?", config_path.display()))
            .default(true)
            .interact()?
    {
        println!("\nNothing written.");
        return Ok(());
    }

    crate::config::file::write_config_file(&config_path, &config_file)?;
    println!("\nConfig written to {}", config_path.display());

    println!("\nSetup complete! Try `narrator plan --from Seattle --to Tacoma`.");

    Ok(())
}

/// Ask for an API key, keeping the current one on blank input
fn prompt_key(
    service: &str,
    env_hint: &str,
    existing: Option<String>,
) -> anyhow::Result<Option<String>> {
    let prompt = match existing.as_deref().map(mask_key) {
        Some(masked) => format!("{service} API key (current: {masked}, leave blank to keep)"),
        None => format!("{service} API key ({env_hint})"),
    };

    let input: String = Input::new()
        .with_prompt(&prompt)
        .allow_empty(true)
        .interact_text()?;

    let input = input.trim();
    Ok(if input.is_empty() {
        existing
    } else {
        Some(input.to_string())
    })
}

/// Show only the ends of a key
fn mask_key(key: &str) -> String {
    let chars: Vec<char> = key.chars().collect();
    if chars.len() > 8 {
        let head: String = chars[..4].iter().collect();
        let tail: String = chars[chars.len() - 4..].iter().collect();
        format!("{head}...{tail}")
    } else {
        "****".to_string()
    }
}

const fn provider_name(provider: LlmProvider) -> &'static str {
    match provider {
        LlmProvider::Gemini => "gemini",
        LlmProvider::OpenAi => "openai",
    }
}
