use std::path::PathBuf;

use anyhow::{Context, Result};

use crate::layout::{LayoutConfig, Preset};

/// Application configuration loaded from environment variables.
/// Everything has a default; malformed values fail startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub port: u16,
    pub rust_log: String,
    /// Logo used when a request does not upload its own.
    pub logo_path: Option<PathBuf>,
    pub layout: LayoutConfig,
}

impl Config {
    /// `preset` takes precedence over `CARD_PRESET`.
    pub fn from_env(preset: Option<&str>) -> Result<Self> {
        dotenvy::dotenv().ok(); // load .env if present; ignore if missing
        Self::from_lookup(|key| match (key, preset) {
            ("CARD_PRESET", Some(preset)) => Some(preset.to_string()),
            _ => std::env::var(key).ok(),
        })
    }

    /// Builds the config from any key lookup. `from_env` passes the process environment.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let preset = match lookup("CARD_PRESET") {
            Some(name) => name.parse::<Preset>()?,
            None => Preset::default(),
        };
        let mut layout = LayoutConfig::preset(preset);

        let overrides: [(&str, &mut f32); 16] = [
            ("PAGE_WIDTH", &mut layout.page.page_width),
            ("PAGE_HEIGHT", &mut layout.page.page_height),
            ("CARD_WIDTH", &mut layout.card.width),
            ("CARD_HEIGHT", &mut layout.card.height),
            ("CARD_GAP_X", &mut layout.card.gap_x),
            ("CARD_GAP_Y", &mut layout.card.gap_y),
            ("CARD_MARGIN", &mut layout.card.margin),
            ("LOGO_WIDTH", &mut layout.card.logo_width),
            ("LOGO_INSET", &mut layout.card.logo_inset),
            ("CARD_TEXT_PADDING_LEFT", &mut layout.card.text_padding_left),
            ("CARD_TEXT_PADDING_RIGHT", &mut layout.card.text_padding_right),
            ("CARD_INTER_FIELD_SPACING", &mut layout.card.inter_field_spacing),
            ("NAME_FONT_SIZE", &mut layout.name.initial_size),
            ("NAME_MIN_FONT_SIZE", &mut layout.name.min_size),
            ("ROLE_FONT_SIZE", &mut layout.role.initial_size),
            ("ROLE_MIN_FONT_SIZE", &mut layout.role.min_size),
        ];
        for (key, slot) in overrides {
            if let Some(raw) = lookup(key) {
                *slot = raw
                    .trim()
                    .parse::<f32>()
                    .with_context(|| format!("{key} must be a number, got '{raw}'"))?;
            }
        }

        Ok(Config {
            port: lookup("PORT")
                .unwrap_or_else(|| "8080".to_string())
                .parse::<u16>()
                .context("PORT must be a valid port number")?,
            rust_log: lookup("RUST_LOG").unwrap_or_else(|| "info".to_string()),
            logo_path: lookup("LOGO_PATH")
                .filter(|p| !p.trim().is_empty())
                .map(PathBuf::from),
            layout,
        })
    }
}
