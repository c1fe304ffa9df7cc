//! Theme mode, accent colour and the persisted popup preferences.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{error, info, warn};

use crate::store::SettingsStore;

pub const THEME_KEY: &str = "theme";
pub const THEME_COLOR_KEY: &str = "themeColor";
pub const PAGE_SIZE_KEY: &str = "pageSize";
pub const AUTO_LOAD_KEY: &str = "autoLoad";

const FOCUS_SHADOW_ALPHA: f64 = 0.1;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeMode {
    #[default]
    Light,
    Dark,
}

impl ThemeMode {
    pub fn toggled(self) -> Self {
        match self {
            ThemeMode::Light => ThemeMode::Dark,
            ThemeMode::Dark => ThemeMode::Light,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThemeMode::Light => "light",
            ThemeMode::Dark => "dark",
        }
    }
}

/// Accent colours offered in the theme panel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    Red,
    Orange,
    Yellow,
    Green,
    Cyan,
    #[default]
    Blue,
    Purple,
}

impl ThemeColor {
    pub const ALL: [ThemeColor; 7] = [
        ThemeColor::Red,
        ThemeColor::Orange,
        ThemeColor::Yellow,
        ThemeColor::Green,
        ThemeColor::Cyan,
        ThemeColor::Blue,
        ThemeColor::Purple,
    ];

    /// Unknown names fall back to blue.
    pub fn from_name(name: &str) -> Self {
        let wanted = name.trim().to_lowercase();
        Self::ALL
            .into_iter()
            .find(|color| color.name() == wanted)
            .unwrap_or_default()
    }

    pub fn name(&self) -> &'static str {
        match self {
            ThemeColor::Red => "red",
            ThemeColor::Orange => "orange",
            ThemeColor::Yellow => "yellow",
            ThemeColor::Green => "green",
            ThemeColor::Cyan => "cyan",
            ThemeColor::Blue => "blue",
            ThemeColor::Purple => "purple",
        }
    }

    pub fn hex(&self) -> &'static str {
        match self {
            ThemeColor::Red => "#ef4444",
            ThemeColor::Orange => "#f97316",
            ThemeColor::Yellow => "#eab308",
            ThemeColor::Green => "#22c55e",
            ThemeColor::Cyan => "#06b6d4",
            ThemeColor::Blue => "#3b82f6",
            ThemeColor::Purple => "#8b5cf6",
        }
    }
}

/// `#rrggbb` to `rgba(r, g, b, a)`.
pub fn hex_to_rgba(hex: &str, alpha: f64) -> Option<String> {
    let digits = hex.strip_prefix('#')?;
    if digits.len() != 6 || !digits.chars().all(|c| c.is_ascii_hexdigit()) {
        return None;
    }
    let channel = |i: usize| u8::from_str_radix(&digits[i..i + 2], 16).ok();
    Some(format!(
        "rgba({}, {}, {}, {})",
        channel(0)?,
        channel(2)?,
        channel(4)?,
        alpha
    ))
}

/// CSS custom properties driven by the accent colour.
pub fn css_variables(color: ThemeColor) -> Vec<(&'static str, String)> {
    let hex = color.hex();
    let mut vars = vec![
        ("--button-color", hex.to_string()),
        ("--title-color", hex.to_string()),
    ];
    if let Some(shadow) = hex_to_rgba(hex, FOCUS_SHADOW_ALPHA) {
        vars.push(("--focus-shadow-color", shadow));
    }
    vars
}

/// Stored popup preferences. Missing keys take their defaults.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Preferences {
    pub theme: ThemeMode,
    pub theme_color: ThemeColor,
    pub page_size: usize,
    pub auto_load: bool,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: ThemeMode::Light,
            theme_color: ThemeColor::Blue,
            page_size: 20,
            auto_load: true,
        }
    }
}

impl Preferences {
    /// Build from raw store values, falling back per key on bad values.
    pub fn from_values(values: &Map<String, Value>) -> Self {
        let mut prefs = Preferences::default();

        if let Some(theme) = values.get(THEME_KEY) {
            match serde_json::from_value(theme.clone()) {
                Ok(mode) => prefs.theme = mode,
                Err(_) => warn!("⚠️  Ignoring unknown theme {}", theme),
            }
        }
        if let Some(color) = values.get(THEME_COLOR_KEY).and_then(Value::as_str) {
            prefs.theme_color = ThemeColor::from_name(color);
        }
        if let Some(size) = values.get(PAGE_SIZE_KEY).and_then(Value::as_u64) {
            if size > 0 {
                prefs.page_size = size as usize;
            }
        }
        if let Some(auto_load) = values.get(AUTO_LOAD_KEY).and_then(Value::as_bool) {
            prefs.auto_load = auto_load;
        }

        prefs
    }
}

/// Applies and persists theme choices. Persistence is best-effort.
#[derive(Debug, Clone, Default)]
pub struct ThemeController {
    prefs: Preferences,
}

impl ThemeController {
    /// Read preferences; an unavailable store yields the defaults.
    pub async fn initialize<S: SettingsStore>(store: &S) -> Self {
        let keys = [THEME_KEY, THEME_COLOR_KEY, PAGE_SIZE_KEY, AUTO_LOAD_KEY];
        let prefs = match store.get(&keys).await {
            Ok(values) => Preferences::from_values(&values),
            Err(e) => {
                error!("❌ Failed to load theme settings: {}", e);
                Preferences::default()
            }
        };
        Self { prefs }
    }

    pub fn preferences(&self) -> &Preferences {
        &self.prefs
    }

    pub fn css_variables(&self) -> Vec<(&'static str, String)> {
        css_variables(self.prefs.theme_color)
    }

    pub async fn toggle_theme<S: SettingsStore>(&mut self, store: &S) -> ThemeMode {
        self.prefs.theme = self.prefs.theme.toggled();
        info!("🎨 Theme switched to {}", self.prefs.theme.name());
        persist(store, THEME_KEY, Value::from(self.prefs.theme.name())).await;
        self.prefs.theme
    }

    pub async fn set_theme_color<S: SettingsStore>(&mut self, store: &S, name: &str) -> ThemeColor {
        self.prefs.theme_color = ThemeColor::from_name(name);
        info!("🎨 Accent colour set to {}", self.prefs.theme_color.name());
        persist(store, THEME_COLOR_KEY, Value::from(self.prefs.theme_color.name())).await;
        self.prefs.theme_color
    }
}

async fn persist<S: SettingsStore>(store: &S, key: &str, value: Value) {
    let mut values = Map::new();
    values.insert(key.to_string(), value);
    if let Err(e) = store.set(values).await {
        error!("❌ Failed to save {} setting: {}", key, e);
    }
}
