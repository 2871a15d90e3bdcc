//! Controller configuration.

use crate::activation::ActivationRules;
use crate::events::KeyEvent;
use crate::events::Modifier;
use jfe_core::EnlargeError;
use jfe_core::EnlargeResult;
use jfe_enlarge::ClassifierRules;
use serde::Deserialize;

pub const DEFAULT_FONT_SIZE_PX: u32 = 28;
pub const DEFAULT_MAX_PASSES_PER_FLUSH: usize = 8;

/// Everything the trigger controller needs to know about the page it runs
/// on. Every field has a default, so a partial JSON object is enough.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ControllerConfig {
    /// Size used by the load and mutation triggers.
    pub default_font_size_px: u32,
    /// Upper bound on enlarge passes run by a single `flush`.
    pub max_passes_per_flush: usize,
    pub shortcut: ShortcutConfig,
    pub regions: RegionConfig,
    pub classifier: ClassifierRules,
    pub activation: ActivationRules,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            default_font_size_px: DEFAULT_FONT_SIZE_PX,
            max_passes_per_flush: DEFAULT_MAX_PASSES_PER_FLUSH,
            shortcut: ShortcutConfig::default(),
            regions: RegionConfig::default(),
            classifier: ClassifierRules::default(),
            activation: ActivationRules::default(),
        }
    }
}

impl ControllerConfig {
    /// Parses and validates a JSON configuration object.
    pub fn from_json_str(input: &str) -> EnlargeResult<Self> {
        let config: Self = serde_json::from_str(input)
            .map_err(|error| EnlargeError::Config(format!("invalid JSON configuration: {error}")))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> EnlargeResult<()> {
        if self.default_font_size_px == 0 {
            return Err(EnlargeError::Config(
                "default_font_size_px must be greater than zero".to_owned(),
            ));
        }

        if self.max_passes_per_flush == 0 {
            return Err(EnlargeError::Config(
                "max_passes_per_flush must be greater than zero".to_owned(),
            ));
        }

        if self.shortcut.size_multiplier == 0 {
            return Err(EnlargeError::Config(
                "shortcut size_multiplier must be greater than zero".to_owned(),
            ));
        }

        let mut key_chars = self.shortcut.key.chars();
        let single_alphanumeric = matches!(
            (key_chars.next(), key_chars.next()),
            (Some(ch), None) if ch.is_ascii_alphanumeric()
        );
        if !single_alphanumeric {
            return Err(EnlargeError::Config(format!(
                "shortcut key `{}` must be a single ASCII letter or digit",
                self.shortcut.key
            )));
        }

        for (field, value) in [
            ("supplement_nav_id", &self.regions.supplement_nav_id),
            ("item_info_id", &self.regions.item_info_id),
        ] {
            if value.trim().is_empty() {
                return Err(EnlargeError::Config(format!(
                    "regions.{field} must not be empty"
                )));
            }
        }

        if self.activation.domain.trim_start_matches('.').is_empty() {
            return Err(EnlargeError::Config(
                "activation domain must not be empty".to_owned(),
            ));
        }

        Ok(())
    }

    /// Size requested by the keyboard shortcut.
    pub fn shortcut_font_size_px(&self) -> u32 {
        self.default_font_size_px
            .saturating_mul(self.shortcut.size_multiplier)
    }
}

/// The "enlarge even more" keyboard shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ShortcutConfig {
    /// Matched case-insensitively.
    pub key: String,
    /// Required modifier, if any. Without one, the key fires regardless of
    /// held modifiers.
    pub modifier: Option<Modifier>,
    pub size_multiplier: u32,
}

impl Default for ShortcutConfig {
    fn default() -> Self {
        Self {
            key: "u".to_owned(),
            modifier: None,
            size_multiplier: 2,
        }
    }
}

impl ShortcutConfig {
    pub fn matches(&self, event: &KeyEvent) -> bool {
        event.key.eq_ignore_ascii_case(&self.key)
            && self
                .modifier
                .is_none_or(|modifier| event.modifiers.contains(modifier))
    }
}

/// Element ids of the page regions whose mutations re-trigger a pass.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RegionConfig {
    /// Watched (attributes and subtree) on lesson pages.
    pub supplement_nav_id: String,
    /// Watched (own attributes) on lesson and review pages.
    pub item_info_id: String,
}

impl Default for RegionConfig {
    fn default() -> Self {
        Self {
            supplement_nav_id: "supplement-nav".to_owned(),
            item_info_id: "item-info".to_owned(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ControllerConfig;
    use crate::events::KeyEvent;
    use crate::events::Modifier;

    #[test]
    fn defaults_are_valid() {
        let config = ControllerConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.default_font_size_px, 28);
        assert_eq!(config.shortcut_font_size_px(), 56);
        assert_eq!(config.regions.item_info_id, "item-info");
    }

    #[test]
    fn partial_json_keeps_other_defaults() {
        let config = match ControllerConfig::from_json_str(
            r#"{ "default_font_size_px": 32, "shortcut": { "modifier": "alt" }, "classifier": { "ignored_classes": ["promo"] } }"#,
        ) {
            Ok(config) => config,
            Err(error) => panic!("config should parse: {error}"),
        };
        assert_eq!(config.default_font_size_px, 32);
        assert_eq!(config.shortcut.key, "u");
        assert_eq!(config.shortcut.modifier, Some(Modifier::Alt));
        assert_eq!(config.classifier.ignored_classes, vec!["promo".to_owned()]);
        assert_eq!(config.classifier.free_text_tags, vec!["textarea".to_owned()]);
        assert_eq!(config.max_passes_per_flush, 8);
    }

    #[test]
    fn rejects_invalid_values() {
        for input in [
            r#"{ "default_font_size_px": 0 }"#,
            r#"{ "max_passes_per_flush": 0 }"#,
            r#"{ "shortcut": { "key": "uu" } }"#,
            r#"{ "shortcut": { "key": "?" } }"#,
            r#"{ "shortcut": { "size_multiplier": 0 } }"#,
            r#"{ "regions": { "item_info_id": " " } }"#,
            r#"{ "activation": { "domain": "." } }"#,
            r#"{ "default_font_size_px": "big" }"#,
        ] {
            let result = ControllerConfig::from_json_str(input);
            assert!(
                result.as_ref().is_err_and(|error| error.code() == "config.invalid"),
                "{input} should be rejected, got {result:?}"
            );
        }
    }

    #[test]
    fn shortcut_matching_ignores_case_and_checks_modifier() {
        let mut config = ControllerConfig::default();
        assert!(config.shortcut.matches(&KeyEvent::new("U")));
        assert!(config.shortcut.matches(&KeyEvent::new("u").with_modifier(Modifier::Shift)));
        assert!(!config.shortcut.matches(&KeyEvent::new("y")));

        config.shortcut.modifier = Some(Modifier::Ctrl);
        assert!(!config.shortcut.matches(&KeyEvent::new("u")));
        assert!(config.shortcut.matches(&KeyEvent::new("u").with_modifier(Modifier::Ctrl)));
    }
}
