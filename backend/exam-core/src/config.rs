use serde::Deserialize;
use std::env;

/// Engine tunables. Everything has a sane default so the crate works without
/// any configuration file.
#[derive(Debug, Clone, Deserialize)]
pub struct EngineConfig {
    /// Exam duration applied when the caller does not supply one.
    pub default_exam_duration_seconds: u32,
    /// Remaining time below which ticks report the "critical" display state.
    pub timer_critical_threshold_seconds: u32,
    /// Questions of a locked bank that stay free to preview.
    pub free_question_limit: u32,
    /// Referrals that unlock a bank without a membership.
    pub referral_unlock_threshold: u32,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            default_exam_duration_seconds: 3600,
            timer_critical_threshold_seconds: 300,
            free_question_limit: 10,
            referral_unlock_threshold: 3,
        }
    }
}

impl EngineConfig {
    pub fn load() -> Result<Self, config::ConfigError> {
        dotenvy::dotenv().ok();

        // Determine environment (defaults to dev)
        let env = env::var("APP_ENV").unwrap_or_else(|_| "dev".to_string());

        // Build configuration from config/*.toml + ENV overrides
        let config_builder = config::Config::builder()
            .add_source(
                config::File::with_name(&format!("config/{}", env)).required(false), // Allow missing config file, fallback to ENV
            )
            // Override with environment variables (prefix: APP_)
            .add_source(config::Environment::with_prefix("APP").separator("__"));

        let settings = config_builder.build()?;
        let defaults = Self::default();

        Ok(EngineConfig {
            default_exam_duration_seconds: read_seconds(
                &settings,
                "session.default_exam_duration_seconds",
                defaults.default_exam_duration_seconds,
            ),
            timer_critical_threshold_seconds: read_seconds(
                &settings,
                "session.timer_critical_threshold_seconds",
                defaults.timer_critical_threshold_seconds,
            ),
            free_question_limit: read_count(
                &settings,
                "unlock.free_question_limit",
                defaults.free_question_limit,
            ),
            referral_unlock_threshold: read_count(
                &settings,
                "unlock.referral_unlock_threshold",
                defaults.referral_unlock_threshold,
            ),
        })
    }
}

fn read_seconds(settings: &config::Config, key: &str, default: u32) -> u32 {
    settings
        .get_int(key)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .filter(|v| *v > 0)
        .unwrap_or(default)
}

fn read_count(settings: &config::Config, key: &str, default: u32) -> u32 {
    settings
        .get_int(key)
        .ok()
        .and_then(|v| u32::try_from(v).ok())
        .unwrap_or(default)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    #[test]
    #[serial]
    fn load_falls_back_to_defaults() {
        env::remove_var("APP_SESSION__DEFAULT_EXAM_DURATION_SECONDS");
        env::remove_var("APP_UNLOCK__REFERRAL_UNLOCK_THRESHOLD");

        let config = EngineConfig::load().unwrap();
        assert_eq!(config.default_exam_duration_seconds, 3600);
        assert_eq!(config.timer_critical_threshold_seconds, 300);
        assert_eq!(config.referral_unlock_threshold, 3);
    }

    #[test]
    #[serial]
    fn env_overrides_win() {
        env::set_var("APP_SESSION__DEFAULT_EXAM_DURATION_SECONDS", "1200");
        env::set_var("APP_UNLOCK__REFERRAL_UNLOCK_THRESHOLD", "5");

        let config = EngineConfig::load().unwrap();
        assert_eq!(config.default_exam_duration_seconds, 1200);
        assert_eq!(config.referral_unlock_threshold, 5);

        env::remove_var("APP_SESSION__DEFAULT_EXAM_DURATION_SECONDS");
        env::remove_var("APP_UNLOCK__REFERRAL_UNLOCK_THRESHOLD");
    }

    #[test]
    #[serial]
    fn zero_duration_is_rejected_in_favor_of_default() {
        env::set_var("APP_SESSION__DEFAULT_EXAM_DURATION_SECONDS", "0");

        let config = EngineConfig::load().unwrap();
        assert_eq!(config.default_exam_duration_seconds, 3600);

        env::remove_var("APP_SESSION__DEFAULT_EXAM_DURATION_SECONDS");
    }
}
