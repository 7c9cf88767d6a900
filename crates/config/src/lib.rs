pub mod schema;
pub mod watcher;

pub use schema::{GardenConfig, PageConfig, PlantConfig, ServiceConfig};
pub use watcher::ConfigWatcher;

use garden_core::{GardenError, Result, MAX_COOLDOWN_SECS, MAX_NOURISHMENT};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Load the page description from a TOML file.  Returns
/// `GardenConfig::default()` if the file doesn't exist so the client always
/// starts, just with an empty page.
pub fn load(path: impl AsRef<Path>) -> Result<GardenConfig> {
    let path = path.as_ref();
    if !path.exists() {
        tracing::warn!(
            "Page description not found at '{}'; using defaults.",
            path.display()
        );
        return Ok(GardenConfig::default());
    }

    let raw = std::fs::read_to_string(path).map_err(|source| GardenError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    parse(&raw)
}

/// Parse and validate a page description.
pub fn parse(raw: &str) -> Result<GardenConfig> {
    let config: GardenConfig =
        toml::from_str(raw).map_err(|e| GardenError::Config(format!("TOML parse error: {e}")))?;
    validate(&config)?;
    Ok(config)
}

/// Reject descriptions the widgets can't honour.
pub fn validate(config: &GardenConfig) -> Result<()> {
    if config.page.tick_ms == 0 {
        return Err(GardenError::Config("page.tick_ms must be positive".into()));
    }
    let max_ms = MAX_COOLDOWN_SECS * 1_000;
    if config.page.tick_ms > max_ms || config.page.delete_confirm_delay_ms > max_ms {
        return Err(GardenError::Config(format!(
            "page timings must not exceed {MAX_COOLDOWN_SECS}s"
        )));
    }

    let mut seen = HashSet::new();
    for plant in &config.plants {
        if plant.name.trim().is_empty() {
            return Err(GardenError::Config("plant with an empty name".into()));
        }
        if !seen.insert(plant.name.as_str()) {
            return Err(GardenError::Config(format!(
                "plant '{}' is listed twice",
                plant.name
            )));
        }
        if plant.nourishment > MAX_NOURISHMENT {
            return Err(GardenError::Config(format!(
                "plant '{}': nourishment {} exceeds {MAX_NOURISHMENT}",
                plant.name, plant.nourishment
            )));
        }
        if plant.base_cooldown_secs == 0 {
            return Err(GardenError::Config(format!(
                "plant '{}': base_cooldown_secs must be positive",
                plant.name
            )));
        }
        if plant.base_cooldown_secs > MAX_COOLDOWN_SECS
            || plant.cooldown_remaining_secs > MAX_COOLDOWN_SECS
        {
            return Err(GardenError::Config(format!(
                "plant '{}': cooldowns must not exceed {MAX_COOLDOWN_SECS}s",
                plant.name
            )));
        }
    }
    Ok(())
}

/// Return the default page description path, honouring `$XDG_CONFIG_HOME`.
pub fn default_path() -> PathBuf {
    let base = std::env::var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .unwrap_or_else(|_| {
            let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
            PathBuf::from(home).join(".config")
        });
    base.join("garden").join("garden.toml")
}

/// `$GARDEN_CONFIG` if set, otherwise [`default_path`].
pub fn resolve_path() -> PathBuf {
    std::env::var_os("GARDEN_CONFIG")
        .map(PathBuf::from)
        .unwrap_or_else(default_path)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"
        [service]
        base_url = "http://flowers.local"

        [page]
        experience = 340

        [[plants]]
        name = "rose"
        nourishment = 4
        base_cooldown_secs = 900
        cooldown_remaining_secs = 120

        [[plants]]
        name = "tulip"
        dead = true
    "#;

    #[test]
    fn parses_sample_page() {
        let config = parse(SAMPLE).unwrap();
        assert_eq!(config.service.base_url, "http://flowers.local");
        assert_eq!(config.service.timeout_secs, 10);
        assert_eq!(config.page.experience, 340);
        assert_eq!(config.page.tick_ms, 1_000);
        assert_eq!(config.plants.len(), 2);
        assert_eq!(config.plants[0].cooldown_remaining_secs, 120);
        assert!(config.plants[1].dead);
        assert_eq!(config.plants[1].base_cooldown_secs, 900);
    }

    #[test]
    fn rejects_duplicate_names() {
        let raw = r#"
            [[plants]]
            name = "rose"
            [[plants]]
            name = "rose"
        "#;
        assert!(matches!(parse(raw), Err(GardenError::Config(_))));
    }

    #[test]
    fn rejects_overfed_plant() {
        let raw = r#"
            [[plants]]
            name = "rose"
            nourishment = 22
        "#;
        assert!(parse(raw).is_err());
    }

    #[test]
    fn rejects_zero_base_cooldown() {
        let raw = r#"
            [[plants]]
            name = "rose"
            base_cooldown_secs = 0
        "#;
        assert!(parse(raw).is_err());
    }

    #[test]
    fn rejects_cooldowns_longer_than_a_year() {
        let mut config = GardenConfig::default();
        config.plants.push(PlantConfig::new("rose"));
        assert!(validate(&config).is_ok());

        config.plants[0].base_cooldown_secs = u64::MAX;
        assert!(validate(&config).is_err());

        config.plants[0].base_cooldown_secs = MAX_COOLDOWN_SECS;
        config.plants[0].cooldown_remaining_secs = MAX_COOLDOWN_SECS + 1;
        assert!(validate(&config).is_err());

        config.plants[0].cooldown_remaining_secs = MAX_COOLDOWN_SECS;
        assert!(validate(&config).is_ok());
    }

    #[test]
    fn rejects_huge_page_timings() {
        let raw = r#"
            [page]
            tick_ms = 9223372036854775807
        "#;
        assert!(matches!(parse(raw), Err(GardenError::Config(_))));
    }

    #[test]
    fn unreadable_file_is_io_error() {
        // A directory exists but can't be read as a file.
        let dir = std::env::temp_dir();
        assert!(matches!(load(&dir), Err(GardenError::Io { .. })));
    }

    #[test]
    fn missing_file_yields_defaults() {
        let config = load("/definitely/not/here/garden.toml").unwrap();
        assert!(config.plants.is_empty());
    }
}
