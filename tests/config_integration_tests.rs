//! Integration tests for ConfigManager and deck.yaml handling
//!
//! These tests verify:
//! - Loading a deck file written by hand
//! - Content paths relative to the config directory
//! - Validation of loaded decks
//! - Starting an engine from a loaded deck

use camino::Utf8PathBuf;
use slidedeck::models::{ConfigError, ContentSource, TransitionKind};
use slidedeck::{ConfigManager, Engine, MemorySurface};
use std::fs;
use tempfile::TempDir;

fn create_test_config_dir() -> (TempDir, Utf8PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let config_path = Utf8PathBuf::try_from(temp_dir.path().to_path_buf()).unwrap();
    (temp_dir, config_path)
}

fn manager(config_path: &Utf8PathBuf) -> ConfigManager {
    ConfigManager::new(config_path)
        .unwrap()
        .with_environment(config::Map::new())
}

#[test]
fn test_create_config_manager() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let manager = manager(&config_path);

    assert_eq!(manager.config_dir(), &config_path);
    assert_eq!(manager.deck_path(), config_path.join("deck.yaml"));
}

#[test]
fn test_load_hand_written_deck() {
    let (_temp_dir, config_path) = create_test_config_dir();
    fs::write(
        config_path.join("deck.yaml"),
        r##"
mount: "#talk"
content:
  file: slides/talk.md
theme: serif
transition:
  type: vertical
  easing: "cubic-bezier(0.4, 0, 0.2, 1)"
loop: true
plugins:
  progress:
    position: top
  remote:
    enabled: false
    token: abc
"##,
    )
    .unwrap();

    let deck = manager(&config_path).load_deck_config().unwrap();
    assert_eq!(deck.mount, "#talk");
    assert_eq!(
        deck.content,
        ContentSource::File(config_path.join("slides/talk.md"))
    );
    assert!(deck.loop_slides);
    assert_eq!(deck.transition.duration_ms, 400);

    let config = deck.validate().unwrap();
    assert_eq!(config.transition.kind, TransitionKind::Vertical);
    assert_eq!(config.plugins.len(), 2);
    assert!(config.plugin("progress").unwrap().enabled);
    assert!(!config.plugin("remote").unwrap().enabled);
}

#[test]
fn test_absolute_content_path_is_kept() {
    let (_temp_dir, config_path) = create_test_config_dir();
    let elsewhere = Utf8PathBuf::from("/srv/decks/talk.md");
    fs::write(
        config_path.join("deck.yaml"),
        format!("content:\n  file: {elsewhere}\n"),
    )
    .unwrap();

    let deck = manager(&config_path).load_deck_config().unwrap();
    assert_eq!(deck.content, ContentSource::File(elsewhere));
}

#[test]
fn test_loaded_deck_can_fail_validation() {
    let (_temp_dir, config_path) = create_test_config_dir();
    fs::write(
        config_path.join("deck.yaml"),
        "transition:\n  type: spin\n",
    )
    .unwrap();

    let deck = manager(&config_path).load_deck_config().unwrap();
    assert_eq!(
        deck.validate(),
        Err(ConfigError::UnknownTransition("spin".to_string()))
    );
}

#[tokio::test]
async fn test_engine_from_config_directory() {
    let (_temp_dir, config_path) = create_test_config_dir();
    fs::write(config_path.join("talk.md"), "# Hello\n---\n# World").unwrap();
    fs::write(
        config_path.join("deck.yaml"),
        "content:\n  file: talk.md\nplugins:\n  slide-number:\n    enabled: true\n",
    )
    .unwrap();

    let deck = manager(&config_path).load_deck_config().unwrap();
    let surface = MemorySurface::new();
    let engine = Engine::new(surface.clone());
    let report = engine.initialize(&deck).await.unwrap();

    assert_eq!(report.slide_count, 2);
    assert!(engine.plugin_initialized("slide-number"));
    assert_eq!(surface.last_frame().unwrap().title.as_deref(), Some("Hello"));
}
