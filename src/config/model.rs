// src/config/model.rs

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::fileset::PathSet;

/// Build mode, chosen once at startup from the `--production` flag.
///
/// The mode is threaded into each task through the shared context rather than
/// read from a global, so a task always observes the value it was constructed
/// with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Development,
    Production,
}

impl Mode {
    pub fn is_production(self) -> bool {
        matches!(self, Mode::Production)
    }
}

/// Top-level configuration as read from a TOML file.
///
/// All sections are optional; the defaults describe the conventional layout:
///
/// ```toml
/// [paths]
/// source_root = "src"
/// build_root = "dist"
/// templates = ["views/**/*.html", "!views/utils/**"]
///
/// [server]
/// port = 9000
///
/// [watch]
/// debounce_ms = 200
/// ```
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ConfigFile {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub server: ServerSection,

    #[serde(default)]
    pub watch: WatchSection,

    #[serde(default)]
    pub styles: StylesSection,
}

/// `[paths]` section: fixed source roots and the output tree.
///
/// Output subtrees are disjoint by construction (pages at the top level,
/// compiled CSS under `styles/`, images under `img/`, the icon sprite under
/// `img/sprites/`), so tasks never write into each other's territory.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    #[serde(default = "default_source_root")]
    pub source_root: PathBuf,

    #[serde(default = "default_build_root")]
    pub build_root: PathBuf,

    /// Page templates; the `views/utils/` subtree holds render-time partials
    /// that never become standalone outputs.
    #[serde(default = "default_templates")]
    pub templates: PathSet,

    #[serde(default = "default_styles")]
    pub styles: PathSet,

    /// General images. The icon SVG subtree is carved out by a negation so
    /// the image and sprite sets stay disjoint.
    #[serde(default = "default_images")]
    pub images: PathSet,

    /// SVG icons bundled into the sprite sheet.
    #[serde(default = "default_sprites")]
    pub sprites: PathSet,

    /// Single server configuration file copied verbatim to the output root.
    #[serde(default = "default_server_config")]
    pub server_config: String,
}

fn default_source_root() -> PathBuf {
    PathBuf::from("src")
}

fn default_build_root() -> PathBuf {
    PathBuf::from("dist")
}

fn default_templates() -> PathSet {
    PathSet::new(&["views/**/*.html", "!views/utils/**"])
}

fn default_styles() -> PathSet {
    PathSet::new(&["styles/**/*.scss"])
}

fn default_images() -> PathSet {
    PathSet::new(&["img/**/*.{jpg,jpeg,png,gif,svg}", "!img/svg/**"])
}

fn default_sprites() -> PathSet {
    PathSet::new(&["img/svg/*.svg"])
}

fn default_server_config() -> String {
    ".htaccess".to_string()
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            source_root: default_source_root(),
            build_root: default_build_root(),
            templates: default_templates(),
            styles: default_styles(),
            images: default_images(),
            sprites: default_sprites(),
            server_config: default_server_config(),
        }
    }
}

impl PathsConfig {
    /// Output directory for compiled CSS.
    pub fn styles_out(&self) -> PathBuf {
        self.build_root.join("styles")
    }

    /// Output directory for processed images.
    pub fn images_out(&self) -> PathBuf {
        self.build_root.join("img")
    }

    /// Output directory for the icon sprite.
    pub fn sprites_out(&self) -> PathBuf {
        self.build_root.join("img").join("sprites")
    }

    /// Source subtree for templates, used as the template loader root.
    pub fn views_root(&self) -> PathBuf {
        self.source_root.join("views")
    }

    /// Strip `source_root` (and, when present, the leading `subtree`
    /// component) from an absolute source path, yielding the output-relative
    /// path. Falls back to the bare file name for paths outside the subtree.
    pub fn output_rel(&self, path: &Path, subtree: &str) -> PathBuf {
        let rel = path.strip_prefix(&self.source_root).unwrap_or(path);
        match rel.strip_prefix(subtree) {
            Ok(stripped) => stripped.to_path_buf(),
            Err(_) => PathBuf::from(rel.file_name().unwrap_or(rel.as_os_str())),
        }
    }
}

/// `[server]` section for the development server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerSection {
    #[serde(default = "default_port")]
    pub port: u16,

    /// Bind `0.0.0.0` and log the externally reachable URL instead of
    /// binding loopback only.
    #[serde(default)]
    pub external: bool,
}

fn default_port() -> u16 {
    9000
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            port: default_port(),
            external: false,
        }
    }
}

/// `[watch]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct WatchSection {
    /// Change events within this window collapse into one rebuild batch.
    #[serde(default = "default_debounce_ms")]
    pub debounce_ms: u64,
}

fn default_debounce_ms() -> u64 {
    200
}

impl Default for WatchSection {
    fn default() -> Self {
        Self {
            debounce_ms: default_debounce_ms(),
        }
    }
}

/// `[styles]` section.
#[derive(Debug, Clone, Deserialize)]
pub struct StylesSection {
    /// Browserslist queries used for vendor prefixing in production.
    #[serde(default = "default_browsers")]
    pub browsers: Vec<String>,
}

fn default_browsers() -> Vec<String> {
    vec!["last 12 versions".to_string(), "> 1%".to_string()]
}

impl Default for StylesSection {
    fn default() -> Self {
        Self {
            browsers: default_browsers(),
        }
    }
}
