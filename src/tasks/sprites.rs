// src/tasks/sprites.rs

use std::path::Path;

use async_trait::async_trait;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::errors::TaskError;
use crate::tasks::images::clean_svg;
use crate::tasks::{names, read_text, write_file, BuildTask, TaskContext, TaskReport};

/// Bundles the icon SVG subtree into one sprite document.
///
/// Each icon becomes a `<symbol>` whose id is the source file stem, so a
/// page can reference `img/sprites/sprite.svg#star`. The icon subtree is
/// disjoint from the general image set by a negation pattern.
pub struct SpritesTask;

#[async_trait]
impl BuildTask for SpritesTask {
    fn name(&self) -> &str {
        names::SPRITES
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskReport, TaskError> {
        let files = ctx.paths.sprites.resolve(&ctx.paths.source_root)?;
        if files.is_empty() {
            debug!("no icon SVGs matched; no sprite written");
            return Ok(TaskReport::default());
        }

        let mut symbols = String::new();
        for file in &files {
            let content = read_text(file)?;
            symbols.push_str(&icon_symbol(file, &content)?);
            symbols.push('\n');
        }

        let sprite = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" \
             xmlns:xlink=\"http://www.w3.org/1999/xlink\">\n{symbols}</svg>\n"
        );

        let out = ctx.paths.sprites_out().join("sprite.svg");
        write_file(&out, sprite.as_bytes())?;

        info!(icons = files.len(), path = ?out, "sprite bundled");
        ctx.reload.notify();
        Ok(TaskReport::new(1))
    }
}

static SVG_OPEN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?s)<svg\b([^>]*)>").unwrap());
static VIEW_BOX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"viewBox\s*=\s*"([^"]*)""#).unwrap());

/// Convert one icon document into a `<symbol>` addressable by fragment id.
fn icon_symbol(path: &Path, content: &str) -> Result<String, TaskError> {
    let cleaned = clean_svg(content);

    let open = SVG_OPEN
        .captures(&cleaned)
        .ok_or_else(|| TaskError::transform(path, "missing <svg> root element"))?;
    let attrs = open.get(1).map(|m| m.as_str()).unwrap_or("");

    let body_start = open.get(0).map(|m| m.end()).unwrap_or(0);
    let body_end = cleaned
        .rfind("</svg>")
        .ok_or_else(|| TaskError::transform(path, "missing </svg> close tag"))?;
    if body_end < body_start {
        return Err(TaskError::transform(path, "malformed svg document"));
    }
    let inner = &cleaned[body_start..body_end];

    let id = path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "icon".to_string());

    let view_box = VIEW_BOX
        .captures(attrs)
        .and_then(|c| c.get(1))
        .map(|m| format!(" viewBox=\"{}\"", m.as_str()))
        .unwrap_or_default();

    Ok(format!("<symbol id=\"{id}\"{view_box}>{inner}</symbol>"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Mode, PathsConfig};
    use crate::server::ReloadHub;

    fn ctx(root: &std::path::Path) -> TaskContext {
        let mut paths = PathsConfig::default();
        paths.source_root = root.join("src");
        paths.build_root = root.join("dist");
        TaskContext {
            mode: Mode::Development,
            paths,
            browsers: Vec::new(),
            reload: ReloadHub::new(),
        }
    }

    #[test]
    fn icon_becomes_symbol_with_stem_id_and_viewbox() {
        let svg = "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 24 24\">\
                   <path d=\"M0 0h24v24z\"/></svg>";
        let symbol = icon_symbol(Path::new("icons/star.svg"), svg).unwrap();
        assert!(symbol.starts_with("<symbol id=\"star\" viewBox=\"0 0 24 24\">"));
        assert!(symbol.contains("<path d=\"M0 0h24v24z\"/>"));
        assert!(symbol.ends_with("</symbol>"));
    }

    #[test]
    fn icon_without_root_element_is_rejected() {
        let err = icon_symbol(Path::new("bad.svg"), "<rect/>").unwrap_err();
        assert!(matches!(err, TaskError::Transform { .. }));
    }

    #[tokio::test]
    async fn bundles_all_icons_into_one_document() {
        let tmp = tempfile::tempdir().unwrap();
        let svg_dir = tmp.path().join("src/img/svg");
        std::fs::create_dir_all(&svg_dir).unwrap();
        std::fs::write(
            svg_dir.join("star.svg"),
            "<svg viewBox=\"0 0 8 8\"><path d=\"M0 0\"/></svg>",
        )
        .unwrap();
        std::fs::write(
            svg_dir.join("moon.svg"),
            "<svg viewBox=\"0 0 8 8\"><circle r=\"4\"/></svg>",
        )
        .unwrap();

        SpritesTask.run(&ctx(tmp.path())).await.unwrap();

        let sprite = std::fs::read_to_string(
            tmp.path().join("dist/img/sprites/sprite.svg"),
        )
        .unwrap();
        assert!(sprite.contains("<symbol id=\"star\""));
        assert!(sprite.contains("<symbol id=\"moon\""));
        assert!(sprite.starts_with("<svg xmlns="));
    }

    #[tokio::test]
    async fn no_icons_means_no_sprite() {
        let tmp = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(tmp.path().join("src")).unwrap();

        let report = SpritesTask.run(&ctx(tmp.path())).await.unwrap();
        assert_eq!(report.files_written, 0);
        assert!(!tmp.path().join("dist/img/sprites/sprite.svg").exists());
    }
}
