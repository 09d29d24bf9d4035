// src/tasks/styles.rs

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use lightningcss::stylesheet::{MinifyOptions, ParserOptions, PrinterOptions, StyleSheet};
use lightningcss::targets::{Browsers, Targets};
use parcel_sourcemap::SourceMap;
use tracing::{debug, info};

use crate::errors::TaskError;
use crate::tasks::{names, read_text, write_file, BuildTask, TaskContext, TaskReport};

/// Compiles SCSS to CSS.
///
/// Development: plain output plus a source map alongside each file.
/// Production: vendor prefixing for the configured browser matrix, then
/// minification, then a `.min` suffix inserted before the extension.
///
/// A compile error aborts this run only; previously written output stays in
/// place, and in watch mode the engine keeps the watcher and server alive.
pub struct StylesTask;

#[async_trait]
impl BuildTask for StylesTask {
    fn name(&self) -> &str {
        names::STYLES
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskReport, TaskError> {
        let files = ctx.paths.styles.resolve(&ctx.paths.source_root)?;
        let out_dir = ctx.paths.styles_out();
        let production = ctx.mode.is_production();
        let mut written = 0;

        for file in &files {
            // Sass partial convention: underscore-prefixed files are imports
            // of other sheets, never standalone outputs.
            if is_partial(file) {
                continue;
            }

            let css = grass::from_path(file, &grass::Options::default())
                .map_err(|e| TaskError::transform(file, e.to_string()))?;

            let stem = file
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_else(|| "style".to_string());

            if production {
                let minified = postprocess_production(file, &css, &ctx.browsers)?;
                let out = out_dir.join(format!("{stem}.min.css"));
                write_file(&out, minified.as_bytes())?;
                written += 1;
            } else {
                let map_name = format!("{stem}.css.map");
                let scss = read_text(file)?;
                let (code, map) = postprocess_development(file, &css, &scss, &map_name)?;
                write_file(&out_dir.join(format!("{stem}.css")), code.as_bytes())?;
                write_file(&out_dir.join(&map_name), map.as_bytes())?;
                written += 2;
            }
        }

        if written == 0 {
            debug!("no stylesheets matched; nothing to compile");
            return Ok(TaskReport::default());
        }

        info!(files = written, production, "styles compiled");
        ctx.reload.notify();
        Ok(TaskReport::new(written))
    }
}

fn is_partial(path: &Path) -> bool {
    path.file_name()
        .map(|n| n.to_string_lossy().starts_with('_'))
        .unwrap_or(false)
}

/// Prefix for the browser matrix, minify, and print compact CSS.
fn postprocess_production(
    path: &PathBuf,
    css: &str,
    browsers: &[String],
) -> Result<String, TaskError> {
    let targets = browser_targets(path, browsers)?;

    let mut sheet = parse_sheet(path, css)?;
    sheet
        .minify(MinifyOptions {
            targets: targets.clone(),
            ..MinifyOptions::default()
        })
        .map_err(|e| TaskError::transform(path, e.to_string()))?;

    let result = sheet
        .to_css(PrinterOptions {
            minify: true,
            targets,
            ..PrinterOptions::default()
        })
        .map_err(|e| TaskError::transform(path, e.to_string()))?;

    Ok(result.code)
}

/// Print readable CSS plus a source map referencing the SCSS input.
///
/// The map names the `.scss` file as the source and embeds its actual text
/// as `sourcesContent`, so devtools show the stylesheet the author edits.
fn postprocess_development(
    path: &PathBuf,
    css: &str,
    scss_source: &str,
    map_name: &str,
) -> Result<(String, String), TaskError> {
    let mut map = SourceMap::new("/");
    let source_index = map.add_source(&path.to_string_lossy());
    let _ = map.set_source_content(source_index as usize, scss_source);

    let mut sheet = parse_sheet(path, css)?;
    let result = sheet
        .to_css(PrinterOptions {
            source_map: Some(&mut map),
            ..PrinterOptions::default()
        })
        .map_err(|e| TaskError::transform(path, e.to_string()))?;

    let map_json = map
        .to_json(None)
        .map_err(|e| TaskError::transform(path, e.to_string()))?;

    let code = format!("{}\n/*# sourceMappingURL={} */\n", result.code, map_name);
    Ok((code, map_json))
}

fn parse_sheet<'a>(path: &Path, css: &'a str) -> Result<StyleSheet<'a, 'a>, TaskError> {
    StyleSheet::parse(
        css,
        ParserOptions {
            filename: path.to_string_lossy().into_owned(),
            ..ParserOptions::default()
        },
    )
    .map_err(|e| TaskError::transform(path, e.to_string()))
}

fn browser_targets(path: &Path, browsers: &[String]) -> Result<Targets, TaskError> {
    let browsers = Browsers::from_browserslist(browsers.iter().map(|s| s.as_str()))
        .map_err(|e| TaskError::transform(path, e.to_string()))?;
    Ok(Targets {
        browsers,
        ..Targets::default()
    })
}
