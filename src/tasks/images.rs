// src/tasks/images.rs

use std::io::Cursor;
use std::path::Path;

use async_trait::async_trait;
use image::codecs::gif::{GifDecoder, GifEncoder, Repeat};
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::{CompressionType, FilterType, PngEncoder};
use image::AnimationDecoder;
use once_cell::sync::Lazy;
use regex::Regex;
use tracing::{debug, info};

use crate::errors::TaskError;
use crate::tasks::{names, read_file, read_text, write_file, BuildTask, TaskContext, TaskReport};

/// Optimizes raster images and cleans standalone SVGs.
///
/// Development copies every file unchanged. Production routes each file
/// through the codec for its type; exactly one codec applies per file, and
/// unknown extensions fall back to a plain copy.
pub struct ImagesTask;

#[async_trait]
impl BuildTask for ImagesTask {
    fn name(&self) -> &str {
        names::IMAGES
    }

    async fn run(&self, ctx: &TaskContext) -> Result<TaskReport, TaskError> {
        let files = ctx.paths.images.resolve(&ctx.paths.source_root)?;
        if files.is_empty() {
            debug!("no images matched; nothing to process");
            return Ok(TaskReport::default());
        }

        let out_dir = ctx.paths.images_out();
        let production = ctx.mode.is_production();
        let mut written = 0;

        for file in &files {
            let out = out_dir.join(ctx.paths.output_rel(file, "img"));

            if production {
                let bytes = optimize(file)?;
                write_file(&out, &bytes)?;
            } else {
                write_file(&out, &read_file(file)?)?;
            }
            written += 1;
        }

        info!(files = written, production, "images processed");
        ctx.reload.notify();
        Ok(TaskReport::new(written))
    }
}

/// Route one file through the type-appropriate codec.
fn optimize(path: &Path) -> Result<Vec<u8>, TaskError> {
    let ext = path
        .extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "png" => recompress_png(path),
        "jpg" | "jpeg" => recompress_jpeg(path),
        "gif" => recompress_gif(path),
        "svg" => Ok(clean_svg(&read_text(path)?).into_bytes()),
        _ => read_file(path),
    }
}

/// Re-encode at maximum compression, standing in for the quantize +
/// recompress pair of the classic toolchain.
fn recompress_png(path: &Path) -> Result<Vec<u8>, TaskError> {
    let img = image::open(path).map_err(|e| TaskError::transform(path, e.to_string()))?;
    let mut buf = Vec::new();
    let encoder = PngEncoder::new_with_quality(
        Cursor::new(&mut buf),
        CompressionType::Best,
        FilterType::Adaptive,
    );
    img.write_with_encoder(encoder)
        .map_err(|e| TaskError::transform(path, e.to_string()))?;
    Ok(buf)
}

/// Quality-70 re-encode.
fn recompress_jpeg(path: &Path) -> Result<Vec<u8>, TaskError> {
    let img = image::open(path).map_err(|e| TaskError::transform(path, e.to_string()))?;
    let mut buf = Vec::new();
    let encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buf), 70);
    img.write_with_encoder(encoder)
        .map_err(|e| TaskError::transform(path, e.to_string()))?;
    Ok(buf)
}

/// Speed-10 re-encode, frame by frame so animations survive.
fn recompress_gif(path: &Path) -> Result<Vec<u8>, TaskError> {
    let file = std::fs::File::open(path).map_err(|e| TaskError::io(path, e))?;
    let decoder = GifDecoder::new(std::io::BufReader::new(file))
        .map_err(|e| TaskError::transform(path, e.to_string()))?;
    let frames = decoder
        .into_frames()
        .collect_frames()
        .map_err(|e| TaskError::transform(path, e.to_string()))?;

    let mut buf = Vec::new();
    {
        let mut encoder = GifEncoder::new_with_speed(Cursor::new(&mut buf), 10);
        encoder
            .set_repeat(Repeat::Infinite)
            .map_err(|e| TaskError::transform(path, e.to_string()))?;
        encoder
            .encode_frames(frames)
            .map_err(|e| TaskError::transform(path, e.to_string()))?;
    }
    Ok(buf)
}

static SVG_COMMENT: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<!--.*?-->").unwrap());
static SVG_EMPTY_ATTR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r#"\s+[A-Za-z_][\w:.-]*="""#).unwrap());
static SVG_INTER_TAG_WS: Lazy<Regex> = Lazy::new(|| Regex::new(r">\s+<").unwrap());

/// Strip comments, empty attributes, and inter-tag whitespace.
///
/// `viewBox`, namespace declarations, and `id` attributes are left intact;
/// icons referenced by fragment identifier depend on them.
pub(crate) fn clean_svg(svg: &str) -> String {
    let cleaned = SVG_COMMENT.replace_all(svg, "");
    let cleaned = SVG_EMPTY_ATTR.replace_all(&cleaned, "");
    let cleaned = SVG_INTER_TAG_WS.replace_all(&cleaned, "><");
    cleaned.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::model::{Mode, PathsConfig};
    use crate::server::ReloadHub;

    fn ctx(root: &std::path::Path, mode: Mode) -> TaskContext {
        let mut paths = PathsConfig::default();
        paths.source_root = root.join("src");
        paths.build_root = root.join("dist");
        TaskContext {
            mode,
            paths,
            browsers: Vec::new(),
            reload: ReloadHub::new(),
        }
    }

    const SVG: &str = "<svg xmlns=\"http://www.w3.org/2000/svg\" viewBox=\"0 0 16 16\">\n  \
                       <!-- a comment -->\n  <path id=\"p\" stroke=\"\" d=\"M0 0h16v16z\"/>\n</svg>\n";

    #[test]
    fn clean_svg_strips_noise_but_keeps_viewbox_and_ids() {
        let cleaned = clean_svg(SVG);
        assert!(!cleaned.contains("<!--"));
        assert!(!cleaned.contains("stroke=\"\""));
        assert!(cleaned.contains("viewBox=\"0 0 16 16\""));
        assert!(cleaned.contains("id=\"p\""));
        assert!(cleaned.contains("xmlns="));
    }

    #[tokio::test]
    async fn development_copies_unchanged() {
        let tmp = tempfile::tempdir().unwrap();
        let img_dir = tmp.path().join("src/img");
        std::fs::create_dir_all(&img_dir).unwrap();
        std::fs::write(img_dir.join("icon.svg"), SVG).unwrap();

        ImagesTask.run(&ctx(tmp.path(), Mode::Development)).await.unwrap();

        let out = std::fs::read_to_string(tmp.path().join("dist/img/icon.svg")).unwrap();
        assert_eq!(out, SVG);
    }

    #[tokio::test]
    async fn production_cleans_svg_and_recompresses_png() {
        let tmp = tempfile::tempdir().unwrap();
        let img_dir = tmp.path().join("src/img");
        std::fs::create_dir_all(&img_dir).unwrap();
        std::fs::write(img_dir.join("icon.svg"), SVG).unwrap();
        image::RgbaImage::from_pixel(4, 4, image::Rgba([10, 20, 30, 255]))
            .save(img_dir.join("dot.png"))
            .unwrap();

        ImagesTask.run(&ctx(tmp.path(), Mode::Production)).await.unwrap();

        let svg = std::fs::read_to_string(tmp.path().join("dist/img/icon.svg")).unwrap();
        assert!(!svg.contains("<!--"));
        assert!(svg.contains("viewBox"));

        let png = image::open(tmp.path().join("dist/img/dot.png")).unwrap();
        assert_eq!(png.to_rgba8().get_pixel(0, 0), &image::Rgba([10, 20, 30, 255]));
    }

    #[tokio::test]
    async fn production_keeps_gif_animation_frames() {
        let tmp = tempfile::tempdir().unwrap();
        let img_dir = tmp.path().join("src/img");
        std::fs::create_dir_all(&img_dir).unwrap();

        let mut bytes = Vec::new();
        {
            let mut encoder = GifEncoder::new(Cursor::new(&mut bytes));
            for shade in [60u8, 200] {
                let frame = image::Frame::new(image::RgbaImage::from_pixel(
                    4,
                    4,
                    image::Rgba([shade, 0, 0, 255]),
                ));
                encoder.encode_frame(frame).unwrap();
            }
        }
        std::fs::write(img_dir.join("anim.gif"), &bytes).unwrap();

        ImagesTask.run(&ctx(tmp.path(), Mode::Production)).await.unwrap();

        let out = std::fs::File::open(tmp.path().join("dist/img/anim.gif")).unwrap();
        let decoder = GifDecoder::new(std::io::BufReader::new(out)).unwrap();
        let frames = decoder.into_frames().collect_frames().unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[tokio::test]
    async fn icon_subtree_is_left_to_the_sprite_task() {
        let tmp = tempfile::tempdir().unwrap();
        let svg_dir = tmp.path().join("src/img/svg");
        std::fs::create_dir_all(&svg_dir).unwrap();
        std::fs::write(svg_dir.join("star.svg"), SVG).unwrap();

        let report = ImagesTask.run(&ctx(tmp.path(), Mode::Development)).await.unwrap();
        assert_eq!(report.files_written, 0);
        assert!(!tmp.path().join("dist/img/svg/star.svg").exists());
    }
}
