//! Artifact emitter: heatmap and scatter plot rendering
//!
//! The analysis core hands rendering requests to an [`ArtifactEmitter`] and
//! keeps only the returned [`ArtifactHandle`]s. [`PngEmitter`] is the default
//! implementation and writes PNG files with the `image` crate.

use std::collections::HashSet;
use std::fmt;
use std::path::{Path, PathBuf};

use image::{Rgb, RgbImage};
use palette::{LinSrgb, Mix, Srgb};
use polars::prelude::DataFrame;
use serde::Serialize;
use thiserror::Error;

use crate::pipeline::{column_values, AnalysisError, CorrelationMatrix, RankedPairs, VariablePair};

/// Opaque reference to a rendered image (a file path for [`PngEmitter`])
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct ArtifactHandle(PathBuf);

impl ArtifactHandle {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl fmt::Display for ArtifactHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.display())
    }
}

/// Rendering failures. Any of these aborts the analysis stage.
#[derive(Debug, Error)]
pub enum ArtifactError {
    #[error("failed to create plot directory {path}")]
    CreateDir {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write image {path}")]
    Write {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("cannot render an empty correlation matrix")]
    EmptyMatrix,

    #[error("failed to read plot data")]
    Data(#[from] AnalysisError),

    #[error("{0}")]
    Other(String),
}

/// Rendering collaborator called by the analysis stage.
///
/// The stage calls `render_matrix` once, then `render_pair` once per ranked
/// pair in ranked order, and attaches each returned handle to its request.
pub trait ArtifactEmitter {
    fn render_matrix(&mut self, matrix: &CorrelationMatrix)
        -> Result<ArtifactHandle, ArtifactError>;

    fn render_pair(
        &mut self,
        data: &DataFrame,
        pair: &VariablePair,
    ) -> Result<ArtifactHandle, ArtifactError>;
}

/// Handles attached to the requests that produced them
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct AnalysisArtifacts {
    pub heatmap: ArtifactHandle,
    pub scatters: Vec<PairArtifact>,
}

/// A ranked pair with its scatter plot
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PairArtifact {
    pub pair: VariablePair,
    pub handle: ArtifactHandle,
}

impl AnalysisArtifacts {
    /// All handles in request order: heatmap first, then scatters by rank
    pub fn handles(&self) -> impl Iterator<Item = &ArtifactHandle> {
        std::iter::once(&self.heatmap).chain(self.scatters.iter().map(|s| &s.handle))
    }
}

/// Request the heatmap, then one scatter per ranked pair, failing on the first error
pub fn emit_artifacts(
    emitter: &mut dyn ArtifactEmitter,
    data: &DataFrame,
    matrix: &CorrelationMatrix,
    ranked: &RankedPairs,
) -> Result<AnalysisArtifacts, ArtifactError> {
    let heatmap = emitter.render_matrix(matrix)?;
    log::debug!("Rendered correlation heatmap: {}", heatmap);

    let mut scatters = Vec::with_capacity(ranked.len());
    for pair in ranked.iter() {
        let handle = emitter.render_pair(data, pair)?;
        log::debug!("Rendered {} vs {}: {}", pair.first, pair.second, handle);
        scatters.push(PairArtifact {
            pair: pair.clone(),
            handle,
        });
    }

    Ok(AnalysisArtifacts { heatmap, scatters })
}

/// File name for a pair's scatter plot, restricted to `[A-Za-z0-9_-]`
pub fn scatter_file_name(pair: &VariablePair) -> String {
    format!(
        "{}_vs_{}.png",
        sanitize_file_stem(&pair.first),
        sanitize_file_stem(&pair.second)
    )
}

fn sanitize_file_stem(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '_' || c == '-' {
                c
            } else {
                '_'
            }
        })
        .collect()
}

// Cell size of the heatmap and canvas of the scatter plot, in pixels
const HEATMAP_CELL: u32 = 48;
const HEATMAP_MARGIN: u32 = 16;
const LEGEND_GAP: u32 = 16;
const LEGEND_WIDTH: u32 = 24;
const SCATTER_WIDTH: u32 = 800;
const SCATTER_HEIGHT: u32 = 500;
const SCATTER_MARGIN: u32 = 40;
const POINT_RADIUS: i64 = 3;
const POINT_ALPHA: f32 = 0.5;

const BACKGROUND: Rgb<u8> = Rgb([255, 255, 255]);
const FRAME: Rgb<u8> = Rgb([120, 120, 120]);
const UNDEFINED_CELL: Rgb<u8> = Rgb([190, 190, 190]);
const POINT: Rgb<u8> = Rgb([31, 119, 180]);

/// Writes `heatmap.png` and `<a>_vs_<b>.png` into a plots directory.
///
/// The heatmap carries no text (the `image` crate has no font rendering): cells
/// follow the matrix's column order, a colour scale from -1 (top) to +1
/// (bottom) sits on the right, and undefined cells are grey. The report places
/// the labelled matrix table next to it.
#[derive(Debug, Clone)]
pub struct PngEmitter {
    output_dir: PathBuf,
    /// File names handed out since the last heatmap
    issued: HashSet<String>,
}

impl PngEmitter {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
            issued: HashSet::new(),
        }
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    /// Distinct pairs can sanitise to the same stem; suffix repeats with `_2`, `_3`, ...
    fn unique_file_name(&mut self, file_name: String) -> String {
        let stem = file_name.trim_end_matches(".png").to_string();
        let mut candidate = file_name;
        let mut n = 2;
        while self.issued.contains(&candidate) {
            candidate = format!("{}_{}.png", stem, n);
            n += 1;
        }
        self.issued.insert(candidate.clone());
        candidate
    }

    fn save(&self, image: &RgbImage, file_name: &str) -> Result<ArtifactHandle, ArtifactError> {
        std::fs::create_dir_all(&self.output_dir).map_err(|source| ArtifactError::CreateDir {
            path: self.output_dir.clone(),
            source,
        })?;

        let path = self.output_dir.join(file_name);
        image.save(&path).map_err(|source| ArtifactError::Write {
            path: path.clone(),
            source,
        })?;

        Ok(ArtifactHandle::new(path))
    }
}

impl ArtifactEmitter for PngEmitter {
    fn render_matrix(
        &mut self,
        matrix: &CorrelationMatrix,
    ) -> Result<ArtifactHandle, ArtifactError> {
        if matrix.is_empty() {
            return Err(ArtifactError::EmptyMatrix);
        }
        // A heatmap starts a new analysis run
        self.issued.clear();
        self.issued.insert("heatmap.png".to_string());

        let n = matrix.len() as u32;
        let grid = n * HEATMAP_CELL;
        let side = grid + 2 * HEATMAP_MARGIN;
        let width = side + LEGEND_GAP + LEGEND_WIDTH;
        let mut img = RgbImage::from_pixel(width, side, BACKGROUND);

        for i in 0..n {
            for j in 0..n {
                let colour = coolwarm(matrix.value(i as usize, j as usize));
                let x0 = HEATMAP_MARGIN + j * HEATMAP_CELL;
                let y0 = HEATMAP_MARGIN + i * HEATMAP_CELL;
                // 1px gutter between cells
                for y in y0..(y0 + HEATMAP_CELL - 1) {
                    for x in x0..(x0 + HEATMAP_CELL - 1) {
                        img.put_pixel(x, y, colour);
                    }
                }
            }
        }
        draw_legend(&mut img, side - HEATMAP_MARGIN + LEGEND_GAP, HEATMAP_MARGIN, grid);

        self.save(&img, "heatmap.png")
    }

    fn render_pair(
        &mut self,
        data: &DataFrame,
        pair: &VariablePair,
    ) -> Result<ArtifactHandle, ArtifactError> {
        let xs = column_values(data, &pair.first)?;
        let ys = column_values(data, &pair.second)?;

        let mut img = RgbImage::from_pixel(SCATTER_WIDTH, SCATTER_HEIGHT, BACKGROUND);
        let left = SCATTER_MARGIN;
        let top = SCATTER_MARGIN;
        let right = SCATTER_WIDTH - SCATTER_MARGIN;
        let bottom = SCATTER_HEIGHT - SCATTER_MARGIN;
        draw_frame(&mut img, left, top, right, bottom);

        let x_axis = Axis::fit(&xs, left as f64, right as f64);
        let y_axis = Axis::fit(&ys, bottom as f64, top as f64);

        for (&x, &y) in xs.iter().zip(ys.iter()) {
            if !x.is_finite() || !y.is_finite() {
                continue;
            }
            let px = x_axis.project(x).round() as i64;
            let py = y_axis.project(y).round() as i64;
            draw_point(&mut img, px, py);
        }

        let file_name = self.unique_file_name(scatter_file_name(pair));
        self.save(&img, &file_name)
    }
}

/// Diverging blue-white-red scale over [-1, 1]; NaN maps to grey
fn coolwarm(r: f64) -> Rgb<u8> {
    if r.is_nan() {
        return UNDEFINED_CELL;
    }

    let cold: LinSrgb<f32> = Srgb::new(59u8, 76, 192).into_format::<f32>().into_linear();
    let neutral: LinSrgb<f32> = Srgb::new(221u8, 221, 221).into_format::<f32>().into_linear();
    let warm: LinSrgb<f32> = Srgb::new(180u8, 4, 38).into_format::<f32>().into_linear();

    let t = r.clamp(-1.0, 1.0) as f32;
    let mixed = if t < 0.0 {
        neutral.mix(cold, -t)
    } else {
        neutral.mix(warm, t)
    };

    let rgb: Srgb<u8> = Srgb::<f32>::from_linear(mixed).into_format();
    Rgb([rgb.red, rgb.green, rgb.blue])
}

/// Linear map from data range to pixel range, padded by 5%
struct Axis {
    min: f64,
    span: f64,
    start: f64,
    end: f64,
}

impl Axis {
    fn fit(values: &[f64], start: f64, end: f64) -> Self {
        let (lo, hi) = values
            .iter()
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        if !lo.is_finite() || hi <= lo {
            // Degenerate range: centre everything
            let centre = if lo.is_finite() { lo } else { 0.0 };
            return Self {
                min: centre - 1.0,
                span: 2.0,
                start,
                end,
            };
        }

        let pad = (hi - lo) * 0.05;
        Self {
            min: lo - pad,
            span: (hi - lo) + 2.0 * pad,
            start,
            end,
        }
    }

    fn project(&self, v: f64) -> f64 {
        self.start + (v - self.min) / self.span * (self.end - self.start)
    }
}

/// Vertical colour scale: -1 at the top, +1 at the bottom
fn draw_legend(img: &mut RgbImage, left: u32, top: u32, height: u32) {
    let span = height.saturating_sub(1).max(1) as f64;
    for dy in 0..height {
        let colour = coolwarm(-1.0 + 2.0 * dy as f64 / span);
        for x in left..(left + LEGEND_WIDTH) {
            img.put_pixel(x, top + dy, colour);
        }
    }
    draw_frame(img, left, top, left + LEGEND_WIDTH - 1, top + height - 1);
}

fn draw_frame(img: &mut RgbImage, left: u32, top: u32, right: u32, bottom: u32) {
    for x in left..=right {
        img.put_pixel(x, top, FRAME);
        img.put_pixel(x, bottom, FRAME);
    }
    for y in top..=bottom {
        img.put_pixel(left, y, FRAME);
        img.put_pixel(right, y, FRAME);
    }
}

/// Filled circle, alpha-blended over what is already drawn
fn draw_point(img: &mut RgbImage, cx: i64, cy: i64) {
    let (width, height) = (img.width() as i64, img.height() as i64);
    for dy in -POINT_RADIUS..=POINT_RADIUS {
        for dx in -POINT_RADIUS..=POINT_RADIUS {
            if dx * dx + dy * dy > POINT_RADIUS * POINT_RADIUS {
                continue;
            }
            let (x, y) = (cx + dx, cy + dy);
            if x < 0 || y < 0 || x >= width || y >= height {
                continue;
            }
            let pixel = img.get_pixel_mut(x as u32, y as u32);
            for c in 0..3 {
                let blended =
                    pixel.0[c] as f32 * (1.0 - POINT_ALPHA) + POINT.0[c] as f32 * POINT_ALPHA;
                pixel.0[c] = blended.round() as u8;
            }
        }
    }
}
