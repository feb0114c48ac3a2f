use std::{collections::BTreeMap, path::PathBuf};

use snafu::ResultExt as _;

use crate::{Grid, PolysurfError, RenderSnafu, Surface};

/// Identifies one live figure produced by a [`RenderPipeline`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct FigureHandle(u64);

impl FigureHandle {
    pub fn new(id: u64) -> Self {
        Self(id)
    }

    pub fn id(self) -> u64 {
        self.0
    }
}

/// Turns evaluated surfaces into a displayable figure.
///
/// `render` is synchronous and returns once the figure is ready. `dispose` must free
/// everything tied to the figure; callers dispose the previous figure before rendering
/// the next one.
pub trait RenderPipeline {
    fn render(
        &mut self,
        panels: &[(Surface, String)],
        grid: &Grid,
    ) -> Result<FigureHandle, PolysurfError>;

    fn dispose(&mut self, figure: FigureHandle) -> Result<(), PolysurfError>;
}

const PANEL_SIZE: f64 = 360.0;
const TITLE_HEIGHT: f64 = 28.0;
const COLORBAR_WIDTH: f64 = 56.0;
const MARGIN: f64 = 12.0;
/// Height of the box the surface is drawn in, relative to its x/y extent.
const Z_SCALE: f64 = 0.4;

/// Orthographic camera looking at the origin from spherical angles (radians).
#[derive(Clone, Copy, Debug)]
pub struct Camera {
    pub azimuth: f64,
    pub elevation: f64,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            azimuth: -1.07,
            elevation: 0.63,
        }
    }
}

impl Camera {
    fn project(&self, p: [f64; 3]) -> (f64, f64) {
        let (sa, ca) = self.azimuth.sin_cos();
        let (se, ce) = self.elevation.sin_cos();
        let sx = -p[0] * sa + p[1] * ca;
        let sy = -p[0] * ca * se - p[1] * sa * se + p[2] * ce;
        (sx, sy)
    }

    /// Distance along the view direction; larger is further away.
    fn depth(&self, p: [f64; 3]) -> f64 {
        let (sa, ca) = self.azimuth.sin_cos();
        let (se, ce) = self.elevation.sin_cos();
        -(p[0] * ce * ca + p[1] * ce * sa + p[2] * se)
    }
}

struct Facet {
    screen: [(f64, f64); 3],
    depth: f64,
    rgb: (u8, u8, u8),
}

/// Renders each surface as a shaded, depth-sorted triangle mesh in an SVG document.
///
/// One document is kept per live figure. When `out_path` is set the latest figure is
/// also written there, which is how the figure is "displayed".
#[derive(Debug, Default)]
pub struct SvgRenderer {
    figures: BTreeMap<FigureHandle, String>,
    next_id: u64,
    camera: Camera,
    out_path: Option<PathBuf>,
}

impl SvgRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_output(mut self, path: impl Into<PathBuf>) -> Self {
        self.out_path = Some(path.into());
        self
    }

    pub fn with_camera(mut self, camera: Camera) -> Self {
        self.camera = camera;
        self
    }

    /// SVG source of a live figure.
    pub fn document(&self, figure: FigureHandle) -> Option<&str> {
        self.figures.get(&figure).map(String::as_str)
    }

    pub fn live_figures(&self) -> usize {
        self.figures.len()
    }

    fn panel_svg(&self, surface: &Surface, label: &str, grid: &Grid, origin_x: f64) -> String {
        let mut svg = String::new();
        let center_x = origin_x + PANEL_SIZE / 2.0;
        svg.push_str(&format!(
            "<text x=\"{center_x:.1}\" y=\"{:.1}\" text-anchor=\"middle\" font-size=\"14\">{}</text>\n",
            TITLE_HEIGHT - 8.0,
            escape(label)
        ));

        let Some((z_lo, z_hi)) = surface.min_max() else {
            return svg;
        };
        let facets = self.facets(surface, grid, z_lo, z_hi);
        if facets.is_empty() {
            return svg;
        }

        // Fit projected coordinates into the panel box.
        let (mut min_x, mut max_x, mut min_y, mut max_y) = (f64::MAX, f64::MIN, f64::MAX, f64::MIN);
        for (x, y) in facets.iter().flat_map(|f| f.screen) {
            min_x = min_x.min(x);
            max_x = max_x.max(x);
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        let draw_w = PANEL_SIZE - COLORBAR_WIDTH - 2.0 * MARGIN;
        let draw_h = PANEL_SIZE - 2.0 * MARGIN;
        let scale = (draw_w / (max_x - min_x).max(1e-12)).min(draw_h / (max_y - min_y).max(1e-12));
        let to_px = |(x, y): (f64, f64)| {
            (
                origin_x + MARGIN + (x - min_x) * scale,
                // SVG y grows downwards.
                TITLE_HEIGHT + MARGIN + (max_y - y) * scale,
            )
        };

        for facet in &facets {
            let [a, b, c] = facet.screen.map(to_px);
            let (r, g, bl) = facet.rgb;
            svg.push_str(&format!(
                "<polygon points=\"{:.2},{:.2} {:.2},{:.2} {:.2},{:.2}\" fill=\"rgb({r},{g},{bl})\" stroke=\"rgb({r},{g},{bl})\" stroke-width=\"0.3\"/>\n",
                a.0, a.1, b.0, b.1, c.0, c.1
            ));
        }

        svg.push_str(&colorbar_svg(origin_x + PANEL_SIZE - COLORBAR_WIDTH, z_lo, z_hi));
        svg
    }

    fn facets(&self, surface: &Surface, grid: &Grid, z_lo: f64, z_hi: f64) -> Vec<Facet> {
        let (rows, cols) = surface.shape();
        let ((x_min, x_max), (y_min, y_max)) = grid.bounds();
        let z_range = if (z_hi - z_lo).abs() < 1e-15 { 1.0 } else { z_hi - z_lo };
        let unit = |v: f64, lo: f64, hi: f64| (v - lo) / (hi - lo) * 2.0 - 1.0;
        let vertex = |row: usize, col: usize| -> Option<([f64; 3], f64)> {
            let z = surface.get(row, col);
            if !z.is_finite() {
                return None;
            }
            let t = (z - z_lo) / z_range;
            let p = [
                unit(grid.xs[col], x_min, x_max),
                unit(grid.ys[row], y_min, y_max),
                (t * 2.0 - 1.0) * Z_SCALE,
            ];
            Some((p, t))
        };

        let mut facets = Vec::with_capacity(2 * rows.saturating_sub(1) * cols.saturating_sub(1));
        for (row, col) in itertools::iproduct!(0..rows.saturating_sub(1), 0..cols.saturating_sub(1)) {
            let corners = [
                vertex(row, col),
                vertex(row, col + 1),
                vertex(row + 1, col),
                vertex(row + 1, col + 1),
            ];
            for tri in [[0, 1, 2], [3, 2, 1]] {
                let (Some(v0), Some(v1), Some(v2)) =
                    (corners[tri[0]], corners[tri[1]], corners[tri[2]])
                else {
                    continue;
                };
                let points = [v0.0, v1.0, v2.0];
                let height = (v0.1 + v1.1 + v2.1) / 3.0;
                let center = std::array::from_fn(|d| points.iter().map(|p| p[d]).sum::<f64>() / 3.0);
                facets.push(Facet {
                    screen: points.map(|p| self.camera.project(p)),
                    depth: self.camera.depth(center),
                    rgb: shade(viridis(height), normal(points)),
                });
            }
        }

        // Painter's algorithm: furthest first.
        facets.sort_by(|a, b| b.depth.total_cmp(&a.depth));
        facets
    }
}

impl RenderPipeline for SvgRenderer {
    fn render(
        &mut self,
        panels: &[(Surface, String)],
        grid: &Grid,
    ) -> Result<FigureHandle, PolysurfError> {
        let width = PANEL_SIZE * panels.len().max(1) as f64;
        let height = PANEL_SIZE + TITLE_HEIGHT;
        let mut svg = format!(
            "<svg xmlns=\"http://www.w3.org/2000/svg\" width=\"{width:.0}\" height=\"{height:.0}\" viewBox=\"0 0 {width:.0} {height:.0}\">\n<rect width=\"100%\" height=\"100%\" fill=\"white\"/>\n"
        );
        for (i, (surface, label)) in panels.iter().enumerate() {
            svg.push_str(&self.panel_svg(surface, label, grid, i as f64 * PANEL_SIZE));
        }
        svg.push_str("</svg>\n");

        if let Some(path) = &self.out_path {
            std::fs::write(path, &svg).context(RenderSnafu)?;
        }

        let figure = FigureHandle(self.next_id);
        self.next_id += 1;
        log::debug!("Rendered figure {} with {} panels", figure.0, panels.len());
        self.figures.insert(figure, svg);
        Ok(figure)
    }

    fn dispose(&mut self, figure: FigureHandle) -> Result<(), PolysurfError> {
        match self.figures.remove(&figure) {
            Some(_) => {
                log::debug!("Disposed figure {}", figure.0);
                Ok(())
            }
            None => Err(PolysurfError::UnknownFigure { id: figure.0 }),
        }
    }
}

fn colorbar_svg(x: f64, z_lo: f64, z_hi: f64) -> String {
    const STEPS: usize = 16;
    let top = TITLE_HEIGHT + MARGIN + 20.0;
    let bar_h = PANEL_SIZE - 2.0 * MARGIN - 40.0;
    let step_h = bar_h / STEPS as f64;
    let mut svg = String::new();
    for i in 0..STEPS {
        // Highest values at the top.
        let t = 1.0 - (i as f64 + 0.5) / STEPS as f64;
        let (r, g, b) = viridis(t);
        svg.push_str(&format!(
            "<rect x=\"{:.1}\" y=\"{:.2}\" width=\"12\" height=\"{:.2}\" fill=\"rgb({r},{g},{b})\"/>\n",
            x + 4.0,
            top + i as f64 * step_h,
            step_h + 0.5
        ));
    }
    for (value, y) in [(z_hi, top), (z_lo, top + bar_h)] {
        svg.push_str(&format!(
            "<text x=\"{:.1}\" y=\"{:.1}\" font-size=\"10\">{}</text>\n",
            x + 20.0,
            y + 3.0,
            format_tick(value)
        ));
    }
    svg
}

fn format_tick(value: f64) -> String {
    if value.abs() >= 1e4 {
        format!("{value:.2e}")
    } else {
        format!("{value:.1}")
    }
}

fn escape(s: &str) -> String {
    s.replace('&', "&amp;").replace('<', "&lt;").replace('>', "&gt;")
}

/// Viridis color map sampled at `t` in `[0, 1]`.
fn viridis(t: f64) -> (u8, u8, u8) {
    const STOPS: [(f64, f64, f64); 5] = [
        (68.0, 1.0, 84.0),
        (59.0, 82.0, 139.0),
        (33.0, 145.0, 140.0),
        (94.0, 201.0, 98.0),
        (253.0, 231.0, 37.0),
    ];
    let scaled = t.clamp(0.0, 1.0) * (STOPS.len() - 1) as f64;
    let i = (scaled.floor() as usize).min(STOPS.len() - 2);
    let s = scaled - i as f64;
    let (a, b) = (STOPS[i], STOPS[i + 1]);
    let lerp = |x: f64, y: f64| (x + (y - x) * s).round() as u8;
    (lerp(a.0, b.0), lerp(a.1, b.1), lerp(a.2, b.2))
}

fn normal(points: [[f64; 3]; 3]) -> [f64; 3] {
    let u: [f64; 3] = std::array::from_fn(|d| points[1][d] - points[0][d]);
    let v: [f64; 3] = std::array::from_fn(|d| points[2][d] - points[0][d]);
    let n = [
        u[1] * v[2] - u[2] * v[1],
        u[2] * v[0] - u[0] * v[2],
        u[0] * v[1] - u[1] * v[0],
    ];
    let len = (n[0] * n[0] + n[1] * n[1] + n[2] * n[2]).sqrt();
    if len < 1e-15 {
        [0.0, 0.0, 1.0]
    } else {
        n.map(|c| c / len)
    }
}

/// Ambient plus two-sided diffuse lighting from a fixed upper-left light.
fn shade((r, g, b): (u8, u8, u8), normal: [f64; 3]) -> (u8, u8, u8) {
    const LIGHT: [f64; 3] = [0.4, -0.5, 0.76];
    const AMBIENT: f64 = 0.35;
    let len = LIGHT.iter().map(|c| c * c).sum::<f64>().sqrt();
    let diffuse = (0..3).map(|d| normal[d] * LIGHT[d] / len).sum::<f64>().abs();
    let intensity = (AMBIENT + (1.0 - AMBIENT) * diffuse).clamp(0.0, 1.0);
    let apply = |c: u8| (c as f64 * intensity).round() as u8;
    (apply(r), apply(g), apply(b))
}

#[cfg(test)]
mod tests {
    use assertables::{assert_err, assert_ok};
    use pretty_assertions as pa;

    use super::*;
    use crate::{Axis, Polynomial, evaluate, make_grid};

    fn panel(grid: &Grid, coeffs: [i32; 3], label: &str) -> (Surface, String) {
        let poly = Polynomial::new(&[Axis::X], 2, coeffs).unwrap();
        (evaluate(&poly, grid).unwrap(), label.to_string())
    }

    #[test]
    fn render_then_dispose() {
        let grid = make_grid(-1.0, 1.0, 4).unwrap();
        let mut renderer = SvgRenderer::new();

        let figure = assert_ok!(renderer.render(&[panel(&grid, [0, 1, 1], "p1")], &grid));
        pa::assert_eq!(renderer.live_figures(), 1);

        let doc = renderer.document(figure).unwrap();
        assert!(doc.starts_with("<svg"));
        assert!(doc.contains(">p1</text>"));
        // 3x3 cells, two triangles each.
        pa::assert_eq!(doc.matches("<polygon").count(), 18);

        assert_ok!(renderer.dispose(figure));
        pa::assert_eq!(renderer.live_figures(), 0);
        assert!(renderer.document(figure).is_none());
    }

    #[test]
    fn dispose_unknown_figure() {
        let mut renderer = SvgRenderer::new();
        let err = assert_err!(renderer.dispose(FigureHandle::new(3)));
        assert!(matches!(err, PolysurfError::UnknownFigure { id: 3 }));
    }

    #[test]
    fn render_panels_side_by_side() {
        let grid = make_grid(-1.0, 1.0, 3).unwrap();
        let mut renderer = SvgRenderer::new();
        let panels = [
            panel(&grid, [1, 0, 0], "a<b"),
            panel(&grid, [0, 2, 0], "b"),
            panel(&grid, [0, 0, 3], "c"),
        ];
        let figure = renderer.render(&panels, &grid).unwrap();
        let doc = renderer.document(figure).unwrap();
        assert!(doc.contains("width=\"1080\""));
        assert!(doc.contains("a&lt;b"));
        pa::assert_eq!(doc.matches("<polygon").count(), 3 * 8);
    }

    #[test]
    fn render_writes_output() {
        let path = std::env::temp_dir().join(format!("polysurf-render-{}.svg", std::process::id()));
        let grid = make_grid(-1.0, 1.0, 3).unwrap();
        let mut renderer = SvgRenderer::new().with_output(&path);
        let figure = renderer.render(&[panel(&grid, [1, 1, 1], "out")], &grid).unwrap();
        let written = std::fs::read_to_string(&path).unwrap();
        pa::assert_eq!(Some(written.as_str()), renderer.document(figure));
        let _ = std::fs::remove_file(&path);
    }

    #[test]
    fn viridis_endpoints() {
        pa::assert_eq!(viridis(0.0), (68, 1, 84));
        pa::assert_eq!(viridis(1.0), (253, 231, 37));
        pa::assert_eq!(viridis(-3.0), viridis(0.0));
    }

    #[test]
    fn shade_flat_facet_facing_light() {
        let lit = shade((200, 200, 200), [0.0, 0.0, 1.0]);
        let dim = shade((200, 200, 200), [1.0, 0.0, 0.0]);
        assert!(lit.0 > dim.0);
    }
}
