use tessera_blocks::BlockMode;
use tessera_geom::{SamplePos, SampleSpan};
use tessera_render::{DrawTarget, LightingOracle, TileDraw, TileFill};

/// Character-cell draw target covering one sample span.
pub struct AsciiTarget {
    origin: SamplePos,
    width: usize,
    rows: Vec<Vec<char>>,
}

impl AsciiTarget {
    pub fn new(span: SampleSpan) -> Self {
        let width = span.width();
        Self {
            origin: span.min,
            width,
            rows: vec![vec![' '; width]; span.height()],
        }
    }

    pub fn render(&self) -> String {
        let mut out = String::with_capacity((self.width + 1) * self.rows.len());
        for row in &self.rows {
            out.extend(row.iter());
            out.push('\n');
        }
        out
    }

    fn glyph(tile: &TileDraw) -> char {
        let lit = tile.brightness >= 0.35;
        let c = match tile.mode {
            BlockMode::Solid if matches!(tile.fill, TileFill::Placeholder(_)) => '?',
            BlockMode::Solid => {
                if lit {
                    '#'
                } else {
                    '%'
                }
            }
            BlockMode::Platform => '=',
            BlockMode::Background => '.',
            BlockMode::Liquid => '~',
        };
        if tile.invert { c.to_ascii_lowercase() } else { c }
    }
}

impl DrawTarget for AsciiTarget {
    fn draw_tile(&mut self, tile: &TileDraw) {
        let col = i64::from(tile.sample.x) - i64::from(self.origin.x);
        let row = i64::from(tile.sample.y) - i64::from(self.origin.y);
        if col < 0 || row < 0 {
            return;
        }
        if let Some(cell) = self
            .rows
            .get_mut(row as usize)
            .and_then(|r| r.get_mut(col as usize))
        {
            *cell = Self::glyph(tile);
        }
    }
}

/// Light fades linearly with depth below the surface line.
pub struct DepthFalloff {
    pub surface_line: i32,
    pub depth: f64,
}

impl LightingOracle for DepthFalloff {
    fn brightness(&self, s: SamplePos) -> f64 {
        let below = f64::from(s.y) - f64::from(self.surface_line);
        1.0 - below / self.depth.max(1.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tessera_blocks::Rotation;

    fn tile(x: i32, y: i32, mode: BlockMode, brightness: f64) -> TileDraw {
        TileDraw {
            sample: SamplePos::new(x, y),
            x: 0.0,
            y: 0.0,
            size: 16.0,
            id: Some("stone".into()),
            mode,
            fill: TileFill::Texture(tessera_blocks::TextureBinding {
                tilemap: "terrain".into(),
                col: 0,
                row: 0,
            }),
            brightness,
            rotation: Rotation::R0,
            invert: false,
        }
    }

    #[test]
    fn glyphs_land_relative_to_span_origin() {
        let span = SampleSpan {
            min: SamplePos::new(-2, 3),
            max: SamplePos::new(1, 4),
        };
        let mut t = AsciiTarget::new(span);
        t.draw_tile(&tile(-2, 3, BlockMode::Solid, 1.0));
        t.draw_tile(&tile(1, 4, BlockMode::Liquid, 1.0));
        t.draw_tile(&tile(0, 4, BlockMode::Solid, 0.1));
        t.draw_tile(&tile(9, 9, BlockMode::Solid, 1.0));
        assert_eq!(t.render(), "#   \n  %~\n");
    }

    #[test]
    fn depth_falloff_darkens_downward() {
        let l = DepthFalloff {
            surface_line: 10,
            depth: 20.0,
        };
        assert_eq!(l.brightness(SamplePos::new(0, 10)), 1.0);
        assert_eq!(l.brightness(SamplePos::new(0, 20)), 0.5);
        assert!(l.brightness(SamplePos::new(0, 40)) < 0.0);
    }
}
