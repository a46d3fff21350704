//! Component labelling and bridge drawing for binary masks.

use std::collections::VecDeque;

use crate::field::NoiseField;

const NEIGHBOURS: [(i64, i64); 4] = [(1, 0), (-1, 0), (0, 1), (0, -1)];

/// 4-connected labels for the set cells of a field; 0 marks unset cells.
#[derive(Clone, Debug)]
pub struct ComponentLabels {
    width: usize,
    labels: Vec<u32>,
    sizes: Vec<usize>,
}

impl ComponentLabels {
    #[inline]
    pub fn count(&self) -> usize {
        self.sizes.len()
    }

    #[inline]
    pub fn label_at(&self, x: usize, y: usize) -> u32 {
        self.labels[y * self.width + x]
    }

    /// Size of component `label` (1-based).
    pub fn size(&self, label: u32) -> usize {
        label
            .checked_sub(1)
            .and_then(|i| self.sizes.get(i as usize))
            .copied()
            .unwrap_or(0)
    }

    /// Largest component; ties go to the one discovered first in row-major order.
    pub fn largest(&self) -> Option<u32> {
        let mut best: Option<(u32, usize)> = None;
        for (i, &s) in self.sizes.iter().enumerate() {
            if best.is_none_or(|(_, bs)| s > bs) {
                best = Some((i as u32 + 1, s));
            }
        }
        best.map(|(l, _)| l)
    }
}

pub fn label_components(field: &NoiseField) -> ComponentLabels {
    let (w, h) = (field.width(), field.height());
    let mut labels = vec![0u32; w * h];
    let mut sizes = Vec::new();
    let mut queue = VecDeque::new();
    for y in 0..h {
        for x in 0..w {
            if !field.is_set(x, y) || labels[y * w + x] != 0 {
                continue;
            }
            let label = sizes.len() as u32 + 1;
            let mut size = 0usize;
            labels[y * w + x] = label;
            queue.push_back((x, y));
            while let Some((cx, cy)) = queue.pop_front() {
                size += 1;
                for (dx, dy) in NEIGHBOURS {
                    let nx = cx as i64 + dx;
                    let ny = cy as i64 + dy;
                    if nx < 0 || ny < 0 || nx >= w as i64 || ny >= h as i64 {
                        continue;
                    }
                    let (nx, ny) = (nx as usize, ny as usize);
                    let ni = ny * w + nx;
                    if labels[ni] == 0 && field.is_set(nx, ny) {
                        labels[ni] = label;
                        queue.push_back((nx, ny));
                    }
                }
            }
            sizes.push(size);
        }
    }
    ComponentLabels {
        width: w,
        labels,
        sizes,
    }
}

/// Joins every component of a binary field to the largest one with straight
/// bridges of the given thickness. Set cells are never cleared. Returns the
/// number of bridges drawn.
pub fn repair_connectivity(field: &mut NoiseField, thickness: u32) -> usize {
    let labels = label_components(field);
    if labels.count() <= 1 {
        return 0;
    }
    let Some(anchor) = labels.largest() else {
        return 0;
    };

    // Only cells touching an unset neighbour (or the edge) can be nearest points.
    let mut borders: Vec<Vec<(i64, i64)>> = vec![Vec::new(); labels.count()];
    let (w, h) = (field.width() as i64, field.height() as i64);
    for y in 0..h {
        for x in 0..w {
            let label = labels.label_at(x as usize, y as usize);
            if label == 0 {
                continue;
            }
            let on_border = NEIGHBOURS.iter().any(|(dx, dy)| {
                let (nx, ny) = (x + dx, y + dy);
                nx < 0 || ny < 0 || nx >= w || ny >= h || !field.is_set(nx as usize, ny as usize)
            });
            if on_border {
                borders[(label - 1) as usize].push((x, y));
            }
        }
    }

    let anchor_border = &borders[(anchor - 1) as usize];
    let mut bridges = 0;
    for (i, border) in borders.iter().enumerate() {
        if i as u32 + 1 == anchor {
            continue;
        }
        let mut best: Option<((i64, i64), (i64, i64), i64)> = None;
        for &a in border {
            for &b in anchor_border {
                let d = (a.0 - b.0).pow(2) + (a.1 - b.1).pow(2);
                if best.is_none_or(|(_, _, bd)| d < bd) {
                    best = Some((a, b, d));
                }
            }
        }
        if let Some((a, b, _)) = best {
            draw_bridge(field, a, b, thickness);
            bridges += 1;
        }
    }
    bridges
}

/// Brush offsets for a square of side `t`, centred as evenly as possible.
fn brush_range(thickness: u32) -> std::ops::RangeInclusive<i64> {
    let t = i64::from(thickness.max(1));
    -((t - 1) / 2)..=t / 2
}

/// Bresenham line that steps one axis at a time, so consecutive cells always
/// share an edge and the bridge is 4-connected.
fn draw_bridge(field: &mut NoiseField, from: (i64, i64), to: (i64, i64), thickness: u32) {
    let (w, h) = (field.width() as i64, field.height() as i64);
    let brush = brush_range(thickness);
    let mut stamp = |x: i64, y: i64| {
        for oy in brush.clone() {
            for ox in brush.clone() {
                let (px, py) = (x + ox, y + oy);
                if px >= 0 && py >= 0 && px < w && py < h {
                    field.set(px as usize, py as usize, 1.0);
                }
            }
        }
    };

    let (mut x, mut y) = from;
    let dx = (to.0 - x).abs();
    let dy = -(to.1 - y).abs();
    let sx = if x < to.0 { 1 } else { -1 };
    let sy = if y < to.1 { 1 } else { -1 };
    let mut err = dx + dy;
    stamp(x, y);
    for _ in 0..(dx - dy) {
        let e2 = 2 * err;
        if e2 - dy > dx - e2 {
            err += dy;
            x += sx;
        } else {
            err += dx;
            y += sy;
        }
        stamp(x, y);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn mask(rows: &[&str]) -> NoiseField {
        let w = rows[0].len();
        let bits: Vec<bool> = rows.iter().flat_map(|r| r.chars().map(|c| c == '#')).collect();
        NoiseField::from_mask(w, rows.len(), &bits)
    }

    #[test]
    fn labels_count_separate_islands() {
        let f = mask(&["##..#", "#...#", ".....", "..#.."]);
        let l = label_components(&f);
        assert_eq!(l.count(), 3);
        assert_eq!(l.largest(), Some(1));
        assert_eq!(l.size(1), 3);
        assert_eq!(l.size(2), 2);
        assert_eq!(l.size(3), 1);
        assert_eq!(l.label_at(2, 3), 3);
        assert_eq!(l.label_at(1, 1), 0);
    }

    #[test]
    fn diagonal_cells_are_separate() {
        let f = mask(&["#.", ".#"]);
        assert_eq!(label_components(&f).count(), 2);
    }

    #[test]
    fn largest_tie_prefers_first_found() {
        let f = mask(&["#...#"]);
        assert_eq!(label_components(&f).largest(), Some(1));
    }

    #[test]
    fn repair_joins_diagonal_islands() {
        let mut f = mask(&["#....", ".....", ".....", "....#"]);
        let before = f.clone();
        assert_eq!(repair_connectivity(&mut f, 1), 1);
        assert_eq!(label_components(&f).count(), 1);
        for y in 0..4 {
            for x in 0..5 {
                if before.is_set(x, y) {
                    assert!(f.is_set(x, y));
                }
            }
        }
    }

    #[test]
    fn thick_brush_widens_the_bridge() {
        let mut thin = mask(&["#.......#"; 3]);
        let mut thick = thin.clone();
        repair_connectivity(&mut thin, 1);
        repair_connectivity(&mut thick, 3);
        assert!(thick.count_set() > thin.count_set());
        assert_eq!(label_components(&thick).count(), 1);
    }

    #[test]
    fn already_connected_is_untouched() {
        let mut f = mask(&["###", "#.#", "###"]);
        let before = f.clone();
        assert_eq!(repair_connectivity(&mut f, 2), 0);
        assert_eq!(f, before);
    }

    #[test]
    fn brush_ranges() {
        assert_eq!(brush_range(0), 0..=0);
        assert_eq!(brush_range(1), 0..=0);
        assert_eq!(brush_range(2), 0..=1);
        assert_eq!(brush_range(3), -1..=1);
    }
}
