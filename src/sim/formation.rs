//! Level layout generation
//!
//! Two passes per level: a formation shape produces grid coordinates, then
//! every coordinate gets a preset id. Shapes are functions of the grid size
//! (plus the RNG for the organic and maze shapes); coordinates are floats so
//! shapes can sit on half-cells.

use std::collections::{HashMap, HashSet};
use std::f32::consts::TAU;

use rand::Rng;
use serde::{Deserialize, Serialize};

use super::presets::{self, BrickPreset, PresetGroup};
use crate::consts::*;

/// Named layout strategies
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FormationType {
    Grid,
    Pyramid,
    Arch,
    Diamond,
    Zigzag,
    Organic,
    Wave,
    Maze,
}

impl FormationType {
    pub const ALL: [FormationType; 8] = [
        FormationType::Grid,
        FormationType::Pyramid,
        FormationType::Arch,
        FormationType::Diamond,
        FormationType::Zigzag,
        FormationType::Organic,
        FormationType::Wave,
        FormationType::Maze,
    ];

    /// Formation used for a level (cycles through all shapes)
    pub fn for_level(level: u32) -> Self {
        Self::ALL[(level.saturating_sub(1) as usize) % Self::ALL.len()]
    }

    /// Allowed row count range for this shape
    pub fn row_limits(self) -> (u32, u32) {
        match self {
            FormationType::Grid => (1, MAX_BRICK_ROWS),
            FormationType::Pyramid => (2, 10),
            FormationType::Arch => (3, 10),
            FormationType::Diamond => (5, 13),
            FormationType::Zigzag => (3, 10),
            FormationType::Organic => (3, MAX_BRICK_ROWS),
            FormationType::Wave => (4, MAX_BRICK_ROWS),
            FormationType::Maze => (5, 13),
        }
    }
}

/// A generated brick slot in grid coordinates
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BrickPosition {
    pub column: f32,
    pub row: f32,
    pub preset_id: Option<&'static str>,
}

impl BrickPosition {
    pub fn new(column: f32, row: f32) -> Self {
        Self {
            column,
            row,
            preset_id: None,
        }
    }

    pub fn preset(&self) -> Option<&'static BrickPreset> {
        self.preset_id.and_then(presets::preset)
    }
}

/// Caller tuning for preset assignment
#[derive(Debug, Clone, Default)]
pub struct GenerationOptions {
    /// Only these preset ids may be used; a list with nothing breakable yields no bricks
    pub allowed_presets: Option<Vec<String>>,
    /// Replacement spawn weights keyed by preset id. For the indestructible
    /// preset the value replaces the base per-level probability.
    pub overrides: HashMap<String, f32>,
}

/// Columns and rows for a level on a field of the given size
pub fn grid_size(level: u32, field_width: f32, field_height: f32) -> (u32, u32) {
    let usable_width = field_width - BRICK_SIDE_MARGIN * 2.0 + BRICK_GAP;
    let columns = (usable_width / (BRICK_WIDTH + BRICK_GAP)).floor().max(0.0) as u32;
    let row_cap = (field_height * BRICK_AREA_HEIGHT_SHARE / (BRICK_HEIGHT + BRICK_GAP))
        .floor()
        .max(0.0) as u32;

    let columns = columns.min(MAX_BRICK_COLUMNS);
    let rows = (BASE_BRICK_ROWS + level / 2).min(row_cap.min(MAX_BRICK_ROWS));
    (columns, rows)
}

/// Grid cells of a formation, before normalization
pub fn formation_cells(
    formation: FormationType,
    columns: u32,
    rows: u32,
    rng: &mut impl Rng,
) -> Vec<(f32, f32)> {
    if columns == 0 || rows == 0 {
        return Vec::new();
    }
    let (min_rows, max_rows) = formation.row_limits();
    let rows = rows.clamp(min_rows, max_rows);

    match formation {
        FormationType::Grid => grid(columns, rows),
        FormationType::Pyramid => pyramid(columns, rows),
        FormationType::Arch => arch(columns, rows),
        FormationType::Diamond => diamond(columns, rows),
        FormationType::Zigzag => zigzag(columns, rows),
        FormationType::Organic => organic(columns, rows, rng.random()),
        FormationType::Wave => wave(columns, rows),
        FormationType::Maze => maze(columns, rows, rng),
    }
}

fn grid(columns: u32, rows: u32) -> Vec<(f32, f32)> {
    (0..rows)
        .flat_map(|r| (0..columns).map(move |c| (c as f32, r as f32)))
        .collect()
}

/// Full base row at the bottom, each row above two bricks narrower
fn pyramid(columns: u32, rows: u32) -> Vec<(f32, f32)> {
    let mut cells = Vec::new();
    for k in 0..rows {
        let width = columns as i32 - 2 * k as i32;
        if width <= 0 {
            break;
        }
        let row = (rows - 1 - k) as f32;
        for c in 0..width {
            cells.push(((k as i32 + c) as f32, row));
        }
    }
    cells
}

/// Band between two half-ellipses standing on the bottom row
fn arch(columns: u32, rows: u32) -> Vec<(f32, f32)> {
    let cx = (columns as f32 - 1.0) / 2.0;
    let outer_a = columns as f32 / 2.0;
    let outer_b = rows as f32;
    let thickness = (rows as f32 / 3.0).max(2.0);
    let inner_a = (outer_a - thickness).max(0.5);
    let inner_b = (outer_b - thickness).max(0.5);

    let mut cells = Vec::new();
    for r in 0..rows {
        let height = (rows - 1 - r) as f32;
        for c in 0..columns {
            let dx = c as f32 - cx;
            let outer = (dx / outer_a).powi(2) + (height / outer_b).powi(2);
            let inner = (dx / inner_a).powi(2) + (height / inner_b).powi(2);
            if outer <= 1.0 && inner > 1.0 {
                cells.push((c as f32, r as f32));
            }
        }
    }
    cells
}

/// Centred L1 ball
fn diamond(columns: u32, rows: u32) -> Vec<(f32, f32)> {
    let cx = (columns as f32 - 1.0) / 2.0;
    let cy = (rows as f32 - 1.0) / 2.0;
    let rx = (columns as f32 / 2.0).max(1.0);
    let ry = (rows as f32 / 2.0).max(1.0);

    let mut cells = Vec::new();
    for r in 0..rows {
        for c in 0..columns {
            let d = (c as f32 - cx).abs() / rx + (r as f32 - cy).abs() / ry;
            if d <= 1.0 + 1e-4 {
                cells.push((c as f32, r as f32));
            }
        }
    }
    cells
}

/// Two-brick stripes whose rows shift up and down in a triangle wave
fn zigzag(columns: u32, rows: u32) -> Vec<(f32, f32)> {
    let amplitude = (rows / 3).max(1) as i32;
    let mut cells = Vec::new();
    for c in 0..columns as i32 {
        let phase = c % (amplitude * 2);
        let shift = if phase < amplitude { phase } else { amplitude * 2 - phase };
        for r in 0..rows as i32 {
            if (r - shift).rem_euclid(3) != 2 {
                cells.push((c as f32, r as f32));
            }
        }
    }
    cells
}

/// Deterministic lattice hash in [0, 1)
fn hash_noise(x: i32, y: i32, seed: u32) -> f32 {
    let mut h = (x as u32).wrapping_mul(374_761_393)
        ^ (y as u32).wrapping_mul(668_265_263)
        ^ seed.wrapping_mul(2_654_435_761);
    h = (h ^ (h >> 13)).wrapping_mul(1_274_126_177);
    h ^= h >> 16;
    (h & 0xFFFF) as f32 / 65536.0
}

/// Bilinear value noise with smoothstep fade
fn value_noise(x: f32, y: f32, seed: u32) -> f32 {
    let x0 = x.floor() as i32;
    let y0 = y.floor() as i32;
    let fx = x - x0 as f32;
    let fy = y - y0 as f32;
    let sx = fx * fx * (3.0 - 2.0 * fx);
    let sy = fy * fy * (3.0 - 2.0 * fy);

    let top = hash_noise(x0, y0, seed) * (1.0 - sx) + hash_noise(x0 + 1, y0, seed) * sx;
    let bottom = hash_noise(x0, y0 + 1, seed) * (1.0 - sx) + hash_noise(x0 + 1, y0 + 1, seed) * sx;
    top * (1.0 - sy) + bottom * sy
}

const ORGANIC_SCALE: f32 = 3.0;
const ORGANIC_THRESHOLD: f32 = 0.45;
const ORGANIC_SMOOTHING_PASSES: usize = 2;

/// Thresholded noise blobs, smoothed by a cellular automaton
fn organic(columns: u32, rows: u32, seed: u32) -> Vec<(f32, f32)> {
    let (w, h) = (columns as i32, rows as i32);
    let mut alive: Vec<bool> = (0..h)
        .flat_map(|r| (0..w).map(move |c| (c, r)))
        .map(|(c, r)| value_noise(c as f32 / ORGANIC_SCALE, r as f32 / ORGANIC_SCALE, seed) > ORGANIC_THRESHOLD)
        .collect();

    for _ in 0..ORGANIC_SMOOTHING_PASSES {
        let previous = alive.clone();
        for r in 0..h {
            for c in 0..w {
                let mut count = 0;
                for dr in -1..=1 {
                    for dc in -1..=1 {
                        let (nc, nr) = (c + dc, r + dr);
                        if nc >= 0 && nc < w && nr >= 0 && nr < h && previous[(nr * w + nc) as usize] {
                            count += 1;
                        }
                    }
                }
                alive[(r * w + c) as usize] = count >= 5;
            }
        }
    }

    let cells: Vec<(f32, f32)> = alive
        .iter()
        .enumerate()
        .filter(|(_, a)| **a)
        .map(|(i, _)| ((i as i32 % w) as f32, (i as i32 / w) as f32))
        .collect();

    if cells.is_empty() {
        // Noise came out blank: fall back to a central band
        let mid = rows / 2;
        return (0..columns)
            .flat_map(|c| [(c as f32, mid.saturating_sub(1) as f32), (c as f32, mid as f32)])
            .collect();
    }
    cells
}

const WAVE_THICKNESS: u32 = 2;

/// Sine ribbon; rows are fractional
fn wave(columns: u32, rows: u32) -> Vec<(f32, f32)> {
    let amplitude = rows.saturating_sub(WAVE_THICKNESS) as f32 / 2.0;
    let period = (columns as f32 / 2.0).max(4.0);
    let mut cells = Vec::new();
    for c in 0..columns {
        let top = amplitude * (1.0 + (TAU * c as f32 / period).sin());
        for k in 0..WAVE_THICKNESS {
            cells.push((c as f32, top + k as f32));
        }
    }
    cells
}

const MAZE_OPENING_CHANCE: f64 = 0.25;
const MAZE_BLOCK_CHANCE: f64 = 0.15;

/// Alternating wall rows with random openings and corridor rows with
/// scattered blocks
fn maze(columns: u32, rows: u32, rng: &mut impl Rng) -> Vec<(f32, f32)> {
    let mut cells = Vec::new();
    for r in 0..rows {
        if r % 2 == 0 {
            let mut row: Vec<u32> = (0..columns)
                .filter(|_| !rng.random_bool(MAZE_OPENING_CHANCE))
                .collect();
            // Every wall needs at least one way through
            if row.len() == columns as usize && !row.is_empty() {
                let gap = rng.random_range(0..row.len());
                row.remove(gap);
            }
            cells.extend(row.into_iter().map(|c| (c as f32, r as f32)));
        } else {
            for c in 0..columns {
                if rng.random_bool(MAZE_BLOCK_CHANCE) {
                    cells.push((c as f32, r as f32));
                }
            }
        }
    }
    cells
}

/// Shift so the leftmost column is 0
pub fn normalize_columns(cells: &mut [(f32, f32)]) {
    let min = cells.iter().map(|(c, _)| *c).fold(f32::INFINITY, f32::min);
    if min.is_finite() && min != 0.0 {
        for (c, _) in cells.iter_mut() {
            *c -= min;
        }
    }
}

/// Bricks that must be destroyed to clear the level
pub fn count_breakable_bricks(positions: &[BrickPosition]) -> usize {
    positions
        .iter()
        .filter(|p| p.preset().is_some_and(|preset| !preset.undestructible))
        .count()
}

/// Assigns presets to formation cells
#[derive(Debug, Clone, Default)]
pub struct FormationGenerator {
    pub options: GenerationOptions,
}

impl FormationGenerator {
    pub fn new(options: GenerationOptions) -> Self {
        Self { options }
    }

    /// Generate and assign a full level layout
    pub fn generate_level(
        &self,
        level: u32,
        field_width: f32,
        field_height: f32,
        formation: FormationType,
        rng: &mut impl Rng,
    ) -> Vec<BrickPosition> {
        if !self.has_breakable() {
            log::debug!("No breakable presets allowed, level {} left empty", level);
            return Vec::new();
        }
        let (columns, rows) = grid_size(level, field_width, field_height);
        let mut cells = formation_cells(formation, columns, rows, rng);
        normalize_columns(&mut cells);

        let mut positions: Vec<BrickPosition> =
            cells.into_iter().map(|(c, r)| BrickPosition::new(c, r)).collect();
        self.assign_presets(&mut positions, level, rng);

        log::debug!(
            "Generated {:?} level {}: {}x{} grid, {} bricks ({} breakable)",
            formation,
            level,
            columns,
            rows,
            positions.len(),
            count_breakable_bricks(&positions)
        );
        positions
    }

    fn is_allowed(&self, id: &str) -> bool {
        match &self.options.allowed_presets {
            Some(allowed) => allowed.iter().any(|a| a == id),
            None => true,
        }
    }

    fn weight(&self, preset: &BrickPreset) -> f32 {
        self.options
            .overrides
            .get(preset.id)
            .copied()
            .unwrap_or(preset.weight)
    }

    /// Allowed presets of a group with a positive weight
    fn candidates(&self, group: PresetGroup) -> Vec<(&'static BrickPreset, f32)> {
        presets::group(group)
            .filter(|p| self.is_allowed(p.id))
            .map(|p| (p, self.weight(p)))
            .filter(|(_, w)| *w > 0.0)
            .collect()
    }

    /// A level needs at least one preset that can be broken
    fn has_breakable(&self) -> bool {
        BREAKABLE_GROUPS
            .into_iter()
            .any(|g| !self.candidates(g).is_empty())
    }

    /// Base chance of an indestructible brick before the strategic bonus
    fn indestructible_chance(&self, level: u32) -> f32 {
        presets::group(PresetGroup::Indestructible)
            .find_map(|p| self.options.overrides.get(p.id).copied())
            .unwrap_or(0.015 * level as f32)
    }

    /// Give every position a preset id
    pub fn assign_presets(&self, positions: &mut [BrickPosition], level: u32, rng: &mut impl Rng) {
        if positions.is_empty() {
            return;
        }
        let layout = LayoutInfo::new(positions);

        let indestructible = self.candidates(PresetGroup::Indestructible);
        let max_indestructible = (2 + level as usize / 2).min(12).min(positions.len() / 4);
        let base_chance = self.indestructible_chance(level);
        let mut placed_indestructible = 0;

        let obstacle_chance = (0.02 + 0.01 * level as f32).min(0.12);
        let reinforced_chance = (0.10 + 0.03 * level as f32).min(0.35);
        let special_chance = 0.08;

        for position in positions.iter_mut() {
            if !indestructible.is_empty() && placed_indestructible < max_indestructible {
                let mut chance = base_chance;
                if layout.is_strategic(position) {
                    chance *= 2.0;
                }
                let chance = chance.min(MAX_INDESTRUCTIBLE_CHANCE);
                if chance > 0.0 && rng.random::<f32>() < chance {
                    if let Some(preset) = pick_weighted(&indestructible, rng) {
                        position.preset_id = Some(preset.id);
                        placed_indestructible += 1;
                        continue;
                    }
                }
            }

            let roll = rng.random::<f32>();
            let group = if roll < obstacle_chance {
                PresetGroup::Obstacle
            } else if roll < obstacle_chance + reinforced_chance {
                PresetGroup::Reinforced
            } else if roll < obstacle_chance + reinforced_chance + special_chance {
                PresetGroup::Special
            } else {
                PresetGroup::Standard
            };

            position.preset_id = self
                .pick_breakable(group, rng)
                .map(|preset| preset.id);
        }
    }

    /// Preset from `group`, falling back to standard, then to anything breakable
    fn pick_breakable(&self, group: PresetGroup, rng: &mut impl Rng) -> Option<&'static BrickPreset> {
        std::iter::once(group)
            .chain(BREAKABLE_GROUPS)
            .find_map(|g| pick_weighted(&self.candidates(g), rng))
    }
}

/// Fallback order when the rolled group has nothing to offer
const BREAKABLE_GROUPS: [PresetGroup; 4] = [
    PresetGroup::Standard,
    PresetGroup::Reinforced,
    PresetGroup::Special,
    PresetGroup::Obstacle,
];

const MAX_INDESTRUCTIBLE_CHANCE: f32 = 0.25;

fn pick_weighted(
    candidates: &[(&'static BrickPreset, f32)],
    rng: &mut impl Rng,
) -> Option<&'static BrickPreset> {
    let total: f32 = candidates.iter().map(|(_, w)| *w).sum();
    if total <= 0.0 {
        return None;
    }
    let mut roll = rng.random::<f32>() * total;
    for (preset, weight) in candidates {
        if roll < *weight {
            return Some(*preset);
        }
        roll -= weight;
    }
    candidates.last().map(|(p, _)| *p)
}

/// Neighbourhood lookups over a finished formation
struct LayoutInfo {
    occupied: HashSet<(i32, i32)>,
    min_column: f32,
    max_column: f32,
    min_row: f32,
    max_row: f32,
}

impl LayoutInfo {
    fn new(positions: &[BrickPosition]) -> Self {
        let fold = |f: fn(&BrickPosition) -> f32| {
            positions.iter().map(f).fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            })
        };
        let (min_column, max_column) = fold(|p| p.column);
        let (min_row, max_row) = fold(|p| p.row);
        Self {
            occupied: positions.iter().map(|p| key(p.column, p.row)).collect(),
            min_column,
            max_column,
            min_row,
            max_row,
        }
    }

    fn neighbours(&self, p: &BrickPosition) -> usize {
        let (c, r) = key(p.column, p.row);
        [(c - 2, r), (c + 2, r), (c, r - 2), (c, r + 2)]
            .iter()
            .filter(|k| self.occupied.contains(k))
            .count()
    }

    /// Central column, border cell, or chokepoint
    fn is_strategic(&self, p: &BrickPosition) -> bool {
        let center = (self.min_column + self.max_column) / 2.0;
        let central = (p.column - center).abs() <= 1.0;
        let border = p.column <= self.min_column
            || p.column >= self.max_column
            || p.row <= self.min_row
            || p.row >= self.max_row;
        let chokepoint = self.neighbours(p) <= 2;
        central || border || chokepoint
    }
}

/// Half-cell resolution key
fn key(column: f32, row: f32) -> (i32, i32) {
    ((column * 2.0).round() as i32, (row * 2.0).round() as i32)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(2024)
    }

    #[test]
    fn test_diamond_is_mirror_symmetric() {
        let cells = formation_cells(FormationType::Diamond, 8, 10, &mut rng());
        assert!(!cells.is_empty());
        let set: HashSet<_> = cells.iter().map(|(c, r)| key(*c, *r)).collect();
        for (c, r) in &cells {
            assert!(set.contains(&key(7.0 - c, *r)), "missing mirror of ({c}, {r})");
        }
    }

    #[test]
    fn test_diamond_enforces_min_rows() {
        let cells = formation_cells(FormationType::Diamond, 9, 2, &mut rng());
        let max_row = cells.iter().map(|(_, r)| *r).fold(0.0, f32::max);
        assert!(max_row >= 4.0);
    }

    #[test]
    fn test_pyramid_narrows_by_two() {
        let cells = formation_cells(FormationType::Pyramid, 9, 4, &mut rng());
        let row_width = |row: f32| cells.iter().filter(|(_, r)| *r == row).count();
        assert_eq!(row_width(3.0), 9);
        assert_eq!(row_width(2.0), 7);
        assert_eq!(row_width(1.0), 5);
        assert_eq!(row_width(0.0), 3);
    }

    #[test]
    fn test_every_formation_nonempty_and_normalized() {
        for formation in FormationType::ALL {
            let mut cells = formation_cells(formation, 13, 8, &mut rng());
            assert!(!cells.is_empty(), "{formation:?} empty");
            normalize_columns(&mut cells);
            let min = cells.iter().map(|(c, _)| *c).fold(f32::INFINITY, f32::min);
            assert_eq!(min, 0.0, "{formation:?}");
            assert!(cells.iter().all(|(_, r)| *r >= 0.0));
        }
    }

    #[test]
    fn test_organic_is_deterministic_per_seed() {
        assert_eq!(organic(12, 8, 99), organic(12, 8, 99));
    }

    #[test]
    fn test_maze_walls_have_openings() {
        let cells = formation_cells(FormationType::Maze, 10, 7, &mut rng());
        for wall_row in [0.0, 2.0, 4.0, 6.0] {
            let count = cells.iter().filter(|(_, r)| *r == wall_row).count();
            assert!(count < 10, "row {wall_row} sealed");
        }
    }

    #[test]
    fn test_normalize_shifts_min_column() {
        let mut cells = vec![(2.5, 0.0), (4.0, 1.0)];
        normalize_columns(&mut cells);
        assert_eq!(cells, vec![(0.0, 0.0), (1.5, 1.0)]);
    }

    #[test]
    fn test_grid_size_grows_with_level_up_to_cap() {
        let (cols, rows_1) = grid_size(1, FIELD_WIDTH, FIELD_HEIGHT);
        let (_, rows_10) = grid_size(10, FIELD_WIDTH, FIELD_HEIGHT);
        let (_, rows_99) = grid_size(99, FIELD_WIDTH, FIELD_HEIGHT);
        assert_eq!(cols, 13);
        assert!(rows_10 > rows_1);
        assert!(rows_99 <= MAX_BRICK_ROWS);
        assert_eq!(grid_size(1, 0.0, 0.0), (0, 0));
    }

    #[test]
    fn test_generate_assigns_every_position() {
        let generator = FormationGenerator::default();
        let positions = generator.generate_level(5, FIELD_WIDTH, FIELD_HEIGHT, FormationType::Grid, &mut rng());
        assert!(!positions.is_empty());
        assert!(positions.iter().all(|p| p.preset_id.is_some()));

        let expected = positions
            .iter()
            .filter(|p| !presets::preset(p.preset_id.unwrap()).unwrap().undestructible)
            .count();
        assert_eq!(count_breakable_bricks(&positions), expected);
    }

    #[test]
    fn test_indestructible_capped() {
        let mut overrides = HashMap::new();
        overrides.insert("steel".to_string(), 1.0);
        let generator = FormationGenerator::new(GenerationOptions {
            allowed_presets: None,
            overrides,
        });
        let level = 4;
        let positions = generator.generate_level(level, FIELD_WIDTH, FIELD_HEIGHT, FormationType::Grid, &mut rng());
        let steel = positions.len() - count_breakable_bricks(&positions);
        assert!(steel >= 1);
        assert!(steel <= 2 + level as usize / 2);
    }

    #[test]
    fn test_allowed_presets_respected() {
        let generator = FormationGenerator::new(GenerationOptions {
            allowed_presets: Some(vec!["blue".to_string(), "gold".to_string()]),
            overrides: HashMap::new(),
        });
        let positions = generator.generate_level(3, FIELD_WIDTH, FIELD_HEIGHT, FormationType::Pyramid, &mut rng());
        assert!(!positions.is_empty());
        assert!(
            positions
                .iter()
                .all(|p| matches!(p.preset_id, Some("blue") | Some("gold")))
        );
    }

    #[test]
    fn test_override_zero_weight_removes_preset() {
        let overrides: HashMap<String, f32> = ["red", "orange", "green"]
            .iter()
            .map(|id| (id.to_string(), 0.0))
            .collect();
        let generator = FormationGenerator::new(GenerationOptions {
            allowed_presets: None,
            overrides,
        });
        let positions = generator.generate_level(1, FIELD_WIDTH, FIELD_HEIGHT, FormationType::Grid, &mut rng());
        assert!(
            positions
                .iter()
                .all(|p| !matches!(p.preset_id, Some("red") | Some("orange") | Some("green")))
        );
    }

    #[test]
    fn test_degenerate_inputs_yield_empty() {
        let generator = FormationGenerator::default();
        assert!(generator.generate_level(1, 0.0, 0.0, FormationType::Grid, &mut rng()).is_empty());

        let empty = FormationGenerator::new(GenerationOptions {
            allowed_presets: Some(Vec::new()),
            overrides: HashMap::new(),
        });
        assert!(empty.generate_level(1, FIELD_WIDTH, FIELD_HEIGHT, FormationType::Grid, &mut rng()).is_empty());
        assert_eq!(count_breakable_bricks(&[]), 0);
    }

    #[test]
    fn test_no_breakable_presets_yield_empty() {
        for allowed in [vec!["steel".to_string()], vec!["no-such-brick".to_string()]] {
            let generator = FormationGenerator::new(GenerationOptions {
                allowed_presets: Some(allowed),
                overrides: HashMap::new(),
            });
            let positions =
                generator.generate_level(3, FIELD_WIDTH, FIELD_HEIGHT, FormationType::Grid, &mut rng());
            assert!(positions.is_empty(), "{positions:?}");
        }

        // Zero weight everywhere is no different
        let zeroed = FormationGenerator::new(GenerationOptions {
            allowed_presets: Some(vec!["red".to_string()]),
            overrides: HashMap::from([("red".to_string(), 0.0)]),
        });
        assert!(zeroed.generate_level(1, FIELD_WIDTH, FIELD_HEIGHT, FormationType::Grid, &mut rng()).is_empty());
    }

    #[test]
    fn test_unassigned_positions_not_breakable() {
        let positions = [BrickPosition::new(0.0, 0.0), BrickPosition {
            column: 1.0,
            row: 0.0,
            preset_id: Some("red"),
        }];
        assert_eq!(count_breakable_bricks(&positions), 1);
    }
}
