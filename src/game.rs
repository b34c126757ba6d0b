//! Game state: grid, falling piece, collision, lock + line clear, speed.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::VecDeque;
use std::time::Duration;
use thiserror::Error;

/// Board width in cells. Fixed for the lifetime of the game.
pub const GRID_WIDTH: usize = 10;
/// Board height in cells.
pub const GRID_HEIGHT: usize = 20;

/// Colour id of an empty cell; placed blocks use 1..=COLOR_COUNT.
pub const EMPTY: u8 = 0;
pub const COLOR_COUNT: u8 = 5;

pub const POINTS_PER_LINE: u32 = 100;

/// Tick interval at score 0.
pub const BASE_INTERVAL_MS: u64 = 500;
/// Interval reduction per speed level.
pub const SPEED_INCREMENT_MS: u64 = 50;
pub const MIN_INTERVAL_MS: u64 = 100;
/// Points needed per speed level.
pub const SCORE_PER_LEVEL: u32 = 500;

/// Tick interval for the given score: 500 ms, minus 50 ms every 500 points, never below 100 ms.
pub fn tick_interval(score: u32) -> Duration {
    let level = u64::from(score / SCORE_PER_LEVEL);
    let ms = BASE_INTERVAL_MS
        .saturating_sub(level.saturating_mul(SPEED_INCREMENT_MS))
        .max(MIN_INTERVAL_MS);
    Duration::from_millis(ms)
}

/// Speed level shown in the sidebar (1-based).
pub fn speed_level(score: u32) -> u32 {
    let steps = ((BASE_INTERVAL_MS - MIN_INTERVAL_MS) / SPEED_INCREMENT_MS) as u32;
    1 + (score / SCORE_PER_LEVEL).min(steps)
}

/// The five piece variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ShapeKind {
    Bar,
    Square,
    T,
    L,
    J,
}

impl ShapeKind {
    pub const ALL: [Self; 5] = [Self::Bar, Self::Square, Self::T, Self::L, Self::J];

    /// Spawn orientation, top row first.
    fn rows(self) -> &'static [&'static [u8]] {
        match self {
            Self::Bar => &[&[1, 1, 1, 1]],
            Self::Square => &[&[1, 1], &[1, 1]],
            Self::T => &[&[1, 1, 1], &[0, 1, 0]],
            Self::L => &[&[1, 1, 1], &[1, 0, 0]],
            Self::J => &[&[1, 1, 1], &[0, 0, 1]],
        }
    }

    pub fn shape(self) -> Shape {
        let rows = self.rows();
        let height = rows.len();
        let width = rows[0].len();
        let cells = rows.iter().flat_map(|r| r.iter().map(|&v| v != 0)).collect();
        Shape {
            width,
            height,
            cells,
        }
    }
}

/// Binary occupancy matrix of a piece, row-major.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Shape {
    width: usize,
    height: usize,
    cells: Vec<bool>,
}

impl Shape {
    #[inline]
    pub fn width(&self) -> usize {
        self.width
    }

    #[inline]
    pub fn height(&self) -> usize {
        self.height
    }

    #[inline]
    pub fn is_filled(&self, x: usize, y: usize) -> bool {
        x < self.width && y < self.height && self.cells[y * self.width + x]
    }

    /// Offsets (dx, dy) of occupied cells relative to the top-left corner.
    pub fn occupied(&self) -> impl Iterator<Item = (i32, i32)> + '_ {
        (0..self.height).flat_map(move |y| {
            (0..self.width)
                .filter(move |&x| self.is_filled(x, y))
                .map(move |x| (x as i32, y as i32))
        })
    }

    /// Quarter turn clockwise: `rotated[i][j] = shape[rows - 1 - j][i]`.
    pub fn rotated(&self) -> Self {
        let (rows, cols) = (self.height(), self.width());
        let mut cells = Vec::with_capacity(self.cells.len());
        for i in 0..cols {
            for j in 0..rows {
                cells.push(self.is_filled(i, rows - 1 - j));
            }
        }
        Self {
            width: rows,
            height: cols,
            cells,
        }
    }
}

/// The falling piece. `x`/`y` locate the shape's top-left corner on the grid.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Piece {
    pub kind: ShapeKind,
    pub shape: Shape,
    pub x: i32,
    pub y: i32,
    /// Colour id in 1..=COLOR_COUNT.
    pub color: u8,
}

impl Piece {
    /// Piece of `kind` centred horizontally on the top row.
    pub fn new(kind: ShapeKind, color: u8) -> Self {
        let shape = kind.shape();
        let x = (GRID_WIDTH / 2) as i32 - (shape.width() / 2) as i32;
        Self {
            kind,
            shape,
            x,
            y: 0,
            color,
        }
    }

    /// Absolute grid coordinates of occupied cells after displacing by (dx, dy).
    pub fn cells_at(&self, dx: i32, dy: i32) -> impl Iterator<Item = (i32, i32)> + '_ {
        self.shape
            .occupied()
            .map(move |(cx, cy)| (self.x + cx + dx, self.y + cy + dy))
    }

    fn shifted(&self, dx: i32, dy: i32) -> Self {
        let mut p = self.clone();
        p.x += dx;
        p.y += dy;
        p
    }

    /// Rotated clockwise, then pushed back inside the side walls (no kick search).
    pub fn rotated_clamped(&self) -> Self {
        let mut p = self.clone();
        p.shape = self.shape.rotated();
        let max_x = p.x + p.shape.width() as i32 - 1;
        if max_x >= GRID_WIDTH as i32 {
            p.x -= max_x - GRID_WIDTH as i32 + 1;
        }
        if p.x < 0 {
            p.x = 0;
        }
        p
    }
}

/// Uniformly random shape and colour, positioned at the spawn point.
pub fn spawn_piece<R: Rng + ?Sized>(rng: &mut R) -> Piece {
    let kind = ShapeKind::ALL[rng.gen_range(0..ShapeKind::ALL.len())];
    let color = rng.gen_range(1..=COLOR_COUNT);
    Piece::new(kind, color)
}

/// Fixed 10x20 matrix of colour ids. rows[0] is the top row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    rows: VecDeque<[u8; GRID_WIDTH]>,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    pub fn new() -> Self {
        Self {
            rows: (0..GRID_HEIGHT).map(|_| [EMPTY; GRID_WIDTH]).collect(),
        }
    }

    #[inline]
    pub fn get(&self, x: usize, y: usize) -> Option<u8> {
        self.rows.get(y).and_then(|row| row.get(x)).copied()
    }

    #[inline]
    pub fn set(&mut self, x: usize, y: usize, color: u8) {
        if let Some(cell) = self.rows.get_mut(y).and_then(|row| row.get_mut(x)) {
            *cell = color.min(COLOR_COUNT);
        }
    }

    pub fn rows(&self) -> impl Iterator<Item = &[u8; GRID_WIDTH]> {
        self.rows.iter()
    }

    pub fn height(&self) -> usize {
        self.rows.len()
    }

    pub fn is_row_full(&self, y: usize) -> bool {
        self.rows.get(y).is_some_and(|row| row.iter().all(|&c| c != EMPTY))
    }

    /// Copy of the grid with the piece's in-bounds cells written in its colour.
    pub fn merge(&self, piece: &Piece) -> Self {
        let mut grid = self.clone();
        for (x, y) in piece.cells_at(0, 0) {
            if in_bounds(x, y) {
                grid.set(x as usize, y as usize, piece.color);
            }
        }
        grid
    }

    /// Drops every full row and refills from the top. Returns the new grid and rows removed.
    pub fn clear_lines(&self) -> (Self, u32) {
        let mut rows: VecDeque<[u8; GRID_WIDTH]> = self
            .rows
            .iter()
            .enumerate()
            .filter(|&(y, _)| !self.is_row_full(y))
            .map(|(_, row)| *row)
            .collect();
        let cleared = self.height() - rows.len();
        for _ in 0..cleared {
            rows.push_front([EMPTY; GRID_WIDTH]);
        }
        (Self { rows }, cleared as u32)
    }
}

#[inline]
fn in_bounds(x: i32, y: i32) -> bool {
    x >= 0 && x < GRID_WIDTH as i32 && y >= 0 && y < GRID_HEIGHT as i32
}

/// True if the piece displaced by (dx, dy) leaves the side walls, passes the floor,
/// or overlaps a filled cell. Cells above the top row never collide.
pub fn collides(piece: &Piece, grid: &Grid, dx: i32, dy: i32) -> bool {
    piece.cells_at(dx, dy).any(|(x, y)| {
        if x < 0 || x >= GRID_WIDTH as i32 || y >= GRID_HEIGHT as i32 {
            return true;
        }
        y >= 0 && grid.get(x as usize, y as usize).is_some_and(|c| c != EMPTY)
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    Running,
    Paused,
    GameOver,
}

/// Piece transforms requested by the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Move {
    Left,
    Right,
    Down,
    Rotate,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Spawned {
    Falling,
    /// The new piece overlapped the stack; the game is over.
    ToppedOut,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tick {
    Fell,
    /// Piece merged into the grid; `lines` full rows were removed.
    Locked { lines: u32 },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Moved {
    Applied,
    Blocked,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("game is over")]
    GameOver,
    #[error("game is paused")]
    Paused,
    #[error("no piece is falling")]
    NoPiece,
    #[error("a piece is already falling")]
    PieceActive,
}

/// Everything the rules engine owns: grid, falling piece, score, status.
#[derive(Debug)]
pub struct GameState {
    grid: Grid,
    piece: Option<Piece>,
    score: u32,
    lines_cleared: u32,
    status: Status,
    rng: StdRng,
}

impl GameState {
    /// `seed` fixes the piece sequence; `None` seeds from the OS.
    pub fn new(seed: Option<u64>) -> Self {
        let rng = match seed {
            Some(s) => StdRng::seed_from_u64(s),
            None => StdRng::from_entropy(),
        };
        Self {
            grid: Grid::new(),
            piece: None,
            score: 0,
            lines_cleared: 0,
            status: Status::Running,
            rng,
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn piece(&self) -> Option<&Piece> {
        self.piece.as_ref()
    }

    pub fn score(&self) -> u32 {
        self.score
    }

    pub fn lines_cleared(&self) -> u32 {
        self.lines_cleared
    }

    pub fn status(&self) -> Status {
        self.status
    }

    /// No piece is falling and the game can continue.
    pub fn needs_piece(&self) -> bool {
        self.piece.is_none() && self.status != Status::GameOver
    }

    fn ensure_running(&self) -> Result<(), GameError> {
        match self.status {
            Status::Running => Ok(()),
            Status::Paused => Err(GameError::Paused),
            Status::GameOver => Err(GameError::GameOver),
        }
    }

    /// Spawns a random piece. Tops out (game over) if it collides where it appears.
    pub fn spawn(&mut self) -> Result<Spawned, GameError> {
        if self.status == Status::GameOver {
            return Err(GameError::GameOver);
        }
        if self.piece.is_some() {
            return Err(GameError::PieceActive);
        }
        let piece = spawn_piece(&mut self.rng);
        Ok(self.place_spawned(piece))
    }

    fn place_spawned(&mut self, piece: Piece) -> Spawned {
        if collides(&piece, &self.grid, 0, 0) {
            log::info!("spawned {:?} collides at spawn; game over", piece.kind);
            self.status = Status::GameOver;
            Spawned::ToppedOut
        } else {
            log::debug!("spawned {:?} colour {} at x={}", piece.kind, piece.color, piece.x);
            self.piece = Some(piece);
            Spawned::Falling
        }
    }

    /// One gravity step: fall one row, or lock, clear lines and score.
    pub fn tick(&mut self) -> Result<Tick, GameError> {
        self.ensure_running()?;
        let piece = self.piece.as_ref().ok_or(GameError::NoPiece)?;
        if !collides(piece, &self.grid, 0, 1) {
            self.piece = self.piece.take().map(|p| p.shifted(0, 1));
            return Ok(Tick::Fell);
        }
        let (grid, lines) = self.grid.merge(piece).clear_lines();
        self.grid = grid;
        self.piece = None;
        self.score += lines * POINTS_PER_LINE;
        self.lines_cleared += lines;
        log::debug!("piece locked, {} line(s) cleared, score {}", lines, self.score);
        Ok(Tick::Locked { lines })
    }

    /// Applies a player move if the result does not collide. Never locks the piece.
    pub fn apply(&mut self, mv: Move) -> Result<Moved, GameError> {
        self.ensure_running()?;
        let piece = self.piece.as_ref().ok_or(GameError::NoPiece)?;
        let candidate = match mv {
            Move::Left => piece.shifted(-1, 0),
            Move::Right => piece.shifted(1, 0),
            Move::Down => piece.shifted(0, 1),
            Move::Rotate => piece.rotated_clamped(),
        };
        if collides(&candidate, &self.grid, 0, 0) {
            return Ok(Moved::Blocked);
        }
        self.piece = Some(candidate);
        Ok(Moved::Applied)
    }

    /// Flips Running <-> Paused and returns the new status.
    pub fn toggle_pause(&mut self) -> Result<Status, GameError> {
        self.status = match self.status {
            Status::Running => Status::Paused,
            Status::Paused => Status::Running,
            Status::GameOver => return Err(GameError::GameOver),
        };
        log::info!("status now {:?}", self.status);
        Ok(self.status)
    }

    /// Fresh grid, zero score, running, no piece. The RNG keeps its stream.
    pub fn reset(&mut self) {
        self.grid = Grid::new();
        self.piece = None;
        self.score = 0;
        self.lines_cleared = 0;
        self.status = Status::Running;
        log::info!("new game");
    }

    /// Grid with the falling piece drawn in, for rendering.
    pub fn display_grid(&self) -> Grid {
        match &self.piece {
            Some(p) if self.status != Status::GameOver => self.grid.merge(p),
            _ => self.grid.clone(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fill_row_except(grid: &mut Grid, y: usize, hole: Option<usize>) {
        for x in 0..GRID_WIDTH {
            if Some(x) != hole {
                grid.set(x, y, 3);
            }
        }
    }

    fn state_with(grid: Grid, piece: Piece) -> GameState {
        let mut state = GameState::new(Some(7));
        state.grid = grid;
        state.piece = Some(piece);
        state
    }

    #[test]
    fn bar_spawns_centred() {
        let p = Piece::new(ShapeKind::Bar, 1);
        assert_eq!((p.x, p.y), (3, 0));
        let sq = Piece::new(ShapeKind::Square, 1);
        assert_eq!((sq.x, sq.y), (4, 0));
        let t = Piece::new(ShapeKind::T, 1);
        assert_eq!((t.x, t.y), (4, 0));
    }

    #[test]
    fn spawn_piece_colour_in_range() {
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..200 {
            let p = spawn_piece(&mut rng);
            assert!((1..=COLOR_COUNT).contains(&p.color));
            assert_eq!(p.y, 0);
            assert!(!collides(&p, &Grid::new(), 0, 0));
        }
    }

    #[test]
    fn spawn_piece_hits_every_shape() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut seen = Vec::new();
        for _ in 0..500 {
            let kind = spawn_piece(&mut rng).kind;
            if !seen.contains(&kind) {
                seen.push(kind);
            }
        }
        assert_eq!(seen.len(), ShapeKind::ALL.len());
    }

    #[test]
    fn collision_walls_and_floor() {
        let grid = Grid::new();
        let mut p = Piece::new(ShapeKind::Bar, 1);
        p.x = 0;
        assert!(collides(&p, &grid, -1, 0));
        assert!(!collides(&p, &grid, 0, 0));
        p.x = 6;
        assert!(collides(&p, &grid, 1, 0));
        p.y = 19;
        assert!(!collides(&p, &grid, 0, 0));
        assert!(collides(&p, &grid, 0, 1));
    }

    #[test]
    fn collision_ignores_cells_above_top() {
        let grid = Grid::new();
        let mut p = Piece::new(ShapeKind::T, 2);
        p.y = -1;
        assert!(!collides(&p, &grid, 0, 0));
        p.y = -5;
        assert!(!collides(&p, &grid, 0, 0));
    }

    #[test]
    fn collision_with_stack() {
        let mut grid = Grid::new();
        grid.set(4, 1, 5);
        let p = Piece::new(ShapeKind::Square, 1);
        assert!(collides(&p, &grid, 0, 0));
        assert!(!collides(&p, &grid, 2, 0));
        // T's stem at (5, 1) misses (4, 1).
        let t = Piece::new(ShapeKind::T, 1);
        assert!(!collides(&t, &grid, 0, 0));
    }

    #[test]
    fn merge_leaves_original_untouched() {
        let grid = Grid::new();
        let mut p = Piece::new(ShapeKind::Square, 4);
        p.y = 18;
        let merged = grid.merge(&p);
        assert_eq!(grid, Grid::new());
        assert_eq!(merged.get(4, 18), Some(4));
        assert_eq!(merged.get(5, 19), Some(4));
        assert_eq!(merged.get(3, 19), Some(EMPTY));
    }

    #[test]
    fn merge_drops_out_of_bounds_cells() {
        let mut p = Piece::new(ShapeKind::L, 2);
        p.y = -1;
        let merged = Grid::new().merge(&p);
        // Only the lower row of L lands on row 0.
        let filled: usize = merged.rows().map(|r| r.iter().filter(|&&c| c != EMPTY).count()).sum();
        assert_eq!(filled, 1);
        assert_eq!(merged.get(4, 0), Some(2));
    }

    #[test]
    fn clear_lines_without_full_rows_is_noop() {
        let mut grid = Grid::new();
        fill_row_except(&mut grid, 19, Some(0));
        grid.set(2, 10, 1);
        let (cleared, n) = grid.clear_lines();
        assert_eq!(n, 0);
        assert_eq!(cleared, grid);
    }

    #[test]
    fn clear_lines_keeps_height_and_shifts_down() {
        let mut grid = Grid::new();
        fill_row_except(&mut grid, 19, None);
        fill_row_except(&mut grid, 17, None);
        grid.set(1, 18, 2);
        grid.set(7, 16, 5);
        let (cleared, n) = grid.clear_lines();
        assert_eq!(n, 2);
        assert_eq!(cleared.height(), GRID_HEIGHT);
        assert_eq!(cleared.get(1, 19), Some(2));
        assert_eq!(cleared.get(7, 18), Some(5));
        assert!(cleared.rows().take(2).all(|r| r.iter().all(|&c| c == EMPTY)));
        assert!(!cleared.is_row_full(19));
    }

    #[test]
    fn clear_all_rows() {
        let mut grid = Grid::new();
        for y in 0..GRID_HEIGHT {
            fill_row_except(&mut grid, y, None);
        }
        let (cleared, n) = grid.clear_lines();
        assert_eq!(n, GRID_HEIGHT as u32);
        assert_eq!(cleared, Grid::new());
    }

    #[test]
    fn rotate_four_times_is_identity() {
        for kind in ShapeKind::ALL {
            let s = kind.shape();
            let back = s.rotated().rotated().rotated().rotated();
            assert_eq!(back, s, "{:?}", kind);
        }
        let sq = ShapeKind::Square.shape();
        assert_eq!(sq.rotated(), sq);
    }

    #[test]
    fn rotate_is_clockwise() {
        // T pointing down becomes T pointing left.
        let r = ShapeKind::T.shape().rotated();
        assert_eq!((r.width(), r.height()), (2, 3));
        let cells: Vec<_> = r.occupied().collect();
        assert_eq!(cells, vec![(1, 0), (0, 1), (1, 1), (1, 2)]);

        let bar = ShapeKind::Bar.shape().rotated();
        assert_eq!((bar.width(), bar.height()), (1, 4));
    }

    #[test]
    fn rotation_clamps_to_right_wall() {
        let mut p = Piece::new(ShapeKind::Bar, 1);
        p.shape = p.shape.rotated();
        p.x = 9;
        p.y = 5;
        let r = p.rotated_clamped();
        assert_eq!(r.shape.width(), 4);
        assert_eq!(r.x, 6);
    }

    #[test]
    fn tick_interval_steps() {
        assert_eq!(tick_interval(0), Duration::from_millis(500));
        assert_eq!(tick_interval(499), Duration::from_millis(500));
        assert_eq!(tick_interval(500), Duration::from_millis(450));
        assert_eq!(tick_interval(4000), Duration::from_millis(100));
        assert_eq!(tick_interval(5000), Duration::from_millis(100));
        assert_eq!(tick_interval(u32::MAX), Duration::from_millis(100));
        assert_eq!(speed_level(0), 1);
        assert_eq!(speed_level(1000), 3);
        assert_eq!(speed_level(100_000), 9);
    }

    #[test]
    fn tick_on_bottom_row_locks() {
        let mut p = Piece::new(ShapeKind::Bar, 2);
        p.y = 19;
        let mut state = state_with(Grid::new(), p);
        assert_eq!(state.tick(), Ok(Tick::Locked { lines: 0 }));
        assert!(state.piece().is_none());
        assert!(state.needs_piece());
        assert_eq!(state.grid().get(3, 19), Some(2));
        assert_eq!(state.score(), 0);
    }

    #[test]
    fn tick_falls_one_row() {
        let mut state = state_with(Grid::new(), Piece::new(ShapeKind::T, 1));
        assert_eq!(state.tick(), Ok(Tick::Fell));
        assert_eq!(state.piece().map(|p| p.y), Some(1));
    }

    #[test]
    fn filling_last_hole_clears_one_line() {
        let mut grid = Grid::new();
        fill_row_except(&mut grid, 19, Some(9));
        let mut bar = Piece::new(ShapeKind::Bar, 4);
        bar.shape = bar.shape.rotated();
        bar.x = 9;
        bar.y = 16;
        let mut state = state_with(grid, bar);
        assert_eq!(state.tick(), Ok(Tick::Locked { lines: 1 }));
        assert_eq!(state.score(), 100);
        assert_eq!(state.lines_cleared(), 1);
        assert_eq!(state.grid().height(), GRID_HEIGHT);
        // Remaining three bar cells shifted down by one.
        assert_eq!(state.grid().get(9, 19), Some(4));
        assert_eq!(state.grid().get(9, 17), Some(4));
        assert_eq!(state.grid().get(9, 16), Some(EMPTY));
        assert_eq!(state.grid().get(0, 19), Some(EMPTY));
    }

    #[test]
    fn multi_line_clear_scores_per_line() {
        let mut grid = Grid::new();
        for y in 16..20 {
            fill_row_except(&mut grid, y, Some(0));
        }
        let mut bar = Piece::new(ShapeKind::Bar, 1);
        bar.shape = bar.shape.rotated();
        bar.x = 0;
        bar.y = 16;
        let mut state = state_with(grid, bar);
        state.score = 450;
        assert_eq!(state.tick(), Ok(Tick::Locked { lines: 4 }));
        assert_eq!(state.score(), 850);
        assert_eq!(state.grid(), &Grid::new());
    }

    #[test]
    fn spawn_onto_stack_is_game_over() {
        let mut state = GameState::new(Some(3));
        for y in 0..2 {
            fill_row_except(&mut state.grid, y, Some(0));
        }
        assert_eq!(state.spawn(), Ok(Spawned::ToppedOut));
        assert_eq!(state.status(), Status::GameOver);
        assert!(!state.needs_piece());
        assert_eq!(state.spawn(), Err(GameError::GameOver));
        assert_eq!(state.tick(), Err(GameError::GameOver));
        assert_eq!(state.toggle_pause(), Err(GameError::GameOver));
    }

    #[test]
    fn spawn_twice_is_rejected() {
        let mut state = GameState::new(Some(3));
        assert_eq!(state.spawn(), Ok(Spawned::Falling));
        assert_eq!(state.spawn(), Err(GameError::PieceActive));
    }

    #[test]
    fn moves_respect_walls() {
        let mut p = Piece::new(ShapeKind::Square, 1);
        p.x = 0;
        let mut state = state_with(Grid::new(), p);
        assert_eq!(state.apply(Move::Left), Ok(Moved::Blocked));
        assert_eq!(state.apply(Move::Right), Ok(Moved::Applied));
        assert_eq!(state.piece().map(|p| p.x), Some(1));
    }

    #[test]
    fn soft_drop_never_locks() {
        let mut p = Piece::new(ShapeKind::Square, 1);
        p.y = 18;
        let mut state = state_with(Grid::new(), p);
        assert_eq!(state.apply(Move::Down), Ok(Moved::Blocked));
        assert!(state.piece().is_some());
        assert_eq!(state.grid(), &Grid::new());
    }

    #[test]
    fn rotate_rejected_when_blocked() {
        let mut grid = Grid::new();
        grid.set(5, 7, 1);
        let mut p = Piece::new(ShapeKind::Bar, 1);
        p.y = 5;
        let mut state = state_with(grid, p.clone());
        // Vertical bar would occupy (3, 5..=8): free.
        assert_eq!(state.apply(Move::Rotate), Ok(Moved::Applied));
        state.piece = Some(p);
        state.grid.set(3, 6, 2);
        assert_eq!(state.apply(Move::Rotate), Ok(Moved::Blocked));
        assert_eq!(state.piece().map(|p| p.shape.width()), Some(4));
    }

    #[test]
    fn input_ignored_while_paused() {
        let mut state = state_with(Grid::new(), Piece::new(ShapeKind::T, 1));
        assert_eq!(state.toggle_pause(), Ok(Status::Paused));
        assert_eq!(state.apply(Move::Left), Err(GameError::Paused));
        assert_eq!(state.tick(), Err(GameError::Paused));
        assert_eq!(state.toggle_pause(), Ok(Status::Running));
        assert_eq!(state.apply(Move::Left), Ok(Moved::Applied));
    }

    #[test]
    fn input_without_piece() {
        let mut state = GameState::new(Some(1));
        assert_eq!(state.apply(Move::Rotate), Err(GameError::NoPiece));
        assert_eq!(state.tick(), Err(GameError::NoPiece));
    }

    #[test]
    fn reset_restores_fresh_state() {
        let mut grid = Grid::new();
        fill_row_except(&mut grid, 0, Some(0));
        let mut state = state_with(grid, Piece::new(ShapeKind::J, 1));
        state.score = 1200;
        state.status = Status::GameOver;
        state.reset();
        assert_eq!(state.grid(), &Grid::new());
        assert_eq!(state.score(), 0);
        assert_eq!(state.status(), Status::Running);
        assert!(state.needs_piece());
    }

    #[test]
    fn display_grid_overlays_piece() {
        let state = state_with(Grid::new(), Piece::new(ShapeKind::Square, 5));
        let shown = state.display_grid();
        assert_eq!(shown.get(4, 0), Some(5));
        assert_eq!(shown.get(5, 1), Some(5));
        assert_eq!(state.grid().get(4, 0), Some(EMPTY));
    }

    #[test]
    fn seeded_games_repeat() {
        let mut a = GameState::new(Some(99));
        let mut b = GameState::new(Some(99));
        for _ in 0..20 {
            a.piece = None;
            b.piece = None;
            a.spawn().ok();
            b.spawn().ok();
            assert_eq!(a.piece(), b.piece());
        }
    }
}
