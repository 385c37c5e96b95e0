use crate::board::{Board, BoardSettings, Cell, Direction, Piece};

/// How far past the board edge a head lane reaches, in pixels.
const LANE_OVERSHOOT: f64 = 999.0;

/// Axis-aligned rectangle in pixel space, `x1 <= x2` and `y1 <= y2`.
#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Rect {
    pub x1: f64,
    pub y1: f64,
    pub x2: f64,
    pub y2: f64,
}

impl Rect {
    /// Inclusive on every edge: rectangles that only touch still overlap.
    pub fn overlaps(&self, other: &Rect) -> bool {
        !(self.x2 < other.x1 || self.x1 > other.x2 || self.y2 < other.y1 || self.y1 > other.y2)
    }
}

pub fn overlap(a: &Rect, b: &Rect) -> bool {
    a.overlaps(b)
}

pub fn cell_center(cell: Cell, settings: &BoardSettings) -> (f64, f64) {
    (
        (cell.x as f64 + 0.5) * settings.cell_size,
        (cell.y as f64 + 0.5) * settings.cell_size,
    )
}

/// Cell centers of the piece with a short cap added past the head and past the tail.
fn polyline(piece: &Piece, settings: &BoardSettings) -> Vec<(f64, f64)> {
    let cell = settings.cell_size;
    let thick = piece.thickness();
    let (dx, dy) = piece.direction().delta();

    let mut points = Vec::with_capacity(piece.len() + 2);

    let (hx, hy) = cell_center(piece.head(), settings);
    let head_ext = (cell * 0.40).min(thick);
    points.push((hx + dx as f64 * head_ext, hy + dy as f64 * head_ext));
    points.extend(piece.cells().iter().map(|c| cell_center(*c, settings)));

    let (tail_x, tail_y) = points[points.len() - 1];
    let (prev_x, prev_y) = points[points.len() - 2];
    let (tx, ty) = (tail_x - prev_x, tail_y - prev_y);
    let tlen = match tx.hypot(ty) {
        l if l > 0.0 => l,
        _ => 1.0,
    };
    let tail_ext = (cell * 0.35).min(thick * 0.9);
    points.push((tail_x + tx / tlen * tail_ext, tail_y + ty / tlen * tail_ext));

    points
}

pub fn compute_aabb(piece: &Piece, settings: &BoardSettings) -> Rect {
    let mut rect = Rect {
        x1: f64::INFINITY,
        y1: f64::INFINITY,
        x2: f64::NEG_INFINITY,
        y2: f64::NEG_INFINITY,
    };
    for (x, y) in polyline(piece, settings) {
        rect.x1 = rect.x1.min(x);
        rect.y1 = rect.y1.min(y);
        rect.x2 = rect.x2.max(x);
        rect.y2 = rect.y2.max(y);
    }

    let pad = piece.thickness() * 0.85;
    Rect {
        x1: rect.x1 - pad,
        y1: rect.y1 - pad,
        x2: rect.x2 + pad,
        y2: rect.y2 + pad,
    }
}

pub fn compute_head_lane(piece: &Piece, settings: &BoardSettings) -> Rect {
    let (hx, hy) = cell_center(piece.head(), settings);
    let thick = piece.thickness();
    let half = thick * 1.35 / 2.0;
    let gap = thick * 0.6;

    match piece.direction() {
        Direction::Right => Rect {
            x1: hx + gap,
            y1: hy - half,
            x2: settings.width() + LANE_OVERSHOOT,
            y2: hy + half,
        },
        Direction::Left => Rect {
            x1: -LANE_OVERSHOOT,
            y1: hy - half,
            x2: hx - gap,
            y2: hy + half,
        },
        Direction::Down => Rect {
            x1: hx - half,
            y1: hy + gap,
            x2: hx + half,
            y2: settings.height() + LANE_OVERSHOOT,
        },
        Direction::Up => Rect {
            x1: hx - half,
            y1: -LANE_OVERSHOOT,
            x2: hx + half,
            y2: hy - gap,
        },
    }
}

/// Whether `piece` could leave right now with `others` still in place.
///
/// `piece` itself is skipped by identity, so it may or may not be part of `others`.
pub fn can_exit_among(piece: &Piece, others: &[Piece], settings: &BoardSettings) -> bool {
    let lane = compute_head_lane(piece, settings);
    others
        .iter()
        .filter(|o| o.id() != piece.id())
        .all(|o| !overlap(&lane, &compute_aabb(o, settings)))
}

pub fn can_exit(piece: &Piece, board: &Board) -> bool {
    can_exit_among(piece, board.pieces(), board.settings())
}
