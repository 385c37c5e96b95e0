use crate::board::{Board, BoardSettings, Piece};
use crate::geometry::{compute_aabb, compute_head_lane, overlap};

pub const MAX_PIECES: usize = 20;

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
#[serde(tag = "kind", content = "order", rename_all = "camelCase")]
pub enum Verdict {
    /// A full removal order, as indices into the solved slice.
    Solvable(Vec<usize>),
    Unsolvable,
    /// Too many pieces to search exhaustively.
    Unverifiable,
}

impl Verdict {
    pub fn order(&self) -> Option<&[usize]> {
        match self {
            Verdict::Solvable(order) => Some(order),
            _ => None,
        }
    }

    pub fn is_solvable(&self) -> bool {
        matches!(self, Verdict::Solvable(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ReplayError {
    #[error("order has {got} entries for {expected} pieces")]
    WrongLength { expected: usize, got: usize },

    #[error("piece index {index} is out of range or removed twice")]
    BadIndex { index: usize },

    #[error("step {step}: piece {index} is still blocked")]
    Blocked { step: usize, index: usize },
}

/// Static "lane of i hits box of j" relation over at most 32 pieces.
#[derive(Debug, Clone)]
pub struct BlockGraph {
    blockers: Vec<u32>,
    score: Vec<u32>,
}

impl BlockGraph {
    pub fn new(pieces: &[Piece], settings: &BoardSettings) -> Self {
        debug_assert!(pieces.len() <= 32);

        let lanes = pieces
            .iter()
            .map(|p| compute_head_lane(p, settings))
            .collect::<Vec<_>>();
        let boxes = pieces
            .iter()
            .map(|p| compute_aabb(p, settings))
            .collect::<Vec<_>>();

        let blockers = lanes
            .iter()
            .enumerate()
            .map(|(i, lane)| {
                boxes
                    .iter()
                    .enumerate()
                    .filter(|(j, bb)| *j != i && overlap(lane, bb))
                    .fold(0u32, |acc, (j, _)| acc | (1 << j))
            })
            .collect::<Vec<_>>();

        // Heuristic: pieces that sit in many lanes free up the most when they leave.
        let score = (0..pieces.len())
            .map(|i| blockers.iter().filter(|b| *b & (1 << i) != 0).count() as u32)
            .collect();

        BlockGraph { blockers, score }
    }

    pub fn len(&self) -> usize {
        self.blockers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blockers.is_empty()
    }

    /// Bitmask of the pieces sitting in piece `i`'s lane.
    pub fn blockers(&self, i: usize) -> u32 {
        self.blockers[i]
    }

    /// Pieces present in `mask` that can leave right now, most promising first.
    pub fn exits(&self, mask: u32) -> Vec<usize> {
        let mut out = (0..self.blockers.len())
            .filter(|i| mask & (1 << i) != 0 && self.blockers[*i] & mask == 0)
            .collect::<Vec<_>>();
        out.sort_by(|a, b| self.score[*b].cmp(&self.score[*a]));
        out
    }

    pub fn full_mask(&self) -> u32 {
        match self.blockers.len() {
            32 => u32::MAX,
            n => (1u32 << n) - 1,
        }
    }
}

fn search(
    graph: &BlockGraph,
    mask: u32,
    dead: &mut std::collections::HashSet<u32>,
    order: &mut Vec<usize>,
) -> bool {
    if mask == 0 {
        return true;
    }
    if dead.contains(&mask) {
        return false;
    }

    for i in graph.exits(mask) {
        order.push(i);
        if search(graph, mask & !(1 << i), dead, order) {
            return true;
        }
        order.pop();
    }

    // Either nothing can leave, or every removal leads to a dead end.
    dead.insert(mask);
    false
}

/// Decides whether `pieces` can all be removed, and in which order.
pub fn solve(pieces: &[Piece], settings: &BoardSettings) -> Verdict {
    if pieces.len() > MAX_PIECES {
        log::debug!(
            "refusing to solve {} pieces (limit {})",
            pieces.len(),
            MAX_PIECES
        );
        return Verdict::Unverifiable;
    }

    let graph = BlockGraph::new(pieces, settings);
    let mut dead = std::collections::HashSet::new();
    let mut order = Vec::with_capacity(pieces.len());

    let solved = search(&graph, graph.full_mask(), &mut dead, &mut order);
    log::debug!(
        "solve: {} pieces, {} dead masks, solvable: {}",
        pieces.len(),
        dead.len(),
        solved
    );

    if solved {
        Verdict::Solvable(order)
    } else {
        Verdict::Unsolvable
    }
}

pub fn solve_board(board: &Board) -> Verdict {
    solve(board.pieces(), board.settings())
}

/// Checks a removal order against the head-lane rule, one removal at a time.
pub fn replay(
    pieces: &[Piece],
    settings: &BoardSettings,
    order: &[usize],
) -> Result<(), ReplayError> {
    if order.len() != pieces.len() {
        return Err(ReplayError::WrongLength {
            expected: pieces.len(),
            got: order.len(),
        });
    }

    let boxes = pieces
        .iter()
        .map(|p| compute_aabb(p, settings))
        .collect::<Vec<_>>();

    // Indices, not ids, identify pieces here, as in `BlockGraph`.
    let mut present = vec![true; pieces.len()];
    for (step, &index) in order.iter().enumerate() {
        if !present.get(index).copied().unwrap_or(false) {
            return Err(ReplayError::BadIndex { index });
        }

        let lane = compute_head_lane(&pieces[index], settings);
        let blocked = boxes
            .iter()
            .enumerate()
            .any(|(j, bb)| j != index && present[j] && overlap(&lane, bb));
        if blocked {
            return Err(ReplayError::Blocked { step, index });
        }

        present[index] = false;
    }

    Ok(())
}
