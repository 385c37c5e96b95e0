use std::collections::VecDeque;

use crate::board::{Board, BoardError, Piece, PieceId};
use crate::geometry::can_exit;

/// Undo snapshots kept per session; older ones are dropped first.
pub const HISTORY_LIMIT: usize = 90;

#[derive(Debug, Clone)]
struct Snapshot {
    board: Board,
    moves: u32,
}

/// One play-through of a board: removals gated by the head-lane rule, with undo.
#[derive(Debug, Clone)]
pub struct Session {
    board: Board,
    moves: u32,
    history: VecDeque<Snapshot>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExitState {
    pub id: PieceId,
    pub can_exit: bool,
}

impl Session {
    pub fn new(board: Board) -> Self {
        Session {
            board,
            moves: 0,
            history: VecDeque::new(),
        }
    }

    pub fn board(&self) -> &Board {
        &self.board
    }

    pub fn moves(&self) -> u32 {
        self.moves
    }

    pub fn can_undo(&self) -> bool {
        !self.history.is_empty()
    }

    /// Removes `id` if its lane is clear. A blocked or unknown piece leaves the session as is.
    pub fn remove(&mut self, id: PieceId) -> Result<Piece, BoardError> {
        let piece = self.board.get(id).ok_or(BoardError::UnknownPiece(id))?;
        if !can_exit(piece, &self.board) {
            return Err(BoardError::Blocked(id));
        }

        if self.history.len() == HISTORY_LIMIT {
            self.history.pop_front();
        }
        self.history.push_back(Snapshot {
            board: self.board.clone(),
            moves: self.moves,
        });

        let removed = self.board.remove(id)?;
        self.moves += 1;
        Ok(removed)
    }

    /// Restores the state before the last removal. Returns false when there is nothing to undo.
    pub fn undo(&mut self) -> bool {
        match self.history.pop_back() {
            Some(snapshot) => {
                self.board = snapshot.board;
                self.moves = snapshot.moves;
                true
            }
            None => false,
        }
    }

    pub fn exit_states(&self) -> Vec<ExitState> {
        self.board
            .pieces()
            .iter()
            .map(|p| ExitState {
                id: p.id(),
                can_exit: can_exit(p, &self.board),
            })
            .collect()
    }

    pub fn is_cleared(&self) -> bool {
        self.board.is_empty()
    }

    /// Pieces remain but none of them can leave.
    pub fn is_stuck(&self) -> bool {
        !self.board.is_empty() && !self.board.pieces().iter().any(|p| can_exit(p, &self.board))
    }
}
