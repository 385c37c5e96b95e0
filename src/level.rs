use crate::board::{Board, BoardError, BoardSettings, Cell, Direction, BASE_THICKNESS};
use crate::generator::{self, GenerationBudget};
use crate::solver::{self, Verdict};

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct SnakeSpec {
    pub dir: Direction,
    pub cells: Vec<Cell>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct LevelSpec {
    pub id: Option<String>,
    pub name: Option<String>,
    pub snakes: Vec<SnakeSpec>,
}

pub fn level_thickness(index: usize) -> f64 {
    (BASE_THICKNESS + (index % 3) as f64 * 2.0).clamp(12.0, 22.0)
}

fn level_color_seed(index: usize, len: usize) -> u32 {
    ((index * 947 + len * 31) % 10_000) as u32
}

impl Board {
    /// One bad piece rejects the whole level.
    pub fn from_specs(settings: BoardSettings, specs: &[SnakeSpec]) -> Result<Board, BoardError> {
        let mut board = Board::new(settings);
        for (index, spec) in specs.iter().enumerate() {
            board.add(
                spec.dir,
                spec.cells.clone(),
                level_thickness(index),
                level_color_seed(index, spec.cells.len()),
            )?;
        }
        Ok(board)
    }

    pub fn to_specs(&self) -> Vec<SnakeSpec> {
        self.pieces()
            .iter()
            .map(|p| SnakeSpec {
                dir: p.direction(),
                cells: p.cells().to_vec(),
            })
            .collect()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub enum LevelStatus {
    Authored,
    /// Replaced by a generated board with the same piece count and length range.
    Regenerated,
    Unsolvable,
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LoadedLevel {
    pub board: Board,
    pub status: LevelStatus,
    pub order: Option<Vec<usize>>,
}

/// Imports `level`, swapping in a generated board when it cannot be cleared.
pub fn load_level(
    settings: BoardSettings,
    level: &LevelSpec,
    budget: GenerationBudget,
) -> LoadedLevel {
    let authored = match Board::from_specs(settings, &level.snakes) {
        Ok(board) => match solver::solve_board(&board) {
            Verdict::Solvable(order) => {
                return LoadedLevel {
                    board,
                    status: LevelStatus::Authored,
                    order: Some(order),
                }
            }
            verdict => {
                log::warn!(
                    "level {:?} is not certified solvable ({:?}), regenerating",
                    level.name,
                    verdict
                );
                board
            }
        },
        Err(err) => {
            log::warn!("level {:?} rejected: {}, regenerating", level.name, err);
            Board::new(settings)
        }
    };

    let lengths = level.snakes.iter().map(|s| s.cells.len());
    match generator::generate_replacement(settings, lengths, budget) {
        Ok(generated) => LoadedLevel {
            board: generated.board,
            status: LevelStatus::Regenerated,
            order: Some(generated.order),
        },
        Err(err) => {
            log::warn!("no replacement for level {:?}: {}", level.name, err);
            LoadedLevel {
                board: authored,
                status: LevelStatus::Unsolvable,
                order: None,
            }
        }
    }
}
