//! Random board generation by rejection sampling.

use genawaiter::yield_;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::board::{Board, BoardSettings, Cell, Direction, BASE_THICKNESS};
use crate::geometry::{can_exit, cell_center};
use crate::solver::{self, Verdict};

const MIN_PIECE_LEN: usize = 2;
const MAX_MIN_LEN: usize = 20;
const MAX_MAX_LEN: usize = 30;

const DENSITY_HINT: f64 = 0.80;

#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GeneratorOptions {
    pub count: usize,
    pub min_len: usize,
    pub max_len: usize,
}

impl Default for GeneratorOptions {
    fn default() -> Self {
        Self {
            count: 14,
            min_len: 2,
            max_len: 20,
        }
    }
}

impl GeneratorOptions {
    /// An inverted length range is swapped.
    pub fn clamped(self) -> Self {
        let count = self.count.clamp(1, solver::MAX_PIECES);
        let mut min_len = self.min_len.clamp(MIN_PIECE_LEN, MAX_MIN_LEN);
        let mut max_len = self.max_len.clamp(MIN_PIECE_LEN, MAX_MAX_LEN);
        if min_len > max_len {
            std::mem::swap(&mut min_len, &mut max_len);
        }

        Self {
            count,
            min_len,
            max_len,
        }
    }

    pub fn matching(lengths: impl IntoIterator<Item = usize>) -> Option<Self> {
        let lengths = lengths.into_iter().collect::<Vec<_>>();
        let shortest = *lengths.iter().min()?;
        let longest = *lengths.iter().max()?;

        let min_len = shortest.max(MIN_PIECE_LEN);
        Some(
            Self {
                count: lengths.len(),
                min_len,
                max_len: longest.max(min_len),
            }
            .clamped(),
        )
    }

    pub fn density_warning(&self, settings: &BoardSettings) -> Option<String> {
        let cells = settings.cols.max(0) as f64 * settings.rows.max(0) as f64;
        let needed = self.count as f64 * self.min_len as f64;
        if needed > cells * DENSITY_HINT {
            Some(format!(
                "{} pieces of length {}+ is very dense for a {}x{} board; \
                 try fewer pieces or shorter lengths",
                self.count, self.min_len, settings.cols, settings.rows
            ))
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct GenerationBudget {
    pub primary_attempts: usize,
    pub fallback_attempts: usize,
    pub placement_tries: usize,
    pub margin_cells: i32,
    /// Pixels between a head and the edge it faces, enforced in the primary pass.
    pub edge_buffer: f64,
}

impl Default for GenerationBudget {
    fn default() -> Self {
        Self {
            primary_attempts: 700,
            fallback_attempts: 1400,
            placement_tries: 180,
            margin_cells: 1,
            edge_buffer: 60.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GenerationError {
    #[error("no solvable board found in {attempts} attempts")]
    Exhausted { attempts: usize },
}

#[derive(Debug, Clone, serde::Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Generated {
    pub board: Board,
    pub order: Vec<usize>,
    pub attempts: usize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Pass {
    Primary,
    Fallback,
}

impl Pass {
    fn attempts(self, budget: &GenerationBudget) -> usize {
        match self {
            Pass::Primary => budget.primary_attempts,
            Pass::Fallback => budget.fallback_attempts,
        }
    }

    fn edge_buffer(self, budget: &GenerationBudget) -> f64 {
        match self {
            Pass::Primary => budget.edge_buffer,
            Pass::Fallback => 0.0,
        }
    }
}

struct PieceSpec {
    direction: Direction,
    len: usize,
    thickness: f64,
    color_seed: u32,
}

fn random_spec(rng: &mut impl Rng, options: &GeneratorOptions) -> PieceSpec {
    PieceSpec {
        direction: Direction::ALL[rng.gen_range(0..Direction::ALL.len())],
        len: rng.gen_range(options.min_len..=options.max_len),
        thickness: (BASE_THICKNESS + rng.gen_range(-3..=6) as f64).clamp(12.0, 24.0),
        color_seed: rng.gen_range(0..10_000),
    }
}

/// Body cells may sit level with the head but never in front of it.
fn behind_head(head: Cell, direction: Direction, cell: Cell) -> bool {
    direction.forward_dot(cell.x - head.x, cell.y - head.y) <= 0
}

/// Random walk from `head` away from `direction`. `None` when the walk runs into a dead end.
fn grow_path(
    rng: &mut impl Rng,
    settings: &BoardSettings,
    head: Cell,
    direction: Direction,
    len: usize,
) -> Option<Vec<Cell>> {
    let (dx, dy) = direction.delta();
    let mut step = (-dx, -dy);
    let mut cur = head.offset(step.0, step.1);
    if !settings.contains(cur) {
        return None;
    }

    let mut cells = vec![head, cur];
    let mut used = cells
        .iter()
        .copied()
        .collect::<std::collections::HashSet<_>>();

    while cells.len() < len {
        // Straight on, turn left, turn right.
        let mut options = [step, (-step.1, step.0), (step.1, -step.0)];
        options.shuffle(rng);

        let (next_step, next) = options
            .iter()
            .map(|&(sx, sy)| ((sx, sy), cur.offset(sx, sy)))
            .find(|(_, c)| {
                settings.contains(*c) && !used.contains(c) && behind_head(head, direction, *c)
            })?;

        used.insert(next);
        cells.push(next);
        cur = next;
        step = next_step;
    }

    Some(cells)
}

/// Heads this close to the edge they face would leave with no effort.
fn too_close_to_exit(
    head: Cell,
    direction: Direction,
    settings: &BoardSettings,
    edge_buffer: f64,
) -> bool {
    let (hx, hy) = cell_center(head, settings);
    match direction {
        Direction::Right => hx > settings.width() - edge_buffer,
        Direction::Left => hx < edge_buffer,
        Direction::Down => hy > settings.height() - edge_buffer,
        Direction::Up => hy < edge_buffer,
    }
}

fn place_piece(
    rng: &mut impl Rng,
    board: &mut Board,
    spec: &PieceSpec,
    budget: &GenerationBudget,
    edge_buffer: f64,
) -> bool {
    let settings = *board.settings();
    let margin = budget.margin_cells.max(0);
    let (max_x, max_y) = (settings.cols - 1 - margin, settings.rows - 1 - margin);
    if max_x < margin || max_y < margin {
        return false;
    }

    for _ in 0..budget.placement_tries {
        let head = Cell::new(rng.gen_range(margin..=max_x), rng.gen_range(margin..=max_y));

        let cells = if let Some(cells) = grow_path(rng, &settings, head, spec.direction, spec.len)
        {
            cells
        } else {
            continue;
        };

        if too_close_to_exit(head, spec.direction, &settings, edge_buffer) {
            continue;
        }

        if cells.iter().any(|c| board.occupant(*c).is_some()) {
            continue;
        }

        if board
            .add(spec.direction, cells, spec.thickness, spec.color_seed)
            .is_ok()
        {
            return true;
        }
    }

    false
}

/// Stream of `attempts` candidate boards, `None` for candidates abandoned during placement.
fn candidates(
    settings: BoardSettings,
    options: GeneratorOptions,
    budget: GenerationBudget,
    edge_buffer: f64,
    attempts: usize,
) -> impl Iterator<Item = Option<Board>> + 'static {
    genawaiter::rc::gen!({
        let mut rng = rand::thread_rng();
        for _ in 0..attempts {
            let mut board = Board::new(settings);
            let complete = (0..options.count).all(|_| {
                let spec = random_spec(&mut rng, &options);
                place_piece(&mut rng, &mut board, &spec, &budget, edge_buffer)
            });

            yield_!(if complete { Some(board) } else { None });
        }
    })
    .into_iter()
}

fn run_pass(
    settings: BoardSettings,
    options: GeneratorOptions,
    budget: GenerationBudget,
    pass: Pass,
) -> Option<(Board, Vec<usize>, usize)> {
    let stream = candidates(
        settings,
        options,
        budget,
        pass.edge_buffer(&budget),
        pass.attempts(&budget),
    );

    for (attempt, candidate) in stream.enumerate() {
        let board = if let Some(board) = candidate {
            board
        } else {
            continue;
        };

        // Cheap check first: something has to be able to move.
        if !board.pieces().iter().any(|p| can_exit(p, &board)) {
            continue;
        }

        match solver::solve_board(&board) {
            Verdict::Solvable(order) => return Some((board, order, attempt + 1)),
            Verdict::Unsolvable | Verdict::Unverifiable => continue,
        }
    }

    None
}

/// `options` are clamped before use.
pub fn generate(
    settings: BoardSettings,
    options: GeneratorOptions,
    budget: GenerationBudget,
) -> Result<Generated, GenerationError> {
    let settings = settings.normalized();
    let options = options.clamped();
    let start_time = instant::Instant::now();

    let mut spent = 0;
    for pass in [Pass::Primary, Pass::Fallback] {
        if let Some((board, order, attempts)) = run_pass(settings, options, budget, pass) {
            spent += attempts;
            log::info!(
                "generated {} pieces (len {}-{}) in {} attempts ({:?} pass), took {:?}",
                options.count,
                options.min_len,
                options.max_len,
                spent,
                pass,
                instant::Instant::now() - start_time,
            );
            return Ok(Generated {
                board,
                order,
                attempts: spent,
            });
        }

        spent += pass.attempts(&budget);
        log::warn!("{:?} pass exhausted after {} attempts", pass, spent);
    }

    Err(GenerationError::Exhausted { attempts: spent })
}

pub fn generate_replacement(
    settings: BoardSettings,
    lengths: impl IntoIterator<Item = usize>,
    budget: GenerationBudget,
) -> Result<Generated, GenerationError> {
    match GeneratorOptions::matching(lengths) {
        Some(options) => generate(settings, options, budget),
        None => Ok(Generated {
            board: Board::new(settings),
            order: vec![],
            attempts: 0,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::board::validate_shape;
    use assert_matches::assert_matches;

    fn assert_accepted(generated: &Generated, options: &GeneratorOptions) {
        let board = &generated.board;
        let settings = board.settings();
        assert_eq!(board.len(), options.count);

        let mut seen = std::collections::HashSet::new();
        for p in board.pieces() {
            assert!(p.len() >= options.min_len && p.len() <= options.max_len);
            assert_eq!(validate_shape(p.cells()), Ok(()));
            for c in p.cells() {
                assert!(settings.contains(*c));
                assert!(seen.insert(*c), "cell {:?} used twice", c);
                assert!(behind_head(p.head(), p.direction(), *c));
            }
        }

        assert!(board.pieces().iter().any(|p| can_exit(p, board)));
        assert_eq!(
            solver::replay(board.pieces(), settings, &generated.order),
            Ok(())
        );
        assert!(solver::solve_board(board).is_solvable());
    }

    #[test]
    fn test_options_clamped() {
        assert_eq!(
            GeneratorOptions {
                count: 999,
                min_len: 20,
                max_len: 2
            }
            .clamped(),
            GeneratorOptions {
                count: 20,
                min_len: 2,
                max_len: 20
            }
        );
        assert_eq!(
            GeneratorOptions {
                count: 0,
                min_len: 0,
                max_len: 0
            }
            .clamped(),
            GeneratorOptions {
                count: 1,
                min_len: 2,
                max_len: 2
            }
        );
        assert_eq!(
            GeneratorOptions {
                count: 5,
                min_len: 25,
                max_len: 40
            }
            .clamped(),
            GeneratorOptions {
                count: 5,
                min_len: 20,
                max_len: 30
            }
        );
    }

    #[test]
    fn test_options_matching() {
        assert_eq!(
            GeneratorOptions::matching([3, 5, 2]),
            Some(GeneratorOptions {
                count: 3,
                min_len: 2,
                max_len: 5
            })
        );
        assert_eq!(
            GeneratorOptions::matching([1, 1]),
            Some(GeneratorOptions {
                count: 2,
                min_len: 2,
                max_len: 2
            })
        );
        assert_eq!(GeneratorOptions::matching(Vec::new()), None);
    }

    #[test]
    fn test_density_warning() {
        let small = BoardSettings {
            cols: 10,
            rows: 10,
            ..Default::default()
        };
        let crowded = GeneratorOptions {
            count: 20,
            min_len: 5,
            max_len: 8,
        };
        assert!(crowded.density_warning(&small).is_some());
        assert!(crowded.density_warning(&BoardSettings::default()).is_none());

        let huge = BoardSettings {
            cols: 70_000,
            rows: 70_000,
            ..Default::default()
        };
        assert!(crowded.density_warning(&huge).is_none());
    }

    #[test]
    fn test_behind_head_allows_perpendicular() {
        let head = Cell::new(5, 5);
        assert!(behind_head(head, Direction::Up, Cell::new(5, 6)));
        assert!(behind_head(head, Direction::Up, Cell::new(6, 5)));
        assert!(!behind_head(head, Direction::Up, Cell::new(6, 4)));
        assert!(behind_head(head, Direction::Right, Cell::new(5, 4)));
        assert!(!behind_head(head, Direction::Right, Cell::new(6, 4)));
    }

    #[test]
    fn test_grow_path_shapes() {
        let settings = BoardSettings::default();
        let mut rng = rand::thread_rng();
        let head = Cell::new(15, 10);
        let mut saw_perpendicular = false;

        for i in 0..300 {
            let direction = Direction::ALL[i % 4];
            let path = if let Some(path) = grow_path(&mut rng, &settings, head, direction, 4) {
                path
            } else {
                continue;
            };

            let (dx, dy) = direction.delta();
            assert_eq!(path.len(), 4);
            assert_eq!(path[0], head);
            assert_eq!(path[1], head.offset(-dx, -dy));
            assert_eq!(validate_shape(&path), Ok(()));
            for c in &path[1..] {
                assert!(behind_head(head, direction, *c));
                if direction.forward_dot(c.x - head.x, c.y - head.y) == 0 {
                    saw_perpendicular = true;
                }
            }
        }

        assert!(saw_perpendicular);
    }

    #[test]
    fn test_grow_path_needs_room_behind_head() {
        let settings = BoardSettings::default();
        let mut rng = rand::thread_rng();
        assert_eq!(
            grow_path(&mut rng, &settings, Cell::new(0, 5), Direction::Right, 3),
            None
        );
    }

    #[test]
    fn test_too_close_to_exit() {
        let settings = BoardSettings::default();
        // Centers at 855 and 825 px on a 900 px wide board.
        assert!(too_close_to_exit(
            Cell::new(28, 5),
            Direction::Right,
            &settings,
            60.0
        ));
        assert!(!too_close_to_exit(
            Cell::new(27, 5),
            Direction::Right,
            &settings,
            60.0
        ));
        assert!(!too_close_to_exit(
            Cell::new(28, 5),
            Direction::Left,
            &settings,
            60.0
        ));
        assert!(too_close_to_exit(Cell::new(5, 1), Direction::Up, &settings, 60.0));
        assert!(!too_close_to_exit(Cell::new(5, 1), Direction::Up, &settings, 0.0));
    }

    #[test]
    fn test_generate_three_short_pieces() {
        let options = GeneratorOptions {
            count: 3,
            min_len: 2,
            max_len: 2,
        };
        let generated = generate(
            BoardSettings::default(),
            options,
            GenerationBudget::default(),
        )
        .unwrap();

        assert_accepted(&generated, &options);
        assert!(generated.board.pieces().iter().all(|p| p.len() == 2));
    }

    #[test]
    fn test_generated_boards_are_certified() {
        let options = GeneratorOptions {
            count: 8,
            min_len: 2,
            max_len: 7,
        };
        for _ in 0..5 {
            let generated = generate(
                BoardSettings::default(),
                options,
                GenerationBudget::default(),
            )
            .unwrap();
            assert_accepted(&generated, &options);
        }
    }

    #[test]
    fn test_generate_exhausted() {
        let tiny = BoardSettings {
            cols: 3,
            rows: 3,
            ..Default::default()
        };
        let budget = GenerationBudget {
            primary_attempts: 5,
            fallback_attempts: 7,
            placement_tries: 4,
            ..Default::default()
        };
        let options = GeneratorOptions {
            count: 6,
            min_len: 2,
            max_len: 2,
        };

        assert_eq!(
            generate(tiny, options, budget).unwrap_err(),
            GenerationError::Exhausted { attempts: 12 }
        );
    }

    #[test]
    fn test_generate_replacement() {
        let generated = generate_replacement(
            BoardSettings::default(),
            [3, 4, 3, 5],
            GenerationBudget::default(),
        )
        .unwrap();
        assert_accepted(
            &generated,
            &GeneratorOptions {
                count: 4,
                min_len: 3,
                max_len: 5,
            },
        );

        let empty = generate_replacement(
            BoardSettings::default(),
            Vec::new(),
            GenerationBudget::default(),
        );
        assert_matches!(empty, Ok(Generated { ref board, .. }) if board.is_empty());
    }
}
