pub mod board;
pub mod generator;
pub mod geometry;
pub mod level;
pub mod session;
pub mod solver;

use wasm_bindgen::prelude::*;

#[wasm_bindgen(start)]
pub fn main_js() {
    console_error_panic_hook::set_once();
    wasm_log::init(wasm_log::Config::default());
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    JsValue::from_str(&err.to_string())
}

#[wasm_bindgen]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateArgs {
    #[serde(default)]
    board_settings: board::BoardSettings,
    #[serde(default)]
    options: generator::GeneratorOptions,
    #[serde(default)]
    budget: generator::GenerationBudget,
}

#[wasm_bindgen]
impl GenerateArgs {
    #[wasm_bindgen(js_name = fromJs)]
    pub fn from_js(v: JsValue) -> Result<GenerateArgs, serde_wasm_bindgen::Error> {
        serde_wasm_bindgen::from_value(v)
    }
}

#[derive(serde::Serialize)]
#[serde(rename_all = "camelCase")]
struct GeneratedBoard {
    generated: generator::Generated,
    snakes: Vec<level::SnakeSpec>,
    options: generator::GeneratorOptions,
    warning: Option<String>,
}

#[wasm_bindgen(js_name = generateBoard)]
pub fn generate_board(args: GenerateArgs) -> Result<JsValue, JsValue> {
    let options = args.options.clamped();
    let warning = options.density_warning(&args.board_settings);
    if let Some(warning) = &warning {
        log::warn!("{}", warning);
    }

    let generated =
        generator::generate(args.board_settings, options, args.budget).map_err(to_js_error)?;
    let snakes = generated.board.to_specs();

    Ok(serde_wasm_bindgen::to_value(&GeneratedBoard {
        generated,
        snakes,
        options,
        warning,
    })?)
}

#[wasm_bindgen]
#[derive(serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LevelArgs {
    #[serde(default)]
    board_settings: board::BoardSettings,
    level: level::LevelSpec,
    #[serde(default)]
    budget: generator::GenerationBudget,
}

#[wasm_bindgen]
impl LevelArgs {
    #[wasm_bindgen(js_name = fromJs)]
    pub fn from_js(v: JsValue) -> Result<LevelArgs, serde_wasm_bindgen::Error> {
        serde_wasm_bindgen::from_value(v)
    }
}

/// Solves a level as given, without regenerating it.
#[wasm_bindgen(js_name = solveLevel)]
pub fn solve_level(args: &LevelArgs) -> Result<JsValue, JsValue> {
    let board =
        board::Board::from_specs(args.board_settings, &args.level.snakes).map_err(to_js_error)?;
    Ok(serde_wasm_bindgen::to_value(&solver::solve_board(&board))?)
}

#[wasm_bindgen(js_name = loadLevel)]
pub fn load_level(args: &LevelArgs) -> Result<JsValue, JsValue> {
    let loaded = level::load_level(args.board_settings, &args.level, args.budget);
    Ok(serde_wasm_bindgen::to_value(&loaded)?)
}

/// Whether snake `index` of the level could leave with every other snake still in place.
#[wasm_bindgen(js_name = canExit)]
pub fn can_exit(args: &LevelArgs, index: usize) -> Result<bool, JsValue> {
    let board =
        board::Board::from_specs(args.board_settings, &args.level.snakes).map_err(to_js_error)?;
    let piece = board
        .pieces()
        .get(index)
        .ok_or_else(|| JsValue::from_str(&format!("no snake at index {}", index)))?;
    Ok(geometry::can_exit(piece, &board))
}

/// A board being played: removals are only accepted when the snake's head lane is clear.
#[wasm_bindgen]
pub struct Game(session::Session);

#[wasm_bindgen]
impl Game {
    #[wasm_bindgen(js_name = fromLevel)]
    pub fn from_level(args: &LevelArgs) -> Game {
        let loaded = level::load_level(args.board_settings, &args.level, args.budget);
        Game(session::Session::new(loaded.board))
    }

    pub fn generate(args: GenerateArgs) -> Result<Game, JsValue> {
        let generated = generator::generate(args.board_settings, args.options, args.budget)
            .map_err(to_js_error)?;
        Ok(Game(session::Session::new(generated.board)))
    }

    /// Removes the snake with the given id, failing if it is blocked or already gone.
    pub fn remove(&mut self, id: u32) -> Result<(), JsValue> {
        self.0.remove(board::PieceId(id)).map_err(to_js_error)?;
        Ok(())
    }

    pub fn undo(&mut self) -> bool {
        self.0.undo()
    }

    #[wasm_bindgen(getter)]
    pub fn moves(&self) -> u32 {
        self.0.moves()
    }

    #[wasm_bindgen(getter)]
    pub fn remaining(&self) -> usize {
        self.0.board().len()
    }

    #[wasm_bindgen(js_name = isCleared)]
    pub fn is_cleared(&self) -> bool {
        self.0.is_cleared()
    }

    #[wasm_bindgen(js_name = isStuck)]
    pub fn is_stuck(&self) -> bool {
        self.0.is_stuck()
    }

    #[wasm_bindgen(js_name = exitStates)]
    pub fn exit_states(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.0.exit_states())?)
    }

    #[wasm_bindgen(js_name = boardToJs)]
    pub fn board_to_js(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(self.0.board())?)
    }

    /// The remaining snakes in level form, for saving the board elsewhere.
    #[wasm_bindgen(js_name = exportBoard)]
    pub fn export_board(&self) -> Result<JsValue, JsValue> {
        Ok(serde_wasm_bindgen::to_value(&self.0.board().to_specs())?)
    }
}
