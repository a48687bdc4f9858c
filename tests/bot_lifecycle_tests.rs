// Integration tests for the bot's game lifecycle
//
// Covers the start/move/end contract, the forced move when the snake is
// completely trapped, table dumps at game end, the JSONL turn log, and the
// HTTP surface served through Rocket's local client.

use rocket::http::{ContentType, Status};
use rocket::local::asynchronous::Client;
use serde_json::Value;
use std::path::Path;

use dyna_snake::bot::Bot;
use dyna_snake::config::Config;
use dyna_snake::debug_logger::DebugLogger;
use dyna_snake::handler;
use dyna_snake::encoder::STATE_SPACE;
use dyna_snake::learning::{QTable, Storage};
use dyna_snake::replay::ReplayEngine;
use dyna_snake::types::{Battlesnake, Board, Coord, Game, GameState};

fn test_config() -> Config {
    let mut config = Config::default_hardcoded();
    config.learner.q_table_path = None;
    config.learner.seed = Some(11);
    config
}

fn game(id: &str) -> Game {
    Game {
        id: id.to_string(),
        timeout: 500,
        ..Game::default()
    }
}

fn snake(id: &str, health: i32, body: &[(i32, i32)]) -> Battlesnake {
    let body: Vec<Coord> = body.iter().map(|&(x, y)| Coord { x, y }).collect();
    Battlesnake {
        id: id.to_string(),
        name: id.to_string(),
        health,
        head: body[0],
        length: body.len() as i32,
        body,
        ..Battlesnake::default()
    }
}

fn board(snakes: Vec<Battlesnake>, food: &[(i32, i32)]) -> Board {
    Board {
        height: 11,
        width: 11,
        food: food.iter().map(|&(x, y)| Coord { x, y }).collect(),
        snakes,
        hazards: vec![],
    }
}

/// Snake at the top wall (y=10) boxed in by its own body and an opponent head
fn trapped_board(our_health: i32) -> Board {
    board(
        vec![
            snake("our-snake", our_health, &[(5, 10), (5, 9), (4, 9), (4, 10)]),
            snake("opponent", 50, &[(6, 10), (6, 9), (6, 8)]),
        ],
        &[],
    )
}

/// Open board with our snake heading up the middle
fn open_board(our_health: i32) -> Board {
    board(
        vec![
            snake("our-snake", our_health, &[(5, 5), (5, 4), (5, 3), (5, 2)]),
            snake("opponent", 90, &[(0, 0), (1, 0)]),
        ],
        &[(9, 9)],
    )
}

/// Test: every move blocked (tail at full health stays put) => forced "up"
#[tokio::test]
async fn test_trapped_snake_returns_forced_up() {
    let bot = Bot::new(test_config());
    let board = trapped_board(100);
    let you = board.snakes[0].clone();

    let response = bot.get_move(&game("trapped"), &0, &board, &you).await;
    assert_eq!(response["move"].as_str(), Some("up"));

    let decision = bot.decide("trapped", &board, &you);
    assert_eq!(decision.strategy, "BLOCKED");
}

/// Test: below full health our own tail vacates, so the only open move is left
#[tokio::test]
async fn test_trapped_snake_escapes_through_vacating_tail() {
    let bot = Bot::new(test_config());
    let board = trapped_board(50);
    let you = board.snakes[0].clone();

    let response = bot.get_move(&game("tail"), &0, &board, &you).await;
    assert_eq!(response["move"].as_str(), Some("left"));
}

#[tokio::test]
async fn test_sessions_follow_start_and_end() {
    let bot = Bot::new(test_config());
    let g = game("lifecycle");

    let b = open_board(90);
    let you = b.snakes[0].clone();
    bot.start(&g, &0, &b, &you);
    assert_eq!(bot.learned().sessions().len(), 1);

    for turn in 1..4 {
        let b = open_board(90 - turn);
        let you = b.snakes[0].clone();
        let response = bot.get_move(&g, &turn, &b, &you).await;
        assert!(response["move"].is_string());
    }
    assert_eq!(bot.learned().sessions().len(), 1);

    let b = open_board(86);
    let you = b.snakes[0].clone();
    bot.end(&g, &4, &b, &you).await;
    assert!(bot.learned().sessions().is_empty());
}

#[tokio::test]
async fn test_concurrent_games_keep_separate_sessions() {
    let bot = Bot::new(test_config());
    let b = open_board(90);
    let you = b.snakes[0].clone();

    bot.start(&game("a"), &0, &b, &you);
    bot.start(&game("b"), &0, &b, &you);
    assert_eq!(bot.learned().sessions().len(), 2);

    bot.end(&game("a"), &1, &b, &you).await;
    assert_eq!(bot.learned().sessions().len(), 1);
    assert!(bot.learned().sessions().get("b").is_some());
}

#[tokio::test]
async fn test_dump_at_end_writes_q_table() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("qtable.json");

    let mut config = test_config();
    config.learner.q_table_path = Some(path.to_string_lossy().into_owned());
    config.runtime.dump_at_end = true;
    let bot = Bot::new(config);
    let g = game("dump");

    // We outgrow the opponent, so food is ignored and the learned policy decides
    let b = open_board(90);
    let you = b.snakes[0].clone();
    bot.start(&g, &0, &b, &you);
    for turn in 1..5 {
        let b = open_board(90 - turn);
        let you = b.snakes[0].clone();
        bot.get_move(&g, &turn, &b, &you).await;
    }

    // Final snapshot without our snake: eliminated
    let mut b = open_board(85);
    let you = b.snakes.remove(0);
    bot.end(&g, &5, &b, &you).await;

    assert!(path.exists());
    let mut table = QTable::sparse(0.0);
    table.load(&path).unwrap();
    assert!(!table.is_empty());
    let died = table
        .states()
        .into_iter()
        .any(|s| table.values(s).iter().any(|&v| v <= -1000.0));
    assert!(died, "death reward should be learned");
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn test_dense_dump_at_end_leaves_other_games_moving() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("dense.json");

    let mut config = test_config();
    config.learner.q_table_path = Some(path.to_string_lossy().into_owned());
    config.learner.storage = Storage::Dense;
    config.runtime.dump_at_end = true;
    let bot = Bot::new(config);

    let b = open_board(90);
    let you = b.snakes[0].clone();
    bot.start(&game("ending"), &0, &b, &you);
    bot.start(&game("playing"), &0, &b, &you);
    bot.get_move(&game("ending"), &1, &b, &you).await;

    let ending_game = game("ending");
    let playing_game = game("playing");
    let (_, response) = tokio::join!(
        bot.end(&ending_game, &2, &b, &you),
        bot.get_move(&playing_game, &1, &b, &you)
    );
    assert!(response["move"].is_string());

    let mut table = QTable::new(Storage::Dense, STATE_SPACE as usize, 0.0);
    table.load(&path).unwrap();
    assert!(!table.is_empty());
    assert_eq!(bot.learned().sessions().len(), 1);
}

#[tokio::test]
async fn test_turn_log_can_be_replayed() {
    let dir = tempfile::tempdir().unwrap();
    let log_path = dir.path().join("turns.jsonl");
    let logger = DebugLogger::new(true, log_path.to_str().unwrap()).await;
    assert!(logger.is_enabled());

    let bot = Bot::new(test_config()).with_logger(logger);
    // Food to the right and an equally long opponent: the food strategy decides
    let b = board(
        vec![
            snake("our-snake", 80, &[(5, 5), (4, 5)]),
            snake("opponent", 80, &[(0, 0), (0, 1)]),
        ],
        &[(8, 5)],
    );
    let you = b.snakes[0].clone();
    let response = bot.get_move(&game("logged"), &7, &b, &you).await;
    assert_eq!(response["move"].as_str(), Some("right"));

    // The write is fire-and-forget
    tokio::time::sleep(std::time::Duration::from_millis(200)).await;

    let engine = ReplayEngine::new(test_config(), false);
    let entries = engine.load_log_file(&log_path).unwrap();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].turn, 7);
    assert_eq!(entries[0].strategy, "FOOD");
    assert_eq!(entries[0].you_id, "our-snake");

    let results = engine.replay_all(&entries);
    assert!(results[0].matches);
}

#[tokio::test]
async fn test_http_endpoints() {
    let client = Client::tracked(handler::mount(Bot::new(test_config())))
        .await
        .expect("valid rocket instance");

    let response = client.get("/").dispatch().await;
    assert_eq!(response.status(), Status::Ok);
    let info: Value = response.into_json().await.unwrap();
    assert_eq!(info["apiversion"], "1");

    let b = trapped_board(100);
    let state = GameState {
        game: game("http"),
        turn: 3,
        you: b.snakes[0].clone(),
        board: b,
    };
    let body = serde_json::to_string(&state).unwrap();

    let response = client
        .post("/start")
        .header(ContentType::JSON)
        .body(body.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);

    let response = client
        .post("/move")
        .header(ContentType::JSON)
        .body(body.clone())
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
    let chosen: Value = response.into_json().await.unwrap();
    assert_eq!(chosen["move"], "up");

    let response = client
        .post("/end")
        .header(ContentType::JSON)
        .body(body)
        .dispatch()
        .await;
    assert_eq!(response.status(), Status::Ok);
}

#[test]
fn test_missing_q_table_file_is_not_fatal() {
    let mut config = test_config();
    config.learner.q_table_path = Some("does/not/exist/qtable.json".to_string());
    assert!(!Path::new("does/not/exist/qtable.json").exists());
    let bot = Bot::new(config);
    assert_eq!(bot.learned().learner().known_states(), 0);
}
