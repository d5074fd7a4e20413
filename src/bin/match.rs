// Ficheiro: src/bin/match.rs
// Descrição: Corre encontros entre dois jogadores sobre todas as posições
// iniciais com N pedras, em threads paralelas. Cada thread joga partidas
// completas com instâncias próprias dos jogadores; o único estado partilhado
// é o agregador de resultados, protegido por um Mutex e tocado apenas entre
// partidas, nunca dentro da pesquisa.

use std::sync::Mutex;
use std::time::{Duration, Instant};
use virada::players::{PlayerFirst, PlayerGreedy, PlayerRandom};
use virada::referee::generate_starting_positions;
use virada::*;

const DEFAULT_TIME_LIMIT: Duration = Duration::from_secs(1);

#[derive(Clone, Copy)]
enum PlayerSpec {
    AlphaBeta,
    Random,
    First(i32),
    Greedy(i32),
}

impl PlayerSpec {
    fn parse(arg: &str) -> Option<PlayerSpec> {
        match arg {
            "ab" => return Some(PlayerSpec::AlphaBeta),
            "random" => return Some(PlayerSpec::Random),
            _ => {}
        }
        if let Some(symmetry) = arg.strip_prefix("first") {
            if let Ok(symmetry @ 0..=7) = symmetry.parse() {
                return Some(PlayerSpec::First(symmetry));
            }
        }
        if let Some(symmetry) = arg.strip_prefix("greedy") {
            if let Ok(symmetry @ 0..=7) = symmetry.parse() {
                return Some(PlayerSpec::Greedy(symmetry));
            }
        }
        None
    }

    fn create(&self) -> Box<dyn Player> {
        match *self {
            PlayerSpec::AlphaBeta => Box::new(AlphaBetaEngine::new()),
            PlayerSpec::Random => Box::new(PlayerRandom::new()),
            PlayerSpec::First(symmetry) => Box::new(PlayerFirst::new(symmetry)),
            PlayerSpec::Greedy(symmetry) => Box::new(PlayerGreedy::new(symmetry)),
        }
    }
}

struct MatchConfig {
    players: [PlayerSpec; 2],
    initial_stones: i32,
    num_threads: usize,
    both_sides: bool,
    time_limit: [Duration; 2],
}

#[derive(Default)]
struct MatchData {
    next_starting_position: usize,
    // Do ponto de vista do jogador 0.
    total_score: i64,
    total_square_score: i64,
    total_white: i64,
    total_square_white: i64,
    max_time: [Duration; 2],
}

fn fail(message: String) -> ! {
    eprintln!("{}", message);
    eprintln!(
        "uso: virada_match <jogador> <jogador> [-stones n] [-threads n] [-time a[:b]] [-noswap]"
    );
    eprintln!("jogadores: ab | random | first0..first7 | greedy0..greedy7");
    std::process::exit(1);
}

fn parse_args() -> MatchConfig {
    let args: Vec<String> = std::env::args().skip(1).collect();

    let mut players: Vec<PlayerSpec> = Vec::new();
    let mut initial_stones = 4;
    let mut num_threads = 1;
    let mut both_sides = true;
    let mut time_limit = [DEFAULT_TIME_LIMIT; 2];

    let mut next = 0;
    while next < args.len() {
        let arg = &args[next];
        next += 1;

        if let Some(spec) = PlayerSpec::parse(arg) {
            players.push(spec);
            continue;
        }
        match arg.as_str() {
            "-stones" | "-threads" | "-time" => {
                if next >= args.len() {
                    fail(format!("{} precisa de um valor", arg));
                }
                let value = &args[next];
                next += 1;
                match arg.as_str() {
                    "-stones" => match value.parse() {
                        Ok(n @ 4..=64) => initial_stones = n,
                        _ => fail(format!("-stones inválido: {}", value)),
                    },
                    "-threads" => match value.parse::<usize>() {
                        Ok(0) => num_threads = num_cpus::get(),
                        Ok(n) => num_threads = n,
                        _ => fail(format!("-threads inválido: {}", value)),
                    },
                    _ => {
                        let mut parts = value.splitn(2, ':');
                        let first = parts.next().unwrap_or_default();
                        let second = parts.next().unwrap_or(first);
                        match (first.parse::<u64>(), second.parse::<u64>()) {
                            (Ok(a), Ok(b)) => {
                                time_limit =
                                    [Duration::from_millis(a), Duration::from_millis(b)];
                            }
                            _ => fail(format!("-time inválido: {}", value)),
                        }
                    }
                }
            }
            "-noswap" => both_sides = false,
            _ => fail(format!("Argumento inválido: {}", arg)),
        }
    }

    if players.len() != 2 {
        fail(format!("são precisos 2 jogadores, recebi {}", players.len()));
    }

    MatchConfig {
        players: [players[0], players[1]],
        initial_stones,
        num_threads,
        both_sides,
        time_limit,
    }
}

fn run_thread(config: &MatchConfig, starting_positions: &[Position], data: &Mutex<MatchData>) {
    loop {
        let starting = {
            let mut data = data.lock().unwrap();
            let game_number = data.next_starting_position;
            if game_number >= starting_positions.len() {
                break;
            }
            data.next_starting_position += 1;
            println!("Jogo {}/{}", game_number, starting_positions.len());
            starting_positions[game_number]
        };

        let attempts = if config.both_sides { 2 } else { 1 };
        let mut score: i64 = 0;
        let mut white: i64 = 0;

        for attempt in 0..attempts {
            let mut players = [config.players[0].create(), config.players[1].create()];

            let mut position = starting;
            let mut time_used = [Duration::ZERO; 2];
            while !position.finished() {
                let to_move = position.to_move() as usize;
                let who = to_move ^ attempt;
                let started_thinking = Instant::now();
                let settings = PlaySettings::new(
                    started_thinking,
                    config.time_limit[who].saturating_sub(time_used[who]),
                );
                let mv = players[who].choose_move(&position, &settings);
                time_used[who] += started_thinking.elapsed();
                players[who ^ 1].opponent_move(&position, mv);
                assert!(get_bit(position.valid_moves(), mv));
                position = position.make_move(mv).0;
            }

            let score_white = position.final_score() as i64;
            if attempt == 0 {
                score += score_white;
            } else {
                score -= score_white;
            }
            white += score_white;

            let mut data = data.lock().unwrap();
            for i in 0..2 {
                data.max_time[i] = data.max_time[i].max(time_used[i]);
            }
        }

        let mut data = data.lock().unwrap();
        data.total_score += score;
        data.total_square_score += score * score;
        data.total_white += white;
        data.total_square_white += white * white;
    }
}

fn main() {
    env_logger::init();

    let config = parse_args();
    let starting_positions = generate_starting_positions(config.initial_stones);
    let data = Mutex::new(MatchData::default());

    crossbeam::thread::scope(|scope| {
        for _ in 0..config.num_threads {
            scope.spawn(|_| run_thread(&config, &starting_positions, &data));
        }
    })
    .unwrap();

    let data = data.into_inner().unwrap();
    let n = starting_positions.len() as f64;

    let mean_score = data.total_score as f64 / n;
    let var_score =
        (data.total_square_score as f64 - mean_score * data.total_score as f64) / (n - 1.0) / n;
    println!("Score: {:.6} +- {:.6}", 0.5 * mean_score, 0.5 * var_score.sqrt());

    let mean_white = data.total_white as f64 / n;
    let var_white =
        (data.total_square_white as f64 - mean_white * data.total_white as f64) / (n - 1.0) / n;
    println!("White: {:.6} +- {:.6}", 0.5 * mean_white, 0.5 * var_white.sqrt());

    println!(
        "Tempo: {:.3} {:.3}",
        data.max_time[0].as_secs_f64(),
        data.max_time[1].as_secs_f64()
    );
}
