// Ficheiro: src/main.rs
// Descrição: Driver do protocolo de partida em stdin/stdout. Aceita linhas
// de configuração ("Time <ms>", "Position <64 chars>"), depois o diálogo de
// jogo: lance do adversário, "Start" ou "Quit"; responde com o nosso lance.

use log::{info, warn};
use std::io::{self, BufRead, Write};
use std::time::{Duration, Instant};
use virada::*;

const DEFAULT_GAME_TIME: Duration = Duration::from_millis(4850);

fn main() {
    env_logger::init();

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();

    let mut next_line = || -> Option<String> {
        match lines.next() {
            Some(Ok(line)) => Some(line),
            _ => None,
        }
    };

    let mut input = match next_line() {
        Some(line) => line,
        None => return,
    };
    let mut start_time = Instant::now();
    let mut time_left = DEFAULT_GAME_TIME;
    let mut position = Position::initial();

    // Linhas de configuração antes do jogo começar.
    loop {
        if let Some(ms) = input.strip_prefix("Time ") {
            match ms.trim().parse::<u64>() {
                Ok(ms) => time_left = Duration::from_millis(ms),
                Err(_) => warn!("Tempo inválido: {}", ms),
            }
        } else if let Some(diagram) = input.strip_prefix("Position ") {
            match Position::from_diagram(diagram) {
                Ok(p) => position = p,
                Err(e) => warn!("Posição inválida: {}", e),
            }
        } else {
            break;
        }

        input = match next_line() {
            Some(line) => line,
            None => return,
        };
        start_time = Instant::now();
    }

    let mut player = AlphaBetaEngine::new();

    {
        let now = Instant::now();
        info!("Tempo de arranque {:.3}", (now - start_time).as_secs_f64());
        time_left = time_left.saturating_sub(now - start_time);
        start_time = now;
    }

    loop {
        let opponent_move = string_to_move(&input);

        let mut play = true;
        if opponent_move != INVALID_MOVE {
            if get_bit(position.valid_moves(), opponent_move) {
                player.opponent_move(&position, opponent_move);
                position = position.make_move(opponent_move).0;
            } else {
                warn!("Lance inválido: {}", input);
                play = false;
            }
        } else if input == "Start" {
            // O adversário ainda não jogou: somos nós a abrir.
        } else if input == "Quit" {
            return;
        } else {
            warn!("Entrada inválida: {}", input);
            play = false;
        }

        if play {
            if position.finished() {
                warn!("Jogo já terminado");
            } else {
                let settings = PlaySettings::new(start_time, time_left);
                let my_move = player.choose_move(&position, &settings);
                position = position.make_move(my_move).0;
                time_left = time_left.saturating_sub(start_time.elapsed());
                info!("Tempo restante {:.3}", time_left.as_secs_f64());
                println!("{}", move_to_string(my_move));
                let _ = io::stdout().flush();
            }
        }

        input = match next_line() {
            Some(line) => line,
            None => return,
        };
        start_time = Instant::now();
    }
}
