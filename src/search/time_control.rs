// Ficheiro: src/search/time_control.rs
// Descrição: Converte o orçamento de tempo do jogo em três prazos aninhados.

use crate::core::*;
use crate::players::PlaySettings;
use std::time::Instant;

/// Prazos usados à medida que a pesquisa desce:
/// - `go_deeper`: não começar mais iterações de aprofundamento;
/// - `next_move`: não começar a pesquisa do próximo lance de raiz;
/// - `drop_work`: abortar o trabalho em curso dentro da recursão.
#[derive(Clone, Copy, Debug)]
pub struct Deadlines {
    pub go_deeper: Instant,
    pub next_move: Instant,
    pub drop_work: Instant,
}

// Curva de alocação por jogada, em partes do orçamento restante.
const ALLOCATION_MOVE0: i64 = 1000;
const ALLOCATION_MOVE50: i64 = 4000;
const ENDGAME_SOLVE_ALLOCATION: i64 = 4000;
const AFTER_SOLVED_ALLOCATION: i64 = 1000;

// Nós por segundo esperados no solver exato e fator de ramificação grosseiro,
// usados na previsão "dá para resolver o fim de jogo dentro do orçamento?".
const EXPECTED_EPS: f64 = 8e8;
const ROUGH_ENDGAME_BRANCHING_FACTOR: f64 = 4.0;

const DEADLINE_GO_DEEPER_PERCENTAGE: u32 = 50;
const DEADLINE_NEXT_MOVE_PERCENTAGE: u32 = 75;
const DEADLINE_DROP_WORK_PERCENTAGE: u32 = 100;

pub fn rough_time_to_solve(depth: i32) -> f64 {
    ROUGH_ENDGAME_BRANCHING_FACTOR.powi(depth) / EXPECTED_EPS
}

pub fn allocate_resources(position: &Position, settings: &PlaySettings) -> Deadlines {
    if settings.use_all_resources {
        let all = settings.start_time + settings.time_left;
        return Deadlines {
            go_deeper: all,
            next_move: all,
            drop_work: all,
        };
    }

    let move_number = position.move_number() as i64;
    let time_left = settings.time_left.as_secs_f64();

    let mut this_move_allocation =
        ALLOCATION_MOVE0 + (ALLOCATION_MOVE50 - ALLOCATION_MOVE0) * move_number / 50;
    let mut total_allocation: i64 = 0;
    let mut i = move_number;
    while i < NUM_SQUARES as i64 {
        // Será que conseguimos resolver o fim de jogo exato na jogada i?
        let solve_share = time_left * ENDGAME_SOLVE_ALLOCATION as f64
            / (total_allocation + ENDGAME_SOLVE_ALLOCATION + AFTER_SOLVED_ALLOCATION) as f64;
        if solve_share > rough_time_to_solve((NUM_SQUARES as i64 - i) as i32) {
            total_allocation += ENDGAME_SOLVE_ALLOCATION + AFTER_SOLVED_ALLOCATION;
            if i == move_number {
                this_move_allocation = ENDGAME_SOLVE_ALLOCATION;
            }
            break;
        }
        total_allocation += ALLOCATION_MOVE0 + (ALLOCATION_MOVE50 - ALLOCATION_MOVE0) * i / 50;
        i += 2;
    }

    let duration_goal = settings.time_left * this_move_allocation as u32 / total_allocation as u32;
    Deadlines {
        go_deeper: settings.start_time + duration_goal * DEADLINE_GO_DEEPER_PERCENTAGE / 100,
        next_move: settings.start_time + duration_goal * DEADLINE_NEXT_MOVE_PERCENTAGE / 100,
        drop_work: settings.start_time + duration_goal * DEADLINE_DROP_WORK_PERCENTAGE / 100,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_use_all_resources() {
        let start = Instant::now();
        let mut settings = PlaySettings::new(start, Duration::from_millis(1234));
        settings.use_all_resources = true;
        let deadlines = allocate_resources(&Position::initial(), &settings);
        assert_eq!(deadlines.go_deeper, start + Duration::from_millis(1234));
        assert_eq!(deadlines.next_move, start + Duration::from_millis(1234));
        assert_eq!(deadlines.drop_work, start + Duration::from_millis(1234));
    }

    #[test]
    fn test_deadlines_are_nested() {
        let start = Instant::now();
        let settings = PlaySettings::new(start, Duration::from_secs(5));
        let deadlines = allocate_resources(&Position::initial(), &settings);
        assert!(deadlines.go_deeper > start);
        assert!(deadlines.go_deeper < deadlines.next_move);
        assert!(deadlines.next_move < deadlines.drop_work);
        assert!(deadlines.drop_work <= start + Duration::from_secs(5));
    }

    #[test]
    fn test_endgame_gets_bigger_share() {
        // Perto do fim com orçamento folgado, a previsão redireciona a
        // alocação para garantir a resolução exata: a fatia desta jogada
        // cresce em relação à curva normal.
        let start = Instant::now();
        let settings = PlaySettings::new(start, Duration::from_secs(2));

        let mut near_end = Position::initial();
        while near_end.move_number() < 54 {
            let mv = first_square(near_end.valid_moves());
            near_end = near_end.make_move(mv).0;
        }
        assert!(!near_end.finished());

        let endgame_deadlines = allocate_resources(&near_end, &settings);
        let opening_deadlines = allocate_resources(&Position::initial(), &settings);
        let endgame_goal = endgame_deadlines.drop_work - start;
        let opening_goal = opening_deadlines.drop_work - start;
        assert!(endgame_goal > opening_goal);
    }

    #[test]
    fn test_rough_time_to_solve_grows() {
        assert!(rough_time_to_solve(10) < rough_time_to_solve(20));
        assert!(rough_time_to_solve(4) < 1e-5);
    }
}
