// Geração de posições iniciais para partidas: todas as posições alcançáveis
// com um dado número de pedras, sem duplicados a menos de simetria.

use crate::core::*;
use crate::search::hash_table::PositionHashTable;
use log::info;

fn generate_starting_positions_rec(
    position: &Position,
    move_number: i32,
    starting_positions: &mut Vec<Position>,
    seen: &mut PositionHashTable<bool>,
) {
    let (normalized_position, _) = position.normalize();
    let (_, inserted) = seen.insert_with(&normalized_position, || true);
    assert!(!seen.out_of_memory());
    if !inserted {
        return;
    }

    if position.move_number() == move_number {
        starting_positions.push(*position);
    } else {
        let mut valid_moves = position.valid_moves();
        while valid_moves != 0 {
            let mv = first_square(valid_moves);
            valid_moves = reset_bit(valid_moves, mv);
            let (next_position, _) = position.make_move(mv);
            generate_starting_positions_rec(&next_position, move_number, starting_positions, seen);
        }
    }
}

pub fn generate_starting_positions(move_number: i32) -> Vec<Position> {
    let mut seen: PositionHashTable<bool> = PositionHashTable::new(1 << 22);
    let mut starting_positions = Vec::new();
    generate_starting_positions_rec(
        &Position::initial(),
        move_number,
        &mut starting_positions,
        &mut seen,
    );
    info!("Posições iniciais: {}", starting_positions.len());

    starting_positions
}
