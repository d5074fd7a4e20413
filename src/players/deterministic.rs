// Jogadores determinísticos parametrizados por simetria. São os adversários
// contra os quais a tabela de jogos preparados foi gravada.

use crate::core::*;
use crate::players::{Player, PlaySettings};

/// Joga sempre o primeiro lance válido na orientação `symmetry`.
pub struct PlayerFirst {
    symmetry: i32,
}

impl PlayerFirst {
    pub fn new(symmetry: i32) -> PlayerFirst {
        PlayerFirst { symmetry }
    }
}

impl Player for PlayerFirst {
    fn choose_move(&mut self, position: &Position, _settings: &PlaySettings) -> Move {
        let transformed_moves = transform_bitboard(position.valid_moves(), self.symmetry);
        untransform_square(first_square(transformed_moves), self.symmetry)
    }
}

/// Joga o lance que maximiza as suas pedras, desempatado pela orientação.
pub struct PlayerGreedy {
    symmetry: i32,
}

impl PlayerGreedy {
    pub fn new(symmetry: i32) -> PlayerGreedy {
        PlayerGreedy { symmetry }
    }
}

impl Player for PlayerGreedy {
    fn choose_move(&mut self, position: &Position, _settings: &PlaySettings) -> Move {
        let mut remaining_transformed_moves =
            transform_bitboard(position.valid_moves(), self.symmetry);

        let mut best_move = INVALID_MOVE;
        let mut best_score = -1;

        while remaining_transformed_moves != 0 {
            let transformed_move = first_square(remaining_transformed_moves);
            remaining_transformed_moves = reset_bit(remaining_transformed_moves, transformed_move);
            let mv = untransform_square(transformed_move, self.symmetry);

            // Depois do lance o lado a jogar troca: as nossas pedras são as
            // do adversário da nova posição.
            let (next_position, _) = position.make_move(mv);
            let score = count_squares(next_position.opponent);
            if score > best_score {
                best_score = score;
                best_move = mv;
            }
        }

        best_move
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn settings() -> PlaySettings {
        PlaySettings::new(Instant::now(), Duration::from_millis(10))
    }

    #[test]
    fn test_first_player_takes_lowest_square() {
        let mut player = PlayerFirst::new(0);
        let mv = player.choose_move(&Position::initial(), &settings());
        assert_eq!(mv, 18);
    }

    #[test]
    fn test_first_player_symmetries_disagree() {
        let position = Position::initial();
        let mut chosen = std::collections::BTreeSet::new();
        for symmetry in 0..NUM_SYMMETRIES {
            let mv = PlayerFirst::new(symmetry).choose_move(&position, &settings());
            assert!(get_bit(position.valid_moves(), mv));
            chosen.insert(mv);
        }
        assert!(chosen.len() > 1);
    }

    #[test]
    fn test_greedy_maximizes_own_discs() {
        let mut player = PlayerGreedy::new(0);
        let position = Position::initial();
        let mv = player.choose_move(&position, &settings());
        assert!(get_bit(position.valid_moves(), mv));

        let chosen_discs = count_squares(position.make_move(mv).0.opponent);
        let mut moves = position.valid_moves();
        while moves != 0 {
            let other = first_square(moves);
            moves = remove_first_square(moves);
            assert!(count_squares(position.make_move(other).0.opponent) <= chosen_discs);
        }
    }
}
