use crate::core::*;
use crate::players::{Player, PlaySettings};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// Joga um lance válido uniformemente ao acaso.
pub struct PlayerRandom {
    rng: StdRng,
}

impl PlayerRandom {
    pub fn new() -> PlayerRandom {
        PlayerRandom {
            rng: StdRng::from_entropy(),
        }
    }
}

impl Default for PlayerRandom {
    fn default() -> PlayerRandom {
        PlayerRandom::new()
    }
}

impl Player for PlayerRandom {
    fn choose_move(&mut self, position: &Position, _settings: &PlaySettings) -> Move {
        let moves = position.valid_moves();
        let n = count_squares(moves);
        nth_square(moves, self.rng.gen_range(0..n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    #[test]
    fn test_random_move_is_valid() {
        let mut player = PlayerRandom::new();
        let settings = PlaySettings::new(Instant::now(), Duration::from_millis(10));
        let position = Position::initial();
        for _ in 0..20 {
            let mv = player.choose_move(&position, &settings);
            assert!(get_bit(position.valid_moves(), mv));
        }
    }
}
