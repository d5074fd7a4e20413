// Ficheiro: src/players/mod.rs
// Descrição: Protocolo de jogador e configuração de uma jogada.

use crate::core::*;
use std::time::{Duration, Instant};

pub mod deterministic;
pub mod random;

pub use deterministic::{PlayerFirst, PlayerGreedy};
pub use random::PlayerRandom;

/// Opções reconhecidas por `choose_move`.
#[derive(Clone, Copy, Debug)]
pub struct PlaySettings {
    /// Instante em que o relógio desta jogada começou a contar.
    pub start_time: Instant,
    /// Orçamento total de tempo que resta para o jogo inteiro.
    pub time_left: Duration,
    /// Desativa a alocação adaptativa e gasta o orçamento todo nesta jogada.
    pub use_all_resources: bool,
    /// Responde imediatamente quando só existe um lance legal.
    pub quick_if_single_move: bool,
    /// Consulta o livro de aberturas e os jogos preparados.
    pub use_book: bool,
}

impl PlaySettings {
    pub fn new(start_time: Instant, time_left: Duration) -> PlaySettings {
        PlaySettings {
            start_time,
            time_left,
            use_all_resources: false,
            quick_if_single_move: true,
            use_book: true,
        }
    }
}

/// Uma estratégia de escolha de lances. O motor alpha-beta é a variante
/// principal; as restantes servem de adversários de teste e calibração.
pub trait Player {
    fn choose_move(&mut self, position: &Position, settings: &PlaySettings) -> Move;

    /// Notificação do lance do adversário (sem valor de retorno).
    fn opponent_move(&mut self, _position: &Position, _mv: Move) {}
}
