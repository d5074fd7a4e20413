// Ficheiro: src/book/prepared.rs
// Descrição: Jogos preparados: sequências completas gravadas contra os
// jogadores determinísticos, seguidas por prefixo exato dos lances.

use crate::core::*;

pub struct Prepared {
    pub color: i32,
    pub score: Score,
    pub moves: [Move; NUM_SQUARES as usize],
}

// Gravado pela ferramenta de análise de adversários; regenerável.
#[rustfmt::skip]
static PREPARED_GAMES: [Prepared; 8] = [
    // brancas vs first0
    Prepared { color: 0, score: 2, moves: [-1,-1,-1,-1,20,19,10,11,2,1,0,3,34,9,8,17,25,12,5,13,6,4,7,14,18,15,23,16,24,21,29,22,32,26,30,31,33,37,41,38,40,39,43,42,45,44,47,46,51,48,56,49,59,50,60,52,57,53,61,54,55,58,63,62] },
    // brancas vs first3
    Prepared { color: 0, score: 4, moves: [-1,-1,-1,-1,20,37,42,38,39,34,26,49,56,45,19,53,46,55,60,61,62,47,63,59,10,58,11,57,25,50,3,54,18,44,24,43,2,52,13,51,12,48,16,41,17,40,32,33,5,31,6,30,22,29,7,23,4,21,14,15,1,9,0,8] },
    // brancas vs greedy0
    Prepared { color: 0, score: 7, moves: [-1,-1,-1,-1,20,19,10,13,34,44,6,1,52,43,18,37,11,3,30,17,16,25,61,21,14,33,7,5,4,2,0,9,22,12,32,41,49,23,31,42,56,40,15,24,48,8,26,50,58,39,57,53,62,54,63,59,51,38,46,55,29,60,47,45] },
    // brancas vs greedy3
    Prepared { color: 0, score: -2, moves: [-1,-1,-1,-1,20,37,42,12,29,34,4,50,26,19,58,33,40,49,41,25,24,18,56,21,17,57,22,14,7,10,32,48,2,16,8,23,30,13,11,9,45,44,38,39,5,53,51,59,62,1,54,43,63,31,0,61,47,55,60,6,46,3,15,52] },
    // pretas vs first0
    Prepared { color: 1, score: 8, moves: [-1,-1,-1,-1,18,37,45,53,9,0,29,22,26,17,16,8,2,1,10,3,4,5,19,11,12,25,20,13,14,23,15,7,21,42,6,46,30,31,24,32,33,34,38,50,39,47,40,48,41,52,43,59,44,61,49,51,54,63,55,58,56,57,60,62] },
    // pretas vs first3
    Prepared { color: 1, score: 6, moves: [-1,-1,-1,-1,45,19,18,17,54,63,34,37,46,41,62,61,55,33,53,29,52,47,60,32,49,50,57,42,59,40,58,56,51,21,48,22,44,26,43,8,39,24,38,10,31,3,30,2,25,4,23,13,20,11,16,0,15,7,14,12,9,1,6,5] },
    // pretas vs greedy0
    Prepared { color: 1, score: 4, moves: [-1,-1,-1,-1,20,19,18,21,29,37,14,7,30,9,43,0,13,5,6,10,17,16,12,4,1,2,23,42,38,31,3,15,24,32,8,45,40,48,54,63,26,25,11,22,46,47,41,33,50,57,62,51,59,55,53,52,61,34,49,44,58,56,60,39] },
    // pretas vs greedy3
    Prepared { color: 1, score: 5, moves: [-1,-1,-1,-1,43,26,21,44,25,14,53,7,20,18,37,45,54,63,55,24,9,0,34,42,50,47,46,58,57,56,10,2,16,41,51,13,29,8,11,12,4,6,49,33,39,3,15,23,48,30,17,40,52,61,59,19,1,5,22,38,32,31,62,60] },
];

/// O próximo lance de um jogo preparado cujo prefixo (desde a jogada 4)
/// coincide com os lances feitos até agora, ou INVALID_MOVE.
pub fn find_prepared_game(move_number: i32, moves_so_far: &[Move; NUM_SQUARES as usize]) -> Move {
    for game in PREPARED_GAMES.iter() {
        if game.color != move_number % 2 {
            continue;
        }
        if (4..move_number as usize).all(|i| moves_so_far[i] == game.moves[i]) {
            return game.moves[move_number as usize];
        }
    }
    INVALID_MOVE
}
