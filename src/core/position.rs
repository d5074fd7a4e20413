// Ficheiro: src/core/position.rs
// Descrição: Posição do jogo (dois bitboards), geração e aplicação de lances.

use super::bitboard::*;
use super::types::*;
use std::fmt;

/// Posição imutável: `player` é sempre o lado a jogar. Os dois conjuntos são
/// disjuntos. A ordem total derivada (player primeiro) é a usada por
/// `normalize` para escolher o representante canónico.
#[derive(Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Debug)]
pub struct Position {
    pub player: Bitboard,
    pub opponent: Bitboard,
}

pub fn move_to_string(mv: Move) -> String {
    let row = (b'A' + (mv >> 3) as u8) as char;
    let col = (b'1' + (mv & 7) as u8) as char;
    format!("{}{}", row, col)
}

/// INVALID_MOVE se o texto não for um lance.
pub fn string_to_move(s: &str) -> Move {
    let b = s.as_bytes();
    if b.len() == 2 && (b'A'..=b'H').contains(&b[0]) && (b'1'..=b'8').contains(&b[1]) {
        (((b[0] - b'A') << 3) | (b[1] - b'1')) as Move
    } else {
        INVALID_MOVE
    }
}

impl Position {
    pub fn new(player: Bitboard, opponent: Bitboard) -> Position {
        Position { player, opponent }
    }

    pub fn initial() -> Position {
        Position::new(0x0000_0010_0800_0000, 0x0000_0008_1000_0000)
    }

    /// Lê um diagrama de 64 caracteres: 'O' e 'X' são as pedras, '.' vazio.
    /// 'O' é atribuído ao lado a jogar quando a paridade das pedras é par.
    pub fn from_diagram(s: &str) -> Result<Position, String> {
        if s.len() != 64 {
            return Err(format!("diagrama com {} caracteres em vez de 64", s.len()));
        }
        let mut player = 0;
        let mut opponent = 0;
        for (sq, c) in s.bytes().enumerate() {
            match c {
                b'O' => player = set_bit(player, sq as Move),
                b'X' => opponent = set_bit(opponent, sq as Move),
                b'.' => {}
                _ => return Err(format!("caractere inválido no diagrama: {}", c as char)),
            }
        }
        let mut position = Position::new(player, opponent);
        if position.to_move() == 1 {
            std::mem::swap(&mut position.player, &mut position.opponent);
        }
        Ok(position)
    }

    pub fn to_compact_string(&self) -> String {
        self.render(false)
    }

    fn render(&self, multiline: bool) -> String {
        let (player_char, opponent_char) = if self.to_move() == 1 {
            ('X', 'O')
        } else {
            ('O', 'X')
        };
        let mut s = String::with_capacity(72);
        for y in 0..8 {
            for x in 0..8 {
                let b = single_square(8 * y + x);
                if self.player & b != 0 {
                    s.push(player_char);
                } else if self.opponent & b != 0 {
                    s.push(opponent_char);
                } else {
                    s.push('.');
                }
            }
            if multiline {
                s.push('\n');
            }
        }
        s
    }

    pub fn move_number(&self) -> i32 {
        count_squares(self.player | self.opponent)
    }

    pub fn to_move(&self) -> i32 {
        parity(self.player | self.opponent)
    }

    pub fn empty_squares(&self) -> Bitboard {
        !(self.player | self.opponent)
    }

    pub fn finished(&self) -> bool {
        self.empty_squares() == 0
    }

    /// Pontuação final para o lado a jogar (metade da diferença de pedras).
    pub fn final_score(&self) -> Score {
        (count_squares(self.player) - NUM_SQUARES / 2) as Score
    }

    /// Lances que viram pelo menos uma pedra, calculados por direção com a
    /// técnica de duplicação: cadeias ocupadas ancoradas numa pedra nossa
    /// estendem-se 1 -> 2 -> 4 -> 6 casas numa passagem por eixo.
    pub fn valid_moves_capturing(&self) -> Bitboard {
        let all = self.player | self.opponent;
        let all_middle = all & !(LEFT_EDGE | RIGHT_EDGE);

        let moves1 = valid_moves_one_dir(self.player, all_middle, 1);
        let moves8 = valid_moves_one_dir(self.player, all, 8);
        let moves7 = valid_moves_one_dir(self.player, all_middle, 7);
        let moves9 = valid_moves_one_dir(self.player, all_middle, 9);

        let pseudo_moves = (moves1 | moves8) | (moves7 | moves9);
        pseudo_moves & !all
    }

    /// Lances "válidos" do conjunto de regras: os capturantes ou, se não
    /// existir nenhum, as casas vizinhas das ocupadas. No segundo caso nenhum
    /// lance vira pedras: semântica herdada do árbitro, mantida por
    /// compatibilidade; quem chama tem de tratar os dois casos.
    pub fn valid_moves(&self) -> Bitboard {
        let moves = self.valid_moves_capturing();
        if moves != 0 {
            moves
        } else {
            neighbors(self.player | self.opponent)
        }
    }

    /// Referência lenta: vizinhos filtrados por `make_move`. Oráculo de teste
    /// para `valid_moves`; não é caminho de produção.
    pub fn valid_moves_slow(&self) -> Bitboard {
        let n = neighbors(self.player | self.opponent);

        let mut n_rem = n;
        let mut valid = 0;
        while n_rem != 0 {
            let sq = first_square(n_rem);
            let b_sq = single_square(sq);
            if self.make_move(sq).1 {
                valid |= b_sq;
            }
            n_rem ^= b_sq;
        }

        if valid == 0 {
            valid = n;
        }
        valid
    }

    fn move_flips_one_dir(&self, mv: Move, dir: u32, edge_f: Bitboard, edge_b: Bitboard) -> Bitboard {
        let all = self.player | self.opponent;
        let move_board = single_square(mv);

        // Raio para a frente (índices crescentes).
        let ray_f1 = (move_board & !edge_f) << dir;
        let ray_f2 = (ray_f1 & !edge_f) << dir;

        let mut flips_f = 0;
        if ray_f2 != 0 {
            let mut ray_f = ray_f1 | ray_f2;
            let mut r = ray_f2;
            for _ in 0..5 {
                r = (r & !edge_f) << dir;
                ray_f |= r;
            }

            // A soma propaga um carry pela cadeia ocupada a partir do lance;
            // fora do raio os buracos são preenchidos para o carry atravessar.
            let all_f_filled = if dir == 1 { all } else { all | !ray_f };
            let consecutive_f = (all_f_filled ^ all_f_filled.wrapping_add(ray_f1)) & ray_f;
            let player_f = self.player & consecutive_f;
            if player_f != 0 {
                let last_player_f = single_square(last_square(player_f));
                flips_f = (last_player_f - 1) & ray_f;
            }
        }

        // Raio para trás (índices decrescentes).
        let ray_b1 = (move_board & !edge_b) >> dir;
        let ray_b2 = (ray_b1 & !edge_b) >> dir;

        let mut flips_b = 0;
        if ray_b2 != 0 {
            let mut ray_b = ray_b1 | ray_b2;
            let mut r = ray_b2;
            for _ in 0..5 {
                r = (r & !edge_b) >> dir;
                ray_b |= r;
            }

            let mut consecutive_b = all & ray_b;
            let empty_b = !all & ray_b;
            if empty_b != 0 {
                let first_empty_b = single_square(last_square(empty_b));
                consecutive_b &= !(first_empty_b - 1);
            }
            let player_b = self.player & consecutive_b;
            if player_b != 0 {
                let behind_player_b = player_b ^ (player_b - 1);
                flips_b = consecutive_b & !behind_player_b;
            }
        }

        flips_f | flips_b
    }

    /// Aplica um lance: em cada um dos 4 eixos vira a cadeia ocupada limitada
    /// pela nossa pedra mais distante, e troca o lado a jogar. Devolve também
    /// se alguma pedra virou. Tem de ser exatamente equivalente a
    /// `make_move_slow`.
    pub fn make_move(&self, mv: Move) -> (Position, bool) {
        let flips1 = self.move_flips_one_dir(mv, 1, RIGHT_EDGE, LEFT_EDGE);
        let flips8 = self.move_flips_one_dir(mv, 8, BOTTOM_EDGE, TOP_EDGE);
        let flips7 = self.move_flips_one_dir(mv, 7, BOTTOM_EDGE | LEFT_EDGE, TOP_EDGE | RIGHT_EDGE);
        let flips9 = self.move_flips_one_dir(mv, 9, BOTTOM_EDGE | RIGHT_EDGE, TOP_EDGE | LEFT_EDGE);
        let flipped = (flips1 | flips8) | (flips7 | flips9);

        let next = Position::new(self.opponent ^ flipped, set_bit(self.player ^ flipped, mv));
        (next, flipped != 0)
    }

    /// Referência lenta de `make_move`: percorre explicitamente os 8 raios.
    /// Oráculo de teste; não é caminho de produção.
    pub fn make_move_slow(&self, mv: Move) -> (Position, bool) {
        let move_y = (mv >> 3) as i32;
        let move_x = (mv & 7) as i32;

        let mut flipped: Bitboard = 0;

        for dy in -1..=1 {
            for dx in -1..=1 {
                if dy == 0 && dx == 0 {
                    continue;
                }
                let mut y = move_y + dy;
                let mut x = move_x + dx;
                let mut farthest_flipped = 0;
                let mut cur_flipped = 0;
                while (0..8).contains(&y) && (0..8).contains(&x) {
                    let b_sq = single_square((8 * y + x) as Move);
                    if self.player & b_sq != 0 {
                        farthest_flipped = cur_flipped;
                    } else if self.opponent & b_sq == 0 {
                        break;
                    }
                    cur_flipped |= b_sq;
                    y += dy;
                    x += dx;
                }
                flipped |= farthest_flipped;
            }
        }

        let next = Position::new(self.opponent ^ flipped, set_bit(self.player ^ flipped, mv));
        (next, flipped != 0)
    }

    pub fn transform(&self, symmetry: i32) -> Position {
        Position::new(
            transform_bitboard(self.player, symmetry),
            transform_bitboard(self.opponent, symmetry),
        )
    }

    /// Representante canónico: a menor das 8 imagens simétricas, junto com a
    /// simetria usada para lá chegar.
    pub fn normalize(&self) -> (Position, i32) {
        let mut normalized = *self;
        let mut symmetry_used = 0;

        for symmetry in 1..NUM_SYMMETRIES {
            let p = self.transform(symmetry);
            if p < normalized {
                normalized = p;
                symmetry_used = symmetry;
            }
        }

        (normalized, symmetry_used)
    }
}

fn valid_moves_one_dir(player: Bitboard, all: Bitboard, dir: u32) -> Bitboard {
    let flippable_l1 = all & (player << dir);
    let flippable_r1 = all & (player >> dir);
    let flippable_l2 = flippable_l1 | (all & (flippable_l1 << dir));
    let flippable_r2 = flippable_r1 | (all & (flippable_r1 >> dir));
    let all_neighbor_r = all & (all << dir);
    let all_neighbor_l = all & (all >> dir);
    let flippable_l4 = flippable_l2 | (all_neighbor_r & (flippable_l2 << (2 * dir)));
    let flippable_r4 = flippable_r2 | (all_neighbor_l & (flippable_r2 >> (2 * dir)));
    let flippable_l6 = flippable_l4 | (all_neighbor_r & (flippable_l4 << (2 * dir)));
    let flippable_r6 = flippable_r4 | (all_neighbor_l & (flippable_r4 >> (2 * dir)));

    (flippable_l6 << dir) | (flippable_r6 >> dir)
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render(true))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn pos(s: &str) -> Position {
        Position::from_diagram(s).unwrap()
    }

    #[test]
    fn test_move_names() {
        assert_eq!(move_to_string(0), "A1");
        assert_eq!(move_to_string(1), "A2");
        assert_eq!(move_to_string(7), "A8");
        assert_eq!(move_to_string(8), "B1");
        assert_eq!(move_to_string(63), "H8");

        assert_eq!(string_to_move("A1"), 0);
        assert_eq!(string_to_move("A2"), 1);
        assert_eq!(string_to_move("A8"), 7);
        assert_eq!(string_to_move("B1"), 8);
        assert_eq!(string_to_move("H8"), 63);

        assert_eq!(string_to_move(""), INVALID_MOVE);
        assert_eq!(string_to_move("I1"), INVALID_MOVE);
        assert_eq!(string_to_move("B0"), INVALID_MOVE);

        for sq in 0..64 {
            assert_eq!(string_to_move(&move_to_string(sq)), sq);
        }
    }

    #[test]
    fn test_initial_position() {
        let p = Position::initial();
        assert_eq!(
            p,
            pos("........\
                 ........\
                 ........\
                 ...OX...\
                 ...XO...\
                 ........\
                 ........\
                 ........")
        );

        assert_eq!(p.move_number(), 4);
        assert_eq!(p.to_move(), 0);

        assert_eq!(
            p.to_string(),
            "........\n\
             ........\n\
             ........\n\
             ...OX...\n\
             ...XO...\n\
             ........\n\
             ........\n\
             ........\n"
        );

        assert_eq!(
            p.to_compact_string(),
            "........\
             ........\
             ........\
             ...OX...\
             ...XO...\
             ........\
             ........\
             ........"
        );
    }

    #[test]
    fn test_finished_and_score() {
        assert!(!pos("OXXOXOXO\
                      XOOXOXXX\
                      OXXOXOXO\
                      OXXOXOXO\
                      OXXOXOX.\
                      OXXOXOXO\
                      OXXOXOXO\
                      OXXOXOXO")
            .finished());

        let pos1 = pos("OXXOXOXO\
                        XOOXOXXX\
                        OXXOXOXO\
                        OXXOXOXO\
                        OXXOXOXO\
                        OXXOXOXO\
                        OXXOXOXO\
                        OXXOXOXO");
        assert!(pos1.finished());
        assert_eq!(pos1.final_score(), -1);

        let pos2 = Position::from_diagram(&"O".repeat(64)).unwrap();
        assert!(pos2.finished());
        assert_eq!(pos2.final_score(), 32);
    }

    #[test]
    fn test_make_move() {
        let pos1 = pos(".X...O..\
                        ..X.O...\
                        .XO.O.OX\
                        ..OOO..X\
                        .O.X.X.X\
                        O.....OX\
                        ...OOOOX\
                        ..OX....");
        assert_eq!(pos1.to_move(), 1);

        let (pos2, flipped) = pos1.make_move(19);
        assert!(flipped);
        assert_eq!(
            pos2,
            pos(".X...O..\
                 ..O.O...\
                 .XXXO.OX\
                 ..OXX..X\
                 .O.X.O.X\
                 O.....XX\
                 ...OOOOX\
                 ..OX....")
        );

        // Sem viradas: a pedra entra na mesma e o lado a jogar troca.
        let pos3 = pos("........\
                        ........\
                        ........\
                        ...OX...\
                        ...OX...\
                        ........\
                        ........\
                        ........");
        let (pos4, flipped) = pos3.make_move(20);
        assert!(!flipped);
        assert_eq!(
            pos4,
            pos("........\
                 ........\
                 ....O...\
                 ...OX...\
                 ...OX...\
                 ........\
                 ........\
                 ........")
        );
    }

    #[test]
    fn test_valid_moves() {
        let pos1 = pos("........\
                        ........\
                        ...XXO..\
                        ..OX.X..\
                        ...OOO..\
                        ........\
                        ........\
                        ........");
        assert_eq!(pos1.to_move(), 1);
        assert_eq!(
            pos1.valid_moves(),
            bitboard_from_string(
                "........\
                 ...X.X..\
                 ..X...X.\
                 .X......\
                 .XX...X.\
                 ...X.X..\
                 ........\
                 ........"
            )
        );

        // Sem viradas possíveis: devolve os vizinhos das casas ocupadas.
        let pos2 = pos("........\
                        ...O....\
                        ........\
                        ...X....\
                        ...XX...\
                        ........\
                        ........\
                        ........");
        assert_eq!(pos2.to_move(), 0);
        assert_eq!(
            pos2.valid_moves(),
            bitboard_from_string(
                "..XXX...\
                 ..X.X...\
                 ..XXX...\
                 ..X.XX..\
                 ..X..X..\
                 ..XXXX..\
                 ........\
                 ........"
            )
        );
    }

    #[test]
    fn test_initial_moves_include_far_diagonal() {
        // Além dos 4 lances perpendiculares clássicos, o conjunto de regras
        // admite 18 e 45: a cadeia ocupada na diagonal termina numa pedra
        // nossa mais distante, e a virada (por diferença simétrica) não é
        // vazia.
        let moves: Vec<Move> = {
            let mut v = Vec::new();
            let mut b = Position::initial().valid_moves();
            while b != 0 {
                v.push(first_square(b));
                b = remove_first_square(b);
            }
            v
        };
        assert_eq!(moves, vec![18, 20, 29, 34, 43, 45]);
    }

    #[test]
    fn test_moves_vs_slow() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for _ in 0..300 {
            let mut position = Position::initial();
            while !position.finished() {
                let valid_moves = position.valid_moves();
                assert_eq!(valid_moves, position.valid_moves_slow(), "\n{}", position);

                let n = count_squares(valid_moves);
                let mv = nth_square(valid_moves, rng.gen_range(0..n));
                let (pos_slow, flipped_slow) = position.make_move_slow(mv);
                let (pos_fast, flipped_fast) = position.make_move(mv);
                assert_eq!(flipped_slow, flipped_fast, "\n{}lance {}", position, move_to_string(mv));
                assert_eq!(pos_slow, pos_fast, "\n{}lance {}", position, move_to_string(mv));
                position = pos_fast;
            }
        }
    }

    #[test]
    fn test_position_normalize() {
        let pos1 = pos("........\
                        ........\
                        ..XXX...\
                        ...OO...\
                        ....O...\
                        ........\
                        ........\
                        ........");
        let pos2 = pos("........\
                        ........\
                        ........\
                        ...OOX..\
                        ....OX..\
                        .....X..\
                        ........\
                        ........");

        let (n1, tr1) = pos1.normalize();
        let (n2, tr2) = pos2.normalize();
        assert_eq!(n1, n2);
        assert_eq!(pos1.transform(tr1), pos2.transform(tr2));
    }

    #[test]
    fn test_normalize_idempotent() {
        let mut rng = StdRng::seed_from_u64(7);
        let mut position = Position::initial();
        for _ in 0..30 {
            let (normalized, _) = position.normalize();
            let (again, symmetry) = normalized.normalize();
            assert_eq!(again, normalized);
            assert_eq!(symmetry, 0);
            if position.finished() {
                break;
            }
            let moves = position.valid_moves();
            let mv = nth_square(moves, rng.gen_range(0..count_squares(moves)));
            position = position.make_move(mv).0;
        }
    }
}
