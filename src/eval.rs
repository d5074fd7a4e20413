// Ficheiro: src/eval.rs
// Descrição: Avaliador estático. Para cada casa estima a probabilidade de a
// pedra sobreviver até ao fim, multiplicando correlações de virada por linha
// (linhas, colunas e as duas diagonais), e soma termos de mobilidade e cantos.

use crate::core::*;
use lazy_static::lazy_static;

pub const CORNER_MOVE_BONUS: Milliscore = 384 << 10;
pub const OPPONENT_CORNER_MOVE_BONUS: Milliscore = 256 << 10;
pub const MOBILITY_BONUS: Milliscore = 3000;
pub const OPPONENT_MOBILITY_BONUS: Milliscore = 2000;

// Bónus para quem joga, por número de jogada. Ajustado offline sobre jogos
// de treino; regenerável pela ferramenta correspondente.
#[rustfmt::skip]
pub static EVALUATOR_TO_MOVE_BONUS: [Milliscore; 65] = [
    300000, -300000, 300000, -300000, 300000, -300000, 300000, -300000, 300715, -274012,
    256020, -270022, 247653, -268498, 240827, -268044, 226796, -258760, 213369, -251181,
    212493, -266549, 222934, -282305, 239812, -296185, 239149, -296478, 232778, -278798,
    223058, -281699, 191180, -281218, 202595, -314669, 223572, -292186, 189998, -277340,
    206835, -270630, 202887, -301031, 221187, -241518, 260672, -231828, 251568, -170309,
    243459, -177243, 359010, -176368, 453418, -132531, 491565, -107849, 494569,   37625,
    423728,  -26931, 294690,   14918,      0,
];

pub const fn power_of_3(n: u32) -> usize {
    if n == 0 {
        1
    } else {
        3 * power_of_3(n - 1)
    }
}

// Multiplicadores em unidades de 1/64: 64 = a pedra mantém o dono, -64 = é
// virada de certeza, 0 = moeda ao ar.
const MULTIPLIER_ONE: i32 = 64;

pub struct Evaluator {
    base_2_to_3: [u16; 256],
    // Por comprimento de linha 1..=8: multiplicador por casa, indexado pela
    // configuração da linha em base 3 (2 = nossa pedra, 1 = do adversário).
    flip_multipliers: Vec<Vec<[i8; 8]>>,
    // Expectativa com sinal por casa para uma linha completa de 8.
    row_expected: Vec<[i8; 8]>,
}

impl Evaluator {
    pub fn new() -> Evaluator {
        let mut base_2_to_3 = [0u16; 256];
        for i in 1..256 {
            base_2_to_3[i] = 3 * base_2_to_3[i >> 1] + (i as u16 & 1);
        }

        let mut evaluator = Evaluator {
            base_2_to_3,
            flip_multipliers: Vec::new(),
            row_expected: Vec::new(),
        };

        evaluator.flip_multipliers.push(Vec::new()); // comprimento 0 não existe
        for len in 1..=8 {
            let table = evaluator.init_flip_multipliers(len);
            evaluator.flip_multipliers.push(table);
        }
        evaluator.init_row_expected();
        evaluator
    }

    fn encode(&self, player: u32, opponent: u32) -> usize {
        ((self.base_2_to_3[player as usize] as usize) << 1)
            + self.base_2_to_3[opponent as usize] as usize
    }

    /// Expectativa recursiva sobre os lances possíveis dentro da própria
    /// linha, com ambos os jogadores igualmente prováveis; configurações com
    /// menos casas vazias já estão calculadas quando são consultadas.
    fn init_flip_multipliers(&self, len: u32) -> Vec<[i8; 8]> {
        let size = power_of_3(len);
        let mut multipliers_f64 = vec![[0f64; 8]; size];
        let mask: u32 = (1 << len) - 1;

        for empty in 0..=mask {
            let mut player = mask ^ empty;
            loop {
                let opponent = mask ^ empty ^ player;
                let encoded = self.encode(player, opponent);

                if empty != 0 {
                    let mut sum_prob_multiplier = [0f64; 8];
                    for mv in 0..len {
                        if empty & (1 << mv) == 0 {
                            continue;
                        }
                        for who in 0..2 {
                            let before = if who == 0 {
                                Position::new(player as Bitboard, opponent as Bitboard)
                            } else {
                                Position::new(opponent as Bitboard, player as Bitboard)
                            };
                            let (after, _) = before.make_move(mv as Move);
                            // Repõe a perspetiva do `player` original.
                            let (next_player, next_opponent) = if who == 0 {
                                (after.opponent, after.player)
                            } else {
                                (after.player, after.opponent)
                            };

                            let flipped =
                                (player ^ next_player as u32) & (player | opponent);
                            let next = &multipliers_f64[self.encode(
                                next_player as u32 & mask,
                                next_opponent as u32 & mask,
                            )];
                            for i in 0..len as usize {
                                let mut m = next[i];
                                if flipped & (1 << i) != 0 {
                                    m = -m;
                                }
                                sum_prob_multiplier[i] += m;
                            }
                        }
                    }

                    let occupied = player | opponent;
                    let denominator = (2 * count_squares(empty as Bitboard)) as f64;
                    for i in 0..len as usize {
                        multipliers_f64[encoded][i] = if occupied & (1 << i) != 0 {
                            sum_prob_multiplier[i] / denominator
                        } else {
                            0.0
                        };
                    }
                } else {
                    for i in 0..len as usize {
                        multipliers_f64[encoded][i] = 1.0;
                    }
                }

                if player == 0 {
                    break;
                }
                player = (player - 1) & !empty;
            }
        }

        let mut quantized: Vec<[i8; 8]> = multipliers_f64
            .iter()
            .map(|m| {
                let mut q = [0i8; 8];
                for i in 0..len as usize {
                    let a = (m[i] * MULTIPLIER_ONE as f64).round();
                    debug_assert!((-64.0..=64.0).contains(&a));
                    q[i] = a as i8;
                }
                q
            })
            .collect();

        // A dinâmica da linha é simétrica sob inversão, mas a soma em vírgula
        // flutuante corre por ordens diferentes nas duas orientações e pode
        // arredondar de forma diferente num limite de .5. Copiar a entrada da
        // configuração invertida torna a igualdade exata, e com ela a
        // invariância do avaliador sob as 8 simetrias do tabuleiro.
        for code in 0..size {
            let rev = reverse_code(code, len);
            if rev < code {
                let mut mirrored = [0i8; 8];
                for i in 0..len as usize {
                    mirrored[i] = quantized[rev][len as usize - 1 - i];
                }
                quantized[code] = mirrored;
            }
        }

        quantized
    }

    fn init_row_expected(&mut self) {
        let table = &self.flip_multipliers[8];
        let mask = 0xffu32;
        let mut row_expected = vec![[0i8; 8]; power_of_3(8)];
        for empty in 0..=mask {
            let mut player = mask ^ empty;
            loop {
                let opponent = mask ^ empty ^ player;
                let encoded = self.encode(player, opponent);
                let multipliers = &table[encoded];

                let mut expected = [0i8; 8];
                for i in 0..8 {
                    if player & (1 << i) != 0 {
                        expected[i] = multipliers[i];
                    } else if opponent & (1 << i) != 0 {
                        expected[i] = -multipliers[i];
                    }
                }
                row_expected[encoded] = expected;

                if player == 0 {
                    break;
                }
                player = (player - 1) & !empty;
            }
        }
        self.row_expected = row_expected;
    }

    /// Metade da diferença esperada de pedras no fim, em milliscore. Num
    /// tabuleiro cheio é exatamente `final_score << MILLISCORE_BITS`.
    ///
    /// O produto linha×coluna×diagonal×diagonal acumula-se por casa em
    /// precisão inteira completa e só é arredondado no fim, por isso o
    /// resultado é invariante sob as 8 simetrias do tabuleiro.
    pub fn evaluate_expected(&self, position: &Position) -> Milliscore {
        let p_bytes = position.player.to_le_bytes();
        let o_bytes = position.opponent.to_le_bytes();

        // Produto acumulado por casa, na escala 64^4 = 1.0.
        let mut product = [[0i64; 8]; 8];

        // Linhas: expectativa com sinal.
        for y in 0..8 {
            let code = self.encode(p_bytes[y] as u32, o_bytes[y] as u32);
            let row = &self.row_expected[code];
            for x in 0..8 {
                product[y][x] = row[x] as i64;
            }
        }

        // Colunas: multiplica a correlação da coluna.
        for x in 0..8 {
            let cp = extract_line(position.player, x as i32, 8, 8);
            let co = extract_line(position.opponent, x as i32, 8, 8);
            let multipliers = &self.flip_multipliers[8][self.encode(cp, co)];
            for y in 0..8 {
                product[y][x] *= multipliers[y] as i64;
            }
        }

        // Diagonais nos dois sentidos; linhas com menos de 3 casas têm
        // multiplicador unitário.
        for (start, step, len) in diagonal_lines() {
            if len < 3 {
                for i in 0..len {
                    let sq = start + i * step;
                    product[(sq >> 3) as usize][(sq & 7) as usize] *= MULTIPLIER_ONE as i64;
                }
                continue;
            }
            let dp = extract_line(position.player, start, step, len);
            let dq = extract_line(position.opponent, start, step, len);
            let multipliers = &self.flip_multipliers[len as usize][self.encode(dp, dq)];
            for i in 0..len {
                let sq = start + i * step;
                product[(sq >> 3) as usize][(sq & 7) as usize] *= multipliers[i as usize] as i64;
            }
        }

        let mut total: i64 = 0;
        for row in &product {
            for &e in row {
                total += e;
            }
        }

        // Cada pedra vale meio ponto de score: 64^4 -> 1 << (MILLISCORE_BITS - 1).
        ((total + 16) >> 5) as Milliscore
    }

    pub fn evaluate(&self, position: &Position) -> Milliscore {
        let mut result = self.evaluate_expected(position);

        result += EVALUATOR_TO_MOVE_BONUS[position.move_number() as usize];

        let valid_moves = position.valid_moves();
        let valid_moves_opponent =
            Position::new(position.opponent, position.player).valid_moves_capturing();

        if valid_moves & CORNERS != 0 {
            result += CORNER_MOVE_BONUS;
        }
        if valid_moves_opponent & CORNERS & !valid_moves != 0 {
            result -= OPPONENT_CORNER_MOVE_BONUS;
        }

        result += count_squares(valid_moves) * MOBILITY_BONUS;
        result -= count_squares(valid_moves_opponent) * OPPONENT_MOBILITY_BONUS;

        result
    }
}

impl Default for Evaluator {
    fn default() -> Evaluator {
        Evaluator::new()
    }
}

/// Código base-3 da configuração com a ordem das casas invertida.
fn reverse_code(code: usize, len: u32) -> usize {
    let mut c = code;
    let mut r = 0;
    for _ in 0..len {
        r = r * 3 + c % 3;
        c /= 3;
    }
    r
}

fn extract_line(b: Bitboard, start: i32, step: i32, len: i32) -> u32 {
    let mut bits = 0u32;
    for i in 0..len {
        if get_bit(b, (start + i * step) as Move) {
            bits |= 1 << i;
        }
    }
    bits
}

/// As 30 diagonais do tabuleiro como (casa inicial, passo, comprimento).
fn diagonal_lines() -> Vec<(i32, i32, i32)> {
    let mut lines = Vec::with_capacity(30);
    for s in 0..15 {
        // passo 7: (y, x) -> (y+1, x-1), diagonal x + y = s
        let y0 = (s - 7).max(0);
        let x0 = s - y0;
        let len = s.min(7) - y0 + 1;
        lines.push((8 * y0 + x0, 7, len));
    }
    for d in -7..=7 {
        // passo 9: (y, x) -> (y+1, x+1), diagonal x - y = d
        let y0 = (-d).max(0);
        let x0 = y0 + d;
        let len = 8 - d.abs();
        lines.push((8 * y0 + x0, 9, len));
    }
    lines
}

lazy_static! {
    // Construído uma vez antes de qualquer pesquisa; só leitura depois disso.
    static ref EVALUATOR: Evaluator = Evaluator::new();
}

/// Avaliação heurística da posição para o lado a jogar, pura e determinística.
pub fn evaluate(position: &Position) -> Milliscore {
    EVALUATOR.evaluate(position)
}

pub fn evaluate_expected(position: &Position) -> Milliscore {
    EVALUATOR.evaluate_expected(position)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    #[test]
    fn test_power_of_3() {
        assert_eq!(power_of_3(0), 1);
        assert_eq!(power_of_3(8), 6561);
    }

    #[test]
    fn test_base_2_to_3() {
        let evaluator = Evaluator::new();
        assert_eq!(evaluator.base_2_to_3[0], 0);
        assert_eq!(evaluator.base_2_to_3[9], 28);
        assert_eq!(evaluator.base_2_to_3[0xff], 3280);
    }

    #[test]
    fn test_flip_multiplier_values() {
        let evaluator = Evaluator::new();

        // "...": linha vazia: tudo zero.
        assert_eq!(evaluator.flip_multipliers[3][evaluator.encode(0, 0)], [0; 8]);
        // ".O.": uma pedra isolada nossa, vizinhas vazias: também zero.
        assert_eq!(evaluator.flip_multipliers[3][evaluator.encode(2, 0)], [0; 8]);
        // "OXO": linha cheia: ninguém vira ninguém, tudo 1.
        assert_eq!(
            evaluator.flip_multipliers[3][evaluator.encode(5, 2)][..3],
            [64, 64, 64]
        );
        // "OXO.": o X do meio vira de certeza (-1); o O seguinte é 50-50.
        assert_eq!(
            evaluator.flip_multipliers[4][evaluator.encode(5, 2)][..4],
            [64, 0, -64, 0]
        );
        // "XOO..": o O interior vira com probabilidade 5/8: 3/8-5/8 = -1/4.
        assert_eq!(
            evaluator.flip_multipliers[5][evaluator.encode(6, 1)][..5],
            [64, 0, -16, 0, 0]
        );
    }

    #[test]
    fn test_evaluate_expected_single_row() {
        let position = Position::from_diagram(
            "........\
             ........\
             ........\
             ........\
             ........\
             ........\
             ........\
             XOOXXXOX",
        )
        .unwrap();
        assert_eq!(position.to_move(), 0);
        assert_eq!(evaluate_expected(&position), -1 << MILLISCORE_BITS);
    }

    #[test]
    fn test_evaluate_full_boards() {
        let mut rng = StdRng::seed_from_u64(99);
        for _ in 0..100 {
            let p: Bitboard = rng.gen();
            let position = Position::new(p, !p);
            assert!(position.finished());
            assert_eq!(
                evaluate(&position),
                (position.final_score() as Milliscore) << MILLISCORE_BITS
            );
        }
    }

    #[test]
    fn test_evaluate_is_symmetric() {
        let mut rng = StdRng::seed_from_u64(5);
        let mut position = Position::initial();
        for _ in 0..40 {
            for symmetry in 1..NUM_SYMMETRIES {
                assert_eq!(
                    evaluate(&position.transform(symmetry)),
                    evaluate(&position),
                    "simetria {}\n{}",
                    symmetry,
                    position
                );
            }
            if position.finished() {
                break;
            }
            let moves = position.valid_moves();
            let mv = nth_square(moves, rng.gen_range(0..count_squares(moves)));
            position = position.make_move(mv).0;
        }
    }

    #[test]
    fn test_to_move_bonus_and_mobility_applied() {
        // A posição inicial não dá lances de canto a ninguém, por isso a
        // avaliação é a expectativa mais o bónus de quem joga e a mobilidade.
        let position = Position::initial();
        let mobility = count_squares(position.valid_moves()) * MOBILITY_BONUS
            - count_squares(
                Position::new(position.opponent, position.player).valid_moves_capturing(),
            ) * OPPONENT_MOBILITY_BONUS;
        assert_eq!(
            evaluate(&position),
            evaluate_expected(&position) + EVALUATOR_TO_MOVE_BONUS[4] + mobility
        );
    }
}
