// Ficheiro: src/search/endgame.rs
// Descrição: Solver exato do fim de jogo. Mesmo esqueleto negamax do
// meio-jogo mas em score inteiro; as últimas 0-3 casas vazias resolvem-se
// por enumeração direta, sem recursão genérica nem TT.

use crate::core::*;
use crate::search::alpha_beta::*;
use crate::search::time_control::Deadlines;
use std::time::Instant;

impl AlphaBetaEngine {
    pub(crate) fn search_first_endgame_move(
        &mut self,
        position: &Position,
        mv: Move,
        aspiration_alpha: Score,
        aspiration_beta: Score,
    ) -> SearchResult<Score> {
        let (next_position, _) = position.make_move(mv);

        let mut alpha = aspiration_alpha;
        let mut beta = aspiration_beta;
        loop {
            let score = -self.endgame_alpha_beta(&next_position, -beta, -alpha)?;
            if score <= alpha {
                alpha = -MAX_SCORE;
            } else if score >= beta {
                beta = MAX_SCORE;
            } else {
                return Ok(score);
            }
        }
    }

    pub(crate) fn search_other_endgame_moves(
        &mut self,
        position: &Position,
        moves: &mut [Move],
        deadlines: &Deadlines,
        best_score: &mut Score,
        aspiration_beta: Score,
    ) -> SearchResult<()> {
        for move_index in 1..moves.len() {
            if Instant::now() >= deadlines.next_move {
                return Err(Timeout);
            }

            let (next_position, _) = position.make_move(moves[move_index]);

            let mut beta = *best_score + 1;
            let score = loop {
                let score = -self.endgame_alpha_beta(&next_position, -beta, -*best_score)?;
                if score < beta {
                    break score;
                }
                beta = if score < aspiration_beta {
                    aspiration_beta
                } else {
                    MAX_SCORE
                };
            };

            if score > *best_score {
                *best_score = score;
                moves[..=move_index].rotate_right(1);
            }
        }
        Ok(())
    }

    /// Nó negamax exato. Quando corre até ao fim devolve o verdadeiro valor
    /// minimax da posição. Partilha a TT do meio-jogo (scores exatos entram
    /// deslocados para milliscore); ProbCut está sempre desligado aqui.
    pub(crate) fn endgame_alpha_beta(
        &mut self,
        position: &Position,
        alpha: Score,
        beta: Score,
    ) -> SearchResult<Score> {
        self.nodes_visited += 1;

        let move_number = position.move_number();
        let depth = NUM_SQUARES - move_number;

        if depth <= 3 {
            return Ok(match depth {
                3 => endgame_3(position, alpha, beta),
                2 => endgame_2(position, beta),
                1 => endgame_1(position),
                _ => endgame_0(position),
            });
        }

        if Instant::now() >= self.deadline {
            return Err(Timeout);
        }

        let mut tt_entry: Option<TranspositionTableEntry> = None;
        if depth >= ENDGAME_MIN_TT_DEPTH {
            tt_entry = self.transposition_table.find(position).copied();

            if let Some(entry) = tt_entry {
                if entry.depth >= depth
                    && (entry.entry_type == EntryType::Exact
                        || (entry.entry_type == EntryType::LowerBound
                            && entry.score >= (beta as Milliscore) << MILLISCORE_BITS)
                        || (entry.entry_type == EntryType::UpperBound
                            && entry.score <= (alpha as Milliscore) << MILLISCORE_BITS))
                {
                    return Ok((entry.score >> MILLISCORE_BITS) as Score);
                }
            }
        }

        let mut best_score = -MAX_SCORE;
        let mut best_move = INVALID_MOVE;
        let mut remaining_moves = position.valid_moves();

        while remaining_moves != 0 {
            let mv = match tt_entry {
                Some(entry) if entry.mv != INVALID_MOVE && get_bit(remaining_moves, entry.mv) => {
                    entry.mv
                }
                _ => {
                    let killer = self.killer_moves[move_number as usize];
                    if killer != INVALID_MOVE && get_bit(remaining_moves, killer) {
                        killer
                    } else {
                        choose_move_statically(remaining_moves)
                    }
                }
            };
            remaining_moves = reset_bit(remaining_moves, mv);
            let (next_position, _) = position.make_move(mv);

            let to_beat = alpha.max(best_score);
            let limit = if depth >= ENDGAME_MIN_PV_DEPTH {
                to_beat + 1
            } else {
                beta
            };
            let mut score = -self.endgame_alpha_beta(&next_position, -limit, -to_beat)?;

            if score >= limit && score < beta {
                score = -self.endgame_alpha_beta(&next_position, -beta, -to_beat)?;
            }

            if score > best_score {
                best_score = score;
                best_move = mv;
                if best_score >= beta {
                    self.killer_moves[move_number as usize] = mv;
                    break;
                }
            }
        }

        if depth >= ENDGAME_MIN_TT_DEPTH {
            let (entry, _inserted) = self.transposition_table.insert(position);
            if let Some(entry) = entry {
                if depth >= entry.depth {
                    entry.depth = depth;
                    entry.probcut_allowed = false;
                    entry.score = (best_score as Milliscore) << MILLISCORE_BITS;
                    entry.mv = best_move;
                    entry.entry_type = if best_score >= beta {
                        EntryType::LowerBound
                    } else if best_score <= alpha {
                        EntryType::UpperBound
                    } else {
                        EntryType::Exact
                    };
                }
            }
        }

        Ok(best_score)
    }

    /// Score esperado contra um adversário falível: média geométrica pesada
    /// dos resultados exatos dos lances dele, ordenados do melhor ao pior.
    pub(crate) fn endgame_patzer_score(&mut self, position: &Position) -> SearchResult<f64> {
        self.nodes_visited += 1;

        if position.finished() {
            return Ok(position.final_score() as f64);
        }

        let mut scores: Vec<Score> = Vec::with_capacity(MAX_MOVES);
        let mut remaining_moves = position.valid_moves();
        while remaining_moves != 0 {
            let mv = first_square(remaining_moves);
            remaining_moves = reset_bit(remaining_moves, mv);
            let (next_position, _) = position.make_move(mv);
            scores.push(-self.endgame_alpha_beta(&next_position, -MAX_SCORE, MAX_SCORE)?);
        }
        scores.sort_unstable_by(|a, b| b.cmp(a));

        let num_moves = scores.len();
        let weight_decrease = (-PATZER_SKILL / num_moves as f64).exp();

        let mut total_weight = 0.0;
        let mut total_score = 0.0;
        let mut weight = 1.0;
        for &score in &scores {
            total_weight += weight;
            total_score += weight * score as f64;
            weight *= weight_decrease;
        }

        Ok(total_score / total_weight)
    }

    /// Reavaliação preguiçosa: para cada lance de raiz que empata ou bate o
    /// melhor resultado exato, prefere o de maior score patzer. O melhor
    /// lance atual só é avaliado se aparecer um empate.
    pub(crate) fn exploit_patzers(
        &mut self,
        position: &Position,
        moves: &mut [Move],
        deadlines: &Deadlines,
        best_score: Score,
        best_patzer_score: &mut f64,
        num_patzer_scores: &mut i32,
    ) -> SearchResult<()> {
        for move_index in 1..moves.len() {
            if Instant::now() >= deadlines.next_move {
                return Err(Timeout);
            }

            let (next_position, _) = position.make_move(moves[move_index]);

            let score = -self.endgame_alpha_beta(&next_position, -best_score, -(best_score - 1))?;

            if score >= best_score {
                if *num_patzer_scores == 0 {
                    let (best_position, _) = position.make_move(moves[0]);
                    *best_patzer_score = -self.endgame_patzer_score(&best_position)?;
                    *num_patzer_scores += 1;
                }
                let patzer_score = -self.endgame_patzer_score(&next_position)?;
                *num_patzer_scores += 1;
                if patzer_score > *best_patzer_score {
                    *best_patzer_score = patzer_score;
                    moves[..=move_index].rotate_right(1);
                }
            }
        }
        Ok(())
    }
}

fn endgame_0(position: &Position) -> Score {
    position.final_score()
}

fn endgame_1(position: &Position) -> Score {
    let mv = first_square(position.empty_squares());
    endgame_1_at(position, mv)
}

fn endgame_1_at(position: &Position, mv: Move) -> Score {
    let (next_position, _) = position.make_move(mv);
    -endgame_0(&next_position)
}

fn endgame_2(position: &Position, beta: Score) -> Score {
    let mut semivalid_moves = position.empty_squares();
    let move0 = first_square(semivalid_moves);
    semivalid_moves = reset_bit(semivalid_moves, move0);
    let move1 = first_square(semivalid_moves);
    endgame_2_at(position, beta, move0, move1)
}

fn endgame_2_at(position: &Position, beta: Score, move0: Move, move1: Move) -> Score {
    let mut score = -MAX_SCORE;

    let (pos0, move0_ok) = position.make_move(move0);
    if move0_ok {
        score = -endgame_1_at(&pos0, move1);
        if score >= beta {
            return score;
        }
    }

    let (pos1, move1_ok) = position.make_move(move1);
    if move1_ok {
        score = score.max(-endgame_1_at(&pos1, move0));
    }

    if score == -MAX_SCORE {
        // Nenhum dos dois captura: joga-se na mesma, não há passes.
        score = -endgame_1_at(&pos0, move1);
        if score >= beta {
            return score;
        }
        score = score.max(-endgame_1_at(&pos1, move0));
    }

    score
}

fn endgame_3(position: &Position, alpha: Score, beta: Score) -> Score {
    let mut semivalid_moves = position.empty_squares();
    let move0 = first_square(semivalid_moves);
    semivalid_moves = reset_bit(semivalid_moves, move0);
    let move1 = first_square(semivalid_moves);
    semivalid_moves = reset_bit(semivalid_moves, move1);
    let move2 = first_square(semivalid_moves);
    endgame_3_at(position, alpha, beta, move0, move1, move2)
}

fn endgame_3_at(
    position: &Position,
    alpha: Score,
    beta: Score,
    move0: Move,
    move1: Move,
    move2: Move,
) -> Score {
    let mut score = -MAX_SCORE;

    let (pos0, move0_ok) = position.make_move(move0);
    if move0_ok {
        score = -endgame_2_at(&pos0, -alpha, move1, move2);
        if score >= beta {
            return score;
        }
    }

    let (pos1, move1_ok) = position.make_move(move1);
    if move1_ok {
        score = score.max(-endgame_2_at(&pos1, -alpha, move0, move2));
    }

    let (pos2, move2_ok) = position.make_move(move2);
    if move2_ok {
        score = score.max(-endgame_2_at(&pos2, -alpha, move0, move1));
    }

    if score == -MAX_SCORE {
        score = -endgame_2_at(&pos0, -alpha, move1, move2);
        if score >= beta {
            return score;
        }
        score = score.max(-endgame_2_at(&pos1, -alpha, move0, move2));
        if score >= beta {
            return score;
        }
        score = score.max(-endgame_2_at(&pos2, -alpha, move0, move1));
    }

    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::players::{Player, PlaySettings};
    use std::time::{Duration, Instant};

    /// Enumeração completa de todas as ordens de lances até ao fim do jogo.
    fn enumerate_exact(position: &Position) -> Score {
        if position.finished() {
            return position.final_score();
        }
        let mut best = -MAX_SCORE;
        let mut remaining = position.valid_moves();
        while remaining != 0 {
            let mv = first_square(remaining);
            remaining = remove_first_square(remaining);
            best = best.max(-enumerate_exact(&position.make_move(mv).0));
        }
        best
    }

    /// Joga lances estáticos a partir da posição inicial até restarem
    /// `empties` casas vazias.
    fn position_with_empties(empties: i32) -> Position {
        let mut position = Position::initial();
        while NUM_SQUARES - position.move_number() > empties {
            let mv = choose_move_statically(position.valid_moves());
            position = position.make_move(mv).0;
        }
        position
    }

    #[test]
    fn test_single_empty_cell_gives_terminal_score() {
        let position = position_with_empties(1);
        assert_eq!(NUM_SQUARES - position.move_number(), 1);

        let mut engine = AlphaBetaEngine::new();
        engine.deadline = Instant::now() + Duration::from_secs(60);
        let score = engine.endgame_alpha_beta(&position, -MAX_SCORE, MAX_SCORE).unwrap();

        // Só há uma continuação possível: o valor é o do tabuleiro final.
        let mv = first_square(position.empty_squares());
        let terminal = position.make_move(mv).0;
        assert!(terminal.finished());
        assert_eq!(score, -terminal.final_score());
        assert_eq!(score, enumerate_exact(&position));
    }

    #[test]
    fn test_endgame_matches_enumeration_small() {
        for empties in 1..=3 {
            let position = position_with_empties(empties);
            let mut engine = AlphaBetaEngine::new();
            engine.deadline = Instant::now() + Duration::from_secs(60);
            assert_eq!(
                engine.endgame_alpha_beta(&position, -MAX_SCORE, MAX_SCORE).unwrap(),
                enumerate_exact(&position),
                "{} vazias\n{}",
                empties,
                position
            );
        }
    }

    #[test]
    fn test_endgame_matches_enumeration_deeper() {
        // Profundidade suficiente para exercitar TT, killers e a janela PV.
        let position = position_with_empties(8);
        let mut engine = AlphaBetaEngine::new();
        engine.deadline = Instant::now() + Duration::from_secs(600);
        assert_eq!(
            engine.endgame_alpha_beta(&position, -MAX_SCORE, MAX_SCORE).unwrap(),
            enumerate_exact(&position)
        );
    }

    #[test]
    fn test_endgame_narrow_windows_agree_with_full_window() {
        let position = position_with_empties(6);
        let exact = enumerate_exact(&position);
        for window in [
            (-MAX_SCORE, MAX_SCORE),
            (exact - 1, exact + 1),
        ] {
            let mut engine = AlphaBetaEngine::new();
            engine.deadline = Instant::now() + Duration::from_secs(60);
            let got = engine.endgame_alpha_beta(&position, window.0, window.1).unwrap();
            assert_eq!(got, exact, "janela {:?}", window);
        }
    }

    #[test]
    fn test_choose_move_solves_endgame_exactly() {
        let position = position_with_empties(9);
        let exact = enumerate_exact(&position);

        let mut engine = AlphaBetaEngine::new();
        let mut settings = PlaySettings::new(Instant::now(), Duration::from_secs(30));
        settings.use_all_resources = true;
        settings.use_book = false;
        let mv = engine.choose_move(&position, &settings);

        assert!(get_bit(position.valid_moves(), mv));
        assert_eq!(
            engine.last_move_milliscore() >> MILLISCORE_BITS,
            exact as Milliscore
        );
        // O lance escolhido realiza mesmo o valor exato.
        assert_eq!(enumerate_exact(&position.make_move(mv).0), -exact);
    }

    #[test]
    fn test_patzer_score_of_forced_position_is_exact_value() {
        // Com um único lance possível o patzer não tem com que se enganar.
        let position = position_with_empties(1);
        let mut engine = AlphaBetaEngine::new();
        engine.deadline = Instant::now() + Duration::from_secs(60);
        let exact = enumerate_exact(&position) as f64;
        assert_eq!(engine.endgame_patzer_score(&position).unwrap(), exact);
    }

    #[test]
    fn test_patzer_score_between_worst_and_best() {
        let position = position_with_empties(5);
        let mut engine = AlphaBetaEngine::new();
        engine.deadline = Instant::now() + Duration::from_secs(60);

        let patzer = engine.endgame_patzer_score(&position).unwrap();

        let mut best = -(MAX_SCORE as f64);
        let mut worst = MAX_SCORE as f64;
        let mut remaining = position.valid_moves();
        while remaining != 0 {
            let mv = first_square(remaining);
            remaining = remove_first_square(remaining);
            let s = -enumerate_exact(&position.make_move(mv).0) as f64;
            best = best.max(s);
            worst = worst.min(s);
        }
        assert!(patzer <= best + 1e-9);
        assert!(patzer >= worst - 1e-9);
    }
}
