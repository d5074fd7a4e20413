// Ficheiro: src/search/alpha_beta.rs
// Descrição: Motor alpha-beta em duas fases: meio-jogo heurístico em
// milliscore com aprofundamento iterativo, janelas de aspiração, ProbCut e
// killer moves; fim de jogo exato no solver de endgame.rs.

use crate::book::find_book_move;
use crate::book::prepared::find_prepared_game;
use crate::core::*;
use crate::eval::evaluate;
use crate::players::{Player, PlaySettings};
use crate::search::hash_table::PositionHashTable;
use crate::search::probcut::*;
use crate::search::time_control::{allocate_resources, Deadlines};
use crate::utils::rounding_divide;
use log::{debug, info};
use std::time::{Duration, Instant};

/// Sinal de cancelamento cooperativo: o prazo passou, devolve-se o melhor
/// resultado conhecido até agora. Propaga-se com `?` até à fronteira da
/// iteração em curso; a iteração anterior fica intacta.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Timeout;

pub(crate) type SearchResult<T> = Result<T, Timeout>;

#[cfg(not(test))]
const TRANSPOSITION_TABLE_BUCKETS: usize = 1 << 22;
// Nos testes chega uma tabela pequena; acima do limite a cache só falha
// suavemente mais cedo, sem mudar nenhum resultado.
#[cfg(test)]
const TRANSPOSITION_TABLE_BUCKETS: usize = 1 << 16;

const MAX_EVAL_MOVE_NUMBER: i32 = 58;
pub(crate) const MIN_TT_DEPTH: i32 = 2;
pub(crate) const ENDGAME_MIN_TT_DEPTH: i32 = 4;

// Em unidades de score / 1024.
const ASPIRATION_WIDTH: Milliscore = 200 << (MILLISCORE_BITS - 10);
const ENDGAME_ASPIRATION_WIDTH: Score = 1;

const MIN_PV_DEPTH: i32 = 3;
pub(crate) const ENDGAME_MIN_PV_DEPTH: i32 = 4;

// Probabilidade do pior lance = probabilidade do melhor * exp(-PATZER_SKILL).
pub(crate) const PATZER_SKILL: f64 = 1.0;

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum EntryType {
    Exact,
    LowerBound,
    UpperBound,
}

/// Entrada da tabela de transposição, em milliscore partilhado pelas duas
/// fases. `probcut_allowed` regista se o valor usou cortes ProbCut: essas
/// entradas não podem produzir cortes em sondagens que os proíbem.
#[derive(Clone, Copy, Debug)]
pub(crate) struct TranspositionTableEntry {
    pub(crate) depth: i32,
    pub(crate) score: Milliscore,
    pub(crate) entry_type: EntryType,
    pub(crate) mv: Move,
    pub(crate) probcut_allowed: bool,
}

impl Default for TranspositionTableEntry {
    fn default() -> TranspositionTableEntry {
        TranspositionTableEntry {
            depth: 0,
            score: 0,
            entry_type: EntryType::Exact,
            mv: INVALID_MOVE,
            probcut_allowed: false,
        }
    }
}

/// O motor principal. Cada instância é estritamente sequencial e dona das
/// suas tabelas; instâncias independentes podem correr em threads separadas
/// sem partilhar nada.
pub struct AlphaBetaEngine {
    pub(crate) transposition_table: PositionHashTable<TranspositionTableEntry>,
    pub(crate) killer_moves: [Move; NUM_SQUARES as usize],
    pub(crate) deadline: Instant,
    pub(crate) nodes_visited: i64,
    last_move_milliscore: Milliscore,
    moves_so_far: [Move; NUM_SQUARES as usize],
}

impl AlphaBetaEngine {
    pub fn new() -> AlphaBetaEngine {
        AlphaBetaEngine {
            transposition_table: PositionHashTable::new(TRANSPOSITION_TABLE_BUCKETS),
            killer_moves: [INVALID_MOVE; NUM_SQUARES as usize],
            deadline: Instant::now(),
            nodes_visited: 0,
            last_move_milliscore: 0,
            moves_so_far: [INVALID_MOVE; NUM_SQUARES as usize],
        }
    }

    /// Milliscore do último `choose_move` (zero para respostas de livro).
    pub fn last_move_milliscore(&self) -> Milliscore {
        self.last_move_milliscore
    }

    /// Pesquisa de valor com exatidão preservada: ProbCut desligado e sem
    /// prazo efetivo. Perto do fim do jogo redireciona para o solver exato.
    pub fn evaluate_depth(&mut self, position: &Position, depth: i32) -> SearchResult<Milliscore> {
        self.deadline = Instant::now() + Duration::from_secs(3600);
        if position.move_number() + depth >= NUM_SQUARES {
            let score = self.endgame_alpha_beta(position, -MAX_SCORE, MAX_SCORE)?;
            Ok((score as Milliscore) << MILLISCORE_BITS)
        } else {
            self.alpha_beta(position, depth, -MAX_MILLISCORE, MAX_MILLISCORE, false)
        }
    }

    /// Ordena os lances de raiz por uma antevisão de um meio-lance: score
    /// final exato se o lance termina o jogo, senão o avaliador negado.
    fn order_root_moves(&self, position: &Position) -> (Vec<Move>, Milliscore) {
        let mut move_scores: Vec<(Move, Milliscore)> = Vec::with_capacity(MAX_MOVES);
        let mut remaining_moves = position.valid_moves();
        while remaining_moves != 0 {
            let mv = first_square(remaining_moves);
            remaining_moves = reset_bit(remaining_moves, mv);
            let (next_position, _) = position.make_move(mv);
            let score = if next_position.finished() {
                -((next_position.final_score() as Milliscore) << MILLISCORE_BITS)
            } else {
                -evaluate(&next_position)
            };
            move_scores.push((mv, score));
        }
        move_scores.sort_by(|a, b| b.1.cmp(&a.1));

        let moves = move_scores.iter().map(|&(mv, _)| mv).collect();
        (moves, move_scores[0].1)
    }

    /// Primeiro lance de raiz: janela de aspiração centrada no melhor score
    /// anterior, realargada até o valor cair dentro dela.
    fn search_first_root_move(
        &mut self,
        position: &Position,
        mv: Move,
        depth: i32,
        aspiration_alpha: Milliscore,
        aspiration_beta: Milliscore,
    ) -> SearchResult<Milliscore> {
        let (next_position, _) = position.make_move(mv);

        let mut alpha = aspiration_alpha;
        let mut beta = aspiration_beta;
        loop {
            let score = -self.alpha_beta(&next_position, depth - 1, -beta, -alpha, true)?;
            if score <= alpha {
                alpha = -MAX_MILLISCORE;
            } else if score >= beta {
                beta = MAX_MILLISCORE;
            } else {
                return Ok(score);
            }
        }
    }

    /// Restantes lances de raiz: sonda de janela nula contra o melhor atual;
    /// só se a sonda não falhar por baixo é que se repete com janela a sério.
    /// Um lance que melhora roda para a frente da ordenação.
    fn search_other_root_moves(
        &mut self,
        position: &Position,
        moves: &mut [Move],
        depth: i32,
        deadlines: &Deadlines,
        best_milliscore: &mut Milliscore,
        aspiration_beta: Milliscore,
    ) -> SearchResult<()> {
        for move_index in 1..moves.len() {
            if Instant::now() >= deadlines.next_move {
                return Err(Timeout);
            }

            let (next_position, _) = position.make_move(moves[move_index]);

            let mut beta = *best_milliscore + 1;
            let score = loop {
                let score =
                    -self.alpha_beta(&next_position, depth - 1, -beta, -*best_milliscore, true)?;
                if score < beta {
                    break score;
                }
                beta = if score < aspiration_beta {
                    aspiration_beta
                } else {
                    MAX_MILLISCORE
                };
            };

            if score > *best_milliscore {
                *best_milliscore = score;
                moves[..=move_index].rotate_right(1);
            }
        }
        Ok(())
    }

    /// Nó negamax do meio-jogo, fail-soft. A recursão devolve `Err(Timeout)`
    /// quando o prazo interno passa; posições visitadas depois do
    /// cancelamento nunca chegam a ser escritas na TT.
    pub(crate) fn alpha_beta(
        &mut self,
        position: &Position,
        depth: i32,
        alpha: Milliscore,
        beta: Milliscore,
        probcut_allowed: bool,
    ) -> SearchResult<Milliscore> {
        self.nodes_visited += 1;

        if depth == 0 {
            return Ok(evaluate(position));
        }

        if Instant::now() >= self.deadline {
            return Err(Timeout);
        }

        let move_number = position.move_number();

        let mut tt_entry: Option<TranspositionTableEntry> = None;
        if depth >= MIN_TT_DEPTH {
            tt_entry = self.transposition_table.find(position).copied();

            if let Some(entry) = tt_entry {
                // Um corte exige profundidade suficiente, segurança ProbCut
                // igual ou melhor que a pedida, e tipo compatível com a janela.
                if entry.depth >= depth
                    && entry.probcut_allowed <= probcut_allowed
                    && (entry.entry_type == EntryType::Exact
                        || (entry.entry_type == EntryType::LowerBound && entry.score >= beta)
                        || (entry.entry_type == EntryType::UpperBound && entry.score <= alpha))
                {
                    return Ok(entry.score);
                }
            }
        }

        // ProbCut: uma pesquisa rasa calibrada pode limitar esta profundidade
        // sem a completar. Estatisticamente sólido, teoricamente não.
        if probcut_allowed && depth >= MIN_PROBCUT_DEPTH && depth <= MAX_PROBCUT_DEPTH {
            let probcut_info = &PROB_CUT_INFO_SHORT[move_number as usize][depth as usize];
            if probcut_info.shallow_depth != -1 {
                let probcut_beta_d =
                    beta as f64 + probcut_info.offset + probcut_info.stddev * PROBCUT_STDDEVS;
                if probcut_beta_d > (-MAX_MILLISCORE + 2) as f64
                    && probcut_beta_d < (MAX_MILLISCORE - 2) as f64
                {
                    let probcut_beta = probcut_beta_d.round() as Milliscore;
                    if self.alpha_beta(
                        position,
                        probcut_info.shallow_depth,
                        probcut_beta - 1,
                        probcut_beta,
                        false,
                    )? >= probcut_beta
                    {
                        return Ok(beta);
                    }
                }

                let probcut_alpha_d =
                    alpha as f64 + probcut_info.offset - probcut_info.stddev * PROBCUT_STDDEVS;
                if probcut_alpha_d > (-MAX_MILLISCORE + 2) as f64
                    && probcut_alpha_d < (MAX_MILLISCORE - 2) as f64
                {
                    let probcut_alpha = probcut_alpha_d.round() as Milliscore;
                    if self.alpha_beta(
                        position,
                        probcut_info.shallow_depth,
                        probcut_alpha,
                        probcut_alpha + 1,
                        false,
                    )? <= probcut_alpha
                    {
                        return Ok(alpha);
                    }
                }
            }
        }

        let mut best_score = -MAX_MILLISCORE;
        let mut best_move = INVALID_MOVE;
        let mut remaining_moves = position.valid_moves();

        while remaining_moves != 0 {
            // Ordenação: lance da TT, depois killer desta jogada, depois a
            // heurística estática (cantos primeiro).
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
            let limit = if depth >= MIN_PV_DEPTH {
                to_beat + 1
            } else {
                beta
            };
            let mut score =
                -self.alpha_beta(&next_position, depth - 1, -limit, -to_beat, probcut_allowed)?;

            if score >= limit && score < beta {
                score =
                    -self.alpha_beta(&next_position, depth - 1, -beta, -to_beat, probcut_allowed)?;
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

        if depth >= MIN_TT_DEPTH {
            // A inserção pode falhar suavemente com a tabela cheia; nesse
            // caso o resultado simplesmente não fica em cache. Só resultados
            // de profundidade igual ou maior substituem uma entrada.
            let (entry, _inserted) = self.transposition_table.insert(position);
            if let Some(entry) = entry {
                if depth >= entry.depth {
                    entry.depth = depth;
                    entry.probcut_allowed = probcut_allowed;
                    entry.score = best_score;
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
}

impl Default for AlphaBetaEngine {
    fn default() -> AlphaBetaEngine {
        AlphaBetaEngine::new()
    }
}

impl Player for AlphaBetaEngine {
    fn choose_move(&mut self, position: &Position, settings: &PlaySettings) -> Move {
        let move_number = position.move_number();
        info!("Lance {}:", move_number);

        if settings.use_book {
            let book_move = find_book_move(position);
            if book_move != INVALID_MOVE {
                info!("Lance do livro: {}", move_to_string(book_move));
                self.last_move_milliscore = 0;
                self.moves_so_far[move_number as usize] = book_move;
                return book_move;
            }

            let prepared_move = find_prepared_game(move_number, &self.moves_so_far);
            if prepared_move != INVALID_MOVE {
                info!("Lance preparado: {}", move_to_string(prepared_move));
                self.last_move_milliscore = 0;
                self.moves_so_far[move_number as usize] = prepared_move;
                return prepared_move;
            }
        }

        let deadlines = allocate_resources(position, settings);
        self.nodes_visited = 0;

        let (mut moves, mut best_milliscore) = self.order_root_moves(position);

        if settings.quick_if_single_move && moves.len() == 1 {
            info!("Lance único");
            self.last_move_milliscore = 0;
            self.moves_so_far[move_number as usize] = moves[0];
            return moves[0];
        }

        'search: {
            // Aprofundamento iterativo do meio-jogo.
            for depth in 2..=(MAX_EVAL_MOVE_NUMBER - move_number) {
                if Instant::now() >= deadlines.go_deeper {
                    info!(
                        "profundidade={} score={:.6}",
                        depth - 1,
                        milliscore_to_f64(best_milliscore)
                    );
                    break 'search;
                }

                let aspiration_alpha = best_milliscore - ASPIRATION_WIDTH;
                let aspiration_beta = best_milliscore + ASPIRATION_WIDTH;

                self.deadline = deadlines.drop_work;
                match self.search_first_root_move(
                    position,
                    moves[0],
                    depth,
                    aspiration_alpha,
                    aspiration_beta,
                ) {
                    Ok(score) => best_milliscore = score,
                    Err(Timeout) => {
                        info!(
                            "profundidade={} (desiste da próxima) score={:.6}",
                            depth - 1,
                            milliscore_to_f64(best_milliscore)
                        );
                        break 'search;
                    }
                }

                self.deadline = deadlines.drop_work;
                match self.search_other_root_moves(
                    position,
                    &mut moves,
                    depth,
                    &deadlines,
                    &mut best_milliscore,
                    aspiration_beta,
                ) {
                    Ok(()) => debug!(
                        "  profundidade={} lance={} score={:.6} tempo={:.3}",
                        depth,
                        move_to_string(moves[0]),
                        milliscore_to_f64(best_milliscore),
                        settings.start_time.elapsed().as_secs_f64()
                    ),
                    Err(Timeout) => {
                        info!(
                            "profundidade={} (parcial) score={:.6}",
                            depth,
                            milliscore_to_f64(best_milliscore)
                        );
                        break 'search;
                    }
                }
            }

            if Instant::now() >= deadlines.go_deeper {
                info!("pré-endgame score={:.6}", milliscore_to_f64(best_milliscore));
                break 'search;
            }

            // Fim de jogo exato: mesma estrutura, em score inteiro.
            let mut best_score =
                rounding_divide(best_milliscore as i64, 1 << MILLISCORE_BITS) as Score;
            let endgame_aspiration_alpha = best_score - ENDGAME_ASPIRATION_WIDTH;
            let endgame_aspiration_beta = best_score + ENDGAME_ASPIRATION_WIDTH;

            self.deadline = deadlines.drop_work;
            match self.search_first_endgame_move(
                position,
                moves[0],
                endgame_aspiration_alpha,
                endgame_aspiration_beta,
            ) {
                Ok(score) => {
                    best_score = score;
                    best_milliscore = (best_score as Milliscore) << MILLISCORE_BITS;
                }
                Err(Timeout) => {
                    info!(
                        "pré-endgame (desiste) score={:.6}",
                        milliscore_to_f64(best_milliscore)
                    );
                    break 'search;
                }
            }

            self.deadline = deadlines.drop_work;
            match self.search_other_endgame_moves(
                position,
                &mut moves,
                &deadlines,
                &mut best_score,
                endgame_aspiration_beta,
            ) {
                Ok(()) => {
                    best_milliscore = (best_score as Milliscore) << MILLISCORE_BITS;
                    debug!(
                        "  endgame score={} tempo={:.3}",
                        best_score,
                        settings.start_time.elapsed().as_secs_f64()
                    );
                }
                Err(Timeout) => {
                    best_milliscore = (best_score as Milliscore) << MILLISCORE_BITS;
                    info!("endgame (parcial) score={}", best_score);
                    break 'search;
                }
            }

            if Instant::now() >= deadlines.go_deeper {
                info!("endgame score={}", best_score);
                break 'search;
            }

            // Entre lances igualmente ótimos, prefere o que mais baralha um
            // adversário falível.
            let mut best_patzer_score = best_score as f64;
            let mut num_patzer_scores = 0;
            self.deadline = deadlines.drop_work;
            match self.exploit_patzers(
                position,
                &mut moves,
                &deadlines,
                best_score,
                &mut best_patzer_score,
                &mut num_patzer_scores,
            ) {
                Ok(()) => {
                    if num_patzer_scores >= 1 {
                        info!(
                            "endgame score={} patzer={:.6} equivalentes={}",
                            best_score, best_patzer_score, num_patzer_scores
                        );
                    } else {
                        info!("endgame score={} único", best_score);
                    }
                }
                Err(Timeout) => {
                    if num_patzer_scores >= 1 {
                        info!(
                            "endgame score={} patzer(parcial)={:.6} equivalentes(parcial)={}",
                            best_score, best_patzer_score, num_patzer_scores
                        );
                    } else {
                        info!("endgame score={} desiste do patzer", best_score);
                    }
                }
            }
        }

        let time_used_seconds = settings.start_time.elapsed().as_secs_f64();
        info!(
            "lance={} tempo={:.3} knps={:.0} tt={}k{}/{}k",
            move_to_string(moves[0]),
            time_used_seconds,
            0.001 * self.nodes_visited as f64 / time_used_seconds,
            self.transposition_table.size() >> 10,
            if self.transposition_table.out_of_memory() {
                "-OOM!"
            } else {
                ""
            },
            self.transposition_table.capacity() >> 10,
        );

        self.last_move_milliscore = best_milliscore;
        self.moves_so_far[move_number as usize] = moves[0];
        moves[0]
    }

    fn opponent_move(&mut self, position: &Position, mv: Move) {
        self.moves_so_far[position.move_number() as usize] = mv;
    }
}

/// Desempate estático da ordenação: capturas de canto primeiro.
pub(crate) fn choose_move_statically(move_options: Bitboard) -> Move {
    let corner_options = move_options & CORNERS;
    if corner_options != 0 {
        return first_square(corner_options);
    }
    first_square(move_options)
}
