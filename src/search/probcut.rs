// Estatísticas ProbCut: correlação empírica entre pesquisas rasas e fundas.

/// Janela de profundidades em que o corte estatístico se aplica.
pub const MIN_PROBCUT_DEPTH: i32 = 2;
pub const MAX_PROBCUT_DEPTH: i32 = 8;

/// Número de desvios-padrão exigidos para cortar sem completar a pesquisa.
pub const PROBCUT_STDDEVS: f64 = 1.3;

/// Para um par (número de jogada, profundidade funda): a profundidade rasa a
/// usar (-1 desativa o corte) e o ajuste (offset, stddev) em milliscore,
/// ajustado offline sobre pares de pesquisas (rasa - funda).
#[derive(Clone, Copy, Debug)]
pub struct ProbCutInfo {
    pub shallow_depth: i32,
    pub offset: f64,
    pub stddev: f64,
}

pub use super::probcut_tables::PROB_CUT_INFO_SHORT;
