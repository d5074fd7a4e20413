// Ficheiro: src/search/hash_table.rs
// Descrição: Hash incremental da posição e tabela associativa de endereçamento
// aberto com capacidade fixa e limite ajustável.

use crate::core::*;
use lazy_static::lazy_static;
use rand::rngs::OsRng;
use rand::RngCore;

pub type Hash = u32;

// Uma tabela de 256 valores por fatia de byte de cada bitboard, construída
// por XOR de 8 palavras independentes (uma por bit), ao estilo Zobrist.
struct HashKeys {
    player_rows: [[Hash; 256]; 8],
    opponent_rows: [[Hash; 256]; 8],
}

fn init_hash_row(row: &mut [Hash; 256]) {
    row[0] = 0;
    let mut p = 1usize;
    while p < 256 {
        let h = OsRng.next_u32();
        for q in 0..p {
            row[p | q] = row[q] ^ h;
        }
        p <<= 1;
    }
}

impl HashKeys {
    fn new() -> HashKeys {
        let mut keys = HashKeys {
            player_rows: [[0; 256]; 8],
            opponent_rows: [[0; 256]; 8],
        };
        for row in 0..8 {
            init_hash_row(&mut keys.player_rows[row]);
            init_hash_row(&mut keys.opponent_rows[row]);
        }
        keys
    }
}

lazy_static! {
    // Inicializado uma vez por processo a partir de entropia do sistema;
    // imutável depois disso e partilhado por todas as instâncias.
    static ref HASH_KEYS: HashKeys = HashKeys::new();
}

pub fn hash_position(position: &Position) -> Hash {
    let p = position.player.to_le_bytes();
    let q = position.opponent.to_le_bytes();

    let mut h = 0;
    for row in 0..8 {
        h ^= HASH_KEYS.player_rows[row][p[row] as usize];
    }
    for row in 0..8 {
        h ^= HASH_KEYS.opponent_rows[row][q[row] as usize];
    }
    h
}

/// Cache associativa Position -> V com sondagem linear sobre um array de
/// buckets potência de dois. A capacidade dura reserva 1/16 dos buckets para
/// a sondagem terminar; o limite (ajustável em runtime) faz os inserts acima
/// dele falharem de forma suave, marcando `out_of_memory`. Nunca há rehash
/// nem despejo: a tabela é um recurso limitado durante a vida do motor.
pub struct PositionHashTable<V> {
    mask: usize,
    capacity: usize,
    size: usize,
    limit: usize,
    out_of_memory: bool,
    entries: Vec<Option<(Position, V)>>,
}

impl<V> PositionHashTable<V> {
    pub fn new(buckets: usize) -> PositionHashTable<V> {
        assert!(buckets >= 16 && buckets <= u32::MAX as usize && buckets.is_power_of_two());

        let capacity = buckets / 16 * 15;
        let mut entries = Vec::new();
        entries.resize_with(buckets, || None);

        log::debug!(
            "PositionHashTable com {:.2} MB",
            (buckets * std::mem::size_of::<Option<(Position, V)>>()) as f64 / (1 << 20) as f64
        );

        PositionHashTable {
            mask: buckets - 1,
            capacity,
            size: 0,
            limit: capacity,
            out_of_memory: false,
            entries,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    /// Ajusta a região utilizável (para orçamentar memória contra o tempo de
    /// reflexão restante) e limpa a flag de falta de memória.
    pub fn set_limit(&mut self, limit: usize) {
        assert!(limit <= self.capacity);
        self.limit = limit;
        self.out_of_memory = false;
    }

    pub fn out_of_memory(&self) -> bool {
        self.out_of_memory
    }

    pub fn find(&self, position: &Position) -> Option<&V> {
        let mut pos = hash_position(position) as usize & self.mask;
        loop {
            let (key, value) = self.entries[pos].as_ref()?;
            if key == position {
                return Some(value);
            }
            pos = (pos + 1) & self.mask;
        }
    }

    pub fn find_mut(&mut self, position: &Position) -> Option<&mut V> {
        let slot = self.probe(position)?;
        self.entries[slot].as_mut().map(|(_, v)| v)
    }

    /// Insere com o valor de `make()` se a chave não existir. Se já existir,
    /// devolve o valor guardado sem o alterar. Acima do limite a inserção
    /// falha suavemente: devolve `(None, false)` e marca `out_of_memory`;
    /// quem chama trata isso como um miss.
    pub fn insert_with<F: FnOnce() -> V>(
        &mut self,
        position: &Position,
        make: F,
    ) -> (Option<&mut V>, bool) {
        let mut pos = hash_position(position) as usize & self.mask;
        let (slot, fresh) = loop {
            match &self.entries[pos] {
                None => {
                    if self.size >= self.limit {
                        self.out_of_memory = true;
                        return (None, false);
                    }
                    break (pos, true);
                }
                Some((key, _)) if key == position => break (pos, false),
                _ => pos = (pos + 1) & self.mask,
            }
        };
        if fresh {
            self.entries[slot] = Some((*position, make()));
            self.size += 1;
        }
        (self.entries[slot].as_mut().map(|(_, v)| v), fresh)
    }

    pub fn insert(&mut self, position: &Position) -> (Option<&mut V>, bool)
    where
        V: Default,
    {
        self.insert_with(position, V::default)
    }

    fn probe(&self, position: &Position) -> Option<usize> {
        let mut pos = hash_position(position) as usize & self.mask;
        loop {
            let (key, _) = self.entries[pos].as_ref()?;
            if key == position {
                return Some(pos);
            }
            pos = (pos + 1) & self.mask;
        }
    }
}
