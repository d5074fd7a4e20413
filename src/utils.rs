// Pequenos utilitários aritméticos.

/// Divisão inteira com arredondamento ao mais próximo (desempate para longe
/// de zero), válida para `a` de qualquer sinal e `b > 0`.
pub fn rounding_divide(a: i64, b: i64) -> i64 {
    (2 * a + if a >= 0 { b } else { -b }) / (2 * b)
}
