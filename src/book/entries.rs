// Ficheiro: src/book/entries.rs
// Livro de aberturas gerado offline pelo construtor de livro a partir das
// primeiras jogadas; cada entrada é a posição normalizada codificada seguida
// do lance de resposta. Ordenado lexicograficamente. Não editar à mão.

pub static BOOK_ENTRIES: [&str; 63] = [
    "JSbc/ijk/A",
    "S/bcjkl/t",
    "S/bcjkt/2",
    "STbcj/Jk/A",
    "SVj/Jbck/A",
    "Sb/acjkl/Z",
    "Sbc/Tjkl/K",
    "Sdj/Jbck/A",
    "T/Ubcijk/r",
    "TUbcj/Mk/F",
    "Tb/Ucjkq/N",
    "Tb/cdijk/e",
    "Tb/cdjkq/e",
    "Tbc/ijk/p",
    "Tbcj/Udk/M",
    "Tbcjk/St/R",
    "Tbcjk/Us/N",
    "Tbdj/Wck/l",
    "Tbdj/cek/l",
    "Tcj/Sbk/R",
    "Tcj/Sbkt/R",
    "Tcj/abdk/Z",
    "UVcj/Nbk/F",
    "UVj/Mbck/s",
    "Ub/Vcjkl/s",
    "Ub/Vcjks/0",
    "Vb/Scijk/q",
    "Vb/Scjkq/x",
    "Vbcj/SUk/J",
    "Vbcj/Sdk/l",
    "Vbj/Sck/J",
    "Vbj/Sckt/2",
    "Vbj/acdk/e",
    "Vbj/ack/R",
    "Vbjk/Scs/U",
    "Vcj/Ubk/T",
    "Vj/Sabck/R",
    "Vj/Ubcdk/T",
    "abc/ijk/q",
    "ac/Sbjkr/s",
    "ac/Tbijk/q",
    "ac/Vbjkl/s",
    "ac/Vbjkt/s",
    "b/Vcdjkl/e",
    "b/cjkl/d",
    "b/cjkt2/-",
    "bc/Raijk/p",
    "bc/Rajkr/z",
    "bc/Sjkqx/4",
    "bc/Sjkry/z",
    "bc/Sjkrz/7",
    "bcdj/SUk/J",
    "bcdj/aks/0",
    "bcdj/iks/0",
    "bci/Sjkt/l",
    "bcik/Tjt/K",
    "bcj/Sk/J",
    "ci/bjklt/m",
    "cj/AJSbk/T",
    "cj/JSbkt/T",
    "cj/LSTbk/D",
    "cj/UVWbk/M",
    "cj/bk/T",
];
