//! C API の関数が返すエラーコードを定義するためのモジュール

#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmsgId3Error {
    Ok = 0,
    InvalidInput,
    NullPointer,
}
