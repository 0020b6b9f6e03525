//! Character and byte codecs: UTF-8/16/32 decoding with encoding detection, and the base64 /
//! base16 encodings used for byte strings in JSON.

pub mod base;
mod reader;
pub mod utf8;

pub use base::ByteEncoding;
pub use reader::{CharacterInput, CharacterReader, StrInput, TextEncoding};
