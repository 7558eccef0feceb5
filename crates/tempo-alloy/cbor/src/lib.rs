#![doc = include_str!("../README.md")]
#![cfg_attr(not(test), warn(unused_crate_dependencies))]
#![cfg_attr(docsrs, feature(doc_cfg, doc_auto_cfg))]

pub mod cursor;
pub use cursor::{Cursor, CursorError};

mod error;
pub use error::CborError;

mod major;

mod value;
pub use value::CborValue;

pub mod encode;
pub use encode::{encode, encode_hex};

pub mod decode;
pub use decode::{MAX_NESTING_DEPTH, decode, decode_hex};

pub mod cose;
pub use cose::{CoseEc2Key, CoseKeyError};
