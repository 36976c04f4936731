#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use vc_json_adapter as adapter;
pub use vc_json_stream as stream;
pub use vc_json_utils as utils;

pub use vc_json_adapter::{Engine, EngineBuilder, EngineConfig, Error, Result};
