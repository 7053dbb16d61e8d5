//! # PoolDecode Report
//!
//! Decoder adapter and deterministic result reports for pooled-sample tests.
//!
//! ## Module layout
//!
//! | Module     | Contents                                                     |
//! |------------|--------------------------------------------------------------|
//! | `decoder`  | [`Decoder`] contract, [`DecoderAdapter`], partition check    |
//! | `compose`  | [`compose`]: tri-state classification → report text          |
//! | `config`   | [`DecodeConfig`] (TOML), estimates policy                    |
//! | `pipeline` | [`TestResults`]: registry → decoder → report                 |

pub mod compose;
pub mod config;
pub mod decoder;
pub mod pipeline;

pub use compose::{compose, compose_result, format_estimate};
pub use config::{COMP_ALGORITHM, ConfigError, DecodeConfig, ReportConfigFile};
pub use decoder::{ClassificationResult, DecodeError, Decoder, DecoderAdapter, PartitionError};
pub use pipeline::{RunError, TestOutcome, TestResults};
