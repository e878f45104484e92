use thiserror::Error;

/// Problems found at the configuration boundary.
///
/// The simulation itself has no failure path; everything that reaches a
/// scenario has already been clamped. These errors surface only where raw
/// input (a command-line tag, a hand-built parameter struct) is checked.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    #[error("unknown {kind} `{tag}`")]
    UnknownTag { kind: &'static str, tag: String },

    #[error("{name} = {value} is outside {min}..={max}")]
    OutOfRange {
        name: &'static str,
        value: f32,
        min: f32,
        max: f32,
    },
}
