//! Inbound commands to the dispatcher.
//!
//! These represent the operator / supervisor requests that the
//! [`Dispatcher`](super::dispatcher::Dispatcher) interprets.

use crate::error::Error;

/// One-line usage guidance printed for missing or unknown commands.
pub const USAGE: &str = "usage: rover_control {start|stop|status} [-p <pulse_us>]";

/// Commands accepted by the dispatch entry point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Spawn the actuation worker; trailing params are forwarded to it.
    Start { params: Vec<String> },

    /// Drive every channel to neutral and disarm, from the caller's context.
    Stop,

    /// Report the worker's run state.
    Status,
}

impl Command {
    /// Interpret the arguments following the program name.
    ///
    /// Extra arguments after `stop` or `status` are ignored.
    pub fn parse<S: AsRef<str>>(args: &[S]) -> Result<Self, Error> {
        let Some((word, rest)) = args.split_first() else {
            return Err(Error::Usage("missing command"));
        };

        match word.as_ref() {
            "start" => Ok(Self::Start {
                params: rest.iter().map(|s| s.as_ref().to_owned()).collect(),
            }),
            "stop" => Ok(Self::Stop),
            "status" => Ok(Self::Status),
            _ => Err(Error::Usage("unrecognized command")),
        }
    }
}
