//! tokengate server: the `info`, `login` and `verifyLoginToken` API
//! handlers, and the command line that drives them.

pub mod api;
pub mod cli;
pub mod dispatch;
pub mod telemetry;
