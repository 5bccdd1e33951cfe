//! Program generation: turn each atomic node's port configuration into an
//! executable [`NodeProgram`].
//!
//! The declarative kinds (CONTEXT, HTTP, ROUTE, DATA_MAPPING) compile to
//! tagged variants interpreted by the runtime; only CONVERT and END nodes
//! carry genuinely free-form script bodies, which are assembled into a
//! `main(task)` JavaScript source and executed in the sandbox.

mod generator;
mod program;

pub use generator::{generate_programs, GeneratedNode};
pub use program::{
    decode_artifact, encode_artifact, GuardLiteral, HttpCall, NodeProgram, RouteBranch, RouteGuard,
    RouteTable, ScriptBody, DATETIME_FORMAT,
};
