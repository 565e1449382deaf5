//! JSON-RPC 2.0 over newline-delimited STDIO.
//!
//! **Framing** (`framing`): incremental line splitter, independent of I/O.
//!
//! **Protocol** (`protocol`): request/response types, error codes and the
//! typed per-method calls.
//!
//! **Server** (`server`): maps calls onto the table operations.
//!
//! **Transport** (`stdio`): the read loop tying stdin, the server and stdout
//! together. Nothing but JSON-RPC frames is ever written to the output stream.

pub mod framing;
pub mod protocol;
pub mod server;
pub mod stdio;

pub use server::McpServer;
pub use stdio::serve;
