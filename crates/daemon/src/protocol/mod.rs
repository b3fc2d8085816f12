// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! IPC protocol for daemon communication.
//!
//! Wire format: 4-byte length prefix (big-endian) + JSON payload

mod request;
mod response;
mod wire;

pub use request::Request;
pub use response::{ErrorKind, JobStatusEntry, Response};
pub use wire::{
    decode, encode, read_message, read_request, write_message, write_response, ProtocolError,
    MAX_MESSAGE_SIZE,
};
