/*!
 * IPC Types
 * Messages exchanged between green processes
 */

use crate::core::types::Pid;
use serde::{Deserialize, Serialize};

/// Message with metadata
///
/// The payload is an owned copy: ownership moves into the destination
/// mailbox on send and out to the receiver on dequeue.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Runtime-wide send order
    pub seq: u64,
    /// Sending process, `None` when enqueued from outside the runtime
    pub from: Option<Pid>,
    pub data: Vec<u8>,
}

impl Message {
    pub fn new(seq: u64, from: Option<Pid>, data: &[u8]) -> Self {
        Self {
            seq,
            from,
            data: data.to_vec(),
        }
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Hand the payload to the receiver
    pub fn into_payload(self) -> Vec<u8> {
        self.data
    }
}
