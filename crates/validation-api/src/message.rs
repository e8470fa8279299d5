//! Sequenced message types as handed out by the transaction streamer.

use alloy_primitives::{Address, Bytes, B256, U256};
use serde::{Deserialize, Serialize};

/// Message kind discriminators carried in the inbox message header.
pub const L2_MESSAGE_KIND: u8 = 3;
pub const END_OF_BLOCK_KIND: u8 = 6;
pub const SUBMIT_RETRYABLE_KIND: u8 = 9;
pub const INITIALIZE_KIND: u8 = 11;
pub const ETH_DEPOSIT_KIND: u8 = 12;
pub const BATCH_POSTING_REPORT_KIND: u8 = 13;

/// Header of a message entering the layer-2 inbox.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct MessageHeader {
    pub kind: u8,
    pub block_number: u64,
    pub timestamp: u64,
}

/// A message entering the layer-2 inbox, header plus opaque payload.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct L1IncomingMessage {
    pub header: MessageHeader,
    pub l2_msg: Bytes,
}

/// Fields of a batch posting report payload.
///
/// Layout: 8-byte big-endian timestamp, 20-byte poster address, 32-byte batch
/// data hash, 8-byte big-endian batch number, 32-byte L1 base fee.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct BatchPostingReport {
    pub timestamp: u64,
    pub poster: Address,
    pub data_hash: B256,
    pub batch_number: u64,
    pub l1_base_fee: U256,
}

const BATCH_POSTING_REPORT_LEN: usize = 8 + 20 + 32 + 8 + 32;

impl BatchPostingReport {
    /// Parses a batch posting report payload.
    pub fn parse(data: &[u8]) -> eyre::Result<Self> {
        if data.len() < BATCH_POSTING_REPORT_LEN {
            eyre::bail!(
                "batch posting report too short: {} < {BATCH_POSTING_REPORT_LEN}",
                data.len()
            );
        }
        let timestamp = u64::from_be_bytes(data[0..8].try_into().expect("sliced"));
        let poster = Address::from_slice(&data[8..28]);
        let data_hash = B256::from_slice(&data[28..60]);
        let batch_number = u64::from_be_bytes(data[60..68].try_into().expect("sliced"));
        let l1_base_fee = U256::from_be_slice(&data[68..100]);
        Ok(Self {
            timestamp,
            poster,
            data_hash,
            batch_number,
            l1_base_fee,
        })
    }

    /// Encodes the report back into its payload form.
    pub fn encode(&self) -> Bytes {
        let mut out = Vec::with_capacity(BATCH_POSTING_REPORT_LEN);
        out.extend_from_slice(&self.timestamp.to_be_bytes());
        out.extend_from_slice(self.poster.as_slice());
        out.extend_from_slice(self.data_hash.as_slice());
        out.extend_from_slice(&self.batch_number.to_be_bytes());
        out.extend_from_slice(&self.l1_base_fee.to_be_bytes::<32>());
        out.into()
    }
}

impl L1IncomingMessage {
    /// Batch numbers whose posted payloads the message's execution reads back.
    ///
    /// Batch posting reports re-hash the posted batch they report on, so
    /// re-execution needs that batch's payload available.
    pub fn past_batches_required(&self) -> eyre::Result<Vec<u64>> {
        if self.header.kind != BATCH_POSTING_REPORT_KIND {
            return Ok(Vec::new());
        }
        let report = BatchPostingReport::parse(&self.l2_msg)?;
        Ok(vec![report.batch_number])
    }
}

/// A sequenced message together with its delayed-message accounting.
#[derive(Clone, Debug, Default, Eq, PartialEq, Deserialize, Serialize)]
pub struct MessageWithMetadata {
    pub message: L1IncomingMessage,
    /// Total number of delayed messages consumed after this message.
    pub delayed_messages_read: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn report() -> BatchPostingReport {
        BatchPostingReport {
            timestamp: 1_700_000_000,
            poster: Address::repeat_byte(0xaa),
            data_hash: B256::repeat_byte(0xbb),
            batch_number: 42,
            l1_base_fee: U256::from(30_000_000_000u64),
        }
    }

    #[test]
    fn batch_posting_report_roundtrip() {
        let r = report();
        let parsed = BatchPostingReport::parse(&r.encode()).unwrap();
        assert_eq!(parsed, r);
    }

    #[test]
    fn posting_report_requires_reported_batch() {
        let msg = L1IncomingMessage {
            header: MessageHeader {
                kind: BATCH_POSTING_REPORT_KIND,
                ..Default::default()
            },
            l2_msg: report().encode(),
        };
        assert_eq!(msg.past_batches_required().unwrap(), vec![42]);
    }

    #[test]
    fn ordinary_message_requires_no_batches() {
        let msg = L1IncomingMessage {
            header: MessageHeader {
                kind: L2_MESSAGE_KIND,
                ..Default::default()
            },
            l2_msg: Bytes::from_static(b"payload"),
        };
        assert!(msg.past_batches_required().unwrap().is_empty());
    }

    #[test]
    fn truncated_posting_report_errors() {
        let msg = L1IncomingMessage {
            header: MessageHeader {
                kind: BATCH_POSTING_REPORT_KIND,
                ..Default::default()
            },
            l2_msg: Bytes::from_static(b"short"),
        };
        assert!(msg.past_batches_required().is_err());
    }
}
