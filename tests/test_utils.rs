#![allow(dead_code)]

pub use vds_decode::prelude::*;

use vds_decode::codec::c40;
use vds_decode::header::MAGIC;
use vds_decode::io::write_length;
use vds_decode::payload::SIGNATURE_TAG;

pub const SIMPLE_VERSION: u8 = 0x01;

/// Assembles seal bytes field by field.
#[derive(Default)]
pub struct SealBuilder {
    data: Vec<u8>,
}

impl SealBuilder {
    pub fn simple(country: &str) -> Self {
        let mut data = vec![MAGIC, SIMPLE_VERSION];
        data.extend_from_slice(country.as_bytes());
        Self { data }
    }

    pub fn packed(version: u8, country: &str, signer_block: &str) -> Self {
        let mut data = vec![MAGIC, version];
        data.extend(c40::encode(country).expect("country not C40 encodable"));
        data.extend(c40::encode(signer_block).expect("signer block not C40 encodable"));
        Self { data }
    }

    pub fn dates(mut self, issue: (u8, u8, u16), signature: (u8, u8, u16)) -> Self {
        for (day, month, year) in [issue, signature] {
            self.data
                .extend_from_slice(&PackedDate::encode(day, month, year).expect("invalid date"));
        }
        self
    }

    pub fn document(mut self, document_type: u8, category: u8) -> Self {
        self.data.extend_from_slice(&[document_type, category]);
        self
    }

    pub fn record(mut self, tag: u8, value: &[u8]) -> Self {
        self.data.push(tag);
        write_length(&mut self.data, value.len());
        self.data.extend_from_slice(value);
        self
    }

    pub fn signature(self, value: &[u8]) -> Self {
        self.record(SIGNATURE_TAG, value)
    }

    pub fn raw(mut self, bytes: &[u8]) -> Self {
        self.data.extend_from_slice(bytes);
        self
    }

    pub fn build(self) -> Vec<u8> {
        self.data
    }
}

/// A simple seal for "ES" issued and signed on 01-06-2023, type 7, category 9
pub fn simple_seal() -> SealBuilder {
    SealBuilder::simple("ES")
        .dates((1, 6, 2023), (1, 6, 2023))
        .document(0x07, 0x09)
}

pub fn decode_ok(data: &[u8]) -> DecodeResult {
    match decode(data) {
        Ok(result) => result,
        Err(e) => panic!("Failed to decode {:02X?}: {}", data, e),
    }
}
