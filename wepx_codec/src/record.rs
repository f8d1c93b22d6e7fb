/*
 * record framing (§3 invariant I3/I4): `<length:u32 LE><type:u8>` header followed by `length`
 * bytes of payload. Shared by the stream writer (C2, which only ever appends whole records) and
 * the tail-streaming server (C6, which must tolerate a partial trailing record).
 */
use crate::errors::{Result, WepxCodecError};
use crate::frame::{EncodedFrame, FrameType};

pub const HEADER_LEN: usize = 5;

#[derive(Debug, Clone)]
pub struct Record {
    pub frame_type: FrameType,
    pub payload: Vec<u8>,
}

impl Record {
    pub fn from_encoded(frame: EncodedFrame) -> Self {
        Record { frame_type: frame.frame_type, payload: frame.payload }
    }

    pub fn to_bytes(&self) -> Vec<u8> {
        let mut out = Vec::with_capacity(HEADER_LEN + self.payload.len());
        out.extend_from_slice(&(self.payload.len() as u32).to_le_bytes());
        out.push(self.frame_type as u8);
        out.extend_from_slice(&self.payload);
        out
    }

    /// try to parse one record from the front of `buf`. Returns `Ok(None)` (not an error) if
    /// `buf` does not yet hold a complete record - callers (the tail server in particular) must
    /// back up their read cursor and retry once more bytes have been appended (§4.6).
    pub fn parse(buf: &[u8]) -> Result<Option<(Record, usize)>> {
        if buf.len() < HEADER_LEN {
            return Ok(None);
        }
        let length = u32::from_le_bytes(buf[0..4].try_into().unwrap()) as usize;
        let frame_type = FrameType::from_u8(buf[4])?;
        let total = HEADER_LEN + length;
        if buf.len() < total {
            return Ok(None);
        }
        let payload = buf[HEADER_LEN..total].to_vec();
        Ok(Some((Record { frame_type, payload }, total)))
    }
}

/// split the `valid_time`/`meta_len`/`meta`/`zlib_body` fields out of a record's payload (§3 I4).
pub struct PayloadParts<'a> {
    pub valid_time: u32,
    pub meta_json: Option<&'a [u8]>,
    pub zlib_body: &'a [u8],
}

pub fn split_payload(payload: &[u8]) -> Result<PayloadParts<'_>> {
    if payload.len() < 6 {
        return Err(WepxCodecError::Truncated("payload shorter than fixed header".into()));
    }
    let valid_time = u32::from_le_bytes(payload[0..4].try_into().unwrap());
    let meta_len = u16::from_le_bytes(payload[4..6].try_into().unwrap()) as usize;
    if payload.len() < 6 + meta_len {
        return Err(WepxCodecError::Truncated("payload shorter than declared meta_len".into()));
    }
    let meta_json = if meta_len > 0 { Some(&payload[6..6 + meta_len]) } else { None };
    let zlib_body = &payload[6 + meta_len..];
    Ok(PayloadParts { valid_time, meta_json, zlib_body })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn concatenated_records_parse_back_in_order() {
        let r1 = Record { frame_type: FrameType::I, payload: vec![1, 2, 3] };
        let r2 = Record { frame_type: FrameType::P, payload: vec![4, 5] };
        let mut buf = r1.to_bytes();
        buf.extend(r2.to_bytes());

        let (parsed1, consumed1) = Record::parse(&buf).unwrap().unwrap();
        assert_eq!(parsed1.payload, vec![1, 2, 3]);
        let (parsed2, consumed2) = Record::parse(&buf[consumed1..]).unwrap().unwrap();
        assert_eq!(parsed2.payload, vec![4, 5]);
        assert_eq!(consumed1 + consumed2, buf.len());
    }

    #[test]
    fn truncated_final_record_leaves_prior_decodable() {
        let r1 = Record { frame_type: FrameType::I, payload: vec![1, 2, 3] };
        let r2 = Record { frame_type: FrameType::P, payload: vec![4, 5, 6, 7] };
        let mut buf = r1.to_bytes();
        let full_r2 = r2.to_bytes();
        buf.extend_from_slice(&full_r2[..full_r2.len() - 2]); // chop off the tail of r2

        let (parsed1, consumed1) = Record::parse(&buf).unwrap().unwrap();
        assert_eq!(parsed1.payload, vec![1, 2, 3]);
        assert!(Record::parse(&buf[consumed1..]).unwrap().is_none());
    }
}
