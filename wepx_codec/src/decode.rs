/*
 * decoder side of the codec: turns records back into float grids. Used by the test suite
 * (property tests in §8) and by any offline tool that wants to read a `.wepx` file rather than
 * merely forward its bytes (the tail-streaming server itself never decodes - it forwards payload
 * bytes verbatim).
 */
use std::io::Read;

use flate2::read::ZlibDecoder;

use crate::errors::{Result, WepxCodecError};
use crate::meta::StreamMeta;
use crate::quantize::{dequantize, mask_bit, spatial_undiff};
use crate::record::{split_payload, Record};
use crate::frame::FrameType;

#[derive(Debug, Clone)]
pub struct DecodedFrame {
    pub valid_time: u32,
    pub frame_type: FrameType,
    pub grid: Vec<f32>,
}

fn zlib_decompress(body: &[u8]) -> Result<Vec<u8>> {
    let mut dec = ZlibDecoder::new(body);
    let mut out = Vec::new();
    dec.read_to_end(&mut out)?;
    Ok(out)
}

/// a decoder has to cache the meta from the last I-frame and the running quantized grid state so
/// it can apply P-frame deltas the same way the encoder computed them (§9: "meta appears only on
/// I-frames... decoder must cache meta... and apply it to subsequent P-frames").
pub struct StreamDecoder {
    meta: Option<StreamMeta>,
    last_q: Option<Vec<i32>>,
}

impl StreamDecoder {
    pub fn new() -> Self {
        StreamDecoder { meta: None, last_q: None }
    }

    pub fn meta(&self) -> Option<&StreamMeta> {
        self.meta.as_ref()
    }

    pub fn decode(&mut self, record: &Record, valid_time: u32) -> Result<DecodedFrame> {
        match record.frame_type {
            FrameType::I => self.decode_i(record, valid_time),
            FrameType::P => self.decode_p(record, valid_time),
        }
    }

    fn decode_i(&mut self, record: &Record, valid_time: u32) -> Result<DecodedFrame> {
        let parts = split_payload(&record.payload)?;
        let meta_json = parts.meta_json.ok_or_else(|| WepxCodecError::Truncated("I-frame missing meta".into()))?;
        let meta: StreamMeta = serde_json::from_slice(meta_json)?;

        let body = zlib_decompress(parts.zlib_body)?;
        let npixels = (meta.width as usize) * (meta.height as usize);
        let mask_len = if meta.alpha { (npixels + 7) / 8 } else { 0 };
        if body.len() < mask_len + npixels * 4 {
            return Err(WepxCodecError::Truncated("I-frame body shorter than expected".into()));
        }
        let mask = if meta.alpha { Some(body[0..mask_len].to_vec()) } else { None };
        let diff = le_i32_vec(&body[mask_len..mask_len + npixels * 4]);

        let q = spatial_undiff(&diff, meta.width, meta.height);
        let mut grid = dequantize(&q, meta.scale);
        apply_mask(&mut grid, mask.as_deref());

        self.last_q = Some(q);
        self.meta = Some(meta);

        Ok(DecodedFrame { valid_time, frame_type: FrameType::I, grid })
    }

    fn decode_p(&mut self, record: &Record, valid_time: u32) -> Result<DecodedFrame> {
        let meta = self.meta.clone().ok_or(WepxCodecError::NoMetaYet)?;
        let last_q = self.last_q.clone().ok_or(WepxCodecError::NoMetaYet)?;

        let parts = split_payload(&record.payload)?;
        let body = zlib_decompress(parts.zlib_body)?;
        let npixels = (meta.width as usize) * (meta.height as usize);
        let mask_len = if meta.alpha { (npixels + 7) / 8 } else { 0 };
        if body.len() < mask_len + npixels * 4 {
            return Err(WepxCodecError::Truncated("P-frame body shorter than expected".into()));
        }
        let mask = if meta.alpha { Some(body[0..mask_len].to_vec()) } else { None };
        let diff = le_i32_vec(&body[mask_len..mask_len + npixels * 4]);

        let temporal_diff = spatial_undiff(&diff, meta.width, meta.height);
        let q: Vec<i32> = last_q.iter().zip(temporal_diff.iter()).map(|(p, d)| p.wrapping_add(*d)).collect();
        let mut grid = dequantize(&q, meta.scale);
        apply_mask(&mut grid, mask.as_deref());

        self.last_q = Some(q);

        Ok(DecodedFrame { valid_time, frame_type: FrameType::P, grid })
    }
}

fn apply_mask(grid: &mut [f32], mask: Option<&[u8]>) {
    if let Some(mask) = mask {
        for (i, v) in grid.iter_mut().enumerate() {
            if !mask_bit(mask, i) {
                *v = f32::NAN;
            }
        }
    }
}

fn le_i32_vec(bytes: &[u8]) -> Vec<i32> {
    bytes.chunks_exact(4).map(|c| i32::from_le_bytes(c.try_into().unwrap())).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::frame::{encode_i_frame, encode_p_frame};

    #[test]
    fn i_frame_round_trips_within_one_scale_unit() {
        let grid = vec![17.3f32, 18.1, 19.9, 20.0, 17.3, 18.1, 19.9, 20.0, 17.3, 18.1, 19.9, 20.0, 17.3, 18.1, 19.9, 20.0];
        let (frame, meta) = encode_i_frame(&grid, 4, 4, None, 1000).unwrap();
        let record = Record::from_encoded(frame);
        let mut dec = StreamDecoder::new();
        let decoded = dec.decode(&record, 1000).unwrap();

        for (a, b) in grid.iter().zip(decoded.grid.iter()) {
            assert!((*a as f64 - *b as f64).abs() <= 1.0 / meta.scale + 1e-9);
        }
    }

    #[test]
    fn p_frame_matches_independent_i_frame_in_quantized_space() {
        let prev = vec![10.0f32, 11.0, 12.0, 13.0];
        let curr = vec![10.5f32, 11.2, 20.0, 9.0];

        let (i_prev, meta) = encode_i_frame(&prev, 2, 2, None, 0).unwrap();
        let p = encode_p_frame(&prev, &curr, &meta, 1).unwrap();

        let mut dec = StreamDecoder::new();
        dec.decode(&Record::from_encoded(i_prev), 0).unwrap();
        let via_p = dec.decode(&Record::from_encoded(p), 1).unwrap();

        let (i_curr, _) = encode_i_frame(&curr, 2, 2, None, 1).unwrap();
        let mut dec2 = StreamDecoder::new();
        let via_i = dec2.decode(&Record::from_encoded(i_curr), 1).unwrap();

        for (a, b) in via_p.grid.iter().zip(via_i.grid.iter()) {
            assert!((*a as f64 - *b as f64).abs() <= 1.0 / meta.scale + 1e-9);
        }
    }

    #[test]
    fn nan_is_preserved_exactly_where_mask_bit_clear() {
        let grid = vec![1.0, f32::NAN, 3.0, 4.0];
        let (frame, _) = encode_i_frame(&grid, 2, 2, None, 5).unwrap();
        let mut dec = StreamDecoder::new();
        let decoded = dec.decode(&Record::from_encoded(frame), 5).unwrap();
        assert!(decoded.grid[1].is_nan());
        assert!(!decoded.grid[0].is_nan());
    }
}
