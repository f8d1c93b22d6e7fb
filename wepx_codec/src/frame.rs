/*
 * I/P frame encoding (§4.1) - turns a raster plus (for P-frames) the previous raw raster into the
 * compressed payload bytes that [`crate::record::Record`] then length-prefixes onto the stream.
 */
use std::io::Write;

use flate2::write::ZlibEncoder;
use flate2::Compression;

use crate::errors::{Result, WepxCodecError};
use crate::meta::{value_range_and_scale, StreamMeta};
use crate::quantize::{build_validity_mask, forward_fill, quantize, spatial_diff};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    I = 0x00,
    P = 0x01,
}

impl FrameType {
    pub fn from_u8(b: u8) -> Result<Self> {
        match b {
            0x00 => Ok(FrameType::I),
            0x01 => Ok(FrameType::P),
            other => Err(WepxCodecError::UnknownFrameType(other)),
        }
    }
}

/// an encoded frame, ready to be wrapped in a [`crate::record::Record`] header and appended to a
/// stream file.
#[derive(Debug, Clone)]
pub struct EncodedFrame {
    pub frame_type: FrameType,
    pub valid_time: u32,
    pub meta: Option<StreamMeta>,
    pub payload: Vec<u8>,
}

const ZLIB_LEVEL: u32 = 8;

fn zlib_compress(body: &[u8]) -> Result<Vec<u8>> {
    let mut enc = ZlibEncoder::new(Vec::with_capacity(body.len() / 2 + 16), Compression::new(ZLIB_LEVEL));
    enc.write_all(body)?;
    Ok(enc.finish()?)
}

fn i32_le_bytes(values: &[i32]) -> Vec<u8> {
    let mut out = Vec::with_capacity(values.len() * 4);
    for v in values {
        out.extend_from_slice(&v.to_le_bytes());
    }
    out
}

fn assemble_payload(valid_time: u32, meta_json: Option<&[u8]>, zlib_body: &[u8]) -> Vec<u8> {
    let meta_len = meta_json.map(|m| m.len()).unwrap_or(0) as u16;
    let mut out = Vec::with_capacity(4 + 2 + meta_len as usize + zlib_body.len());
    out.extend_from_slice(&valid_time.to_le_bytes());
    out.extend_from_slice(&meta_len.to_le_bytes());
    if let Some(m) = meta_json {
        out.extend_from_slice(m);
    }
    out.extend_from_slice(zlib_body);
    out
}

/// quantize `grid` with the given (frozen) `scale`, build a validity mask iff `alpha`, apply
/// spatial differencing, and zlib-compress the result - the body shared by every I-frame,
/// whichever `StreamMeta` it was encoded against.
fn quantize_and_spatial_diff_body(grid: &[f32], width: u32, height: u32, scale: f64, alpha: bool) -> Result<Vec<u8>> {
    let mut filled = grid.to_vec();
    let mask = if alpha {
        let mask = build_validity_mask(&filled);
        forward_fill(&mut filled);
        Some(mask)
    } else {
        None
    };

    let q = quantize(&filled, scale);
    let diff = spatial_diff(&q, width, height);

    let mut body = Vec::new();
    if let Some(mask) = &mask {
        body.extend_from_slice(mask);
    }
    body.extend_from_slice(&i32_le_bytes(&diff));
    zlib_compress(&body)
}

/// frame 0 of a stream: picks the stream-global scale/alpha flag from this raster's own value
/// range (§4.1), freezes them into a [`StreamMeta`], and returns both the meta and the encoded
/// I-frame. Every later frame in the stream must reuse the returned `StreamMeta` (invariant I1) -
/// in particular, any *later* I-frame in the same stream must go through
/// [`encode_i_frame_with_meta`], not this function, or it will re-derive `scale`/`alpha` from its
/// own grid and violate I1.
pub fn encode_i_frame(
    grid: &[f32],
    width: u32,
    height: u32,
    extent: Option<[f64; 4]>,
    valid_time: u32,
) -> Result<(EncodedFrame, StreamMeta)> {
    if grid.len() != (width as usize) * (height as usize) {
        return Err(WepxCodecError::Arithmetic(format!(
            "grid length {} does not match {width}x{height}",
            grid.len()
        )));
    }

    let (min, max, scale) = value_range_and_scale(grid);
    let alpha = grid.iter().any(|v| v.is_nan());
    let meta = StreamMeta { min, max, width, height, scale, alpha, extent };

    let frame = encode_i_frame_with_meta(grid, &meta, valid_time)?;
    Ok((frame, meta))
}

/// encode a (periodic, non-frame-0) I-frame against an already-frozen `StreamMeta`, reusing its
/// `scale`/`alpha`/`extent`/`min`/`max` verbatim instead of recomputing them from `grid` (invariant
/// I1). Grounded on `stream_encoder.py`'s `appendIFrame`, which re-embeds the caller-supplied
/// `metadata` rather than deriving a fresh one from the current frame.
pub fn encode_i_frame_with_meta(grid: &[f32], meta: &StreamMeta, valid_time: u32) -> Result<EncodedFrame> {
    let expected = (meta.width as usize) * (meta.height as usize);
    if grid.len() != expected {
        return Err(WepxCodecError::DimensionMismatch {
            stream_w: meta.width,
            stream_h: meta.height,
            frame_w: meta.width,
            frame_h: (grid.len() / meta.width.max(1) as usize) as u32,
        });
    }

    let zlib_body = quantize_and_spatial_diff_body(grid, meta.width, meta.height, meta.scale, meta.alpha)?;
    let meta_json = serde_json::to_vec(meta)?;
    let payload = assemble_payload(valid_time, Some(&meta_json), &zlib_body);

    Ok(EncodedFrame { frame_type: FrameType::I, valid_time, meta: Some(meta.clone()), payload })
}

/// a P-frame: requantizes `prev_raw` with the frozen scale (I2) so the temporal delta is computed
/// against a value derived the same way the decoder will derive it, not against a drifting
/// in-memory accumulator.
pub fn encode_p_frame(prev_raw: &[f32], curr_raw: &[f32], meta: &StreamMeta, valid_time: u32) -> Result<EncodedFrame> {
    let expected = (meta.width as usize) * (meta.height as usize);
    if prev_raw.len() != expected || curr_raw.len() != expected {
        return Err(WepxCodecError::DimensionMismatch {
            stream_w: meta.width,
            stream_h: meta.height,
            frame_w: meta.width,
            frame_h: (curr_raw.len() / meta.width.max(1) as usize) as u32,
        });
    }

    // whether a mask is present in the body is frozen at frame 0 (meta.alpha) - not every P-frame
    // necessarily has its own NaNs, but the decoder (which only has the I-frame's `alpha` flag to
    // go on) must see a consistently-shaped body across the whole stream.
    let mut curr_filled = curr_raw.to_vec();
    let mask = if meta.alpha {
        let mask = build_validity_mask(&curr_filled);
        forward_fill(&mut curr_filled);
        Some(mask)
    } else {
        None
    };

    let mut prev_filled = prev_raw.to_vec();
    if prev_filled.iter().any(|v| v.is_nan()) {
        forward_fill(&mut prev_filled);
    }

    let q_prev = quantize(&prev_filled, meta.scale);
    let q_curr = quantize(&curr_filled, meta.scale);

    let temporal_diff: Vec<i32> = q_curr.iter().zip(q_prev.iter()).map(|(c, p)| c.wrapping_sub(*p)).collect();
    let diff = spatial_diff(&temporal_diff, meta.width, meta.height);

    let mut body = Vec::new();
    if let Some(mask) = &mask {
        body.extend_from_slice(mask);
    }
    body.extend_from_slice(&i32_le_bytes(&diff));
    let zlib_body = zlib_compress(&body)?;

    let payload = assemble_payload(valid_time, None, &zlib_body);
    Ok(EncodedFrame { frame_type: FrameType::P, valid_time, meta: None, payload })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_i_frame_keeps_frozen_scale_despite_wide_later_range() {
        // frame 0: all-zero, range 0 -> scale 10000. A later periodic I-frame over a grid with
        // range > 200 must NOT re-derive scale=1 from its own value range (invariant I1).
        let (_frame0, meta) = encode_i_frame(&vec![0.0f32; 4], 2, 2, None, 0).unwrap();
        assert_eq!(meta.scale, 10000.0);

        let wide_range_grid = vec![-500.0f32, 500.0, 0.0, 1.0];
        let later = encode_i_frame_with_meta(&wide_range_grid, &meta, 8).unwrap();
        assert_eq!(later.meta.as_ref().unwrap().scale, 10000.0);
    }

    #[test]
    fn periodic_i_frame_keeps_frozen_alpha_despite_nan_free_later_grid() {
        // frame 0 has a NaN -> alpha=true. A later periodic I-frame over a grid with no NaN must
        // still embed alpha=true and still prefix its body with a mask, or the decoder (which
        // caches alpha from the I-frame it just read) will misparse every following P-frame body.
        let (_frame0, meta) = encode_i_frame(&[1.0, f32::NAN, 3.0, 4.0], 2, 2, None, 0).unwrap();
        assert!(meta.alpha);

        let nan_free_grid = vec![1.0f32, 2.0, 3.0, 4.0];
        let later = encode_i_frame_with_meta(&nan_free_grid, &meta, 8).unwrap();
        assert!(later.meta.as_ref().unwrap().alpha);
    }
}
