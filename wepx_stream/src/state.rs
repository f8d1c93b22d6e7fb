/*
 * per-stream runtime state (§3) plus the `Stream` handle that ties codec (C1) and writer (C2)
 * together: the thing the run orchestrator actually keeps one of per `stream_id` for the
 * duration of a cycle (§4.5, §5 - worker-local, destroyed at cycle end).
 */
use std::path::{Path, PathBuf};

use wepx_codec::frame::{encode_i_frame, encode_i_frame_with_meta, encode_p_frame};
use wepx_codec::{is_periodic_i_frame, Record, StreamMeta};

use crate::errors::Result;
use crate::writer::StreamWriter;

/// frozen metadata plus the bookkeeping needed to requantize the previous raster for the next
/// P-frame (invariant I2 - the *raw* previous raster is kept, not a quantized accumulator).
pub struct StreamState {
    pub meta: StreamMeta,
    last_raw: Vec<f32>,
    /// number of frames appended after frame 0 (frame 0 itself is not counted here).
    appended_after_first: u64,
}

impl StreamState {
    pub fn frame_count(&self) -> u64 {
        self.appended_after_first + 1
    }
}

/// a live stream within a cycle: owns the writer and (once initialized) the runtime state.
pub struct Stream {
    path: PathBuf,
    writer: Option<StreamWriter>,
    state: Option<StreamState>,
}

impl Stream {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Stream { path: path.as_ref().to_path_buf(), writer: None, state: None }
    }

    pub fn state(&self) -> Option<&StreamState> {
        self.state.as_ref()
    }

    /// append one raster to the stream, choosing I vs. P per the periodic-I-frame state machine
    /// (§4.5). `valid_time` is the frame's UTC unix seconds.
    pub fn append(&mut self, grid: &[f32], width: u32, height: u32, extent: Option<[f64; 4]>, valid_time: u32) -> Result<()> {
        match self.state.take() {
            None => self.append_first(grid, width, height, extent, valid_time),
            Some(state) => self.append_next(state, grid, valid_time),
        }
    }

    fn append_first(&mut self, grid: &[f32], width: u32, height: u32, extent: Option<[f64; 4]>, valid_time: u32) -> Result<()> {
        let (frame, meta) = encode_i_frame(grid, width, height, extent, valid_time)?;
        let mut writer = StreamWriter::create_fresh(&self.path)?;
        writer.append_record(&Record::from_encoded(frame))?;
        self.writer = Some(writer);
        self.state = Some(StreamState { meta, last_raw: grid.to_vec(), appended_after_first: 0 });
        Ok(())
    }

    fn append_next(&mut self, mut state: StreamState, grid: &[f32], valid_time: u32) -> Result<()> {
        state.appended_after_first += 1;

        if self.writer.is_none() {
            self.writer = Some(StreamWriter::open_append(&self.path)?);
        }
        let writer = self.writer.as_mut().expect("just inserted above");

        if is_periodic_i_frame(state.appended_after_first) {
            // reuse the frozen `StreamMeta` (scale/alpha/extent) from frame 0 - a periodic I-frame
            // is still part of the same stream and must not re-derive either from this grid's own
            // value range or NaN content (invariant I1).
            let frame = encode_i_frame_with_meta(grid, &state.meta, valid_time)?;
            writer.append_record(&Record::from_encoded(frame))?;
        } else {
            let frame = encode_p_frame(&state.last_raw, grid, &state.meta, valid_time)?;
            writer.append_record(&Record::from_encoded(frame))?;
        }

        state.last_raw = grid.to_vec();
        self.state = Some(state);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wepx_codec::decode::StreamDecoder;
    use wepx_codec::frame::FrameType;
    use wepx_codec::record::Record as CodecRecord;

    fn record_types(path: &Path) -> Vec<FrameType> {
        let bytes = std::fs::read(path).unwrap();
        let mut out = Vec::new();
        let mut offset = 0;
        while offset < bytes.len() {
            let (r, consumed) = CodecRecord::parse(&bytes[offset..]).unwrap().unwrap();
            out.push(r.frame_type);
            offset += consumed;
        }
        out
    }

    #[test]
    fn seventeen_identical_frames_interleave_i_and_p_every_eight() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.wepx");
        let grid = vec![17.0f32; 16];

        let mut stream = Stream::new(&path);
        for t in 0..17u32 {
            stream.append(&grid, 4, 4, None, t).unwrap();
        }

        let types = record_types(&path);
        assert_eq!(types.len(), 17);
        let expected_i_at = [0usize, 8, 16];
        for (i, t) in types.iter().enumerate() {
            let expect_i = expected_i_at.contains(&i);
            assert_eq!(*t == FrameType::I, expect_i, "frame {i}");
        }
    }

    #[test]
    fn scale_is_frozen_across_changing_value_ranges() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.wepx");

        let mut stream = Stream::new(&path);
        stream.append(&vec![10.0, 11.0, 12.0, 13.0], 2, 2, None, 0).unwrap(); // range 3 -> scale 10000
        let frozen_scale = stream.state().unwrap().meta.scale;
        assert_eq!(frozen_scale, 10000.0);

        // a huge subsequent range must not change the frozen scale
        stream.append(&vec![-500.0, 500.0, 0.0, 1.0], 2, 2, None, 1).unwrap();
        assert_eq!(stream.state().unwrap().meta.scale, frozen_scale);

        let mut dec = StreamDecoder::new();
        let bytes = std::fs::read(&path).unwrap();
        let mut offset = 0;
        while offset < bytes.len() {
            let (r, consumed) = CodecRecord::parse(&bytes[offset..]).unwrap().unwrap();
            dec.decode(&r, 0).unwrap();
            offset += consumed;
        }
        assert_eq!(dec.meta().unwrap().scale, frozen_scale);
    }

    /// regression for a periodic (frame-8) I-frame that used to re-derive `scale` from its own
    /// grid: a precip-rate-shaped stream whose frame 0 is flat (scale 10000) but whose frame 8 has
    /// a huge range (would bucket to scale 1 on its own) must still decode every frame - including
    /// frame 8 itself and the P-frames after it - against the scale frozen at frame 0.
    #[test]
    fn periodic_i_frame_does_not_shift_the_decoded_scale() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.wepx");

        let mut stream = Stream::new(&path);
        let flat = vec![0.0f32; 4];
        let wide_range = vec![-500.0f32, 500.0, 0.0, 1.0];

        for t in 0..9u32 {
            let grid = if t == 8 { &wide_range } else { &flat };
            stream.append(grid, 2, 2, None, t).unwrap();
        }

        let mut dec = StreamDecoder::new();
        let bytes = std::fs::read(&path).unwrap();
        let mut offset = 0;
        let mut decoded_types = Vec::new();
        while offset < bytes.len() {
            let (r, consumed) = CodecRecord::parse(&bytes[offset..]).unwrap().unwrap();
            let frame = dec.decode(&r, 0).unwrap();
            decoded_types.push(frame.frame_type);
            assert_eq!(dec.meta().unwrap().scale, 10000.0, "scale must stay frozen at every frame, including frame 8");
            offset += consumed;
        }
        assert_eq!(decoded_types, vec![
            FrameType::I, FrameType::P, FrameType::P, FrameType::P, FrameType::P,
            FrameType::P, FrameType::P, FrameType::P, FrameType::I,
        ]);
    }

    /// regression for a periodic I-frame that used to re-derive `alpha` from its own grid: frame 0
    /// has a NaN (alpha=true) but the frame-8 grid doesn't; the periodic I-frame must still embed
    /// `alpha=true` and a mask, or the decoder mis-parses every following P-frame body.
    #[test]
    fn periodic_i_frame_keeps_alpha_true_even_when_its_own_grid_has_no_nan() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("s.wepx");

        let mut stream = Stream::new(&path);
        let with_nan = vec![1.0f32, f32::NAN, 3.0, 4.0];
        let nan_free = vec![1.0f32, 2.0, 3.0, 4.0];

        for t in 0..9u32 {
            let grid = if t == 8 { &nan_free } else { &with_nan };
            stream.append(grid, 2, 2, None, t).unwrap();
        }

        let mut dec = StreamDecoder::new();
        let bytes = std::fs::read(&path).unwrap();
        let mut offset = 0;
        while offset < bytes.len() {
            let (r, consumed) = CodecRecord::parse(&bytes[offset..]).unwrap().unwrap();
            let frame = dec.decode(&r, 0).unwrap();
            assert!(dec.meta().unwrap().alpha, "alpha must stay frozen true at every frame, including frame 8");
            // position (0,1) is NaN in every source grid except the frame-8 grid; the decoded
            // value at that pixel must reflect each frame's own mask bit, proving the mask was
            // actually present (not silently dropped) in the frame-8 body.
            if frame.frame_type == FrameType::I && offset == 0 {
                assert!(frame.grid[1].is_nan());
            }
            offset += consumed;
        }
    }
}
