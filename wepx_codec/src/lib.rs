/*
 * wepx_codec - the frame codec (C1): quantize, diff, compress, frame-pack one raster into an
 * I/P frame, and the matching decoder. This crate owns the bit-exact `.wepx` frame format; it has
 * no knowledge of files, streams-on-disk, or the network - that is wepx_stream and wepx_server.
 */
#![allow(unused)]

pub mod errors;
pub mod meta;
pub mod quantize;
pub mod frame;
pub mod record;
pub mod decode;

pub use errors::{Result, WepxCodecError};
pub use meta::{scale_for_range, value_range_and_scale, StreamMeta};
pub use frame::{encode_i_frame, encode_i_frame_with_meta, encode_p_frame, EncodedFrame, FrameType};
pub use record::{split_payload, PayloadParts, Record, HEADER_LEN};
pub use decode::{DecodedFrame, StreamDecoder};

/// number of appended frames between periodic I-frames (§4.5): frame 0 is always an I-frame;
/// thereafter every `I_FRAME_INTERVAL`-th appended frame is an I-frame too.
pub const I_FRAME_INTERVAL: u64 = 8;

/// decide whether the `n`-th frame appended *after* frame 0 (1-indexed) should be an I-frame.
pub fn is_periodic_i_frame(frame_count_after_first: u64) -> bool {
    frame_count_after_first > 0 && frame_count_after_first % I_FRAME_INTERVAL == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn periodic_i_frames_land_on_multiples_of_eight() {
        // S4 / property 5: frames 1..17 past frame 0 -> I-frames at 8 and 16
        let i_frame_indices: Vec<u64> = (1..=17).filter(|&n| is_periodic_i_frame(n)).collect();
        assert_eq!(i_frame_indices, vec![8, 16]);
    }
}
