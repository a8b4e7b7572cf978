//! Console wire protocol: frame reassembly and record codec

pub mod codec;
pub mod reassembler;

pub use codec::{decode, decode_frame, encode_frame, encode_record};
pub use reassembler::{BUFFER_LEN, FrameReassembler, HEADER_LEN, MAX_BODY_LEN};
