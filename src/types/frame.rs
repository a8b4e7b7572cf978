//! Wire frame types

/// Tag byte identifying an error or warning frame
pub const ERROR_TAG: u8 = 11;

/// Tag byte identifying a print frame
pub const PRINT_TAG: u8 = 12;

/// Known frame payload kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameKind {
    ErrorOrWarning,
    Print,
}

impl FrameKind {
    /// Map a tag byte to a kind, `None` for tags this client does not decode
    pub fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            ERROR_TAG => Some(FrameKind::ErrorOrWarning),
            PRINT_TAG => Some(FrameKind::Print),
            _ => None,
        }
    }

    pub fn tag(self) -> u8 {
        match self {
            FrameKind::ErrorOrWarning => ERROR_TAG,
            FrameKind::Print => PRINT_TAG,
        }
    }
}

/// One complete length-prefixed frame, minus its length header
///
/// The wire layout is `[u16 length][u8 tag][payload]`, where `length` counts
/// the tag byte and the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    pub tag: u8,
    pub payload: Vec<u8>,
}

impl Frame {
    pub fn new(tag: u8, payload: Vec<u8>) -> Self {
        Self { tag, payload }
    }

    pub fn kind(&self) -> Option<FrameKind> {
        FrameKind::from_tag(self.tag)
    }

    /// Value of the wire length header for this frame
    pub fn wire_len(&self) -> usize {
        self.payload.len() + 1
    }
}
