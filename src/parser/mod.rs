// (C) Copyright 2019 Hewlett Packard Enterprise Development LP

mod decode;
mod event;
mod format;
mod stream;
mod zone;

pub use decode::DecodingReader;
pub use event::{ParsedEvent, AD_HOC_SEQUENCE};
pub use format::{EventFormat, EventMatcher, TemporalAnchor};
pub use stream::{sanitize, EventParser, ParserState, ProgressIndicator, PROGRESS_STEP};
pub use zone::Zone;
