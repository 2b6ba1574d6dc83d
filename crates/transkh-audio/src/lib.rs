pub mod decode;
pub mod pcm;
pub mod preprocess;
pub mod scratch;
pub mod wav;

pub use decode::decode;
pub use pcm::encode_i16_le;
pub use preprocess::{preprocess, resample, trim_silence, PreparedAudio, TRIM_TOP_DB};
pub use scratch::ScratchSpace;
