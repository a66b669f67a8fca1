//! Audio data conversion.
//!
//! Provides base64 payload encoding, float/PCM16 sample conversion,
//! WAV container encoding/decoding and sample-rate conversion.

pub mod encoding;
pub mod resample;
pub mod sample;
pub mod wav;

// Re-export commonly used items
pub use encoding::{decode_base64, encode_base64};
pub use resample::resample;
pub use sample::{
    build_pcm_payload, bytes_to_pcm16, decode_pcm_buffer, float_to_pcm16, float_to_pcm16_symmetric,
    pcm16_payload, pcm16_to_bytes, pcm16_to_float, pcm_frame_count, pcm_mime_type, PcmBuffer,
    PcmPayload,
};
pub use wav::{
    decode_wav, encode_wav, encode_wav_pcm16, read_wav, samples_to_duration, write_wav, WavAudio,
    CHANNELS, WAV_HEADER_LEN,
};
