/// Length of a video identifier on the upstream API.
const VIDEO_ID_LENGTH: usize = 11;

/// Whether the given string begins with a plausible video identifier.
///
/// Only the first [`VIDEO_ID_LENGTH`] bytes are checked; anything after them
/// is passed to the upstream untouched and left for it to judge.
pub fn is_plausible_video_id(candidate: &str) -> bool {
    let bytes = candidate.as_bytes();
    if bytes.len() < VIDEO_ID_LENGTH {
        return false;
    }

    bytes[..VIDEO_ID_LENGTH]
        .iter()
        .all(|&byte| byte.is_ascii_alphanumeric() || matches!(byte, b'_' | b'-'))
}
