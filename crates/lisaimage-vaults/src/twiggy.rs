//! Twiggy track order correction
//!
//! Double-sided Twiggy images store the second side with its tracks in
//! reverse order. The medium uses a variable number of sectors per track
//! (22 on the outermost tracks down to 15 on the innermost), so the tracks
//! have to be located through the sector geometry before they can be put
//! back in order.

use lisaimage_core::BLOCK_SIZE;

/// Smallest image (in blocks) treated as a double-sided Twiggy volume
pub const TWIGGY_MIN_BLOCKS: u64 = 0x6A6;

/// Tracks on one side of the medium
pub const TRACKS_PER_SIDE: usize = 46;

/// (number of tracks, sectors per track) from the outermost zone inward
const SPEED_ZONES: [(usize, usize); 8] = [
    (4, 22),
    (7, 21),
    (6, 20),
    (6, 19),
    (6, 18),
    (6, 17),
    (7, 16),
    (4, 15),
];

/// Sectors on a given track, or `None` past the last track
pub fn sectors_per_track(track: usize) -> Option<usize> {
    let mut first = 0;
    for &(tracks, sectors) in SPEED_ZONES.iter() {
        if track < first + tracks {
            return Some(sectors);
        }
        first += tracks;
    }
    None
}

/// Total sectors on one side
pub fn sectors_per_side() -> usize {
    SPEED_ZONES.iter().map(|&(tracks, sectors)| tracks * sectors).sum()
}

/// True if an image of `data_length` bytes is large enough to be double-sided
pub fn needs_deinterleave(data_length: u64) -> bool {
    data_length / BLOCK_SIZE as u64 >= TWIGGY_MIN_BLOCKS
}

/// Put the second side's tracks back in order
///
/// The first half of `data` is kept as is. The second half is cut into the
/// 46 tracks of the side, which are then emitted last track first. Bytes past
/// the last track are appended unchanged, so the result is always a
/// permutation of the input with the same length.
pub fn deinterleave(data: &[u8]) -> Vec<u8> {
    let half = data.len() / 2;
    let (front, back) = data.split_at(half);

    let mut tracks = Vec::with_capacity(TRACKS_PER_SIDE);
    let mut offset = 0;
    for track in 0..TRACKS_PER_SIDE {
        let len = sectors_per_track(track).unwrap_or(0) * BLOCK_SIZE;
        let start = offset.min(back.len());
        let end = (offset + len).min(back.len());
        tracks.push(&back[start..end]);
        offset += len;
    }

    let mut out = Vec::with_capacity(data.len());
    out.extend_from_slice(front);
    for track in tracks.iter().rev() {
        out.extend_from_slice(track);
    }
    if offset < back.len() {
        out.extend_from_slice(&back[offset..]);
    }

    out
}
