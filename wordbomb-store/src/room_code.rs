use rand::Rng;
use wordbomb_types::{ROOM_CODE_LENGTH, RoomCode, StoreError};

const CODE_CHARS: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Generate a random room code, e.g. "K3ZQ8A".
pub fn generate_room_code<R: Rng + ?Sized>(rng: &mut R) -> Result<RoomCode, StoreError> {
    let code: String = (0..ROOM_CODE_LENGTH)
        .map(|_| CODE_CHARS[rng.random_range(0..CODE_CHARS.len())] as char)
        .collect();
    RoomCode::parse(&code)
}
