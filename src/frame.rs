//! The fixed storage map for local variables.
//!
//! The language supports exactly the 26 lowercase single-letter variables.
//! Each one owns a statically assigned 8-byte slot below the frame base, so
//! slot membership is derived arithmetically instead of being looked up in
//! a table.

pub const SLOT_SIZE: i64 = 8;
pub const SLOT_COUNT: i64 = 26;

/// Bytes the prologue must reserve below `%rbp` to cover every slot.
pub const FRAME_SIZE: i64 = SLOT_COUNT * SLOT_SIZE;

/// Byte displacement of `name`'s slot below the frame base, or `None` when
/// the identifier has no slot. `a` maps to the first slot, `b` to the
/// second, and so on.
pub fn slot_offset(name: char) -> Option<i64> {
  if name.is_ascii_lowercase() {
    Some((name as i64 - 'a' as i64 + 1) * SLOT_SIZE)
  } else {
    None
  }
}
