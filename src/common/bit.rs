#[macro_export]
macro_rules! BIT {
    ( $x:expr ) => {
        (1u32 << $x)
    };
}

// bits range: BIT_RNG!(4, 8)  0b000111110000,  start from 4, end at 8
#[macro_export]
macro_rules! BIT_RNG {
    ( $s:expr, $e:expr ) => {
        $crate::common::bit::mask_len(($e) - ($s) + 1) << $s
    };
}

#[macro_export]
macro_rules! BM_SET {
    ( $x:expr, $mask:expr ) => {
        $x |= $mask
    };
}

#[macro_export]
macro_rules! BM_CLR {
    ( $x:expr, $mask:expr ) => {
        $x &= !($mask)
    };
}

#[macro_export]
macro_rules! BM_IS_SET {
    ( $x:expr, $mask:expr ) => {
        ($x & ($mask)) != 0
    };
}

/// Mask with the low `len` bits set. Saturates at a full word.
pub const fn mask_len(len: u32) -> u32 {
    if len >= u32::BITS {
        u32::MAX
    } else {
        BIT!(len) - 1
    }
}

/// Iterates the indices of the set bits of `mask`, lowest first.
pub fn set_bits(mut mask: u32) -> impl Iterator<Item = u8> {
    core::iter::from_fn(move || {
        if mask == 0 {
            return None;
        }
        let bit = mask.trailing_zeros();
        BM_CLR!(mask, BIT!(bit));
        Some(bit as u8)
    })
}
