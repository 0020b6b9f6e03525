use crate::{CborError, ErrorCode};

#[inline]
pub fn try_reserve<T>(v: &mut Vec<T>, additional: usize, offset: usize) -> Result<(), CborError> {
    let needed = v
        .len()
        .checked_add(additional)
        .ok_or_else(|| CborError::new(ErrorCode::LengthOverflow, offset))?;
    if needed <= v.capacity() {
        return Ok(());
    }
    v.try_reserve(additional)
        .map_err(|_| CborError::new(ErrorCode::AllocationFailed, offset))
}

/// Allocate a vector for `cap` elements, capped so a forged length prefix cannot
/// pre-allocate more than the remaining input could ever fill.
#[inline]
pub fn try_vec_with_capacity<T>(
    cap: usize,
    remaining_input: usize,
    offset: usize,
) -> Result<Vec<T>, CborError> {
    let mut v: Vec<T> = Vec::new();
    try_reserve(&mut v, cap.min(remaining_input), offset)?;
    Ok(v)
}

#[inline]
pub fn try_vec_from_slice(bytes: &[u8], offset: usize) -> Result<Vec<u8>, CborError> {
    let mut v = Vec::new();
    try_reserve(&mut v, bytes.len(), offset)?;
    v.extend_from_slice(bytes);
    Ok(v)
}
