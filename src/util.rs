/// Decodes a variable-length quantity from the start of `data`.
///
/// Returns the number of bytes read together with the value, or `None` when
/// `data` ends before a byte with bit 7 clear, or the value outgrows 32 bits.
pub fn read_variable_length(data: &[u8]) -> Option<(usize, u32)> {
    let mut value: u32 = 0;

    for (i, &n) in data.iter().enumerate() {
        if value > u32::MAX >> 7 {
            return None;
        }
        value = (value << 7) | u32::from(n & 0x7f);
        if n & 0x80 != 0x80 {
            return Some((i + 1, value));
        }
    }

    None
}

#[inline(always)]
pub fn tempo2qpm(tempo: u32) -> f32 {
    6e7 / tempo as f32
}
