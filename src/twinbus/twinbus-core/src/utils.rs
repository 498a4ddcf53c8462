// Half-open range check used by the address map: start <= addr < end
pub fn in_range(start: u32, end: u32, addr: u32) -> bool {
    addr >= start && addr < end
}

// Rounds a word count up to the next multiple of four (one quadword)
pub fn round_up_quad(count: u32) -> u32 {
    count.wrapping_add(3) & !3
}

// Splits a 128-bit value into its four words, lowest first
pub fn quad_to_words(value: u128) -> [u32; 4] {
    [
        value as u32,
        (value >> 32) as u32,
        (value >> 64) as u32,
        (value >> 96) as u32,
    ]
}

// Rebuilds a 128-bit value from four words, lowest first
pub fn quad_from_words(words: [u32; 4]) -> u128 {
    words
        .iter()
        .rev()
        .fold(0u128, |acc, &word| (acc << 32) | word as u128)
}
