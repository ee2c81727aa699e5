use primitive_types::U256;

pub const WORD_SIZE: usize = 32;

/// Number of 32-byte words needed to hold `size` bytes.
pub fn num_words(size: u64) -> i64 {
    ((size + 31) / 32) as i64
}

/// Total fee for a memory of `words` words: linear term plus the quadratic
/// term divided by 512.
pub fn memory_cost(words: i64) -> i64 {
    3 * words + words * words / 512
}

/// Frame linear memory. Always a whole number of words long; only grows.
#[derive(Debug, Clone, Default)]
pub struct Memory {
    data: Vec<u8>,
}

impl Memory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Extra gas needed for the memory to cover `end` bytes, and the new
    /// length in bytes. `None` when `end` is already covered.
    pub fn expansion_cost(&self, end: u64) -> Option<(i64, usize)> {
        if end <= self.data.len() as u64 {
            return None;
        }
        let new_words = num_words(end);
        let cur_words = (self.data.len() / WORD_SIZE) as i64;
        let cost = memory_cost(new_words) - memory_cost(cur_words);
        Some((cost, new_words as usize * WORD_SIZE))
    }

    /// Zero-extends to `new_len`. Must only be called after paying for it.
    pub fn grow(&mut self, new_len: usize) {
        if new_len > self.data.len() {
            self.data.resize(new_len, 0);
        }
    }

    pub fn slice(&self, offset: usize, len: usize) -> &[u8] {
        &self.data[offset..offset + len]
    }

    pub fn slice_mut(&mut self, offset: usize, len: usize) -> &mut [u8] {
        &mut self.data[offset..offset + len]
    }

    pub fn load_word(&self, offset: usize) -> U256 {
        U256::from_big_endian(self.slice(offset, WORD_SIZE))
    }

    pub fn store_word(&mut self, offset: usize, value: U256) {
        value.to_big_endian(self.slice_mut(offset, WORD_SIZE));
    }

    pub fn store_byte(&mut self, offset: usize, value: u8) {
        self.data[offset] = value;
    }

    /// Copies `src` to `offset`, filling the rest of `len` with zeros.
    pub fn copy_padded(&mut self, offset: usize, len: usize, src: &[u8]) {
        let dst = self.slice_mut(offset, len);
        let n = src.len().min(len);
        dst[..n].copy_from_slice(&src[..n]);
        dst[n..].fill(0);
    }

    pub fn into_vec(self) -> Vec<u8> {
        self.data
    }
}
