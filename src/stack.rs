use primitive_types::U256;

/// Maximum number of words on the operand stack.
pub const STACK_LIMIT: usize = 1024;

/// Fixed-capacity operand stack.
///
/// Block headers guarantee depth and headroom before any instruction of the
/// block runs, so the accessors here do not report errors. Reaching past
/// either end is an interpreter bug and panics.
#[derive(Debug, Clone)]
pub struct Stack {
    items: Vec<U256>,
    len: usize,
}

impl Default for Stack {
    fn default() -> Self {
        Self::new()
    }
}

impl Stack {
    pub fn new() -> Self {
        Self { items: vec![U256::zero(); STACK_LIMIT], len: 0 }
    }

    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn push(&mut self, v: U256) {
        debug_assert!(self.len < STACK_LIMIT, "stack overflow past block check");
        self.items[self.len] = v;
        self.len += 1;
    }

    pub fn pop(&mut self) -> U256 {
        debug_assert!(self.len > 0, "stack underflow past block check");
        self.len -= 1;
        self.items[self.len]
    }

    /// Item `n` counted from the top, zero-based.
    pub fn peek(&self, n: usize) -> U256 {
        self.items[self.len - 1 - n]
    }

    pub fn top_mut(&mut self) -> &mut U256 {
        &mut self.items[self.len - 1]
    }

    /// DUPn: copies item `n - 1` onto the top.
    pub fn dup(&mut self, n: usize) {
        let v = self.peek(n - 1);
        self.push(v);
    }

    /// SWAPn: exchanges the top with item `n`.
    pub fn swap(&mut self, n: usize) {
        let top = self.len - 1;
        self.items.swap(top, top - n);
    }

    /// Top-first view of the live items.
    pub fn iter(&self) -> impl Iterator<Item = &U256> {
        self.items[..self.len].iter().rev()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_pop_lifo() {
        let mut s = Stack::new();
        s.push(U256::from(1));
        s.push(U256::from(2));
        assert_eq!(s.len(), 2);
        assert_eq!(s.pop(), U256::from(2));
        assert_eq!(s.pop(), U256::from(1));
        assert!(s.is_empty());
    }

    #[test]
    fn indexed_from_top() {
        let mut s = Stack::new();
        for i in 0..4u64 {
            s.push(U256::from(i));
        }
        assert_eq!(s.peek(0), U256::from(3));
        assert_eq!(s.peek(3), U256::from(0));
        s.dup(4);
        assert_eq!(s.peek(0), U256::from(0));
        s.swap(2);
        assert_eq!(s.peek(0), U256::from(2));
        assert_eq!(s.peek(2), U256::from(0));
        let top_first: Vec<u64> = s.iter().map(|v| v.low_u64()).collect();
        assert_eq!(top_first, vec![2, 3, 0, 1, 0]);
    }

    #[test]
    fn fills_to_capacity() {
        let mut s = Stack::new();
        for _ in 0..STACK_LIMIT {
            s.push(U256::one());
        }
        assert_eq!(s.len(), STACK_LIMIT);
    }

    #[test]
    #[should_panic]
    fn push_past_capacity_panics() {
        let mut s = Stack::new();
        for _ in 0..=STACK_LIMIT {
            s.push(U256::one());
        }
    }
}
