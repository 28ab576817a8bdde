use bit_alloc::BitAllocator;

struct IdPool {
    ids: BitAllocator,
}

impl IdPool {
    fn new(len: usize) -> Result<Self, bit_alloc::BitAllocError> {
        let mut ids = BitAllocator::new(len)?;
        // id 0 is reserved
        ids.mark(0);
        Ok(Self { ids })
    }

    fn acquire(&mut self) -> Option<usize> {
        self.ids.mark_next()
    }

    fn release(&mut self, id: usize) {
        self.ids.unmark(id);
    }
}

fn main() {
    let mut pool = IdPool::new(4).unwrap();
    assert_eq!(pool.acquire(), Some(1));
    assert_eq!(pool.acquire(), Some(2));
    assert_eq!(pool.acquire(), Some(3));
    assert_eq!(pool.acquire(), None);
    pool.release(2);
    assert_eq!(pool.acquire(), Some(2));
}
