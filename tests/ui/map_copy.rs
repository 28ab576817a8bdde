use bit_alloc::{BitAllocator, byte_count};

fn main() {
    let mut blocks = BitAllocator::new(1000).unwrap();
    for _ in 0..300 {
        blocks.mark_next().unwrap();
    }
    blocks.unmark(42);

    let mut saved = vec![0u8; byte_count(blocks.capacity())];
    saved.copy_from_slice(blocks.as_raw());

    let mut loaded = BitAllocator::new(1000).unwrap();
    loaded.as_raw_mut().copy_from_slice(&saved);
    assert_eq!(loaded.recount(), blocks.free_count());
    assert_eq!(loaded.mark_next(), Some(42));
    assert_eq!(loaded.mark_next(), Some(300));
}
