use bit_alloc::BitAllocator;
use log::{LevelFilter, info, warn};
use simple_logger::SimpleLogger;

const FRAME_SIZE: usize = 4096;

fn allocate_frames(
    frames: &mut BitAllocator,
    count: usize,
) -> Result<Vec<usize>, Box<dyn std::error::Error>> {
    let mut addrs = Vec::with_capacity(count);
    for _ in 0..count {
        let Some(frame) = frames.mark_next() else {
            // hand back what was taken so far
            for addr in &addrs {
                frames.unmark(addr / FRAME_SIZE);
            }
            return Err(format!("out of frames after {} of {count}", addrs.len()).into());
        };
        addrs.push(frame * FRAME_SIZE);
    }
    Ok(addrs)
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    SimpleLogger::new().with_level(LevelFilter::Trace).init()?;

    // 1 MiB of physical memory
    const FRAME_COUNT: usize = 256;
    let mut frames = BitAllocator::new(FRAME_COUNT)?;

    // the first 16 frames hold the kernel image
    for frame in 0..16 {
        frames.mark(frame);
    }
    info!("{} frames free after reserving the kernel", frames.free_count());

    let stack = allocate_frames(&mut frames, 4)?;
    info!("stack frames at {stack:#x?}");

    if let Err(err) = allocate_frames(&mut frames, FRAME_COUNT) {
        warn!("large request failed: {err}");
    }

    let snapshot = frames.as_raw().to_vec();
    let restored = BitAllocator::from_raw(FRAME_COUNT, &snapshot)?;
    info!(
        "restored map has {} of {} frames free",
        restored.free_count(),
        restored.capacity()
    );
    Ok(())
}
