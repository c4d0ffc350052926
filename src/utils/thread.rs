/// Upper bound on discovery workers; beyond this the disk is the bottleneck.
pub const MAX_WORKERS: usize = 8;

/// Worker count for discovery: available parallelism clamped to `1..=MAX_WORKERS`.
pub fn worker_count() -> usize {
    std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1)
        .clamp(1, MAX_WORKERS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn worker_count_is_bounded() {
        let n = worker_count();
        assert!((1..=MAX_WORKERS).contains(&n));
    }
}
