/// Returns the numbers in `[from, to]` absent from `present`.
///
/// `present` must be sorted ascending; each candidate is located by binary
/// search, so the scan runs in O((to - from) · log(|present|)). The result
/// is sorted ascending and free of duplicates.
pub fn missing_in_range(present: &[u64], from: u64, to: u64) -> Vec<u64> {
    if to < from {
        return Vec::new();
    }

    // Sized up front so the scan never reallocates.
    let mut missing = Vec::with_capacity((to - from + 1) as usize);
    for number in from..=to {
        if present.binary_search(&number).is_err() {
            missing.push(number);
        }
    }
    missing
}
