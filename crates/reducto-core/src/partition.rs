/// Splits `sequence` into `n` contiguous buckets.
///
/// Buckets are filled in strides of `len / n`; strides past the last bucket
/// fold into it, so the remainder of an uneven split lands at the end. When
/// the sequence is shorter than `n` every bucket is empty.
pub fn divide<T: Clone>(sequence: &[T], n: usize) -> Vec<Vec<T>> {
    let mut buckets: Vec<Vec<T>> = (0..n).map(|_| Vec::new()).collect();
    if n == 0 {
        return buckets;
    }

    let stride = sequence.len() / n;
    if stride == 0 {
        return buckets;
    }

    for (chunk_index, chunk) in sequence.chunks(stride).enumerate() {
        let bucket = chunk_index.min(n - 1);
        buckets[bucket].extend_from_slice(chunk);
    }
    buckets
}

/// Concatenates every bucket except `index`, keeping their order.
pub fn complement<T: Clone>(parts: &[Vec<T>], index: usize) -> Vec<T> {
    parts
        .iter()
        .enumerate()
        .filter(|(idx, _)| *idx != index)
        .flat_map(|(_, part)| part.iter().cloned())
        .collect()
}
